pub mod config;
pub mod document;
pub mod editor;
pub mod game;
pub mod io;
pub mod node;
pub mod utils;
pub mod validator;

// 重新导出主要结构
pub use config::EditorConfig;
pub use document::{SaveDocument, SaveInfo};
pub use editor::{Accessor, ChangeRecord, SaveEditor, SaveOutcome};
pub use io::{AtomicSaveWriter, DefaultSaveReader, RawSaveData, SaveReader, SaveWriter};
pub use node::{Node, NodeKind, NodePath, PathSegment};
pub use utils::{format_item_name, BackupInfo, EditError, SaveError};
pub use validator::{validate, Severity, ValidationIssue, ValidationReport};

// 常量定义
pub const SUPPORTED_EXTENSIONS: &[&str] = &["sav"];
