/// IO 抽象层模块
///
/// 该模块提供了存档读写的抽象接口，便于注入测试 mock（例如模拟写入中途失败）。
///
/// # 架构设计
///
/// - **traits**: 定义 Reader/Writer trait 接口
/// - **save_io**: 基于文件系统的默认实现（写入为临时文件 + 原子重命名）
///
/// # 使用示例
///
/// ```rust,ignore
/// use xcom_save_editor::io::{DefaultSaveReader, SaveReader};
///
/// let reader = DefaultSaveReader;
/// let data = reader.read(Path::new("slot1.sav"))?;
/// ```
pub mod traits;
pub mod save_io;

// === 导出 trait 定义 ===
pub use traits::{RawSaveData, SaveReader, SaveWriter};

// === 导出默认实现 ===
pub use save_io::{AtomicSaveWriter, DefaultSaveReader};
