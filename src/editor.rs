/// 编辑器层模块
///
/// 该模块提供有状态的编辑接口：按路径读写、变更比对、整体还原、带备份的保存。
/// 遵循"修改-保存分离"原则，所有修改操作仅在内存中进行，需要显式调用保存。
///
/// # 架构设计
///
/// - **accessor**: 变更追踪访问器，绑定到文档中的一个子树
/// - **delta**: 快照与当前树之间的差异计算
/// - **session**: 编辑会话，持有文档并负责校验、备份与保存
///
/// # 使用示例
///
/// ```rust,ignore
/// use xcom_save_editor::{SaveEditor, AtomicSaveWriter};
///
/// // 加载 + 编辑 + 保存工作流
/// let mut editor = SaveEditor::open("slot1.sav")?;
/// editor.root_accessor().set(&"funds.0".into(), 5000)?;
/// println!("{}", editor.summary());
///
/// editor.save(&AtomicSaveWriter)?;
/// ```
pub mod accessor;
pub mod delta;
pub mod session;

// === 导出公共接口 ===
pub use accessor::Accessor;
pub use delta::{diff, ChangeRecord};
pub use session::{SaveEditor, SaveOutcome};
