use serde::Serialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

use super::accessor::Accessor;
use super::delta::{diff, ChangeRecord};
use crate::config::EditorConfig;
use crate::document::{SaveDocument, SaveInfo};
use crate::io::{DefaultSaveReader, RawSaveData, SaveReader, SaveWriter};
use crate::node::NodePath;
use crate::utils::{create_backup, list_backups, BackupInfo, EditError, SaveError, RESTORE_LABEL};
use crate::validator::{validate, ValidationIssue, ValidationReport};

/// 存档编辑会话
///
/// # 核心特性
/// - **单一所有者**: 会话独占文档，所有访问器都从会话借出
/// - **修改-保存分离**: 修改只发生在内存中，需要显式调用 `save`
/// - **先备份后写入**: 备份创建并校验成功后才会写入存档
///
/// # 使用示例
///
/// ```rust,ignore
/// use xcom_save_editor::{SaveEditor, AtomicSaveWriter};
///
/// let mut editor = SaveEditor::open("slot1.sav")?;
/// {
///     let mut acc = editor.root_accessor();
///     xcom_save_editor::game::money::set_current_funds(&mut acc, 5_000_000)?;
/// }
/// println!("{}", editor.summary());
/// editor.save(&AtomicSaveWriter)?;
/// ```
#[derive(Debug)]
pub struct SaveEditor {
    document: SaveDocument,
    /// 加载 / 上次保存时的主体
    original_body: Value,
    config: EditorConfig,
}

/// 保存结果
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub path: PathBuf,
    /// 保存前创建的备份（目标文件原本不存在时为 None）
    pub backup_path: Option<PathBuf>,
    pub warnings: Vec<ValidationIssue>,
    pub changes: Vec<ChangeRecord>,
}

impl SaveEditor {
    /// 打开存档文件
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SaveError> {
        Self::open_with(path, EditorConfig::default())
    }

    /// 使用自定义配置打开存档文件
    pub fn open_with(path: impl AsRef<Path>, config: EditorConfig) -> Result<Self, SaveError> {
        let document = SaveDocument::load(path)?;
        Ok(Self::from_document(document, config))
    }

    /// 从已加载的文档创建会话
    pub fn from_document(document: SaveDocument, config: EditorConfig) -> Self {
        let original_body = document.body.clone();
        Self {
            document,
            original_body,
            config,
        }
    }

    pub fn document(&self) -> &SaveDocument {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// 当前主体（只读）
    pub fn body(&self) -> &Value {
        &self.document.body
    }

    /// 绑定到整个主体的访问器
    pub fn root_accessor(&mut self) -> Accessor<'_> {
        Accessor::root(&mut self.document.body)
    }

    /// 绑定到 `path` 指向子树的访问器
    pub fn accessor(&mut self, path: impl Into<NodePath>) -> Result<Accessor<'_>, EditError> {
        Accessor::bind(&mut self.document.body, path.into())
    }

    /// 自加载 / 上次保存以来的所有变更
    pub fn changes(&self) -> Vec<ChangeRecord> {
        diff(&NodePath::root(), &self.original_body, &self.document.body)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes().is_empty()
    }

    /// 丢弃所有未保存的修改
    pub fn reset_all(&mut self) {
        self.document.body = self.original_body.clone();
        log::debug!("已丢弃所有未保存的修改");
    }

    /// 校验当前主体
    pub fn validate(&self) -> ValidationReport {
        validate(&self.document.body)
    }

    /// 保存到原路径
    ///
    /// 流程：校验 -> 序列化 -> 备份并校验备份 -> 原子写入 -> 以当前状态为新基准。
    /// 任何一步失败都会中止，原文件保持不变，内存中的修改也会保留。
    ///
    /// # 错误
    /// - `SaveError::ValidationFailed`: 存在致命问题，未写入任何文件
    /// - `SaveError::BackupVerification`: 备份校验失败，未写入存档
    pub fn save(&mut self, writer: &dyn SaveWriter) -> Result<SaveOutcome, SaveError> {
        let path = self.document.path().ok_or(SaveError::NoSourcePath)?.to_path_buf();

        let report = self.validate();
        if !report.is_valid() {
            for issue in report.fatal() {
                log::error!("{}", issue);
            }
            return Err(SaveError::ValidationFailed(report));
        }

        let changes = self.changes();
        let bytes = self.document.serialize()?;

        let backup_path = if path.exists() {
            Some(create_backup(&path, &self.config.backup_dir_name, None)?)
        } else {
            None
        };

        writer.write(&RawSaveData { bytes: bytes.clone() }, &path)?;

        self.document.mark_saved(bytes);
        self.original_body = self.document.body.clone();
        log::info!("已保存存档: {:?} ({} 处修改)", path, changes.len());

        Ok(SaveOutcome {
            path,
            backup_path,
            warnings: report.warnings().cloned().collect(),
            changes,
        })
    }

    /// 当前存档的所有备份（最新的在前）
    pub fn backups(&self) -> Result<Vec<BackupInfo>, SaveError> {
        let path = self.document.path().ok_or(SaveError::NoSourcePath)?;
        list_backups(path, &self.config.backup_dir_name)
    }

    /// 从备份恢复
    ///
    /// 先确认备份本身能被解析，再为当前文件创建 `before_restore` 备份，
    /// 然后写回并重新加载。未保存的修改会被丢弃。
    ///
    /// # 返回
    /// 恢复前创建的安全备份路径
    pub fn restore_backup(&mut self, backup: &Path, writer: &dyn SaveWriter) -> Result<Option<PathBuf>, SaveError> {
        let path = self.document.path().ok_or(SaveError::NoSourcePath)?.to_path_buf();

        let raw = DefaultSaveReader.read(backup)?;
        let mut restored = SaveDocument::parse(&raw.bytes)?;

        let safety_backup = if path.exists() {
            Some(create_backup(&path, &self.config.backup_dir_name, Some(RESTORE_LABEL))?)
        } else {
            None
        };

        writer.write(&raw, &path)?;

        restored.set_path(path);
        self.original_body = restored.body.clone();
        self.document = restored;
        log::info!("已从备份恢复: {:?}", backup);
        Ok(safety_backup)
    }

    /// 存档概要信息
    pub fn info(&self) -> SaveInfo {
        self.document.info()
    }

    /// 变更摘要
    pub fn summary(&self) -> String {
        let changes = self.changes();
        if changes.is_empty() {
            return "没有未保存的修改".to_string();
        }
        let mut lines = vec![format!("共 {} 处修改:", changes.len())];
        lines.extend(changes.iter().map(|c| format!("  {}", c)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{money, research};
    use crate::io::AtomicSaveWriter;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SAVE: &str = "\
name: Test
version: Extended 7.9
---
difficulty: 1
funds: [1000, 900]
bases:
  - name: Alpha
    facilities:
      - type: STR_ACCESS_LIFT
    research:
      - project: STR_LASER_WEAPONS
        spent: 10
        cost: 100
";

    struct FailingWriter;

    impl SaveWriter for FailingWriter {
        fn write(&self, _data: &RawSaveData, _path: &Path) -> Result<(), SaveError> {
            Err(SaveError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }
    }

    fn setup() -> (TempDir, PathBuf, SaveEditor) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot1.sav");
        std::fs::write(&path, SAVE).unwrap();
        let editor = SaveEditor::open(&path).unwrap();
        (dir, path, editor)
    }

    #[test]
    fn test_session_changes() {
        let (_dir, _path, mut editor) = setup();
        assert!(!editor.has_changes());

        {
            let mut acc = editor.root_accessor();
            money::set_current_funds(&mut acc, 5000).unwrap();
        }
        {
            let mut acc = editor.accessor("bases.0").unwrap();
            acc.set(&"name".into(), "Omega").unwrap();
        }

        let changes = editor.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].path.to_string(), "funds.0");
        assert_eq!(changes[1].path.to_string(), "bases.0.name");

        editor.reset_all();
        assert!(!editor.has_changes());
    }

    #[test]
    fn test_save_creates_backup_and_rebaselines() {
        let (_dir, path, mut editor) = setup();
        {
            let mut acc = editor.root_accessor();
            research::complete_all(&mut acc).unwrap();
        }

        let outcome = editor.save(&AtomicSaveWriter).unwrap();

        let backup = outcome.backup_path.unwrap();
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), SAVE);
        assert_eq!(outcome.changes.len(), 1);
        assert!(!editor.has_changes());

        let reloaded = SaveDocument::load(&path).unwrap();
        assert_eq!(reloaded.body, *editor.body());
        assert_eq!(editor.backups().unwrap().len(), 1);
    }

    #[test]
    fn test_fatal_issue_blocks_save() {
        let (dir, path, mut editor) = setup();
        {
            let mut acc = editor.root_accessor();
            acc.set(&"funds.0".into(), "lots").unwrap();
        }

        let result = editor.save(&AtomicSaveWriter);
        assert!(matches!(result, Err(SaveError::ValidationFailed(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAVE);
        assert!(editor.has_changes());
        assert!(!dir.path().join("backups").exists());
    }

    #[test]
    fn test_failed_write_leaves_original_and_backup() {
        let (_dir, path, mut editor) = setup();
        {
            let mut acc = editor.root_accessor();
            money::set_current_funds(&mut acc, 1).unwrap();
        }

        assert!(editor.save(&FailingWriter).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAVE);
        assert_eq!(editor.backups().unwrap().len(), 1);
        assert!(editor.has_changes());
    }

    #[test]
    fn test_save_without_path() {
        let doc = SaveDocument::parse(SAVE.as_bytes()).unwrap();
        let mut editor = SaveEditor::from_document(doc, EditorConfig::default());
        assert!(matches!(editor.save(&AtomicSaveWriter), Err(SaveError::NoSourcePath)));
    }

    #[test]
    fn test_restore_backup() {
        let (_dir, path, mut editor) = setup();
        {
            let mut acc = editor.root_accessor();
            money::set_current_funds(&mut acc, 7777).unwrap();
        }
        let outcome = editor.save(&AtomicSaveWriter).unwrap();
        let backup = outcome.backup_path.unwrap();

        let safety = editor.restore_backup(&backup, &AtomicSaveWriter).unwrap().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAVE);
        assert!(safety.file_name().unwrap().to_string_lossy().contains("before_restore"));
        assert_eq!(editor.info().current_funds, 1000);
        assert!(!editor.has_changes());
    }

    #[test]
    fn test_summary() {
        let (_dir, _path, mut editor) = setup();
        assert_eq!(editor.summary(), "没有未保存的修改");
        {
            let mut acc = editor.root_accessor();
            money::set_current_funds(&mut acc, 5000).unwrap();
        }
        assert_eq!(editor.summary(), "共 1 处修改:\n  funds.0: 1000 -> 5000");
    }
}
