use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::node::{NodeKind, NodePath};
use crate::validator::ValidationReport;

/// 编辑操作错误（局部、可恢复，不会破坏文档）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Path error at '{path}': {reason}")]
    Path { path: NodePath, reason: String },

    #[error("Type mismatch at '{path}': expected {expected}, got {found}")]
    TypeMismatch {
        path: NodePath,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// 存档加载 / 保存错误
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Invalid save format: {0}")]
    Format(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Validation failed with {} fatal issue(s)", .0.fatal_count())]
    ValidationFailed(ValidationReport),

    #[error("Backup verification failed: {0:?}")]
    BackupVerification(PathBuf),

    #[error("Document has no source path")]
    NoSourcePath,
}

/// 备份目录：存档同级的 `backups/`
pub fn backup_dir_for(save_path: &Path, dir_name: &str) -> PathBuf {
    save_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(dir_name)
}

/// 备份文件名中的时间戳格式
const BACKUP_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// 恢复备份前创建的安全备份标签
pub const RESTORE_LABEL: &str = "before_restore";

/// 存档文件名（不含扩展名）
fn save_stem(save_path: &Path) -> String {
    save_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "save".to_string())
}

/// 创建文件备份
///
/// 备份文件名为 `<stem>_<YYYYmmdd_HHMMSS>.bak`，同一秒内重名时追加 `_<n>`。
/// 复制完成后校验备份存在且大小一致。
///
/// # 参数
/// * `save_path` - 原存档路径
/// * `dir_name` - 备份目录名（位于存档同级目录）
/// * `label` - 可选的文件名标签（如 `before_restore`）
pub fn create_backup(save_path: &Path, dir_name: &str, label: Option<&str>) -> Result<PathBuf, SaveError> {
    if !save_path.exists() {
        return Err(SaveError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("原文件不存在: {:?}", save_path),
        )));
    }

    let backup_dir = backup_dir_for(save_path, dir_name);
    std::fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format(BACKUP_TIMESTAMP);
    let base_name = match label {
        Some(label) => format!("{}_{}_{}", save_stem(save_path), label, timestamp),
        None => format!("{}_{}", save_stem(save_path), timestamp),
    };

    let mut backup_path = backup_dir.join(format!("{}.bak", base_name));
    let mut counter = 1;
    while backup_path.exists() {
        backup_path = backup_dir.join(format!("{}_{}.bak", base_name, counter));
        counter += 1;
    }

    std::fs::copy(save_path, &backup_path)?;
    verify_backup(save_path, &backup_path)?;

    log::info!("已创建备份文件: {:?}", backup_path);
    Ok(backup_path)
}

/// 校验备份存在且字节数与原文件一致
fn verify_backup(save_path: &Path, backup_path: &Path) -> Result<(), SaveError> {
    let original = std::fs::metadata(save_path)?.len();
    match std::fs::metadata(backup_path) {
        Ok(meta) if meta.is_file() && meta.len() == original => Ok(()),
        _ => Err(SaveError::BackupVerification(backup_path.to_path_buf())),
    }
}

/// 备份文件信息
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Local>,
}

/// 判断去掉 `<stem>_` 之后的部分是否为本存档的备份
///
/// 形如 `[before_restore_]YYYYmmdd_HHMMSS[_<n>].bak`，
/// 这样 `slot1_b.sav` 的备份不会出现在 `slot1.sav` 的列表里。
fn is_backup_suffix(rest: &str) -> bool {
    let Some(rest) = rest.strip_suffix(".bak") else {
        return false;
    };
    let rest = rest
        .strip_prefix(RESTORE_LABEL)
        .and_then(|r| r.strip_prefix('_'))
        .unwrap_or(rest);
    let (Some(stamp), Some(counter)) = (rest.get(..15), rest.get(15..)) else {
        return false;
    };
    if NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP).is_err() {
        return false;
    }
    match counter.strip_prefix('_') {
        Some(n) => !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()),
        None => counter.is_empty(),
    }
}

/// 列出存档的所有备份（按修改时间倒序）
pub fn list_backups(save_path: &Path, dir_name: &str) -> Result<Vec<BackupInfo>, SaveError> {
    let backup_dir = backup_dir_for(save_path, dir_name);
    if !backup_dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = format!("{}_", save_stem(save_path));
    let mut backups = Vec::new();
    for entry in std::fs::read_dir(&backup_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(rest) = name.strip_prefix(&prefix) else {
            continue;
        };
        if !is_backup_suffix(rest) {
            continue;
        }
        let meta = entry.metadata()?;
        backups.push(BackupInfo {
            path: entry.path(),
            size: meta.len(),
            modified: DateTime::<Local>::from(meta.modified()?),
        });
    }

    backups.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.path.cmp(&a.path)));
    Ok(backups)
}

/// 格式化游戏内部名称用于显示
///
/// 去掉 `STR_` 前缀，下划线替换为空格，并转为首字母大写
pub fn format_item_name(raw: &str) -> String {
    raw.replace("STR_", "")
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_item_name() {
        assert_eq!(format_item_name("STR_LASER_WEAPONS"), "Laser Weapons");
        assert_eq!(format_item_name("STR_GLOCK_18"), "Glock 18");
        assert_eq!(format_item_name("plain"), "Plain");
    }

    #[test]
    fn test_create_backup_copies_bytes() {
        let dir = TempDir::new().unwrap();
        let save = dir.path().join("slot1.sav");
        std::fs::write(&save, b"name: test\n---\nfunds: [1, 2]\n").unwrap();

        let backup = create_backup(&save, "backups", None).unwrap();

        assert_eq!(backup.parent().unwrap(), dir.path().join("backups"));
        assert!(backup.file_name().unwrap().to_string_lossy().starts_with("slot1_"));
        assert_eq!(std::fs::read(&backup).unwrap(), std::fs::read(&save).unwrap());
    }

    #[test]
    fn test_backup_names_never_collide() {
        let dir = TempDir::new().unwrap();
        let save = dir.path().join("slot1.sav");
        std::fs::write(&save, b"a").unwrap();

        let first = create_backup(&save, "backups", None).unwrap();
        let second = create_backup(&save, "backups", None).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn test_backup_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = create_backup(&dir.path().join("missing.sav"), "backups", None);
        assert!(matches!(result, Err(SaveError::Io(_))));
    }

    #[test]
    fn test_list_backups_filters_by_stem() {
        let dir = TempDir::new().unwrap();
        let save = dir.path().join("slot1.sav");
        std::fs::write(&save, b"a").unwrap();
        create_backup(&save, "backups", None).unwrap();
        create_backup(&save, "backups", Some(RESTORE_LABEL)).unwrap();
        std::fs::write(dir.path().join("backups").join("other_20240101_000000.bak"), b"x").unwrap();

        let backups = list_backups(&save, "backups").unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups.iter().all(|b| b.size == 1));
    }

    #[test]
    fn test_list_backups_ignores_similar_stems() {
        let dir = TempDir::new().unwrap();
        let slot1 = dir.path().join("slot1.sav");
        let slot1_b = dir.path().join("slot1_b.sav");
        std::fs::write(&slot1, b"a").unwrap();
        std::fs::write(&slot1_b, b"bb").unwrap();

        create_backup(&slot1, "backups", None).unwrap();
        create_backup(&slot1, "backups", None).unwrap();
        create_backup(&slot1_b, "backups", None).unwrap();
        create_backup(&slot1_b, "backups", Some(RESTORE_LABEL)).unwrap();

        let own = list_backups(&slot1, "backups").unwrap();
        assert_eq!(own.len(), 2);
        assert!(own.iter().all(|b| b.size == 1));

        let other = list_backups(&slot1_b, "backups").unwrap();
        assert_eq!(other.len(), 2);
        assert!(other.iter().all(|b| b.size == 2));
    }

    #[test]
    fn test_backup_suffix_shape() {
        assert!(is_backup_suffix("20240101_120000.bak"));
        assert!(is_backup_suffix("20240101_120000_3.bak"));
        assert!(is_backup_suffix("before_restore_20240101_120000.bak"));
        assert!(!is_backup_suffix("b_20240101_120000.bak"));
        assert!(!is_backup_suffix("20240101_120000_.bak"));
        assert!(!is_backup_suffix("20241301_120000.bak"));
        assert!(!is_backup_suffix("20240101_120000.sav"));
    }
}
