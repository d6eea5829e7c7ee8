/// 存档 IO 实现
///
/// 提供基于文件系统的默认读写实现
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::traits::{RawSaveData, SaveReader, SaveWriter};
use crate::utils::SaveError;

/// 默认的存档读取器（基于 std::fs）
#[derive(Debug, Clone, Default)]
pub struct DefaultSaveReader;

impl SaveReader for DefaultSaveReader {
    fn read(&self, path: &Path) -> Result<RawSaveData, SaveError> {
        let bytes = std::fs::read(path)?;
        Ok(RawSaveData { bytes })
    }
}

/// 原子写入器
///
/// 先写入同目录下的临时文件并落盘，再重命名覆盖目标文件。
/// 任何一步失败，目标文件都保持原样。
#[derive(Debug, Clone, Default)]
pub struct AtomicSaveWriter;

impl SaveWriter for AtomicSaveWriter {
    fn write(&self, data: &RawSaveData, path: &Path) -> Result<(), SaveError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        // 临时文件必须与目标在同一文件系统上，重命名才是原子的
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&data.bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| SaveError::Io(e.error))?;

        log::debug!("已写入 {} 字节到 {:?}", data.bytes.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_save_reader() {
        let dir = TempDir::new().unwrap();
        let test_file = dir.path().join("reader.sav");
        std::fs::write(&test_file, b"name: a\n---\nfunds: [1, 2]\n").unwrap();

        let result = DefaultSaveReader.read(&test_file).unwrap();
        assert_eq!(result.bytes, b"name: a\n---\nfunds: [1, 2]\n");
    }

    #[test]
    fn test_atomic_writer_replaces_file() {
        let dir = TempDir::new().unwrap();
        let test_file = dir.path().join("writer.sav");
        std::fs::write(&test_file, b"old").unwrap();

        let data = RawSaveData { bytes: b"new contents".to_vec() };
        AtomicSaveWriter.write(&data, &test_file).unwrap();

        assert_eq!(std::fs::read(&test_file).unwrap(), b"new contents");
        // 不残留临时文件
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_writer_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let test_file = dir.path().join("nested").join("subdir").join("slot.sav");

        let data = RawSaveData { bytes: vec![1, 2, 3, 4] };
        AtomicSaveWriter.write(&data, &test_file).unwrap();

        assert!(test_file.exists());
    }
}
