/// IO 抽象层 - trait 定义
///
/// 读写只负责字节搬运，不负责解析与序列化。

use std::path::Path;
use crate::utils::SaveError;

/// 存档文件原始数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSaveData {
    /// 文件的原始字节数据
    pub bytes: Vec<u8>,
}

/// 存档读取 trait
///
/// # 实现示例
/// ```rust,ignore
/// pub struct MemoryReader(Vec<u8>);
/// impl SaveReader for MemoryReader {
///     fn read(&self, _path: &Path) -> Result<RawSaveData, SaveError> {
///         Ok(RawSaveData { bytes: self.0.clone() })
///     }
/// }
/// ```
pub trait SaveReader {
    /// 读取存档的原始数据
    ///
    /// # 参数
    /// * `path` - 文件路径
    fn read(&self, path: &Path) -> Result<RawSaveData, SaveError>;
}

/// 存档写入 trait
///
/// # 职责
/// - 将序列化后的数据写入文件系统
/// - 失败时必须保证目标文件保持原样
pub trait SaveWriter {
    /// 写入存档数据
    ///
    /// # 参数
    /// * `data` - 要写入的原始数据
    /// * `path` - 目标文件路径
    fn write(&self, data: &RawSaveData, path: &Path) -> Result<(), SaveError>;
}
