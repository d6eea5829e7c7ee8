use serde_yaml::Value;
use std::path::{Path, PathBuf};

use crate::io::{DefaultSaveReader, SaveReader};
use crate::utils::SaveError;

pub mod parser;
pub mod writer;
pub mod info;

pub use info::SaveInfo;

/// OpenXCom 存档文档
///
/// 存档由两个连续的 YAML 文档组成：
/// - 头部（名称、版本、引擎、时间、模组列表），原样保留，不做解释
/// - 主体（资金、基地、研究……），即可编辑的文档树
#[derive(Debug, Clone)]
pub struct SaveDocument {
    /// 文件路径（从内存解析时为 None）
    path: Option<PathBuf>,
    /// 头部文档的原始文本（含 `---` 分隔行）
    header_text: String,
    /// 头部文档
    header: Value,
    /// 主体文档
    pub body: Value,
    /// 最近一次加载 / 保存时的原始字节
    source: Vec<u8>,
    /// `source` 对应的主体，用于判断能否原样输出
    pristine_body: Value,
}

impl SaveDocument {
    /// 加载存档文件
    ///
    /// # 示例
    /// ```rust,ignore
    /// let doc = SaveDocument::load("slot1.sav")?;
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SaveError> {
        Self::load_with_reader(path, &DefaultSaveReader)
    }

    /// 使用自定义 Reader 加载存档文件
    pub fn load_with_reader(path: impl AsRef<Path>, reader: &dyn SaveReader) -> Result<Self, SaveError> {
        let path = path.as_ref();
        let raw = reader.read(path)?;
        let mut doc = Self::parse(&raw.bytes)?;
        doc.path = Some(path.to_path_buf());
        log::info!("已加载存档: {:?} ({} 字节)", path, raw.bytes.len());
        Ok(doc)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    /// 头部文档（只读）
    pub fn header(&self) -> &Value {
        &self.header
    }

    /// 头部原始文本
    pub fn header_text(&self) -> &str {
        &self.header_text
    }

    /// 最近一次加载 / 保存的原始字节
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// 读取头部字段，缺失时回退到主体中的同名字段
    pub fn header_field(&self, key: &str) -> Option<&Value> {
        self.header.get(key).or_else(|| self.body.get(key))
    }

    /// 主体自加载 / 上次保存以来是否被修改
    pub fn is_modified(&self) -> bool {
        self.body != self.pristine_body
    }
}
