use super::SaveDocument;
use crate::node::find_tagged;
use crate::utils::SaveError;
use serde::Deserialize;
use serde_yaml::Value;

impl SaveDocument {
    /// 从原始字节解析存档
    ///
    /// # 错误
    /// 以下情况返回 `SaveError::Format`：
    /// - 不是 UTF-8 文本或 YAML 语法错误
    /// - 文档数量不是两个
    /// - 主体不是映射
    /// - 含有带标签（`!tag`）的节点
    pub fn parse(bytes: &[u8]) -> Result<Self, SaveError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| SaveError::Format(format!("存档不是有效的 UTF-8 文本: {}", e)))?;

        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_str(text) {
            let value = Value::deserialize(document)
                .map_err(|e| SaveError::Format(format!("YAML 解析失败: {}", e)))?;
            documents.push(value);
        }

        if documents.len() != 2 {
            return Err(SaveError::Format(format!(
                "期望 2 个 YAML 文档（头部 + 主体），实际 {} 个",
                documents.len()
            )));
        }

        let body = documents.pop().unwrap_or(Value::Null);
        let header = documents.pop().unwrap_or(Value::Null);

        if !body.is_mapping() {
            return Err(SaveError::Format("存档主体必须是映射".to_string()));
        }
        reject_tagged(&header)?;
        reject_tagged(&body)?;

        let header_end = find_body_start(text)
            .ok_or_else(|| SaveError::Format("未找到文档分隔符 '---'".to_string()))?;

        Ok(SaveDocument {
            path: None,
            header_text: text[..header_end].to_string(),
            header,
            pristine_body: body.clone(),
            body,
            source: bytes.to_vec(),
        })
    }
}

/// 找到头部文本的结束字节偏移
///
/// 文件开头的 `---` 属于头部文档，跳过；`%YAML` 等指令行不算内容。
/// 之后第一个 `---` 即分隔符：分隔行后面没有内容时头部包含整行（含换行），
/// 否则在 `---` 之后截断，同一行上的内容属于主体。
fn find_body_start(text: &str) -> Option<usize> {
    let mut offset = 0;
    let mut seen_content = false;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let after_marker = trimmed
            .strip_prefix("---")
            .filter(|rest| rest.is_empty() || rest.starts_with([' ', '\t']));
        if let (Some(rest), true) = (after_marker, seen_content) {
            return if rest.trim().is_empty() {
                Some(offset + line.len())
            } else {
                Some(offset + 3)
            };
        }
        let content = trimmed.trim();
        if !content.is_empty() && !content.starts_with('#') && !content.starts_with('%') {
            seen_content = true;
        }
        offset += line.len();
    }
    None
}

/// 拒绝带标签的节点
fn reject_tagged(node: &Value) -> Result<(), SaveError> {
    match find_tagged(node) {
        Some((path, tagged)) => Err(SaveError::Format(format!("不支持带标签的节点: {} ({})", tagged.tag, path))),
        None => Ok(()),
    }
}
