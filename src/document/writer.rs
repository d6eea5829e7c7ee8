use super::SaveDocument;
use crate::utils::SaveError;

impl SaveDocument {
    /// 序列化为存档字节
    ///
    /// 主体未修改时原样输出加载时的字节（键顺序、标量格式都不变）；
    /// 修改后输出原始头部文本 + 重新生成的主体（保持键顺序）。
    pub fn serialize(&self) -> Result<Vec<u8>, SaveError> {
        if !self.is_modified() {
            return Ok(self.source.clone());
        }

        let mut output = String::with_capacity(self.source.len());
        output.push_str(&self.header_text);
        if !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&serde_yaml::to_string(&self.body)?);

        #[cfg(debug_assertions)]
        log::debug!("重新生成主体: {} -> {} 字节", self.source.len(), output.len());

        Ok(output.into_bytes())
    }

    /// 保存成功后，把当前状态作为新的基准
    pub(crate) fn mark_saved(&mut self, bytes: Vec<u8>) {
        self.source = bytes;
        self.pristine_body = self.body.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    // 故意使用非规范格式：流式序列、额外空格、引号
    const SAVE: &str = "\
name: 'Quoted   Save'
version: Extended 7.9
time: {year: 1999,  month: 3}
---
funds: [1000,   900]
zeta: 1
alpha: 2
bases:
  - name: \"Alpha\"
    items: {STR_PISTOL: 4}
";

    #[test]
    fn test_unmodified_round_trip_is_byte_exact() {
        let doc = SaveDocument::parse(SAVE.as_bytes()).unwrap();
        assert_eq!(doc.serialize().unwrap(), SAVE.as_bytes());
    }

    #[test]
    fn test_modified_keeps_header_and_key_order() {
        let mut doc = SaveDocument::parse(SAVE.as_bytes()).unwrap();
        doc.body["funds"][0] = Value::from(5000);

        let bytes = doc.serialize().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("name: 'Quoted   Save'\nversion: Extended 7.9\ntime: {year: 1999,  month: 3}\n---\n"));
        let zeta = text.find("zeta").unwrap();
        let alpha = text.find("alpha").unwrap();
        assert!(zeta < alpha);

        let reparsed = SaveDocument::parse(text.as_bytes()).unwrap();
        assert_eq!(reparsed.body, doc.body);
        assert_eq!(reparsed.header(), doc.header());
    }

    #[test]
    fn test_revert_restores_byte_exact_output() {
        let mut doc = SaveDocument::parse(SAVE.as_bytes()).unwrap();
        doc.body["zeta"] = Value::from(9);
        doc.body["zeta"] = Value::from(1);
        assert_eq!(doc.serialize().unwrap(), SAVE.as_bytes());
    }

    #[test]
    fn test_mark_saved_rebaselines() {
        let mut doc = SaveDocument::parse(SAVE.as_bytes()).unwrap();
        doc.body["zeta"] = Value::from(9);
        let bytes = doc.serialize().unwrap();
        doc.mark_saved(bytes.clone());
        assert!(!doc.is_modified());
        assert_eq!(doc.serialize().unwrap(), bytes);
    }
}
