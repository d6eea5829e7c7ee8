/// 编辑器配置
///
/// 由命令行参数构造，不读取配置文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// 备份目录名（位于存档同级目录）
    pub backup_dir_name: String,
    /// 士兵属性"拉满"的默认值
    pub soldier_max_stat: i64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            backup_dir_name: "backups".to_string(),
            soldier_max_stat: 100,
        }
    }
}

impl EditorConfig {
    pub fn with_backup_dir(mut self, name: impl Into<String>) -> Self {
        self.backup_dir_name = name.into();
        self
    }

    pub fn with_soldier_max_stat(mut self, value: i64) -> Self {
        self.soldier_max_stat = value;
        self
    }
}
