/// 存档完整性校验
///
/// 保存前对存档主体做结构与数值范围检查。
/// `Fatal` 级别的问题会阻止保存，`Warning` 只提示不阻止。
use serde::Serialize;
use serde_yaml::Value;
use std::fmt;

use crate::node::{find_tagged, NodePath};
use crate::game::soldiers::SOLDIER_STATS;

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Fatal,
}

/// 单条校验问题
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub path: NodePath,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "警告",
            Severity::Fatal => "错误",
        };
        write!(f, "[{}] {}: {}", level, self.path, self.message)
    }
}

/// 校验结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// 没有致命问题即可保存
    pub fn is_valid(&self) -> bool {
        self.fatal_count() == 0
    }

    pub fn fatal_count(&self) -> usize {
        self.fatal().count()
    }

    pub fn fatal(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Fatal)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

/// 属性值的合理范围
const STAT_RANGE: (i64, i64) = (0, 200);
/// 资金合理上限
const FUNDS_LIMIT: i64 = 999_999_999;
/// 游戏时间字段的合理范围
const TIME_RANGES: &[(&str, i64, i64)] = &[
    ("second", 0, 59),
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day", 1, 31),
    ("month", 1, 12),
    ("year", 1990, 2100),
];

/// 校验存档主体
pub fn validate(body: &Value) -> ValidationReport {
    let mut v = Validator::default();
    v.check(body);

    for issue in v.report.warnings() {
        log::warn!("{}", issue);
    }
    v.report
}

#[derive(Default)]
struct Validator {
    report: ValidationReport,
}

impl Validator {
    fn fatal(&mut self, path: NodePath, message: impl Into<String>) {
        self.report.issues.push(ValidationIssue {
            severity: Severity::Fatal,
            path,
            message: message.into(),
        });
    }

    fn warn(&mut self, path: NodePath, message: impl Into<String>) {
        self.report.issues.push(ValidationIssue {
            severity: Severity::Warning,
            path,
            message: message.into(),
        });
    }

    fn check(&mut self, body: &Value) {
        let root = NodePath::root();
        if !body.is_mapping() {
            self.fatal(root, "save body must be a mapping");
            return;
        }

        // 带标签的节点写出后无法重新加载
        if let Some((path, tagged)) = find_tagged(body) {
            self.fatal(path, format!("tagged node '{}' is not supported", tagged.tag));
        }

        for key in ["funds", "bases"] {
            if body.get(key).is_none() {
                self.fatal(root.clone().key(key), format!("missing required key: {}", key));
            }
        }

        for key in ["monthsPassed", "daysPassed", "difficulty"] {
            if let Some(value) = body.get(key) {
                if value.as_i64().is_none() {
                    self.fatal(root.clone().key(key), "expected an integer");
                }
            }
        }

        if let Some(funds) = body.get("funds") {
            self.check_funds(funds);
        }
        if let Some(bases) = body.get("bases") {
            self.check_bases(bases);
        }
        self.check_calendar(body);
    }

    fn check_funds(&mut self, funds: &Value) {
        let path = NodePath::root().key("funds");
        let Some(entries) = funds.as_sequence() else {
            self.fatal(path, "funds must be a sequence");
            return;
        };
        if entries.len() < 2 {
            self.fatal(path, "funds must contain at least 2 values");
            return;
        }
        for (i, entry) in entries.iter().enumerate() {
            let entry_path = path.clone().index(i);
            match entry.as_i64() {
                None => self.fatal(entry_path, "funds entry must be an integer"),
                Some(n) if n < 0 => self.warn(entry_path, format!("negative funds: {}", n)),
                Some(n) if n > FUNDS_LIMIT => self.warn(entry_path, format!("very high funds: {}", n)),
                Some(_) => {}
            }
        }
    }

    fn check_bases(&mut self, bases: &Value) {
        let path = NodePath::root().key("bases");
        let Some(list) = bases.as_sequence() else {
            self.fatal(path, "bases must be a sequence");
            return;
        };
        if list.is_empty() {
            self.fatal(path, "at least one base must exist");
            return;
        }

        for (i, base) in list.iter().enumerate() {
            let base_path = path.clone().index(i);
            if !base.is_mapping() {
                self.fatal(base_path, "base must be a mapping");
                continue;
            }
            for key in ["name", "facilities"] {
                if base.get(key).is_none() {
                    self.fatal(base_path.clone().key(key), format!("base missing required key: {}", key));
                }
            }
            if let Some(facilities) = base.get("facilities") {
                self.check_facilities(facilities, base_path.clone().key("facilities"));
            }
            if let Some(soldiers) = base.get("soldiers") {
                self.check_soldiers(soldiers, base_path.clone().key("soldiers"));
            }
        }
    }

    fn check_facilities(&mut self, facilities: &Value, path: NodePath) {
        let Some(list) = facilities.as_sequence() else {
            self.fatal(path, "facilities must be a sequence");
            return;
        };
        for (j, facility) in list.iter().enumerate() {
            let facility_path = path.clone().index(j);
            if !facility.is_mapping() {
                self.fatal(facility_path, "facility must be a mapping");
                continue;
            }
            if facility.get("type").is_none() {
                self.fatal(facility_path.clone().key("type"), "facility missing type");
            }
            if let Some(build_time) = facility.get("buildTime") {
                let bt_path = facility_path.key("buildTime");
                match build_time.as_i64() {
                    None => self.fatal(bt_path, "buildTime must be an integer"),
                    Some(t) if t < 0 => self.warn(bt_path, "negative build time"),
                    Some(_) => {}
                }
            }
        }
    }

    fn check_soldiers(&mut self, soldiers: &Value, path: NodePath) {
        let Some(list) = soldiers.as_sequence() else {
            self.fatal(path, "soldiers must be a sequence");
            return;
        };
        for (j, soldier) in list.iter().enumerate() {
            let soldier_path = path.clone().index(j);
            if !soldier.is_mapping() {
                self.fatal(soldier_path, "soldier must be a mapping");
                continue;
            }
            for key in ["name", "currentStats"] {
                if soldier.get(key).is_none() {
                    self.fatal(soldier_path.clone().key(key), format!("soldier missing required key: {}", key));
                }
            }
            if let Some(stats) = soldier.get("currentStats") {
                self.check_stats(stats, soldier_path.key("currentStats"));
            }
        }
    }

    fn check_stats(&mut self, stats: &Value, path: NodePath) {
        if !stats.is_mapping() {
            self.fatal(path, "currentStats must be a mapping");
            return;
        }
        let (min, max) = STAT_RANGE;
        for stat in SOLDIER_STATS {
            let Some(value) = stats.get(*stat) else {
                continue;
            };
            let stat_path = path.clone().key(*stat);
            match value.as_i64() {
                None => self.fatal(stat_path, "stat must be an integer"),
                Some(n) if n < min || n > max => self.warn(
                    stat_path,
                    format!("value {} outside reasonable range ({}-{})", n, min, max),
                ),
                Some(_) => {}
            }
        }
    }

    fn check_calendar(&mut self, body: &Value) {
        if let Some(time) = body.get("time").filter(|t| t.is_mapping()) {
            for (field, min, max) in TIME_RANGES {
                let Some(value) = time.get(*field) else {
                    continue;
                };
                let in_range = value.as_i64().map_or(false, |n| n >= *min && n <= *max);
                if !in_range {
                    self.warn(
                        NodePath::root().key("time").key(*field),
                        format!("value {:?} outside reasonable range ({}-{})", value, min, max),
                    );
                }
            }
        }

        for (key, max) in [("monthsPassed", 1200), ("daysPassed", 36500)] {
            if let Some(n) = body.get(key).and_then(Value::as_i64) {
                if n < 0 || n > max {
                    self.warn(NodePath::root().key(key), format!("{} seems unreasonable", n));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    const VALID: &str = "\
difficulty: 2
monthsPassed: 3
funds: [1000, 900]
bases:
  - name: Alpha
    facilities:
      - type: STR_ACCESS_LIFT
    soldiers:
      - name: Ann
        currentStats: {tu: 60, firing: 70}
";

    #[test]
    fn test_valid_body() {
        let report = validate(&body(VALID));
        assert!(report.is_valid());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_missing_required_keys() {
        let report = validate(&body("difficulty: 1\n"));
        assert_eq!(report.fatal_count(), 2);
        assert!(report.fatal().any(|i| i.path.to_string() == "funds"));
        assert!(report.fatal().any(|i| i.path.to_string() == "bases"));
    }

    #[test]
    fn test_non_integer_funds_is_fatal() {
        let text = VALID.replace("funds: [1000, 900]", "funds: [lots, 900]");
        let report = validate(&body(&text));
        assert!(!report.is_valid());
        assert_eq!(report.fatal().next().unwrap().path.to_string(), "funds.0");
    }

    #[test]
    fn test_negative_funds_is_warning() {
        let text = VALID.replace("funds: [1000, 900]", "funds: [-5, 900]");
        let report = validate(&body(&text));
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_stat_out_of_range_is_warning() {
        let text = VALID.replace("firing: 70", "firing: 250");
        let report = validate(&body(&text));
        assert!(report.is_valid());
        let warning = report.warnings().next().unwrap();
        assert_eq!(warning.path.to_string(), "bases.0.soldiers.0.currentStats.firing");
    }

    #[test]
    fn test_facility_without_type() {
        let text = VALID.replace("- type: STR_ACCESS_LIFT", "- x: 1");
        let report = validate(&body(&text));
        assert_eq!(report.fatal_count(), 1);
    }

    #[test]
    fn test_calendar_warnings() {
        let text = format!("{}time: {{month: 13, day: 4}}\ndaysPassed: 40000\n", VALID);
        let report = validate(&body(&text));
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 2);
    }

    #[test]
    fn test_tagged_node_is_fatal() {
        let text = VALID.replace("name: Ann", "name: !hero Ann");
        let report = validate(&body(&text));
        assert!(!report.is_valid());
        assert_eq!(report.fatal().next().unwrap().path.to_string(), "bases.0.soldiers.0.name");
    }
}
