/// 资金编辑
///
/// `funds` 是按月记录的资金序列，下标 0 为本月，下标 1 为上月。
use crate::editor::Accessor;
use crate::node::NodePath;
use crate::utils::EditError;
use serde_yaml::Value;

fn funds_path(index: usize) -> NodePath {
    NodePath::root().key("funds").index(index)
}

/// 读取（本月, 上月）资金；结构异常时返回 (0, 0)
pub fn funds(acc: &Accessor<'_>) -> (i64, i64) {
    let Ok(entries) = acc.get(&NodePath::root().key("funds")) else {
        return (0, 0);
    };
    match entries.as_sequence().map(Vec::as_slice) {
        Some([current, previous, ..]) => (
            current.as_i64().unwrap_or(0),
            previous.as_i64().unwrap_or(0),
        ),
        _ => (0, 0),
    }
}

/// 同时设置本月与上月资金，其余历史记录保持不变
pub fn set_funds(acc: &mut Accessor<'_>, current: i64, previous: i64) -> Result<(), EditError> {
    if current < 0 {
        return Err(EditError::InvalidValue("本月资金不能为负数".to_string()));
    }
    if previous < 0 {
        return Err(EditError::InvalidValue("上月资金不能为负数".to_string()));
    }

    ensure_numeric(acc)?;
    // 先确认两个位置都存在，保证要么都写入要么都不写
    acc.get(&funds_path(0))?;
    acc.get(&funds_path(1))?;
    acc.set(&funds_path(0), current)?;
    acc.set(&funds_path(1), previous)
}

/// 只设置本月资金
pub fn set_current_funds(acc: &mut Accessor<'_>, amount: i64) -> Result<(), EditError> {
    if amount < 0 {
        return Err(EditError::InvalidValue("资金不能为负数".to_string()));
    }
    ensure_numeric(acc)?;
    acc.set(&funds_path(0), amount)
}

/// 增加（或减少）本月资金，结果最低为 0
///
/// # 返回
/// 新的本月资金
pub fn add_funds(acc: &mut Accessor<'_>, delta: i64) -> Result<i64, EditError> {
    ensure_numeric(acc)?;
    let (current, _) = funds(acc);
    let updated = current.saturating_add(delta).max(0);
    acc.set(&funds_path(0), updated)?;
    Ok(updated)
}

/// 资金显示格式（千分位）
pub fn format_funds(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// 资金序列是否全为整数
fn funds_are_numeric(body: &Value) -> bool {
    body.get("funds")
        .and_then(Value::as_sequence)
        .map_or(false, |entries| entries.iter().all(|v| v.as_i64().is_some()))
}

/// 资金序列含非整数值时拒绝编辑
fn ensure_numeric(acc: &Accessor<'_>) -> Result<(), EditError> {
    if funds_are_numeric(acc.node()) {
        Ok(())
    } else {
        Err(EditError::InvalidValue("资金序列包含非整数值".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixtures;

    #[test]
    fn test_read_funds() {
        let mut body = fixtures::body();
        let acc = Accessor::bind(&mut body, NodePath::root()).unwrap();
        assert_eq!(funds(&acc), (1000, 900));
    }

    #[test]
    fn test_malformed_funds() {
        let mut body: Value = serde_yaml::from_str("funds: 5\n").unwrap();
        let acc = Accessor::bind(&mut body, NodePath::root()).unwrap();
        assert_eq!(funds(&acc), (0, 0));
    }

    #[test]
    fn test_set_funds_keeps_history() {
        let mut body = fixtures::body();
        let mut acc = Accessor::bind(&mut body, NodePath::root()).unwrap();
        set_funds(&mut acc, 5000, 4000).unwrap();

        assert_eq!(funds(&acc), (5000, 4000));
        assert_eq!(acc.get_i64(&"funds.2".into()).unwrap(), 800);
        assert_eq!(acc.diff().len(), 2);
    }

    #[test]
    fn test_negative_rejected() {
        let mut body = fixtures::body();
        let mut acc = Accessor::bind(&mut body, NodePath::root()).unwrap();
        assert!(set_funds(&mut acc, -1, 0).is_err());
        assert!(set_current_funds(&mut acc, -1).is_err());
        assert!(!acc.has_changes());
    }

    #[test]
    fn test_add_funds_clamps_at_zero() {
        let mut body = fixtures::body();
        let mut acc = Accessor::bind(&mut body, NodePath::root()).unwrap();
        assert_eq!(add_funds(&mut acc, 500).unwrap(), 1500);
        assert_eq!(add_funds(&mut acc, -10_000).unwrap(), 0);
    }

    #[test]
    fn test_format_funds() {
        assert_eq!(format_funds(0), "$0");
        assert_eq!(format_funds(1234567), "$1,234,567");
        assert_eq!(format_funds(-1000), "-$1,000");
    }

    #[test]
    fn test_funds_are_numeric() {
        assert!(funds_are_numeric(&fixtures::body()));
        let body: Value = serde_yaml::from_str("funds: [a, 1]\n").unwrap();
        assert!(!funds_are_numeric(&body));
    }

    #[test]
    fn test_non_numeric_funds_block_edits() {
        let mut body: Value = serde_yaml::from_str("funds: [lots, 900]\n").unwrap();
        let mut acc = Accessor::bind(&mut body, NodePath::root()).unwrap();

        assert!(matches!(set_funds(&mut acc, 5, 5), Err(EditError::InvalidValue(_))));
        assert!(matches!(set_current_funds(&mut acc, 5), Err(EditError::InvalidValue(_))));
        assert!(matches!(add_funds(&mut acc, 5), Err(EditError::InvalidValue(_))));
        assert!(!acc.has_changes());
    }
}
