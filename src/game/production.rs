/// 生产队列编辑
use serde::Serialize;
use serde_yaml::Value;

use super::{base_names, base_path, for_each_entry, put_int};
use crate::editor::Accessor;
use crate::node::{int_field, str_field, NodePath};
use crate::utils::{format_item_name, EditError};

/// 生产条目视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionItem {
    pub base_index: usize,
    pub base_name: String,
    pub index: usize,
    pub item: String,
    pub display_name: String,
    /// 分配的工程师数量
    pub assigned: i64,
    /// 已投入工时
    pub spent: i64,
    pub amount: i64,
    pub infinite: bool,
}

impl ProductionItem {
    pub fn is_active(&self) -> bool {
        self.assigned > 0 || self.spent > 0
    }

    /// 完成当前批次所需的工时
    pub fn completion_spent(&self) -> i64 {
        if self.infinite {
            self.spent.saturating_add(50).max(100)
        } else {
            self.spent.saturating_add(self.amount.saturating_mul(10)).max(100)
        }
    }

    fn path(&self) -> NodePath {
        entry_path(self.base_index, self.index)
    }
}

fn entry_path(base_index: usize, index: usize) -> NodePath {
    base_path(base_index).key("productions").index(index)
}

/// 列出所有生产条目
pub fn list(acc: &Accessor<'_>) -> Vec<ProductionItem> {
    let body = acc.node();
    let names = base_names(body);
    let mut items = Vec::new();

    for_each_entry(body, "productions", |base_index, index, entry| {
        let item = str_field(entry, "item").unwrap_or("UNKNOWN").to_string();
        items.push(ProductionItem {
            base_index,
            base_name: names[base_index].clone(),
            index,
            display_name: format_item_name(&item),
            item,
            assigned: int_field(entry, "assigned", 0),
            spent: int_field(entry, "spent", 0),
            amount: int_field(entry, "amount", 1),
            infinite: entry.get("infinite").and_then(Value::as_bool).unwrap_or(false),
        });
    });

    items
}

/// 进行中的生产（有工程师或已投入工时）
pub fn active(acc: &Accessor<'_>) -> Vec<ProductionItem> {
    list(acc).into_iter().filter(ProductionItem::is_active).collect()
}

fn find(acc: &Accessor<'_>, base_index: usize, index: usize) -> Result<ProductionItem, EditError> {
    list(acc)
        .into_iter()
        .find(|p| p.base_index == base_index && p.index == index)
        .ok_or_else(|| EditError::Path {
            path: entry_path(base_index, index),
            reason: "production item not found".to_string(),
        })
}

fn finish(acc: &mut Accessor<'_>, item: &ProductionItem) -> Result<(), EditError> {
    put_int(acc, &item.path().key("spent"), item.completion_spent())?;
    log::debug!("完成生产: {} ({})", item.display_name, item.base_name);
    Ok(())
}

/// 完成单个生产条目的当前批次
pub fn complete(acc: &mut Accessor<'_>, base_index: usize, index: usize) -> Result<(), EditError> {
    let item = find(acc, base_index, index)?;
    finish(acc, &item)
}

/// 完成所有进行中的生产
///
/// # 返回
/// 完成的条目数量
pub fn complete_all(acc: &mut Accessor<'_>) -> Result<usize, EditError> {
    let pending = active(acc);
    for item in &pending {
        finish(acc, item)?;
    }
    Ok(pending.len())
}

/// 完成指定基地中进行中的生产
pub fn complete_in_base(acc: &mut Accessor<'_>, base_index: usize) -> Result<usize, EditError> {
    let pending: Vec<ProductionItem> = active(acc)
        .into_iter()
        .filter(|p| p.base_index == base_index)
        .collect();
    for item in &pending {
        finish(acc, item)?;
    }
    Ok(pending.len())
}

/// 设置已投入工时（负数按 0 处理）
pub fn set_progress(acc: &mut Accessor<'_>, base_index: usize, index: usize, hours: i64) -> Result<(), EditError> {
    let item = find(acc, base_index, index)?;
    put_int(acc, &item.path().key("spent"), hours.max(0))
}

/// 设置生产数量
pub fn set_amount(acc: &mut Accessor<'_>, base_index: usize, index: usize, amount: i64) -> Result<(), EditError> {
    if amount < 1 {
        return Err(EditError::InvalidValue("生产数量至少为 1".to_string()));
    }
    let item = find(acc, base_index, index)?;
    put_int(acc, &item.path().key("amount"), amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixtures;

    #[test]
    fn test_list_and_active() {
        let mut body = fixtures::body();
        let acc = Accessor::bind(&mut body, NodePath::root()).unwrap();
        let items = list(&acc);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].display_name, "Medi Kit");
        assert_eq!(items[2].amount, 1);
        assert!(items[2].infinite);
        assert_eq!(active(&acc).len(), 2);
    }

    #[test]
    fn test_completion_spent() {
        let mut body = fixtures::body();
        let acc = Accessor::bind(&mut body, NodePath::root()).unwrap();
        let items = list(&acc);

        // 20 + 3 * 10 = 50 < 100
        assert_eq!(items[0].completion_spent(), 100);
        // 无限生产：max(100, 5 + 50)
        assert_eq!(items[2].completion_spent(), 100);
    }

    #[test]
    fn test_complete_large_batch() {
        let mut body: Value = serde_yaml::from_str(
            "bases:\n  - productions:\n      - item: STR_GRENADE\n        spent: 80\n        amount: 5\n",
        )
        .unwrap();
        let mut acc = Accessor::bind(&mut body, NodePath::root()).unwrap();

        complete(&mut acc, 0, 0).unwrap();
        assert_eq!(acc.get_i64(&"bases.0.productions.0.spent".into()).unwrap(), 130);
    }

    #[test]
    fn test_complete_with_huge_values() {
        let mut body: Value = serde_yaml::from_str(
            "bases:\n  - productions:\n      - {item: STR_A, spent: 9223372036854775807, infinite: true}\n      - {item: STR_B, spent: 1, amount: 9223372036854775807}\n",
        )
        .unwrap();
        let mut acc = Accessor::bind(&mut body, NodePath::root()).unwrap();

        assert_eq!(complete_all(&mut acc).unwrap(), 2);
        assert_eq!(acc.get_i64(&"bases.0.productions.0.spent".into()).unwrap(), i64::MAX);
        assert_eq!(acc.get_i64(&"bases.0.productions.1.spent".into()).unwrap(), i64::MAX);
    }

    #[test]
    fn test_complete_all_and_per_base() {
        let mut body = fixtures::body();
        let mut acc = Accessor::bind(&mut body, NodePath::root()).unwrap();

        assert_eq!(complete_in_base(&mut acc, 1).unwrap(), 1);
        assert_eq!(complete_all(&mut acc).unwrap(), 2);
        assert_eq!(acc.get_i64(&"bases.0.productions.1.spent".into()).unwrap(), 0);
    }

    #[test]
    fn test_set_progress_and_amount() {
        let mut body = fixtures::body();
        let mut acc = Accessor::bind(&mut body, NodePath::root()).unwrap();

        set_progress(&mut acc, 0, 0, -5).unwrap();
        assert_eq!(list(&acc)[0].spent, 0);

        set_amount(&mut acc, 1, 0, 4).unwrap();
        assert_eq!(list(&acc)[2].amount, 4);
        assert!(acc.diff().iter().any(|c| c.is_added()));

        assert!(set_amount(&mut acc, 0, 0, 0).is_err());
    }
}
