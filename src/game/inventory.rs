/// 基地库存编辑
///
/// 库存是 `bases.<n>.items` 映射：物品标识 -> 数量。
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

use super::{base_names, base_path, bases};
use crate::editor::Accessor;
use crate::node::{NodeKind, NodePath};
use crate::utils::{format_item_name, EditError};

/// 统计中列出的热门物品数量
pub const TOP_ITEMS: usize = 10;

/// 基地间复制库存的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CopyMode {
    /// 目标库存整体替换为源库存
    Replace,
    /// 源数量累加到目标
    Add,
    /// 每种物品取两边的较大值
    Merge,
}

/// 库存条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryItem {
    pub base_index: usize,
    pub base_name: String,
    pub item: String,
    pub display_name: String,
    pub quantity: i64,
}

fn items_path(base_index: usize) -> NodePath {
    base_path(base_index).key("items")
}

/// 列出指定基地的库存（按存档中的顺序）
pub fn list(acc: &Accessor<'_>, base_index: usize) -> Vec<InventoryItem> {
    let body = acc.node();
    let base_name = base_names(body).get(base_index).cloned().unwrap_or_default();
    let Some(items) = bases(body)
        .get(base_index)
        .and_then(|base| base.get("items"))
        .and_then(Value::as_mapping)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|(k, v)| {
            let item = k.as_str()?.to_string();
            Some(InventoryItem {
                base_index,
                base_name: base_name.clone(),
                display_name: format_item_name(&item),
                item,
                quantity: v.as_i64()?,
            })
        })
        .collect()
}

/// 物品数量（不存在时为 0）
pub fn quantity(acc: &Accessor<'_>, base_index: usize, item: &str) -> i64 {
    acc.get(&items_path(base_index).key(item))
        .ok()
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

/// 设置物品数量
///
/// - 数量为 0：删除该物品
/// - 物品不存在：追加到库存末尾
/// - 数量为负：拒绝
pub fn set_quantity(acc: &mut Accessor<'_>, base_index: usize, item: &str, quantity: i64) -> Result<(), EditError> {
    if quantity < 0 {
        return Err(EditError::InvalidValue("物品数量不能为负数".to_string()));
    }

    let items = items_path(base_index);
    let path = items.clone().key(item);
    let exists = acc.get(&path).is_ok();

    match (exists, quantity) {
        (true, 0) => {
            acc.remove(&path)?;
        }
        (false, 0) => {}
        (true, _) => acc.set(&path, quantity)?,
        (false, _) => {
            // items 映射本身不存在时不会自动创建
            acc.get(&items)?;
            acc.insert(&path, quantity)?;
        }
    }
    log::debug!("库存 {} 设为 {}", item, quantity);
    Ok(())
}

/// 增加物品
///
/// # 返回
/// 新的数量
pub fn add_item(acc: &mut Accessor<'_>, base_index: usize, item: &str, count: i64) -> Result<i64, EditError> {
    if count <= 0 {
        return Err(EditError::InvalidValue("增加的数量必须大于 0".to_string()));
    }
    let updated = quantity(acc, base_index, item).saturating_add(count);
    set_quantity(acc, base_index, item, updated)?;
    Ok(updated)
}

/// 移除物品
///
/// # 参数
/// * `count` - `None` 表示全部移除，否则移除指定数量（最低减到 0）
pub fn remove_item(acc: &mut Accessor<'_>, base_index: usize, item: &str, count: Option<i64>) -> Result<i64, EditError> {
    let current = quantity(acc, base_index, item);
    let updated = match count {
        None => 0,
        Some(n) if n <= 0 => {
            return Err(EditError::InvalidValue("移除的数量必须大于 0".to_string()));
        }
        Some(n) => current.saturating_sub(n).max(0),
    };
    if current == 0 {
        return Ok(0);
    }
    set_quantity(acc, base_index, item, updated)?;
    Ok(updated)
}

/// 所有基地的物品总数
pub fn totals(acc: &Accessor<'_>) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for base_index in 0..bases(acc.node()).len() {
        for entry in list(acc, base_index) {
            let total = totals.entry(entry.item).or_insert(0i64);
            *total = total.saturating_add(entry.quantity);
        }
    }
    totals
}

/// 把一个基地的库存复制到另一个基地
///
/// # 参数
/// * `mode` - `Replace` 直接替换 `bases.<to>.items`；`Add` / `Merge` 逐项调用 [`set_quantity`]
///
/// # 返回
/// 涉及的物品种类数（`Merge` 为两边的并集）
pub fn copy_between_bases(acc: &mut Accessor<'_>, from: usize, to: usize, mode: CopyMode) -> Result<usize, EditError> {
    acc.get(&base_path(to))?;
    let source_items = acc.get(&items_path(from))?;
    let Some(source_map) = source_items.as_mapping() else {
        return Err(EditError::TypeMismatch {
            path: items_path(from),
            expected: NodeKind::Mapping,
            found: NodeKind::of(source_items),
        });
    };
    let source_map = source_map.clone();
    let source = list(acc, from);

    let touched = match mode {
        CopyMode::Replace => {
            let target = items_path(to);
            if acc.get(&target).is_ok() {
                acc.set(&target, Value::Mapping(source_map))?;
            } else {
                acc.insert(&target, Value::Mapping(source_map))?;
            }
            source.len()
        }
        CopyMode::Add => {
            acc.get(&items_path(to))?;
            for entry in &source {
                let updated = quantity(acc, to, &entry.item).saturating_add(entry.quantity.max(0));
                set_quantity(acc, to, &entry.item, updated.max(0))?;
            }
            source.len()
        }
        CopyMode::Merge => {
            acc.get(&items_path(to))?;
            let target_only = list(acc, to)
                .iter()
                .filter(|t| !source.iter().any(|s| s.item == t.item))
                .count();
            for entry in &source {
                let merged = quantity(acc, to, &entry.item).max(entry.quantity).max(0);
                set_quantity(acc, to, &entry.item, merged)?;
            }
            source.len() + target_only
        }
    };

    log::debug!("库存复制: 基地 {} -> {} ({:?}, {} 种)", from, to, mode, touched);
    Ok(touched)
}

/// 一次设置多种物品的数量
///
/// 先检查全部数量，任何一个为负数时不做任何修改。
///
/// # 返回
/// 修改的物品种类数
pub fn bulk_modify(acc: &mut Accessor<'_>, base_index: usize, edits: &[(String, i64)]) -> Result<usize, EditError> {
    if let Some((item, _)) = edits.iter().find(|(_, quantity)| *quantity < 0) {
        return Err(EditError::InvalidValue(format!("物品数量不能为负数: {}", item)));
    }
    if edits.iter().any(|(_, quantity)| *quantity > 0) {
        acc.get(&items_path(base_index))?;
    }
    for (item, quantity) in edits {
        set_quantity(acc, base_index, item, *quantity)?;
    }
    Ok(edits.len())
}

/// 物品合计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTotal {
    pub item: String,
    pub display_name: String,
    pub quantity: i64,
}

/// 单个基地的库存概况
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseInventory {
    pub name: String,
    pub item_types: usize,
    pub total_items: i64,
    /// 按数量从多到少排列
    pub items: Vec<InventoryItem>,
}

/// 全部基地的库存概况
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventorySummary {
    pub unique_items: usize,
    pub total_quantity: i64,
    /// 数量最多的前 [`TOP_ITEMS`] 种物品
    pub top_items: Vec<ItemTotal>,
    pub bases: Vec<BaseInventory>,
}

fn sum_quantities(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0i64, i64::saturating_add)
}

/// 库存概况
pub fn summary(acc: &Accessor<'_>) -> InventorySummary {
    let totals = totals(acc);

    let mut top_items: Vec<ItemTotal> = totals
        .iter()
        .map(|(item, quantity)| ItemTotal {
            item: item.clone(),
            display_name: format_item_name(item),
            quantity: *quantity,
        })
        .collect();
    top_items.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    top_items.truncate(TOP_ITEMS);

    let names = base_names(acc.node());
    let bases = (0..names.len())
        .map(|base_index| {
            let mut items = list(acc, base_index);
            items.sort_by(|a, b| b.quantity.cmp(&a.quantity));
            BaseInventory {
                name: names[base_index].clone(),
                item_types: items.len(),
                total_items: sum_quantities(items.iter().map(|i| i.quantity)),
                items,
            }
        })
        .collect();

    InventorySummary {
        unique_items: totals.len(),
        total_quantity: sum_quantities(totals.values().copied()),
        top_items,
        bases,
    }
}

/// 按原始标识或显示名称搜索（不区分大小写）
pub fn search(acc: &Accessor<'_>, query: &str) -> Vec<InventoryItem> {
    let query = query.to_lowercase();
    (0..bases(acc.node()).len())
        .flat_map(|base_index| list(acc, base_index))
        .filter(|entry| {
            entry.item.to_lowercase().contains(&query) || entry.display_name.to_lowercase().contains(&query)
        })
        .collect()
}
