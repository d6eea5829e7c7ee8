/// 基地设施建造
///
/// 存在且大于 0 的 `buildTime` 表示设施仍在建造中，完成即删除该键。
use serde::Serialize;

use super::{base_names, base_path, for_each_entry, put_int};
use crate::editor::Accessor;
use crate::node::{int_field, str_field, NodePath};
use crate::utils::{format_item_name, EditError};

/// 设施视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facility {
    pub base_index: usize,
    pub base_name: String,
    pub index: usize,
    pub facility_type: String,
    pub display_name: String,
    pub x: i64,
    pub y: i64,
    /// 剩余建造天数（0 表示已完成）
    pub build_time: i64,
}

impl Facility {
    pub fn is_under_construction(&self) -> bool {
        self.build_time > 0
    }

    fn build_time_path(&self) -> NodePath {
        facility_path(self.base_index, self.index).key("buildTime")
    }
}

fn facility_path(base_index: usize, index: usize) -> NodePath {
    base_path(base_index).key("facilities").index(index)
}

/// 列出所有设施
pub fn list(acc: &Accessor<'_>) -> Vec<Facility> {
    let body = acc.node();
    let names = base_names(body);
    let mut facilities = Vec::new();

    for_each_entry(body, "facilities", |base_index, index, entry| {
        let facility_type = str_field(entry, "type").unwrap_or("UNKNOWN").to_string();
        facilities.push(Facility {
            base_index,
            base_name: names[base_index].clone(),
            index,
            display_name: format_item_name(&facility_type),
            facility_type,
            x: int_field(entry, "x", 0),
            y: int_field(entry, "y", 0),
            build_time: int_field(entry, "buildTime", 0),
        });
    });

    facilities
}

/// 正在建造的设施
pub fn under_construction(acc: &Accessor<'_>) -> Vec<Facility> {
    list(acc).into_iter().filter(Facility::is_under_construction).collect()
}

fn find(acc: &Accessor<'_>, base_index: usize, index: usize) -> Result<Facility, EditError> {
    list(acc)
        .into_iter()
        .find(|f| f.base_index == base_index && f.index == index)
        .ok_or_else(|| EditError::Path {
            path: facility_path(base_index, index),
            reason: "facility not found".to_string(),
        })
}

fn finish(acc: &mut Accessor<'_>, facility: &Facility) -> Result<(), EditError> {
    acc.remove(&facility.build_time_path())?;
    log::debug!("设施建造完成: {} ({})", facility.display_name, facility.base_name);
    Ok(())
}

/// 立即完成单个设施
///
/// # 返回
/// 是否发生了修改
pub fn complete(acc: &mut Accessor<'_>, base_index: usize, index: usize) -> Result<bool, EditError> {
    let facility = find(acc, base_index, index)?;
    if !facility.is_under_construction() {
        return Ok(false);
    }
    finish(acc, &facility)?;
    Ok(true)
}

/// 完成所有建造中的设施
pub fn complete_all(acc: &mut Accessor<'_>) -> Result<usize, EditError> {
    let pending = under_construction(acc);
    for facility in &pending {
        finish(acc, facility)?;
    }
    Ok(pending.len())
}

/// 完成指定基地中建造中的设施
pub fn complete_in_base(acc: &mut Accessor<'_>, base_index: usize) -> Result<usize, EditError> {
    let pending: Vec<Facility> = under_construction(acc)
        .into_iter()
        .filter(|f| f.base_index == base_index)
        .collect();
    for facility in &pending {
        finish(acc, facility)?;
    }
    Ok(pending.len())
}

/// 设置剩余建造天数，`days <= 0` 等同于立即完成
pub fn set_build_time(acc: &mut Accessor<'_>, base_index: usize, index: usize, days: i64) -> Result<(), EditError> {
    let facility = find(acc, base_index, index)?;
    if days <= 0 {
        if facility.is_under_construction() {
            finish(acc, &facility)?;
        }
        return Ok(());
    }

    put_int(acc, &facility.build_time_path(), days)
}
