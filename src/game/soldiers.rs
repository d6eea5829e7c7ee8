/// 士兵属性编辑
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

use super::{base_names, base_path, for_each_entry, put_int};
use crate::editor::Accessor;
use crate::node::{int_field, str_field, NodePath};
use crate::utils::EditError;

/// 士兵可编辑的属性名（`currentStats` 下的键）
pub const SOLDIER_STATS: &[&str] = &[
    "tu",
    "stamina",
    "health",
    "bravery",
    "reactions",
    "firing",
    "throwing",
    "strength",
    "psiStrength",
    "psiSkill",
    "melee",
    "mana",
];

/// 属性值上限（8 位）
pub const STAT_LIMIT: i64 = 255;

/// 士兵视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Soldier {
    pub base_index: usize,
    pub base_name: String,
    pub index: usize,
    pub name: String,
    pub rank: i64,
    pub missions: i64,
    pub kills: i64,
    /// 当前属性（只包含存档中存在的属性）
    pub stats: BTreeMap<String, i64>,
}

impl Soldier {
    pub fn stat(&self, name: &str) -> i64 {
        self.stats.get(name).copied().unwrap_or(0)
    }

    fn stats_path(&self) -> NodePath {
        soldier_path(self.base_index, self.index).key("currentStats")
    }
}

/// 单项属性统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRange {
    pub min: i64,
    pub max: i64,
    pub avg: f64,
}

/// 士兵统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SoldierSummary {
    pub total: usize,
    /// 每个基地的士兵数量（基地名, 数量）
    pub per_base: Vec<(String, usize)>,
    pub stats: BTreeMap<String, StatRange>,
}

fn soldier_path(base_index: usize, index: usize) -> NodePath {
    base_path(base_index).key("soldiers").index(index)
}

/// 列出所有士兵
pub fn list(acc: &Accessor<'_>) -> Vec<Soldier> {
    let body = acc.node();
    let names = base_names(body);
    let mut soldiers = Vec::new();

    for_each_entry(body, "soldiers", |base_index, index, entry| {
        let stats = entry
            .get("currentStats")
            .and_then(Value::as_mapping)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.as_i64()?)))
                    .collect()
            })
            .unwrap_or_default();

        soldiers.push(Soldier {
            base_index,
            base_name: names[base_index].clone(),
            index,
            name: str_field(entry, "name")
                .map(str::to_string)
                .unwrap_or_else(|| format!("Soldier {}", index + 1)),
            rank: int_field(entry, "rank", 0),
            missions: int_field(entry, "missions", 0),
            kills: int_field(entry, "kills", 0),
            stats,
        });
    });

    soldiers
}

fn find(acc: &Accessor<'_>, base_index: usize, index: usize) -> Result<Soldier, EditError> {
    list(acc)
        .into_iter()
        .find(|s| s.base_index == base_index && s.index == index)
        .ok_or_else(|| EditError::Path {
            path: soldier_path(base_index, index),
            reason: "soldier not found".to_string(),
        })
}

/// 设置单项属性
///
/// 属性不存在时在 `currentStats` 中新增。
///
/// # 参数
/// * `stat` - 属性名，必须在 [`SOLDIER_STATS`] 中
/// * `value` - 0-255
pub fn set_stat(
    acc: &mut Accessor<'_>,
    base_index: usize,
    index: usize,
    stat: &str,
    value: i64,
) -> Result<(), EditError> {
    if !SOLDIER_STATS.contains(&stat) {
        return Err(EditError::InvalidValue(format!("未知属性: {}", stat)));
    }
    if !(0..=STAT_LIMIT).contains(&value) {
        return Err(EditError::InvalidValue(format!("属性值必须在 0-{} 之间", STAT_LIMIT)));
    }
    let soldier = find(acc, base_index, index)?;
    put_int(acc, &soldier.stats_path().key(stat), value)
}

fn max_soldier(acc: &mut Accessor<'_>, soldier: &Soldier, value: i64) -> Result<(), EditError> {
    for stat in SOLDIER_STATS {
        if soldier.stats.contains_key(*stat) {
            acc.set(&soldier.stats_path().key(*stat), value)?;
        }
    }
    log::debug!("士兵属性拉满: {} -> {}", soldier.name, value);
    Ok(())
}

fn max_where(acc: &mut Accessor<'_>, value: i64, filter: impl Fn(&Soldier) -> bool) -> Result<usize, EditError> {
    let value = value.clamp(1, STAT_LIMIT);
    let targets: Vec<Soldier> = list(acc).into_iter().filter(|s| filter(s)).collect();
    for soldier in &targets {
        max_soldier(acc, soldier, value)?;
    }
    Ok(targets.len())
}

/// 把单个士兵已有的属性全部设为 `value`（截断到 1-255）
///
/// 只改写 `currentStats` 中已存在的属性，缺失的属性不会被补上
/// （例如未解锁的 `psiSkill` 或 `mana`）。需要新增属性时用 [`set_stat`]。
pub fn max_stats(acc: &mut Accessor<'_>, base_index: usize, index: usize, value: i64) -> Result<(), EditError> {
    let soldier = find(acc, base_index, index)?;
    max_soldier(acc, &soldier, value.clamp(1, STAT_LIMIT))
}

/// 所有士兵属性拉满
///
/// 与 [`max_stats`] 相同，只改写每个士兵已有的属性。
///
/// # 返回
/// 修改的士兵数量
pub fn max_all(acc: &mut Accessor<'_>, value: i64) -> Result<usize, EditError> {
    max_where(acc, value, |_| true)
}

/// 指定基地的士兵属性拉满
pub fn max_in_base(acc: &mut Accessor<'_>, base_index: usize, value: i64) -> Result<usize, EditError> {
    max_where(acc, value, |s| s.base_index == base_index)
}

/// 士兵统计
pub fn summary(acc: &Accessor<'_>) -> SoldierSummary {
    let soldiers = list(acc);
    let names = base_names(acc.node());

    let per_base = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), soldiers.iter().filter(|s| s.base_index == i).count()))
        .collect();

    let mut stats = BTreeMap::new();
    for stat in SOLDIER_STATS {
        let values: Vec<i64> = soldiers.iter().filter_map(|s| s.stats.get(*stat).copied()).collect();
        let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
            continue;
        };
        let avg = values.iter().map(|v| *v as i128).sum::<i128>() as f64 / values.len() as f64;
        stats.insert(
            stat.to_string(),
            StatRange {
                min: *min,
                max: *max,
                avg,
            },
        );
    }

    SoldierSummary {
        total: soldiers.len(),
        per_base,
        stats,
    }
}
