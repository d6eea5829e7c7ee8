/// 研究项目编辑
///
/// 研究条目位于 `bases.<n>.research`，`spent >= cost` 即视为完成。
use serde::Serialize;

use super::{base_names, base_path, for_each_entry, put_int};
use crate::editor::Accessor;
use crate::node::{int_field, str_field, NodePath};
use crate::utils::{format_item_name, EditError};

/// 研究项目视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchProject {
    pub base_index: usize,
    pub base_name: String,
    pub index: usize,
    /// 原始标识（如 `STR_LASER_WEAPONS`）
    pub name: String,
    pub display_name: String,
    pub spent: i64,
    pub cost: i64,
    pub assigned: i64,
}

impl ResearchProject {
    pub fn is_complete(&self) -> bool {
        self.spent >= self.cost
    }

    /// 进度百分比（0-100）
    pub fn progress_percent(&self) -> f64 {
        if self.cost <= 0 {
            return 100.0;
        }
        (self.spent as f64 / self.cost as f64 * 100.0).clamp(0.0, 100.0)
    }

    fn spent_path(&self) -> NodePath {
        entry_path(self.base_index, self.index).key("spent")
    }
}

/// 研究统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResearchSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

fn entry_path(base_index: usize, index: usize) -> NodePath {
    base_path(base_index).key("research").index(index)
}

/// 列出所有基地的研究项目
pub fn list(acc: &Accessor<'_>) -> Vec<ResearchProject> {
    let body = acc.node();
    let names = base_names(body);
    let mut projects = Vec::new();

    for_each_entry(body, "research", |base_index, index, entry| {
        let name = str_field(entry, "project")
            .or_else(|| str_field(entry, "name"))
            .unwrap_or("UNKNOWN")
            .to_string();
        projects.push(ResearchProject {
            base_index,
            base_name: names[base_index].clone(),
            index,
            display_name: format_item_name(&name),
            name,
            spent: int_field(entry, "spent", 0),
            cost: int_field(entry, "cost", 0),
            assigned: int_field(entry, "assigned", 0),
        });
    });

    projects
}

fn find(acc: &Accessor<'_>, base_index: usize, index: usize) -> Result<ResearchProject, EditError> {
    list(acc)
        .into_iter()
        .find(|p| p.base_index == base_index && p.index == index)
        .ok_or_else(|| EditError::Path {
            path: entry_path(base_index, index),
            reason: "research project not found".to_string(),
        })
}

/// 完成单个研究项目（`spent = cost`）
///
/// # 返回
/// 是否发生了修改（已完成的项目不动）
pub fn complete(acc: &mut Accessor<'_>, base_index: usize, index: usize) -> Result<bool, EditError> {
    let project = find(acc, base_index, index)?;
    if project.is_complete() {
        return Ok(false);
    }
    put_int(acc, &project.spent_path(), project.cost)?;
    log::debug!("完成研究: {} ({})", project.display_name, project.base_name);
    Ok(true)
}

fn complete_where(acc: &mut Accessor<'_>, filter: impl Fn(&ResearchProject) -> bool) -> Result<usize, EditError> {
    let pending: Vec<ResearchProject> = list(acc)
        .into_iter()
        .filter(|p| !p.is_complete() && filter(p))
        .collect();
    for project in &pending {
        put_int(acc, &project.spent_path(), project.cost)?;
    }
    Ok(pending.len())
}

/// 完成所有基地的全部研究
///
/// # 返回
/// 完成的项目数量
pub fn complete_all(acc: &mut Accessor<'_>) -> Result<usize, EditError> {
    complete_where(acc, |_| true)
}

/// 完成指定基地的全部研究
pub fn complete_in_base(acc: &mut Accessor<'_>, base_index: usize) -> Result<usize, EditError> {
    complete_where(acc, |p| p.base_index == base_index)
}

/// 设置研究进度百分比
///
/// # 参数
/// * `percent` - 进度，超出 0-100 时截断
pub fn set_progress(acc: &mut Accessor<'_>, base_index: usize, index: usize, percent: f64) -> Result<(), EditError> {
    if percent.is_nan() {
        return Err(EditError::InvalidValue("进度不是有效数字".to_string()));
    }
    let project = find(acc, base_index, index)?;
    let percent = percent.clamp(0.0, 100.0);
    let spent = (project.cost as f64 * percent / 100.0).floor() as i64;
    put_int(acc, &project.spent_path(), spent)
}

/// 研究统计
pub fn summary(acc: &Accessor<'_>) -> ResearchSummary {
    let projects = list(acc);
    let completed = projects.iter().filter(|p| p.is_complete()).count();
    ResearchSummary {
        total: projects.len(),
        completed,
        in_progress: projects.len() - completed,
    }
}
