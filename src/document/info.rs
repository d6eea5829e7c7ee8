use serde::Serialize;
use serde_yaml::Value;

use super::SaveDocument;
use crate::game::{base_names, for_each_entry, money};
use crate::node::int_field;

/// 存档概要信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveInfo {
    pub name: String,
    pub version: String,
    pub engine: String,
    pub difficulty: i64,
    pub months_passed: i64,
    pub days_passed: i64,
    pub current_funds: i64,
    pub previous_funds: i64,
    pub bases: Vec<String>,
    pub research_count: usize,
    pub research_completed: usize,
    pub facility_count: usize,
    pub facilities_under_construction: usize,
    pub production_count: usize,
    pub soldier_count: usize,
}

impl std::fmt::Display for SaveInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 存档信息 ===")?;
        writeln!(f, "名称: {}", self.name)?;
        writeln!(f, "版本: {}", self.version)?;
        writeln!(f, "引擎: {}", self.engine)?;
        writeln!(f, "难度: {}", self.difficulty)?;
        writeln!(f, "已过月数: {}  已过天数: {}", self.months_passed, self.days_passed)?;
        writeln!(
            f,
            "资金: {} (上月 {})",
            money::format_funds(self.current_funds),
            money::format_funds(self.previous_funds)
        )?;
        writeln!(f, "基地 ({}): {}", self.bases.len(), self.bases.join(", "))?;
        writeln!(f, "研究项目: {} (已完成 {})", self.research_count, self.research_completed)?;
        writeln!(f, "设施: {} (建造中 {})", self.facility_count, self.facilities_under_construction)?;
        writeln!(f, "生产条目: {}", self.production_count)?;
        writeln!(f, "士兵: {}", self.soldier_count)?;
        Ok(())
    }
}

impl SaveDocument {
    /// 获取概要信息
    pub fn info(&self) -> SaveInfo {
        let body = &self.body;

        let text = |key: &str| -> String {
            self.header_field(key)
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => String::new(),
                })
                .unwrap_or_else(|| "Unknown".to_string())
        };

        let funds = body.get("funds").and_then(Value::as_sequence);
        let fund_at = |i: usize| {
            funds
                .and_then(|seq| seq.get(i))
                .and_then(Value::as_i64)
                .unwrap_or(0)
        };

        let mut research_count = 0;
        let mut research_completed = 0;
        for_each_entry(body, "research", |_, _, entry| {
            research_count += 1;
            if int_field(entry, "spent", 0) >= int_field(entry, "cost", 0) {
                research_completed += 1;
            }
        });

        let mut facility_count = 0;
        let mut facilities_under_construction = 0;
        for_each_entry(body, "facilities", |_, _, entry| {
            facility_count += 1;
            if int_field(entry, "buildTime", 0) > 0 {
                facilities_under_construction += 1;
            }
        });

        SaveInfo {
            name: text("name"),
            version: text("version"),
            engine: text("engine"),
            difficulty: int_field(body, "difficulty", 0),
            months_passed: int_field(body, "monthsPassed", 0),
            days_passed: int_field(body, "daysPassed", 0),
            current_funds: fund_at(0),
            previous_funds: fund_at(1),
            bases: base_names(body),
            research_count,
            research_completed,
            facility_count,
            facilities_under_construction,
            production_count: count_entries(body, "productions"),
            soldier_count: count_entries(body, "soldiers"),
        }
    }
}

fn count_entries(body: &Value, list_key: &str) -> usize {
    let mut count = 0;
    for_each_entry(body, list_key, |_, _, _| count += 1);
    count
}
