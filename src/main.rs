use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use xcom_save_editor::editor::{diff, Accessor};
use xcom_save_editor::game::inventory::CopyMode;
use xcom_save_editor::game::{facilities, inventory, money, production, research, soldiers};
use xcom_save_editor::{
    AtomicSaveWriter, ChangeRecord, EditError, EditorConfig, NodePath, SaveDocument, SaveEditor, SaveError,
    SUPPORTED_EXTENSIONS,
};

#[derive(Parser)]
#[command(name = "xcom_save_editor")]
#[command(about = "OpenXCom Extended 存档编辑器")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 只显示将要发生的修改，不写入文件
    #[arg(long, global = true)]
    dry_run: bool,

    /// 以 JSON 格式输出
    #[arg(long, global = true)]
    json: bool,

    /// 静默模式(仅输出错误)
    #[arg(long, global = true)]
    quiet: bool,

    /// 输出详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 备份目录名（位于存档同级目录）
    #[arg(long, global = true, default_value = "backups")]
    backup_dir: String,
}

#[derive(Subcommand)]
enum Command {
    /// 显示存档概要信息
    Info {
        input: PathBuf,
    },
    /// 对比两个存档的主体差异
    Compare {
        input: PathBuf,
        other: PathBuf,
    },
    /// 查看或修改资金
    Funds {
        input: PathBuf,
        /// 设置本月资金
        #[arg(long)]
        set: Option<i64>,
        /// 同时设置上月资金（需配合 --set）
        #[arg(long, requires = "set")]
        previous: Option<i64>,
        /// 增加资金（可为负数）
        #[arg(long, allow_hyphen_values = true, conflicts_with = "set")]
        add: Option<i64>,
    },
    /// 查看或完成研究项目
    Research {
        input: PathBuf,
        #[arg(long)]
        base: Option<usize>,
        #[arg(long, requires = "base")]
        index: Option<usize>,
        /// 完成研究（未指定基地时完成全部）
        #[arg(long)]
        complete: bool,
        /// 设置进度百分比（需指定 --base 与 --index）
        #[arg(long, requires = "index", conflicts_with = "complete")]
        progress: Option<f64>,
    },
    /// 查看或完成设施建造
    Facilities {
        input: PathBuf,
        #[arg(long)]
        base: Option<usize>,
        #[arg(long, requires = "base")]
        index: Option<usize>,
        /// 立即完成建造（未指定基地时完成全部）
        #[arg(long)]
        complete: bool,
        /// 设置剩余建造天数（需指定 --base 与 --index）
        #[arg(long, requires = "index", conflicts_with = "complete", allow_hyphen_values = true)]
        build_time: Option<i64>,
    },
    /// 查看或完成生产
    Production {
        input: PathBuf,
        #[arg(long)]
        base: Option<usize>,
        #[arg(long, requires = "base")]
        index: Option<usize>,
        /// 完成当前批次（未指定基地时完成全部进行中的生产）
        #[arg(long)]
        complete: bool,
        /// 设置已投入工时（需指定 --base 与 --index）
        #[arg(long, requires = "index", allow_hyphen_values = true)]
        progress: Option<i64>,
        /// 设置生产数量（需指定 --base 与 --index）
        #[arg(long, requires = "index")]
        amount: Option<i64>,
    },
    /// 查看或修改士兵属性
    Soldiers {
        input: PathBuf,
        #[arg(long)]
        base: Option<usize>,
        #[arg(long, requires = "base")]
        index: Option<usize>,
        /// 属性拉满（未指定基地时作用于全部士兵）
        #[arg(long)]
        max: bool,
        /// 拉满时使用的属性值
        #[arg(long, default_value_t = 100)]
        max_value: i64,
        /// 要设置的属性名（需指定 --base、--index 与 --value）
        #[arg(long, requires_all = ["index", "value"])]
        stat: Option<String>,
        #[arg(long, requires = "stat")]
        value: Option<i64>,
        /// 显示属性统计
        #[arg(long)]
        summary: bool,
    },
    /// 查看或修改基地库存
    Items {
        input: PathBuf,
        #[arg(long, default_value_t = 0)]
        base: usize,
        /// 物品标识（如 STR_PISTOL）
        #[arg(long)]
        item: Option<String>,
        /// 设置数量（0 表示删除）
        #[arg(long, requires = "item")]
        set: Option<i64>,
        /// 增加数量
        #[arg(long, requires = "item", conflicts_with = "set")]
        add: Option<i64>,
        /// 移除物品（不带数量时全部移除）
        #[arg(long, requires = "item", num_args = 0..=1, conflicts_with_all = ["set", "add"])]
        remove: Option<Option<i64>>,
        /// 按标识或显示名称搜索所有基地
        #[arg(long)]
        search: Option<String>,
        /// 显示所有基地的物品总数
        #[arg(long)]
        totals: bool,
        /// 显示库存概况（热门物品与各基地统计）
        #[arg(long)]
        summary: bool,
        /// 从指定基地复制库存到 --base
        #[arg(long)]
        copy_from: Option<usize>,
        /// 复制方式
        #[arg(long, value_enum, default_value_t = CopyMode::Add, requires = "copy_from")]
        mode: CopyMode,
        /// 批量设置数量，格式 ITEM=QTY（可重复）
        #[arg(long, value_parser = parse_bulk_edit, conflicts_with_all = ["item", "copy_from"])]
        bulk: Vec<(String, i64)>,
    },
    /// 列出备份
    Backups {
        input: PathBuf,
    },
    /// 从备份恢复
    Restore {
        input: PathBuf,
        backup: PathBuf,
    },
}

impl Command {
    fn input(&self) -> &Path {
        match self {
            Command::Info { input }
            | Command::Compare { input, .. }
            | Command::Funds { input, .. }
            | Command::Research { input, .. }
            | Command::Facilities { input, .. }
            | Command::Production { input, .. }
            | Command::Soldiers { input, .. }
            | Command::Items { input, .. }
            | Command::Backups { input }
            | Command::Restore { input, .. } => input,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    validate_input(cli.command.input())?;
    let config = EditorConfig::default().with_backup_dir(cli.backup_dir.clone());

    match &cli.command {
        Command::Info { input } => handle_info(&cli, input),
        Command::Compare { input, other } => handle_compare(&cli, input, other),
        Command::Funds { input, set, previous, add } => {
            let mut editor = open_editor(input, config)?;
            handle_funds(&cli, &mut editor, *set, *previous, *add)
        }
        Command::Research { input, base, index, complete, progress } => {
            let mut editor = open_editor(input, config)?;
            handle_research(&cli, &mut editor, *base, *index, *complete, *progress)
        }
        Command::Facilities { input, base, index, complete, build_time } => {
            let mut editor = open_editor(input, config)?;
            handle_facilities(&cli, &mut editor, *base, *index, *complete, *build_time)
        }
        Command::Production { input, base, index, complete, progress, amount } => {
            let mut editor = open_editor(input, config)?;
            let edits = ProductionEdits {
                complete: *complete,
                progress: *progress,
                amount: *amount,
            };
            handle_production(&cli, &mut editor, *base, *index, edits)
        }
        Command::Soldiers { input, base, index, max, max_value, stat, value, summary } => {
            let config = config.with_soldier_max_stat(*max_value);
            let mut editor = open_editor(input, config)?;
            let edits = SoldierEdits {
                max: *max,
                stat: stat.as_deref().zip(*value),
                summary: *summary,
            };
            handle_soldiers(&cli, &mut editor, *base, *index, edits)
        }
        Command::Items {
            input,
            base,
            item,
            set,
            add,
            remove,
            search,
            totals,
            summary,
            copy_from,
            mode,
            bulk,
        } => {
            let mut editor = open_editor(input, config)?;
            let edits = ItemEdits {
                item: item.as_deref(),
                set: *set,
                add: *add,
                remove: *remove,
                search: search.as_deref(),
                totals: *totals,
                summary: *summary,
                copy_from: copy_from.map(|from| (from, *mode)),
                bulk,
            };
            handle_items(&cli, &mut editor, *base, edits)
        }
        Command::Backups { input } => {
            let editor = open_editor(input, config)?;
            handle_backups(&cli, &editor)
        }
        Command::Restore { input, backup } => {
            let mut editor = open_editor(input, config)?;
            handle_restore(&cli, &mut editor, backup)
        }
    }
}

/// 初始化日志（RUST_LOG 优先）
fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(if cli.verbose {
            log::LevelFilter::Info
        } else if cli.quiet {
            log::LevelFilter::Error
        } else {
            log::LevelFilter::Warn
        });
    }
    builder.init();
}

/// 验证输入文件
fn validate_input(input: &Path) -> Result<()> {
    if !input.exists() {
        bail!("输入文件不存在: {:?}", input);
    }

    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    if !SUPPORTED_EXTENSIONS.iter().any(|&ext| Some(ext) == extension.as_deref()) {
        bail!("输入文件必须是 .sav 存档文件");
    }

    Ok(())
}

fn open_editor(input: &Path, config: EditorConfig) -> Result<SaveEditor> {
    SaveEditor::open_with(input, config).with_context(|| format!("加载存档失败: {:?}", input))
}

/// 输出 JSON 或文本
fn emit<T: Serialize>(cli: &Cli, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(value).context("序列化JSON失败")?);
    } else if !cli.quiet {
        println!("{}", text());
    }
    Ok(())
}

/// 应用一次编辑，然后保存（或在 --dry-run 时只显示差异）
fn run_edit<F>(cli: &Cli, editor: &mut SaveEditor, edit: F) -> Result<()>
where
    F: FnOnce(&mut Accessor<'_>) -> std::result::Result<String, EditError>,
{
    let message = {
        let mut acc = editor.root_accessor();
        edit(&mut acc).context("编辑失败")?
    };

    if !cli.quiet && !cli.json {
        println!("{}", message);
    }

    let changes = editor.changes();
    if changes.is_empty() {
        return emit(cli, &changes, || "没有需要保存的修改".to_string());
    }

    if cli.dry_run {
        return emit(cli, &changes, || format!("[dry-run] {}", editor.summary()));
    }

    let outcome = match editor.save(&AtomicSaveWriter) {
        Ok(outcome) => outcome,
        Err(SaveError::ValidationFailed(report)) => {
            for issue in report.fatal() {
                eprintln!("{}", issue);
            }
            bail!("存档校验失败，未写入任何文件");
        }
        Err(e) => return Err(e).context("保存存档失败"),
    };

    emit(cli, &outcome, || {
        let mut lines = vec![format!("已保存 {} 处修改到: {:?}", outcome.changes.len(), outcome.path)];
        if let Some(backup) = &outcome.backup_path {
            lines.push(format!("备份文件: {:?}", backup));
        }
        lines.extend(outcome.warnings.iter().map(|w| w.to_string()));
        lines.join("\n")
    })
}

fn handle_info(cli: &Cli, input: &Path) -> Result<()> {
    let doc = SaveDocument::load(input).with_context(|| format!("加载存档失败: {:?}", input))?;
    let info = doc.info();
    emit(cli, &info, || info.to_string())
}

fn handle_compare(cli: &Cli, input: &Path, other: &Path) -> Result<()> {
    validate_input(other)?;
    let left = SaveDocument::load(input).with_context(|| format!("加载存档失败: {:?}", input))?;
    let right = SaveDocument::load(other).with_context(|| format!("加载存档失败: {:?}", other))?;

    let changes: Vec<ChangeRecord> = diff(&NodePath::root(), &left.body, &right.body);
    emit(cli, &changes, || {
        if changes.is_empty() {
            return "两个存档的主体完全一致".to_string();
        }
        let mut lines = vec![format!("共 {} 处差异:", changes.len())];
        lines.extend(changes.iter().map(|c| format!("  {}", c)));
        lines.join("\n")
    })
}

fn handle_funds(
    cli: &Cli,
    editor: &mut SaveEditor,
    set: Option<i64>,
    previous: Option<i64>,
    add: Option<i64>,
) -> Result<()> {
    match (set, add) {
        (Some(current), _) => run_edit(cli, editor, |acc| {
            match previous {
                Some(previous) => money::set_funds(acc, current, previous)?,
                None => money::set_current_funds(acc, current)?,
            }
            Ok(format!("本月资金设为 {}", money::format_funds(current)))
        }),
        (None, Some(delta)) => run_edit(cli, editor, |acc| {
            let updated = money::add_funds(acc, delta)?;
            Ok(format!("本月资金变为 {}", money::format_funds(updated)))
        }),
        (None, None) => {
            let (current, previous) = money::funds(&editor.root_accessor());
            #[derive(Serialize)]
            struct Funds {
                current: i64,
                previous: i64,
            }
            emit(cli, &Funds { current, previous }, || {
                format!(
                    "本月资金: {}\n上月资金: {}",
                    money::format_funds(current),
                    money::format_funds(previous)
                )
            })
        }
    }
}

fn handle_research(
    cli: &Cli,
    editor: &mut SaveEditor,
    base: Option<usize>,
    index: Option<usize>,
    complete: bool,
    progress: Option<f64>,
) -> Result<()> {
    if let Some(percent) = progress {
        let (base, index) = base.zip(index).context("设置进度需要 --base 与 --index")?;
        return run_edit(cli, editor, |acc| {
            research::set_progress(acc, base, index, percent)?;
            Ok(format!("研究进度设为 {:.1}%", percent.clamp(0.0, 100.0)))
        });
    }

    if complete {
        return run_edit(cli, editor, |acc| match (base, index) {
            (Some(base), Some(index)) => {
                let changed = research::complete(acc, base, index)?;
                Ok(if changed { "研究已完成".to_string() } else { "该研究已经完成".to_string() })
            }
            (Some(base), None) => Ok(format!("完成了 {} 个研究项目", research::complete_in_base(acc, base)?)),
            _ => Ok(format!("完成了 {} 个研究项目", research::complete_all(acc)?)),
        });
    }

    let acc = editor.root_accessor();
    let projects: Vec<_> = research::list(&acc)
        .into_iter()
        .filter(|p| base.map_or(true, |b| p.base_index == b))
        .collect();
    let summary = research::summary(&acc);
    emit(cli, &projects, || {
        let mut lines: Vec<String> = projects
            .iter()
            .map(|p| {
                format!(
                    "[{}:{}] {} - {}/{} ({:.0}%){}",
                    p.base_index,
                    p.index,
                    p.display_name,
                    p.spent,
                    p.cost,
                    p.progress_percent(),
                    if p.is_complete() { " 已完成" } else { "" }
                )
            })
            .collect();
        lines.push(format!(
            "共 {} 个研究项目，已完成 {}，进行中 {}",
            summary.total, summary.completed, summary.in_progress
        ));
        lines.join("\n")
    })
}

fn handle_facilities(
    cli: &Cli,
    editor: &mut SaveEditor,
    base: Option<usize>,
    index: Option<usize>,
    complete: bool,
    build_time: Option<i64>,
) -> Result<()> {
    if let Some(days) = build_time {
        let (base, index) = base.zip(index).context("设置建造时间需要 --base 与 --index")?;
        return run_edit(cli, editor, |acc| {
            facilities::set_build_time(acc, base, index, days)?;
            Ok(format!("剩余建造天数设为 {}", days.max(0)))
        });
    }

    if complete {
        return run_edit(cli, editor, |acc| match (base, index) {
            (Some(base), Some(index)) => {
                let changed = facilities::complete(acc, base, index)?;
                Ok(if changed { "设施已建成".to_string() } else { "该设施已经建成".to_string() })
            }
            (Some(base), None) => Ok(format!("完成了 {} 个设施", facilities::complete_in_base(acc, base)?)),
            _ => Ok(format!("完成了 {} 个设施", facilities::complete_all(acc)?)),
        });
    }

    let acc = editor.root_accessor();
    let list: Vec<_> = facilities::list(&acc)
        .into_iter()
        .filter(|f| base.map_or(true, |b| f.base_index == b))
        .collect();
    emit(cli, &list, || {
        list.iter()
            .map(|f| {
                let status = if f.is_under_construction() {
                    format!("建造中，剩余 {} 天", f.build_time)
                } else {
                    "已建成".to_string()
                };
                format!("[{}:{}] {} ({}, {}) - {}", f.base_index, f.index, f.display_name, f.x, f.y, status)
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

struct ProductionEdits {
    complete: bool,
    progress: Option<i64>,
    amount: Option<i64>,
}

fn handle_production(
    cli: &Cli,
    editor: &mut SaveEditor,
    base: Option<usize>,
    index: Option<usize>,
    edits: ProductionEdits,
) -> Result<()> {
    if edits.progress.is_some() || edits.amount.is_some() {
        let (base, index) = base.zip(index).context("修改生产条目需要 --base 与 --index")?;
        return run_edit(cli, editor, |acc| {
            let mut done = Vec::new();
            if let Some(hours) = edits.progress {
                production::set_progress(acc, base, index, hours)?;
                done.push(format!("工时设为 {}", hours.max(0)));
            }
            if let Some(amount) = edits.amount {
                production::set_amount(acc, base, index, amount)?;
                done.push(format!("数量设为 {}", amount));
            }
            Ok(done.join("，"))
        });
    }

    if edits.complete {
        return run_edit(cli, editor, |acc| match (base, index) {
            (Some(base), Some(index)) => {
                production::complete(acc, base, index)?;
                Ok("生产批次已完成".to_string())
            }
            (Some(base), None) => Ok(format!("完成了 {} 个生产条目", production::complete_in_base(acc, base)?)),
            _ => Ok(format!("完成了 {} 个生产条目", production::complete_all(acc)?)),
        });
    }

    let acc = editor.root_accessor();
    let items: Vec<_> = production::list(&acc)
        .into_iter()
        .filter(|p| base.map_or(true, |b| p.base_index == b))
        .collect();
    emit(cli, &items, || {
        items
            .iter()
            .map(|p| {
                let amount = if p.infinite { "∞".to_string() } else { p.amount.to_string() };
                format!(
                    "[{}:{}] {} x{} - 工程师 {}，已投入 {} 工时{}",
                    p.base_index,
                    p.index,
                    p.display_name,
                    amount,
                    p.assigned,
                    p.spent,
                    if p.is_active() { "" } else { "（未开始）" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

struct SoldierEdits<'a> {
    max: bool,
    stat: Option<(&'a str, i64)>,
    summary: bool,
}

fn handle_soldiers(
    cli: &Cli,
    editor: &mut SaveEditor,
    base: Option<usize>,
    index: Option<usize>,
    edits: SoldierEdits<'_>,
) -> Result<()> {
    if let Some((stat, value)) = edits.stat {
        let (base, index) = base.zip(index).context("设置属性需要 --base 与 --index")?;
        return run_edit(cli, editor, |acc| {
            soldiers::set_stat(acc, base, index, stat, value)?;
            Ok(format!("{} 设为 {}", stat, value))
        });
    }

    if edits.max {
        let value = editor.config().soldier_max_stat;
        return run_edit(cli, editor, |acc| match (base, index) {
            (Some(base), Some(index)) => {
                soldiers::max_stats(acc, base, index, value)?;
                Ok("士兵属性已拉满".to_string())
            }
            (Some(base), None) => Ok(format!("{} 名士兵属性已拉满", soldiers::max_in_base(acc, base, value)?)),
            _ => Ok(format!("{} 名士兵属性已拉满", soldiers::max_all(acc, value)?)),
        });
    }

    let acc = editor.root_accessor();
    if edits.summary {
        let summary = soldiers::summary(&acc);
        return emit(cli, &summary, || {
            let mut lines = vec![format!("士兵总数: {}", summary.total)];
            lines.extend(summary.per_base.iter().map(|(name, n)| format!("  {}: {}", name, n)));
            lines.extend(
                summary
                    .stats
                    .iter()
                    .map(|(stat, r)| format!("{}: 最小 {}，最大 {}，平均 {:.1}", stat, r.min, r.max, r.avg)),
            );
            lines.join("\n")
        });
    }

    let list: Vec<_> = soldiers::list(&acc)
        .into_iter()
        .filter(|s| base.map_or(true, |b| s.base_index == b))
        .collect();
    emit(cli, &list, || {
        list.iter()
            .map(|s| {
                let stats = soldiers::SOLDIER_STATS
                    .iter()
                    .filter_map(|name| s.stats.get(*name).map(|v| format!("{} {}", name, v)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "[{}:{}] {} (军衔 {}，任务 {}，击杀 {}) {}",
                    s.base_index, s.index, s.name, s.rank, s.missions, s.kills, stats
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

struct ItemEdits<'a> {
    item: Option<&'a str>,
    set: Option<i64>,
    add: Option<i64>,
    remove: Option<Option<i64>>,
    search: Option<&'a str>,
    totals: bool,
    summary: bool,
    copy_from: Option<(usize, CopyMode)>,
    bulk: &'a [(String, i64)],
}

/// 解析 `ITEM=QTY`
fn parse_bulk_edit(raw: &str) -> Result<(String, i64), String> {
    let (item, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("格式应为 ITEM=QTY: {}", raw))?;
    let item = item.trim();
    if item.is_empty() {
        return Err(format!("物品标识为空: {}", raw));
    }
    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("数量无效 '{}': {}", quantity, e))?;
    Ok((item.to_string(), quantity))
}

fn handle_items(cli: &Cli, editor: &mut SaveEditor, base: usize, edits: ItemEdits<'_>) -> Result<()> {
    if let Some((from, mode)) = edits.copy_from {
        return run_edit(cli, editor, |acc| {
            let count = inventory::copy_between_bases(acc, from, base, mode)?;
            Ok(format!("已从基地 {} 复制 {} 种物品到基地 {}", from, count, base))
        });
    }

    if !edits.bulk.is_empty() {
        return run_edit(cli, editor, |acc| {
            let count = inventory::bulk_modify(acc, base, edits.bulk)?;
            Ok(format!("已批量修改 {} 种物品", count))
        });
    }

    if let Some(item) = edits.item {
        let name = xcom_save_editor::format_item_name(item);
        if let Some(quantity) = edits.set {
            return run_edit(cli, editor, |acc| {
                inventory::set_quantity(acc, base, item, quantity)?;
                Ok(format!("{} 数量设为 {}", name, quantity))
            });
        }
        if let Some(count) = edits.add {
            return run_edit(cli, editor, |acc| {
                let updated = inventory::add_item(acc, base, item, count)?;
                Ok(format!("{} 数量变为 {}", name, updated))
            });
        }
        if let Some(count) = edits.remove {
            return run_edit(cli, editor, |acc| {
                let updated = inventory::remove_item(acc, base, item, count)?;
                Ok(format!("{} 剩余 {}", name, updated))
            });
        }
    }

    let acc = editor.root_accessor();

    if edits.summary {
        let summary = inventory::summary(&acc);
        return emit(cli, &summary, || {
            let mut lines = vec![
                format!("物品种类: {}", summary.unique_items),
                format!("物品总数: {}", summary.total_quantity),
                "热门物品:".to_string(),
            ];
            lines.extend(
                summary
                    .top_items
                    .iter()
                    .map(|t| format!("  {}: {}", t.display_name, t.quantity)),
            );
            lines.extend(
                summary
                    .bases
                    .iter()
                    .map(|b| format!("[{}] {} 种，共 {} 件", b.name, b.item_types, b.total_items)),
            );
            lines.join("\n")
        });
    }

    if edits.totals {
        let totals = inventory::totals(&acc);
        return emit(cli, &totals, || {
            totals
                .iter()
                .map(|(item, n)| format!("{}: {}", xcom_save_editor::format_item_name(item), n))
                .collect::<Vec<_>>()
                .join("\n")
        });
    }

    let items = match edits.search {
        Some(query) => inventory::search(&acc, query),
        None => inventory::list(&acc, base),
    };
    emit(cli, &items, || {
        if items.is_empty() {
            return "没有找到物品".to_string();
        }
        items
            .iter()
            .map(|i| format!("[{}] {} ({}): {}", i.base_name, i.display_name, i.item, i.quantity))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn handle_backups(cli: &Cli, editor: &SaveEditor) -> Result<()> {
    let backups = editor.backups().context("读取备份目录失败")?;
    emit(cli, &backups, || {
        if backups.is_empty() {
            return "没有找到备份".to_string();
        }
        backups
            .iter()
            .map(|b| {
                format!(
                    "{} - {} 字节 - {}",
                    b.path.display(),
                    b.size,
                    b.modified.format("%Y-%m-%d %H:%M:%S")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn handle_restore(cli: &Cli, editor: &mut SaveEditor, backup: &Path) -> Result<()> {
    if !backup.exists() {
        bail!("备份文件不存在: {:?}", backup);
    }
    if cli.dry_run {
        if !cli.quiet {
            println!("[dry-run] 将从 {:?} 恢复到 {:?}", backup, editor.document().path());
        }
        return Ok(());
    }

    let safety = editor
        .restore_backup(backup, &AtomicSaveWriter)
        .with_context(|| format!("从备份恢复失败: {:?}", backup))?;

    if !cli.quiet {
        println!("已从备份恢复: {:?}", backup);
        if let Some(safety) = safety {
            println!("恢复前的存档已备份到: {:?}", safety);
        }
    }
    Ok(())
}
