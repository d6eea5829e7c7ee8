//! 存档编辑会话集成测试
//!
//! 测试场景：
//! - 未修改的存档原样写回（逐字节一致）
//! - 修改资金后只产生一条变更，保存后头部不变
//! - 致命校验问题阻止保存
//! - 写入失败时原文件不变且备份存在
//! - 从备份恢复
//! - 带标签的值不会写入存档
//! - 名称相近的存档备份互不混淆

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use xcom_save_editor::game::{facilities, inventory, money, research, soldiers};
use xcom_save_editor::{
    AtomicSaveWriter, EditorConfig, NodePath, RawSaveData, SaveDocument, SaveEditor, SaveError, SaveWriter,
};

const SAVE: &str = "\
name: 'Autosave: Geoscape'
version: Extended 7.9.12
engine: Extended
time:
  second: 0
  minute: 15
  hour: 8
  weekday: 3
  day: 14
  month: 4
  year: 1999
mods:
  - xcom1 ver: 1.0
---
difficulty: 2
monthsPassed: 3
daysPassed: 104
funds: [1000,  900, 700]
time: {second: 0, minute: 15, hour: 8, weekday: 3, day: 14, month: 4, year: 1999}
bases:
  - name: Alpha
    lon: 0.5
    lat: -0.7
    facilities:
      - type: STR_ACCESS_LIFT
        x: 2
        y: 2
      - type: STR_LABORATORY
        x: 3
        y: 2
        buildTime: 12
    research:
      - project: STR_LASER_WEAPONS
        assigned: 10
        spent: 10
        cost: 100
    items:
      STR_PISTOL: 4
      STR_RIFLE: 2
    soldiers:
      - name: Ann Smith
        rank: 1
        currentStats: {tu: 60, stamina: 50, health: 40, firing: 70}
";

fn write_save(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("slot1.sav");
    std::fs::write(&path, SAVE).unwrap();
    path
}

struct FailingWriter;

impl SaveWriter for FailingWriter {
    fn write(&self, _data: &RawSaveData, _path: &Path) -> Result<(), SaveError> {
        Err(SaveError::Io(std::io::Error::new(std::io::ErrorKind::Other, "simulated crash")))
    }
}

#[test]
fn test_unmodified_round_trip_is_byte_exact() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);

    let doc = SaveDocument::load(&path).unwrap();
    assert_eq!(doc.serialize().unwrap(), SAVE.as_bytes());
}

#[test]
fn test_funds_edit_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let mut editor = SaveEditor::open(&path).unwrap();

    {
        let mut acc = editor.root_accessor();
        money::set_current_funds(&mut acc, 5000).unwrap();
        let changes = acc.diff();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, NodePath::parse("funds.0"));
    }

    let outcome = editor.save(&AtomicSaveWriter).unwrap();
    assert_eq!(outcome.changes.len(), 1);
    assert!(outcome.backup_path.is_some());

    let saved = std::fs::read_to_string(&path).unwrap();
    let original_header = &SAVE[..SAVE.find("---\n").unwrap() + 4];
    assert!(saved.starts_with(original_header));

    let reloaded = SaveDocument::load(&path).unwrap();
    assert_eq!(reloaded.info().current_funds, 5000);
    assert_eq!(reloaded.info().previous_funds, 900);
    assert_eq!(reloaded.header(), SaveDocument::parse(SAVE.as_bytes()).unwrap().header());
}

#[test]
fn test_several_edits_then_save() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let mut editor = SaveEditor::open(&path).unwrap();

    {
        let mut acc = editor.root_accessor();
        research::complete_all(&mut acc).unwrap();
        facilities::complete_all(&mut acc).unwrap();
        soldiers::max_all(&mut acc, 90).unwrap();
        inventory::set_quantity(&mut acc, 0, "STR_GRENADE", 5).unwrap();
    }
    // 1 研究 + 1 设施 + 4 属性 + 1 新物品
    assert_eq!(editor.changes().len(), 7);

    editor.save(&AtomicSaveWriter).unwrap();
    assert!(!editor.has_changes());

    let info = SaveDocument::load(&path).unwrap().info();
    assert_eq!(info.research_completed, 1);
    assert_eq!(info.facilities_under_construction, 0);
}

#[test]
fn test_fatal_validation_blocks_save() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let mut editor = SaveEditor::open(&path).unwrap();

    {
        let mut acc = editor.root_accessor();
        acc.remove(&"bases".into()).unwrap();
    }

    match editor.save(&AtomicSaveWriter) {
        Err(SaveError::ValidationFailed(report)) => assert!(report.fatal_count() >= 1),
        other => panic!("expected validation failure, got {:?}", other.map(|o| o.path)),
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), SAVE);
    assert!(editor.has_changes());
}

#[test]
fn test_interrupted_save_keeps_original() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let mut editor = SaveEditor::open(&path).unwrap();

    {
        let mut acc = editor.root_accessor();
        money::set_funds(&mut acc, 1, 2).unwrap();
    }

    assert!(editor.save(&FailingWriter).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), SAVE);

    let backups = editor.backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(std::fs::read_to_string(&backups[0].path).unwrap(), SAVE);
}

#[test]
fn test_restore_from_backup() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let config = EditorConfig::default().with_backup_dir("old_saves");
    let mut editor = SaveEditor::open_with(&path, config).unwrap();

    {
        let mut acc = editor.root_accessor();
        money::add_funds(&mut acc, 250).unwrap();
    }
    let backup = editor.save(&AtomicSaveWriter).unwrap().backup_path.unwrap();
    assert!(backup.starts_with(dir.path().join("old_saves")));

    editor.restore_backup(&backup, &AtomicSaveWriter).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), SAVE);
    assert_eq!(editor.info().current_funds, 1000);
    assert_eq!(editor.backups().unwrap().len(), 2);
}

#[test]
fn test_reset_discards_edits() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let mut editor = SaveEditor::open(&path).unwrap();

    {
        let mut acc = editor.accessor("bases.0.items").unwrap();
        acc.set(&"STR_PISTOL".into(), 40).unwrap();
        acc.reset();
        assert!(!acc.has_changes());
        acc.set(&"STR_RIFLE".into(), 20).unwrap();
    }
    assert!(editor.has_changes());

    editor.reset_all();
    assert!(!editor.has_changes());
    assert_eq!(editor.document().serialize().unwrap(), SAVE.as_bytes());
}

#[test]
fn test_tagged_value_never_reaches_disk() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let mut editor = SaveEditor::open(&path).unwrap();

    let tagged: serde_yaml::Value = serde_yaml::from_str("!money 5000").unwrap();
    {
        let mut acc = editor.root_accessor();
        assert!(acc.set(&"funds.0".into(), tagged).is_err());
    }
    assert!(!editor.has_changes());
    assert_eq!(editor.document().serialize().unwrap(), SAVE.as_bytes());
}

#[test]
fn test_backups_of_similar_save_names_stay_separate() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let sibling = dir.path().join("slot1_b.sav");
    std::fs::write(&sibling, SAVE).unwrap();

    let mut editor = SaveEditor::open(&path).unwrap();
    let mut other = SaveEditor::open(&sibling).unwrap();
    for session in [&mut editor, &mut other] {
        {
            let mut acc = session.root_accessor();
            money::add_funds(&mut acc, 1).unwrap();
        }
        session.save(&AtomicSaveWriter).unwrap();
    }

    assert_eq!(editor.backups().unwrap().len(), 1);
    assert_eq!(other.backups().unwrap().len(), 1);
    assert_ne!(editor.backups().unwrap()[0].path, other.backups().unwrap()[0].path);
}

#[test]
fn test_bulk_inventory_edit_and_save() {
    let dir = TempDir::new().unwrap();
    let path = write_save(&dir);
    let mut editor = SaveEditor::open(&path).unwrap();

    {
        let mut acc = editor.root_accessor();
        let edits = vec![("STR_PISTOL".to_string(), 10), ("STR_GRENADE".to_string(), 3)];
        inventory::bulk_modify(&mut acc, 0, &edits).unwrap();
    }
    editor.save(&AtomicSaveWriter).unwrap();

    let mut reloaded = SaveEditor::open(&path).unwrap();
    let acc = reloaded.root_accessor();
    let summary = inventory::summary(&acc);
    assert_eq!(summary.unique_items, 3);
    assert_eq!(summary.total_quantity, 15);
    assert_eq!(summary.top_items[0].item, "STR_PISTOL");
}
