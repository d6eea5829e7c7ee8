/// 变更比对模块
///
/// 不记录操作日志，而是在需要时把快照与当前树逐层对比，重新计算差异。
/// 这样部分失败或别名修改之后也不会出现“脏标记”与实际状态不一致的问题。
use serde::Serialize;
use serde_yaml::Value;

use crate::node::{describe, NodeKind, NodePath, PathSegment};

/// 单处变更
///
/// `original` / `current` 为 `None` 表示该路径在对应一侧不存在
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    /// 变更所在路径
    pub path: NodePath,
    /// 快照中的值
    pub original: Option<Value>,
    /// 当前值
    pub current: Option<Value>,
}

impl ChangeRecord {
    /// 是否为新增的键
    pub fn is_added(&self) -> bool {
        self.original.is_none()
    }

    /// 是否为删除的键
    pub fn is_removed(&self) -> bool {
        self.current.is_none()
    }
}

impl std::fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.original, &self.current) {
            (Some(old), Some(new)) => write!(f, "{}: {} -> {}", self.path, describe(old), describe(new)),
            (None, Some(new)) => write!(f, "{}: + {}", self.path, describe(new)),
            (Some(old), None) => write!(f, "{}: - {}", self.path, describe(old)),
            (None, None) => write!(f, "{}: (unchanged)", self.path),
        }
    }
}

/// 计算两棵树之间的差异
///
/// # 规则
/// - 标量不同：在该路径记一条
/// - 序列长度不同：在序列路径记一条，不逐元素展开
/// - 形态不同：在该路径记一条
/// - 映射键集合不同：删除的键按快照顺序就地记录，仅存在于当前树的键追加到末尾
///
/// # 参数
/// * `base` - 两棵树所在的路径（用于生成完整路径）
/// * `snapshot` - 快照
/// * `live` - 当前树
pub fn diff(base: &NodePath, snapshot: &Value, live: &Value) -> Vec<ChangeRecord> {
    let mut walker = DiffWalker::default();
    walker.walk(base, snapshot, live);
    let DiffWalker { mut records, added } = walker;
    records.extend(added);
    records
}

#[derive(Default)]
struct DiffWalker {
    records: Vec<ChangeRecord>,
    added: Vec<ChangeRecord>,
}

impl DiffWalker {
    fn changed(&mut self, path: &NodePath, old: &Value, new: &Value) {
        self.records.push(ChangeRecord {
            path: path.clone(),
            original: Some(old.clone()),
            current: Some(new.clone()),
        });
    }

    fn walk(&mut self, path: &NodePath, old: &Value, new: &Value) {
        match (old, new) {
            (Value::Mapping(old_map), Value::Mapping(new_map)) => {
                for (key, old_value) in old_map.iter() {
                    let child = path.child(PathSegment::from_key(key));
                    match new_map.get(key) {
                        Some(new_value) => self.walk(&child, old_value, new_value),
                        None => self.records.push(ChangeRecord {
                            path: child,
                            original: Some(old_value.clone()),
                            current: None,
                        }),
                    }
                }
                for (key, new_value) in new_map.iter() {
                    if !old_map.contains_key(key) {
                        self.added.push(ChangeRecord {
                            path: path.child(PathSegment::from_key(key)),
                            original: None,
                            current: Some(new_value.clone()),
                        });
                    }
                }
            }
            (Value::Sequence(old_seq), Value::Sequence(new_seq)) => {
                if old_seq.len() != new_seq.len() {
                    self.changed(path, old, new);
                    return;
                }
                for (i, (o, n)) in old_seq.iter().zip(new_seq.iter()).enumerate() {
                    self.walk(&path.child(PathSegment::Index(i)), o, n);
                }
            }
            (Value::Tagged(o), Value::Tagged(n)) if o.tag == n.tag => {
                self.walk(path, &o.value, &n.value);
            }
            _ => {
                let shape_changed = NodeKind::of(old) != NodeKind::of(new);
                if shape_changed || old != new {
                    self.changed(path, old, new);
                }
            }
        }
    }
}
