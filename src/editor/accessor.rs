/// 变更追踪访问器
///
/// 绑定到存档主体中的某个子树，提供按路径读写，
/// 并与绑定时的快照对比得出变更，支持整体还原。
use serde_yaml::{Mapping, Value};

use super::delta::{diff, ChangeRecord};
use crate::node::{find_key, find_tagged, resolve, resolve_mut, NodeKind, NodePath, PathSegment};
use crate::utils::EditError;

/// 变更追踪访问器
///
/// # 核心特性
/// - **快照**: 绑定时深拷贝子树，之后不再修改
/// - **原子性**: 每次写入要么替换目标节点，要么什么都不改
/// - **按需比对**: 没有脏标记，`diff()` / `has_changes()` 每次都重新计算
///
/// 访问器持有子树的可变借用，因此同一时刻不可能有两个访问器绑定到重叠的子树。
///
/// # 使用示例
///
/// ```rust,ignore
/// let mut acc = Accessor::bind(&mut body, NodePath::root())?;
/// acc.set(&"funds.0".into(), 5000)?;
/// for change in acc.diff() {
///     println!("{}", change);
/// }
/// ```
#[derive(Debug)]
pub struct Accessor<'a> {
    /// 绑定路径（相对于主体根节点）
    base: NodePath,
    /// 当前子树
    node: &'a mut Value,
    /// 绑定时的快照
    snapshot: Value,
}

impl<'a> Accessor<'a> {
    /// 绑定到 `root` 中 `path` 指向的子树
    ///
    /// 路径无法解析时返回 `EditError::Path`，文档保持不变
    pub fn bind(root: &'a mut Value, path: NodePath) -> Result<Self, EditError> {
        let node = resolve_mut(root, &NodePath::root(), &path)?;
        let snapshot = node.clone();
        log::debug!("绑定访问器: {}", path);
        Ok(Self {
            base: path,
            node,
            snapshot,
        })
    }

    /// 绑定到整个主体
    pub fn root(root: &'a mut Value) -> Self {
        let snapshot = root.clone();
        Self {
            base: NodePath::root(),
            node: root,
            snapshot,
        }
    }

    /// 绑定路径
    pub fn path(&self) -> &NodePath {
        &self.base
    }

    /// 当前子树（只读）
    pub fn node(&self) -> &Value {
        &*self.node
    }

    /// 读取相对路径上的节点
    pub fn get(&self, path: &NodePath) -> Result<&Value, EditError> {
        resolve(&*self.node, &self.base, path)
    }

    /// 读取相对路径上的整数
    pub fn get_i64(&self, path: &NodePath) -> Result<i64, EditError> {
        let node = self.get(path)?;
        node.as_i64().ok_or_else(|| EditError::TypeMismatch {
            path: self.base.join(path),
            expected: NodeKind::Scalar,
            found: NodeKind::of(node),
        })
    }

    /// 替换相对路径上已存在的节点
    ///
    /// # 错误
    /// - 路径不存在：`EditError::Path`（不会创建中间结构）
    /// - 形态不同（如映射换成标量）：`EditError::TypeMismatch`，原节点为 null 时除外
    /// - 新值中含有带标签的节点：`EditError::TypeMismatch`
    pub fn set(&mut self, path: &NodePath, value: impl Into<Value>) -> Result<(), EditError> {
        let value = value.into();
        self.reject_tagged(path, &value)?;
        let target = resolve_mut(self.node, &self.base, path)?;

        let existing = NodeKind::of(target);
        let replacement = NodeKind::of(&value);
        if !existing.accepts(replacement) {
            return Err(EditError::TypeMismatch {
                path: self.base.join(path),
                expected: existing,
                found: replacement,
            });
        }

        log::debug!("设置 {}: {:?}", self.base.join(path), value);
        *target = value;
        Ok(())
    }

    /// 在已存在的映射中新增一个键
    ///
    /// 父节点必须是映射，且键尚不存在
    pub fn insert(&mut self, path: &NodePath, value: impl Into<Value>) -> Result<(), EditError> {
        let value = value.into();
        self.reject_tagged(path, &value)?;
        let full_path = self.base.join(path);
        let (map, segment) = self.parent_mapping(path)?;
        if find_key(map, &segment).is_some() {
            return Err(EditError::Path {
                path: full_path,
                reason: "key already exists".to_string(),
            });
        }
        let key = match segment {
            PathSegment::Key(k) => Value::String(k),
            PathSegment::Index(i) => Value::Number((i as u64).into()),
        };
        map.insert(key, value);
        log::debug!("新增 {}", full_path);
        Ok(())
    }

    /// 删除映射中已存在的键，其余键保持原顺序
    ///
    /// # 返回
    /// 被删除的节点
    pub fn remove(&mut self, path: &NodePath) -> Result<Value, EditError> {
        let full_path = self.base.join(path);
        let (map, segment) = self.parent_mapping(path)?;
        let key = find_key(map, &segment).ok_or_else(|| EditError::Path {
            path: full_path.clone(),
            reason: format!("key '{}' not found", segment),
        })?;

        let mut removed = None;
        let kept: Mapping = std::mem::take(map)
            .into_iter()
            .filter_map(|(k, v)| {
                if k == key {
                    removed = Some(v);
                    None
                } else {
                    Some((k, v))
                }
            })
            .collect();
        *map = kept;

        log::debug!("删除 {}", full_path);
        removed.ok_or(EditError::Path {
            path: full_path,
            reason: "key vanished during removal".to_string(),
        })
    }

    /// 存档无法重新加载带标签的节点，写入前拒绝
    fn reject_tagged(&self, path: &NodePath, value: &Value) -> Result<(), EditError> {
        match find_tagged(value) {
            Some((inner, tagged)) => Err(EditError::TypeMismatch {
                path: self.base.join(path).join(&inner),
                expected: NodeKind::of(&tagged.value),
                found: NodeKind::Tagged,
            }),
            None => Ok(()),
        }
    }

    /// 解析 `path` 的父节点（必须是映射）与最后一个片段
    fn parent_mapping(&mut self, path: &NodePath) -> Result<(&mut Mapping, PathSegment), EditError> {
        let (parent, last) = path.split_last().ok_or_else(|| EditError::Path {
            path: self.base.clone(),
            reason: "cannot insert or remove the bound node itself".to_string(),
        })?;
        let last = last.clone();
        let parent_path = self.base.join(&parent);
        let node = resolve_mut(self.node, &self.base, &parent)?;
        let found = NodeKind::of(node);
        match node.as_mapping_mut() {
            Some(map) => Ok((map, last)),
            None => Err(EditError::TypeMismatch {
                path: parent_path,
                expected: NodeKind::Mapping,
                found,
            }),
        }
    }

    /// 快照与当前子树之间的变更（路径为完整路径）
    pub fn diff(&self) -> Vec<ChangeRecord> {
        diff(&self.base, &self.snapshot, &*self.node)
    }

    /// 是否存在变更（每次重新计算）
    pub fn has_changes(&self) -> bool {
        !self.diff().is_empty()
    }

    /// 丢弃所有修改，恢复为快照内容
    pub fn reset(&mut self) {
        *self.node = self.snapshot.clone();
        log::debug!("重置访问器: {}", self.base);
    }
}
