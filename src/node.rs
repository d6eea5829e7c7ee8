/// 文档节点与路径
///
/// 存档主体就是一棵 `serde_yaml::Value` 树（映射 / 序列 / 标量）。
/// 本模块定义在树中定位节点的路径类型，以及按路径解析节点的辅助函数。
use serde::{Serialize, Serializer};
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::fmt;

use crate::utils::EditError;

/// 文档节点（映射键保持插入顺序）
pub type Node = Value;

/// 路径中的单个片段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// 映射键
    Key(String),
    /// 序列下标
    Index(usize),
}

impl PathSegment {
    /// 从映射键构造片段
    ///
    /// 整数键映射为 `Index`，其余标量键按文本形式映射为 `Key`
    pub fn from_key(key: &Value) -> Self {
        match key {
            Value::String(s) => PathSegment::Key(s.clone()),
            Value::Number(n) => match n.as_u64() {
                Some(i) => PathSegment::Index(i as usize),
                None => PathSegment::Key(n.to_string()),
            },
            Value::Bool(b) => PathSegment::Key(b.to_string()),
            Value::Null => PathSegment::Key("~".to_string()),
            other => PathSegment::Key(format!("{:?}", other)),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        PathSegment::Key(s.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        PathSegment::Key(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// 节点路径
///
/// 文本形式以点分隔，例如 `bases.0.facilities.1.buildTime`，
/// 纯数字片段解析为下标。空字符串表示根路径。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// 根路径
    pub fn root() -> Self {
        Self::default()
    }

    /// 解析点分隔的路径文本
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| match part.parse::<usize>() {
                Ok(i) if part.bytes().all(|b| b.is_ascii_digit()) => PathSegment::Index(i),
                _ => PathSegment::Key(part.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// 追加映射键，返回新路径
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// 追加序列下标，返回新路径
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// 拼接另一条路径
    pub fn join(&self, other: &NodePath) -> NodePath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        NodePath { segments }
    }

    /// 追加一个片段，返回新路径
    pub fn child(&self, segment: PathSegment) -> NodePath {
        let mut path = self.clone();
        path.segments.push(segment);
        path
    }

    /// 拆分为父路径与最后一个片段；根路径返回 None
    pub fn split_last(&self) -> Option<(NodePath, &PathSegment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            NodePath {
                segments: parent.to_vec(),
            },
            last,
        ))
    }

    /// 前 n 个片段组成的路径
    pub fn prefix(&self, len: usize) -> NodePath {
        NodePath {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for NodePath {
    fn from(text: &str) -> Self {
        NodePath::parse(text)
    }
}

impl From<Vec<PathSegment>> for NodePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        NodePath { segments }
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 节点形态
///
/// 编辑时只允许同形态替换，`Null` 可被任意未带标签的形态替换。
/// 存档中不允许出现带标签的节点，`Tagged` 只用于报告错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Null,
    Scalar,
    Sequence,
    Mapping,
    Tagged,
}

impl NodeKind {
    pub fn of(node: &Value) -> Self {
        match node {
            Value::Null => NodeKind::Null,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => NodeKind::Scalar,
            Value::Sequence(_) => NodeKind::Sequence,
            Value::Mapping(_) => NodeKind::Mapping,
            Value::Tagged(_) => NodeKind::Tagged,
        }
    }

    /// `Null` 视为标量形态
    fn shape(self) -> Self {
        match self {
            NodeKind::Null => NodeKind::Scalar,
            other => other,
        }
    }

    /// 判断 `replacement` 能否替换当前形态的节点
    pub fn accepts(self, replacement: NodeKind) -> bool {
        if replacement == NodeKind::Tagged {
            return false;
        }
        self == NodeKind::Null || self.shape() == replacement.shape()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Null => "null",
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
            NodeKind::Tagged => "tagged node",
        };
        f.write_str(name)
    }
}

/// 查找第一个带标签的节点
///
/// # 返回
/// (相对路径, 带标签的节点)；映射键带标签时路径指向该映射
pub fn find_tagged(node: &Value) -> Option<(NodePath, &TaggedValue)> {
    match node {
        Value::Tagged(tagged) => Some((NodePath::root(), &**tagged)),
        Value::Sequence(seq) => seq.iter().enumerate().find_map(|(i, item)| {
            let (path, tagged) = find_tagged(item)?;
            Some((NodePath::root().index(i).join(&path), tagged))
        }),
        Value::Mapping(map) => map.iter().find_map(|(k, v)| {
            if let Value::Tagged(tagged) = k {
                return Some((NodePath::root(), &**tagged));
            }
            let (path, tagged) = find_tagged(v)?;
            Some((NodePath::root().child(PathSegment::from_key(k)).join(&path), tagged))
        }),
        _ => None,
    }
}

/// 在映射中查找与片段匹配的实际键
///
/// 下标片段先匹配整数键，再匹配十进制字符串键；
/// 键片段先匹配字符串键，数字文本再尝试整数键。
pub(crate) fn find_key(map: &Mapping, segment: &PathSegment) -> Option<Value> {
    let candidates = match segment {
        PathSegment::Key(k) => {
            let mut keys = vec![Value::String(k.clone())];
            if let Ok(n) = k.parse::<i64>() {
                keys.push(Value::Number(n.into()));
            }
            keys
        }
        PathSegment::Index(i) => vec![Value::Number((*i as u64).into()), Value::String(i.to_string())],
    };
    candidates.into_iter().find(|key| map.contains_key(key))
}

/// 片段在序列中的下标
fn sequence_index(segment: &PathSegment) -> Option<usize> {
    match segment {
        PathSegment::Index(i) => Some(*i),
        PathSegment::Key(k) => k.parse().ok(),
    }
}

/// 单步解析（只读）
fn step<'v>(node: &'v Value, segment: &PathSegment) -> Option<&'v Value> {
    match node {
        Value::Mapping(map) => {
            let key = find_key(map, segment)?;
            map.get(&key)
        }
        Value::Sequence(seq) => seq.get(sequence_index(segment)?),
        Value::Tagged(tagged) => step(&tagged.value, segment),
        _ => None,
    }
}

/// 单步解析（可变）
fn step_mut<'v>(node: &'v mut Value, segment: &PathSegment) -> Option<&'v mut Value> {
    match node {
        Value::Mapping(map) => {
            let key = find_key(map, segment)?;
            map.get_mut(&key)
        }
        Value::Sequence(seq) => seq.get_mut(sequence_index(segment)?),
        Value::Tagged(tagged) => step_mut(&mut tagged.value, segment),
        _ => None,
    }
}

/// 解析失败的原因描述
fn miss_reason(node: &Value, segment: &PathSegment) -> String {
    match node {
        Value::Mapping(_) => format!("key '{}' not found", segment),
        Value::Sequence(seq) => match sequence_index(segment) {
            Some(i) => format!("index {} out of range (length {})", i, seq.len()),
            None => format!("'{}' is not a sequence index", segment),
        },
        other => format!("cannot index into {} with '{}'", NodeKind::of(other), segment),
    }
}

/// 按路径解析节点（只读）
///
/// `base` 仅用于错误信息中的完整路径
pub fn resolve<'v>(root: &'v Value, base: &NodePath, path: &NodePath) -> Result<&'v Value, EditError> {
    let mut node = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        node = match step(node, segment) {
            Some(next) => next,
            None => {
                return Err(EditError::Path {
                    path: base.join(&path.prefix(depth + 1)),
                    reason: miss_reason(node, segment),
                })
            }
        };
    }
    Ok(node)
}

/// 按路径解析节点（可变）
pub fn resolve_mut<'v>(
    root: &'v mut Value,
    base: &NodePath,
    path: &NodePath,
) -> Result<&'v mut Value, EditError> {
    // 先只读解析一遍，拿到准确的失败原因
    resolve(root, base, path)?;
    let mut node = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        node = step_mut(node, segment).ok_or_else(|| EditError::Path {
            path: base.join(&path.prefix(depth + 1)),
            reason: "not found".to_string(),
        })?;
    }
    Ok(node)
}

/// 节点的简短文本表示（用于变更摘要）
pub fn describe(node: &Value) -> String {
    match node {
        Value::Null => "~".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > 30 {
                format!("\"{}...\"", s.chars().take(30).collect::<String>())
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Sequence(seq) => format!("[{} items]", seq.len()),
        Value::Mapping(map) => format!("{{{} keys}}", map.len()),
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, describe(&tagged.value)),
    }
}

/// 读取整数字段，缺失或非整数时返回默认值
pub fn int_field(node: &Value, key: &str, default: i64) -> i64 {
    node.get(key).and_then(Value::as_i64).unwrap_or(default)
}

/// 读取字符串字段
pub fn str_field<'v>(node: &'v Value, key: &str) -> Option<&'v str> {
    node.get(key).and_then(Value::as_str)
}
