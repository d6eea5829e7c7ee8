/// 游戏数据编辑操作
///
/// 每个子模块都是一组自由函数：接收绑定在存档主体根节点上的 `Accessor`
/// 和业务参数，所有读写都经由访问器完成，因此变更统一可追踪、可还原。
///
/// - **money**: 资金
/// - **research**: 研究项目
/// - **soldiers**: 士兵属性
/// - **facilities**: 基地设施建造
/// - **production**: 生产队列
/// - **inventory**: 基地库存
use serde_yaml::Value;

use crate::editor::Accessor;
use crate::node::NodePath;
use crate::utils::EditError;

pub mod money;
pub mod research;
pub mod soldiers;
pub mod facilities;
pub mod production;
pub mod inventory;

/// 所有基地节点
pub fn bases(body: &Value) -> &[Value] {
    body.get("bases")
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// 所有基地名称（缺失时为 `Base N`）
pub fn base_names(body: &Value) -> Vec<String> {
    bases(body)
        .iter()
        .enumerate()
        .map(|(i, base)| {
            base.get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Base {}", i + 1))
        })
        .collect()
}

/// 基地路径 `bases.<index>`
pub(crate) fn base_path(base_index: usize) -> NodePath {
    NodePath::root().key("bases").index(base_index)
}

/// 遍历所有基地下某个列表字段中的映射条目
///
/// 回调参数为 (基地下标, 条目下标, 条目)
pub(crate) fn for_each_entry<'v>(body: &'v Value, list_key: &str, mut f: impl FnMut(usize, usize, &'v Value)) {
    for (base_index, base) in bases(body).iter().enumerate() {
        let Some(list) = base.get(list_key).and_then(Value::as_sequence) else {
            continue;
        };
        for (entry_index, entry) in list.iter().enumerate() {
            if entry.is_mapping() {
                f(base_index, entry_index, entry);
            }
        }
    }
}

/// 写入整数：键已存在时替换，不存在时在父映射中新增
pub(crate) fn put_int(acc: &mut Accessor<'_>, path: &NodePath, value: i64) -> Result<(), EditError> {
    if acc.get(path).is_ok() {
        acc.set(path, value)
    } else {
        acc.insert(path, value)
    }
}
