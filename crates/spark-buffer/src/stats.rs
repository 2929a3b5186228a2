use std::borrow::Cow;

/// 池统计快照，帮助调用方观测内存复用情况。
///
/// # 设计背景（Why）
/// - 编解码器依赖缓冲池摊薄分配成本，若复用路径失效（例如调用方忘记归还），
///   只能通过统计数据发现“每次都在重新分配”的退化；
/// - 核心指标使用强类型字段，实现特有的数据放入 `custom_dimensions`。
///
/// # 契约说明（What）
/// - `allocated_bytes`：池曾向系统申请、且仍由池或租借者持有的总容量；
/// - `available_bytes`：自由链表中可直接复用的容量；
/// - `active_leases`：已租借但尚未归还或丢弃的缓冲数量；
/// - `idle_buffers`：自由链表中的缓冲块数量；
/// - `custom_dimensions`：`fresh_allocations`、`reused_acquisitions`、`lost_leases`、
///   `dropped_on_release` 等累计计数。
/// - **后置条件**：快照代表调用瞬间的状态，各字段分别读取，彼此之间不保证原子一致。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocated_bytes: usize,
    pub available_bytes: usize,
    pub active_leases: usize,
    pub idle_buffers: usize,
    pub custom_dimensions: Vec<PoolStatDimension>,
}

impl PoolStats {
    /// 按键查找扩展维度，不存在时返回 0。
    pub fn dimension(&self, key: &str) -> usize {
        self.custom_dimensions
            .iter()
            .find(|dim| dim.key == key)
            .map(|dim| dim.value)
            .unwrap_or_default()
    }
}

/// 扩展指标维度。
///
/// - `key`：稳定的蛇形命名字符串；
/// - `value`：非负计数或容量。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStatDimension {
    pub key: Cow<'static, str>,
    pub value: usize,
}

impl PoolStatDimension {
    pub(crate) fn new(key: &'static str, value: usize) -> Self {
        Self {
            key: Cow::Borrowed(key),
            value,
        }
    }
}
