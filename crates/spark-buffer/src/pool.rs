use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use bytes::BytesMut;
use spin::Mutex;

use crate::{
    pooled_buffer::{BufferRecycler, PooledBuffer, ReclaimedBuffer},
    stats::{PoolStatDimension, PoolStats},
};

/// `SlabBufferPool` 提供基于自由链表（Free List）的缓冲池实现，
/// 专注在**高并发、小批量**的编解码调用中复用 `BytesMut`，以减少堆分配次数。
///
/// # 模块角色（Why）
/// - 编码器/解码器每次调用都要一块与批量大小相称的暂存区，池化后重复的定长调用几乎不再分配；
/// - 池是显式、可注入的资源：多个编解码实例可以共享同一个池，也可以各自持有。
///
/// # 核心机制（How）
/// - 内部维护 `spin::Mutex<Vec<BytesMut>>` 作为自由链表，租借时取第一块容量足够的缓冲；
///   未命中时惰性分配新的 `BytesMut`；
/// - `PoolMetrics` 通过原子计数跟踪分配、复用与丢失，支撑 [`SlabBufferPool::statistics`] 快照；
/// - 缓冲通过 [`BufferRecycler`] 找回所属池，因此 [`SlabBufferPool::release`] 与
///   [`PooledBuffer::release`] 等价。
///
/// # 契约说明（What）
/// - **线程安全**：自由链表只在持锁期间被修改，同一块 `BytesMut` 不会同时出现在两个租约中；
/// - **后置条件**：`acquire(n)` 返回的缓冲为空且 `capacity() >= n`；
/// - **容量上限**：默认不限制闲置缓冲数量；设置 `idle_cap` 后，自由链表已满时归还的缓冲会被直接释放。
///
/// # 设计权衡（Trade-offs）
/// - 使用自旋锁而非阻塞互斥量：临界区只包含一次线性查找与 `swap_remove`，持锁时间极短；
/// - 首次适配（first fit）可能让大块缓冲服务小请求，换来实现简单与查找成本可控。
#[derive(Clone, Default)]
pub struct SlabBufferPool {
    inner: Arc<PoolInner>,
}

impl SlabBufferPool {
    /// 创建不限制闲置数量的空池。
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建闲置缓冲数量至多为 `idle_cap` 的空池。
    pub fn with_idle_cap(idle_cap: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner::with_idle_cap(Some(idle_cap))),
        }
    }

    /// 租借一块至少具备 `min_capacity` 容量的空缓冲。
    pub fn acquire(&self, min_capacity: usize) -> PooledBuffer {
        let raw = self.inner.acquire_buffer(min_capacity);
        let recycler: Arc<dyn BufferRecycler> = self.inner.clone();
        PooledBuffer::new(raw, recycler)
    }

    /// 归还缓冲，使其进入所属池的自由链表。
    pub fn release(&self, buffer: PooledBuffer) {
        buffer.release();
    }

    /// 清空自由链表，返回释放的字节数。
    pub fn shrink_to_fit(&self) -> usize {
        self.inner.shrink_free_list()
    }

    /// 读取当前统计快照。
    pub fn statistics(&self) -> PoolStats {
        self.inner.snapshot()
    }
}

struct PoolInner {
    free_list: Mutex<Vec<BytesMut>>,
    idle_cap: Option<usize>,
    metrics: PoolMetrics,
}

impl Default for PoolInner {
    fn default() -> Self {
        Self::with_idle_cap(None)
    }
}

impl PoolInner {
    fn with_idle_cap(idle_cap: Option<usize>) -> Self {
        Self {
            free_list: Mutex::new(Vec::new()),
            idle_cap,
            metrics: PoolMetrics::default(),
        }
    }

    /// 从自由链表或堆上获取一个满足容量的 `BytesMut`。
    fn acquire_buffer(&self, min_capacity: usize) -> BytesMut {
        let reused = {
            let mut list = self.free_list.lock();
            list.iter()
                .position(|buf| buf.capacity() >= min_capacity)
                .map(|index| list.swap_remove(index))
        };

        let mut buffer = match reused {
            Some(buf) => {
                let capacity = buf.capacity();
                self.metrics.decrease_available(capacity);
                self.metrics.reused.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(min_capacity, capacity, "reusing pooled buffer");
                buf
            }
            None => {
                let buf = BytesMut::with_capacity(min_capacity);
                self.metrics.increase_on_new_allocation(buf.capacity());
                tracing::trace!(min_capacity, "allocating fresh buffer");
                buf
            }
        };
        buffer.clear();
        self.metrics.active_leases.fetch_add(1, Ordering::Relaxed);
        buffer
    }

    fn shrink_free_list(&self) -> usize {
        let mut list = self.free_list.lock();
        let reclaimed: usize = list.iter().map(BytesMut::capacity).sum();
        list.clear();
        self.metrics.decrease_available(reclaimed);
        self.metrics.decrease_allocated(reclaimed);
        reclaimed
    }

    fn snapshot(&self) -> PoolStats {
        let idle_buffers = self.free_list.lock().len();
        PoolStats {
            allocated_bytes: self.metrics.allocated_bytes.load(Ordering::Relaxed),
            available_bytes: self.metrics.available_bytes.load(Ordering::Relaxed),
            active_leases: self.metrics.active_leases.load(Ordering::Relaxed),
            idle_buffers,
            custom_dimensions: vec![
                PoolStatDimension::new(
                    "fresh_allocations",
                    self.metrics.fresh.load(Ordering::Relaxed),
                ),
                PoolStatDimension::new(
                    "reused_acquisitions",
                    self.metrics.reused.load(Ordering::Relaxed),
                ),
                PoolStatDimension::new(
                    "lost_leases",
                    self.metrics.lost.load(Ordering::Relaxed),
                ),
                PoolStatDimension::new(
                    "dropped_on_release",
                    self.metrics.dropped.load(Ordering::Relaxed),
                ),
            ],
        }
    }
}

impl BufferRecycler for PoolInner {
    fn reclaim(&self, reclaimed: ReclaimedBuffer) {
        saturating_sub(&self.metrics.active_leases, 1);
        let capacity = reclaimed.capacity();
        // 租约期间扩容或重新分配的内存同样计入池持有的总量。
        let leased = reclaimed.leased_capacity();
        if capacity > leased {
            self.metrics
                .allocated_bytes
                .fetch_add(capacity - leased, Ordering::Relaxed);
        } else {
            self.metrics.decrease_allocated(leased - capacity);
        }
        let Some(mut buf) = reclaimed.into_buffer() else {
            self.metrics.lost.fetch_add(1, Ordering::Relaxed);
            self.metrics.decrease_allocated(capacity);
            return;
        };

        buf.clear();
        let mut list = self.free_list.lock();
        if self.idle_cap.is_some_and(|cap| list.len() >= cap) {
            drop(list);
            self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
            self.metrics.decrease_allocated(capacity);
            return;
        }
        list.push(buf);
        self.metrics.increase_available(capacity);
    }
}

#[derive(Default)]
struct PoolMetrics {
    allocated_bytes: AtomicUsize,
    available_bytes: AtomicUsize,
    active_leases: AtomicUsize,
    fresh: AtomicUsize,
    reused: AtomicUsize,
    lost: AtomicUsize,
    dropped: AtomicUsize,
}

impl PoolMetrics {
    fn increase_on_new_allocation(&self, capacity: usize) {
        self.allocated_bytes.fetch_add(capacity, Ordering::Relaxed);
        self.fresh.fetch_add(1, Ordering::Relaxed);
    }

    fn increase_available(&self, capacity: usize) {
        self.available_bytes.fetch_add(capacity, Ordering::Relaxed);
    }

    fn decrease_available(&self, capacity: usize) {
        saturating_sub(&self.available_bytes, capacity);
    }

    fn decrease_allocated(&self, capacity: usize) {
        saturating_sub(&self.allocated_bytes, capacity);
    }
}

fn saturating_sub(target: &AtomicUsize, value: usize) {
    let _ = target.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(value))
    });
}
