//! `spark-buffer` 提供批量编解码场景下可复用的字节缓冲池。
//!
//! # 模块定位（Why）
//! - PCM 编解码器每次调用都需要一块 `帧数 × 声道数 × 样本宽度` 大小的临时缓冲，
//!   若每次都向堆申请，会在高频小批量调用中产生明显的分配抖动；
//! - 本 crate 将“租借 → 写入 → 显式归还”的生命周期固化为统一契约，
//!   使编码器、解码器以及并发调用方能够共享同一批暂存内存。
//!
//! # 设计概要（How）
//! - `pool` 模块实现 `SlabBufferPool`：以 `spin::Mutex<Vec<BytesMut>>` 作为自由链表，
//!   租借时优先复用容量足够的块，未命中时再惰性分配；
//! - `pooled_buffer` 模块实现 `PooledBuffer`：独占持有一块 `BytesMut`，
//!   通过 `BufferRecycler` 在显式 `release` 时把内存交还给所属池；
//! - `stats` 模块定义 `PoolStats` 快照，供测试与运维观测池的行为。
//!
//! # 契约要点（What）
//! - 同一块缓冲在归还前只属于一个租借者，池绝不会把它同时交给两个调用方；
//! - 归还是显式动作：未调用 `release` 而直接丢弃的缓冲只会被释放，并计入 `lost_leases`；
//! - 默认不限制闲置缓冲数量，可通过 [`SlabBufferPool::with_idle_cap`] 注入上限。

mod pool;
mod pooled_buffer;
mod stats;

pub use pool::SlabBufferPool;
pub use pooled_buffer::{BufferRecycler, PooledBuffer, ReclaimedBuffer};
pub use stats::{PoolStatDimension, PoolStats};
