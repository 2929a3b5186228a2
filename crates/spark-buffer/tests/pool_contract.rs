//! `pool_contract` 集成测试：验证 `SlabBufferPool` 在真实调用路径下的契约执行情况。
//!
//! # 测试目标（Why）
//! - 保障缓冲租借、显式归还、统计等核心流程能在 crate 公开 API 下正确协作；
//! - 覆盖“并发租借不会拿到同一块缓冲”“闲置上限”“丢弃未归还缓冲”等边界；
//! - 及时捕获统计字段回归，确保后续重构仍维持行为兼容。

use std::{collections::HashSet, sync::Mutex, thread};

use bytes::BufMut;
use spark_buffer::SlabBufferPool;
use tracing_test::traced_test;

/// 通过多次租借 / 归还验证统计维度的生命周期演进。
///
/// # 核心关注点
/// - `active_leases`：租借过程中的实时活跃数量；
/// - `fresh_allocations` / `reused_acquisitions`：首次必然分配，之后命中自由链表。
#[test]
fn stats_track_allocation_lifecycle() {
    let pool = SlabBufferPool::new();
    let initial = pool.statistics();
    assert_eq!(initial.active_leases, 0);
    assert_eq!(initial.dimension("fresh_allocations"), 0);

    let first = pool.acquire(32);
    let during_first = pool.statistics();
    assert_eq!(during_first.active_leases, 1);
    assert_eq!(during_first.dimension("fresh_allocations"), 1);
    assert!(during_first.allocated_bytes >= 32);
    pool.release(first);

    let after_first = pool.statistics();
    assert_eq!(after_first.active_leases, 0);
    assert_eq!(after_first.idle_buffers, 1);

    let second = pool.acquire(8);
    let during_second = pool.statistics();
    assert_eq!(during_second.active_leases, 1);
    assert_eq!(during_second.dimension("fresh_allocations"), 1);
    assert_eq!(during_second.dimension("reused_acquisitions"), 1);
    assert_eq!(during_second.available_bytes, 0);
    pool.release(second);

    assert_eq!(pool.statistics().active_leases, 0);
}

/// 丢弃未归还的缓冲只释放内存，不会回到自由链表。
#[test]
fn dropped_lease_is_not_recycled() {
    let pool = SlabBufferPool::new();
    {
        let mut buffer = pool.acquire(16);
        buffer.put_slice(b"pcm");
    }
    let stats = pool.statistics();
    assert_eq!(stats.active_leases, 0);
    assert_eq!(stats.idle_buffers, 0);
    assert_eq!(stats.allocated_bytes, 0);
    assert_eq!(stats.dimension("lost_leases"), 1);
}

/// 闲置上限生效时，超出部分在归还时直接释放。
#[test]
fn idle_cap_bounds_free_list() {
    let pool = SlabBufferPool::with_idle_cap(1);
    let a = pool.acquire(8);
    let b = pool.acquire(8);
    pool.release(a);
    pool.release(b);
    let stats = pool.statistics();
    assert_eq!(stats.idle_buffers, 1);
    assert_eq!(stats.dimension("dropped_on_release"), 1);
}

/// 租约期间扩容的缓冲：归还后总量与可复用量一致，丢弃后总量归零。
#[test]
fn grown_lease_is_accounted_in_allocated_bytes() {
    let pool = SlabBufferPool::new();
    let mut buffer = pool.acquire(8);
    buffer.put_slice(&[0u8; 1000]);
    let grown = buffer.capacity();
    assert!(grown >= 1000);
    pool.release(buffer);

    let stats = pool.statistics();
    assert_eq!(stats.available_bytes, grown);
    assert_eq!(stats.allocated_bytes, grown, "扩容部分应计入池持有的总量");
    assert_eq!(pool.shrink_to_fit(), grown);
    assert_eq!(pool.statistics().allocated_bytes, 0);

    {
        let mut lost = pool.acquire(8);
        lost.put_slice(&[1u8; 512]);
    }
    let stats = pool.statistics();
    assert_eq!(stats.allocated_bytes, 0, "丢弃的扩容缓冲不应残留在总量中");
    assert_eq!(stats.dimension("lost_leases"), 1);
}

/// 验证 `shrink_to_fit` 能够释放自由链表缓存并刷新统计。
#[test]
fn shrink_to_fit_releases_cached_buffers() {
    let pool = SlabBufferPool::new();
    let buffer = pool.acquire(48);
    let cached_capacity = buffer.capacity();
    pool.release(buffer);
    let reclaimed = pool.shrink_to_fit();
    assert!(reclaimed >= cached_capacity, "回收字节数至少应覆盖已缓存容量");
    let stats = pool.statistics();
    assert_eq!(stats.available_bytes, 0, "收缩后不应保留闲置容量");
    assert_eq!(stats.idle_buffers, 0);
}

/// 并发租借期间，任意两个在途租约都不会指向同一块内存。
///
/// # 步骤说明（How）
/// 1. 预热池，使自由链表中存在多块可复用缓冲；
/// 2. 多线程同时租借并保持租约，在持有期间登记底层指针；
/// 3. 若登记时发现重复指针，说明同一块缓冲被交给了两个调用方。
#[test]
fn concurrent_leases_never_alias() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;

    let pool = SlabBufferPool::new();
    for _ in 0..THREADS {
        pool.release(pool.acquire(64));
    }
    let in_flight = Mutex::new(HashSet::new());

    thread::scope(|scope| {
        for worker in 0..THREADS {
            let pool = pool.clone();
            let in_flight = &in_flight;
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let mut buffer = pool.acquire(64);
                    let addr = buffer.as_ptr() as usize;
                    assert!(
                        in_flight.lock().expect("mutex poisoned").insert(addr),
                        "缓冲被同时租借给两个调用方"
                    );
                    buffer.put_u8(worker as u8);
                    buffer.put_u8(round as u8);
                    assert_eq!(&buffer[..], &[worker as u8, round as u8]);
                    in_flight.lock().expect("mutex poisoned").remove(&addr);
                    pool.release(buffer);
                }
            });
        }
    });

    let stats = pool.statistics();
    assert_eq!(stats.active_leases, 0);
    assert!(stats.dimension("reused_acquisitions") > 0);
}

#[traced_test]
#[test]
fn reuse_is_traced() {
    let pool = SlabBufferPool::new();
    pool.release(pool.acquire(4));
    pool.release(pool.acquire(4));
    assert!(logs_contain("allocating fresh buffer"));
    assert!(logs_contain("reusing pooled buffer"));
}
