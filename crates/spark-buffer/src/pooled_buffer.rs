use std::{
    fmt, mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use bytes::{BufMut, BytesMut, buf::UninitSlice};

/// `BufferRecycler` 描述缓冲池在租借结束时的回收入口。
///
/// # 设计初衷（Why）
/// - 缓冲被租借后可能跨越多个调用层，最终由谁归还并不固定；
///   让缓冲自身携带回收句柄，可保证“从哪个池借出就回到哪个池”。
///
/// # 契约定义（What）
/// - **前置条件**：实现必须线程安全，且不得 panic，因为 `Drop` 路径也会调用 `reclaim`；
/// - **后置条件**：`reclaimed.into_buffer()` 为 `Some` 时，池可以复用该内存；
///   为 `None` 时表示租约结束但内存已随缓冲释放，池只需更新统计。
pub trait BufferRecycler: Send + Sync + 'static {
    /// 通知池一次租约已经结束。
    fn reclaim(&self, reclaimed: ReclaimedBuffer);
}

/// 表示一次回收动作所携带的上下文。
///
/// - `leased_capacity`：租借时池交出的容量；
/// - `capacity`：租约结束时缓冲的实际容量（写入过程中可能扩容）；
/// - `buffer`：显式归还时携带原始 `BytesMut`，丢弃时为 `None`。
#[derive(Debug)]
pub struct ReclaimedBuffer {
    leased_capacity: usize,
    capacity: usize,
    buffer: Option<BytesMut>,
}

impl ReclaimedBuffer {
    /// 创建携带完整上下文的回收结果。
    pub fn new(leased_capacity: usize, capacity: usize, buffer: Option<BytesMut>) -> Self {
        Self {
            leased_capacity,
            capacity,
            buffer,
        }
    }

    /// 返回租借时的容量。
    pub fn leased_capacity(&self) -> usize {
        self.leased_capacity
    }

    /// 返回本次回收的容量。
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 消耗结构并返回可复用的 `BytesMut`，若不存在则为 `None`。
    pub fn into_buffer(self) -> Option<BytesMut> {
        self.buffer
    }
}

/// `PooledBuffer` 是从池中租借的独占字节缓冲。
///
/// # 设计动机（Why）
/// - 编码器需要一块可追加写入、可整体写出的暂存区；解码器需要一块可按长度填充的读入区，
///   两种用法都由 `BytesMut` 覆盖，本类型只额外负责“租约”语义。
///
/// # 架构关系（How）
/// - `buf` 为实际内存，通过 `Deref<Target = [u8]>` 暴露已写入内容，并实现 [`BufMut`] 以支持追加写入；
/// - `recycler` 在 [`PooledBuffer::release`] 时被取出并收到携带内存的回收通知；
///   若缓冲在未归还的情况下被丢弃，`Drop` 会发送不携带内存的通知。
///
/// # 契约说明（What）
/// - 归还会消耗缓冲本身，归还后的内容无法再被原调用方读取；
/// - 缓冲从不在多个租借者之间共享，所有写操作都要求 `&mut self`。
pub struct PooledBuffer {
    buf: BytesMut,
    leased_capacity: usize,
    recycler: Option<Arc<dyn BufferRecycler>>,
}

impl PooledBuffer {
    /// 使用给定的 `BytesMut` 与回收句柄创建缓冲。
    ///
    /// # 前置条件
    /// - `inner` 由调用方独占（新分配或刚从自由链表取出）；
    /// - `recycler` 的生命周期覆盖缓冲的整个租约。
    pub fn new(inner: BytesMut, recycler: Arc<dyn BufferRecycler>) -> Self {
        Self {
            leased_capacity: inner.capacity(),
            buf: inner,
            recycler: Some(recycler),
        }
    }

    /// 当前已写入的字节数。
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// 当前底层内存的总容量。
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// 清空已写入内容，保留容量。
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// 将长度调整为 `new_len`，新增区域以 `value` 填充。
    ///
    /// 解码路径借此获得一块定长、已初始化的读入区。
    pub fn resize(&mut self, new_len: usize, value: u8) {
        self.buf.resize(new_len, value);
    }

    /// 显式结束租约，把底层内存交还给所属池。
    pub fn release(mut self) {
        let buffer = mem::take(&mut self.buf);
        if let Some(recycler) = self.recycler.take() {
            recycler.reclaim(ReclaimedBuffer::new(
                self.leased_capacity,
                buffer.capacity(),
                Some(buffer),
            ));
        }
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // 仅在未显式归还时触发：内存随缓冲一起释放，池只记录租约丢失。
        if let Some(recycler) = self.recycler.take() {
            recycler.reclaim(ReclaimedBuffer::new(
                self.leased_capacity,
                self.buf.capacity(),
                None,
            ));
        }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .field("leased", &self.recycler.is_some())
            .finish()
    }
}

// SAFETY: 所有方法都直接委派给 `BytesMut` 的 `BufMut` 实现，
// `advance_mut` 的前置条件由调用方按 `BufMut` 契约保证。
unsafe impl BufMut for PooledBuffer {
    fn remaining_mut(&self) -> usize {
        self.buf.remaining_mut()
    }

    unsafe fn advance_mut(&mut self, cnt: usize) {
        unsafe { self.buf.advance_mut(cnt) }
    }

    fn chunk_mut(&mut self) -> &mut UninitSlice {
        self.buf.chunk_mut()
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.buf.put_slice(src);
    }
}
