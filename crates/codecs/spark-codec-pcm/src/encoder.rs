//! 线性 PCM / 浮点样本编码器。
//!
//! # 教案式说明
//! - **意图 (Why)**：把类型化的帧序列转换为无头、定宽的字节流并写入数据汇；
//!   线上编码完全由样本类型决定，字节流不携带任何类型标签。
//! - **执行逻辑 (How)**：每次 `encode` 从缓冲池租借一块 `帧数 × 声道数 × 宽度` 的暂存区，
//!   逐帧逐声道打包后一次性写出，成功后再原子地推进计数器并归还缓冲。
//! - **契约 (What)**：`encode` 只需 `&self`，同一实例可被多个线程并发调用；
//!   数据汇受互斥锁保护，单次调用的字节在流中保持连续。
//! - **设计权衡 (Trade-offs)**：写失败时不回滚数据汇中可能已写入的部分字节，计数器保持不变。

use std::{
    io::Write,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use spark_buffer::SlabBufferPool;

use crate::{
    codec::{ByteOrder, WireEncoding, pack_bits},
    config::CodecConfig,
    error::PcmError,
    frame::Frame,
    sample::Sample,
};

#[derive(Clone, Copy, Debug)]
struct EncoderState {
    channels: usize,
    encoding: WireEncoding,
    byte_order: ByteOrder,
}

/// 将 `F` 帧（样本类型 `T`）编码后写入 `W`。
pub struct Encoder<F, T, W> {
    sink: Mutex<W>,
    pool: SlabBufferPool,
    samples_encoded: AtomicU64,
    bytes_written: AtomicU64,
    state: Option<EncoderState>,
    _frame: PhantomData<fn(&F) -> T>,
}

impl<F, T, W> Encoder<F, T, W>
where
    F: Frame<T>,
    T: Sample,
    W: Write,
{
    /// 使用独立的缓冲池构造编码器。
    pub fn new(sink: W, config: CodecConfig) -> Result<Self, PcmError> {
        Self::with_pool(sink, config, SlabBufferPool::new())
    }

    /// 使用注入的缓冲池构造编码器，多个编解码器可共享同一个池。
    ///
    /// 帧布局无法解析为正的声道数时立即返回 [`PcmError::UnsupportedFrameShape`]。
    pub fn with_pool(sink: W, config: CodecConfig, pool: SlabBufferPool) -> Result<Self, PcmError> {
        let channels = <F as Frame<T>>::LAYOUT.resolve(config.channels)?;
        let encoding = WireEncoding::of::<T>()?;
        tracing::debug!(
            channels,
            width = encoding.width(),
            class = ?encoding.class(),
            byte_order = ?config.byte_order,
            "pcm encoder constructed"
        );
        Ok(Self {
            sink: Mutex::new(sink),
            pool,
            samples_encoded: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            state: Some(EncoderState {
                channels,
                encoding,
                byte_order: config.byte_order,
            }),
            _frame: PhantomData,
        })
    }

    /// 编码 `frames` 并一次性写入数据汇。
    ///
    /// # 契约说明（What）
    /// - 字节顺序为逐帧排列，每帧内按声道顺序排列；
    /// - 声道数 ≥ 2 时返回 [`PcmError::UnimplementedChannelCount`]，不写出任何字节；
    /// - 写失败返回 [`PcmError::Io`]，计数器保持不变；
    /// - 空输入视为成功，不向数据汇写入。
    pub fn encode(&self, frames: &[F]) -> Result<(), PcmError> {
        let state = self.state.ok_or(PcmError::NotInitialized {
            component: "Encoder",
        })?;
        if state.channels != 1 {
            tracing::warn!(channels = state.channels, "multi-channel encoding rejected");
            return Err(PcmError::UnimplementedChannelCount {
                operation: "encode",
                channels: state.channels,
            });
        }
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, frame)| frame.channel_count() != state.channels)
        {
            return Err(PcmError::frame_shape(format!(
                "frame {index} carries {} channels, encoder expects {}",
                frame.channel_count(),
                state.channels
            )));
        }

        if frames.is_empty() {
            return Ok(());
        }

        let width = state.encoding.width();
        let mut buf = self.pool.acquire(frames.len() * state.channels * width);
        for frame in frames {
            for sample in (0..state.channels).filter_map(|index| frame.channel(index)) {
                pack_bits(sample.to_wire_bits(), state.encoding, state.byte_order, &mut buf);
            }
        }

        let written = buf.len();
        let result = self.sink.lock().write_all(&buf);
        self.pool.release(buf);
        if let Err(source) = result {
            tracing::warn!(error = %source, frames = frames.len(), "pcm sink write failed");
            return Err(PcmError::Io {
                context: "writing encoded samples",
                source,
            });
        }

        self.samples_encoded
            .fetch_add(frames.len() as u64, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(written as u64, Ordering::Relaxed);
        tracing::trace!(frames = frames.len(), bytes = written, "pcm frames encoded");
        Ok(())
    }

    /// 刷新数据汇。
    pub fn flush(&self) -> Result<(), PcmError> {
        self.sink
            .lock()
            .flush()
            .map_err(|source| PcmError::Io {
                context: "flushing encoded samples",
                source,
            })
    }
}

impl<F, T, W> Encoder<F, T, W>
where
    T: Sample,
{
    /// 声道数；未初始化的实例返回 0。
    pub fn channels(&self) -> usize {
        self.state.map_or(0, |state| state.channels)
    }

    /// 单个样本的线上字节宽度。
    pub fn byte_size(&self) -> usize {
        T::WIDTH
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.state.map_or_else(ByteOrder::default, |state| state.byte_order)
    }

    /// 已成功编码的帧数快照。
    pub fn samples_encoded(&self) -> u64 {
        self.samples_encoded.load(Ordering::Relaxed)
    }

    /// 已成功写出的字节数快照。
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// 编码器使用的缓冲池句柄。
    pub fn pool(&self) -> &SlabBufferPool {
        &self.pool
    }

    /// 消耗编码器并取回数据汇。
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

/// 未配置的编码器：所有 `encode` 调用都返回 [`PcmError::NotInitialized`]。
impl<F, T, W: Default> Default for Encoder<F, T, W> {
    fn default() -> Self {
        Self {
            sink: Mutex::new(W::default()),
            pool: SlabBufferPool::new(),
            samples_encoded: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            state: None,
            _frame: PhantomData,
        }
    }
}
