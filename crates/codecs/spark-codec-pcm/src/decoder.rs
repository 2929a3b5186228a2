//! 线性 PCM / 浮点样本解码器。
//!
//! # 教案式说明
//! - **意图 (Why)**：从无头字节流中恢复类型化样本，线上编码由输出样本类型推断；
//! - **执行逻辑 (How)**：每次 `decode` 按输出长度计算所需字节数，从缓冲池租借读入区，
//!   在数据源锁内读满该字节数后逐块拆包写入输出；
//! - **契约 (What)**：要么完整填满输出，要么返回错误；数据源提前结束时返回
//!   [`PcmError::ShortRead`]，绝不返回被静默截断的部分结果。

use std::{
    io::{self, Read},
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use spark_buffer::SlabBufferPool;

use crate::{
    codec::{ByteOrder, WireEncoding, unpack_bits},
    config::CodecConfig,
    error::PcmError,
    frame::Frame,
    sample::Sample,
};

#[derive(Clone, Copy, Debug)]
struct DecoderState {
    channels: usize,
    encoding: WireEncoding,
    byte_order: ByteOrder,
}

/// 从 `R` 读取字节并解码为 `F` 帧（样本类型 `T`）。
pub struct Decoder<F, T, R> {
    source: Mutex<R>,
    pool: SlabBufferPool,
    samples_decoded: AtomicU64,
    bytes_read: AtomicU64,
    state: Option<DecoderState>,
    _frame: PhantomData<fn() -> (F, T)>,
}

impl<F, T, R> Decoder<F, T, R>
where
    F: Frame<T>,
    T: Sample,
    R: Read,
{
    pub fn new(source: R, config: CodecConfig) -> Result<Self, PcmError> {
        Self::with_pool(source, config, SlabBufferPool::new())
    }

    pub fn with_pool(
        source: R,
        config: CodecConfig,
        pool: SlabBufferPool,
    ) -> Result<Self, PcmError> {
        let channels = <F as Frame<T>>::LAYOUT.resolve(config.channels)?;
        let encoding = WireEncoding::of::<T>()?;
        tracing::debug!(
            channels,
            width = encoding.width(),
            class = ?encoding.class(),
            byte_order = ?config.byte_order,
            "pcm decoder constructed"
        );
        Ok(Self {
            source: Mutex::new(source),
            pool,
            samples_decoded: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            state: Some(DecoderState {
                channels,
                encoding,
                byte_order: config.byte_order,
            }),
            _frame: PhantomData,
        })
    }

    /// 读取恰好 `out.len() × 声道数 × 宽度` 字节并解码到 `out`。
    ///
    /// # 契约说明（What）
    /// - 成功时 `out` 按数据源顺序被完整覆盖；
    /// - 数据源提前结束返回 [`PcmError::ShortRead`]，读取失败返回 [`PcmError::Io`]，
    ///   两种情况下 `out` 均不被修改，已读出的字节不会退回数据源；
    /// - `Interrupted` 按 `std::io::Read` 约定继续读取，其余错误不重试。
    pub fn decode(&self, out: &mut [F]) -> Result<(), PcmError> {
        let state = self.state.ok_or(PcmError::NotInitialized {
            component: "Decoder",
        })?;
        if state.channels != 1 {
            tracing::warn!(channels = state.channels, "multi-channel decoding rejected");
            return Err(PcmError::UnimplementedChannelCount {
                operation: "decode",
                channels: state.channels,
            });
        }
        if let Some((index, frame)) = out
            .iter()
            .enumerate()
            .find(|(_, frame)| frame.channel_count() != state.channels)
        {
            return Err(PcmError::frame_shape(format!(
                "output frame {index} carries {} channels, decoder expects {}",
                frame.channel_count(),
                state.channels
            )));
        }

        if out.is_empty() {
            return Ok(());
        }

        let width = state.encoding.width();
        let frame_bytes = state.channels * width;
        let expected = out.len() * frame_bytes;
        let mut buf = self.pool.acquire(expected);
        buf.resize(expected, 0);

        let filled = read_full(&mut *self.source.lock(), &mut buf);
        let filled = match filled {
            Ok(filled) => filled,
            Err(source) => {
                self.pool.release(buf);
                tracing::warn!(error = %source, expected, "pcm source read failed");
                return Err(PcmError::Io {
                    context: "reading encoded samples",
                    source,
                });
            }
        };
        if filled < expected {
            self.pool.release(buf);
            tracing::warn!(expected, actual = filled, "pcm source exhausted early");
            return Err(PcmError::ShortRead {
                expected,
                actual: filled,
            });
        }

        let result = unpack_frames::<F, T>(&buf, state, out);
        self.pool.release(buf);
        result?;

        self.samples_decoded
            .fetch_add(out.len() as u64, Ordering::Relaxed);
        self.bytes_read.fetch_add(expected as u64, Ordering::Relaxed);
        tracing::trace!(frames = out.len(), bytes = expected, "pcm frames decoded");
        Ok(())
    }
}

impl<F, T, R> Decoder<F, T, R>
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

    pub fn samples_decoded(&self) -> u64 {
        self.samples_decoded.load(Ordering::Relaxed)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    pub fn pool(&self) -> &SlabBufferPool {
        &self.pool
    }

    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }
}

/// 未配置的解码器：所有 `decode` 调用都返回 [`PcmError::NotInitialized`]。
impl<F, T, R: Default> Default for Decoder<F, T, R> {
    fn default() -> Self {
        Self {
            source: Mutex::new(R::default()),
            pool: SlabBufferPool::new(),
            samples_decoded: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            state: None,
            _frame: PhantomData,
        }
    }
}

// 读满 `dst` 或直到数据源结束，返回实际读入的字节数。
fn read_full<R: Read>(source: &mut R, dst: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < dst.len() {
        match source.read(&mut dst[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn unpack_frames<F, T>(bytes: &[u8], state: DecoderState, out: &mut [F]) -> Result<(), PcmError>
where
    F: Frame<T>,
    T: Sample,
{
    let width = state.encoding.width();
    for (frame, chunk) in out
        .iter_mut()
        .zip(bytes.chunks_exact(state.channels * width))
    {
        for (index, sample) in chunk.chunks_exact(width).enumerate() {
            let bits = unpack_bits(sample, state.encoding, state.byte_order)?;
            frame.set_channel(index, T::from_wire_bits(bits));
        }
    }
    Ok(())
}
