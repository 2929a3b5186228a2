//! # spark-codec-pcm
//!
//! ## 教案目的（Why）
//! - **定位**：线性 PCM 与 IEEE-754 浮点样本的编解码器，负责在字节传输（文件、套接字、内存缓冲）
//!   与类型化样本数组之间搬运数据。
//! - **核心难点**：同一条泛型路径覆盖十种数值类型，线上宽度、有无符号/浮点类别与字节序
//!   只能由实例化时的样本类型推断，因为字节流不携带任何类型标签。
//!
//! ## 交互契约（What）
//! - [`Sample`]：编译期声明宽度与类别的密封 trait；
//! - [`codec`]：`pack_*`/`unpack_*` 纯函数，以及 [`ByteOrder`]、[`WireEncoding`]；
//! - [`Encoder`]/[`Decoder`]：借助 `spark-buffer` 的 [`SlabBufferPool`] 复用暂存区，
//!   以原子计数器记录已处理的样本数与字节数；
//! - [`Frame`]：单声道、定长多声道、动态多声道三种布局，构造期解析；
//!   当前仅实现单声道编解码，多声道返回 [`PcmError::UnimplementedChannelCount`]。
//!
//! ## 线上格式
//! - 定宽小端或大端数值的平铺序列，多声道时逐帧排列、帧内按声道排列；
//! - 无头部、无长度前缀、无类型标签，样本类型与声道数需由双方带外约定。
//!
//! ```
//! use spark_codec_pcm::{CodecConfig, MonoDecoder, MonoEncoder};
//!
//! let encoder = MonoEncoder::<i16, _>::new(Vec::new(), CodecConfig::default())?;
//! encoder.encode(&[-1, 0, 1])?;
//! let bytes = encoder.into_inner();
//! assert_eq!(bytes, [0xFF, 0xFF, 0x00, 0x00, 0x01, 0x00]);
//!
//! let decoder = MonoDecoder::<i16, _>::new(bytes.as_slice(), CodecConfig::default())?;
//! let mut samples = [0i16; 3];
//! decoder.decode(&mut samples)?;
//! assert_eq!(samples, [-1, 0, 1]);
//! # Ok::<(), spark_codec_pcm::PcmError>(())
//! ```

pub mod codec;
mod config;
mod decoder;
mod encoder;
mod error;
mod frame;
mod sample;

pub use codec::{ByteOrder, WireEncoding, WireWidth};
pub use config::CodecConfig;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{PcmError, PcmErrorKind};
pub use frame::{ChannelLayout, Frame, MultiChannel, Stereo};
pub use sample::{Sample, SampleClass, SampleKind, class_of, width_of};
pub use spark_buffer::SlabBufferPool;

/// 单声道编码器：帧即样本本身。
pub type MonoEncoder<T, W> = Encoder<T, T, W>;

/// 单声道解码器：帧即样本本身。
pub type MonoDecoder<T, R> = Decoder<T, T, R>;
