//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为 PCM 编解码对外暴露的错误语义提供集中定义；
//! - 区分“构造期配置错误”“能力缺口”“数据不足”“底层 I/O 失败”“编码组合不受支持”，
//!   调用方可据此选择重试、降级或直接终止。
//!
//! ## 设计要求（What）
//! - 所有变体实现 `thiserror::Error`，I/O 失败通过 `#[source]` 保留原始 `std::io::Error`；
//! - 编解码内部从不重试或吞掉错误，一律返回给直接调用方；
//! - [`PcmError::kind`] 提供可 `Copy` 的分类，便于在不解构变体的情况下做匹配。

use std::io;

use thiserror::Error;

use crate::sample::SampleClass;

/// PCM 编解码错误域。
#[derive(Debug, Error)]
pub enum PcmError {
    /// 在未经构造流程配置的实例上执行编解码（例如通过 `Default` 得到的空实例）。
    #[error("{component} is not initialized")]
    NotInitialized { component: &'static str },

    /// 帧类型无法归入单声道、定长多声道或动态多声道中的任何一种可用布局。
    ///
    /// 构造期即返回，不会推迟到首次编解码。
    #[error("unsupported frame shape: {detail}")]
    UnsupportedFrameShape { detail: String },

    /// 声道数 ≥ 2 的编解码尚未实现。
    ///
    /// - **意图 (Why)**：让调用方能以程序化方式识别能力缺口，而不是得到 panic 或被截断的字节流。
    #[error("{operation} with {channels} channels is not implemented")]
    UnimplementedChannelCount {
        operation: &'static str,
        channels: usize,
    },

    /// 数据源在凑满所需字节数之前结束。
    #[error("short read: expected {expected} bytes, source yielded {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// 底层数据源或数据汇的 I/O 失败。
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// 宽度与类别的组合不在受支持集合内（例如 1 字节浮点）。
    #[error("unsupported wire encoding: {width}-byte {class:?}")]
    UnsupportedEncoding { width: usize, class: SampleClass },
}

/// [`PcmError`] 的轻量分类。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PcmErrorKind {
    NotInitialized,
    UnsupportedFrameShape,
    UnimplementedChannelCount,
    ShortRead,
    Io,
    UnsupportedEncoding,
}

impl PcmError {
    pub fn kind(&self) -> PcmErrorKind {
        match self {
            PcmError::NotInitialized { .. } => PcmErrorKind::NotInitialized,
            PcmError::UnsupportedFrameShape { .. } => PcmErrorKind::UnsupportedFrameShape,
            PcmError::UnimplementedChannelCount { .. } => PcmErrorKind::UnimplementedChannelCount,
            PcmError::ShortRead { .. } => PcmErrorKind::ShortRead,
            PcmError::Io { .. } => PcmErrorKind::Io,
            PcmError::UnsupportedEncoding { .. } => PcmErrorKind::UnsupportedEncoding,
        }
    }

    pub(crate) fn frame_shape(detail: impl Into<String>) -> Self {
        PcmError::UnsupportedFrameShape {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn io_error_keeps_source_chain() {
        let err = PcmError::Io {
            context: "writing encoded samples",
            source: io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"),
        };
        assert_eq!(err.kind(), PcmErrorKind::Io);
        assert_eq!(err.to_string(), "writing encoded samples: sink closed");
        assert!(err.source().is_some());
    }

    #[test]
    fn short_read_message_reports_both_counts() {
        let err = PcmError::ShortRead {
            expected: 8,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "short read: expected 8 bytes, source yielded 3"
        );
    }
}
