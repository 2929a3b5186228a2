use crate::codec::ByteOrder;

/// 编解码器构造期配置。
///
/// # 契约说明（What）
/// - `byte_order`：线上字节序，默认小端，对编码器与解码器一致生效；
/// - `channels`：显式声道数。静态布局（单声道、定长数组）可留空，若填写则必须与布局一致；
///   动态布局（[`MultiChannel`](crate::MultiChannel)）必须填写。
///
/// 启用 `serde` 特性后可直接从配置文件反序列化，缺省字段取默认值。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    pub byte_order: ByteOrder,
    pub channels: Option<usize>,
}

impl CodecConfig {
    /// 大端配置的快捷构造。
    pub fn big_endian() -> Self {
        Self::default().with_byte_order(ByteOrder::BigEndian)
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }
}
