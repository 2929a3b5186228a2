//! 字节级打包/拆包例程。
//!
//! # 模块定位（Why）
//! - 编码器与解码器共享同一组纯函数：数值位模式 ↔ 定宽字节序列；
//! - 所有样本类型最终都归约为“按宽度写出一个无符号整数”：
//!   有符号整数走二进制补码重解释，浮点数走 IEEE-754 位模式，
//!   因此 `i16` 的 −1 与 `u16` 的 65535 必然得到相同的 `FF FF`。
//!
//! # 实现策略（How）
//! - [`WireEncoding`] 在构造时校验 `宽度 × 类别` 组合，宽度以 [`WireWidth`] 枚举承载，
//!   后续打包分支可穷举匹配而无需兜底 panic；
//! - 打包写入任意 [`BufMut`]，拆包从切片读取，字节序由 [`ByteOrder`] 统一决定。

use bytes::{Buf, BufMut};

use crate::{
    error::PcmError,
    sample::{Sample, SampleClass},
};

/// 线上字节序，构造编解码器时选定并对所有样本统一生效。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

/// 受支持的线上宽度。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireWidth {
    One,
    Two,
    Four,
    Eight,
}

impl WireWidth {
    pub const fn bytes(self) -> usize {
        match self {
            WireWidth::One => 1,
            WireWidth::Two => 2,
            WireWidth::Four => 4,
            WireWidth::Eight => 8,
        }
    }
}

/// 经过校验的 `宽度 × 类别` 组合。
///
/// 受支持集合：1/2 字节的有/无符号整数，4/8 字节的有/无符号整数与浮点数。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WireEncoding {
    width: WireWidth,
    class: SampleClass,
}

impl WireEncoding {
    /// 校验组合并构造编码描述，不受支持时返回 [`PcmError::UnsupportedEncoding`]。
    pub fn new(width: usize, class: SampleClass) -> Result<Self, PcmError> {
        let wire_width = match (width, class) {
            (1, SampleClass::Unsigned | SampleClass::Signed) => WireWidth::One,
            (2, SampleClass::Unsigned | SampleClass::Signed) => WireWidth::Two,
            (4, _) => WireWidth::Four,
            (8, _) => WireWidth::Eight,
            _ => return Err(PcmError::UnsupportedEncoding { width, class }),
        };
        Ok(Self {
            width: wire_width,
            class,
        })
    }

    /// 由样本类型推导编码描述。
    ///
    /// 所有 [`Sample`] 实现都落在受支持集合内，但此处仍走校验路径而非假设成立。
    pub fn of<T: Sample>() -> Result<Self, PcmError> {
        Self::new(T::WIDTH, T::CLASS)
    }

    pub fn width(&self) -> usize {
        self.width.bytes()
    }

    pub fn wire_width(&self) -> WireWidth {
        self.width
    }

    pub fn class(&self) -> SampleClass {
        self.class
    }
}

/// 将 `bits` 的低 `width` 字节按 `order` 写入 `out`。
#[inline]
pub fn pack_bits<B: BufMut>(bits: u64, encoding: WireEncoding, order: ByteOrder, out: &mut B) {
    match (encoding.width, order) {
        (WireWidth::One, _) => out.put_u8(bits as u8),
        (WireWidth::Two, ByteOrder::LittleEndian) => out.put_u16_le(bits as u16),
        (WireWidth::Two, ByteOrder::BigEndian) => out.put_u16(bits as u16),
        (WireWidth::Four, ByteOrder::LittleEndian) => out.put_u32_le(bits as u32),
        (WireWidth::Four, ByteOrder::BigEndian) => out.put_u32(bits as u32),
        (WireWidth::Eight, ByteOrder::LittleEndian) => out.put_u64_le(bits),
        (WireWidth::Eight, ByteOrder::BigEndian) => out.put_u64(bits),
    }
}

/// 从 `bytes` 开头读取一个 `width` 字节的位模式。
///
/// `bytes` 不足 `width` 字节时返回 [`PcmError::ShortRead`]，多余字节被忽略。
#[inline]
pub fn unpack_bits(bytes: &[u8], encoding: WireEncoding, order: ByteOrder) -> Result<u64, PcmError> {
    let width = encoding.width();
    if bytes.len() < width {
        return Err(PcmError::ShortRead {
            expected: width,
            actual: bytes.len(),
        });
    }
    let mut src = &bytes[..width];
    let bits = match (encoding.width, order) {
        (WireWidth::One, _) => src.get_u8() as u64,
        (WireWidth::Two, ByteOrder::LittleEndian) => src.get_u16_le() as u64,
        (WireWidth::Two, ByteOrder::BigEndian) => src.get_u16() as u64,
        (WireWidth::Four, ByteOrder::LittleEndian) => src.get_u32_le() as u64,
        (WireWidth::Four, ByteOrder::BigEndian) => src.get_u32() as u64,
        (WireWidth::Eight, ByteOrder::LittleEndian) => src.get_u64_le(),
        (WireWidth::Eight, ByteOrder::BigEndian) => src.get_u64(),
    };
    Ok(bits)
}

/// 打包单个样本。
pub fn pack_sample<T: Sample, B: BufMut>(
    value: T,
    order: ByteOrder,
    out: &mut B,
) -> Result<(), PcmError> {
    let encoding = WireEncoding::of::<T>()?;
    pack_bits(value.to_wire_bits(), encoding, order, out);
    Ok(())
}

/// 拆包单个样本。
pub fn unpack_sample<T: Sample>(bytes: &[u8], order: ByteOrder) -> Result<T, PcmError> {
    let encoding = WireEncoding::of::<T>()?;
    unpack_bits(bytes, encoding, order).map(T::from_wire_bits)
}

/// 批量打包，返回写入的字节数。
pub fn pack_slice<T: Sample, B: BufMut>(
    src: &[T],
    order: ByteOrder,
    out: &mut B,
) -> Result<usize, PcmError> {
    let encoding = WireEncoding::of::<T>()?;
    for sample in src {
        pack_bits(sample.to_wire_bits(), encoding, order, out);
    }
    Ok(src.len() * encoding.width())
}

/// 批量拆包：从 `bytes` 开头读取 `out.len() * T::WIDTH` 字节。
///
/// 字节不足时返回 [`PcmError::ShortRead`] 且不修改 `out`；多余字节被忽略，与 [`unpack_bits`] 一致。
pub fn unpack_slice<T: Sample>(
    bytes: &[u8],
    order: ByteOrder,
    out: &mut [T],
) -> Result<(), PcmError> {
    let encoding = WireEncoding::of::<T>()?;
    let expected = out.len() * encoding.width();
    if bytes.len() < expected {
        return Err(PcmError::ShortRead {
            expected,
            actual: bytes.len(),
        });
    }
    for (slot, chunk) in out
        .iter_mut()
        .zip(bytes[..expected].chunks_exact(encoding.width()))
    {
        *slot = T::from_wire_bits(unpack_bits(chunk, encoding, order)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed<T: Sample>(value: T, order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::new();
        pack_sample(value, order, &mut out).expect("受支持的样本类型");
        out
    }

    #[test]
    fn endianness_of_u32_one() {
        assert_eq!(packed(1u32, ByteOrder::LittleEndian), [0x01, 0x00, 0x00, 0x00]);
        assert_eq!(packed(1u32, ByteOrder::BigEndian), [0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn signed_packing_matches_unsigned_bit_pattern() {
        for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
            assert_eq!(packed(-1i16, order), [0xFF, 0xFF]);
            assert_eq!(packed(-1i16, order), packed(u16::MAX, order));
            assert_eq!(packed(i8::MIN, order), packed(0x80u8, order));
            assert_eq!(packed(-2i32, order), packed(0xFFFF_FFFEu32, order));
            assert_eq!(packed(i64::MIN, order), packed(1u64 << 63, order));
        }
    }

    #[test]
    fn floats_use_ieee754_bits() {
        assert_eq!(
            packed(1.0f32, ByteOrder::BigEndian),
            1.0f32.to_bits().to_be_bytes()
        );
        assert_eq!(
            packed(-0.5f64, ByteOrder::LittleEndian),
            (-0.5f64).to_bits().to_le_bytes()
        );
    }

    #[test]
    fn eight_bit_float_is_rejected() {
        let err = WireEncoding::new(1, SampleClass::Float).expect_err("1 字节浮点不受支持");
        assert!(matches!(
            err,
            PcmError::UnsupportedEncoding {
                width: 1,
                class: SampleClass::Float
            }
        ));
        assert!(WireEncoding::new(2, SampleClass::Float).is_err());
        assert!(WireEncoding::new(3, SampleClass::Unsigned).is_err());
        assert!(WireEncoding::new(16, SampleClass::Signed).is_err());
    }

    #[test]
    fn unpack_requires_full_width() {
        let encoding = WireEncoding::of::<u32>().expect("u32 受支持");
        let err = unpack_bits(&[1, 2, 3], encoding, ByteOrder::LittleEndian)
            .expect_err("不足 4 字节");
        assert!(matches!(err, PcmError::ShortRead { expected: 4, actual: 3 }));
    }

    #[test]
    fn slice_unpack_rejects_short_input_without_touching_output() {
        let mut out = [7i16; 3];
        let err = unpack_slice(&[0u8; 5], ByteOrder::LittleEndian, &mut out)
            .expect_err("5 字节无法拆为 3 个 i16");
        assert!(matches!(err, PcmError::ShortRead { expected: 6, actual: 5 }));
        assert_eq!(out, [7; 3]);
    }

    #[test]
    fn slice_unpack_ignores_trailing_bytes() {
        let mut out = [0i16; 3];
        unpack_slice(
            &[0x01, 0x00, 0xFF, 0xFF, 0x00, 0x80, 0xAA, 0xBB],
            ByteOrder::LittleEndian,
            &mut out,
        )
        .expect("8 字节足以拆出 3 个 i16");
        assert_eq!(out, [1, -1, i16::MIN]);
    }

    #[test]
    fn slice_round_trip_big_endian() {
        let src = [i16::MIN, -1, 0, 1, i16::MAX];
        let mut bytes = Vec::new();
        let written = pack_slice(&src, ByteOrder::BigEndian, &mut bytes).expect("打包");
        assert_eq!(written, 10);
        assert_eq!(&bytes[..2], &[0x80, 0x00]);
        let mut out = [0i16; 5];
        unpack_slice(&bytes, ByteOrder::BigEndian, &mut out).expect("拆包");
        assert_eq!(out, src);
    }
}
