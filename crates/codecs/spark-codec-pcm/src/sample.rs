//! 样本类型特征：由静态类型决定线上宽度与表示类别。
//!
//! # 设计动机（Why）
//! - 字节流本身不携带类型标签，编解码器只能依据实例化时的数值类型推断线上编码；
//! - 以密封 trait 在编译期声明 `宽度 + 类别`，不依赖运行时探测数值的溢出行为，
//!   未实现 [`Sample`] 的类型在编译阶段即被拒绝，杜绝“静默错误编码”。
//!
//! # 契约说明（What）
//! - 十种具体类型：`u8/u16/u32/u64`、`i8/i16/i32/i64`、`f32/f64`；
//! - 有符号整数的线上位模式等于同宽无符号整数的二进制补码重解释；
//! - 浮点数先转换为 IEEE-754 位模式，再按同宽无符号整数处理。

use core::fmt::Debug;

mod sealed {
    pub trait Sealed {}
}

/// 线上表示类别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleClass {
    Unsigned,
    Signed,
    Float,
}

/// 受支持的具体样本类型。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl SampleKind {
    /// 线上字节宽度，取值恒为 1/2/4/8。
    pub const fn width(self) -> usize {
        match self {
            SampleKind::U8 | SampleKind::I8 => 1,
            SampleKind::U16 | SampleKind::I16 => 2,
            SampleKind::U32 | SampleKind::I32 | SampleKind::F32 => 4,
            SampleKind::U64 | SampleKind::I64 | SampleKind::F64 => 8,
        }
    }

    pub const fn class(self) -> SampleClass {
        match self {
            SampleKind::U8 | SampleKind::U16 | SampleKind::U32 | SampleKind::U64 => {
                SampleClass::Unsigned
            }
            SampleKind::I8 | SampleKind::I16 | SampleKind::I32 | SampleKind::I64 => {
                SampleClass::Signed
            }
            SampleKind::F32 | SampleKind::F64 => SampleClass::Float,
        }
    }
}

/// 可被 PCM 编解码器处理的数值类型。
///
/// # 契约说明（What）
/// - `KIND`/`WIDTH`/`CLASS` 在编译期确定，编解码路径据此选择打包例程；
/// - `to_wire_bits`/`from_wire_bits` 在样本与“低 `WIDTH` 字节有效”的 `u64` 位模式之间互转，
///   对任意值满足 `from_wire_bits(to_wire_bits(v))` 与 `v` 位级相等；
/// - `EQUILIBRIUM` 为静音电平：无符号类型取中点 `1 << (bits - 1)`，其余类型取零；
/// - `mean` 供声道运算使用：整数类型在 `i128` 中精确求和并向零截断，
///   浮点类型在 `f64` 中求和；空输入返回 `None`。
///
/// 该 trait 是密封的，下游无法为其它类型实现。
pub trait Sample: sealed::Sealed + Copy + PartialEq + Debug + Default + Send + Sync + 'static {
    const KIND: SampleKind;
    const WIDTH: usize = Self::KIND.width();
    const CLASS: SampleClass = Self::KIND.class();
    const EQUILIBRIUM: Self;

    fn to_wire_bits(self) -> u64;
    fn from_wire_bits(bits: u64) -> Self;
    fn mean(samples: &[Self]) -> Option<Self>;
}

/// 返回类型 `T` 的线上字节宽度。
pub const fn width_of<T: Sample>() -> usize {
    T::WIDTH
}

/// 返回类型 `T` 的线上表示类别。
pub const fn class_of<T: Sample>() -> SampleClass {
    T::CLASS
}

// 64 位整数的任意多项之和都不会溢出 `i128`，均值必落在 `$ty` 的取值范围内。
macro_rules! integer_mean {
    ($samples:expr, $ty:ty) => {{
        let samples = $samples;
        if samples.is_empty() {
            None
        } else {
            let sum: i128 = samples.iter().map(|&sample| sample as i128).sum();
            Some((sum / samples.len() as i128) as $ty)
        }
    }};
}

macro_rules! impl_unsigned {
    ($ty:ty, $kind:ident) => {
        impl sealed::Sealed for $ty {}

        impl Sample for $ty {
            const KIND: SampleKind = SampleKind::$kind;
            const EQUILIBRIUM: Self = 1 << (<$ty>::BITS - 1);

            #[inline]
            fn to_wire_bits(self) -> u64 {
                self as u64
            }

            #[inline]
            fn from_wire_bits(bits: u64) -> Self {
                bits as $ty
            }

            fn mean(samples: &[Self]) -> Option<Self> {
                integer_mean!(samples, $ty)
            }
        }
    };
}

// 有符号整数复用同宽无符号位模式：`as $unsigned` 即二进制补码重解释。
macro_rules! impl_signed {
    ($ty:ty, $unsigned:ty, $kind:ident) => {
        impl sealed::Sealed for $ty {}

        impl Sample for $ty {
            const KIND: SampleKind = SampleKind::$kind;
            const EQUILIBRIUM: Self = 0;

            #[inline]
            fn to_wire_bits(self) -> u64 {
                (self as $unsigned) as u64
            }

            #[inline]
            fn from_wire_bits(bits: u64) -> Self {
                (bits as $unsigned) as $ty
            }

            fn mean(samples: &[Self]) -> Option<Self> {
                integer_mean!(samples, $ty)
            }
        }
    };
}

macro_rules! impl_float {
    ($ty:ty, $bits:ty, $kind:ident) => {
        impl sealed::Sealed for $ty {}

        impl Sample for $ty {
            const KIND: SampleKind = SampleKind::$kind;
            const EQUILIBRIUM: Self = 0.0;

            #[inline]
            fn to_wire_bits(self) -> u64 {
                <$ty>::to_bits(self) as u64
            }

            #[inline]
            fn from_wire_bits(bits: u64) -> Self {
                <$ty>::from_bits(bits as $bits)
            }

            fn mean(samples: &[Self]) -> Option<Self> {
                if samples.is_empty() {
                    return None;
                }
                let sum: f64 = samples.iter().map(|&sample| sample as f64).sum();
                Some((sum / samples.len() as f64) as $ty)
            }
        }
    };
}

impl_unsigned!(u8, U8);
impl_unsigned!(u16, U16);
impl_unsigned!(u32, U32);
impl_unsigned!(u64, U64);
impl_signed!(i8, u8, I8);
impl_signed!(i16, u16, I16);
impl_signed!(i32, u32, I32);
impl_signed!(i64, u64, I64);
impl_float!(f32, u32, F32);
impl_float!(f64, u64, F64);
