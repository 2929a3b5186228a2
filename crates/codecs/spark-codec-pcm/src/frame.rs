//! 帧模型：一个时间片上所有声道的样本。
//!
//! # 设计动机（Why）
//! - 编解码器需要在构造期一次性确定声道布局，调用期只依赖“声道数 + 按声道访问”两项能力；
//! - 将布局表达为 [`ChannelLayout`] 枚举：单声道、定长多声道、动态多声道，
//!   取代运行时对帧类型的反射判断。
//!
//! # 契约说明（What）
//! - 任意 [`Sample`] 本身即单声道帧；`[T; N]`（含 [`Stereo`]）为定长帧；
//!   [`MultiChannel`] 为动态帧，声道数须在构造编解码器时通过配置给出；
//! - [`MultiChannel`] 额外提供逐声道算术与中置声道（均值）等辅助运算，
//!   这些运算与线上编码无关。

use core::ops::{
    Add, AddAssign, Deref, DerefMut, Div, DivAssign, Mul, MulAssign, Sub, SubAssign,
};

use crate::{error::PcmError, sample::Sample};

/// 帧的声道布局，在编解码器构造时解析。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Mono,
    Fixed(usize),
    Dynamic,
}

impl ChannelLayout {
    /// 布局本身携带的声道数；动态布局返回 `None`。
    pub const fn static_channels(self) -> Option<usize> {
        match self {
            ChannelLayout::Mono => Some(1),
            ChannelLayout::Fixed(n) => Some(n),
            ChannelLayout::Dynamic => None,
        }
    }

    /// 结合配置中的声道数，解析出编解码器实际使用的声道数。
    ///
    /// # 契约说明（What）
    /// - 静态布局：配置为空或与布局一致时返回布局声道数，否则视为帧形状冲突；
    /// - 动态布局：必须由配置给出正的声道数；
    /// - 任何解析结果为 0 的情况都返回 [`PcmError::UnsupportedFrameShape`]。
    pub fn resolve(self, configured: Option<usize>) -> Result<usize, PcmError> {
        let channels = match (self.static_channels(), configured) {
            (Some(fixed), None) => fixed,
            (Some(fixed), Some(requested)) if fixed == requested => fixed,
            (Some(fixed), Some(requested)) => {
                return Err(PcmError::frame_shape(format!(
                    "{self:?} layout carries {fixed} channels but {requested} were configured"
                )));
            }
            (None, Some(requested)) => requested,
            (None, None) => {
                return Err(PcmError::frame_shape(
                    "dynamic channel layout requires a configured channel count",
                ));
            }
        };
        if channels == 0 {
            return Err(PcmError::frame_shape(format!(
                "{self:?} layout resolves to zero channels"
            )));
        }
        Ok(channels)
    }
}

/// 编解码器交换的帧。
pub trait Frame<T: Sample>: Send + Sync + 'static {
    const LAYOUT: ChannelLayout;

    fn channel_count(&self) -> usize;

    /// 读取第 `index` 个声道，越界时返回 `None`。
    fn channel(&self, index: usize) -> Option<T>;

    /// 写入第 `index` 个声道，越界时返回 `false` 且不做修改。
    fn set_channel(&mut self, index: usize, value: T) -> bool;
}

impl<T: Sample> Frame<T> for T {
    const LAYOUT: ChannelLayout = ChannelLayout::Mono;

    fn channel_count(&self) -> usize {
        1
    }

    fn channel(&self, index: usize) -> Option<T> {
        (index == 0).then_some(*self)
    }

    fn set_channel(&mut self, index: usize, value: T) -> bool {
        if index != 0 {
            return false;
        }
        *self = value;
        true
    }
}

impl<T: Sample, const N: usize> Frame<T> for [T; N] {
    const LAYOUT: ChannelLayout = ChannelLayout::Fixed(N);

    fn channel_count(&self) -> usize {
        N
    }

    fn channel(&self, index: usize) -> Option<T> {
        self.get(index).copied()
    }

    fn set_channel(&mut self, index: usize, value: T) -> bool {
        match self.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// 双声道帧，`[0]` 为左声道、`[1]` 为右声道。
pub type Stereo<T> = [T; 2];

/// 声道数在运行期确定的帧。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiChannel<T>(Vec<T>);

impl<T: Sample> MultiChannel<T> {
    /// 复制给定样本构造帧。
    pub fn from_samples(samples: &[T]) -> Self {
        Self(samples.to_vec())
    }

    /// 构造 `channels` 个声道、全部处于静音电平的帧。
    ///
    /// 无符号类型的静音电平是取值区间中点（例如 `u8` 为 128），而非 0。
    pub fn silence(channels: usize) -> Self {
        Self(vec![T::EQUILIBRIUM; channels])
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }

    /// 将所有声道设为 `value`。
    pub fn set(&mut self, value: T) -> &mut Self {
        self.0.iter_mut().for_each(|slot| *slot = value);
        self
    }

    /// 中置声道：所有声道的算术平均。
    ///
    /// 整数类型精确求和后向零截断，不会因累加溢出或丢失精度；空帧返回 `None`。
    pub fn mid(&self) -> Option<T> {
        T::mean(&self.0)
    }
}

impl<T> From<Vec<T>> for MultiChannel<T> {
    fn from(samples: Vec<T>) -> Self {
        Self(samples)
    }
}

impl<T> FromIterator<T> for MultiChannel<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> Deref for MultiChannel<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> DerefMut for MultiChannel<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.0
    }
}

impl<T: Sample> Frame<T> for MultiChannel<T> {
    const LAYOUT: ChannelLayout = ChannelLayout::Dynamic;

    fn channel_count(&self) -> usize {
        self.0.len()
    }

    fn channel(&self, index: usize) -> Option<T> {
        self.0.get(index).copied()
    }

    fn set_channel(&mut self, index: usize, value: T) -> bool {
        match self.0.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

// 逐声道算术：标量形式作用于每个声道；向量形式要求声道数相同，不同时保持原值不变。
macro_rules! impl_channel_op {
    ($assign_trait:ident, $assign_fn:ident, $op_trait:ident, $op_fn:ident, $op:tt) => {
        impl<T: Sample + $op_trait<Output = T>> $assign_trait<T> for MultiChannel<T> {
            fn $assign_fn(&mut self, rhs: T) {
                for slot in self.0.iter_mut() {
                    *slot = *slot $op rhs;
                }
            }
        }

        impl<T: Sample + $op_trait<Output = T>> $assign_trait<&MultiChannel<T>> for MultiChannel<T> {
            fn $assign_fn(&mut self, rhs: &MultiChannel<T>) {
                if self.0.len() != rhs.0.len() {
                    return;
                }
                for (slot, other) in self.0.iter_mut().zip(rhs.0.iter()) {
                    *slot = *slot $op *other;
                }
            }
        }

        impl<T: Sample + $op_trait<Output = T>> $op_trait<T> for MultiChannel<T> {
            type Output = MultiChannel<T>;

            fn $op_fn(mut self, rhs: T) -> MultiChannel<T> {
                $assign_trait::$assign_fn(&mut self, rhs);
                self
            }
        }

        impl<T: Sample + $op_trait<Output = T>> $op_trait<&MultiChannel<T>> for MultiChannel<T> {
            type Output = MultiChannel<T>;

            fn $op_fn(mut self, rhs: &MultiChannel<T>) -> MultiChannel<T> {
                $assign_trait::$assign_fn(&mut self, rhs);
                self
            }
        }
    };
}

impl_channel_op!(AddAssign, add_assign, Add, add, +);
impl_channel_op!(SubAssign, sub_assign, Sub, sub, -);
impl_channel_op!(MulAssign, mul_assign, Mul, mul, *);
impl_channel_op!(DivAssign, div_assign, Div, div, /);
