//! 切片灰度归一化.

use crate::consts::GRAY_MAX;
use ndarray::{Array2, ArrayView2};
use num::ToPrimitive;

/// 以样本自身最大值为基准的线性灰度缩放.
///
/// 对像素值 `v`, 缩放结果为 `v / max * 255` 向零截断, 并饱和到 `[0, 255]`.
/// 该对象是只读的. 若要修改最大值, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct MaxScale {
    max: f64,
}

impl MaxScale {
    /// 构建缩放.
    ///
    /// `max` 必须是正有限值, 否则返回 `None`.
    pub fn new(max: f64) -> Option<MaxScale> {
        (max.is_finite() && max > 0.0).then_some(Self { max })
    }

    /// 从切片的最大像素值构建缩放. 无法转换为 `f64` 的像素被忽略.
    ///
    /// 切片为空, 或者最大值不是正有限值时返回 `None`.
    pub fn from_view<T: ToPrimitive>(image: &ArrayView2<'_, T>) -> Option<MaxScale> {
        let max = image
            .iter()
            .filter_map(ToPrimitive::to_f64)
            .fold(f64::NEG_INFINITY, f64::max);
        Self::new(max)
    }

    /// 缩放基准 (最大值).
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// 求像素值 `v` 对应的 8-bit 灰度 (0 <= value <= 255).
    ///
    /// NaN 映射为 0.
    #[inline]
    pub fn eval(&self, v: f64) -> u8 {
        // 先除后乘. `as` 向零截断并饱和.
        (v / self.max * GRAY_MAX) as u8
    }
}

/// 将切片按自身最大值缩放为 8-bit 灰度图.
///
/// 如果最大值不是正有限值 (如全零切片), 则返回全零图.
pub fn max_scaled_u8<T: ToPrimitive>(image: &ArrayView2<'_, T>) -> Array2<u8> {
    match MaxScale::from_view(image) {
        Some(scale) => image.map(|v| v.to_f64().map_or(0, |v| scale.eval(v))),
        None => Array2::zeros(image.raw_dim()),
    }
}
