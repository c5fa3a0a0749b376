//! 二维二值形态学操作.

use crate::Mask;
use ndarray::{Array2, ArrayView2};
use std::num::NonZeroUsize;

/// 二值结构元. 锚点位于 `(rows / 2, cols / 2)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructElement {
    data: Array2<bool>,
}

impl StructElement {
    /// `size × size` 的椭圆 (内切圆) 结构元.
    ///
    /// 第 `i` 行的前景为以中心列为对称轴、半宽 `round(c * sqrt(1 - dy² / r²))`
    /// 的连续区间, 其中 `r = c = size / 2`, `dy = i - r`. 偶数尺寸时结构元不对称.
    pub fn ellipse(size: NonZeroUsize) -> Self {
        let size = size.get();
        let r = (size / 2) as isize;
        let c = r;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let mut data = Array2::from_elem((size, size), false);
        for (i, mut row) in data.outer_iter_mut().enumerate() {
            let dy = i as isize - r;
            if dy.abs() > r {
                continue;
            }
            let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round_ties_even();
            let dx = dx as isize;
            let j1 = (c - dx).max(0) as usize;
            let j2 = (c + dx + 1).min(size as isize) as usize;
            row.slice_mut(ndarray::s![j1..j2]).fill(true);
        }
        Self { data }
    }

    /// 锚点 (行, 列).
    #[inline]
    pub fn anchor(&self) -> (usize, usize) {
        let (h, w) = self.data.dim();
        (h / 2, w / 2)
    }

    /// 结构元的布尔数组视图.
    #[inline]
    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.data.view()
    }

    /// 前景元素相对锚点的偏移量 `(dh, dw)`.
    fn offsets(&self) -> Vec<(isize, isize)> {
        let (ah, aw) = self.anchor();
        self.data
            .indexed_iter()
            .filter(|(_, on)| **on)
            .map(|((i, j), _)| (i as isize - ah as isize, j as isize - aw as isize))
            .collect()
    }
}

/// 在每个像素的结构元邻域上求 "或" (膨胀) 或 "与" (腐蚀).
fn sweep(mask: &ArrayView2<'_, bool>, se: &StructElement, dilate: bool) -> Mask {
    let (height, width) = mask.dim();
    let offsets = se.offsets();
    // 膨胀时越界视为背景, 腐蚀时越界视为前景, 即边界永远不产生影响.
    let outside = !dilate;

    Array2::from_shape_fn((height, width), |(h, w)| {
        let mut values = offsets.iter().map(|&(dh, dw)| {
            let (y, x) = (h as isize + dh, w as isize + dw);
            if y < 0 || x < 0 || y >= height as isize || x >= width as isize {
                outside
            } else {
                mask[(y as usize, x as usize)]
            }
        });
        if dilate {
            values.any(|v| v)
        } else {
            values.all(|v| v)
        }
    })
}

/// 形态学膨胀: `dst(h, w) = max src(h + dh, w + dw)`, 遍历结构元全部前景偏移.
#[inline]
pub fn dilate(mask: &ArrayView2<'_, bool>, se: &StructElement) -> Mask {
    sweep(mask, se, true)
}

/// 形态学腐蚀: `dst(h, w) = min src(h + dh, w + dw)`, 遍历结构元全部前景偏移.
#[inline]
pub fn erode(mask: &ArrayView2<'_, bool>, se: &StructElement) -> Mask {
    sweep(mask, se, false)
}

/// 形态学闭运算: 先膨胀后腐蚀. 用于填补掩码中的小空洞与缝隙.
pub fn close(mask: &ArrayView2<'_, bool>, se: &StructElement) -> Mask {
    let dilated = dilate(mask, se);
    erode(&dilated.view(), se)
}
