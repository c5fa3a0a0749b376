//! 基于 Otsu 阈值的内轮廓 (血池) 分割基线.

use super::morphology::{self, StructElement};
use crate::data::max_scaled_u8;
use crate::{metric, Mask, ShapeError};
use image::GrayImage;
use ndarray::{Array2, Array3, ArrayBase, ArrayView2, ArrayView3, Data, Ix3, Zip};
use num::ToPrimitive;
use std::num::NonZeroUsize;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 只统计 `region` 为 `true` 的像素, 求其 Otsu 阈值 (类间方差最大化).
///
/// 灰度严格大于返回值的像素属于高亮类. 区域为空时返回 `None`.
///
/// 调用方负责保证 `gray` 与 `region` 形状相同, 否则程序 panic.
pub fn otsu_level_within(gray: &ArrayView2<'_, u8>, region: &ArrayView2<'_, bool>) -> Option<u8> {
    let pixels: Vec<u8> = Zip::from(gray)
        .and(region)
        .fold(Vec::new(), |mut acc, &g, &inside| {
            if inside {
                acc.push(g);
            }
            acc
        });
    if pixels.is_empty() {
        return None;
    }
    let strip = GrayImage::from_raw(pixels.len() as u32, 1, pixels)?;
    Some(imageproc::contrast::otsu_level(&strip))
}

/// Otsu 阈值分割模型.
///
/// 给定 MRI 切片和外轮廓区域, 在区域内部按 Otsu 阈值划分高亮像素, 作为内轮廓预测.
/// 模型没有可训练状态, 只有可选的闭运算结构元尺寸.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OtsuThresholding {
    /// 闭运算椭圆结构元的边长. `None` 时不做闭运算.
    kernel_size: Option<NonZeroUsize>,
}

impl OtsuThresholding {
    /// 初始化. `kernel_size` 为 `None` 时不做闭运算.
    #[inline]
    pub const fn new(kernel_size: Option<NonZeroUsize>) -> Self {
        Self { kernel_size }
    }

    /// 带 `kernel_size × kernel_size` 椭圆结构元闭运算的模型.
    #[inline]
    pub const fn with_closing(kernel_size: NonZeroUsize) -> Self {
        Self::new(Some(kernel_size))
    }

    /// 闭运算结构元边长.
    #[inline]
    pub fn kernel_size(&self) -> Option<NonZeroUsize> {
        self.kernel_size
    }

    #[inline]
    fn struct_element(&self) -> Option<StructElement> {
        self.kernel_size.map(StructElement::ellipse)
    }

    /// 预测单个样本.
    ///
    /// 1. 按切片自身最大值线性缩放为 8-bit 灰度;
    /// 2. 只在 `region` 内求 Otsu 阈值, 灰度大于阈值的区域内像素预测为 `true`;
    /// 3. 若配置了结构元, 做闭运算后再把 `region` 以外的像素全部置为 `false`.
    ///
    /// `region` 全为 `false` 时返回全 `false` 掩码. 形状不同则返回 `Err`.
    pub fn predict_one<T: ToPrimitive>(
        &self,
        image: &ArrayView2<'_, T>,
        region: &ArrayView2<'_, bool>,
    ) -> Result<Mask, ShapeError> {
        ShapeError::check(image.shape(), region.shape())?;
        Ok(predict_sample(image, region, self.struct_element().as_ref()))
    }

    /// 逐样本预测 `(N, H, W)` 批数据.
    ///
    /// `images` 与 `regions` 形状必须完全相同, 否则返回 `Err`.
    /// 每个样本独立归一化, 样本之间不共享任何状态.
    pub fn predict<S1, S2, T>(
        &self,
        images: &ArrayBase<S1, Ix3>,
        regions: &ArrayBase<S2, Ix3>,
    ) -> Result<Array3<bool>, ShapeError>
    where
        S1: Data<Elem = T>,
        S2: Data<Elem = bool>,
        T: ToPrimitive + Sync,
    {
        ShapeError::check(images.shape(), regions.shape())?;
        let se = self.struct_element();
        let (images, regions) = (images.view(), regions.view());
        let masks = predict_all(&images, &regions, se.as_ref());

        let mut out = Array3::from_elem(regions.raw_dim(), false);
        for (mut slot, mask) in out.outer_iter_mut().zip(masks.iter()) {
            slot.assign(mask);
        }
        Ok(out)
    }

    /// 预测并与真值 `truth` 比较, 返回全批的 micro IoU.
    pub fn score<S1, S2, S3, T>(
        &self,
        images: &ArrayBase<S1, Ix3>,
        regions: &ArrayBase<S2, Ix3>,
        truth: &ArrayBase<S3, Ix3>,
    ) -> Result<f64, ShapeError>
    where
        S1: Data<Elem = T>,
        S2: Data<Elem = bool>,
        S3: Data<Elem = bool>,
        T: ToPrimitive + Sync,
    {
        let predicted = self.predict(images, regions)?;
        metric::iou(truth, &predicted)
    }

    /// 同 [`OtsuThresholding::score`], 但返回逐样本 IoU 的平均值 (macro IoU).
    pub fn mean_sample_score<S1, S2, S3, T>(
        &self,
        images: &ArrayBase<S1, Ix3>,
        regions: &ArrayBase<S2, Ix3>,
        truth: &ArrayBase<S3, Ix3>,
    ) -> Result<f64, ShapeError>
    where
        S1: Data<Elem = T>,
        S2: Data<Elem = bool>,
        S3: Data<Elem = bool>,
        T: ToPrimitive + Sync,
    {
        let predicted = self.predict(images, regions)?;
        metric::mean_sample_iou(truth, &predicted)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::Axis;
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        /// 借助 `rayon`, 并行地逐样本预测. 形状已由调用方检查.
        fn predict_all<T: ToPrimitive + Sync>(
            images: &ArrayView3<'_, T>,
            regions: &ArrayView3<'_, bool>,
            se: Option<&StructElement>,
        ) -> Vec<Mask> {
            (0..regions.len_of(Axis(0)))
                .into_par_iter()
                .map(|i| {
                    predict_sample(
                        &images.index_axis(Axis(0), i),
                        &regions.index_axis(Axis(0), i),
                        se,
                    )
                })
                .collect()
        }
    } else {
        /// 逐样本预测. 形状已由调用方检查.
        fn predict_all<T: ToPrimitive>(
            images: &ArrayView3<'_, T>,
            regions: &ArrayView3<'_, bool>,
            se: Option<&StructElement>,
        ) -> Vec<Mask> {
            images
                .outer_iter()
                .zip(regions.outer_iter())
                .map(|(image, region)| predict_sample(&image, &region, se))
                .collect()
        }
    }
}

/// 单样本预测. 形状已由调用方检查.
fn predict_sample<T: ToPrimitive>(
    image: &ArrayView2<'_, T>,
    region: &ArrayView2<'_, bool>,
    se: Option<&StructElement>,
) -> Mask {
    let gray = max_scaled_u8(image);
    let Some(level) = otsu_level_within(&gray.view(), region) else {
        return Array2::from_elem(region.raw_dim(), false);
    };

    let mut predicted = Zip::from(&gray)
        .and(region)
        .map_collect(|&g, &inside| inside && g > level);

    if let Some(se) = se {
        predicted = morphology::close(&predicted.view(), se);
        // 闭运算可能越出外轮廓, 这里截断.
        Zip::from(&mut predicted)
            .and(region)
            .for_each(|p, &inside| *p &= inside);
    }
    predicted
}
