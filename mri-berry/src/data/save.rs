//! 图像的持久化存储.

use super::normalize::max_scaled_u8;
use crate::consts::gray::{BLACK, WHITE};
use image::ImageResult;
use ndarray::{Array2, ArrayView2};
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 掩码的前景/背景分别保存为白色/黑色; MRI 切片按自身最大值缩放为 8-bit 灰度.
/// 输出格式由 `path` 的扩展名决定.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 将行优先的 8-bit 灰度数据写入文件.
fn save_gray<P: AsRef<Path>>(gray: ArrayView2<'_, u8>, path: P) -> ImageResult<()> {
    let (height, width) = gray.dim();
    let mut buf = image::GrayImage::new(width as u32, height as u32);
    for ((h, w), &pix) in gray.indexed_iter() {
        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
    }
    buf.save(path)
}

macro_rules! impl_mask_vis {
    ($($mask: ty),+) => {
        $(
            /// 前景为白色, 背景为黑色.
            impl ImgWriteVis for $mask {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let gray = self.map(|&p| if p { WHITE } else { BLACK });
                    save_gray(gray.view(), path)
                }
            }
        )+
    };
}

macro_rules! impl_image_vis {
    ($($image: ty),+) => {
        $(
            /// 按切片最大值线性缩放.
            impl ImgWriteVis for $image {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    save_gray(max_scaled_u8(&self.view()).view(), path)
                }
            }
        )+
    };
}

impl_mask_vis!(Array2<bool>, ArrayView2<'_, bool>);
impl_image_vis!(Array2<i16>, ArrayView2<'_, i16>);
