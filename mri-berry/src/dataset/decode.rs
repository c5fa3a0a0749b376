//! 切片解码.
//!
//! 本 crate 不解析 DICOM 像素格式. 调用方提供实现了 [`ImageDecoder`] 的解码器,
//! 或者预先把切片转换为 `.npy` 并使用 [`NpyDecoder`].

use crate::error::DecodeError;
use crate::Image;
use std::path::Path;

/// 把一个切片文件解码为二维灰度图像.
pub trait ImageDecoder {
    /// 解码 `path` 处的切片.
    fn decode(&self, path: &Path) -> Result<Image, DecodeError>;
}

impl<F, E> ImageDecoder for F
where
    F: Fn(&Path) -> Result<Image, E>,
    E: Into<DecodeError>,
{
    #[inline]
    fn decode(&self, path: &Path) -> Result<Image, DecodeError> {
        self(path).map_err(Into::into)
    }
}

/// 读取二维 `i16` `.npy` 文件.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NpyDecoder;

impl ImageDecoder for NpyDecoder {
    fn decode(&self, path: &Path) -> Result<Image, DecodeError> {
        let image: Image = ndarray_npy::read_npy(path)?;
        Ok(image)
    }
}
