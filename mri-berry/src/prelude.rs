//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Image, Mask};
pub use crate::{DatasetError, ShapeError};

pub use crate::data::{max_scaled_u8, ImgWriteVis, MaxScale, Polygon};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{self, Batch, ContourDataset, ImageDecoder, LoaderConfig, NpyDecoder};

pub use crate::metric::{iou, mean_sample_iou};
pub use crate::model::OtsuThresholding;
