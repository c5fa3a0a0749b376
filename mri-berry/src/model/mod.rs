//! 分割模型.

pub mod morphology;
mod otsu;

pub use morphology::StructElement;
pub use otsu::{otsu_level_within, OtsuThresholding};
