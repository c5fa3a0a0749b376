//! 二维 MRI 切片与掩码的基础数据结构和操作.

pub mod normalize;
pub mod polygon;
mod save;

pub use normalize::{max_scaled_u8, MaxScale};
pub use polygon::{Polygon, Vertex};
pub use save::ImgWriteVis;
