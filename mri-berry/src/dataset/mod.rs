//! 数据集操作.
//!
//! 数据集根目录布局:
//!
//! ```text
//! <root>/link.csv
//! <root>/dicoms/<patient_id>/<frame>.dcm
//! <root>/contourfiles/<original_id>/i-contours/IM-0001-<frame:4>-icontour-manual.txt
//! <root>/contourfiles/<original_id>/o-contours/IM-0001-<frame:4>-ocontour-manual.txt
//! ```

use std::path::{Path, PathBuf};

mod decode;
mod index;
pub mod manifest;
mod loader;

pub use crate::error::DecodeError;
pub use decode::{ImageDecoder, NpyDecoder};
pub use index::{frame_index, ContourKind, SampleRecord};
pub use loader::{Batch, Batches, ContourDataset, LoaderConfig};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    home_dataset_dir_with::<&Path, _>([])
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}
