//! 对 `mri-berry::dataset` 的更一层封装. 提供更直接的数据集加载器.

use mri_berry::dataset::{ContourDataset, LoaderConfig, NpyDecoder};
use mri_berry::DatasetError;
use std::env;
use std::path::{Path, PathBuf};

/// 获取数据集根目录.
///
/// 1. 若环境变量 `$MRI_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/final_data`.
pub fn data_dir_from_env_or_home() -> PathBuf {
    match env::var("MRI_DATA_DIR") {
        Ok(d) if !d.is_empty() => PathBuf::from(d),
        _ => mri_berry::dataset::home_dataset_dir_with(["final_data"])
            .unwrap_or_else(|| PathBuf::from("final_data")),
    }
}

/// 打开 `path` 处的数据集. 切片需预先转换为 `.npy`.
pub fn dataset<P: AsRef<Path>>(
    path: P,
    config: LoaderConfig,
) -> Result<ContourDataset<NpyDecoder>, DatasetError> {
    ContourDataset::open(path, config, NpyDecoder)
}

/// 从 `$MRI_DATA_DIR` 或者 `$HOME/dataset/final_data` 下打开数据集.
#[inline]
pub fn dataset_from_env_or_home(config: LoaderConfig) -> Result<ContourDataset<NpyDecoder>, DatasetError> {
    dataset(data_dir_from_env_or_home(), config)
}
