//! 消融实验依赖的通用组件.

use mri_berry::dataset::LoaderConfig;
use std::num::NonZeroUsize;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 消融实验统一使用的加载配置: 同时加载内外轮廓, 固定种子, 按文件名排序.
///
/// 批大小为可用核心数.
pub fn ablation_config() -> LoaderConfig {
    LoaderConfig::default()
        .batch_size(NonZeroUsize::new(cpus()).unwrap_or(NonZeroUsize::MIN))
        .include_i_contours(true)
        .include_o_contours(true)
        .seed(0)
        .sorted(true)
}
