#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供心脏 MRI 数据集 (DICOM 切片 + 手工轮廓) 的配对加载,
//! 多边形轮廓栅格化, 以及基于 Otsu 阈值的心内膜分割基线与 IoU 评估.
//!
//! 该 crate 只提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 不解析 DICOM 像素格式. 图像解码通过
//!   [`dataset::ImageDecoder`] 交给调用方 (或使用 `.npy` 格式的 [`dataset::NpyDecoder`]).
//! 2. 调用方违反形状前置条件时 (如图像与掩码大小不一致), 返回 [`ShapeError`],
//!   不会静默截断或填充.
//!
//! # 开发计划
//!
//! ### 数据集索引 ✅
//!
//! 读取 `link.csv`, 将 `dicoms/<patient_id>` 下的切片与
//! `contourfiles/<original_id>/{i,o}-contours` 下的轮廓文件配对.
//! 缺失必要轮廓文件的切片被静默过滤.
//!
//! 实现位于 `mri-berry/src/dataset/index.rs`.
//!
//! ### 批数据迭代 ✅
//!
//! 每一轮迭代重新生成 (可复现的) 随机排列, 按批解码/栅格化/堆叠.
//! 惰性求值, 每次 `next` 只处理一个批次.
//!
//! 实现位于 `mri-berry/src/dataset/loader.rs`.
//!
//! ### 多边形栅格化 ✅
//!
//! 奇偶规则扫描线填充, 边界上的像素不计入内部.
//!
//! 实现位于 `mri-berry/src/data/polygon.rs`.
//!
//! ### Otsu 阈值分割 + 形态学闭运算 ✅
//!
//! 在外轮廓区域内部求 Otsu 阈值, 预测内轮廓 (血池) 区域.
//! 可选椭圆结构元闭运算, 结果不会越出外轮廓.
//!
//! 实现位于 `mri-berry/src/model`.
//!
//! ### IoU 评估 ✅
//!
//! 批量 micro IoU (默认) 与逐样本平均 macro IoU.
//!
//! 实现位于 `mri-berry/src/metric.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 掩码/图像可视化保存. ✅
//! 2. 用户主目录下数据集路径辅助函数. ✅

/// 二维 MRI 切片. 像素值为带符号整数灰度.
pub type Image = ndarray::Array2<i16>;

/// 二维掩码. `true` 代表区域内部.
pub type Mask = ndarray::Array2<bool>;

pub mod consts;

mod error;

pub use error::{DatasetError, ShapeError};

pub mod data;

pub use data::{ImgWriteVis, Polygon};

pub mod dataset;

pub mod metric;

pub mod model;

pub mod prelude;
