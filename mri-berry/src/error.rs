//! 运行时错误.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 形状前置条件不满足.
///
/// 图像与掩码、预测与真值等需要逐像素对应的数据, 形状必须完全相同.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("形状不匹配: 期望 {expected:?}, 实际 {found:?}")]
pub struct ShapeError {
    /// 期望的形状.
    pub expected: Vec<usize>,

    /// 实际的形状.
    pub found: Vec<usize>,
}

impl ShapeError {
    /// 比较两个形状. 相同时返回 `Ok(())`.
    pub fn check(expected: &[usize], found: &[usize]) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(Self {
                expected: expected.to_vec(),
                found: found.to_vec(),
            })
        }
    }
}

/// 图像解码器返回的底层错误.
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// 数据集构建或迭代时的错误.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// 清单文件不存在或无法读取.
    #[error("无法读取清单 `{path}`")]
    Manifest {
        /// 清单路径.
        path: PathBuf,
        /// 底层 I/O 错误.
        #[source]
        source: io::Error,
    },

    /// 清单缺少必要的列.
    #[error("清单 `{path}` 缺少列 `{column}`")]
    MissingColumn {
        /// 清单路径.
        path: PathBuf,
        /// 缺少的列名.
        column: &'static str,
    },

    /// 清单某一行字段数不足.
    #[error("清单 `{path}` 第 {line} 行格式错误")]
    MalformedRow {
        /// 清单路径.
        path: PathBuf,
        /// 行号 (从 1 开始, 包括表头).
        line: usize,
    },

    /// 病人图像目录无法列出.
    #[error("无法列出目录 `{path}`")]
    ListDir {
        /// 目录路径.
        path: PathBuf,
        /// 底层 I/O 错误.
        #[source]
        source: io::Error,
    },

    /// 图像解码失败.
    #[error("无法解码图像 `{path}`")]
    Decode {
        /// 图像路径.
        path: PathBuf,
        /// 解码器返回的错误.
        #[source]
        source: DecodeError,
    },

    /// 轮廓文件无法读取.
    #[error("无法读取轮廓文件 `{path}`")]
    ContourIo {
        /// 轮廓文件路径.
        path: PathBuf,
        /// 底层 I/O 错误.
        #[source]
        source: io::Error,
    },

    /// 轮廓文件某一行不是 `x y` 坐标对.
    #[error("轮廓文件 `{path}` 第 {line} 行不是合法坐标")]
    Contour {
        /// 轮廓文件路径 (从字符串解析时为空).
        path: PathBuf,
        /// 行号 (从 1 开始).
        line: usize,
    },

    /// 同一批次的图像形状不一致.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}
