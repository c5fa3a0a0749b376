//! 分割评估指标.
//!
//! 批量输入时, [`iou`] 采用 micro 聚合 (全批交集之和 / 全批并集之和),
//! [`mean_sample_iou`] 采用 macro 聚合 (逐样本 IoU 的算术平均).

use crate::ShapeError;
use ndarray::{ArrayBase, Axis, Data, Dimension, RemoveAxis};

/// 统计 (交集, 并集) 像素个数.
///
/// 形状不同则返回 `Err(ShapeError)`.
pub fn overlap<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> Result<(u64, u64), ShapeError>
where
    S1: Data<Elem = bool>,
    S2: Data<Elem = bool>,
    D: Dimension,
{
    ShapeError::check(a.shape(), b.shape())?;
    let (mut inter, mut union) = (0u64, 0u64);
    ndarray::Zip::from(a).and(b).for_each(|&p, &q| {
        inter += (p && q) as u64;
        union += (p || q) as u64;
    });
    Ok((inter, union))
}

/// 由交集、并集像素个数求 IoU. 并集为空时返回 `0.0`.
///
/// 用于跨多次 [`overlap`] 累加后的 micro IoU.
#[inline]
pub fn ratio(inter: u64, union: u64) -> f64 {
    match union {
        0 => 0.0,
        union => inter as f64 / union as f64,
    }
}

/// 计算两个布尔数组的 IoU (交并比).
///
/// 两者均为全 `false` (并集为空) 时返回 `0.0`, 而非 NaN. 数组可以是任意维度;
/// 对 `(N, H, W)` 批数据, 返回全批的 micro IoU.
///
/// 形状不同则返回 `Err(ShapeError)`.
pub fn iou<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> Result<f64, ShapeError>
where
    S1: Data<Elem = bool>,
    S2: Data<Elem = bool>,
    D: Dimension,
{
    let (inter, union) = overlap(a, b)?;
    Ok(ratio(inter, union))
}

/// 沿第 0 轴逐样本计算 IoU, 返回其算术平均 (macro IoU).
///
/// 单个样本的并集为空时, 该样本的 IoU 记为 `0.0`. 批为空时返回 `0.0`.
pub fn mean_sample_iou<S1, S2, D>(
    a: &ArrayBase<S1, D>,
    b: &ArrayBase<S2, D>,
) -> Result<f64, ShapeError>
where
    S1: Data<Elem = bool>,
    S2: Data<Elem = bool>,
    D: Dimension + RemoveAxis,
{
    ShapeError::check(a.shape(), b.shape())?;
    let n = a.len_of(Axis(0));
    if n == 0 {
        return Ok(0.0);
    }
    let mut sum = 0.0;
    for (p, q) in a.outer_iter().zip(b.outer_iter()) {
        let (inter, union) = overlap(&p, &q)?;
        sum += ratio(inter, union);
    }
    Ok(sum / n as f64)
}
