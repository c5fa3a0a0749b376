//! 算法运行统计.

use mri_berry::metric;
use ndarray::ArrayView2;
use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 一种设置下的 ablation 数据统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 外轮廓为空, 不参与评估的样本个数.
    trivial: u64,

    /// 参与评估的样本个数.
    target: u64,

    /// 加载失败或预测失败的批次数.
    failed: u64,

    /// 全部样本的交集像素数之和.
    intersection: u64,

    /// 全部样本的并集像素数之和.
    union: u64,

    /// 逐样本 IoU 之和.
    iou_sum: f64,

    /// 预测花费的总时间.
    predict_time: AccTimer,

    /// 整个任务花费的总时间 (包括数据加载).
    real_time: AccTimer,

    /// 最耗时的一次批预测.
    most: Option<Duration>,
}

impl Profile {
    /// 初始化. 同时开始总计时.
    #[inline]
    pub fn new() -> Self {
        Self {
            trivial: 0,
            target: 0,
            failed: 0,
            intersection: 0,
            union: 0,
            iou_sum: 0.0,
            predict_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
        }
    }

    /// 记录一个外轮廓为空的样本.
    #[inline]
    pub fn count_trivial(&mut self) {
        self.trivial += 1;
    }

    /// 记录一个失败的批次.
    #[inline]
    pub fn count_failed(&mut self) {
        self.failed += 1;
    }

    /// 记录一个样本的预测与真值.
    pub fn count_target(&mut self, predicted: &ArrayView2<'_, bool>, truth: &ArrayView2<'_, bool>) {
        self.target += 1;
        // 预测与真值来自同一批次, 形状一致.
        let (inter, union) = metric::overlap(predicted, truth).unwrap_or((0, 0));
        self.intersection += inter;
        self.union += union;
        self.iou_sum += metric::ratio(inter, union);
    }

    /// 开始一次批预测计时.
    #[inline]
    pub fn target_start(&mut self) {
        self.predict_time.start();
    }

    /// 结束一次批预测计时.
    #[inline]
    pub fn target_elapsed(&mut self) {
        let d = self.predict_time.elapsed();
        self.most = Some(self.most.map_or(d, |most| most.max(d)));
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    #[inline]
    pub fn get_trivial(&self) -> u64 {
        self.trivial
    }

    #[inline]
    pub fn get_target(&self) -> u64 {
        self.target
    }

    #[inline]
    pub fn get_failed(&self) -> u64 {
        self.failed
    }

    /// 全部样本的 micro IoU. 并集为空时为 `0.0`.
    pub fn get_micro_iou(&self) -> f64 {
        metric::ratio(self.intersection, self.union)
    }

    /// 逐样本 IoU 的平均值. 没有样本时返回 `None`.
    pub fn get_macro_iou(&self) -> Option<f64> {
        match self.target {
            0 => None,
            target => Some(self.iou_sum / target as f64),
        }
    }

    /// 以微秒为单位获得预测的总花费时间.
    #[inline]
    pub fn get_predict_time_us(&self) -> u64 {
        self.predict_time.total_us()
    }

    /// 以微秒为单位获得总运行时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.total_us()
    }

    /// 以微秒为单位获得平均每个样本的预测时间.
    pub fn get_avg_predict_time_us(&self) -> Option<f64> {
        match self.target + self.trivial {
            0 => None,
            n => Some(self.get_predict_time_us() as f64 / n as f64),
        }
    }

    /// 最耗时的一次批预测. 没有预测过时返回 `None`.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
