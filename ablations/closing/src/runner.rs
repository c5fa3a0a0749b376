//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use mri_berry::dataset::{ContourDataset, ImageDecoder};
use mri_berry::model::OtsuThresholding;
use mri_berry::DatasetError;
use std::num::NonZeroUsize;
use std::thread;
use utils::loader;

/// 参与比较的结构元边长. `None` 表示不做闭运算.
const KERNEL_SIZES: [Option<usize>; 5] = [None, Some(3), Some(5), Some(7), Some(9)];

fn setting_name(kernel_size: Option<usize>) -> String {
    match kernel_size {
        None => "plain".to_string(),
        Some(k) => format!("close-{k}x{k}"),
    }
}

/// 在整个数据集上运行一次 `model`.
fn evaluate<D: ImageDecoder>(name: &str, model: OtsuThresholding, dataset: &ContourDataset<D>) -> Profile {
    let mut profile = Profile::new();
    for (idx, batch) in dataset.iter().enumerate() {
        let batch = match batch {
            Ok(b) => b,
            Err(e) => {
                log::warn!("{name}: 跳过批次 {idx}: {e}");
                profile.count_failed();
                continue;
            }
        };
        let (Some(i_contours), Some(o_contours)) = (&batch.i_contours, &batch.o_contours) else {
            continue;
        };

        profile.target_start();
        let predicted = model.predict(&batch.images, o_contours);
        profile.target_elapsed();

        let Ok(predicted) = predicted else {
            profile.count_failed();
            continue;
        };
        for ((pred, truth), region) in predicted
            .outer_iter()
            .zip(i_contours.outer_iter())
            .zip(o_contours.outer_iter())
        {
            if region.iter().any(|p| *p) {
                profile.count_target(&pred, &truth);
            } else {
                profile.count_trivial();
            }
        }
    }
    log::info!("{name}: 完成");
    profile.finish()
}

/// 实际运行.
pub fn run() -> Result<AblationResult, DatasetError> {
    let dataset = loader::dataset_from_env_or_home(utils::ablation_config())?;
    // 短路判断
    if dataset.is_empty() {
        log::warn!("数据集中没有同时带内外轮廓的样本");
    }

    log::info!(
        "Running ablation studies on {} samples, {} batches...",
        dataset.len(),
        dataset.num_batches()
    );
    let dataset = &dataset;
    let result = thread::scope(|s| {
        let handles = KERNEL_SIZES.map(|k| {
            let model = OtsuThresholding::new(k.and_then(NonZeroUsize::new));
            s.spawn(move || evaluate(&setting_name(k), model, dataset))
        });

        AblationResult::from_iter(
            KERNEL_SIZES.into_iter().map(setting_name).zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            ),
        )
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_names() {
        let names: Vec<String> = KERNEL_SIZES.into_iter().map(setting_name).collect();
        assert_eq!(names[0], "plain");
        assert_eq!(names[1], "close-3x3");
        assert!(KERNEL_SIZES.iter().flatten().all(|&k| NonZeroUsize::new(k).is_some()));
    }
}
