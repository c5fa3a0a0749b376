//! 闭运算结构元尺寸的消融实验.
//!
//! 从外轮廓出发, 以不同尺寸的椭圆结构元 (或不做闭运算) 运行 Otsu 阈值分割,
//! 比较内轮廓预测的 micro/macro IoU 与耗时.
//!
//! 数据集根目录取自 `$MRI_DATA_DIR`, 默认为 `$HOME/dataset/final_data`.
//! 切片需预先转换为 `.npy`.

mod profile;
mod result;
mod runner;

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    match runner::run() {
        Ok(result) => result.analyze(),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}
