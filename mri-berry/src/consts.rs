//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色. 掩码背景.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色. 掩码前景.
    pub const WHITE: u8 = 0b_1111_1111;
}

/// 数据集目录布局.
pub mod layout {
    /// 数据集根目录下的清单文件名.
    pub const MANIFEST: &str = "link.csv";

    /// 清单中病人 (DICOM 目录) 标识所在列.
    pub const PATIENT_ID_COLUMN: &str = "patient_id";

    /// 清单中原始研究 (轮廓目录) 标识所在列.
    pub const ORIGINAL_ID_COLUMN: &str = "original_id";

    /// 存放 `<patient_id>/<frame>.dcm` 的目录.
    pub const IMAGE_DIR: &str = "dicoms";

    /// 存放 `<original_id>/{i,o}-contours` 的目录.
    pub const CONTOUR_DIR: &str = "contourfiles";

    /// 内轮廓 (心内膜) 子目录.
    pub const I_CONTOUR_DIR: &str = "i-contours";

    /// 外轮廓 (心外膜) 子目录.
    pub const O_CONTOUR_DIR: &str = "o-contours";

    /// 帧序号补零后的宽度.
    pub const FRAME_WIDTH: usize = 4;
}

/// 默认批大小.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// 归一化后灰度上限.
pub const GRAY_MAX: f64 = 255.0;
