//! 切片与轮廓文件的配对索引.

use super::manifest::ManifestRow;
use crate::consts::layout::{CONTOUR_DIR, FRAME_WIDTH, IMAGE_DIR, I_CONTOUR_DIR, O_CONTOUR_DIR};
use crate::DatasetError;
use itertools::Itertools;
use std::path::{Path, PathBuf};

/// 一个切片及其对应的轮廓文件路径.
///
/// 未启用的轮廓种类对应字段为 `None`. 已启用的种类, 文件在建索引时一定存在.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SampleRecord {
    /// 切片文件.
    pub image_path: PathBuf,

    /// 内轮廓 (心内膜) 文件.
    pub i_contour_path: Option<PathBuf>,

    /// 外轮廓 (心外膜) 文件.
    pub o_contour_path: Option<PathBuf>,
}

/// 轮廓种类.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContourKind {
    /// 内轮廓.
    Inner,

    /// 外轮廓.
    Outer,
}

impl ContourKind {
    /// `contourfiles/<original_id>/` 下的子目录名.
    #[inline]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Inner => I_CONTOUR_DIR,
            Self::Outer => O_CONTOUR_DIR,
        }
    }

    /// 给定 (已补零的) 帧序号, 生成轮廓文件名.
    pub fn filename(self, frame: &str) -> String {
        let tag = match self {
            Self::Inner => "icontour",
            Self::Outer => "ocontour",
        };
        format!("IM-0001-{frame}-{tag}-manual.txt")
    }
}

/// 把文件名主干左侧补零到 4 位. 超过 4 位的保持原样.
///
/// ```
/// use mri_berry::dataset::frame_index;
///
/// assert_eq!(frame_index("48"), "0048");
/// assert_eq!(frame_index("12345"), "12345");
/// ```
#[inline]
pub fn frame_index(stem: &str) -> String {
    format!("{stem:0>width$}", width = FRAME_WIDTH)
}

/// 建立索引时需要检查的轮廓种类.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct IndexOptions {
    pub include_i_contours: bool,
    pub include_o_contours: bool,
    pub sorted: bool,
}

/// 若文件存在则返回路径, 否则 `None`.
fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// 枚举 `root/dicoms/<patient_id>` 下的全部切片, 保留所有必需轮廓文件都存在的样本.
///
/// 清单行顺序优先, 同一病人内按目录列出顺序 (`sorted` 时按文件名排序).
pub(crate) fn index_dataset(
    root: &Path,
    rows: &[ManifestRow],
    options: IndexOptions,
) -> Result<Vec<SampleRecord>, DatasetError> {
    let mut records = Vec::new();
    for row in rows {
        let image_dir = root.join(IMAGE_DIR).join(&row.patient_id);
        let contour_dir = root.join(CONTOUR_DIR).join(&row.original_id);
        let before = records.len();

        let list_err = |source| DatasetError::ListDir {
            path: image_dir.clone(),
            source,
        };
        let mut images: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(&image_dir).map_err(list_err)? {
            // 跟随符号链接. 子目录与失效链接被跳过.
            let path = entry.map_err(list_err)?.path();
            if path.is_file() {
                images.push(path);
            } else {
                log::trace!("跳过非文件项 {}", path.display());
            }
        }
        if options.sorted {
            images = images.into_iter().sorted().collect();
        }

        for image_path in images {
            let Some(stem) = image_path.file_stem().and_then(|s| s.to_str()) else {
                log::trace!("跳过无法识别帧序号的文件 {}", image_path.display());
                continue;
            };
            let frame = frame_index(stem);
            let lookup = |kind: ContourKind| {
                let path = contour_dir.join(kind.dir_name()).join(kind.filename(&frame));
                let found = existing(path);
                if found.is_none() {
                    log::trace!("{} 缺少 {kind:?} 轮廓, 已过滤", image_path.display());
                }
                found
            };

            let i_contour_path = match options.include_i_contours {
                true => match lookup(ContourKind::Inner) {
                    Some(p) => Some(p),
                    None => continue,
                },
                false => None,
            };
            let o_contour_path = match options.include_o_contours {
                true => match lookup(ContourKind::Outer) {
                    Some(p) => Some(p),
                    None => continue,
                },
                false => None,
            };
            records.push(SampleRecord {
                image_path,
                i_contour_path,
                o_contour_path,
            });
        }
        log::debug!(
            "病人 {} ({}): 保留 {} 个样本",
            row.patient_id,
            row.original_id,
            records.len() - before
        );
    }
    Ok(records)
}
