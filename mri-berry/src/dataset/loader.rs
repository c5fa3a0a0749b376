//! 批数据迭代.
//!
//! [`ContourDataset`] 在构建时一次性完成索引, 之后不可变.
//! 每次调用 [`ContourDataset::iter`] 开始新一轮迭代: 重新生成随机排列, 按批惰性加载.

use super::decode::ImageDecoder;
use super::index::{index_dataset, IndexOptions, SampleRecord};
use super::manifest::read_manifest;
use crate::consts::{layout::MANIFEST, DEFAULT_BATCH_SIZE};
use crate::{DatasetError, Image, Mask, Polygon, ShapeError};
use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::num::NonZeroUsize;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 数据集加载配置.
///
/// ```
/// use mri_berry::dataset::LoaderConfig;
/// use std::num::NonZeroUsize;
///
/// let config = LoaderConfig::default()
///     .batch_size(NonZeroUsize::new(4).unwrap())
///     .include_o_contours(false)
///     .seed(42);
/// assert_eq!(config.get_batch_size().get(), 4);
/// assert_eq!(config.get_seed(), Some(42));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoaderConfig {
    batch_size: NonZeroUsize,
    include_i_contours: bool,
    include_o_contours: bool,
    seed: Option<u64>,
    sorted: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            include_i_contours: true,
            include_o_contours: true,
            seed: None,
            sorted: false,
        }
    }
}

impl LoaderConfig {
    /// 每批的样本数. 最后一批可能更少.
    pub fn batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// 是否加载内轮廓. 启用时, 缺少内轮廓的切片被过滤.
    pub fn include_i_contours(mut self, include: bool) -> Self {
        self.include_i_contours = include;
        self
    }

    /// 是否加载外轮廓. 启用时, 缺少外轮廓的切片被过滤.
    pub fn include_o_contours(mut self, include: bool) -> Self {
        self.include_o_contours = include;
        self
    }

    /// 固定随机种子. 每一轮迭代都得到相同的排列.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 病人目录内按文件名排序, 而非使用目录列出顺序.
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// 批大小.
    #[inline]
    pub fn get_batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// 是否加载内轮廓.
    #[inline]
    pub fn get_include_i_contours(&self) -> bool {
        self.include_i_contours
    }

    /// 是否加载外轮廓.
    #[inline]
    pub fn get_include_o_contours(&self) -> bool {
        self.include_o_contours
    }

    /// 随机种子.
    #[inline]
    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    /// 是否按文件名排序.
    #[inline]
    pub fn get_sorted(&self) -> bool {
        self.sorted
    }

    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            include_i_contours: self.include_i_contours,
            include_o_contours: self.include_o_contours,
            sorted: self.sorted,
        }
    }
}

/// 一批样本. 第 0 轴为样本.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// `(N, H, W)` 切片.
    pub images: Array3<i16>,

    /// `(N, H, W)` 内轮廓掩码. 未启用时为 `None`.
    pub i_contours: Option<Array3<bool>>,

    /// `(N, H, W)` 外轮廓掩码. 未启用时为 `None`.
    pub o_contours: Option<Array3<bool>>,
}

impl Batch {
    /// 批内样本数.
    #[inline]
    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    /// 批是否为空. 迭代器不会产生空批.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 切片与轮廓配对的数据集.
///
/// # 注意
///
/// 1. 轮廓文件的存在性只在构建时检查一次.
/// 2. 切片解码和轮廓解析发生在迭代时, 失败以 `Err` 形式产出, 不会中止后续批次.
#[derive(Debug)]
pub struct ContourDataset<D> {
    records: Vec<SampleRecord>,
    config: LoaderConfig,
    decoder: D,
}

impl<D: ImageDecoder> ContourDataset<D> {
    /// 读取 `root/link.csv` 并建立索引.
    ///
    /// 清单不可读、缺列, 或某个病人的切片目录无法列出时返回 `Err`.
    pub fn open<P: AsRef<Path>>(root: P, config: LoaderConfig, decoder: D) -> Result<Self, DatasetError> {
        let root = root.as_ref();
        let rows = read_manifest(root.join(MANIFEST))?;
        let records = index_dataset(root, &rows, config.index_options())?;
        log::info!(
            "数据集 {}: {} 个病人, {} 个样本",
            root.display(),
            rows.len(),
            records.len()
        );
        Ok(Self::from_records(records, config, decoder))
    }

    /// 直接使用已有的样本列表.
    ///
    /// 已启用的轮廓种类在 `records` 中对应字段必须为 `Some`, 否则迭代时该样本产生
    /// [`DatasetError::ContourIo`].
    pub fn from_records(records: Vec<SampleRecord>, config: LoaderConfig, decoder: D) -> Self {
        Self {
            records,
            config,
            decoder,
        }
    }

    /// 样本总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否没有任何样本.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 全部样本, 按索引顺序.
    #[inline]
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// 加载配置.
    #[inline]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// 每轮的批次数.
    #[inline]
    pub fn num_batches(&self) -> usize {
        self.len().div_ceil(self.config.batch_size.get())
    }

    /// 开始新一轮迭代.
    ///
    /// 配置了种子时每轮排列相同, 否则每轮从系统熵源重新播种.
    pub fn iter(&self) -> Batches<'_, D> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(&mut rng);
        Batches {
            dataset: self,
            order,
            cursor: 0,
        }
    }

    /// 加载一个样本: 解码切片, 并按切片尺寸栅格化已启用的轮廓.
    fn load(&self, record: &SampleRecord) -> Result<(Image, Option<Mask>, Option<Mask>), DatasetError> {
        let image = self
            .decoder
            .decode(&record.image_path)
            .map_err(|source| DatasetError::Decode {
                path: record.image_path.clone(),
                source,
            })?;
        let (height, width) = image.dim();
        let rasterize = |enabled: bool, path: Option<&Path>| -> Result<Option<Mask>, DatasetError> {
            if !enabled {
                return Ok(None);
            }
            let path = path.ok_or_else(|| DatasetError::ContourIo {
                path: record.image_path.clone(),
                source: std::io::ErrorKind::NotFound.into(),
            })?;
            Ok(Some(Polygon::open(path)?.rasterize(width, height)))
        };
        let i_contour = rasterize(self.config.include_i_contours, record.i_contour_path.as_deref())?;
        let o_contour = rasterize(self.config.include_o_contours, record.o_contour_path.as_deref())?;
        Ok((image, i_contour, o_contour))
    }
}

impl<'a, D: ImageDecoder> IntoIterator for &'a ContourDataset<D> {
    type Item = Result<Batch, DatasetError>;
    type IntoIter = Batches<'a, D>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 将形状相同的二维数组沿新的第 0 轴堆叠.
fn stack_slices<T: Clone + Default>(slices: &[Array2<T>], dim: (usize, usize)) -> Array3<T> {
    let mut out = Array3::from_elem((slices.len(), dim.0, dim.1), T::default());
    for (mut slot, slice) in out.outer_iter_mut().zip(slices) {
        slot.assign(slice);
    }
    out
}

/// 一轮迭代. 由 [`ContourDataset::iter`] 创建.
///
/// 每次 `next` 加载并堆叠一个批次, 不做预取.
#[derive(Debug)]
pub struct Batches<'a, D> {
    dataset: &'a ContourDataset<D>,
    order: Vec<usize>,
    cursor: usize,
}

impl<'a, D: ImageDecoder> Batches<'a, D> {
    /// 本轮的样本排列 (数据集索引).
    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn assemble(&self, indices: &[usize]) -> Result<Batch, DatasetError> {
        let config = &self.dataset.config;
        let mut images = Vec::with_capacity(indices.len());
        let mut i_contours = config.include_i_contours.then(|| Vec::with_capacity(indices.len()));
        let mut o_contours = config.include_o_contours.then(|| Vec::with_capacity(indices.len()));

        let mut dim = None;
        for &idx in indices {
            let (image, i_contour, o_contour) = self.dataset.load(&self.dataset.records[idx])?;
            let expected = *dim.get_or_insert(image.dim());
            ShapeError::check(&[expected.0, expected.1], image.shape())?;

            images.push(image);
            if let (Some(stack), Some(mask)) = (i_contours.as_mut(), i_contour) {
                stack.push(mask);
            }
            if let (Some(stack), Some(mask)) = (o_contours.as_mut(), o_contour) {
                stack.push(mask);
            }
        }

        let dim = dim.unwrap_or((0, 0));
        Ok(Batch {
            images: stack_slices(&images, dim),
            i_contours: i_contours.map(|masks| stack_slices(&masks, dim)),
            o_contours: o_contours.map(|masks| stack_slices(&masks, dim)),
        })
    }
}

impl<'a, D: ImageDecoder> Iterator for Batches<'a, D> {
    type Item = Result<Batch, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.dataset.config.batch_size.get()).min(self.order.len());
        let (start, indices) = (self.cursor, &self.order[self.cursor..end]);
        let batch = self.assemble(indices);
        self.cursor = end;

        match &batch {
            Ok(b) => log::debug!("批次 [{start}, {end}): {} 个样本", b.len()),
            Err(e) => log::warn!("批次 [{start}, {end}) 加载失败: {e}"),
        }
        Some(batch)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}

impl<'a, D: ImageDecoder> ExactSizeIterator for Batches<'a, D> {
    #[inline]
    fn len(&self) -> usize {
        (self.order.len() - self.cursor).div_ceil(self.dataset.config.batch_size.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::index::fixture::{row, write_patient};
    use crate::dataset::index::ContourKind;
    use std::path::PathBuf;

    /// 以帧号填充 6x5 切片, 便于从批数据中识别样本.
    fn stem_decoder(path: &Path) -> Result<Image, std::num::ParseIntError> {
        let frame: i16 = path.file_stem().unwrap().to_str().unwrap().parse()?;
        Ok(Image::from_elem((6, 5), frame))
    }

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    /// 一个病人, 帧号 1..=10 全部带内轮廓, 1..=7 带外轮廓.
    fn fixture() -> tempfile::TempDir {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Trace)
            .init();
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<u32> = (1..=10).collect();
        write_patient(dir.path(), "P1", "O1", &frames, &frames, &frames[..7]);
        std::fs::write(
            dir.path().join(MANIFEST),
            "patient_id,original_id\nP1,O1\n",
        )
        .unwrap();
        dir
    }

    /// 按迭代顺序收集每个样本的帧号.
    fn frames_of(batches: Batches<'_, StemDecoder>) -> Vec<Vec<i16>> {
        batches
            .map(|b| {
                b.unwrap()
                    .images
                    .outer_iter()
                    .map(|image| image[(0, 0)])
                    .collect()
            })
            .collect()
    }

    type StemDecoder = fn(&Path) -> Result<Image, std::num::ParseIntError>;

    fn open(dir: &Path, config: LoaderConfig) -> ContourDataset<StemDecoder> {
        ContourDataset::open(dir, config, stem_decoder as StemDecoder).unwrap()
    }

    #[test]
    fn test_open_filters_by_required_contours() {
        let dir = fixture();
        let both = open(dir.path(), LoaderConfig::default());
        assert_eq!(both.len(), 7);

        let inner = open(dir.path(), LoaderConfig::default().include_o_contours(false));
        assert_eq!(inner.len(), 10);
        assert!(inner.records().iter().all(|r| r.o_contour_path.is_none()));
    }

    #[test]
    fn test_each_pass_covers_every_sample() {
        let dir = fixture();
        let config = LoaderConfig::default()
            .include_o_contours(false)
            .batch_size(nz(3));
        let dataset = open(dir.path(), config);
        assert_eq!(dataset.num_batches(), 4);

        let batches = dataset.iter();
        assert_eq!(batches.len(), 4);
        let frames = frames_of(batches);
        let sizes: Vec<usize> = frames.iter().map(Vec::len).collect();
        assert_eq!(sizes, [3, 3, 3, 1]);

        let mut all: Vec<i16> = frames.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (1..=10).collect::<Vec<i16>>());
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let dir = fixture();
        let config = LoaderConfig::default()
            .include_o_contours(false)
            .batch_size(nz(4))
            .seed(7);
        let dataset = open(dir.path(), config);
        let first = frames_of(dataset.iter());
        let second = frames_of(dataset.iter());
        assert_eq!(first, second);

        let again = open(dir.path(), config);
        assert_eq!(frames_of(again.iter()), first);

        let other = open(dir.path(), config.seed(8));
        assert_ne!(frames_of(other.iter()), first);
    }

    #[test]
    fn test_unseeded_passes_differ() {
        let records: Vec<SampleRecord> = (0..20)
            .map(|i| SampleRecord {
                image_path: PathBuf::from(format!("{i}.dcm")),
                i_contour_path: None,
                o_contour_path: None,
            })
            .collect();
        let config = LoaderConfig::default()
            .include_i_contours(false)
            .include_o_contours(false);
        let dataset = ContourDataset::from_records(records, config, stem_decoder as StemDecoder);

        let first = dataset.iter().order().to_vec();
        let second = dataset.iter().order().to_vec();
        assert_ne!(first, second);

        // 每一轮仍然是完整排列.
        for mut order in [first, second] {
            order.sort_unstable();
            assert_eq!(order, (0..20).collect::<Vec<usize>>());
        }
    }

    #[test]
    fn test_disabled_kinds_are_none() {
        let dir = fixture();
        let config = LoaderConfig::default()
            .include_i_contours(false)
            .batch_size(nz(4))
            .seed(1);
        let dataset = open(dir.path(), config);
        for batch in &dataset {
            let batch = batch.unwrap();
            assert!(batch.i_contours.is_none());
            let o_contours = batch.o_contours.unwrap();
            assert_eq!(o_contours.dim(), batch.images.dim());
            // 轮廓是 (1,1)-(3,3) 的正方形, 栅格化为 (2, 2) 一个像素.
            for mask in o_contours.outer_iter() {
                assert_eq!(mask.iter().filter(|p| **p).count(), 1);
                assert!(mask[(2, 2)]);
            }
        }
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = ContourDataset::from_records(Vec::new(), LoaderConfig::default(), stem_decoder as StemDecoder);
        assert!(dataset.is_empty());
        assert_eq!(dataset.num_batches(), 0);
        assert_eq!(dataset.iter().count(), 0);
    }

    #[test]
    fn test_mixed_shapes_fail_the_batch() {
        let decoder = |path: &Path| -> Result<Image, std::io::Error> {
            let width = if path.ends_with("wide.dcm") { 8 } else { 4 };
            Ok(Image::zeros((4, width)))
        };
        let record = |name: &str| SampleRecord {
            image_path: PathBuf::from(name),
            i_contour_path: None,
            o_contour_path: None,
        };
        let config = LoaderConfig::default()
            .include_i_contours(false)
            .include_o_contours(false)
            .batch_size(nz(2));
        let dataset = ContourDataset::from_records(vec![record("a.dcm"), record("wide.dcm")], config, decoder);
        let results: Vec<_> = dataset.iter().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(DatasetError::Shape(_))));

        let config = config.batch_size(nz(1));
        let dataset = ContourDataset::from_records(vec![record("a.dcm"), record("wide.dcm")], config, decoder);
        assert!(dataset.iter().all(|b| b.is_ok()));
    }

    #[test]
    fn test_decode_and_contour_errors() {
        let dir = fixture();
        let bad_contour = dir
            .path()
            .join("contourfiles/O1")
            .join(ContourKind::Inner.dir_name())
            .join(ContourKind::Inner.filename("0003"));
        std::fs::write(&bad_contour, "1.0 1.0\nnot a point\n").unwrap();

        let config = LoaderConfig::default()
            .include_o_contours(false)
            .batch_size(nz(1))
            .sorted(true);
        let dataset = open(dir.path(), config);
        let errors: Vec<DatasetError> = dataset.iter().filter_map(Result::err).collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], DatasetError::Contour { line: 2, .. }));

        let failing = |_: &Path| -> Result<Image, std::io::Error> { Err(std::io::Error::other("corrupt")) };
        let dataset = ContourDataset::open(dir.path(), config, failing).unwrap();
        assert!(dataset
            .iter()
            .all(|b| matches!(b, Err(DatasetError::Decode { .. }))));
    }
}
