//! 多边形轮廓及其栅格化.

use crate::{DatasetError, Mask};
use ndarray::Array2;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 判定 "在边上" / "是整数" 时使用的容差.
const EPS: f64 = 1e-9;

/// 顶点坐标 `(x, y)`. `x` 沿宽度方向增长, `y` 沿高度方向增长.
pub type Vertex = (f64, f64);

/// 由有序顶点描述的闭合多边形.
///
/// 首尾顶点之间总是隐含一条边, 无论二者是否相同. 栅格化时, 像素 `(h, w)`
/// 以整数点 `(x, y) = (w, h)` 为采样点.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
}

impl From<Vec<Vertex>> for Polygon {
    #[inline]
    fn from(vertices: Vec<Vertex>) -> Self {
        Self::new(vertices)
    }
}

impl FromStr for Polygon {
    type Err = DatasetError;

    /// 每行一个 `x y` 坐标对, 以空白分隔. 空行被忽略.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_vertices(s).map(Self::new).map_err(|line| DatasetError::Contour {
            path: PathBuf::new(),
            line,
        })
    }
}

impl Polygon {
    /// 直接初始化.
    #[inline]
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// 从轮廓文本文件读取多边形. 文件格式同 [`Polygon::from_str`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DatasetError::ContourIo {
            path: path.to_owned(),
            source,
        })?;
        parse_vertices(&text)
            .map(Self::new)
            .map_err(|line| DatasetError::Contour {
                path: path.to_owned(),
                line,
            })
    }

    /// 所有顶点.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// 顶点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// 是否没有顶点?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// 按顺序迭代所有边, 最后一条边连接末顶点与首顶点.
    fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        let next = self.vertices.iter().copied().cycle().skip(1);
        self.vertices.iter().copied().zip(next)
    }

    /// 点 `(x, y)` 是否落在某条边上?
    pub fn on_boundary(&self, x: f64, y: f64) -> bool {
        self.edges().any(|(a, b)| on_segment(a, b, (x, y)))
    }

    /// 点 `(x, y)` 是否严格位于多边形内部?
    ///
    /// 使用奇偶规则: 从该点沿 +x 方向发出射线, 与边的交点个数为奇数时位于内部.
    /// 边 `(y1, y2)` 仅当 `min(y1, y2) <= y < max(y1, y2)` 时计为一次相交,
    /// 因此水平边不计入, 共享顶点也只计一次. 落在边上的点视为外部.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if self.on_boundary(x, y) {
            return false;
        }
        let hits = self
            .edges()
            .filter_map(|(a, b)| crossing_x(a, b, y))
            .filter(|cx| *cx > x)
            .count();
        hits % 2 == 1
    }

    /// 将多边形栅格化为 `(height, width)` 的掩码.
    ///
    /// 逐行计算扫描线与各边的交点, 在成对交点之间填充, 最后擦除恰好落在边上的像素.
    /// 判定规则与 [`Polygon::contains`] 逐像素一致. 超出 `[0, width) × [0, height)`
    /// 的部分被直接裁剪. 自相交多边形按奇偶规则处理, 不做修复.
    pub fn rasterize(&self, width: usize, height: usize) -> Mask {
        let mut mask = Array2::from_elem((height, width), false);
        let mut crossings = Vec::with_capacity(self.len());

        for (h, mut row) in mask.outer_iter_mut().enumerate() {
            let y = h as f64;
            crossings.clear();
            crossings.extend(self.edges().filter_map(|(a, b)| crossing_x(a, b, y)));
            if crossings.is_empty() {
                continue;
            }
            crossings.sort_by(f64::total_cmp);

            // 交点个数必为偶数. 对 `[c0, c1)` 内的整数 x, 其右侧交点个数为奇数.
            for pair in crossings.chunks_exact(2) {
                let (lo, hi) = (pair[0], pair[1]);
                let start = lo.ceil().max(0.0);
                let end = hi.ceil().min(width as f64);
                if end > start {
                    row.slice_mut(ndarray::s![start as usize..end as usize])
                        .fill(true);
                }
            }
        }
        self.clear_boundary(&mut mask);
        mask
    }

    /// 将所有恰好落在边上的格点像素置为 `false`.
    fn clear_boundary(&self, mask: &mut Mask) {
        let (height, width) = mask.dim();
        for ((x1, y1), (x2, y2)) in self.edges() {
            if (y1 - y2).abs() < EPS {
                // 水平边
                if !is_integral(y1) || y1.round() < 0.0 || y1.round() >= height as f64 {
                    continue;
                }
                let h = y1.round() as usize;
                for w in lattice_range(x1.min(x2), x1.max(x2), width) {
                    mask[(h, w)] = false;
                }
            } else {
                for h in lattice_range(y1.min(y2), y1.max(y2), height) {
                    let x = x1 + (h as f64 - y1) * (x2 - x1) / (y2 - y1);
                    let xr = x.round();
                    if is_integral(x) && xr >= 0.0 && xr < width as f64 {
                        mask[(h, xr as usize)] = false;
                    }
                }
            }
        }
    }
}

/// 扫描线 `y` 与边 `a-b` 的交点横坐标. 采用半开区间规则.
#[inline]
fn crossing_x((x1, y1): Vertex, (x2, y2): Vertex, y: f64) -> Option<f64> {
    let spans = (y1 <= y && y < y2) || (y2 <= y && y < y1);
    spans.then(|| x1 + (y - y1) * (x2 - x1) / (y2 - y1))
}

/// 点 `p` 是否在线段 `a-b` 上 (含端点).
fn on_segment((x1, y1): Vertex, (x2, y2): Vertex, (x, y): Vertex) -> bool {
    let cross = (x2 - x1) * (y - y1) - (y2 - y1) * (x - x1);
    let scale = (x2 - x1).abs().max((y2 - y1).abs()).max(1.0);
    if cross.abs() > EPS * scale {
        return false;
    }
    let within = |v: f64, a: f64, b: f64| v >= a.min(b) - EPS && v <= a.max(b) + EPS;
    within(x, x1, x2) && within(y, y1, y2)
}

#[inline]
fn is_integral(v: f64) -> bool {
    (v - v.round()).abs() < EPS
}

/// `[lo, hi]` 闭区间内的整数, 裁剪到 `[0, len)`.
fn lattice_range(lo: f64, hi: f64, len: usize) -> Range<usize> {
    let start = (lo - EPS).ceil().max(0.0);
    let end = ((hi + EPS).floor() + 1.0).min(len as f64);
    if end > start {
        start as usize..end as usize
    } else {
        0..0
    }
}

/// 解析 `x y` 行. 出错时返回从 1 开始的行号.
fn parse_vertices(text: &str) -> Result<Vec<Vertex>, usize> {
    let mut vertices = Vec::with_capacity(128);
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace().map(str::parse::<f64>);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(Ok(x)), Some(Ok(y)), None) => vertices.push((x, y)),
            _ => return Err(idx + 1),
        }
    }
    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;

    fn l_shape() -> Polygon {
        Polygon::new(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (3.0, 1.0),
            (3.0, 2.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (1.0, 3.0),
            (0.0, 3.0),
            (0.0, 2.0),
            (0.0, 1.0),
        ])
    }

    #[test]
    fn test_rasterize_l_shape() {
        let expected = array![
            [false, false, false, false],
            [false, true, false, false],
            [false, true, true, false],
            [false, false, false, false],
        ];
        assert_eq!(l_shape().rasterize(4, 4), expected);
    }

    #[test]
    fn test_rasterize_fractional_rectangle() {
        let p = Polygon::new(vec![(0.5, 0.5), (3.5, 0.5), (3.5, 2.5), (0.5, 2.5)]);
        let expected = array![
            [false, false, false, false, false],
            [false, true, true, true, false],
            [false, true, true, true, false],
            [false, false, false, false, false],
        ];
        assert_eq!(p.rasterize(5, 4), expected);
    }

    #[test]
    fn test_rasterize_shape_is_exact() {
        let m = l_shape().rasterize(7, 2);
        assert_eq!(m.dim(), (2, 7));

        let m = Polygon::default().rasterize(3, 5);
        assert_eq!(m.dim(), (5, 3));
        assert!(m.iter().all(|p| !p));
    }

    #[test]
    fn test_rasterize_clips_outside_grid() {
        let p = Polygon::new(vec![(-2.0, -2.0), (2.0, -2.0), (2.0, 2.0), (-2.0, 2.0)]);
        let expected = array![
            [true, true, false, false],
            [true, true, false, false],
            [false, false, false, false],
            [false, false, false, false],
        ];
        assert_eq!(p.rasterize(4, 4), expected);

        let far = Polygon::new(vec![(10.0, 10.0), (20.0, 10.0), (20.0, 20.0)]);
        assert!(far.rasterize(4, 4).iter().all(|p| !p));
    }

    #[test]
    fn test_explicitly_closed_polygon_is_equivalent() {
        let mut closed = l_shape().vertices().to_vec();
        closed.push(closed[0]);
        assert_eq!(Polygon::new(closed).rasterize(4, 4), l_shape().rasterize(4, 4));
    }

    #[test]
    fn test_self_overlap_follows_even_odd() {
        // 同一个正方形绕两圈, 每条扫描线的交点成对抵消.
        let square = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        let twice: Vec<_> = square.iter().chain(square.iter()).copied().collect();
        assert!(Polygon::new(twice).rasterize(6, 6).iter().all(|p| !p));

        let once = Polygon::new(square.to_vec()).rasterize(6, 6);
        assert_eq!(once.iter().filter(|p| **p).count(), 9);
    }

    #[test]
    fn test_rasterize_agrees_with_contains() {
        let p = Polygon::new(vec![(0.3, 0.2), (7.7, 1.1), (5.0, 4.0), (2.2, 6.9)]);
        let mask = p.rasterize(8, 8);
        for ((h, w), &inside) in mask.indexed_iter() {
            assert_eq!(inside, p.contains(w as f64, h as f64), "pixel ({h}, {w})");
        }
        assert!(mask.iter().any(|p| *p));
    }

    #[test]
    fn test_contains_boundary_is_outside() {
        let p = l_shape();
        assert!(p.contains(1.0, 1.0));
        assert!(!p.contains(2.0, 1.0));
        assert!(!p.contains(0.0, 1.5));
        assert!(p.on_boundary(0.0, 1.5));
        assert!(!p.contains(2.5, 0.5));
    }

    #[test]
    fn test_parse_str() {
        let p: Polygon = "120.5 137.25\n121.0 137.5\n\n122 138\n".parse().unwrap();
        assert_eq!(p.vertices(), &[(120.5, 137.25), (121.0, 137.5), (122.0, 138.0)]);
        assert!("".parse::<Polygon>().unwrap().is_empty());
    }

    #[test]
    fn test_parse_str_reports_line() {
        match "1 2\n3 x\n".parse::<Polygon>() {
            Err(DatasetError::Contour { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
        match "1 2 3\n".parse::<Polygon>() {
            Err(DatasetError::Contour { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 0\n2 0\n2 2\n0 2").unwrap();
        let p = Polygon::open(file.path()).unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p.rasterize(3, 3).iter().filter(|p| **p).count(), 1);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            Polygon::open(missing),
            Err(DatasetError::ContourIo { .. })
        ));
    }
}
