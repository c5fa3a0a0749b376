//! `link.csv` 清单解析.
//!
//! 清单首行为表头, 之后每行把一个病人 (DICOM 目录) 与一个原始研究 (轮廓目录) 对应起来.

use crate::consts::layout::{ORIGINAL_ID_COLUMN, PATIENT_ID_COLUMN};
use crate::DatasetError;
use std::path::Path;

/// 清单中的一行.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ManifestRow {
    /// `dicoms/` 下的子目录名.
    pub patient_id: String,

    /// `contourfiles/` 下的子目录名.
    pub original_id: String,
}

#[inline]
fn clean(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

/// 读取清单文件.
///
/// 列按表头名称定位, 顺序任意, 多余的列被忽略. 空行被跳过.
///
/// # 注意
///
/// 字段按逗号直接切分, 不支持 CSV 转义: 双引号只在字段两端被去除,
/// 引号内含逗号的字段会使其后各列错位.
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<ManifestRow>, DatasetError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Manifest {
        path: path.to_owned(),
        source,
    })?;
    parse_manifest(&text, path)
}

/// 解析清单文本. `path` 仅用于错误信息.
pub fn parse_manifest(text: &str, path: &Path) -> Result<Vec<ManifestRow>, DatasetError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let missing = |column| DatasetError::MissingColumn {
        path: path.to_owned(),
        column,
    };
    let header: Vec<&str> = match lines.next() {
        Some((_, line)) => line.split(',').map(clean).collect(),
        None => return Err(missing(PATIENT_ID_COLUMN)),
    };
    let locate = |column| {
        header
            .iter()
            .position(|&name| name == column)
            .ok_or_else(|| missing(column))
    };
    let patient_col = locate(PATIENT_ID_COLUMN)?;
    let original_col = locate(ORIGINAL_ID_COLUMN)?;

    lines
        .map(|(line_no, line)| {
            let fields: Vec<&str> = line.split(',').map(clean).collect();
            match (fields.get(patient_col), fields.get(original_col)) {
                (Some(&patient_id), Some(&original_id)) => Ok(ManifestRow {
                    patient_id: patient_id.to_owned(),
                    original_id: original_id.to_owned(),
                }),
                _ => Err(DatasetError::MalformedRow {
                    path: path.to_owned(),
                    line: line_no,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(patient_id: &str, original_id: &str) -> ManifestRow {
        ManifestRow {
            patient_id: patient_id.to_owned(),
            original_id: original_id.to_owned(),
        }
    }

    #[test]
    fn test_parse_manifest() {
        let text = "patient_id,original_id\nSCD0000101,SC-HF-I-1\n\nSCD0000201,SC-HF-I-2\n";
        let rows = parse_manifest(text, Path::new("link.csv")).unwrap();
        assert_eq!(rows, vec![row("SCD0000101", "SC-HF-I-1"), row("SCD0000201", "SC-HF-I-2")]);
    }

    #[test]
    fn test_columns_located_by_name() {
        let text = " \"original_id\" ,note, patient_id\r\nSC-HF-I-1,x,SCD0000101\r\n";
        let rows = parse_manifest(text, Path::new("link.csv")).unwrap();
        assert_eq!(rows, vec![row("SCD0000101", "SC-HF-I-1")]);
    }

    #[test]
    fn test_missing_column() {
        let err = parse_manifest("patient_id,other\na,b\n", Path::new("link.csv")).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingColumn { column: ORIGINAL_ID_COLUMN, .. }
        ));
        let err = parse_manifest("", Path::new("link.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { .. }));
    }

    #[test]
    fn test_malformed_row() {
        let text = "patient_id,original_id\na,b\n\nc\n";
        let err = parse_manifest(text, Path::new("link.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::MalformedRow { line: 4, .. }));
    }

    #[test]
    fn test_quoted_comma_shifts_columns() {
        let text = "note,patient_id,original_id\n\"a,b\",P1,O1\n";
        let rows = parse_manifest(text, Path::new("link.csv")).unwrap();
        assert_eq!(rows, vec![row("b", "P1")]);
        assert_ne!(rows[0].original_id, "O1");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_manifest(dir.path().join("link.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Manifest { .. }));
    }
}
