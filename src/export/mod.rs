pub mod compose;
pub mod docx;
pub mod lookup;
pub mod report;

use crate::error::MedoctorError;
use rust_xlsxwriter::XlsxError;

/// 表形式の出力データ（1シート分）
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 列の最大文字数（見出し含む）
    pub fn column_max_len(&self, col: usize) -> usize {
        let header = self.headers.get(col).map(|h| h.chars().count()).unwrap_or(0);
        self.rows
            .iter()
            .filter_map(|row| row.get(col))
            .map(|v| v.chars().count())
            .fold(header, usize::max)
    }
}

pub(crate) fn xlsx_error(e: XlsxError) -> MedoctorError {
    MedoctorError::ExcelGeneration(e.to_string())
}
