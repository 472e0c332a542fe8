//! コード照会（results.xlsx）
//!
//! 照合結果の3列（Врачи / Обследования / Анализы）を Sheet1 に書き、
//! まとめブックがあれば1枚目を「Summer」シートとして複写する。
//! Summer では1列目が照合結果に含まれる行に「+」を付け、その行の2列目を合計する。

use super::{xlsx_error, Table};
use crate::error::{MedoctorError, Result};
use crate::io::write_atomic;
use calamine::{open_workbook_auto, Data, Reader};
use medoctor_common::{BaseCode, CodeSet, MatchResult};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const RESULTS_FILE: &str = "results.xlsx";
pub const LOOKUP_COLUMNS: [&str; 3] = ["Врачи", "Обследования", "Анализы"];
const SUMMARY_SHEET: &str = "Summer";
const MARK_HEADER: &str = "Соответствие";
const TOTAL_LABEL: &str = "ИТОГО";
const MAX_COL_WIDTH: usize = 50;

/// まとめブック1枚目（見出し行＋データ行、左上は A1 に揃える）
#[derive(Debug, Clone, Default)]
pub struct SummarySheet {
    pub rows: Vec<Vec<Data>>,
}

impl SummarySheet {
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

/// Summer シートの照合結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTotal {
    /// データ行ごとの一致（見出し行を除く）
    pub marks: Vec<bool>,
    /// 一致した行の1列目
    pub matched: Vec<String>,
    /// 一致した行の2列目の合計（数値でないセルは無視）
    pub total: f64,
}

/// 照会の出力結果
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub path: PathBuf,
    pub summary: Option<SummaryTotal>,
}

/// 引数のコード群と基本コードから照会用のセットを作る
pub fn lookup_codes<S: AsRef<str>>(inputs: &[S], base: Option<BaseCode>) -> CodeSet {
    let mut codes = CodeSet::new();
    for input in inputs {
        codes.extend_text(input.as_ref());
    }
    if let Some(base) = base {
        codes.insert(base.as_str());
    }
    codes
}

pub fn lookup_table(matched: &MatchResult) -> Table {
    let mut table = Table::new(LOOKUP_COLUMNS);
    table.rows = matched
        .padded_rows()
        .into_iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect();
    table
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(v) => Some(*v),
        Data::Int(v) => Some(*v as f64),
        Data::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// 1列目が照合結果（医師・検査・分析のいずれか）と完全一致する行を集計
pub fn summarize(sheet: &SummarySheet, matched: &MatchResult) -> SummaryTotal {
    let reference: HashSet<&str> = matched
        .doctors
        .iter()
        .chain(matched.inspections.iter())
        .chain(matched.analyses.iter())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();

    let mut result = SummaryTotal::default();
    for row in sheet.rows.iter().skip(1) {
        let key = row.first().map(cell_text).unwrap_or_default();
        let hit = !key.is_empty() && reference.contains(key.as_str());
        if hit {
            result.total += row.get(1).and_then(cell_number).unwrap_or(0.0);
            result.matched.push(key);
        }
        result.marks.push(hit);
    }
    result
}

fn read_summary(path: &Path) -> Result<SummarySheet> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| MedoctorError::ExcelGeneration(format!("{}: {}", path.display(), e)))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range
            .map_err(|e| MedoctorError::ExcelGeneration(format!("{}: {}", path.display(), e)))?,
        None => return Ok(SummarySheet::default()),
    };

    Ok(SummarySheet {
        rows: range.rows().map(|row| row.to_vec()).collect(),
    })
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Data) -> Result<()> {
    match cell {
        Data::Empty => {}
        Data::Float(v) => {
            worksheet.write_number(row, col, *v).map_err(xlsx_error)?;
        }
        Data::Int(v) => {
            worksheet.write_number(row, col, *v as f64).map_err(xlsx_error)?;
        }
        Data::Bool(v) => {
            worksheet.write_boolean(row, col, *v).map_err(xlsx_error)?;
        }
        Data::String(s) => {
            worksheet.write_string(row, col, s).map_err(xlsx_error)?;
        }
        other => {
            worksheet
                .write_string(row, col, other.to_string())
                .map_err(xlsx_error)?;
        }
    }
    Ok(())
}

/// 列幅は最大文字数+2（上限あり）
fn column_width(max_len: usize) -> f64 {
    (max_len + 2).min(MAX_COL_WIDTH) as f64
}

fn autofit(worksheet: &mut Worksheet, widths: &[usize]) -> Result<()> {
    for (col, len) in widths.iter().enumerate() {
        if *len > 0 {
            worksheet
                .set_column_width(col as u16, column_width(*len))
                .map_err(xlsx_error)?;
        }
    }
    Ok(())
}

fn write_summary_sheet(
    worksheet: &mut Worksheet,
    sheet: &SummarySheet,
    totals: &SummaryTotal,
) -> Result<()> {
    worksheet.set_name(SUMMARY_SHEET).map_err(xlsx_error)?;

    let mark_col = sheet.width();
    let total_col = mark_col + 1;
    let mut widths = vec![0usize; total_col + 1];

    for (r, row) in sheet.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            write_cell(worksheet, r as u32, c as u16, cell)?;
            widths[c] = widths[c].max(cell_text(cell).chars().count());
        }
    }

    worksheet
        .write_string(0, mark_col as u16, MARK_HEADER)
        .map_err(xlsx_error)?;
    for (i, hit) in totals.marks.iter().enumerate() {
        if *hit {
            worksheet
                .write_string((i + 1) as u32, mark_col as u16, "+")
                .map_err(xlsx_error)?;
        }
    }
    widths[mark_col] = MARK_HEADER.chars().count();

    worksheet
        .write_string(1, total_col as u16, TOTAL_LABEL)
        .map_err(xlsx_error)?;
    worksheet
        .write_number(2, total_col as u16, totals.total)
        .map_err(xlsx_error)?;
    widths[total_col] = TOTAL_LABEL.chars().count().max(totals.total.to_string().len());

    autofit(worksheet, &widths)
}

/// results.xlsx のバイト列
pub fn lookup_workbook(
    table: &Table,
    summary: Option<(&SummarySheet, &SummaryTotal)>,
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1").map_err(xlsx_error)?;
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string(0, col as u16, header).map_err(xlsx_error)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet
                    .write_string((i + 1) as u32, col as u16, value)
                    .map_err(xlsx_error)?;
            }
        }
    }
    let widths: Vec<usize> = (0..table.headers.len())
        .map(|col| table.column_max_len(col))
        .collect();
    autofit(sheet, &widths)?;

    if let Some((summary, totals)) = summary {
        write_summary_sheet(workbook.add_worksheet(), summary, totals)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

/// 照会結果を results.xlsx に保存
///
/// まとめブックが読めない場合は警告を出して Sheet1 のみ書く。
pub fn write_lookup(
    matched: &MatchResult,
    summary_path: Option<&Path>,
    output_dir: &Path,
) -> Result<LookupOutcome> {
    let summary = match summary_path.filter(|p| p.exists()) {
        Some(path) => match read_summary(path) {
            Ok(sheet) => Some(sheet),
            Err(e) => {
                tracing::warn!("summary sheet skipped: {}", e);
                None
            }
        },
        None => None,
    };
    let totals = summary.as_ref().map(|sheet| summarize(sheet, matched));

    let table = lookup_table(matched);
    let bytes = lookup_workbook(&table, summary.as_ref().zip(totals.as_ref()))?;
    let path = output_dir.join(RESULTS_FILE);
    write_atomic(&path, &bytes)?;
    tracing::debug!("lookup written: {} rows", table.rows.len());

    Ok(LookupOutcome {
        path,
        summary: totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use medoctor_common::ItemList;

    fn matched() -> MatchResult {
        let mut doctors = ItemList::new();
        doctors.extend_cell("Врач-терапевт, Врач-невролог");
        let mut analyses = ItemList::new();
        analyses.extend_cell("Общий анализ крови");
        MatchResult {
            doctors,
            analyses,
            ..Default::default()
        }
    }

    fn sheet() -> SummarySheet {
        SummarySheet {
            rows: vec![
                vec![Data::String("Услуга".into()), Data::String("Цена".into())],
                vec![Data::String("Врач-терапевт".into()), Data::Float(500.0)],
                vec![Data::String("Врач-хирург".into()), Data::Float(700.0)],
                vec![Data::String(" Общий анализ крови ".into()), Data::String("250,5".into())],
                vec![Data::String("Врач-невролог".into()), Data::Empty],
            ],
        }
    }

    #[test]
    fn test_summarize_marks_and_total() {
        let totals = summarize(&sheet(), &matched());
        assert_eq!(totals.marks, vec![true, false, true, true]);
        assert_eq!(totals.matched, vec!["Врач-терапевт", "Общий анализ крови", "Врач-невролог"]);
        assert_eq!(totals.total, 750.5);
    }

    #[test]
    fn test_summarize_is_exact_match() {
        let sheet = SummarySheet {
            rows: vec![
                vec![Data::String("Услуга".into())],
                vec![Data::String("терапевт".into()), Data::Int(100)],
            ],
        };
        let totals = summarize(&sheet, &matched());
        assert_eq!(totals.marks, vec![false]);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn test_summarize_header_only() {
        let sheet = SummarySheet {
            rows: vec![vec![Data::String("Услуга".into())]],
        };
        let totals = summarize(&sheet, &matched());
        assert!(totals.marks.is_empty());
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn test_column_width_capped() {
        assert_eq!(column_width(10), 12.0);
        assert_eq!(column_width(48), 50.0);
        assert_eq!(column_width(300), 50.0);
    }
}
