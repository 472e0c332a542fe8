//! приказ 29н（ルール表）の読み込み
//!
//! 1枚目のシートの見出し行から `n` / `doctors_name` / `inspection` / `analysis`
//! 列を探す。ユーザー編集用コピーがあればそちらを優先する。

use crate::error::{MedoctorError, Result};
use crate::io::write_atomic;
use calamine::{open_workbook_auto, Data, Reader};
use medoctor_common::{RuleRow, RuleTable};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

/// 見出し（列順は自由）
pub const RULE_COLUMNS: [&str; 4] = ["n", "doctors_name", "inspection", "analysis"];

/// 読み込むパスを決める: ユーザーコピーが存在すればそれ、無ければ同梱版
pub fn resolve_rule_table_path(default: &Path, user: Option<&Path>) -> PathBuf {
    match user {
        Some(user) if user.exists() => user.to_path_buf(),
        _ => default.to_path_buf(),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// 見出し行の列番号
fn header_positions(header: &[Data]) -> Option<[usize; 4]> {
    let names: Vec<String> = header.iter().map(|c| cell_text(c).to_lowercase()).collect();
    let mut positions = [0usize; 4];
    for (slot, column) in positions.iter_mut().zip(RULE_COLUMNS.iter()) {
        *slot = names.iter().position(|n| n == column)?;
    }
    Some(positions)
}

pub fn load_rule_table(path: &Path) -> Result<RuleTable> {
    if !path.exists() {
        return Err(MedoctorError::FileNotFound(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| MedoctorError::RuleTable(format!("{}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MedoctorError::RuleTable(format!("{}: нет листов", path.display())))?
        .map_err(|e| MedoctorError::RuleTable(format!("{}: {}", path.display(), e)))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| MedoctorError::RuleTable(format!("{}: пустой лист", path.display())))?;
    let [code_col, doctors_col, inspection_col, analysis_col] = header_positions(header)
        .ok_or_else(|| {
            MedoctorError::RuleTable(format!(
                "{}: нет столбцов {}",
                path.display(),
                RULE_COLUMNS.join(", ")
            ))
        })?;

    let get = |row: &[Data], col: usize| row.get(col).map(cell_text).unwrap_or_default();
    let table_rows: Vec<RuleRow> = rows
        .map(|row| {
            RuleRow::new(
                &get(row, code_col),
                &get(row, doctors_col),
                &get(row, inspection_col),
                &get(row, analysis_col),
            )
        })
        .filter(|r| !r.code.is_empty())
        .collect();

    tracing::debug!("rule table {}: {} rows", path.display(), table_rows.len());
    Ok(RuleTable::new(table_rows))
}

/// 読めなければ空のルール表（警告のみ）
pub fn load_rule_table_or_empty(path: &Path) -> RuleTable {
    match load_rule_table(path) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("rule table unavailable, using empty set: {}", e);
            RuleTable::empty()
        }
    }
}

/// 見出しだけの空ブック
fn empty_rule_workbook() -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, name) in RULE_COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *name)
            .map_err(|e| MedoctorError::ExcelGeneration(e.to_string()))?;
    }
    workbook
        .save_to_buffer()
        .map_err(|e| MedoctorError::ExcelGeneration(e.to_string()))
}

/// 編集用コピーを用意してパスを返す
///
/// 既にあればそのまま。無ければ同梱版をコピー、同梱版も無ければ見出しのみで作成。
pub fn ensure_user_copy(default: &Path, user: &Path) -> Result<PathBuf> {
    if user.exists() {
        return Ok(user.to_path_buf());
    }
    if default.exists() {
        let bytes = std::fs::read(default)?;
        write_atomic(user, &bytes)?;
        tracing::info!("rule table copied to {}", user.display());
    } else {
        write_atomic(user, &empty_rule_workbook()?)?;
        tracing::info!("empty rule table created at {}", user.display());
    }
    Ok(user.to_path_buf())
}
