//! Excelレポート（組織別 / 期間 / 医師別）
//!
//! 健診日（ids_date）が期間内のレコードを日付順に出力する。
//! 医師別は各レコードのコードを приказ と照合し、診察室・検査ごとに「+」を付ける。

use super::{xlsx_error, Table};
use crate::error::{MedoctorError, Result};
use crate::io::write_atomic;
use medoctor_common::dates::format_date;
use medoctor_common::{mark_stations, record_codes, select_in_range, DateRange, PersonRecord, RuleTable, STATIONS};
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::path::{Path, PathBuf};

/// レコード一覧の列
pub const RECORD_COLUMNS: [&str; 10] = [
    "Организация",
    "ФИО",
    "Дата рожд.",
    "Пол",
    "Подразделение",
    "Должность",
    "Факторы",
    "Виды работ",
    "Дата ИДС",
    "Диагноз",
];

/// 医師別レポートの固定列（この後に STATIONS が続く）
pub const DOCTOR_BASE_COLUMNS: [&str; 4] = ["Дата", "ФИО", "Дата рождения", "Организация"];

const DOCTOR_HEADER_HEIGHT: f64 = 136.0;
const STATION_COL_WIDTH: f64 = 8.0;
const MAX_COL_WIDTH: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// 1組織・期間指定
    Organization,
    /// 全組織・期間指定
    Period,
    /// 医師・検査の要否マトリクス
    Doctors,
}

impl ReportKind {
    pub fn sheet_name(&self) -> &'static str {
        match self {
            ReportKind::Organization | ReportKind::Period => "Report",
            ReportKind::Doctors => "Отчет",
        }
    }

    pub fn file_name(&self, range: &DateRange, organization: Option<&str>) -> String {
        let start = format_date(range.start());
        let end = format_date(range.end());
        match self {
            ReportKind::Organization => format!(
                "Отчет_{}_{}_{}.xlsx",
                organization.unwrap_or_default(),
                start,
                end
            ),
            ReportKind::Period => format!("Отчет_по_месяцу_{}_{}.xlsx", start, end),
            ReportKind::Doctors => format!("Отчет_по_врачам_{}_{}.xlsx", start, end),
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organization" | "org" => Ok(ReportKind::Organization),
            "period" | "month" => Ok(ReportKind::Period),
            "doctors" => Ok(ReportKind::Doctors),
            _ => Err(format!("Unknown report: {}. Use organization, period or doctors", s)),
        }
    }
}

fn record_row(record: &PersonRecord) -> Vec<String> {
    vec![
        record.organization.clone(),
        record.name.clone(),
        record.birthday.clone(),
        record.sex.clone(),
        record.division.clone(),
        record.profession.clone(),
        record.factors.clone(),
        record.typework.clone(),
        record.ids_date.trim().to_string(),
        record.diagnosis.clone(),
    ]
}

/// 組織別・期間レポートの表
pub fn records_table(
    records: &[PersonRecord],
    range: &DateRange,
    organization: Option<&str>,
) -> Result<Table> {
    let mut table = Table::new(RECORD_COLUMNS);
    for (_, record) in select_in_range(records, range, organization) {
        table.rows.push(record_row(record));
    }
    if table.is_empty() {
        return Err(MedoctorError::EmptyReport);
    }
    Ok(table)
}

/// 医師別レポートの表
pub fn doctors_table(
    records: &[PersonRecord],
    rules: &RuleTable,
    range: &DateRange,
    organization: Option<&str>,
) -> Result<Table> {
    let headers = DOCTOR_BASE_COLUMNS
        .iter()
        .copied()
        .chain(STATIONS.iter().map(|s| s.column));
    let mut table = Table::new(headers);

    for (date, record) in select_in_range(records, range, organization) {
        let codes = record_codes(record, date);
        let matched = rules.match_codes(&codes);
        tracing::debug!(
            "{}: codes={:?} doctors={}",
            record.name,
            codes.iter().collect::<Vec<_>>(),
            matched.doctors.len()
        );

        let mut row = vec![
            record.ids_date.trim().to_string(),
            record.name.clone(),
            record.birthday.clone(),
            record.organization.clone(),
        ];
        row.extend(
            mark_stations(&matched)
                .into_iter()
                .map(|m| if m { "+".to_string() } else { String::new() }),
        );
        table.rows.push(row);
    }

    if table.is_empty() {
        return Err(MedoctorError::EmptyReport);
    }
    Ok(table)
}

/// 通常の表（見出し＋値、列幅は最大文字数+2）
pub fn table_workbook(table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(xlsx_error)?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(xlsx_error)?;
        let width = (table.column_max_len(col) + 2) as f64;
        worksheet.set_column_width(col as u16, width).map_err(xlsx_error)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_string((i + 1) as u32, col as u16, value)
                .map_err(xlsx_error)?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

/// 医師別の表（見出し縦書き、診察室列は固定幅）
pub fn doctors_workbook(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(ReportKind::Doctors.sheet_name())
        .map_err(xlsx_error)?;

    let header_format = Format::new()
        .set_rotation(90)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap();
    let mark_format = Format::new().set_align(FormatAlign::Center);

    worksheet
        .set_row_height(0, DOCTOR_HEADER_HEIGHT)
        .map_err(xlsx_error)?;

    let base = DOCTOR_BASE_COLUMNS.len();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(xlsx_error)?;
        let width = if col >= base {
            STATION_COL_WIDTH
        } else {
            ((table.column_max_len(col) + 2) as f64).min(MAX_COL_WIDTH)
        };
        worksheet.set_column_width(col as u16, width).map_err(xlsx_error)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            if col >= base {
                if !value.is_empty() {
                    worksheet
                        .write_string_with_format(r, col as u16, value, &mark_format)
                        .map_err(xlsx_error)?;
                }
            } else {
                worksheet.write_string(r, col as u16, value).map_err(xlsx_error)?;
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

/// レポートを作成して出力先に保存
pub fn generate_report(
    kind: ReportKind,
    records: &[PersonRecord],
    rules: &RuleTable,
    range: &DateRange,
    organization: Option<&str>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let organization = organization.map(str::trim).filter(|o| !o.is_empty());
    let bytes = match kind {
        ReportKind::Organization => {
            let org = organization
                .ok_or_else(|| MedoctorError::Validation("Выберите организацию".into()))?;
            let table = records_table(records, range, Some(org))?;
            table_workbook(&table, kind.sheet_name())?
        }
        ReportKind::Period => {
            let table = records_table(records, range, organization)?;
            table_workbook(&table, kind.sheet_name())?
        }
        ReportKind::Doctors => {
            let table = doctors_table(records, rules, range, organization)?;
            doctors_workbook(&table)?
        }
    };

    let path = output_dir.join(kind.file_name(range, organization));
    write_atomic(&path, &bytes)?;
    Ok(path)
}
