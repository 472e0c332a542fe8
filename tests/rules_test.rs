//! приказ 29н の読み込みテスト
//!
//! Excelはテスト内で rust_xlsxwriter により作成

use medoctor::error::MedoctorError;
use medoctor::rule_source::{
    ensure_user_copy, load_rule_table, load_rule_table_or_empty, resolve_rule_table_path, RULE_COLUMNS,
};
use medoctor_common::CodeSet;
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// 列順を入れ替え、見出しを大文字にした表
fn write_rule_table(dir: &Path, file: &str) -> PathBuf {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["ANALYSIS", "n", "Doctors_Name", "inspection"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    // 0,12 は文字列、3.1 は数値セル
    sheet.write_string(1, 1, "0,12").unwrap();
    sheet.write_string(1, 2, "Терапевт").unwrap();
    sheet.write_string(1, 0, "Общий анализ крови").unwrap();

    sheet.write_number(2, 1, 3.1).unwrap();
    sheet.write_string(2, 2, "Терапевт, Офтальмолог").unwrap();
    sheet.write_string(2, 3, "Визометрия; Тонометрия").unwrap();

    // コードの無い行は無視
    sheet.write_string(3, 2, "Хирург").unwrap();

    let path = dir.join(file);
    workbook.save(&path).unwrap();
    path
}

#[test]
fn test_load_and_match() {
    let dir = tempdir().unwrap();
    let path = write_rule_table(dir.path(), "prikaz.xlsx");

    let table = load_rule_table(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0].code, "0.12");
    assert_eq!(table.rows()[1].code, "3.1");

    let matched = table.match_codes(&CodeSet::from_text("0.12, 3.1"));
    let doctors: Vec<&str> = matched.doctors.iter().collect();
    assert_eq!(doctors, vec!["Терапевт", "Офтальмолог"]);
    assert_eq!(matched.inspections.len(), 2);
    assert_eq!(matched.analyses.as_slice(), ["Общий анализ крови".to_string()]);

    assert!(table.match_codes(&CodeSet::from_text("9.9")).is_empty());
}

#[test]
fn test_missing_columns() {
    let dir = tempdir().unwrap();
    let mut workbook = Workbook::new();
    workbook.add_worksheet().write_string(0, 0, "n").unwrap();
    let path = dir.path().join("bad.xlsx");
    workbook.save(&path).unwrap();

    assert!(matches!(load_rule_table(&path), Err(MedoctorError::RuleTable(_))));
    assert!(load_rule_table_or_empty(&path).is_empty());
}

#[test]
fn test_missing_file_degrades_to_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("none.xlsx");
    assert!(matches!(load_rule_table(&path), Err(MedoctorError::FileNotFound(_))));
    assert!(load_rule_table_or_empty(&path).is_empty());
}

/// ユーザーコピーがあればそちらを優先
#[test]
fn test_override_resolution() {
    let dir = tempdir().unwrap();
    let default = dir.path().join("default.xlsx");
    let user = dir.path().join("user.xlsx");

    assert_eq!(resolve_rule_table_path(&default, Some(&user)), default);
    assert_eq!(resolve_rule_table_path(&default, None), default);

    std::fs::write(&user, b"x").unwrap();
    assert_eq!(resolve_rule_table_path(&default, Some(&user)), user);
}

#[test]
fn test_ensure_user_copy_from_default() {
    let dir = tempdir().unwrap();
    let default = write_rule_table(dir.path(), "default.xlsx");
    let user = dir.path().join("app").join("prikaz29n.xlsx");

    let path = ensure_user_copy(&default, &user).unwrap();
    assert_eq!(path, user);
    assert_eq!(std::fs::read(&user).unwrap(), std::fs::read(&default).unwrap());

    // 既存のコピーは上書きしない
    std::fs::write(&user, b"edited").unwrap();
    ensure_user_copy(&default, &user).unwrap();
    assert_eq!(std::fs::read(&user).unwrap(), b"edited");
}

#[test]
fn test_ensure_user_copy_without_default() {
    let dir = tempdir().unwrap();
    let user = dir.path().join("prikaz29n.xlsx");

    ensure_user_copy(&dir.path().join("missing.xlsx"), &user).unwrap();

    let table = load_rule_table(&user).unwrap();
    assert!(table.is_empty());
    assert_eq!(RULE_COLUMNS.len(), 4);
}
