//! レコード検索・集計
//!
//! 期間抽出、組織別グループ化、候補値の一覧など。

use crate::codes::{BaseCode, CodeSet};
use crate::dates::{try_parse_date, DateRange};
use crate::types::{PersonRecord, RecordField, Sex};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// 名前候補の最大件数
pub const MAX_NAME_SUGGESTIONS: usize = 10;

/// 健診日が期間内のレコードを日付昇順で抽出
///
/// 健診日が空・不正なレコードは除外する（エラーにはしない）。
pub fn select_in_range<'a>(
    records: &'a [PersonRecord],
    range: &DateRange,
    organization: Option<&str>,
) -> Vec<(NaiveDate, &'a PersonRecord)> {
    let mut selected: Vec<(NaiveDate, &PersonRecord)> = records
        .iter()
        .filter(|r| organization.map_or(true, |org| r.organization == org))
        .filter_map(|r| try_parse_date(&r.ids_date).map(|d| (d, r)))
        .filter(|(d, _)| range.contains(*d))
        .collect();
    selected.sort_by_key(|(d, _)| *d);
    selected
}

/// 組織名 → レコード一覧
pub fn group_by_organization(records: &[PersonRecord]) -> BTreeMap<&str, Vec<&PersonRecord>> {
    let mut groups: BTreeMap<&str, Vec<&PersonRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.organization.as_str()).or_default().push(record);
    }
    groups
}

/// フィールドの既存値（空除外、昇順）。組織指定時はその組織のみ
pub fn unique_values<'a>(
    records: &'a [PersonRecord],
    field: RecordField,
    organization: Option<&str>,
) -> Vec<&'a str> {
    let in_org = organization
        .filter(|org| records.iter().any(|r| r.organization == *org));
    records
        .iter()
        .filter(|r| in_org.map_or(true, |org| r.organization == org))
        .map(|r| r.field(field))
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 前方一致（大文字小文字無視）の名前候補
pub fn name_suggestions<'a>(records: &'a [PersonRecord], prefix: &str) -> Vec<&'a str> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .map(|r| r.name.as_str())
        .filter(|name| !name.is_empty() && name.to_lowercase().starts_with(&prefix))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_NAME_SUGGESTIONS)
        .collect()
}

/// 氏名が完全一致する最初のレコード
pub fn find_by_name<'a>(records: &'a [PersonRecord], name: &str) -> Option<&'a PersonRecord> {
    records.iter().find(|r| r.name == name)
}

/// レコードの照合用コード（因子 ∪ 作業種別 ∪ 基本コード）
///
/// 基本コードの年齢は健診日時点。生年月日が読めなければ付けない。
pub fn record_codes(record: &PersonRecord, at: NaiveDate) -> CodeSet {
    let mut codes = CodeSet::from_text(&record.factors);
    codes.extend_text(&record.typework);
    if let Some(base) = BaseCode::derive(Sex::from_record(&record.sex), &record.birthday, at) {
        codes.insert(base.as_str());
    }
    codes
}
