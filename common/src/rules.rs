//! ルール表（приказ 29н）とマッチャー
//!
//! コード → 必要な医師・検査・分析 の対応表。
//! コード集合に完全一致する行を選び、各列を結合・重複除去する。

use crate::codes::{normalize_code, CodeSet};
use std::collections::HashSet;

/// ルール表の1行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleRow {
    /// 正規化済みコード
    pub code: String,
    /// 医師（区切り文字列）
    pub doctors: String,
    /// 検査
    pub inspections: String,
    /// 分析
    pub analyses: String,
}

impl RuleRow {
    pub fn new(code: &str, doctors: &str, inspections: &str, analyses: &str) -> Self {
        Self {
            code: normalize_code(code),
            doctors: doctors.to_string(),
            inspections: inspections.to_string(),
            analyses: analyses.to_string(),
        }
    }
}

/// セル文字列を項目に分割（`,` `;` 区切り、前後空白除去、空は除外）
pub fn split_items(cell: &str) -> impl Iterator<Item = &str> {
    cell.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// 出現順を保った重複なしリスト
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemList {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl ItemList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: &str) -> bool {
        let item = item.trim();
        if item.is_empty() || self.seen.contains(item) {
            return false;
        }
        self.seen.insert(item.to_string());
        self.items.push(item.to_string());
        true
    }

    /// 区切り文字列をまとめて追加
    pub fn extend_cell(&mut self, cell: &str) {
        for item in split_items(cell) {
            self.push(item);
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.seen.contains(item)
    }

    /// 小文字化した項目のいずれかがパターンのいずれかを含むか
    pub fn contains_any(&self, patterns: &[&str]) -> bool {
        self.items.iter().any(|item| {
            let lower = item.to_lowercase();
            patterns.iter().any(|p| lower.contains(p))
        })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 照合結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub doctors: ItemList,
    pub inspections: ItemList,
    pub analyses: ItemList,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty() && self.inspections.is_empty() && self.analyses.is_empty()
    }

    /// 3列を同じ長さに揃えた行（results.xlsx 用）
    pub fn padded_rows(&self) -> Vec<[&str; 3]> {
        let len = self
            .doctors
            .len()
            .max(self.inspections.len())
            .max(self.analyses.len());
        fn cell(list: &ItemList, i: usize) -> &str {
            list.as_slice().get(i).map(|s| s.as_str()).unwrap_or("")
        }
        (0..len)
            .map(|i| {
                [
                    cell(&self.doctors, i),
                    cell(&self.inspections, i),
                    cell(&self.analyses, i),
                ]
            })
            .collect()
    }
}

/// ルール表
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rows: Vec<RuleRow>,
}

impl RuleTable {
    pub fn new(rows: Vec<RuleRow>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[RuleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// コード集合に一致する行を結合
    pub fn match_codes(&self, codes: &CodeSet) -> MatchResult {
        let mut result = MatchResult::default();
        if codes.is_empty() {
            return result;
        }
        for row in self.rows.iter().filter(|r| codes.contains(&r.code)) {
            result.doctors.extend_cell(&row.doctors);
            result.inspections.extend_cell(&row.inspections);
            result.analyses.extend_cell(&row.analyses);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> RuleTable {
        RuleTable::new(vec![
            RuleRow::new("0.12", "Терапевт", "", "Общий анализ крови"),
            RuleRow::new("3.1", "Терапевт, Офтальмолог", "Спирометрия", ""),
            RuleRow::new("4,2", "Оториноларинголог", "Тональная пороговая аудиометрия", ""),
        ])
    }

    #[test]
    fn test_match_union_of_rows() {
        let codes: CodeSet = ["0.12", "3.1"].into_iter().collect();
        let result = sample_table().match_codes(&codes);
        let doctors: Vec<&str> = result.doctors.iter().collect();
        assert_eq!(doctors, vec!["Терапевт", "Офтальмолог"]);
        assert!(result.inspections.contains("Спирометрия"));
        assert!(result.analyses.contains("Общий анализ крови"));
    }

    #[test]
    fn test_match_is_exact() {
        let codes: CodeSet = ["3", "0.1", "3.10"].into_iter().collect();
        assert!(sample_table().match_codes(&codes).is_empty());
    }

    #[test]
    fn test_match_normalized_rule_code() {
        let codes = CodeSet::from_text("4.2");
        let result = sample_table().match_codes(&codes);
        assert_eq!(result.doctors.len(), 1);
    }

    #[test]
    fn test_match_empty_input() {
        assert!(sample_table().match_codes(&CodeSet::new()).is_empty());
        let codes = CodeSet::from_text("3.1");
        assert!(RuleTable::empty().match_codes(&codes).is_empty());
    }

    #[test]
    fn test_item_list_dedup() {
        let mut list = ItemList::new();
        list.extend_cell("Хирург, Терапевт;  Хирург , ,");
        let items: Vec<&str> = list.iter().collect();
        assert_eq!(items, vec!["Хирург", "Терапевт"]);
    }

    #[test]
    fn test_contains_any_case_insensitive() {
        let mut list = ItemList::new();
        list.push("Врач-Дерматовенеролог");
        assert!(list.contains_any(&["дерматолог", "венеролог"]));
        assert!(!list.contains_any(&["хирург"]));
    }

    #[test]
    fn test_padded_rows() {
        let codes: CodeSet = ["3.1"].into_iter().collect();
        let result = sample_table().match_codes(&codes);
        let rows = result.padded_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["Терапевт", "Спирометрия", ""]);
        assert_eq!(rows[1], ["Офтальмолог", "", ""]);
    }
}
