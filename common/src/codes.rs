//! 因子コードの正規化と基本コード
//!
//! コードは `3.1` のような小数表記の文字列。比較は正規化後の完全一致のみ。

use crate::dates::{age_on, try_parse_date};
use crate::types::Sex;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;

lazy_static::lazy_static! {
    static ref CODE_RE: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
}

/// 入力欄のテキストからコードを抽出（`;` は `,` と同じ扱い）
///
/// 数字で始まらない断片は黙って捨てる。
pub fn parse_codes(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let normalized = text.replace(';', ",");
    CODE_RE
        .find_iter(&normalized)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// ルール表のコード欄を正規化（`,` → `.`）
pub fn normalize_code(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

/// 重複なし・昇順のコード集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSet(BTreeSet<String>);

impl CodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入力欄テキストから生成
    pub fn from_text(text: &str) -> Self {
        let mut set = Self::new();
        set.extend_text(text);
        set
    }

    pub fn insert(&mut self, code: &str) -> bool {
        let code = normalize_code(code);
        if code.is_empty() {
            return false;
        }
        self.0.insert(code)
    }

    pub fn extend_text(&mut self, text: &str) {
        for code in parse_codes(text) {
            self.0.insert(code);
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for CodeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for code in iter {
            set.insert(code.as_ref());
        }
        set
    }
}

/// 年齢区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    Under40,
    From40,
}

impl AgeGroup {
    pub fn from_age(age: i32) -> Self {
        if age >= 40 {
            AgeGroup::From40
        } else {
            AgeGroup::Under40
        }
    }
}

impl std::str::FromStr for AgeGroup {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "under40" | "<40" | "u40" => Ok(AgeGroup::Under40),
            "over40" | "40+" | ">=40" | "o40" => Ok(AgeGroup::From40),
            _ => Err(crate::error::Error::Parse(format!(
                "Unknown age group: {}. Use under40 or over40",
                s
            ))),
        }
    }
}

/// 性別・年齢区分から決まる基本コード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseCode {
    MaleUnder40,
    MaleFrom40,
    FemaleUnder40,
    FemaleFrom40,
}

impl BaseCode {
    pub fn new(sex: Sex, group: AgeGroup) -> Self {
        match (sex, group) {
            (Sex::Male, AgeGroup::Under40) => BaseCode::MaleUnder40,
            (Sex::Male, AgeGroup::From40) => BaseCode::MaleFrom40,
            (Sex::Female, AgeGroup::Under40) => BaseCode::FemaleUnder40,
            (Sex::Female, AgeGroup::From40) => BaseCode::FemaleFrom40,
        }
    }

    pub fn for_age(sex: Sex, age: i32) -> Self {
        Self::new(sex, AgeGroup::from_age(age))
    }

    /// 生年月日と基準日から算出。生年月日が読めなければ None
    pub fn derive(sex: Sex, birthday: &str, at: NaiveDate) -> Option<Self> {
        let birth = try_parse_date(birthday)?;
        Some(Self::for_age(sex, age_on(birth, at)))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseCode::MaleUnder40 => "0.11",
            BaseCode::MaleFrom40 => "0.12",
            BaseCode::FemaleUnder40 => "0.21",
            BaseCode::FemaleFrom40 => "0.22",
        }
    }
}

impl fmt::Display for BaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_mixed_delimiters() {
        assert_eq!(parse_codes("1.2, 3.1; 4"), vec!["1.2", "3.1", "4"]);
        assert_eq!(parse_codes("п. 5.2.1"), vec!["5.2", "1"]);
        assert!(parse_codes("").is_empty());
        assert!(parse_codes("нет; -").is_empty());
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" 3,1 "), "3.1");
        assert_eq!(normalize_code("0.12"), "0.12");
    }

    #[test]
    fn test_code_set_dedup_sorted() {
        let set = CodeSet::from_text("3.1, 1.2; 3.1");
        let codes: Vec<&str> = set.iter().collect();
        assert_eq!(codes, vec!["1.2", "3.1"]);
        assert!(set.contains("3.1"));
        assert!(!set.contains("3"));
    }

    #[test]
    fn test_code_set_insert_normalizes() {
        let mut set = CodeSet::new();
        assert!(set.insert("4,2"));
        assert!(!set.insert("4.2"));
        assert!(!set.insert("  "));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_base_code_all_ages() {
        for age in 0..120 {
            for sex in [Sex::Male, Sex::Female] {
                let code = BaseCode::for_age(sex, age).as_str();
                assert!(["0.11", "0.12", "0.21", "0.22"].contains(&code));
            }
        }
    }

    #[test]
    fn test_base_code_boundary() {
        assert_eq!(BaseCode::for_age(Sex::Male, 39).as_str(), "0.11");
        assert_eq!(BaseCode::for_age(Sex::Male, 40).as_str(), "0.12");
        assert_eq!(BaseCode::for_age(Sex::Female, 39).as_str(), "0.21");
        assert_eq!(BaseCode::for_age(Sex::Female, 40).as_str(), "0.22");
    }

    #[test]
    fn test_base_code_derive() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            BaseCode::derive(Sex::Male, "05.03.1984", at),
            Some(BaseCode::MaleFrom40)
        );
        assert_eq!(
            BaseCode::derive(Sex::Male, "06.03.1984", at),
            Some(BaseCode::MaleUnder40)
        );
        assert_eq!(BaseCode::derive(Sex::Female, "??", at), None);
    }
}
