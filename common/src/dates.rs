//! 日付ユーティリティ
//!
//! 入力はすべて `ДД.ММ.ГГГГ` 形式の文字列。

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};

/// 日付フォーマット（ДД.ММ.ГГГГ）
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// 作成日時フォーマット
pub const DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// `ДД.ММ.ГГГГ` をパース
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(value.trim().to_string()))
}

/// 空文字・不正値は None
pub fn try_parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_date(value).ok()
}

pub fn is_valid_date(value: &str) -> bool {
    try_parse_date(value).is_some()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// 基準日時点の満年齢
///
/// 基準日の（月, 日）が誕生日の（月, 日）より前なら1を引く。
pub fn age_on(birth: NaiveDate, at: NaiveDate) -> i32 {
    let mut age = at.year() - birth.year();
    if (at.month(), at.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// 月末日
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// 数字のみの入力を `ДД.ММ.ГГГГ` に整形（途中入力も可）
///
/// 数字以外は捨て、先頭8桁までを使う。
pub fn normalize_date_input(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).take(8).collect();
    let mut parts: Vec<&str> = Vec::with_capacity(3);
    match digits.len() {
        0..=2 => parts.push(&digits),
        3..=4 => {
            parts.push(&digits[..2]);
            parts.push(&digits[2..]);
        }
        _ => {
            parts.push(&digits[..2]);
            parts.push(&digits[2..4]);
            parts.push(&digits[4..]);
        }
    }
    parts.join(".")
}

/// 閉区間の日付範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidRange {
                start: format_date(start),
                end: format_date(end),
            });
        }
        Ok(Self { start, end })
    }

    /// 文字列から生成。終了日省略時は開始月の月末
    pub fn parse(start: &str, end: Option<&str>) -> Result<Self> {
        let start = parse_date(start)?;
        let end = match end {
            Some(end) if !end.trim().is_empty() => parse_date(end)?,
            _ => month_end(start),
        };
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
