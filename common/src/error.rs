//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Неверная дата (ожидается ДД.ММ.ГГГГ): {0}")]
    InvalidDate(String),

    #[error("Конечная дата меньше начальной: {start} > {end}")]
    InvalidRange { start: String, end: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_date() {
        let error = Error::InvalidDate("31.02.2024".to_string());
        let display = format!("{}", error);
        assert!(display.contains("ДД.ММ.ГГГГ"));
        assert!(display.contains("31.02.2024"));
    }

    #[test]
    fn test_error_display_range() {
        let error = Error::InvalidRange {
            start: "10.01.2024".into(),
            end: "01.01.2024".into(),
        };
        let display = format!("{}", error);
        assert!(display.contains("10.01.2024"));
        assert!(display.contains("01.01.2024"));
    }

    #[test]
    fn test_error_display_parse() {
        let error = Error::Parse("пол: X".to_string());
        assert_eq!(format!("{}", error), "Parse error: пол: X");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Parse("テスト".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Parse"));
        assert!(debug.contains("テスト"));
    }
}
