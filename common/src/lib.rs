//! Medoctor Common Library
//!
//! CLIから使う、I/Oを持たない型と照合ロジック

pub mod codes;
pub mod dates;
pub mod error;
pub mod records;
pub mod rules;
pub mod stations;
pub mod types;

pub use codes::{parse_codes, normalize_code, AgeGroup, BaseCode, CodeSet};
pub use dates::{age_on, month_end, parse_date, DateRange};
pub use error::{Error, Result};
pub use records::{record_codes, select_in_range};
pub use rules::{ItemList, MatchResult, RuleRow, RuleTable};
pub use stations::{mark_stations, Station, STATIONS};
pub use types::{ExamType, PersonRecord, RecordField, Sex};
