//! レコード型定義
//!
//! - PersonRecord: 受診者1件（data.xml の `<person>`）
//! - Sex: 性別（М/Ж）
//! - ExamType: 健診の種類（予備/定期）

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// 受診者レコード
///
/// 値はフォーム入力そのままの文字列で保持する。作成後は変更しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonRecord {
    pub organization: String,
    pub name: String,
    /// ДД.ММ.ГГГГ
    pub birthday: String,
    /// "М" / "Ж"
    pub sex: String,
    pub division: String,
    pub profession: String,
    /// 有害因子コード（, ; 区切り）
    pub factors: String,
    /// 作業種別コード
    pub typework: String,
    pub diagnosis: String,
    /// 健診日（ДД.ММ.ГГГГ）
    pub ids_date: String,
    pub id: String,
    /// XMLタグは date_created
    pub created_at: String,
}

/// レコードのフィールド（一覧・候補表示用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Organization,
    Name,
    Division,
    Profession,
    Factors,
    Typework,
    Diagnosis,
}

impl PersonRecord {
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Organization => &self.organization,
            RecordField::Name => &self.name,
            RecordField::Division => &self.division,
            RecordField::Profession => &self.profession,
            RecordField::Factors => &self.factors,
            RecordField::Typework => &self.typework,
            RecordField::Diagnosis => &self.diagnosis,
        }
    }
}

impl FromStr for RecordField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organization" | "org" => Ok(RecordField::Organization),
            "name" => Ok(RecordField::Name),
            "division" => Ok(RecordField::Division),
            "profession" => Ok(RecordField::Profession),
            "factors" => Ok(RecordField::Factors),
            "typework" => Ok(RecordField::Typework),
            "diagnosis" => Ok(RecordField::Diagnosis),
            _ => Err(Error::Parse(format!(
                "Unknown field: {}. Use organization, name, division, profession, factors, typework or diagnosis",
                s
            ))),
        }
    }
}

/// 性別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "М",
            Sex::Female => "Ж",
        }
    }

    /// レコードの性別欄を解釈（"М" 以外は女性扱い）
    pub fn from_record(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "М" | "M" => Sex::Male,
            _ => Sex::Female,
        }
    }

    /// 父称（ФИОの3語目）の語尾から性別を推定。判定できなければ男性
    pub fn guess_from_full_name(full_name: &str) -> Self {
        let parts: Vec<&str> = full_name.split_whitespace().collect();
        if parts.len() >= 3 {
            let middle = parts[2].to_lowercase();
            if ["вич", "льич", "ич"].iter().any(|s| middle.ends_with(s)) {
                return Sex::Male;
            }
            if ["вна", "чна", "инична", "овна", "евна", "ична"]
                .iter()
                .any(|s| middle.ends_with(s))
            {
                return Sex::Female;
            }
        }
        Sex::Male
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "м" | "m" | "male" | "муж" => Ok(Sex::Male),
            "ж" | "f" | "female" | "жен" => Ok(Sex::Female),
            _ => Err(Error::Parse(format!("Unknown sex: {}. Use М or Ж", s))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 健診の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExamType {
    #[default]
    Preliminary,
    Periodic,
}

impl ExamType {
    /// 文書に差し込む生格形
    pub fn genitive(&self) -> &'static str {
        match self {
            ExamType::Preliminary => "предварительного",
            ExamType::Periodic => "периодического",
        }
    }
}

impl FromStr for ExamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "preliminary" | "предварительный" => Ok(ExamType::Preliminary),
            "periodic" | "периодический" => Ok(ExamType::Periodic),
            _ => Err(Error::Parse(format!(
                "Unknown exam type: {}. Use preliminary or periodic",
                s
            ))),
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamType::Preliminary => write!(f, "предварительный"),
            ExamType::Periodic => write!(f, "периодический"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_sex_from_patronymic() {
        assert_eq!(Sex::guess_from_full_name("Иванов Иван Иванович"), Sex::Male);
        assert_eq!(Sex::guess_from_full_name("Петров Пётр Ильич"), Sex::Male);
        assert_eq!(Sex::guess_from_full_name("Иванова Мария Петровна"), Sex::Female);
        assert_eq!(Sex::guess_from_full_name("Кузьмина Анна Никитична"), Sex::Female);
        assert_eq!(Sex::guess_from_full_name("Smith John"), Sex::Male);
    }

    #[test]
    fn test_sex_from_record_defaults_to_female() {
        assert_eq!(Sex::from_record("М"), Sex::Male);
        assert_eq!(Sex::from_record(" м "), Sex::Male);
        assert_eq!(Sex::from_record("Ж"), Sex::Female);
        assert_eq!(Sex::from_record(""), Sex::Female);
    }

    #[test]
    fn test_sex_from_str() {
        assert_eq!("ж".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("M".parse::<Sex>().unwrap(), Sex::Male);
        assert!("x".parse::<Sex>().is_err());
    }

    #[test]
    fn test_exam_type_genitive() {
        let t: ExamType = "периодический".parse().unwrap();
        assert_eq!(t.genitive(), "периодического");
        assert_eq!(ExamType::default().genitive(), "предварительного");
    }

    #[test]
    fn test_record_field() {
        let rec = PersonRecord {
            division: "Цех 1".into(),
            ..Default::default()
        };
        let field: RecordField = "division".parse().unwrap();
        assert_eq!(rec.field(field), "Цех 1");
    }
}
