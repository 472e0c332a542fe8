//! 結論書フォーム
//!
//! 入力の整形・補完・検証を行い、文書を書いてからレコードを追記する。
//! 文書の書き込みに失敗した場合はレコードを追加しない。

use crate::error::{MedoctorError, Result};
use crate::export::compose::{append_to_combined, write_standalone, AppendOutcome};
use crate::export::docx::{render_template, Placeholders};
use crate::store::RecordStore;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use dialoguer::Input;
use medoctor_common::dates::{format_date, is_valid_date, normalize_date_input, DATETIME_FORMAT};
use medoctor_common::records::{find_by_name, unique_values};
use medoctor_common::{ExamType, PersonRecord, RecordField, Sex};
use std::path::{Path, PathBuf};

/// 出力方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// 1人1ファイル
    #[default]
    Standalone,
    /// 日付ごとの1ファイルに追記
    Combined,
}

#[derive(Debug, Clone, Default)]
pub struct ConclusionForm {
    pub exam_type: ExamType,
    pub organization: String,
    pub name: String,
    pub birthday: String,
    /// 未指定なら父称から推定
    pub sex: Option<Sex>,
    pub division: String,
    pub profession: String,
    pub factors: String,
    pub typework: String,
    pub ids_date: String,
    pub diagnosis: String,
}

/// 結論書の保存結果
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub document: PathBuf,
    /// まとめファイル時のみ
    pub combined: Option<AppendOutcome>,
    pub record: PersonRecord,
}

pub fn standalone_file_name(name: &str) -> String {
    format!("{} - заключение.docx", name.trim())
}

pub fn combined_file_name(date: NaiveDate) -> String {
    format!("заключения_{}.docx", format_date(date))
}

/// 数字だけの入力は ДД.ММ.ГГГГ に整形
fn tidy_date(value: &str) -> String {
    let value = value.trim();
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        normalize_date_input(value)
    } else {
        value.to_string()
    }
}

impl ConclusionForm {
    /// 前後の空白除去と日付の整形
    pub fn normalize(&mut self) {
        for field in [
            &mut self.organization,
            &mut self.name,
            &mut self.division,
            &mut self.profession,
            &mut self.factors,
            &mut self.typework,
            &mut self.diagnosis,
        ] {
            *field = field.trim().to_string();
        }
        self.birthday = tidy_date(&self.birthday);
        self.ids_date = tidy_date(&self.ids_date);
    }

    /// 同名の既存レコードから生年月日・性別・健診日を補完（空欄のみ）
    pub fn autofill(&mut self, records: &[PersonRecord]) -> bool {
        let Some(existing) = find_by_name(records, self.name.trim()) else {
            return false;
        };
        if self.birthday.is_empty() {
            self.birthday = existing.birthday.clone();
        }
        if self.sex.is_none() && !existing.sex.trim().is_empty() {
            self.sex = Some(Sex::from_record(&existing.sex));
        }
        if self.ids_date.is_empty() {
            self.ids_date = existing.ids_date.clone();
        }
        tracing::debug!("autofilled from existing record: {}", existing.name);
        true
    }

    pub fn resolved_sex(&self) -> Sex {
        self.sex
            .unwrap_or_else(|| Sex::guess_from_full_name(&self.name))
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.organization.trim().is_empty() {
            missing.push("Организация");
        }
        if self.name.trim().is_empty() {
            missing.push("ФИО");
        }
        if self.birthday.trim().is_empty() {
            missing.push("Дата рождения");
        }
        if self.ids_date.trim().is_empty() {
            missing.push("Дата ИДС");
        }
        missing
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(MedoctorError::Validation(format!(
                "Заполните обязательные поля: {}",
                missing.join(", ")
            )));
        }
        if !is_valid_date(&self.birthday) {
            return Err(MedoctorError::Validation(format!(
                "Неверный формат даты рождения: {} (ДД.ММ.ГГГГ)",
                self.birthday
            )));
        }
        if !is_valid_date(&self.ids_date) {
            return Err(MedoctorError::Validation(format!(
                "Неверный формат даты ИДС: {} (ДД.ММ.ГГГГ)",
                self.ids_date
            )));
        }
        Ok(())
    }

    pub fn placeholders(&self, year: i32) -> Placeholders {
        let mut values = Placeholders::new();
        values.insert("type", self.exam_type.genitive());
        values.insert("organization", self.organization.as_str());
        values.insert("name", self.name.as_str());
        values.insert("birthday", self.birthday.as_str());
        values.insert("sex", self.resolved_sex().as_str());
        values.insert("division", self.division.as_str());
        values.insert("profession", self.profession.as_str());
        values.insert("factors", self.factors.as_str());
        values.insert("typework", self.typework.as_str());
        values.insert("ids_date", self.ids_date.as_str());
        values.insert("diagnosis", self.diagnosis.as_str());
        values.insert("year", year.to_string());
        values
    }

    pub fn to_record(&self, now: &DateTime<Local>) -> PersonRecord {
        PersonRecord {
            organization: self.organization.clone(),
            name: self.name.clone(),
            birthday: self.birthday.clone(),
            sex: self.resolved_sex().as_str().to_string(),
            division: self.division.clone(),
            profession: self.profession.clone(),
            factors: self.factors.clone(),
            typework: self.typework.clone(),
            diagnosis: self.diagnosis.clone(),
            ids_date: self.ids_date.clone(),
            id: now.timestamp().to_string(),
            created_at: now.format(DATETIME_FORMAT).to_string(),
        }
    }
}

/// 結論書を作成して保存し、レコードを追記
pub fn submit(
    form: &ConclusionForm,
    mode: OutputMode,
    template: &Path,
    store: &RecordStore,
    output_dir: &Path,
    now: DateTime<Local>,
) -> Result<SubmitOutcome> {
    form.validate()?;

    let package = render_template(template, &form.placeholders(now.year()))?;
    let (document, combined) = match mode {
        OutputMode::Standalone => {
            let path = output_dir.join(standalone_file_name(&form.name));
            write_standalone(&package, &path)?;
            (path, None)
        }
        OutputMode::Combined => {
            let path = output_dir.join(combined_file_name(now.date_naive()));
            let outcome = append_to_combined(&package, &path)?;
            (path, Some(outcome))
        }
    };

    let record = form.to_record(&now);
    store.append(&record)?;

    Ok(SubmitOutcome {
        document,
        combined,
        record,
    })
}

fn prompt_text(label: &str, initial: &str, allow_empty: bool) -> Result<String> {
    let mut input = Input::<String>::new()
        .with_prompt(label)
        .allow_empty(allow_empty);
    if !initial.is_empty() {
        input = input.with_initial_text(initial);
    }
    input
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| MedoctorError::CliExecution(e.to_string()))
}

fn show_candidates(values: &[&str]) {
    if !values.is_empty() {
        println!("  候補: {}", values.join(", "));
    }
}

fn prompt_date(label: &str, current: &str) -> Result<String> {
    loop {
        let value = tidy_date(&prompt_text(label, current, false)?);
        if is_valid_date(&value) {
            return Ok(value);
        }
        println!("  Неверный формат даты (ДД.ММ.ГГГГ): {}", value);
    }
}

/// 未入力の項目を対話式で埋める
///
/// 組織・部署などは既存レコードの値を候補として表示する。
pub fn prompt_missing(form: &mut ConclusionForm, records: &[PersonRecord]) -> Result<()> {
    if form.organization.is_empty() {
        show_candidates(&unique_values(records, RecordField::Organization, None));
        form.organization = prompt_text("Организация", "", false)?;
    }
    if form.name.is_empty() {
        form.name = prompt_text("ФИО", "", false)?;
    }
    form.autofill(records);

    if form.birthday.is_empty() {
        form.birthday = prompt_date("Дата рождения", "")?;
    }
    if form.ids_date.is_empty() {
        form.ids_date = prompt_date("Дата ИДС", "")?;
    }

    let org = Some(form.organization.as_str());
    let optional = [
        (RecordField::Division, "Подразделение"),
        (RecordField::Profession, "Должность"),
        (RecordField::Factors, "Факторы"),
        (RecordField::Typework, "Виды работ"),
        (RecordField::Diagnosis, "Диагноз"),
    ];
    for (field, label) in optional {
        let current = match field {
            RecordField::Division => &form.division,
            RecordField::Profession => &form.profession,
            RecordField::Factors => &form.factors,
            RecordField::Typework => &form.typework,
            _ => &form.diagnosis,
        };
        if !current.is_empty() {
            continue;
        }
        show_candidates(&unique_values(records, field, org));
        let value = prompt_text(label, "", true)?;
        match field {
            RecordField::Division => form.division = value,
            RecordField::Profession => form.profession = value,
            RecordField::Factors => form.factors = value,
            RecordField::Typework => form.typework = value,
            _ => form.diagnosis = value,
        }
    }

    if form.sex.is_none() {
        let guessed = form.resolved_sex();
        let answer = prompt_text("Пол (М/Ж)", guessed.as_str(), true)?;
        form.sex = Some(answer.parse().unwrap_or(guessed));
    }
    Ok(())
}
