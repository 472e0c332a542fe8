//! data.xml（受診者レコード）の読み書き
//!
//! ```text
//! <data>
//!   <person>
//!     <organization>…</organization>
//!     …
//!   </person>
//! </data>
//! ```
//!
//! 追記のたびに全件を整形して書き直す。

use crate::error::{MedoctorError, Result};
use crate::io::write_atomic;
use medoctor_common::PersonRecord;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::{Path, PathBuf};

/// `<person>` 内の要素名（書き出し順）
const FIELD_TAGS: &[&str] = &[
    "organization",
    "name",
    "birthday",
    "sex",
    "division",
    "profession",
    "factors",
    "typework",
    "diagnosis",
    "ids_date",
    "id",
    "date_created",
];

fn field_mut<'a>(record: &'a mut PersonRecord, tag: &[u8]) -> Option<&'a mut String> {
    let field = match tag {
        b"organization" => &mut record.organization,
        b"name" => &mut record.name,
        b"birthday" => &mut record.birthday,
        b"sex" => &mut record.sex,
        b"division" => &mut record.division,
        b"profession" => &mut record.profession,
        b"factors" => &mut record.factors,
        b"typework" => &mut record.typework,
        b"diagnosis" => &mut record.diagnosis,
        b"ids_date" => &mut record.ids_date,
        b"id" => &mut record.id,
        b"date_created" => &mut record.created_at,
        _ => return None,
    };
    Some(field)
}

fn field_value<'a>(record: &'a PersonRecord, tag: &str) -> &'a str {
    match tag {
        "organization" => &record.organization,
        "name" => &record.name,
        "birthday" => &record.birthday,
        "sex" => &record.sex,
        "division" => &record.division,
        "profession" => &record.profession,
        "factors" => &record.factors,
        "typework" => &record.typework,
        "diagnosis" => &record.diagnosis,
        "ids_date" => &record.ids_date,
        "id" => &record.id,
        "date_created" => &record.created_at,
        _ => "",
    }
}

/// 全レコードを整形済みXMLに
pub fn build_xml(records: &[PersonRecord]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    xml.push('\n');
    xml.push_str("<data>\n");

    for record in records {
        xml.push_str("  <person>\n");
        for tag in FIELD_TAGS {
            let value = field_value(record, tag);
            if value.is_empty() {
                xml.push_str(&format!("    <{}/>\n", tag));
            } else {
                xml.push_str(&format!("    <{tag}>{}</{tag}>\n", escape(value)));
            }
        }
        xml.push_str("  </person>\n");
    }

    xml.push_str("</data>\n");
    xml
}

/// XML文字列からレコードを読む（未知の要素は無視）
pub fn parse_xml(content: &str) -> Result<Vec<PersonRecord>> {
    let mut reader = Reader::from_str(content);
    let mut records = Vec::new();
    let mut current: Option<PersonRecord> = None;
    let mut field: Option<Vec<u8>> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MedoctorError::RecordStore(format!("позиция {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                if name == b"person" {
                    current = Some(PersonRecord::default());
                } else if current.is_some() {
                    field = Some(name);
                }
            }
            Event::Text(t) => {
                if let (Some(record), Some(tag)) = (current.as_mut(), field.as_deref()) {
                    let text = t
                        .unescape()
                        .map_err(|e| MedoctorError::RecordStore(e.to_string()))?;
                    if let Some(value) = field_mut(record, tag) {
                        value.push_str(&text);
                    }
                }
            }
            Event::CData(c) => {
                if let (Some(record), Some(tag)) = (current.as_mut(), field.as_deref()) {
                    if let Some(value) = field_mut(record, tag) {
                        value.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"person" {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

/// レコードストア
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 全件読み込み。ファイルが無ければ空
    pub fn load(&self) -> Result<Vec<PersonRecord>> {
        if !self.path.exists() {
            tracing::debug!("record store not found: {}", self.path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let content = content.trim_start_matches('\u{feff}');
        let records = parse_xml(content)?;
        tracing::debug!("loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// 1件追記（全件を書き直す）
    pub fn append(&self, record: &PersonRecord) -> Result<()> {
        let mut records = self.load()?;
        records.push(record.clone());
        write_atomic(&self.path, build_xml(&records).as_bytes())?;
        tracing::info!("record appended: {} / {}", record.organization, record.name);
        Ok(())
    }
}
