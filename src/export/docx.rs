//! Word（docx）テンプレートの差し込み
//!
//! docx は zip パッケージ。本文 `word/document.xml` の段落（表のセル内を含む）を走査し、
//! `{name}` 形式のプレースホルダーを太字のテキストに置き換える。
//! Word はプレースホルダーを複数の run に分割することがあるため、段落単位で文字列を連結して判定する。

use crate::error::{MedoctorError, Result};
use quick_xml::escape::{escape, unescape};
use regex::Regex;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCUMENT_PART: &str = "word/document.xml";

const PARAGRAPH_CLOSE: &str = "</w:p>";

lazy_static::lazy_static! {
    static ref PARAGRAPH_OPEN_RE: Regex = Regex::new(r"<w:p(?:\s[^>/]*)?>").unwrap();
    static ref PPR_RE: Regex = Regex::new(r"(?s)<w:pPr>.*?</w:pPr>").unwrap();
    static ref RPR_RE: Regex = Regex::new(r"(?s)<w:rPr>(.*?)</w:rPr>").unwrap();
    static ref BOLD_RE: Regex = Regex::new(r"<w:b(?:\s[^>]*)?/>").unwrap();
    // テキスト・タブ・改行（段落プロパティ内の <w:tab w:val=…/> は対象外）
    static ref RUN_CONTENT_RE: Regex =
        Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br(?:\s[^>]*)?/>|<w:cr/>").unwrap();
    static ref TOKEN_RE: Regex = Regex::new(r"\{[^{}]*\}").unwrap();
}

/// プレースホルダー → 差し込む文字列
#[derive(Debug, Clone, Default)]
pub struct Placeholders(BTreeMap<String, String>);

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key` は波括弧なしでも可（`name` → `{name}`）
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let key = if key.starts_with('{') {
            key.to_string()
        } else {
            format!("{{{}}}", key)
        };
        self.0.insert(key, value.into());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.0.get(token).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 内側に段落を含まない段落の範囲（テキストボックス内の段落はこちらで拾う）
fn innermost_paragraphs(xml: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while let Some(open) = PARAGRAPH_OPEN_RE.find_at(xml, pos) {
        let Some(close) = xml[open.end()..].find(PARAGRAPH_CLOSE).map(|i| open.end() + i) else {
            break;
        };
        match PARAGRAPH_OPEN_RE.find_at(xml, open.end()) {
            Some(inner) if inner.start() < close => pos = inner.start(),
            _ => {
                let end = close + PARAGRAPH_CLOSE.len();
                spans.push((open.start(), end));
                pos = end;
            }
        }
    }
    spans
}

/// 段落の表示テキスト（タブは \t、改行は \n）
fn paragraph_text(paragraph: &str) -> String {
    let mut text = String::new();
    for caps in RUN_CONTENT_RE.captures_iter(paragraph) {
        match caps.get(1) {
            Some(raw) => match unescape(raw.as_str()) {
                Ok(value) => text.push_str(&value),
                Err(_) => text.push_str(raw.as_str()),
            },
            None if caps[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text
}

fn run_xml(base_rpr: &str, text: &str, bold: bool) -> String {
    let rpr = if bold {
        format!("<w:rPr>{}<w:b/></w:rPr>", BOLD_RE.replace_all(base_rpr, ""))
    } else if base_rpr.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{}</w:rPr>", base_rpr)
    };

    let mut content = String::new();
    let mut segment = String::new();
    let flush = |content: &mut String, segment: &mut String| {
        if !segment.is_empty() {
            content.push_str(&format!(
                r#"<w:t xml:space="preserve">{}</w:t>"#,
                escape(segment.as_str())
            ));
            segment.clear();
        }
    };
    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(&mut content, &mut segment);
                content.push_str("<w:tab/>");
            }
            '\n' => {
                flush(&mut content, &mut segment);
                content.push_str("<w:br/>");
            }
            _ => segment.push(ch),
        }
    }
    flush(&mut content, &mut segment);

    format!("<w:r>{}{}</w:r>", rpr, content)
}

/// 1段落を置換。対象のプレースホルダーが無ければ None
fn fill_paragraph(paragraph: &str, values: &Placeholders) -> Option<String> {
    let text = paragraph_text(paragraph);
    if !TOKEN_RE
        .find_iter(&text)
        .any(|m| values.get(m.as_str()).is_some())
    {
        return None;
    }

    let open = PARAGRAPH_OPEN_RE.find(paragraph).filter(|m| m.start() == 0)?.as_str();
    let (ppr, body) = match PPR_RE.find(paragraph) {
        Some(m) => (m.as_str(), &paragraph[m.end()..]),
        None => ("", &paragraph[open.len()..]),
    };
    // 最初の run の書式を引き継ぐ
    let base_rpr = RPR_RE
        .captures(body)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let mut out = String::with_capacity(paragraph.len());
    out.push_str(open);
    out.push_str(ppr);

    let mut plain = String::new();
    let mut last = 0;
    for m in TOKEN_RE.find_iter(&text) {
        plain.push_str(&text[last..m.start()]);
        match values.get(m.as_str()) {
            Some(value) => {
                if !plain.is_empty() {
                    out.push_str(&run_xml(&base_rpr, &plain, false));
                    plain.clear();
                }
                out.push_str(&run_xml(&base_rpr, value, true));
            }
            None => plain.push_str(m.as_str()),
        }
        last = m.end();
    }
    plain.push_str(&text[last..]);
    if !plain.is_empty() {
        out.push_str(&run_xml(&base_rpr, &plain, false));
    }
    out.push_str(PARAGRAPH_CLOSE);
    Some(out)
}

/// document.xml 全体を置換
pub fn fill_placeholders(document_xml: &str, values: &Placeholders) -> String {
    let mut out = String::with_capacity(document_xml.len());
    let mut last = 0;
    for (start, end) in innermost_paragraphs(document_xml) {
        let paragraph = &document_xml[start..end];
        if let Some(filled) = fill_paragraph(paragraph, values) {
            out.push_str(&document_xml[last..start]);
            out.push_str(&filled);
            last = end;
        }
    }
    out.push_str(&document_xml[last..]);
    out
}

/// document.xml の表示テキスト（段落ごとに改行）
pub fn document_text(document_xml: &str) -> String {
    innermost_paragraphs(document_xml)
        .into_iter()
        .map(|(start, end)| paragraph_text(&document_xml[start..end]))
        .collect::<Vec<_>>()
        .join("\n")
}

/// docx パッケージ（エントリ順を保持）
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MedoctorError::FileNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
            .map_err(|e| MedoctorError::Document(format!("{}: {}", path.display(), e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| MedoctorError::Document(e.to_string()))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| MedoctorError::Document(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((file.name().to_string(), data));
        }
        let package = Self { entries };
        package.document_xml()?;
        Ok(package)
    }

    /// 任意のエントリから組み立て（テスト・新規作成用）
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self { entries }
    }

    pub fn document_xml(&self) -> Result<&str> {
        let (_, data) = self
            .entries
            .iter()
            .find(|(name, _)| name == DOCUMENT_PART)
            .ok_or_else(|| MedoctorError::Document(format!("нет {}", DOCUMENT_PART)))?;
        std::str::from_utf8(data).map_err(|e| MedoctorError::Document(e.to_string()))
    }

    pub fn set_document_xml(&mut self, xml: String) {
        match self.entries.iter_mut().find(|(name, _)| name == DOCUMENT_PART) {
            Some((_, data)) => *data = xml.into_bytes(),
            None => self.entries.push((DOCUMENT_PART.to_string(), xml.into_bytes())),
        }
    }

    pub fn text(&self) -> Result<String> {
        Ok(document_text(self.document_xml()?))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)
                .map_err(|e| MedoctorError::Document(e.to_string()))?;
            zip.write_all(data)?;
        }
        let cursor = zip
            .finish()
            .map_err(|e| MedoctorError::Document(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// テンプレートを開いて差し込み済みパッケージを返す
pub fn render_template(template: &Path, values: &Placeholders) -> Result<DocxPackage> {
    let mut package = DocxPackage::open(template)?;
    let filled = fill_placeholders(package.document_xml()?, values);
    package.set_document_xml(filled);
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Placeholders {
        let mut v = Placeholders::new();
        v.insert("name", "Иванов И.И.");
        v.insert("{organization}", "ООО \"Ромашка\" & Ко");
        v
    }

    #[test]
    fn test_placeholder_in_single_run() {
        let xml = r#"<w:body><w:p><w:r><w:t>{name}</w:t></w:r></w:p></w:body>"#;
        let out = fill_placeholders(xml, &values());
        assert!(out.contains("<w:b/>"));
        assert_eq!(document_text(&out), "Иванов И.И.");
    }

    #[test]
    fn test_placeholder_split_across_runs() {
        let xml = r#"<w:p w:rsidR="00AB"><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:sz w:val="24"/></w:rPr><w:t xml:space="preserve">ФИО: {na</w:t></w:r><w:r><w:t>me} г.р.</w:t></w:r></w:p>"#;
        let out = fill_placeholders(xml, &values());
        assert!(out.starts_with(r#"<w:p w:rsidR="00AB"><w:pPr><w:jc w:val="center"/></w:pPr>"#));
        assert_eq!(document_text(&out), "ФИО: Иванов И.И. г.р.");
        assert!(out.contains(r#"<w:rPr><w:sz w:val="24"/><w:b/></w:rPr>"#));
    }

    #[test]
    fn test_values_are_escaped() {
        let xml = r#"<w:p><w:r><w:t>{organization}</w:t></w:r></w:p>"#;
        let out = fill_placeholders(xml, &values());
        assert!(out.contains("ООО &quot;Ромашка&quot; &amp; Ко"));
        assert_eq!(document_text(&out), "ООО \"Ромашка\" & Ко");
    }

    #[test]
    fn test_untouched_paragraphs() {
        let xml = r#"<w:p><w:r><w:t>Заключение</w:t></w:r></w:p><w:p><w:r><w:t>{unknown}</w:t></w:r></w:p><w:p/>"#;
        assert_eq!(fill_placeholders(xml, &values()), xml);
    }

    #[test]
    fn test_unknown_token_kept_beside_known() {
        let xml = r#"<w:p><w:r><w:t>{name} / {unknown}</w:t></w:r></w:p>"#;
        let out = fill_placeholders(xml, &values());
        assert_eq!(document_text(&out), "Иванов И.И. / {unknown}");
    }

    #[test]
    fn test_table_cells() {
        let xml = r#"<w:tbl><w:tr><w:tc><w:tcPr/><w:p><w:r><w:t>{name}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#;
        let out = fill_placeholders(xml, &values());
        assert!(out.starts_with("<w:tbl><w:tr><w:tc><w:tcPr/><w:p>"));
        assert_eq!(document_text(&out), "Иванов И.И.");
    }

    #[test]
    fn test_package_round_trip() {
        let package = DocxPackage::from_entries(vec![
            ("[Content_Types].xml".into(), b"<Types/>".to_vec()),
            (DOCUMENT_PART.into(), b"<w:document><w:body/></w:document>".to_vec()),
        ]);
        let bytes = package.to_bytes().unwrap();
        let reopened = DocxPackage::from_bytes(&bytes).unwrap();
        assert_eq!(reopened.document_xml().unwrap(), "<w:document><w:body/></w:document>");
    }

    #[test]
    fn test_package_without_document_part() {
        let package = DocxPackage::from_entries(vec![("a.txt".into(), b"x".to_vec())]);
        let bytes = package.to_bytes().unwrap();
        assert!(matches!(
            DocxPackage::from_bytes(&bytes),
            Err(MedoctorError::Document(_))
        ));
    }

    #[test]
    fn test_tab_and_break_kept() {
        let xml = r#"<w:p><w:r><w:t>ФИО:</w:t></w:r><w:r><w:tab/></w:r><w:r><w:t>{name}</w:t></w:r><w:r><w:br/><w:t>г.р.</w:t></w:r></w:p>"#;
        let out = fill_placeholders(xml, &values());
        assert_eq!(document_text(&out), "ФИО:\tИванов И.И.\nг.р.");
        assert!(out.contains("<w:tab/>"));
        assert!(out.contains("<w:br/>"));
        assert!(!out.contains("{name}"));
    }

    #[test]
    fn test_paragraph_tab_stops_are_not_text() {
        let xml = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="2835"/></w:tabs></w:pPr><w:r><w:t>{name}</w:t></w:r></w:p>"#;
        let out = fill_placeholders(xml, &values());
        assert!(out.starts_with(r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="2835"/></w:tabs></w:pPr>"#));
        assert_eq!(document_text(&out), "Иванов И.И.");
    }

    #[test]
    fn test_text_box_paragraph() {
        let xml = r#"<w:p><w:r><w:t>Печать: </w:t></w:r><w:r><w:drawing><wps:txbx><w:txbxContent><w:p><w:r><w:t>{name}</w:t></w:r></w:p></w:txbxContent></wps:txbx></w:drawing></w:r></w:p><w:p><w:r><w:t>{organization}</w:t></w:r></w:p>"#;
        let out = fill_placeholders(xml, &values());
        assert_eq!(out.matches("<w:p>").count(), out.matches("</w:p>").count());
        assert!(out.starts_with("<w:p><w:r><w:t>Печать: </w:t></w:r><w:r><w:drawing><wps:txbx><w:txbxContent><w:p>"));
        assert!(out.contains("</w:txbxContent></wps:txbx></w:drawing></w:r></w:p>"));
        assert_eq!(
            document_text(&out),
            "Иванов И.И.\nООО \"Ромашка\" & Ко"
        );
    }

    #[test]
    fn test_numeric_character_reference() {
        let xml = r#"<w:p><w:r><w:t>№&#160;{name}</w:t></w:r></w:p>"#;
        let out = fill_placeholders(xml, &values());
        assert_eq!(document_text(&out), "№\u{a0}Иванов И.И.");
    }
}
