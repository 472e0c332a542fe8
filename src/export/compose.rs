//! 結論書の出力（個別ファイル / 1ファイルへの追記）
//!
//! 追記時は既存ファイルを開いて本文末尾（sectPr の前）に改ページ＋新しい本文を足し、
//! 一時ファイル経由で置き換える。テンプレートが同じ前提なので styles 等はそのまま。

use super::docx::DocxPackage;
use crate::error::{MedoctorError, Result};
use crate::io::write_atomic;
use std::path::Path;

const BODY_OPEN: &str = "<w:body>";
const BODY_CLOSE: &str = "</w:body>";
const PAGE_BREAK: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

/// 追記の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Created,
    Appended,
}

/// `<w:body>` の中身の範囲
fn body_bounds(xml: &str) -> Result<(usize, usize)> {
    let start = xml
        .find(BODY_OPEN)
        .map(|i| i + BODY_OPEN.len())
        .ok_or_else(|| MedoctorError::Document("нет <w:body>".into()))?;
    let end = xml
        .rfind(BODY_CLOSE)
        .filter(|&e| e >= start)
        .ok_or_else(|| MedoctorError::Document("нет </w:body>".into()))?;
    Ok((start, end))
}

/// 本文直下の sectPr の開始位置（段落内のものは除く）
fn body_sect_pr(body: &str) -> Option<usize> {
    let idx = body.rfind("<w:sectPr")?;
    if body[idx..].contains("</w:p>") {
        None
    } else {
        Some(idx)
    }
}

/// master の本文末尾に addition の本文を追加
pub fn append_body(master_xml: &str, addition_xml: &str) -> Result<String> {
    let (add_start, add_end) = body_bounds(addition_xml)?;
    let addition = &addition_xml[add_start..add_end];
    let addition = match body_sect_pr(addition) {
        Some(idx) => &addition[..idx],
        None => addition,
    };

    let (start, end) = body_bounds(master_xml)?;
    let insert_at = body_sect_pr(&master_xml[start..end])
        .map(|idx| start + idx)
        .unwrap_or(end);

    let mut out = String::with_capacity(master_xml.len() + addition.len() + PAGE_BREAK.len());
    out.push_str(&master_xml[..insert_at]);
    out.push_str(PAGE_BREAK);
    out.push_str(addition);
    out.push_str(&master_xml[insert_at..]);
    Ok(out)
}

/// 個別ファイルとして保存
pub fn write_standalone(package: &DocxPackage, path: &Path) -> Result<()> {
    write_atomic(path, &package.to_bytes()?)
}

/// まとめファイルに追記（無ければ新規作成）
pub fn append_to_combined(package: &DocxPackage, combined: &Path) -> Result<AppendOutcome> {
    if !combined.exists() {
        write_atomic(combined, &package.to_bytes()?)?;
        return Ok(AppendOutcome::Created);
    }

    let mut master = DocxPackage::open(combined)?;
    let merged = append_body(master.document_xml()?, package.document_xml()?)?;
    master.set_document_xml(merged);
    write_atomic(combined, &master.to_bytes()?)?;
    Ok(AppendOutcome::Appended)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECT: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#;

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?><w:document xmlns:w="x"><w:body>{}{}</w:body></w:document>"#,
            body, SECT
        )
    }

    #[test]
    fn test_append_before_sect_pr() {
        let master = doc("<w:p><w:r><w:t>A</w:t></w:r></w:p>");
        let addition = doc("<w:p><w:r><w:t>B</w:t></w:r></w:p>");
        let merged = append_body(&master, &addition).unwrap();

        let a = merged.find(">A<").unwrap();
        let brk = merged.find(PAGE_BREAK).unwrap();
        let b = merged.find(">B<").unwrap();
        let sect = merged.find("<w:sectPr").unwrap();
        assert!(a < brk && brk < b && b < sect);
        assert_eq!(merged.matches("<w:sectPr").count(), 1);
        assert!(merged.ends_with("</w:body></w:document>"));
    }

    #[test]
    fn test_append_without_sect_pr() {
        let master = "<w:document><w:body><w:p/></w:body></w:document>";
        let addition = "<w:document><w:body><w:p><w:r><w:t>B</w:t></w:r></w:p></w:body></w:document>";
        let merged = append_body(master, addition).unwrap();
        assert!(merged.ends_with(r#"<w:t>B</w:t></w:r></w:p></w:body></w:document>"#));
    }

    #[test]
    fn test_paragraph_level_sect_pr_is_kept() {
        let addition = r#"<w:body><w:p><w:pPr><w:sectPr/></w:pPr></w:p><w:p><w:r><w:t>B</w:t></w:r></w:p></w:body>"#;
        let merged = append_body("<w:body></w:body>", addition).unwrap();
        assert!(merged.contains("<w:pPr><w:sectPr/></w:pPr>"));
        assert!(merged.contains(">B<"));
    }

    #[test]
    fn test_missing_body() {
        let err = append_body("<w:document/>", &doc("")).unwrap_err();
        assert!(matches!(err, MedoctorError::Document(_)));
    }
}
