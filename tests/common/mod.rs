//! Helpers for building Word documents in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

const DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_TAIL: &str = "</w:body></w:document>";

/// Escape text for use inside `w:t`.
pub fn xml_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A paragraph holding one run of text.
pub fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        xml_text(text)
    )
}

/// A paragraph whose text is followed by a hard page break.
pub fn paragraph_with_break(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t><w:br w:type="page"/></w:r></w:p>"#,
        xml_text(text)
    )
}

/// Zip a `word/document.xml` body made of the given paragraph XML.
pub fn docx_from_xml(body: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file("word/document.xml", options)
        .expect("start document part");
    zip.write_all(format!("{DOCUMENT_HEAD}{body}{DOCUMENT_TAIL}").as_bytes())
        .expect("write document part");
    zip.finish().expect("finish zip").into_inner()
}

/// A document with one paragraph per entry.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs.iter().map(|p| paragraph(p)).collect();
    docx_from_xml(&body)
}

/// A legacy `.doc` upload carrying a MIME text part.
pub fn legacy_doc(text: &str) -> Vec<u8> {
    format!("MIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{text}")
        .into_bytes()
}
