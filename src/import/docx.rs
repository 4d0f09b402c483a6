//! Office Open XML (`.docx`) body reader.
//!
//! A `.docx` file is a ZIP container. The package relationships in
//! `_rels/.rels` name the main document part (almost always
//! `word/document.xml`), whose `w:body` holds the paragraphs we paginate.

use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use crate::error::ParseError;
use crate::util::decode_text;

const DEFAULT_MAIN_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// One paragraph of body text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Paragraph {
    pub text: String,
    /// The paragraph ends the current page once its text is added.
    pub page_break: bool,
}

/// What the structural walk found in the main document part.
#[derive(Debug, Default)]
pub(crate) struct DocumentBody {
    /// Paragraphs in document order.
    pub paragraphs: Vec<Paragraph>,
    /// Every `w:t` text run in document order, used when there are no
    /// paragraphs at all.
    pub text_runs: Vec<String>,
}

/// Open a `.docx` container and walk its main document part.
pub(crate) fn read_docx<R: Read + Seek>(reader: R) -> Result<DocumentBody, ParseError> {
    let mut archive = ZipArchive::new(reader)?;

    let main_part = find_main_part(&mut archive).unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());
    let bytes = match read_archive_file_bytes(&mut archive, &main_part) {
        Ok(bytes) => bytes,
        Err(ParseError::MalformedDocument(_)) if main_part != DEFAULT_MAIN_PART => {
            read_archive_file_bytes(&mut archive, DEFAULT_MAIN_PART)?
        }
        Err(e) => return Err(e),
    };

    let xml = decode_text(&bytes, None);
    parse_document_xml(&xml)
}

/// Resolve the main document part from the package relationships.
fn find_main_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let bytes = read_archive_file_bytes(archive, "_rels/.rels").ok()?;
    let rels = decode_text(&bytes, None);

    let mut reader = Reader::from_str(&rels);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let rel_type = attr_value(&e, b"Type");
                let target = attr_value(&e, b"Target");
                if let (Some(rel_type), Some(target)) = (rel_type, target)
                    && rel_type.ends_with(OFFICE_DOCUMENT_REL)
                {
                    return Some(target.trim_start_matches('/').to_string());
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>, ParseError> {
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)
                .map_err(|e| ParseError::Container(format!("failed to read {path}: {e}")))?;
            Ok(contents)
        }
        Err(zip::result::ZipError::FileNotFound) => Err(ParseError::MalformedDocument(format!(
            "document part {path} is missing"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Walk WordprocessingML and collect paragraphs and text runs.
pub(crate) fn parse_document_xml(xml: &str) -> Result<DocumentBody, ParseError> {
    let mut reader = Reader::from_str(xml);
    // Run text is whitespace-sensitive (xml:space="preserve")
    reader.config_mut().trim_text(false);

    let mut body = DocumentBody::default();
    let mut saw_body = false;

    // Indexes into `body.paragraphs` of the paragraphs currently open.
    // Paragraphs nest inside text boxes.
    let mut open: Vec<usize> = Vec::new();
    let mut in_text = false;
    let mut in_props = false;
    let mut fallback_depth = 0usize;
    let mut run_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if fallback_depth > 0 {
                    if local == b"Fallback" {
                        fallback_depth += 1;
                    }
                    continue;
                }

                match local {
                    b"body" => saw_body = true,
                    b"p" => {
                        open.push(body.paragraphs.len());
                        body.paragraphs.push(Paragraph::default());
                    }
                    b"pPr" => in_props = true,
                    b"t" => {
                        in_text = true;
                        run_text.clear();
                    }
                    // mc:AlternateContent repeats the mc:Choice content for old readers
                    b"Fallback" => fallback_depth = 1,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if fallback_depth > 0 {
                    continue;
                }
                let name = e.name();

                match local_name(name.as_ref()) {
                    b"body" => saw_body = true,
                    b"p" => body.paragraphs.push(Paragraph::default()),
                    b"pageBreakBefore" if in_props && is_on(&e) => {
                        if let Some(&idx) = open.last() {
                            body.paragraphs[idx].page_break = true;
                        }
                    }
                    b"br" if !in_props => {
                        let Some(&idx) = open.last() else { continue };
                        if attr_value(&e, b"type").as_deref() == Some("page") {
                            // Text before the break closes the page; the rest
                            // of the paragraph starts the next one.
                            body.paragraphs[idx].page_break = true;
                            let next = body.paragraphs.len();
                            body.paragraphs.push(Paragraph::default());
                            if let Some(top) = open.last_mut() {
                                *top = next;
                            }
                        } else {
                            body.paragraphs[idx].text.push('\n');
                        }
                    }
                    b"tab" if !in_props => {
                        if let Some(&idx) = open.last() {
                            body.paragraphs[idx].text.push(' ');
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && fallback_depth == 0 {
                    run_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text && fallback_depth == 0 {
                    if let Ok(Some(ch)) = e.resolve_char_ref() {
                        run_text.push(ch);
                    } else {
                        let entity = String::from_utf8_lossy(e.as_ref());
                        run_text.push_str(match entity.as_ref() {
                            "apos" => "'",
                            "quot" => "\"",
                            "lt" => "<",
                            "gt" => ">",
                            "amp" => "&",
                            _ => "",
                        });
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if fallback_depth > 0 {
                    if local == b"Fallback" {
                        fallback_depth -= 1;
                    }
                    continue;
                }

                match local {
                    b"t" => {
                        in_text = false;
                        if let Some(&idx) = open.last() {
                            body.paragraphs[idx].text.push_str(&run_text);
                        }
                        body.text_runs.push(std::mem::take(&mut run_text));
                    }
                    b"pPr" => in_props = false,
                    b"p" => {
                        open.pop();
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    if !saw_body {
        return Err(ParseError::MalformedDocument(
            "document part has no w:body".into(),
        ));
    }

    Ok(body)
}

/// Boolean OOXML property: present and not switched off by `w:val`.
fn is_on(e: &BytesStart<'_>) -> bool {
    !matches!(
        attr_value(e, b"val").as_deref(),
        Some("0") | Some("false") | Some("off")
    )
}

/// Look up an attribute by local name, ignoring its namespace prefix.
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .map(|attr| String::from_utf8_lossy(attr.value.as_ref()).into_owned())
}

/// Strip a namespace prefix: `w:p` -> `p`.
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
