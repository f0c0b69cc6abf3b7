use super::{FormatHandler, HashStrategy, NormalizedContent};
use dcompare_common::{DCompareError, DocumentFormat};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// `.docx` documents: body paragraph text, one paragraph per line
pub struct WordHandler;

impl FormatHandler for WordHandler {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Word
    }

    fn hash_strategy(&self) -> HashStrategy {
        HashStrategy::Semantic
    }

    fn read(&self, path: &Path) -> Result<NormalizedContent, DCompareError> {
        let label = self.format().label();
        let file = File::open(path).map_err(|e| DCompareError::read(path, label, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| DCompareError::read(path, label, e))?;

        let mut xml = Vec::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| DCompareError::read(path, label, e))?
            .read_to_end(&mut xml)
            .map_err(|e| DCompareError::read(path, label, e))?;

        let paragraphs = extract_paragraphs(&xml).map_err(|e| DCompareError::read(path, label, e))?;
        Ok(NormalizedContent::Text(paragraphs.join("\n")))
    }
}

/// Text of every paragraph directly under `w:body`, in document order.
///
/// Run text is concatenated; `w:tab` becomes a tab and `w:br`/`w:cr` a
/// newline. Paragraphs nested in tables, headers or text boxes are skipped.
pub fn extract_paragraphs(xml: &[u8]) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    // Stack depth of the open body paragraph, if any
    let mut paragraph: Option<(usize, String)> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                let parent = stack.last().map(Vec::as_slice);

                if name == b"t" && parent == Some(b"r".as_slice()) {
                    // Consumes the matching end tag
                    let raw = reader.read_text(e.name())?;
                    let text = quick_xml::escape::unescape(&raw)?;
                    if let Some((_, current)) = paragraph.as_mut() {
                        current.push_str(&text);
                    }
                } else {
                    if name == b"p" && parent == Some(b"body".as_slice()) && paragraph.is_none() {
                        paragraph = Some((stack.len(), String::new()));
                    } else if let Some((_, current)) = paragraph.as_mut() {
                        push_run_break(current, &name, parent);
                    }
                    stack.push(name);
                }
            }
            Event::Empty(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                let parent = stack.last().map(Vec::as_slice);

                if name == b"p" && parent == Some(b"body".as_slice()) && paragraph.is_none() {
                    paragraphs.push(String::new());
                } else if let Some((_, current)) = paragraph.as_mut() {
                    push_run_break(current, name, parent);
                }
            }
            Event::End(_) => {
                stack.pop();
                if matches!(paragraph, Some((depth, _)) if depth == stack.len()) {
                    if let Some((_, text)) = paragraph.take() {
                        paragraphs.push(text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn push_run_break(current: &mut String, name: &[u8], parent: Option<&[u8]>) {
    if parent != Some(b"r".as_slice()) {
        return;
    }
    match name {
        b"tab" => current.push('\t'),
        b"br" | b"cr" => current.push('\n'),
        _ => {}
    }
}
