#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use zip::write::FileOptions;
use zip::ZipWriter;

use transdoc::error::{Result, TransdocError};
use transdoc::translate::Translator;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Texts a translator double has been asked to translate, in call order
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Prefixes every chunk with `[<target>] `
pub struct TaggingTranslator {
    pub log: CallLog,
}

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        self.log.record(text);
        Ok(format!("[{}] {}", target, text))
    }
}

/// Rejects every chunk
pub struct FailingTranslator {
    pub log: CallLog,
}

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
        self.log.record(text);
        Err(TransdocError::Translation("service unavailable".to_string()))
    }
}

pub fn tagging() -> (Box<dyn Translator>, CallLog) {
    let log = CallLog::default();
    (Box::new(TaggingTranslator { log: log.clone() }), log)
}

pub fn failing() -> (Box<dyn Translator>, CallLog) {
    let log = CallLog::default();
    (Box::new(FailingTranslator { log: log.clone() }), log)
}

/// `<w:p>` with one run per entry; an empty slice gives an empty paragraph
pub fn paragraph(runs: &[&str]) -> String {
    if runs.is_empty() {
        return "<w:p/>".to_string();
    }
    let runs: String = runs
        .iter()
        .map(|text| format!("<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>", escape(text)))
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

/// `<w:tbl>` with one single-paragraph cell per entry
pub fn table(rows: &[&[&str]]) -> String {
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|text| format!("<w:tc>{}</w:tc>", paragraph(&[*text])))
                .collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    format!("<w:tbl>{}</w:tbl>", rows)
}

/// Minimal Word package around `body`
pub fn docx(body: &str) -> Vec<u8> {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        W_NS, body
    );

    let mut out = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    out.start_file("[Content_Types].xml", options).unwrap();
    out.write_all(b"<Types/>").unwrap();
    out.start_file("word/document.xml", options).unwrap();
    out.write_all(xml.as_bytes()).unwrap();
    out.start_file("word/styles.xml", options).unwrap();
    out.write_all(b"<w:styles/>").unwrap();
    out.finish().unwrap().into_inner()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
