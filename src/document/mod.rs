// Document model and format handlers
//
// A document is an ordered set of text units that can be translated in place:
// - docx: Word packages, rewritten part-by-part so layout survives
// - text: plain UTF-8 files, one unit per line
// - pdf: text extraction only; PDFs are converted to DOCX before translation

pub mod docx;
pub mod pdf;
pub mod text;

use std::fmt;
use std::path::Path;

use crate::error::{Result, TransdocError};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Docx,
    Pdf,
    Text,
}

impl DocumentKind {
    /// Resolve a declared content type (parameters such as `charset` are ignored)
    pub fn from_mime(content_type: &str) -> Result<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match essence.as_str() {
            MIME_PDF => Ok(Self::Pdf),
            MIME_DOCX => Ok(Self::Docx),
            MIME_TEXT => Ok(Self::Text),
            _ => Err(TransdocError::UnsupportedFormat(content_type.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Text),
            _ => Err(TransdocError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Declared content type wins over the file extension
    pub fn resolve(path: &Path, content_type: Option<&str>) -> Result<Self> {
        match content_type {
            Some(mime) => Self::from_mime(mime),
            None => Self::from_path(path),
        }
    }

    /// Extension of the translated output. PDFs come out as DOCX.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Self::Docx | Self::Pdf => "docx",
            Self::Text => "txt",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Docx => MIME_DOCX,
            Self::Pdf => MIME_PDF,
            Self::Text => MIME_TEXT,
        }
    }
}

/// Independently styled span of a paragraph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn from_text<S: Into<String>>(text: S) -> Self {
        Self {
            runs: vec![Run { text: text.into() }],
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCell {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

/// Stable address of a text unit. Translation never moves a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitPosition {
    Paragraph(usize),
    Cell { table: usize, row: usize, cell: usize },
}

impl fmt::Display for UnitPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paragraph(index) => write!(f, "paragraph {}", index + 1),
            Self::Cell { table, row, cell } => {
                write!(f, "table {} row {} cell {}", table + 1, row + 1, cell + 1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub position: UnitPosition,
    pub text: String,
}

/// Format-specific state needed to write the document back out
#[derive(Debug, Clone)]
enum Source {
    Docx(docx::DocxPackage),
    Text(text::TextLayout),
}

/// A loaded document: body paragraphs and tables in document order
#[derive(Debug, Clone)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
    source: Source,
}

impl Document {
    /// Parse document bytes. PDFs have to be converted to DOCX first.
    pub fn load(bytes: &[u8], kind: DocumentKind) -> Result<Self> {
        match kind {
            DocumentKind::Docx => Self::from_docx(bytes),
            DocumentKind::Text => Self::from_text(bytes),
            DocumentKind::Pdf => Err(TransdocError::UnsupportedFormat(
                "PDF documents must be converted to DOCX before loading".to_string(),
            )),
        }
    }

    pub fn from_docx(bytes: &[u8]) -> Result<Self> {
        let (package, paragraphs, tables) = docx::parse(bytes)?;
        Ok(Self {
            paragraphs,
            tables,
            source: Source::Docx(package),
        })
    }

    pub fn from_text(bytes: &[u8]) -> Result<Self> {
        let (layout, paragraphs) = text::parse(bytes)?;
        Ok(Self {
            paragraphs,
            tables: Vec::new(),
            source: Source::Text(layout),
        })
    }

    pub fn kind(&self) -> DocumentKind {
        match self.source {
            Source::Docx(_) => DocumentKind::Docx,
            Source::Text(_) => DocumentKind::Text,
        }
    }

    /// Serialize the document in its original format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match &self.source {
            Source::Docx(package) => docx::write(package, &self.paragraphs, &self.tables),
            Source::Text(layout) => Ok(text::write(layout, &self.paragraphs)),
        }
    }

    /// All text units: paragraphs first, then table cells row by row
    pub fn units(&self) -> Vec<TextUnit> {
        let mut units: Vec<TextUnit> = self
            .paragraphs
            .iter()
            .enumerate()
            .map(|(i, p)| TextUnit {
                position: UnitPosition::Paragraph(i),
                text: p.text(),
            })
            .collect();

        for (t, table) in self.tables.iter().enumerate() {
            for (r, row) in table.rows.iter().enumerate() {
                for (c, cell) in row.cells.iter().enumerate() {
                    units.push(TextUnit {
                        position: UnitPosition::Cell { table: t, row: r, cell: c },
                        text: cell.text.clone(),
                    });
                }
            }
        }

        units
    }

    pub fn text_at(&self, position: UnitPosition) -> Option<String> {
        match position {
            UnitPosition::Paragraph(i) => self.paragraphs.get(i).map(Paragraph::text),
            UnitPosition::Cell { table, row, cell } => self
                .tables
                .get(table)
                .and_then(|t| t.rows.get(row))
                .and_then(|r| r.cells.get(cell))
                .map(|c| c.text.clone()),
        }
    }

    /// Number of rows across all tables
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    /// Plain text rendering, one unit per line
    pub fn plain_text(&self) -> String {
        self.units()
            .into_iter()
            .map(|u| u.text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// First `limit` characters of a document's text, for previews
pub fn extract_preview(bytes: &[u8], kind: DocumentKind, limit: usize) -> Result<String> {
    let text = match kind {
        DocumentKind::Pdf => pdf::extract_text(bytes)?,
        DocumentKind::Docx | DocumentKind::Text => Document::load(bytes, kind)?.plain_text(),
    };
    Ok(text.chars().take(limit).collect())
}
