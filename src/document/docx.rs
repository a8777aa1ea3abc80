//! WordprocessingML (DOCX) reading and in-place rewriting.
//!
//! Only `word/document.xml` is interpreted. Loading walks its XML events and
//! collects body paragraphs (with their runs) and top-level tables. Saving
//! walks the same events again and swaps the contents of `<w:t>` elements
//! that belong to changed units; every other package part is copied raw.
//! A changed cell is written back line by line into its own paragraphs, so
//! loading the saved package yields the cell text that was written.
//!
//! Both passes share [`Locator`], so a unit is addressed identically when it
//! is read and when it is written back.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Result, TransdocError};
use super::{Paragraph, Run, Table, TableCell, TableRow};

const DOCUMENT_PART: &str = "word/document.xml";

/// Original package bytes plus the text as it was when loaded
#[derive(Debug, Clone)]
pub struct DocxPackage {
    bytes: Vec<u8>,
    document_xml: String,
    original_paragraphs: Vec<Paragraph>,
    original_tables: Vec<Table>,
    cell_layouts: HashMap<CellKey, CellLayout>,
}

/// Table, row and cell index of a top-level table cell
type CellKey = (usize, usize, usize);

/// Shape of a top-level table cell as loaded
#[derive(Debug, Clone, Copy, Default)]
struct CellLayout {
    paragraphs: usize,
    nested_table: bool,
}

/// Structural element the locator just entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landmark {
    Paragraph,
    Run,
    Table,
    Row,
    Cell,
    /// Paragraph directly inside a top-level table cell
    CellParagraph,
    /// `<w:br/>` or `<w:cr/>` inside a top-level cell paragraph
    CellLineBreak,
    /// Table inside a top-level table cell
    NestedTable,
}

/// Owner of the text inside the current `<w:t>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Run { paragraph: usize, run: usize },
    Cell { table: usize, row: usize, cell: usize },
}

/// Tracks where the XML walk currently is. Paragraphs inside tables or text
/// boxes are not body paragraphs, and nested tables belong to no cell.
#[derive(Debug, Default)]
struct Locator {
    textbox_depth: usize,
    table_depth: usize,
    in_paragraph: bool,
    in_run: bool,
    in_text: bool,
    paragraphs: usize,
    runs: usize,
    tables: usize,
    rows: usize,
    cells: usize,
    cell_paragraphs: usize,
}

impl Locator {
    fn enter(&mut self, local: &[u8]) -> Option<Landmark> {
        if local == b"txbxContent" {
            self.textbox_depth += 1;
            return None;
        }
        if self.textbox_depth > 0 {
            return None;
        }

        match local {
            b"tbl" => {
                self.table_depth += 1;
                match self.table_depth {
                    1 => {
                        self.tables += 1;
                        self.rows = 0;
                        Some(Landmark::Table)
                    }
                    2 => Some(Landmark::NestedTable),
                    _ => None,
                }
            }
            b"tr" if self.table_depth == 1 => {
                self.rows += 1;
                self.cells = 0;
                Some(Landmark::Row)
            }
            b"tc" if self.table_depth == 1 => {
                self.cells += 1;
                self.cell_paragraphs = 0;
                Some(Landmark::Cell)
            }
            b"p" => {
                self.in_paragraph = true;
                match self.table_depth {
                    0 => {
                        self.paragraphs += 1;
                        self.runs = 0;
                        Some(Landmark::Paragraph)
                    }
                    1 => {
                        self.cell_paragraphs += 1;
                        Some(Landmark::CellParagraph)
                    }
                    _ => None,
                }
            }
            b"r" if self.in_paragraph && self.table_depth == 0 => {
                self.runs += 1;
                self.in_run = true;
                Some(Landmark::Run)
            }
            b"br" | b"cr" if self.in_paragraph && self.table_depth == 1 => Some(Landmark::CellLineBreak),
            b"t" => {
                self.in_text = true;
                None
            }
            _ => None,
        }
    }

    fn leave(&mut self, local: &[u8]) {
        if local == b"txbxContent" {
            self.textbox_depth = self.textbox_depth.saturating_sub(1);
            return;
        }
        if self.textbox_depth > 0 {
            return;
        }

        match local {
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            b"p" => self.in_paragraph = false,
            b"r" => self.in_run = false,
            b"t" => self.in_text = false,
            _ => {}
        }
    }

    fn cell_key(&self) -> Option<CellKey> {
        (self.tables > 0 && self.rows > 0 && self.cells > 0)
            .then(|| (self.tables - 1, self.rows - 1, self.cells - 1))
    }

    /// Zero-based index of the open paragraph within its top-level cell
    fn cell_paragraph(&self) -> Option<usize> {
        (self.textbox_depth == 0 && self.table_depth == 1 && self.in_paragraph && self.cell_paragraphs > 0)
            .then(|| self.cell_paragraphs - 1)
    }

    fn slot(&self) -> Option<Slot> {
        if self.textbox_depth > 0 || !self.in_text || !self.in_paragraph {
            return None;
        }
        match self.table_depth {
            0 if self.in_run && self.paragraphs > 0 && self.runs > 0 => Some(Slot::Run {
                paragraph: self.paragraphs - 1,
                run: self.runs - 1,
            }),
            1 => self
                .cell_key()
                .map(|(table, row, cell)| Slot::Cell { table, row, cell }),
            _ => None,
        }
    }

    /// Run currently open in a body paragraph
    fn current_run(&self) -> Option<(usize, usize)> {
        (self.textbox_depth == 0
            && self.table_depth == 0
            && self.in_run
            && self.paragraphs > 0
            && self.runs > 0)
            .then(|| (self.paragraphs - 1, self.runs - 1))
    }
}

/// Load a DOCX package
pub fn parse(bytes: &[u8]) -> Result<(DocxPackage, Vec<Paragraph>, Vec<Table>)> {
    let document_xml = read_document_part(bytes)?;
    let (paragraphs, tables, cell_layouts) = collect_units(&document_xml)?;

    let package = DocxPackage {
        bytes: bytes.to_vec(),
        document_xml,
        original_paragraphs: paragraphs.clone(),
        original_tables: tables.clone(),
        cell_layouts,
    };

    Ok((package, paragraphs, tables))
}

/// Serialize the package with the given text units written into it
pub fn write(package: &DocxPackage, paragraphs: &[Paragraph], tables: &[Table]) -> Result<Vec<u8>> {
    let document_xml = rewrite_document_xml(package, paragraphs, tables)?;

    let mut archive = ZipArchive::new(Cursor::new(package.bytes.as_slice()))?;
    let mut out = ZipWriter::new(Cursor::new(Vec::new()));

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.name() == DOCUMENT_PART {
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
            out.start_file(DOCUMENT_PART, options)?;
            out.write_all(document_xml.as_bytes())?;
        } else {
            out.raw_copy_file(entry)?;
        }
    }

    Ok(out.finish()?.into_inner())
}

fn read_document_part(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| TransdocError::Extraction(format!("Not a DOCX package: {}", e)))?;
    let mut entry = archive.by_name(DOCUMENT_PART).map_err(|_| {
        TransdocError::Extraction(format!("Not a Word document: {} is missing", DOCUMENT_PART))
    })?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| TransdocError::Extraction(format!("Cannot read {}: {}", DOCUMENT_PART, e)))?;
    Ok(xml)
}

/// Cell text joins the cell's paragraphs with `\n`; line breaks inside a
/// paragraph also read as `\n`.
fn collect_units(xml: &str) -> Result<(Vec<Paragraph>, Vec<Table>, HashMap<CellKey, CellLayout>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut locator = Locator::default();
    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut tables: Vec<Table> = Vec::new();
    let mut layouts: HashMap<CellKey, CellLayout> = HashMap::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            TransdocError::Extraction(format!(
                "Malformed {} at byte {}: {}",
                DOCUMENT_PART,
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let local = e.local_name();
                match locator.enter(local.as_ref()) {
                    Some(Landmark::Paragraph) => paragraphs.push(Paragraph::default()),
                    Some(Landmark::Run) => {
                        if let Some(paragraph) = paragraphs.last_mut() {
                            paragraph.runs.push(Run::default());
                        }
                    }
                    Some(Landmark::Table) => tables.push(Table::default()),
                    Some(Landmark::Row) => {
                        if let Some(table) = tables.last_mut() {
                            table.rows.push(TableRow::default());
                        }
                    }
                    Some(Landmark::Cell) => {
                        if let Some(row) = tables.last_mut().and_then(|t| t.rows.last_mut()) {
                            row.cells.push(TableCell::default());
                        }
                        if let Some(key) = locator.cell_key() {
                            layouts.insert(key, CellLayout::default());
                        }
                    }
                    Some(Landmark::CellParagraph) => {
                        if let Some(layout) = locator.cell_key().and_then(|key| layouts.get_mut(&key)) {
                            layout.paragraphs += 1;
                        }
                        if locator.cell_paragraphs > 1 {
                            if let Some(cell) = last_cell(&mut tables) {
                                cell.text.push('\n');
                            }
                        }
                    }
                    Some(Landmark::CellLineBreak) => {
                        if let Some(cell) = last_cell(&mut tables) {
                            cell.text.push('\n');
                        }
                    }
                    Some(Landmark::NestedTable) => {
                        if let Some(layout) = locator.cell_key().and_then(|key| layouts.get_mut(&key)) {
                            layout.nested_table = true;
                        }
                    }
                    None => {}
                }
                if matches!(event, Event::Empty(_)) {
                    locator.leave(local.as_ref());
                }
            }
            Event::Text(ref t) => {
                if let Some(slot) = locator.slot() {
                    let text = t.unescape().map_err(|e| {
                        TransdocError::Extraction(format!("Bad text in {}: {}", DOCUMENT_PART, e))
                    })?;
                    match slot {
                        Slot::Run { paragraph, run } => {
                            if let Some(r) = paragraphs.get_mut(paragraph).and_then(|p| p.runs.get_mut(run)) {
                                r.text.push_str(&text);
                            }
                        }
                        Slot::Cell { .. } => {
                            if let Some(cell) = last_cell(&mut tables) {
                                cell.text.push_str(&text);
                            }
                        }
                    }
                }
            }
            Event::End(ref e) => locator.leave(e.local_name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((paragraphs, tables, layouts))
}

fn last_cell(tables: &mut [Table]) -> Option<&mut TableCell> {
    tables
        .last_mut()
        .and_then(|t| t.rows.last_mut())
        .and_then(|r| r.cells.last_mut())
}

/// Text for the paragraphs a changed cell keeps
#[derive(Debug)]
struct CellPlan {
    paragraphs: Vec<Vec<String>>,
}

impl CellPlan {
    /// Lines of the cell text fill the cell's paragraphs in order. Lines past
    /// the last paragraph become line breaks inside it and paragraphs past the
    /// last line are dropped, unless the cell holds a nested table.
    fn new(text: &str, layout: CellLayout) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let available = layout.paragraphs.max(1);
        let keep = if layout.nested_table {
            available
        } else {
            lines.len().min(available)
        };

        let paragraphs = (0..keep)
            .map(|k| {
                let lines = if k + 1 == keep {
                    lines.get(k..).unwrap_or_default()
                } else {
                    lines.get(k..=k).unwrap_or_default()
                };
                lines.iter().map(|line| line.to_string()).collect::<Vec<_>>()
            })
            .collect();

        Self { paragraphs }
    }

    fn lines(&self, paragraph: usize) -> Option<&[String]> {
        self.paragraphs.get(paragraph).map(Vec::as_slice)
    }
}

/// Per-walk bookkeeping for the rewrite pass
#[derive(Default)]
struct RewriteState {
    /// A replacement was emitted for the current `<w:t>`; skip its original text
    replacing: bool,
    /// The current run already received its text
    run_filled: bool,
    /// Present while inside a cell whose text changed
    cell_plan: Option<CellPlan>,
    /// The current cell paragraph already received its text
    cell_paragraph_filled: bool,
    /// Element depth while dropping a surplus cell paragraph
    skip_depth: usize,
}

fn rewrite_document_xml(package: &DocxPackage, paragraphs: &[Paragraph], tables: &[Table]) -> Result<String> {
    let changed_paragraph = |i: usize| paragraphs.get(i) != package.original_paragraphs.get(i);
    let cell_plan = |(t, r, c): CellKey| {
        let current = cell(tables, t, r, c);
        if current == cell(&package.original_tables, t, r, c) {
            return None;
        }
        let text = current.map(|tc| tc.text.as_str()).unwrap_or_default();
        let layout = package.cell_layouts.get(&(t, r, c)).copied().unwrap_or_default();
        Some(CellPlan::new(text, layout))
    };

    let mut reader = Reader::from_str(&package.document_xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut locator = Locator::default();
    let mut state = RewriteState::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            TransdocError::Persistence(format!("Cannot re-read {}: {}", DOCUMENT_PART, e))
        })?;

        if state.skip_depth > 0 {
            match &event {
                Event::Start(_) => state.skip_depth += 1,
                Event::End(e) => {
                    state.skip_depth -= 1;
                    if state.skip_depth == 0 {
                        locator.leave(e.local_name().as_ref());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match &event {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let local = e.local_name();
                match locator.enter(local.as_ref()) {
                    Some(Landmark::Run) => state.run_filled = false,
                    Some(Landmark::Cell) => state.cell_plan = locator.cell_key().and_then(&cell_plan),
                    Some(Landmark::CellParagraph) => {
                        state.cell_paragraph_filled = false;
                        if let Some(plan) = &state.cell_plan {
                            let index = locator.cell_paragraphs - 1;
                            match plan.lines(index) {
                                None => {
                                    if is_empty {
                                        locator.leave(local.as_ref());
                                    } else {
                                        state.skip_depth = 1;
                                    }
                                    continue;
                                }
                                Some(lines) if is_empty && has_text(lines) => {
                                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                                    writer.write_event(Event::Start(e.clone()))?;
                                    write_cell_run(&mut writer, lines)?;
                                    writer.write_event(Event::End(BytesEnd::new(name)))?;
                                    locator.leave(local.as_ref());
                                    continue;
                                }
                                Some(_) => {}
                            }
                        }
                    }
                    // Breaks of a changed cell are rebuilt from its text
                    Some(Landmark::CellLineBreak) if is_empty && state.cell_plan.is_some() => {
                        locator.leave(local.as_ref());
                        continue;
                    }
                    _ => {}
                }

                let replacement = match locator.slot() {
                    Some(Slot::Run { paragraph, run }) if changed_paragraph(paragraph) => {
                        let text = if state.run_filled {
                            String::new()
                        } else {
                            run_text(paragraphs, paragraph, run).to_string()
                        };
                        state.run_filled = true;
                        Some(vec![text])
                    }
                    Some(Slot::Cell { .. }) if state.cell_plan.is_some() => {
                        let lines = match (&state.cell_plan, locator.cell_paragraph()) {
                            (Some(plan), Some(index)) if !state.cell_paragraph_filled => {
                                plan.lines(index).map(<[String]>::to_vec).unwrap_or_default()
                            }
                            _ => Vec::new(),
                        };
                        state.cell_paragraph_filled = true;
                        Some(lines)
                    }
                    _ => None,
                };

                match replacement {
                    Some(pieces) => {
                        write_text_pieces(&mut writer, e, &pieces, is_empty)?;
                        if !is_empty {
                            state.replacing = true;
                        }
                    }
                    None => writer.write_event(event.clone())?,
                }

                if is_empty {
                    locator.leave(local.as_ref());
                }
            }
            Event::Text(_) | Event::CData(_) if state.replacing => {}
            Event::End(e) => {
                let local = e.local_name();
                if local.as_ref() == b"t" && state.replacing {
                    state.replacing = false;
                }

                // A changed run without any <w:t> still receives the paragraph text
                if local.as_ref() == b"r" && !state.run_filled {
                    if let Some((paragraph, run)) = locator.current_run() {
                        if changed_paragraph(paragraph) {
                            let text = run_text(paragraphs, paragraph, run);
                            if !text.is_empty() {
                                let mut start = BytesStart::new("w:t");
                                start.push_attribute(("xml:space", "preserve"));
                                write_text_pieces(&mut writer, &start, &[text.to_string()], true)?;
                            }
                        }
                        state.run_filled = true;
                    }
                }

                // Same for a changed cell paragraph without any <w:t>
                if local.as_ref() == b"p" && !state.cell_paragraph_filled {
                    if let (Some(plan), Some(index)) = (&state.cell_plan, locator.cell_paragraph()) {
                        if let Some(lines) = plan.lines(index).filter(|lines| has_text(lines)) {
                            write_cell_run(&mut writer, lines)?;
                        }
                        state.cell_paragraph_filled = true;
                    }
                }

                locator.leave(local.as_ref());
                writer.write_event(event.clone())?;
            }
            _ => writer.write_event(event.clone())?,
        }
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| TransdocError::Persistence(format!("Rewritten {} is not UTF-8: {}", DOCUMENT_PART, e)))
}

fn has_text(lines: &[String]) -> bool {
    lines.iter().any(|line| !line.is_empty())
}

/// Open a `<w:t>` shaped like `e` holding `pieces` separated by `<w:br/>`.
/// The last `<w:t>` is closed only when `close` is set.
fn write_text_pieces(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    e: &BytesStart,
    pieces: &[String],
    close: bool,
) -> Result<()> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

    writer.write_event(Event::Start(preserved_text_start(e)))?;
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            writer.write_event(Event::End(BytesEnd::new(name.clone())))?;
            writer.write_event(Event::Empty(BytesStart::new("w:br")))?;
            writer.write_event(Event::Start(preserved_text_start(e)))?;
        }
        if !piece.is_empty() {
            writer.write_event(Event::Text(BytesText::new(piece)))?;
        }
    }
    if close {
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

/// New run carrying text for a cell paragraph that had none
fn write_cell_run(writer: &mut Writer<Cursor<Vec<u8>>>, lines: &[String]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    write_text_pieces(writer, &BytesStart::new("w:t"), lines, true)?;
    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    Ok(())
}

fn run_text(paragraphs: &[Paragraph], paragraph: usize, run: usize) -> &str {
    paragraphs
        .get(paragraph)
        .and_then(|p| p.runs.get(run))
        .map(|r| r.text.as_str())
        .unwrap_or_default()
}

fn cell(tables: &[Table], table: usize, row: usize, cell: usize) -> Option<&TableCell> {
    tables.get(table)?.rows.get(row)?.cells.get(cell)
}

/// Copy of a `<w:t>` start tag with whitespace preservation switched on
fn preserved_text_start(e: &BytesStart) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut start = BytesStart::new(name);
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() != b"xml:space" {
            start.push_attribute(attr);
        }
    }
    start.push_attribute(("xml:space", "preserve"));
    start
}
