//! Writing translated chunks back into their text unit.
//!
//! A paragraph made of several runs gets the full translated text in every
//! run: translated text is not redistributed across runs, so a multi-run
//! paragraph repeats the text once per run. Table cells are replaced whole.

use crate::document::{Document, UnitPosition};
use crate::error::{Result, TransdocError};

/// Join translated chunks, in order, with single spaces
pub fn join_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace the text of the unit at `position`. Structure is left untouched.
pub fn apply(document: &mut Document, position: UnitPosition, text: &str) -> Result<()> {
    match position {
        UnitPosition::Paragraph(index) => {
            let paragraph = document
                .paragraphs
                .get_mut(index)
                .ok_or_else(|| missing_unit(position))?;
            for run in &mut paragraph.runs {
                run.text = text.to_string();
            }
        }
        UnitPosition::Cell { table, row, cell } => {
            let target = document
                .tables
                .get_mut(table)
                .and_then(|t| t.rows.get_mut(row))
                .and_then(|r| r.cells.get_mut(cell))
                .ok_or_else(|| missing_unit(position))?;
            target.text = text.to_string();
        }
    }
    Ok(())
}

fn missing_unit(position: UnitPosition) -> TransdocError {
    TransdocError::Persistence(format!("No text unit at {}", position))
}
