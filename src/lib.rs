//! Transdoc - Document Translation Workflow
//!
//! Translates PDF, DOCX and plain-text documents unit by unit through a
//! machine translation backend, keeping paragraph and table structure intact.

pub mod cli;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod language;
pub mod pipeline;
pub mod progress;
pub mod reassemble;
pub mod segment;
pub mod translate;
pub mod workflow;
