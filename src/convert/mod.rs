// PDF to DOCX conversion
//
// PDFs are translated by converting them to DOCX first. The conversion is an
// external process:
// - Office: headless LibreOffice
// - Command: any converter program driven by an argument template

pub mod commands;
pub mod processor;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;

pub use commands::*;
pub use processor::*;

use crate::config::{ConvertBackend, ConvertConfig};
use crate::error::Result;

/// A converted document living in its own temporary directory.
/// The directory and everything in it is removed on drop.
#[derive(Debug)]
pub struct ConvertedDocument {
    path: PathBuf,
    _workspace: TempDir,
}

impl ConvertedDocument {
    pub fn new(path: PathBuf, workspace: TempDir) -> Self {
        Self {
            path,
            _workspace: workspace,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Main trait for PDF conversion
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Convert a PDF file into a DOCX file
    async fn convert_pdf_to_docx(&self, input: &Path) -> Result<ConvertedDocument>;

    /// Check that the converter can be started
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating converter instances
pub struct ConverterFactory;

impl ConverterFactory {
    /// Create the converter selected in configuration
    pub fn create_converter(config: &ConvertConfig) -> Box<dyn PdfConverter> {
        match config.backend {
            ConvertBackend::Office => Box::new(OfficeConverter::new(config.clone())),
            ConvertBackend::Command => Box::new(CommandConverter::new(config.clone())),
        }
    }
}
