use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::ConvertConfig;
use crate::error::{Result, TransdocError};
use super::{ConvertCommandBuilder, ConvertedDocument, PdfConverter};

/// Headless LibreOffice converter
pub struct OfficeConverter {
    command_builder: ConvertCommandBuilder,
}

impl OfficeConverter {
    pub fn new(config: ConvertConfig) -> Self {
        let command_builder = ConvertCommandBuilder::new(
            config.binary_path,
            Duration::from_secs(config.timeout_secs),
        );
        Self { command_builder }
    }
}

#[async_trait]
impl PdfConverter for OfficeConverter {
    async fn convert_pdf_to_docx(&self, input: &Path) -> Result<ConvertedDocument> {
        info!("Converting {} to DOCX with LibreOffice", input.display());

        let workspace = create_workspace()?;
        self.command_builder
            .office_pdf_to_docx(input, workspace.path())
            .execute()
            .await?;

        // LibreOffice names the output after the input stem
        let output = workspace.path().join(format!("{}.docx", file_stem(input)?));
        finish(output, workspace)
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder.version_check().execute().await?;
        info!("LibreOffice is available");
        Ok(())
    }
}

/// Converter driven by a user-supplied argument template
pub struct CommandConverter {
    config: ConvertConfig,
    command_builder: ConvertCommandBuilder,
}

impl CommandConverter {
    pub fn new(config: ConvertConfig) -> Self {
        let command_builder = ConvertCommandBuilder::new(
            config.binary_path.clone(),
            Duration::from_secs(config.timeout_secs),
        );
        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl PdfConverter for CommandConverter {
    async fn convert_pdf_to_docx(&self, input: &Path) -> Result<ConvertedDocument> {
        info!("Converting {} to DOCX with {}", input.display(), self.config.binary_path);

        let workspace = create_workspace()?;
        let output = workspace.path().join(format!("{}.docx", file_stem(input)?));

        self.command_builder
            .from_template(&self.config.args, input, output.as_path(), workspace.path())
            .execute()
            .await?;

        finish(output, workspace)
    }

    async fn check_availability(&self) -> Result<()> {
        // Arbitrary converters have no common version flag
        debug!("Skipping availability check for {}", self.config.binary_path);
        Ok(())
    }
}

fn create_workspace() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("transdoc-convert-")
        .tempdir()
        .map_err(|e| TransdocError::Conversion(format!("Cannot create temporary directory: {}", e)))
}

fn file_stem(input: &Path) -> Result<String> {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| TransdocError::Conversion(format!("Invalid input file name: {}", input.display())))
}

fn finish(output: PathBuf, workspace: TempDir) -> Result<ConvertedDocument> {
    if !output.is_file() {
        return Err(TransdocError::Conversion(format!(
            "Converter did not produce {}",
            output.display()
        )));
    }
    debug!("Conversion output: {}", output.display());
    Ok(ConvertedDocument::new(output, workspace))
}
