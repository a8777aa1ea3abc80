use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::convert::PdfConverter;
use crate::document::{Document, DocumentKind};
use crate::error::{Result, TransdocError};
use crate::language::normalize_code;
use crate::pipeline::{DocumentTranslator, TranslationReport};
use crate::progress::ProgressObserver;
use crate::translate::Translator;

/// Prefix of every output file name
pub const OUTPUT_PREFIX: &str = "translated_";

/// Lifecycle of one document run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Loading,
    Translating,
    Reassembling,
    Saved,
    Failed,
}

/// Per-run settings, usually taken from [`Config`] and CLI overrides
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    pub source_language: String,
    pub target_language: String,
    pub max_chunk_size: usize,
    /// Defaults to the input file's directory
    pub output_dir: Option<PathBuf>,
    pub include_language: bool,
}

impl TranslateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: normalize_code(&config.translate.source_language),
            target_language: normalize_code(&config.translate.target_language),
            max_chunk_size: config.translate.max_chunk_size,
            output_dir: config.output.directory.clone(),
            include_language: config.output.include_language,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub kind: DocumentKind,
    pub report: TranslationReport,
}

/// Result of a directory run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<RunReport>,
    pub failed: Vec<(PathBuf, String)>,
}

pub struct Workflow {
    translator: Box<dyn Translator>,
    converter: Box<dyn PdfConverter>,
    state: RunState,
}

impl Workflow {
    pub fn new(translator: Box<dyn Translator>, converter: Box<dyn PdfConverter>) -> Self {
        Self {
            translator,
            converter,
            state: RunState::Idle,
        }
    }

    /// State reached by the last run
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Translate one document and write `translated_<stem>[_<target>].<ext>`.
    ///
    /// `content_type` takes precedence over the file extension. Chunks the
    /// backend rejects keep their source text and do not fail the run; only
    /// loading, conversion and persistence errors do, and in that case no
    /// output file is left behind.
    pub async fn translate_file(
        &mut self,
        input: &Path,
        content_type: Option<&str>,
        options: &TranslateOptions,
        observer: &mut dyn ProgressObserver,
    ) -> Result<RunReport> {
        self.state = RunState::Idle;
        let result = self.run(input, content_type, options, observer).await;

        match &result {
            Ok(run) => {
                transition(&mut self.state, RunState::Saved);
                info!("Saved translation to {}", run.output_path.display());
            }
            Err(e) => {
                transition(&mut self.state, RunState::Failed);
                warn!("Translation of {} failed: {}", input.display(), e);
            }
        }

        result
    }

    /// Translate every supported document under `input_dir`.
    /// Failures are logged and collected; the walk goes on.
    pub async fn translate_directory(
        &mut self,
        input_dir: &Path,
        options: &TranslateOptions,
        observer: &mut dyn ProgressObserver,
    ) -> Result<BatchReport> {
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(TransdocError::Config(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        let documents = collect_documents(input_dir);
        info!("Found {} documents to translate", documents.len());

        let mut batch = BatchReport::default();
        for path in documents {
            match self.translate_file(&path, None, options, observer).await {
                Ok(run) => {
                    info!("Successfully translated: {}", path.display());
                    batch.completed.push(run);
                }
                Err(e) => {
                    warn!("Failed to translate {}: {}", path.display(), e);
                    batch.failed.push((path, e.to_string()));
                }
            }
        }

        Ok(batch)
    }

    async fn run(
        &mut self,
        input: &Path,
        content_type: Option<&str>,
        options: &TranslateOptions,
        observer: &mut dyn ProgressObserver,
    ) -> Result<RunReport> {
        info!("Processing file: {}", input.display());

        if !input.is_file() {
            return Err(TransdocError::FileNotFound(input.display().to_string()));
        }

        let kind = DocumentKind::resolve(input, content_type)?;
        debug!("Treating {} as {}", input.display(), kind.mime());
        let pipeline = DocumentTranslator::new(
            self.translator.as_ref(),
            &options.source_language,
            &options.target_language,
            options.max_chunk_size,
        )?;

        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .to_path_buf(),
        };
        let file_name = output_file_name(
            input,
            &options.target_language,
            kind.output_extension(),
            options.include_language,
        )?;

        transition(&mut self.state, RunState::Loading);
        let mut document = self.load(input, kind).await?;
        debug!(
            "Loaded {} paragraphs and {} tables",
            document.paragraphs.len(),
            document.tables.len()
        );

        transition(&mut self.state, RunState::Translating);
        let report = pipeline.translate_document(&mut document, observer).await?;

        transition(&mut self.state, RunState::Reassembling);
        let bytes = document.to_bytes()?;
        let output_path = persist(&output_dir, &file_name, &bytes).await?;

        Ok(RunReport {
            input_path: input.to_path_buf(),
            output_path,
            kind,
            report,
        })
    }

    async fn load(&self, input: &Path, kind: DocumentKind) -> Result<Document> {
        match kind {
            DocumentKind::Pdf => {
                self.converter.check_availability().await?;
                // The converted file is removed as soon as it has been read
                let converted = self.converter.convert_pdf_to_docx(input).await?;
                let bytes = fs::read(converted.path()).await.map_err(|e| {
                    TransdocError::Conversion(format!("Cannot read converted document: {}", e))
                })?;
                Document::load(&bytes, DocumentKind::Docx)
            }
            DocumentKind::Docx | DocumentKind::Text => {
                let bytes = fs::read(input).await.map_err(|e| {
                    TransdocError::Extraction(format!("Cannot read {}: {}", input.display(), e))
                })?;
                Document::load(&bytes, kind)
            }
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    debug!("Run state: {:?} -> {:?}", state, next);
    *state = next;
}

/// `translated_<stem>[_<target>].<ext>`
pub fn output_file_name(
    input: &Path,
    target_language: &str,
    extension: &str,
    include_language: bool,
) -> Result<String> {
    let stem = input
        .file_stem()
        .ok_or_else(|| TransdocError::Config(format!("Invalid input file name: {}", input.display())))?
        .to_string_lossy();

    Ok(if include_language {
        format!("{}{}_{}.{}", OUTPUT_PREFIX, stem, target_language, extension)
    } else {
        format!("{}{}.{}", OUTPUT_PREFIX, stem, extension)
    })
}

/// Write through a temporary file in `dir` so the final name only appears
/// once the whole document is on disk.
async fn persist(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).await.map_err(|e| {
        TransdocError::Persistence(format!("Cannot create {}: {}", dir.display(), e))
    })?;

    let path = dir.join(file_name);
    let persistence = |e: std::io::Error| {
        TransdocError::Persistence(format!("Cannot write {}: {}", path.display(), e))
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".transdoc-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(persistence)?;
    staged.write_all(bytes).map_err(persistence)?;
    staged.as_file().sync_all().map_err(persistence)?;
    staged.persist(&path).map_err(|e| persistence(e.error))?;

    Ok(path)
}

/// Supported documents under `dir`, skipping earlier outputs
fn collect_documents(dir: &Path) -> Vec<PathBuf> {
    let mut documents: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            let is_output = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with(OUTPUT_PREFIX))
                .unwrap_or(false);
            !is_output && DocumentKind::from_path(path).is_ok()
        })
        .collect();

    documents.sort();
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use crate::convert::ConverterFactory;
    use crate::progress::NoopObserver;
    use async_trait::async_trait;

    struct Upper;

    #[async_trait]
    impl Translator for Upper {
        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    fn workflow() -> Workflow {
        Workflow::new(
            Box::new(Upper),
            ConverterFactory::create_converter(&ConvertConfig::default()),
        )
    }

    fn options() -> TranslateOptions {
        TranslateOptions::from_config(&Config::default())
    }

    #[test]
    fn test_output_file_name() {
        let input = Path::new("/docs/report.final.docx");
        assert_eq!(
            output_file_name(input, "fr", "docx", true).unwrap(),
            "translated_report.final_fr.docx"
        );
        assert_eq!(
            output_file_name(Path::new("scan.pdf"), "ja", "docx", false).unwrap(),
            "translated_scan.docx"
        );
    }

    #[tokio::test]
    async fn test_mixed_case_target_names_output_canonically() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("x.txt");
        std::fs::write(&input, "Hello.").unwrap();

        let mut config = Config::default();
        config.translate.target_language = " JA ".to_string();
        let options = TranslateOptions::from_config(&config);
        assert_eq!(options.target_language, "ja");

        let run = workflow()
            .translate_file(&input, None, &options, &mut NoopObserver)
            .await
            .unwrap();
        assert_eq!(run.output_path, dir.path().join("translated_x_ja.txt"));
    }

    #[tokio::test]
    async fn test_missing_input_fails_run() {
        let mut workflow = workflow();
        let result = workflow
            .translate_file(Path::new("/no/such/file.txt"), None, &options(), &mut NoopObserver)
            .await;

        assert!(matches!(result, Err(TransdocError::FileNotFound(_))));
        assert_eq!(workflow.state(), RunState::Failed);
    }

    #[tokio::test]
    async fn test_text_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "Hello. World.\r\n\r\nGood morning.\r\n").unwrap();

        let mut workflow = workflow();
        let run = workflow
            .translate_file(&input, None, &options(), &mut NoopObserver)
            .await
            .unwrap();

        assert_eq!(workflow.state(), RunState::Saved);
        assert_eq!(run.output_path, dir.path().join("translated_notes_fr.txt"));
        assert_eq!(
            std::fs::read_to_string(&run.output_path).unwrap(),
            "HELLO. WORLD.\r\n\r\nGOOD MORNING.\r\n"
        );
    }

    #[tokio::test]
    async fn test_extraction_failure_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.docx");
        std::fs::write(&input, b"not a zip archive").unwrap();

        let mut workflow = workflow();
        let result = workflow
            .translate_file(&input, None, &options(), &mut NoopObserver)
            .await;

        assert!(matches!(result, Err(TransdocError::Extraction(_))));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_language_is_rejected_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "Hello.").unwrap();

        let mut options = options();
        options.target_language = String::new();

        let mut workflow = workflow();
        let result = workflow
            .translate_file(&input, None, &options, &mut NoopObserver)
            .await;
        assert!(matches!(result, Err(TransdocError::Config(_))));
    }

    #[test]
    fn test_collect_documents_skips_outputs_and_unknown_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        for name in ["a.txt", "nested/b.docx", "translated_a_fr.txt", "image.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let found = collect_documents(dir.path());
        assert_eq!(found, vec![dir.path().join("a.txt"), dir.path().join("nested/b.docx")]);
    }
}
