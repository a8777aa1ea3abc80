//! Unit-by-unit translation of a loaded document.
//!
//! Units are processed strictly in document order (paragraphs, then tables
//! row by row) and every chunk is sent to the backend one at a time. A chunk
//! the backend rejects keeps its source text; the failure is reported to the
//! observer and collected in the [`TranslationReport`], and the run goes on.

use std::fmt;

use tracing::{debug, info, warn};

use crate::document::{Document, UnitPosition};
use crate::error::{Result, TransdocError};
use crate::progress::{ProgressObserver, ProgressTracker};
use crate::reassemble;
use crate::segment::segment;
use crate::translate::Translator;

/// Outcome of translating one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkResult {
    Translated(String),
    /// The backend failed; the source text stands in for the translation
    Failed { original: String, error: String },
}

impl ChunkResult {
    pub fn text(&self) -> &str {
        match self {
            Self::Translated(text) => text,
            Self::Failed { original, .. } => original,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A chunk that was left untranslated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    pub position: UnitPosition,
    pub chunk_index: usize,
    pub chunk_count: usize,
    pub error: String,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: chunk {}/{} kept untranslated: {}",
            self.position,
            self.chunk_index + 1,
            self.chunk_count,
            self.error
        )
    }
}

/// Per-chunk results for one text unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTranslation {
    pub results: Vec<ChunkResult>,
}

impl UnitTranslation {
    /// Reassembled text of the unit
    pub fn text(&self) -> String {
        let parts: Vec<&str> = self.results.iter().map(ChunkResult::text).collect();
        reassemble::join_chunks(&parts)
    }

    /// No chunk made it through the backend
    pub fn is_untranslated(&self) -> bool {
        self.results.iter().all(ChunkResult::is_failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Units whose text was replaced
    pub units_translated: usize,
    /// Blank units, never sent to the backend
    pub units_skipped: usize,
    /// Units where every chunk failed; their text is unchanged
    pub units_failed: usize,
    pub chunks_translated: usize,
    pub failures: Vec<ChunkFailure>,
}

/// Translates documents through a [`Translator`]
pub struct DocumentTranslator<'a> {
    translator: &'a dyn Translator,
    source_language: String,
    target_language: String,
    max_chunk_size: usize,
}

impl<'a> DocumentTranslator<'a> {
    /// Language codes must be non-empty; anything else is left to the backend
    pub fn new(
        translator: &'a dyn Translator,
        source_language: &str,
        target_language: &str,
        max_chunk_size: usize,
    ) -> Result<Self> {
        let source_language = source_language.trim();
        let target_language = target_language.trim();
        if source_language.is_empty() || target_language.is_empty() {
            return Err(TransdocError::Config(
                "Source and target language codes must not be empty".to_string(),
            ));
        }

        Ok(Self {
            translator,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            max_chunk_size,
        })
    }

    /// Translate one text unit chunk by chunk. Returns `None` for blank text,
    /// which is never sent to the backend.
    pub async fn translate_text(&self, text: &str) -> Option<UnitTranslation> {
        if text.trim().is_empty() {
            return None;
        }

        let chunks = segment(text, self.max_chunk_size);
        let mut results = Vec::with_capacity(chunks.len());

        for (idx, chunk) in chunks.into_iter().enumerate() {
            debug!("Translating chunk {} ({} chars)", idx + 1, chunk.chars().count());
            match self
                .translator
                .translate(&chunk, &self.source_language, &self.target_language)
                .await
            {
                Ok(translation) => results.push(ChunkResult::Translated(translation)),
                Err(e) => results.push(ChunkResult::Failed {
                    original: chunk,
                    error: e.to_string(),
                }),
            }
        }

        Some(UnitTranslation { results })
    }

    /// Translate every unit of `document` in place and report progress.
    ///
    /// Progress is counted over paragraphs plus table rows. Paragraphs
    /// advance it one at a time; a table advances it by all its rows once the
    /// whole table is done.
    pub async fn translate_document(
        &self,
        document: &mut Document,
        observer: &mut dyn ProgressObserver,
    ) -> Result<TranslationReport> {
        let total = document.paragraphs.len() + document.row_count();
        let mut tracker = ProgressTracker::new(total);
        let mut report = TranslationReport::default();

        info!(
            "Translating {} paragraphs and {} tables ({} -> {})",
            document.paragraphs.len(),
            document.tables.len(),
            self.source_language,
            self.target_language
        );
        tracker.start(observer);

        for index in 0..document.paragraphs.len() {
            let text = document.paragraphs[index].text();
            self.translate_unit(document, UnitPosition::Paragraph(index), &text, &mut report, observer)
                .await?;
            tracker.advance(1, observer);
        }

        for table in 0..document.tables.len() {
            let rows = document.tables[table].rows.len();
            for row in 0..rows {
                let cells = document.tables[table].rows[row].cells.len();
                for cell in 0..cells {
                    let position = UnitPosition::Cell { table, row, cell };
                    let text = document.tables[table].rows[row].cells[cell].text.clone();
                    self.translate_unit(document, position, &text, &mut report, observer)
                        .await?;
                }
            }
            tracker.advance(rows, observer);
        }

        tracker.finish(observer);

        info!(
            "Translated {} units, skipped {} blank, {} chunk failures",
            report.units_translated,
            report.units_skipped,
            report.failures.len()
        );
        Ok(report)
    }

    async fn translate_unit(
        &self,
        document: &mut Document,
        position: UnitPosition,
        text: &str,
        report: &mut TranslationReport,
        observer: &mut dyn ProgressObserver,
    ) -> Result<()> {
        let Some(unit) = self.translate_text(text).await else {
            report.units_skipped += 1;
            return Ok(());
        };

        let chunk_count = unit.results.len();
        for (chunk_index, result) in unit.results.iter().enumerate() {
            match result {
                ChunkResult::Translated(_) => report.chunks_translated += 1,
                ChunkResult::Failed { error, .. } => {
                    let failure = ChunkFailure {
                        position,
                        chunk_index,
                        chunk_count,
                        error: error.clone(),
                    };
                    warn!("{}", failure);
                    observer.on_warning(&failure);
                    report.failures.push(failure);
                }
            }
        }

        if unit.is_untranslated() {
            // Leave the unit exactly as it was
            report.units_failed += 1;
            return Ok(());
        }

        reassemble::apply(document, position, &unit.text())?;
        report.units_translated += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::{Sequence, mock};

    mock! {
        pub Backend {}

        #[async_trait]
        impl Translator for Backend {
            async fn translate(
                &self,
                text: &str,
                source_language: &str,
                target_language: &str,
            ) -> Result<String>;
        }
    }

    #[tokio::test]
    async fn test_blank_text_is_not_sent() {
        let backend = MockBackend::new();
        let pipeline = DocumentTranslator::new(&backend, "en", "fr", 5000).unwrap();
        assert!(pipeline.translate_text("   ").await.is_none());
        assert!(pipeline.translate_text("").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_chunk_keeps_source_and_continues() {
        let mut backend = MockBackend::new();
        let mut seq = Sequence::new();
        backend
            .expect_translate()
            .withf(|text, source, target| text == "First one." && source == "en" && target == "fr")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("Premier.".to_string()));
        backend
            .expect_translate()
            .withf(|text, _, _| text == "Second one.")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(TransdocError::Translation("quota exceeded".to_string())));
        backend
            .expect_translate()
            .withf(|text, _, _| text == "Third one.")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("Troisième.".to_string()));

        // Budget forces one sentence per chunk
        let pipeline = DocumentTranslator::new(&backend, "en", "fr", 12).unwrap();
        let unit = pipeline
            .translate_text("First one. Second one. Third one.")
            .await
            .unwrap();

        assert_eq!(unit.results.len(), 3);
        assert!(unit.results[1].is_failed());
        assert_eq!(unit.text(), "Premier. Second one. Troisième.");
        assert!(!unit.is_untranslated());
    }

    #[tokio::test]
    async fn test_document_progress_and_report() {
        let mut backend = MockBackend::new();
        backend
            .expect_translate()
            .returning(|text, _, _| Ok(text.to_uppercase()));

        let mut document = Document::from_text(b"Hello. World.\n\nGood morning.").unwrap();
        let pipeline = DocumentTranslator::new(&backend, "en", "fr", 5000).unwrap();

        let mut seen = Vec::new();
        let report = pipeline
            .translate_document(&mut document, &mut |p: u8| seen.push(p))
            .await
            .unwrap();

        assert_eq!(document.paragraphs.len(), 3);
        assert_eq!(document.paragraphs[0].text(), "HELLO. WORLD.");
        assert_eq!(document.paragraphs[1].text(), "");
        assert_eq!(document.paragraphs[2].text(), "GOOD MORNING.");
        assert_eq!(report.units_translated, 2);
        assert_eq!(report.units_skipped, 1);
        assert!(report.failures.is_empty());
        assert_eq!(seen, vec![0, 33, 67, 100]);
    }

    #[tokio::test]
    async fn test_fully_failed_unit_is_untouched() {
        let mut backend = MockBackend::new();
        backend
            .expect_translate()
            .returning(|_, _, _| Err(TransdocError::Translation("unauthorized".to_string())));

        let mut document = Document::from_text("Spaced.   Out.".as_bytes()).unwrap();
        let pipeline = DocumentTranslator::new(&backend, "en", "fr", 5000).unwrap();

        let mut warnings = Vec::new();
        struct Collect<'w>(&'w mut Vec<ChunkFailure>);
        impl ProgressObserver for Collect<'_> {
            fn on_progress(&mut self, _percent: u8) {}
            fn on_warning(&mut self, failure: &ChunkFailure) {
                self.0.push(failure.clone());
            }
        }

        let report = pipeline
            .translate_document(&mut document, &mut Collect(&mut warnings))
            .await
            .unwrap();

        assert_eq!(document.paragraphs[0].text(), "Spaced.   Out.");
        assert_eq!(report.units_failed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(warnings, report.failures);
        assert_eq!(
            warnings[0].to_string(),
            "paragraph 1: chunk 1/1 kept untranslated: Translation error: unauthorized"
        );
    }

    #[test]
    fn test_empty_language_codes_are_rejected() {
        let backend = MockBackend::new();
        assert!(DocumentTranslator::new(&backend, "", "fr", 5000).is_err());
        assert!(DocumentTranslator::new(&backend, "en", "  ", 5000).is_err());
    }
}
