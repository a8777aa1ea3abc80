use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, TranslationBackend};
use crate::language::normalize_code;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a single PDF, DOCX or text document
    Translate {
        /// Input document
        #[arg(short, long)]
        input: PathBuf,

        /// Declared MIME type; overrides the file extension
        #[arg(long)]
        content_type: Option<String>,

        #[command(flatten)]
        options: RunArgs,
    },

    /// Translate every document in a directory
    Batch {
        /// Input directory containing documents
        #[arg(short, long)]
        input_dir: PathBuf,

        #[command(flatten)]
        options: RunArgs,
    },

    /// Print the beginning of a document's extracted text
    Preview {
        /// Input document
        #[arg(short, long)]
        input: PathBuf,

        /// Number of characters to show
        #[arg(long, default_value_t = 500)]
        chars: usize,
    },

    /// List supported target languages
    Languages,

    /// Write a configuration file with default values
    InitConfig {
        /// Destination of the configuration file
        #[arg(short, long, default_value = "transdoc.toml")]
        output: PathBuf,
    },
}

/// Options shared by `translate` and `batch`; unset values come from the
/// configuration file
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Target language code
    #[arg(short, long)]
    pub target_lang: Option<String>,

    /// Source language code
    #[arg(short, long)]
    pub source_lang: Option<String>,

    /// Output directory for translated files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum characters per translation request
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// Translation backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    Azure,
    Ollama,
}

impl From<BackendArg> for TranslationBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Azure => TranslationBackend::Azure,
            BackendArg::Ollama => TranslationBackend::Ollama,
        }
    }
}

impl RunArgs {
    /// Overlay the flags that were given on top of `config`
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(target) = &self.target_lang {
            config.translate.target_language = normalize_code(target);
        }
        if let Some(source) = &self.source_lang {
            config.translate.source_language = normalize_code(source);
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = Some(dir.clone());
        }
        if let Some(size) = self.max_chunk_size {
            config.translate.max_chunk_size = size;
        }
        if let Some(backend) = self.backend {
            config.translate.backend = backend.into();
        }
    }
}
