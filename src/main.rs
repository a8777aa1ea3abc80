//! Transdoc - Document Translation Workflow
//!
//! This is the main entry point for the transdoc application, which translates
//! PDF, Word and text documents in place through a machine translation backend
//! while keeping their paragraph and table structure.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use transdoc::cli::{Args, Commands};
use transdoc::config::{Config, Credentials, TranslationBackend};
use transdoc::convert::ConverterFactory;
use transdoc::document::{extract_preview, DocumentKind};
use transdoc::language::{language_name, SUPPORTED_TARGET_LANGUAGES};
use transdoc::progress::{LogObserver, ProgressBarObserver};
use transdoc::translate::{check_ollama_availability, TranslatorFactory};
use transdoc::workflow::{TranslateOptions, Workflow};

const DEFAULT_CONFIG_FILE: &str = "transdoc.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting transdoc - document translation workflow");

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Translate {
            input,
            content_type,
            options,
        } => {
            options.apply_to(&mut config);
            let mut workflow = build_workflow(&config).await?;
            let run_options = TranslateOptions::from_config(&config);

            let label = input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let mut observer = ProgressBarObserver::new(&label);

            let run = workflow
                .translate_file(&input, content_type.as_deref(), &run_options, &mut observer)
                .await?;

            println!("Translated document saved to {}", run.output_path.display());
            if !run.report.failures.is_empty() {
                println!(
                    "{} chunk(s) could not be translated and were kept in the source language",
                    run.report.failures.len()
                );
            }
        }
        Commands::Batch { input_dir, options } => {
            options.apply_to(&mut config);
            let mut workflow = build_workflow(&config).await?;
            let run_options = TranslateOptions::from_config(&config);

            let batch = workflow
                .translate_directory(&input_dir, &run_options, &mut LogObserver)
                .await?;

            println!(
                "Translated {} document(s), {} failed",
                batch.completed.len(),
                batch.failed.len()
            );
            for (path, error) in &batch.failed {
                println!("  {}: {}", path.display(), error);
            }
        }
        Commands::Preview { input, chars } => {
            let kind = DocumentKind::from_path(&input)?;
            let bytes = tokio::fs::read(&input).await?;
            let preview = extract_preview(&bytes, kind, chars)?;
            println!("{}", preview);
        }
        Commands::Languages => {
            println!("\nSupported Target Languages:");
            println!("{:<8} {:<20}", "Code", "Name");
            println!("{}", "-".repeat(28));
            for code in SUPPORTED_TARGET_LANGUAGES {
                println!("{:<8} {:<20}", code, language_name(code));
            }
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Configuration written to {}", output.display());
        }
    }

    Ok(())
}

/// Validate configuration and wire up the selected backends. Credentials are
/// read once here; a missing value stops the program before any work starts.
async fn build_workflow(config: &Config) -> Result<Workflow> {
    config.validate()?;

    let credentials = match config.translate.backend {
        TranslationBackend::Azure => Some(Credentials::from_env(&config.translate)?),
        TranslationBackend::Ollama => {
            check_ollama_availability(config.translate.endpoint_url(), &config.translate.model)
                .await?;
            None
        }
    };

    let translator = TranslatorFactory::create_translator(&config.translate, credentials)?;
    let converter = ConverterFactory::create_converter(&config.convert);

    Ok(Workflow::new(translator, converter))
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let transdoc_dir = std::env::current_dir()?.join(".transdoc");
    let log_dir = transdoc_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "transdoc.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output shares the terminal with the progress bar, keep it short
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("transdoc.log").display()
    );

    Ok(())
}
