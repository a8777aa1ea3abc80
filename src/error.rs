use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransdocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Document package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Document XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Text extraction error: {0}")]
    Extraction(String),

    #[error("PDF conversion error: {0}")]
    Conversion(String),

    #[error("Cannot write output: {0}")]
    Persistence(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, TransdocError>;
