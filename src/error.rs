use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ExplorerError {
    #[error("search term must not be empty")]
    EmptySearchTerm,

    #[error("year out of supported range: {0}")]
    YearOutOfRange(String),

    #[error("benefit limit out of supported range: {0}")]
    LimitOutOfRange(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("NFZ request failed: {0}")]
    NfzHttp(String),

    #[error("NFZ returned status {status}: {message}")]
    NfzStatus { status: u16, message: String },

    #[error("CSV export failed: {0}")]
    CsvExport(String),

    #[error("spreadsheet export failed: {0}")]
    XlsxExport(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
