// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading one of the input tables.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported source format: {} (expected .pdf, .csv or .txt)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("{} looks like a scanned PDF, no text to parse", .0.display())]
    ScannedPdf(PathBuf),

    #[error("failed to parse PDF {}: {reason}", .path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{table} table needs at least {needed} columns, found {found}")]
    Schema {
        table: &'static str,
        needed: usize,
        found: usize,
    },
}

/// Errors surfaced by the extract / allocate stages.
#[derive(Debug, Error)]
pub enum AllocError {
    #[error("required input missing: {0}")]
    InputMissing(String),

    #[error("store not found: {0}")]
    StoreNotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to write {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the optional advisory text service. Never fatal.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory backend is disabled")]
    Disabled,

    #[error("{0} env var required for remote backend")]
    MissingApiKey(String),

    #[error("Ollama is not running at {0}. Start it with: ollama serve")]
    Unreachable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("empty response from LLM")]
    EmptyResponse,
}
