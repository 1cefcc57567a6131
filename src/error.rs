use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Workspace creation failures. Nothing works without the root and bin
/// directories, so these abort startup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no documents directory available to place the workspace in")]
    NoDocumentsDir,

    #[error("failed to create workspace directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to open archive {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("malformed zip archive {path:?}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("failed to unpack {path:?}: {source}")]
    Unpack { path: PathBuf, source: io::Error },

    #[error("archive {path:?} has an unsupported format")]
    UnsupportedFormat { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("download of {url} failed with HTTP status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to write {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("{name} not found at {path:?} after install")]
    BinaryMissing { name: &'static str, path: PathBuf },
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to spawn {program:?}: {source}")]
    Spawn { program: PathBuf, source: io::Error },

    #[error("failed to wait on {program:?}: {source}")]
    Wait { program: PathBuf, source: io::Error },
}

/// Rejections raised by the orchestrator before a job enters `Preparing`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("a download job is already in flight")]
    Busy,

    #[error("target URL is empty")]
    EmptyUrl,

    #[error("output directory {0:?} does not exist or is not a directory")]
    InvalidOutputDir(PathBuf),
}
