use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a flight link for connection transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Drone not reachable: {0}")]
    Unreachable(String),

    #[error("Link already {0}")]
    InvalidTransition(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("Detector timed out")]
    Timeout,

    #[error("Frame rejected: {0}")]
    BadFrame(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(&'static str),
}
