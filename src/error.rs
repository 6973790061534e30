//! Error kinds for the n-body engine
//!
//! Every failure is terminal for the run it occurs in.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Body rejected by `add_object` (bad mass or non-finite state)
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Coincident bodies, or a zero reference energy during step adaptation
    #[error("degenerate configuration: {0}")]
    DegenerateConfiguration(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Scenario or snapshot file that could not be opened
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Snapshot line with non-numeric fields or a bad field count
    #[error("malformed snapshot line: {0}")]
    Parse(String),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
