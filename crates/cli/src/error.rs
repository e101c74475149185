//! CLI failures and their exit codes.
//!
//! - 0:  success
//! - 2:  clap arg parse error (before `run` is reached)
//! - 10: run configuration rejected by the engine or field registry
//! - 11: the density PNG could not be written
//! - 12: `--params` is not a JSON object
//! - 13: JSON output could not be encoded

use flow_engine_core::EngineError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Seed validation, field construction, or engine construction failed.
    #[error(transparent)]
    Config(#[from] EngineError),

    #[error("invalid --params: {0}")]
    Params(String),

    #[error("cannot write {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("cannot encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn snapshot(path: &Path, source: EngineError) -> Self {
        CliError::Snapshot {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 10,
            CliError::Snapshot { .. } => 11,
            CliError::Params(_) => 12,
            CliError::Output(_) => 13,
        }
    }
}
