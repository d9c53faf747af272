use std::path::PathBuf;

use rpwatch_renderer::RendererError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("state file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A fault inside one watch cycle. Always contained by the cycle boundary.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("renderer: {0}")]
    Renderer(#[from] RendererError),

    #[error("state: {0}")]
    State(#[from] StateError),

    #[error("cycle panicked: {0}")]
    Panicked(String),
}
