//! Error types for the generator test harness.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving or constructing generators.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("unable to derive a generator namespace from path: {0}")]
    InvalidPath(PathBuf),

    #[error("no generator registered under namespace: {0}")]
    UnknownNamespace(String),

    #[error("failed to construct generator '{namespace}': {source}")]
    Construction {
        namespace: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors terminating a run context.
///
/// Generator failures are carried verbatim: the original `anyhow::Error`
/// produced by the generator is the source, never rewrapped or summarized.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error("setup failed at {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("generator run failed: {0}")]
    Generator(#[source] anyhow::Error),
}

/// Errors raised by a prompter.
#[derive(Debug, Error)]
pub enum PromptError {
    /// A prompt question had no mock answer and no declared default. The
    /// harness never invents answers for unmatched questions.
    #[error("no mock answer matches prompt question '{0}'")]
    MockMismatch(String),

    #[error("prompt interaction failed: {0}")]
    Interact(String),
}

/// Errors raised while reading a generator's persisted configuration.
#[derive(Debug, Error)]
pub enum ConfigReadError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
