//! Error taxonomy for composition execution and event streaming.

use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

use crate::merge::MergeError;
use crate::tracer::TracerError;

/// Errors surfaced by composition execution and the event stream assembler.
#[derive(Debug, Error, Diagnostic)]
pub enum ChainError {
    /// Incompatible chunk shapes were combined for one run.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Merge(#[from] MergeError),

    /// A wrapped collaborator's `invoke`/`stream` raised.
    #[error("node execution failed: {source}")]
    #[diagnostic(code(chainstream::execution))]
    Execution {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Pick received a chunk it cannot project a key out of.
    #[error("pick expected keyed chunks but upstream produced a {got} chunk")]
    #[diagnostic(
        code(chainstream::pick_shape),
        help("place Pick downstream of a map or another producer of keyed chunks")
    )]
    PickShape { got: &'static str },

    /// Lifecycle callbacks arrived out of order (duplicate pinned run id,
    /// misbehaving custom runnable).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tracer(#[from] TracerError),

    /// Attribution wrapper naming the run in which a failure originated.
    #[error("run '{name}' ({run_id}) failed: {source}")]
    #[diagnostic(code(chainstream::run_failed))]
    Run {
        run_id: Uuid,
        name: String,
        #[source]
        source: Box<ChainError>,
    },

    /// Contradictory filter specification, rejected before execution begins.
    #[error("contradictory event filter: '{what}' present in both an include and an exclude set")]
    #[diagnostic(
        code(chainstream::filter_config),
        help("remove the value from one of the two sets")
    )]
    FilterConfig { what: String },

    /// Unsupported protocol version, rejected before execution begins.
    #[error("unsupported stream events version '{requested}' (supported: v1)")]
    #[diagnostic(code(chainstream::version))]
    UnsupportedVersion { requested: String },

    /// JSON serialization error while encoding an event.
    #[error(transparent)]
    #[diagnostic(code(chainstream::serde_json))]
    Serde(#[from] serde_json::Error),
}

impl ChainError {
    /// Wrap an arbitrary collaborator error.
    pub fn execution(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ChainError::Execution {
            source: source.into(),
        }
    }

    /// Attribute this error to the run it originated in. Errors that already
    /// carry an attribution pass through unchanged, so the failing run keeps
    /// its identity while the failure propagates up the composition.
    pub(crate) fn attributed(self, run_id: Uuid, name: &str) -> Self {
        match self {
            already @ ChainError::Run { .. } => already,
            other => ChainError::Run {
                run_id,
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The run id and name of the failing run, when the error carries one.
    #[must_use]
    pub fn failed_run(&self) -> Option<(Uuid, &str)> {
        match self {
            ChainError::Run { run_id, name, .. } => Some((*run_id, name.as_str())),
            _ => None,
        }
    }
}
