//! The uniform event record emitted for every run transition.
//!
//! A [`StreamEvent`] is immutable once constructed and serializes directly to
//! the wire JSON used by the SSE encoder:
//!
//! ```json
//! {
//!   "event": "on_chain_start",
//!   "run_id": "<uuid>",
//!   "name": "my-chain",
//!   "tags": ["seq:step:1"],
//!   "metadata": {},
//!   "data": {"input": "hello"}
//! }
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::types::{EventPhase, RunnableKind};

/// Payload of a [`StreamEvent`]; which fields are present depends on the
/// phase. Start events carry `input` (when known), stream events carry
/// `chunk`, end events carry `output` and, for chain-like runs, `input`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<Value>,
}

impl EventData {
    pub fn input(input: Value) -> Self {
        Self {
            input: Some(input),
            ..Default::default()
        }
    }

    pub fn chunk(chunk: Value) -> Self {
        Self {
            chunk: Some(chunk),
            ..Default::default()
        }
    }

    pub fn output(input: Option<Value>, output: Value) -> Self {
        Self {
            input,
            output: Some(output),
            chunk: None,
        }
    }
}

/// One lifecycle event derived from one run transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Event label of the form `on_{kind}_{phase}`, e.g. `on_llm_stream`.
    pub event: String,
    /// Unique id of the run this event belongs to.
    pub run_id: Uuid,
    /// Display name of the runnable that produced the event.
    pub name: String,
    /// Inherited tags, synthetic composition tags, then node-local tags.
    pub tags: Vec<String>,
    /// Inherited metadata shallow-merged with node-local metadata.
    pub metadata: FxHashMap<String, Value>,
    /// Phase-dependent payload.
    pub data: EventData,
}

impl StreamEvent {
    /// Compose the event label for a kind and phase.
    #[must_use]
    pub fn label(kind: RunnableKind, phase: EventPhase) -> String {
        format!("on_{}_{}", kind.as_str(), phase.as_str())
    }

    pub fn is_start(&self) -> bool {
        self.event.ends_with("_start")
    }

    pub fn is_stream(&self) -> bool {
        self.event.ends_with("_stream")
    }

    pub fn is_end(&self) -> bool {
        self.event.ends_with("_end")
    }
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.event, self.name, self.run_id)
    }
}
