//! Core types shared across the streaming orchestration core.
//!
//! [`RunnableKind`] is the closed set of node kinds a composition can contain.
//! The engine pattern-matches on it only to pick the event-name prefix
//! (`on_chain_*`, `on_llm_*`, ...) and the end-event payload convention; all
//! other execution logic is uniform across kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a runnable node within a composition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnableKind {
    /// Composed or generic runnable. The default for all shipped primitives.
    #[default]
    Chain,
    /// Completion-style language model.
    Llm,
    /// Chat-style language model.
    ChatModel,
    /// Tool invocation.
    Tool,
    /// Document retriever.
    Retriever,
    /// Prompt formatter.
    Prompt,
    /// Embedding model.
    Embedding,
    /// Output parser.
    Parser,
    /// Anything else; treated as chain-like for event payload purposes.
    Other,
}

impl RunnableKind {
    /// The event-name segment for this kind, as in `on_{kind}_{phase}`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnableKind::Chain | RunnableKind::Other => "chain",
            RunnableKind::Llm => "llm",
            RunnableKind::ChatModel => "chat_model",
            RunnableKind::Tool => "tool",
            RunnableKind::Retriever => "retriever",
            RunnableKind::Prompt => "prompt",
            RunnableKind::Embedding => "embedding",
            RunnableKind::Parser => "parser",
        }
    }

    /// Chain-like kinds report `{input, output}` in their end events; leaf
    /// kinds report `{output}` only since their input is already visible from
    /// their own start event.
    #[must_use]
    pub fn is_chain_like(&self) -> bool {
        matches!(self, RunnableKind::Chain | RunnableKind::Other)
    }
}

impl fmt::Display for RunnableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle phase of a run, in the order phases are observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventPhase {
    Start,
    Stream,
    End,
}

impl EventPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPhase::Start => "start",
            EventPhase::Stream => "stream",
            EventPhase::End => "end",
        }
    }
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
