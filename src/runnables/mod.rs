//! Composition primitives and the streamable-unit contract they share.
//!
//! Every node in a composition implements [`Runnable`]: it declares a name,
//! a kind, optional node-local tags and metadata, and produces its output as
//! a stream of incremental chunks. Event emission for a node is handled by
//! the engine wrapper around it, never by the node itself; a node only uses
//! its [`RunContext`](crate::context::RunContext) to derive contexts for the
//! children it runs.
//!
//! Shipped primitives:
//!
//! - [`Lambda`]: leaf unit wrapping a closure (single value or chunk stream)
//! - [`Sequence`]: strict in-order pipeline; each step receives the previous
//!   step's fully merged output
//! - [`Parallel`]: concurrent fan-out over named branches, fan-in as keyed
//!   chunks
//! - [`Passthrough`]: identity
//! - [`Pick`]: projects one branch out of a keyed upstream chunk stream

mod lambda;
mod parallel;
mod passthrough;
mod pick;
mod sequence;

pub use lambda::Lambda;
pub use parallel::Parallel;
pub use passthrough::Passthrough;
pub use pick::Pick;
pub use sequence::Sequence;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::context::RunContext;
use crate::error::ChainError;
use crate::merge;
use crate::types::RunnableKind;

/// A node's incremental output: chunks in production order, or the error that
/// terminated it.
pub type ChunkStream = BoxStream<'static, Result<Value, ChainError>>;

/// The minimal streamable-unit contract consumed by the execution engine.
#[async_trait]
pub trait Runnable: Send + Sync {
    /// Display name used in events; node-local overrides win over the
    /// primitive's inferred name.
    fn name(&self) -> String;

    /// Node kind; picks the event-name prefix and end-payload convention.
    fn kind(&self) -> RunnableKind {
        RunnableKind::Chain
    }

    /// Node-local tags, appended after inherited and synthetic tags.
    fn tags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Node-local metadata, shallow-merged over inherited metadata.
    fn metadata(&self) -> FxHashMap<String, Value> {
        FxHashMap::default()
    }

    /// Produce this node's own chunk stream for the given input.
    ///
    /// Implementations that run child nodes derive child contexts from `ctx`;
    /// leaf implementations may ignore it. A collaborator with no native
    /// incremental production streams its full output as one chunk.
    fn stream(&self, input: Value, ctx: RunContext) -> ChunkStream;

    /// Single-shot execution: fold the chunk stream through the merger.
    async fn invoke(&self, input: Value, ctx: RunContext) -> Result<Value, ChainError> {
        let mut chunks = self.stream(input, ctx);
        let mut acc: Option<Value> = None;
        while let Some(chunk) = chunks.next().await {
            acc = Some(merge::merge(acc.take(), chunk?)?);
        }
        Ok(acc.unwrap_or(Value::Null))
    }
}
