//! Leaf unit wrapping a user function.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{ChunkStream, Runnable};
use crate::context::RunContext;
use crate::error::ChainError;
use crate::types::RunnableKind;

type SyncFn = dyn Fn(Value) -> Result<Value, ChainError> + Send + Sync;
type StreamFn = dyn Fn(Value) -> ChunkStream + Send + Sync;

#[derive(Clone)]
enum LambdaBody {
    Sync(Arc<SyncFn>),
    Streaming(Arc<StreamFn>),
}

/// Wraps a single-input function as a runnable.
///
/// A sync body produces its return value as one chunk; a streaming body
/// forwards each produced value as its own chunk.
///
/// ```
/// use chainstream::runnables::Lambda;
/// use serde_json::Value;
///
/// let reverse = Lambda::new("reverse", |input: Value| {
///     let text = input.as_str().unwrap_or_default();
///     Ok(Value::String(text.chars().rev().collect()))
/// });
/// ```
#[derive(Clone)]
pub struct Lambda {
    name: String,
    kind: RunnableKind,
    tags: Vec<String>,
    metadata: FxHashMap<String, Value>,
    body: LambdaBody,
}

impl Lambda {
    /// Lambda producing its whole output as a single chunk.
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(Value) -> Result<Value, ChainError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RunnableKind::Chain,
            tags: Vec::new(),
            metadata: FxHashMap::default(),
            body: LambdaBody::Sync(Arc::new(body)),
        }
    }

    /// Lambda producing its output incrementally.
    pub fn streaming(
        name: impl Into<String>,
        body: impl Fn(Value) -> ChunkStream + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RunnableKind::Chain,
            tags: Vec::new(),
            metadata: FxHashMap::default(),
            body: LambdaBody::Streaming(Arc::new(body)),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: RunnableKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl Runnable for Lambda {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> RunnableKind {
        self.kind
    }

    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn metadata(&self) -> FxHashMap<String, Value> {
        self.metadata.clone()
    }

    fn stream(&self, input: Value, _ctx: RunContext) -> ChunkStream {
        match &self.body {
            LambdaBody::Sync(body) => {
                let body = Arc::clone(body);
                stream::once(async move { body(input) }).boxed()
            }
            LambdaBody::Streaming(body) => body(input),
        }
    }
}
