//! Identity node: streams its input straight through.

use futures_util::StreamExt;
use futures_util::stream;
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{ChunkStream, Runnable};
use crate::context::RunContext;

/// Streams whatever input it receives, unchanged, as a single chunk.
#[derive(Clone, Default)]
pub struct Passthrough {
    name: Option<String>,
    tags: Vec<String>,
    metadata: FxHashMap<String, Value>,
}

impl Passthrough {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
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

impl Runnable for Passthrough {
    fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| "passthrough".to_string())
    }

    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn metadata(&self) -> FxHashMap<String, Value> {
        self.metadata.clone()
    }

    fn stream(&self, input: Value, _ctx: RunContext) -> ChunkStream {
        stream::once(async move { Ok(input) }).boxed()
    }
}
