//! Projects one field out of a keyed upstream chunk stream.

use std::sync::Arc;

use futures_util::StreamExt;
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{ChunkStream, Runnable};
use crate::context::RunContext;
use crate::engine::{self, ChildMsg};
use crate::error::ChainError;
use crate::merge;

/// Subscribes to an upstream producer of keyed chunks and re-emits only the
/// chunks of one key.
///
/// When the upstream is a [`Parallel`](super::Parallel) this yields exactly
/// that branch's incremental merge. Keyed chunks missing the picked key are
/// skipped; a non-keyed chunk is a [`ChainError::PickShape`] error.
pub struct Pick {
    name: String,
    key: String,
    upstream: Arc<dyn Runnable>,
    tags: Vec<String>,
    metadata: FxHashMap<String, Value>,
}

impl Pick {
    pub fn new(upstream: impl Runnable + 'static, key: impl Into<String>) -> Self {
        Self::from_arc(Arc::new(upstream), key)
    }

    pub fn from_arc(upstream: Arc<dyn Runnable>, key: impl Into<String>) -> Self {
        Self {
            name: "pick".to_string(),
            key: key.into(),
            upstream,
            tags: Vec::new(),
            metadata: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
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

impl Runnable for Pick {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn metadata(&self) -> FxHashMap<String, Value> {
        self.metadata.clone()
    }

    fn stream(&self, input: Value, ctx: RunContext) -> ChunkStream {
        let upstream = Arc::clone(&self.upstream);
        let key = self.key.clone();
        let (tx, rx) = flume::unbounded::<Result<Value, ChainError>>();

        tokio::spawn(async move {
            let child_ctx = ctx.child(upstream.as_ref(), &[]);
            let run = engine::spawn_run(upstream, input, child_ctx);
            while let Ok(msg) = run.messages.recv_async().await {
                match msg {
                    ChildMsg::Chunk(Value::Object(mut keyed)) => {
                        if let Some(projected) = keyed.remove(&key)
                            && tx.send(Ok(projected)).is_err()
                        {
                            return;
                        }
                    }
                    ChildMsg::Chunk(other) => {
                        // The upstream run is of no further use; stop it
                        // instead of letting it stream into a failed pick.
                        run.task.abort();
                        let _ = tx.send(Err(ChainError::PickShape {
                            got: merge::value_type(&other),
                        }));
                        return;
                    }
                    ChildMsg::Done(Err(err)) => {
                        run.task.abort();
                        let _ = tx.send(Err(err));
                        return;
                    }
                    ChildMsg::Done(Ok(_)) => {}
                }
            }
        });

        rx.into_stream().boxed()
    }
}
