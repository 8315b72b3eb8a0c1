//! Parallel fan-out over named branches, fan-in as keyed chunks.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use super::{ChunkStream, Runnable};
use crate::context::RunContext;
use crate::engine::{self, ChildMsg};
use crate::error::ChainError;

/// Runs every branch concurrently against the same input.
///
/// Each branch streams independently under its own run, tagged
/// `map:key:{branch}`. The parallel node's own aggregate stream emits one
/// `{branch: chunk}` object per branch chunk, so its merged output is the
/// key-wise merge of the per-branch merged outputs, built incrementally in
/// arrival order. The first failing branch aborts its siblings (best effort)
/// and propagates as the parallel node's own failure; there is no
/// partial-success mode.
pub struct Parallel {
    name: String,
    tags: Vec<String>,
    metadata: FxHashMap<String, Value>,
    branches: Vec<(String, Arc<dyn Runnable>)>,
}

impl Parallel {
    pub fn new() -> Self {
        Self {
            name: "parallel".to_string(),
            tags: Vec::new(),
            metadata: FxHashMap::default(),
            branches: Vec::new(),
        }
    }

    /// Add a named branch. Branch start order follows insertion order.
    #[must_use]
    pub fn branch(mut self, key: impl Into<String>, node: impl Runnable + 'static) -> Self {
        self.branches.push((key.into(), Arc::new(node)));
        self
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

impl Default for Parallel {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable for Parallel {
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
        let branches = self.branches.clone();
        let (tx, rx) = flume::unbounded::<Result<Value, ChainError>>();

        tokio::spawn(async move {
            let mut taps = Vec::with_capacity(branches.len());
            let mut handles = Vec::with_capacity(branches.len());
            for (key, node) in &branches {
                let scope = [format!("map:key:{key}")];
                let child_ctx = ctx.child(node.as_ref(), &scope);
                let run = engine::spawn_run(Arc::clone(node), input.clone(), child_ctx);
                handles.push(run.task);
                let key = key.clone();
                taps.push(
                    run.messages
                        .into_stream()
                        .map(move |msg| (key.clone(), msg))
                        .boxed(),
                );
            }

            let mut fan_in = stream::select_all(taps);
            let mut failure: Option<ChainError> = None;
            while let Some((key, msg)) = fan_in.next().await {
                match msg {
                    ChildMsg::Chunk(chunk) => {
                        let mut keyed = Map::new();
                        keyed.insert(key, chunk);
                        if tx.send(Ok(Value::Object(keyed))).is_err() {
                            return;
                        }
                    }
                    // Fan-in completes when every branch tap closes.
                    ChildMsg::Done(Ok(_)) => {}
                    ChildMsg::Done(Err(err)) => {
                        failure = Some(err);
                        break;
                    }
                }
            }

            if let Some(err) = failure {
                for task in &handles {
                    task.abort();
                }
                let _ = tx.send(Err(err));
            }
        });

        rx.into_stream().boxed()
    }
}
