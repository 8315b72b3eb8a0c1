//! Sequential composition: each step consumes its predecessor's merged output.

use std::sync::Arc;

use futures_util::StreamExt;
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{ChunkStream, Runnable};
use crate::context::RunContext;
use crate::engine::{self, ChildMsg};
use crate::error::ChainError;

/// Children executed strictly in order.
///
/// Step *i+1* receives the fully merged output of step *i*, never its raw
/// chunks, so every step waits for its predecessor's stream to complete.
/// Each step still streams its own chunks as independent events under its
/// own run, tagged `seq:step:{n}` (1-based); the sequence's own aggregate
/// stream re-emits the last step's chunks. A failing step aborts the
/// remaining steps and propagates as the sequence's own failure.
pub struct Sequence {
    name: String,
    tags: Vec<String>,
    metadata: FxHashMap<String, Value>,
    steps: Vec<Arc<dyn Runnable>>,
}

impl Sequence {
    pub fn new(steps: Vec<Arc<dyn Runnable>>) -> Self {
        Self {
            name: "sequence".to_string(),
            tags: Vec::new(),
            metadata: FxHashMap::default(),
            steps,
        }
    }

    /// Append one more step.
    #[must_use]
    pub fn then(mut self, step: impl Runnable + 'static) -> Self {
        self.steps.push(Arc::new(step));
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

impl Runnable for Sequence {
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
        let steps = self.steps.clone();
        let (tx, rx) = flume::unbounded::<Result<Value, ChainError>>();

        tokio::spawn(async move {
            let total = steps.len();
            let mut input = input;
            for (idx, step) in steps.iter().enumerate() {
                let scope = [format!("seq:step:{}", idx + 1)];
                let child_ctx = ctx.child(step.as_ref(), &scope);
                let run = engine::spawn_run(Arc::clone(step), input.clone(), child_ctx);
                let is_last = idx + 1 == total;

                let mut outcome: Option<Result<Value, ChainError>> = None;
                while let Ok(msg) = run.messages.recv_async().await {
                    match msg {
                        ChildMsg::Chunk(chunk) => {
                            // Only the last step's chunks become the
                            // sequence's own aggregate stream.
                            if is_last && tx.send(Ok(chunk)).is_err() {
                                return;
                            }
                        }
                        ChildMsg::Done(result) => outcome = Some(result),
                    }
                }

                match outcome {
                    Some(Ok(output)) => input = output,
                    Some(Err(err)) => {
                        let _ = tx.send(Err(err));
                        return;
                    }
                    // Child wound down without reporting: cancelled.
                    None => return,
                }
            }
        });

        rx.into_stream().boxed()
    }
}
