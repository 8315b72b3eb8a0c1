//! Run tree tracking: per-run identity and inherited configuration.
//!
//! A [`RunContext`] is created for every execution of every node, carries the
//! identity fields that populate each event (run id, name, kind, tags,
//! metadata), and links the run to its parent. Deriving a child context is
//! the only way inheritance happens: tags append (inherited first, then
//! synthetic composition tags, then node-local tags), metadata shallow-merges
//! with node-local keys winning, and a fresh run id is generated every time.

use rustc_hash::FxHashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::runnables::Runnable;
use crate::tracer::EventTracer;
use crate::types::RunnableKind;

/// Identity and inherited configuration for one run.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub parent_run_id: Option<Uuid>,
    pub name: String,
    pub kind: RunnableKind,
    pub tags: Vec<String>,
    pub metadata: FxHashMap<String, Value>,
    pub(crate) tracer: EventTracer,
}

impl RunContext {
    pub(crate) fn root(node: &dyn Runnable, run_id: Option<Uuid>, tracer: EventTracer) -> Self {
        Self {
            run_id: run_id.unwrap_or_else(Uuid::new_v4),
            parent_run_id: None,
            name: node.name(),
            kind: node.kind(),
            tags: node.tags(),
            metadata: node.metadata(),
            tracer,
        }
    }

    /// Context for a single-shot invocation with no event consumer attached.
    #[must_use]
    pub fn detached(node: &dyn Runnable) -> Self {
        Self::root(node, None, EventTracer::disabled())
    }

    /// Derive the context for a child run of `node`.
    ///
    /// `scope_tags` are the synthetic composition-position tags (for example
    /// `seq:step:2` or `map:key:reversed`); once appended they are
    /// indistinguishable from user tags, which downstream filtering relies on.
    #[must_use]
    pub fn child(&self, node: &dyn Runnable, scope_tags: &[String]) -> Self {
        let mut tags = self.tags.clone();
        tags.extend(scope_tags.iter().cloned());
        tags.extend(node.tags());

        let mut metadata = self.metadata.clone();
        metadata.extend(node.metadata());

        Self {
            run_id: Uuid::new_v4(),
            parent_run_id: Some(self.run_id),
            name: node.name(),
            kind: node.kind(),
            tags,
            metadata,
            tracer: self.tracer.clone(),
        }
    }
}
