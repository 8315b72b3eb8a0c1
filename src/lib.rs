//! # Chainstream: Event-Streaming Orchestration Core
//!
//! Chainstream runs an arbitrary composition of chained and parallel
//! processing units ("runnables") and produces a single, correctly-ordered
//! stream of lifecycle events (start/stream/end) while the composition
//! executes, with nested sub-runs, fan-out/fan-in, filtering and optional
//! Server-Sent-Events encoding.
//!
//! ## Core Concepts
//!
//! - **Runnables**: Async units that stream their output as incremental chunks
//! - **Runs**: One execution of one node, with a unique id, inherited tags and
//!   metadata, and a parent link forming the run tree
//! - **Events**: Immutable records of run transitions, pushed to an unbounded
//!   queue the moment they happen
//! - **Merging**: Type-directed rules that fold a run's chunks into its final
//!   output
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chainstream::runnables::{Lambda, Sequence};
//! use chainstream::streaming::{stream_events, StreamEventsConfig};
//! use serde_json::{json, Value};
//!
//! # async fn demo() -> Result<(), chainstream::error::ChainError> {
//! let chain = Sequence::new(vec![]).then(Lambda::new("shout", |input: Value| {
//!     let text = input.as_str().unwrap_or_default();
//!     Ok(Value::String(text.to_uppercase()))
//! }));
//!
//! let mut events = stream_events(Arc::new(chain), json!("hello"), StreamEventsConfig::v1())?;
//! while let Some(event) = events.next().await {
//!     println!("{}", event?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Ordering Guarantees
//!
//! For every run, its start event precedes every stream event, which precede
//! its end event; a child's start follows its parent's start and a child's
//! end precedes its parent's end; the root's start is the first event and
//! the root's end (or terminal error) is the last. Sibling runs interleave
//! freely beyond that.
//!
//! ## Module Guide
//!
//! - [`runnables`] - The `Runnable` contract and composition primitives
//! - [`streaming`] - `stream_events`, the pull-based event stream and filters
//! - [`merge`] - Chunk merging rules
//! - [`event`] - The event record and its wire shape
//! - [`context`] - Run tree tracking and inheritance
//! - [`tracer`] - The per-execution event collector
//! - [`sse`] - Server-Sent-Events encoding
//! - [`error`] - Error taxonomy

pub mod context;
pub mod error;
pub mod event;
pub mod merge;
pub mod runnables;
pub mod sse;
pub mod streaming;
pub mod tracer;
pub mod types;

pub(crate) mod engine;
