//! The event stream assembler: bridges eager, callback-driven event
//! production with a pull-based consumer.
//!
//! [`stream_events`] validates the caller's configuration eagerly, attaches a
//! fresh tracer to the composition, starts the root run as a background task
//! and hands back an [`EventStream`] the caller pulls filtered events from.
//! Dropping the stream before exhaustion cancels the execution cooperatively:
//! producers notice the closed queue and stop requesting work, while
//! already-started runs reach a terminal state on their own.

mod filter;

pub use filter::EventFilter;

use std::sync::Arc;

use futures_util::stream::{self, Stream};
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::context::RunContext;
use crate::engine::{self, ChildMsg};
use crate::error::ChainError;
use crate::event::StreamEvent;
use crate::runnables::Runnable;
use crate::sse;
use crate::tracer::{DeliveryMode, EventTracer};

/// The only protocol version this core speaks.
pub const VERSION_V1: &str = "v1";

/// Configuration for one `stream_events` call.
#[derive(Clone, Debug)]
pub struct StreamEventsConfig {
    version: String,
    run_id: Option<Uuid>,
    filter: EventFilter,
    delivery: DeliveryMode,
}

impl Default for StreamEventsConfig {
    fn default() -> Self {
        Self::v1()
    }
}

impl StreamEventsConfig {
    /// Version-1 protocol semantics with no filtering.
    pub fn v1() -> Self {
        Self {
            version: VERSION_V1.to_string(),
            run_id: None,
            filter: EventFilter::default(),
            delivery: DeliveryMode::default(),
        }
    }

    /// Request a specific protocol version; validated when the stream is
    /// created, before any execution begins.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Pin the root run id, e.g. for correlating with an external system.
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    /// See [`DeliveryMode`]; event ordering is identical in both modes.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }
}

/// Run a composition and stream its lifecycle events.
///
/// The returned stream is single-pass and non-restartable. A failing run
/// surfaces as the terminal `Err` item after the events produced before the
/// failure; those events remain valid.
pub fn stream_events(
    node: Arc<dyn Runnable>,
    input: Value,
    config: StreamEventsConfig,
) -> Result<EventStream, ChainError> {
    if config.version != VERSION_V1 {
        return Err(ChainError::UnsupportedVersion {
            requested: config.version,
        });
    }
    config.filter.validate()?;

    let (event_tx, event_rx) = flume::unbounded();
    let tracer = EventTracer::new(event_tx, config.delivery);
    let ctx = RunContext::root(node.as_ref(), config.run_id, tracer);
    let root_id = ctx.run_id;

    let run = engine::spawn_run(node, input, ctx);
    let (outcome_tx, outcome_rx) = oneshot::channel();
    tokio::spawn(async move {
        let mut outcome: Result<Value, ChainError> = Ok(Value::Null);
        while let Ok(msg) = run.messages.recv_async().await {
            if let ChildMsg::Done(result) = msg {
                outcome = result;
            }
        }
        match &outcome {
            Ok(_) => tracing::debug!(run_id = %root_id, "root run completed"),
            Err(err) => tracing::debug!(run_id = %root_id, error = %err, "root run failed"),
        }
        let _ = outcome_tx.send(outcome);
    });

    Ok(EventStream {
        events: event_rx,
        outcome: Some(outcome_rx),
        filter: config.filter,
    })
}

/// Pull side of one root execution's event feed.
#[derive(Debug)]
pub struct EventStream {
    events: flume::Receiver<StreamEvent>,
    outcome: Option<oneshot::Receiver<Result<Value, ChainError>>>,
    filter: EventFilter,
}

impl EventStream {
    /// Next passing event, or the terminal error once the execution has
    /// failed and the queue has drained. `None` means clean exhaustion.
    pub async fn next(&mut self) -> Option<Result<StreamEvent, ChainError>> {
        loop {
            match self.events.recv_async().await {
                Ok(event) => {
                    // Filtered-out events are dropped, never buffered; they
                    // do not count toward consumer-visible ordering.
                    if self.filter.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(_) => {
                    let outcome = self.outcome.take()?;
                    return match outcome.await {
                        Ok(Err(err)) => Some(Err(err)),
                        Ok(Ok(_)) | Err(_) => None,
                    };
                }
            }
        }
    }

    /// Adapt into a [`futures_util::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<StreamEvent, ChainError>> + Send {
        stream::unfold(self, |mut events| async move {
            events.next().await.map(|item| (item, events))
        })
    }

    /// Adapt into Server-Sent-Events wire frames; see [`crate::sse`].
    pub fn into_sse(self) -> impl Stream<Item = Result<String, ChainError>> + Send {
        sse::frame_stream(self)
    }

    /// Drain the stream, failing on the first error.
    pub async fn collect(mut self) -> Result<Vec<StreamEvent>, ChainError> {
        let mut out = Vec::new();
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}
