//! The event collector attached to one root execution.
//!
//! Every run in the execution tree reports its transitions here. The tracer
//! enforces the per-run state machine (`Running -> Streaming* -> Ended |
//! Errored`), retains each run's input so chain-like end events can report it,
//! and pushes every event onto the shared unbounded queue the moment it is
//! produced. Producers never block on the queue; a failed push means the
//! consumer is gone and doubles as the cooperative-cancellation signal.

use std::sync::{Arc, Mutex};

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::context::RunContext;
use crate::event::{EventData, StreamEvent};
use crate::types::{EventPhase, RunnableKind};

/// How event delivery relates to the emitting run's own await chain.
///
/// `Awaited` (the default) suspends the emitter until the event is enqueued;
/// `Backgrounded` enqueues without suspending. Both preserve queue order, the
/// difference is only when the side effect completes relative to the emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    #[default]
    Awaited,
    Backgrounded,
}

/// Errors raised by tracer callbacks.
#[derive(Debug, Error, Diagnostic)]
pub enum TracerError {
    /// The consumer dropped the event stream; producers should wind down.
    #[error("event queue closed by consumer")]
    #[diagnostic(code(chainstream::tracer::closed))]
    Closed,

    /// A lifecycle callback arrived out of order for the given run.
    #[error("out-of-order tracer call for run {run_id}: {what}")]
    #[diagnostic(
        code(chainstream::tracer::out_of_order),
        help("start must precede chunk and end calls, and a run may only reach one terminal state")
    )]
    OutOfOrder { run_id: Uuid, what: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunPhase {
    Running,
    Streaming,
    Ended,
    Errored,
}

#[derive(Debug)]
struct RunEntry {
    phase: RunPhase,
    kind: RunnableKind,
    input: Option<Value>,
}

/// Cheap-to-clone handle shared by every run of one root execution.
#[derive(Clone, Debug)]
pub struct EventTracer {
    sender: Option<flume::Sender<StreamEvent>>,
    runs: Arc<Mutex<FxHashMap<Uuid, RunEntry>>>,
    delivery: DeliveryMode,
}

impl EventTracer {
    pub(crate) fn new(sender: flume::Sender<StreamEvent>, delivery: DeliveryMode) -> Self {
        Self {
            sender: Some(sender),
            runs: Arc::new(Mutex::new(FxHashMap::default())),
            delivery,
        }
    }

    /// Tracer that keeps the run state machine but delivers no events.
    /// Used by single-shot invocation where nothing consumes the queue.
    pub(crate) fn disabled() -> Self {
        Self {
            sender: None,
            runs: Arc::new(Mutex::new(FxHashMap::default())),
            delivery: DeliveryMode::Awaited,
        }
    }

    async fn send(&self, event: StreamEvent) -> Result<(), TracerError> {
        let Some(sender) = &self.sender else {
            return Ok(());
        };
        match self.delivery {
            DeliveryMode::Awaited => sender
                .send_async(event)
                .await
                .map_err(|_| TracerError::Closed),
            DeliveryMode::Backgrounded => sender.send(event).map_err(|_| TracerError::Closed),
        }
    }

    fn event(&self, ctx: &RunContext, phase: EventPhase, data: EventData) -> StreamEvent {
        StreamEvent {
            event: StreamEvent::label(ctx.kind, phase),
            run_id: ctx.run_id,
            name: ctx.name.clone(),
            tags: ctx.tags.clone(),
            metadata: ctx.metadata.clone(),
            data,
        }
    }

    /// Record a run's `PENDING -> RUNNING` transition and emit its start event.
    pub(crate) async fn on_start(
        &self,
        ctx: &RunContext,
        input: Option<Value>,
    ) -> Result<(), TracerError> {
        {
            let mut runs = self.runs.lock().unwrap();
            if runs.contains_key(&ctx.run_id) {
                return Err(TracerError::OutOfOrder {
                    run_id: ctx.run_id,
                    what: "duplicate start",
                });
            }
            runs.insert(
                ctx.run_id,
                RunEntry {
                    phase: RunPhase::Running,
                    kind: ctx.kind,
                    input: input.clone(),
                },
            );
        }
        let data = match input {
            Some(input) => EventData::input(input),
            None => EventData::default(),
        };
        self.send(self.event(ctx, EventPhase::Start, data)).await
    }

    /// Record one streamed chunk and emit its stream event.
    pub(crate) async fn on_chunk(&self, ctx: &RunContext, chunk: Value) -> Result<(), TracerError> {
        {
            let mut runs = self.runs.lock().unwrap();
            match runs.get_mut(&ctx.run_id) {
                None => {
                    return Err(TracerError::OutOfOrder {
                        run_id: ctx.run_id,
                        what: "chunk before start",
                    });
                }
                Some(entry) if matches!(entry.phase, RunPhase::Ended | RunPhase::Errored) => {
                    return Err(TracerError::OutOfOrder {
                        run_id: ctx.run_id,
                        what: "chunk after terminal state",
                    });
                }
                Some(entry) => entry.phase = RunPhase::Streaming,
            }
        }
        self.send(self.event(ctx, EventPhase::Stream, EventData::chunk(chunk)))
            .await
    }

    /// Record a run's terminal `ENDED` transition and emit its end event with
    /// the final merged output. Chain-like runs also report their retained
    /// input.
    pub(crate) async fn on_end(&self, ctx: &RunContext, output: Value) -> Result<(), TracerError> {
        let input = {
            let mut runs = self.runs.lock().unwrap();
            match runs.get_mut(&ctx.run_id) {
                None => {
                    return Err(TracerError::OutOfOrder {
                        run_id: ctx.run_id,
                        what: "end before start",
                    });
                }
                Some(entry) if matches!(entry.phase, RunPhase::Ended | RunPhase::Errored) => {
                    return Err(TracerError::OutOfOrder {
                        run_id: ctx.run_id,
                        what: "end after terminal state",
                    });
                }
                Some(entry) => {
                    entry.phase = RunPhase::Ended;
                    if entry.kind.is_chain_like() {
                        entry.input.take()
                    } else {
                        None
                    }
                }
            }
        };
        self.send(self.event(ctx, EventPhase::End, EventData::output(input, output)))
            .await
    }

    /// Record a run's terminal `ERRORED` transition. No event is enqueued;
    /// error and end are mutually exclusive, and the failure itself is
    /// surfaced to the consumer as the stream's terminal error.
    pub(crate) fn on_error(&self, ctx: &RunContext) -> Result<(), TracerError> {
        let mut runs = self.runs.lock().unwrap();
        match runs.get_mut(&ctx.run_id) {
            None => Err(TracerError::OutOfOrder {
                run_id: ctx.run_id,
                what: "error before start",
            }),
            Some(entry) if matches!(entry.phase, RunPhase::Ended | RunPhase::Errored) => {
                Err(TracerError::OutOfOrder {
                    run_id: ctx.run_id,
                    what: "error after terminal state",
                })
            }
            Some(entry) => {
                entry.phase = RunPhase::Errored;
                Ok(())
            }
        }
    }
}
