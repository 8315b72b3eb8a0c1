//! Traced execution of a single run.
//!
//! [`spawn_run`] is the one place a run comes to life: one tokio task per
//! run drives the node's chunk stream, reports every transition to the
//! tracer, folds chunks into the run's exclusively-owned accumulator, and
//! taps chunks to the parent composition through a private channel. A failed
//! tracer push means the consumer is gone; the task winds down without
//! reporting further.

use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::context::RunContext;
use crate::error::ChainError;
use crate::merge;
use crate::runnables::Runnable;
use crate::tracer::TracerError;

/// Messages a run sends to the composition that started it.
pub(crate) enum ChildMsg {
    /// One streamed chunk, in production order.
    Chunk(Value),
    /// Terminal report: the run's merged output, or the attributed failure.
    Done(Result<Value, ChainError>),
}

pub(crate) struct RunHandle {
    pub(crate) messages: flume::Receiver<ChildMsg>,
    pub(crate) task: JoinHandle<()>,
}

/// Start one run as a background task.
pub(crate) fn spawn_run(node: Arc<dyn Runnable>, input: Value, ctx: RunContext) -> RunHandle {
    let (tx, rx) = flume::unbounded();
    let task = tokio::spawn(drive(node, input, ctx, tx));
    RunHandle { messages: rx, task }
}

async fn drive(node: Arc<dyn Runnable>, input: Value, ctx: RunContext, tx: flume::Sender<ChildMsg>) {
    let tracer = ctx.tracer.clone();

    match tracer.on_start(&ctx, Some(input.clone())).await {
        Ok(()) => {}
        Err(TracerError::Closed) => return,
        Err(err) => {
            report_failure(&ctx, &tx, ChainError::from(err));
            return;
        }
    }

    let mut chunks = node.stream(input, ctx.clone());
    let mut acc: Option<Value> = None;
    while let Some(item) = chunks.next().await {
        match item {
            Ok(chunk) => {
                match tracer.on_chunk(&ctx, chunk.clone()).await {
                    Ok(()) => {}
                    Err(TracerError::Closed) => return,
                    Err(err) => {
                        fail(&tracer, &ctx, &tx, ChainError::from(err));
                        return;
                    }
                }
                match merge::merge(acc.take(), chunk.clone()) {
                    Ok(merged) => acc = Some(merged),
                    Err(err) => {
                        fail(&tracer, &ctx, &tx, ChainError::from(err));
                        return;
                    }
                }
                // Parent may not care about the tap (intermediate sequence
                // steps); a failed tap send is not a cancellation signal.
                let _ = tx.send(ChildMsg::Chunk(chunk));
            }
            Err(err) => {
                fail(&tracer, &ctx, &tx, err);
                return;
            }
        }
    }

    let output = acc.unwrap_or(Value::Null);
    match tracer.on_end(&ctx, output.clone()).await {
        Ok(()) => {
            let _ = tx.send(ChildMsg::Done(Ok(output)));
        }
        Err(TracerError::Closed) => {}
        Err(err) => report_failure(&ctx, &tx, ChainError::from(err)),
    }
}

/// Mark the run errored and report the attributed failure to the parent.
fn fail(
    tracer: &crate::tracer::EventTracer,
    ctx: &RunContext,
    tx: &flume::Sender<ChildMsg>,
    err: ChainError,
) {
    if let Err(trace_err) = tracer.on_error(ctx) {
        tracing::debug!(
            run_id = %ctx.run_id,
            error = %trace_err,
            "could not record errored transition"
        );
    }
    report_failure(ctx, tx, err);
}

fn report_failure(ctx: &RunContext, tx: &flume::Sender<ChildMsg>, err: ChainError) {
    let err = err.attributed(ctx.run_id, &ctx.name);
    tracing::debug!(run_id = %ctx.run_id, name = %ctx.name, error = %err, "run failed");
    let _ = tx.send(ChildMsg::Done(Err(err)));
}
