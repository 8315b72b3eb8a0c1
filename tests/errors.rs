mod common;

use std::sync::Arc;

use chainstream::error::ChainError;
use chainstream::merge::MergeError;
use chainstream::runnables::{Lambda, Sequence};
use chainstream::streaming::{StreamEventsConfig, stream_events};
use common::*;
use futures_util::StreamExt;
use futures_util::stream;
use serde_json::{Value, json};

async fn run_to_failure(
    node: Arc<dyn chainstream::runnables::Runnable>,
) -> (Vec<chainstream::event::StreamEvent>, ChainError) {
    let mut stream = stream_events(node, json!("hello"), StreamEventsConfig::v1()).unwrap();
    let mut events = Vec::new();
    loop {
        match stream.next().await {
            Some(Ok(event)) => events.push(event),
            Some(Err(err)) => return (events, err),
            None => panic!("execution was expected to fail"),
        }
    }
}

#[tokio::test]
async fn failing_step_is_named_in_the_terminal_error() {
    init_tracing();
    let chain = Sequence::new(vec![
        Arc::new(reverse("1")),
        Arc::new(failing("2")),
        Arc::new(reverse("3")),
    ]);
    let (events, err) = run_to_failure(Arc::new(chain)).await;

    let (failed_id, failed_name) = err.failed_run().expect("failure is attributed");
    assert_eq!(failed_name, "2");
    assert!(err.to_string().contains("'2'"));

    // Everything before the failure is still a valid prefix.
    assert_lifecycle_order(&events);
    assert!(events.iter().any(|e| e.name == "1" && e.is_end()));
    let failed_start = events
        .iter()
        .find(|e| e.run_id == failed_id)
        .expect("the failing run started");
    assert!(failed_start.is_start());

    // Nothing terminal for the failed run or its ancestors, and step 3
    // never starts.
    assert!(!events.iter().any(|e| e.run_id == failed_id && e.is_end()));
    assert!(!events.iter().any(|e| e.name == "sequence" && e.is_end()));
    assert!(!events.iter().any(|e| e.name == "3"));
}

#[tokio::test]
async fn attribution_keeps_the_original_failure_as_source() {
    let (_, err) = run_to_failure(Arc::new(failing("boom"))).await;
    match err {
        ChainError::Run { name, source, .. } => {
            assert_eq!(name, "boom");
            assert!(matches!(*source, ChainError::Execution { .. }));
        }
        other => panic!("expected an attributed failure, got {other}"),
    }
}

#[tokio::test]
async fn attribution_is_not_rewrapped_while_propagating() {
    // The leaf fails two levels below the root; the error must still name
    // the leaf, not an enclosing sequence.
    let inner = Sequence::new(vec![Arc::new(failing("leaf"))]).with_name("inner");
    let outer = Sequence::new(vec![Arc::new(inner)]).with_name("outer");
    let (_, err) = run_to_failure(Arc::new(outer)).await;

    assert_eq!(err.failed_run().unwrap().1, "leaf");
}

#[tokio::test]
async fn incompatible_chunks_fail_the_producing_run() {
    let drifting = Lambda::streaming("drifting", |_input: Value| {
        stream::iter(vec![Ok(json!("text")), Ok(json!([1, 2]))]).boxed()
    });
    let (events, err) = run_to_failure(Arc::new(drifting)).await;

    assert_eq!(err.failed_run().unwrap().1, "drifting");
    match err {
        ChainError::Run { source, .. } => {
            assert!(matches!(
                *source,
                ChainError::Merge(MergeError::Incompatible { left: "string", right: "array" })
            ));
        }
        other => panic!("expected an attributed merge failure, got {other}"),
    }

    // Both chunks were already on the feed before the merge failed.
    assert_eq!(events.iter().filter(|e| e.is_stream()).count(), 2);
}

#[tokio::test]
async fn stream_error_from_the_body_propagates() {
    let flaky = Lambda::streaming("flaky", |_input: Value| {
        stream::iter(vec![
            Ok(json!("partial")),
            Err(ChainError::execution("socket dropped")),
        ])
        .boxed()
    });
    let (events, err) = run_to_failure(Arc::new(flaky)).await;

    assert_eq!(err.failed_run().unwrap().1, "flaky");
    assert!(err.to_string().contains("socket dropped"));
    assert!(events.iter().any(|e| e.data.chunk == Some(json!("partial"))));
}
