use std::collections::HashMap;

use chainstream::event::StreamEvent;
use chainstream::merge;
use serde_json::Value;
use uuid::Uuid;

/// Assert the per-run lifecycle ordering: start before every stream event,
/// stream events before the end event, nothing after a terminal event.
pub fn assert_lifecycle_order(events: &[StreamEvent]) {
    #[derive(PartialEq)]
    enum Seen {
        Started,
        Ended,
    }

    let mut runs: HashMap<Uuid, Seen> = HashMap::new();
    for event in events {
        match runs.get(&event.run_id) {
            None => {
                assert!(
                    event.is_start(),
                    "first event for run {} must be a start, got {}",
                    event.run_id,
                    event.event
                );
                runs.insert(event.run_id, Seen::Started);
            }
            Some(Seen::Started) => {
                assert!(
                    event.is_stream() || event.is_end(),
                    "unexpected {} after start for run {}",
                    event.event,
                    event.run_id
                );
                if event.is_end() {
                    runs.insert(event.run_id, Seen::Ended);
                }
            }
            Some(Seen::Ended) => {
                panic!("event {} after end for run {}", event.event, event.run_id)
            }
        }
    }
}

/// Assert the root run opens and closes the whole feed.
pub fn assert_root_brackets(events: &[StreamEvent]) {
    let first = events.first().expect("at least one event");
    let last = events.last().expect("at least one event");
    assert!(first.is_start(), "feed must open with the root start");
    assert!(last.is_end(), "feed must close with the root end");
    assert_eq!(first.run_id, last.run_id, "first and last events share the root run");
}

/// Fold each run's stream chunks and compare against the output its end
/// event reported.
pub fn assert_merge_round_trip(events: &[StreamEvent]) {
    let mut chunks: HashMap<Uuid, Vec<Value>> = HashMap::new();
    for event in events {
        if let Some(chunk) = &event.data.chunk {
            chunks.entry(event.run_id).or_default().push(chunk.clone());
        }
    }
    for event in events {
        if let Some(output) = &event.data.output {
            let streamed = chunks.remove(&event.run_id).unwrap_or_default();
            let folded = merge::fold_chunks(streamed)
                .expect("chunks of a finished run must merge")
                .unwrap_or(Value::Null);
            assert_eq!(
                &folded, output,
                "merged chunks must reproduce the end output for run {}",
                event.run_id
            );
        }
    }
}

/// Shape of one run's event history, independent of run ids and of sibling
/// interleaving: (name, tags, labels in order).
pub type RunShape = (String, Vec<String>, Vec<String>);

/// Group events by run in order of first appearance and project each run to
/// its shape. Two executions of the same composition produce equal shapes.
pub fn run_shapes(events: &[StreamEvent]) -> Vec<RunShape> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut shapes: HashMap<Uuid, RunShape> = HashMap::new();
    for event in events {
        let shape = shapes.entry(event.run_id).or_insert_with(|| {
            order.push(event.run_id);
            (event.name.clone(), event.tags.clone(), Vec::new())
        });
        shape.2.push(event.event.clone());
    }
    order.into_iter().map(|id| shapes.remove(&id).unwrap()).collect()
}
