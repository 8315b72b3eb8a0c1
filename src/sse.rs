//! Server-Sent-Events wire encoding for stream events.
//!
//! One UTF-8 frame per passing event, then a terminal sentinel frame once
//! the sequence is cleanly exhausted:
//!
//! ```text
//! event: data
//! data: {"event":"on_chain_start",...}
//!
//! event: end
//!
//! ```
//!
//! An execution failure is yielded as `Err` and terminates the frame stream
//! without the sentinel.

use futures_util::stream::{self, Stream};

use crate::error::ChainError;
use crate::event::StreamEvent;
use crate::streaming::EventStream;

/// Terminal sentinel frame.
pub const END_FRAME: &str = "event: end\n\n";

/// Encode one event as an SSE data frame.
pub fn encode_frame(event: &StreamEvent) -> Result<String, ChainError> {
    let json = serde_json::to_string(event)?;
    Ok(format!("event: data\ndata: {json}\n\n"))
}

enum FrameState {
    Open(EventStream),
    Done,
}

pub(crate) fn frame_stream(
    events: EventStream,
) -> impl Stream<Item = Result<String, ChainError>> + Send {
    stream::unfold(FrameState::Open(events), |state| async move {
        match state {
            FrameState::Open(mut events) => match events.next().await {
                Some(Ok(event)) => Some((encode_frame(&event), FrameState::Open(events))),
                Some(Err(err)) => Some((Err(err), FrameState::Done)),
                None => Some((Ok(END_FRAME.to_string()), FrameState::Done)),
            },
            FrameState::Done => None,
        }
    })
}
