//! Streaming pipeline: bytes → SSE records → vendor chunks → host events.
//!
//! Each stage is a pull-driven `unfold` stream, so nothing is read from the
//! socket until the consumer asks for the next event.

mod sse;

pub use sse::{MAX_LINE_BYTES, SseDecoder, parse_record};

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::{Stream, StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ByteStream;
use crate::convert::StreamAssembler;
use crate::types::StreamEvent;
use crate::wire::ChatCompletionChunk;
use crate::{BifrostError, Result};

/// Decoded vendor chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// Host events; see [`event_stream`] for the termination contract.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

struct DecodeState {
    bytes: ByteStream,
    decoder: SseDecoder,
    ready: VecDeque<String>,
    error: Option<BifrostError>,
    done: bool,
}

/// Decode an SSE body into vendor chunks.
///
/// The first error (transport, framing or malformed JSON) is yielded once
/// and ends the stream.
pub fn decode_chunks(bytes: ByteStream) -> ChunkStream {
    let state = DecodeState {
        bytes,
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        error: None,
        done: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.ready.pop_front() {
                match parse_record(&payload) {
                    Ok(Some(chunk)) => return Some((Ok(chunk), state)),
                    Ok(None) => continue,
                    Err(e) => {
                        state.ready.clear();
                        state.error = None;
                        state.done = true;
                        return Some((Err(e), state));
                    }
                }
            }
            if let Some(e) = state.error.take() {
                return Some((Err(e), state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    if let Err(e) = state.decoder.feed(&bytes, &mut state.ready) {
                        state.error = Some(e);
                        state.done = true;
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.done = true;
                    match state.decoder.finish() {
                        Ok(tail) => state.ready.extend(tail),
                        Err(e) => state.error = Some(e),
                    }
                }
            }
        }
    }))
}

struct EventState {
    chunks: ChunkStream,
    assembler: Option<StreamAssembler>,
    queue: VecDeque<StreamEvent>,
    cancel: CancellationToken,
}

enum Step {
    Cancelled,
    Next(Option<Result<ChatCompletionChunk>>),
}

/// Turn vendor chunks into host events.
///
/// A successful stream ends with exactly one [`StreamEvent::Finished`]. A
/// failed or cancelled stream ends with exactly one `Err` instead, and no
/// events follow it.
pub fn event_stream(
    chunks: ChunkStream,
    assembler: StreamAssembler,
    cancel: Option<CancellationToken>,
) -> EventStream {
    let state = EventState {
        chunks,
        assembler: Some(assembler),
        queue: VecDeque::new(),
        cancel: cancel.unwrap_or_default(),
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.queue.pop_front() {
                return Some((Ok(event), state));
            }
            // Taken once the terminal item has been produced.
            let assembler = state.assembler.as_mut()?;

            let step = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => Step::Cancelled,
                next = state.chunks.next() => Step::Next(next),
            };

            match step {
                Step::Cancelled => {
                    debug!("stream cancelled by caller");
                    state.assembler = None;
                    return Some((Err(BifrostError::Cancelled), state));
                }
                Step::Next(Some(Ok(chunk))) => state.queue.extend(assembler.push(chunk)),
                Step::Next(Some(Err(e))) => {
                    state.assembler = None;
                    return Some((Err(e), state));
                }
                Step::Next(None) => {
                    if let Some(assembler) = state.assembler.take() {
                        state.queue.extend(assembler.finish());
                    }
                }
            }
        }
    }))
}
