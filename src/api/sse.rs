//! Incremental `text/event-stream` decoder
//!
//! Bytes arrive in arbitrary chunks; a chunk may end in the middle of a
//! line, between the `\r` and `\n` of a CRLF, or inside a multi-byte UTF-8
//! sequence. Lines are therefore buffered as raw bytes and only decoded
//! once complete.

use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field, `None` for the default `message` type
    pub event: Option<String>,
    /// Last `id:` seen on the stream
    pub id: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
}

impl SseEvent {
    /// Whether a plain `EventSource.onmessage` handler would receive it
    pub fn is_message(&self) -> bool {
        self.event.as_deref().is_none_or(|e| e == "message")
    }
}

/// Stateful line/event decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    after_cr: bool,
    data: Vec<String>,
    event: Option<String>,
    last_id: Option<String>,
    past_first_line: bool,
}

impl SseDecoder {
    /// Fresh decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning events completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => self.end_line(&mut events),
                b'\r' => {
                    self.end_line(&mut events);
                    self.after_cr = true;
                }
                _ => self.line.push(byte),
            }
        }

        events
    }

    fn end_line(&mut self, events: &mut Vec<SseEvent>) {
        let mut raw = std::mem::take(&mut self.line);
        if !self.past_first_line {
            self.past_first_line = true;
            if raw.starts_with(BOM) {
                raw.drain(..BOM.len());
            }
        }
        let line = String::from_utf8_lossy(&raw);

        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            // retry and unknown fields
            _ => {}
        }
    }

    fn dispatch(&mut self, events: &mut Vec<SseEvent>) {
        let event = self.event.take();
        if self.data.is_empty() {
            return;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        events.push(SseEvent {
            event: event.filter(|e| !e.is_empty()),
            id: self.last_id.clone(),
            data,
        });
    }
}

/// Turn a chunked response body into the data of its `message` events
///
/// An event still being assembled when the body ends is discarded. The first
/// body error is yielded and ends the stream.
pub fn message_data<S, B, E>(body: S) -> BoxStream<'static, Result<String, E>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
{
    let state = (body.boxed(), SseDecoder::new(), VecDeque::new(), false);

    stream::unfold(state, |(mut body, mut decoder, mut pending, mut done)| async move {
        loop {
            if let Some(data) = pending.pop_front() {
                return Some((Ok(data), (body, decoder, pending, done)));
            }
            if done {
                return None;
            }

            match body.next().await {
                Some(Ok(chunk)) => pending.extend(
                    decoder
                        .feed(chunk.as_ref())
                        .into_iter()
                        .filter(SseEvent::is_message)
                        .map(|e| e.data),
                ),
                Some(Err(err)) => {
                    done = true;
                    return Some((Err(err), (body, decoder, pending, done)));
                }
                None => done = true,
            }
        }
    })
    .boxed()
}
