//! Incremental decoding of the completion API's server-sent events.

use serde::Deserialize;

use super::OpenAiError;

/// Buffers raw bytes from the response body and yields the `data:`
/// payload of each complete event. Events can be split across HTTP/2
/// frames, and so can multi-byte characters, so decoding only happens
/// once an event terminator has been seen.
#[derive(Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, OpenAiError> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some((offset, len)) = find_event_end(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..offset + len).take(offset).collect();
            let event = String::from_utf8(raw).map_err(|e| OpenAiError::Parse(e.to_string()))?;
            for line in event.lines() {
                if let Some(data) = line.strip_prefix("data:") {
                    let data = data.trim();
                    // Data can sometimes be empty
                    if !data.is_empty() {
                        events.push(data.to_string());
                    }
                }
            }
        }
        Ok(events)
    }

    /// Flush whatever is left once the body has ended. Some servers
    /// close the connection without terminating the last event.
    pub fn finish(mut self) -> Result<Vec<String>, OpenAiError> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        self.push(b"\n\n")
    }
}

// Returns the offset of the terminator and its length. Servers differ
// on `\n\n` vs `\r\n\r\n`.
fn find_event_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    delta: Delta,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChunkChoice>,
}

pub(crate) enum Event {
    Fragment(String),
    Skip,
    Done,
}

/// Interpret one `data:` payload. The final chunk can carry both
/// content and a `finish_reason` so content is always kept.
pub(crate) fn parse_event(data: &str) -> Result<Event, OpenAiError> {
    if data == "[DONE]" {
        return Ok(Event::Done);
    }
    let chunk = serde_json::from_str::<CompletionChunk>(data).map_err(|e| {
        tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e);
        OpenAiError::Parse(e.to_string())
    })?;

    // Usage-only chunks have no choices
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());

    Ok(content.map_or(Event::Skip, Event::Fragment))
}
