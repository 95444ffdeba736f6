//! Server-sent event plumbing shared by every streaming adapter.
//!
//! Vendors deliver streamed answers as `data: {...}` lines over a chunked
//! HTTP body. Chunk boundaries fall anywhere, including mid-line and
//! mid-codepoint, so bytes are buffered until a full line is available.

use futures::StreamExt;
use arka_core::error::ProviderError;
use arka_core::provider::{StreamChunk, StreamReceiver};
use tracing::trace;

/// One meaningful line of an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// Payload of a `data:` line.
    Data(String),
    /// The `[DONE]` sentinel.
    Done,
}

/// Incremental line splitter for `text/event-stream` bodies.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and collect every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseLine> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            if let Some(line) = parse_line(&raw[..raw.len() - 1]) {
                lines.push(line);
            }
        }
        lines
    }

    /// Flush a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseLine> {
        let rest = std::mem::take(&mut self.pending);
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Option<SseLine> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches('\r');

    // Blank separators, comments and `event:` / `id:` fields carry no payload.
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(SseLine::Done);
    }
    Some(SseLine::Data(data.to_string()))
}

/// Extracts the text fragment (if any) carried by one `data:` payload.
pub(crate) type TextExtractor = fn(&str) -> Result<Option<String>, serde_json::Error>;

/// Drive a streaming HTTP response on a background task, forwarding each
/// text fragment as a [`StreamChunk`]. Unparseable payloads are skipped.
pub(crate) fn spawn_text_stream(
    provider: &'static str,
    response: reqwest::Response,
    extract: TextExtractor,
) -> StreamReceiver {
    let (tx, rx) = tokio::sync::mpsc::channel(64);

    tokio::spawn(async move {
        let mut byte_stream = response.bytes_stream();
        let mut buffer = SseLineBuffer::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let bytes = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    let _ = tx.send(Err(ProviderError::Stream(e.to_string()))).await;
                    return;
                }
            };

            for line in buffer.push(&bytes) {
                match forward(provider, line, extract) {
                    Forward::Chunk(chunk) => {
                        if tx.send(Ok(chunk)).await.is_err() {
                            return; // receiver dropped
                        }
                    }
                    Forward::Skip => {}
                    Forward::End => return,
                }
            }
        }

        if let Some(line) = buffer.finish() {
            if let Forward::Chunk(chunk) = forward(provider, line, extract) {
                let _ = tx.send(Ok(chunk)).await;
            }
        }
    });

    rx
}

enum Forward {
    Chunk(StreamChunk),
    Skip,
    End,
}

fn forward(provider: &str, line: SseLine, extract: TextExtractor) -> Forward {
    match line {
        SseLine::Done => Forward::End,
        SseLine::Data(data) => match extract(&data) {
            Ok(Some(text)) if !text.is_empty() => Forward::Chunk(StreamChunk::text(text)),
            Ok(_) => Forward::Skip,
            Err(e) => {
                trace!(provider, data = %data, error = %e, "Ignoring unparseable SSE chunk");
                Forward::Skip
            }
        },
    }
}

#[cfg(test)]
pub(crate) fn collect_text(chunks: &[&[u8]], extract: TextExtractor) -> Vec<String> {
    let mut buffer = SseLineBuffer::new();
    let mut lines = Vec::new();
    for chunk in chunks {
        lines.extend(buffer.push(chunk));
    }
    lines.extend(buffer.finish());

    let mut out = Vec::new();
    for line in lines {
        match forward("test", line, extract) {
            Forward::Chunk(chunk) => out.extend(chunk.text),
            Forward::Skip => {}
            Forward::End => break,
        }
    }
    out
}
