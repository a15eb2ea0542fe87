//! Incremental decoding of streamed generation bodies into text chunks.

use futures_util::{Stream, StreamExt};
use memchr::memchr;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::Error;

/// Carry-over cap for a single undelimited line. A well-behaved backend
/// terminates every record with a newline long before this.
const MAX_BUFFERED: usize = 1_000_000;

/// Framing discipline of a streamed response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One JSON object per line, generated text in a top-level `response`
    /// field. Used by the local generation server.
    JsonLines,
    /// Server-sent events: only `data: `-prefixed lines carry payloads,
    /// generated text sits at `choices[0].delta.content`, and a
    /// `data: [DONE]` line marks the end of the stream. Used by the hosted
    /// chat-completions API.
    EventStream,
}

/// Decodes an incrementally arriving byte stream into ordered text chunks.
///
/// The decoder is sans-IO: bytes go in through [`feed`](Self::feed) in
/// whatever fragments the transport produces, and [`finish`](Self::finish)
/// yields the trimmed concatenation of everything emitted. Fragment
/// boundaries never affect the output; a record split across two feeds is
/// decoded once its closing newline arrives.
///
/// Individual lines that fail to decode (truncated JSON, missing text field,
/// invalid UTF-8) are dropped silently; they never abort the stream.
#[derive(Debug)]
pub struct StreamDecoder {
    framing: Framing,
    /// Bytes received but not yet resolved into a complete line.
    buffer: Vec<u8>,
    /// Concatenation of every chunk emitted so far.
    accumulated: String,
}

impl StreamDecoder {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buffer: Vec::new(),
            accumulated: String::new(),
        }
    }

    /// Feed newly arrived bytes, returning the chunks completed by them.
    ///
    /// Chunks are returned in receipt order and are also appended to the
    /// accumulated text.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        let mut start = 0;
        while let Some(pos) = memchr(b'\n', &self.buffer[start..]) {
            let line_end = start + pos;
            // A line boundary is always a character boundary, so only the
            // retained tail can hold a partial UTF-8 sequence.
            if let Ok(line) = std::str::from_utf8(&self.buffer[start..line_end]) {
                if let Some(text) = self.decode_line(line) {
                    self.accumulated.push_str(&text);
                    chunks.push(text);
                }
            }
            start = line_end + 1;
        }
        if start > 0 {
            self.buffer.drain(..start);
        }

        chunks
    }

    /// Decode one complete line according to the framing discipline.
    /// Returns `None` for every segment that does not carry text.
    fn decode_line(&self, line: &str) -> Option<String> {
        let text = match self.framing {
            Framing::JsonLines => {
                if line.trim().is_empty() {
                    return None;
                }
                let record: Value = serde_json::from_str(line).ok()?;
                record.get("response")?.as_str()?.to_string()
            }
            Framing::EventStream => {
                let payload = line.strip_prefix("data: ")?;
                if payload.trim() == "[DONE]" {
                    return None;
                }
                let record: Value = serde_json::from_str(payload).ok()?;
                record
                    .get("choices")?
                    .get(0)?
                    .get("delta")?
                    .get("content")?
                    .as_str()?
                    .to_string()
            }
        };

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Text emitted so far, before trimming.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Bytes held back waiting for a line terminator.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any bytes held back waiting for a line terminator.
    fn discard_buffered(&mut self) {
        self.buffer.clear();
    }

    /// Consume the decoder, returning the accumulated text trimmed of
    /// surrounding whitespace. An unterminated trailing line is discarded.
    pub fn finish(self) -> String {
        self.accumulated.trim().to_string()
    }
}

/// A stream adapter that decodes a byte stream into text chunks.
///
/// Wraps any `Stream<Item = Result<Bytes, Error>>` (in practice
/// `reqwest::Response::bytes_stream` with transport errors already
/// classified) and yields decoded chunks in receipt order.
pub struct ChunkStream<S> {
    inner: S,
    decoder: StreamDecoder,
    /// Decoded chunks not yet yielded.
    pending: VecDeque<String>,
    /// Set when the carry-over exceeded [`MAX_BUFFERED`]; the error is
    /// reported once `pending` has drained.
    overflowed: bool,
}

impl<S> ChunkStream<S> {
    pub fn new(stream: S, framing: Framing) -> Self {
        Self {
            inner: stream,
            decoder: StreamDecoder::new(framing),
            pending: VecDeque::new(),
            overflowed: false,
        }
    }
}

impl<S> Stream for ChunkStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, Error>> + Unpin,
{
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            // Yield already-decoded chunks first, FIFO.
            if let Some(chunk) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(chunk)));
            }

            if self.overflowed {
                self.overflowed = false;
                return Poll::Ready(Some(Err(Error::malformed(
                    "stream line exceeded maximum buffer size",
                ))));
            }

            let bytes = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                // Stream ended; any unterminated trailing line is dropped.
                None => return Poll::Ready(None),
            };

            let chunks = self.decoder.feed(&bytes);
            self.pending.extend(chunks);

            if self.decoder.buffered() > MAX_BUFFERED {
                // Drop the oversized carry-over so a caller that keeps
                // polling is not re-fed the same bytes.
                self.decoder.discard_buffered();
                self.overflowed = true;
            }
        }
    }
}

/// Extension trait attaching chunk decoding to byte streams.
pub trait ChunkStreamExt: Stream {
    /// Decode this byte stream into text chunks under the given framing.
    fn text_chunks(self, framing: Framing) -> ChunkStream<Self>
    where
        Self: Sized,
    {
        ChunkStream::new(self, framing)
    }
}

impl<S: Stream> ChunkStreamExt for S {}
