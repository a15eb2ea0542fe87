use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};

use crate::Error;

/// An in-flight streamed generation.
///
/// Consume it either chunk by chunk with [`stream`](Self::stream), or wait
/// for the whole draft with [`text`](Self::text). [`text_with`](Self::text_with)
/// does both: it forwards each chunk to a sink as it arrives and still
/// returns the assembled text.
pub struct Generation {
    stream: BoxStream<'static, Result<String, Error>>,
}

impl Generation {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String, Error>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
        }
    }

    /// The raw chunk stream, in arrival order.
    pub fn stream(self) -> impl Stream<Item = Result<String, Error>> + Send + 'static {
        self.stream
    }

    /// Drain the stream and return the full text, trimmed.
    pub async fn text(self) -> Result<String, Error> {
        self.text_with(|_| {}).await
    }

    /// Drain the stream, forwarding each chunk to `sink` as it arrives, and
    /// return the full text, trimmed. A mid-stream error aborts with the
    /// text produced so far discarded.
    pub async fn text_with<F>(mut self, mut sink: F) -> Result<String, Error>
    where
        F: FnMut(&str),
    {
        let mut full = String::new();
        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk?;
            sink(&chunk);
            full.push_str(&chunk);
        }
        Ok(full.trim().to_string())
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn generation_of(chunks: Vec<Result<String, Error>>) -> Generation {
        Generation::from_stream(stream::iter(chunks))
    }

    #[tokio::test]
    async fn test_text_concatenates_and_trims() {
        let generation = generation_of(vec![
            Ok("  git commit".to_string()),
            Ok(" -m 'fix: y'".to_string()),
            Ok("\n".to_string()),
        ]);
        assert_eq!(generation.text().await.unwrap(), "git commit -m 'fix: y'");
    }

    #[tokio::test]
    async fn test_text_with_forwards_every_chunk() {
        let generation = generation_of(vec![
            Ok("one ".to_string()),
            Ok("two".to_string()),
        ]);

        let mut seen = Vec::new();
        let text = generation
            .text_with(|chunk| seen.push(chunk.to_string()))
            .await
            .unwrap();

        assert_eq!(seen, vec!["one ", "two"]);
        assert_eq!(text, "one two");
    }

    #[tokio::test]
    async fn test_text_aborts_on_stream_error() {
        let generation = generation_of(vec![
            Ok("partial".to_string()),
            Err(Error::timeout("deadline exceeded")),
        ]);
        assert!(matches!(
            generation.text().await,
            Err(Error::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_yields_chunks_in_order() {
        let generation = generation_of(vec![Ok("a".to_string()), Ok("b".to_string())]);
        let mut chunks = generation.stream();
        assert_eq!(chunks.next().await.unwrap().unwrap(), "a");
        assert_eq!(chunks.next().await.unwrap().unwrap(), "b");
        assert!(chunks.next().await.is_none());
    }
}
