//! Chunk-stream assembly: bytes in, decoded text out.
//!
//! [`text_chunks`] turns a raw byte stream into a [`ChunkStream`],
//! weaving in the three concerns the consumer loop has beyond
//! decoding: cooperative cancellation (observed at the next read),
//! optional stalled-stream detection, and stop-on-first-error.

use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::backend::ChunkStream;
use crate::decode::StreamDecoder;
use crate::error::ApiError;

/// What one read attempt produced.
enum Read {
    Chunk(Bytes),
    Failed(ApiError),
    Stalled(Duration),
    End,
}

/// Wrap a byte stream into a cancellable stream of decoded text.
///
/// Cancellation is cooperative: the token is only observed between
/// reads, never mid-decode, and wins over a ready chunk when both are
/// available. After a failure the stream ends; it never resumes or
/// retries.
pub fn text_chunks<S>(
    body: S,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, ApiError>> + Send + 'static,
{
    let state = (Box::pin(body), StreamDecoder::new(), cancel, false);

    Box::pin(futures::stream::unfold(
        state,
        move |(mut body, mut decoder, cancel, done)| async move {
            if done {
                return None;
            }

            loop {
                let read = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return None,
                    read = next_read(&mut body, idle_timeout) => read,
                };

                match read {
                    Read::Chunk(bytes) => {
                        let text = decoder.decode(&bytes);
                        if text.is_empty() {
                            // Only extended an incomplete sequence.
                            continue;
                        }
                        return Some((Ok(text), (body, decoder, cancel, false)));
                    }
                    Read::Failed(e) => return Some((Err(e), (body, decoder, cancel, true))),
                    Read::Stalled(after) => {
                        tracing::warn!(?after, "generation stream stalled");
                        return Some((Err(ApiError::Stalled(after)), (body, decoder, cancel, true)));
                    }
                    Read::End => return None,
                }
            }
        },
    ))
}

/// Await the next byte block, bounded by the idle timeout when set.
async fn next_read<S>(body: &mut S, idle_timeout: Option<Duration>) -> Read
where
    S: Stream<Item = Result<Bytes, ApiError>> + Unpin,
{
    let next = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, body.next()).await {
            Ok(next) => next,
            Err(_) => return Read::Stalled(limit),
        },
        None => body.next().await,
    };

    match next {
        Some(Ok(bytes)) => Read::Chunk(bytes),
        Some(Err(e)) => Read::Failed(e),
        None => Read::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn bytes_ok(parts: &[&[u8]]) -> Vec<Result<Bytes, ApiError>> {
        parts.iter().map(|p| Ok(Bytes::copy_from_slice(p))).collect()
    }

    #[tokio::test]
    async fn chunks_arrive_in_order() {
        let body = stream::iter(bytes_ok(&[b"Hi", b" there"]));
        let mut chunks = text_chunks(body, CancellationToken::new(), None);

        assert_eq!(chunks.next().await.unwrap().unwrap(), "Hi");
        assert_eq!(chunks.next().await.unwrap().unwrap(), " there");
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn multibyte_boundary_spans_two_reads() {
        let body = stream::iter(bytes_ok(&[b"caf\xC3", b"\xA9"]));
        let mut chunks = text_chunks(body, CancellationToken::new(), None);

        assert_eq!(chunks.next().await.unwrap().unwrap(), "caf");
        assert_eq!(chunks.next().await.unwrap().unwrap(), "é");
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn pre_triggered_cancellation_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let body = stream::iter(bytes_ok(&[b"never seen"]));
        let mut chunks = text_chunks(body, cancel, None);

        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_stops_a_pending_read() {
        let cancel = CancellationToken::new();
        // A body that never produces anything.
        let body = stream::pending::<Result<Bytes, ApiError>>();
        let mut chunks = text_chunks(body, cancel.clone(), None);

        let next = tokio::spawn(async move { chunks.next().await });
        cancel.cancel();

        assert!(next.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn error_ends_the_stream() {
        let items: Vec<Result<Bytes, ApiError>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(ApiError::Network("connection reset".to_string())),
            Ok(Bytes::from_static(b"unreachable")),
        ];
        let mut chunks = text_chunks(stream::iter(items), CancellationToken::new(), None);

        assert_eq!(chunks.next().await.unwrap().unwrap(), "partial");
        assert!(matches!(
            chunks.next().await.unwrap(),
            Err(ApiError::Network(_))
        ));
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_surfaces_a_stalled_backend() {
        let limit = Duration::from_secs(5);
        let body = stream::pending::<Result<Bytes, ApiError>>();
        let mut chunks = text_chunks(body, CancellationToken::new(), Some(limit));

        let item = chunks.next().await.unwrap();
        assert!(matches!(item, Err(ApiError::Stalled(d)) if d == limit));
        assert!(chunks.next().await.is_none());
    }
}
