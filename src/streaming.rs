//! Byte-level relay of a streaming upstream response.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_stream::try_stream;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};

use crate::errors::RelayError;

/// Content type the caller should put on a relayed response.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Relays upstream bytes to the caller unmodified and in arrival order.
///
/// The relay is pull-based: nothing is read from upstream until the caller
/// polls, so slow consumption throttles the upstream read rate. Dropping
/// the stream drops the underlying connection, closing it promptly; a
/// caller disconnect never leaves the upstream call running.
///
/// The idle timeout bounds each gap between chunks, not the stream's total
/// duration: a healthy stream may run arbitrarily long, a stalled upstream
/// yields [`RelayError::UpstreamTimeout`] as the final item. Beyond that
/// final item there is no side channel for errors once relaying has begun;
/// an upstream failure mid-stream truncates the byte stream.
pub struct RelayStream {
    inner: BoxStream<'static, Result<Bytes, RelayError>>,
}

impl RelayStream {
    pub(crate) fn new(response: reqwest::Response, idle_timeout: Duration) -> Self {
        let inner = try_stream! {
            let mut upstream = response.bytes_stream();
            loop {
                match tokio::time::timeout(idle_timeout, upstream.next()).await {
                    Ok(Some(chunk)) => {
                        let bytes = chunk.map_err(RelayError::from)?;
                        yield bytes;
                    }
                    Ok(None) => break,
                    Err(_stalled) => Err(RelayError::UpstreamTimeout(None))?,
                }
            }
        };
        Self {
            inner: inner.boxed(),
        }
    }
}

impl Stream for RelayStream {
    type Item = Result<Bytes, RelayError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayStream").finish_non_exhaustive()
    }
}
