//! Streaming response contracts and in-memory stream utilities.
//!
//! ```rust
//! use fprovider::{ChatResponse, ResponseStream, VecResponseStream};
//!
//! let stream = VecResponseStream::new(vec![Ok(ChatResponse::default())]);
//! let _boxed: ResponseStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use fcommon::BoxStream;
use futures_core::Stream;

use crate::{ChatResponse, ProviderError};

/// Provider stream contract.
///
/// Invariants for consumers:
/// - Chunks are emitted in source order and each chunk is a valid partial response.
/// - An `Err` item is terminal; consumers stop reading after it.
/// - Once the stream yields `None`, it must not yield additional items.
pub type ResponseStream<'a> = BoxStream<'a, Result<ChatResponse, ProviderError>>;

#[derive(Debug)]
pub struct VecResponseStream {
    chunks: VecDeque<Result<ChatResponse, ProviderError>>,
}

impl VecResponseStream {
    pub fn new(chunks: Vec<Result<ChatResponse, ProviderError>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl Stream for VecResponseStream {
    type Item = Result<ChatResponse, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<ChatResponse, ProviderError>>> {
        Poll::Ready(self.chunks.pop_front())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.chunks.len(), Some(self.chunks.len()))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;
    use crate::{AssistantMessage, Generation};

    #[tokio::test]
    async fn vec_response_stream_yields_chunks_in_order() {
        let mut stream = VecResponseStream::new(vec![
            Ok(ChatResponse::new(vec![Generation::new(AssistantMessage::new("one"))])),
            Ok(ChatResponse::new(vec![Generation::new(AssistantMessage::new("two"))])),
        ]);

        let first = stream.next().await.expect("first chunk").expect("ok chunk");
        assert_eq!(first.text(), "one");

        let second = stream.next().await.expect("second chunk").expect("ok chunk");
        assert_eq!(second.text(), "two");

        assert!(stream.next().await.is_none());
    }
}
