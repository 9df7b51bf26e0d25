//! Cancellation for chat streams.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;
use crate::types::ChatStream;

/// Wrap `stream` so that cancelling `token` aborts the pending read.
///
/// On cancellation the stream yields a single [`LlmError::Cancelled`] and
/// ends; the inner stream (and with it the connection) is dropped.
pub fn make_cancellable_stream(stream: ChatStream, token: CancellationToken) -> ChatStream {
    let mut inner = stream;
    let s = async_stream::stream! {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!("chat stream cancelled");
                    yield Err(LlmError::Cancelled);
                    break;
                }
                item = inner.next() => match item {
                    Some(item) => yield item,
                    None => break,
                },
            }
        }
    };
    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatStreamEvent;

    #[tokio::test]
    async fn passes_items_through_until_cancelled() {
        let token = CancellationToken::new();
        let inner: ChatStream = Box::pin(
            futures::stream::iter(vec![Ok::<_, LlmError>(ChatStreamEvent::content("a"))])
                .chain(futures::stream::pending()),
        );
        let mut stream = make_cancellable_stream(inner, token.clone());

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.as_content_delta(), Some("a"));

        token.cancel();
        assert!(matches!(stream.next().await, Some(Err(LlmError::Cancelled))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn uncancelled_stream_completes_normally() {
        let inner: ChatStream = Box::pin(futures::stream::iter(vec![
            Ok::<_, LlmError>(ChatStreamEvent::content("a")),
            Ok(ChatStreamEvent::content("b")),
        ]));
        let out: Vec<_> = make_cancellable_stream(inner, CancellationToken::new())
            .collect()
            .await;
        assert_eq!(out.len(), 2);
    }
}
