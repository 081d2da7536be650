//! Fragment stream over a streaming chat response.

use std::collections::VecDeque;

use localchat_core::FragmentDecoder;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ApiError;

/// Lazy, finite sequence of text fragments from `POST /chat/stream`.
///
/// The stream owns the HTTP response. It is dropped as soon as the body
/// ends, `[DONE]` arrives, a read fails, or the token is cancelled, which
/// releases the connection on every exit path.
pub struct FragmentStream {
    response: Option<reqwest::Response>,
    decoder: FragmentDecoder,
    pending: VecDeque<String>,
    cancel: CancellationToken,
}

impl FragmentStream {
    pub(crate) fn new(response: reqwest::Response, cancel: CancellationToken) -> Self {
        Self {
            response: Some(response),
            decoder: FragmentDecoder::new(),
            pending: VecDeque::new(),
            cancel,
        }
    }

    /// Next fragment, `None` at the end of the stream or once cancelled.
    pub async fn next(&mut self) -> Option<Result<String, ApiError>> {
        loop {
            if self.cancel.is_cancelled() {
                self.release("cancelled");
                self.pending.clear();
                return None;
            }
            if let Some(fragment) = self.pending.pop_front() {
                return Some(Ok(fragment));
            }
            let response = self.response.as_mut()?;

            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => continue,
                chunk = response.chunk() => chunk,
            };

            match chunk {
                Ok(Some(bytes)) => {
                    let decoded = self.decoder.push(&bytes);
                    self.pending.extend(decoded.fragments);
                    if decoded.done {
                        self.release("done marker");
                    }
                }
                Ok(None) => {
                    let decoded = self.decoder.finish();
                    self.pending.extend(decoded.fragments);
                    self.release("end of body");
                }
                Err(e) => {
                    self.release("read error");
                    return Some(Err(ApiError::Http(e)));
                }
            }
        }
    }

    /// Drain the stream into a single string.
    pub async fn collect_text(mut self) -> Result<String, ApiError> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    fn release(&mut self, reason: &str) {
        if self.response.take().is_some() {
            debug!(reason, "Released stream response");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::http::ApiClient;
    use localchat_core::{ChatRequest, ChatSettings, Message};
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest::from_settings(vec![Message::user("Hi")], &ChatSettings::default())
    }

    async fn serve(body: Vec<u8>, content_type: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_sse_stream_stops_at_done() {
        let body = b"data: Hello\n\ndata: , world\n\ndata: [DONE]\n\ndata: ignored\n\n".to_vec();
        let server = serve(body, "text/event-stream").await;

        let stream = ApiClient::new(&server.uri())
            .chat_stream(&request(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stream.collect_text().await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn test_raw_text_stream() {
        let server = serve("Plain ¡text! reply".as_bytes().to_vec(), "text/plain").await;

        let mut stream = ApiClient::new(&server.uri())
            .chat_stream(&request(), CancellationToken::new())
            .await
            .unwrap();
        let mut text = String::new();
        while let Some(fragment) = stream.next().await {
            text.push_str(&fragment.unwrap());
        }
        assert_eq!(text, "Plain ¡text! reply");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_stream_yields_nothing() {
        let server = serve(b"data: never\n\n".to_vec(), "text/event-stream").await;
        let cancel = CancellationToken::new();

        let mut stream = ApiClient::new(&server.uri())
            .chat_stream(&request(), cancel.clone())
            .await
            .unwrap();
        cancel.cancel();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_drops_buffered_fragments() {
        let server = serve(b"data: one\ndata: two\n\n".to_vec(), "text/event-stream").await;
        let cancel = CancellationToken::new();

        let mut stream = ApiClient::new(&server.uri())
            .chat_stream(&request(), cancel.clone())
            .await
            .unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "one");
        cancel.cancel();
        assert!(stream.next().await.is_none());
    }
}
