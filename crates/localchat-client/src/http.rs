//! HTTP client for the backend REST endpoints.

use std::path::Path;

use localchat_core::{
    ChatRequest, ChatResponse, HealthStatus, IngestReceipt, ModelInfo, ModelList,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ApiError;
use crate::stream::FragmentStream;

/// Backend address used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Client for the chat backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client for `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check whether the backend is up.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.url("/");
        debug!(url = %url, "Checking health");

        let response = self.inner.get(&url).send().await?;
        read_json(response, "Health check failed").await
    }

    /// List the models the backend can serve.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let url = self.url("/models");
        debug!(url = %url, "Fetching models");

        let response = self.inner.get(&url).send().await?;
        let list: ModelList = read_json(response, "Failed to fetch models").await?;
        Ok(list.models)
    }

    /// Send a chat request and wait for the complete reply.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let url = self.url("/chat");
        debug!(url = %url, model = %request.model, messages = request.messages.len(), "POST chat");

        let response = self.inner.post(&url).json(request).send().await?;
        read_json(response, "Failed to send message").await
    }

    /// Start a streaming chat request.
    ///
    /// Fails before yielding anything if the backend rejects the request.
    /// The returned stream stops early once `cancel` fires.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, ApiError> {
        let url = self.url("/chat/stream");
        debug!(url = %url, model = %request.model, messages = request.messages.len(), "POST chat stream");

        let response = self.inner.post(&url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                context: "Failed to start stream",
                status: response.status(),
            });
        }
        Ok(FragmentStream::new(response, cancel))
    }

    /// Upload a document to the knowledge base.
    pub async fn ingest_document(&self, path: &Path) -> Result<IngestReceipt, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let url = self.url("/documents");
        debug!(url = %url, file = %file_name, size = bytes.len(), "Uploading document");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self.inner.post(&url).multipart(form).send().await?;
        read_json(response, "Failed to upload document").await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &'static str,
) -> Result<T, ApiError> {
    if !response.status().is_success() {
        return Err(ApiError::Status {
            context,
            status: response.status(),
        });
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use localchat_core::{ChatSettings, Message, ModelSize};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest::from_settings(vec![Message::user("Hi")], &ChatSettings::default())
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "llama3.2", "size": 2019393189u64, "modified_at": "2024-10-01T00:00:00Z"},
                    {"name": "mistral"}
                ]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/", server.uri()));
        let models = client.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "llama3.2");
        assert!(matches!(models[0].size, Some(ModelSize::Bytes(2019393189))));
        assert!(models[1].size.is_none());
    }

    #[tokio::test]
    async fn test_list_models_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = ApiClient::new(&server.uri()).list_models().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch models: HTTP 503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_chat_sends_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({
                "model": "llama3.2",
                "temperature": 0.7,
                "max_tokens": 2048,
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Hello!",
                "model": "llama3.2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = ApiClient::new(&server.uri()).chat(&request()).await.unwrap();
        assert_eq!(reply.response, "Hello!");
    }

    #[tokio::test]
    async fn test_chat_stream_rejected_before_fragments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = ApiClient::new(&server.uri())
            .chat_stream(&request(), CancellationToken::new())
            .await;
        match result {
            Err(ApiError::Status { context, status }) => {
                assert_eq!(context, "Failed to start stream");
                assert_eq!(status.as_u16(), 500);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "service": "backend",
                "default_model": "llama3.2"
            })))
            .mount(&server)
            .await;

        let health = ApiClient::new(&server.uri()).health().await.unwrap();
        assert!(health.is_ok());
        assert_eq!(health.default_model.as_deref(), Some("llama3.2"));
    }

    #[tokio::test]
    async fn test_ingest_document_uploads_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chunks": 3,
                "message": "Indexed notes.md"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.md");
        std::fs::write(&file, "# Notes\n").unwrap();

        let receipt = ApiClient::new(&server.uri())
            .ingest_document(&file)
            .await
            .unwrap();
        assert_eq!(receipt.chunks, Some(3));

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"notes.md\""));
    }

    #[tokio::test]
    async fn test_ingest_missing_file() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client
            .ingest_document(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::File { .. }));
    }
}
