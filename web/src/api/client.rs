//! Request/response calls to the backend REST endpoints.

use gloo_net::http::{Request, Response};
use web_sys::{File, FormData};

use localchat_core::{ChatRequest, ChatResponse, HealthStatus, IngestReceipt, ModelInfo, ModelList};

use super::endpoint;
use crate::storage::js_message;

fn status_error(context: &str, response: &Response) -> String {
    format!(
        "{}: HTTP {} {}",
        context,
        response.status(),
        response.status_text()
    )
}

/// `GET /` health check.
pub async fn fetch_health() -> Result<HealthStatus, String> {
    let response = Request::get(&endpoint("/"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.ok() {
        return Err(status_error("Health check failed", &response));
    }
    response.json().await.map_err(|e| e.to_string())
}

/// Installed models.
pub async fn fetch_models() -> Result<Vec<ModelInfo>, String> {
    let response = Request::get(&endpoint("/models"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.ok() {
        return Err(status_error("Failed to fetch models", &response));
    }
    let list: ModelList = response.json().await.map_err(|e| e.to_string())?;
    Ok(list.models)
}

/// Non-streaming chat completion.
pub async fn send_chat(request: &ChatRequest) -> Result<ChatResponse, String> {
    let response = Request::post(&endpoint("/chat"))
        .json(request)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.ok() {
        return Err(status_error("Failed to send message", &response));
    }
    response.json().await.map_err(|e| e.to_string())
}

/// Upload one document to the knowledge base.
pub async fn upload_document(file: &File) -> Result<IngestReceipt, String> {
    let form = FormData::new().map_err(|e| js_message(&e))?;
    form.append_with_blob_and_filename("file", file, &file.name())
        .map_err(|e| js_message(&e))?;

    let response = Request::post(&endpoint("/documents"))
        .body(form)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.ok() {
        return Err(status_error("Failed to upload document", &response));
    }
    response.json().await.map_err(|e| e.to_string())
}
