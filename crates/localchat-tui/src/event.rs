//! Event types for communication between the backend task and the UI.

use std::path::PathBuf;

use localchat_core::{ChatResponse, IngestReceipt, ModelInfo, SendTicket};

/// Reachability of the chat backend, as shown in the header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    /// No health check has completed yet.
    #[default]
    Checking,

    /// `GET /` answered with `status: ok`.
    Online,

    /// The health check failed.
    Offline(String),
}

/// Events sent from the backend to the UI thread.
#[derive(Debug)]
pub enum UiEvent {
    /// A piece of streamed assistant text.
    Fragment { request_id: u64, text: String },

    /// The stream ended normally.
    StreamFinished { request_id: u64 },

    /// A blocking chat request returned.
    Completed {
        request_id: u64,
        response: ChatResponse,
    },

    /// The chat request failed before or during the reply.
    RequestFailed { request_id: u64, error: String },

    /// Model list fetched.
    ModelsLoaded(Vec<ModelInfo>),

    /// Model list could not be fetched.
    ModelsFailed(String),

    /// Health check result.
    HealthChanged(BackendStatus),

    /// A document upload was acknowledged.
    DocumentIngested {
        path: PathBuf,
        receipt: IngestReceipt,
    },

    /// A document upload failed.
    IngestFailed { path: PathBuf, error: String },
}

/// Commands sent from the UI thread to the backend.
#[derive(Debug)]
pub enum BackendCommand {
    /// Perform the chat request described by the ticket.
    Send(SendTicket),

    /// Fetch the model list.
    LoadModels,

    /// Run a health check now.
    CheckHealth,

    /// Upload a document to the knowledge base.
    Ingest(PathBuf),

    /// Quit the application.
    Quit,
}
