//! Background task that performs all network I/O for the UI.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use localchat_client::ApiClient;
use localchat_core::{SendMode, SendTicket};

use crate::event::{BackendCommand, BackendStatus, UiEvent};

/// How often the header's backend indicator is refreshed.
pub const HEALTH_INTERVAL: Duration = Duration::from_secs(15);

/// Run the backend loop.
///
/// This function runs in a separate thread with its own tokio runtime.
/// Every request, health checks included, runs as its own task so a slow
/// backend never holds up the commands queued behind it.
pub async fn run_backend(
    client: ApiClient,
    ui_tx: mpsc::Sender<UiEvent>,
    mut cmd_rx: mpsc::Receiver<BackendCommand>,
) {
    info!(api_url = %client.base_url(), "Backend started");

    let mut interval = tokio::time::interval(HEALTH_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tokio::spawn(check_health(client.clone(), ui_tx.clone()));
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    debug!("UI channel closed");
                    break;
                };
                match cmd {
                    BackendCommand::Quit => {
                        info!("Received quit command, shutting down backend");
                        break;
                    }
                    BackendCommand::Send(ticket) => {
                        tokio::spawn(perform_chat(client.clone(), ticket, ui_tx.clone()));
                    }
                    BackendCommand::LoadModels => {
                        tokio::spawn(load_models(client.clone(), ui_tx.clone()));
                    }
                    BackendCommand::CheckHealth => {
                        tokio::spawn(check_health(client.clone(), ui_tx.clone()));
                    }
                    BackendCommand::Ingest(path) => {
                        tokio::spawn(ingest(client.clone(), path, ui_tx.clone()));
                    }
                }
            }
        }
    }

    info!("Backend shutdown complete");
}

/// Run one chat request to completion, failure, or cancellation.
///
/// Nothing is reported once the ticket is cancelled: the session has
/// already detached the request.
pub async fn perform_chat(client: ApiClient, ticket: SendTicket, ui_tx: mpsc::Sender<UiEvent>) {
    let request_id = ticket.id;
    let cancel = ticket.cancel.clone();
    debug!(request_id, mode = ?ticket.mode, model = %ticket.request.model, "Starting chat request");

    let outcome = match ticket.mode {
        SendMode::Streaming => stream_reply(&client, &ticket, &ui_tx).await,
        SendMode::Blocking => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                result = client.chat(&ticket.request) => match result {
                    Ok(response) => Ok(UiEvent::Completed { request_id, response }),
                    Err(e) => Err(e.to_string()),
                },
            }
        }
    };

    if cancel.is_cancelled() {
        debug!(request_id, "Request cancelled");
        return;
    }

    let event = match outcome {
        Ok(event) => event,
        Err(error) => {
            warn!(request_id, error = %error, "Chat request failed");
            UiEvent::RequestFailed { request_id, error }
        }
    };
    let _ = ui_tx.send(event).await;
}

/// Forward fragments as they arrive; returns the terminal event.
async fn stream_reply(
    client: &ApiClient,
    ticket: &SendTicket,
    ui_tx: &mpsc::Sender<UiEvent>,
) -> Result<UiEvent, String> {
    let request_id = ticket.id;
    let mut stream = tokio::select! {
        biased;
        _ = ticket.cancel.cancelled() => return Ok(UiEvent::StreamFinished { request_id }),
        result = client.chat_stream(&ticket.request, ticket.cancel.clone()) => {
            result.map_err(|e| e.to_string())?
        }
    };

    let mut fragments = 0usize;
    while let Some(item) = stream.next().await {
        let text = item.map_err(|e| e.to_string())?;
        fragments += 1;
        if ui_tx.send(UiEvent::Fragment { request_id, text }).await.is_err() {
            break;
        }
    }
    debug!(request_id, fragments, "Stream ended");
    Ok(UiEvent::StreamFinished { request_id })
}

async fn load_models(client: ApiClient, ui_tx: mpsc::Sender<UiEvent>) {
    let event = match client.list_models().await {
        Ok(models) => {
            debug!(count = models.len(), "Fetched models");
            UiEvent::ModelsLoaded(models)
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch models");
            UiEvent::ModelsFailed(e.to_string())
        }
    };
    let _ = ui_tx.send(event).await;
}

async fn check_health(client: ApiClient, ui_tx: mpsc::Sender<UiEvent>) {
    let status = match client.health().await {
        Ok(health) if health.is_ok() => BackendStatus::Online,
        Ok(health) => BackendStatus::Offline(format!("status {}", health.status)),
        Err(e) => {
            debug!(error = %e, "Health check failed");
            BackendStatus::Offline(e.to_string())
        }
    };
    let _ = ui_tx.send(UiEvent::HealthChanged(status)).await;
}

async fn ingest(client: ApiClient, path: PathBuf, ui_tx: mpsc::Sender<UiEvent>) {
    info!(path = %path.display(), "Uploading document");
    let event = match client.ingest_document(&path).await {
        Ok(receipt) => UiEvent::DocumentIngested { path, receipt },
        Err(e) => {
            error!(path = %path.display(), error = %e, "Document upload failed");
            UiEvent::IngestFailed {
                path,
                error: e.to_string(),
            }
        }
    };
    let _ = ui_tx.send(event).await;
}
