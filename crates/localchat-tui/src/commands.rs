//! Non-interactive subcommands: export, import, models.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use localchat_client::{ApiClient, ApiError};
use localchat_core::{ConversationManager, CoreError, StorageError};

use crate::store::FileStore;

fn open_manager(data_dir: &Path) -> Result<ConversationManager<FileStore>, CoreError> {
    let store = FileStore::open(data_dir)?;
    Ok(ConversationManager::load(store)?)
}

/// JSON of every stored conversation, or of the single conversation `id`.
///
/// A single conversation is still wrapped in a list so the output can be
/// imported again.
pub fn export_json(data_dir: &Path, id: Option<&str>) -> Result<String, CoreError> {
    let mut manager = open_manager(data_dir)?;
    match id {
        None => Ok(manager.export_conversations()?),
        Some(id) => {
            let conversation = manager
                .conversations()
                .iter()
                .find(|c| c.id.as_str() == id)
                .ok_or_else(|| CoreError::ConversationNotFound(id.to_string()))?;
            let json = serde_json::to_string_pretty(&[conversation]).map_err(StorageError::from)?;
            Ok(json)
        }
    }
}

/// Write the export to `output`, or to stdout.
pub fn export(data_dir: &Path, id: Option<&str>, output: Option<&Path>) -> Result<(), CoreError> {
    let json = export_json(data_dir, id)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            info!(path = %path.display(), "Exported conversations");
            eprintln!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

/// Replace stored conversations with the contents of `file`.
///
/// Returns the number of conversations imported.
pub fn import(data_dir: &Path, file: &Path) -> Result<usize, CoreError> {
    let json = fs::read_to_string(file)?;
    let mut manager = open_manager(data_dir)?;
    Ok(manager.import_conversations(&json)?)
}

/// Print the models the backend offers.
pub fn list_models(api_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = ApiClient::new(api_url);
    let runtime = tokio::runtime::Runtime::new()?;
    let models = runtime
        .block_on(client.list_models())
        .map_err(|e| describe_api_error(&e, api_url))?;

    let mut stdout = io::stdout().lock();
    if models.is_empty() {
        writeln!(stdout, "No models installed")?;
    }
    for model in &models {
        match &model.size {
            Some(size) => writeln!(stdout, "{:<32} {}", model.name, size)?,
            None => writeln!(stdout, "{}", model.name)?,
        }
    }
    Ok(())
}

/// Exit message for a failed models fetch.
fn describe_api_error(error: &ApiError, api_url: &str) -> String {
    match error {
        ApiError::Http(e) if e.is_connect() => {
            format!("Cannot reach the backend at {} ({})", api_url, e)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localchat_core::SendMode;

    fn seed(dir: &Path) -> String {
        let mut manager = open_manager(dir).unwrap();
        let ticket = manager.send_message("Hello", SendMode::Blocking).unwrap();
        manager.complete(
            ticket.id,
            localchat_core::ChatResponse {
                response: "Hi".to_string(),
                model: "llama3.2".to_string(),
            },
        );
        manager.current_id().unwrap().to_string()
    }

    #[test]
    fn test_export_then_import_into_fresh_dir() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        seed(source.path());

        let file = source.path().join("backup.json");
        export(source.path(), None, Some(&file)).unwrap();

        let count = import(target.path(), &file).unwrap();
        assert_eq!(count, 1);
        let manager = open_manager(target.path()).unwrap();
        assert_eq!(manager.messages()[1].content, "Hi");
    }

    #[test]
    fn test_export_single_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let id = seed(dir.path());
        {
            let mut manager = open_manager(dir.path()).unwrap();
            manager.new_conversation();
        }

        let json = export_json(dir.path(), Some(&id)).unwrap();
        let parsed: Vec<localchat_core::Conversation> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id.as_str(), id);
    }

    #[test]
    fn test_export_unknown_conversation() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            export_json(dir.path(), Some("42")),
            Err(CoreError::ConversationNotFound(id)) if id == "42"
        ));
    }

    #[test]
    fn test_invalid_import_keeps_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{\"not\": \"a list\"}").unwrap();

        let err = import(dir.path(), &bad).unwrap_err();
        assert!(matches!(err, CoreError::Storage(StorageError::InvalidFormat(_))));
        assert_eq!(open_manager(dir.path()).unwrap().conversations().len(), 1);
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = import(dir.path(), &dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
