//! Runtime configuration for the terminal client.

use std::path::PathBuf;

use localchat_client::DEFAULT_API_URL;
use localchat_core::SendMode;

/// Directory name under the platform data directory.
const APP_DIR: &str = "localchat";

/// Log file name inside the data directory.
const LOG_FILE: &str = "localchat.log";

/// Resolved settings for one run of the binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the chat backend.
    pub api_url: String,
    /// Where conversations and settings are stored.
    pub data_dir: PathBuf,
    /// Tracing output; `None` means `<data_dir>/localchat.log`.
    pub log_file: Option<PathBuf>,
    /// Use `POST /chat/stream` instead of `POST /chat`.
    pub streaming: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
            log_file: None,
            streaming: true,
        }
    }
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(LOG_FILE))
    }

    pub fn send_mode(&self) -> SendMode {
        if self.streaming {
            SendMode::Streaming
        } else {
            SendMode::Blocking
        }
    }
}

/// `<platform data dir>/localchat`, falling back to the working directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert!(config.streaming);
        assert!(config.data_dir.ends_with("localchat"));
        assert_eq!(config.send_mode(), SendMode::Streaming);
    }

    #[test]
    fn test_log_path_defaults_into_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/lc"),
            ..Config::default()
        };
        assert_eq!(config.log_path(), PathBuf::from("/tmp/lc/localchat.log"));

        let config = Config {
            log_file: Some(PathBuf::from("/var/log/chat.log")),
            ..config
        };
        assert_eq!(config.log_path(), PathBuf::from("/var/log/chat.log"));
    }

    #[test]
    fn test_blocking_mode() {
        let config = Config {
            streaming: false,
            ..Config::default()
        };
        assert_eq!(config.send_mode(), SendMode::Blocking);
    }
}
