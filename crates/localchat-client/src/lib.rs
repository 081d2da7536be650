//! HTTP client for the LocalChat backend.
//!
//! Wraps the backend's REST endpoints (`/models`, `/chat`, `/chat/stream`,
//! `/documents`) and turns the streaming endpoint into a sequence of text
//! fragments via [`localchat_core::FragmentDecoder`].

pub mod error;
pub mod http;
pub mod stream;

pub use error::ApiError;
pub use http::{ApiClient, DEFAULT_API_URL};
pub use stream::FragmentStream;
