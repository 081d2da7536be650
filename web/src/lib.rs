//! LocalChat browser client.
//!
//! A Leptos (client-side rendered) front end over the same conversation
//! manager and stream decoder as the terminal client. Conversations and
//! settings live in `window.localStorage`; chat replies stream through
//! `fetch` and a `ReadableStream` reader.

pub mod api;
mod app;
mod components;
mod state;
mod storage;

pub use app::App;
pub use storage::LocalStore;

/// Install the panic hook and mount the app on `<body>`.
pub fn mount() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(App);
}
