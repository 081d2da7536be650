//! Streaming client for `POST /chat/stream`.
//!
//! Uses the fetch API with a `ReadableStream` reader (the endpoint needs a
//! POST body, so `EventSource` is not an option) and feeds the bytes through
//! the shared [`FragmentDecoder`].

use js_sys::{Reflect, Uint8Array};
use leptos::spawn_local;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, ReadableStreamDefaultReader, Request, RequestInit, Response};

use localchat_core::{CancellationToken, ChatRequest, FragmentDecoder};

use super::endpoint;
use crate::storage::js_message;

/// Holds the reader lock for the life of the stream.
struct ReaderLock(ReadableStreamDefaultReader);

impl Drop for ReaderLock {
    fn drop(&mut self) {
        let _ = self.0.release_lock();
    }
}

/// Stream a chat reply, calling `on_fragment` for every decoded piece of
/// text.
///
/// Returns `Ok(())` when the stream ends, when `[DONE]` arrives, or when
/// `cancel` fires. Cancelling aborts the underlying request, so a pending
/// read ends at once. On every exit the reader lock is released and the
/// request aborted.
pub async fn stream_chat<F>(
    request: &ChatRequest,
    cancel: &CancellationToken,
    mut on_fragment: F,
) -> Result<(), String>
where
    F: FnMut(String),
{
    let body_json = serde_json::to_string(request).map_err(|e| e.to_string())?;

    let headers = Headers::new().map_err(|e| js_message(&e))?;
    headers
        .set("Content-Type", "application/json")
        .map_err(|e| js_message(&e))?;

    let controller = AbortController::new().map_err(|e| js_message(&e))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(&body_json));
    init.set_signal(Some(&controller.signal()));

    let fetch_request = Request::new_with_str_and_init(&endpoint("/chat/stream"), &init)
        .map_err(|e| js_message(&e))?;

    // Abort the fetch when the caller cancels, or when this function
    // returns for any other reason (the guard cancels the child token).
    let watch = cancel.child_token();
    {
        let watch = watch.clone();
        let controller = controller.clone();
        spawn_local(async move {
            watch.cancelled().await;
            controller.abort();
        });
    }
    let _abort_on_exit = watch.drop_guard();

    let window = web_sys::window().ok_or("No window")?;
    let fetched = JsFuture::from(window.fetch_with_request(&fetch_request)).await;
    if cancel.is_cancelled() {
        return Ok(());
    }
    let response: Response = fetched
        .map_err(|e| js_message(&e))?
        .dyn_into()
        .map_err(|_| "Response cast failed")?;

    if !response.ok() {
        return Err(format!(
            "Failed to start stream: HTTP {} {}",
            response.status(),
            response.status_text()
        ));
    }

    let body = response.body().ok_or("No response body")?;
    let reader = ReaderLock(
        body.get_reader()
            .dyn_into::<ReadableStreamDefaultReader>()
            .map_err(|_| "Failed to get reader")?,
    );

    let mut decoder = FragmentDecoder::new();
    loop {
        let result = JsFuture::from(reader.0.read()).await;
        if cancel.is_cancelled() {
            return Ok(());
        }
        let result = result.map_err(|e| js_message(&e))?;

        let done = Reflect::get(&result, &JsValue::from_str("done"))
            .map_err(|_| "No done field")?
            .as_bool()
            .unwrap_or(false);
        if done {
            break;
        }

        let value = Reflect::get(&result, &JsValue::from_str("value"))
            .map_err(|_| "No value field")?;
        if value.is_undefined() {
            continue;
        }
        let bytes = value
            .dyn_into::<Uint8Array>()
            .map_err(|_| "Not a Uint8Array")?
            .to_vec();

        let decoded = decoder.push(&bytes);
        for fragment in decoded.fragments {
            on_fragment(fragment);
        }
        if decoded.done {
            return Ok(());
        }
    }

    for fragment in decoder.finish().fragments {
        on_fragment(fragment);
    }
    Ok(())
}
