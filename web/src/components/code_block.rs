//! Fenced code block with a copy button.

use gloo_timers::future::TimeoutFuture;
use js_sys::{Function, Promise, Reflect};
use leptos::*;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::storage::js_message;

/// How long the "Copied" acknowledgement stays up.
const COPIED_ACK_MS: u32 = 2_000;

#[component]
pub fn CodeBlock(language: Option<String>, code: String) -> impl IntoView {
    let (copied, set_copied) = create_signal(false);
    let code = store_value(code);

    let copy = move |_| {
        let text = code.get_value();
        spawn_local(async move {
            match write_clipboard(&text).await {
                Ok(()) => {
                    set_copied.set(true);
                    TimeoutFuture::new(COPIED_ACK_MS).await;
                    // The block may have been re-rendered away meanwhile.
                    let _ = set_copied.try_set(false);
                }
                Err(e) => {
                    web_sys::console::warn_1(&format!("Copy failed: {}", e).into());
                }
            }
        });
    };

    view! {
        <div class="my-2 rounded-lg border border-gray-700 bg-gray-950 overflow-hidden">
            <div class="flex items-center justify-between px-3 py-1 bg-gray-800 text-xs text-gray-400">
                <span class="font-mono">{language.unwrap_or_else(|| "text".to_string())}</span>
                <button class="hover:text-white transition-colors" on:click=copy>
                    {move || if copied.get() { "Copied" } else { "Copy" }}
                </button>
            </div>
            <pre class="p-3 overflow-x-auto text-sm text-gray-200 font-mono">
                <code>{code.get_value()}</code>
            </pre>
        </div>
    }
}

/// `navigator.clipboard.writeText(text)`.
async fn write_clipboard(text: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or("No window")?;
    let clipboard = Reflect::get(&window.navigator(), &JsValue::from_str("clipboard"))
        .map_err(|e| js_message(&e))?;
    if clipboard.is_undefined() {
        return Err("Clipboard is unavailable (needs a secure context)".to_string());
    }
    let write_text: Function = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
        .map_err(|e| js_message(&e))?
        .dyn_into()
        .map_err(|_| "Clipboard cannot write text")?;
    let promise: Promise = write_text
        .call1(&clipboard, &JsValue::from_str(text))
        .map_err(|e| js_message(&e))?
        .dyn_into()
        .map_err(|_| "Clipboard did not return a promise")?;
    JsFuture::from(promise).await.map_err(|e| js_message(&e))?;
    Ok(())
}
