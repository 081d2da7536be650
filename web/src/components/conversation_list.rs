//! Conversation sidebar with export and import.

use chrono::{Local, NaiveDate};
use leptos::*;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlInputElement, Url};

use localchat_core::{Conversation, ConversationId};

use crate::state::ChatState;
use crate::storage::js_message;

/// Lists every conversation, newest first, with the current one highlighted.
#[component]
pub fn ConversationList() -> impl IntoView {
    let state = expect_context::<ChatState>();
    let (pending_delete, set_pending_delete) = create_signal::<Option<ConversationId>>(None);
    let (transfer_note, set_transfer_note) = create_signal::<Option<String>>(None);

    let export = move |_| {
        let result = state
            .export_json()
            .and_then(|json| download_json(&json, &export_file_name(Local::now().date_naive())));
        set_transfer_note.set(result.err().map(|e| format!("Export failed: {}", e)));
    };

    let import = move |ev: ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        // Allow the same file to be picked again.
        input.set_value("");
        spawn_local(async move {
            let note = match JsFuture::from(file.text()).await {
                Ok(text) => {
                    let text = text.as_string().unwrap_or_default();
                    match state.import_json(&text) {
                        Ok(count) => format!("Imported {} conversations", count),
                        Err(e) => format!("Import failed: {}", e),
                    }
                }
                Err(e) => format!("Import failed: {}", js_message(&e)),
            };
            set_transfer_note.set(Some(note));
        });
    };

    view! {
        <aside class="w-64 bg-gray-800 border-r border-gray-700 flex flex-col">
            <div class="p-4 border-b border-gray-700 space-y-3">
                <h1 class="text-xl font-bold text-white">"LocalChat"</h1>
                <button
                    class="w-full px-3 py-2 bg-blue-600 hover:bg-blue-700 rounded-lg text-sm font-medium transition-colors"
                    on:click=move |_| state.new_conversation()
                >
                    "+ New chat"
                </button>
            </div>

            <nav class="flex-1 overflow-y-auto p-2 space-y-1">
                <Show when=move || state.conversations().is_empty()>
                    <p class="px-3 py-2 text-sm text-gray-500 italic">"No conversations yet"</p>
                </Show>
                <For
                    each=move || state.conversations()
                    key=|c| (c.id.clone(), c.title.clone())
                    children=move |conversation| view! {
                        <ConversationRow
                            conversation=conversation
                            pending_delete=pending_delete
                            set_pending_delete=set_pending_delete
                        />
                    }
                />
            </nav>

            <div class="p-3 border-t border-gray-700 space-y-2">
                <div class="flex gap-2">
                    <button
                        class="flex-1 px-2 py-1 bg-gray-700 hover:bg-gray-600 rounded text-xs transition-colors"
                        on:click=export
                    >
                        "Export"
                    </button>
                    <label class="flex-1 px-2 py-1 bg-gray-700 hover:bg-gray-600 rounded text-xs text-center cursor-pointer transition-colors">
                        "Import"
                        <input type="file" accept=".json,application/json" class="hidden" on:change=import />
                    </label>
                </div>
                {move || transfer_note.get().map(|note| view! {
                    <p class="text-xs text-gray-400">{note}</p>
                })}
            </div>
        </aside>
    }
}

#[component]
fn ConversationRow(
    conversation: Conversation,
    pending_delete: ReadSignal<Option<ConversationId>>,
    set_pending_delete: WriteSignal<Option<ConversationId>>,
) -> impl IntoView {
    let state = expect_context::<ChatState>();
    let id = store_value(conversation.id);
    let is_current = move || state.current_id().as_ref() == Some(&id.get_value());
    let confirming = move || pending_delete.get().as_ref() == Some(&id.get_value());
    let updated = conversation
        .updated_at
        .with_timezone(&Local)
        .format("%b %d, %H:%M")
        .to_string();

    view! {
        <div
            class="group px-3 py-2 rounded-lg cursor-pointer text-sm text-gray-300 hover:bg-gray-700"
            class:bg-gray-700=is_current
            class:text-white=is_current
            on:click=move |_| state.select(&id.get_value())
        >
            <div class="truncate">{conversation.title}</div>
            <div class="flex items-center justify-between text-xs text-gray-500">
                <span>{updated}</span>
                <Show
                    when=confirming
                    fallback=move || view! {
                        <button
                            class="hidden group-hover:inline text-gray-400 hover:text-red-400"
                            on:click=move |ev| {
                                ev.stop_propagation();
                                set_pending_delete.set(Some(id.get_value()));
                            }
                        >
                            "Delete"
                        </button>
                    }
                >
                    <span class="flex gap-2">
                        <button
                            class="text-red-400 hover:text-red-300"
                            on:click=move |ev| {
                                ev.stop_propagation();
                                set_pending_delete.set(None);
                                state.delete(&id.get_value());
                            }
                        >
                            "Delete?"
                        </button>
                        <button
                            class="text-gray-400 hover:text-white"
                            on:click=move |ev| {
                                ev.stop_propagation();
                                set_pending_delete.set(None);
                            }
                        >
                            "Keep"
                        </button>
                    </span>
                </Show>
            </div>
        </div>
    }
}

fn export_file_name(date: NaiveDate) -> String {
    format!("localchat-conversations-{}.json", date.format("%Y-%m-%d"))
}

/// Offer `json` to the user as a file download.
fn download_json(json: &str, file_name: &str) -> Result<(), String> {
    let parts = js_sys::Array::of1(&JsValue::from_str(json));
    let options = BlobPropertyBag::new();
    options.set_type("application/json");
    let blob =
        Blob::new_with_str_sequence_and_options(&parts, &options).map_err(|e| js_message(&e))?;
    let url = Url::create_object_url_with_blob(&blob).map_err(|e| js_message(&e))?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("No document")?;
    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(|e| js_message(&e))?
        .dyn_into()
        .map_err(|_| "Anchor cast failed")?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    let _ = Url::revoke_object_url(&url);
    Ok(())
}
