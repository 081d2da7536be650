//! Main chat pane.

use leptos::*;

use localchat_core::DEFAULT_TITLE;

use super::{MessageInput, MessageList, ModelSelector};
use crate::state::ChatState;

#[component]
pub fn ChatWindow() -> impl IntoView {
    let state = expect_context::<ChatState>();
    let title = move || state.current_title().unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let busy = move || state.is_loading();

    view! {
        <div class="flex flex-col h-full">
            <div class="flex items-center justify-between gap-4 px-4 py-2 border-b border-gray-700">
                <h2 class="font-semibold truncate">{title}</h2>
                <div class="flex items-center gap-2 text-sm">
                    <button
                        class="px-3 py-1 bg-gray-700 hover:bg-gray-600 rounded-lg transition-colors disabled:opacity-50"
                        disabled=move || busy() || state.messages().len() < 2
                        on:click=move |_| state.regenerate()
                    >
                        "Regenerate"
                    </button>
                    <button
                        class="px-3 py-1 bg-gray-700 hover:bg-gray-600 rounded-lg transition-colors disabled:opacity-50"
                        disabled=busy
                        on:click=move |_| state.clear()
                    >
                        "Clear"
                    </button>
                    <ModelSelector />
                </div>
            </div>

            <MessageList />

            {move || state.notice.get().map(|notice| view! {
                <div class="mx-4 mb-2 p-3 bg-red-900/50 border border-red-700 rounded-lg text-sm text-red-300 flex justify-between">
                    <span>{notice}</span>
                    <button class="ml-4 hover:text-white" on:click=move |_| state.notice.set(None)>
                        "Dismiss"
                    </button>
                </div>
            })}

            <MessageInput />
        </div>
    }
}
