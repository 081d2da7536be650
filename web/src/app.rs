//! Root component: state, layout and routing.

use leptos::*;
use leptos_router::*;

use localchat_core::{StorageError, CONVERSATIONS_KEY};

use crate::api;
use crate::components::{ChatWindow, ConversationList, KnowledgeBaseView};
use crate::state::ChatState;
use crate::storage::LocalStore;

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
    match ChatState::load() {
        Ok(state) => {
            provide_context(state);
            state.load_models();
            view! { <Shell /> }.into_view()
        }
        Err(error) => view! { <LoadFailed error=error /> }.into_view(),
    }
}

#[component]
fn Shell() -> impl IntoView {
    view! {
        <Router>
            <div class="flex h-screen bg-gray-900 text-gray-100">
                <ConversationList />
                <div class="flex-1 flex flex-col min-w-0">
                    <TopBar />
                    <main class="flex-1 overflow-hidden">
                        <Routes>
                            <Route path="/" view=ChatWindow />
                            <Route path="/knowledge" view=KnowledgeBaseView />
                        </Routes>
                    </main>
                </div>
            </div>
        </Router>
    }
}

#[component]
fn TopBar() -> impl IntoView {
    view! {
        <header class="flex items-center justify-between px-4 py-2 border-b border-gray-700 bg-gray-800">
            <nav class="flex gap-2">
                <NavLink href="/" label="Chat" />
                <NavLink href="/knowledge" label="Knowledge Base" />
            </nav>
            <BackendStatus />
        </header>
    }
}

#[component]
fn NavLink(href: &'static str, label: &'static str) -> impl IntoView {
    view! {
        <A
            href=href
            exact=true
            class="px-3 py-1 rounded-lg text-sm text-gray-300 hover:bg-gray-700 hover:text-white transition-colors"
            active_class="bg-gray-700 text-white"
        >
            {label}
        </A>
    }
}

/// Reachability of the backend, checked once on mount.
#[component]
fn BackendStatus() -> impl IntoView {
    let (online, set_online) = create_signal::<Option<bool>>(None);

    create_effect(move |_| {
        spawn_local(async move {
            let healthy = match api::fetch_health().await {
                Ok(health) => health.is_ok(),
                Err(e) => {
                    web_sys::console::warn_1(&format!("Health check failed: {}", e).into());
                    false
                }
            };
            set_online.set(Some(healthy));
        });
    });

    view! {
        <div class="flex items-center gap-2 text-sm">
            <span
                class="w-2 h-2 rounded-full"
                class:bg-yellow-500=move || online.get().is_none()
                class:bg-green-500=move || online.get() == Some(true)
                class:bg-red-500=move || online.get() == Some(false)
            />
            <span class="text-gray-400">
                {move || match online.get() {
                    None => "Checking...",
                    Some(true) => "Backend online",
                    Some(false) => "Backend offline",
                }}
            </span>
        </div>
    }
}

/// Shown when stored conversations cannot be read.
#[component]
fn LoadFailed(error: StorageError) -> impl IntoView {
    let key = match &error {
        StorageError::Corrupt { key, .. } => *key,
        _ => CONVERSATIONS_KEY,
    };
    let message = error.to_string();
    let (reset_error, set_reset_error) = create_signal::<Option<String>>(None);

    let reset = move |_| {
        match LocalStore.quarantine(key) {
            Ok(()) => {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().reload();
                }
            }
            Err(e) => set_reset_error.set(Some(e.to_string())),
        }
    };

    view! {
        <div class="flex h-screen items-center justify-center bg-gray-900 text-gray-100">
            <div class="max-w-lg p-6 bg-gray-800 border border-red-700 rounded-lg space-y-4">
                <h1 class="text-xl font-bold">"Saved conversations could not be loaded"</h1>
                <p class="text-sm text-red-300 font-mono break-words">{message}</p>
                <p class="text-sm text-gray-400">
                    "Resetting moves the unreadable data aside (kept under a \".corrupt\" key) and starts fresh."
                </p>
                <button
                    class="px-4 py-2 bg-red-600 hover:bg-red-700 rounded-lg font-medium transition-colors"
                    on:click=reset
                >
                    "Reset and reload"
                </button>
                {move || reset_error.get().map(|e| view! {
                    <p class="text-sm text-red-300">{e}</p>
                })}
            </div>
        </div>
    }
}
