//! Settings popover: model, sampling and feature toggles.
//!
//! Every change is applied and persisted as it happens.

use leptos::*;

use localchat_core::settings::{MAX_TOKENS_RANGE, TEMPERATURE_RANGE, TEMPERATURE_STEP};
use localchat_core::{ModelInfo, SendMode};

use crate::state::ChatState;

#[component]
pub fn ModelSelector() -> impl IntoView {
    let state = expect_context::<ChatState>();
    let (open, set_open) = create_signal(false);
    let settings = create_memo(move |_| state.settings());

    let model_options = move || {
        let current = settings.with(|s| s.model.clone());
        let mut models = state.models.get();
        if !models.iter().any(|m| m.name == current) {
            models.insert(0, ModelInfo::named(current.clone()));
        }
        models
            .into_iter()
            .map(|model| {
                let label = match &model.size {
                    Some(size) => format!("{} ({})", model.name, size),
                    None => model.name.clone(),
                };
                let selected = model.name == current;
                view! { <option value=model.name selected=selected>{label}</option> }
            })
            .collect_view()
    };

    view! {
        <div class="relative">
            <button
                class="px-3 py-1 bg-gray-700 hover:bg-gray-600 rounded-lg text-sm transition-colors"
                on:click=move |_| set_open.update(|o| *o = !*o)
            >
                {move || settings.with(|s| s.model.clone())}
            </button>

            <Show when=move || open.get()>
                <div class="absolute right-0 mt-2 w-80 z-10 p-4 space-y-4 bg-gray-800 border border-gray-700 rounded-lg shadow-lg text-sm">
                    <div>
                        <label class="block text-gray-400 mb-1">"Model"</label>
                        <select
                            class="w-full bg-gray-700 border border-gray-600 rounded px-2 py-1"
                            on:change=move |ev| {
                                let model = event_target_value(&ev);
                                state.update_settings(|s| s.model = model);
                            }
                        >
                            {model_options}
                        </select>
                        <Show when=move || state.models_fallback.get()>
                            <p class="mt-1 text-xs text-yellow-400">"Backend models unavailable, showing defaults"</p>
                        </Show>
                    </div>

                    <div>
                        <label class="block text-gray-400 mb-1">
                            {move || format!("Temperature: {:.1}", settings.with(|s| s.temperature))}
                        </label>
                        <input
                            type="range"
                            class="w-full"
                            min=TEMPERATURE_RANGE.0
                            max=TEMPERATURE_RANGE.1
                            step=TEMPERATURE_STEP
                            prop:value=move || settings.with(|s| s.temperature.to_string())
                            on:input=move |ev| {
                                if let Ok(value) = event_target_value(&ev).parse::<f64>() {
                                    state.update_settings(|s| {
                                        s.temperature = value.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1)
                                    });
                                }
                            }
                        />
                    </div>

                    <div>
                        <label class="block text-gray-400 mb-1">"Max tokens"</label>
                        <input
                            type="number"
                            class="w-full bg-gray-700 border border-gray-600 rounded px-2 py-1"
                            min=MAX_TOKENS_RANGE.0
                            max=MAX_TOKENS_RANGE.1
                            prop:value=move || settings.with(|s| s.max_tokens.to_string())
                            on:input=move |ev| {
                                if let Ok(value) = event_target_value(&ev).parse::<u32>() {
                                    state.update_settings(|s| {
                                        s.max_tokens = value.clamp(MAX_TOKENS_RANGE.0, MAX_TOKENS_RANGE.1)
                                    });
                                }
                            }
                        />
                    </div>

                    <div>
                        <label class="block text-gray-400 mb-1">"System prompt"</label>
                        <textarea
                            class="w-full h-20 bg-gray-700 border border-gray-600 rounded px-2 py-1"
                            prop:value=move || settings.with(|s| s.system_prompt.clone())
                            on:input=move |ev| {
                                let prompt = event_target_value(&ev);
                                state.update_settings(|s| s.system_prompt = prompt);
                            }
                        />
                    </div>

                    <label class="flex items-center gap-2">
                        <input
                            type="checkbox"
                            prop:checked=move || settings.with(|s| s.use_knowledge_base)
                            on:change=move |ev| {
                                let checked = event_target_checked(&ev);
                                state.update_settings(|s| s.use_knowledge_base = checked);
                            }
                        />
                        "Use knowledge base"
                    </label>
                    <label class="flex items-center gap-2">
                        <input
                            type="checkbox"
                            prop:checked=move || settings.with(|s| s.use_mongodb_tools)
                            on:change=move |ev| {
                                let checked = event_target_checked(&ev);
                                state.update_settings(|s| s.use_mongodb_tools = checked);
                            }
                        />
                        "Use MongoDB tools"
                    </label>
                    <label class="flex items-center gap-2">
                        <input
                            type="checkbox"
                            prop:checked=move || state.mode.get() == SendMode::Streaming
                            on:change=move |ev| {
                                let mode = if event_target_checked(&ev) {
                                    SendMode::Streaming
                                } else {
                                    SendMode::Blocking
                                };
                                state.mode.set(mode);
                            }
                        />
                        "Stream replies"
                    </label>
                </div>
            </Show>
        </div>
    }
}
