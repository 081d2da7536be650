//! Auto-growing message box with send and stop controls.

use leptos::html::Textarea;
use leptos::*;

use crate::state::ChatState;

/// Tallest the box grows before it scrolls.
const MAX_INPUT_HEIGHT_PX: i32 = 200;

#[component]
pub fn MessageInput() -> impl IntoView {
    let state = expect_context::<ChatState>();
    let (text, set_text) = create_signal(String::new());
    let textarea = create_node_ref::<Textarea>();

    let resize = move || {
        if let Some(el) = textarea.get_untracked() {
            let style = web_sys::HtmlElement::style(&el);
            let _ = style.set_property("height", "auto");
            let height = input_height(el.scroll_height());
            let _ = style.set_property("height", &format!("{}px", height));
        }
    };

    let submit = move || {
        if state.send(&text.get_untracked()) {
            set_text.set(String::new());
            request_animation_frame(resize);
        }
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() && !ev.is_composing() {
            ev.prevent_default();
            submit();
        }
    };

    let on_input = move |ev: ev::Event| {
        set_text.set(event_target_value(&ev));
        resize();
    };

    view! {
        <div class="border-t border-gray-700 p-4">
            <div class="flex items-end gap-2">
                <textarea
                    node_ref=textarea
                    rows="1"
                    class="flex-1 resize-none bg-gray-800 border border-gray-600 rounded-lg px-4 py-2 text-white text-sm focus:outline-none focus:border-blue-500"
                    placeholder="Type a message... (Shift+Enter for a new line)"
                    prop:value=move || text.get()
                    on:input=on_input
                    on:keydown=on_keydown
                />
                <Show
                    when=move || state.is_streaming()
                    fallback=move || view! {
                        <button
                            class="px-4 py-2 bg-blue-600 hover:bg-blue-700 rounded-lg font-medium transition-colors disabled:opacity-50"
                            disabled=move || state.is_loading() || text.with(|t| t.trim().is_empty())
                            on:click=move |_| submit()
                        >
                            "Send"
                        </button>
                    }
                >
                    <button
                        class="px-4 py-2 bg-red-600 hover:bg-red-700 rounded-lg font-medium transition-colors"
                        on:click=move |_| state.stop()
                    >
                        "Stop"
                    </button>
                </Show>
            </div>
        </div>
    }
}

fn input_height(scroll_height: i32) -> i32 {
    scroll_height.clamp(0, MAX_INPUT_HEIGHT_PX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_height_is_capped() {
        assert_eq!(input_height(38), 38);
        assert_eq!(input_height(900), MAX_INPUT_HEIGHT_PX);
    }
}
