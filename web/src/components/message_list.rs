//! Scrolling transcript of the current conversation.

use leptos::html::Div;
use leptos::*;

use localchat_core::Message;

use super::MessageItem;
use crate::state::ChatState;

#[component]
pub fn MessageList() -> impl IntoView {
    let state = expect_context::<ChatState>();
    let messages = create_memo(move |_| state.messages());
    let container = create_node_ref::<Div>();
    // Every change to the transcript, fragments included, scrolls to the end.
    create_effect(move |_| {
        messages.track();
        request_animation_frame(move || {
            if let Some(el) = container.get_untracked() {
                el.set_scroll_top(bottom_offset(el.scroll_height(), el.client_height()));
            }
        });
    });

    let thinking = move || messages.with(|m| thinking_visible(m, state.is_loading()));

    view! {
        <div node_ref=container class="flex-1 overflow-y-auto px-4 py-6 space-y-4">
            <Show
                when=move || !messages.with(Vec::is_empty)
                fallback=|| view! {
                    <div class="h-full flex flex-col items-center justify-center text-center text-gray-500">
                        <p class="text-2xl font-semibold text-gray-300">"Hello, Human"</p>
                        <p class="mt-2 text-sm">"Ask anything to start a conversation."</p>
                    </div>
                }
            >
                <For
                    each=move || messages.get().into_iter().enumerate()
                    key=|(index, message)| (*index, message.content.clone())
                    children=|(_, message)| view! { <MessageItem message=message /> }
                />
            </Show>
            <Show when=thinking>
                <div class="flex items-center gap-2 text-sm text-gray-400">
                    <span class="w-2 h-2 rounded-full bg-blue-400 animate-pulse" />
                    "Thinking..."
                </div>
            </Show>
        </div>
    }
}

fn bottom_offset(scroll_height: i32, client_height: i32) -> i32 {
    (scroll_height - client_height).max(0)
}

/// A request is pending and no reply text has arrived yet.
fn thinking_visible(messages: &[Message], loading: bool) -> bool {
    loading
        && messages
            .last()
            .map_or(true, |last| !last.is_assistant() || last.content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_always_targets_the_end() {
        assert_eq!(bottom_offset(1000, 400), 600);
        assert_eq!(bottom_offset(1200, 400), 800);
        // Short transcripts that fit stay at the top.
        assert_eq!(bottom_offset(300, 400), 0);
    }

    #[test]
    fn test_thinking_until_reply_text_arrives() {
        let waiting = vec![Message::user("hi")];
        assert!(thinking_visible(&waiting, true));
        assert!(!thinking_visible(&waiting, false));

        let placeholder = vec![Message::user("hi"), Message::assistant("")];
        assert!(thinking_visible(&placeholder, true));

        let streaming = vec![Message::user("hi"), Message::assistant("Hel")];
        assert!(!thinking_visible(&streaming, true));
    }
}
