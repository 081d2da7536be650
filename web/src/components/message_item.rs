//! One message bubble.

use chrono::Local;
use leptos::*;

use localchat_core::markdown::{classify_line, inline_spans, segments, Block, Inline, Segment};
use localchat_core::{Message, Role};

use super::CodeBlock;

#[component]
pub fn MessageItem(message: Message) -> impl IntoView {
    let (label, bubble) = match message.role {
        Role::User => ("You", "ml-auto bg-blue-600 text-white"),
        Role::Assistant => ("Assistant", "mr-auto bg-gray-800 text-gray-100"),
        Role::System => ("System", "mx-auto bg-gray-700 text-gray-300 italic"),
    };
    let time = message
        .timestamp
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string());

    let body = if message.is_assistant() {
        render_markdown(&message.content)
    } else {
        view! { <pre class="whitespace-pre-wrap break-words font-sans">{message.content}</pre> }
            .into_view()
    };

    view! {
        <div class=format!("max-w-3xl w-fit rounded-lg px-4 py-3 {}", bubble)>
            <div class="flex items-center gap-2 mb-1 text-xs opacity-70">
                <span class="font-semibold">{label}</span>
                {time.map(|t| view! { <span>{t}</span> })}
            </div>
            {body}
        </div>
    }
}

fn render_markdown(content: &str) -> View {
    segments(content)
        .into_iter()
        .map(|segment| match segment {
            Segment::Code { language, code } => {
                view! { <CodeBlock language=language code=code /> }.into_view()
            }
            Segment::Text(text) => text.lines().map(render_line).collect_view(),
        })
        .collect_view()
}

fn render_line(line: &str) -> View {
    match classify_line(line) {
        Block::Blank => view! { <div class="h-2" /> }.into_view(),
        Block::Heading { level, text } => {
            let size = match level {
                1 => "text-xl",
                2 => "text-lg",
                _ => "text-base",
            };
            view! { <p class=format!("{} font-bold mt-2", size)>{render_inline(text)}</p> }
                .into_view()
        }
        Block::Bullet { indent, text } => view! {
            <div class="flex gap-2" style=indent_style(indent)>
                <span>"•"</span>
                <span>{render_inline(text)}</span>
            </div>
        }
        .into_view(),
        Block::Numbered {
            indent,
            marker,
            text,
        } => {
            let marker = marker.to_string();
            view! {
                <div class="flex gap-2" style=indent_style(indent)>
                    <span>{marker}</span>
                    <span>{render_inline(text)}</span>
                </div>
            }
            .into_view()
        }
        Block::Quote(text) => view! {
            <blockquote class="border-l-2 border-gray-500 pl-3 text-gray-400">
                {render_inline(text)}
            </blockquote>
        }
        .into_view(),
        Block::Rule => view! { <hr class="my-2 border-gray-600" /> }.into_view(),
        Block::Paragraph(text) => view! { <p>{render_inline(text)}</p> }.into_view(),
    }
}

fn render_inline(line: &str) -> View {
    inline_spans(line)
        .into_iter()
        .map(|span| match span {
            Inline::Plain(text) => text.to_string().into_view(),
            Inline::Code(code) => {
                let code = code.to_string();
                view! { <code class="px-1 rounded bg-gray-700 font-mono text-sm">{code}</code> }
                    .into_view()
            }
            Inline::Bold(text) => {
                let text = text.to_string();
                view! { <strong>{text}</strong> }.into_view()
            }
        })
        .collect_view()
}

fn indent_style(indent: usize) -> String {
    format!("padding-left: {}ch", indent)
}
