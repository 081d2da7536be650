//! Document upload view for the backend's knowledge base.

use leptos::*;
use web_sys::HtmlInputElement;

use crate::api;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum UploadStatus {
    Uploading,
    Done(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Upload {
    id: usize,
    name: String,
    status: UploadStatus,
}

#[component]
pub fn KnowledgeBaseView() -> impl IntoView {
    let uploads = create_rw_signal(Vec::<Upload>::new());
    let next_id = store_value(0usize);

    let on_change = move |ev: ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        let Some(files) = input.files() else {
            return;
        };
        let picked: Vec<_> = (0..files.length()).filter_map(|i| files.get(i)).collect();
        input.set_value("");

        for file in picked {
            let id = next_id.get_value();
            next_id.set_value(id + 1);
            uploads.update(|list| {
                list.insert(
                    0,
                    Upload {
                        id,
                        name: file.name(),
                        status: UploadStatus::Uploading,
                    },
                )
            });

            spawn_local(async move {
                let status = match api::upload_document(&file).await {
                    Ok(receipt) => UploadStatus::Done(receipt.to_string()),
                    Err(e) => UploadStatus::Failed(e),
                };
                uploads.update(|list| set_status(list, id, status));
            });
        }
    };

    view! {
        <div class="h-full overflow-y-auto p-6 space-y-6">
            <div>
                <h1 class="text-2xl font-bold">"Knowledge Base"</h1>
                <p class="mt-1 text-sm text-gray-400">
                    "Upload documents for the backend to index. Enable \"Use knowledge base\" in the chat settings to answer from them."
                </p>
            </div>

            <label class="block p-8 border-2 border-dashed border-gray-600 rounded-lg text-center cursor-pointer hover:border-blue-500 transition-colors">
                <span class="text-gray-300">"Choose files to upload"</span>
                <input type="file" multiple=true class="hidden" on:change=on_change />
            </label>

            <div class="bg-gray-800 rounded-lg border border-gray-700">
                <h2 class="px-4 py-3 border-b border-gray-700 font-semibold">
                    {move || format!("Uploads ({})", uploads.with(Vec::len))}
                </h2>
                <Show
                    when=move || !uploads.with(Vec::is_empty)
                    fallback=|| view! {
                        <p class="px-4 py-3 text-sm text-gray-500 italic">"Nothing uploaded yet"</p>
                    }
                >
                    <ul class="divide-y divide-gray-700">
                        <For
                            each=move || uploads.get()
                            key=|upload| (upload.id, upload.status.clone())
                            children=|upload| {
                                let (text, class) = match upload.status {
                                    UploadStatus::Uploading => ("Uploading...".to_string(), "text-yellow-400"),
                                    UploadStatus::Done(note) => (note, "text-green-400"),
                                    UploadStatus::Failed(error) => (error, "text-red-400"),
                                };
                                view! {
                                    <li class="px-4 py-2 flex justify-between gap-4 text-sm">
                                        <span class="truncate">{upload.name}</span>
                                        <span class=class>{text}</span>
                                    </li>
                                }
                            }
                        />
                    </ul>
                </Show>
            </div>
        </div>
    }
}

fn set_status(list: &mut [Upload], id: usize, status: UploadStatus) {
    if let Some(upload) = list.iter_mut().find(|u| u.id == id) {
        upload.status = status;
    }
}
