use crate::catalog::ContentTab;
use crate::generation::UploadFile;
use dioxus::prelude::*;

/// Tabbed input for the content a podcast is generated from
#[component]
pub fn ContentTabs(
    active: Signal<ContentTab>,
    file: Signal<Option<UploadFile>>,
    youtube_url: Signal<String>,
    web_url: Signal<String>,
    text_content: Signal<String>,
) -> Element {
    rsx! {
        div { class: "w-full max-w-3xl mx-auto",
            div { class: "flex space-x-1 mb-6",
                for tab in ContentTab::ALL {
                    button {
                        key: "{tab.label()}",
                        class: if active() == tab {
                            "flex-1 py-3 px-2 rounded-t-lg bg-[#069494] text-white"
                        } else {
                            "flex-1 py-3 px-2 rounded-t-lg bg-[#192734] text-gray-300 hover:bg-[#22303c]"
                        },
                        onclick: move |_| active.set(tab),
                        "{tab.label()}"
                    }
                }
            }
            div { class: "bg-[#192734] p-4 md:p-6 rounded-lg",
                match active() {
                    ContentTab::Paste => rsx! {
                        textarea {
                            class: "w-full h-48 p-4 bg-[#161925] text-white rounded-lg focus:outline-none focus:ring-2 focus:ring-[#069494]",
                            placeholder: ContentTab::Paste.placeholder(),
                            value: "{text_content}",
                            oninput: move |evt| text_content.set(evt.value()),
                        }
                    },
                    ContentTab::Web => rsx! {
                        UrlInput { tab: ContentTab::Web, value: web_url }
                    },
                    ContentTab::YouTube => rsx! {
                        UrlInput { tab: ContentTab::YouTube, value: youtube_url }
                    },
                    ContentTab::Upload => rsx! {
                        FilePicker { file }
                    },
                }
            }
        }
    }
}

#[component]
fn UrlInput(tab: ContentTab, value: Signal<String>) -> Element {
    rsx! {
        input {
            r#type: "url",
            class: "w-full p-4 bg-[#161925] text-white rounded-lg focus:outline-none focus:ring-2 focus:ring-[#069494]",
            placeholder: tab.placeholder(),
            value: "{value}",
            oninput: move |evt| value.set(evt.value()),
        }
    }
}

#[component]
fn FilePicker(file: Signal<Option<UploadFile>>) -> Element {
    let label = match file() {
        Some(selected) => format!("Selected: {}", selected.name),
        None => ContentTab::Upload.placeholder().to_string(),
    };

    rsx! {
        div { class: "w-full p-6 md:p-8 bg-[#161925] rounded-lg border-2 border-dashed border-gray-600 text-center",
            button {
                class: "cursor-pointer text-white hover:text-[#069494] transition-colors",
                onclick: move |_| {
                    spawn(async move {
                        let picked = rfd::AsyncFileDialog::new()
                            .set_title("Choose a PDF")
                            .add_filter("PDF", &["pdf"])
                            .pick_file()
                            .await;
                        if let Some(handle) = picked {
                            file.set(Some(UploadFile::from_path(handle.path())));
                        }
                    });
                },
                "{label}"
            }
            if file().is_some() {
                button {
                    class: "block mx-auto mt-3 text-sm text-gray-400 hover:text-white",
                    onclick: move |_| file.set(None),
                    "Remove"
                }
            }
        }
    }
}
