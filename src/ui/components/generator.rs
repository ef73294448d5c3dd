use crate::catalog::{ContentTab, PodcastLength, DEFAULT_GUEST, DEFAULT_HOST};
use crate::generation::{ContentSources, GenerationRequest, UploadFile};
use crate::AppContext;
use dioxus::prelude::*;
use tracing::{debug, info};

use super::content_tabs::ContentTabs;
use super::podcast_config::PodcastConfig;
use super::screen_hooks::{use_screen_controller, use_screen_state};

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The generation page: voice and length settings, content input and the
/// generate button
#[component]
pub fn Generator() -> Element {
    let screen_controller = use_screen_controller();
    let runtime_handle = use_context::<AppContext>().runtime_handle.clone();
    let shared = use_screen_state();

    let host = use_signal(|| DEFAULT_HOST.to_string());
    let guest = use_signal(|| DEFAULT_GUEST.to_string());
    let length = use_signal(PodcastLength::default);
    let active_tab = use_signal(ContentTab::default);
    let file = use_signal(|| None::<UploadFile>);
    let youtube_url = use_signal(String::new);
    let web_url = use_signal(String::new);
    let text_content = use_signal(String::new);

    let is_generating = shared.screen.read().is_generating;

    let on_generate = move |_: MouseEvent| {
        let request = GenerationRequest {
            content: ContentSources {
                file: file(),
                youtube_url: youtube_url(),
                web_url: web_url(),
                text_content: text_content(),
            },
            host: non_empty(host()),
            guest: non_empty(guest()),
            length: length(),
        };
        debug!("Generate requested from {:?} tab", active_tab());

        let screen_controller = screen_controller.clone();
        runtime_handle.spawn(async move {
            if let Ok(url) = screen_controller.generate(request).await {
                info!("Generated podcast ready at {}", url);
            }
        });
    };

    rsx! {
        div { class: "space-y-8",
            h2 { class: "text-white text-3xl font-bold text-center",
                "Generate Mini-podcast From Your Content"
            }
            PodcastConfig { host, guest, length }
            ContentTabs {
                active: active_tab,
                file,
                youtube_url,
                web_url,
                text_content,
            }
            GenerateButton { is_generating, onclick: on_generate }
        }
    }
}

#[component]
fn GenerateButton(is_generating: bool, onclick: EventHandler<MouseEvent>) -> Element {
    rsx! {
        div { class: "flex justify-center",
            button {
                class: if is_generating {
                    "px-8 py-3 rounded-lg bg-gray-500 cursor-not-allowed text-white font-semibold"
                } else {
                    "px-8 py-3 rounded-lg bg-[#069494] hover:bg-[#057373] text-white font-semibold transition-colors"
                },
                disabled: is_generating,
                onclick: move |evt| onclick.call(evt),
                if is_generating { "Generating..." } else { "Generate Podcast" }
            }
        }
    }
}
