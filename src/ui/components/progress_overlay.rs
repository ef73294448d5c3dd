use dioxus::prelude::*;

use super::screen_hooks::use_screen_state;

/// Modal progress bar shown while a podcast is being generated
#[component]
pub fn ProgressOverlay() -> Element {
    let shared = use_screen_state();
    let progress = (shared.progress)();

    if !progress.is_running() {
        return rsx! {};
    }
    let percent = progress.rounded_percent();

    rsx! {
        div { class: "fixed inset-0 bg-black/50 flex items-center justify-center z-50",
            div { class: "bg-[#192734] p-8 rounded-lg shadow-xl w-[90%] max-w-md",
                div { class: "text-center mb-4",
                    h3 { class: "text-white text-xl font-semibold mb-2", "Generating your podcast..." }
                    p { class: "text-gray-300", "{percent}%" }
                }
                div { class: "h-2 bg-[#161925] rounded-full overflow-hidden",
                    div {
                        class: "progress-fill h-full bg-[#069494]",
                        style: "width: {percent}%;",
                    }
                }
            }
        }
    }
}
