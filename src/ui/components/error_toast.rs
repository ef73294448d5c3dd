use dioxus::prelude::*;

use super::screen_hooks::{use_screen_controller, use_screen_state};

/// Generation errors and playback notices, bottom right
#[component]
pub fn ErrorToast() -> Element {
    let screen_controller = use_screen_controller();
    let shared = use_screen_state();
    let mut notice = shared.notice;

    let error = shared.screen.read().error.clone();
    let message = error.or_else(|| notice());

    let Some(message) = message else {
        return rsx! {};
    };

    rsx! {
        div { class: "fixed bottom-4 right-4 z-[60] max-w-sm bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded flex items-start gap-3",
            span { class: "flex-1", "{message}" }
            button {
                class: "text-red-700 hover:text-red-900 font-bold",
                onclick: move |_| {
                    screen_controller.dismiss_error();
                    notice.set(None);
                },
                "✕"
            }
        }
    }
}
