use crate::ui::Route;
use dioxus::prelude::*;

use super::audio_player::AudioPlayerPopup;
use super::error_toast::ErrorToast;
use super::progress_overlay::ProgressOverlay;

/// Layout component: header, page content and the overlays that float
/// above every page
#[component]
pub fn Navbar() -> Element {
    rsx! {
        div { class: "min-h-screen flex flex-col bg-[#161925]",
            nav { class: "bg-[#121212] px-6 py-4",
                div { class: "max-w-7xl mx-auto flex justify-between items-center",
                    h1 { class: "text-white text-2xl font-bold", "minicast" }
                }
            }
            main { class: "flex-grow container mx-auto px-4 py-8", Outlet::<Route> {} }
            footer { class: "bg-[#121212] py-4 text-center text-sm text-gray-400",
                "Turn any content into a short podcast"
            }
        }
        ProgressOverlay {}
        AudioPlayerPopup {}
        ErrorToast {}
    }
}
