use crate::playback::{DownloadState, PlaybackController, PlaybackState, ViewMode, SKIP_SECONDS};
use crate::screen::ScreenController;
use crate::AppContext;
use dioxus::prelude::*;

use super::screen_hooks::{use_screen_controller, use_screen_state};

const SCRUB_STEPS: f64 = 1000.0;

/// `m:ss`; unknown or negative times show as 0:00
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn with_player(screen: &ScreenController, action: impl FnOnce(&PlaybackController)) {
    if let Some(player) = screen.player() {
        action(&player);
    }
}

/// The generated podcast's player, as a dialog or a minimized dock
#[component]
pub fn AudioPlayerPopup() -> Element {
    let shared = use_screen_state();
    let Some(state) = (shared.playback)() else {
        return rsx! {};
    };

    match state.view_mode {
        ViewMode::Closed => rsx! {},
        ViewMode::Open => rsx! { PlayerDialog { state } },
        ViewMode::Minimized => rsx! { MiniPlayer { state } },
    }
}

#[component]
fn PlayerDialog(state: PlaybackState) -> Element {
    let screen_controller = use_screen_controller();
    let runtime_handle = use_context::<AppContext>().runtime_handle.clone();

    let downloading = state.download_state == DownloadState::InFlight;
    let download_label = match state.download_state {
        DownloadState::InFlight => "Downloading...",
        DownloadState::Done => "Downloaded",
        DownloadState::Idle | DownloadState::Failed => "Download Podcast",
    };

    rsx! {
        div { class: "fixed inset-0 bg-black/50 flex items-center justify-center z-50",
            div { class: "bg-[#192734] p-6 rounded-lg shadow-xl w-[90%] max-w-md relative",
                div { class: "absolute top-4 right-4 flex gap-3",
                    button {
                        class: "text-gray-400 hover:text-white",
                        title: "Minimize",
                        onclick: {
                            let screen_controller = screen_controller.clone();
                            move |_| with_player(&screen_controller, |p| {
                                p.set_view_mode(ViewMode::Minimized);
                            })
                        },
                        "▁"
                    }
                    button {
                        class: "text-gray-400 hover:text-white",
                        title: "Close",
                        onclick: {
                            let screen_controller = screen_controller.clone();
                            move |_| screen_controller.close_player()
                        },
                        "✕"
                    }
                }
                div { class: "space-y-6",
                    div { class: "text-center",
                        h3 { class: "text-white text-xl font-semibold mb-2", "Your Generated Podcast" }
                        p { class: "text-gray-300 text-sm", "Listen to your content in podcast format" }
                    }
                    ScrubBar { state: state.clone(), minimal: false }
                    div { class: "flex items-center justify-center gap-4",
                        button {
                            class: "text-gray-400 hover:text-white p-2",
                            title: "Back 10 seconds",
                            onclick: {
                                let screen_controller = screen_controller.clone();
                                move |_| with_player(&screen_controller, |p| p.skip(-SKIP_SECONDS))
                            },
                            "↺ 10"
                        }
                        PlayPauseButton { is_playing: state.is_playing }
                        button {
                            class: "text-gray-400 hover:text-white p-2",
                            title: "Forward 10 seconds",
                            onclick: {
                                let screen_controller = screen_controller.clone();
                                move |_| with_player(&screen_controller, |p| p.skip(SKIP_SECONDS))
                            },
                            "10 ↻"
                        }
                    }
                    div { class: "flex justify-center",
                        button {
                            class: if downloading {
                                "px-4 py-2 rounded-lg bg-gray-500 cursor-not-allowed text-white"
                            } else {
                                "px-4 py-2 rounded-lg bg-[#069494] hover:bg-[#057373] text-white"
                            },
                            disabled: downloading,
                            onclick: {
                                let screen_controller = screen_controller.clone();
                                let runtime_handle = runtime_handle.clone();
                                move |_| {
                                    if let Some(player) = screen_controller.player() {
                                        runtime_handle.spawn(async move {
                                            player.download().await;
                                        });
                                    }
                                }
                            },
                            "{download_label}"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn MiniPlayer(state: PlaybackState) -> Element {
    let screen_controller = use_screen_controller();

    rsx! {
        div { class: "fixed bottom-4 left-4 z-50 bg-[#192734] rounded-lg shadow-xl px-4 py-3 w-80 flex items-center gap-3",
            PlayPauseButton { is_playing: state.is_playing }
            div { class: "flex-1",
                ScrubBar { state: state.clone(), minimal: true }
            }
            span { class: "text-xs text-gray-400 w-10 text-right", "{format_time(state.current_time)}" }
            button {
                class: "text-gray-400 hover:text-white",
                title: "Maximize",
                onclick: {
                    let screen_controller = screen_controller.clone();
                    move |_| with_player(&screen_controller, |p| {
                        p.set_view_mode(ViewMode::Open);
                    })
                },
                "▢"
            }
            button {
                class: "text-gray-400 hover:text-white",
                title: "Close",
                onclick: move |_| screen_controller.close_player(),
                "✕"
            }
        }
    }
}

#[component]
fn PlayPauseButton(is_playing: bool) -> Element {
    let screen_controller = use_screen_controller();

    rsx! {
        button {
            class: "px-4 py-2 rounded-full bg-[#069494] hover:bg-[#057373] text-white",
            title: if is_playing { "Pause" } else { "Play" },
            onclick: move |_| with_player(&screen_controller, |p| p.toggle_play_pause()),
            if is_playing { "⏸" } else { "▶" }
        }
    }
}

#[component]
fn ScrubBar(state: PlaybackState, minimal: bool) -> Element {
    let screen_controller = use_screen_controller();
    let position = (state.fraction() * SCRUB_STEPS).round();
    let filled = state.fraction() * 100.0;

    rsx! {
        div { class: if minimal { "w-full" } else { "space-y-2" },
            input {
                r#type: "range",
                class: "scrub w-full h-1 rounded-lg appearance-none cursor-pointer",
                style: "background: linear-gradient(to right, #069494 0%, #069494 {filled}%, #4b5563 {filled}%, #4b5563 100%);",
                min: "0",
                max: "{SCRUB_STEPS}",
                value: "{position}",
                disabled: state.duration <= 0.0,
                onchange: move |evt| {
                    if let Ok(step) = evt.value().parse::<f64>() {
                        with_player(&screen_controller, |p| p.seek_to_fraction(step / SCRUB_STEPS));
                    }
                },
            }
            if !minimal {
                div { class: "flex justify-between text-sm text-gray-400",
                    span { "{format_time(state.current_time)}" }
                    span { "{format_time(state.duration)}" }
                }
            }
        }
    }
}
