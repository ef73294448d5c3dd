use crate::catalog::{PodcastLength, Voice, GUESTS, HOSTS};
use dioxus::prelude::*;

/// Host, guest and length pickers
#[component]
pub fn PodcastConfig(
    host: Signal<String>,
    guest: Signal<String>,
    length: Signal<PodcastLength>,
) -> Element {
    rsx! {
        div { class: "w-full max-w-3xl mx-auto mb-8 bg-[#192734] p-4 md:p-6 rounded-lg space-y-6",
            div { class: "grid grid-cols-1 md:grid-cols-2 gap-6",
                VoiceSelect { label: "Host", voices: HOSTS.as_slice(), selected: host }
                VoiceSelect { label: "Guest", voices: GUESTS.as_slice(), selected: guest }
            }
            div { class: "flex flex-col space-y-2",
                label { class: "text-white font-medium", "Length" }
                div { class: "flex flex-wrap gap-4",
                    for option in PodcastLength::ALL {
                        label { key: "{option.as_str()}", class: "flex items-center space-x-2 cursor-pointer",
                            input {
                                r#type: "radio",
                                name: "podcast-length",
                                value: option.as_str(),
                                checked: length() == option,
                                onchange: move |_| length.set(option),
                            }
                            span { class: "text-white", "{option.as_str()}" }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn VoiceSelect(label: &'static str, voices: &'static [Voice], selected: Signal<String>) -> Element {
    let current = voices.iter().find(|v| v.id == selected());

    rsx! {
        div { class: "flex flex-col space-y-2",
            label { class: "text-white font-medium", "{label}" }
            div { class: "flex items-center gap-3",
                if let Some(voice) = current {
                    img { class: "w-10 h-10 rounded-full object-cover", src: voice.image_url, alt: voice.name }
                }
                select {
                    class: "flex-1 p-2 bg-[#161925] text-white rounded-lg focus:outline-none focus:ring-2 focus:ring-[#069494]",
                    value: "{selected}",
                    onchange: move |evt| selected.set(evt.value()),
                    option { value: "", "Select {label.to_lowercase()}" }
                    for voice in voices {
                        option { key: "{voice.id}", value: voice.id, selected: voice.id == selected(), "{voice.name}" }
                    }
                }
            }
        }
    }
}
