//! Static choices offered on the generation screen: voices, content tabs
//! and podcast lengths.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// A selectable speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
    /// Synthesis voice used by the generation service
    pub voice: &'static str,
    pub locale: &'static str,
    pub gender: Gender,
    pub image_url: &'static str,
}

const fn voice(
    id: &'static str,
    name: &'static str,
    voice: &'static str,
    locale: &'static str,
    gender: Gender,
    photo: &'static str,
) -> Voice {
    Voice {
        id,
        name,
        voice,
        locale,
        gender,
        image_url: photo,
    }
}

pub static HOSTS: [Voice; 7] = [
    voice(
        "christopher-moore",
        "Christopher Moore (US)",
        "ChristopherNeural",
        "en-US",
        Gender::Male,
        "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "roger-bennett",
        "Roger Bennett (US)",
        "RogerNeural",
        "en-US",
        Gender::Male,
        "https://images.unsplash.com/photo-1506794778202-cad84cf45f1d?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "ryan-parker",
        "Ryan Parker (GB)",
        "RyanNeural",
        "en-GB",
        Gender::Male,
        "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "jenny-miller",
        "Jenny Miller (US)",
        "JennyNeural",
        "en-US",
        Gender::Female,
        "https://images.unsplash.com/photo-1494790108377-be9c29b29330?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "michelle-davis",
        "Michelle Davis (US)",
        "MichelleNeural",
        "en-US",
        Gender::Female,
        "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "libby-wilson",
        "Libby Wilson (GB)",
        "LibbyNeural",
        "en-GB",
        Gender::Female,
        "https://images.unsplash.com/photo-1544005313-94ddf0286df2?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "sonia-clarke",
        "Sonia Clarke (GB)",
        "SoniaNeural",
        "en-GB",
        Gender::Female,
        "https://images.unsplash.com/photo-1531123897727-8f129e1688ce?auto=format&fit=crop&q=80&w=100&h=100",
    ),
];

pub static GUESTS: [Voice; 5] = [
    voice(
        "aria-reynolds",
        "Aria Reynolds (US)",
        "AriaNeural",
        "en-US",
        Gender::Female,
        "https://images.unsplash.com/photo-1534528741775-53994a69daeb?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "eric-thompson",
        "Eric Thompson (US)",
        "EricNeural",
        "en-US",
        Gender::Male,
        "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "guy-harrison",
        "Guy Harrison (US)",
        "GuyNeural",
        "en-US",
        Gender::Male,
        "https://images.unsplash.com/photo-1519085360753-af0119f7cbe7?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "steffan-brooks",
        "Steffan Brooks (US)",
        "SteffanNeural",
        "en-US",
        Gender::Male,
        "https://images.unsplash.com/photo-1492562080023-ab3db95bfbce?auto=format&fit=crop&q=80&w=100&h=100",
    ),
    voice(
        "thomas-wright",
        "Thomas Wright (GB)",
        "ThomasNeural",
        "en-GB",
        Gender::Male,
        "https://images.unsplash.com/photo-1522075469751-3a6694fb2f61?auto=format&fit=crop&q=80&w=100&h=100",
    ),
];

pub const DEFAULT_HOST: &str = "christopher-moore";
pub const DEFAULT_GUEST: &str = "aria-reynolds";

pub fn find_host(id: &str) -> Option<&'static Voice> {
    HOSTS.iter().find(|v| v.id == id)
}

pub fn find_guest(id: &str) -> Option<&'static Voice> {
    GUESTS.iter().find(|v| v.id == id)
}

/// Ways of supplying content to generate from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentTab {
    Paste,
    Web,
    YouTube,
    #[default]
    Upload,
}

impl ContentTab {
    pub const ALL: [ContentTab; 4] = [
        ContentTab::Paste,
        ContentTab::Web,
        ContentTab::YouTube,
        ContentTab::Upload,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ContentTab::Paste => "Paste Content",
            ContentTab::Web => "Web URL",
            ContentTab::YouTube => "YouTube",
            ContentTab::Upload => "Upload File",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            ContentTab::Paste => "Paste your content here...",
            ContentTab::Web => "Enter website URL",
            ContentTab::YouTube => "Enter YouTube video URL",
            ContentTab::Upload => "Click to upload PDF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PodcastLength {
    #[default]
    Adaptive,
    Short,
    Medium,
    Long,
}

impl PodcastLength {
    pub const ALL: [PodcastLength; 4] = [
        PodcastLength::Adaptive,
        PodcastLength::Short,
        PodcastLength::Medium,
        PodcastLength::Long,
    ];

    /// Form value understood by the generation service
    pub fn as_str(&self) -> &'static str {
        match self {
            PodcastLength::Adaptive => "Adaptive",
            PodcastLength::Short => "Short",
            PodcastLength::Medium => "Medium",
            PodcastLength::Long => "Long",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == value)
    }
}
