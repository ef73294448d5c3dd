pub mod app;
pub mod audio_player;
pub mod content_tabs;
pub mod error_toast;
pub mod generator;
pub mod navbar;
pub mod podcast_config;
pub mod progress_overlay;
pub mod screen_hooks;

pub use app::App;
pub use audio_player::{format_time, AudioPlayerPopup};
pub use content_tabs::ContentTabs;
pub use error_toast::ErrorToast;
pub use generator::Generator;
pub use navbar::Navbar;
pub use podcast_config::PodcastConfig;
pub use progress_overlay::ProgressOverlay;
pub use screen_hooks::{
    use_screen_controller, use_screen_state, ScreenStateProvider, SharedScreenState,
};
