use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROGRESS_DURATION: Duration = Duration::from_millis(45_000);

/// Application configuration
/// In debug builds: also loads a .env file before reading the environment
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the podcast generation service, without trailing slash
    pub api_url: String,
    /// Expected duration of a generation, drives the progress bar
    pub progress_duration: Duration,
    /// Where downloads are saved when no dialog is used
    pub download_dir: PathBuf,
    /// Ask for a destination with a native save dialog
    pub use_save_dialog: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            progress_duration: DEFAULT_PROGRESS_DURATION,
            download_dir: default_download_dir(),
            use_save_dialog: false,
        }
    }
}

impl Config {
    /// Load configuration based on build mode
    pub fn load() -> Self {
        #[cfg(debug_assertions)]
        {
            if dotenvy::dotenv().is_ok() {
                info!("Config: loaded .env file");
            }
        }

        Self::from_env()
    }

    /// Read configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or malformed values
    /// fall back to the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("MINICAST_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let progress_duration = match lookup("MINICAST_PROGRESS_DURATION_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => {
                    warn!(
                        "Config: invalid MINICAST_PROGRESS_DURATION_MS {:?} ({}), using default",
                        raw, e
                    );
                    defaults.progress_duration
                }
            },
            None => defaults.progress_duration,
        };

        let download_dir = lookup("MINICAST_DOWNLOAD_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.download_dir);

        let use_save_dialog = lookup("MINICAST_SAVE_DIALOG")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        info!("Config: generation service at {}", api_url);

        Self {
            api_url,
            progress_duration,
            download_dir,
            use_save_dialog,
        }
    }

    pub fn generate_endpoint(&self) -> String {
        format!("{}/generate-podcast", self.api_url)
    }

    /// Absolute URL for an audio path returned by the service
    pub fn resolve_audio_url(&self, audio_url: &str) -> String {
        resolve_against(&self.api_url, audio_url)
    }
}

/// Join `path` onto `base` unless it's already absolute
fn resolve_against(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}
