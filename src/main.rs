use minicast::config::Config;
use minicast::generation::HttpGenerationClient;
use minicast::playback::{
    DialogSaver, DirectorySaver, Downloader, HttpFetcher, NativeMediaBackend, ResourceFetcher,
    SaveTarget,
};
use minicast::screen::ScreenController;
use minicast::ui::{make_config, App};
use minicast::AppContext;
use std::sync::Arc;
use tracing::info;

fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let config = Config::load();

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let runtime_handle = runtime.handle().clone();

    let http = reqwest::Client::new();
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(HttpFetcher::new(http.clone()));
    let saver: Arc<dyn SaveTarget> = if config.use_save_dialog {
        Arc::new(DialogSaver::new(config.download_dir.clone()))
    } else {
        Arc::new(DirectorySaver::new(config.download_dir.clone()))
    };

    let screen = ScreenController::new(
        config.clone(),
        Arc::new(HttpGenerationClient::new(http, &config)),
        Arc::new(NativeMediaBackend::new(fetcher.clone())),
        Downloader::new(fetcher, saver),
        runtime_handle.clone(),
    );

    let context = AppContext {
        config,
        screen,
        runtime_handle,
    };

    info!("Starting minicast against {}", context.config.api_url);

    dioxus::LaunchBuilder::desktop()
        .with_cfg(make_config())
        .with_context(context)
        .launch(App);

    drop(runtime);
}
