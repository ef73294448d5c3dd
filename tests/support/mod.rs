#![allow(dead_code)]

use minicast::config::Config;
use minicast::playback::{Downloader, MediaBackend, ResourceFetcher, SaveTarget};
use minicast::screen::ScreenController;
use minicast::test_support::{
    FakeMediaBackend, MockGenerationClient, RecordingSaver, StaticFetcher,
};
use std::sync::Arc;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A screen wired to in-memory collaborators, with handles kept for
/// inspection
pub struct Harness {
    pub screen: ScreenController,
    pub client: Arc<MockGenerationClient>,
    pub backend: Arc<FakeMediaBackend>,
    pub saver: Arc<RecordingSaver>,
}

pub fn harness(
    client: MockGenerationClient,
    backend: FakeMediaBackend,
    fetcher: StaticFetcher,
) -> Harness {
    let client = Arc::new(client);
    let backend = Arc::new(backend);
    let saver = Arc::new(RecordingSaver::accepting());

    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(fetcher);
    let media: Arc<dyn MediaBackend> = backend.clone();
    let save_target: Arc<dyn SaveTarget> = saver.clone();

    let screen = ScreenController::new(
        Config::default(),
        client.clone(),
        media,
        Downloader::new(fetcher, save_target),
        tokio::runtime::Handle::current(),
    );

    Harness {
        screen,
        client,
        backend,
        saver,
    }
}

/// Yield to other tasks until `condition` holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
