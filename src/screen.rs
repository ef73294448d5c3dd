use crate::config::Config;
use crate::generation::{GenerationClient, GenerationRequest, ValidationError};
use crate::playback::{AttachError, Downloader, MediaBackend, PlaybackController};
use crate::progress::ProgressSimulator;
use crate::subscription::Subscriptions;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{error, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScreenError {
    #[error("A podcast is already being generated")]
    Busy,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("{0}")]
    Generation(String),
    #[error(transparent)]
    Attach(#[from] AttachError),
}

/// What the generation screen shows outside the player and progress bar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenState {
    pub is_generating: bool,
    pub error: Option<String>,
    pub audio_url: Option<String>,
    /// Changes whenever a player is opened or closed
    pub player_epoch: u64,
}

struct ScreenInner {
    config: Config,
    client: Arc<dyn GenerationClient>,
    backend: Arc<dyn MediaBackend>,
    downloader: Downloader,
    progress: ProgressSimulator,
    state: Mutex<ScreenState>,
    player: Mutex<Option<PlaybackController>>,
    updates: Subscriptions<ScreenState>,
}

/// Sequences a generation: validation, progress, the remote call and
/// handing the result to a fresh player
#[derive(Clone)]
pub struct ScreenController {
    inner: Arc<ScreenInner>,
}

/// Settles the screen when a generation future is dropped mid-flight
struct AbandonGuard<'a> {
    screen: &'a ScreenController,
    armed: bool,
}

impl AbandonGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Generation abandoned before the service answered");
        self.screen.inner.progress.reset();
        self.screen.lock_state().is_generating = false;
        self.screen.publish();
    }
}

impl ScreenController {
    pub fn new(
        config: Config,
        client: Arc<dyn GenerationClient>,
        backend: Arc<dyn MediaBackend>,
        downloader: Downloader,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        Self {
            inner: Arc::new(ScreenInner {
                config,
                client,
                backend,
                downloader,
                progress: ProgressSimulator::new(runtime_handle),
                state: Mutex::new(ScreenState::default()),
                player: Mutex::new(None),
                updates: Subscriptions::new(),
            }),
        }
    }

    /// Run one generation and return the playable URL
    pub async fn generate(&self, request: GenerationRequest) -> Result<String, ScreenError> {
        {
            let mut state = self.lock_state();
            if state.is_generating {
                warn!("Generation already in progress, ignoring request");
                return Err(ScreenError::Busy);
            }
            if let Err(e) = request.validate() {
                state.error = Some(e.to_string());
                drop(state);
                self.publish();
                return Err(e.into());
            }
            state.is_generating = true;
            state.error = None;
        }
        let guard = AbandonGuard { screen: self, armed: true };
        self.close_player();
        self.inner.progress.start(self.inner.config.progress_duration);

        let result = self.inner.client.generate(&request).await;
        guard.disarm();

        let outcome = result
            .map_err(|e| {
                error!("Generation failed: {}", e);
                ScreenError::Generation(e.user_message())
            })
            .and_then(|url| self.open_player(&url).map(|()| url));

        match &outcome {
            Ok(url) => {
                info!("Podcast generated: {}", url);
                self.inner.progress.complete();
                let mut state = self.lock_state();
                state.audio_url = Some(url.clone());
                state.is_generating = false;
            }
            Err(e) => {
                self.inner.progress.reset();
                let mut state = self.lock_state();
                state.error = Some(e.to_string());
                state.is_generating = false;
            }
        }
        self.publish();
        outcome
    }

    fn open_player(&self, url: &str) -> Result<(), ScreenError> {
        let player =
            PlaybackController::new(self.inner.backend.clone(), self.inner.downloader.clone());
        player.attach(url)?;
        *self.player_slot() = Some(player);
        self.lock_state().player_epoch += 1;
        Ok(())
    }

    /// Close the player and release its URL
    pub fn close_player(&self) {
        let player = self.player_slot().take();
        let had_url = {
            let mut state = self.lock_state();
            if player.is_some() {
                state.player_epoch += 1;
            }
            state.audio_url.take().is_some()
        };
        if let Some(player) = &player {
            player.close();
        }
        if player.is_some() || had_url {
            self.publish();
        }
    }

    pub fn dismiss_error(&self) {
        if self.lock_state().error.take().is_some() {
            self.publish();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ScreenState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ScreenState {
        self.lock_state().clone()
    }

    pub fn is_generating(&self) -> bool {
        self.lock_state().is_generating
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn audio_url(&self) -> Option<String> {
        self.lock_state().audio_url.clone()
    }

    pub fn player(&self) -> Option<PlaybackController> {
        self.player_slot().clone()
    }

    pub fn progress(&self) -> ProgressSimulator {
        self.inner.progress.clone()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<ScreenState> {
        self.inner.updates.subscribe()
    }

    fn publish(&self) {
        self.inner.updates.publish(self.snapshot());
    }

    fn player_slot(&self) -> MutexGuard<'_, Option<PlaybackController>> {
        self.inner
            .player
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
