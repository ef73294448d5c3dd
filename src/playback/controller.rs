use crate::playback::download::{DownloadError, Downloader};
use crate::playback::media::{
    ListenerId, MediaBackend, MediaElement, MediaError, MediaSignal, SignalKind,
};
use crate::subscription::Subscriptions;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use thiserror::Error;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, info, warn};

/// Seconds moved by the skip-back/skip-forward buttons
pub const SKIP_SECONDS: f64 = 10.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttachError {
    #[error("Cannot attach an empty resource reference")]
    EmptySource,
    #[error("Player is bound to {bound}, cannot attach {requested}")]
    SourceMismatch { bound: String, requested: String },
    #[error("Failed to open media: {0}")]
    Open(#[from] MediaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Closed,
    Open,
    Minimized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Idle,
    InFlight,
    Done,
    Failed,
}

/// UI-facing mirror of the attached media element
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub source: Option<String>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub view_mode: ViewMode,
    pub download_state: DownloadState,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            source: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            view_mode: ViewMode::Closed,
            download_state: DownloadState::Idle,
        }
    }
}

impl PlaybackState {
    /// Position as a fraction of the duration, 0 while unknown
    pub fn fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Updates published to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    StateChanged { state: PlaybackState },
    /// Transient, user-visible message that doesn't affect playback
    Notice { message: String },
}

struct Live {
    state: PlaybackState,
    /// Bumped on every attach/detach; listeners from an older binding
    /// are ignored.
    generation: u64,
}

struct Binding {
    element: Arc<dyn MediaElement>,
    listeners: Vec<ListenerId>,
}

struct ControllerInner {
    source: OnceLock<String>,
    live: Mutex<Live>,
    binding: Mutex<Option<Binding>>,
    backend: Arc<dyn MediaBackend>,
    downloader: Downloader,
    events: Subscriptions<PlaybackEvent>,
}

/// Keeps UI playback state in step with one streaming media resource
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<ControllerInner>,
}

impl PlaybackController {
    pub fn new(backend: Arc<dyn MediaBackend>, downloader: Downloader) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                source: OnceLock::new(),
                live: Mutex::new(Live {
                    state: PlaybackState::default(),
                    generation: 0,
                }),
                binding: Mutex::new(None),
                backend,
                downloader,
                events: Subscriptions::new(),
            }),
        }
    }

    /// Bind to the resource at `source_ref` and start mirroring its signals
    ///
    /// The first successful attach fixes the controller's source;
    /// re-attaching replaces the previous listeners once the new element
    /// has opened.
    pub fn attach(&self, source_ref: &str) -> Result<(), AttachError> {
        let source_ref = source_ref.trim();
        if source_ref.is_empty() {
            return Err(AttachError::EmptySource);
        }
        if let Some(bound) = self.inner.source.get() {
            if bound != source_ref {
                return Err(AttachError::SourceMismatch {
                    bound: bound.clone(),
                    requested: source_ref.to_string(),
                });
            }
        }

        // A failed open leaves the current binding in place
        let element = self.inner.backend.open(source_ref)?;
        self.detach();

        let source = self.inner.source.get_or_init(|| source_ref.to_string()).clone();

        let generation = {
            let mut live = self.live();
            live.generation += 1;
            live.state.source = Some(source.clone());
            live.state.view_mode = ViewMode::Open;
            live.state.is_playing = false;
            live.generation
        };

        let listeners = SignalKind::ALL
            .iter()
            .map(|kind| {
                let weak = Arc::downgrade(&self.inner);
                element.add_listener(
                    *kind,
                    Arc::new(move |signal| on_signal(&weak, generation, signal)),
                )
            })
            .collect();

        // Metadata may already be known if the element loaded quickly
        let duration = element.duration();
        if duration.is_finite() && duration > 0.0 {
            on_signal(
                &Arc::downgrade(&self.inner),
                generation,
                MediaSignal::MetadataReady {
                    duration,
                    current_time: element.current_time(),
                },
            );
        }

        *self.binding() = Some(Binding { element, listeners });
        info!("Player attached to {}", source);
        self.publish_state();
        Ok(())
    }

    /// Unregister every listener and drop the resource. Safe to repeat.
    pub fn detach(&self) {
        let Some(binding) = self.binding().take() else {
            return;
        };

        {
            let mut live = self.live();
            live.generation += 1;
            live.state.is_playing = false;
        }
        for id in binding.listeners {
            binding.element.remove_listener(id);
        }

        info!("Player detached from {}", binding.element.source());
        self.publish_state();
    }

    /// Detach and hide the player
    pub fn close(&self) {
        self.detach();
        let changed = {
            let mut live = self.live();
            let changed = live.state.view_mode != ViewMode::Closed;
            live.state.view_mode = ViewMode::Closed;
            changed
        };
        if changed {
            self.publish_state();
        }
    }

    /// Ask the element to play or pause; `is_playing` follows the element
    pub fn toggle_play_pause(&self) {
        let Some(element) = self.element() else {
            return;
        };

        if self.live().state.is_playing {
            element.pause();
        } else if let Err(e) = element.play() {
            warn!("Play request rejected: {}", e);
            self.notify(format!("Playback could not start: {}", e));
        }
    }

    /// Move to `fraction` of the known duration; out-of-range values clamp
    pub fn seek_to_fraction(&self, fraction: f64) {
        let Some(element) = self.element() else {
            return;
        };
        let duration = self.live().state.duration;
        if duration <= 0.0 {
            return;
        }

        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        element.set_current_time(fraction * duration);
    }

    /// Move by `delta_seconds`, staying within `[0, duration]`
    pub fn skip(&self, delta_seconds: f64) {
        let Some(element) = self.element() else {
            return;
        };
        let duration = self.live().state.duration;
        if duration <= 0.0 || !delta_seconds.is_finite() {
            return;
        }

        let current = sanitize(element.current_time());
        element.set_current_time((current + delta_seconds).clamp(0.0, duration));
    }

    /// Apply a view transition, returning whether it was allowed
    ///
    /// Minimizing and restoring never touch the element. Closing detaches
    /// it; reopening a closed player re-attaches the same source.
    pub fn set_view_mode(&self, mode: ViewMode) -> bool {
        let current = self.live().state.view_mode;
        match (current, mode) {
            (_, ViewMode::Closed) => {
                self.close();
                true
            }
            (ViewMode::Closed, ViewMode::Open) => match self.inner.source.get().cloned() {
                Some(source) => match self.attach(&source) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to reopen player: {}", e);
                        false
                    }
                },
                None => false,
            },
            (ViewMode::Open, ViewMode::Minimized) | (ViewMode::Minimized, ViewMode::Open) => {
                self.live().state.view_mode = mode;
                self.publish_state();
                true
            }
            _ => {
                debug!("Ignoring view transition {:?} -> {:?}", current, mode);
                false
            }
        }
    }

    /// Save the resource locally. Concurrent calls while one is in flight
    /// are ignored; failures become a notice. A cancelled save returns to
    /// idle quietly.
    pub async fn download(&self) {
        let Some(source) = self.inner.source.get().cloned() else {
            return;
        };

        {
            let mut live = self.live();
            if live.state.download_state == DownloadState::InFlight {
                debug!("Download already in flight, ignoring");
                return;
            }
            live.state.download_state = DownloadState::InFlight;
        }
        self.publish_state();

        let outcome = self.inner.downloader.download(&source).await;

        let failure = {
            let mut live = self.live();
            match outcome {
                Ok(path) => {
                    info!("Saved podcast to {}", path.display());
                    live.state.download_state = DownloadState::Done;
                    None
                }
                Err(DownloadError::Cancelled) => {
                    info!("Save of {} cancelled", source);
                    live.state.download_state = DownloadState::Idle;
                    None
                }
                Err(e) => {
                    warn!("Download of {} failed: {}", source, e);
                    live.state.download_state = DownloadState::Failed;
                    Some(e)
                }
            }
        };
        self.publish_state();

        if let Some(e) = failure {
            self.notify(format!("Download failed: {}", e));
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.live().state.clone()
    }

    pub fn source(&self) -> Option<&str> {
        self.inner.source.get().map(String::as_str)
    }

    pub fn is_attached(&self) -> bool {
        self.binding().is_some()
    }

    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<PlaybackEvent> {
        self.inner.events.subscribe()
    }

    fn element(&self) -> Option<Arc<dyn MediaElement>> {
        self.binding().as_ref().map(|b| b.element.clone())
    }

    fn notify(&self, message: String) {
        self.inner.events.publish(PlaybackEvent::Notice { message });
    }

    fn publish_state(&self) {
        let state = self.state();
        self.inner.events.publish(PlaybackEvent::StateChanged { state });
    }

    fn live(&self) -> MutexGuard<'_, Live> {
        self.inner.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn binding(&self) -> MutexGuard<'_, Option<Binding>> {
        self.inner
            .binding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn sanitize(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

fn on_signal(weak: &Weak<ControllerInner>, generation: u64, signal: MediaSignal) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let state = {
        let mut live = inner.live.lock().unwrap_or_else(PoisonError::into_inner);
        if live.generation != generation {
            return;
        }

        let state = &mut live.state;
        match signal {
            MediaSignal::MetadataReady {
                duration,
                current_time,
            } => {
                state.duration = sanitize(duration);
                state.current_time = sanitize(current_time);
            }
            MediaSignal::TimeAdvanced { current_time } => {
                state.current_time = sanitize(current_time);
            }
            MediaSignal::Ended => {
                state.is_playing = false;
            }
            MediaSignal::PlayStateChanged { playing } => {
                state.is_playing = playing;
            }
        }
        if state.duration > 0.0 {
            state.current_time = state.current_time.min(state.duration);
        }
        state.clone()
    };

    inner.events.publish(PlaybackEvent::StateChanged { state });
}
