use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use thiserror::Error;

/// The four native signals a media element reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    MetadataReady,
    TimeAdvanced,
    Ended,
    PlayStateChanged,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [
        SignalKind::MetadataReady,
        SignalKind::TimeAdvanced,
        SignalKind::Ended,
        SignalKind::PlayStateChanged,
    ];
}

/// A signal as delivered by the platform, carrying the values it reported
///
/// Times are seconds and may be non-finite when the platform doesn't
/// know them yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaSignal {
    MetadataReady { duration: f64, current_time: f64 },
    TimeAdvanced { current_time: f64 },
    Ended,
    PlayStateChanged { playing: bool },
}

impl MediaSignal {
    pub fn kind(&self) -> SignalKind {
        match self {
            MediaSignal::MetadataReady { .. } => SignalKind::MetadataReady,
            MediaSignal::TimeAdvanced { .. } => SignalKind::TimeAdvanced,
            MediaSignal::Ended => SignalKind::Ended,
            MediaSignal::PlayStateChanged { .. } => SignalKind::PlayStateChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type MediaListener = Arc<dyn Fn(MediaSignal) + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),
    #[error("Failed to load media: {0}")]
    Load(String),
    #[error("Audio output error: {0}")]
    Output(String),
}

/// A single streaming media resource
pub trait MediaElement: Send + Sync {
    fn source(&self) -> &str;

    /// Request playback. The platform may refuse.
    fn play(&self) -> Result<(), MediaError>;

    fn pause(&self);

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Move the position; the element reports the result through a
    /// time-advanced signal
    fn set_current_time(&self, seconds: f64);

    /// Duration in seconds, NaN while unknown
    fn duration(&self) -> f64;

    fn add_listener(&self, kind: SignalKind, listener: MediaListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// Opens media elements for resource URLs
pub trait MediaBackend: Send + Sync {
    fn open(&self, source: &str) -> Result<Arc<dyn MediaElement>, MediaError>;
}

/// Listener registry shared by media element implementations
#[derive(Clone, Default)]
pub struct ListenerSet {
    listeners: Arc<Mutex<HashMap<ListenerId, (SignalKind, MediaListener)>>>,
    next_id: Arc<AtomicU64>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: SignalKind, listener: MediaListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, (kind, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a signal to every listener registered for its kind
    pub fn dispatch(&self, signal: MediaSignal) {
        // Listeners may call back into the element, so don't hold the lock
        let targets: Vec<MediaListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|(kind, _)| *kind == signal.kind())
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in targets {
            listener(signal);
        }
    }
}
