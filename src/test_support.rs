// Test support utilities for both unit and integration tests

use crate::generation::{GenerationClient, GenerationError, GenerationRequest};
use crate::playback::download::{
    DirectorySaver, DownloadError, ResourceFetcher, SaveTarget, TempObject,
};
use crate::playback::media::{
    ListenerId, ListenerSet, MediaBackend, MediaElement, MediaError, MediaListener, MediaSignal,
    SignalKind,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

struct FakeMediaState {
    current_time: f64,
    duration: f64,
    reject_play: bool,
    play_calls: usize,
    pause_calls: usize,
    seeks: Vec<f64>,
}

/// In-memory media element that behaves like a browser audio element
///
/// Tests drive it with `load_metadata`, `advance_to`, `finish` and `stall`.
/// Every transition is reported through the registered listeners.
pub struct FakeMediaElement {
    source: String,
    listeners: ListenerSet,
    state: Mutex<FakeMediaState>,
}

impl FakeMediaElement {
    pub fn new(source: &str) -> Self {
        Self::with_duration(source, f64::NAN)
    }

    /// Element whose metadata is already known when it's opened
    pub fn with_duration(source: &str, duration: f64) -> Self {
        Self {
            source: source.to_string(),
            listeners: ListenerSet::new(),
            state: Mutex::new(FakeMediaState {
                current_time: 0.0,
                duration,
                reject_play: false,
                play_calls: 0,
                pause_calls: 0,
                seeks: Vec::new(),
            }),
        }
    }

    pub fn load_metadata(&self, duration: f64) {
        let current_time = {
            let mut state = self.state.lock().unwrap();
            state.duration = duration;
            state.current_time
        };
        self.listeners.dispatch(MediaSignal::MetadataReady {
            duration,
            current_time,
        });
    }

    pub fn advance_to(&self, seconds: f64) {
        self.state.lock().unwrap().current_time = seconds;
        self.listeners
            .dispatch(MediaSignal::TimeAdvanced { current_time: seconds });
    }

    /// Play through to the end
    pub fn finish(&self) {
        let end = {
            let mut state = self.state.lock().unwrap();
            state.current_time = state.duration;
            state.duration
        };
        self.listeners
            .dispatch(MediaSignal::TimeAdvanced { current_time: end });
        self.listeners.dispatch(MediaSignal::Ended);
    }

    /// Pause from the platform side, e.g. a buffering stall
    pub fn stall(&self) {
        self.listeners
            .dispatch(MediaSignal::PlayStateChanged { playing: false });
    }

    /// Deliver a raw signal, whether or not it matches the element's state
    pub fn emit(&self, signal: MediaSignal) {
        self.listeners.dispatch(signal);
    }

    pub fn set_reject_play(&self, reject: bool) {
        self.state.lock().unwrap().reject_play = reject;
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn play_calls(&self) -> usize {
        self.state.lock().unwrap().play_calls
    }

    pub fn pause_calls(&self) -> usize {
        self.state.lock().unwrap().pause_calls
    }

    /// Positions requested through `set_current_time`, in order
    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().unwrap().seeks.clone()
    }
}

impl MediaElement for FakeMediaElement {
    fn source(&self) -> &str {
        &self.source
    }

    fn play(&self) -> Result<(), MediaError> {
        {
            let mut state = self.state.lock().unwrap();
            state.play_calls += 1;
            if state.reject_play {
                return Err(MediaError::PlaybackRejected("autoplay blocked".to_string()));
            }
        }
        self.listeners
            .dispatch(MediaSignal::PlayStateChanged { playing: true });
        Ok(())
    }

    fn pause(&self) {
        self.state.lock().unwrap().pause_calls += 1;
        self.listeners
            .dispatch(MediaSignal::PlayStateChanged { playing: false });
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        let current_time = {
            let mut state = self.state.lock().unwrap();
            state.seeks.push(seconds);
            let upper = if state.duration.is_finite() {
                state.duration
            } else {
                f64::MAX
            };
            state.current_time = seconds.clamp(0.0, upper);
            state.current_time
        };
        self.listeners
            .dispatch(MediaSignal::TimeAdvanced { current_time });
    }

    fn duration(&self) -> f64 {
        self.state.lock().unwrap().duration
    }

    fn add_listener(&self, kind: SignalKind, listener: MediaListener) -> ListenerId {
        self.listeners.add(kind, listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

/// Backend handing out `FakeMediaElement`s and remembering each one
pub struct FakeMediaBackend {
    duration: f64,
    failure: Mutex<Option<MediaError>>,
    opened: Mutex<Vec<Arc<FakeMediaElement>>>,
}

impl Default for FakeMediaBackend {
    fn default() -> Self {
        Self {
            duration: f64::NAN,
            failure: Mutex::new(None),
            opened: Mutex::new(Vec::new()),
        }
    }
}

impl FakeMediaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn failing(error: MediaError) -> Self {
        Self {
            failure: Mutex::new(Some(error)),
            ..Self::default()
        }
    }

    /// Make every later `open` fail with `error`
    pub fn fail_opens(&self, error: MediaError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn opened(&self) -> Vec<Arc<FakeMediaElement>> {
        self.opened.lock().unwrap().clone()
    }

    pub fn last_opened(&self) -> Option<Arc<FakeMediaElement>> {
        self.opened.lock().unwrap().last().cloned()
    }
}

impl MediaBackend for FakeMediaBackend {
    fn open(&self, source: &str) -> Result<Arc<dyn MediaElement>, MediaError> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        let element = Arc::new(FakeMediaElement::with_duration(source, self.duration));
        self.opened.lock().unwrap().push(element.clone());
        Ok(element)
    }
}

enum Canned {
    Bytes(Vec<u8>),
    Status(u16),
}

/// Fetcher with a canned answer
///
/// A gated fetcher holds every fetch until the gate is notified.
pub struct StaticFetcher {
    canned: Canned,
    gate: Option<Arc<Notify>>,
    calls: Arc<AtomicUsize>,
    in_flight: AtomicUsize,
    max_in_flight: Arc<AtomicUsize>,
}

impl StaticFetcher {
    fn with(canned: Canned) -> Self {
        Self {
            canned,
            gate: None,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: AtomicUsize::new(0),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn ok(bytes: Vec<u8>) -> Self {
        Self::with(Canned::Bytes(bytes))
    }

    pub fn status(status: u16) -> Self {
        Self::with(Canned::Status(status))
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn gate(&self) -> Option<Arc<Notify>> {
        self.gate.clone()
    }

    pub fn calls_handle(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn max_in_flight_handle(&self) -> Arc<AtomicUsize> {
        self.max_in_flight.clone()
    }
}

#[async_trait::async_trait]
impl ResourceFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match &self.canned {
            Canned::Bytes(bytes) => Ok(bytes.clone()),
            Canned::Status(status) => Err(DownloadError::Status(*status)),
        }
    }
}

/// Save target that records the temporary objects it was handed
pub struct RecordingSaver {
    inner: Option<DirectorySaver>,
    // Keeps the scratch directory of `accepting()` alive
    _scratch: Option<TempDir>,
    temp_paths: Mutex<Vec<PathBuf>>,
    saved: Mutex<Vec<PathBuf>>,
}

impl RecordingSaver {
    pub fn new(inner: DirectorySaver) -> Self {
        Self {
            inner: Some(inner),
            _scratch: None,
            temp_paths: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Saves into a scratch directory removed with the saver
    pub fn accepting() -> Self {
        let scratch = TempDir::new().expect("create scratch dir");
        Self {
            inner: Some(DirectorySaver::new(scratch.path())),
            _scratch: Some(scratch),
            temp_paths: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Behaves like a cancelled save dialog
    pub fn failing() -> Self {
        Self {
            inner: None,
            _scratch: None,
            temp_paths: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn temp_paths(&self) -> Vec<PathBuf> {
        self.temp_paths.lock().unwrap().clone()
    }

    pub fn saved(&self) -> Vec<PathBuf> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SaveTarget for RecordingSaver {
    async fn save(&self, temp: &TempObject, file_name: &str) -> Result<PathBuf, DownloadError> {
        self.temp_paths
            .lock()
            .unwrap()
            .push(temp.path().to_path_buf());

        let Some(inner) = &self.inner else {
            return Err(DownloadError::Cancelled);
        };
        let path = inner.save(temp, file_name).await?;
        self.saved.lock().unwrap().push(path.clone());
        Ok(path)
    }
}

/// Generation client answering from a queue of canned outcomes
#[derive(Default)]
pub struct MockGenerationClient {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits for the returned gate to be notified
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let client = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (client, gate)
    }

    pub fn push_ok(&self, audio_url: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(audio_url.to_string()));
    }

    pub fn push_err(&self, error: GenerationError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::MissingAudioUrl))
    }
}
