use crate::playback::cpal_output::{output_device_available, AudioOutput, OutputCommand, OutputEvent};
use crate::playback::download::{derive_file_name, ResourceFetcher};
use crate::playback::media::{
    ListenerId, ListenerSet, MediaBackend, MediaElement, MediaError, MediaListener, MediaSignal,
    SignalKind,
};
use crate::playback::symphonia_decoder::TrackDecoder;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{error, info, warn};

const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(50);

enum ElementCommand {
    Play,
    Pause,
    Seek(f64),
    Shutdown,
}

struct ElementStatus {
    current_time: f64,
    duration: f64,
    load_error: Option<String>,
    /// Set when the device exists but its stream could not be started
    output_error: Option<String>,
}

impl ElementStatus {
    fn new() -> Self {
        Self {
            current_time: 0.0,
            duration: f64::NAN,
            load_error: None,
            output_error: None,
        }
    }

    /// Whether a play request can be honoured
    fn check_playable(&self, has_output: bool) -> Result<(), MediaError> {
        if let Some(reason) = &self.load_error {
            return Err(MediaError::Load(reason.clone()));
        }
        if let Some(reason) = &self.output_error {
            return Err(MediaError::PlaybackRejected(reason.clone()));
        }
        if !has_output {
            return Err(MediaError::PlaybackRejected(
                "no audio output device available".to_string(),
            ));
        }
        Ok(())
    }
}

struct ElementShared {
    status: Mutex<ElementStatus>,
    listeners: ListenerSet,
}

impl ElementShared {
    fn status(&self) -> MutexGuard<'_, ElementStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Opens audio URLs for playback on the default output device
#[derive(Clone)]
pub struct NativeMediaBackend {
    fetcher: Arc<dyn ResourceFetcher>,
}

impl NativeMediaBackend {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { fetcher }
    }
}

impl MediaBackend for NativeMediaBackend {
    fn open(&self, source: &str) -> Result<Arc<dyn MediaElement>, MediaError> {
        Ok(Arc::new(NativeMediaElement::spawn(
            source,
            self.fetcher.clone(),
            output_device_available(),
        )?))
    }
}

/// A streamed audio resource played on a dedicated audio thread
///
/// The thread fetches and decodes the resource, owns the output stream
/// and delivers every signal. Dropping the element stops it.
pub struct NativeMediaElement {
    source: String,
    has_output: bool,
    shared: Arc<ElementShared>,
    commands: mpsc::Sender<ElementCommand>,
}

impl NativeMediaElement {
    fn spawn(
        source: &str,
        fetcher: Arc<dyn ResourceFetcher>,
        has_output: bool,
    ) -> Result<Self, MediaError> {
        let shared = Arc::new(ElementShared {
            status: Mutex::new(ElementStatus::new()),
            listeners: ListenerSet::new(),
        });
        let (commands, command_rx) = mpsc::channel();

        let thread_source = source.to_string();
        let thread_shared = shared.clone();
        std::thread::Builder::new()
            .name("minicast-audio".to_string())
            .spawn(move || {
                run_element(thread_source, fetcher, has_output, thread_shared, command_rx)
            })
            .map_err(|e| MediaError::Output(e.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            has_output,
            shared,
            commands,
        })
    }

    fn send(&self, command: ElementCommand) {
        let _ = self.commands.send(command);
    }
}

impl Drop for NativeMediaElement {
    fn drop(&mut self) {
        self.send(ElementCommand::Shutdown);
    }
}

impl MediaElement for NativeMediaElement {
    fn source(&self) -> &str {
        &self.source
    }

    fn play(&self) -> Result<(), MediaError> {
        self.shared.status().check_playable(self.has_output)?;
        self.send(ElementCommand::Play);
        Ok(())
    }

    fn pause(&self) {
        self.send(ElementCommand::Pause);
    }

    fn current_time(&self) -> f64 {
        self.shared.status().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        let seconds = {
            let mut status = self.shared.status();
            let upper = if status.duration.is_finite() {
                status.duration
            } else {
                f64::MAX
            };
            status.current_time = seconds.clamp(0.0, upper);
            status.current_time
        };
        self.send(ElementCommand::Seek(seconds));
    }

    fn duration(&self) -> f64 {
        self.shared.status().duration
    }

    fn add_listener(&self, kind: SignalKind, listener: MediaListener) -> ListenerId {
        self.shared.listeners.add(kind, listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.shared.listeners.remove(id);
    }
}

fn run_element(
    source: String,
    fetcher: Arc<dyn ResourceFetcher>,
    has_output: bool,
    shared: Arc<ElementShared>,
    commands: mpsc::Receiver<ElementCommand>,
) {
    let decoder = match load(&source, fetcher) {
        Ok(decoder) => decoder,
        Err(reason) => {
            error!("Failed to load {}: {}", source, reason);
            shared.status().load_error = Some(reason);
            // Nothing to play; wait to be dropped
            while let Ok(command) = commands.recv() {
                if matches!(command, ElementCommand::Shutdown) {
                    break;
                }
            }
            return;
        }
    };

    let duration = decoder
        .duration()
        .map(|d| d.as_secs_f64())
        .unwrap_or(f64::NAN);
    shared.status().duration = duration;
    shared.listeners.dispatch(MediaSignal::MetadataReady {
        duration,
        current_time: 0.0,
    });

    let (event_tx, events) = mpsc::channel();
    // The stream must live on this thread
    let output = if has_output {
        match AudioOutput::new().and_then(|output| output.start(decoder, event_tx)) {
            Ok(output) => Some(output),
            Err(e) => {
                error!("Audio output unavailable: {}", e);
                shared.status().output_error = Some(e.to_string());
                None
            }
        }
    } else {
        None
    };
    let output_commands = output.as_ref().map(|(_stream, commands)| commands.clone());
    let send_output = |command: OutputCommand| {
        if let Some(tx) = &output_commands {
            let _ = tx.send(command);
        }
    };

    info!("Media element ready for {}", source);

    loop {
        match commands.recv_timeout(COMMAND_POLL_INTERVAL) {
            Ok(ElementCommand::Play) => {
                if begin_playback(&shared, duration, output_commands.is_some()) {
                    send_output(OutputCommand::Play);
                }
            }
            Ok(ElementCommand::Pause) => {
                send_output(OutputCommand::Pause);
                shared
                    .listeners
                    .dispatch(MediaSignal::PlayStateChanged { playing: false });
            }
            Ok(ElementCommand::Seek(seconds)) => {
                if output_commands.is_some() {
                    send_output(OutputCommand::Seek(Duration::from_secs_f64(seconds)));
                } else {
                    shared.listeners.dispatch(MediaSignal::TimeAdvanced {
                        current_time: seconds,
                    });
                }
            }
            Ok(ElementCommand::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        while let Ok(event) = events.try_recv() {
            handle_output_event(&shared, duration, event);
        }
    }

    drop(output);
    info!("Media element for {} stopped", source);
}

/// Apply a play request; returns whether the stream should start
///
/// Without a running stream the request is answered with a paused
/// signal so listeners never see a silent "playing" state.
fn begin_playback(shared: &ElementShared, duration: f64, stream_ready: bool) -> bool {
    if !stream_ready {
        warn!("Play requested without a running audio stream");
        shared
            .listeners
            .dispatch(MediaSignal::PlayStateChanged { playing: false });
        return false;
    }

    let rewind = {
        let mut status = shared.status();
        let at_end = duration.is_finite() && status.current_time >= duration;
        if at_end {
            status.current_time = 0.0;
        }
        at_end
    };
    if rewind {
        shared
            .listeners
            .dispatch(MediaSignal::TimeAdvanced { current_time: 0.0 });
    }
    shared
        .listeners
        .dispatch(MediaSignal::PlayStateChanged { playing: true });
    true
}

fn handle_output_event(shared: &ElementShared, duration: f64, event: OutputEvent) {
    match event {
        OutputEvent::Position(position) | OutputEvent::Seeked(position) => {
            let current_time = position.as_secs_f64();
            let current_time = if duration.is_finite() {
                current_time.min(duration)
            } else {
                current_time
            };
            shared.status().current_time = current_time;
            shared
                .listeners
                .dispatch(MediaSignal::TimeAdvanced { current_time });
        }
        OutputEvent::Finished => {
            let end = {
                let mut status = shared.status();
                if duration.is_finite() {
                    status.current_time = duration;
                }
                status.current_time
            };
            shared
                .listeners
                .dispatch(MediaSignal::TimeAdvanced { current_time: end });
            shared.listeners.dispatch(MediaSignal::Ended);
        }
        OutputEvent::Failed(reason) => {
            warn!("Playback stopped: {}", reason);
            shared
                .listeners
                .dispatch(MediaSignal::PlayStateChanged { playing: false });
        }
    }
}

fn load(source: &str, fetcher: Arc<dyn ResourceFetcher>) -> Result<TrackDecoder, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| e.to_string())?;
    let bytes = runtime
        .block_on(fetcher.fetch(source))
        .map_err(|e| e.to_string())?;
    info!("Fetched {} bytes from {}", bytes.len(), source);

    let file_name = derive_file_name(source);
    let extension = Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    TrackDecoder::new(bytes, extension.as_deref()).map_err(|e| e.to_string())
}
