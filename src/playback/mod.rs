pub mod controller;
mod cpal_output;
pub mod download;
pub mod media;
mod native;
mod symphonia_decoder;

pub use controller::{
    AttachError, DownloadState, PlaybackController, PlaybackEvent, PlaybackState, ViewMode,
    SKIP_SECONDS,
};
pub use cpal_output::AudioError;
pub use download::{
    DialogSaver, DirectorySaver, DownloadError, Downloader, HttpFetcher, ResourceFetcher,
    SaveTarget,
};
pub use media::{MediaBackend, MediaElement, MediaError, MediaSignal, SignalKind};
pub use native::NativeMediaBackend;
pub use symphonia_decoder::DecoderError;
