use crate::playback::symphonia_decoder::{DecodedChunk, DecoderError, TrackDecoder};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

const POSITION_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

/// Commands handled inside the audio callback
#[derive(Debug, Clone, Copy)]
pub enum OutputCommand {
    Play,
    Pause,
    Seek(Duration),
}

/// Reports sent from the audio callback
#[derive(Debug, Clone)]
pub enum OutputEvent {
    Position(Duration),
    Seeked(Duration),
    Finished,
    Failed(String),
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio output device available")]
    DeviceNotFound,
    #[error("Stream configuration error: {0}")]
    StreamConfig(String),
    #[error("Failed to build output stream: {0}")]
    StreamBuild(String),
    #[error("Failed to start output stream: {0}")]
    StreamPlay(String),
    #[error("Decoder error: {0}")]
    Decoder(#[from] DecoderError),
}

/// Whether the default host has an output device at all
pub fn output_device_available() -> bool {
    cpal::default_host().default_output_device().is_some()
}

/// Audio output on the default device
pub struct AudioOutput {
    device: Device,
    stream_config: StreamConfig,
}

impl AudioOutput {
    pub fn new() -> Result<Self, AudioError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;

        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::StreamConfig(e.to_string()))?;
        let stream_config = StreamConfig::from(default_config);

        info!(
            "Audio device: {} channels, {} Hz",
            stream_config.channels, stream_config.sample_rate.0
        );

        Ok(Self {
            device,
            stream_config,
        })
    }

    /// Start a stream that pulls from `decoder`
    ///
    /// The stream runs continuously and plays silence while paused, so
    /// commands are serviced even when nothing is audible. The returned
    /// stream must stay on the thread that created it.
    pub fn start(
        &self,
        mut decoder: TrackDecoder,
        events: mpsc::Sender<OutputEvent>,
    ) -> Result<(Stream, mpsc::Sender<OutputCommand>), AudioError> {
        let (command_tx, command_rx) = mpsc::channel();
        let converter = FormatConverter {
            from_rate: decoder.sample_rate(),
            to_rate: self.stream_config.sample_rate.0,
            to_channels: self.stream_config.channels as usize,
        };

        let mut pending: Vec<f32> = Vec::new();
        let mut cursor = 0usize;
        let mut playing = false;
        let mut finished = false;
        let mut last_report = Instant::now();

        let stream = self
            .device
            .build_output_stream(
                &self.stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    while let Ok(command) = command_rx.try_recv() {
                        match command {
                            OutputCommand::Play => {
                                if finished {
                                    if let Err(e) = decoder.seek(Duration::ZERO) {
                                        warn!("Rewind failed: {}", e);
                                    }
                                    pending.clear();
                                    cursor = 0;
                                    finished = false;
                                }
                                playing = true;
                            }
                            OutputCommand::Pause => playing = false,
                            OutputCommand::Seek(position) => match decoder.seek(position) {
                                Ok(()) => {
                                    pending.clear();
                                    cursor = 0;
                                    finished = false;
                                    let _ = events.send(OutputEvent::Seeked(decoder.position()));
                                }
                                Err(e) => warn!("Seek failed: {}", e),
                            },
                        }
                    }

                    if !playing {
                        data.fill(0.0);
                        return;
                    }

                    let mut written = 0;
                    while written < data.len() {
                        if cursor >= pending.len() {
                            match decoder.decode_next() {
                                Ok(Some(chunk)) => {
                                    pending = converter.convert(chunk);
                                    cursor = 0;
                                    continue;
                                }
                                Ok(None) => {
                                    playing = false;
                                    finished = true;
                                    data[written..].fill(0.0);
                                    let _ = events.send(OutputEvent::Finished);
                                    return;
                                }
                                Err(e) => {
                                    error!("Decoder error: {}", e);
                                    playing = false;
                                    data[written..].fill(0.0);
                                    let _ = events.send(OutputEvent::Failed(e.to_string()));
                                    return;
                                }
                            }
                        }

                        let n = (data.len() - written).min(pending.len() - cursor);
                        data[written..written + n].copy_from_slice(&pending[cursor..cursor + n]);
                        written += n;
                        cursor += n;
                    }

                    if last_report.elapsed() >= POSITION_UPDATE_INTERVAL {
                        let _ = events.send(OutputEvent::Position(decoder.position()));
                        last_report = Instant::now();
                    }
                },
                |err| {
                    error!("Audio stream error: {:?}", err);
                },
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;

        Ok((stream, command_tx))
    }
}

/// Converts decoded chunks to the device's rate and channel layout
#[derive(Debug, Clone, Copy)]
struct FormatConverter {
    from_rate: u32,
    to_rate: u32,
    to_channels: usize,
}

impl FormatConverter {
    fn convert(&self, chunk: DecodedChunk) -> Vec<f32> {
        let DecodedChunk { samples, channels } = chunk;
        let samples = if self.from_rate != self.to_rate {
            resample_linear(&samples, channels, self.from_rate, self.to_rate)
        } else {
            samples
        };
        remix_channels(&samples, channels, self.to_channels)
    }
}

/// Linear-interpolation resampling of interleaved samples
fn resample_linear(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if channels == 0 || samples.is_empty() {
        return Vec::new();
    }
    let in_frames = samples.len() / channels;
    let ratio = from_rate as f64 / to_rate as f64;
    let out_frames = (in_frames as f64 / ratio).round() as usize;

    let mut out = Vec::with_capacity(out_frames * channels);
    for frame in 0..out_frames {
        let src = frame as f64 * ratio;
        let i = (src.floor() as usize).min(in_frames - 1);
        let next = (i + 1).min(in_frames - 1);
        let t = (src - i as f64) as f32;
        for ch in 0..channels {
            let a = samples[i * channels + ch];
            let b = samples[next * channels + ch];
            out.push(a + (b - a) * t);
        }
    }
    out
}

/// Map interleaved frames from `from` channels to `to` channels
///
/// Mono is duplicated to every output channel; downmixing to mono averages.
fn remix_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 {
        return samples.to_vec();
    }

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else {
            out.extend((0..to).map(|ch| frame.get(ch).copied().unwrap_or(0.0)));
        }
    }
    out
}
