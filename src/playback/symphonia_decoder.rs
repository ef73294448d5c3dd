use std::io::Cursor;
use std::time::Duration;
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::{FormatOptions, FormatReader, SeekMode, SeekTo},
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
    units::Time,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("Symphonia error: {0}")]
    Symphonia(#[from] SymphoniaError),
    #[error("No audio tracks found")]
    NoAudioTracks,
}

/// Interleaved f32 samples from one decoded packet
#[derive(Debug, Clone)]
pub struct DecodedChunk {
    pub samples: Vec<f32>,
    pub channels: usize,
}

/// Decodes one in-memory audio file and tracks the playback position
pub struct TrackDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    decoded_frames: u64,
    duration: Option<Duration>,
}

fn probe(bytes: Vec<u8>, extension: Option<&str>) -> Result<Box<dyn FormatReader>, DecoderError> {
    let media_source = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        media_source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    Ok(probed.format)
}

impl TrackDecoder {
    /// Open an encoded file; `extension` (e.g. "mp3") helps format probing
    pub fn new(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self, DecoderError> {
        let format_reader = probe(bytes.clone(), extension)?;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecoderError::NoAudioTracks)?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let declared = track
            .codec_params
            .n_frames
            .map(|n_frames| Duration::from_secs_f64(n_frames as f64 / sample_rate as f64));

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        // Streams without a frame count in their headers (plain CBR mp3)
        // get measured by walking the packets once
        let duration = match declared {
            Some(duration) => Some(duration),
            None => measure_duration(bytes, extension, track_id, sample_rate),
        };
        debug!("Decoder ready: {} Hz, duration {:?}", sample_rate, duration);

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            sample_rate,
            decoded_frames: 0,
            duration,
        })
    }

    /// Decode the next packet of the track
    /// Returns None when end of stream is reached
    pub fn decode_next(&mut self) -> Result<Option<DecodedChunk>, DecoderError> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(DecoderError::Symphonia(e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let frames = decoded.frames();
            self.decoded_frames += frames as u64;
            if frames == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);

            return Ok(Some(DecodedChunk {
                samples: buffer.samples().to_vec(),
                channels: spec.channels.count(),
            }));
        }
    }

    /// Position of the last decoded frame
    pub fn position(&self) -> Duration {
        Duration::from_secs_f64(self.decoded_frames as f64 / self.sample_rate as f64)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Seek to a position, clamped to the known duration
    pub fn seek(&mut self, position: Duration) -> Result<(), DecoderError> {
        let position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        let seconds = position.as_secs_f64();
        let target_frame = (seconds * self.sample_rate as f64) as u64;

        let seeked = self.format_reader.seek(
            SeekMode::Accurate,
            SeekTo::Time {
                time: Time::new(seconds.floor() as u64, seconds.fract()),
                track_id: Some(self.track_id),
            },
        );
        self.decoder.reset();

        match seeked {
            Ok(_) => {
                self.decoded_frames = target_frame;
                Ok(())
            }
            Err(e) => {
                warn!("Seek to {:.2}s failed ({}), decoding forward from start", seconds, e);
                self.decode_forward_to(target_frame)
            }
        }
    }

    fn decode_forward_to(&mut self, target_frame: u64) -> Result<(), DecoderError> {
        self.format_reader.seek(
            SeekMode::Accurate,
            SeekTo::Time {
                time: Time::new(0, 0.0),
                track_id: Some(self.track_id),
            },
        )?;
        self.decoder.reset();
        self.decoded_frames = 0;

        while self.decoded_frames < target_frame {
            if self.decode_next()?.is_none() {
                break;
            }
        }
        Ok(())
    }
}

fn measure_duration(
    bytes: Vec<u8>,
    extension: Option<&str>,
    track_id: u32,
    sample_rate: u32,
) -> Option<Duration> {
    let mut reader = probe(bytes, extension).ok()?;
    let mut frames = 0u64;
    loop {
        match reader.next_packet() {
            Ok(packet) if packet.track_id() == track_id => frames += packet.dur,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    (frames > 0).then(|| Duration::from_secs_f64(frames as f64 / sample_rate as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 16-bit PCM WAV with `frames` frames of silence
    fn wav_bytes(sample_rate: u32, channels: u16, frames: u32) -> Vec<u8> {
        let data_len = frames * channels as u32 * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
        out.extend_from_slice(&(channels * 2).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(out.len() + data_len as usize, 0);
        out
    }

    #[test]
    fn wav_duration_and_position() {
        let mut decoder = TrackDecoder::new(wav_bytes(8000, 1, 16000), Some("wav")).unwrap();

        assert_eq!(decoder.sample_rate(), 8000);
        assert_eq!(decoder.duration(), Some(Duration::from_secs(2)));
        assert_eq!(decoder.position(), Duration::ZERO);

        let chunk = decoder.decode_next().unwrap().unwrap();
        assert_eq!(chunk.channels, 1);
        assert!(!chunk.samples.is_empty());
        assert!(decoder.position() > Duration::ZERO);
    }

    #[test]
    fn decodes_to_end_of_stream() {
        let mut decoder = TrackDecoder::new(wav_bytes(8000, 2, 4000), Some("wav")).unwrap();
        let mut frames = 0;
        while let Some(chunk) = decoder.decode_next().unwrap() {
            frames += chunk.samples.len() / chunk.channels;
        }
        assert_eq!(frames, 4000);
    }

    #[test]
    fn seek_moves_the_position() {
        let mut decoder = TrackDecoder::new(wav_bytes(8000, 1, 16000), Some("wav")).unwrap();
        decoder.seek(Duration::from_millis(1500)).unwrap();
        let position = decoder.position().as_secs_f64();
        assert!((position - 1.5).abs() < 0.01, "position {}", position);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(TrackDecoder::new(vec![0x42; 64], None).is_err());
    }
}
