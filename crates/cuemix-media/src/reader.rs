use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use symphonia::core::audio::{AudioBufferRef, SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder as SymphoniaDecoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::MediaError;

/// Stream spec and length of an opened media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub length_in_samples: u64,
}

/// Frame-accurate decode access to one audio file.
///
/// The reader keeps a decode cursor (format reader, decoder, pending
/// samples) behind a mutex, so a shared handle can serve concurrent
/// renders; each [`read`](Self::read) supplies an absolute start frame
/// and repositions only when the cursor does not already match.
pub struct MediaReader {
    path: String,
    info: MediaInfo,
    state: Mutex<DecodeState>,
}

impl std::fmt::Debug for MediaReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaReader")
            .field("path", &self.path)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

struct DecodeState {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn SymphoniaDecoder>,
    track_id: u32,
    sample_buf: Option<SampleBuffer<f32>>,
    /// Interleaved samples decoded but not yet consumed.
    pending: Vec<f32>,
    /// Frame index of the first pending sample.
    next_frame: u64,
}

impl MediaReader {
    /// Open and probe a media file.
    pub fn open(path: &str) -> Result<Self, MediaError> {
        if !Path::new(path).is_file() {
            return Err(MediaError::NotFound {
                path: path.to_string(),
            });
        }

        let file = File::open(path).map_err(|source| MediaError::Io {
            path: path.to_string(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|source| MediaError::UnsupportedFormat {
                path: path.to_string(),
                source,
            })?;

        let format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| MediaError::MissingTrack {
                path: path.to_string(),
            })?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params.sample_rate.unwrap_or(0);
        let channels = params
            .channels
            .as_ref()
            .map(|v| v.count() as u16)
            .unwrap_or(0);
        if sample_rate == 0 || channels == 0 {
            return Err(MediaError::MissingStreamSpec {
                path: path.to_string(),
                sample_rate,
                channels,
            });
        }

        // The renderer needs exact clip bounds checks, so media without a
        // declared frame count is rejected up front.
        let length_in_samples = params.n_frames.ok_or_else(|| MediaError::UnknownLength {
            path: path.to_string(),
        })?;

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|source| MediaError::DecoderInit {
                path: path.to_string(),
                source,
            })?;

        debug!(
            path,
            sample_rate, channels, length_in_samples, "opened media reader"
        );

        Ok(Self {
            path: path.to_string(),
            info: MediaInfo {
                sample_rate,
                channels,
                length_in_samples,
            },
            state: Mutex::new(DecodeState {
                format,
                decoder,
                track_id,
                sample_buf: None,
                pending: Vec::new(),
                next_frame: 0,
            }),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn info(&self) -> MediaInfo {
        self.info
    }

    /// Read up to `frames` frames starting at the absolute `start_frame`.
    ///
    /// `out` is cleared and filled with `frames_read * channels`
    /// interleaved samples. A read that begins before the end of the
    /// media but runs past it returns the short count; a `start_frame`
    /// at or beyond the end is an error.
    pub fn read(
        &self,
        start_frame: u64,
        frames: usize,
        out: &mut Vec<f32>,
    ) -> Result<usize, MediaError> {
        let length = self.info.length_in_samples;
        if start_frame >= length {
            return Err(MediaError::ReadBeyondEnd {
                path: self.path.clone(),
                frame: start_frame,
                length,
            });
        }

        let channels = self.info.channels as usize;
        let mut state = self.state.lock().expect("media reader mutex poisoned");

        if state.next_frame != start_frame {
            self.reposition(&mut state, start_frame)?;
        }

        let want = frames.min((length - start_frame) as usize);
        while state.pending.len() < want * channels {
            if !self.decode_more(&mut state)? {
                break;
            }
        }

        let got = (state.pending.len() / channels).min(want);
        out.clear();
        out.extend(state.pending.drain(..got * channels));
        state.next_frame += got as u64;
        Ok(got)
    }

    /// Seek the decode cursor to `target`, decoding forward from the
    /// nearest seekable point.
    fn reposition(&self, state: &mut DecodeState, target: u64) -> Result<(), MediaError> {
        let track_id = state.track_id;
        let seeked = state
            .format
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: target,
                    track_id,
                },
            )
            .map_err(|source| MediaError::Seek {
                path: self.path.clone(),
                frame: target,
                source,
            })?;
        state.decoder.reset();
        state.pending.clear();
        state.next_frame = seeked.actual_ts;

        // Accurate seeks land at or before the target; discard up to it.
        let channels = self.info.channels as usize;
        while state.next_frame < target {
            if state.pending.is_empty() && !self.decode_more(state)? {
                break;
            }
            let skip = ((target - state.next_frame) as usize).min(state.pending.len() / channels);
            state.pending.drain(..skip * channels);
            state.next_frame += skip as u64;
            if skip == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Decode packets until at least one lands in `pending`.
    ///
    /// Returns `false` at end of stream.
    fn decode_more(&self, state: &mut DecodeState) -> Result<bool, MediaError> {
        loop {
            let packet = match state.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(source) => {
                    return Err(MediaError::Decode {
                        path: self.path.clone(),
                        source,
                    });
                }
            };
            if packet.track_id() != state.track_id {
                continue;
            }
            match state.decoder.decode(&packet) {
                Ok(audio_buf) => {
                    append_decoded(&mut state.sample_buf, &mut state.pending, audio_buf);
                    return Ok(true);
                }
                // Skip corrupt packets the way the probe loop does.
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(SymphoniaError::ResetRequired) => {
                    state.decoder.reset();
                    continue;
                }
                Err(source) => {
                    return Err(MediaError::Decode {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }
    }
}

fn append_decoded(
    sample_buf: &mut Option<SampleBuffer<f32>>,
    pending: &mut Vec<f32>,
    audio_buf: AudioBufferRef<'_>,
) {
    let spec = SignalSpec::new(audio_buf.spec().rate, audio_buf.spec().channels);
    let capacity = audio_buf.capacity() as u64;
    let needs_realloc = sample_buf
        .as_ref()
        .is_none_or(|buf| buf.capacity() < audio_buf.capacity());
    if needs_realloc {
        *sample_buf = Some(SampleBuffer::<f32>::new(capacity, spec));
    }

    let Some(sample_buf) = sample_buf.as_mut() else {
        return;
    };
    sample_buf.copy_interleaved_ref(audio_buf);
    pending.extend_from_slice(sample_buf.samples());
}
