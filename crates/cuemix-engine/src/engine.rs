use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use cuemix_core::{Edl, EngineEvent, FileInfo, TimeRange};
use cuemix_edl::{EdlStore, Snapshot, compile};
use cuemix_media::MediaCache;
use cuemix_render::{BLOCK_FRAMES, BitDepth, CancelFlag, RenderError, WindowRenderer, wav};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::event_hub::EventHub;
use crate::hash::hash_file;

/// Result of a successful `UpdateEdl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdlSummary {
    pub edl_id: String,
    pub revision: String,
    pub track_count: u32,
    pub clip_count: u32,
}

/// Parameters of a `RenderEdlWindow` operation.
#[derive(Debug, Clone)]
pub struct RenderWindowRequest {
    pub edl_id: String,
    pub range: TimeRange,
    pub out_path: PathBuf,
    /// Wire bit depth; 16 and 24 render integer PCM, anything else
    /// 32-bit float.
    pub bit_depth: u32,
}

/// Terminal summary of a successful window render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub out_path: String,
    pub duration_sec: f64,
    pub sha256: String,
}

/// Parameters of a one-shot file render.
#[derive(Debug, Clone)]
pub struct FileRenderRequest {
    pub input_file: String,
    pub output_file: PathBuf,
    pub start_time: Option<f64>,
    pub duration: Option<f64>,
}

/// Progress sample of a one-shot file render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileRenderProgress {
    pub percentage: f64,
    pub elapsed_seconds: f64,
    pub estimated_remaining_seconds: f64,
}

/// Terminal summary of a one-shot file render.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRenderOutcome {
    pub output_file_path: String,
    pub sha256_hash: String,
    /// Wall-clock render time in seconds.
    pub total_duration_seconds: f64,
    pub output_file_size_bytes: u64,
}

/// A registered subscriber stream: the events to deliver first, then the
/// live broadcast receiver.
pub struct Subscription {
    pub initial: Vec<EngineEvent>,
    pub receiver: broadcast::Receiver<EngineEvent>,
}

/// The engine front-end.
///
/// Owns the media cache, EDL store, renderer and event broadcaster, and
/// translates operation requests into core calls plus broadcast events.
pub struct Engine {
    config: EngineConfig,
    media: Arc<MediaCache>,
    store: EdlStore,
    renderer: WindowRenderer,
    events: EventHub,
    started_at: Instant,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let media = Arc::new(MediaCache::new());
        Self {
            store: EdlStore::new(Arc::clone(&media)),
            renderer: WindowRenderer::new(Arc::clone(&media)),
            events: EventHub::new(config.event_capacity),
            started_at: Instant::now(),
            media,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Milliseconds since engine start, from a monotonic clock.
    pub fn monotonic_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    pub fn heartbeat(&self) -> EngineEvent {
        EngineEvent::Heartbeat {
            monotonic_ms: self.monotonic_ms(),
        }
    }

    /// Validate and install a new EDL.
    ///
    /// On success the response summary is also broadcast as
    /// `EdlApplied`; on validation failure the error is broadcast as
    /// `EdlError` so passive subscribers observe it.
    pub fn update_edl(&self, edl: Edl, replace: bool) -> Result<EdlSummary, EngineError> {
        let edl_id = edl.id.clone();
        if !replace {
            // Reserved for a future merge semantics; the store always
            // replaces today.
            debug!(edl_id = %edl_id, "update without replace flag, replacing anyway");
        }

        match self.store.replace(edl) {
            Ok(snapshot) => {
                self.events.emit(applied_event(&snapshot));
                Ok(EdlSummary {
                    edl_id: snapshot.edl.id.clone(),
                    revision: snapshot.revision.clone(),
                    track_count: snapshot.track_count,
                    clip_count: snapshot.clip_count,
                })
            }
            Err(err) => {
                let err = EngineError::Store(err);
                warn!(edl_id = %edl_id, error = %err, "EDL rejected");
                self.events.emit(EngineEvent::EdlError {
                    edl_id,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Current snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.store.get()
    }

    /// Register a subscriber stream.
    ///
    /// The returned subscription lists the events to deliver before the
    /// live feed: the ready status, then the current EDL state when one
    /// is loaded.
    pub fn subscribe(&self, session: &str) -> Subscription {
        debug!(session, subscribers = self.events.subscriber_count() + 1, "subscriber registered");
        let receiver = self.events.subscribe();
        let mut initial = vec![EngineEvent::BackendStatus {
            status: "ready".to_string(),
        }];
        if let Some(snapshot) = self.store.get() {
            initial.push(applied_event(&snapshot));
        }
        Subscription { initial, receiver }
    }

    /// Render a window of the current EDL to a WAV file.
    ///
    /// Streams `Progress` per block and a terminal `Complete` or
    /// `EdlError` through `emit`; the same events are broadcast to
    /// subscribers. Cancellation returns without any terminal event.
    ///
    /// The snapshot is captured once at the start; a concurrent
    /// `UpdateEdl` does not affect an in-flight render.
    pub fn render_edl_window(
        &self,
        req: &RenderWindowRequest,
        cancel: &CancelFlag,
        emit: &mut dyn FnMut(EngineEvent),
    ) -> Result<RenderOutcome, EngineError> {
        let Some(snapshot) = self.store.get() else {
            return Err(self.fail_stream(&req.edl_id, EngineError::NoEdlLoaded, emit));
        };
        if snapshot.edl.id != req.edl_id {
            let err = EngineError::EdlIdMismatch {
                requested: req.edl_id.clone(),
                loaded: snapshot.edl.id.clone(),
            };
            return Err(self.fail_stream(&req.edl_id, err, emit));
        }

        let compiled = match compile(&snapshot) {
            Ok(compiled) => compiled,
            Err(err) => {
                return Err(self.fail_stream(&req.edl_id, EngineError::Compile(err), emit));
            }
        };

        info!(
            edl_id = %req.edl_id,
            revision = %snapshot.revision,
            start = req.range.start_samples,
            duration = req.range.duration_samples,
            out_path = %req.out_path.display(),
            bit_depth = req.bit_depth,
            "starting EDL window render"
        );

        let started = Instant::now();
        let result = self.renderer.render_to_wav(
            &compiled,
            req.range,
            &req.out_path,
            BitDepth::from_bits(req.bit_depth),
            cancel,
            |fraction| {
                let elapsed = started.elapsed().as_secs_f64();
                let eta = if fraction > 0.0 {
                    elapsed / fraction - elapsed
                } else {
                    0.0
                };
                let event = EngineEvent::Progress { fraction, eta };
                emit(event.clone());
                self.events.emit(event);
            },
        );
        if let Err(err) = result {
            if err.is_cancelled() {
                info!(edl_id = %req.edl_id, "render cancelled");
                return Err(EngineError::Render(err));
            }
            return Err(self.fail_stream(&req.edl_id, EngineError::Render(err), emit));
        }

        let sha256 = match hash_file(&req.out_path) {
            Ok(sha256) => sha256,
            Err(source) => {
                let err = EngineError::HashOutput {
                    path: req.out_path.display().to_string(),
                    source,
                };
                return Err(self.fail_stream(&req.edl_id, err, emit));
            }
        };

        let outcome = RenderOutcome {
            out_path: req.out_path.display().to_string(),
            duration_sec: req.range.duration_samples as f64 / compiled.sample_rate as f64,
            sha256,
        };
        let event = EngineEvent::Complete {
            out_path: outcome.out_path.clone(),
            duration_sec: outcome.duration_sec,
            sha256: outcome.sha256.clone(),
        };
        emit(event.clone());
        self.events.emit(event);

        info!(
            edl_id = %req.edl_id,
            out_path = %outcome.out_path,
            sha256 = %outcome.sha256,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "EDL window render complete"
        );
        Ok(outcome)
    }

    /// Probe a media file and report its stream spec.
    pub fn load_file(&self, path: &str) -> Result<FileInfo, EngineError> {
        let reader = self.media.open(path)?;
        let info = reader.info();
        let file_size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        info!(
            path,
            sample_rate = info.sample_rate,
            channels = info.channels,
            length = info.length_in_samples,
            "loaded media file"
        );
        Ok(FileInfo {
            path: path.to_string(),
            sample_rate: info.sample_rate,
            num_channels: info.channels,
            duration_seconds: info.length_in_samples as f64 / info.sample_rate as f64,
            file_size_bytes,
        })
    }

    /// One-shot render of a single media file window to a 32-bit float
    /// WAV at the file's native rate and channel count.
    pub fn render_file(
        &self,
        req: &FileRenderRequest,
        cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(FileRenderProgress),
    ) -> Result<FileRenderOutcome, EngineError> {
        let reader = self.media.open(&req.input_file)?;
        let info = reader.info();
        let rate = info.sample_rate as f64;

        let start = req
            .start_time
            .map(|seconds| (seconds * rate) as i64)
            .unwrap_or(0)
            .max(0) as u64;
        let end = match req.duration {
            Some(seconds) => (start + (seconds * rate) as u64).min(info.length_in_samples),
            None => info.length_in_samples,
        };
        if start >= end {
            return Err(EngineError::Render(RenderError::EmptyRange));
        }

        let total = (end - start) as usize;
        let started = Instant::now();
        let mut samples = Vec::with_capacity(total * info.channels as usize);
        let mut scratch = Vec::new();
        let mut rendered = 0usize;
        while rendered < total {
            if cancel.is_cancelled() {
                return Err(EngineError::Render(RenderError::Cancelled));
            }
            let block = BLOCK_FRAMES.min(total - rendered);
            let got = reader.read(start + rendered as u64, block, &mut scratch)?;
            samples.extend_from_slice(&scratch);
            rendered += got;

            let percentage = rendered as f64 / total as f64 * 100.0;
            let elapsed_seconds = started.elapsed().as_secs_f64();
            let estimated_remaining_seconds = if percentage > 0.0 {
                elapsed_seconds * (100.0 / percentage) - elapsed_seconds
            } else {
                0.0
            };
            on_progress(FileRenderProgress {
                percentage,
                elapsed_seconds,
                estimated_remaining_seconds,
            });

            if got < block {
                break;
            }
        }

        if let Err(source) = wav::write_wav(
            &req.output_file,
            info.sample_rate,
            info.channels,
            BitDepth::Float32,
            &samples,
        ) {
            let _ = std::fs::remove_file(&req.output_file);
            return Err(EngineError::Render(RenderError::WriteOutput {
                path: req.output_file.display().to_string(),
                source,
            }));
        }

        let output_file_path = req.output_file.display().to_string();
        let sha256_hash = hash_file(&req.output_file).map_err(|source| EngineError::HashOutput {
            path: output_file_path.clone(),
            source,
        })?;
        let output_file_size_bytes = std::fs::metadata(&req.output_file)
            .map(|m| m.len())
            .unwrap_or(0);

        info!(
            input = %req.input_file,
            output = %output_file_path,
            frames = rendered,
            "file render complete"
        );
        Ok(FileRenderOutcome {
            output_file_path,
            sha256_hash,
            total_duration_seconds: started.elapsed().as_secs_f64(),
            output_file_size_bytes,
        })
    }

    /// Emit a terminal `EdlError` both to the stream and to subscribers,
    /// passing the error back for the operation status.
    fn fail_stream(
        &self,
        edl_id: &str,
        err: EngineError,
        emit: &mut dyn FnMut(EngineEvent),
    ) -> EngineError {
        warn!(edl_id, error = %err, "streamed operation failed");
        let event = EngineEvent::EdlError {
            edl_id: edl_id.to_string(),
            reason: err.to_string(),
        };
        emit(event.clone());
        self.events.emit(event);
        err
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn applied_event(snapshot: &Snapshot) -> EngineEvent {
    EngineEvent::EdlApplied {
        edl_id: snapshot.edl.id.clone(),
        revision: snapshot.revision.clone(),
        track_count: snapshot.track_count,
        clip_count: snapshot.clip_count,
    }
}
