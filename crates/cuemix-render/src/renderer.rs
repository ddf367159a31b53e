use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use cuemix_core::TimeRange;
use cuemix_edl::{CompiledClip, CompiledEdl, FadeCurve, FadeSpec};
use cuemix_media::MediaCache;

use crate::buffer::FrameBuffer;
use crate::error::RenderError;
use crate::wav::{self, BitDepth};

/// Fixed mixing block size in frames. Output bytes are independent of
/// this constant; it only bounds working-set size and progress
/// granularity.
pub const BLOCK_FRAMES: usize = 4096;

/// Shared cancellation flag checked between blocks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Block-based offline mixer for compiled EDL windows.
pub struct WindowRenderer {
    media: Arc<MediaCache>,
    block_frames: usize,
}

impl WindowRenderer {
    pub fn new(media: Arc<MediaCache>) -> Self {
        Self {
            media,
            block_frames: BLOCK_FRAMES,
        }
    }

    /// Renderer with a non-default block size. Output must be identical
    /// for any block size; this exists so tests can prove it.
    pub fn with_block_frames(media: Arc<MediaCache>, block_frames: usize) -> Self {
        Self {
            media,
            block_frames: block_frames.max(1),
        }
    }

    /// Mix the window `[range.start, range.start + range.duration)` into
    /// a freshly allocated buffer.
    ///
    /// `on_progress` is called after every block with the fraction of
    /// the window rendered, on the calling thread; keep it cheap.
    pub fn render_to_buffer(
        &self,
        compiled: &CompiledEdl,
        range: TimeRange,
        cancel: &CancelFlag,
        mut on_progress: impl FnMut(f64),
    ) -> Result<FrameBuffer, RenderError> {
        if range.duration_samples <= 0 {
            return Err(RenderError::EmptyRange);
        }

        let channels = compiled.output_channels();
        let total = range.duration_samples as usize;
        debug!(
            start = range.start_samples,
            duration = range.duration_samples,
            channels,
            "starting window render"
        );

        let mut out = FrameBuffer::new(channels, total);
        let mut mix = FrameBuffer::new(channels, self.block_frames);
        let mut clip_buf = FrameBuffer::new(channels, self.block_frames);
        let mut scratch = Vec::new();

        let mut rendered = 0usize;
        while rendered < total {
            if cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }

            let block_frames = self.block_frames.min(total - rendered);
            let b0 = range.start_samples + rendered as i64;
            let b1 = b0 + block_frames as i64;
            mix.reset(block_frames);

            for track in compiled.tracks.iter().filter(|t| !t.muted) {
                for clip in &track.clips {
                    if clip.muted || clip.t1 <= b0 || clip.t0 >= b1 {
                        continue;
                    }
                    clip_buf.reset(block_frames);
                    self.render_clip(compiled, clip, b0, b1, &mut clip_buf, &mut scratch)?;
                    if track.gain_linear != 1.0 {
                        clip_buf.scale_region(0, block_frames, track.gain_linear);
                    }
                    mix.add_from(&clip_buf);
                }
            }

            out.copy_from(rendered, &mix);
            rendered += block_frames;
            on_progress(rendered as f64 / total as f64);
        }

        Ok(out)
    }

    /// Render the window and serialize it to `out_path` at `depth`.
    ///
    /// On any failure after the file came into existence the partial
    /// output is removed.
    pub fn render_to_wav(
        &self,
        compiled: &CompiledEdl,
        range: TimeRange,
        out_path: &Path,
        depth: BitDepth,
        cancel: &CancelFlag,
        on_progress: impl FnMut(f64),
    ) -> Result<(), RenderError> {
        let buffer = self.render_to_buffer(compiled, range, cancel, on_progress)?;

        if let Err(source) = wav::write_wav(
            out_path,
            compiled.sample_rate,
            buffer.channels(),
            depth,
            buffer.samples(),
        ) {
            let _ = std::fs::remove_file(out_path);
            return Err(RenderError::WriteOutput {
                path: out_path.display().to_string(),
                source,
            });
        }

        info!(
            path = %out_path.display(),
            frames = buffer.frames(),
            channels = buffer.channels(),
            bits = depth.bits_per_sample(),
            "window render written"
        );
        Ok(())
    }

    /// Mix one clip's intersection with the block `[b0, b1)` into
    /// `clip_buf` (block-relative), applying clip gain and fades.
    fn render_clip(
        &self,
        compiled: &CompiledEdl,
        clip: &CompiledClip,
        b0: i64,
        b1: i64,
        clip_buf: &mut FrameBuffer,
        scratch: &mut Vec<f32>,
    ) -> Result<(), RenderError> {
        let cs = clip.t0.max(b0);
        let ce = clip.t1.min(b1);
        if cs >= ce {
            return Ok(());
        }

        let media = &compiled.media[clip.media_idx];
        let reader = self
            .media
            .open(&media.path)
            .map_err(|source| RenderError::MediaOpen {
                clip_id: clip.clip_id.clone(),
                path: media.path.clone(),
                source,
            })?;

        let src = (clip.start_in_media + (cs - clip.t0)) as u64;
        let frames = (ce - cs) as usize;
        let offset = (cs - b0) as usize;

        let got = reader
            .read(src, frames, scratch)
            .map_err(|source| RenderError::MediaRead {
                clip_id: clip.clip_id.clone(),
                path: media.path.clone(),
                source,
            })?;

        // Mono media feeds every output channel; wider media maps
        // channel-for-channel and leaves the remainder silent.
        let media_ch = media.channels.max(1) as usize;
        let out_ch = clip_buf.channels();
        for frame in 0..got {
            for channel in 0..out_ch {
                let sample = if media_ch == 1 {
                    scratch[frame]
                } else if (channel as usize) < media_ch {
                    scratch[frame * media_ch + channel as usize]
                } else {
                    0.0
                };
                *clip_buf.sample_mut(offset + frame, channel) = sample * clip.gain_linear;
            }
        }

        if !clip.fade_in.is_empty() {
            apply_fade(clip_buf, &clip.fade_in, clip, cs, ce, b0, true);
        }
        if !clip.fade_out.is_empty() {
            apply_fade(clip_buf, &clip.fade_out, clip, cs, ce, b0, false);
        }
        Ok(())
    }
}

/// Multiply the fade's intersection with the rendered clip region by the
/// shaped gain curve.
///
/// Fade position `p` runs over `[0, 1]` across the fade span anchored at
/// the clip's timeline bounds; positions outside the span clamp, which
/// also covers fades longer than the clip itself.
fn apply_fade(
    clip_buf: &mut FrameBuffer,
    fade: &FadeSpec,
    clip: &CompiledClip,
    cs: i64,
    ce: i64,
    b0: i64,
    is_fade_in: bool,
) {
    let (fade_start, fade_end) = if is_fade_in {
        (clip.t0, clip.t0 + fade.length_samples)
    } else {
        (clip.t1 - fade.length_samples, clip.t1)
    };

    let start = fade_start.max(cs);
    let end = fade_end.min(ce);
    if start >= end {
        return;
    }

    let length = fade.length_samples as f32;
    for pos in start..end {
        let mut p = (pos - fade_start) as f32 / length;
        if !is_fade_in {
            p = 1.0 - p;
        }
        let p = p.clamp(0.0, 1.0);
        let gain = match fade.curve {
            FadeCurve::Linear => p,
            FadeCurve::EqualPower => p.sqrt(),
        };
        let frame = (pos - b0) as usize;
        for channel in 0..clip_buf.channels() {
            *clip_buf.sample_mut(frame, channel) *= gain;
        }
    }
}
