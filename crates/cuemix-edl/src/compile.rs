use cuemix_core::{Fade, FadeShape};
use tracing::debug;

use crate::error::CompileError;
use crate::store::Snapshot;

/// Normalized fade shape used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeCurve {
    #[default]
    Linear,
    EqualPower,
}

/// Lowered fade. A zero-length spec is the "no fade" sentinel the
/// renderer skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FadeSpec {
    pub length_samples: i64,
    pub curve: FadeCurve,
}

impl FadeSpec {
    pub fn is_empty(&self) -> bool {
        self.length_samples <= 0
    }
}

/// Media table entry of a compiled EDL, indexed by `CompiledClip::media_idx`.
#[derive(Debug, Clone)]
pub struct CompiledMedia {
    pub media_id: String,
    pub path: String,
    pub channels: u16,
}

/// Render-ready clip with precomputed timeline bounds and linear gain.
#[derive(Debug, Clone)]
pub struct CompiledClip {
    pub clip_id: String,
    pub media_idx: usize,
    /// Inclusive timeline start, in samples.
    pub t0: i64,
    /// Exclusive timeline end, in samples.
    pub t1: i64,
    pub start_in_media: i64,
    pub gain_linear: f32,
    pub muted: bool,
    pub fade_in: FadeSpec,
    pub fade_out: FadeSpec,
}

#[derive(Debug, Clone)]
pub struct CompiledTrack {
    pub gain_linear: f32,
    pub muted: bool,
    /// Sorted by `t0` ascending, stable among equal `t0`.
    pub clips: Vec<CompiledClip>,
}

/// Render-oriented view of a snapshot. Constructed per render and
/// discarded afterwards.
#[derive(Debug, Clone)]
pub struct CompiledEdl {
    pub sample_rate: u32,
    pub media: Vec<CompiledMedia>,
    pub tracks: Vec<CompiledTrack>,
}

impl CompiledEdl {
    /// Output channel count for a render: stereo at minimum, wider if
    /// any media carries more channels.
    pub fn output_channels(&self) -> u16 {
        self.media
            .iter()
            .map(|m| m.channels)
            .max()
            .unwrap_or(0)
            .max(2)
    }
}

/// Convert decibels to a linear gain factor.
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Lower a snapshot into a render plan.
///
/// No cross-clip conflict detection happens here: overlapping clips on
/// one track are allowed and sum in the renderer, which is how
/// crossfades emerge from two clips whose fades meet.
pub fn compile(snapshot: &Snapshot) -> Result<CompiledEdl, CompileError> {
    let edl = &snapshot.edl;

    let media = edl
        .media
        .iter()
        .zip(&snapshot.media_info)
        .map(|(entry, info)| CompiledMedia {
            media_id: entry.id.clone(),
            path: entry.path.clone(),
            channels: info.channels,
        })
        .collect::<Vec<_>>();

    let mut tracks = Vec::with_capacity(edl.tracks.len());
    for track in &edl.tracks {
        let mut clips = Vec::with_capacity(track.clips.len());
        for clip in &track.clips {
            let media_idx = media
                .iter()
                .position(|m| m.media_id == clip.media_id)
                .ok_or_else(|| CompileError::MediaMissing {
                    clip_id: clip.id.clone(),
                    media_id: clip.media_id.clone(),
                })?;

            clips.push(CompiledClip {
                clip_id: clip.id.clone(),
                media_idx,
                t0: clip.start_in_timeline,
                t1: clip.start_in_timeline + clip.duration,
                start_in_media: clip.start_in_media,
                gain_linear: db_to_linear(clip.gain_db),
                muted: clip.muted,
                fade_in: lower_fade(clip.fade_in),
                fade_out: lower_fade(clip.fade_out),
            });
        }
        clips.sort_by_key(|c| c.t0);

        tracks.push(CompiledTrack {
            gain_linear: db_to_linear(track.gain_db),
            muted: track.muted,
            clips,
        });
    }

    debug!(
        edl_id = %edl.id,
        revision = %snapshot.revision,
        tracks = tracks.len(),
        "compiled EDL"
    );

    Ok(CompiledEdl {
        sample_rate: edl.sample_rate as u32,
        media,
        tracks,
    })
}

fn lower_fade(fade: Option<Fade>) -> FadeSpec {
    let Some(fade) = fade else {
        return FadeSpec::default();
    };
    FadeSpec {
        length_samples: fade.duration_samples,
        curve: match fade.shape {
            FadeShape::Linear => FadeCurve::Linear,
            FadeShape::EqualPower => FadeCurve::EqualPower,
        },
    }
}
