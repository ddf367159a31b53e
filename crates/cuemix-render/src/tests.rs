use std::path::PathBuf;
use std::sync::Arc;

use cuemix_core::TimeRange;
use cuemix_edl::{CompiledClip, CompiledEdl, CompiledMedia, CompiledTrack, FadeCurve, FadeSpec};
use cuemix_media::MediaCache;
use tempfile::TempDir;

use crate::buffer::FrameBuffer;
use crate::error::RenderError;
use crate::renderer::{CancelFlag, WindowRenderer};
use crate::wav::{self, BitDepth};

const RATE: u32 = 48000;

struct Fixture {
    dir: TempDir,
    media: Arc<MediaCache>,
    paths: Vec<(PathBuf, u16)>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
            media: Arc::new(MediaCache::new()),
            paths: Vec::new(),
        }
    }

    /// Write a float32 WAV and register it as the next media entry.
    fn add_media(&mut self, name: &str, channels: u16, samples: &[f32]) -> usize {
        let path = self.dir.path().join(name);
        wav::write_wav(&path, RATE, channels, BitDepth::Float32, samples).expect("write fixture");
        self.paths.push((path, channels));
        self.paths.len() - 1
    }

    fn compiled(&self, tracks: Vec<CompiledTrack>) -> CompiledEdl {
        CompiledEdl {
            sample_rate: RATE,
            media: self
                .paths
                .iter()
                .enumerate()
                .map(|(idx, (path, channels))| CompiledMedia {
                    media_id: format!("m{idx}"),
                    path: path.to_str().expect("utf-8 path").to_string(),
                    channels: *channels,
                })
                .collect(),
            tracks,
        }
    }

    fn renderer(&self) -> WindowRenderer {
        WindowRenderer::new(Arc::clone(&self.media))
    }

    fn out_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("out").join(name)
    }
}

fn clip(media_idx: usize, t0: i64, duration: i64) -> CompiledClip {
    CompiledClip {
        clip_id: format!("clip-{media_idx}-{t0}"),
        media_idx,
        t0,
        t1: t0 + duration,
        start_in_media: 0,
        gain_linear: 1.0,
        muted: false,
        fade_in: FadeSpec::default(),
        fade_out: FadeSpec::default(),
    }
}

fn track(clips: Vec<CompiledClip>) -> CompiledTrack {
    CompiledTrack {
        gain_linear: 1.0,
        muted: false,
        clips,
    }
}

fn render(fixture: &Fixture, compiled: &CompiledEdl, range: TimeRange) -> FrameBuffer {
    fixture
        .renderer()
        .render_to_buffer(compiled, range, &CancelFlag::new(), |_| {})
        .expect("render")
}

#[test]
fn identity_render_of_mono_fixture() {
    let mut fx = Fixture::new();
    let m = fx.add_media("ramp.wav", 1, &[0.0, 1.0, 2.0, 3.0]);
    let compiled = fx.compiled(vec![track(vec![clip(m, 0, 4)])]);

    let out = render(&fx, &compiled, TimeRange::new(0, 4));
    assert_eq!(out.channels(), 2);
    assert_eq!(out.frames(), 4);
    // Mono media lands identically in both output channels.
    for frame in 0..4 {
        assert_eq!(out.sample(frame, 0), frame as f32);
        assert_eq!(out.sample(frame, 1), frame as f32);
    }
}

#[test]
fn empty_range_is_rejected() {
    let mut fx = Fixture::new();
    let m = fx.add_media("tone.wav", 1, &[0.5; 8]);
    let compiled = fx.compiled(vec![track(vec![clip(m, 0, 8)])]);

    let err = fx
        .renderer()
        .render_to_buffer(&compiled, TimeRange::new(0, 0), &CancelFlag::new(), |_| {})
        .unwrap_err();
    assert!(matches!(err, RenderError::EmptyRange));

    let err = fx
        .renderer()
        .render_to_buffer(&compiled, TimeRange::new(0, -5), &CancelFlag::new(), |_| {})
        .unwrap_err();
    assert!(matches!(err, RenderError::EmptyRange));
}

#[test]
fn window_past_all_clips_is_silence_of_exact_length() {
    let mut fx = Fixture::new();
    let m = fx.add_media("tone.wav", 1, &[0.5; 100]);
    let compiled = fx.compiled(vec![track(vec![clip(m, 0, 100)])]);

    let out = render(&fx, &compiled, TimeRange::new(48000, 4800));
    assert_eq!(out.frames(), 4800);
    assert!(out.samples().iter().all(|&s| s == 0.0));
}

#[test]
fn window_start_offsets_into_media() {
    let mut fx = Fixture::new();
    let samples: Vec<f32> = (0..32).map(|i| i as f32).collect();
    let m = fx.add_media("ramp.wav", 1, &samples);

    let mut placed = clip(m, 10, 16);
    placed.start_in_media = 4;
    let compiled = fx.compiled(vec![track(vec![placed])]);

    // Window [12, 20) overlaps the clip at timeline 12..20, which maps
    // to media frames 6..14.
    let out = render(&fx, &compiled, TimeRange::new(12, 8));
    for frame in 0..8 {
        assert_eq!(out.sample(frame, 0), (6 + frame) as f32);
    }
}

#[test]
fn clip_and_track_gains_multiply() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[1.0; 16]);

    let mut loud = clip(m, 0, 16);
    loud.gain_linear = 0.5;
    let compiled = fx.compiled(vec![CompiledTrack {
        gain_linear: 0.25,
        muted: false,
        clips: vec![loud],
    }]);

    let out = render(&fx, &compiled, TimeRange::new(0, 16));
    for frame in 0..16 {
        assert!((out.sample(frame, 0) - 0.125).abs() < 1e-7);
    }
}

#[test]
fn overlapping_clips_sum_pointwise() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[0.25; 32]);

    // Two clips overlap on [8, 16); no clipping is applied to the sum.
    let compiled = fx.compiled(vec![track(vec![clip(m, 0, 16), clip(m, 8, 16)])]);

    let out = render(&fx, &compiled, TimeRange::new(0, 24));
    assert_eq!(out.sample(4, 0), 0.25);
    assert_eq!(out.sample(12, 0), 0.5);
    assert_eq!(out.sample(20, 0), 0.25);
}

#[test]
fn muted_track_and_muted_clip_contribute_nothing() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[1.0; 16]);

    let mut muted_clip = clip(m, 0, 16);
    muted_clip.muted = true;
    let compiled = fx.compiled(vec![
        CompiledTrack {
            gain_linear: 4.0,
            muted: true,
            clips: vec![clip(m, 0, 16)],
        },
        track(vec![muted_clip]),
    ]);

    let out = render(&fx, &compiled, TimeRange::new(0, 16));
    assert!(out.samples().iter().all(|&s| s == 0.0));
}

#[test]
fn linear_fade_in_ramps_from_zero() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[1.0; 16]);

    let mut faded = clip(m, 0, 16);
    faded.fade_in = FadeSpec {
        length_samples: 4,
        curve: FadeCurve::Linear,
    };
    let compiled = fx.compiled(vec![track(vec![faded])]);

    let out = render(&fx, &compiled, TimeRange::new(0, 4));
    let head: Vec<f32> = (0..4).map(|f| out.sample(f, 0)).collect();
    assert_eq!(head, vec![0.0, 0.25, 0.5, 0.75]);
}

#[test]
fn fade_endpoints_hit_zero_and_unity() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[1.0; 256]);

    for curve in [FadeCurve::Linear, FadeCurve::EqualPower] {
        let mut faded = clip(m, 0, 256);
        faded.fade_in = FadeSpec {
            length_samples: 64,
            curve,
        };
        faded.fade_out = FadeSpec {
            length_samples: 64,
            curve,
        };
        let compiled = fx.compiled(vec![track(vec![faded])]);
        let out = render(&fx, &compiled, TimeRange::new(0, 256));

        // First faded sample is exactly zero; the first sample past the
        // fade span is untouched.
        assert_eq!(out.sample(0, 0), 0.0);
        assert!((out.sample(64, 0) - 1.0).abs() < 2f32.powi(-20));
        // Fade-out mirrors: unity at its start, zero at the final frame
        // would need p = 1, which lands one past the clip; the last
        // rendered frame carries the smallest non-zero gain.
        assert!((out.sample(192, 0) - 1.0).abs() < 2f32.powi(-20));
        assert!(out.sample(255, 0) > 0.0);
        assert!(out.sample(255, 0) < out.sample(254, 0));
    }
}

#[test]
fn equal_power_fade_uses_sqrt() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[1.0; 16]);

    let mut faded = clip(m, 0, 16);
    faded.fade_in = FadeSpec {
        length_samples: 4,
        curve: FadeCurve::EqualPower,
    };
    let compiled = fx.compiled(vec![track(vec![faded])]);

    let out = render(&fx, &compiled, TimeRange::new(0, 4));
    assert_eq!(out.sample(0, 0), 0.0);
    assert!((out.sample(1, 0) - 0.25f32.sqrt()).abs() < 1e-7);
    assert!((out.sample(2, 0) - 0.5f32.sqrt()).abs() < 1e-7);
    assert!((out.sample(3, 0) - 0.75f32.sqrt()).abs() < 1e-7);
}

#[test]
fn crossfade_emerges_from_overlapping_fades() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[1.0; 64]);

    let mut outgoing = clip(m, 0, 32);
    outgoing.fade_out = FadeSpec {
        length_samples: 8,
        curve: FadeCurve::Linear,
    };
    let mut incoming = clip(m, 24, 32);
    incoming.fade_in = FadeSpec {
        length_samples: 8,
        curve: FadeCurve::Linear,
    };
    let compiled = fx.compiled(vec![track(vec![outgoing, incoming])]);

    let out = render(&fx, &compiled, TimeRange::new(0, 56));
    // Linear ramps crossing sum to unity across the overlap.
    for frame in 24..32 {
        assert!((out.sample(frame, 0) - 1.0).abs() < 1e-6);
    }
    assert_eq!(out.sample(16, 0), 1.0);
    assert_eq!(out.sample(40, 0), 1.0);
}

#[test]
fn wider_media_forces_wider_output() {
    let mut fx = Fixture::new();
    // Four-channel media: frame f carries [f, -f, 2f, -2f].
    let samples: Vec<f32> = (0..8)
        .flat_map(|f| {
            let f = f as f32;
            [f, -f, 2.0 * f, -2.0 * f]
        })
        .collect();
    let m = fx.add_media("quad.wav", 4, &samples);
    let compiled = fx.compiled(vec![track(vec![clip(m, 0, 8)])]);

    let out = render(&fx, &compiled, TimeRange::new(0, 8));
    assert_eq!(out.channels(), 4);
    assert_eq!(out.sample(3, 0), 3.0);
    assert_eq!(out.sample(3, 1), -3.0);
    assert_eq!(out.sample(3, 2), 6.0);
    assert_eq!(out.sample(3, 3), -6.0);
}

#[test]
fn block_size_does_not_change_output() {
    let mut fx = Fixture::new();
    let samples: Vec<f32> = (0..20000).map(|i| ((i % 997) as f32 / 997.0) - 0.5).collect();
    let m = fx.add_media("noise.wav", 1, &samples);

    let mut faded = clip(m, 100, 19000);
    faded.fade_in = FadeSpec {
        length_samples: 3000,
        curve: FadeCurve::EqualPower,
    };
    faded.fade_out = FadeSpec {
        length_samples: 5000,
        curve: FadeCurve::Linear,
    };
    let compiled = fx.compiled(vec![track(vec![faded])]);
    let range = TimeRange::new(50, 19500);

    let reference = render(&fx, &compiled, range);
    for block_frames in [1024usize, 4096, 16384] {
        let renderer = WindowRenderer::with_block_frames(Arc::clone(&fx.media), block_frames);
        let out = renderer
            .render_to_buffer(&compiled, range, &CancelFlag::new(), |_| {})
            .expect("render");
        assert_eq!(
            out.samples(),
            reference.samples(),
            "block size {block_frames} changed output"
        );
    }
}

#[test]
fn progress_reaches_one_and_is_monotonic() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[0.5; 100]);
    let compiled = fx.compiled(vec![track(vec![clip(m, 0, 100)])]);

    let mut fractions = Vec::new();
    let renderer = WindowRenderer::with_block_frames(Arc::clone(&fx.media), 1000);
    renderer
        .render_to_buffer(&compiled, TimeRange::new(0, 10000), &CancelFlag::new(), |f| {
            fractions.push(f)
        })
        .expect("render");

    assert_eq!(fractions.len(), 10);
    assert!(fractions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(*fractions.last().expect("non-empty"), 1.0);
}

#[test]
fn cancel_aborts_between_blocks() {
    let mut fx = Fixture::new();
    let m = fx.add_media("one.wav", 1, &[0.5; 100]);
    let compiled = fx.compiled(vec![track(vec![clip(m, 0, 100)])]);

    let cancel = CancelFlag::new();
    cancel.cancel();
    let out_path = fx.out_path("cancelled.wav");
    let err = fx
        .renderer()
        .render_to_wav(
            &compiled,
            TimeRange::new(0, 48000),
            &out_path,
            BitDepth::Int16,
            &cancel,
            |_| {},
        )
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(!out_path.exists());
}

#[test]
fn rendering_twice_produces_identical_wav_bytes() {
    let mut fx = Fixture::new();
    let samples: Vec<f32> = (0..6000).map(|i| (i as f32 * 0.01).sin() * 0.8).collect();
    let m = fx.add_media("sine.wav", 1, &samples);

    let mut faded = clip(m, 0, 6000);
    faded.fade_out = FadeSpec {
        length_samples: 1000,
        curve: FadeCurve::EqualPower,
    };
    let compiled = fx.compiled(vec![track(vec![faded])]);

    let first = fx.out_path("first.wav");
    let second = fx.out_path("second.wav");
    for path in [&first, &second] {
        fx.renderer()
            .render_to_wav(
                &compiled,
                TimeRange::new(0, 6000),
                path,
                BitDepth::Int24,
                &CancelFlag::new(),
                |_| {},
            )
            .expect("render to wav");
    }
    assert_eq!(
        std::fs::read(&first).expect("first bytes"),
        std::fs::read(&second).expect("second bytes")
    );
}

#[test]
fn float32_wav_data_section_is_bit_exact() {
    let mut fx = Fixture::new();
    let m = fx.add_media("ramp.wav", 1, &[0.0, 1.0, 2.0, 3.0]);
    let compiled = fx.compiled(vec![track(vec![clip(m, 0, 4)])]);

    let out_path = fx.out_path("identity.wav");
    fx.renderer()
        .render_to_wav(
            &compiled,
            TimeRange::new(0, 4),
            &out_path,
            BitDepth::Float32,
            &CancelFlag::new(),
            |_| {},
        )
        .expect("render to wav");

    let bytes = std::fs::read(&out_path).expect("read back");
    let data = &bytes[44..];
    assert_eq!(data.len(), 4 * 2 * 4); // frames * channels * bytes
    for frame in 0..4 {
        for channel in 0..2 {
            let at = (frame * 2 + channel) * 4;
            let value = f32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
            assert_eq!(value, frame as f32);
        }
    }
}
