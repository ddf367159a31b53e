use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Reference to an on-disk audio file used by clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioRef {
    /// Identity clips refer to through `media_id`.
    pub id: String,
    /// Absolute (or resolvable) path to the audio file.
    pub path: String,
    /// Declared sample rate; zero means "take it from the file".
    #[serde(default)]
    pub sample_rate: i32,
    /// Declared channel count; informational.
    #[serde(default)]
    pub channels: i32,
}

/// Amplitude ramp shape at a clip boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeShape {
    #[default]
    Linear,
    EqualPower,
}

impl FadeShape {
    fn as_wire(self) -> &'static str {
        match self {
            Self::Linear => "LINEAR",
            Self::EqualPower => "EQUAL_POWER",
        }
    }
}

impl Serialize for FadeShape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for FadeShape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ShapeVisitor;

        impl Visitor<'_> for ShapeVisitor {
            type Value = FadeShape;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"LINEAR\" or \"EQUAL_POWER\"")
            }

            // Enum parsing is case-insensitive on the wire.
            fn visit_str<E: de::Error>(self, value: &str) -> Result<FadeShape, E> {
                match value.to_ascii_uppercase().as_str() {
                    "LINEAR" => Ok(FadeShape::Linear),
                    "EQUAL_POWER" => Ok(FadeShape::EqualPower),
                    other => Err(E::unknown_variant(other, &["LINEAR", "EQUAL_POWER"])),
                }
            }
        }

        deserializer.deserialize_str(ShapeVisitor)
    }
}

/// Sample-count-bounded amplitude ramp at a clip boundary.
///
/// A zero-duration fade is equivalent to no fade at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fade {
    #[serde(default)]
    pub duration_samples: i64,
    #[serde(default)]
    pub shape: FadeShape,
}

/// Placement of a media time range onto a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Clip {
    pub id: String,
    /// Id of the [`AudioRef`] this clip reads from.
    pub media_id: String,
    /// First frame read from the media, in samples.
    #[serde(default)]
    pub start_in_media: i64,
    /// Timeline position of the clip's first frame, in samples.
    #[serde(default)]
    pub start_in_timeline: i64,
    /// Clip length in samples; must be positive.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub gain_db: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<Fade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<Fade>,
}

/// Ordered collection of clips sharing a gain and mute state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub gain_db: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// Edit decision list: a multi-track timeline over media references.
///
/// All sample positions in the timeline are expressed at `sample_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Edl {
    pub id: String,
    /// Client-supplied revision; overwritten by the store with the
    /// content hash of the validated EDL.
    #[serde(default)]
    pub revision: String,
    pub sample_rate: i32,
    pub media: Vec<AudioRef>,
    pub tracks: Vec<Track>,
}

impl Edl {
    /// Total clip count across all tracks.
    pub fn clip_count(&self) -> u32 {
        self.tracks.iter().map(|t| t.clips.len() as u32).sum()
    }
}

/// Half-open window `[start, start + duration)` on the timeline, in
/// samples at the EDL's sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeRange {
    #[serde(default)]
    pub start_samples: i64,
    #[serde(default)]
    pub duration_samples: i64,
}

impl TimeRange {
    pub fn new(start_samples: i64, duration_samples: i64) -> Self {
        Self {
            start_samples,
            duration_samples,
        }
    }

    pub fn end_samples(&self) -> i64 {
        self.start_samples + self.duration_samples
    }
}
