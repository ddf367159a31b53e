//! Byte-level WAV serialization.
//!
//! Little-endian canonical layout: `RIFF` | file size − 8 | `WAVE` |
//! `fmt ` chunk (16 bytes, format tag 1 for PCM or 3 for IEEE float) |
//! `data` chunk | frames.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::warn;

/// Output sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Int16,
    Int24,
    Float32,
}

impl BitDepth {
    /// Map a wire-level bit depth; unknown depths fall back to 32-bit
    /// float.
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            16 => Self::Int16,
            24 => Self::Int24,
            32 => Self::Float32,
            other => {
                warn!(bits = other, "unknown bit depth, rendering 32-bit float");
                Self::Float32
            }
        }
    }

    pub fn bits_per_sample(self) -> u16 {
        match self {
            Self::Int16 => 16,
            Self::Int24 => 24,
            Self::Float32 => 32,
        }
    }

    pub fn bytes_per_sample(self) -> u32 {
        self.bits_per_sample() as u32 / 8
    }

    /// `fmt ` chunk format tag: 1 = integer PCM, 3 = IEEE float.
    fn format_tag(self) -> u16 {
        match self {
            Self::Int16 | Self::Int24 => 1,
            Self::Float32 => 3,
        }
    }
}

/// Write interleaved samples as a WAV file.
///
/// The write is destructive: an existing file at `path` is deleted and
/// recreated, and a missing parent directory is created first.
pub fn write_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    depth: BitDepth,
    samples: &[f32],
) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let data_size = samples.len() as u32 * depth.bytes_per_sample();
    let byte_rate = sample_rate * channels as u32 * depth.bytes_per_sample();
    let block_align = channels * depth.bytes_per_sample() as u16;

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(b"RIFF")?;
    out.write_all(&(36 + data_size).to_le_bytes())?;
    out.write_all(b"WAVE")?;

    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&depth.format_tag().to_le_bytes())?;
    out.write_all(&channels.to_le_bytes())?;
    out.write_all(&sample_rate.to_le_bytes())?;
    out.write_all(&byte_rate.to_le_bytes())?;
    out.write_all(&block_align.to_le_bytes())?;
    out.write_all(&depth.bits_per_sample().to_le_bytes())?;

    out.write_all(b"data")?;
    out.write_all(&data_size.to_le_bytes())?;
    match depth {
        BitDepth::Int16 => {
            for &sample in samples {
                out.write_all(&encode_i16(sample).to_le_bytes())?;
            }
        }
        BitDepth::Int24 => {
            for &sample in samples {
                out.write_all(&encode_i24(sample))?;
            }
        }
        BitDepth::Float32 => {
            for &sample in samples {
                out.write_all(&sample.to_le_bytes())?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn encode_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn encode_i24(sample: f32) -> [u8; 3] {
    const MAX_24: f32 = 8_388_607.0;
    let value = (sample.clamp(-1.0, 1.0) * MAX_24).round() as i32;
    let bytes = value.to_le_bytes();
    [bytes[0], bytes[1], bytes[2]]
}
