/// Interleaved `f32` audio buffer with a fixed channel count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBuffer {
    channels: u16,
    samples: Vec<f32>,
}

impl FrameBuffer {
    /// Zeroed buffer of `frames` frames.
    pub fn new(channels: u16, frames: usize) -> Self {
        Self {
            channels,
            samples: vec![0.0; frames * channels.max(1) as usize],
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Resize to `frames` frames and zero every sample.
    pub fn reset(&mut self, frames: usize) {
        self.samples.clear();
        self.samples.resize(frames * self.channels.max(1) as usize, 0.0);
    }

    pub fn sample(&self, frame: usize, channel: u16) -> f32 {
        self.samples[frame * self.channels as usize + channel as usize]
    }

    pub fn sample_mut(&mut self, frame: usize, channel: u16) -> &mut f32 {
        &mut self.samples[frame * self.channels as usize + channel as usize]
    }

    /// Multiply every channel of `frames` frames starting at `start` by
    /// `gain`.
    pub fn scale_region(&mut self, start: usize, frames: usize, gain: f32) {
        let ch = self.channels as usize;
        for sample in &mut self.samples[start * ch..(start + frames) * ch] {
            *sample *= gain;
        }
    }

    /// Sum `other` into this buffer channel-wise, up to the smaller
    /// channel count and frame count of the two.
    pub fn add_from(&mut self, other: &FrameBuffer) {
        let channels = self.channels.min(other.channels);
        let frames = self.frames().min(other.frames());
        for frame in 0..frames {
            for channel in 0..channels {
                *self.sample_mut(frame, channel) += other.sample(frame, channel);
            }
        }
    }

    /// Copy all of `other` into this buffer starting at `dst_frame`.
    ///
    /// Both buffers must have the same channel count and `other` must fit.
    pub fn copy_from(&mut self, dst_frame: usize, other: &FrameBuffer) {
        debug_assert_eq!(self.channels, other.channels);
        let ch = self.channels as usize;
        let dst = dst_frame * ch;
        self.samples[dst..dst + other.samples.len()].copy_from_slice(&other.samples);
    }
}
