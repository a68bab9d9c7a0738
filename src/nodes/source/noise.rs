//! Looping noise source.

use std::sync::Arc;

use dasp_graph::{Buffer, Input};
use rand::Rng;

use super::Schedule;
use crate::node::{AudioNode, ProcessContext};

/// A short, two-channel block of uniform white noise meant to be looped.
///
/// Both channels are drawn independently from `[-1, 1]`. Looping a couple of
/// seconds of noise is cheap and sounds continuous, at the cost of a faint
/// periodicity at the loop length.
///
/// Clones share the same samples.
#[derive(Clone, Debug)]
pub struct NoiseBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl NoiseBuffer {
    /// Number of interleaved channels in every noise buffer.
    pub const CHANNELS: usize = 2;

    pub fn generate<R: Rng + ?Sized>(seconds: f64, sample_rate: u32, rng: &mut R) -> Self {
        let frames = ((seconds.max(0.0) * sample_rate as f64) as usize).max(1);
        let samples = (0..frames * Self::CHANNELS)
            .map(|_| rng.gen_range(-1.0f32..=1.0))
            .collect();

        Self { samples, sample_rate }
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / Self::CHANNELS
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of one loop in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Interleaved `L, R, L, R, ...` samples.
    pub fn as_interleaved(&self) -> &[f32] {
        &self.samples
    }
}

/// Messages to control a [`NoiseSource`].
#[derive(Clone, Copy, Debug)]
pub enum NoiseMessage {
    /// Begin looping at the given context time.
    Start(f64),
    /// Fall silent at the given context time.
    Stop(f64),
}

/// Plays a [`NoiseBuffer`] on a loop (stereo source).
///
/// Silent until started; playback begins at the top of the buffer.
pub struct NoiseSource {
    buffer: NoiseBuffer,
    position: usize,
    schedule: Schedule,
}

impl NoiseSource {
    pub fn new(buffer: NoiseBuffer) -> Self {
        Self {
            buffer,
            position: 0,
            schedule: Schedule::default(),
        }
    }

    /// Current read position in frames.
    #[inline]
    pub fn position(&self) -> usize {
        self.position / NoiseBuffer::CHANNELS
    }
}

impl AudioNode for NoiseSource {
    type Message = NoiseMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = NoiseMessage>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                NoiseMessage::Start(at) => self.schedule.start(at),
                NoiseMessage::Stop(at) => self.schedule.stop(at),
            }
        }

        if outputs.is_empty() {
            return;
        }

        let samples = &self.buffer.samples;
        let total = samples.len();
        let buffer_len = outputs[0].len();

        for i in 0..buffer_len {
            if !self.schedule.is_active(ctx.time_at(i)) {
                for buffer in outputs.iter_mut() {
                    buffer[i] = 0.0;
                }
                continue;
            }

            if self.position >= total {
                self.position = 0;
            }

            for (ch, buffer) in outputs.iter_mut().enumerate() {
                buffer[i] = samples[self.position + ch % NoiseBuffer::CHANNELS];
            }

            self.position += NoiseBuffer::CHANNELS;
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 0 }

    #[inline]
    fn num_outputs(&self) -> usize { NoiseBuffer::CHANNELS }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ctx(frame: u64) -> ProcessContext {
        ProcessContext { sample_rate: 1000, buffer_size: 64, frame }
    }

    #[test]
    fn buffer_is_stereo_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let buf = NoiseBuffer::generate(2.0, 44100, &mut rng);

        assert_eq!(buf.frames(), 88200);
        assert!(buf.as_interleaved().iter().all(|s| (-1.0..=1.0).contains(s)));
        // channels are drawn independently
        let (l, r) = (buf.as_interleaved()[0], buf.as_interleaved()[1]);
        assert_ne!(l, r);
    }

    #[test]
    fn clones_share_samples() {
        let buf = NoiseBuffer::generate(0.1, 44100, &mut StdRng::seed_from_u64(2));
        let source = NoiseSource::new(buf.clone());
        assert!(std::ptr::eq(buf.as_interleaved(), source.buffer.as_interleaved()));
    }

    #[test]
    fn silent_until_started_then_loops() {
        let mut rng = StdRng::seed_from_u64(1);
        let buf = NoiseBuffer::generate(0.05, 1000, &mut rng); // 50 frames
        let first = buf.as_interleaved()[0];
        let mut src = NoiseSource::new(buf);
        let mut out = [Buffer::default(), Buffer::default()];

        src.process(&ctx(0), std::iter::empty(), &[], &mut out);
        assert!(out[0].iter().all(|s| *s == 0.0));

        src.process(&ctx(64), std::iter::once(NoiseMessage::Start(0.064)), &[], &mut out);
        assert_eq!(out[0][0], first);
        // 64 frames from a 50 frame loop wraps back to the top
        assert_eq!(out[0][50], first);
        assert_eq!(src.position(), 14);
    }
}
