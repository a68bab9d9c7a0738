//! Helpers shared by unit tests.

use dasp_graph::{Buffer, Input};
use rtrb::{Consumer, RingBuffer};

use crate::context::AudioContext;
use crate::node::{AudioNode, ProcessContext};
use crate::nodes::RtrbSink;

/// Constant-value source.
pub(crate) struct Dc(pub f32);

impl AudioNode for Dc {
    type Message = ();

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for buf in outputs.iter_mut() {
            buf.iter_mut().for_each(|s| *s = self.0);
        }
    }
}

/// Stereo samples captured from a context's output.
pub(crate) struct Captured(Consumer<f32>);

impl Captured {
    pub fn drain_frames(&mut self) -> Vec<[f32; 2]> {
        let mut frames = Vec::new();
        while self.0.slots() >= 2 {
            let l = self.0.pop().unwrap();
            let r = self.0.pop().unwrap();
            frames.push([l, r]);
        }
        frames
    }
}

/// A stereo context whose output is captured into a ring buffer.
pub(crate) fn capture(sample_rate: u32) -> (AudioContext, Captured) {
    let (producer, consumer) = RingBuffer::new(1 << 16);
    let ctx = AudioContext::new(sample_rate).with_output(RtrbSink::stereo(producer));
    (ctx, Captured(consumer))
}

/// DFT magnitude of one channel at `hz`; a full-scale sine reads 0.5.
pub(crate) fn magnitude_at(frames: &[[f32; 2]], ch: usize, hz: f64, sample_rate: u32) -> f64 {
    let (mut re, mut im) = (0.0, 0.0);
    for (n, frame) in frames.iter().enumerate() {
        let phase = std::f64::consts::TAU * hz * n as f64 / sample_rate as f64;
        re += frame[ch] as f64 * phase.cos();
        im -= frame[ch] as f64 * phase.sin();
    }
    (re * re + im * im).sqrt() / frames.len() as f64
}

/// Signal power of one channel between `low` and `high` Hz.
pub(crate) fn band_power(frames: &[[f32; 2]], ch: usize, low: f64, high: f64, sample_rate: u32) -> f64 {
    let bin = sample_rate as f64 / frames.len() as f64;
    let first = (low / bin).ceil() as usize;
    let last = (high / bin).floor() as usize;
    (first..=last)
        .map(|k| 2.0 * magnitude_at(frames, ch, k as f64 * bin, sample_rate).powi(2))
        .sum()
}
