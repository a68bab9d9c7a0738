//! Ring buffer sink for offline capture and custom processing

use dasp_graph::{Buffer, Input};
use rtrb::Producer;

use crate::node::{sum_inputs, AudioNode, ProcessContext};

/// A sink that pushes interleaved audio into an rtrb ring buffer
///
/// The offline renderer drains the other end after every block. Blocks that
/// do not fit are skipped whole rather than partially written, so a reader
/// always sees complete frames.
pub struct RtrbSink {
    producer: Producer<f32>,
    channels: usize,
}

impl RtrbSink {
    /// Create a sink that writes interleaved samples to the given producer
    pub fn new(producer: Producer<f32>, channels: usize) -> Self {
        Self {
            producer,
            channels: channels.max(1),
        }
    }

    /// Create a sink for stereo audio
    pub fn stereo(producer: Producer<f32>) -> Self {
        Self::new(producer, 2)
    }

    /// Returns how many sample slots are available
    #[inline]
    pub fn available(&self) -> usize {
        self.producer.slots()
    }
}

impl AudioNode for RtrbSink {
    type Message = (); // No control messages

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        _outputs: &mut [Buffer],
    ) {
        let buffer_len = Buffer::LEN;
        let samples_needed = buffer_len * self.channels;

        if self.producer.slots() < samples_needed {
            tracing::trace!("capture buffer full, skipping block");
            return;
        }

        // Sum every connected input so an unconnected sink still yields silence
        let mut mixed = [Buffer::SILENT; 2];
        sum_inputs(inputs, &mut mixed);

        // Interleave channels
        for i in 0..buffer_len {
            for ch in 0..self.channels {
                let _ = self.producer.push(mixed[ch.min(1)][i]);
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 0 }
}
