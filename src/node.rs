//! Core node trait and context types.

use dasp_graph::{Buffer, Input};

/// Number of frames processed per graph block.
pub const BLOCK_SIZE: usize = 64;

/// Information available during audio processing.
///
/// Passed to every [`AudioNode::process`] call. Contains the graph's sample rate,
/// the buffer size (always [`BLOCK_SIZE`]) and the absolute frame index of the
/// first sample in the block, so nodes can evaluate scheduled automation at
/// sample accuracy.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the graph in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of samples per buffer
    pub buffer_size: usize,
    /// Frame index of the first sample in this block
    pub frame: u64,
}

impl ProcessContext {
    /// Time in seconds of the `offset`-th sample of this block.
    #[inline]
    pub fn time_at(&self, offset: usize) -> f64 {
        (self.frame + offset as u64) as f64 / self.sample_rate as f64
    }

    /// Duration of one sample in seconds.
    #[inline]
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }
}

/// Unique identifier for a node within a graph.
///
/// Ids are never reused, so a stale id simply stops resolving once its node
/// has been removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

/// The core trait for audio processing nodes.
///
/// Nodes can be:
/// - **Sources**: Generate audio (0 inputs, 1+ outputs) - noise, oscillators
/// - **Effects**: Process audio (1+ inputs, 1+ outputs) - gain, filters, panners
/// - **Sinks**: Consume audio (1+ inputs, 0 outputs) - device outputs, capture buffers
///
/// # Message-Based Parameters
///
/// Instead of shared mutable state, nodes receive parameter updates via messages.
/// Define your message type and handle it at the start of `process()`:
///
/// ```
/// use soundscape::{AudioNode, ProcessContext};
/// use dasp_graph::{Buffer, Input};
///
/// enum ToneMessage {
///     SetFrequency(f32),
/// }
///
/// struct Tone {
///     frequency: f32,
///     phase: f32,
/// }
///
/// impl AudioNode for Tone {
///     type Message = ToneMessage;
///
///     fn process(
///         &mut self,
///         ctx: &ProcessContext,
///         messages: impl Iterator<Item = ToneMessage>,
///         _inputs: &[Input],
///         outputs: &mut [Buffer],
///     ) {
///         for msg in messages {
///             match msg {
///                 ToneMessage::SetFrequency(f) => self.frequency = f,
///             }
///         }
///
///         for sample in outputs[0].iter_mut() {
///             *sample = (self.phase * std::f32::consts::TAU).sin();
///             self.phase = (self.phase + self.frequency / ctx.sample_rate as f32) % 1.0;
///         }
///     }
/// }
/// ```
pub trait AudioNode: Send + 'static {
    /// Message type for parameter updates.
    ///
    /// Use a custom enum for nodes with parameters, or `()` for nodes without.
    type Message: Send + 'static;

    /// Process one block of audio.
    ///
    /// Called once per audio block. Your implementation should:
    /// 1. Drain and handle all pending messages
    /// 2. Read from `inputs` (if any)
    /// 3. Write to every buffer in `outputs`
    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = Self::Message>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    );

    /// Number of audio input channels (0 for sources).
    fn num_inputs(&self) -> usize { 0 }

    /// Number of audio output channels.
    fn num_outputs(&self) -> usize { 1 }
}

/// Sum every connected input into `out`, channel by channel.
///
/// Mono inputs are copied to every output channel; inputs with more channels
/// than `out` has buffers drop the extras.
pub(crate) fn sum_inputs(inputs: &[Input], out: &mut [Buffer]) {
    for buf in out.iter_mut() {
        buf.iter_mut().for_each(|s| *s = 0.0);
    }

    for input in inputs {
        let buffers = input.buffers();
        if buffers.is_empty() {
            continue;
        }

        for (ch, out_buf) in out.iter_mut().enumerate() {
            let in_buf = &buffers[ch.min(buffers.len() - 1)];
            for (o, i) in out_buf.iter_mut().zip(in_buf.iter()) {
                *o += *i;
            }
        }
    }
}
