//! Mixer effect - sums multiple inputs together

use dasp_graph::{Buffer, Input};

use crate::node::{sum_inputs, AudioNode, ProcessContext};

/// A mixer that sums any number of inputs at unity gain
///
/// The output has `channels` channels. Mono inputs are upmixed (copied to
/// every channel); extra input channels are ignored.
pub struct Mixer {
    channels: usize,
}

impl Mixer {
    /// Create a new mixer with the specified number of output channels
    pub fn new(channels: usize) -> Self {
        Self { channels: channels.clamp(1, 2) }
    }

    pub fn stereo() -> Self {
        Self::new(2)
    }

    pub fn mono() -> Self {
        Self::new(1)
    }
}

impl AudioNode for Mixer {
    type Message = ();

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = Self::Message>,
        inputs: &[Input],
        output: &mut [Buffer],
    ) {
        sum_inputs(inputs, output);
    }

    fn num_inputs(&self) -> usize {
        usize::MAX
    }

    fn num_outputs(&self) -> usize {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{capture, Dc};

    #[test]
    fn sums_all_inputs() {
        let (mut ctx, mut out) = capture(48000);
        let a = ctx.add(Dc(0.25));
        let b = ctx.add(Dc(0.5));
        let mix = ctx.add(Mixer::stereo());
        ctx.connect(a.id(), mix.id());
        ctx.connect(b.id(), mix.id());
        ctx.output(mix.id());

        ctx.process();
        assert!(out.drain_frames().iter().all(|f| *f == [0.75, 0.75]));
    }
}
