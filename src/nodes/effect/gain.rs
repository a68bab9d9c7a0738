//! Gain/volume control effect

use dasp_graph::{Buffer, Input};

use crate::modulation::Modulatable;
use crate::node::{sum_inputs, AudioNode, ProcessContext};
use crate::param::{Param, ParamMessage};

/// Messages to control gain
#[derive(Clone, Copy, Debug)]
pub enum GainMessage {
    /// Set or automate the gain multiplier (1.0 = unity, 0.0 = silence)
    Gain(ParamMessage),
}

impl GainMessage {
    pub fn set(gain: f64) -> Self {
        GainMessage::Gain(ParamMessage::Set(gain))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GainParam {
    Gain,
}

impl Modulatable for GainMessage {
    type Target = GainParam;

    fn param(_target: GainParam, msg: ParamMessage) -> Self {
        GainMessage::Gain(msg)
    }
}

/// Sums its inputs and scales them by an automatable gain (stereo out)
///
/// Mono inputs are copied to both channels. The gain is evaluated per sample,
/// so scheduled fades and amplitude modulation are click-free.
pub struct Gain {
    gain: Param,
    scratch: [f32; 64],
}

impl Gain {
    /// Create a new gain node with the specified gain value
    pub fn new(gain: f64) -> Self {
        Self {
            gain: Param::new(gain).with_range(0.0, f64::INFINITY),
            scratch: [0.0; 64],
        }
    }

    #[inline]
    pub fn gain(&self) -> f64 {
        self.gain.value()
    }
}

impl AudioNode for Gain {
    type Message = GainMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = GainMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                GainMessage::Gain(p) => self.gain.handle(p),
            }
        }

        sum_inputs(inputs, outputs);

        let len = outputs.first().map_or(0, |b| b.len()).min(self.scratch.len());
        for (i, g) in self.scratch[..len].iter_mut().enumerate() {
            *g = self.gain.advance(ctx.time_at(i)) as f32;
        }

        for buffer in outputs.iter_mut() {
            for (sample, g) in buffer.iter_mut().zip(self.scratch[..len].iter()) {
                *sample *= *g;
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 2 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Automation;
    use crate::testing::{capture, Dc};

    #[test]
    fn ramps_inside_a_block() {
        let (mut ctx, mut out) = capture(64);
        let dc = ctx.add(Dc(1.0));
        let mut gain = ctx.add(Gain::new(0.0));
        ctx.connect(dc.id(), gain.id());
        ctx.output(gain.id());

        gain.post(GainMessage::Gain(ParamMessage::Automate(Automation::RampTo { value: 1.0, start: 0.0, end: 0.5 })));
        ctx.process();

        let frames = out.drain_frames();
        assert_eq!(frames[0], [0.0, 0.0]);
        assert!((frames[16][0] - 0.5).abs() < 1e-6);
        assert_eq!(frames[63], [1.0, 1.0]);
    }
}
