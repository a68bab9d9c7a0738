//! Equal-power stereo panner

use std::f64::consts::FRAC_PI_2;

use dasp_graph::{Buffer, Input};

use crate::modulation::Modulatable;
use crate::node::{AudioNode, ProcessContext};
use crate::param::{Param, ParamMessage};

#[derive(Clone, Copy, Debug)]
pub enum PannerMessage {
    Pan(ParamMessage),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PannerParam {
    Pan,
}

impl Modulatable for PannerMessage {
    type Target = PannerParam;

    fn param(_target: PannerParam, msg: ParamMessage) -> Self {
        PannerMessage::Pan(msg)
    }
}

/// Places a mono or stereo signal in the stereo field.
///
/// `pan` runs from -1 (hard left) to 1 (hard right). Mono input is split with
/// equal-power gains; stereo input has the far channel folded into the near one.
pub struct StereoPanner {
    pan: Param,
}

impl StereoPanner {
    pub fn new(pan: f64) -> Self {
        Self {
            pan: Param::new(pan).with_range(-1.0, 1.0),
        }
    }

    #[inline]
    pub fn pan(&self) -> f64 {
        self.pan.value()
    }
}

impl AudioNode for StereoPanner {
    type Message = PannerMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = PannerMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                PannerMessage::Pan(p) => self.pan.handle(p),
            }
        }

        let (left, right) = match outputs {
            [l, r, ..] => (l, r),
            _ => return,
        };

        let silent = Buffer::default();
        let (in_l, in_r, mono) = match inputs.first().map(|i| i.buffers()) {
            Some([m]) => (m, m, true),
            Some([l, r, ..]) => (l, r, false),
            _ => (&silent, &silent, true),
        };

        for i in 0..left.len() {
            let pan = self.pan.advance(ctx.time_at(i));
            let (l, r) = (in_l[i] as f64, in_r[i] as f64);

            let (out_l, out_r) = if mono {
                let x = (pan + 1.0) / 2.0;
                (l * (x * FRAC_PI_2).cos(), l * (x * FRAC_PI_2).sin())
            } else if pan <= 0.0 {
                let x = pan + 1.0;
                (l + r * (x * FRAC_PI_2).cos(), r * (x * FRAC_PI_2).sin())
            } else {
                let x = pan;
                (l * (x * FRAC_PI_2).cos(), r + l * (x * FRAC_PI_2).sin())
            };

            left[i] = out_l as f32;
            right[i] = out_r as f32;
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 2 }
}
