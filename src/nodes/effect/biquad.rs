//! Biquad filter effect.
//!
//! Coefficients follow the Audio EQ Cookbook (Robert Bristow-Johnson), Direct
//! Form II Transposed, computed in f64.
//!
//! Q is the cookbook's linear Q for every response, not a resonance in dB.
//! A lowpass or highpass with Q below 0.707 is already down more than 3 dB at
//! its corner (about 10 dB at Q 0.3).

use std::f64::consts::PI;

use dasp_graph::{Buffer, Input};

use crate::modulation::Modulatable;
use crate::node::{sum_inputs, AudioNode, ProcessContext};
use crate::param::{Param, ParamMessage};

/// Filter response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
    /// Boost/cut below the corner frequency by `gain_db`.
    LowShelf,
    /// Boost/cut above the corner frequency by `gain_db`.
    HighShelf,
}

#[derive(Clone, Copy, Debug)]
pub enum BiquadMessage {
    Frequency(ParamMessage),
    Q(ParamMessage),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BiquadParam {
    Frequency,
    Q,
}

impl Modulatable for BiquadMessage {
    type Target = BiquadParam;

    fn param(target: BiquadParam, msg: ParamMessage) -> Self {
        match target {
            BiquadParam::Frequency => BiquadMessage::Frequency(msg),
            BiquadParam::Q => BiquadMessage::Q(msg),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Coefficients {
    fn compute(kind: FilterKind, frequency: f64, q: f64, gain_db: f64, sample_rate: f64) -> Self {
        let frequency = frequency.clamp(10.0, (sample_rate * 0.499).max(10.0));
        let q = q.max(1e-4);
        let w0 = 2.0 * PI * frequency / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match kind {
            FilterKind::Lowpass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterKind::Highpass => {
                let b0 = (1.0 + cos_w0) / 2.0;
                (b0, -(1.0 + cos_w0), b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterKind::Bandpass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha),
            FilterKind::LowShelf | FilterKind::HighShelf => {
                // Shelf slope S = 1
                let a = 10.0_f64.powf(gain_db / 40.0);
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * (sin_w0 / 2.0) * 2.0_f64.sqrt();
                let (ap1, am1) = (a + 1.0, a - 1.0);

                if kind == FilterKind::LowShelf {
                    (
                        a * (ap1 - am1 * cos_w0 + two_sqrt_a_alpha),
                        2.0 * a * (am1 - ap1 * cos_w0),
                        a * (ap1 - am1 * cos_w0 - two_sqrt_a_alpha),
                        ap1 + am1 * cos_w0 + two_sqrt_a_alpha,
                        -2.0 * (am1 + ap1 * cos_w0),
                        ap1 + am1 * cos_w0 - two_sqrt_a_alpha,
                    )
                } else {
                    (
                        a * (ap1 + am1 * cos_w0 + two_sqrt_a_alpha),
                        -2.0 * a * (am1 + ap1 * cos_w0),
                        a * (ap1 + am1 * cos_w0 - two_sqrt_a_alpha),
                        ap1 - am1 * cos_w0 + two_sqrt_a_alpha,
                        2.0 * (am1 - ap1 * cos_w0),
                        ap1 - am1 * cos_w0 - two_sqrt_a_alpha,
                    )
                }
            }
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// A second-order IIR filter (stereo, one state per channel).
///
/// Frequency and Q are automatable; coefficients are recomputed per sample
/// only while either parameter is moving.
pub struct BiquadFilter {
    kind: FilterKind,
    frequency: Param,
    q: Param,
    gain_db: f64,
    coeffs: Option<Coefficients>,
    z1: [f64; 2],
    z2: [f64; 2],
}

impl BiquadFilter {
    pub fn new(kind: FilterKind, frequency: f64, q: f64) -> Self {
        Self {
            kind,
            frequency: Param::new(frequency).with_range(10.0, 22_050.0),
            q: Param::new(q).with_range(1e-4, 1000.0),
            gain_db: 0.0,
            coeffs: None,
            z1: [0.0; 2],
            z2: [0.0; 2],
        }
    }

    pub fn lowpass(frequency: f64, q: f64) -> Self {
        Self::new(FilterKind::Lowpass, frequency, q)
    }

    pub fn highpass(frequency: f64, q: f64) -> Self {
        Self::new(FilterKind::Highpass, frequency, q)
    }

    pub fn bandpass(frequency: f64, q: f64) -> Self {
        Self::new(FilterKind::Bandpass, frequency, q)
    }

    pub fn low_shelf(frequency: f64, gain_db: f64) -> Self {
        Self::new(FilterKind::LowShelf, frequency, 0.707).with_gain_db(gain_db)
    }

    pub fn high_shelf(frequency: f64, gain_db: f64) -> Self {
        Self::new(FilterKind::HighShelf, frequency, 0.707).with_gain_db(gain_db)
    }

    /// Shelf gain in dB (ignored by the other responses).
    pub fn with_gain_db(mut self, gain_db: f64) -> Self {
        self.gain_db = gain_db;
        self
    }

    #[inline]
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency.value()
    }
}

impl AudioNode for BiquadFilter {
    type Message = BiquadMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = BiquadMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                BiquadMessage::Frequency(p) => self.frequency.handle(p),
                BiquadMessage::Q(p) => self.q.handle(p),
            }
            self.coeffs = None;
        }

        sum_inputs(inputs, outputs);

        let sample_rate = ctx.sample_rate as f64;
        let moving = !(self.frequency.is_static() && self.q.is_static());
        let len = outputs.first().map_or(0, |b| b.len());

        for i in 0..len {
            let c = if moving || self.coeffs.is_none() {
                let t = ctx.time_at(i);
                let c = Coefficients::compute(
                    self.kind,
                    self.frequency.advance(t),
                    self.q.advance(t),
                    self.gain_db,
                    sample_rate,
                );
                self.coeffs = Some(c);
                c
            } else {
                self.coeffs.unwrap_or_default()
            };

            for (ch, buffer) in outputs.iter_mut().enumerate().take(2) {
                let x = buffer[i] as f64;
                let y = c.b0 * x + self.z1[ch];
                self.z1[ch] = c.b1 * x - c.a1 * y + self.z2[ch];
                self.z2[ch] = c.b2 * x - c.a2 * y;
                buffer[i] = y as f32;
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
    use crate::nodes::Oscillator;
    use crate::nodes::OscillatorMessage;
    use crate::testing::{capture, Dc};

    fn settle(filter: BiquadFilter, level: f32) -> f32 {
        let (mut ctx, mut out) = capture(44100);
        let dc = ctx.add(Dc(level));
        let f = ctx.add(filter);
        ctx.connect(dc.id(), f.id());
        ctx.output(f.id());
        ctx.process_for(0.1);
        out.drain_frames().last().map(|f| f[0]).unwrap_or(f32::NAN)
    }

    #[test]
    fn tiny_sample_rates_still_give_finite_coefficients() {
        for kind in [FilterKind::Lowpass, FilterKind::Bandpass, FilterKind::HighShelf] {
            let c = Coefficients::compute(kind, 1000.0, 0.7, 6.0, 16.0);
            assert!([c.b0, c.b1, c.b2, c.a1, c.a2].iter().all(|v| v.is_finite()), "{kind:?}");
        }
    }

    #[test]
    fn lowpass_passes_dc() {
        assert!((settle(BiquadFilter::lowpass(5000.0, 0.707), 1.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn highpass_blocks_dc() {
        assert!(settle(BiquadFilter::highpass(1000.0, 0.707), 1.0).abs() < 1e-3);
    }

    #[test]
    fn low_shelf_boosts_dc_by_gain() {
        // +6 dB ~= x2
        let out = settle(BiquadFilter::low_shelf(1000.0, 6.0), 0.25);
        assert!((out - 0.25 * 10f32.powf(6.0 / 20.0)).abs() < 1e-3, "{out}");
    }

    #[test]
    fn high_shelf_leaves_dc_alone() {
        assert!((settle(BiquadFilter::high_shelf(3000.0, 6.0), 0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let (mut ctx, mut out) = capture(44100);
        let mut osc = ctx.add(Oscillator::sine(10_000.0));
        let f = ctx.add(BiquadFilter::lowpass(200.0, 0.707));
        ctx.connect(osc.id(), f.id());
        ctx.output(f.id());
        osc.post(OscillatorMessage::Start(0.0));
        ctx.process_for(0.1);

        let frames = out.drain_frames();
        let peak = frames[2000..].iter().map(|f| f[0].abs()).fold(0.0f32, f32::max);
        assert!(peak < 0.01, "lowpass@200Hz should attenuate 10kHz, got {peak}");
    }
}
