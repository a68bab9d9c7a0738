//! Dynamics compressor.
//!
//! Feed-forward peak compressor with threshold, ratio, knee, attack and
//! release. Both channels share one envelope so the stereo image stays put.

use dasp_graph::{Buffer, Input};

use crate::node::{sum_inputs, AudioNode, ProcessContext};

/// Compressor settings. Times are in seconds, levels in dB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressorSettings {
    pub threshold: f64,
    pub ratio: f64,
    /// Knee width (0 = hard knee).
    pub knee: f64,
    pub attack: f64,
    pub release: f64,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold: -24.0,
            ratio: 4.0,
            knee: 6.0,
            attack: 0.003,
            release: 0.25,
        }
    }
}

pub struct Compressor {
    settings: CompressorSettings,
    envelope: f64,
}

impl Compressor {
    pub fn new(settings: CompressorSettings) -> Self {
        let settings = CompressorSettings {
            threshold: settings.threshold.clamp(-100.0, 0.0),
            ratio: settings.ratio.clamp(1.0, 20.0),
            knee: settings.knee.clamp(0.0, 40.0),
            attack: settings.attack.clamp(1e-4, 1.0),
            release: settings.release.clamp(1e-3, 5.0),
        };
        Self { settings, envelope: 0.0 }
    }

    pub fn settings(&self) -> CompressorSettings {
        self.settings
    }

    #[inline]
    fn linear_to_db(linear: f64) -> f64 {
        if linear <= 0.0 {
            -120.0
        } else {
            20.0 * linear.log10()
        }
    }

    /// Gain change in dB (<= 0) for an envelope level in dB.
    fn gain_reduction(&self, level_db: f64) -> f64 {
        let CompressorSettings { threshold, ratio, knee, .. } = self.settings;
        let slope = 1.0 - 1.0 / ratio;

        if knee <= 0.0 {
            return if level_db <= threshold { 0.0 } else { (threshold - level_db) * slope };
        }

        let half_knee = knee / 2.0;
        if level_db <= threshold - half_knee {
            0.0
        } else if level_db >= threshold + half_knee {
            (threshold - level_db) * slope
        } else {
            let x = level_db - (threshold - half_knee);
            -slope * x * x / (2.0 * knee)
        }
    }
}

impl AudioNode for Compressor {
    type Message = ();

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        sum_inputs(inputs, outputs);

        let sample_rate = ctx.sample_rate as f64;
        let attack_coef = (-1.0 / (self.settings.attack * sample_rate)).exp();
        let release_coef = (-1.0 / (self.settings.release * sample_rate)).exp();
        let len = outputs.first().map_or(0, |b| b.len());

        for i in 0..len {
            let level = outputs.iter().map(|b| b[i].abs() as f64).fold(0.0, f64::max);
            let coef = if level > self.envelope { attack_coef } else { release_coef };
            self.envelope = coef * self.envelope + (1.0 - coef) * level;

            let gain_db = self.gain_reduction(Self::linear_to_db(self.envelope));
            let gain = 10.0_f64.powf(gain_db / 20.0) as f32;

            for buffer in outputs.iter_mut() {
                buffer[i] *= gain;
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 2 }
}
