//! Periodic oscillator

use dasp_graph::{Buffer, Input};

use super::Schedule;
use crate::modulation::{Modulatable, Waveform};
use crate::node::{AudioNode, ProcessContext};
use crate::param::{Param, ParamMessage};

/// Messages to control an [`Oscillator`]
#[derive(Clone, Copy, Debug)]
pub enum OscillatorMessage {
    Start(f64),
    Stop(f64),
    Frequency(ParamMessage),
    SetAmplitude(f32),
}

/// Parameters of an [`Oscillator`] that accept automation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OscillatorParam {
    Frequency,
}

impl Modulatable for OscillatorMessage {
    type Target = OscillatorParam;

    fn param(target: OscillatorParam, msg: ParamMessage) -> Self {
        match target {
            OscillatorParam::Frequency => OscillatorMessage::Frequency(msg),
        }
    }
}

/// A band-unlimited oscillator (mono source)
///
/// Silent until started. Phase is accumulated per sample from the (possibly
/// modulated) frequency, so vibrato bends pitch without phase jumps.
pub struct Oscillator {
    waveform: Waveform,
    frequency: Param,
    amplitude: f32,
    phase: f64,
    schedule: Schedule,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f64) -> Self {
        Self {
            waveform,
            frequency: Param::new(frequency).with_range(0.0, 24_000.0),
            amplitude: 1.0,
            phase: 0.0,
            schedule: Schedule::default(),
        }
    }

    pub fn sine(frequency: f64) -> Self {
        Self::new(Waveform::Sine, frequency)
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency.value()
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}

impl AudioNode for Oscillator {
    type Message = OscillatorMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = OscillatorMessage>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                OscillatorMessage::Start(at) => self.schedule.start(at),
                OscillatorMessage::Stop(at) => self.schedule.stop(at),
                OscillatorMessage::Frequency(p) => self.frequency.handle(p),
                OscillatorMessage::SetAmplitude(a) => self.amplitude = a.clamp(0.0, 1.0),
            }
        }

        if outputs.is_empty() {
            return;
        }

        let period = ctx.sample_period();
        let buffer_len = outputs[0].len();
        let (first, rest) = outputs.split_at_mut(1);
        let first = &mut first[0];

        for i in 0..buffer_len {
            let t = ctx.time_at(i);
            let freq = self.frequency.advance(t);

            if !self.schedule.is_active(t) {
                first[i] = 0.0;
                continue;
            }

            first[i] = self.waveform.sample(self.phase) as f32 * self.amplitude;
            self.phase += freq * period;
            self.phase -= self.phase.floor();
        }

        // Copy to remaining output channels (if any)
        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(first);
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 0 }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_starts_at_zero_crossing_and_stops() {
        let ctx = ProcessContext { sample_rate: 48000, buffer_size: 64, frame: 0 };
        let mut osc = Oscillator::sine(1000.0);
        let mut out = [Buffer::default()];

        let msgs = [OscillatorMessage::Start(0.0), OscillatorMessage::Stop(32.0 / 48000.0)];
        osc.process(&ctx, msgs.into_iter(), &[], &mut out);

        assert_eq!(out[0][0], 0.0);
        assert!(out[0][6] > 0.5);
        assert!(out[0][32..].iter().all(|s| *s == 0.0));
    }
}
