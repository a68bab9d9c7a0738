//! Automatable node parameters.
//!
//! A [`Param`] lives inside the node it controls. The control thread never
//! touches it directly: it sends [`ParamMessage`]s through the node's handle and
//! the node applies them at the start of the next block. Automation events carry
//! absolute context times, so ramps land on the exact sample they were scheduled
//! for regardless of when the block boundary falls.

use crate::modulation::Lfo;

/// A scheduled change to a parameter's intrinsic value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Automation {
    /// Jump to `value` at `time`.
    SetValueAt { value: f64, time: f64 },
    /// Ramp linearly from whatever the value is at `start` to `value` at `end`.
    RampTo { value: f64, start: f64, end: f64 },
    /// Drop all pending events and hold the current value.
    Cancel,
}

impl Automation {
    fn start(&self) -> f64 {
        match *self {
            Automation::SetValueAt { time, .. } => time,
            Automation::RampTo { start, .. } => start,
            Automation::Cancel => f64::NEG_INFINITY,
        }
    }
}

/// Messages understood by every [`Param`].
#[derive(Clone, Copy, Debug)]
pub enum ParamMessage {
    /// Set the intrinsic value immediately (also cancels automation).
    Set(f64),
    Automate(Automation),
    /// Sum an LFO into the parameter.
    Modulate(Lfo),
    /// Detach every LFO.
    ClearModulation,
}

#[derive(Clone, Copy, Debug)]
struct Ramp {
    from: f64,
    to: f64,
    start: f64,
    end: f64,
}

/// Upper bound on attached LFOs; keeps the audio thread allocation-free.
const MAX_MODULATORS: usize = 4;

/// A node parameter: intrinsic value + automation + summed LFOs.
#[derive(Clone, Debug)]
pub struct Param {
    value: f64,
    min: f64,
    max: f64,
    events: Vec<Automation>,
    ramp: Option<Ramp>,
    lfos: Vec<Lfo>,
}

impl Param {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            events: Vec::with_capacity(8),
            ramp: None,
            lfos: Vec::with_capacity(MAX_MODULATORS),
        }
    }

    /// Clamp the effective (automated + modulated) value into `[min, max]`.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// The intrinsic value as of the last processed sample.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn modulators(&self) -> &[Lfo] {
        &self.lfos
    }

    /// True when the value cannot change until a new message arrives.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.events.is_empty() && self.ramp.is_none() && self.lfos.is_empty()
    }

    pub fn handle(&mut self, msg: ParamMessage) {
        match msg {
            ParamMessage::Set(v) => {
                self.events.clear();
                self.ramp = None;
                self.value = v;
            }
            ParamMessage::Automate(Automation::Cancel) => {
                self.events.clear();
                self.ramp = None;
            }
            ParamMessage::Automate(event) => {
                if self.events.len() == self.events.capacity() {
                    tracing::warn!("automation queue full, dropping event");
                    return;
                }
                let at = self.events.partition_point(|e| e.start() <= event.start());
                self.events.insert(at, event);
            }
            ParamMessage::Modulate(lfo) => {
                if self.lfos.len() < MAX_MODULATORS {
                    self.lfos.push(lfo);
                } else {
                    tracing::warn!("too many modulators on one parameter, dropping LFO");
                }
            }
            ParamMessage::ClearModulation => self.lfos.clear(),
        }
    }

    /// Effective value at time `t`; call once per sample with increasing `t`.
    pub fn advance(&mut self, t: f64) -> f64 {
        while let Some(event) = self.events.first().copied() {
            if event.start() > t {
                break;
            }
            self.events.remove(0);
            match event {
                Automation::SetValueAt { value, .. } => {
                    self.ramp = None;
                    self.value = value;
                }
                Automation::RampTo { value, start, end } => {
                    self.ramp = Some(Ramp { from: self.value, to: value, start, end });
                }
                Automation::Cancel => {}
            }
        }

        if let Some(ramp) = self.ramp {
            let span = ramp.end - ramp.start;
            if t >= ramp.end || span <= 0.0 {
                self.value = ramp.to;
                self.ramp = None;
            } else {
                let k = ((t - ramp.start) / span).clamp(0.0, 1.0);
                self.value = ramp.from + (ramp.to - ramp.from) * k;
            }
        }

        let modulation: f64 = self.lfos.iter().map(|lfo| lfo.value_at(t)).sum();
        (self.value + modulation).clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulation::Waveform;

    #[test]
    fn ramp_starts_from_held_value() {
        let mut p = Param::new(0.2);
        p.handle(ParamMessage::Automate(Automation::RampTo { value: 1.0, start: 1.0, end: 2.0 }));

        assert_eq!(p.advance(0.5), 0.2);
        assert!((p.advance(1.5) - 0.6).abs() < 1e-9);
        assert_eq!(p.advance(2.0), 1.0);
        assert!(p.is_static());
    }

    #[test]
    fn cancel_holds_mid_ramp() {
        let mut p = Param::new(0.0);
        p.handle(ParamMessage::Automate(Automation::RampTo { value: 1.0, start: 0.0, end: 1.0 }));
        let mid = p.advance(0.25);
        p.handle(ParamMessage::Automate(Automation::Cancel));
        assert_eq!(p.advance(0.9), mid);
    }

    #[test]
    fn lfo_is_summed_and_clamped() {
        let mut p = Param::new(100.0).with_range(10.0, 1000.0);
        p.handle(ParamMessage::Modulate(Lfo::new(Waveform::Square, 1.0, 2000.0)));
        assert_eq!(p.advance(0.1), 1000.0);
        assert_eq!(p.advance(0.6), 10.0);
    }
}
