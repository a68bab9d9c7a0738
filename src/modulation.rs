//! Low-frequency oscillators and their attachment to node parameters.

use serde::{Deserialize, Serialize};

use crate::context::Handle;
use crate::node::NodeId;
use crate::param::ParamMessage;

/// Periodic waveform shape shared by LFOs and audible oscillators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    /// Sample the waveform at `phase` in cycles; output spans `[-1, 1]`.
    #[inline]
    pub fn sample(self, phase: f64) -> f64 {
        let p = phase - phase.floor();
        match self {
            Waveform::Sine => (p * std::f64::consts::TAU).sin(),
            Waveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
        }
    }
}

/// A low-frequency oscillator summed into a parameter.
///
/// The output is `offset + depth * waveform(frequency * t)` where `t` is the
/// absolute context time. Phase is derived from the clock rather than
/// accumulated, so two LFOs with the same settings stay sample-locked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lfo {
    pub waveform: Waveform,
    pub frequency: f64,
    pub depth: f64,
    pub offset: f64,
}

impl Lfo {
    pub fn new(waveform: Waveform, frequency: f64, depth: f64) -> Self {
        Self {
            waveform,
            frequency,
            depth,
            offset: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    pub fn value_at(&self, t: f64) -> f64 {
        self.offset + self.depth * self.waveform.sample(self.frequency * t)
    }
}

/// Node messages that can address one of the node's parameters.
pub trait Modulatable: Send + Sized + 'static {
    /// Which parameter of the node a message is for.
    type Target: Copy + std::fmt::Debug;

    fn param(target: Self::Target, msg: ParamMessage) -> Self;
}

/// Record of an LFO attached to a node parameter, kept by the owning recipe.
#[derive(Clone, Debug)]
pub struct LfoDescriptor {
    pub node: NodeId,
    pub target: String,
    pub lfo: Lfo,
}

/// Attach `lfo` to the `target` parameter of the node behind `handle`.
pub fn attach_lfo<M: Modulatable>(handle: &mut Handle<M>, target: M::Target, lfo: Lfo) -> LfoDescriptor {
    tracing::trace!(node = ?handle.id(), ?target, ?lfo, "attaching lfo");
    handle.post(M::param(target, ParamMessage::Modulate(lfo)));

    LfoDescriptor {
        node: handle.id(),
        target: format!("{target:?}"),
        lfo,
    }
}
