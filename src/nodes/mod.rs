//! Built-in audio nodes.
//!
//! Nodes are organized into three categories:
//!
//! ## Sources ([`source`])
//!
//! Generate audio with no audio inputs:
//! - [`NoiseSource`] - Loop a two-channel [`NoiseBuffer`]
//! - [`Oscillator`] - Sine/triangle/square/sawtooth with automatable frequency
//!
//! ## Effects ([`effect`])
//!
//! Process audio (inputs → outputs):
//! - [`Gain`] - Sum inputs and scale by an automatable gain
//! - [`Mixer`] - Sum multiple inputs together
//! - [`BiquadFilter`] - Lowpass/highpass/bandpass/shelf filters
//! - [`StereoPanner`] - Equal-power panning
//! - [`Compressor`] - Dynamics limiting
//!
//! ## Sinks ([`sink`])
//!
//! Consume audio with no audio outputs:
//! - [`CpalSink`] - Output to system audio device (requires `cpal_sink` feature)
//! - [`RtrbSink`] - Write to ring buffer (offline rendering, capture)
//!
//! # Message Types
//!
//! Sources accept `Start`/`Stop` messages carrying context times. Automatable
//! parameters are addressed with [`ParamMessage`](crate::param::ParamMessage)s
//! wrapped in the node's own message enum. Nodes without parameters use `()`.

pub mod source;
pub mod effect;
pub mod sink;

// Re-export common types at the top level for convenience
pub use source::{NoiseBuffer, NoiseMessage, NoiseSource, Oscillator, OscillatorMessage, OscillatorParam};
pub use effect::{
    BiquadFilter, BiquadMessage, BiquadParam, Compressor, CompressorSettings, FilterKind, Gain, GainMessage,
    GainParam, Mixer, PannerMessage, PannerParam, StereoPanner,
};
pub use sink::RtrbSink;

#[cfg(feature = "cpal_sink")]
pub use sink::{CpalSink, SinkMonitor};
