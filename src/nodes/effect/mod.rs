mod biquad;
mod compressor;
mod gain;
mod mixer;
mod panner;

pub use biquad::*;
pub use compressor::*;
pub use gain::*;
pub use mixer::*;
pub use panner::*;
