//! Noise buffers and spectral coloring.
//!
//! Colors are approximations built from at most two biquads, not exact
//! 1/f slopes:
//!
//! | color | chain |
//! |-------|-------|
//! | white | passthrough |
//! | pink  | low shelf +6 dB @ 1 kHz, lowpass 8 kHz (Q 0.3) |
//! | brown | lowpass 1.2 kHz (Q 0.5), lowpass 600 Hz (Q 0.7) |
//! | blue  | high shelf +6 dB @ 3 kHz |

use rand::Rng;

use crate::context::AudioContext;
use crate::node::NodeId;
use crate::nodes::{BiquadFilter, NoiseBuffer};
use crate::sound::NoiseColor;

/// Fill a looping two-channel buffer with uniform white noise.
pub fn make_noise_buffer<R: Rng + ?Sized>(seconds: f64, sample_rate: u32, rng: &mut R) -> NoiseBuffer {
    NoiseBuffer::generate(seconds, sample_rate, rng)
}

fn filters_for(color: NoiseColor) -> Vec<BiquadFilter> {
    match color {
        NoiseColor::White => Vec::new(),
        NoiseColor::Pink => vec![
            BiquadFilter::low_shelf(1000.0, 6.0),
            BiquadFilter::lowpass(8000.0, 0.3),
        ],
        NoiseColor::Brown => vec![
            BiquadFilter::lowpass(1200.0, 0.5),
            BiquadFilter::lowpass(600.0, 0.7),
        ],
        NoiseColor::Blue => vec![BiquadFilter::high_shelf(3000.0, 6.0)],
    }
}

/// Insert the filter chain for `color` after `input`.
///
/// Every node created is pushed onto `created` so the caller can tear it down
/// later. Returns the node to connect downstream, which is `input` itself for
/// white noise.
pub fn colorize(ctx: &mut AudioContext, input: NodeId, color: NoiseColor, created: &mut Vec<NodeId>) -> NodeId {
    let mut tail = input;
    for filter in filters_for(color) {
        let id = ctx.add(filter).id();
        ctx.connect(tail, id);
        created.push(id);
        tail = id;
    }
    tail
}
