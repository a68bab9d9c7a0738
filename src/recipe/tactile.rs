use super::{RecipeBuilder, RecipeKind};
use crate::node::NodeId;
use crate::nodes::{BiquadFilter, Compressor, CompressorSettings, Gain, Mixer, Oscillator};
use crate::sound::{NoiseColor, TactileParams, TactilePattern};

const NOISE_BED_GAIN: f64 = 0.06;

/// Hard limiting so the low tone hits evenly on small speakers.
const LIMITER: CompressorSettings = CompressorSettings {
    threshold: -12.0,
    ratio: 12.0,
    knee: 0.0,
    attack: 0.003,
    release: 0.25,
};

impl RecipeKind for TactileParams {
    fn build(&self, b: &mut RecipeBuilder<'_>, destination: NodeId) {
        if self.pattern != TactilePattern::Steady {
            // Only the steady envelope is defined; the others play as steady.
            tracing::warn!(pattern = self.pattern.name(), "tactile pattern not implemented, playing steady");
        }

        let mix = b.add(Mixer::stereo()).id();

        let osc = b.oscillator(Oscillator::sine(self.base));
        let lowpass = b.add(BiquadFilter::lowpass(250.0, 0.2)).id();
        let limiter = b.add(Compressor::new(LIMITER)).id();
        b.connect(osc.id(), lowpass);
        b.connect(lowpass, limiter);
        b.connect(limiter, mix);
        b.keep_source(osc);

        let noise = b.noise_source();
        let colored = b.colorize(noise, NoiseColor::Pink);
        let bed = b.add(Gain::new(NOISE_BED_GAIN)).id();
        b.connect(colored, bed);
        b.connect(bed, mix);

        b.connect(mix, destination);
    }

    fn label(&self) -> String {
        match self.pattern {
            TactilePattern::Steady => format!("Tactile {:.0} Hz steady", self.base),
            other => format!("Tactile {:.0} Hz {} (as steady)", self.base, other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NoiseBuffer;
    use crate::recipe::build;
    use crate::sound::SoundSpec;
    use crate::testing::{band_power, capture, magnitude_at};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SAMPLE_RATE: u32 = 44100;
    /// 0.3 s; whole cycles of every frequency probed below.
    const WINDOW: usize = 13_230;

    /// Settled output of a steady tactile recipe.
    fn settled(base: f64) -> Vec<[f32; 2]> {
        let (mut ctx, mut out) = capture(SAMPLE_RATE);
        let bus = ctx.add(Gain::new(1.0)).id();
        ctx.output(bus);
        let noise = NoiseBuffer::generate(1.0, SAMPLE_RATE, &mut StdRng::seed_from_u64(11));
        let params = TactileParams { base, ..Default::default() };
        let mut recipe = build(&mut ctx, &SoundSpec::tactile(params), &noise, bus);
        recipe.start(0.0);

        ctx.process_for(0.3);
        out.drain_frames();
        ctx.process_for(0.3);
        let frames = out.drain_frames();
        frames[frames.len() - WINDOW..].to_vec()
    }

    #[test]
    fn steady_tone_sits_at_base_and_is_limited() {
        for base in [60.0, 90.0] {
            let frames = settled(base);
            // Unlimited, the lowpassed tone would have amplitude 0.5 or more.
            let amplitude = 2.0 * magnitude_at(&frames, 0, base, SAMPLE_RATE);
            assert!(amplitude > 0.2 && amplitude < 0.35, "{base} Hz: {amplitude}");
            assert!(magnitude_at(&frames, 0, 150.0, SAMPLE_RATE) < 0.02);

            let peak = frames.iter().fold(0.0f32, |m, f| m.max(f[0].abs()));
            assert!(peak < 0.5, "{base} Hz: peak {peak}");
        }
    }

    #[test]
    fn quiet_pink_floor_under_the_tone() {
        let frames = settled(90.0);
        let floor = band_power(&frames, 0, 2000.0, 4000.0, SAMPLE_RATE);
        assert!(floor > 1e-5 && floor < 3e-4, "{floor}");
    }

    #[test]
    fn unimplemented_patterns_are_marked() {
        let steady = TactileParams::default();
        assert_eq!(steady.label(), "Tactile 90 Hz steady");

        let pulse = TactileParams { pattern: TactilePattern::Pulse, base: 120.0, ..Default::default() };
        assert_eq!(pulse.label(), "Tactile 120 Hz pulse (as steady)");
    }
}
