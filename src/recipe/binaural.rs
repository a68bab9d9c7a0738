use super::{RecipeBuilder, RecipeKind};
use crate::modulation::{Lfo, Waveform};
use crate::node::NodeId;
use crate::nodes::{Gain, Mixer, Oscillator, OscillatorParam, StereoPanner};
use crate::sound::{BinauralParams, NoiseColor};

/// Level of the pink noise bed under the tones.
const NOISE_BED_GAIN: f64 = 0.05;

impl RecipeKind for BinauralParams {
    fn build(&self, b: &mut RecipeBuilder<'_>, destination: NodeId) {
        let mix = b.add(Mixer::stereo()).id();
        let (left, right) = self.tone_frequencies();

        // Both ears get the same vibrato LFO; phase comes from the shared
        // clock so the beat frequency is unaffected.
        for (frequency, pan) in [(left, -1.0), (right, 1.0)] {
            let mut osc = b.oscillator(Oscillator::sine(frequency));
            if self.vibrato_enabled {
                let vibrato = Lfo::new(Waveform::Sine, self.vibrato_freq, self.vibrato_depth);
                b.modulate(&mut osc, OscillatorParam::Frequency, vibrato);
            }
            let panner = b.add(StereoPanner::new(pan)).id();
            b.connect(osc.id(), panner);
            b.connect(panner, mix);
            b.keep_source(osc);
        }

        let noise = b.noise_source();
        let colored = b.colorize(noise, NoiseColor::Pink);
        let bed = b.add(Gain::new(NOISE_BED_GAIN)).id();
        b.connect(colored, bed);
        b.connect(bed, mix);

        b.connect(mix, destination);
    }

    fn label(&self) -> String {
        let mut label = format!("Binaural {:.0} Hz, {:.1} Hz beat", self.carrier, self.beat);
        if self.vibrato_enabled {
            label.push_str(&format!(", vibrato {:.2} Hz", self.vibrato_freq));
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AudioContext;
    use crate::nodes::NoiseBuffer;
    use crate::recipe::build;
    use crate::sound::SoundSpec;
    use crate::testing::{capture, magnitude_at};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn vibrato_is_identical_on_both_ears() {
        let mut ctx = AudioContext::new(44100);
        let dest = ctx.add(Gain::new(1.0)).id();
        let noise = NoiseBuffer::generate(0.1, 44100, &mut StdRng::seed_from_u64(5));
        let params = BinauralParams { vibrato_enabled: true, vibrato_freq: 0.5, vibrato_depth: 3.0, ..Default::default() };

        let recipe = build(&mut ctx, &SoundSpec::binaural(params), &noise, dest);
        let lfos = recipe.lfos();
        assert_eq!(lfos.len(), 2);
        assert_eq!(lfos[0].lfo, lfos[1].lfo);
        assert_ne!(lfos[0].node, lfos[1].node);
        assert_eq!(recipe.label(), "Binaural 200 Hz, 10.0 Hz beat, vibrato 0.50 Hz");
    }

    #[test]
    fn tones_are_split_across_ears() {
        let (mut ctx, mut out) = capture(44100);
        let bus = ctx.add(Gain::new(1.0)).id();
        ctx.output(bus);
        let noise = NoiseBuffer::generate(0.1, 44100, &mut StdRng::seed_from_u64(5));
        let mut recipe = build(&mut ctx, &SoundSpec::binaural(BinauralParams::default()), &noise, bus);
        recipe.start(0.0);

        ctx.process_for(0.2);
        let frames = out.drain_frames();
        let magnitude = |ch: usize, hz: f64| magnitude_at(&frames, ch, hz, 44100);

        assert!(magnitude(0, 200.0) > 0.3);
        assert!(magnitude(0, 210.0) < 0.1);
        assert!(magnitude(1, 210.0) > 0.3);
        assert!(magnitude(1, 200.0) < 0.1);
    }
}
