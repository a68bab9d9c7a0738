use super::{RecipeBuilder, RecipeKind};
use crate::modulation::{Lfo, Waveform};
use crate::node::NodeId;
use crate::nodes::{BiquadFilter, BiquadParam, FilterKind, Gain, GainParam, StereoPanner};
use crate::sound::{FilterType, NoiseParams};

/// Amplitude-modulation LFO for `depth`: swings `depth * 0.5` around
/// `1 - depth * 0.25`, so the bed never drops below a quarter of its level.
pub(crate) fn am_lfo(wave: Waveform, frequency: f64, depth: f64) -> Lfo {
    Lfo::new(wave, frequency, depth * 0.5).with_offset(1.0 - depth * 0.25)
}

fn filter_kind(filter: FilterType) -> Option<FilterKind> {
    match filter {
        FilterType::None => None,
        FilterType::Bandpass => Some(FilterKind::Bandpass),
        FilterType::Lowpass => Some(FilterKind::Lowpass),
        FilterType::Highpass => Some(FilterKind::Highpass),
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl RecipeKind for NoiseParams {
    fn build(&self, b: &mut RecipeBuilder<'_>, destination: NodeId) {
        let source = b.noise_source();
        let mut tail = b.colorize(source, self.color);

        if self.am_enabled {
            let mut am = b.add(Gain::new(0.0));
            b.modulate(&mut am, GainParam::Gain, am_lfo(self.am_wave, self.am_freq, self.am_depth));
            b.connect(tail, am.id());
            tail = am.id();
        }

        if let Some(kind) = filter_kind(self.filter_type) {
            let mut filter = b.add(BiquadFilter::new(kind, self.filter_center, self.filter_q));
            if self.filter_lfo_enabled {
                let sweep = Lfo::new(Waveform::Sine, self.filter_lfo_freq, self.filter_lfo_depth);
                b.modulate(&mut filter, BiquadParam::Frequency, sweep);
            }
            b.connect(tail, filter.id());
            tail = filter.id();
        }

        let pan = b.add(StereoPanner::new(self.pan)).id();
        b.connect(tail, pan);
        b.connect(pan, destination);
    }

    fn label(&self) -> String {
        let mut label = format!("{} noise", capitalized(self.color.name()));

        if self.am_enabled {
            label.push_str(&format!(", {} AM {:.1} Hz", self.am_wave.name(), self.am_freq));
        }

        if self.filter_type != FilterType::None {
            label.push_str(&format!(", {} {:.0} Hz", self.filter_type.name(), self.filter_center));
            if self.filter_lfo_enabled {
                label.push_str(" swept");
            }
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
    use crate::sound::{NoiseColor, SoundSpec};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn am_never_silences() {
        for depth in [0.0, 0.2, 0.5, 0.9, 1.0] {
            let lfo = am_lfo(Waveform::Square, 10.0, depth);
            let low = lfo.offset - lfo.depth;
            let high = lfo.offset + lfo.depth;
            assert!(low >= 0.25 - 1e-12, "depth {depth} dips to {low}");
            assert!((high - (1.0 + depth * 0.25)).abs() < 1e-12);
        }
    }

    #[test]
    fn full_chain_records_both_modulators() {
        let mut ctx = AudioContext::new(44100);
        let dest = ctx.add(Gain::new(1.0)).id();
        let noise = NoiseBuffer::generate(0.1, 44100, &mut StdRng::seed_from_u64(9));
        let params = NoiseParams {
            color: NoiseColor::Brown,
            am_enabled: true,
            am_freq: 12.0,
            am_depth: 0.6,
            filter_type: FilterType::Bandpass,
            filter_center: 1200.0,
            filter_lfo_enabled: true,
            filter_lfo_depth: 300.0,
            ..Default::default()
        };

        let recipe = build(&mut ctx, &SoundSpec::noise(params), &noise, dest);

        // source, two brown filters, AM gain, bandpass, panner
        assert_eq!(recipe.nodes().len(), 6);
        assert_eq!(recipe.lfos().len(), 2);
        assert_eq!(recipe.lfos()[0].target, "Gain");
        assert!((recipe.lfos()[0].lfo.offset - 0.85).abs() < 1e-12);
        assert_eq!(recipe.lfos()[1].target, "Frequency");
        assert_eq!(recipe.lfos()[1].lfo.depth, 300.0);
        assert_eq!(recipe.label(), "Brown noise, sine AM 12.0 Hz, bandpass 1200 Hz swept");
    }
}
