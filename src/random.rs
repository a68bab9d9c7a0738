//! Random recipe generation.
//!
//! Every spec produced here is already in range: normalizing it is a no-op.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::modulation::Waveform;
use crate::sound::{FilterType, NoiseColor, NoiseParams, SoundParams, SoundSpec, TactileParams, TactilePattern};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorMode {
    /// Modulated, filtered noise beds.
    #[default]
    Ambient,
    /// Low tactile tones.
    Tactile,
}

impl fmt::Display for GeneratorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorMode::Ambient => f.write_str("ambient"),
            GeneratorMode::Tactile => f.write_str("tactile"),
        }
    }
}

impl FromStr for GeneratorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ambient" => Ok(GeneratorMode::Ambient),
            "tactile" => Ok(GeneratorMode::Tactile),
            other => Err(format!("unknown generator mode `{other}` (expected ambient or tactile)")),
        }
    }
}

const AM_WAVES: [Waveform; 3] = [Waveform::Sine, Waveform::Triangle, Waveform::Square];

/// Draws random but well-formed [`SoundSpec`]s.
pub struct RecipeGenerator {
    rng: StdRng,
}

impl RecipeGenerator {
    /// A generator seeded from `seed`, or from the OS when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn generate(&mut self, mode: GeneratorMode) -> SoundSpec {
        let params = match mode {
            GeneratorMode::Ambient => SoundParams::Noise(self.ambient()),
            GeneratorMode::Tactile => SoundParams::Tactile(self.tactile()),
        };

        let spec = SoundSpec {
            params,
            master_gain: self.rng.gen_range(0.18..=0.34),
            abrupt_start: false,
            duration: None,
        };
        tracing::debug!(%mode, label = %spec.label(), "generated spec");
        spec
    }

    fn ambient(&mut self) -> NoiseParams {
        let rng = &mut self.rng;

        // none : bandpass : lowpass : highpass = 1 : 3 : 1 : 1
        let filter_type = match rng.gen_range(0..6) {
            0 => FilterType::None,
            1..=3 => FilterType::Bandpass,
            4 => FilterType::Lowpass,
            _ => FilterType::Highpass,
        };

        NoiseParams {
            color: NoiseColor::ALL.choose(rng).copied().unwrap_or_default(),
            am_enabled: rng.gen_bool(0.75),
            am_wave: AM_WAVES.choose(rng).copied().unwrap_or_default(),
            am_freq: rng.gen_range(6.0..=40.0),
            am_depth: rng.gen_range(0.2..=0.9),
            filter_type,
            filter_center: rng.gen_range(200.0..=4000.0),
            filter_q: rng.gen_range(0.3..=2.0),
            filter_lfo_enabled: rng.gen_bool(0.6),
            filter_lfo_freq: rng.gen_range(0.05..=0.35),
            filter_lfo_depth: rng.gen_range(200.0..=1200.0),
            pan: 0.0,
        }
    }

    fn tactile(&mut self) -> TactileParams {
        let rng = &mut self.rng;
        TactileParams {
            pattern: TactilePattern::ALL.choose(rng).copied().unwrap_or_default(),
            base: rng.gen_range(60.0..=180.0),
            pulse_rate: rng.gen_range(0.5..=8.0),
            pulse_duty: rng.gen_range(0.2..=0.8),
            sweep_span: rng.gen_range(10.0..=80.0),
            sweep_rate: rng.gen_range(0.05..=1.0),
            beat_offset: rng.gen_range(0.5..=12.0),
        }
    }
}

impl Default for RecipeGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_fields_stay_in_range() {
        let mut generator = RecipeGenerator::new(Some(0xC0FFEE));
        let mut bandpass = 0;

        for _ in 0..10_000 {
            let spec = generator.generate(GeneratorMode::Ambient);
            assert!((0.18..=0.34).contains(&spec.master_gain));

            let SoundParams::Noise(p) = &spec.params else { panic!("ambient must be noise") };
            assert!((6.0..=40.0).contains(&p.am_freq));
            assert!((0.2..=0.9).contains(&p.am_depth));
            assert!((0.3..=2.0).contains(&p.filter_q));
            assert!((200.0..=4000.0).contains(&p.filter_center));
            assert!((0.05..=0.35).contains(&p.filter_lfo_freq));
            assert!((200.0..=1200.0).contains(&p.filter_lfo_depth));
            assert_ne!(p.am_wave, Waveform::Sawtooth);
            if p.filter_type == FilterType::Bandpass {
                bandpass += 1;
            }

            assert_eq!(spec.clone().normalized(), spec);
        }

        // expected 5000
        assert!(bandpass > 4500, "bandpass drawn {bandpass} times");
    }

    #[test]
    fn tactile_specs_normalize_unchanged() {
        let mut generator = RecipeGenerator::new(Some(11));
        for _ in 0..1000 {
            let spec = generator.generate(GeneratorMode::Tactile);
            let SoundParams::Tactile(p) = &spec.params else { panic!("tactile mode must be tactile") };
            assert!((60.0..=180.0).contains(&p.base));
            assert_eq!(spec.clone().normalized(), spec);
        }
    }

    #[test]
    fn same_seed_same_specs() {
        let mut a = RecipeGenerator::new(Some(99));
        let mut b = RecipeGenerator::new(Some(99));
        for _ in 0..20 {
            assert_eq!(a.generate(GeneratorMode::Ambient), b.generate(GeneratorMode::Ambient));
        }
    }

    #[test]
    fn parses_modes() {
        assert_eq!("Tactile".parse::<GeneratorMode>().unwrap(), GeneratorMode::Tactile);
        assert!("loud".parse::<GeneratorMode>().is_err());
    }
}
