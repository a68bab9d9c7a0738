//! Engine tuning, loadable from TOML.
//!
//! Every field has a default, so an empty file (or none at all) is valid:
//!
//! ```toml
//! smooth_fade = 1.0
//! noise_seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Sample rates the renderer accepts.
pub const RENDER_SAMPLE_RATE_RANGE: (u32, u32) = (8_000, 192_000);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Master gain fade-in for a normal `play`, in seconds.
    pub smooth_fade: f64,
    /// Master gain fade-in when the spec asks for an abrupt start.
    pub abrupt_fade: f64,
    /// Default fade-out for `stop`.
    pub stop_fade: f64,
    /// Delay between building a recipe and starting its sources.
    pub start_lead: f64,
    /// Length of the looping noise buffer.
    pub noise_buffer_seconds: f64,

    pub render_sample_rate: u32,
    pub render_default_duration: f64,
    pub render_fade_in: f64,
    pub render_fade_out: f64,

    /// Seed for noise buffers and the random generator. `None` draws from
    /// the OS; renders are only reproducible with a fixed seed.
    pub noise_seed: Option<u64>,
    /// Blocks rendered ahead of the device when pumping a realtime sink.
    pub lookahead_blocks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smooth_fade: 0.75,
            abrupt_fade: 0.01,
            stop_fade: 0.75,
            start_lead: 0.03,
            noise_buffer_seconds: 2.0,
            render_sample_rate: 44_100,
            render_default_duration: 120.0,
            render_fade_in: 0.05,
            render_fade_out: 0.1,
            noise_seed: None,
            lookahead_blocks: 16,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    /// Reject values the graph cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(EngineError::ConfigValue(msg)) };

        let (min_rate, max_rate) = RENDER_SAMPLE_RATE_RANGE;
        if !(min_rate..=max_rate).contains(&self.render_sample_rate) {
            return invalid(format!(
                "render_sample_rate {} is outside {min_rate}..={max_rate}",
                self.render_sample_rate
            ));
        }

        for (name, seconds) in [
            ("smooth_fade", self.smooth_fade),
            ("abrupt_fade", self.abrupt_fade),
            ("stop_fade", self.stop_fade),
            ("start_lead", self.start_lead),
            ("render_fade_in", self.render_fade_in),
            ("render_fade_out", self.render_fade_out),
        ] {
            if !seconds.is_finite() || seconds < 0.0 {
                return invalid(format!("{name} must be a non-negative number of seconds, got {seconds}"));
            }
        }

        for (name, seconds) in [
            ("noise_buffer_seconds", self.noise_buffer_seconds),
            ("render_default_duration", self.render_default_duration),
        ] {
            if !seconds.is_finite() || seconds <= 0.0 {
                return invalid(format!("{name} must be positive, got {seconds}"));
            }
        }

        if self.lookahead_blocks == 0 {
            return invalid("lookahead_blocks must be at least 1".to_string());
        }
        Ok(())
    }

    /// Fade-in for a spec's `abruptStart` flag.
    pub fn fade_in(&self, abrupt: bool) -> f64 {
        if abrupt {
            self.abrupt_fade
        } else {
            self.smooth_fade
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = EngineConfig::from_toml_str("stop_fade = 2.5\nnoise_seed = 7\n").unwrap();
        assert_eq!(config.stop_fade, 2.5);
        assert_eq!(config.noise_seed, Some(7));
        assert_eq!(config.smooth_fade, 0.75);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "render_sample_rate = 48000").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.render_sample_rate, 48000);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for source in [
            "render_sample_rate = 16",
            "render_sample_rate = 0",
            "render_sample_rate = 1000000",
            "stop_fade = -1.0",
            "smooth_fade = nan",
            "noise_buffer_seconds = 0.0",
            "render_default_duration = -5.0",
            "lookahead_blocks = 0",
        ] {
            let err = EngineConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, crate::EngineError::ConfigValue(_)), "{source}: {err}");
        }
    }

    #[test]
    fn default_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = EngineConfig::from_toml_str("stop_fade = \"slow\"").unwrap_err();
        assert!(matches!(err, crate::EngineError::Config(_)));
    }
}
