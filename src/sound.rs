//! The serializable description of a sound.
//!
//! A [`SoundSpec`] is what the UI and the favorites store hand around. On the
//! wire it is loose JSON:
//!
//! ```json
//! { "type": "noise", "params": { "color": "pink", "amEnabled": true }, "masterGain": 0.3 }
//! ```
//!
//! Deserializing always goes through [`normalize`]: missing fields get their
//! per-type defaults, numbers are clamped into range, and an unrecognized
//! `type` becomes [`SoundParams::Unknown`] instead of an error so stale
//! persisted data can never break playback.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::modulation::Waveform;

/// Inclusive `[min, max]` range of a numeric field.
pub type Range = (f64, f64);

pub const MASTER_GAIN_RANGE: Range = (0.0, 1.0);
pub const DEFAULT_MASTER_GAIN: f64 = 0.3;
pub const DURATION_RANGE: Range = (2.0, 600.0);
pub const DEFAULT_DURATION: f64 = 120.0;

pub const AM_FREQ_RANGE: Range = (0.1, 80.0);
pub const AM_DEPTH_RANGE: Range = (0.0, 1.0);
pub const FILTER_CENTER_RANGE: Range = (20.0, 18_000.0);
pub const FILTER_Q_RANGE: Range = (0.1, 20.0);
pub const FILTER_LFO_FREQ_RANGE: Range = (0.01, 5.0);
pub const FILTER_LFO_DEPTH_RANGE: Range = (0.0, 4000.0);
pub const PAN_RANGE: Range = (-1.0, 1.0);

pub const CARRIER_RANGE: Range = (20.0, 1500.0);
pub const BEAT_RANGE: Range = (0.5, 40.0);
pub const VIBRATO_FREQ_RANGE: Range = (0.01, 10.0);
pub const VIBRATO_DEPTH_RANGE: Range = (0.0, 20.0);

pub const TACTILE_BASE_RANGE: Range = (20.0, 250.0);
pub const PULSE_RATE_RANGE: Range = (0.1, 20.0);
pub const PULSE_DUTY_RANGE: Range = (0.05, 0.95);
pub const SWEEP_SPAN_RANGE: Range = (0.0, 200.0);
pub const SWEEP_RATE_RANGE: Range = (0.01, 5.0);
pub const BEAT_OFFSET_RANGE: Range = (0.1, 20.0);

/// Clamp into `range`; non-finite input falls back to `default`.
fn clamp(value: f64, (min, max): Range, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoiseColor {
    White,
    #[default]
    Pink,
    Brown,
    Blue,
}

impl NoiseColor {
    pub const ALL: [NoiseColor; 4] = [NoiseColor::White, NoiseColor::Pink, NoiseColor::Brown, NoiseColor::Blue];

    pub fn name(self) -> &'static str {
        match self {
            NoiseColor::White => "white",
            NoiseColor::Pink => "pink",
            NoiseColor::Brown => "brown",
            NoiseColor::Blue => "blue",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    None,
    Bandpass,
    Lowpass,
    Highpass,
}

impl FilterType {
    pub fn name(self) -> &'static str {
        match self {
            FilterType::None => "none",
            FilterType::Bandpass => "bandpass",
            FilterType::Lowpass => "lowpass",
            FilterType::Highpass => "highpass",
        }
    }
}

/// Colored noise bed with optional amplitude modulation and swept filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoiseParams {
    pub color: NoiseColor,
    pub am_enabled: bool,
    pub am_wave: Waveform,
    pub am_freq: f64,
    pub am_depth: f64,
    pub filter_type: FilterType,
    pub filter_center: f64,
    pub filter_q: f64,
    pub filter_lfo_enabled: bool,
    pub filter_lfo_freq: f64,
    pub filter_lfo_depth: f64,
    pub pan: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            color: NoiseColor::Pink,
            am_enabled: false,
            am_wave: Waveform::Sine,
            am_freq: 10.0,
            am_depth: 0.5,
            filter_type: FilterType::None,
            filter_center: 1000.0,
            filter_q: 0.7,
            filter_lfo_enabled: false,
            filter_lfo_freq: 0.1,
            filter_lfo_depth: 400.0,
            pan: 0.0,
        }
    }
}

impl NoiseParams {
    pub fn normalized(self) -> Self {
        let d = Self::default();
        Self {
            am_freq: clamp(self.am_freq, AM_FREQ_RANGE, d.am_freq),
            am_depth: clamp(self.am_depth, AM_DEPTH_RANGE, d.am_depth),
            filter_center: clamp(self.filter_center, FILTER_CENTER_RANGE, d.filter_center),
            filter_q: clamp(self.filter_q, FILTER_Q_RANGE, d.filter_q),
            filter_lfo_freq: clamp(self.filter_lfo_freq, FILTER_LFO_FREQ_RANGE, d.filter_lfo_freq),
            filter_lfo_depth: clamp(self.filter_lfo_depth, FILTER_LFO_DEPTH_RANGE, d.filter_lfo_depth),
            pan: clamp(self.pan, PAN_RANGE, d.pan),
            ..self
        }
    }
}

/// Two tones a `beat` apart, one per ear, over a quiet pink-noise bed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BinauralParams {
    pub carrier: f64,
    pub beat: f64,
    pub vibrato_enabled: bool,
    pub vibrato_freq: f64,
    pub vibrato_depth: f64,
}

impl Default for BinauralParams {
    fn default() -> Self {
        Self {
            carrier: 200.0,
            beat: 10.0,
            vibrato_enabled: false,
            vibrato_freq: 0.2,
            vibrato_depth: 2.0,
        }
    }
}

impl BinauralParams {
    pub fn normalized(self) -> Self {
        let d = Self::default();
        Self {
            carrier: clamp(self.carrier, CARRIER_RANGE, d.carrier),
            beat: clamp(self.beat, BEAT_RANGE, d.beat),
            vibrato_freq: clamp(self.vibrato_freq, VIBRATO_FREQ_RANGE, d.vibrato_freq),
            vibrato_depth: clamp(self.vibrato_depth, VIBRATO_DEPTH_RANGE, d.vibrato_depth),
            ..self
        }
    }

    /// Base frequencies of the left and right tones.
    pub fn tone_frequencies(&self) -> (f64, f64) {
        (self.carrier, self.carrier + self.beat)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TactilePattern {
    #[default]
    Steady,
    Pulse,
    Sweep,
    Beat,
}

impl TactilePattern {
    pub const ALL: [TactilePattern; 4] =
        [TactilePattern::Steady, TactilePattern::Pulse, TactilePattern::Sweep, TactilePattern::Beat];

    pub fn name(self) -> &'static str {
        match self {
            TactilePattern::Steady => "steady",
            TactilePattern::Pulse => "pulse",
            TactilePattern::Sweep => "sweep",
            TactilePattern::Beat => "beat",
        }
    }
}

/// Low, felt-more-than-heard tone.
///
/// Only `steady` has a defined signal chain; the pattern-specific fields are
/// carried through unchanged for the other patterns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TactileParams {
    pub pattern: TactilePattern,
    pub base: f64,
    pub pulse_rate: f64,
    pub pulse_duty: f64,
    pub sweep_span: f64,
    pub sweep_rate: f64,
    pub beat_offset: f64,
}

impl Default for TactileParams {
    fn default() -> Self {
        Self {
            pattern: TactilePattern::Steady,
            base: 90.0,
            pulse_rate: 2.0,
            pulse_duty: 0.5,
            sweep_span: 40.0,
            sweep_rate: 0.2,
            beat_offset: 3.0,
        }
    }
}

impl TactileParams {
    pub fn normalized(self) -> Self {
        let d = Self::default();
        Self {
            base: clamp(self.base, TACTILE_BASE_RANGE, d.base),
            pulse_rate: clamp(self.pulse_rate, PULSE_RATE_RANGE, d.pulse_rate),
            pulse_duty: clamp(self.pulse_duty, PULSE_DUTY_RANGE, d.pulse_duty),
            sweep_span: clamp(self.sweep_span, SWEEP_SPAN_RANGE, d.sweep_span),
            sweep_rate: clamp(self.sweep_rate, SWEEP_RATE_RANGE, d.sweep_rate),
            beat_offset: clamp(self.beat_offset, BEAT_OFFSET_RANGE, d.beat_offset),
            ..self
        }
    }
}

/// Per-type parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum SoundParams {
    Noise(NoiseParams),
    Binaural(BinauralParams),
    Tactile(TactileParams),
    /// A `type` this engine does not know; plays as silence.
    Unknown(String),
}

impl SoundParams {
    pub fn type_name(&self) -> &str {
        match self {
            SoundParams::Noise(_) => "noise",
            SoundParams::Binaural(_) => "binaural",
            SoundParams::Tactile(_) => "tactile",
            SoundParams::Unknown(name) => name,
        }
    }

    fn normalized(self) -> Self {
        match self {
            SoundParams::Noise(p) => SoundParams::Noise(p.normalized()),
            SoundParams::Binaural(p) => SoundParams::Binaural(p.normalized()),
            SoundParams::Tactile(p) => SoundParams::Tactile(p.normalized()),
            unknown @ SoundParams::Unknown(_) => unknown,
        }
    }
}

/// A normalized, immutable sound description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSoundSpec", into = "RawSoundSpec")]
pub struct SoundSpec {
    pub params: SoundParams,
    pub master_gain: f64,
    pub abrupt_start: bool,
    /// Offline render length in seconds; ignored by live playback.
    pub duration: Option<f64>,
}

impl SoundSpec {
    pub fn new(params: SoundParams) -> Self {
        Self {
            params,
            master_gain: DEFAULT_MASTER_GAIN,
            abrupt_start: false,
            duration: None,
        }
        .normalized()
    }

    pub fn noise(params: NoiseParams) -> Self {
        Self::new(SoundParams::Noise(params))
    }

    pub fn binaural(params: BinauralParams) -> Self {
        Self::new(SoundParams::Binaural(params))
    }

    pub fn tactile(params: TactileParams) -> Self {
        Self::new(SoundParams::Tactile(params))
    }

    pub fn with_master_gain(mut self, gain: f64) -> Self {
        self.master_gain = clamp(gain, MASTER_GAIN_RANGE, DEFAULT_MASTER_GAIN);
        self
    }

    pub fn with_abrupt_start(mut self, abrupt: bool) -> Self {
        self.abrupt_start = abrupt;
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(clamp(seconds, DURATION_RANGE, DEFAULT_DURATION));
        self
    }

    /// Clamp every numeric field into its valid range. Idempotent.
    pub fn normalized(self) -> Self {
        Self {
            params: self.params.normalized(),
            master_gain: clamp(self.master_gain, MASTER_GAIN_RANGE, DEFAULT_MASTER_GAIN),
            abrupt_start: self.abrupt_start,
            duration: self.duration.map(|d| clamp(d, DURATION_RANGE, DEFAULT_DURATION)),
        }
    }

    /// Render length with the default applied.
    pub fn render_duration(&self) -> f64 {
        self.duration.unwrap_or(DEFAULT_DURATION)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.params, SoundParams::Unknown(_))
    }

    /// Human-readable summary, as shown next to a playing or saved sound.
    pub fn label(&self) -> String {
        crate::recipe::label_for(&self.params)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The loose wire form of a [`SoundSpec`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSoundSpec {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abrupt_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Merge `params` field by field over `T::default()`.
///
/// Absent, null and undecodable fields keep their default; every other field
/// is kept as given.
fn parse_params<T>(kind: &str, params: Value) -> T
where
    T: Default + Serialize + serde::de::DeserializeOwned,
{
    let fields = match params {
        Value::Object(fields) => fields,
        Value::Null => return T::default(),
        other => {
            tracing::warn!(kind, params = %other, "params is not an object, using defaults");
            return T::default();
        }
    };
    let mut merged = match serde_json::to_value(T::default()) {
        Ok(Value::Object(defaults)) => defaults,
        _ => return T::default(),
    };

    for (field, value) in fields {
        if value.is_null() {
            continue;
        }
        let previous = merged.insert(field.clone(), value);
        if let Err(e) = serde_json::from_value::<T>(Value::Object(merged.clone())) {
            tracing::warn!(kind, %field, error = %e, "malformed param, using default");
            match previous {
                Some(previous) => merged.insert(field, previous),
                None => merged.remove(&field),
            };
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}

/// Fill per-type defaults and clamp every field.
///
/// Never fails: an unrecognized `type` yields [`SoundParams::Unknown`].
pub fn normalize(raw: RawSoundSpec) -> SoundSpec {
    let kind = raw.kind.trim().to_ascii_lowercase();
    let params = match kind.as_str() {
        "noise" => SoundParams::Noise(parse_params(&kind, raw.params)),
        "binaural" => SoundParams::Binaural(parse_params(&kind, raw.params)),
        "tactile" => SoundParams::Tactile(parse_params(&kind, raw.params)),
        _ => {
            tracing::debug!(kind = %raw.kind, "unknown sound type");
            SoundParams::Unknown(raw.kind)
        }
    };

    SoundSpec {
        params,
        master_gain: raw.master_gain.unwrap_or(DEFAULT_MASTER_GAIN),
        abrupt_start: raw.abrupt_start.unwrap_or(false),
        duration: raw.duration,
    }
    .normalized()
}

impl From<RawSoundSpec> for SoundSpec {
    fn from(raw: RawSoundSpec) -> Self {
        normalize(raw)
    }
}

impl From<SoundSpec> for RawSoundSpec {
    fn from(spec: SoundSpec) -> Self {
        let kind = spec.params.type_name().to_string();
        let params = match spec.params {
            SoundParams::Noise(p) => serde_json::to_value(p),
            SoundParams::Binaural(p) => serde_json::to_value(p),
            SoundParams::Tactile(p) => serde_json::to_value(p),
            SoundParams::Unknown(_) => Ok(Value::Object(Default::default())),
        }
        .unwrap_or(Value::Null);

        RawSoundSpec {
            kind,
            params,
            master_gain: Some(spec.master_gain),
            abrupt_start: Some(spec.abrupt_start),
            duration: spec.duration,
        }
    }
}
