//! Offline rendering to 16-bit PCM WAV.
//!
//! A render builds the same recipe the live engine would, but on a private
//! [`AudioContext`] that is processed as fast as possible and drained after
//! every block. The bus gain is shaped into a fade-in, a hold at the spec's
//! master gain and a short fade-out ending exactly at the requested duration.
//!
//! Only one render runs at a time per [`Renderer`]; overlapping requests fail
//! with [`EngineError::RenderInProgress`], which callers may retry.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use hound::{SampleFormat, WavSpec, WavWriter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rtrb::RingBuffer;

use crate::color::make_noise_buffer;
use crate::config::EngineConfig;
use crate::context::AudioContext;
use crate::error::{EngineError, Result};
use crate::node::BLOCK_SIZE;
use crate::nodes::{Gain, GainMessage, RtrbSink};
use crate::param::{Automation, ParamMessage};
use crate::recipe;
use crate::sound::{SoundSpec, DURATION_RANGE};

/// Noise seed used when the config does not pin one, so renders of the same
/// spec are byte-identical.
pub const DEFAULT_RENDER_SEED: u64 = 0x5EED_0F_501D;

const CHANNELS: u16 = 2;
const SILENT_GAIN: f64 = 1e-4;
const CAPTURE_SAMPLES: usize = 16_384;

/// A finished render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedWav {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Quantize one float sample to signed 16-bit.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode interleaved float samples as a canonical 44-byte-header PCM WAV.
pub fn encode_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &s in samples {
        writer.write_sample(quantize(s))?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Lowercase, dash-separated `.wav` file name from a hint or label.
pub fn file_name_for(hint: &str) -> String {
    let stem = hint.trim();
    let stem = stem.strip_suffix(".wav").unwrap_or(stem);

    let mut slug = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "soundscape.wav".to_string()
    } else {
        format!("{slug}.wav")
    }
}

/// Render `spec` to interleaved stereo float samples.
#[tracing::instrument(skip_all, fields(kind = spec.params.type_name()))]
pub fn render_samples(spec: &SoundSpec, config: &EngineConfig) -> Result<Vec<f32>> {
    config.validate()?;
    let spec = spec.clone().normalized();
    let sample_rate = config.render_sample_rate;
    let (min, max) = DURATION_RANGE;
    let duration = spec.duration.unwrap_or(config.render_default_duration).clamp(min, max);
    let frames = (duration * sample_rate as f64).round() as usize;
    let wanted = frames * CHANNELS as usize;

    let (producer, mut consumer) = RingBuffer::new(CAPTURE_SAMPLES);
    let mut ctx = AudioContext::new(sample_rate).with_output(RtrbSink::stereo(producer));
    let mut bus = ctx.add(Gain::new(0.0));
    ctx.output(bus.id());

    let mut rng = StdRng::seed_from_u64(config.noise_seed.unwrap_or(DEFAULT_RENDER_SEED));
    let noise = make_noise_buffer(config.noise_buffer_seconds, sample_rate, &mut rng);
    let mut recipe = recipe::build(&mut ctx, &spec, &noise, bus.id());

    let fade_in = if spec.abrupt_start { config.abrupt_fade } else { config.render_fade_in };
    let fade_out_at = (duration - config.render_fade_out).max(fade_in);
    for event in [
        Automation::SetValueAt { value: SILENT_GAIN, time: 0.0 },
        Automation::RampTo { value: spec.master_gain, start: 0.0, end: fade_in },
        Automation::RampTo { value: SILENT_GAIN, start: fade_out_at, end: duration },
    ] {
        bus.post(GainMessage::Gain(ParamMessage::Automate(event)));
    }
    recipe.start(0.0);

    tracing::debug!(label = recipe.label(), duration, frames, sample_rate, "rendering");

    let mut samples = Vec::with_capacity(wanted + BLOCK_SIZE * CHANNELS as usize);
    let max_blocks = frames.div_ceil(BLOCK_SIZE) + 1;
    for _ in 0..max_blocks {
        if samples.len() >= wanted {
            break;
        }
        ctx.process();
        while let Ok(s) = consumer.pop() {
            samples.push(s);
        }
    }

    if samples.len() < wanted {
        return Err(EngineError::Render(format!(
            "rendered {} of {} samples",
            samples.len(),
            wanted
        )));
    }
    samples.truncate(wanted);

    Ok(samples)
}

/// Render `spec` and encode it as WAV.
pub fn render_wav(spec: &SoundSpec, config: &EngineConfig, file_name_hint: Option<&str>) -> Result<RenderedWav> {
    let samples = render_samples(spec, config)?;
    let bytes = encode_wav(&samples, CHANNELS, config.render_sample_rate)?;
    let file_name = file_name_for(file_name_hint.unwrap_or(&spec.label()));

    tracing::info!(%file_name, bytes = bytes.len(), "render finished");
    Ok(RenderedWav { file_name, bytes })
}

/// Held for the duration of one render.
struct RenderSlot(Arc<AtomicBool>);

impl RenderSlot {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::RenderInProgress)?;
        Ok(Self(flag.clone()))
    }
}

impl Drop for RenderSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs offline renders, one at a time.
#[derive(Clone)]
pub struct Renderer {
    config: EngineConfig,
    in_flight: Arc<AtomicBool>,
}

impl Renderer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Render on the calling thread.
    pub fn render(&self, spec: &SoundSpec, file_name_hint: Option<&str>) -> Result<RenderedWav> {
        let _slot = RenderSlot::acquire(&self.in_flight)?;
        render_wav(spec, &self.config, file_name_hint)
    }

    /// Render on a worker thread.
    ///
    /// Fails immediately if a render is already running.
    pub fn render_async(&self, spec: SoundSpec, file_name_hint: Option<String>) -> Result<JoinHandle<Result<RenderedWav>>> {
        let slot = RenderSlot::acquire(&self.in_flight)?;
        let config = self.config.clone();

        let handle = std::thread::Builder::new()
            .name("soundscape-render".into())
            .spawn(move || {
                let _slot = slot;
                render_wav(&spec, &config, file_name_hint.as_deref())
            })?;

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{NoiseColor, NoiseParams};

    fn white(seconds: f64) -> SoundSpec {
        SoundSpec::noise(NoiseParams { color: NoiseColor::White, ..Default::default() }).with_duration(seconds)
    }

    #[test]
    fn quantize_scales_asymmetrically() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(2.5), 32767);
        assert_eq!(quantize(-7.0), -32768);
        assert_eq!(quantize(0.0), 0);
    }

    #[test]
    fn five_seconds_of_white_noise() {
        let wav = render_wav(&white(5.0), &EngineConfig::default(), Some("Test Render")).unwrap();
        let b = &wav.bytes;

        assert_eq!(b.len(), 882_044);
        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([b[4], b[5], b[6], b[7]]), 882_036);
        assert_eq!(&b[8..12], b"WAVE");
        assert_eq!(&b[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([b[20], b[21]]), 1);
        assert_eq!(u16::from_le_bytes([b[22], b[23]]), 2);
        assert_eq!(u32::from_le_bytes([b[24], b[25], b[26], b[27]]), 44_100);
        assert_eq!(u16::from_le_bytes([b[34], b[35]]), 16);
        assert_eq!(&b[36..40], b"data");
        assert_eq!(u32::from_le_bytes([b[40], b[41], b[42], b[43]]), 882_000);
        assert_eq!(wav.file_name, "test-render.wav");
    }

    #[test]
    fn envelope_fades_in_and_out() {
        let samples = render_samples(&white(2.0), &EngineConfig::default()).unwrap();
        assert_eq!(samples.len(), 2 * 88_200);

        let peak = |range: std::ops::Range<usize>| {
            samples[range.start * 2..range.end * 2].iter().fold(0.0f32, |m, s| m.max(s.abs()))
        };
        assert!(peak(0..4) < 0.01);
        assert!(peak(44_100..45_100) > 0.1);
        assert!(peak(88_190..88_200) < 0.01);
    }

    #[test]
    fn renders_are_deterministic() {
        let config = EngineConfig::default();
        let a = render_samples(&white(2.0), &config).unwrap();
        let b = render_samples(&white(2.0), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overlapping_render_is_retryable() {
        let renderer = Renderer::new(EngineConfig::default());
        let held = RenderSlot::acquire(&renderer.in_flight).unwrap();

        let err = renderer.render(&white(2.0), None).unwrap_err();
        assert!(matches!(err, EngineError::RenderInProgress));
        assert!(err.is_retryable());
        assert!(renderer.render_async(white(2.0), None).is_err());

        drop(held);
        assert!(!renderer.is_busy());
        let wav = renderer.render_async(white(2.0), None).unwrap().join().unwrap().unwrap();
        assert_eq!(wav.file_name, "white-noise.wav");
        assert!(!renderer.is_busy());
    }

    #[test]
    fn invalid_config_is_rejected_before_rendering() {
        let config = EngineConfig { render_sample_rate: 16, ..Default::default() };
        let err = render_wav(&white(2.0), &config, None).unwrap_err();
        assert!(matches!(err, EngineError::ConfigValue(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn file_names_are_slugged() {
        assert_eq!(file_name_for("Pink noise, sine AM 12.0 Hz"), "pink-noise-sine-am-12-0-hz.wav");
        assert_eq!(file_name_for("favorite.wav"), "favorite.wav");
        assert_eq!(file_name_for("  !!  "), "soundscape.wav");
    }
}
