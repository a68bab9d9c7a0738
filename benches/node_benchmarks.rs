use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rtrb::RingBuffer;
use soundscape::nodes::RtrbSink;
use soundscape::render::{encode_wav, render_samples};
use soundscape::sound::{BinauralParams, NoiseColor, NoiseParams};
use soundscape::{EngineConfig, GeneratorMode, PlaybackEngine, RecipeGenerator, SoundSpec};

fn engine_with(spec: SoundSpec) -> PlaybackEngine {
    // The ring is never drained; the sink drops blocks once it fills.
    let (producer, _consumer) = RingBuffer::new(8192);
    let config = EngineConfig { noise_seed: Some(1), ..Default::default() };
    let mut engine = PlaybackEngine::with_sink(config, 48_000, RtrbSink::stereo(producer));
    engine.play(spec);
    engine
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("noise bed, 1s", |b| {
        let spec = SoundSpec::noise(NoiseParams {
            color: NoiseColor::Pink,
            am_enabled: true,
            filter_type: soundscape::sound::FilterType::Bandpass,
            filter_lfo_enabled: true,
            ..Default::default()
        });
        let mut engine = engine_with(spec);
        b.iter(|| engine.advance(black_box(1.0)))
    });

    c.bench_function("binaural, 1s", |b| {
        let mut engine = engine_with(SoundSpec::binaural(BinauralParams { vibrato_enabled: true, ..Default::default() }));
        b.iter(|| engine.advance(black_box(1.0)))
    });

    c.bench_function("render + encode, 2s", |b| {
        let spec = RecipeGenerator::new(Some(3)).generate(GeneratorMode::Ambient).with_duration(2.0);
        let config = EngineConfig::default();
        b.iter(|| {
            let samples = render_samples(&spec, &config).unwrap();
            encode_wav(&samples, 2, config.render_sample_rate).unwrap()
        })
    });

    c.bench_function("noise buffer, 2s", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| soundscape::color::make_noise_buffer(black_box(2.0), 48_000, &mut rng))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
