use rtrb::RingBuffer;
use soundscape::nodes::RtrbSink;
use soundscape::{
    EngineConfig, EngineError, EngineState, GeneratorMode, PlaybackEngine, RecipeGenerator, Renderer, SoundParams,
    SoundSpec,
};

fn spec(json: &str) -> SoundSpec {
    serde_json::from_str(json).unwrap()
}

#[test]
fn stored_specs_survive_a_round_trip() {
    let original = spec(r#"{
        "type": "noise",
        "params": { "color": "blue", "amEnabled": true, "amWave": "triangle", "amFreq": 18.5, "filterType": "lowpass" },
        "masterGain": 0.25,
        "abruptStart": true
    }"#);

    let json = original.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "noise");
    assert_eq!(value["params"]["amWave"], "triangle");
    assert_eq!(value["masterGain"], 0.25);

    assert_eq!(SoundSpec::from_json(&json).unwrap(), original);
}

#[test]
fn invalid_json_is_a_spec_error() {
    let err = SoundSpec::from_json("{ not json").unwrap_err();
    assert!(matches!(err, EngineError::Spec(_)));
    assert!(!err.is_retryable());
}

#[test]
fn headless_engine_plays_every_kind() {
    let (producer, mut consumer) = RingBuffer::new(1 << 18);
    let config = EngineConfig { noise_seed: Some(42), ..Default::default() };
    let mut engine = PlaybackEngine::with_sink(config, 48_000, RtrbSink::stereo(producer));
    let baseline = engine.node_count();

    for json in [
        r#"{"type":"noise","params":{"color":"brown","filterType":"bandpass","filterLfoEnabled":true}}"#,
        r#"{"type":"binaural","params":{"carrier":180,"beat":6,"vibratoEnabled":true}}"#,
        r#"{"type":"tactile","params":{"pattern":"sweep"}}"#,
        r#"{"type":"wind"}"#,
    ] {
        engine.play(spec(json));
        assert_eq!(engine.state(), EngineState::Playing);
        engine.advance(0.25);
    }

    engine.stop(Some(0.2));
    engine.advance(0.5);
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.node_count(), baseline);

    let mut samples = 0;
    while consumer.pop().is_ok() {
        samples += 1;
    }
    assert!(samples > 0);
    engine.shutdown();
}

#[test]
fn generated_specs_render() {
    let mut generator = RecipeGenerator::new(Some(2024));
    let renderer = Renderer::new(EngineConfig { noise_seed: Some(1), ..Default::default() });

    for mode in [GeneratorMode::Ambient, GeneratorMode::Tactile] {
        let spec = generator.generate(mode).with_duration(2.0);
        let wav = renderer.render(&spec, None).unwrap();

        assert_eq!(wav.bytes.len(), 44 + 2 * 2 * 88_200);
        assert!(wav.file_name.ends_with(".wav"));
        assert!(matches!(spec.params, SoundParams::Noise(_) | SoundParams::Tactile(_)));
    }
}
