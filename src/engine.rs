//! The playback engine: one live recipe behind a master gain bus.
//!
//! ```text
//! recipe nodes ──► master Gain ──► sink
//! ```
//!
//! The engine is driven from a single control thread. It owns the
//! [`AudioContext`] and renders it either paced against the device
//! ([`PlaybackEngine::pump`]) or by a fixed amount ([`PlaybackEngine::advance`]).
//! Fade-out teardowns are deadlines on the context clock checked after every
//! block, so a later `play` can cancel one simply by clearing it.

use std::thread::JoinHandle;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::color::make_noise_buffer;
use crate::config::EngineConfig;
use crate::context::{AudioContext, Handle};
use crate::device::CpalDevice;
use crate::error::Result;
use crate::node::AudioNode;
use crate::nodes::{Gain, GainMessage, NoiseBuffer};
use crate::param::{Automation, ParamMessage};
use crate::random::{GeneratorMode, RecipeGenerator};
use crate::recipe::{self, Recipe};
use crate::render::{RenderedWav, Renderer};
use crate::sound::SoundSpec;

#[cfg(feature = "cpal_sink")]
use crate::nodes::SinkMonitor;

/// Gain treated as silence; fades end here rather than at zero.
const SILENT_GAIN: f64 = 1e-4;

/// How often `render` pumps the live graph while waiting on the worker.
const RENDER_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Playing,
    /// Fading out; the recipe is torn down when the fade completes.
    FadingOut,
}

pub struct PlaybackEngine {
    config: EngineConfig,
    ctx: AudioContext,
    master: Handle<GainMessage>,
    noise: NoiseBuffer,
    current: Option<Recipe>,
    teardown_at: Option<f64>,
    generator: RecipeGenerator,
    renderer: Renderer,
    #[cfg(feature = "cpal_sink")]
    monitor: Option<SinkMonitor>,
}

impl PlaybackEngine {
    /// Open the default output device.
    ///
    /// Fails with [`EngineError::BackendUnavailable`](crate::EngineError::BackendUnavailable)
    /// when there is no usable device or the crate was built without `cpal_sink`.
    pub fn init(config: EngineConfig) -> Result<Self> {
        let device = CpalDevice::default_output()?;
        Self::open(config, &device)
    }

    #[cfg(feature = "cpal_sink")]
    fn open(config: EngineConfig, device: &CpalDevice) -> Result<Self> {
        let sink = device.create_sink()?;
        let monitor = sink.monitor();
        let mut engine = Self::with_sink(config, device.sample_rate(), sink);
        engine.monitor = Some(monitor);
        tracing::info!(device = device.name(), "playback engine ready");
        Ok(engine)
    }

    #[cfg(not(feature = "cpal_sink"))]
    fn open(_config: EngineConfig, device: &CpalDevice) -> Result<Self> {
        Err(crate::EngineError::BackendUnavailable(format!(
            "no realtime sink for {}",
            device.name()
        )))
    }

    /// An engine writing into an arbitrary sink.
    ///
    /// Nothing paces the graph; drive it with [`advance`](Self::advance).
    pub fn with_sink<S: AudioNode<Message = ()>>(config: EngineConfig, sample_rate: u32, sink: S) -> Self {
        let mut ctx = AudioContext::new(sample_rate).with_output(sink);
        let master = ctx.add(Gain::new(0.0));
        ctx.output(master.id());

        let mut rng = match config.noise_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let noise = make_noise_buffer(config.noise_buffer_seconds, sample_rate, &mut rng);

        Self {
            generator: RecipeGenerator::new(config.noise_seed),
            renderer: Renderer::new(config.clone()),
            config,
            ctx,
            master,
            noise,
            current: None,
            teardown_at: None,
            #[cfg(feature = "cpal_sink")]
            monitor: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        match (&self.current, self.teardown_at) {
            (None, _) => EngineState::Idle,
            (Some(_), Some(_)) => EngineState::FadingOut,
            (Some(_), None) => EngineState::Playing,
        }
    }

    pub fn current_label(&self) -> Option<&str> {
        self.current.as_ref().map(|r| r.label())
    }

    pub fn current_spec(&self) -> Option<&SoundSpec> {
        self.current.as_ref().map(|r| r.spec())
    }

    pub fn current_recipe(&self) -> Option<&Recipe> {
        self.current.as_ref()
    }

    /// Context clock in seconds.
    pub fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    /// Nodes in the graph, including the master bus and sink.
    pub fn node_count(&self) -> usize {
        self.ctx.node_count()
    }

    fn automate_master(&mut self, value: f64, seconds: f64) {
        let now = self.ctx.current_time();
        self.master.post(GainMessage::Gain(ParamMessage::Automate(Automation::Cancel)));
        self.master.post(GainMessage::Gain(ParamMessage::Automate(Automation::RampTo {
            value,
            start: now,
            end: now + seconds.max(0.0),
        })));
    }

    /// Replace whatever is playing with `spec`. Returns the new label.
    ///
    /// The previous recipe is torn down at once and any pending fade-out
    /// teardown is cancelled.
    #[tracing::instrument(skip_all, fields(kind = spec.params.type_name()))]
    pub fn play(&mut self, spec: SoundSpec) -> String {
        let spec = spec.normalized();

        if self.teardown_at.take().is_some() {
            tracing::debug!("cancelled pending teardown");
        }
        if let Some(mut previous) = self.current.take() {
            previous.dispose(&mut self.ctx);
        }

        let mut recipe = recipe::build(&mut self.ctx, &spec, &self.noise, self.master.id());
        self.automate_master(spec.master_gain, self.config.fade_in(spec.abrupt_start));
        recipe.start(self.ctx.current_time() + self.config.start_lead);

        let label = recipe.label().to_string();
        tracing::info!(%label, master_gain = spec.master_gain, "playing");
        self.current = Some(recipe);
        label
    }

    /// Play a freshly generated spec and return it for display or saving.
    pub fn play_random(&mut self, mode: GeneratorMode) -> SoundSpec {
        let spec = self.generator.generate(mode);
        self.play(spec.clone());
        spec
    }

    /// Fade out over `fade` seconds (the configured default when `None`), then
    /// tear the recipe down. Does nothing when idle.
    pub fn stop(&mut self, fade: Option<f64>) {
        if self.current.is_none() {
            tracing::debug!("stop while idle");
            return;
        }

        let fade = fade.unwrap_or(self.config.stop_fade).max(0.0);
        let deadline = self.ctx.current_time() + fade;
        self.automate_master(SILENT_GAIN, fade);
        self.teardown_at = Some(deadline);
        tracing::info!(fade, "stopping");

        self.poll_teardown();
    }

    fn poll_teardown(&mut self) {
        let Some(deadline) = self.teardown_at else {
            return;
        };
        if self.ctx.current_time() < deadline {
            return;
        }

        self.teardown_at = None;
        if let Some(mut recipe) = self.current.take() {
            recipe.stop(self.ctx.current_time());
            recipe.dispose(&mut self.ctx);
            tracing::debug!(label = recipe.label(), "teardown complete");
        }
    }

    fn process_block(&mut self) {
        self.ctx.process();
        self.poll_teardown();
    }

    /// Render `seconds` of audio, in whole blocks.
    pub fn advance(&mut self, seconds: f64) {
        let frames = (seconds.max(0.0) * self.ctx.sample_rate() as f64).ceil() as u64;
        let target = self.ctx.frames_processed() + frames;
        while self.ctx.frames_processed() < target {
            self.process_block();
        }
    }

    /// Keep the device fed; call regularly from the control thread.
    ///
    /// Returns the number of blocks rendered.
    #[cfg(feature = "cpal_sink")]
    pub fn pump(&mut self) -> usize {
        let Some(monitor) = self.monitor.clone() else {
            self.poll_teardown();
            return 0;
        };

        if monitor.check_underrun() {
            tracing::warn!("output underrun");
        }

        let lookahead = (self.config.lookahead_blocks * crate::node::BLOCK_SIZE) as u64;
        let target = monitor.frames_consumed() + lookahead;
        let mut blocks = 0;
        while self.ctx.frames_processed() < target {
            self.process_block();
            blocks += 1;
        }
        blocks
    }

    /// Without a realtime sink there is nothing to pace against.
    #[cfg(not(feature = "cpal_sink"))]
    pub fn pump(&mut self) -> usize {
        self.poll_teardown();
        0
    }

    /// Render `spec` offline and wait for the result.
    ///
    /// The render runs on the worker thread while this thread keeps
    /// [`pump`](Self::pump)ing, so live playback is not starved.
    pub fn render(&mut self, spec: &SoundSpec, file_name_hint: Option<&str>) -> Result<RenderedWav> {
        let handle = self
            .renderer
            .render_async(spec.clone(), file_name_hint.map(str::to_string))?;
        while !handle.is_finished() {
            self.pump();
            std::thread::sleep(RENDER_POLL_INTERVAL);
        }
        handle
            .join()
            .map_err(|_| crate::EngineError::Render("render thread panicked".to_string()))?
    }

    /// Render `spec` offline on a worker thread.
    ///
    /// Fails with a retryable [`RenderInProgress`](crate::EngineError::RenderInProgress)
    /// while another render is running.
    pub fn render_async(&self, spec: SoundSpec, file_name_hint: Option<String>) -> Result<JoinHandle<Result<RenderedWav>>> {
        self.renderer.render_async(spec, file_name_hint)
    }

    /// Tear down the current recipe and close the output.
    pub fn shutdown(mut self) {
        self.teardown_at = None;
        if let Some(mut recipe) = self.current.take() {
            recipe.dispose(&mut self.ctx);
        }
        tracing::info!("playback engine shut down");
    }
}
