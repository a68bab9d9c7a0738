//! Recipes: the live node graph realizing one [`SoundSpec`].
//!
//! [`build`] dispatches on the spec's parameter variant to a [`RecipeKind`],
//! which wires its nodes into the context and terminates them at the given
//! destination (the engine's master bus, or a render bus). Everything the
//! kind creates is recorded in the returned [`Recipe`] so it can be started,
//! stopped and torn down as one unit.
//!
//! Sources are created stopped. Nothing is audible until [`Recipe::start`].

mod binaural;
mod noise;
mod tactile;

use crate::context::{AudioContext, Handle};
use crate::modulation::{attach_lfo, Lfo, LfoDescriptor, Modulatable};
use crate::node::{AudioNode, NodeId};
use crate::nodes::{NoiseBuffer, NoiseMessage, NoiseSource, OscillatorMessage};
use crate::sound::{SoundParams, SoundSpec};

/// A startable source owned by a recipe.
pub enum SourceHandle {
    Noise(Handle<NoiseMessage>),
    Oscillator(Handle<OscillatorMessage>),
}

impl SourceHandle {
    pub fn id(&self) -> NodeId {
        match self {
            SourceHandle::Noise(h) => h.id(),
            SourceHandle::Oscillator(h) => h.id(),
        }
    }

    fn start(&mut self, at: f64) {
        match self {
            SourceHandle::Noise(h) => h.post(NoiseMessage::Start(at)),
            SourceHandle::Oscillator(h) => h.post(OscillatorMessage::Start(at)),
        }
    }

    fn stop(&mut self, at: f64) {
        match self {
            SourceHandle::Noise(h) => h.post(NoiseMessage::Stop(at)),
            SourceHandle::Oscillator(h) => h.post(OscillatorMessage::Stop(at)),
        }
    }
}

/// Graph-building state handed to a [`RecipeKind`].
pub struct RecipeBuilder<'a> {
    ctx: &'a mut AudioContext,
    noise: &'a NoiseBuffer,
    nodes: Vec<NodeId>,
    sources: Vec<SourceHandle>,
    lfos: Vec<LfoDescriptor>,
    tones: Vec<f64>,
}

impl<'a> RecipeBuilder<'a> {
    fn new(ctx: &'a mut AudioContext, noise: &'a NoiseBuffer) -> Self {
        Self {
            ctx,
            noise,
            nodes: Vec::new(),
            sources: Vec::new(),
            lfos: Vec::new(),
            tones: Vec::new(),
        }
    }

    /// Add a node and record it for teardown.
    pub fn add<N: AudioNode>(&mut self, node: N) -> Handle<N::Message> {
        let handle = self.ctx.add(node);
        self.nodes.push(handle.id());
        handle
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.ctx.connect(from, to);
    }

    /// A looping source over the shared noise buffer.
    pub fn noise_source(&mut self) -> NodeId {
        let handle = self.add(NoiseSource::new(self.noise.clone()));
        let id = handle.id();
        self.sources.push(SourceHandle::Noise(handle));
        id
    }

    pub fn oscillator(&mut self, osc: crate::nodes::Oscillator) -> Handle<OscillatorMessage> {
        self.tones.push(osc.frequency());
        self.add(osc)
    }

    /// Keep an oscillator's handle so the recipe can start and stop it.
    pub fn keep_source(&mut self, handle: Handle<OscillatorMessage>) {
        self.sources.push(SourceHandle::Oscillator(handle));
    }

    /// Insert the coloring chain for `color` after `input`.
    pub fn colorize(&mut self, input: NodeId, color: crate::sound::NoiseColor) -> NodeId {
        crate::color::colorize(self.ctx, input, color, &mut self.nodes)
    }

    pub fn modulate<M: Modulatable>(&mut self, handle: &mut Handle<M>, target: M::Target, lfo: Lfo) {
        let descriptor = attach_lfo(handle, target, lfo);
        self.lfos.push(descriptor);
    }
}

/// One family of sound, able to wire itself into a graph.
pub trait RecipeKind {
    /// Build the graph, ending at `destination`.
    fn build(&self, builder: &mut RecipeBuilder<'_>, destination: NodeId);

    /// Display label for the realized graph.
    fn label(&self) -> String;
}

/// Placeholder for an unrecognized sound type: builds nothing.
pub struct Unknown;

impl RecipeKind for Unknown {
    fn build(&self, _builder: &mut RecipeBuilder<'_>, _destination: NodeId) {}

    fn label(&self) -> String {
        "Unknown".to_string()
    }
}

fn kind_of(params: &SoundParams) -> &dyn RecipeKind {
    match params {
        SoundParams::Noise(p) => p,
        SoundParams::Binaural(p) => p,
        SoundParams::Tactile(p) => p,
        SoundParams::Unknown(_) => &Unknown,
    }
}

/// Display label for `params` without building anything.
pub fn label_for(params: &SoundParams) -> String {
    kind_of(params).label()
}

/// The nodes, sources and modulators realizing one spec.
pub struct Recipe {
    spec: SoundSpec,
    label: String,
    nodes: Vec<NodeId>,
    sources: Vec<SourceHandle>,
    lfos: Vec<LfoDescriptor>,
    tones: Vec<f64>,
    disposed: bool,
}

/// Wire the graph for `spec` into `ctx`, terminating at `destination`.
///
/// Unknown sound types yield an empty recipe.
#[tracing::instrument(skip_all, fields(kind = spec.params.type_name()))]
pub fn build(ctx: &mut AudioContext, spec: &SoundSpec, noise: &NoiseBuffer, destination: NodeId) -> Recipe {
    let kind = kind_of(&spec.params);
    let mut builder = RecipeBuilder::new(ctx, noise);
    kind.build(&mut builder, destination);

    let recipe = Recipe {
        spec: spec.clone(),
        label: kind.label(),
        nodes: builder.nodes,
        sources: builder.sources,
        lfos: builder.lfos,
        tones: builder.tones,
        disposed: false,
    };

    tracing::debug!(label = %recipe.label, nodes = recipe.nodes.len(), lfos = recipe.lfos.len(), "recipe built");
    recipe
}

impl Recipe {
    pub fn spec(&self) -> &SoundSpec {
        &self.spec
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Every node this recipe owns, in creation order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn sources(&self) -> &[SourceHandle] {
        &self.sources
    }

    pub fn lfos(&self) -> &[LfoDescriptor] {
        &self.lfos
    }

    /// Base frequencies of the audible oscillators.
    pub fn tones(&self) -> &[f64] {
        &self.tones
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Start every source at context time `at`.
    pub fn start(&mut self, at: f64) {
        for source in &mut self.sources {
            source.start(at);
        }
    }

    /// Stop every source at context time `at`.
    pub fn stop(&mut self, at: f64) {
        for source in &mut self.sources {
            source.stop(at);
        }
    }

    /// Remove every node from the graph. Safe to call more than once.
    pub fn dispose(&mut self, ctx: &mut AudioContext) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let removed = self.nodes.drain(..).filter(|&id| ctx.remove(id)).count();
        self.sources.clear();
        self.lfos.clear();
        tracing::debug!(label = %self.label, removed, "recipe disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Gain;
    use crate::sound::{BinauralParams, NoiseParams, TactileParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (AudioContext, NodeId, NoiseBuffer) {
        let mut ctx = AudioContext::new(44100);
        let dest = ctx.add(Gain::new(1.0)).id();
        let noise = NoiseBuffer::generate(0.1, 44100, &mut StdRng::seed_from_u64(3));
        (ctx, dest, noise)
    }

    #[test]
    fn unknown_builds_nothing() {
        let (mut ctx, dest, noise) = setup();
        let spec: SoundSpec = serde_json::from_str(r#"{"type":"rain"}"#).unwrap();
        let mut recipe = build(&mut ctx, &spec, &noise, dest);

        assert_eq!(recipe.label(), "Unknown");
        assert!(recipe.nodes().is_empty());
        recipe.start(0.0);
        recipe.stop(1.0);
        recipe.dispose(&mut ctx);
        assert_eq!(ctx.node_count(), 1);
    }

    #[test]
    fn dispose_removes_every_node_once() {
        let (mut ctx, dest, noise) = setup();
        let baseline = ctx.node_count();
        let spec = SoundSpec::tactile(TactileParams::default());
        let mut recipe = build(&mut ctx, &spec, &noise, dest);
        assert!(ctx.node_count() > baseline);

        recipe.dispose(&mut ctx);
        recipe.dispose(&mut ctx);
        assert!(recipe.is_disposed());
        assert_eq!(ctx.node_count(), baseline);
        assert!(ctx.contains(dest));
    }

    #[test]
    fn binaural_tones_straddle_the_beat() {
        let (mut ctx, dest, noise) = setup();
        let spec = SoundSpec::binaural(BinauralParams { carrier: 200.0, beat: 10.0, ..Default::default() });
        let recipe = build(&mut ctx, &spec, &noise, dest);
        assert_eq!(recipe.tones(), &[200.0, 210.0]);
    }

    #[test]
    fn plain_noise_has_no_modulators() {
        let (mut ctx, dest, noise) = setup();
        let recipe = build(&mut ctx, &SoundSpec::noise(NoiseParams::default()), &noise, dest);
        assert!(recipe.lfos().is_empty());
        assert_eq!(recipe.sources().len(), 1);
        assert!(recipe.tones().is_empty());
    }
}
