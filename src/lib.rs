//! Generative soundscapes: colored noise beds, binaural beats and tactile
//! tones, built as small audio graphs from a serializable [`SoundSpec`].
//!
//! ```no_run
//! use soundscape::{EngineConfig, PlaybackEngine, SoundSpec};
//!
//! let mut engine = PlaybackEngine::init(EngineConfig::default())?;
//! let spec: SoundSpec = serde_json::from_str(r#"{"type":"noise","params":{"color":"brown"}}"#)?;
//! engine.play(spec);
//! loop {
//!     engine.pump();
//!     std::thread::sleep(std::time::Duration::from_millis(5));
//! }
//! # Ok::<(), soundscape::EngineError>(())
//! ```

pub mod color;
pub mod config;
pub mod context;
pub mod device;
pub mod engine;
pub mod error;
mod graph;
pub mod modulation;
pub mod node;
pub mod nodes;
pub mod param;
pub mod random;
pub mod recipe;
pub mod render;
pub mod sound;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use context::{AudioContext, Handle};
pub use device::CpalDevice;
pub use engine::{EngineState, PlaybackEngine};
pub use error::{EngineError, Result};
pub use modulation::{Lfo, Waveform};
pub use node::{AudioNode, NodeId, ProcessContext};
pub use random::{GeneratorMode, RecipeGenerator};
pub use recipe::Recipe;
pub use render::{RenderedWav, Renderer};
pub use sound::{normalize, SoundParams, SoundSpec};
