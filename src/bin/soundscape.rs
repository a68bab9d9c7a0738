//! soundscape - render, generate and play sound specs from the command line

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use soundscape::{EngineConfig, EngineState, GeneratorMode, PlaybackEngine, RecipeGenerator, Renderer, SoundSpec};

#[derive(Parser)]
#[command(name = "soundscape")]
#[command(about = "Generative soundscape engine")]
#[command(version)]
struct Cli {
    /// Engine config (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a spec to a 16-bit WAV file
    Render {
        /// Sound spec as JSON
        #[arg(short, long)]
        spec: String,

        /// Output file (defaults to a name derived from the label)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Length in seconds, overriding the spec
        #[arg(short, long)]
        duration: Option<f64>,
    },

    /// Print a random spec as JSON
    Random {
        #[arg(short, long, default_value_t = GeneratorMode::Ambient)]
        mode: GeneratorMode,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Play a spec on the default output device
    Play {
        /// Sound spec as JSON
        #[arg(short, long)]
        spec: String,

        /// How long to play before fading out
        #[arg(long, default_value_t = 30.0)]
        seconds: f64,
    },
}

fn main() -> soundscape::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Render { spec, out, duration } => {
            let mut spec = SoundSpec::from_json(&spec)?;
            if let Some(seconds) = duration {
                spec = spec.with_duration(seconds);
            }

            let hint = out.as_ref().and_then(|p| p.file_name()).map(|n| n.to_string_lossy().into_owned());
            let wav = Renderer::new(config).render(&spec, hint.as_deref())?;
            let path = out.unwrap_or_else(|| PathBuf::from(&wav.file_name));
            std::fs::write(&path, &wav.bytes)?;
            println!("{}", path.display());
        }

        Commands::Random { mode, seed } => {
            let spec = RecipeGenerator::new(seed.or(config.noise_seed)).generate(mode);
            println!("{}", spec.to_json()?);
        }

        Commands::Play { spec, seconds } => {
            let spec = SoundSpec::from_json(&spec)?;
            let mut engine = PlaybackEngine::init(config)?;
            let label = engine.play(spec);
            println!("{label}");

            let started = Instant::now();
            let mut stopping = false;
            loop {
                engine.pump();
                if !stopping && started.elapsed().as_secs_f64() >= seconds {
                    engine.stop(None);
                    stopping = true;
                }
                if stopping && engine.state() == EngineState::Idle {
                    break;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            engine.shutdown();
        }
    }

    Ok(())
}
