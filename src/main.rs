use anyhow::{Context, Result};
use clap::Parser;
use squawk::integration::{SpeechService, SquawkConfig};
use squawk::settings::AudioSettings;
use squawk::speech::normalize_text_for_speech;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Speak flight-telemetry status messages read from stdin, one per line
#[derive(Debug, Parser)]
#[command(name = "squawk", author, version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "SQUAWK_CONFIG")]
    config: Option<PathBuf>,

    /// Start with audio muted
    #[arg(long, default_value_t = false)]
    muted: bool,

    /// Do not start a synthesizer; log messages as text
    #[arg(long = "no-backend", default_value_t = false)]
    no_backend: bool,

    /// Speak normalized English instead of the Spanish phrases
    #[arg(long = "no-translate", default_value_t = false)]
    no_translate: bool,

    /// Synthesizer program (overrides the configuration file)
    #[arg(long)]
    program: Option<String>,

    /// Print the spoken form of each line and exit at end of input
    #[arg(long = "normalize-only", default_value_t = false)]
    normalize_only: bool,
}

impl Cli {
    fn load_config(&self) -> Result<SquawkConfig> {
        let mut config = match &self.config {
            Some(path) => SquawkConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => SquawkConfig::default(),
        };

        if self.muted {
            config = config.muted();
        }
        if self.no_backend {
            config = config.without_backend();
        }
        if self.no_translate {
            config = config.without_translation();
        }
        if let Some(program) = &self.program {
            config.backend.program = program.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squawk=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    if cli.normalize_only {
        let translator = config.translator();
        for line in std::io::stdin().lock().lines() {
            let line = line?;
            println!("{}", translator.translate(&normalize_text_for_speech(&line)));
        }
        return Ok(());
    }

    info!("Starting squawk");

    let settings = AudioSettings::new(config.muted);
    let (service, handle) = SpeechService::new(config, settings)?;
    let worker = service.start();

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        handle.say(line)?;
    }

    // Let queued messages reach the synthesizer before exiting
    handle.drain()?;
    if worker.join().is_err() {
        anyhow::bail!("speech service thread panicked");
    }

    Ok(())
}
