//! SCRC Client
//!
//! Launcher: builds the configuration, picks a driver and runs the session

use anyhow::{Context, Result};
use clap::Parser;
use scrc_client::{ClientConfig, Session, Stage};
use scrc_core::DrivingStrategy;
use scrc_drivers::{LiveControls, ManualDriver, MlpPredictor, ModelDriver, RuleDriver, StandardScaler};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "scrc-client")]
#[command(about = "Client for the SCRC simulated racing server")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults to <config dir>/scrc-client/config.json if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host IP address
    #[arg(long)]
    host: Option<String>,

    /// Host port number
    #[arg(long)]
    port: Option<u16>,

    /// Bot ID
    #[arg(long)]
    id: Option<String>,

    /// Maximum number of learning episodes
    #[arg(long = "max-episodes", alias = "maxEpisodes")]
    max_episodes: Option<u32>,

    /// Maximum number of steps
    #[arg(long = "max-steps", alias = "maxSteps")]
    max_steps: Option<u64>,

    /// Name of the track
    #[arg(long)]
    track: Option<String>,

    /// Stage (0 - Warm-Up, 1 - Qualifying, 2 - Race, 3 - Unknown)
    #[arg(long)]
    stage: Option<u8>,

    /// Drive with the trained model
    #[arg(long, conflicts_with = "rule")]
    autonomous: bool,

    /// Drive with the built-in rule-based heuristic
    #[arg(long)]
    rule: bool,

    /// Path to the model file
    #[arg(long)]
    model: Option<PathBuf>,

    /// Path to the feature scaler file
    #[arg(long)]
    scaler: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ClientConfig> {
        let file = match self.config {
            Some(path) => Some(path),
            None => ClientConfig::default_path().filter(|p| p.exists()),
        };
        let mut config = match file {
            Some(path) => {
                info!("Loading config from {}", path.display());
                ClientConfig::load(&path)?
            }
            None => ClientConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(id) = self.id {
            config.bot_id = id;
        }
        if let Some(max_episodes) = self.max_episodes {
            config.max_episodes = max_episodes;
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if self.track.is_some() {
            config.track = self.track;
        }
        if let Some(stage) = self.stage {
            config.stage = Stage::try_from(stage)?;
        }
        if self.autonomous {
            config.autonomous = true;
        }
        if self.rule && config.autonomous {
            warn!("--rule given, ignoring autonomous mode from the config file");
            config.autonomous = false;
        }
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(scaler) = self.scaler {
            config.scaler_path = scaler;
        }
        Ok(config)
    }
}

fn build_strategy(config: &ClientConfig, rule: bool) -> Result<Box<dyn DrivingStrategy>> {
    if config.autonomous {
        let predictor = MlpPredictor::load(&config.model_path)
            .with_context(|| format!("failed to load model {}", config.model_path.display()))?;
        let scaler = StandardScaler::load(&config.scaler_path)
            .with_context(|| format!("failed to load scaler {}", config.scaler_path.display()))?;
        info!("Loaded model and scaler");
        return Ok(Box::new(ModelDriver::new(Box::new(scaler), Box::new(predictor))));
    }

    if rule {
        return Ok(Box::new(RuleDriver::default()));
    }

    // Input capture lives outside this binary; it would write into these.
    warn!("Manual driver selected; no input source is attached");
    Ok(Box::new(ManualDriver::new(LiveControls::new())))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let rule = cli.rule;
    let config = cli.into_config()?;
    let strategy = build_strategy(&config, rule)?;

    let mut session = Session::connect(config, strategy).await?;
    let summary = session.run().await?;

    info!(
        "Session finished: {} episode(s), {} handshake attempt(s)",
        summary.episodes.len(),
        summary.handshake_attempts
    );
    for episode in &summary.episodes {
        info!(
            "Episode {}: {} steps, ended by {:?} after {}s",
            episode.episode,
            episode.steps,
            episode.end,
            (episode.ended_at - episode.started_at).num_seconds()
        );
    }

    Ok(())
}
