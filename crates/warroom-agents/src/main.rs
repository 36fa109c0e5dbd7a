use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use deliberation::{EngineEvent, EventBus};
use tokio_util::sync::CancellationToken;
use tracing::info;
use warroom_agents::{Engine, EngineConfig, HttpGateway, IntakeData};

/// Adversarial consulting debate engine.
#[derive(Debug, Parser)]
#[command(name = "warroom-agents", version, about)]
struct Cli {
    /// Intake form as a TOML file.
    #[arg(long)]
    intake: PathBuf,

    /// Engine config TOML (defaults come from env + built-ins).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the maximum debate rounds.
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Override the inter-turn cooldown in seconds.
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// Write the final report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(max_rounds) = cli.max_rounds {
        config.max_rounds = max_rounds;
    }
    if let Some(cooldown_secs) = cli.cooldown_secs {
        config.cooldown_secs = cooldown_secs;
    }

    let intake = IntakeData::from_toml_file(&cli.intake)?;
    let gateway = Arc::new(HttpGateway::new(&config)?);
    let events = EventBus::new().shared();

    // Ctrl-C cancels the run; any in-flight turn is discarded.
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    // Print the live transcript as turns land.
    let mut rx = events.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                EngineEvent::PhaseStarted { phase } => println!("== {phase} =="),
                EngineEvent::TurnCompleted { turn } => {
                    println!(
                        "[{} - ROUND {}]: {}\n",
                        turn.agent.to_string().to_uppercase(),
                        turn.round,
                        turn.text
                    );
                }
                EngineEvent::TurnDegraded { agent, round } => {
                    eprintln!("(degraded: {agent} round {round})");
                }
                _ => {}
            }
        }
    });

    info!(max_rounds = config.max_rounds, "war room opening");
    let engine = Engine::new(gateway, config, events);
    let report = engine.run(intake, &cancel).await?;
    printer.abort();

    if report.outcome.cancelled {
        info!("run cancelled before a verdict");
        return Ok(());
    }

    let text = report.report.unwrap_or_default();
    match &cli.out {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{text}"),
    }

    Ok(())
}
