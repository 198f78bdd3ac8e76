use anyhow::{Context, Result};
use clap::Parser;
use clinscribe::cli::{Cli, Commands};
use clinscribe::config::Config;
use clinscribe::engines::command::{CommandDiarizer, CommandSpeechEngine, CommandTextGenerator};
use clinscribe::engines::{EngineSet, PassthroughAligner};
use clinscribe::exec::{CommandExecutor, SystemCommandExecutor};
use clinscribe::pipeline::{Orchestrator, PipelineSettings};
use clinscribe::warmup::WarmupCoordinator;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Process { audio } => {
            run_process(config, audio, cli.quiet, cli.verbose).await?;
        }
        Commands::Preload => {
            run_preload(config)?;
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/clinscribe/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Build the engine set from the configured external commands.
fn build_engines(config: &Config) -> Result<EngineSet> {
    let executor: Arc<dyn CommandExecutor> = Arc::new(SystemCommandExecutor::new());

    let speech_command = config
        .engines
        .speech_command
        .as_deref()
        .context("engines.speech_command is not configured")?;
    let diarize_command = config
        .engines
        .diarize_command
        .as_deref()
        .context("engines.diarize_command is not configured")?;
    let generate_command = config
        .engines
        .generate_command
        .as_deref()
        .context("engines.generate_command is not configured")?;
    let verify_command = config
        .engines
        .verify_command
        .as_deref()
        .context("engines.verify_command is not configured")?;

    Ok(EngineSet {
        speech: Arc::new(CommandSpeechEngine::new(
            speech_command,
            Arc::clone(&executor),
        )?),
        aligner: Arc::new(PassthroughAligner),
        diarizer: Arc::new(CommandDiarizer::new(
            diarize_command,
            Arc::clone(&executor),
        )?),
        generator: Arc::new(CommandTextGenerator::new(
            generate_command,
            Arc::clone(&executor),
        )?),
        verifier: Arc::new(CommandTextGenerator::new(verify_command, executor)?),
    })
}

/// Run the full pipeline on one recording, streaming NDJSON to stdout.
async fn run_process(config: Config, audio: PathBuf, quiet: bool, verbose: u8) -> Result<()> {
    let engines = build_engines(&config)?;
    let orchestrator = Orchestrator::new(
        engines,
        Arc::new(SystemCommandExecutor::new()),
        &config.work_dir(),
    )
    .with_settings(PipelineSettings {
        generation_max_tokens: config.verification.generation_max_tokens,
        verify_max_tokens: config.verification.verify_max_tokens,
    });

    let mut stream = orchestrator.process(audio);
    let mut failed = false;

    while let Some(event) = stream.next().await {
        let line = event.to_ndjson()?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(line.as_bytes())?;
        stdout.flush()?;

        if !quiet {
            clinscribe::output::render_event(&event, verbose);
        }
        if matches!(event, clinscribe::StageEvent::Error { .. }) {
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Warm-load the engines, waiting for the background slot to finish.
fn run_preload(config: Config) -> Result<()> {
    let engines = build_engines(&config)?;
    let coordinator = WarmupCoordinator::new();

    if coordinator.spawn_preload(engines) {
        println!("Preloading started in background");
        while coordinator.is_in_flight() {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        println!("Engines preloaded");
    } else {
        println!("Preloading already in progress");
    }
    Ok(())
}
