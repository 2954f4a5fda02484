use anyhow::bail;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::process::ExitCode;
use tracing::{error, info};
use volley::{CancellationToken, Engine, Registry};
use volley_cli::{cli::Cli, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.log_level, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let registry = Registry::global();
    if cli.list {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.benchmarks.is_empty() {
        bail!("Insufficient benchmarks requested");
    }
    let benchmarks = registry.select(&cli.benchmarks)?;
    let config = cli.run_config()?;
    let metrics = PrometheusBuilder::new().install_recorder()?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("User requested interrupt");
                cancel.cancel();
            }
        }
    });

    let engine = Engine::new(config);
    if let Err(err) = engine.run_all(&benchmarks, &cancel).await {
        error!("Failed to run benchmark: {err}");
        return Ok(ExitCode::FAILURE);
    }

    match cli.push_target() {
        Ok(Some(target)) => {
            if let Err(err) = target.push(metrics.render()).await {
                error!("Failed to push metrics: {err}");
            }
        }
        Ok(None) => {}
        Err(err) => error!("Failed to push metrics: {err}"),
    }

    Ok(ExitCode::SUCCESS)
}
