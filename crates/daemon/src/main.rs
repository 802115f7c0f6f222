// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bkd: periodic database dump and file-tree backup agent.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bk_adapters::ExternalTools;
use bk_core::{Config, SystemClock};
use bk_daemon::{env, lifecycle, logging, Engine, Scheduler};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "bkd", version, about = "Periodic database dump and file-tree backup agent")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logging is not up until the config names the log file.
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("bkd: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = match logging::init(&config.log_path) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("bkd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        db = %config.db.name,
        data = %config.data_path.display(),
        backups = %config.backups_path.display(),
        archive = %config.archive_path.display(),
        every_x_days = config.every_x_days,
        archive_after_x = config.archive_after_x,
        "starting backup daemon"
    );

    let started = lifecycle::startup(&config).context("startup check failed")?;
    let daemon = started.daemon;

    let tools = ExternalTools::new(config.tools.clone(), config.tool_timeout());
    let engine =
        Engine::new(config.clone(), tools, SystemClock, started.tracker, daemon.store.clone())?;

    let shutdown = CancellationToken::new();
    lifecycle::cancel_on_signal(shutdown.clone()).context("cannot install signal handlers")?;

    let interval = env::cycle_interval().unwrap_or_else(|| config.interval());
    let result = Scheduler::new(engine, interval, config.retry, shutdown)
        .with_max_cycles(env::max_cycles())
        .run()
        .await;

    daemon.shutdown();
    result?;
    Ok(())
}
