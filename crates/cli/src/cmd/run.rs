//! Foreground watching until interrupted

use super::open_context;
use anyhow::{Context, Result};
use mirror_cli::{util, AppContext, AppPaths};
use owo_colors::OwoColorize;
use tokio::signal;
use tracing::{error, info};

pub async fn run(paths: &AppPaths, reconcile: bool) -> Result<()> {
    let ctx = open_context(paths)?;
    let log_dir = ctx.config().log_directory(&paths.data_dir);
    let _guard = util::init_daemon_logging(&ctx.config().log.level, &log_dir)?;
    info!("Logging to {}", log_dir.join("daemon.log").display());

    let started = ctx.start_all()?;
    if started == 0 {
        println!("{}", "No watches to run. Add one with 'mirror add'.".yellow());
        return Ok(());
    }

    if reconcile {
        for watch in ctx.watches().into_iter().filter(|w| w.is_active()) {
            match ctx.reconcile(&watch.name).await {
                Ok(report) => info!(
                    "Startup reconciliation of {}: {} copied, {} deleted, {} failed",
                    watch.name, report.copied, report.deleted, report.failed
                ),
                Err(e) => error!("Startup reconciliation of {} failed: {:#}", watch.name, e),
            }
        }
    }

    println!(
        "{} Watching {} director{}. Press Ctrl-C to stop.",
        "✓".green(),
        started,
        if started == 1 { "y" } else { "ies" }
    );
    #[cfg(unix)]
    println!("  Send SIGUSR1 (kill -USR1 {}) to synchronise now.", std::process::id());

    wait_for_shutdown(&ctx).await?;

    info!("Shutting down");
    ctx.shutdown()?;
    println!("{} Stopped", "✓".green());
    Ok(())
}

/// Block until Ctrl-C or SIGTERM; SIGUSR1 forces a synchronise meanwhile
async fn wait_for_shutdown(ctx: &AppContext) -> Result<()> {
    #[cfg(unix)]
    {
        use signal::unix::SignalKind;

        let mut terminate =
            signal::unix::signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        let mut sync_now =
            signal::unix::signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;
        loop {
            tokio::select! {
                result = signal::ctrl_c() => {
                    result.context("Failed to listen for Ctrl-C")?;
                    break;
                }
                _ = terminate.recv() => {
                    info!("Received SIGTERM");
                    break;
                }
                _ = sync_now.recv() => {
                    let count = ctx.enact_all();
                    info!("Received SIGUSR1, synchronised {} watches", count);
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctx;
        signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    }

    Ok(())
}
