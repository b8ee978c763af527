//! One-shot reconciliation of a watch

use super::open_context;
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use mirror_cli::{AppContext, AppPaths};
use mirror_watcher::ReconcileReport;
use owo_colors::OwoColorize;
use std::time::Duration;

pub async fn run(paths: &AppPaths, name: &str) -> Result<()> {
    let ctx = open_context(paths)?;

    let Some(config) = ctx.watch(name) else {
        bail!("No watch named '{}'. Use 'mirror list' to see watches.", name);
    };
    if !config.is_active() {
        println!(
            "{}",
            format!("Watch '{}' has neither auto-add nor auto-delete; nothing to do", name).yellow()
        );
        return Ok(());
    }

    run_with_spinner(&ctx, name).await
}

/// Reconcile with a spinner, then print the report
pub async fn run_with_spinner(ctx: &AppContext, name: &str) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Reconciling {}", name));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = ctx.reconcile(name).await;
    spinner.finish_and_clear();

    let report = result?;
    print_report(name, &report);
    Ok(())
}

fn print_report(name: &str, report: &ReconcileReport) {
    println!("{} Reconciled {}", "✓".green(), name.bold());
    println!(
        "  {} copied {}",
        report.copied,
        format!("({} unchanged)", report.unchanged).dimmed()
    );
    println!("  {} deleted", report.deleted);
    if report.failed > 0 {
        println!("  {}", format!("{} failed", report.failed).red());
    }
}
