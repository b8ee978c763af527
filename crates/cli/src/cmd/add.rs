//! Add a watched directory

use super::open_context;
use anyhow::Result;
use mirror_cli::{util, AppPaths};
use mirror_core::{ConfigError, WatchRequest};
use owo_colors::OwoColorize;

pub async fn run(paths: &AppPaths, request: WatchRequest, now: bool) -> Result<()> {
    let ctx = open_context(paths)?;

    let config = match ctx.add_watch(request) {
        Ok(config) => config,
        Err(e) => {
            if let Some(invalid) = e.downcast_ref::<ConfigError>() {
                eprintln!("{}", "Cannot add watch:".red().bold());
                for message in invalid.messages() {
                    eprintln!("  {} {}", "•".red(), message);
                }
            }
            return Err(e);
        }
    };

    println!("{} Added watch {}", "✓".green(), config.name.bold());
    util::display_watch(&config, false);

    if now {
        if !config.is_active() {
            println!(
                "{}",
                "Neither --auto-add nor --auto-delete is set; nothing to reconcile".yellow()
            );
            return Ok(());
        }
        super::sync::run_with_spinner(&ctx, &config.name).await?;
    }

    Ok(())
}
