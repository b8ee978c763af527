//! Remove a watch

use super::open_context;
use anyhow::Result;
use mirror_cli::AppPaths;
use owo_colors::OwoColorize;

pub async fn run(paths: &AppPaths, name: &str) -> Result<()> {
    let ctx = open_context(paths)?;
    let removed = ctx.remove_watch(name)?;

    println!("{} Removed watch {}", "✓".green(), removed.name.bold());
    println!(
        "{}",
        format!("Files in {} were left in place", removed.sync_dir.display()).dimmed()
    );
    Ok(())
}
