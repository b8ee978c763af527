//! List watches

use super::open_context;
use anyhow::Result;
use mirror_cli::{util, AppPaths};
use owo_colors::OwoColorize;

pub async fn run(paths: &AppPaths) -> Result<()> {
    let ctx = open_context(paths)?;
    let watches = ctx.watches();

    if watches.is_empty() {
        println!("{}", "No watches. Add one with 'mirror add <watch> <sync>'.".dimmed());
        return Ok(());
    }

    println!("{} ({})\n", "Watches".bold(), watches.len());
    for (i, watch) in watches.iter().enumerate() {
        if i > 0 {
            println!();
        }
        util::display_watch(watch, ctx.is_running(&watch.name));
    }
    Ok(())
}
