//! Key/value settings commands

use super::open_context;
use anyhow::{bail, Context, Result};
use mirror_cli::AppPaths;
use mirror_core::{DynamicValue, ValueKind};
use owo_colors::OwoColorize;

pub async fn run_list(paths: &AppPaths) -> Result<()> {
    let settings = open_context(paths)?.settings();

    if settings.is_empty() {
        println!("{}", "No settings stored".dimmed());
        return Ok(());
    }

    let width = settings.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in settings.iter() {
        println!(
            "{:width$}  {} {}",
            key.cyan(),
            value,
            format!("({})", value.kind()).dimmed(),
            width = width
        );
    }
    Ok(())
}

pub async fn run_get(paths: &AppPaths, key: &str) -> Result<()> {
    let settings = open_context(paths)?.settings();
    match settings.get_value(key) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => bail!("No setting named '{}'", key),
    }
}

pub async fn run_set(paths: &AppPaths, key: &str, value: &str, kind: &str) -> Result<()> {
    let kind: ValueKind = kind.parse()?;
    let value = DynamicValue::parse(kind, value).context("Invalid value")?;

    let ctx = open_context(paths)?;
    let shown = value.to_string();
    ctx.update_settings(|settings| settings.insert(key, value))?;

    println!("{} {} = {} {}", "✓".green(), key.cyan(), shown, format!("({})", kind).dimmed());
    Ok(())
}

pub async fn run_unset(paths: &AppPaths, key: &str) -> Result<()> {
    let ctx = open_context(paths)?;
    match ctx.update_settings(|settings| settings.remove(key))? {
        Some(_) => {
            println!("{} Removed {}", "✓".green(), key.cyan());
            Ok(())
        }
        None => bail!("No setting named '{}'", key),
    }
}
