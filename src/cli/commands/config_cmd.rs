//! config commands - Read and change configuration.

use anyhow::Result;

use super::load_config;
use crate::cli::Context;
use crate::core::config::Config;
use crate::ui::output;

/// Print one config value.
pub fn config_get(ctx: &Context, key: &str) -> Result<()> {
    let config = load_config(ctx)?;
    match config.get(key)? {
        Some(value) => output::print(value, ctx.verbosity()),
        None => output::print(format!("{key} is not set"), ctx.verbosity()),
    }
    Ok(())
}

/// Set one config value.
pub fn config_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = match &ctx.config {
        Some(path) if path.exists() => Config::load_from(path)?,
        Some(_) => Config::default(),
        None => Config::load()?,
    };
    config.set(key, value)?;
    let path = match &ctx.config {
        Some(path) => {
            config.save_to(path)?;
            path.clone()
        }
        None => config.save()?,
    };
    output::print(
        format!("Set {key} in {}", path.display()),
        ctx.verbosity(),
    );
    Ok(())
}

/// List all config keys and values.
pub fn config_list(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    for key in Config::keys() {
        let value = config.get(key)?.unwrap_or_else(|| "(unset)".to_string());
        // Never echo credentials
        let shown = if *key == "token" && value != "(unset)" {
            "(set)".to_string()
        } else {
            value
        };
        output::print(format!("{key} = {shown}"), ctx.verbosity());
    }
    Ok(())
}
