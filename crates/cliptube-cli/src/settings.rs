use anyhow::{bail, Context, Result};

use cliptube_core::config::AppConfig;

pub const KEYS: &[&str] = &[
    "general.watch_clipboard",
    "general.poll_interval_ms",
    "history.size",
    "player.volume",
    "player.command",
];

/// Set one dotted config key from its string form.
pub fn apply(config: &mut AppConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "general.watch_clipboard" => config.general.watch_clipboard = parse_bool(value)?,
        "general.poll_interval_ms" => {
            config.general.poll_interval_ms = value
                .parse()
                .with_context(|| format!("invalid interval `{value}`"))?;
        }
        "history.size" => {
            config.history.size = value
                .parse()
                .with_context(|| format!("invalid history size `{value}`"))?;
        }
        "player.volume" => {
            config.player.volume = value
                .parse()
                .with_context(|| format!("invalid volume `{value}`"))?;
        }
        "player.command" => {
            if value.trim().is_empty() {
                bail!("player command cannot be empty");
            }
            config.player.command = value.to_string();
        }
        _ => bail!("unknown key `{key}` (expected one of: {})", KEYS.join(", ")),
    }
    Ok(())
}

pub fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("expected on/off, got `{value}`"),
    }
}
