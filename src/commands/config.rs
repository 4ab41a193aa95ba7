// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::AppContext;
use crate::config::{self, Config};
use anyhow::Result;
use tracing::info;

/// Get or set a configuration key.
///
/// Getting prints the effective value after all layers; setting writes the
/// config file.
pub fn run(ctx: &AppContext, key: &str, value: Option<String>) -> Result<()> {
    let file = ctx
        .config_path
        .clone()
        .or_else(Config::default_path)
        .ok_or_else(|| anyhow::anyhow!("No config directory on this platform, pass --config"))?;

    match value {
        Some(v) => {
            info!("Setting {} = {}", key, v);
            config::set_key(&file, key, &v)?;
            println!("{} = {} ({})", key, v, file.display());
        }
        None => {
            // Validates the key even though the effective value comes from ctx
            let stored = config::get_key(&file, key)?;
            let effective = match key {
                "data_dir" => Some(ctx.config.data_dir.display().to_string()),
                "substances_path" => ctx.config.substances_path.as_ref().map(|p| p.display().to_string()),
                "timeline_weight" => Some(ctx.config.timeline_weight.to_string()),
                "interaction_window_hours" => Some(ctx.config.interaction_window_hours.to_string()),
                _ => ctx.config.log_level.clone().or(stored),
            };
            match effective {
                Some(v) => println!("{v}"),
                None => println!("{}", ctx.dim("(unset)")),
            }
        }
    }
    Ok(())
}
