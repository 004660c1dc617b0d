//! Configuration management commands.

use console::style;

use crate::cli::icons::{dim_arrow, info};
use crate::config::{Config, Settings};

/// Show the effective configuration.
pub async fn cmd_config_show(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults (no config file found)".to_string());
    println!("{} Config: {}", info(), style(source).bold());

    println!("  {} text_dir: {}", dim_arrow(), settings.text_dir.display());
    println!("  {} output: {}", dim_arrow(), settings.output.display());
    for (category, root) in &settings.content_roots {
        println!("  {} content.{}: {}", dim_arrow(), category, root.display());
    }
    println!(
        "  {} reviewer: {} at {} ({})",
        dim_arrow(),
        settings.reviewer.provider.as_str(),
        settings.reviewer.endpoint(),
        settings.reviewer.models().join(", ")
    );
    if let Some(hint) = settings.reviewer.availability_hint() {
        println!("    {} {}", style("!").yellow(), hint);
    }

    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
