use crate::output::print_json;
use crate::session::Session;
use actlab_core::config::WarnLevel;
use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration (key masked)
    Show,
    /// Validate the config for common mistakes
    Validate,
}

pub fn run(session: &Session, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(session, json),
        ConfigSubcommand::Validate => validate(session, json),
    }
}

fn show(session: &Session, json: bool) -> anyhow::Result<()> {
    let mut config = session.config()?;
    if let Some(key) = config.key.as_mut() {
        *key = mask(key);
    }
    if json {
        print_json(&config)
    } else {
        let yaml = serde_yaml::to_string(&config).context("failed to render config")?;
        print!("{yaml}");
        Ok(())
    }
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{visible}…")
}

fn validate(session: &Session, json: bool) -> anyhow::Result<()> {
    let config = session.config()?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
