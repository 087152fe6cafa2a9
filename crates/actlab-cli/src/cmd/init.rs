use crate::session::Session;
use actlab_core::config::Config;
use actlab_core::paths;
use anyhow::Context;

pub struct InitOptions {
    pub base_path: String,
    pub email: Option<String>,
    pub no_markdown: bool,
    pub force: bool,
}

pub fn run(session: &Session, opts: InitOptions) -> anyhow::Result<()> {
    let config_path = paths::config_path(&session.root);
    if config_path.exists() && !opts.force {
        println!("  exists:  {}", paths::CONFIG_FILE);
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    let host = session
        .host
        .clone()
        .context("--host (or ACTLAB_HOST) is required for init")?;
    let mut config = Config::new(host);
    config.base_path = opts.base_path;
    config.key = session.key.clone();
    config.email = opts.email;
    config.render_markdown = !opts.no_markdown;

    println!("Initializing actlab in: {}", session.root.display());
    config
        .save(&session.root)
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    println!("  created: {}", paths::CONFIG_FILE);

    for warning in config.validate() {
        println!("  [{:?}] {}", warning.level, warning.message);
    }
    Ok(())
}
