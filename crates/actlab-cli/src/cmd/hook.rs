use crate::output::print_json;
use crate::session::Session;
use actlab_core::hook;
use anyhow::Context;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum HookSubcommand {
    /// Install the git post-commit hook in this repository
    Install {
        /// Replace an existing hook that actlab did not write
        #[arg(long)]
        force: bool,
    },
    /// Sync files changed by the last commit (run by the hook)
    PostCommit,
}

pub fn run(session: &Session, subcmd: HookSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        HookSubcommand::Install { force } => install(session, force),
        HookSubcommand::PostCommit => post_commit(session, json),
    }
}

fn install(session: &Session, force: bool) -> anyhow::Result<()> {
    let exe = actlab_exe()?;
    let path = hook::install_hook(&session.root, &exe, force)?;
    println!("installed: {}", path.display());
    Ok(())
}

fn actlab_exe() -> anyhow::Result<PathBuf> {
    match which::which("actlab") {
        Ok(path) => Ok(path),
        Err(_) => std::env::current_exe().context("cannot locate the actlab executable"),
    }
}

fn post_commit(session: &Session, json: bool) -> anyhow::Result<()> {
    let toplevel = hook::repo_toplevel(&session.root).context("not inside a git repository")?;
    let session = Session {
        root: toplevel,
        host: session.host.clone(),
        key: session.key.clone(),
        password: session.password.clone(),
    };
    let config = session.config()?;
    let client = session.connect()?;
    let files = hook::head_changed_files(&session.root).context("cannot list changed files")?;

    let mut reports = Vec::new();
    for file in files {
        match hook::sync_file(&client, &session.root, &file, config.render_markdown) {
            Ok(Some(report)) => {
                if !json {
                    println!(
                        "synced '{}' with {} '{}'",
                        report.file.display(),
                        report.target,
                        report.name.as_deref().unwrap_or("")
                    );
                }
                reports.push(report);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(file = %file.display(), "sync failed: {e}"),
        }
    }

    if json {
        print_json(&reports)?;
    }
    Ok(())
}
