//! Post-commit synchronisation.
//!
//! A tracked file opts in with a marker line such as
//!
//! ```text
//! $$actlab: {"project": 3, "notebook": 9, "page": 40, "update": "body"}
//! ```
//!
//! After each commit the file body, minus that line, is written into the
//! named field of the page, notebook or project it points at.

use crate::client::Client;
use crate::error::{ActLabError, Result};
use crate::markdown;
use crate::model::Model;
use crate::paths;
use crate::resource::{Resource, ResourceKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

pub const MARKER: &str = "$$actlab:";

/// Line written into installed hook scripts so they can be recognised later.
pub const HOOK_SIGNATURE: &str = "# installed by actlab";

// ---------------------------------------------------------------------------
// Directive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub project: i64,
    /// Field of the target that receives the file body.
    pub update: String,
    #[serde(default)]
    pub notebook: Option<i64>,
    #[serde(default)]
    pub page: Option<i64>,
}

impl Directive {
    pub fn target(&self) -> ResourceKind {
        match (self.notebook, self.page) {
            (_, Some(_)) => ResourceKind::Page,
            (Some(_), None) => ResourceKind::Notebook,
            (None, None) => ResourceKind::Project,
        }
    }
}

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\$actlab:\s*(\{.*\})")
            .unwrap_or_else(|e| panic!("invalid marker regex: {e}"))
    })
}

/// Parse the directive on the first marker line. `Ok(None)` when the text
/// has no marker.
pub fn find_directive(text: &str) -> Result<Option<Directive>> {
    let Some(line) = text.lines().find(|l| l.contains(MARKER)) else {
        return Ok(None);
    };
    let json = marker_regex()
        .captures(line)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ActLabError::Client(format!("marker is not followed by json: '{line}'")))?;
    Ok(Some(serde_json::from_str(json.as_str())?))
}

/// Remove the first marker line, including its line ending.
pub fn strip_marker(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut stripped = false;
    for line in text.split_inclusive('\n') {
        if !stripped && line.contains(MARKER) {
            stripped = true;
            continue;
        }
        out.push_str(line);
    }
    out
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub file: PathBuf,
    pub target: ResourceKind,
    pub id: Option<i64>,
    pub name: Option<String>,
    pub field: String,
}

/// Push one changed file to the entity its marker names. Files without a
/// marker, binary files and files removed by the commit are skipped with
/// `Ok(None)`.
pub fn sync_file(
    client: &Client,
    root: &Path,
    relative: &Path,
    render_markdown: bool,
) -> Result<Option<SyncReport>> {
    let path = root.join(relative);
    if !path.is_file() {
        tracing::debug!(file = %relative.display(), "not a file, skipping");
        return Ok(None);
    }
    let contents = match String::from_utf8(std::fs::read(&path)?) {
        Ok(text) => text,
        Err(_) => {
            tracing::debug!(file = %relative.display(), "not utf-8 text, skipping");
            return Ok(None);
        }
    };
    let directive = match find_directive(&contents) {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(None),
        Err(e) => {
            return Err(ActLabError::Client(format!(
                "could not parse actlab directive in '{}': {e}",
                relative.display()
            )))
        }
    };

    let mut body = strip_marker(&contents);
    if render_markdown && paths::is_markdown(relative) {
        body = markdown::to_html(&body);
    }

    let project = directive.project;
    let (id, name) = match (directive.notebook, directive.page) {
        (notebook, Some(page_id)) => {
            let mut page = client.get_notebook_page(project, page_id, notebook)?;
            update(&mut page, &directive.update, body)?;
            (page.id(), page.name().map(str::to_string))
        }
        (Some(notebook_id), None) => {
            let mut notebook = client.get_notebook(project, notebook_id)?;
            update(&mut notebook, &directive.update, body)?;
            (notebook.id(), notebook.name().map(str::to_string))
        }
        (None, None) => {
            let mut project = client.get_project(project)?;
            update(&mut project, &directive.update, body)?;
            (project.id(), project.name().map(str::to_string))
        }
    };

    let report = SyncReport {
        file: relative.to_path_buf(),
        target: directive.target(),
        id,
        name,
        field: directive.update,
    };
    tracing::info!(
        file = %report.file.display(),
        target = %report.target,
        name = report.name.as_deref().unwrap_or(""),
        "synced"
    );
    Ok(Some(report))
}

fn update<R: Resource>(model: &mut Model<'_, R>, field: &str, value: String) -> Result<()> {
    model.set_field(field, value)?;
    model.save()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git").args(args).current_dir(dir).output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ActLabError::Git(format!("git {}: {stderr}", args.join(" "))));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn repo_toplevel(dir: &Path) -> Result<PathBuf> {
    git(dir, &["rev-parse", "--show-toplevel"]).map(PathBuf::from)
}

/// Files named in `git show --name-only` output: the trailing block of
/// non-empty lines.
pub fn changed_files(show_output: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = show_output
        .trim_end()
        .lines()
        .rev()
        .map(str::trim)
        .take_while(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect();
    files.reverse();
    files
}

pub fn head_changed_files(root: &Path) -> Result<Vec<PathBuf>> {
    Ok(changed_files(&git(root, &["show", "--name-only", "HEAD"])?))
}

// ---------------------------------------------------------------------------
// Install
// ---------------------------------------------------------------------------

pub fn hook_script(exe: &Path) -> String {
    format!(
        "#!/bin/sh\n{HOOK_SIGNATURE}\nexec \"{}\" hook post-commit\n",
        exe.display()
    )
}

/// Write the post-commit hook. A foreign hook is only replaced with `force`.
pub fn install_hook(root: &Path, exe: &Path, force: bool) -> Result<PathBuf> {
    if !root.join(paths::GIT_DIR).is_dir() {
        return Err(ActLabError::Git(format!(
            "'{}' is not a git repository",
            root.display()
        )));
    }
    let path = paths::post_commit_hook_path(root);
    if path.exists() && !force {
        let existing = std::fs::read_to_string(&path)?;
        if !existing.contains(HOOK_SIGNATURE) {
            return Err(ActLabError::Client(format!(
                "'{}' exists and was not installed by actlab, use --force to replace it",
                path.display()
            )));
        }
    }
    crate::io::write_executable(&path, hook_script(exe).as_bytes())?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
