use super::report;
use crate::session::Session;
use actlab_core::form::Upload;
use anyhow::Context;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum FileSubcommand {
    /// Upload a file into a project's files section
    Add {
        project: i64,
        path: PathBuf,
        /// File name to use instead of the path's
        #[arg(long)]
        name: Option<String>,
        /// MIME type sent with the upload (default application/octet-stream)
        #[arg(long)]
        mime_type: Option<String>,
    },
}

pub fn run(session: &Session, subcmd: FileSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        FileSubcommand::Add {
            project,
            path,
            name,
            mime_type,
        } => {
            let mut upload = Upload::resolve(Some(path.clone()), None, name)
                .with_context(|| format!("cannot read '{}'", path.display()))?;
            if let Some(mime_type) = mime_type {
                upload = upload.with_mime_type(mime_type);
            }
            let client = session.connect()?;
            let file = client
                .add_file(project, upload)
                .with_context(|| format!("failed to upload '{}'", path.display()))?;
            report("Uploaded", &file, json)
        }
    }
}
