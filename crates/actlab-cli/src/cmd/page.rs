use super::{apply, params, parse_assignment, report, show, Assignment};
use crate::session::Session;
use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PageSubcommand {
    /// Show a notebook page
    Show {
        project: i64,
        id: i64,
        /// Notebook holding the page, when known
        #[arg(long)]
        notebook: Option<i64>,
    },
    /// Create a page in a notebook from key=value fields
    New {
        project: i64,
        notebook: i64,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<Assignment>,
    },
    /// Change fields of a page (value `null` clears a field)
    Set {
        project: i64,
        id: i64,
        #[arg(long)]
        notebook: Option<i64>,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<Assignment>,
    },
}

pub fn run(session: &Session, subcmd: PageSubcommand, json: bool) -> anyhow::Result<()> {
    let client = session.connect()?;
    match subcmd {
        PageSubcommand::Show {
            project,
            id,
            notebook,
        } => {
            let page = client
                .get_notebook_page(project, id, notebook)
                .with_context(|| format!("page {id} not found in project {project}"))?;
            show(&page, json)
        }
        PageSubcommand::New {
            project,
            notebook,
            fields,
        } => {
            let page = client
                .new_notebook_page(project, notebook, &params(&fields))
                .context("failed to create page")?;
            report("Created", &page, json)
        }
        PageSubcommand::Set {
            project,
            id,
            notebook,
            fields,
        } => {
            let mut page = client
                .get_notebook_page(project, id, notebook)
                .with_context(|| format!("page {id} not found in project {project}"))?;
            let cleared = apply(&mut page, &fields)?;
            client
                .save_notebook_page(&mut page, &cleared)
                .with_context(|| format!("failed to save page {id}"))?;
            report("Updated", &page, json)
        }
    }
}
