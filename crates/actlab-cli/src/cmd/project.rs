use super::{apply, params, parse_assignment, print_models, report, show, Assignment};
use crate::output::{cell, print_table};
use crate::session::Session;
use actlab_core::Client;
use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// List projects
    List,
    /// Show one project
    Show { id: i64 },
    /// Create a project from key=value fields
    New {
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<Assignment>,
    },
    /// Change fields of a project (value `null` clears a field)
    Set {
        id: i64,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<Assignment>,
    },
    /// Mark a project completed
    Complete { id: i64 },
}

pub fn run(session: &Session, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    let client = session.connect()?;
    match subcmd {
        ProjectSubcommand::List => list(&client, json),
        ProjectSubcommand::Show { id } => {
            let project = client
                .get_project(id)
                .with_context(|| format!("project {id} not found"))?;
            show(&project, json)
        }
        ProjectSubcommand::New { fields } => {
            let project = client
                .new_project(&params(&fields))
                .context("failed to create project")?;
            report("Created", &project, json)
        }
        ProjectSubcommand::Set { id, fields } => {
            let mut project = client
                .get_project(id)
                .with_context(|| format!("project {id} not found"))?;
            let cleared = apply(&mut project, &fields)?;
            client
                .save_project(&mut project, &cleared)
                .with_context(|| format!("failed to save project {id}"))?;
            report("Updated", &project, json)
        }
        ProjectSubcommand::Complete { id } => {
            let mut project = client
                .get_project(id)
                .with_context(|| format!("project {id} not found"))?;
            client
                .complete_project(&mut project)
                .with_context(|| format!("failed to complete project {id}"))?;
            report("Completed", &project, json)
        }
    }
}

fn list(client: &Client, json: bool) -> anyhow::Result<()> {
    let projects = client.get_projects().context("failed to list projects")?;
    if json {
        return print_models(&projects);
    }
    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }
    let rows = projects
        .iter()
        .map(|p| vec![cell(p.id()), cell(p.name()), cell(p.status())])
        .collect();
    print_table(&["ID", "NAME", "STATUS"], rows);
    Ok(())
}
