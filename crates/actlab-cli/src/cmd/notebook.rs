use super::{apply, params, parse_assignment, print_models, report, show, Assignment};
use crate::output::{cell, print_table};
use crate::session::Session;
use actlab_core::resource::Page;
use actlab_core::Model;
use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum NotebookSubcommand {
    /// List notebooks of a project
    List { project: i64 },
    /// Show a notebook and its page tree
    Show { project: i64, id: i64 },
    /// Create a notebook from key=value fields
    New {
        project: i64,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<Assignment>,
    },
    /// Change fields of a notebook (value `null` clears a field)
    Set {
        project: i64,
        id: i64,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<Assignment>,
    },
}

pub fn run(session: &Session, subcmd: NotebookSubcommand, json: bool) -> anyhow::Result<()> {
    let client = session.connect()?;
    match subcmd {
        NotebookSubcommand::List { project } => {
            let notebooks = client
                .get_notebooks(project)
                .with_context(|| format!("failed to list notebooks of project {project}"))?;
            if json {
                return print_models(&notebooks);
            }
            if notebooks.is_empty() {
                println!("No notebooks.");
                return Ok(());
            }
            let rows = notebooks
                .iter()
                .map(|n| {
                    vec![
                        cell(n.id()),
                        cell(n.name()),
                        count_pages(n.subpages()).to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "PAGES"], rows);
            Ok(())
        }
        NotebookSubcommand::Show { project, id } => {
            let notebook = client
                .get_notebook(project, id)
                .with_context(|| format!("notebook {id} not found in project {project}"))?;
            show(&notebook, json)?;
            if !json && !notebook.subpages().is_empty() {
                println!();
                print_tree(notebook.subpages(), 0);
            }
            Ok(())
        }
        NotebookSubcommand::New { project, fields } => {
            let notebook = client
                .new_notebook(project, &params(&fields))
                .context("failed to create notebook")?;
            report("Created", &notebook, json)
        }
        NotebookSubcommand::Set {
            project,
            id,
            fields,
        } => {
            let mut notebook = client
                .get_notebook(project, id)
                .with_context(|| format!("notebook {id} not found in project {project}"))?;
            let cleared = apply(&mut notebook, &fields)?;
            client
                .save_notebook(&mut notebook, &cleared)
                .with_context(|| format!("failed to save notebook {id}"))?;
            report("Updated", &notebook, json)
        }
    }
}

fn count_pages(pages: &[Model<'_, Page>]) -> usize {
    pages.iter().map(|p| 1 + count_pages(p.subpages())).sum()
}

fn print_tree(pages: &[Model<'_, Page>], depth: usize) {
    for page in pages {
        println!(
            "{:indent$}{}  {}",
            "",
            cell(page.id()),
            page.name().unwrap_or(""),
            indent = depth * 2
        );
        print_tree(page.subpages(), depth + 1);
    }
}
