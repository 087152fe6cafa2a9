use super::{print_models, report};
use crate::output::{cell, print_table};
use crate::session::Session;
use actlab_core::resource::{Comment, Notebook, Page, Project, Task};
use actlab_core::{Client, Model};
use anyhow::Context;
use clap::{Args, Subcommand};

/// The entity a comment belongs to. The most specific flag wins.
#[derive(Args)]
pub struct TargetArgs {
    #[arg(long)]
    project: i64,
    /// Task id within the project
    #[arg(long)]
    task: Option<i64>,
    #[arg(long)]
    notebook: Option<i64>,
    /// Page id; `--notebook` is optional
    #[arg(long)]
    page: Option<i64>,
}

#[derive(Subcommand)]
pub enum CommentSubcommand {
    /// List comments on a project, task, notebook or page
    List {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Add a comment
    Add {
        #[command(flatten)]
        target: TargetArgs,
        body: String,
    },
}

enum Target<'c> {
    Project(Model<'c, Project>),
    Task(Model<'c, Task>),
    Notebook(Model<'c, Notebook>),
    Page(Model<'c, Page>),
}

impl<'c> Target<'c> {
    fn load(client: &'c Client, args: &TargetArgs) -> anyhow::Result<Self> {
        let project = args.project;
        let target = match (args.task, args.notebook, args.page) {
            (_, notebook, Some(page)) => {
                Target::Page(client.get_notebook_page(project, page, notebook)?)
            }
            (Some(task), _, None) => Target::Task(client.get_task(project, task)?),
            (None, Some(notebook), None) => {
                Target::Notebook(client.get_notebook(project, notebook)?)
            }
            (None, None, None) => Target::Project(client.get_project(project)?),
        };
        Ok(target)
    }

    fn comments(&self) -> actlab_core::Result<Vec<Model<'c, Comment>>> {
        match self {
            Target::Project(m) => m.comments(),
            Target::Task(m) => m.comments(),
            Target::Notebook(m) => m.comments(),
            Target::Page(m) => m.comments(),
        }
    }

    fn comment(&self, body: &str) -> actlab_core::Result<Model<'c, Comment>> {
        match self {
            Target::Project(m) => m.comment(body),
            Target::Task(m) => m.comment(body),
            Target::Notebook(m) => m.comment(body),
            Target::Page(m) => m.comment(body),
        }
    }
}

pub fn run(session: &Session, subcmd: CommentSubcommand, json: bool) -> anyhow::Result<()> {
    let client = session.connect()?;
    match subcmd {
        CommentSubcommand::List { target } => {
            let target = Target::load(&client, &target).context("comment target not found")?;
            let comments = target.comments().context("failed to list comments")?;
            if json {
                return print_models(&comments);
            }
            if comments.is_empty() {
                println!("No comments.");
                return Ok(());
            }
            let rows = comments
                .iter()
                .map(|c| {
                    vec![
                        cell(c.id()),
                        cell(c.creator()),
                        cell(c.created_on()),
                        cell(c.body()),
                    ]
                })
                .collect();
            print_table(&["ID", "BY", "ON", "BODY"], rows);
            Ok(())
        }
        CommentSubcommand::Add { target, body } => {
            let target = Target::load(&client, &target).context("comment target not found")?;
            let comment = target.comment(&body).context("failed to add comment")?;
            report("Added", &comment, json)
        }
    }
}
