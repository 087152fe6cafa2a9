use super::{apply, params, parse_assignment, print_models, report, show, Assignment};
use crate::output::{cell, print_fields, print_json, print_table};
use crate::session::Session;
use actlab_core::form::Upload;
use actlab_core::Client;
use anyhow::Context;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// List open tasks of a project
    List {
        project: i64,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Show one task by id
    Show { project: i64, id: i64 },
    /// Create a task from key=value fields
    New {
        project: i64,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<Assignment>,
    },
    /// Change fields of a task (value `null` clears a field)
    Set {
        project: i64,
        id: i64,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<Assignment>,
    },
    /// Mark a task completed
    Complete { project: i64, id: i64 },
    /// Upload a file and attach it to a task
    Attach {
        project: i64,
        id: i64,
        path: PathBuf,
        /// File name to use instead of the path's
        #[arg(long)]
        name: Option<String>,
        /// MIME type sent with the upload (default application/octet-stream)
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// List task lists of a project, or show one by id
    Lists { project: i64, id: Option<i64> },
    /// List task labels
    Labels,
}

pub fn run(session: &Session, subcmd: TaskSubcommand, json: bool) -> anyhow::Result<()> {
    let client = session.connect()?;
    match subcmd {
        TaskSubcommand::List { project, all } => list(&client, project, all, json),
        TaskSubcommand::Show { project, id } => {
            let task = client
                .get_task(project, id)
                .with_context(|| format!("task {id} not found in project {project}"))?;
            show(&task, json)
        }
        TaskSubcommand::New { project, fields } => {
            let task = client
                .new_task_api(project, &params(&fields))
                .context("failed to create task")?;
            report("Created", &task, json)
        }
        TaskSubcommand::Set {
            project,
            id,
            fields,
        } => {
            let mut task = client
                .get_task(project, id)
                .with_context(|| format!("task {id} not found in project {project}"))?;
            let cleared = apply(&mut task, &fields)?;
            client
                .save_task(&mut task, &cleared)
                .with_context(|| format!("failed to save task {id}"))?;
            report("Updated", &task, json)
        }
        TaskSubcommand::Complete { project, id } => {
            let mut task = client
                .get_task(project, id)
                .with_context(|| format!("task {id} not found in project {project}"))?;
            client
                .complete_task(&mut task)
                .with_context(|| format!("failed to complete task {id}"))?;
            report("Completed", &task, json)
        }
        TaskSubcommand::Attach {
            project,
            id,
            path,
            name,
            mime_type,
        } => {
            let mut upload = Upload::resolve(Some(path), None, name)?;
            if let Some(mime_type) = mime_type {
                upload = upload.with_mime_type(mime_type);
            }
            let mut task = client
                .get_task(project, id)
                .with_context(|| format!("task {id} not found in project {project}"))?;
            client
                .new_attachment(&mut task, upload)
                .with_context(|| format!("failed to attach file to task {id}"))?;
            report("Attached to", &task, json)
        }
        TaskSubcommand::Lists { project, id: None } => {
            let lists = client.get_task_lists(project).context("failed to list task lists")?;
            print_raw(&lists, json)
        }
        TaskSubcommand::Lists {
            project,
            id: Some(id),
        } => {
            let list = client
                .get_task_list(project, id)
                .context("failed to fetch task list")?
                .with_context(|| format!("task list {id} not found in project {project}"))?;
            if json {
                print_json(&list)
            } else {
                print_fields(&list);
                Ok(())
            }
        }
        TaskSubcommand::Labels => {
            let labels = client.get_task_labels().context("failed to list task labels")?;
            print_raw(&labels, json)
        }
    }
}

fn list(client: &Client, project: i64, all: bool, json: bool) -> anyhow::Result<()> {
    let tasks = client
        .get_tasks(project, all)
        .with_context(|| format!("failed to list tasks of project {project}"))?;
    if json {
        return print_models(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    let rows = tasks
        .iter()
        .map(|t| {
            vec![
                cell(t.id()),
                cell(t.task_id().map(|n| format!("#{n}"))),
                cell(t.name()),
                cell(t.priority()),
                cell(t.due_on()),
            ]
        })
        .collect();
    print_table(&["ID", "NUMBER", "NAME", "PRIORITY", "DUE"], rows);
    Ok(())
}

/// Raw listings have no schema; show id and name when present.
fn print_raw(items: &[serde_json::Value], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&items);
    }
    let rows = items
        .iter()
        .map(|item| {
            vec![
                cell(item.get("id").map(|v| v.to_string())),
                cell(item.get("name").and_then(|v| v.as_str())),
            ]
        })
        .collect();
    print_table(&["ID", "NAME"], rows);
    Ok(())
}
