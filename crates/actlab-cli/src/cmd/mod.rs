pub mod comment;
pub mod company;
pub mod config;
pub mod file;
pub mod hook;
pub mod init;
pub mod notebook;
pub mod page;
pub mod project;
pub mod render;
pub mod task;
pub mod user;

use crate::output::{print_fields, print_json};
use actlab_core::resource::Resource;
use actlab_core::{FieldMap, FieldValue, Model};
use anyhow::Context;
use serde_json::{Map, Value};

/// A `key=value` argument. Values that parse as JSON keep their type, so
/// `priority=2` is a number and `other_assignees=[4,5]` a list.
pub type Assignment = (String, Value);

pub fn parse_assignment(s: &str) -> Result<Assignment, String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

pub fn params(assignments: &[Assignment]) -> Map<String, Value> {
    assignments.iter().cloned().collect()
}

/// Set each assignment on the model. `null` clears a field; the cleared
/// keys are returned so the save sends them empty.
pub fn apply<R: Resource>(
    model: &mut Model<'_, R>,
    assignments: &[Assignment],
) -> anyhow::Result<FieldMap> {
    let mut cleared = FieldMap::new();
    for (key, value) in assignments {
        let result = match value {
            Value::Null => model.clear_field(key).map(|()| {
                cleared.insert(key.clone(), None);
            }),
            other => model.set_field(key, FieldValue::Raw(other.clone())),
        };
        result.with_context(|| format!("cannot set '{key}'"))?;
    }
    Ok(cleared)
}

pub fn show<R: Resource>(model: &Model<'_, R>, json: bool) -> anyhow::Result<()> {
    let value = model.to_json();
    if json {
        print_json(&value)
    } else {
        print_fields(&value);
        Ok(())
    }
}

pub fn print_models<R: Resource>(models: &[Model<'_, R>]) -> anyhow::Result<()> {
    let items: Vec<Value> = models.iter().map(Model::to_json).collect();
    print_json(&items)
}

/// Confirmation line for a write, or the model itself with `--json`.
pub fn report<R: Resource>(verb: &str, model: &Model<'_, R>, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&model.to_json());
    }
    match model.id() {
        Some(id) => println!("{verb} {} {id}", model.kind()),
        None => println!("{verb} {}", model.kind()),
    }
    Ok(())
}
