use crate::error::{ActLabError, Result};
use crate::field::{FieldMap, FieldValue};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Key passed through without a namespace; it carries file uploads.
pub const ATTACHMENTS_KEY: &str = "attachments";

/// Namespace every key with `prefix` (`name` → `project[name]`), dropping
/// null values unless `keep_null` is set.
pub fn memberify(
    fields: &FieldMap,
    prefix: &str,
    keep_null: bool,
) -> BTreeMap<String, Option<FieldValue>> {
    fields
        .iter()
        .filter(|(_, v)| keep_null || v.is_some())
        .map(|(k, v)| {
            let key = if k == ATTACHMENTS_KEY {
                k.clone()
            } else {
                format!("{prefix}[{k}]")
            };
            (key, v.clone())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl Upload {
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            mime_type: OCTET_STREAM.to_string(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ActLabError::InvalidAttachment(format!(
                "path does not exist at '{}'",
                path.display()
            )));
        }
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self::from_bytes(filename, data))
    }

    /// Build an upload from whichever source was supplied. A path wins over
    /// in-memory data; in-memory data needs a filename.
    pub fn resolve(
        path: Option<PathBuf>,
        data: Option<Vec<u8>>,
        filename: Option<String>,
    ) -> Result<Self> {
        match (path, data) {
            (Some(path), _) => {
                let mut upload = Self::from_path(&path)?;
                if let Some(name) = filename {
                    upload.filename = name;
                }
                Ok(upload)
            }
            (None, Some(data)) => {
                let name = filename.ok_or_else(|| {
                    ActLabError::InvalidAttachment("in-memory data needs a filename".to_string())
                })?;
                Ok(Self::from_bytes(name, data))
            }
            (None, None) => Err(ActLabError::InvalidAttachment(
                "neither a path nor data was supplied".to_string(),
            )),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// A command-endpoint submission: flat text pairs plus optional uploads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    pub pairs: Vec<(String, String)>,
    pub uploads: Vec<Upload>,
}

impl Form {
    /// Every command post carries `submitted=submitted`.
    pub fn submitted() -> Self {
        let mut form = Form::default();
        form.push("submitted", "submitted");
        form
    }

    /// Form for a resource's fields, namespaced with `prefix`. Lists become
    /// repeated `prefix[key][]` entries.
    pub fn from_fields(fields: &FieldMap, prefix: &str) -> Self {
        Self::with_overrides(fields, &FieldMap::new(), prefix)
    }

    /// Like [`from_fields`](Self::from_fields), with `extra` replacing
    /// fields of the same name. Nulls in `extra` are sent as empty values
    /// so the server clears those fields.
    pub fn with_overrides(fields: &FieldMap, extra: &FieldMap, prefix: &str) -> Self {
        let base: FieldMap = fields
            .iter()
            .filter(|(k, _)| !extra.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut form = Form::default();
        form.push_members(memberify(&base, prefix, false));
        form.push_members(memberify(extra, prefix, true));
        form.push("submitted", "submitted");
        form
    }

    fn push_members(&mut self, members: BTreeMap<String, Option<FieldValue>>) {
        for (key, value) in members {
            match value {
                Some(FieldValue::List(items)) => {
                    for item in items {
                        let text = match item {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        self.push(format!("{key}[]"), text);
                    }
                }
                Some(other) => self.push(key, other.to_form_string()),
                None => self.push(key, ""),
            }
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn attach(mut self, upload: Upload) -> Self {
        self.uploads.push(upload);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_multipart(&self) -> Result<reqwest::blocking::multipart::Form> {
        let mut multipart = reqwest::blocking::multipart::Form::new();
        for (key, value) in &self.pairs {
            multipart = multipart.text(key.clone(), value.clone());
        }
        for (i, upload) in self.uploads.iter().enumerate() {
            let part = reqwest::blocking::multipart::Part::bytes(upload.data.clone())
                .file_name(upload.filename.clone())
                .mime_str(&upload.mime_type)?;
            multipart = multipart.part(format!("attachment_{i}"), part);
        }
        Ok(multipart)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
