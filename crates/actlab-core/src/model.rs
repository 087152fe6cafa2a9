//! Client-bound entities.
//!
//! A [`Model`] pairs a field mapping with the [`Client`] that produced it, so
//! it can save, refresh and complete itself. Kind-specific behaviour comes
//! from the [`Resource`] marker and the [`ResourceKind`] tables; nothing is
//! looked up by name at runtime.

use crate::client::Client;
use crate::error::{ActLabError, Result};
use crate::field::{kind_of, FieldMap, FieldValue, Fields};
use crate::form::{Form, Upload};
use crate::payload::Payload;
use crate::resource::{
    Attachment, Comment, Company, File, Identity, Notebook, Page, Project, Resource, ResourceKind,
    Task, User,
};
use serde_json::{json, Map, Value};
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct Model<'c, R: Resource> {
    client: &'c Client,
    fields: Fields,
    ident: Identity,
    pub(crate) attachments: Vec<Model<'c, Attachment>>,
    pub(crate) subpages: Vec<Model<'c, Page>>,
    creator: Option<String>,
    created_on: Option<String>,
    _kind: PhantomData<R>,
}

impl<'c, R: Resource> Model<'c, R> {
    /// A model with no values yet, ready to be filled in and saved.
    pub fn new(client: &'c Client, ident: Identity) -> Self {
        Self {
            client,
            fields: Fields::new(R::SCHEMA),
            ident,
            attachments: Vec::new(),
            subpages: Vec::new(),
            creator: None,
            created_on: None,
            _kind: PhantomData,
        }
    }

    pub fn from_payload(
        client: &'c Client,
        payload: &Map<String, Value>,
        ident: Identity,
    ) -> Result<Self> {
        let mut model = Self::new(client, ident);
        model.apply(payload)?;
        Ok(model)
    }

    pub fn kind(&self) -> ResourceKind {
        R::KIND
    }

    pub fn id(&self) -> Option<i64> {
        self.fields.id()
    }

    pub fn identity(&self) -> &Identity {
        &self.ident
    }

    pub fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Copy of every field; edits to it do not reach the model.
    pub fn get_fields(&self) -> FieldMap {
        self.fields.to_map()
    }

    /// Set a field, coercing the value to the declared kind.
    pub fn set_field(&mut self, key: &str, value: impl Into<FieldValue>) -> Result<()> {
        let value = value.into();
        match kind_of(R::SCHEMA, key) {
            Some(kind) => {
                let coerced = kind.coerce(key, &value.to_json())?;
                self.fields.set(key, Some(coerced));
                Ok(())
            }
            None if R::ACCEPT_ALL_FIELDS || self.fields.contains(key) => {
                self.fields.insert(key, Some(value));
                Ok(())
            }
            None => Err(ActLabError::UnknownField {
                kind: R::KIND,
                field: key.to_string(),
            }),
        }
    }

    pub fn clear_field(&mut self, key: &str) -> Result<()> {
        if self.fields.set(key, None) {
            Ok(())
        } else {
            Err(ActLabError::UnknownField {
                kind: R::KIND,
                field: key.to_string(),
            })
        }
    }

    pub fn attachments(&self) -> &[Model<'c, Attachment>] {
        &self.attachments
    }

    pub fn subpages(&self) -> &[Model<'c, Page>] {
        &self.subpages
    }

    /// Display name of whoever created the entity.
    pub fn creator(&self) -> Option<&str> {
        self.creator.as_deref()
    }

    pub fn created_on(&self) -> Option<&str> {
        self.created_on.as_deref()
    }

    /// Merge a response payload into the model.
    pub fn apply(&mut self, payload: &Map<String, Value>) -> Result<()> {
        let attachments = match payload.get("attachments") {
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|a| Model::from_payload(self.client, a, Identity::default()))
                    .collect::<Result<Vec<_>>>()?,
            ),
            _ => None,
        };
        self.fields.apply(R::SCHEMA, R::ACCEPT_ALL_FIELDS, payload)?;

        if R::KIND.needs_project() && self.ident.project_id.is_none() {
            self.ident.project_id = payload.get("project_id").and_then(as_id);
        }
        if R::KIND == ResourceKind::Task {
            if let Some(number) = payload.get("task_id").and_then(as_id) {
                self.ident.task_id = Some(number);
            }
        }

        if let Some(attachments) = attachments {
            self.attachments = attachments;
        }

        if let Some(name) = payload
            .get("created_by")
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
        {
            self.creator = Some(name.to_string());
        }
        if let Some(created) = payload.get("created_on").and_then(format_created_on) {
            self.created_on = Some(created);
        }
        Ok(())
    }

    /// Command-endpoint path of this entity.
    pub fn item_path(&self) -> Result<String> {
        let id = self.id().ok_or(ActLabError::MissingId(R::KIND))?;
        warn_on_missing_parent(R::KIND.item_path(&self.ident, id))
    }

    /// Send current fields to the server. Entities without an id are created
    /// when their kind allows it; `Ok(false)` means nothing was sent.
    pub fn save(&mut self) -> Result<bool> {
        self.save_with(&FieldMap::new())
    }

    /// Like [`save`](Self::save), with extra values that override fields of
    /// the same name for this submission only. A `None` in `extra` is sent
    /// empty and clears the field remotely.
    pub fn save_with(&mut self, extra: &FieldMap) -> Result<bool> {
        self.save_with_uploads(extra, Vec::new())
    }

    pub(crate) fn save_with_uploads(&mut self, extra: &FieldMap, uploads: Vec<Upload>) -> Result<bool> {
        let mut form = Form::with_overrides(&self.fields.to_map(), extra, R::KIND.prefix());
        form.uploads = uploads;

        let payload = match self.id() {
            Some(id) => warn_on_missing_parent(self.client.save_raw(R::KIND, &self.ident, id, &form))?,
            None => match R::KIND.create_path(&self.ident) {
                None => {
                    tracing::debug!(kind = %R::KIND, "no id and no create path, nothing saved");
                    return Ok(false);
                }
                Some(path) => {
                    warn_on_missing_parent(path)?;
                    self.client.create_raw(R::KIND, &self.ident, &form)?
                }
            },
        };
        self.absorb(payload)?;
        Ok(true)
    }

    /// Reload from the server, merging without erasing known values.
    pub fn refresh(&mut self) -> Result<()> {
        let Some(id) = self.id() else {
            tracing::warn!(kind = %R::KIND, "cannot refresh without an id");
            return Err(ActLabError::MissingId(R::KIND));
        };
        let payload = warn_on_missing_parent(self.client.fetch_raw(R::KIND, &self.ident, id))?;
        self.apply(&entity(payload)?)
    }

    pub fn complete(&mut self) -> Result<()> {
        let id = self.id().ok_or(ActLabError::MissingId(R::KIND))?;
        let payload = warn_on_missing_parent(self.client.complete_raw(R::KIND, &self.ident, id))?;
        self.absorb(payload)
    }

    pub fn comment(&self, body: &str) -> Result<Model<'c, Comment>> {
        self.client.add_comment(self, body)
    }

    pub fn comments(&self) -> Result<Vec<Model<'c, Comment>>> {
        self.client.get_comments(self)
    }

    /// Upload in-memory bytes as an attachment by re-saving the entity.
    pub fn attach(&mut self, filename: &str, data: impl Into<Vec<u8>>) -> Result<bool> {
        self.save_with_uploads(&FieldMap::new(), vec![Upload::from_bytes(filename, data)])
    }

    pub fn to_json(&self) -> Value {
        let mut out = match self.fields.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        out.insert("kind".into(), json!(R::KIND));
        out.insert("identity".into(), json!(self.ident));
        if let Some(creator) = &self.creator {
            out.insert("creator".into(), json!(creator));
        }
        if let Some(created_on) = &self.created_on {
            out.insert("created_on".into(), json!(created_on));
        }
        if !self.attachments.is_empty() {
            let items: Vec<Value> = self.attachments.iter().map(Model::to_json).collect();
            out.insert("attachments".into(), Value::Array(items));
        }
        if !self.subpages.is_empty() {
            let items: Vec<Value> = self.subpages.iter().map(Model::to_json).collect();
            out.insert("subpages".into(), Value::Array(items));
        }
        Value::Object(out)
    }

    /// Apply a write response when it carries an entity; some endpoints
    /// answer with an empty body.
    fn absorb(&mut self, payload: Payload) -> Result<()> {
        match entity(payload) {
            Ok(map) => self.apply(&map),
            Err(ActLabError::UnexpectedPayload(what)) => {
                tracing::debug!(kind = %R::KIND, what, "write response carried no entity");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn warn_on_missing_parent<T>(result: Result<T>) -> Result<T> {
    if let Err(e @ ActLabError::MissingParent { .. }) = &result {
        tracing::warn!("{e}");
    }
    result
}

/// The entity object inside a payload. XML documents are keyed by their
/// root element, which is peeled off.
pub(crate) fn entity(payload: Payload) -> Result<Map<String, Value>> {
    match payload {
        Payload::Xml(Value::Object(map)) if map.len() == 1 => {
            match map.into_iter().next() {
                Some((_, Value::Object(inner))) => Ok(inner),
                Some((root, _)) => Err(ActLabError::UnexpectedPayload(format!(
                    "xml root '{root}' holds no fields"
                ))),
                None => Err(ActLabError::UnexpectedPayload("empty xml".to_string())),
            }
        }
        other => other.into_object(),
    }
}

fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn format_created_on(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("formatted").and_then(Value::as_str).map(str::to_string),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Typed accessors
// ---------------------------------------------------------------------------

macro_rules! accessors {
    (@get $field:ident str) => {
        pub fn $field(&self) -> Option<&str> {
            self.fields.str(stringify!($field))
        }
    };
    (@get $field:ident int) => {
        pub fn $field(&self) -> Option<i64> {
            self.fields.int(stringify!($field))
        }
    };
    (@get $field:ident float) => {
        pub fn $field(&self) -> Option<f64> {
            self.fields.get(stringify!($field)).and_then(FieldValue::as_float)
        }
    };
    (@get $field:ident list) => {
        pub fn $field(&self) -> Option<&[Value]> {
            match self.fields.get(stringify!($field)) {
                Some(FieldValue::List(items)) => Some(items),
                _ => None,
            }
        }
    };
    ($res:ty { $($field:ident : $kind:ident),* $(,)? }) => {
        impl<'c> Model<'c, $res> {
            $( accessors!(@get $field $kind); )*
        }
    };
}

accessors!(User {
    email: str,
    first_name: str,
    last_name: str,
    title: str,
    phone_mobile: str,
    phone_work: str,
});

accessors!(Company {
    name: str,
    office_address: str,
    office_phone: str,
    office_fax: str,
    office_homepage: str,
    note: str,
});

accessors!(Project {
    name: str,
    overview: str,
    category_id: int,
    company_id: int,
    leader_id: int,
    status: str,
    currency_id: int,
    budget: float,
    label_id: int,
});

accessors!(Task {
    name: str,
    body: str,
    visibility: int,
    category_id: int,
    label_id: int,
    milestone_id: int,
    priority: int,
    assignee_id: int,
    other_assignees: list,
    due_on: str,
});

accessors!(Notebook {
    name: str,
    body: str,
    visibility: int,
    milestone_id: int,
});

accessors!(Page {
    name: str,
    body: str,
    parent_id: int,
    parent_type: str,
});

accessors!(Comment { body: str });

accessors!(File {
    name: str,
    body: str,
    visibility: int,
});

accessors!(Attachment {
    name: str,
    size: int,
    permalink: str,
});

impl<'c> Model<'c, User> {
    /// System role (the `type` field).
    pub fn role(&self) -> Option<&str> {
        self.fields.str("type")
    }
}

impl<'c> Model<'c, Task> {
    /// Per-project task number; differs from [`Model::id`].
    pub fn task_id(&self) -> Option<i64> {
        self.ident.task_id
    }
}

impl<'c> Model<'c, Attachment> {
    pub fn download(&self) -> Result<Vec<u8>> {
        self.client.download(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> Client {
        Client::with_key(ClientConfig::new(&server.url(), "/"), "k-1")
    }

    fn cmd(path: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("path_info".into(), path.into()),
            Matcher::UrlEncoded("auth_api_token".into(), "k-1".into()),
        ])
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn metadata_is_extracted() {
        let server = Server::new();
        let client = client(&server);
        let project: Model<'_, Project> = Model::from_payload(
            &client,
            &obj(json!({
                "id": 1,
                "name": "P",
                "created_by": {"id": 3, "name": "Sam"},
                "created_on": {"formatted": "Jan 1. 2015"}
            })),
            Identity::default(),
        )
        .unwrap();
        assert_eq!(project.creator(), Some("Sam"));
        assert_eq!(project.created_on(), Some("Jan 1. 2015"));

        let task: Model<'_, Task> = Model::from_payload(
            &client,
            &obj(json!({"id": 9, "task_id": "4", "project_id": 2, "created_on": 0})),
            Identity::default(),
        )
        .unwrap();
        assert_eq!(task.created_on(), Some("1970-01-01 00:00"));
        assert_eq!(task.task_id(), Some(4));
        assert_eq!(task.identity().project_id, Some(2));
    }

    #[test]
    fn attachments_are_built_and_keep_extras() {
        let server = Server::new();
        let client = client(&server);
        let task: Model<'_, Task> = Model::from_payload(
            &client,
            &obj(json!({
                "id": 9,
                "attachments": [
                    {"id": 1, "name": "a.txt", "size": "12", "permalink": "http://h/a", "mime_type": "text/plain"}
                ]
            })),
            Identity::project(1),
        )
        .unwrap();
        let attachment = &task.attachments()[0];
        assert_eq!(attachment.size(), Some(12));
        assert_eq!(
            attachment.get_field("mime_type"),
            Some(&FieldValue::Raw(json!("text/plain")))
        );
    }

    #[test]
    fn set_field_coerces_and_rejects_unknown() {
        let server = Server::new();
        let client = client(&server);
        let mut project: Model<'_, Project> = Model::new(&client, Identity::default());
        project.set_field("budget", "99.5").unwrap();
        assert_eq!(project.budget(), Some(99.5));

        let err = project.set_field("color", "red").unwrap_err();
        assert!(matches!(err, ActLabError::UnknownField { ref field, .. } if field == "color"));

        let err = project.set_field("leader_id", "bob").unwrap_err();
        assert!(matches!(err, ActLabError::Coercion { .. }));

        let mut attachment: Model<'_, Attachment> = Model::new(&client, Identity::default());
        attachment.set_field("color", "red").unwrap();
        assert_eq!(attachment.get_field("color"), Some(&FieldValue::from("red")));
    }

    #[test]
    fn get_fields_is_a_copy() {
        let server = Server::new();
        let client = client(&server);
        let mut notebook: Model<'_, Notebook> = Model::new(&client, Identity::project(1));
        notebook.set_field("name", "Docs").unwrap();
        let mut copy = notebook.get_fields();
        copy.insert("name".into(), Some(FieldValue::from("Changed")));
        assert_eq!(notebook.name(), Some("Docs"));
    }

    #[test]
    fn save_existing_posts_edit_and_merges() {
        let mut server = Server::new();
        let m = server
            .mock("POST", "/api.php")
            .match_query(cmd("projects/4/edit"))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("project[name]".into(), "Renamed".into()),
                Matcher::UrlEncoded("project[overview]".into(), "override".into()),
                Matcher::UrlEncoded("submitted".into(), "submitted".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id": 4, "name": "Renamed", "overview": null, "status": "active"}"#)
            .create();
        let client = client(&server);
        let mut project: Model<'_, Project> =
            Model::from_payload(&client, &obj(json!({"id": 4, "overview": "kept"})), Identity::default())
                .unwrap();
        project.set_field("name", "Renamed").unwrap();

        let mut extra = FieldMap::new();
        extra.insert("overview".into(), Some(FieldValue::from("override")));
        assert!(project.save_with(&extra).unwrap());
        m.assert();

        assert_eq!(project.status(), Some("active"));
        // null in the response does not erase the local value
        assert_eq!(project.overview(), Some("kept"));
    }

    #[test]
    fn save_with_null_clears_remotely() {
        let mut server = Server::new();
        let m = server
            .mock("POST", "/api.php")
            .match_query(cmd("projects/4/edit"))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("project[name]".into(), "Site".into()),
                Matcher::UrlEncoded("project[overview]".into(), "".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id": 4, "name": "Site"}"#)
            .create();
        let client = client(&server);
        let mut project: Model<'_, Project> = Model::from_payload(
            &client,
            &obj(json!({"id": 4, "name": "Site", "overview": "old text"})),
            Identity::default(),
        )
        .unwrap();
        project.clear_field("overview").unwrap();

        let mut extra = FieldMap::new();
        extra.insert("overview".into(), None);
        assert!(project.save_with(&extra).unwrap());
        m.assert();
    }

    #[test]
    fn bad_payload_leaves_model_unchanged() {
        let server = Server::new();
        let client = client(&server);
        let mut project: Model<'_, Project> = Model::from_payload(
            &client,
            &obj(json!({"id": 4, "name": "Old"})),
            Identity::default(),
        )
        .unwrap();

        let err = project
            .apply(&obj(json!({"name": "New", "leader_id": "bob"})))
            .unwrap_err();
        assert!(matches!(err, ActLabError::Coercion { .. }));
        assert_eq!(project.name(), Some("Old"));
    }

    #[test]
    fn new_project_without_id_is_not_saved() {
        let server = Server::new();
        let client = client(&server);
        let mut project: Model<'_, Project> = Model::new(&client, Identity::default());
        project.set_field("name", "Nope").unwrap();
        assert!(!project.save().unwrap());
    }

    #[test]
    fn new_task_is_created_on_save() {
        let mut server = Server::new();
        let m = server
            .mock("POST", "/api.php")
            .match_query(cmd("projects/2/tasks/add"))
            .match_body(Matcher::UrlEncoded("task[name]".into(), "Write it".into()))
            .with_status(200)
            .with_body(r#"{"id": 300, "task_id": 12, "name": "Write it"}"#)
            .create();
        let client = client(&server);
        let mut task: Model<'_, Task> = Model::new(&client, Identity::project(2));
        task.set_field("name", "Write it").unwrap();
        assert!(task.save().unwrap());
        m.assert();
        assert_eq!(task.id(), Some(300));
        assert_eq!(task.task_id(), Some(12));
    }

    #[test]
    fn page_without_notebook_is_missing_parent() {
        let server = Server::new();
        let client = client(&server);
        let mut page: Model<'_, Page> = Model::new(&client, Identity::project(2));
        page.set_field("name", "Orphan").unwrap();
        let err = page.save().unwrap_err();
        assert!(matches!(err, ActLabError::MissingParent { parent: "notebook", .. }));
    }

    #[test]
    fn refresh_requires_id() {
        let server = Server::new();
        let client = client(&server);
        let mut notebook: Model<'_, Notebook> = Model::new(&client, Identity::project(1));
        let err = notebook.refresh().unwrap_err();
        assert!(matches!(err, ActLabError::MissingId(ResourceKind::Notebook)));
    }

    #[test]
    fn refresh_merges_without_erasing() {
        let mut server = Server::new();
        server
            .mock("GET", "/api.php")
            .match_query(cmd("projects/1/notebooks/5"))
            .with_status(200)
            .with_body(r#"{"id": 5, "name": "Server name", "body": null}"#)
            .create();
        let client = client(&server);
        let mut notebook: Model<'_, Notebook> = Model::from_payload(
            &client,
            &obj(json!({"id": 5, "name": "Local", "body": "local body"})),
            Identity::project(1),
        )
        .unwrap();
        notebook.refresh().unwrap();
        assert_eq!(notebook.name(), Some("Server name"));
        assert_eq!(notebook.body(), Some("local body"));
    }

    #[test]
    fn task_refresh_reads_api_single() {
        let mut server = Server::new();
        server
            .mock("GET", "/api/v1/projects/2/tasks/300")
            .with_status(200)
            .with_body(r#"{"single": {"id": 300, "task_id": 12, "name": "Fresh", "priority": 2}}"#)
            .create();
        let client = client(&server);
        let mut task: Model<'_, Task> =
            Model::from_payload(&client, &obj(json!({"id": 300})), Identity::project(2)).unwrap();
        task.refresh().unwrap();
        assert_eq!(task.name(), Some("Fresh"));
        assert_eq!(task.priority(), Some(2));
    }

    #[test]
    fn complete_task_uses_task_number() {
        let mut server = Server::new();
        let m = server
            .mock("POST", "/api.php")
            .match_query(cmd("projects/2/tasks/12/complete"))
            .match_body(Matcher::UrlEncoded("submitted".into(), "submitted".into()))
            .with_status(200)
            .with_body("")
            .create();
        let client = client(&server);
        let mut task: Model<'_, Task> = Model::from_payload(
            &client,
            &obj(json!({"id": 300, "task_id": 12})),
            Identity::project(2),
        )
        .unwrap();
        task.complete().unwrap();
        m.assert();
    }

    #[test]
    fn task_without_number_is_not_addressed_by_id() {
        let mut server = Server::new();
        let m = server.mock("POST", "/api.php").expect(0).create();
        let client = client(&server);
        let mut task: Model<'_, Task> =
            Model::from_payload(&client, &obj(json!({"id": 300})), Identity::project(2)).unwrap();

        let err = task.complete().unwrap_err();
        assert!(matches!(err, ActLabError::MissingParent { parent: "task number", .. }));
        let err = task.save().unwrap_err();
        assert!(matches!(err, ActLabError::MissingParent { parent: "task number", .. }));
        m.assert();
    }

    #[test]
    fn comment_returns_created_comment() {
        let mut server = Server::new();
        server
            .mock("POST", "/api.php")
            .match_query(cmd("projects/7/comments/add"))
            .match_body(Matcher::UrlEncoded("comment[body]".into(), "looks good".into()))
            .with_status(200)
            .with_body(r#"{"id": 55, "body": "looks good", "created_by": {"name": "Ari"}}"#)
            .create();
        let client = client(&server);
        let project: Model<'_, Project> =
            Model::from_payload(&client, &obj(json!({"id": 7})), Identity::default()).unwrap();
        let comment = project.comment("looks good").unwrap();
        assert_eq!(comment.id(), Some(55));
        assert_eq!(comment.creator(), Some("Ari"));
    }

    #[test]
    fn attach_sends_multipart_upload() {
        let mut server = Server::new();
        let m = server
            .mock("POST", "/api.php")
            .match_query(cmd("projects/1/notebooks/5/edit"))
            .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="attachment_0"; filename="notes.txt""#.into()),
                Matcher::Regex("application/octet-stream".into()),
                Matcher::Regex("hello there".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id": 5, "attachments": [{"id": 8, "name": "notes.txt"}]}"#)
            .create();
        let client = client(&server);
        let mut notebook: Model<'_, Notebook> =
            Model::from_payload(&client, &obj(json!({"id": 5})), Identity::project(1)).unwrap();
        assert!(notebook.attach("notes.txt", b"hello there".to_vec()).unwrap());
        m.assert();
        assert_eq!(notebook.attachments()[0].name(), Some("notes.txt"));
    }

    #[test]
    fn to_json_includes_identity() {
        let server = Server::new();
        let client = client(&server);
        let page: Model<'_, Page> =
            Model::from_payload(&client, &obj(json!({"id": 3, "name": "P"})), Identity::notebook(1, 2))
                .unwrap();
        let value = page.to_json();
        assert_eq!(value["kind"], "page");
        assert_eq!(value["identity"]["notebook_id"], 2);
        assert_eq!(value["name"], "P");
    }
}
