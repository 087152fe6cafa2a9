//! Blocking client for the Active Collab REST API.
//!
//! Two endpoint styles are in play: the token-authenticated `api/v1` pages
//! (JSON bodies, `X-Angie-AuthApiToken` header) and the legacy command
//! endpoint (`api.php?path_info=...`, form bodies, key in the query).

use crate::error::{ActLabError, Result};
use crate::field::{FieldMap, Fields};
use crate::form::{Form, Upload};
use crate::model::{entity, Model};
use crate::payload::Payload;
use crate::resource::{
    Attachment, Comment, Company, File, Identity, Notebook, Page, Project, Resource, ResourceKind,
    Task, User,
};
use regex::Regex;
use reqwest::blocking::{RequestBuilder, Response};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::OnceLock;

pub const AUTH_HEADER: &str = "X-Angie-AuthApiToken";
pub const CLIENT_NAME: &str = "ActLabClient";
pub const CLIENT_VENDOR: &str = "PYACTLAB";

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub base_path: String,
}

impl ClientConfig {
    pub fn new(host: &str, base_path: &str) -> Self {
        let mut host = host.trim_end_matches('/').to_string();
        if !host.starts_with("http") {
            host = format!("http://{host}");
        }
        let mut base_path = base_path.to_string();
        if !base_path.starts_with('/') {
            base_path.insert(0, '/');
        }
        if !base_path.ends_with('/') {
            base_path.push('/');
        }
        Self { host, base_path }
    }
}

#[derive(Clone)]
pub enum Credentials {
    ApiKey(String),
    Password { email: String, password: String },
}

impl Credentials {
    /// Pick credentials from optional parts, preferring a key.
    pub fn from_parts(
        key: Option<String>,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        match (key, email, password) {
            (Some(key), _, _) => Ok(Credentials::ApiKey(key)),
            (None, Some(email), Some(password)) => Ok(Credentials::Password { email, password }),
            _ => Err(ActLabError::MissingCredentials),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(..)"),
            Credentials::Password { email, .. } => write!(f, "Password({email})"),
        }
    }
}

pub struct Client {
    config: ClientConfig,
    key: String,
    http: reqwest::blocking::Client,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("base_path", &self.config.base_path)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Authenticate and return a ready client.
    ///
    /// An API key is checked with a trial listing; an email/password pair is
    /// exchanged for a key first.
    pub fn connect(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        match credentials {
            Credentials::ApiKey(key) => {
                let client = Self::with_key(config, key);
                client.check_key()?;
                Ok(client)
            }
            Credentials::Password { email, password } => {
                let mut client = Self::with_key(config, String::new());
                client.key = client.issue_token(&email, &password)?;
                Ok(client)
            }
        }
    }

    /// Build a client around a key without checking it.
    pub fn with_key(config: ClientConfig, key: impl Into<String>) -> Self {
        Self {
            config,
            key: key.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn check_key(&self) -> Result<()> {
        match self.get_api("companies")?.ok() {
            Some(_) => Ok(()),
            None => Err(ActLabError::InvalidApiKey),
        }
    }

    fn issue_token(&self, email: &str, password: &str) -> Result<String> {
        let body = json!({
            "username": email,
            "password": password,
            "client_name": CLIENT_NAME,
            "client_vendor": CLIENT_VENDOR,
        });
        let payload = self
            .send_api(reqwest::Method::POST, "issue-token", &body)?
            .ok()
            .ok_or(ActLabError::InvalidCredentials)?;
        payload
            .as_value()
            .and_then(|v| v.get("token"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ActLabError::InvalidCredentials)
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    pub fn api_url(&self, page: &str) -> String {
        let page = page.trim_matches('/');
        format!("{}{}api/v1/{}", self.config.host, self.config.base_path, page)
    }

    pub fn cmd_url(&self) -> String {
        format!("{}{}api.php", self.config.host, self.config.base_path)
    }

    fn cmd_query<'a>(&'a self, cmd: &'a str) -> [(&'static str, &'a str); 3] {
        [
            ("path_info", cmd),
            ("auth_api_token", self.key.as_str()),
            ("format", "json"),
        ]
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.key.is_empty() {
            builder
        } else {
            builder.header(AUTH_HEADER, &self.key)
        }
    }

    fn finish(what: &str, response: Response) -> Result<Reply> {
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, what, "request was not successful");
            return Ok(Reply {
                status: status.as_u16(),
                payload: None,
            });
        }
        let body = response.bytes()?;
        Ok(Reply {
            status: status.as_u16(),
            payload: Some(Payload::decode(&body)),
        })
    }

    fn get_api(&self, page: &str) -> Result<Reply> {
        tracing::debug!(page, "GET api");
        let response = self.authed(self.http.get(self.api_url(page))).send()?;
        Self::finish(page, response)
    }

    fn send_api(&self, method: reqwest::Method, page: &str, body: &Value) -> Result<Reply> {
        tracing::debug!(%method, page, "api request");
        let response = self
            .authed(self.http.request(method, self.api_url(page)))
            .json(body)
            .send()?;
        Self::finish(page, response)
    }

    fn upload_api(&self, page: &str, form: &Form) -> Result<Reply> {
        tracing::debug!(page, uploads = form.uploads.len(), "POST api multipart");
        let response = self
            .authed(self.http.post(self.api_url(page)))
            .multipart(form.to_multipart()?)
            .send()?;
        Self::finish(page, response)
    }

    fn get_cmd(&self, cmd: &str) -> Result<Reply> {
        tracing::debug!(cmd, "GET command");
        let response = self
            .http
            .get(self.cmd_url())
            .query(&self.cmd_query(cmd))
            .send()?;
        Self::finish(cmd, response)
    }

    fn post_cmd(&self, cmd: &str, form: &Form) -> Result<Reply> {
        tracing::debug!(cmd, uploads = form.uploads.len(), "POST command");
        let request = self.http.post(self.cmd_url()).query(&self.cmd_query(cmd));
        let request = if form.uploads.is_empty() {
            request.form(&form.pairs)
        } else {
            request.multipart(form.to_multipart()?)
        };
        Self::finish(cmd, request.send()?)
    }

    // -----------------------------------------------------------------------
    // Generic dispatch (shared by every resource kind)
    // -----------------------------------------------------------------------

    /// Raw payload of one existing entity.
    pub fn fetch_raw(&self, kind: ResourceKind, ident: &Identity, id: i64) -> Result<Payload> {
        if kind == ResourceKind::Task {
            let project = ident.require_project(kind)?;
            let page = format!("projects/{project}/tasks/{id}");
            return self.get_api(&page)?.required(&page).map(unwrap_single);
        }
        let path = kind.item_path(ident, id)?;
        self.get_cmd(&path)?.required(&path)
    }

    /// Post edited fields of an existing entity.
    pub fn save_raw(
        &self,
        kind: ResourceKind,
        ident: &Identity,
        id: i64,
        form: &Form,
    ) -> Result<Payload> {
        let path = format!("{}/edit", kind.item_path(ident, id)?);
        self.post_cmd(&path, form)?.required(&path)
    }

    /// Post a new entity into its containing collection.
    pub fn create_raw(&self, kind: ResourceKind, ident: &Identity, form: &Form) -> Result<Payload> {
        let path = match kind {
            ResourceKind::Project => Ok("projects/add".to_string()),
            other => other.create_path(ident).unwrap_or(Err(ActLabError::Unsupported {
                kind: other,
                op: "create",
            })),
        }?;
        self.post_cmd(&path, form)?.required(&path)
    }

    pub fn complete_raw(&self, kind: ResourceKind, ident: &Identity, id: i64) -> Result<Payload> {
        if !kind.can_complete() {
            return Err(ActLabError::Unsupported { kind, op: "complete" });
        }
        let path = format!("{}/complete", kind.item_path(ident, id)?);
        self.post_cmd(&path, &Form::submitted())?.required(&path)
    }

    fn model<R: Resource>(&self, payload: Payload, ident: Identity) -> Result<Model<'_, R>> {
        Model::from_payload(self, &entity(payload)?, ident)
    }

    fn models<R: Resource>(&self, payload: Option<Payload>, ident: Identity) -> Result<Vec<Model<'_, R>>> {
        let Some(payload) = payload else {
            return Ok(Vec::new());
        };
        payload
            .into_items()?
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Model::from_payload(self, &map, ident),
                other => Err(ActLabError::UnexpectedPayload(format!(
                    "listing item is not an object: {other}"
                ))),
            })
            .collect()
    }

    /// Coerce loose creation parameters through a kind's schema.
    fn creation_form<R: Resource>(params: &Map<String, Value>) -> Result<Form> {
        let mut fields = Fields::new(R::SCHEMA);
        fields.apply(R::SCHEMA, R::ACCEPT_ALL_FIELDS, params)?;
        Ok(Form::from_fields(&fields.to_map(), R::KIND.prefix()))
    }

    /// Save any model; see [`Model::save_with`].
    pub fn save<R: Resource>(&self, model: &mut Model<'_, R>, extra: &FieldMap) -> Result<bool> {
        model.save_with(extra)
    }

    // -----------------------------------------------------------------------
    // Companies
    // -----------------------------------------------------------------------

    pub fn get_companies_raw(&self) -> Result<Option<Payload>> {
        self.get_api("companies").map(Reply::ok)
    }

    pub fn get_companies(&self) -> Result<Vec<Model<'_, Company>>> {
        self.models(self.get_companies_raw()?, Identity::default())
    }

    pub fn get_company_raw(&self, company_id: i64) -> Result<Payload> {
        self.fetch_raw(ResourceKind::Company, &Identity::default(), company_id)
    }

    pub fn get_company(&self, company_id: i64) -> Result<Model<'_, Company>> {
        self.model(self.get_company_raw(company_id)?, Identity::default())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn get_users_raw(&self) -> Result<Option<Payload>> {
        self.get_api("users").map(Reply::ok)
    }

    pub fn get_users(&self) -> Result<Vec<Model<'_, User>>> {
        self.models(self.get_users_raw()?, Identity::default())
    }

    pub fn get_user_raw(&self, company_id: i64, user_id: i64) -> Result<Payload> {
        self.fetch_raw(ResourceKind::User, &Identity::company(company_id), user_id)
    }

    pub fn get_user(&self, company_id: i64, user_id: i64) -> Result<Model<'_, User>> {
        self.model(self.get_user_raw(company_id, user_id)?, Identity::company(company_id))
    }

    pub fn save_user(&self, user: &mut Model<'_, User>, extra: &FieldMap) -> Result<bool> {
        self.save(user, extra)
    }

    /// Create a user account. `user_type` is one of the system roles.
    pub fn new_user(
        &self,
        email: &str,
        password: &str,
        company_id: i64,
        user_type: &str,
    ) -> Result<Model<'_, User>> {
        let body = json!({
            "type": user_type,
            "company_id": company_id,
            "password": password,
            "email": email,
        });
        let payload = self
            .send_api(reqwest::Method::POST, "users", &body)?
            .ok()
            .ok_or_else(|| ActLabError::Client("could not create new user".to_string()))?;
        self.model(unwrap_single(payload), Identity::company(company_id))
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn get_projects_raw(&self) -> Result<Option<Payload>> {
        self.get_api("projects").map(Reply::ok)
    }

    pub fn get_projects(&self) -> Result<Vec<Model<'_, Project>>> {
        self.models(self.get_projects_raw()?, Identity::default())
    }

    pub fn get_project_raw(&self, project_id: i64) -> Result<Payload> {
        self.fetch_raw(ResourceKind::Project, &Identity::default(), project_id)
    }

    pub fn get_project(&self, project_id: i64) -> Result<Model<'_, Project>> {
        self.model(self.get_project_raw(project_id)?, Identity::default())
    }

    pub fn new_project(&self, params: &Map<String, Value>) -> Result<Model<'_, Project>> {
        let form = Self::creation_form::<Project>(params)?;
        let payload = self.create_raw(ResourceKind::Project, &Identity::default(), &form)?;
        self.model(payload, Identity::default())
    }

    pub fn save_project(&self, project: &mut Model<'_, Project>, extra: &FieldMap) -> Result<bool> {
        self.save(project, extra)
    }

    pub fn complete_project(&self, project: &mut Model<'_, Project>) -> Result<()> {
        project.complete()
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn get_tasks_raw(&self, project_id: i64) -> Result<Option<Payload>> {
        self.get_api(&format!("projects/{project_id}/tasks")).map(Reply::ok)
    }

    /// Tasks of a project; completed ones only when `inc_completed` is set.
    pub fn get_tasks(&self, project_id: i64, inc_completed: bool) -> Result<Vec<Model<'_, Task>>> {
        let Some(payload) = self.get_tasks_raw(project_id)? else {
            return Ok(Vec::new());
        };
        let items = match payload.into_value() {
            Value::Object(mut map) => match map.remove("tasks") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            Value::Array(items) => items,
            _ => Vec::new(),
        };

        let mut tasks = Vec::new();
        for item in items {
            let Value::Object(map) = item else { continue };
            if is_completed(&map) && !inc_completed {
                continue;
            }
            tasks.push(Model::from_payload(self, &map, Identity::project(project_id))?);
        }
        Ok(tasks)
    }

    pub fn get_task_raw(&self, project_id: i64, task_id: i64) -> Result<Payload> {
        self.fetch_raw(ResourceKind::Task, &Identity::project(project_id), task_id)
    }

    pub fn get_task(&self, project_id: i64, task_id: i64) -> Result<Model<'_, Task>> {
        self.model(self.get_task_raw(project_id, task_id)?, Identity::project(project_id))
    }

    pub fn new_task(&self, project_id: i64, params: &Map<String, Value>) -> Result<Model<'_, Task>> {
        let ident = Identity::project(project_id);
        let form = Self::creation_form::<Task>(params)?;
        let payload = self.create_raw(ResourceKind::Task, &ident, &form)?;
        self.model(payload, ident)
    }

    pub fn save_task(&self, task: &mut Model<'_, Task>, extra: &FieldMap) -> Result<bool> {
        self.save(task, extra)
    }

    pub fn complete_task(&self, task: &mut Model<'_, Task>) -> Result<()> {
        task.complete()
    }

    /// Create a task over API v1. `name`, `body`, `assignee_id`, `due_on`
    /// and `labels` are always sent (null when absent); `is_important`
    /// defaults to 0. Any other params are passed through.
    pub fn new_task_api(
        &self,
        project_id: i64,
        params: &Map<String, Value>,
    ) -> Result<Model<'_, Task>> {
        let mut body = params.clone();
        for key in ["name", "body", "assignee_id", "due_on", "labels"] {
            body.entry(key).or_insert(Value::Null);
        }
        body.entry("is_important").or_insert(Value::from(0));

        let page = format!("projects/{project_id}/tasks");
        let payload = self
            .send_api(reqwest::Method::POST, &page, &Value::Object(body))?
            .required(&page)?;
        self.model(unwrap_single(payload), Identity::project(project_id))
    }

    pub fn get_task_lists(&self, project_id: i64) -> Result<Vec<Value>> {
        match self.get_api(&format!("projects/{project_id}/task-lists"))?.ok() {
            Some(payload) => payload.into_items(),
            None => Ok(Vec::new()),
        }
    }

    pub fn get_task_list_raw(&self, project_id: i64, task_list_id: i64) -> Result<Option<Payload>> {
        self.get_api(&format!("projects/{project_id}/task-lists/{task_list_id}"))
            .map(Reply::ok)
    }

    /// One task list, or `None` when the server does not return it.
    pub fn get_task_list(&self, project_id: i64, task_list_id: i64) -> Result<Option<Value>> {
        match self.get_task_list_raw(project_id, task_list_id)? {
            Some(payload) => Ok(Some(unwrap_single(payload).into_value())),
            None => Ok(None),
        }
    }

    pub fn get_task_labels(&self) -> Result<Vec<Value>> {
        match self.get_api("labels/task-labels")?.ok() {
            Some(payload) => payload.into_items(),
            None => Ok(Vec::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Notebooks and pages
    // -----------------------------------------------------------------------

    pub fn get_notebooks_raw(&self, project_id: i64) -> Result<Option<Payload>> {
        self.get_cmd(&format!("projects/{project_id}/notebooks")).map(Reply::ok)
    }

    pub fn get_notebooks(&self, project_id: i64) -> Result<Vec<Model<'_, Notebook>>> {
        let Some(payload) = self.get_notebooks_raw(project_id)? else {
            return Ok(Vec::new());
        };
        payload
            .into_items()?
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .map(|map| self.build_notebook(project_id, &map))
            .collect()
    }

    pub fn get_notebook_raw(&self, project_id: i64, notebook_id: i64) -> Result<Payload> {
        self.fetch_raw(ResourceKind::Notebook, &Identity::project(project_id), notebook_id)
    }

    pub fn get_notebook(&self, project_id: i64, notebook_id: i64) -> Result<Model<'_, Notebook>> {
        let map = self.get_notebook_raw(project_id, notebook_id)?.into_object()?;
        self.build_notebook(project_id, &map)
    }

    pub fn new_notebook(
        &self,
        project_id: i64,
        params: &Map<String, Value>,
    ) -> Result<Model<'_, Notebook>> {
        let ident = Identity::project(project_id);
        let form = Self::creation_form::<Notebook>(params)?;
        let payload = self.create_raw(ResourceKind::Notebook, &ident, &form)?;
        self.model(payload, ident)
    }

    pub fn save_notebook(&self, notebook: &mut Model<'_, Notebook>, extra: &FieldMap) -> Result<bool> {
        self.save(notebook, extra)
    }

    /// Fetch a page. Page ids are unique within a project, so the notebook is
    /// optional; the page payload names its notebook.
    pub fn get_notebook_page_raw(
        &self,
        project_id: i64,
        page_id: i64,
        notebook_id: Option<i64>,
    ) -> Result<Payload> {
        let ident = Identity::notebook(project_id, notebook_id.unwrap_or(0));
        self.fetch_raw(ResourceKind::Page, &ident, page_id)
    }

    pub fn get_notebook_page(
        &self,
        project_id: i64,
        page_id: i64,
        notebook_id: Option<i64>,
    ) -> Result<Model<'_, Page>> {
        let map = self
            .get_notebook_page_raw(project_id, page_id, notebook_id)?
            .into_object()?;
        let notebook_id = map
            .get("notebook")
            .and_then(|n| n.get("id"))
            .and_then(Value::as_i64)
            .or(notebook_id)
            .unwrap_or(0);
        self.build_page(project_id, notebook_id, map, None)
    }

    pub fn new_notebook_page(
        &self,
        project_id: i64,
        notebook_id: i64,
        params: &Map<String, Value>,
    ) -> Result<Model<'_, Page>> {
        let ident = Identity::notebook(project_id, notebook_id);
        let form = Self::creation_form::<Page>(params)?;
        let payload = self.create_raw(ResourceKind::Page, &ident, &form)?;
        self.model(payload, ident)
    }

    pub fn save_notebook_page(&self, page: &mut Model<'_, Page>, extra: &FieldMap) -> Result<bool> {
        self.save(page, extra)
    }

    fn build_notebook(&self, project_id: i64, map: &Map<String, Value>) -> Result<Model<'_, Notebook>> {
        let mut notebook: Model<'_, Notebook> =
            Model::from_payload(self, map, Identity::project(project_id))?;
        let notebook_id = notebook.id().unwrap_or(0);
        notebook.subpages = self.build_subpages(project_id, notebook_id, map, None)?;
        Ok(notebook)
    }

    fn build_subpages(
        &self,
        project_id: i64,
        notebook_id: i64,
        map: &Map<String, Value>,
        parent: Option<i64>,
    ) -> Result<Vec<Model<'_, Page>>> {
        let Some(Value::Array(subpages)) = map.get("subpages") else {
            return Ok(Vec::new());
        };
        subpages
            .iter()
            .filter_map(|p| p.as_object().cloned())
            .map(|p| self.build_page(project_id, notebook_id, p, parent))
            .collect()
    }

    /// Pages embedded in notebook listings are abbreviated and may only carry
    /// their id inside the permalink.
    fn build_page(
        &self,
        project_id: i64,
        notebook_id: i64,
        mut map: Map<String, Value>,
        parent: Option<i64>,
    ) -> Result<Model<'_, Page>> {
        let id = match map.get("id").and_then(Value::as_i64) {
            Some(id) => id,
            None => {
                let permalink = map.get("permalink").and_then(Value::as_str).unwrap_or("");
                page_id_from_permalink(permalink).ok_or_else(|| {
                    ActLabError::UnexpectedPayload(format!(
                        "page has no id and no usable permalink: '{permalink}'"
                    ))
                })?
            }
        };
        map.insert("id".to_string(), Value::from(id));
        if let Some(parent) = parent {
            map.insert("parent_id".to_string(), Value::from(parent));
        }

        let mut page: Model<'_, Page> =
            Model::from_payload(self, &map, Identity::notebook(project_id, notebook_id))?;
        page.subpages = self.build_subpages(project_id, notebook_id, &map, Some(id))?;
        Ok(page)
    }

    // -----------------------------------------------------------------------
    // Comments, attachments, files
    // -----------------------------------------------------------------------

    pub fn get_comments_raw<R: Resource>(&self, model: &Model<'_, R>) -> Result<Option<Payload>> {
        let path = format!("{}/comments", model.item_path()?);
        self.get_cmd(&path).map(Reply::ok)
    }

    pub fn get_comments<R: Resource>(&self, model: &Model<'_, R>) -> Result<Vec<Model<'_, Comment>>> {
        self.models(self.get_comments_raw(model)?, Identity::default())
    }

    pub fn add_comment<R: Resource>(&self, model: &Model<'_, R>, body: &str) -> Result<Model<'_, Comment>> {
        let path = format!("{}/comments/add", model.item_path()?);
        let mut form = Form::submitted();
        form.push("comment[body]", body);
        let payload = self.post_cmd(&path, &form)?.required(&path)?;
        self.model(payload, Identity::default())
    }

    /// Attach a file by re-saving the model with a multipart upload.
    pub fn add_attachment<R: Resource>(&self, model: &mut Model<'_, R>, upload: Upload) -> Result<()> {
        model.save_with_uploads(&Default::default(), vec![upload])?;
        Ok(())
    }

    /// Upload through `upload-files` and attach the result to a task.
    pub fn new_attachment(&self, task: &mut Model<'_, Task>, upload: Upload) -> Result<()> {
        let project = task.identity().require_project(ResourceKind::Task)?;
        let id = task.id().ok_or(ActLabError::MissingId(ResourceKind::Task))?;

        let mut form = Form::submitted();
        form.push("file[name]", upload.filename.clone());
        let form = form.attach(upload);
        let uploaded = self.upload_api("upload-files", &form)?.required("upload-files")?;
        let code = uploaded
            .as_value()
            .and_then(|v| v.get(0))
            .and_then(|f| f.get("code"))
            .cloned()
            .ok_or_else(|| ActLabError::UnexpectedPayload("upload returned no file code".to_string()))?;

        let page = format!("projects/{project}/tasks/{id}");
        let body = json!({ "attach_uploaded_files": [code] });
        let payload = self.send_api(reqwest::Method::PUT, &page, &body)?.required(&page)?;
        task.apply(&unwrap_single(payload).into_object()?)
    }

    pub fn add_file(&self, project_id: i64, upload: Upload) -> Result<Model<'_, File>> {
        let path = format!("projects/{project_id}/files/files/upload");
        let mut form = Form::submitted();
        form.push("file[name]", upload.filename.clone());
        form.push("file[body]", upload.filename.clone());
        let form = form.attach(upload);
        let payload = self.post_cmd(&path, &form)?.required(&path)?;
        self.model(payload, Identity::project(project_id))
    }

    pub fn download_attachment(&self, permalink: &str) -> Result<Vec<u8>> {
        let sep = if permalink.contains('?') { '&' } else { '?' };
        let url = format!("{permalink}{sep}auth_api_token={}", self.key);
        let response = self.http.get(&url).send()?;
        if !response.status().is_success() {
            return Err(ActLabError::Client(format!(
                "could not download attachment at {permalink}"
            )));
        }
        Ok(response.bytes()?.to_vec())
    }

    /// Convenience for code holding only an attachment model.
    pub fn download(&self, attachment: &Model<'_, Attachment>) -> Result<Vec<u8>> {
        let permalink = attachment
            .permalink()
            .ok_or_else(|| ActLabError::Client("attachment has no permalink".to_string()))?;
        self.download_attachment(permalink)
    }
}

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

/// Outcome of one request. Unsuccessful statuses carry no payload.
struct Reply {
    status: u16,
    payload: Option<Payload>,
}

impl Reply {
    fn ok(self) -> Option<Payload> {
        self.payload
    }

    /// Payload of a request that must succeed.
    fn required(self, path: &str) -> Result<Payload> {
        self.payload.ok_or_else(|| ActLabError::Status {
            status: self.status,
            path: path.to_string(),
        })
    }
}

/// API v1 wraps single entities as `{"single": {...}}`.
fn unwrap_single(payload: Payload) -> Payload {
    match payload {
        Payload::Json(Value::Object(mut map)) if map.get("single").is_some_and(Value::is_object) => {
            Payload::Json(map.remove("single").unwrap_or(Value::Null))
        }
        other => other,
    }
}

fn is_completed(map: &Map<String, Value>) -> bool {
    match map.get("is_completed") {
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "1",
        _ => false,
    }
}

fn permalink_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:path_info=projects%2F[a-zA-Z0-9-]+%2Fnotebooks%2F\d+%2Fpages%2F|/projects/.*/notebooks/[0-9]+/pages/)([0-9]+)",
        )
        .unwrap_or_else(|e| panic!("invalid permalink regex: {e}"))
    })
}

pub fn page_id_from_permalink(permalink: &str) -> Option<i64> {
    permalink_regex()
        .captures(permalink)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
