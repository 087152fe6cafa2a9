use crate::error::{ActLabError, Result};
use crate::field::{FieldKind, FieldSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    Company,
    Project,
    Task,
    Notebook,
    Page,
    Comment,
    File,
    Attachment,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::User,
            ResourceKind::Company,
            ResourceKind::Project,
            ResourceKind::Task,
            ResourceKind::Notebook,
            ResourceKind::Page,
            ResourceKind::Comment,
            ResourceKind::File,
            ResourceKind::Attachment,
        ]
    }

    /// Operation family name used by the command endpoints.
    pub fn method(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Company => "people",
            ResourceKind::Project => "project",
            ResourceKind::Task => "task",
            ResourceKind::Notebook => "notebook",
            ResourceKind::Page => "notebook_page",
            ResourceKind::Comment => "comment",
            ResourceKind::File => "file",
            ResourceKind::Attachment => "attachment",
        }
    }

    /// Namespace wrapped around submitted field keys (`project[name]`).
    pub fn prefix(self) -> &'static str {
        match self {
            ResourceKind::Company => "company",
            other => other.method(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Company => "company",
            ResourceKind::Project => "project",
            ResourceKind::Task => "task",
            ResourceKind::Notebook => "notebook",
            ResourceKind::Page => "page",
            ResourceKind::Comment => "comment",
            ResourceKind::File => "file",
            ResourceKind::Attachment => "attachment",
        }
    }

    pub fn needs_project(self) -> bool {
        matches!(
            self,
            ResourceKind::Task | ResourceKind::Notebook | ResourceKind::Page | ResourceKind::File
        )
    }

    /// Path of a single existing entity on the command endpoint.
    pub fn item_path(self, ident: &Identity, id: i64) -> Result<String> {
        let path = match self {
            ResourceKind::Company => format!("people/{id}"),
            ResourceKind::User => {
                let company = ident.require_company(self)?;
                format!("people/{company}/users/{id}")
            }
            ResourceKind::Project => format!("projects/{id}"),
            ResourceKind::Task => {
                let project = ident.require_project(self)?;
                // tasks are addressed by their per-project number, not `id`
                let number = ident.require_task_number(self)?;
                format!("projects/{project}/tasks/{number}")
            }
            ResourceKind::Notebook => {
                let project = ident.require_project(self)?;
                format!("projects/{project}/notebooks/{id}")
            }
            ResourceKind::Page => {
                let project = ident.require_project(self)?;
                let notebook = ident.require_notebook(self)?;
                format!("projects/{project}/notebooks/{notebook}/pages/{id}")
            }
            ResourceKind::File => {
                let project = ident.require_project(self)?;
                format!("projects/{project}/files/{id}")
            }
            ResourceKind::Comment | ResourceKind::Attachment => {
                return Err(ActLabError::Unsupported {
                    kind: self,
                    op: "direct addressing",
                })
            }
        };
        Ok(path)
    }

    /// Collection path new entities are added to, for kinds that can be
    /// created by saving a model without an id.
    pub fn create_path(self, ident: &Identity) -> Option<Result<String>> {
        let path = match self {
            ResourceKind::Task => ident
                .require_project(self)
                .map(|p| format!("projects/{p}/tasks/add")),
            ResourceKind::Notebook => ident
                .require_project(self)
                .map(|p| format!("projects/{p}/notebooks/add")),
            ResourceKind::Page => ident.require_project(self).and_then(|p| {
                ident
                    .require_notebook(self)
                    .map(|n| format!("projects/{p}/notebooks/{n}/pages/add"))
            }),
            _ => return None,
        };
        Some(path)
    }

    pub fn can_complete(self) -> bool {
        matches!(self, ResourceKind::Project | ResourceKind::Task)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = ActLabError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ResourceKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ActLabError::Client(format!("unknown resource kind '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifiers that locate an entity but are not part of its field schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub project_id: Option<i64>,
    pub notebook_id: Option<i64>,
    /// A task's number within its project. Not the same as its id.
    pub task_id: Option<i64>,
    pub company_id: Option<i64>,
}

impl Identity {
    pub fn project(project_id: i64) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn notebook(project_id: i64, notebook_id: i64) -> Self {
        Self {
            project_id: Some(project_id),
            notebook_id: Some(notebook_id),
            ..Self::default()
        }
    }

    pub fn company(company_id: i64) -> Self {
        Self {
            company_id: Some(company_id),
            ..Self::default()
        }
    }

    pub fn require_project(&self, kind: ResourceKind) -> Result<i64> {
        self.project_id.ok_or(ActLabError::MissingParent {
            kind,
            parent: "project",
        })
    }

    pub fn require_notebook(&self, kind: ResourceKind) -> Result<i64> {
        self.notebook_id.ok_or(ActLabError::MissingParent {
            kind,
            parent: "notebook",
        })
    }

    pub fn require_task_number(&self, kind: ResourceKind) -> Result<i64> {
        self.task_id.ok_or(ActLabError::MissingParent {
            kind,
            parent: "task number",
        })
    }

    pub fn require_company(&self, kind: ResourceKind) -> Result<i64> {
        self.company_id.ok_or(ActLabError::MissingParent {
            kind,
            parent: "company",
        })
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// Compile-time description of one resource kind.
pub trait Resource {
    const KIND: ResourceKind;
    const SCHEMA: &'static [FieldSpec];
    const ACCEPT_ALL_FIELDS: bool = false;
}

macro_rules! resource {
    ($name:ident, $kind:expr, $schema:expr) => {
        resource!($name, $kind, $schema, false);
    };
    ($name:ident, $kind:expr, $schema:expr, $accept_all:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Resource for $name {
            const KIND: ResourceKind = $kind;
            const SCHEMA: &'static [FieldSpec] = $schema;
            const ACCEPT_ALL_FIELDS: bool = $accept_all;
        }
    };
}

use FieldKind::{Float, Int, List, Str};

const fn f(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec::new(name, kind)
}

pub const USER_FIELDS: &[FieldSpec] = &[
    f("email", Str),
    f("first_name", Str),
    f("last_name", Str),
    // system role: Administrator, Manager, Member, Subcontractor or Client
    f("type", Str),
    f("title", Str),
    f("phone_mobile", Str),
    f("phone_work", Str),
];

pub const COMPANY_FIELDS: &[FieldSpec] = &[
    f("name", Str),
    f("office_address", Str),
    f("office_phone", Str),
    f("office_fax", Str),
    f("office_homepage", Str),
    f("note", Str),
];

pub const PROJECT_FIELDS: &[FieldSpec] = &[
    f("name", Str),
    f("overview", Str),
    f("category_id", Int),
    f("company_id", Int),
    f("leader_id", Int),
    // active or completed
    f("status", Str),
    f("currency_id", Int),
    f("budget", Float),
    f("label_id", Int),
];

pub const NOTEBOOK_FIELDS: &[FieldSpec] = &[
    f("name", Str),
    f("body", Str),
    // 0 private, 1 normal
    f("visibility", Int),
    f("milestone_id", Int),
];

pub const PAGE_FIELDS: &[FieldSpec] = &[
    f("name", Str),
    f("body", Str),
    f("parent_id", Int),
    // read-only, present in page payloads
    f("parent_type", Str),
];

pub const TASK_FIELDS: &[FieldSpec] = &[
    f("name", Str),
    f("body", Str),
    f("visibility", Int),
    f("category_id", Int),
    f("label_id", Int),
    f("milestone_id", Int),
    // -2 (lowest) to 2 (highest), 0 is normal
    f("priority", Int),
    f("assignee_id", Int),
    f("other_assignees", List),
    f("due_on", Str),
    f("created_by_id", Int),
    f("created_by_name", Str),
    f("created_by_email", Str),
];

pub const ATTACHMENT_FIELDS: &[FieldSpec] = &[
    f("name", Str),
    f("size", Int),
    // download url
    f("permalink", Str),
];

pub const COMMENT_FIELDS: &[FieldSpec] = &[f("body", Str)];

pub const FILE_FIELDS: &[FieldSpec] = &[
    f("name", Str),
    f("body", Str),
    f("visibility", Int),
    f("milestone_id", Int),
    f("category_id", Int),
];

resource!(User, ResourceKind::User, USER_FIELDS);
resource!(Company, ResourceKind::Company, COMPANY_FIELDS);
resource!(Project, ResourceKind::Project, PROJECT_FIELDS);
resource!(Task, ResourceKind::Task, TASK_FIELDS);
resource!(Notebook, ResourceKind::Notebook, NOTEBOOK_FIELDS);
resource!(Page, ResourceKind::Page, PAGE_FIELDS);
resource!(Comment, ResourceKind::Comment, COMMENT_FIELDS);
resource!(File, ResourceKind::File, FILE_FIELDS);
resource!(Attachment, ResourceKind::Attachment, ATTACHMENT_FIELDS, true);

pub fn schema_for(kind: ResourceKind) -> &'static [FieldSpec] {
    match kind {
        ResourceKind::User => USER_FIELDS,
        ResourceKind::Company => COMPANY_FIELDS,
        ResourceKind::Project => PROJECT_FIELDS,
        ResourceKind::Task => TASK_FIELDS,
        ResourceKind::Notebook => NOTEBOOK_FIELDS,
        ResourceKind::Page => PAGE_FIELDS,
        ResourceKind::Comment => COMMENT_FIELDS,
        ResourceKind::File => FILE_FIELDS,
        ResourceKind::Attachment => ATTACHMENT_FIELDS,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
