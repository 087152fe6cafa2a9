use crate::resource::ResourceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActLabError {
    #[error("{0}")]
    Client(String),

    #[error("could not connect to {0}")]
    Connection(String),

    #[error("invalid credentials: the email/password pair was rejected")]
    InvalidCredentials,

    #[error("invalid api key: the key was rejected by the server")]
    InvalidApiKey,

    #[error("a key or email and password must be provided")]
    MissingCredentials,

    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),

    #[error("{kind} is missing its {parent} id")]
    MissingParent {
        kind: ResourceKind,
        parent: &'static str,
    },

    #[error("{0} has no id")]
    MissingId(ResourceKind),

    #[error("field '{field}' expected {expected}, got {found}")]
    Coercion {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("{kind} has no field '{field}'")]
    UnknownField { kind: ResourceKind, field: String },

    #[error("{kind} does not support {op}")]
    Unsupported { kind: ResourceKind, op: &'static str },

    #[error("request to '{path}' failed with status {status}")]
    Status { status: u16, path: String },

    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),

    #[error("not configured: run 'actlab init'")]
    NotConfigured,

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error("git: {0}")]
    Git(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for ActLabError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            let target = e
                .url()
                .map(|u| u.as_str().to_string())
                .unwrap_or_else(|| "server".to_string());
            ActLabError::Connection(target)
        } else {
            ActLabError::Http(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, ActLabError>;
