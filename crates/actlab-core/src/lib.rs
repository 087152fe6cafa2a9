//! Typed models and a blocking client for the Active Collab REST API.
//!
//! ```no_run
//! use actlab_core::{Client, ClientConfig, Credentials};
//!
//! # fn main() -> actlab_core::Result<()> {
//! let config = ClientConfig::new("https://collab.example.com", "/");
//! let client = Client::connect(config, Credentials::ApiKey("1-abc".into()))?;
//! for mut task in client.get_tasks(3, false)? {
//!     task.set_field("priority", 1i64)?;
//!     task.save()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod field;
pub mod form;
pub mod hook;
pub mod io;
pub mod markdown;
pub mod model;
pub mod paths;
pub mod payload;
pub mod resource;

pub use client::{Client, ClientConfig, Credentials};
pub use error::{ActLabError, Result};
pub use field::{FieldMap, FieldValue};
pub use model::Model;
pub use payload::Payload;
pub use resource::{Identity, ResourceKind};
