//! couchdb-rs: a typed async client for the CouchDB HTTP API.
//!
//! CouchDB speaks JSON over HTTP; this crate puts an idiomatic surface on
//! that wire protocol:
//!
//! - **Documents with MVCC**: create, read, update and delete free-form
//!   JSON documents; every write yields a new `_rev` and the library keeps
//!   the in-memory document's identity current.
//! - **Bulk updates**: `_bulk_docs` with per-document result
//!   interpretation.
//! - **Attachments**: binary content as sub-resources of a document,
//!   versioned through the parent's revision.
//! - **Views**: lazy results, a fixed option-encoding policy, and batched
//!   streaming iteration with start-key continuation.
//! - **Mango queries**: a selector expression compiler
//!   (`year >= 1989 && in(genre, []string{"Comedy"})`) plus index
//!   management.
//! - **Design sync**: reconcile in-memory view definitions against stored
//!   design documents atomically.
//! - **Sessions**: cookie authentication via `/_session`, carried on every
//!   request once installed.
//!
//! # Modules
//!
//! - [`resource`] - HTTP verbs, URL composition, auth and status mapping
//! - [`server`] - cluster-wide operations and session management
//! - [`database`] - per-database document operations
//! - [`view`] - view execution and streaming iteration
//! - [`selector`] - the Mango selector/sort compiler
//! - [`design`] - design document reconciliation
//! - [`mapping`] - serde bridge for user structs
//! - [`error`] - the error taxonomy
//!
//! # Quick start
//!
//! ```no_run
//! use couchdb_rs::{Server, JsonMap};
//! use serde_json::json;
//!
//! # async fn demo() -> couchdb_rs::Result<()> {
//! let server = Server::new("http://localhost:5984")?;
//! let (db, _created) = server.create("movies").await?;
//!
//! let mut doc = JsonMap::new();
//! doc.insert("title".into(), json!("Throne of Blood"));
//! doc.insert("year".into(), json!(1957));
//! let (id, rev) = db.save(&mut doc, &[]).await?;
//!
//! let found = db
//!     .query(None, "year == 1957", None, None, None, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod design;
pub mod error;
pub mod mapping;
pub mod resource;
pub mod selector;
pub mod server;
pub mod view;

pub use config::{default_server_url, ClientConfig, DEFAULT_BASE_URL};
pub use database::{beautify_json, generate_uuid, Database, JsonMap, UpdateResult};
pub use design::{sync_many, SyncCallback, ViewDefinition};
pub use error::{CouchError, Result};
pub use mapping::{from_doc, to_doc, Document};
pub use resource::{Params, Resource};
pub use selector::{parse_selector, parse_sort};
pub use server::{ClusterPlacement, DatabaseInfo, DatabaseSizes, Server};
pub use view::{Row, RowStream, RowWrapper, ViewOptions, ViewResults};
