//! Bridging user structs and document maps through serde.
//!
//! Any `Serialize`/`Deserialize` struct can ride through the document API;
//! embedding [`Document`] with `#[serde(flatten)]` gives it the reserved
//! `_id`/`_rev` fields so saves write the assigned identity back into the
//! value:
//!
//! ```no_run
//! use couchdb_rs::{Database, Document};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//!     #[serde(flatten)]
//!     doc: Document,
//! }
//!
//! # async fn demo(db: &Database) -> couchdb_rs::Result<()> {
//! let mut user = User { name: "Mike".into(), age: 18, doc: Document::new() };
//! db.store(&mut user).await?;
//! let again: User = db.load(user.doc.id().unwrap()).await?;
//! # Ok(())
//! # }
//! ```

use crate::database::{Database, JsonMap};
use crate::error::{CouchError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The reserved identity fields of a stored document, for embedding in
/// user structs with `#[serde(flatten)]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
}

impl Document {
    /// A document with no identity yet; the server assigns one on save.
    pub fn new() -> Document {
        Document::default()
    }

    /// A document addressed by a caller-chosen id.
    pub fn with_id(id: &str) -> Document {
        Document {
            id: Some(id.to_string()),
            rev: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    /// Assign the document id. Ids are immutable once set; assigning a
    /// second time fails with [`CouchError::SetId`].
    pub fn set_id(&mut self, id: &str) -> Result<()> {
        if self.id.is_some() {
            return Err(CouchError::SetId);
        }
        self.id = Some(id.to_string());
        Ok(())
    }

    pub fn set_rev(&mut self, rev: &str) {
        self.rev = Some(rev.to_string());
    }
}

/// Serialize a user aggregate into a document map.
pub fn to_doc<T: Serialize>(value: &T) -> Result<JsonMap> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CouchError::Decode(format!(
            "expected a value serializing to a JSON object, got {other}"
        ))),
    }
}

/// Deserialize a document map into a user aggregate.
pub fn from_doc<T: DeserializeOwned>(doc: JsonMap) -> Result<T> {
    serde_json::from_value(Value::Object(doc)).map_err(CouchError::from)
}

impl Database {
    /// Save a user value as a document, writing the server-assigned id and
    /// revision back into the value's `_id`/`_rev` fields.
    pub async fn store<T>(&self, value: &mut T) -> Result<(String, String)>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut doc = to_doc(value)?;
        let (id, rev) = self.save(&mut doc, &[]).await?;
        *value = from_doc(doc)?;
        Ok((id, rev))
    }

    /// Fetch the document `docid` as a user value.
    pub async fn load<T: DeserializeOwned>(&self, docid: &str) -> Result<T> {
        from_doc(self.get(docid, &[]).await?)
    }
}
