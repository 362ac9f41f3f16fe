//! Design document definitions and reconciliation.
//!
//! A [`ViewDefinition`] describes one map/reduce view as the application
//! wants it to exist; [`sync_many`] makes the stored design documents match
//! a set of definitions, writing every changed document in a single
//! `_bulk_docs` request so multi-document updates land atomically.
//! Syncing the same definitions twice writes nothing the second time.

use crate::database::{Database, JsonMap, UpdateResult};
use crate::error::{CouchError, Result};
use crate::view::{RowWrapper, ViewOptions, ViewResults};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Callback invoked on each changed design document before it is queued
/// for the bulk write.
pub type SyncCallback<'a> = &'a (dyn Fn(&mut JsonMap) + Send + Sync);

/// A view stored in a specific design document.
#[derive(Clone)]
pub struct ViewDefinition {
    design: String,
    name: String,
    map_fun: String,
    reduce_fun: String,
    language: String,
    wrapper: Option<RowWrapper>,
    options: Option<JsonMap>,
}

impl ViewDefinition {
    /// Define the view `name` in design document `design`.
    ///
    /// `map_fun` is required; `reduce_fun` is optional (empty for none).
    /// `language` defaults to `"javascript"` when empty. `wrapper` is an
    /// optional row transformer applied when the view is executed through
    /// this definition, and `options` are stored view options.
    pub fn new(
        design: &str,
        name: &str,
        map_fun: &str,
        reduce_fun: &str,
        language: &str,
        wrapper: Option<RowWrapper>,
        options: Option<JsonMap>,
    ) -> Result<ViewDefinition> {
        if map_fun.trim().is_empty() {
            return Err(CouchError::InvalidArgument("map function empty".into()));
        }
        let language = if language.is_empty() {
            "javascript"
        } else {
            language
        };
        Ok(ViewDefinition {
            design: design.to_string(),
            name: name.to_string(),
            map_fun: map_fun.trim_start_matches('\n').to_string(),
            reduce_fun: reduce_fun.trim_start_matches('\n').to_string(),
            language: language.to_string(),
            wrapper,
            options,
        })
    }

    /// The design document name.
    pub fn design(&self) -> &str {
        &self.design
    }

    /// The view name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute this view in `db`. The definition's stored options override
    /// `options` on key collisions.
    pub fn view_results(&self, db: &Database, options: ViewOptions) -> ViewResults {
        let mut merged = options;
        if let Some(stored) = &self.options {
            for (key, value) in stored {
                merged.insert(key.clone(), value.clone());
            }
        }
        db.view(
            &format!("{}/{}", self.design, self.name),
            self.wrapper.clone(),
            merged,
        )
    }

    /// Fetch the design document this definition belongs to.
    pub async fn get_doc(&self, db: &Database) -> Result<JsonMap> {
        db.get(&format!("_design/{}", self.design), &[]).await
    }

    /// Make the stored view match this definition.
    pub async fn sync(&self, db: &Database) -> Result<Vec<UpdateResult>> {
        sync_many(db, std::slice::from_ref(self), false, None).await
    }

    /// The `{map, reduce?, options?}` object stored under `views.<name>`.
    fn functions(&self) -> JsonMap {
        let mut funcs = JsonMap::new();
        funcs.insert("map".to_string(), Value::String(self.map_fun.clone()));
        if !self.reduce_fun.is_empty() {
            funcs.insert("reduce".to_string(), Value::String(self.reduce_fun.clone()));
        }
        if let Some(options) = &self.options {
            funcs.insert("options".to_string(), Value::Object(options.clone()));
        }
        funcs
    }
}

impl std::fmt::Debug for ViewDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewDefinition")
            .field("design", &self.design)
            .field("name", &self.name)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// Reconcile `definitions` against the design documents stored in `db`.
///
/// Definitions are grouped by design name and processed in lexicographic
/// order. For each design document: missing documents are initialized,
/// every definition is applied into `doc.views`, and, when
/// `remove_missing` is set, stored views with no matching definition are
/// dropped. A design document mixing view languages is rejected. Only
/// documents that actually changed are written, all of them in one
/// `_bulk_docs` call; `callback` sees each changed document before the
/// write.
pub async fn sync_many(
    db: &Database,
    definitions: &[ViewDefinition],
    remove_missing: bool,
    callback: Option<SyncCallback<'_>>,
) -> Result<Vec<UpdateResult>> {
    let mut by_design: BTreeMap<&str, Vec<&ViewDefinition>> = BTreeMap::new();
    for defn in definitions {
        by_design.entry(&defn.design).or_default().push(defn);
    }

    let mut docs: Vec<JsonMap> = Vec::new();
    for (design, defns) in &by_design {
        let doc_id = format!("_design/{design}");
        let mut doc = match db.get(&doc_id, &[]).await {
            Ok(doc) => doc,
            Err(_) => {
                let mut fresh = JsonMap::new();
                fresh.insert("_id".to_string(), Value::String(doc_id.clone()));
                fresh
            }
        };
        let orig = doc.clone();

        apply_definitions(&mut doc, defns, remove_missing)?;

        if doc != orig {
            if let Some(callback) = callback {
                callback(&mut doc);
            }
            docs.push(doc);
        }
    }

    if docs.is_empty() {
        return Ok(Vec::new());
    }
    db.update(&mut docs, None).await
}

/// Apply `defns` into `doc`. Pure: no I/O, so reconciliation semantics are
/// testable without a server.
fn apply_definitions(
    doc: &mut JsonMap,
    defns: &[&ViewDefinition],
    remove_missing: bool,
) -> Result<()> {
    let mut languages: BTreeSet<String> = BTreeSet::new();
    let mut missing: BTreeSet<String> = doc
        .get("views")
        .and_then(Value::as_object)
        .map(|views| views.keys().cloned().collect())
        .unwrap_or_default();

    for defn in defns {
        let funcs = Value::Object(defn.functions());
        match doc.get_mut("views").and_then(Value::as_object_mut) {
            Some(views) => {
                views.insert(defn.name.clone(), funcs);
            }
            None => {
                let mut views = JsonMap::new();
                views.insert(defn.name.clone(), funcs);
                doc.insert("views".to_string(), Value::Object(views));
            }
        }
        languages.insert(defn.language.clone());
        missing.remove(&defn.name);
    }

    if remove_missing {
        if let Some(views) = doc.get_mut("views").and_then(Value::as_object_mut) {
            for name in &missing {
                views.remove(name);
            }
        }
    } else if let Some(language) = doc.get("language").and_then(Value::as_str) {
        languages.insert(language.to_string());
    }

    if languages.len() > 1 {
        return Err(CouchError::InvalidArgument(format!(
            "conflicting view languages in one design document: {languages:?}"
        )));
    }
    let language = languages
        .into_iter()
        .next()
        .unwrap_or_else(|| "javascript".to_string());
    doc.insert("language".to_string(), Value::String(language));
    Ok(())
}
