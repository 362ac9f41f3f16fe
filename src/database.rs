//! Per-database operations: document CRUD, bulk updates, attachments,
//! revisions, Mango queries, indexes and views.
//!
//! A [`Database`] owns a [`Resource`] whose base URL ends with the database
//! name. Documents are free-form JSON objects ([`JsonMap`]) with two
//! reserved keys: `_id` (immutable after the first successful write) and
//! `_rev` (the MVCC revision token the server assigns on every write).
//! Write operations mutate those keys in place, so a document saved through
//! this handle is always ready for its next update.
//!
//! ```no_run
//! use couchdb_rs::{Database, JsonMap};
//! use serde_json::json;
//!
//! # async fn demo() -> couchdb_rs::Result<()> {
//! let db = Database::new("movies")?;
//! let mut doc = JsonMap::new();
//! doc.insert("title".into(), json!("Tampopo"));
//! let (id, rev) = db.save(&mut doc, &[]).await?;
//! assert_eq!(doc["_rev"], json!(rev));
//! assert_eq!(doc["_id"], json!(id));
//! # Ok(())
//! # }
//! ```

use crate::config::default_server_url;
use crate::error::{CouchError, Result};
use crate::resource::{parse_json_body, Resource};
use crate::selector::{parse_selector, parse_sort};
use crate::view::{design_path, encode_view_options, Row, RowWrapper, ViewOptions, ViewResults};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use url::Url;

/// A free-form JSON document: string keys to JSON values.
pub type JsonMap = serde_json::Map<String, Value>;

/// Result of one document in a bulk update: the id and new revision when
/// the write went through, or the per-document server error.
#[derive(Debug)]
pub struct UpdateResult {
    pub id: String,
    pub rev: String,
    pub err: Option<CouchError>,
}

impl UpdateResult {
    /// True when this document was written.
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}

/// Handle to one database on the server.
#[derive(Clone, Debug)]
pub struct Database {
    resource: Resource,
}

impl Database {
    /// Open a database by absolute URL, or by bare name resolved against
    /// [`default_server_url`].
    pub fn new(url_or_name: &str) -> Result<Database> {
        let url = if url_or_name.starts_with("http") {
            url_or_name.to_string()
        } else {
            let base = Url::parse(&default_server_url())?;
            base.join(url_or_name)?.to_string()
        };
        Ok(Database {
            resource: Resource::new(&url)?,
        })
    }

    /// Wrap an existing [`Resource`] pointing at a database.
    pub fn with_resource(resource: Resource) -> Database {
        Database { resource }
    }

    pub(crate) fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Error when the database is not reachable or does not exist.
    pub async fn available(&self) -> Result<()> {
        self.resource.head("", None, &[]).await.map(|_| ())
    }

    /// Error (404) when no document with `docid` exists.
    pub async fn contains(&self, docid: &str) -> Result<()> {
        doc_resource(&self.resource, docid)
            .head("", None, &[])
            .await
            .map(|_| ())
    }

    /// The server-reported database name (`db_name` from the info reply).
    pub async fn name(&self) -> Result<String> {
        let info = self.info("").await?;
        info.get("db_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CouchError::Decode("info reply has no db_name".into()))
    }

    /// Information about the database (`ddoc` empty) or about a design
    /// document's view index.
    pub async fn info(&self, ddoc: &str) -> Result<JsonMap> {
        let path = if ddoc.is_empty() {
            String::new()
        } else {
            format!("_design/{ddoc}/_info")
        };
        let (_, value) = self.resource.get_json(&path, None, &[]).await?;
        into_object(value)
    }

    /// Number of documents in the database.
    pub async fn len(&self) -> Result<u64> {
        let info = self.info("").await?;
        info.get("doc_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| CouchError::Decode("info reply has no doc_count".into()))
    }

    // ---- document CRUD ----

    /// Create or update a document.
    ///
    /// With an `_id` the document is PUT at that id; without one the server
    /// allocates an id via POST. On success the returned `(id, rev)` are
    /// also written back into `doc`. With the `batch=ok` option the server
    /// defers the commit and reports no revision; `doc` is left untouched
    /// and the returned rev is empty.
    pub async fn save(
        &self,
        doc: &mut JsonMap,
        params: &[(String, String)],
    ) -> Result<(String, String)> {
        let body = Value::Object(doc.clone());
        let reply = match doc.get("_id").and_then(Value::as_str) {
            Some(id) => {
                doc_resource(&self.resource, id)
                    .put_json("", None, &body, params)
                    .await?
                    .1
            }
            None => self.resource.post_json("", None, &body, params).await?.1,
        };

        let mut id = String::new();
        let mut rev = String::new();
        if let Some(value) = reply.get("id").and_then(Value::as_str) {
            id = value.to_string();
            doc.insert("_id".to_string(), Value::String(id.clone()));
        }
        if let Some(value) = reply.get("rev").and_then(Value::as_str) {
            rev = value.to_string();
            doc.insert("_rev".to_string(), Value::String(rev.clone()));
        }
        Ok((id, rev))
    }

    /// Fetch the document with `docid`; the `rev=R` param selects a
    /// specific revision, otherwise the latest is returned.
    pub async fn get(&self, docid: &str, params: &[(String, String)]) -> Result<JsonMap> {
        let (_, value) = doc_resource(&self.resource, docid)
            .get_json("", None, params)
            .await?;
        into_object(value)
    }

    /// PUT a full document at `docid`, overwriting when the incoming `_rev`
    /// matches. The reply's id and rev are written back into `doc`.
    pub async fn set(&self, docid: &str, doc: &mut JsonMap) -> Result<()> {
        let body = Value::Object(doc.clone());
        let (_, reply) = doc_resource(&self.resource, docid)
            .put_json("", None, &body, &[])
            .await?;
        if let Some(id) = reply.get("id").and_then(Value::as_str) {
            doc.insert("_id".to_string(), Value::String(id.to_string()));
        }
        if let Some(rev) = reply.get("rev").and_then(Value::as_str) {
            doc.insert("_rev".to_string(), Value::String(rev.to_string()));
        }
        Ok(())
    }

    /// Delete the document with `docid`, reading its current revision from
    /// the ETag of a HEAD probe first.
    pub async fn delete(&self, docid: &str) -> Result<()> {
        let res = doc_resource(&self.resource, docid);
        let (headers, _) = res.head("", None, &[]).await?;
        let rev = headers
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string())
            .ok_or_else(|| CouchError::Decode("HEAD reply has no ETag".into()))?;
        delete_rev(&res, &rev).await
    }

    /// Delete `doc`, which must carry both `_id` and `_rev`. Fails fast
    /// without a request when either is missing.
    pub async fn delete_doc(&self, doc: &JsonMap) -> Result<()> {
        let id = required_str(doc, "_id", CouchError::MissingId)?;
        let rev = required_str(doc, "_rev", CouchError::MissingRev)?;
        delete_rev(&doc_resource(&self.resource, &id), &rev).await
    }

    /// Bulk-create or update `docs` in one `_bulk_docs` request.
    ///
    /// The reply carries one entry per input document, in input order.
    /// Successful entries mutate the corresponding input document's
    /// `_id`/`_rev`; failed entries surface the server's per-document
    /// error (`conflict`, `forbidden`, or a generic internal error).
    pub async fn update(
        &self,
        docs: &mut [JsonMap],
        options: Option<JsonMap>,
    ) -> Result<Vec<UpdateResult>> {
        let mut body = options.unwrap_or_default();
        body.insert(
            "docs".to_string(),
            Value::Array(docs.iter().cloned().map(Value::Object).collect()),
        );
        let (_, reply) = self
            .resource
            .post_json("_bulk_docs", None, &Value::Object(body), &[])
            .await?;
        let items = reply
            .as_array()
            .ok_or_else(|| CouchError::Decode("bulk update reply is not an array".into()))?;

        let mut results = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let id = item
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if let Some(error) = item.get("error").and_then(Value::as_str) {
                let reason = item
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or(error)
                    .to_string();
                let err = match error {
                    "conflict" => CouchError::Conflict(reason),
                    "forbidden" => CouchError::Forbidden(reason),
                    _ => CouchError::InternalServerError(reason),
                };
                results.push(UpdateResult {
                    id,
                    rev: String::new(),
                    err: Some(err),
                });
            } else {
                let rev = item
                    .get("rev")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if let Some(doc) = docs.get_mut(idx) {
                    doc.insert("_id".to_string(), Value::String(id.clone()));
                    doc.insert("_rev".to_string(), Value::String(rev.clone()));
                }
                results.push(UpdateResult { id, rev, err: None });
            }
        }
        Ok(results)
    }

    /// IDs of all documents in the database.
    pub async fn doc_ids(&self) -> Result<Vec<String>> {
        let (_, value) = self.resource.get_json("_all_docs", None, &[]).await?;
        let rows = value
            .get("rows")
            .and_then(Value::as_array)
            .ok_or_else(|| CouchError::Decode("_all_docs reply has no rows".into()))?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// All available revisions of `docid`, latest first.
    pub async fn revisions(
        &self,
        docid: &str,
        params: &[(String, String)],
    ) -> Result<Vec<JsonMap>> {
        let (_, value) = doc_resource(&self.resource, docid)
            .get_json("", None, &[("revs".to_string(), "true".to_string())])
            .await?;
        let envelope = value
            .get("_revisions")
            .ok_or_else(|| CouchError::Decode("reply has no _revisions".into()))?;
        let start = envelope.get("start").and_then(Value::as_i64).unwrap_or(0);
        let ids = envelope
            .get("ids")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut docs = Vec::with_capacity(ids.len());
        for (idx, hash) in ids.iter().enumerate() {
            let Some(hash) = hash.as_str() else { continue };
            let rev = format!("{}-{hash}", start - idx as i64);
            let mut options = params.to_vec();
            options.push(("rev".to_string(), rev));
            docs.push(self.get(docid, &options).await?);
        }
        Ok(docs)
    }

    // ---- maintenance ----

    /// Flush any delayed commits to disk.
    pub async fn commit(&self) -> Result<()> {
        self.resource
            .post_json("_ensure_full_commit", None, &Value::Null, &[])
            .await
            .map(|_| ())
    }

    /// Compact the database file.
    pub async fn compact(&self) -> Result<()> {
        self.resource
            .post_json("_compact", None, &Value::Null, &[])
            .await
            .map(|_| ())
    }

    /// Remove view index files no longer in use.
    pub async fn cleanup(&self) -> Result<()> {
        self.resource
            .post_json("_view_cleanup", None, &Value::Null, &[])
            .await
            .map(|_| ())
    }

    // ---- attachments ----

    /// Upload `content` as the attachment `name` of `doc`, which must carry
    /// `_id` and `_rev`. Advances `doc`'s `_rev` on success.
    pub async fn put_attachment(
        &self,
        doc: &mut JsonMap,
        content: impl Into<Bytes>,
        name: &str,
        mime_type: &str,
    ) -> Result<()> {
        let id = required_str(doc, "_id", CouchError::MissingId)?;
        let rev = required_str(doc, "_rev", CouchError::MissingRev)?;

        let res = doc_resource(&doc_resource(&self.resource, &id), name);
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(mime_type).map_err(|e| CouchError::Http(e.to_string()))?,
        );
        let params = vec![("rev".to_string(), rev)];
        let (_, data) = res.put("", Some(headers), content.into(), &params).await?;
        let reply = parse_json_body(&data)?;
        if let Some(new_rev) = reply.get("rev").and_then(Value::as_str) {
            doc.insert("_rev".to_string(), Value::String(new_rev.to_string()));
        }
        Ok(())
    }

    /// The raw bytes of the attachment `name` of `doc`.
    pub async fn get_attachment(&self, doc: &JsonMap, name: &str) -> Result<Bytes> {
        let id = required_str(doc, "_id", CouchError::MissingId)?;
        self.get_attachment_id(&id, name).await
    }

    /// The raw bytes of the attachment `name` of the document `docid`.
    pub async fn get_attachment_id(&self, docid: &str, name: &str) -> Result<Bytes> {
        let res = doc_resource(&doc_resource(&self.resource, docid), name);
        let (_, data) = res.get("", None, &[]).await?;
        Ok(data)
    }

    /// Delete the attachment `name` of `doc`. Advances `doc`'s `_rev`.
    pub async fn delete_attachment(&self, doc: &mut JsonMap, name: &str) -> Result<()> {
        let id = required_str(doc, "_id", CouchError::MissingId)?;
        let rev = required_str(doc, "_rev", CouchError::MissingRev)?;

        let res = doc_resource(&doc_resource(&self.resource, &id), name);
        let params = vec![("rev".to_string(), rev)];
        let (_, reply) = res.delete_json("", None, &params).await?;
        if let Some(new_rev) = reply.get("rev").and_then(Value::as_str) {
            doc.insert("_rev".to_string(), Value::String(new_rev.to_string()));
        }
        Ok(())
    }

    // ---- copy / purge / changes ----

    /// Copy `src_id` to `dest_id` with the `COPY` verb. `dest_rev` must be
    /// given to overwrite an existing destination. Returns the
    /// destination's new revision.
    pub async fn copy(
        &self,
        src_id: &str,
        dest_id: &str,
        dest_rev: Option<&str>,
    ) -> Result<String> {
        let destination = match dest_rev {
            Some(rev) => format!("{dest_id}?rev={rev}"),
            None => dest_id.to_string(),
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("destination"),
            HeaderValue::from_str(&destination).map_err(|e| CouchError::Http(e.to_string()))?,
        );
        let method =
            Method::from_bytes(b"COPY").map_err(|e| CouchError::Http(e.to_string()))?;
        let (_, data) = doc_resource(&self.resource, src_id)
            .request_raw(method, Some(headers), None, &[])
            .await?;
        let reply = parse_json_body(&data)?;
        reply
            .get("rev")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CouchError::Decode("copy reply has no rev".into()))
    }

    /// Permanently remove the given documents (id and rev pairs) with
    /// `POST /_purge`.
    pub async fn purge(&self, docs: &[JsonMap]) -> Result<JsonMap> {
        let mut body = JsonMap::new();
        for doc in docs {
            let id = required_str(doc, "_id", CouchError::MissingId)?;
            let rev = required_str(doc, "_rev", CouchError::MissingRev)?;
            match body
                .entry(id)
                .or_insert_with(|| Value::Array(Vec::new()))
                .as_array_mut()
            {
                Some(revs) => revs.push(Value::String(rev)),
                None => return Err(CouchError::InvalidArgument("duplicate _purge id".into())),
            }
        }
        let (_, value) = self
            .resource
            .post_json("_purge", None, &Value::Object(body), &[])
            .await?;
        into_object(value)
    }

    /// The changes feed for this database.
    pub async fn changes(&self, params: &[(String, String)]) -> Result<JsonMap> {
        let (_, value) = self.resource.get_json("_changes", None, params).await?;
        into_object(value)
    }

    // ---- security / limits ----

    /// Replace the database security object.
    pub async fn set_security(&self, security: &JsonMap) -> Result<()> {
        self.resource
            .put_json("_security", None, &Value::Object(security.clone()), &[])
            .await
            .map(|_| ())
    }

    /// The current database security object.
    pub async fn get_security(&self) -> Result<JsonMap> {
        let (_, value) = self.resource.get_json("_security", None, &[]).await?;
        into_object(value)
    }

    /// The current `revs_limit` setting.
    pub async fn get_revs_limit(&self) -> Result<u64> {
        let (_, data) = self.resource.get("_revs_limit", None, &[]).await?;
        String::from_utf8_lossy(&data)
            .trim()
            .parse::<u64>()
            .map_err(|e| CouchError::Decode(format!("revs_limit: {e}")))
    }

    /// Set how many revisions per document the server tracks.
    pub async fn set_revs_limit(&self, limit: u64) -> Result<()> {
        self.resource
            .put("_revs_limit", None, Bytes::from(limit.to_string()), &[])
            .await
            .map(|_| ())
    }

    // ---- Mango queries and indexes ----

    /// Query documents with a selector expression (see the
    /// [`selector`](crate::selector) module for the syntax).
    ///
    /// `fields` restricts the returned fields; `sorts` entries are field
    /// chains or `asc(..)`/`desc(..)` calls; `index` names the index to
    /// use, either `"<ddoc>"` or `["<ddoc>", "<index>"]`.
    pub async fn query(
        &self,
        fields: Option<&[&str]>,
        selector: &str,
        sorts: Option<&[&str]>,
        limit: Option<u64>,
        skip: Option<u64>,
        index: Option<Value>,
    ) -> Result<Vec<JsonMap>> {
        let mut find = JsonMap::new();
        find.insert("selector".to_string(), parse_selector(selector)?);
        if let Some(limit) = limit {
            find.insert("limit".to_string(), Value::from(limit));
        }
        if let Some(skip) = skip {
            find.insert("skip".to_string(), Value::from(skip));
        }
        if let Some(sorts) = sorts {
            find.insert("sort".to_string(), parse_sort(sorts)?);
        }
        if let Some(fields) = fields {
            find.insert(
                "fields".to_string(),
                Value::Array(fields.iter().map(|f| Value::String(f.to_string())).collect()),
            );
        }
        if let Some(index) = index {
            find.insert("use_index".to_string(), index);
        }
        self.find(Value::Object(find)).await
    }

    /// Query documents with a raw Mango JSON query string.
    pub async fn query_json(&self, query: &str) -> Result<Vec<JsonMap>> {
        let parsed: Value = serde_json::from_str(query)?;
        self.find(parsed).await
    }

    async fn find(&self, query: Value) -> Result<Vec<JsonMap>> {
        let (_, reply) = self.resource.post_json("_find", None, &query, &[]).await?;
        let docs = reply
            .get("docs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        docs.into_iter().map(into_object).collect()
    }

    /// Create a Mango index over `fields` (sort syntax). `ddoc` and `name`
    /// are optional; the server generates them when absent. Returns the
    /// design document id and index name.
    pub async fn put_index(
        &self,
        fields: &[&str],
        ddoc: Option<&str>,
        name: Option<&str>,
    ) -> Result<(String, String)> {
        if fields.is_empty() {
            return Err(CouchError::InvalidArgument(
                "index fields cannot be empty".into(),
            ));
        }
        let mut body = JsonMap::new();
        body.insert("index".to_string(), json!({ "fields": parse_sort(fields)? }));
        if let Some(ddoc) = ddoc {
            body.insert("ddoc".to_string(), Value::String(ddoc.to_string()));
        }
        if let Some(name) = name {
            body.insert("name".to_string(), Value::String(name.to_string()));
        }
        let (_, reply) = self
            .resource
            .post_json("_index", None, &Value::Object(body), &[])
            .await?;
        let design = reply
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let index = reply
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok((design, index))
    }

    /// All indexes defined in the database.
    pub async fn get_index(&self) -> Result<JsonMap> {
        let (_, value) = self.resource.get_json("_index", None, &[]).await?;
        into_object(value)
    }

    /// Delete the index `name` in design document `ddoc`.
    pub async fn delete_index(&self, ddoc: &str, name: &str) -> Result<()> {
        doc_resource(&self.resource, &format!("_index/{ddoc}/json/{name}"))
            .delete_json("", None, &[])
            .await
            .map(|_| ())
    }

    // ---- views ----

    /// Execute a design document view. `name` is `"design/view"` for
    /// user-defined views; `_`-prefixed names (e.g. `_all_docs`) address
    /// server views directly. The request happens on first access of the
    /// returned [`ViewResults`].
    pub fn view(
        &self,
        name: &str,
        wrapper: Option<RowWrapper>,
        options: ViewOptions,
    ) -> ViewResults {
        ViewResults::new(
            self.resource.clone(),
            design_path(name, "_view"),
            options,
            wrapper,
        )
    }

    /// Stream a view's rows in batches of `batch`; see the
    /// [`view`](crate::view) module docs for the pagination contract.
    pub fn iter_view(
        &self,
        name: &str,
        batch: usize,
        wrapper: Option<RowWrapper>,
        options: ViewOptions,
    ) -> Result<async_channel::Receiver<Row>> {
        crate::view::iter_view(self.resource.clone(), name, batch, wrapper, options)
    }

    // ---- design function passthroughs ----

    /// Call a server-side show function, `name` as `"design/show"`.
    pub async fn show(
        &self,
        name: &str,
        docid: &str,
        params: &[(String, String)],
    ) -> Result<(HeaderMap, Bytes)> {
        let mut path = design_path(name, "_show");
        if !docid.is_empty() {
            path = format!("{path}/{docid}");
        }
        self.resource.get(&path, None, params).await
    }

    /// Render a view through a server-side list function; `name` as
    /// `"design/list"`, `view` as `"design/view"`.
    pub async fn list(
        &self,
        name: &str,
        view: &str,
        options: &ViewOptions,
    ) -> Result<(HeaderMap, Bytes)> {
        let path = design_path(name, "_list");
        let view_name = view.rsplit('/').next().unwrap_or(view);
        let res = doc_resource(&self.resource, &format!("{path}/{view_name}"));
        let (params, body) = encode_view_options(options)?;
        if body.is_empty() {
            res.get("", None, &params).await
        } else {
            let encoded = Bytes::from(serde_json::to_vec(&Value::Object(body))?);
            res.post("", None, encoded, &params).await
        }
    }

    /// Call a server-side update handler, `name` as `"design/update"`.
    /// POSTs without a document id, PUTs with one.
    pub async fn update_doc(
        &self,
        name: &str,
        docid: &str,
        params: &[(String, String)],
    ) -> Result<(HeaderMap, Bytes)> {
        let path = design_path(name, "_update");
        if docid.is_empty() {
            self.resource.post(&path, None, Bytes::new(), params).await
        } else {
            let path = format!("{path}/{docid}");
            self.resource.put(&path, None, Bytes::new(), params).await
        }
    }
}

impl std::fmt::Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database {}", self.resource.base())
    }
}

async fn delete_rev(res: &Resource, rev: &str) -> Result<()> {
    let params = vec![("rev".to_string(), rev.to_string())];
    res.delete_json("", None, &params).await.map(|_| ())
}

/// Resolve the resource addressing `doc_id` under `res`: `_`-prefixed ids
/// are slash-split server paths appended verbatim, anything else is one
/// percent-encoded segment.
pub(crate) fn doc_resource(res: &Resource, doc_id: &str) -> Resource {
    res.child(doc_id)
}

fn into_object(value: Value) -> Result<JsonMap> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CouchError::Decode(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn required_str(doc: &JsonMap, key: &str, missing: CouchError) -> Result<String> {
    match doc.get(key).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(missing),
    }
}

/// A random 128-bit UUID in `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` form,
/// for allocating document ids on the client side.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Pretty-print any JSON-serializable value.
pub fn beautify_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
