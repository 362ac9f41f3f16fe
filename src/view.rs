//! View execution and streaming iteration.
//!
//! A view call does not hit the network by itself: [`Database::view`]
//! returns a lazy [`ViewResults`] and the first accessor triggers one fetch,
//! after which everything is served from the cached reply.
//!
//! [`iter_view`] turns a view into a stream of [`Row`]s fetched in batches:
//! a producer task pages through the view using start-key continuation and
//! emits rows on a bounded channel, so the consumer paces the producer and
//! dropping the receiver tears the producer down at the next send.
//!
//! # Option encoding
//!
//! Each recognized option has a fixed wire encoding:
//!
//! | Option | Encoding |
//! |--------|----------|
//! | `keys` | moved to the JSON request body, forcing a POST |
//! | `key`, `startkey`, `start_key`, `endkey`, `end_key` | JSON-marshalled query param |
//! | `conflicts`, `descending`, `group`, `include_docs`, `attachments`, `att_encoding_info`, `inclusive_end`, `reduce`, `sorted`, `update_seq` | `"true"` / `"false"` |
//! | `endkey_docid`, `end_key_doc_id`, `stale`, `startkey_docid`, `start_key_doc_id`, `format`, `include_header` | string, as-is |
//! | `group_level`, `limit`, `skip` | decimal integer |
//! | any other boolean or number | typed conversion |
//! | anything else | a compile error |
//!
//! [`Database::view`]: crate::Database::view

use crate::database::doc_resource;
use crate::error::{CouchError, Result};
use crate::resource::{Params, Resource};
use futures::Stream;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Options accepted by view requests, keyed by option name.
pub type ViewOptions = BTreeMap<String, Value>;

/// Optional per-row transformer applied before a row is handed out.
pub type RowWrapper = Arc<dyn Fn(Row) -> Row + Send + Sync>;

/// One row of view output.
///
/// `key` can be any JSON value. `val` and `doc` may be absent (`Null` /
/// `None`); `err` carries the server's per-row error string, e.g.
/// `"not_found"` for a multi-get of a missing key.
#[derive(Clone, Debug, Default)]
pub struct Row {
    pub id: String,
    pub key: Value,
    pub val: Value,
    pub doc: Option<Value>,
    pub err: Option<String>,
}

/// Lazily fetched results of a view request.
///
/// Holds the request until the first call to [`rows`](ViewResults::rows),
/// [`offset`](ViewResults::offset), [`total_rows`](ViewResults::total_rows)
/// or [`update_seq`](ViewResults::update_seq); subsequent accessors return
/// the cached reply.
pub struct ViewResults {
    resource: Resource,
    design_doc: String,
    options: ViewOptions,
    wrapper: Option<RowWrapper>,

    offset: i64,
    total_rows: i64,
    update_seq: Option<Value>,
    rows: Option<Vec<Row>>,
}

impl ViewResults {
    pub(crate) fn new(
        resource: Resource,
        design_doc: String,
        options: ViewOptions,
        wrapper: Option<RowWrapper>,
    ) -> ViewResults {
        ViewResults {
            resource,
            design_doc,
            options,
            wrapper,
            offset: -1,
            total_rows: -1,
            update_seq: None,
            rows: None,
        }
    }

    /// The rows mapped (and reduced) by the view.
    pub async fn rows(&mut self) -> Result<Vec<Row>> {
        self.ensure_fetched().await?;
        Ok(self.rows.clone().unwrap_or_default())
    }

    /// Offset of the first row within the view, `-1` when not reported.
    pub async fn offset(&mut self) -> Result<i64> {
        self.ensure_fetched().await?;
        Ok(self.offset)
    }

    /// Total number of rows in the view, `-1` when not reported.
    pub async fn total_rows(&mut self) -> Result<i64> {
        self.ensure_fetched().await?;
        Ok(self.total_rows)
    }

    /// The database update sequence, when requested with `update_seq=true`.
    /// Kept as raw JSON: servers report opaque strings.
    pub async fn update_seq(&mut self) -> Result<Option<Value>> {
        self.ensure_fetched().await?;
        Ok(self.update_seq.clone())
    }

    async fn ensure_fetched(&mut self) -> Result<()> {
        if self.rows.is_some() {
            return Ok(());
        }
        let res = doc_resource(&self.resource, &self.design_doc);
        let (_, value) = view_request(&res, &self.options).await?;
        self.total_rows = value.get("total_rows").and_then(Value::as_i64).unwrap_or(-1);
        self.offset = value.get("offset").and_then(Value::as_i64).unwrap_or(-1);
        self.update_seq = value.get("update_seq").cloned();
        self.rows = Some(decode_rows(&value, self.wrapper.as_ref()));
        Ok(())
    }
}

/// Issue a view-shaped request: GET with encoded query params, or POST when
/// an option (only `keys`) moved into the body.
pub(crate) async fn view_request(res: &Resource, options: &ViewOptions) -> Result<(reqwest::header::HeaderMap, Value)> {
    let (params, body) = encode_view_options(options)?;
    if body.is_empty() {
        res.get_json("", None, &params).await
    } else {
        res.post_json("", None, &Value::Object(body), &params).await
    }
}

/// Apply the fixed per-option encoding policy. Returns the query parameters
/// and the JSON body (non-empty only when `keys` is present).
pub(crate) fn encode_view_options(options: &ViewOptions) -> Result<(Params, Map<String, Value>)> {
    let mut params: Params = Vec::new();
    let mut body = Map::new();
    for (key, value) in options {
        match key.as_str() {
            "keys" => {
                body.insert(key.clone(), value.clone());
            }
            "key" | "startkey" | "start_key" | "endkey" | "end_key" => {
                params.push((key.clone(), serde_json::to_string(value)?));
            }
            "conflicts" | "descending" | "group" | "include_docs" | "attachments"
            | "att_encoding_info" | "inclusive_end" | "reduce" | "sorted" | "update_seq" => {
                match value {
                    Value::Bool(flag) => params.push((key.clone(), flag.to_string())),
                    other => return Err(unsupported_option(key, other)),
                }
            }
            "endkey_docid" | "end_key_doc_id" | "stale" | "startkey_docid"
            | "start_key_doc_id" | "format" => match value {
                Value::String(text) => params.push((key.clone(), text.clone())),
                other => return Err(unsupported_option(key, other)),
            },
            // Observed on list requests only; passed through unchanged.
            "include_header" => match value {
                Value::String(text) => params.push((key.clone(), text.clone())),
                Value::Bool(flag) => params.push((key.clone(), flag.to_string())),
                other => return Err(unsupported_option(key, other)),
            },
            "group_level" | "limit" | "skip" => match value.as_i64() {
                Some(n) => params.push((key.clone(), n.to_string())),
                None => return Err(unsupported_option(key, value)),
            },
            _ => match value {
                Value::Bool(flag) => params.push((key.clone(), flag.to_string())),
                Value::Number(n) => params.push((key.clone(), n.to_string())),
                other => return Err(unsupported_option(key, other)),
            },
        }
    }
    Ok((params, body))
}

fn unsupported_option(key: &str, value: &Value) -> CouchError {
    CouchError::InvalidArgument(format!("view option {key}={value} not supported"))
}

/// Expand a view name to its request path. Names with no `/`, or already
/// starting with `_`, pass through; `design/view` becomes
/// `_design/design/<kind>/view`.
pub(crate) fn design_path(name: &str, kind: &str) -> String {
    if name.starts_with('_') {
        return name.to_string();
    }
    match name.split_once('/') {
        None => name.to_string(),
        Some((design, rest)) => format!("_design/{design}/{kind}/{rest}"),
    }
}

fn decode_rows(value: &Value, wrapper: Option<&RowWrapper>) -> Vec<Row> {
    let Some(raw_rows) = value.get("rows").and_then(Value::as_array) else {
        return Vec::new();
    };
    raw_rows
        .iter()
        .map(|raw| {
            let mut row = Row {
                id: raw
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                key: raw.get("key").cloned().unwrap_or(Value::Null),
                val: raw.get("value").cloned().unwrap_or(Value::Null),
                doc: raw.get("doc").cloned(),
                err: raw
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };
            if let Some(wrap) = wrapper {
                row = wrap(row);
            }
            row
        })
        .collect()
}

/// Stream a view's rows in key order, fetched `batch` at a time.
///
/// Each request asks for `batch + 1` rows; the extra row is the continuation
/// anchor for the next request (`startkey` + `startkey_docid`, `skip=0`) and
/// is not emitted. A short batch or an exhausted `limit` ends the stream;
/// the producer closes the channel on termination, error, or when the
/// receiver is dropped.
pub(crate) fn iter_view(
    resource: Resource,
    name: &str,
    batch: usize,
    wrapper: Option<RowWrapper>,
    options: ViewOptions,
) -> Result<async_channel::Receiver<Row>> {
    if batch < 1 {
        return Err(CouchError::BatchValue);
    }
    let mut options = options;
    let mut limit: Option<i64> = None;
    if let Some(value) = options.get("limit") {
        let wanted = value.as_i64().ok_or(CouchError::LimitValue)?;
        if wanted < 1 {
            return Err(CouchError::LimitValue);
        }
        limit = Some(wanted);
    }
    let design_doc = design_path(name, "_view");

    let (tx, rx) = async_channel::bounded(1);
    tokio::spawn(async move {
        let mut remaining = limit;
        loop {
            let loop_limit = match remaining {
                Some(left) => batch.min(left as usize),
                None => batch,
            };
            options.insert("limit".to_string(), Value::from(loop_limit as i64 + 1));

            let mut results = ViewResults::new(
                resource.clone(),
                design_doc.clone(),
                options.clone(),
                wrapper.clone(),
            );
            let rows = match results.rows().await {
                Ok(rows) => rows,
                Err(err) => {
                    tracing::debug!(error = %err, view = %design_doc, "view iteration aborted");
                    break;
                }
            };

            let emit = rows.len().min(loop_limit);
            for row in &rows[..emit] {
                if tx.send(row.clone()).await.is_err() {
                    return; // receiver dropped
                }
            }

            if let Some(left) = remaining.as_mut() {
                *left -= rows.len().min(batch) as i64;
            }
            if rows.len() <= batch || remaining.is_some_and(|left| left <= 0) {
                break;
            }
            if let Some(last) = rows.last() {
                options.insert("startkey".to_string(), last.key.clone());
                options.insert("startkey_docid".to_string(), Value::String(last.id.clone()));
                options.insert("skip".to_string(), Value::from(0));
            }
        }
        // tx drops here, closing the channel.
    });
    Ok(rx)
}

/// [`Stream`] adapter over an [`iter_view`](crate::Database::iter_view)
/// receiver, for `futures::StreamExt` consumers.
pub struct RowStream {
    receiver: async_channel::Receiver<Row>,
}

impl RowStream {
    pub fn new(receiver: async_channel::Receiver<Row>) -> RowStream {
        RowStream { receiver }
    }
}

impl Stream for RowStream {
    type Item = Row;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Row>> {
        let receiver = unsafe { self.map_unchecked_mut(|s| &mut s.receiver) };
        receiver.poll_next(cx)
    }
}
