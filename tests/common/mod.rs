//! In-process stand-in for a CouchDB server.
//!
//! Implements just enough of the wire protocol for the integration tests:
//! database lifecycle, document CRUD with revision tracking, bulk updates,
//! attachments, `_all_docs`, a deterministic 100-row view, `_find` (echoes
//! the received selector back as the only result), sessions, and the
//! various maintenance endpoints. State is shared with the test body so
//! tests can assert on what the server observed.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub type JsonMap = Map<String, Value>;
pub type Shared = Arc<Mutex<MockState>>;

/// Total rows served by the synthetic `_design/*/_view/*` view.
pub const VIEW_TOTAL: i64 = 100;

#[derive(Default)]
pub struct MockState {
    pub dbs: HashMap<String, MockDb>,
    pub tokens: HashSet<String>,
    /// Cookie header seen on the most recent database-level request.
    pub last_cookie: Option<String>,
    counter: u64,
}

#[derive(Default)]
pub struct MockDb {
    pub docs: HashMap<String, JsonMap>,
    /// Revision history per document, oldest first.
    pub history: HashMap<String, Vec<(String, JsonMap)>>,
    /// `docid/name` to (content type, bytes).
    pub attachments: HashMap<String, (String, Vec<u8>)>,
    pub security: JsonMap,
    pub revs_limit: u64,
}

/// Bind the mock on an ephemeral port; returns its base URL and the shared
/// state handle.
pub async fn spawn() -> (String, Shared) {
    let state: Shared = Arc::default();
    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock listener addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/_all_dbs", get(all_dbs))
        .route("/_uuids", get(uuids))
        .route("/_membership", get(membership))
        .route("/_active_tasks", get(active_tasks))
        .route("/_replicate", post(replicate))
        .route("/_session", post(session_post).get(session_get).delete(session_delete))
        .route("/_node/:node/_config", get(node_config))
        .route("/_node/:node/_stats/*entry", get(node_stats))
        .route("/:db/_bulk_docs", post(bulk_docs))
        .route("/:db/_all_docs", get(all_docs))
        .route("/:db/_find", post(find))
        .route("/:db/_purge", post(purge))
        .route("/:db/_changes", get(changes))
        .route("/:db/_security", get(get_security).put(put_security))
        .route("/:db/_revs_limit", get(get_revs_limit).put(put_revs_limit))
        .route("/:db/_ensure_full_commit", post(ok_created))
        .route("/:db/_compact", post(ok_accepted))
        .route("/:db/_view_cleanup", post(ok_accepted))
        .route("/:db/_index", post(put_index).get(get_index))
        .route("/:db/_index/:ddoc/json/:name", delete(delete_index))
        .route("/:db/_design/:ddoc", any(design_doc))
        .route("/:db/_design/:ddoc/_view/:view", get(view))
        .route("/:db/:docid/:name", any(attachment))
        .route("/:db/:docid", any(doc))
        .route("/:db", any(db))
        .with_state(state)
}

// ---- helpers ----

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "not_found", "reason": "missing"})),
    )
        .into_response()
}

fn conflict() -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({"error": "conflict", "reason": "Document update conflict."})),
    )
        .into_response()
}

fn bad_request(reason: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "bad_request", "reason": reason})),
    )
        .into_response()
}

fn rev_generation(rev: &str) -> u64 {
    rev.split('-')
        .next()
        .and_then(|g| g.parse().ok())
        .unwrap_or(0)
}

/// Store `doc` at `id`, enforcing the MVCC rev check. Returns the new
/// `(id, rev)` or `"conflict"`.
fn write_doc(
    state: &mut MockState,
    db: &str,
    id: &str,
    mut doc: JsonMap,
) -> Result<(String, String), &'static str> {
    state.counter += 1;
    let counter = state.counter;
    let Some(dbe) = state.dbs.get_mut(db) else {
        return Err("not_found");
    };
    let existing_rev = dbe
        .docs
        .get(id)
        .and_then(|d| d.get("_rev"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let incoming_rev = doc.get("_rev").and_then(Value::as_str).map(str::to_string);
    if existing_rev != incoming_rev {
        return Err("conflict");
    }
    let generation = existing_rev.as_deref().map(rev_generation).unwrap_or(0) + 1;
    let rev = format!("{generation}-{counter:032x}");
    doc.insert("_id".to_string(), Value::String(id.to_string()));
    doc.insert("_rev".to_string(), Value::String(rev.clone()));
    dbe.docs.insert(id.to_string(), doc.clone());
    dbe.history
        .entry(id.to_string())
        .or_default()
        .push((rev.clone(), doc));
    Ok((id.to_string(), rev))
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "AuthSession").then(|| value.to_string())
    })
}

// ---- server-level handlers ----

async fn root() -> Json<Value> {
    Json(json!({"couchdb": "Welcome", "version": "3.3.3"}))
}

async fn all_dbs(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let mut names: Vec<&String> = state.dbs.keys().collect();
    names.sort();
    Json(json!(names))
}

async fn uuids(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let count: u64 = params
        .get("count")
        .and_then(|c| c.parse().ok())
        .unwrap_or(1);
    let mut state = state.lock().unwrap();
    let uuids: Vec<String> = (0..count)
        .map(|_| {
            state.counter += 1;
            format!("{:032x}", state.counter)
        })
        .collect();
    Json(json!({ "uuids": uuids }))
}

async fn membership() -> Json<Value> {
    Json(json!({"all_nodes": ["nonode@nohost"], "cluster_nodes": ["nonode@nohost"]}))
}

async fn active_tasks() -> Json<Value> {
    Json(json!([]))
}

async fn replicate(body: Bytes) -> Response {
    let Ok(req) = serde_json::from_slice::<JsonMap>(&body) else {
        return bad_request("malformed replication request");
    };
    if !req.contains_key("source") || !req.contains_key("target") {
        return bad_request("source and target required");
    }
    Json(json!({"ok": true, "history": []})).into_response()
}

async fn node_config(Path(_node): Path<String>) -> Json<Value> {
    Json(json!({"log": {"level": "info"}}))
}

async fn node_stats(Path((_node, entry)): Path<(String, String)>) -> Json<Value> {
    Json(json!({"entry": entry, "value": {"min": 0, "max": 0}}))
}

// ---- session handlers ----

async fn session_post(State(state): State<Shared>, body: Bytes) -> Response {
    let Ok(creds) = serde_json::from_slice::<JsonMap>(&body) else {
        return bad_request("malformed credentials");
    };
    let Some(name) = creds.get("name").and_then(Value::as_str) else {
        return bad_request("name required");
    };
    if creds.get("password").and_then(Value::as_str).unwrap_or("") == "wrong" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized", "reason": "Name or password is incorrect."})),
        )
            .into_response();
    }
    let token = format!("{name}-session-token");
    state.lock().unwrap().tokens.insert(token.clone());
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            format!("AuthSession={token}; Version=1; Path=/; HttpOnly"),
        )],
        Json(json!({"ok": true, "name": name, "roles": []})),
    )
        .into_response()
}

async fn session_get(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let valid = cookie_token(&headers)
        .map(|token| state.lock().unwrap().tokens.contains(&token))
        .unwrap_or(false);
    if valid {
        Json(json!({"ok": true, "userCtx": {"name": "tester", "roles": []}})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized", "reason": "You are not authorized."})),
        )
            .into_response()
    }
}

async fn session_delete(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie_token(&headers) {
        state.lock().unwrap().tokens.remove(&token);
    }
    Json(json!({"ok": true})).into_response()
}

// ---- database-level handlers ----

async fn db(
    State(state): State<Shared>,
    Path(db): Path<String>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    state.last_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match method.as_str() {
        "PUT" => {
            if state.dbs.contains_key(&db) {
                (
                    StatusCode::PRECONDITION_FAILED,
                    Json(json!({
                        "error": "file_exists",
                        "reason": "The database could not be created, the file already exists."
                    })),
                )
                    .into_response()
            } else {
                state.dbs.insert(db, MockDb::default());
                (StatusCode::CREATED, Json(json!({"ok": true}))).into_response()
            }
        }
        "DELETE" => {
            if state.dbs.remove(&db).is_some() {
                Json(json!({"ok": true})).into_response()
            } else {
                not_found()
            }
        }
        "GET" | "HEAD" => match state.dbs.get(&db) {
            Some(dbe) => Json(json!({
                "db_name": db,
                "doc_count": dbe.docs.len(),
                "doc_del_count": 0,
                "update_seq": format!("{}-seq", state.counter),
                "purge_seq": "0-seq",
                "compact_running": false,
                "sizes": {"file": 4096, "external": 0, "active": 2048},
                "cluster": {"q": 2, "n": 1, "w": 1, "r": 1},
                "disk_format_version": 8,
                "instance_start_time": "0"
            }))
            .into_response(),
            None => not_found(),
        },
        "POST" => {
            if !state.dbs.contains_key(&db) {
                return not_found();
            }
            let Ok(doc) = serde_json::from_slice::<JsonMap>(&body) else {
                return bad_request("malformed document");
            };
            let batch = params.get("batch").map(String::as_str) == Some("ok");
            let id = match doc.get("_id").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => {
                    state.counter += 1;
                    format!("{:032x}", state.counter)
                }
            };
            match write_doc(&mut state, &db, &id, doc) {
                Ok((id, rev)) => {
                    if batch {
                        (StatusCode::ACCEPTED, Json(json!({"ok": true, "id": id}))).into_response()
                    } else {
                        (
                            StatusCode::CREATED,
                            Json(json!({"ok": true, "id": id, "rev": rev})),
                        )
                            .into_response()
                    }
                }
                Err("conflict") => conflict(),
                Err(_) => not_found(),
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

// ---- document handlers ----

async fn doc(
    State(state): State<Shared>,
    Path((db, docid)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    document_request(state, db, docid, method, headers, params, body)
}

async fn design_doc(
    State(state): State<Shared>,
    Path((db, ddoc)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    document_request(
        state,
        db,
        format!("_design/{ddoc}"),
        method,
        headers,
        params,
        body,
    )
}

fn document_request(
    state: Shared,
    db: String,
    docid: String,
    method: Method,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    match method.as_str() {
        "GET" | "HEAD" => {
            let Some(dbe) = state.dbs.get(&db) else {
                return not_found();
            };
            let Some(latest) = dbe.docs.get(&docid) else {
                return not_found();
            };
            let latest_rev = latest
                .get("_rev")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let mut doc = if let Some(wanted) = params.get("rev") {
                if *wanted == latest_rev {
                    latest.clone()
                } else {
                    match dbe
                        .history
                        .get(&docid)
                        .and_then(|h| h.iter().find(|(rev, _)| rev == wanted))
                    {
                        Some((_, snapshot)) => snapshot.clone(),
                        None => return not_found(),
                    }
                }
            } else {
                latest.clone()
            };

            if params.get("revs").map(String::as_str) == Some("true") {
                let revs = dbe.history.get(&docid).cloned().unwrap_or_default();
                let ids: Vec<Value> = revs
                    .iter()
                    .rev()
                    .map(|(rev, _)| {
                        Value::String(rev.split_once('-').map(|(_, h)| h).unwrap_or("").to_string())
                    })
                    .collect();
                doc.insert(
                    "_revisions".to_string(),
                    json!({"start": rev_generation(&latest_rev), "ids": ids}),
                );
            }

            let etag = format!("\"{latest_rev}\"");
            ([(header::ETAG, etag)], Json(Value::Object(doc))).into_response()
        }
        "PUT" => {
            let Ok(doc) = serde_json::from_slice::<JsonMap>(&body) else {
                return bad_request("malformed document");
            };
            let batch = params.get("batch").map(String::as_str) == Some("ok");
            match write_doc(&mut state, &db, &docid, doc) {
                Ok((id, rev)) => {
                    if batch {
                        (StatusCode::ACCEPTED, Json(json!({"ok": true, "id": id}))).into_response()
                    } else {
                        (
                            StatusCode::CREATED,
                            Json(json!({"ok": true, "id": id, "rev": rev})),
                        )
                            .into_response()
                    }
                }
                Err("conflict") => conflict(),
                Err(_) => not_found(),
            }
        }
        "DELETE" => {
            let Some(dbe) = state.dbs.get_mut(&db) else {
                return not_found();
            };
            let Some(current) = dbe.docs.get(&docid) else {
                return not_found();
            };
            let current_rev = current.get("_rev").and_then(Value::as_str).unwrap_or("");
            if params.get("rev").map(String::as_str) != Some(current_rev) {
                return conflict();
            }
            dbe.docs.remove(&docid);
            dbe.history.remove(&docid);
            Json(json!({"ok": true})).into_response()
        }
        "COPY" => {
            let Some(destination) = headers.get("destination").and_then(|v| v.to_str().ok())
            else {
                return bad_request("Destination header required");
            };
            let (dest_id, dest_rev) = match destination.split_once("?rev=") {
                Some((id, rev)) => (id.to_string(), Some(rev.to_string())),
                None => (destination.to_string(), None),
            };
            let Some(src) = state
                .dbs
                .get(&db)
                .and_then(|dbe| dbe.docs.get(&docid))
                .cloned()
            else {
                return not_found();
            };
            let mut copied = src;
            copied.remove("_id");
            copied.remove("_rev");
            if let Some(rev) = dest_rev {
                copied.insert("_rev".to_string(), Value::String(rev));
            }
            match write_doc(&mut state, &db, &dest_id, copied) {
                Ok((id, rev)) => (
                    StatusCode::CREATED,
                    Json(json!({"ok": true, "id": id, "rev": rev})),
                )
                    .into_response(),
                Err("conflict") => conflict(),
                Err(_) => not_found(),
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

// ---- attachments ----

async fn attachment(
    State(state): State<Shared>,
    Path((db, docid, name)): Path<(String, String, String)>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    let key = format!("{docid}/{name}");
    match method.as_str() {
        "GET" | "HEAD" => {
            let Some((mime, data)) = state
                .dbs
                .get(&db)
                .and_then(|dbe| dbe.attachments.get(&key))
                .cloned()
            else {
                return not_found();
            };
            ([(header::CONTENT_TYPE, mime)], data).into_response()
        }
        "PUT" | "DELETE" => {
            let Some(current) = state
                .dbs
                .get(&db)
                .and_then(|dbe| dbe.docs.get(&docid))
                .cloned()
            else {
                return not_found();
            };
            let current_rev = current
                .get("_rev")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if params.get("rev").map(String::as_str) != Some(current_rev.as_str()) {
                return conflict();
            }
            // Re-writing the unchanged doc body advances the revision.
            let (id, rev) = match write_doc(&mut state, &db, &docid, current) {
                Ok(written) => written,
                Err("conflict") => return conflict(),
                Err(_) => return not_found(),
            };
            let dbe = state.dbs.get_mut(&db).expect("db vanished");
            if method == Method::PUT {
                let mime = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_string();
                dbe.attachments.insert(key, (mime, body.to_vec()));
            } else {
                dbe.attachments.remove(&key);
            }
            (
                StatusCode::CREATED,
                Json(json!({"ok": true, "id": id, "rev": rev})),
            )
                .into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

// ---- bulk, listing, find ----

async fn bulk_docs(State(state): State<Shared>, Path(db): Path<String>, body: Bytes) -> Response {
    let Ok(payload) = serde_json::from_slice::<JsonMap>(&body) else {
        return bad_request("malformed bulk request");
    };
    let docs = payload
        .get("docs")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut state = state.lock().unwrap();
    let mut results = Vec::with_capacity(docs.len());
    for entry in docs {
        let Some(doc) = entry.as_object().cloned() else {
            results.push(json!({"error": "bad_request", "reason": "not a document"}));
            continue;
        };
        let id = match doc.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                state.counter += 1;
                format!("{:032x}", state.counter)
            }
        };
        match write_doc(&mut state, &db, &id, doc) {
            Ok((id, rev)) => results.push(json!({"ok": true, "id": id, "rev": rev})),
            Err(kind) => {
                results.push(json!({"id": id, "error": kind, "reason": "Document update conflict."}))
            }
        }
    }
    (StatusCode::CREATED, Json(Value::Array(results))).into_response()
}

async fn all_docs(State(state): State<Shared>, Path(db): Path<String>) -> Response {
    let state = state.lock().unwrap();
    let Some(dbe) = state.dbs.get(&db) else {
        return not_found();
    };
    let mut ids: Vec<&String> = dbe.docs.keys().collect();
    ids.sort();
    let rows: Vec<Value> = ids
        .iter()
        .map(|id| {
            let rev = dbe.docs[*id]
                .get("_rev")
                .and_then(Value::as_str)
                .unwrap_or_default();
            json!({"id": id, "key": id, "value": {"rev": rev}})
        })
        .collect();
    Json(json!({"total_rows": rows.len(), "offset": 0, "rows": rows})).into_response()
}

/// `_find` does no real matching; it replies with the selector it received
/// so tests can assert on the compiled query that reached the wire.
async fn find(Path(_db): Path<String>, body: Bytes) -> Response {
    let Ok(query) = serde_json::from_slice::<JsonMap>(&body) else {
        return bad_request("malformed query");
    };
    let selector = query.get("selector").cloned().unwrap_or(Value::Null);
    Json(json!({"docs": [selector], "bookmark": "nil"})).into_response()
}

// ---- the synthetic view ----

/// Serves keys `1..=VIEW_TOTAL` (value `key * 10`, id `doc-NNN`), honoring
/// `descending`, `startkey`, `startkey_docid`, `skip` and `limit`.
async fn view(
    Path((_db, _ddoc, _view)): Path<(String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let descending = params.get("descending").map(String::as_str) == Some("true");
    let mut rows: Vec<(i64, String)> = (1..=VIEW_TOTAL)
        .map(|key| (key, format!("doc-{key:03}")))
        .collect();
    if descending {
        rows.reverse();
    }

    if let Some(raw) = params.get("startkey") {
        let Ok(startkey) = serde_json::from_str::<i64>(raw) else {
            return bad_request("startkey must be a JSON number");
        };
        let start_docid = params.get("startkey_docid").cloned();
        rows.retain(|(key, id)| {
            if *key == startkey {
                match &start_docid {
                    Some(docid) if descending => id.as_str() <= docid.as_str(),
                    Some(docid) => id.as_str() >= docid.as_str(),
                    None => true,
                }
            } else if descending {
                *key < startkey
            } else {
                *key > startkey
            }
        });
    }

    let skip: usize = params.get("skip").and_then(|s| s.parse().ok()).unwrap_or(0);
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(usize::MAX);
    let offset = VIEW_TOTAL as usize - rows.len() + skip;
    let page: Vec<Value> = rows
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|(key, id)| json!({"id": id, "key": key, "value": key * 10}))
        .collect();

    let mut reply = json!({"total_rows": VIEW_TOTAL, "offset": offset, "rows": page});
    if params.get("update_seq").map(String::as_str) == Some("true") {
        reply["update_seq"] = json!("99-seq");
    }
    Json(reply).into_response()
}

// ---- maintenance and misc ----

async fn ok_created() -> Response {
    (
        StatusCode::CREATED,
        Json(json!({"ok": true, "instance_start_time": "0"})),
    )
        .into_response()
}

async fn ok_accepted() -> Response {
    (StatusCode::ACCEPTED, Json(json!({"ok": true}))).into_response()
}

async fn purge(State(state): State<Shared>, Path(db): Path<String>, body: Bytes) -> Response {
    let Ok(request) = serde_json::from_slice::<JsonMap>(&body) else {
        return bad_request("malformed purge request");
    };
    let mut state = state.lock().unwrap();
    let Some(dbe) = state.dbs.get_mut(&db) else {
        return not_found();
    };
    for id in request.keys() {
        dbe.docs.remove(id);
        dbe.history.remove(id);
    }
    (
        StatusCode::CREATED,
        Json(json!({"purge_seq": null, "purged": request})),
    )
        .into_response()
}

async fn changes(State(state): State<Shared>, Path(db): Path<String>) -> Response {
    let state = state.lock().unwrap();
    let Some(dbe) = state.dbs.get(&db) else {
        return not_found();
    };
    let results: Vec<Value> = dbe
        .docs
        .keys()
        .map(|id| json!({"id": id, "changes": []}))
        .collect();
    Json(json!({"results": results, "last_seq": "0-seq", "pending": 0})).into_response()
}

async fn get_security(State(state): State<Shared>, Path(db): Path<String>) -> Response {
    let state = state.lock().unwrap();
    match state.dbs.get(&db) {
        Some(dbe) => Json(Value::Object(dbe.security.clone())).into_response(),
        None => not_found(),
    }
}

async fn put_security(
    State(state): State<Shared>,
    Path(db): Path<String>,
    body: Bytes,
) -> Response {
    let Ok(security) = serde_json::from_slice::<JsonMap>(&body) else {
        return bad_request("malformed security object");
    };
    let mut state = state.lock().unwrap();
    match state.dbs.get_mut(&db) {
        Some(dbe) => {
            dbe.security = security;
            Json(json!({"ok": true})).into_response()
        }
        None => not_found(),
    }
}

async fn get_revs_limit(State(state): State<Shared>, Path(db): Path<String>) -> Response {
    let state = state.lock().unwrap();
    match state.dbs.get(&db) {
        Some(dbe) => {
            let limit = if dbe.revs_limit == 0 { 1000 } else { dbe.revs_limit };
            format!("{limit}\n").into_response()
        }
        None => not_found(),
    }
}

async fn put_revs_limit(
    State(state): State<Shared>,
    Path(db): Path<String>,
    body: Bytes,
) -> Response {
    let Ok(limit) = String::from_utf8_lossy(&body).trim().parse::<u64>() else {
        return bad_request("revs_limit must be an integer");
    };
    let mut state = state.lock().unwrap();
    match state.dbs.get_mut(&db) {
        Some(dbe) => {
            dbe.revs_limit = limit;
            Json(json!({"ok": true})).into_response()
        }
        None => not_found(),
    }
}

async fn put_index(Path(_db): Path<String>, body: Bytes) -> Response {
    let Ok(request) = serde_json::from_slice::<JsonMap>(&body) else {
        return bad_request("malformed index request");
    };
    let ddoc = request
        .get("ddoc")
        .and_then(Value::as_str)
        .unwrap_or("_design/generated")
        .to_string();
    let name = request
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("generated-index")
        .to_string();
    (
        StatusCode::OK,
        Json(json!({"result": "created", "id": ddoc, "name": name})),
    )
        .into_response()
}

async fn get_index(Path(_db): Path<String>) -> Json<Value> {
    Json(json!({"total_rows": 0, "indexes": []}))
}

async fn delete_index(Path((_db, _ddoc, _name)): Path<(String, String, String)>) -> Json<Value> {
    Json(json!({"ok": true}))
}
