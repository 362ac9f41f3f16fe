//! Server-level operations: database lifecycle, cluster information,
//! replication, UUID allocation and session authentication.
//!
//! A [`Server`] owns the root [`Resource`]. Databases obtained through
//! [`Server::get`] or [`Server::create`] share the server's HTTP client and
//! its session slot, so a successful [`Server::login`] makes every
//! subsequent request on this server (and its databases) carry the
//! `AuthSession` cookie until [`Server::logout`].
//!
//! ```no_run
//! use couchdb_rs::Server;
//!
//! # async fn demo() -> couchdb_rs::Result<()> {
//! let server = Server::from_env()?;
//! let version = server.version().await?;
//! let (db, created) = server.create("movies").await?;
//! # Ok(())
//! # }
//! ```

use crate::config::default_server_url;
use crate::database::{Database, JsonMap};
use crate::error::{CouchError, Result};
use crate::resource::Resource;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE, SET_COOKIE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Statistics the server reports about one database.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabaseInfo {
    #[serde(default)]
    pub db_name: String,
    /// Opaque on CouchDB 2+; kept as raw JSON.
    #[serde(default)]
    pub purge_seq: Value,
    /// Opaque on CouchDB 2+; kept as raw JSON.
    #[serde(default)]
    pub update_seq: Value,
    #[serde(default)]
    pub sizes: DatabaseSizes,
    #[serde(default)]
    pub doc_del_count: i64,
    #[serde(default)]
    pub doc_count: i64,
    #[serde(default)]
    pub disk_format_version: i64,
    #[serde(default)]
    pub compact_running: bool,
    #[serde(default)]
    pub cluster: ClusterPlacement,
    #[serde(default)]
    pub instance_start_time: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabaseSizes {
    #[serde(default)]
    pub file: i64,
    #[serde(default)]
    pub external: i64,
    #[serde(default)]
    pub active: i64,
}

/// Sharding parameters of a database (q shards, n replicas, w/r quorums).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClusterPlacement {
    #[serde(default)]
    pub q: i64,
    #[serde(default)]
    pub n: i64,
    #[serde(default)]
    pub w: i64,
    #[serde(default)]
    pub r: i64,
}

/// Handle to a CouchDB server instance.
#[derive(Clone, Debug)]
pub struct Server {
    resource: Resource,
}

impl Server {
    /// Connect to the server at `url`. Credentials embedded in the URL are
    /// used as Basic auth for every request.
    pub fn new(url: &str) -> Result<Server> {
        Ok(Server {
            resource: Resource::new(url)?,
        })
    }

    /// Connect to the server named by `COUCHDB_URL`, or the default
    /// `http://localhost:5984`.
    pub fn from_env() -> Result<Server> {
        Self::new(&default_server_url())
    }

    /// Like [`Server::new`] but with `X-Couch-Full-Commit: false` on every
    /// request, delaying commits until [`Database::commit`].
    pub fn no_full_commit(url: &str) -> Result<Server> {
        let mut resource = Resource::new(url)?;
        resource.insert_header(
            HeaderName::from_static("x-couch-full-commit"),
            HeaderValue::from_static("false"),
        );
        Ok(Server { resource })
    }

    /// Wrap an existing root [`Resource`].
    pub fn with_resource(resource: Resource) -> Server {
        Server { resource }
    }

    /// The server version string.
    pub async fn version(&self) -> Result<String> {
        let (_, value) = self.resource.get_json("", None, &[]).await?;
        value
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CouchError::Decode("root reply has no version".into()))
    }

    /// Currently running server tasks.
    pub async fn active_tasks(&self) -> Result<Vec<Value>> {
        let (_, value) = self.resource.get_json("_active_tasks", None, &[]).await?;
        value
            .as_array()
            .cloned()
            .ok_or_else(|| CouchError::Decode("_active_tasks reply is not an array".into()))
    }

    /// Names of all databases on this server.
    pub async fn dbs(&self) -> Result<Vec<String>> {
        let (_, value) = self.resource.get_json("_all_dbs", None, &[]).await?;
        serde_json::from_value(value).map_err(CouchError::from)
    }

    /// Number of databases on this server.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.dbs().await?.len())
    }

    /// Per-node statistics for `entry`, e.g. `couchdb/request_time`.
    pub async fn stats(&self, node: &str, entry: &str) -> Result<JsonMap> {
        let (_, value) = self
            .resource
            .get_json(&format!("_node/{node}/_stats/{entry}"), None, &[])
            .await?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(CouchError::Decode(format!(
                "stats reply is not an object: {other}"
            ))),
        }
    }

    /// The configuration of `node`.
    pub async fn config(&self, node: &str) -> Result<JsonMap> {
        let (_, value) = self
            .resource
            .get_json(&format!("_node/{node}/_config"), None, &[])
            .await?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(CouchError::Decode(format!(
                "config reply is not an object: {other}"
            ))),
        }
    }

    /// Create the database `name`.
    ///
    /// Returns the handle and `true` when the database was created, or the
    /// handle and `false` when the server reported it already existed
    /// (412). Any other failure propagates.
    pub async fn create(&self, name: &str) -> Result<(Database, bool)> {
        let created = match self.resource.put_json(name, None, &Value::Null, &[]).await {
            Ok(_) => true,
            Err(CouchError::PreconditionFailed(_)) => false,
            Err(err) => return Err(err),
        };
        let db = self.get(name).await?;
        Ok((db, created))
    }

    /// Delete the database `name`.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.resource.delete_json(name, None, &[]).await.map(|_| ())
    }

    /// A handle to the database `name`, confirmed to exist with a HEAD
    /// probe.
    pub async fn get(&self, name: &str) -> Result<Database> {
        let db = Database::with_resource(self.resource.child(name));
        db.available().await?;
        Ok(db)
    }

    /// True when a database named `name` exists.
    pub async fn contains(&self, name: &str) -> bool {
        self.resource.head(name, None, &[]).await.is_ok()
    }

    /// Typed information about the database `name`.
    pub async fn database_info(&self, name: &str) -> Result<DatabaseInfo> {
        let (_, value) = self.resource.get_json(name, None, &[]).await?;
        serde_json::from_value(value).map_err(CouchError::from)
    }

    /// The cluster membership: all nodes this node knows about, and the
    /// nodes that are part of the cluster.
    pub async fn membership(&self) -> Result<(Vec<String>, Vec<String>)> {
        let (_, value) = self.resource.get_json("_membership", None, &[]).await?;
        let all_nodes = string_array(&value, "all_nodes")?;
        let cluster_nodes = string_array(&value, "cluster_nodes")?;
        Ok((all_nodes, cluster_nodes))
    }

    /// Request, configure or stop a replication between `source` and
    /// `target`; `options` are merged into the request body.
    pub async fn replicate(
        &self,
        source: &str,
        target: &str,
        options: Option<JsonMap>,
    ) -> Result<JsonMap> {
        let mut body = options.unwrap_or_default();
        body.insert("source".to_string(), Value::String(source.to_string()));
        body.insert("target".to_string(), Value::String(target.to_string()));
        let (_, value) = self
            .resource
            .post_json("_replicate", None, &Value::Object(body), &[])
            .await?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(CouchError::Decode(format!(
                "replicate reply is not an object: {other}"
            ))),
        }
    }

    /// Request `count` server-generated UUIDs; counts below 1 are clamped
    /// to 1.
    pub async fn uuids(&self, count: usize) -> Result<Vec<String>> {
        let count = count.max(1);
        let params = vec![("count".to_string(), count.to_string())];
        let (_, value) = self.resource.get_json("_uuids", None, &params).await?;
        string_array(&value, "uuids")
    }

    // ---- users and sessions ----

    /// Register a regular user in the `_users` database. Returns the id
    /// and revision of the user document.
    pub async fn add_user(
        &self,
        name: &str,
        password: &str,
        roles: &[&str],
    ) -> Result<(String, String)> {
        let db = self.get("_users").await?;
        let mut user_doc = JsonMap::new();
        user_doc.insert(
            "_id".to_string(),
            Value::String(format!("org.couchdb.user:{name}")),
        );
        user_doc.insert("name".to_string(), Value::String(name.to_string()));
        user_doc.insert("password".to_string(), Value::String(password.to_string()));
        user_doc.insert(
            "roles".to_string(),
            Value::Array(roles.iter().map(|r| Value::String(r.to_string())).collect()),
        );
        user_doc.insert("type".to_string(), Value::String("user".to_string()));
        db.save(&mut user_doc, &[]).await
    }

    /// Delete a regular user from the `_users` database.
    pub async fn remove_user(&self, name: &str) -> Result<()> {
        let db = self.get("_users").await?;
        db.delete(&format!("org.couchdb.user:{name}")).await
    }

    /// Authenticate against `/_session` and install the returned
    /// `AuthSession` cookie on this server's session slot, so every
    /// subsequent request through this server or its databases carries it.
    /// Returns the token.
    pub async fn login(&self, name: &str, password: &str) -> Result<String> {
        let body = json!({ "name": name, "password": password });
        let (headers, _) = self.resource.post_json("_session", None, &body, &[]).await?;
        let token = extract_auth_session(&headers).ok_or_else(|| {
            CouchError::Unauthorized("session reply carried no AuthSession cookie".into())
        })?;
        self.resource.set_session(Some(token.clone()));
        tracing::debug!(user = name, "session cookie installed");
        Ok(token)
    }

    /// Error when `token` is not a valid session. One-shot: does not touch
    /// the installed session state.
    pub async fn verify_token(&self, token: &str) -> Result<()> {
        let headers = cookie_header(token)?;
        self.resource
            .get_json("_session", Some(headers), &[])
            .await
            .map(|_| ())
    }

    /// End the session for `token` and clear the installed cookie.
    pub async fn logout(&self, token: &str) -> Result<()> {
        let headers = cookie_header(token)?;
        let result = self
            .resource
            .delete_json("_session", Some(headers), &[])
            .await
            .map(|_| ());
        self.resource.set_session(None);
        result
    }
}

impl std::fmt::Display for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Server {}", self.resource.base())
    }
}

fn cookie_header(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("AuthSession={token}"))
            .map_err(|e| CouchError::Http(e.to_string()))?,
    );
    Ok(headers)
}

/// Pull the `AuthSession` token out of a `Set-Cookie` header.
fn extract_auth_session(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(SET_COOKIE) {
        let text = value.to_str().ok()?;
        let pair = text.split(';').next()?;
        if let Some((name, token)) = pair.split_once('=') {
            if name.trim() == "AuthSession" && !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

fn string_array(value: &Value, key: &str) -> Result<Vec<String>> {
    let raw = value
        .get(key)
        .ok_or_else(|| CouchError::Decode(format!("reply has no {key}")))?;
    serde_json::from_value(raw.clone()).map_err(CouchError::from)
}
