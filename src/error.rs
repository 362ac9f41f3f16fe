//! Error types for CouchDB operations.
//!
//! Every HTTP status the server is documented to return maps to exactly one
//! variant, and the variant carries the reason string extracted from the
//! response body, so callers can both match on the class of failure and
//! inspect what the server actually said.
//!
//! # Status mapping
//!
//! | Status | Variant |
//! |--------|---------|
//! | 200/201/202 | none |
//! | 304 | `NotModified` |
//! | 400 | `BadRequest` |
//! | 401 | `Unauthorized` |
//! | 403 | `Forbidden` |
//! | 404 | `NotFound` |
//! | 405 | `ResourceNotAllowed` |
//! | 406 | `NotAcceptable` |
//! | 409 | `Conflict` |
//! | 412 | `PreconditionFailed` |
//! | 415 | `BadContentType` |
//! | 416 | `RangeNotSatisfiable` |
//! | 417 | `ExpectationFailed` |
//! | 500 | `InternalServerError` |
//!
//! Anything outside the table becomes [`CouchError::UnexpectedStatus`]. A 2xx
//! reply whose JSON body carries an `error`/`reason` pair is surfaced as
//! [`CouchError::ServerReason`]; some endpoints report failures that way.
//!
//! # Examples
//!
//! ```
//! use couchdb_rs::CouchError;
//!
//! let err = CouchError::from_status(404, b"{\"error\":\"not_found\",\"reason\":\"missing\"}");
//! assert!(matches!(err, Some(CouchError::NotFound(_))));
//! assert!(err.unwrap().is_not_found());
//! ```

use thiserror::Error;

/// Result type for CouchDB operations.
pub type Result<T> = std::result::Result<T, CouchError>;

/// Errors that can occur while talking to a CouchDB server.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CouchError {
    /// 304: the resource has not been modified since the given revision.
    #[error("not modified: {0}")]
    NotModified(String),

    /// 400: the request was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 401: credentials are missing or wrong.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 403: the server understood the request and refuses it.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 404: database, document or attachment does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// 405: the HTTP method is not allowed on this resource.
    #[error("resource not allowed: {0}")]
    ResourceNotAllowed(String),

    /// 406: the requested content type cannot be served.
    #[error("not acceptable: {0}")]
    NotAcceptable(String),

    /// 409: the supplied `_rev` does not match the current revision.
    #[error("conflict: {0}")]
    Conflict(String),

    /// 412: a precondition failed, e.g. the database already exists.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// 415: the request body's content type is not supported.
    #[error("bad content type: {0}")]
    BadContentType(String),

    /// 416: the requested range cannot be satisfied.
    #[error("requested range not satisfiable: {0}")]
    RangeNotSatisfiable(String),

    /// 417: an expectation given in the request could not be met.
    #[error("expectation failed: {0}")]
    ExpectationFailed(String),

    /// 500: the server hit an internal error.
    #[error("internal server error: {0}")]
    InternalServerError(String),

    /// Any status code outside the closed mapping table.
    #[error("unexpected status {status}: {reason}")]
    UnexpectedStatus { status: u16, reason: String },

    /// A 2xx reply whose body carried an `error`/`reason` pair.
    #[error("server error: {0}")]
    ServerReason(String),

    /// `iter_view` was called with a batch size below 1.
    #[error("batch must be 1 or more")]
    BatchValue,

    /// `iter_view` was called with a limit option below 1.
    #[error("limit must be 1 or more")]
    LimitValue,

    /// A write needed the document's `_id` and it was absent. No HTTP
    /// request is issued in this case.
    #[error("document has no _id")]
    MissingId,

    /// A write needed the document's `_rev` and it was absent. No HTTP
    /// request is issued in this case.
    #[error("document has no _rev")]
    MissingRev,

    /// Attempt to assign an `_id` to a document that already has one.
    #[error("document _id already set")]
    SetId,

    /// The selector or sort expression did not compile.
    #[error("selector error: {0}")]
    Selector(String),

    /// The server answered with a shape the client cannot interpret.
    #[error("decode error: {0}")]
    Decode(String),

    /// A caller-supplied argument failed validation before any request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport-level failure from the HTTP client.
    #[error("http error: {0}")]
    Http(String),

    /// JSON encoding or decoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base or composed URL did not parse.
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for CouchError {
    fn from(err: reqwest::Error) -> Self {
        CouchError::Http(err.to_string())
    }
}

impl CouchError {
    /// Map an HTTP status code to its sentinel error, extracting the reason
    /// string from `body`. Returns `None` for 200/201/202.
    pub fn from_status(status: u16, body: &[u8]) -> Option<CouchError> {
        if matches!(status, 200 | 201 | 202) {
            return None;
        }
        let reason = reason_from_body(body);
        Some(match status {
            304 => CouchError::NotModified(reason),
            400 => CouchError::BadRequest(reason),
            401 => CouchError::Unauthorized(reason),
            403 => CouchError::Forbidden(reason),
            404 => CouchError::NotFound(reason),
            405 => CouchError::ResourceNotAllowed(reason),
            406 => CouchError::NotAcceptable(reason),
            409 => CouchError::Conflict(reason),
            412 => CouchError::PreconditionFailed(reason),
            415 => CouchError::BadContentType(reason),
            416 => CouchError::RangeNotSatisfiable(reason),
            417 => CouchError::ExpectationFailed(reason),
            500 => CouchError::InternalServerError(reason),
            other => CouchError::UnexpectedStatus {
                status: other,
                reason,
            },
        })
    }

    /// The HTTP status this error stands for, when it stands for one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CouchError::NotModified(_) => Some(304),
            CouchError::BadRequest(_) => Some(400),
            CouchError::Unauthorized(_) => Some(401),
            CouchError::Forbidden(_) => Some(403),
            CouchError::NotFound(_) => Some(404),
            CouchError::ResourceNotAllowed(_) => Some(405),
            CouchError::NotAcceptable(_) => Some(406),
            CouchError::Conflict(_) => Some(409),
            CouchError::PreconditionFailed(_) => Some(412),
            CouchError::BadContentType(_) => Some(415),
            CouchError::RangeNotSatisfiable(_) => Some(416),
            CouchError::ExpectationFailed(_) => Some(417),
            CouchError::InternalServerError(_) => Some(500),
            CouchError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 404.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CouchError::NotFound(_))
    }

    /// True for 409, the MVCC rejection.
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, CouchError::Conflict(_))
    }

    /// True for 401 or 403.
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            CouchError::Unauthorized(_) | CouchError::Forbidden(_)
        )
    }
}

/// Pull a human-readable reason out of a response body: the JSON `reason`
/// field when present, the raw text otherwise.
fn reason_from_body(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(reason) = value.get("reason").and_then(|r| r.as_str()) {
            return reason.to_string();
        }
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return error.to_string();
        }
    }
    String::from_utf8_lossy(body).trim().to_string()
}
