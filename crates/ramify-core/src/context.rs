//! Request context types.
//!
//! The [`RequestContext`] carries all per-request state into the views:
//! path parameters captured along the resource tree, query and body
//! parameters, the caller identity and the [`Resolution`] of the addressed
//! item.

use crate::entity::{Entity, Fields};
use crate::identity::CallerIdentity;
use crate::model::QueryParams;
use http::Method;
use ramify_router::Params;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Query parameter bounding the page size.
pub const LIMIT_PARAM: &str = "_limit";

/// Page size used when none is configured.
pub const DEFAULT_PAGE_LIMIT: u64 = 20;

/// A unique identifier for each request, using UUID v7.
///
/// # Example
///
/// ```
/// use ramify_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Whether the item addressed by a request has been looked up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Resolution {
    /// No lookup attempted yet.
    #[default]
    Unresolved,
    /// The access-control factory returned this entity.
    Resolved(Entity),
    /// The lookup for this key failed.
    NotFound(String),
}

impl Resolution {
    /// Returns true until a lookup has been attempted.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }

    /// Returns the resolved entity, if any.
    #[must_use]
    pub const fn entity(&self) -> Option<&Entity> {
        match self {
            Self::Resolved(entity) => Some(entity),
            _ => None,
        }
    }
}

/// Per-request state handed to the views.
///
/// # Example
///
/// ```
/// use http::Method;
/// use ramify_core::{RequestContext, LIMIT_PARAM};
///
/// let ctx = RequestContext::new(Method::GET, "/users/user12/stories")
///     .with_param("users_username", "user12");
///
/// assert_eq!(ctx.path_params().get("users_username"), Some("user12"));
/// assert_eq!(ctx.query_params()[LIMIT_PARAM], 20);
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    identity: CallerIdentity,
    path_params: Params,
    query_params: QueryParams,
    body: Fields,
    resolution: Resolution,
    page_limit: u64,
    explicit_limit: bool,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request ID and the default page limit.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            identity: CallerIdentity::Anonymous,
            path_params: Params::new(),
            query_params: limit_only(DEFAULT_PAGE_LIMIT),
            body: Fields::new(),
            resolution: Resolution::Unresolved,
            page_limit: DEFAULT_PAGE_LIMIT,
            explicit_limit: false,
            started_at: Instant::now(),
        }
    }

    /// Creates a `GET /` context for testing purposes.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(Method::GET, "/")
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns a new context with the specified request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the caller identity.
    #[must_use]
    pub const fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// Returns a new context with the specified identity.
    #[must_use]
    pub fn with_identity(mut self, identity: CallerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Returns the path parameters.
    #[must_use]
    pub const fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Replaces the path parameters.
    pub fn set_path_params(&mut self, params: Params) {
        self.path_params = params;
    }

    /// Returns a new context with the given path parameters.
    #[must_use]
    pub fn with_path_params(mut self, params: Params) -> Self {
        self.path_params = params;
        self
    }

    /// Returns a new context with one more path parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name, value);
        self
    }

    /// Returns the query parameters. Always holds [`LIMIT_PARAM`].
    #[must_use]
    pub const fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    /// Adds every entry of `extra` to the query parameters, replacing
    /// existing keys.
    pub fn merge_query(&mut self, extra: &QueryParams) {
        for (name, value) in extra {
            self.set_query_param(name.clone(), value.clone());
        }
    }

    /// Returns a new context with one more query parameter.
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_query_param(name.into(), value);
        self
    }

    fn set_query_param(&mut self, name: String, value: Value) {
        if name == LIMIT_PARAM {
            self.explicit_limit = true;
        }
        self.query_params.insert(name, value);
    }

    /// Returns the submitted body fields.
    #[must_use]
    pub const fn body(&self) -> &Fields {
        &self.body
    }

    /// Returns a new context with the given body.
    #[must_use]
    pub fn with_body(mut self, body: Fields) -> Self {
        self.body = body;
        self
    }

    /// Returns the configured page limit.
    #[must_use]
    pub const fn page_limit(&self) -> u64 {
        self.page_limit
    }

    /// Returns a new context using `limit` as the default page size.
    ///
    /// An explicit `_limit` query parameter is left untouched, even when
    /// it equals the previous default.
    #[must_use]
    pub fn with_page_limit(mut self, limit: u64) -> Self {
        if !self.explicit_limit {
            self.query_params
                .insert(LIMIT_PARAM.to_string(), Value::from(limit));
        }
        self.page_limit = limit;
        self
    }

    /// Returns the item resolution state.
    #[must_use]
    pub const fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Records the item resolution state.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    /// Returns the time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Builds the sub-request used to resolve a parent item.
    ///
    /// Keeps the request ID, identity, method and path; keeps the `id_name`
    /// path parameter and the ancestor identifiers before it; resets query params to the page limit;
    /// drops the body; starts `Unresolved`.
    #[must_use]
    pub fn narrowed(&self, id_name: &str) -> Self {
        Self {
            request_id: self.request_id,
            method: self.method.clone(),
            path: self.path.clone(),
            identity: self.identity.clone(),
            path_params: self.path_params.narrowed(id_name),
            query_params: limit_only(self.page_limit),
            body: Fields::new(),
            resolution: Resolution::Unresolved,
            page_limit: self.page_limit,
            explicit_limit: false,
            started_at: self.started_at,
        }
    }
}

fn limit_only(limit: u64) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert(LIMIT_PARAM.to_string(), Value::from(limit));
    params
}
