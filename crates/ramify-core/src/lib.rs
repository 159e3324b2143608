//! # Ramify Core
//!
//! Core types and collaborator traits for the Ramify view layer.
//!
//! - [`RequestContext`] - Per-request state: path/query/body params, identity, item resolution
//! - [`RequestId`] - UUID v7 request identifier
//! - [`CallerIdentity`] - Authenticated caller identity
//! - [`Entity`], [`Collection`], [`Scope`] - Stored objects and parent scopes
//! - [`PersistenceModel`], [`SearchIndex`], [`AclFactory`] - Collaborator traits
//! - [`ViewError`] - Standard error types

#![doc(html_root_url = "https://docs.rs/ramify-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod acl;
mod context;
mod entity;
mod error;
pub mod fixtures;
mod identity;
mod model;

pub use acl::{Ace, AceAction, Acl, AclFactory, AclSubject, ItemAcl, ALL_PERMISSIONS};
pub use context::{RequestContext, RequestId, Resolution, DEFAULT_PAGE_LIMIT, LIMIT_PARAM};
pub use entity::{stringify_value, Collection, Entity, Fields, Scope, ACL_FIELD};
pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, FieldErrors, ViewError, ViewResult};
pub use identity::CallerIdentity;
pub use model::{PersistenceModel, QueryParams, SearchHits, SearchIndex, DEFAULT_PK_FIELD};
