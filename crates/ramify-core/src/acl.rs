//! Access-control descriptors and the access-control factory traits.
//!
//! An [`AclFactory`] is attached to each resource. Bound to a request it
//! yields an [`ItemAcl`], which resolves resource keys to entities (raising
//! not-found on a miss) and generates per-item descriptors.

use crate::context::RequestContext;
use crate::entity::Entity;
use crate::error::{ViewError, ViewResult};
use crate::model::PersistenceModel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Permission string granting every permission.
pub const ALL_PERMISSIONS: &str = "all";

/// Whether an entry grants or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AceAction {
    /// Grant the permission.
    Allow,
    /// Deny the permission.
    Deny,
}

impl AceAction {
    /// Returns the serialised form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

/// One access-control entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ace {
    /// Grant or deny.
    pub action: AceAction,
    /// Principal the entry applies to (`everyone`, `g:admin`, `user12`).
    pub principal: String,
    /// Permission name, or [`ALL_PERMISSIONS`].
    pub permission: String,
}

/// An ordered access-control list.
///
/// # Example
///
/// ```rust
/// use ramify_core::{Acl, ALL_PERMISSIONS};
/// use serde_json::json;
///
/// let acl = Acl::new().allow("g:admin", ALL_PERMISSIONS).deny("everyone", "delete");
/// let stored = acl.stringify();
/// assert_eq!(stored, json!([["allow", "g:admin", "all"], ["deny", "everyone", "delete"]]));
/// assert_eq!(Acl::parse(&stored).unwrap(), acl);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acl {
    entries: Vec<Ace>,
}

impl Acl {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an allow entry.
    #[must_use]
    pub fn allow(mut self, principal: impl Into<String>, permission: impl Into<String>) -> Self {
        self.push(AceAction::Allow, principal, permission);
        self
    }

    /// Appends a deny entry.
    #[must_use]
    pub fn deny(mut self, principal: impl Into<String>, permission: impl Into<String>) -> Self {
        self.push(AceAction::Deny, principal, permission);
        self
    }

    /// Appends an entry.
    pub fn push(
        &mut self,
        action: AceAction,
        principal: impl Into<String>,
        permission: impl Into<String>,
    ) {
        self.entries.push(Ace {
            action,
            principal: principal.into(),
            permission: permission.into(),
        });
    }

    /// Returns the entries in order.
    #[must_use]
    pub fn entries(&self) -> &[Ace] {
        &self.entries
    }

    /// Returns true if the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serialises the list into the stored `_acl` form: an array of
    /// `[action, principal, permission]` string triples.
    #[must_use]
    pub fn stringify(&self) -> Value {
        Value::Array(
            self.entries
                .iter()
                .map(|ace| {
                    Value::Array(vec![
                        Value::from(ace.action.as_str()),
                        Value::from(ace.principal.as_str()),
                        Value::from(ace.permission.as_str()),
                    ])
                })
                .collect(),
        )
    }

    /// Parses the stored `_acl` form.
    pub fn parse(stored: &Value) -> ViewResult<Self> {
        let items = match stored {
            Value::Null => return Ok(Self::new()),
            Value::Array(items) => items,
            _ => return Err(ViewError::validation("ACL must be a list of entries")),
        };

        let mut acl = Self::new();
        for item in items {
            let triple = item.as_array().map(Vec::as_slice);
            let Some([action, principal, permission]) = triple else {
                return Err(ViewError::validation(format!("malformed ACL entry: {item}")));
            };
            let action = match action.as_str() {
                Some("allow") => AceAction::Allow,
                Some("deny") => AceAction::Deny,
                _ => return Err(ViewError::validation(format!("unknown ACL action: {action}"))),
            };
            let (Some(principal), Some(permission)) = (principal.as_str(), permission.as_str())
            else {
                return Err(ViewError::validation(format!("malformed ACL entry: {item}")));
            };
            acl.push(action, principal, permission);
        }
        Ok(acl)
    }
}

/// What an ACL is being generated for.
#[derive(Debug, Clone, Copy)]
pub enum AclSubject<'a> {
    /// A newly created item.
    Entity(&'a Entity),
    /// A newly registered principal (user account) owning itself.
    Principal(&'a Entity),
}

impl AclSubject<'_> {
    /// Returns the subject entity.
    #[must_use]
    pub const fn entity(&self) -> &Entity {
        match self {
            Self::Entity(entity) | Self::Principal(entity) => entity,
        }
    }
}

/// An access-control factory bound to one request.
#[async_trait]
pub trait ItemAcl: Send + Sync {
    /// The model items are looked up in, once set.
    fn item_model(&self) -> Option<Arc<dyn PersistenceModel>>;

    /// Sets the model items are looked up in.
    fn set_item_model(&mut self, model: Arc<dyn PersistenceModel>);

    /// Resolves a resource key to an entity, returning
    /// [`ViewError::NotFound`] when there is none.
    async fn lookup(&self, key: &str) -> ViewResult<Entity>;

    /// Generates the default descriptor for a new item or principal.
    fn generate_item_acl(&self, subject: AclSubject<'_>) -> Acl;
}

/// Produces per-request [`ItemAcl`] instances for one resource.
pub trait AclFactory: Send + Sync {
    /// Whether [`AclFactory::bind`] honours the search-index flag.
    fn supports_search_index(&self) -> bool {
        false
    }

    /// Binds the factory to a request.
    ///
    /// `search_index_based` is `None` for factories that do not support the
    /// search index.
    fn bind(&self, request: &RequestContext, search_index_based: Option<bool>)
        -> Box<dyn ItemAcl>;
}
