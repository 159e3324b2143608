//! Entities, materialised collections and parent scopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding an entity's serialised access-control descriptor.
pub const ACL_FIELD: &str = "_acl";

/// A field map as submitted in a request body or stored on an entity.
pub type Fields = Map<String, Value>;

/// Renders a JSON scalar the way identifiers appear in URLs.
///
/// Strings are returned as-is, `null` yields `None`, and every other value
/// uses its JSON text (`1`, `true`).
///
/// # Example
///
/// ```rust
/// use ramify_core::stringify_value;
/// use serde_json::json;
///
/// assert_eq!(stringify_value(&json!("abc")).as_deref(), Some("abc"));
/// assert_eq!(stringify_value(&json!(3)).as_deref(), Some("3"));
/// assert_eq!(stringify_value(&json!(null)), None);
/// ```
#[must_use]
pub fn stringify_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A single stored object: its type name plus a JSON field map.
///
/// # Example
///
/// ```rust
/// use ramify_core::Entity;
/// use serde_json::json;
///
/// let mut story = Entity::from_value("Story", json!({"id": 4, "title": "x"})).unwrap();
/// assert_eq!(story.kind(), "Story");
/// assert_eq!(story.field_string("id").as_deref(), Some("4"));
/// assert!(!story.has_acl());
///
/// story.set("title", json!("y"));
/// assert_eq!(story.get("title"), Some(&json!("y")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    kind: String,
    fields: Fields,
}

impl Entity {
    /// Creates an entity from a field map.
    pub fn new(kind: impl Into<String>, fields: Fields) -> Self {
        Self {
            kind: kind.into(),
            fields,
        }
    }

    /// Creates an entity from a JSON document. Returns `None` unless the
    /// document is an object.
    pub fn from_value(kind: impl Into<String>, document: Value) -> Option<Self> {
        match document {
            Value::Object(fields) => Some(Self::new(kind, fields)),
            _ => None,
        }
    }

    /// Returns the entity type name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns a field rendered with [`stringify_value`].
    #[must_use]
    pub fn field_string(&self, name: &str) -> Option<String> {
        self.get(name).and_then(stringify_value)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Applies every entry of `fields` on top of the current values.
    pub fn merge(&mut self, fields: &Fields) {
        for (name, value) in fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Returns the field map.
    #[must_use]
    pub const fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Consumes the entity, returning its field map.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Returns the entity as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Returns true if the entity carries a non-empty ACL descriptor.
    #[must_use]
    pub fn has_acl(&self) -> bool {
        match self.get(ACL_FIELD) {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Stores a serialised ACL descriptor.
    pub fn set_acl(&mut self, acl: Value) {
        self.fields.insert(ACL_FIELD.to_string(), acl);
    }
}

/// A materialised page of entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Entities on this page.
    pub items: Vec<Entity>,
    /// Total number of matches, when the store reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl Collection {
    /// Creates a collection without a total.
    #[must_use]
    pub fn new(items: Vec<Entity>) -> Self {
        Self { items, total: None }
    }

    /// Creates an empty collection reporting a total of zero.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Some(0),
        }
    }

    /// Sets the reported total.
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Returns the number of entities on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the page holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns an iterator over the entities.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.items.iter()
    }
}

impl IntoIterator for Collection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Entity> for Collection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The value of a parent entity's collection attribute.
///
/// Members are either full objects or bare identifiers; a parent may hold
/// both kinds at once.
///
/// # Example
///
/// ```rust
/// use ramify_core::{Entity, Scope};
/// use serde_json::json;
///
/// let scope = Scope::from_value(&json!([1, 3])).unwrap();
/// let story = Entity::from_value("Story", json!({"id": 3})).unwrap();
/// assert!(scope.contains(&story, "id"));
/// assert_eq!(scope.identifiers("id"), vec!["1", "3"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    members: Vec<Value>,
}

impl Scope {
    /// Creates a scope from its members.
    #[must_use]
    pub fn new(members: Vec<Value>) -> Self {
        Self { members }
    }

    /// Interprets an attribute value as a scope.
    ///
    /// `null` means the attribute is unset and yields `None`. A single
    /// non-list value is a one-member scope.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) => Some(Self::new(items.clone())),
            single => Some(Self::new(vec![single.clone()])),
        }
    }

    /// Returns the raw members.
    #[must_use]
    pub fn members(&self) -> &[Value] {
        &self.members
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the scope has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if `entity` is a member.
    ///
    /// Members compare against the entity's `pk_field`, both sides
    /// stringified. An object member without that field falls back to
    /// whole field map equality.
    #[must_use]
    pub fn contains(&self, entity: &Entity, pk_field: &str) -> bool {
        let key = entity.field_string(pk_field);
        self.members.iter().any(|member| match member {
            Value::Object(fields) => match fields.get(pk_field) {
                Some(id) => key.is_some() && stringify_value(id) == key,
                None => fields == entity.fields(),
            },
            bare => key.is_some() && stringify_value(bare) == key,
        })
    }

    /// Returns the members' identifiers in first-seen order.
    ///
    /// Objects contribute their `pk_field`, bare values themselves. Null or
    /// missing identifiers are dropped and duplicates removed.
    #[must_use]
    pub fn identifiers(&self, pk_field: &str) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let id = match member {
                Value::Object(fields) => fields.get(pk_field).and_then(stringify_value),
                bare => stringify_value(bare),
            };
            if let Some(id) = id {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}
