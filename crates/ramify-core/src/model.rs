//! Collaborator traits for the primary store and the search index.
//!
//! Views hold these as `Arc<dyn ...>` and never look behind them. Every
//! failure a collaborator reports is passed to the caller unchanged.

use crate::context::RequestContext;
use crate::entity::{Collection, Entity, Fields, Scope};
use crate::error::ViewResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters: filters, paging (`_limit`) and sorting keys.
pub type QueryParams = Map<String, Value>;

/// Primary-key field used when a model does not name one.
pub const DEFAULT_PK_FIELD: &str = "id";

/// The primary transactional store for one entity type.
///
/// # Example
///
/// ```rust
/// use ramify_core::fixtures::MemoryModel;
/// use ramify_core::PersistenceModel;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let model = MemoryModel::new("Story").with_rows([json!({"id": 1, "title": "a"})]);
/// let story = model.get_item("1").await.unwrap();
/// assert_eq!(story.kind(), "Story");
/// # });
/// ```
#[async_trait]
pub trait PersistenceModel: Send + Sync {
    /// Entity type name, used in not-found messages and ACL registration.
    fn name(&self) -> &str;

    /// Name of the primary-key field.
    fn pk_field(&self) -> &str {
        DEFAULT_PK_FIELD
    }

    /// Returns the matching page without any parent scoping.
    async fn get_collection(&self, params: &QueryParams) -> ViewResult<Collection>;

    /// Returns the matching page restricted to the members of `scope`.
    async fn filter_objects(&self, scope: &Scope, params: &QueryParams)
        -> ViewResult<Collection>;

    /// Fetches one entity by its resource key.
    async fn get_item(&self, key: &str) -> ViewResult<Entity>;

    /// Constructs an unsaved entity from submitted fields.
    fn build(&self, fields: Fields) -> ViewResult<Entity>;

    /// Persists a new entity, returning it as stored.
    async fn save(&self, entity: Entity, request: &RequestContext) -> ViewResult<Entity>;

    /// Applies `fields` to an existing entity, returning it as stored.
    async fn update(
        &self,
        entity: Entity,
        fields: Fields,
        request: &RequestContext,
    ) -> ViewResult<Entity>;

    /// Removes an entity.
    async fn delete(&self, entity: Entity, request: &RequestContext) -> ViewResult<()>;

    /// Applies `fields` to every entity of `collection`; returns the count
    /// the store reports.
    async fn update_many(
        &self,
        collection: Collection,
        fields: &Fields,
        request: &RequestContext,
    ) -> ViewResult<u64>;

    /// Removes every entity of `collection`; returns the count the store
    /// reports.
    async fn delete_many(&self, collection: Collection, request: &RequestContext)
        -> ViewResult<u64>;
}

/// Documents returned by a search index query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    /// Matching documents, as stored in the index.
    pub documents: Vec<Value>,
    /// Total number of matches, when the index reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl SearchHits {
    /// Creates an empty result reporting a total of zero.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            total: Some(0),
        }
    }

    /// Returns the number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if no document matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// A secondary search index mirroring one entity type.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Index name.
    fn name(&self) -> &str;

    /// Runs a query. A primary-key parameter holds a comma-separated
    /// identifier list.
    async fn get_collection(&self, params: &QueryParams) -> ViewResult<SearchHits>;

    /// Fetches one document by key.
    async fn get_item(&self, key: &str) -> ViewResult<Value>;
}

impl std::fmt::Debug for dyn SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex").field("name", &self.name()).finish()
    }
}

impl std::fmt::Debug for dyn PersistenceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceModel")
            .field("name", &self.name())
            .finish()
    }
}
