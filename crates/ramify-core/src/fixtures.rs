//! In-memory collaborators for tests and demos.
//!
//! [`MemoryModel`], [`MemoryIndex`] and [`MemoryAclFactory`] implement the
//! collaborator traits over plain vectors and record every call, so tests
//! can assert on what a view delegated.
//!
//! # Example
//!
//! ```
//! use ramify_core::fixtures::{MemoryModel, ModelCall};
//! use ramify_core::{PersistenceModel, QueryParams};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let model = MemoryModel::new("Story").with_rows([json!({"id": 1}), json!({"id": 2})]);
//! let page = model.get_collection(&QueryParams::new()).await.unwrap();
//! assert_eq!(page.len(), 2);
//! assert!(matches!(model.calls()[0], ModelCall::GetCollection(_)));
//! # });
//! ```

use crate::acl::{Acl, AclFactory, AclSubject, ItemAcl, ALL_PERMISSIONS};
use crate::context::{RequestContext, RequestId, LIMIT_PARAM};
use crate::entity::{stringify_value, Collection, Entity, Fields, Scope};
use crate::error::{ViewError, ViewResult};
use crate::model::{PersistenceModel, QueryParams, SearchHits, SearchIndex, DEFAULT_PK_FIELD};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// A call recorded by [`MemoryModel`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModelCall {
    /// `get_collection(params)`.
    GetCollection(QueryParams),
    /// `filter_objects(scope, params)`.
    FilterObjects {
        /// Scope passed in.
        scope: Scope,
        /// Params passed in.
        params: QueryParams,
    },
    /// `get_item(key)`.
    GetItem(String),
    /// `save(entity)`.
    Save(Entity),
    /// `update(entity, fields)`.
    Update {
        /// Entity before the update.
        entity: Entity,
        /// Fields applied.
        fields: Fields,
    },
    /// `delete(entity)`.
    Delete(Entity),
    /// `update_many(collection, fields, request)`.
    UpdateMany {
        /// Collection passed in.
        collection: Collection,
        /// Fields applied.
        fields: Fields,
        /// Request the call was made for.
        request_id: RequestId,
    },
    /// `delete_many(collection, request)`.
    DeleteMany {
        /// Collection passed in.
        collection: Collection,
        /// Request the call was made for.
        request_id: RequestId,
    },
}

/// A [`PersistenceModel`] over an in-memory row list.
///
/// Query parameters other than underscore-prefixed control keys filter by
/// field equality (compared as strings); `_limit` bounds the page.
#[derive(Debug)]
pub struct MemoryModel {
    name: String,
    pk_field: String,
    rows: Mutex<Vec<Entity>>,
    calls: Mutex<Vec<ModelCall>>,
    next_id: AtomicU64,
    bulk_result: Option<u64>,
}

impl MemoryModel {
    /// Creates an empty model for the entity type `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pk_field: DEFAULT_PK_FIELD.to_string(),
            rows: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            bulk_result: None,
        }
    }

    /// Uses `field` as the primary key.
    #[must_use]
    pub fn with_pk_field(mut self, field: impl Into<String>) -> Self {
        self.pk_field = field.into();
        self
    }

    /// Seeds rows. Non-object values are skipped.
    #[must_use]
    pub fn with_rows(self, rows: impl IntoIterator<Item = Value>) -> Self {
        {
            let mut stored = self.rows.lock();
            stored.extend(
                rows.into_iter()
                    .filter_map(|row| Entity::from_value(self.name.clone(), row)),
            );
            self.next_id
                .store(stored.len() as u64 + 1, Ordering::SeqCst);
        }
        self
    }

    /// Makes `update_many`/`delete_many` report `count` regardless of how
    /// many rows they touched.
    #[must_use]
    pub fn with_bulk_result(mut self, count: u64) -> Self {
        self.bulk_result = Some(count);
        self
    }

    /// Returns a snapshot of the stored rows.
    pub fn rows(&self) -> Vec<Entity> {
        self.rows.lock().clone()
    }

    /// Returns the stored row with primary key `key`.
    pub fn row(&self, key: &str) -> Option<Entity> {
        self.rows
            .lock()
            .iter()
            .find(|row| self.key_of(row).as_deref() == Some(key))
            .cloned()
    }

    /// Returns the calls recorded so far.
    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: ModelCall) {
        self.calls.lock().push(call);
    }

    fn key_of(&self, entity: &Entity) -> Option<String> {
        entity.field_string(&self.pk_field)
    }

    fn page<'a>(&self, rows: impl Iterator<Item = &'a Entity>, params: &QueryParams) -> Collection {
        let matching: Vec<Entity> = rows.filter(|row| matches_params(row, params)).cloned().collect();
        let total = matching.len() as u64;
        let limit = params
            .get(LIMIT_PARAM)
            .and_then(Value::as_u64)
            .map_or(matching.len(), |l| usize::try_from(l).unwrap_or(usize::MAX));
        Collection::new(matching.into_iter().take(limit).collect()).with_total(total)
    }

    fn store(&self, entity: Entity) {
        let key = self.key_of(&entity);
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|row| key.is_some() && self.key_of(row) == key) {
            Some(slot) => *slot = entity,
            None => rows.push(entity),
        }
    }

    fn remove(&self, entity: &Entity) -> bool {
        let key = self.key_of(entity);
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|row| self.key_of(row) != key);
        rows.len() != before
    }
}

fn matches_params(entity: &Entity, params: &QueryParams) -> bool {
    params
        .iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .all(|(name, expected)| {
            entity.get(name).and_then(stringify_value) == stringify_value(expected)
        })
}

#[async_trait]
impl PersistenceModel for MemoryModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn pk_field(&self) -> &str {
        &self.pk_field
    }

    async fn get_collection(&self, params: &QueryParams) -> ViewResult<Collection> {
        self.record(ModelCall::GetCollection(params.clone()));
        let rows = self.rows.lock();
        Ok(self.page(rows.iter(), params))
    }

    async fn filter_objects(
        &self,
        scope: &Scope,
        params: &QueryParams,
    ) -> ViewResult<Collection> {
        self.record(ModelCall::FilterObjects {
            scope: scope.clone(),
            params: params.clone(),
        });
        let rows = self.rows.lock();
        Ok(self.page(
            rows.iter().filter(|row| scope.contains(row, &self.pk_field)),
            params,
        ))
    }

    async fn get_item(&self, key: &str) -> ViewResult<Entity> {
        self.record(ModelCall::GetItem(key.to_string()));
        self.row(key)
            .ok_or_else(|| ViewError::not_found_resource(self.name.clone(), key))
    }

    fn build(&self, fields: Fields) -> ViewResult<Entity> {
        Ok(Entity::new(self.name.clone(), fields))
    }

    async fn save(&self, mut entity: Entity, _request: &RequestContext) -> ViewResult<Entity> {
        if self.key_of(&entity).is_none() {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            entity.set(self.pk_field.clone(), Value::from(id));
        }
        self.record(ModelCall::Save(entity.clone()));
        self.store(entity.clone());
        Ok(entity)
    }

    async fn update(
        &self,
        entity: Entity,
        fields: Fields,
        _request: &RequestContext,
    ) -> ViewResult<Entity> {
        self.record(ModelCall::Update {
            entity: entity.clone(),
            fields: fields.clone(),
        });
        let mut updated = entity;
        updated.merge(&fields);
        self.store(updated.clone());
        Ok(updated)
    }

    async fn delete(&self, entity: Entity, _request: &RequestContext) -> ViewResult<()> {
        self.record(ModelCall::Delete(entity.clone()));
        if self.remove(&entity) {
            Ok(())
        } else {
            let key = self.key_of(&entity).unwrap_or_else(|| "None".to_string());
            Err(ViewError::not_found_resource(self.name.clone(), key))
        }
    }

    async fn update_many(
        &self,
        collection: Collection,
        fields: &Fields,
        request: &RequestContext,
    ) -> ViewResult<u64> {
        self.record(ModelCall::UpdateMany {
            collection: collection.clone(),
            fields: fields.clone(),
            request_id: request.request_id(),
        });
        let mut touched = 0;
        for mut entity in collection {
            entity.merge(fields);
            self.store(entity);
            touched += 1;
        }
        Ok(self.bulk_result.unwrap_or(touched))
    }

    async fn delete_many(
        &self,
        collection: Collection,
        request: &RequestContext,
    ) -> ViewResult<u64> {
        self.record(ModelCall::DeleteMany {
            collection: collection.clone(),
            request_id: request.request_id(),
        });
        let touched = collection.iter().filter(|entity| self.remove(entity)).count() as u64;
        Ok(self.bulk_result.unwrap_or(touched))
    }
}

/// A [`SearchIndex`] over in-memory documents.
///
/// A query parameter naming the primary key holds a comma-separated id
/// list; other non-control parameters filter by equality.
#[derive(Debug)]
pub struct MemoryIndex {
    name: String,
    pk_field: String,
    documents: Mutex<Vec<Value>>,
    queries: Mutex<Vec<QueryParams>>,
}

impl MemoryIndex {
    /// Creates an empty index.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pk_field: DEFAULT_PK_FIELD.to_string(),
            documents: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Uses `field` as the primary key.
    #[must_use]
    pub fn with_pk_field(mut self, field: impl Into<String>) -> Self {
        self.pk_field = field.into();
        self
    }

    /// Seeds documents.
    #[must_use]
    pub fn with_documents(self, documents: impl IntoIterator<Item = Value>) -> Self {
        self.documents.lock().extend(documents);
        self
    }

    /// Returns the queries run so far.
    pub fn queries(&self) -> Vec<QueryParams> {
        self.queries.lock().clone()
    }

    fn document_key(&self, document: &Value) -> Option<String> {
        document.get(&self.pk_field).and_then(stringify_value)
    }

    fn matches(&self, document: &Value, params: &QueryParams) -> bool {
        params
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .all(|(name, expected)| {
                if *name == self.pk_field {
                    let wanted = stringify_value(expected).unwrap_or_default();
                    let key = self.document_key(document);
                    wanted.split(',').any(|id| key.as_deref() == Some(id))
                } else {
                    document.get(name).and_then(stringify_value) == stringify_value(expected)
                }
            })
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_collection(&self, params: &QueryParams) -> ViewResult<SearchHits> {
        self.queries.lock().push(params.clone());
        let documents: Vec<Value> = self
            .documents
            .lock()
            .iter()
            .filter(|doc| self.matches(doc, params))
            .cloned()
            .collect();
        let total = documents.len() as u64;
        let limit = params
            .get(LIMIT_PARAM)
            .and_then(Value::as_u64)
            .map_or(documents.len(), |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(SearchHits {
            documents: documents.into_iter().take(limit).collect(),
            total: Some(total),
        })
    }

    async fn get_item(&self, key: &str) -> ViewResult<Value> {
        self.documents
            .lock()
            .iter()
            .find(|doc| self.document_key(doc).as_deref() == Some(key))
            .cloned()
            .ok_or_else(|| ViewError::not_found_resource(self.name.clone(), key))
    }
}

/// An [`AclFactory`] resolving keys through the item model (or, when bound
/// search-index based, through an attached [`MemoryIndex`]).
///
/// New items get `allow everyone view` plus `allow g:admin all`; new
/// principals additionally get `allow <pk value> all`.
#[derive(Debug, Default)]
pub struct MemoryAclFactory {
    index: Option<Arc<dyn SearchIndex>>,
    item_model: Option<Arc<dyn PersistenceModel>>,
    lookups: Arc<AtomicUsize>,
    binds: Mutex<Vec<Option<bool>>>,
}

impl MemoryAclFactory {
    /// Creates a factory without search-index support or a preset model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables search-index lookups through `index`.
    #[must_use]
    pub fn with_search_index(mut self, index: Arc<dyn SearchIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Presets the item model handed to every bound instance.
    #[must_use]
    pub fn with_item_model(mut self, model: Arc<dyn PersistenceModel>) -> Self {
        self.item_model = Some(model);
        self
    }

    /// Returns how many lookups bound instances have performed.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Returns the search-index flag received by each `bind` call.
    pub fn bind_flags(&self) -> Vec<Option<bool>> {
        self.binds.lock().clone()
    }
}

impl AclFactory for MemoryAclFactory {
    fn supports_search_index(&self) -> bool {
        self.index.is_some()
    }

    fn bind(
        &self,
        _request: &RequestContext,
        search_index_based: Option<bool>,
    ) -> Box<dyn ItemAcl> {
        self.binds.lock().push(search_index_based);
        let index = match search_index_based {
            Some(true) => self.index.clone(),
            _ => None,
        };
        Box::new(MemoryItemAcl {
            item_model: self.item_model.clone(),
            index,
            lookups: Arc::clone(&self.lookups),
        })
    }
}

struct MemoryItemAcl {
    item_model: Option<Arc<dyn PersistenceModel>>,
    index: Option<Arc<dyn SearchIndex>>,
    lookups: Arc<AtomicUsize>,
}

#[async_trait]
impl ItemAcl for MemoryItemAcl {
    fn item_model(&self) -> Option<Arc<dyn PersistenceModel>> {
        self.item_model.clone()
    }

    fn set_item_model(&mut self, model: Arc<dyn PersistenceModel>) {
        self.item_model = Some(model);
    }

    async fn lookup(&self, key: &str) -> ViewResult<Entity> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let model = self
            .item_model
            .as_ref()
            .ok_or_else(|| ViewError::internal("access-control factory has no item model"))?;

        match &self.index {
            Some(index) => {
                let document = index.get_item(key).await?;
                Entity::from_value(model.name(), document).ok_or_else(|| {
                    ViewError::search_index(format!("document {key} is not an object"))
                })
            }
            None => model.get_item(key).await,
        }
    }

    fn generate_item_acl(&self, subject: AclSubject<'_>) -> Acl {
        let acl = Acl::new()
            .allow("everyone", "view")
            .allow("g:admin", ALL_PERMISSIONS);
        match subject {
            AclSubject::Entity(_) => acl,
            AclSubject::Principal(principal) => {
                let pk = self
                    .item_model
                    .as_ref()
                    .map_or(DEFAULT_PK_FIELD, |model| model.pk_field());
                match principal.field_string(pk) {
                    Some(owner) => acl.allow(owner, ALL_PERMISSIONS),
                    None => acl,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_model_filters_and_limits() {
        let model = MemoryModel::new("Story").with_rows([
            json!({"id": 1, "draft": true}),
            json!({"id": 2, "draft": false}),
            json!({"id": 3, "draft": true}),
        ]);

        let page = model
            .get_collection(&params(&[("draft", json!(true)), (LIMIT_PARAM, json!(1))]))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.total, Some(2));
    }

    #[tokio::test]
    async fn test_model_filter_objects_respects_scope() {
        let model = MemoryModel::new("Story").with_rows([
            json!({"id": 1}),
            json!({"id": 2}),
            json!({"id": 3}),
        ]);
        let scope = Scope::from_value(&json!([1, 3])).unwrap();

        let page = model.filter_objects(&scope, &QueryParams::new()).await.unwrap();
        let ids: Vec<_> = page.iter().filter_map(|e| e.field_string("id")).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let empty = model
            .filter_objects(&Scope::default(), &QueryParams::new())
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_model_get_item_not_found() {
        let model = MemoryModel::new("Story");
        let err = model.get_item("9").await.unwrap_err();
        assert!(err.to_string().contains("Story(9) not found"));
    }

    #[tokio::test]
    async fn test_model_save_assigns_id() {
        let model = MemoryModel::new("Story").with_rows([json!({"id": 1})]);
        let entity = model.build(Fields::new()).unwrap();
        let saved = model.save(entity, &RequestContext::mock()).await.unwrap();
        assert_eq!(saved.field_string("id").as_deref(), Some("2"));
        assert_eq!(model.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_model_bulk_result_override() {
        let model = MemoryModel::new("Story")
            .with_rows([json!({"id": 1})])
            .with_bulk_result(7);
        let page = model.get_collection(&QueryParams::new()).await.unwrap();
        let count = model
            .delete_many(page, &RequestContext::mock())
            .await
            .unwrap();
        assert_eq!(count, 7);
        assert!(model.rows().is_empty());
    }

    #[tokio::test]
    async fn test_index_pk_list_filter() {
        let index = MemoryIndex::new("stories").with_documents([
            json!({"id": 1}),
            json!({"id": 2}),
            json!({"id": 3}),
        ]);
        let hits = index
            .get_collection(&params(&[("id", json!("1,3"))]))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(index.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_acl_factory_lookup_counts() {
        let model: Arc<dyn PersistenceModel> =
            Arc::new(MemoryModel::new("Story").with_rows([json!({"id": 1})]));
        let factory = MemoryAclFactory::new();

        let mut acl = factory.bind(&RequestContext::mock(), None);
        assert!(acl.item_model().is_none());
        assert!(acl.lookup("1").await.is_err());

        acl.set_item_model(model);
        assert_eq!(acl.lookup("1").await.unwrap().kind(), "Story");
        assert!(acl.lookup("2").await.unwrap_err().is_not_found());
        assert_eq!(factory.lookup_count(), 3);
        assert_eq!(factory.bind_flags(), vec![None]);
    }

    #[tokio::test]
    async fn test_acl_factory_search_index_lookup() {
        let index: Arc<dyn SearchIndex> =
            Arc::new(MemoryIndex::new("stories").with_documents([json!({"id": 5, "es": true})]));
        let factory = MemoryAclFactory::new()
            .with_search_index(index)
            .with_item_model(Arc::new(MemoryModel::new("Story")));
        assert!(factory.supports_search_index());

        let acl = factory.bind(&RequestContext::mock(), Some(true));
        let entity = acl.lookup("5").await.unwrap();
        assert_eq!(entity.get("es"), Some(&json!(true)));
    }

    #[test]
    fn test_generated_acls() {
        let factory = MemoryAclFactory::new()
            .with_item_model(Arc::new(MemoryModel::new("User").with_pk_field("username")));
        let acl = factory.bind(&RequestContext::mock(), None);
        let user = Entity::from_value("User", json!({"username": "user12"})).unwrap();

        assert_eq!(acl.generate_item_acl(AclSubject::Entity(&user)).len(), 2);
        let principal = acl.generate_item_acl(AclSubject::Principal(&user));
        assert_eq!(principal.len(), 3);
        assert_eq!(principal.entries()[2].principal, "user12");
    }
}
