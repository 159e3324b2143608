//! Search-index reads.
//!
//! The same parent scoping as the primary-store path, except that parents
//! are resolved from the index and the scope is turned into an identifier
//! filter. An empty scope short-circuits without touching the index.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use ramify_core::{Entity, QueryParams, Scope, SearchHits, SearchIndex, ViewError, ViewResult};
use ramify_telemetry::metrics;
use serde_json::Value;
use tracing::debug;

use crate::base::BaseView;

impl BaseView<'_> {
    /// Returns the bound search index.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Configuration` when the binding has no index.
    pub fn search_index(&self) -> ViewResult<Arc<dyn SearchIndex>> {
        self.binding.index().cloned().ok_or_else(|| {
            ViewError::configuration(format!(
                "resource '{}' has no search index",
                self.node.uid()
            ))
        })
    }

    /// Like [`resolve_parent_collection`](Self::resolve_parent_collection),
    /// but resolves the parent through its search index.
    pub async fn resolve_parent_collection_es(&mut self) -> ViewResult<Option<Scope>> {
        if let Some(scope) = &self.search_scope {
            return Ok(scope.clone());
        }
        let scope = self.parent_scope(true).await?;
        self.search_scope = Some(scope.clone());
        Ok(scope)
    }

    /// Turns a scope into primary-key strings, dropping nulls and
    /// duplicates.
    #[must_use]
    pub fn get_es_object_ids(&self, scope: &Scope) -> Vec<String> {
        scope.identifiers(self.model().pk_field())
    }

    /// Queries the search index, restricted to the parent's scope.
    ///
    /// `extra` is merged into the request's query parameters. A scoped
    /// query adds `<pk>=<id1><sep><id2>...`; an empty scope returns an empty
    /// result and never reaches the index.
    pub async fn get_collection_es(&mut self, extra: &QueryParams) -> ViewResult<SearchHits> {
        let index = self.search_index()?;
        self.request.merge_query(extra);
        let mut params = self.request.query_params().clone();

        if let Some(scope) = self.resolve_parent_collection_es().await? {
            let ids = self.get_es_object_ids(&scope);
            if ids.is_empty() {
                metrics::record_search_query(false);
                debug!(resource = self.node.uid(), "empty parent scope, index not queried");
                return Ok(SearchHits::empty());
            }
            let separator = &self.registry.search_config().id_separator;
            params.insert(
                self.model().pk_field().to_string(),
                Value::String(ids.join(separator)),
            );
        }

        metrics::record_search_query(true);
        index.get_collection(&params).await
    }

    /// Like [`get_item`](Self::get_item), but looks the item up through the
    /// search index and checks its primary key against the parent's
    /// identifier list.
    pub fn get_item_es(&mut self) -> BoxFuture<'_, ViewResult<Entity>> {
        async move {
            if self.request.resolution().is_unresolved() {
                self.reload_context(true).await?;
            }
            let entity = self.resolved_entity()?;

            if let Some(scope) = self.resolve_parent_collection_es().await? {
                let ids = self.get_es_object_ids(&scope);
                let in_scope = entity
                    .field_string(self.model().pk_field())
                    .is_some_and(|key| ids.contains(&key));
                if !in_scope {
                    return Err(self.item_not_found());
                }
            }
            Ok(entity)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ViewBinding, ViewRegistry};
    use ramify_config::SearchIndexConfig;
    use ramify_core::fixtures::{MemoryAclFactory, MemoryIndex, MemoryModel};
    use ramify_core::RequestContext;
    use ramify_router::{ResourceId, ResourceSpec, ResourceTree};
    use serde_json::json;

    struct Fixture {
        registry: ViewRegistry,
        stories: ResourceId,
        story_index: Arc<MemoryIndex>,
    }

    fn fixture(user_stories: Value, separator: &str) -> Fixture {
        let mut tree = ResourceTree::builder();
        let users = tree.add(None, ResourceSpec::new("user", "users")).unwrap();
        let stories = tree
            .add(Some(users), ResourceSpec::new("story", "stories"))
            .unwrap();

        let user_model = Arc::new(MemoryModel::new("User"));
        let user_index = Arc::new(
            MemoryIndex::new("users").with_documents([json!({"id": 1, "stories": user_stories})]),
        );
        let story_model = Arc::new(MemoryModel::new("Story"));
        let story_index = Arc::new(MemoryIndex::new("stories").with_documents([
            json!({"id": 1, "title": "a"}),
            json!({"id": 2, "title": "b"}),
            json!({"id": 3, "title": "c"}),
        ]));

        let registry = ViewRegistry::builder(Arc::new(tree.build()))
            .bind(
                users,
                ViewBinding::new(
                    user_model,
                    Arc::new(MemoryAclFactory::new().with_search_index(user_index.clone())),
                )
                .search_indexed(user_index),
            )
            .unwrap()
            .bind(
                stories,
                ViewBinding::new(
                    story_model,
                    Arc::new(MemoryAclFactory::new().with_search_index(story_index.clone())),
                )
                .search_indexed(story_index.clone()),
            )
            .unwrap()
            .with_search_config(SearchIndexConfig {
                id_separator: separator.to_string(),
                ..SearchIndexConfig::default()
            })
            .build();

        Fixture {
            registry,
            stories,
            story_index,
        }
    }

    fn request(path: &str) -> RequestContext {
        RequestContext::new(http::Method::GET, path).with_param("user_id", "1")
    }

    #[tokio::test]
    async fn test_empty_scope_skips_index() {
        let f = fixture(json!([]), ",");
        let mut view = BaseView::new(&f.registry, f.stories, request("/users/1/stories")).unwrap();

        let hits = view.get_collection_es(&QueryParams::new()).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(hits.total, Some(0));
        assert!(f.story_index.queries().is_empty());
    }

    #[tokio::test]
    async fn test_scope_becomes_id_filter() {
        let f = fixture(json!([{"id": 3}, 1, 1, null]), ",");
        let mut view = BaseView::new(&f.registry, f.stories, request("/users/1/stories")).unwrap();

        let hits = view.get_collection_es(&QueryParams::new()).await.unwrap();
        assert_eq!(hits.len(), 2);
        let query = &f.story_index.queries()[0];
        assert_eq!(query["id"], json!("3,1"));
    }

    #[tokio::test]
    async fn test_configured_separator() {
        let f = fixture(json!([1, 2]), "|");
        let mut view = BaseView::new(&f.registry, f.stories, request("/users/1/stories")).unwrap();

        view.get_collection_es(&QueryParams::new()).await.unwrap();
        assert_eq!(f.story_index.queries()[0]["id"], json!("1|2"));
    }

    #[tokio::test]
    async fn test_get_item_es_scope_check() {
        let f = fixture(json!([1, 3]), ",");

        let mut view = BaseView::new(
            &f.registry,
            f.stories,
            request("/users/1/stories/3").with_param("story_id", "3"),
        )
        .unwrap();
        let story = view.get_item_es().await.unwrap();
        assert_eq!(story.get("title"), Some(&json!("c")));

        let mut view = BaseView::new(
            &f.registry,
            f.stories,
            request("/users/1/stories/2").with_param("story_id", "2"),
        )
        .unwrap();
        let err = view.get_item_es().await.unwrap_err();
        assert!(err.to_string().contains("Story(2) not found"));
    }

    #[test]
    fn test_missing_index_is_configuration_error() {
        let mut tree = ResourceTree::builder();
        let users = tree.add(None, ResourceSpec::new("user", "users")).unwrap();
        let registry = ViewRegistry::builder(Arc::new(tree.build()))
            .bind(
                users,
                ViewBinding::new(
                    Arc::new(MemoryModel::new("User")),
                    Arc::new(MemoryAclFactory::new()),
                ),
            )
            .unwrap()
            .build();

        let view = BaseView::new(&registry, users, RequestContext::mock()).unwrap();
        assert_eq!(
            view.search_index().unwrap_err().category(),
            ramify_core::ErrorCategory::Configuration
        );
    }
}
