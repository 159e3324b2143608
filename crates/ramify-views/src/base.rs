//! Parent-scoped resolution.
//!
//! A [`BaseView`] serves one request against one resource node. For nested
//! nodes it resolves the parent item first (through the parent's own view,
//! with a narrowed sub-request) and uses the parent's collection attribute
//! to scope every query at the current level:
//!
//! ```text
//! GET /users/user12/stories/4
//!
//!   story view ── narrowed(user_username) ──▶ user view.get_item()
//!        │                                          │
//!        │◀──────── user12.stories = [1, 3] ────────┘
//!        │
//!   lookup(4) ── not in [1, 3] ──▶ NotFound "Story(4) not found"
//! ```

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use ramify_core::{
    Collection, Entity, ItemAcl, PersistenceModel, QueryParams, RequestContext, Resolution,
    Scope, ViewError, ViewResult,
};
use ramify_router::{decompose_identifier, Depth, ResourceId, ResourceNode};
use ramify_telemetry::metrics;
use serde_json::{Map, Value};
use tracing::debug;

use crate::registry::{ViewBinding, ViewKind, ViewRegistry};

/// Rewrites every key of `kwargs` to its decomposed field name.
///
/// `{"story_id": 1}` becomes `{"id": 1}`; keys without a separator pass
/// through. When two keys collapse to the same name the later one wins.
///
/// # Example
///
/// ```rust
/// use ramify_views::resolve_kw;
/// use serde_json::json;
///
/// let kwargs = json!({"foo_bar_qoo": 1, "arg_val": 4, "q": 3});
/// let resolved = resolve_kw(kwargs.as_object().unwrap());
/// assert_eq!(serde_json::Value::Object(resolved), json!({"bar_qoo": 1, "val": 4, "q": 3}));
/// ```
#[must_use]
pub fn resolve_kw(kwargs: &Map<String, Value>) -> Map<String, Value> {
    kwargs
        .iter()
        .map(|(key, value)| (decompose_identifier(key).to_string(), value.clone()))
        .collect()
}

/// The view for one request against one resource node.
pub struct BaseView<'r> {
    pub(crate) registry: &'r ViewRegistry,
    pub(crate) node: &'r ResourceNode,
    pub(crate) binding: &'r ViewBinding,
    pub(crate) request: RequestContext,
    scope: Option<Option<Scope>>,
    pub(crate) search_scope: Option<Option<Scope>>,
}

impl<'r> BaseView<'r> {
    /// Creates the view bound to `resource`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Configuration` for a resource outside the tree
    /// and `ViewError::NotFound` when no view is bound to it.
    pub fn new(
        registry: &'r ViewRegistry,
        resource: ResourceId,
        request: RequestContext,
    ) -> ViewResult<Self> {
        let node = registry.tree().node(resource)?;
        let binding = registry.binding(resource).ok_or_else(|| {
            ViewError::not_found(format!("no view bound to resource '{}'", node.uid()))
        })?;
        Ok(Self {
            registry,
            node,
            binding,
            request,
            scope: None,
            search_scope: None,
        })
    }

    /// Returns the resource node.
    #[must_use]
    pub const fn node(&self) -> &'r ResourceNode {
        self.node
    }

    /// Returns the view binding.
    #[must_use]
    pub const fn binding(&self) -> &'r ViewBinding {
        self.binding
    }

    /// Returns the persistence model.
    #[must_use]
    pub fn model(&self) -> &'r Arc<dyn PersistenceModel> {
        self.binding.model()
    }

    /// Returns the request.
    #[must_use]
    pub const fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Consumes the view, returning its request.
    #[must_use]
    pub fn into_request(self) -> RequestContext {
        self.request
    }

    /// Returns the identifier name without its level prefix
    /// (`user_username` → `username`).
    #[must_use]
    pub fn clean_id_name(&self) -> &'r str {
        self.node.clean_id_name()
    }

    /// Returns the resource key: the request's `id_name` path parameter,
    /// or `"None"` when the request carries none.
    #[must_use]
    pub fn context_key(&self) -> String {
        self.request
            .path_params()
            .get(self.node.id_name())
            .unwrap_or("None")
            .to_string()
    }

    /// Returns the URL of `entity`'s item route.
    ///
    /// The identifier comes from the entity field named by
    /// [`clean_id_name`](Self::clean_id_name), falling back to the model's
    /// primary key.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Internal` if the entity has neither field or an
    /// ancestor parameter is missing from the request.
    pub fn location(&self, entity: &Entity) -> ViewResult<String> {
        let value = entity
            .field_string(self.clean_id_name())
            .or_else(|| entity.field_string(self.model().pk_field()))
            .ok_or_else(|| {
                ViewError::internal(format!(
                    "{} has no '{}' to build its location from",
                    entity.kind(),
                    self.clean_id_name()
                ))
            })?;

        let mut params = self.request.path_params().clone();
        params.insert(self.node.id_name(), value);
        Ok(self
            .registry
            .tree()
            .url_for(self.node.id(), Depth::Item, &params)?)
    }

    /// Resolves the parent item and returns the scope it imposes on this
    /// level, or `None` when the query is unscoped.
    ///
    /// Unscoped means: a root node, an unbound parent, an item-attribute
    /// view, or a parent lacking the collection attribute. The result is
    /// cached for the lifetime of the view.
    pub async fn resolve_parent_collection(&mut self) -> ViewResult<Option<Scope>> {
        if let Some(scope) = &self.scope {
            return Ok(scope.clone());
        }
        let scope = self.parent_scope(false).await?;
        self.scope = Some(scope.clone());
        Ok(scope)
    }

    /// Returns this level's collection, scoped by the parent when there is
    /// one. `extra` is merged into the request's query parameters first.
    pub async fn get_collection(&mut self, extra: &QueryParams) -> ViewResult<Collection> {
        self.request.merge_query(extra);
        let scope = self.resolve_parent_collection().await?;
        let model = self.model();
        let params = self.request.query_params();
        match scope {
            Some(scope) => model.filter_objects(&scope, params).await,
            None => model.get_collection(params).await,
        }
    }

    /// Returns the item addressed by the request.
    ///
    /// Looks the item up on first use, then checks it against the parent
    /// scope.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::NotFound` (`Model(key) not found`) when the item
    /// does not exist or is not a member of the parent's collection.
    pub fn get_item(&mut self) -> BoxFuture<'_, ViewResult<Entity>> {
        async move {
            if self.request.resolution().is_unresolved() {
                self.reload_context(false).await?;
            }
            let entity = self.resolved_entity()?;

            if let Some(scope) = self.resolve_parent_collection().await? {
                if !scope.contains(&entity, self.model().pk_field()) {
                    debug!(
                        resource = self.node.uid(),
                        key = %self.context_key(),
                        "item outside parent scope"
                    );
                    return Err(self.item_not_found());
                }
            }
            Ok(entity)
        }
        .boxed()
    }

    /// Looks the addressed item up through the access-control factory and
    /// records the outcome on the request.
    ///
    /// `search_index_based` reaches the factory only when it advertises
    /// search-index support.
    pub async fn reload_context(&mut self, search_index_based: bool) -> ViewResult<()> {
        let key = self.context_key();
        let acl = self.bind_acl(Some(search_index_based));

        match acl.lookup(&key).await {
            Ok(entity) => {
                self.request.set_resolution(Resolution::Resolved(entity));
                Ok(())
            }
            Err(err) => {
                if err.is_not_found() {
                    self.request.set_resolution(Resolution::NotFound(key));
                }
                Err(err)
            }
        }
    }

    /// Binds the access-control factory to this request with the item model
    /// defaulted to the view's model.
    pub(crate) fn bind_acl(&self, search_index_based: Option<bool>) -> Box<dyn ItemAcl> {
        bind_acl(self.binding, &self.request, search_index_based)
    }

    pub(crate) fn resolved_entity(&self) -> ViewResult<Entity> {
        match self.request.resolution() {
            Resolution::Resolved(entity) => Ok(entity.clone()),
            Resolution::NotFound(key) => Err(ViewError::not_found_resource(
                self.model().name(),
                key.clone(),
            )),
            Resolution::Unresolved => Err(ViewError::internal(format!(
                "item of '{}' used before lookup",
                self.node.uid()
            ))),
        }
    }

    pub(crate) fn item_not_found(&self) -> ViewError {
        ViewError::not_found_resource(self.model().name(), self.context_key())
    }

    /// Resolves the parent item through the parent's view, or returns
    /// `None` for a root node or an unbound parent.
    pub(crate) async fn parent_entity(
        &self,
        search_index_based: bool,
    ) -> ViewResult<Option<Entity>> {
        let Some(parent_id) = self.node.parent() else {
            return Ok(None);
        };
        if self.registry.binding(parent_id).is_none() {
            return Ok(None);
        }

        let parent_node = self.registry.tree().node(parent_id)?;
        let narrowed = self.request.narrowed(parent_node.id_name());
        let mut parent = BaseView::new(self.registry, parent_id, narrowed)?;

        metrics::record_parent_resolution(self.node.uid());
        debug!(
            resource = self.node.uid(),
            parent = parent_node.uid(),
            search_index_based,
            "resolving parent item"
        );

        let entity = if search_index_based {
            parent.get_item_es().await?
        } else {
            parent.get_item().await?
        };
        Ok(Some(entity))
    }

    /// Reads this node's collection attribute off the resolved parent.
    pub(crate) async fn parent_scope(&self, search_index_based: bool) -> ViewResult<Option<Scope>> {
        let Some(parent) = self.parent_entity(search_index_based).await? else {
            return Ok(None);
        };
        if self.binding.kind() == ViewKind::ItemAttribute {
            return Ok(None);
        }
        Ok(parent
            .get(self.node.collection_name())
            .and_then(Scope::from_value))
    }
}

pub(crate) fn bind_acl(
    binding: &ViewBinding,
    request: &RequestContext,
    search_index_based: Option<bool>,
) -> Box<dyn ItemAcl> {
    let factory = binding.acl();
    let flag = search_index_based.filter(|_| factory.supports_search_index());
    let mut acl = factory.bind(request, flag);
    if acl.item_model().is_none() {
        acl.set_item_model(Arc::clone(binding.model()));
    }
    acl
}

impl std::fmt::Debug for BaseView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseView")
            .field("resource", &self.node.uid())
            .field("binding", self.binding)
            .field("request_id", &self.request.request_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ramify_core::fixtures::{MemoryAclFactory, MemoryModel, ModelCall};
    use ramify_router::{ResourceSpec, ResourceTree};
    use serde_json::json;

    struct Fixture {
        registry: ViewRegistry,
        users: ResourceId,
        stories: ResourceId,
        story_model: Arc<MemoryModel>,
        story_acl: Arc<MemoryAclFactory>,
    }

    fn fixture() -> Fixture {
        let mut tree = ResourceTree::builder();
        let users = tree
            .add(None, ResourceSpec::new("user", "users").id_field("username"))
            .unwrap();
        let stories = tree
            .add(Some(users), ResourceSpec::new("story", "stories"))
            .unwrap();

        let user_model = Arc::new(
            MemoryModel::new("User")
                .with_pk_field("username")
                .with_rows([json!({"username": "user12", "stories": [1, 3]})]),
        );
        let story_model = Arc::new(MemoryModel::new("Story").with_rows([
            json!({"id": 1}),
            json!({"id": 3}),
            json!({"id": 4}),
        ]));
        let story_acl = Arc::new(MemoryAclFactory::new());

        let registry = ViewRegistry::builder(Arc::new(tree.build()))
            .bind(
                users,
                ViewBinding::new(user_model, Arc::new(MemoryAclFactory::new())),
            )
            .unwrap()
            .bind(
                stories,
                ViewBinding::new(story_model.clone(), story_acl.clone()),
            )
            .unwrap()
            .build();

        Fixture {
            registry,
            users,
            stories,
            story_model,
            story_acl,
        }
    }

    fn story_request(id: &str) -> RequestContext {
        RequestContext::new(http::Method::GET, format!("/users/user12/stories/{id}"))
            .with_param("user_username", "user12")
            .with_param("story_id", id)
    }

    #[test]
    fn test_resolve_kw() {
        let kwargs = json!({"foo_bar_qoo": 1, "arg_val": 4, "q": 3});
        let resolved = resolve_kw(kwargs.as_object().unwrap());
        assert_eq!(resolved.get("bar_qoo"), Some(&json!(1)));
        assert_eq!(resolved.get("val"), Some(&json!(4)));
        assert_eq!(resolved.get("q"), Some(&json!(3)));
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn test_clean_id_name_and_context_key() {
        let f = fixture();
        let view = BaseView::new(&f.registry, f.users, RequestContext::mock()).unwrap();
        assert_eq!(view.clean_id_name(), "username");
        assert_eq!(view.context_key(), "None");

        let view = BaseView::new(&f.registry, f.stories, story_request("3")).unwrap();
        assert_eq!(view.clean_id_name(), "id");
        assert_eq!(view.context_key(), "3");
    }

    #[test]
    fn test_location() {
        let f = fixture();
        let view = BaseView::new(&f.registry, f.stories, story_request("3")).unwrap();
        let story = Entity::from_value("Story", json!({"id": 9})).unwrap();
        assert_eq!(view.location(&story).unwrap(), "/users/user12/stories/9");

        let orphan = Entity::from_value("Story", json!({"title": "x"})).unwrap();
        assert!(view.location(&orphan).is_err());
    }

    #[tokio::test]
    async fn test_get_item_in_scope() {
        let f = fixture();
        let mut view = BaseView::new(&f.registry, f.stories, story_request("3")).unwrap();
        let story = view.get_item().await.unwrap();
        assert_eq!(story.field_string("id").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_get_item_outside_scope() {
        let f = fixture();
        let mut view = BaseView::new(&f.registry, f.stories, story_request("4")).unwrap();
        let err = view.get_item().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Story(4) not found"));
    }

    #[tokio::test]
    async fn test_get_item_twice_single_lookup() {
        let f = fixture();
        let mut view = BaseView::new(&f.registry, f.stories, story_request("1")).unwrap();
        let first = view.get_item().await.unwrap();
        let second = view.get_item().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(f.story_acl.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_remembered() {
        let f = fixture();
        let mut view = BaseView::new(&f.registry, f.stories, story_request("77")).unwrap();
        assert!(view.get_item().await.unwrap_err().is_not_found());
        assert_eq!(
            view.request().resolution(),
            &Resolution::NotFound("77".to_string())
        );
        assert!(view.get_item().await.unwrap_err().is_not_found());
        assert_eq!(f.story_acl.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_get_collection_scoped() {
        let f = fixture();
        let request = RequestContext::new(http::Method::GET, "/users/user12/stories")
            .with_param("user_username", "user12");
        let mut view = BaseView::new(&f.registry, f.stories, request).unwrap();

        let page = view.get_collection(&QueryParams::new()).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(matches!(
            f.story_model.calls().last(),
            Some(ModelCall::FilterObjects { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let f = fixture();
        let request = RequestContext::new(http::Method::GET, "/users/ghost/stories")
            .with_param("user_username", "ghost");
        let mut view = BaseView::new(&f.registry, f.stories, request).unwrap();

        let err = view.get_collection(&QueryParams::new()).await.unwrap_err();
        assert!(err.to_string().contains("User(ghost) not found"));
        assert!(f.story_model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_root_collection_unscoped() {
        let f = fixture();
        let mut view = BaseView::new(&f.registry, f.users, RequestContext::mock()).unwrap();
        assert_eq!(view.resolve_parent_collection().await.unwrap(), None);
        let page = view.get_collection(&QueryParams::new()).await.unwrap();
        assert_eq!(page.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_clean_id_name_follows_first_separator(
            member in "[a-z]{1,8}",
            field in "[a-z][a-z_]{0,10}",
        ) {
            let mut tree = ResourceTree::builder();
            let id = tree
                .add(None, ResourceSpec::new(member.clone(), format!("{member}s")).id_field(&field))
                .unwrap();
            let registry = ViewRegistry::builder(Arc::new(tree.build()))
                .bind(id, ViewBinding::new(
                    Arc::new(MemoryModel::new("M")),
                    Arc::new(MemoryAclFactory::new()),
                ))
                .unwrap()
                .build();

            let view = BaseView::new(&registry, id, RequestContext::mock()).unwrap();
            prop_assert_eq!(view.clean_id_name(), field.as_str());
        }
    }
}
