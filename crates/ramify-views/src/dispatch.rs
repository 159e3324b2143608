//! Request dispatch.
//!
//! Matches the request path against the resource tree, picks the action
//! for the method and depth, and runs it on a fresh [`CollectionView`].

use std::sync::Arc;

use ramify_core::{RequestContext, ViewError, ViewResult};
use ramify_router::{Depth, ResourceId};
use ramify_telemetry::metrics;
use tracing::{info, warn, Instrument};

use crate::base::BaseView;
use crate::collection::{action_table, CollectionView, ViewOutput};
use crate::registry::ViewRegistry;

/// Routes requests to bound views.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use http::Method;
/// use ramify_core::fixtures::{MemoryAclFactory, MemoryModel};
/// use ramify_core::RequestContext;
/// use ramify_router::{ResourceSpec, ResourceTree};
/// use ramify_views::{Dispatcher, ViewBinding, ViewOutput, ViewRegistry};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let mut tree = ResourceTree::builder();
/// let users = tree.add(None, ResourceSpec::new("user", "users")).unwrap();
/// let registry = ViewRegistry::builder(Arc::new(tree.build()))
///     .bind(users, ViewBinding::new(
///         Arc::new(MemoryModel::new("User").with_rows([json!({"id": 1})])),
///         Arc::new(MemoryAclFactory::new()),
///     ))
///     .unwrap()
///     .build();
///
/// let dispatcher = Dispatcher::new(Arc::new(registry));
/// let output = dispatcher
///     .dispatch(RequestContext::new(Method::GET, "/users/1"))
///     .await
///     .unwrap();
/// assert!(matches!(output, ViewOutput::Item(_)));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ViewRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a registry.
    #[must_use]
    pub fn new(registry: Arc<ViewRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Matches the request path and runs the bound view.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::NotFound` for paths outside the tree, plus
    /// whatever [`dispatch_bound`](Self::dispatch_bound) returns.
    pub async fn dispatch(&self, mut request: RequestContext) -> ViewResult<ViewOutput> {
        let Some(matched) = self.registry.tree().match_path(request.path()) else {
            warn!(
                request_id = %request.request_id(),
                http.path = request.path(),
                "no resource matches path"
            );
            return Err(ViewError::not_found(format!(
                "no resource matches '{}'",
                request.path()
            )));
        };
        request.set_path_params(matched.params);
        self.dispatch_bound(matched.resource, matched.depth, request)
            .await
    }

    /// Runs the view bound to `resource` for a request whose path
    /// parameters are already set.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::NotFound` if no view is bound to the resource,
    /// `ViewError::MethodNotAllowed` if the method has no action at this
    /// depth, and otherwise the action's own error.
    pub async fn dispatch_bound(
        &self,
        resource: ResourceId,
        depth: Depth,
        request: RequestContext,
    ) -> ViewResult<ViewOutput> {
        let request = request.with_page_limit(self.registry.settings().default_limit);
        let base = BaseView::new(&self.registry, resource, request)?;

        let table = action_table(base.binding().kind(), depth);
        let Some(action) = table.action_for(base.request().method()) else {
            return Err(ViewError::method_not_allowed(
                base.request().method(),
                &table.allowed_methods(),
            ));
        };

        let span = tracing::info_span!(
            "dispatch",
            request_id = %base.request().request_id(),
            resource = base.node().uid(),
            action = action.as_str(),
            caller = %base.request().identity().log_id(),
        );
        let started = base.request().elapsed();

        let mut view = CollectionView::new(base);
        let result = view.run(action).instrument(span.clone()).await;

        let duration = view.base().request().elapsed().saturating_sub(started);
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.category().as_str(),
        };
        metrics::record_dispatch(action.as_str(), outcome, duration);
        span.in_scope(|| {
            info!(
                outcome,
                duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "dispatch finished"
            );
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ViewBinding;
    use http::Method;
    use ramify_core::fixtures::{MemoryAclFactory, MemoryModel};
    use ramify_core::{ErrorCategory, LIMIT_PARAM};
    use ramify_router::{ResourceSpec, ResourceTree};
    use serde_json::json;

    fn dispatcher() -> (Dispatcher, Arc<MemoryModel>) {
        let mut tree = ResourceTree::builder();
        let users = tree.add(None, ResourceSpec::new("user", "users")).unwrap();
        tree.add(Some(users), ResourceSpec::new("story", "stories"))
            .unwrap();

        let model = Arc::new(MemoryModel::new("User").with_rows([json!({"id": 1})]));
        let registry = ViewRegistry::builder(Arc::new(tree.build()))
            .bind(
                users,
                ViewBinding::new(model.clone(), Arc::new(MemoryAclFactory::new())),
            )
            .unwrap()
            .with_settings(ramify_config::ViewSettings {
                default_limit: 5,
                ..Default::default()
            })
            .build();
        (Dispatcher::new(Arc::new(registry)), model)
    }

    #[tokio::test]
    async fn test_unmatched_path() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .dispatch(RequestContext::new(Method::GET, "/posts"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unbound_resource() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .dispatch(RequestContext::new(Method::GET, "/users/1/stories"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .dispatch(RequestContext::new(Method::TRACE, "/users"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MethodNotAllowed);
        assert_eq!(err.status_code(), http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_default_limit_applied() {
        let (dispatcher, model) = dispatcher();
        dispatcher
            .dispatch(RequestContext::new(Method::GET, "/users"))
            .await
            .unwrap();
        let calls = model.calls();
        let ramify_core::fixtures::ModelCall::GetCollection(params) = &calls[0] else {
            panic!("expected an unscoped collection query");
        };
        assert_eq!(params[LIMIT_PARAM], json!(5));
    }

    #[tokio::test]
    async fn test_client_limit_survives_configured_default() {
        let (dispatcher, model) = dispatcher();
        dispatcher
            .dispatch(
                RequestContext::new(Method::GET, "/users").with_query_param(LIMIT_PARAM, json!(20)),
            )
            .await
            .unwrap();
        let calls = model.calls();
        let ramify_core::fixtures::ModelCall::GetCollection(params) = &calls[0] else {
            panic!("expected an unscoped collection query");
        };
        assert_eq!(params[LIMIT_PARAM], json!(20));
    }
}
