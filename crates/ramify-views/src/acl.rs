//! Default access-control descriptors for new items and principals.

use std::sync::Arc;

use ramify_core::{
    AclSubject, Entity, Fields, PersistenceModel, RequestContext, ViewResult, ACL_FIELD,
};
use tracing::debug;

use crate::base::{bind_acl, BaseView};
use crate::registry::ViewRegistry;

impl BaseView<'_> {
    /// Stores a generated ACL on a new item.
    ///
    /// Does nothing unless the binding opted in with
    /// [`ViewBinding::with_object_acl`](crate::ViewBinding::with_object_acl),
    /// and never replaces a non-empty descriptor.
    pub fn set_object_acl(&self, entity: &mut Entity) {
        if !self.binding.object_acl() || entity.has_acl() {
            return;
        }
        let acl = self
            .bind_acl(None)
            .generate_item_acl(AclSubject::Entity(entity));
        entity.set_acl(acl.stringify());
    }
}

/// Gives a newly registered principal its default ACL.
///
/// The principal's entity type is looked up in the registry's type table.
/// When a view owns the type and the principal has no descriptor yet, the
/// factory's principal ACL is generated and persisted through
/// `model.update`. Otherwise the principal is returned unchanged.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use ramify_core::fixtures::{MemoryAclFactory, MemoryModel};
/// use ramify_core::{PersistenceModel, RequestContext};
/// use ramify_router::{ResourceSpec, ResourceTree};
/// use ramify_views::{assign_principal_acl, ViewBinding, ViewRegistry};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let mut tree = ResourceTree::builder();
/// let users = tree.add(None, ResourceSpec::new("user", "users").id_field("username")).unwrap();
/// let model: Arc<dyn PersistenceModel> = Arc::new(
///     MemoryModel::new("User")
///         .with_pk_field("username")
///         .with_rows([json!({"username": "ann"})]),
/// );
/// let registry = ViewRegistry::builder(Arc::new(tree.build()))
///     .bind(users, ViewBinding::new(model.clone(), Arc::new(MemoryAclFactory::new())))
///     .unwrap()
///     .build();
///
/// let ann = model.get_item("ann").await.unwrap();
/// let ann = assign_principal_acl(&registry, &RequestContext::mock(), &model, ann)
///     .await
///     .unwrap();
/// assert!(ann.has_acl());
/// # });
/// ```
pub async fn assign_principal_acl(
    registry: &ViewRegistry,
    request: &RequestContext,
    model: &Arc<dyn PersistenceModel>,
    principal: Entity,
) -> ViewResult<Entity> {
    if principal.has_acl() {
        return Ok(principal);
    }
    let Some(binding) = registry
        .resource_for_type(principal.kind())
        .and_then(|resource| registry.binding(resource))
    else {
        debug!(kind = principal.kind(), "no view owns principal type");
        return Ok(principal);
    };

    let acl = bind_acl(binding, request, None).generate_item_acl(AclSubject::Principal(&principal));
    let mut fields = Fields::new();
    fields.insert(ACL_FIELD.to_string(), acl.stringify());
    model.update(principal, fields, request).await
}
