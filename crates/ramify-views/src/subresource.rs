//! Item-attribute views: a list attribute of the parent item served as a
//! collection of its own (`/users/{user_username}/settings`).

use ramify_core::{Entity, Fields, ViewError, ViewResult};
use serde_json::Value;

use crate::base::BaseView;

/// Body field holding the value to append.
pub const VALUE_FIELD: &str = "value";

impl BaseView<'_> {
    /// Returns the attribute's current value, or `null` when the parent
    /// does not carry it.
    pub async fn attribute_index(&self) -> ViewResult<Value> {
        let parent = self.attribute_owner().await?;
        Ok(parent
            .get(self.node.collection_name())
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Appends the body's `value` to the attribute unless it is already
    /// present, persists the parent, and returns the new attribute value.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Validation` when the body has no `value`.
    pub async fn attribute_create(&self) -> ViewResult<Value> {
        let value = self
            .request
            .body()
            .get(VALUE_FIELD)
            .cloned()
            .ok_or_else(|| ViewError::validation(format!("missing '{VALUE_FIELD}' field")))?;

        let parent = self.attribute_owner().await?;
        let name = self.node.collection_name();
        let mut items = match parent.get(name) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(single) => vec![single.clone()],
        };
        if !items.contains(&value) {
            items.push(value);
        }

        let mut fields = Fields::new();
        fields.insert(name.to_string(), Value::Array(items));
        let updated = self.model().update(parent, fields, &self.request).await?;
        Ok(updated.get(name).cloned().unwrap_or(Value::Null))
    }

    async fn attribute_owner(&self) -> ViewResult<Entity> {
        self.parent_entity(false).await?.ok_or_else(|| {
            ViewError::configuration(format!(
                "item attribute view '{}' has no bound parent",
                self.node.uid()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::{ViewBinding, ViewRegistry};
    use ramify_core::fixtures::{MemoryAclFactory, MemoryModel};
    use ramify_core::{ErrorCategory, RequestContext};
    use ramify_router::{ResourceId, ResourceSpec, ResourceTree};
    use serde_json::json;

    fn fixture() -> (ViewRegistry, ResourceId, Arc<MemoryModel>) {
        let mut tree = ResourceTree::builder();
        let users = tree
            .add(None, ResourceSpec::new("user", "users").id_field("username"))
            .unwrap();
        let settings = tree
            .add(Some(users), ResourceSpec::new("setting", "settings"))
            .unwrap();

        let users_model = Arc::new(
            MemoryModel::new("User")
                .with_pk_field("username")
                .with_rows([json!({"username": "ann", "settings": ["dark"]})]),
        );
        let registry = ViewRegistry::builder(Arc::new(tree.build()))
            .bind(
                users,
                ViewBinding::new(users_model.clone(), Arc::new(MemoryAclFactory::new())),
            )
            .unwrap()
            .bind(
                settings,
                ViewBinding::new(users_model.clone(), Arc::new(MemoryAclFactory::new()))
                    .item_attribute(),
            )
            .unwrap()
            .build();
        (registry, settings, users_model)
    }

    fn request(username: &str) -> RequestContext {
        RequestContext::new(http::Method::GET, format!("/users/{username}/settings"))
            .with_param("user_username", username)
    }

    #[tokio::test]
    async fn test_attribute_index() {
        let (registry, settings, _) = fixture();
        let view = BaseView::new(&registry, settings, request("ann")).unwrap();
        assert_eq!(view.attribute_index().await.unwrap(), json!(["dark"]));
    }

    #[tokio::test]
    async fn test_attribute_create_appends_once() {
        let (registry, settings, model) = fixture();

        let mut body = Fields::new();
        body.insert(VALUE_FIELD.to_string(), json!("compact"));
        let view =
            BaseView::new(&registry, settings, request("ann").with_body(body.clone())).unwrap();
        assert_eq!(
            view.attribute_create().await.unwrap(),
            json!(["dark", "compact"])
        );

        let view = BaseView::new(&registry, settings, request("ann").with_body(body)).unwrap();
        view.attribute_create().await.unwrap();
        assert_eq!(
            model.row("ann").unwrap().get("settings"),
            Some(&json!(["dark", "compact"]))
        );
    }

    #[tokio::test]
    async fn test_attribute_create_requires_value() {
        let (registry, settings, _) = fixture();
        let view = BaseView::new(&registry, settings, request("ann")).unwrap();
        let err = view.attribute_create().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[tokio::test]
    async fn test_item_attribute_scope_resolves_parent() {
        let (registry, settings, _) = fixture();

        let mut view = BaseView::new(&registry, settings, request("ann")).unwrap();
        assert_eq!(view.resolve_parent_collection().await.unwrap(), None);

        let mut view = BaseView::new(&registry, settings, request("ghost")).unwrap();
        assert!(view
            .resolve_parent_collection()
            .await
            .unwrap_err()
            .is_not_found());
    }
}
