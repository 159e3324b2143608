//! HTTP method to view-action tables.
//!
//! A request addresses either a collection (`/users`) or a single item
//! (`/users/{users_id}`). [`ActionTable`] maps each HTTP method to the view
//! action for one of those depths.

use std::fmt;

use http::Method;
use serde::{Deserialize, Serialize};

/// Whether a request addresses a collection or one item of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// `/stories`
    Collection,
    /// `/stories/{stories_id}`
    Item,
}

/// An operation a view can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewAction {
    /// List the collection.
    Index,
    /// Fetch one item.
    Show,
    /// Create a new item.
    Create,
    /// Full replace of one item.
    Replace,
    /// Partial update of one item.
    Update,
    /// Delete one item.
    Delete,
    /// Bulk update of the collection.
    UpdateMany,
    /// Bulk delete of the collection.
    DeleteMany,
    /// Introspection of the collection route.
    CollectionOptions,
    /// Introspection of the item route.
    ItemOptions,
}

impl ViewAction {
    /// Returns the snake_case action name used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Show => "show",
            Self::Create => "create",
            Self::Replace => "replace",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::UpdateMany => "update_many",
            Self::DeleteMany => "delete_many",
            Self::CollectionOptions => "collection_options",
            Self::ItemOptions => "item_options",
        }
    }

    /// Returns true for actions that never write.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::Index | Self::Show | Self::CollectionOptions | Self::ItemOptions
        )
    }
}

impl fmt::Display for ViewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps HTTP methods to view actions for a single depth.
///
/// # Example
///
/// ```rust
/// use ramify_router::{ActionTable, Depth, ViewAction};
/// use http::Method;
///
/// let table = ActionTable::for_depth(Depth::Item);
///
/// assert_eq!(table.action_for(&Method::PUT), Some(ViewAction::Replace));
/// assert_eq!(table.action_for(&Method::PATCH), Some(ViewAction::Update));
/// assert_eq!(table.action_for(&Method::TRACE), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTable {
    get: Option<ViewAction>,
    head: Option<ViewAction>,
    post: Option<ViewAction>,
    put: Option<ViewAction>,
    patch: Option<ViewAction>,
    delete: Option<ViewAction>,
    options: Option<ViewAction>,
}

impl ActionTable {
    /// Creates a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard collection-level table.
    #[must_use]
    pub fn collection() -> Self {
        Self::new()
            .get(ViewAction::Index)
            .head(ViewAction::Index)
            .post(ViewAction::Create)
            .put(ViewAction::UpdateMany)
            .patch(ViewAction::UpdateMany)
            .delete(ViewAction::DeleteMany)
            .options(ViewAction::CollectionOptions)
    }

    /// The standard item-level table.
    #[must_use]
    pub fn item() -> Self {
        Self::new()
            .get(ViewAction::Show)
            .head(ViewAction::Show)
            .post(ViewAction::Create)
            .put(ViewAction::Replace)
            .patch(ViewAction::Update)
            .delete(ViewAction::Delete)
            .options(ViewAction::ItemOptions)
    }

    /// The standard table for a depth.
    #[must_use]
    pub fn for_depth(depth: Depth) -> Self {
        match depth {
            Depth::Collection => Self::collection(),
            Depth::Item => Self::item(),
        }
    }

    /// Registers the GET action.
    #[must_use]
    pub fn get(mut self, action: ViewAction) -> Self {
        self.get = Some(action);
        self
    }

    /// Registers the HEAD action.
    #[must_use]
    pub fn head(mut self, action: ViewAction) -> Self {
        self.head = Some(action);
        self
    }

    /// Registers the POST action.
    #[must_use]
    pub fn post(mut self, action: ViewAction) -> Self {
        self.post = Some(action);
        self
    }

    /// Registers the PUT action.
    #[must_use]
    pub fn put(mut self, action: ViewAction) -> Self {
        self.put = Some(action);
        self
    }

    /// Registers the PATCH action.
    #[must_use]
    pub fn patch(mut self, action: ViewAction) -> Self {
        self.patch = Some(action);
        self
    }

    /// Registers the DELETE action.
    #[must_use]
    pub fn delete(mut self, action: ViewAction) -> Self {
        self.delete = Some(action);
        self
    }

    /// Registers the OPTIONS action.
    #[must_use]
    pub fn options(mut self, action: ViewAction) -> Self {
        self.options = Some(action);
        self
    }

    /// Removes the action registered for a method.
    #[must_use]
    pub fn without(mut self, method: &Method) -> Self {
        if let Some(slot) = self.slot_mut(method) {
            *slot = None;
        }
        self
    }

    /// Returns the action for a given HTTP method.
    #[must_use]
    pub fn action_for(&self, method: &Method) -> Option<ViewAction> {
        match *method {
            Method::GET => self.get,
            Method::HEAD => self.head,
            Method::POST => self.post,
            Method::PUT => self.put,
            Method::PATCH => self.patch,
            Method::DELETE => self.delete,
            Method::OPTIONS => self.options,
            _ => None,
        }
    }

    /// Returns the methods with a registered action, in table order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        [
            (Method::GET, self.get),
            (Method::HEAD, self.head),
            (Method::POST, self.post),
            (Method::PUT, self.put),
            (Method::PATCH, self.patch),
            (Method::DELETE, self.delete),
            (Method::OPTIONS, self.options),
        ]
        .into_iter()
        .filter_map(|(method, action)| action.map(|_| method))
        .collect()
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<ViewAction>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::HEAD => Some(&mut self.head),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::PATCH => Some(&mut self.patch),
            Method::DELETE => Some(&mut self.delete),
            Method::OPTIONS => Some(&mut self.options),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_table() {
        let table = ActionTable::collection();
        assert_eq!(table.action_for(&Method::GET), Some(ViewAction::Index));
        assert_eq!(table.action_for(&Method::HEAD), Some(ViewAction::Index));
        assert_eq!(table.action_for(&Method::POST), Some(ViewAction::Create));
        assert_eq!(table.action_for(&Method::PUT), Some(ViewAction::UpdateMany));
        assert_eq!(table.action_for(&Method::PATCH), Some(ViewAction::UpdateMany));
        assert_eq!(table.action_for(&Method::DELETE), Some(ViewAction::DeleteMany));
        assert_eq!(
            table.action_for(&Method::OPTIONS),
            Some(ViewAction::CollectionOptions)
        );
    }

    #[test]
    fn test_item_table() {
        let table = ActionTable::item();
        assert_eq!(table.action_for(&Method::GET), Some(ViewAction::Show));
        assert_eq!(table.action_for(&Method::HEAD), Some(ViewAction::Show));
        assert_eq!(table.action_for(&Method::POST), Some(ViewAction::Create));
        assert_eq!(table.action_for(&Method::PUT), Some(ViewAction::Replace));
        assert_eq!(table.action_for(&Method::PATCH), Some(ViewAction::Update));
        assert_eq!(table.action_for(&Method::DELETE), Some(ViewAction::Delete));
        assert_eq!(
            table.action_for(&Method::OPTIONS),
            Some(ViewAction::ItemOptions)
        );
    }

    #[test]
    fn test_unknown_methods_unmapped() {
        let table = ActionTable::item();
        assert_eq!(table.action_for(&Method::TRACE), None);
        assert_eq!(table.action_for(&Method::CONNECT), None);
    }

    #[test]
    fn test_empty_table() {
        let table = ActionTable::new();
        assert!(table.allowed_methods().is_empty());
        assert_eq!(table.action_for(&Method::GET), None);
    }

    #[test]
    fn test_allowed_methods_order() {
        let allowed = ActionTable::collection().allowed_methods();
        assert_eq!(
            allowed,
            vec![
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ]
        );
    }

    #[test]
    fn test_without_removes_method() {
        let table = ActionTable::collection().without(&Method::DELETE);
        assert_eq!(table.action_for(&Method::DELETE), None);
        assert!(!table.allowed_methods().contains(&Method::DELETE));
        assert_eq!(table.action_for(&Method::GET), Some(ViewAction::Index));
    }

    #[test]
    fn test_action_names() {
        assert_eq!(ViewAction::UpdateMany.to_string(), "update_many");
        assert_eq!(ViewAction::ItemOptions.as_str(), "item_options");
        assert!(ViewAction::Show.is_read_only());
        assert!(!ViewAction::DeleteMany.is_read_only());
    }
}
