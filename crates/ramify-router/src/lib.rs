//! Resource tree and method tables for Ramify.
//!
//! This crate describes *where* a request lands:
//!
//! - [`ResourceTree`] - the static, nested collection/item hierarchy
//! - [`ResourceTree::match_path`] - binds a URL path to a node and depth
//! - [`Params`] - identifier values captured from the path
//! - [`ActionTable`] - HTTP method to [`ViewAction`] per [`Depth`]
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use ramify_router::{ActionTable, ResourceSpec, ResourceTree, ViewAction};
//!
//! let mut builder = ResourceTree::builder();
//! let users = builder.add(None, ResourceSpec::new("user", "users").id_field("username")).unwrap();
//! builder.add(Some(users), ResourceSpec::new("story", "stories")).unwrap();
//! let tree = builder.build();
//!
//! let matched = tree.match_path("/users/user12/stories").unwrap();
//! let action = ActionTable::for_depth(matched.depth).action_for(&Method::PATCH);
//! assert_eq!(action, Some(ViewAction::UpdateMany));
//! ```
//!
//! # Architecture
//!
//! ```text
//!          (roots)
//!             │
//!          "users"  ── {user_username}
//!             │
//!         "stories" ── {story_id}
//! ```

mod action;
mod error;
mod matcher;
mod params;
mod resource;

pub use action::{ActionTable, Depth, ViewAction};
pub use error::RouterError;
pub use matcher::ResourceMatch;
pub use params::{decompose_identifier, Params, IDENTIFIER_SEPARATOR};
pub use resource::{ResourceId, ResourceNode, ResourceSpec, ResourceTree, ResourceTreeBuilder};

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_match_and_dispatch_table() {
        let mut builder = ResourceTree::builder();
        let users = builder.add(None, ResourceSpec::new("user", "users")).unwrap();
        let tree = builder.build();

        let m = tree.match_path("/users/7").unwrap();
        assert_eq!(m.resource, users);
        let table = ActionTable::for_depth(m.depth);
        assert_eq!(table.action_for(&Method::DELETE), Some(ViewAction::Delete));
        assert_eq!(table.action_for(&Method::GET), Some(ViewAction::Show));
    }
}
