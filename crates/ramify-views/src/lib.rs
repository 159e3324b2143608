//! Parent-scoped resource views for Ramify.
//!
//! A request against `/users/user12/stories/4` is served by the view bound
//! to the `stories` node. Before touching stories, that view resolves
//! `user12` through the `users` view and restricts every query to the
//! members of `user12.stories`. Story 4 can exist in the store and still be
//! "not found" under `user12`.
//!
//! # Components
//!
//! - [`ViewRegistry`] - immutable resource-to-binding table, built at startup
//! - [`BaseView`] - parent resolution, scoped collection and item lookup
//! - [`CollectionView`] - the CRUD actions behind each HTTP method
//! - [`assign_principal_acl`] / [`BaseView::set_object_acl`] - default ACLs
//! - [`BaseView::get_collection_es`] / [`BaseView::get_item_es`] - the
//!   search-index read path
//! - [`Dispatcher`] - path matching, method table, span and metrics per
//!   request
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::Method;
//! use ramify_core::fixtures::{MemoryAclFactory, MemoryModel};
//! use ramify_core::RequestContext;
//! use ramify_router::{ResourceSpec, ResourceTree};
//! use ramify_views::{Dispatcher, ViewBinding, ViewRegistry};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mut tree = ResourceTree::builder();
//! let users = tree.add(None, ResourceSpec::new("user", "users").id_field("username")).unwrap();
//! let stories = tree.add(Some(users), ResourceSpec::new("story", "stories")).unwrap();
//!
//! let registry = ViewRegistry::builder(Arc::new(tree.build()))
//!     .bind(users, ViewBinding::new(
//!         Arc::new(MemoryModel::new("User")
//!             .with_pk_field("username")
//!             .with_rows([json!({"username": "user12", "stories": [1, 3]})])),
//!         Arc::new(MemoryAclFactory::new()),
//!     ))
//!     .unwrap()
//!     .bind(stories, ViewBinding::new(
//!         Arc::new(MemoryModel::new("Story")
//!             .with_rows([json!({"id": 1}), json!({"id": 3}), json!({"id": 4})])),
//!         Arc::new(MemoryAclFactory::new()),
//!     ))
//!     .unwrap()
//!     .build();
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//! let err = dispatcher
//!     .dispatch(RequestContext::new(Method::GET, "/users/user12/stories/4"))
//!     .await
//!     .unwrap_err();
//! assert!(err.is_not_found());
//! assert!(err.to_string().ends_with("Story(4) not found"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/ramify-views/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod acl;
mod base;
mod collection;
mod dispatch;
mod registry;
mod search;
mod subresource;

pub use acl::assign_principal_acl;
pub use base::{resolve_kw, BaseView};
pub use collection::{action_table, CollectionView, ViewOutput};
pub use dispatch::Dispatcher;
pub use registry::{ViewBinding, ViewKind, ViewRegistry, ViewRegistryBuilder};
pub use subresource::VALUE_FIELD;
