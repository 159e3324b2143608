//! View bindings and the immutable view registry.
//!
//! Every resource node that should answer requests gets a [`ViewBinding`]:
//! the persistence model, the access-control factory, optionally a search
//! index, and the kind of view. The [`ViewRegistry`] maps resource ids to
//! bindings and entity type names to resource ids. It is built once at
//! startup and shared read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use ramify_config::{RamifyConfig, SearchIndexConfig, ViewSettings};
use ramify_core::{AclFactory, PersistenceModel, SearchIndex, ViewError, ViewResult};
use ramify_router::{ResourceId, ResourceTree};

/// How a bound resource serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewKind {
    /// Plain CRUD against the primary store.
    #[default]
    Collection,
    /// Reads (`index`, `show`) go through the search index; writes go to
    /// the primary store.
    SearchIndexed,
    /// Exposes a list attribute of the parent item. The binding's model is
    /// the parent's model.
    ItemAttribute,
}

/// Everything a view needs for one resource node.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use ramify_core::fixtures::{MemoryAclFactory, MemoryModel};
/// use ramify_views::{ViewBinding, ViewKind};
///
/// let binding = ViewBinding::new(
///     Arc::new(MemoryModel::new("Story")),
///     Arc::new(MemoryAclFactory::new()),
/// )
/// .with_object_acl();
///
/// assert_eq!(binding.kind(), ViewKind::Collection);
/// assert!(binding.object_acl());
/// ```
#[derive(Clone)]
pub struct ViewBinding {
    model: Arc<dyn PersistenceModel>,
    acl: Arc<dyn AclFactory>,
    index: Option<Arc<dyn SearchIndex>>,
    kind: ViewKind,
    object_acl: bool,
}

impl ViewBinding {
    /// Creates a [`ViewKind::Collection`] binding.
    pub fn new(model: Arc<dyn PersistenceModel>, acl: Arc<dyn AclFactory>) -> Self {
        Self {
            model,
            acl,
            index: None,
            kind: ViewKind::Collection,
            object_acl: false,
        }
    }

    /// Serves reads from `index`.
    #[must_use]
    pub fn search_indexed(mut self, index: Arc<dyn SearchIndex>) -> Self {
        self.index = Some(index);
        self.kind = ViewKind::SearchIndexed;
        self
    }

    /// Turns the binding into an item-attribute view.
    #[must_use]
    pub fn item_attribute(mut self) -> Self {
        self.kind = ViewKind::ItemAttribute;
        self
    }

    /// Assigns a generated ACL to created items that carry none.
    #[must_use]
    pub fn with_object_acl(mut self) -> Self {
        self.object_acl = true;
        self
    }

    /// Returns the persistence model.
    #[must_use]
    pub fn model(&self) -> &Arc<dyn PersistenceModel> {
        &self.model
    }

    /// Returns the access-control factory.
    #[must_use]
    pub fn acl(&self) -> &Arc<dyn AclFactory> {
        &self.acl
    }

    /// Returns the search index, if any.
    #[must_use]
    pub fn index(&self) -> Option<&Arc<dyn SearchIndex>> {
        self.index.as_ref()
    }

    /// Returns the view kind.
    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Returns whether created items get a generated ACL.
    #[must_use]
    pub const fn object_acl(&self) -> bool {
        self.object_acl
    }
}

impl std::fmt::Debug for ViewBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewBinding")
            .field("model", &self.model.name())
            .field("index", &self.index.as_ref().map(|i| i.name().to_string()))
            .field("kind", &self.kind)
            .field("object_acl", &self.object_acl)
            .finish_non_exhaustive()
    }
}

/// Immutable lookup table from resource nodes to view bindings.
#[derive(Debug)]
pub struct ViewRegistry {
    tree: Arc<ResourceTree>,
    bindings: IndexMap<ResourceId, ViewBinding>,
    by_type: HashMap<String, ResourceId>,
    settings: ViewSettings,
    search: SearchIndexConfig,
}

impl ViewRegistry {
    /// Starts a registry over `tree`.
    #[must_use]
    pub fn builder(tree: Arc<ResourceTree>) -> ViewRegistryBuilder {
        ViewRegistryBuilder {
            registry: Self {
                tree,
                bindings: IndexMap::new(),
                by_type: HashMap::new(),
                settings: ViewSettings::default(),
                search: SearchIndexConfig::default(),
            },
        }
    }

    /// Returns the resource tree.
    #[must_use]
    pub fn tree(&self) -> &ResourceTree {
        &self.tree
    }

    /// Returns the binding of a resource.
    #[must_use]
    pub fn binding(&self, resource: ResourceId) -> Option<&ViewBinding> {
        self.bindings.get(&resource)
    }

    /// Returns the resource that owns an entity type name.
    #[must_use]
    pub fn resource_for_type(&self, type_name: &str) -> Option<ResourceId> {
        self.by_type.get(type_name).copied()
    }

    /// Returns the bound resources in binding order.
    pub fn bound_resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.bindings.keys().copied()
    }

    /// Returns the view settings.
    #[must_use]
    pub const fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    /// Returns the search index settings.
    #[must_use]
    pub const fn search_config(&self) -> &SearchIndexConfig {
        &self.search
    }
}

/// Builder for [`ViewRegistry`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use ramify_core::fixtures::{MemoryAclFactory, MemoryModel};
/// use ramify_router::{ResourceSpec, ResourceTree};
/// use ramify_views::{ViewBinding, ViewRegistry};
///
/// let mut tree = ResourceTree::builder();
/// let users = tree.add(None, ResourceSpec::new("user", "users")).unwrap();
/// let tree = Arc::new(tree.build());
///
/// let registry = ViewRegistry::builder(tree)
///     .bind(users, ViewBinding::new(
///         Arc::new(MemoryModel::new("User")),
///         Arc::new(MemoryAclFactory::new()),
///     ))
///     .unwrap()
///     .build();
///
/// assert_eq!(registry.resource_for_type("User"), Some(users));
/// ```
#[derive(Debug)]
pub struct ViewRegistryBuilder {
    registry: ViewRegistry,
}

impl ViewRegistryBuilder {
    /// Binds a view to a resource.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Configuration` if the resource is not part of the
    /// tree or already bound.
    pub fn bind(mut self, resource: ResourceId, binding: ViewBinding) -> ViewResult<Self> {
        let uid = self.registry.tree.node(resource)?.uid().to_string();
        if self.registry.bindings.contains_key(&resource) {
            return Err(ViewError::configuration(format!(
                "resource '{uid}' is already bound"
            )));
        }

        self.registry
            .by_type
            .entry(binding.model().name().to_string())
            .or_insert(resource);
        self.registry.bindings.insert(resource, binding);
        Ok(self)
    }

    /// Binds a view to the resource with the given uid.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Configuration` if no resource has that uid or it
    /// is already bound.
    pub fn bind_uid(self, uid: &str, binding: ViewBinding) -> ViewResult<Self> {
        let resource = self
            .registry
            .tree
            .find(uid)
            .map(ramify_router::ResourceNode::id)
            .ok_or_else(|| ViewError::configuration(format!("unknown resource '{uid}'")))?;
        self.bind(resource, binding)
    }

    /// Sets the view settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ViewSettings) -> Self {
        self.registry.settings = settings;
        self
    }

    /// Sets the search index settings.
    #[must_use]
    pub fn with_search_config(mut self, search: SearchIndexConfig) -> Self {
        self.registry.search = search;
        self
    }

    /// Applies the view and search index sections of a loaded configuration.
    #[must_use]
    pub fn with_config(self, config: &RamifyConfig) -> Self {
        self.with_settings(config.views.clone())
            .with_search_config(config.search_index.clone())
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> ViewRegistry {
        self.registry
    }
}
