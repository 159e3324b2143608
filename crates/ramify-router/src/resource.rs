//! The static resource tree.
//!
//! Each [`ResourceNode`] describes one collection/item pair. Nodes live in
//! an arena owned by [`ResourceTree`] and refer to their parent by
//! [`ResourceId`]. A parent must exist before a child can be added, so the
//! tree is acyclic by construction, and it cannot be modified once
//! [`ResourceTreeBuilder::build`] has run.

use std::fmt;

use crate::action::Depth;
use crate::error::RouterError;
use crate::params::{decompose_identifier, Params, IDENTIFIER_SEPARATOR};

/// Index of a node within its [`ResourceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Declaration of a resource, passed to the builder.
///
/// # Example
///
/// ```rust
/// use ramify_router::ResourceSpec;
///
/// let spec = ResourceSpec::new("user", "users").id_field("username");
/// assert_eq!(spec.id_name(), "user_username");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    member_name: String,
    collection_name: String,
    id_name: String,
}

impl ResourceSpec {
    /// Declares a resource with the default identifier `<member>_id`.
    #[must_use]
    pub fn new(member_name: impl Into<String>, collection_name: impl Into<String>) -> Self {
        let member_name = member_name.into();
        let id_name = format!("{member_name}{IDENTIFIER_SEPARATOR}id");
        Self {
            member_name,
            collection_name: collection_name.into(),
            id_name,
        }
    }

    /// Uses `<member>_<field>` as the identifier name.
    #[must_use]
    pub fn id_field(mut self, field: &str) -> Self {
        self.id_name = format!("{}{IDENTIFIER_SEPARATOR}{field}", self.member_name);
        self
    }

    /// Uses the given identifier name verbatim.
    #[must_use]
    pub fn with_id_name(mut self, id_name: impl Into<String>) -> Self {
        self.id_name = id_name.into();
        self
    }

    /// Returns the identifier name.
    #[must_use]
    pub fn id_name(&self) -> &str {
        &self.id_name
    }
}

/// One entry in the resource tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    id: ResourceId,
    uid: String,
    member_name: String,
    collection_name: String,
    id_name: String,
    parent: Option<ResourceId>,
    children: Vec<ResourceId>,
}

impl ResourceNode {
    /// Returns this node's id.
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// Returns the unique name (`user:story`).
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns the singular name.
    #[must_use]
    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    /// Returns the plural name, which is both the path segment and the
    /// attribute read off a parent entity.
    #[must_use]
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Returns the (possibly compound) identifier name.
    #[must_use]
    pub fn id_name(&self) -> &str {
        &self.id_name
    }

    /// Returns the identifier name without its level prefix.
    #[must_use]
    pub fn clean_id_name(&self) -> &str {
        decompose_identifier(&self.id_name)
    }

    /// Returns the enclosing resource, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<ResourceId> {
        self.parent
    }

    /// Returns the nested resources.
    #[must_use]
    pub fn children(&self) -> &[ResourceId] {
        &self.children
    }

    /// Returns true for top-level resources.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// The immutable resource tree.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    nodes: Vec<ResourceNode>,
    roots: Vec<ResourceId>,
}

impl ResourceTree {
    /// Starts building a tree.
    #[must_use]
    pub fn builder() -> ResourceTreeBuilder {
        ResourceTreeBuilder::default()
    }

    /// Returns a node by id.
    pub fn node(&self, id: ResourceId) -> Result<&ResourceNode, RouterError> {
        self.nodes.get(id.0).ok_or(RouterError::UnknownResource(id.0))
    }

    /// Returns a node by unique name.
    #[must_use]
    pub fn find(&self, uid: &str) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.uid == uid)
    }

    /// Returns the parent node of `id`, if any.
    pub fn parent(&self, id: ResourceId) -> Result<Option<&ResourceNode>, RouterError> {
        match self.node(id)?.parent {
            Some(parent) => self.node(parent).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the chain from the root down to `id`, inclusive.
    pub fn lineage(&self, id: ResourceId) -> Result<Vec<&ResourceNode>, RouterError> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(next) = current {
            let node = self.node(next)?;
            chain.push(node);
            current = node.parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Returns the number of nodes between `id` and its root (roots are 0).
    pub fn nesting(&self, id: ResourceId) -> Result<usize, RouterError> {
        Ok(self.lineage(id)?.len() - 1)
    }

    /// Returns the top-level resources.
    #[must_use]
    pub fn roots(&self) -> &[ResourceId] {
        &self.roots
    }

    /// Iterates over every node in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.iter()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the route template for a resource at a depth.
    ///
    /// ```rust
    /// use ramify_router::{Depth, ResourceSpec, ResourceTree};
    ///
    /// let mut builder = ResourceTree::builder();
    /// let users = builder.add(None, ResourceSpec::new("user", "users").id_field("username")).unwrap();
    /// let stories = builder.add(Some(users), ResourceSpec::new("story", "stories")).unwrap();
    /// let tree = builder.build();
    ///
    /// assert_eq!(
    ///     tree.template(stories, Depth::Item).unwrap(),
    ///     "/users/{user_username}/stories/{story_id}"
    /// );
    /// ```
    pub fn template(&self, id: ResourceId, depth: Depth) -> Result<String, RouterError> {
        let lineage = self.lineage(id)?;
        let last = lineage.len() - 1;
        let mut path = String::new();
        for (i, node) in lineage.iter().enumerate() {
            path.push('/');
            path.push_str(&node.collection_name);
            if i < last || depth == Depth::Item {
                path.push_str("/{");
                path.push_str(&node.id_name);
                path.push('}');
            }
        }
        Ok(path)
    }

    /// Builds the concrete URL path of a resource at a depth.
    pub fn url_for(
        &self,
        id: ResourceId,
        depth: Depth,
        params: &Params,
    ) -> Result<String, RouterError> {
        let lineage = self.lineage(id)?;
        let last = lineage.len() - 1;
        let mut path = String::new();
        for (i, node) in lineage.iter().enumerate() {
            path.push('/');
            path.push_str(&node.collection_name);
            if i < last || depth == Depth::Item {
                let value =
                    params
                        .get(&node.id_name)
                        .ok_or_else(|| RouterError::MissingParameter {
                            uid: lineage[last].uid.clone(),
                            name: node.id_name.clone(),
                        })?;
                path.push('/');
                path.push_str(&urlencoding::encode(value));
            }
        }
        Ok(path)
    }

    pub(crate) fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }
}

/// Builder for [`ResourceTree`].
#[derive(Debug, Default)]
pub struct ResourceTreeBuilder {
    tree: ResourceTree,
}

impl ResourceTreeBuilder {
    /// Adds a resource under `parent` (or at the top level).
    pub fn add(
        &mut self,
        parent: Option<ResourceId>,
        spec: ResourceSpec,
    ) -> Result<ResourceId, RouterError> {
        let uid = match parent {
            Some(p) => format!("{}:{}", self.tree.node(p)?.uid, spec.member_name),
            None => spec.member_name.clone(),
        };

        let siblings = match parent {
            Some(p) => self.tree.node(p)?.children.as_slice(),
            None => self.tree.roots.as_slice(),
        };
        for sibling in siblings {
            let sibling = &self.tree.nodes[sibling.0];
            if sibling.id_name == spec.id_name {
                return Err(RouterError::DuplicateIdentifier {
                    uid,
                    id_name: spec.id_name,
                });
            }
            if sibling.collection_name == spec.collection_name {
                return Err(RouterError::DuplicateSegment {
                    uid,
                    segment: spec.collection_name,
                });
            }
        }

        let id = ResourceId(self.tree.nodes.len());
        self.tree.nodes.push(ResourceNode {
            id,
            uid,
            member_name: spec.member_name,
            collection_name: spec.collection_name,
            id_name: spec.id_name,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.tree.nodes[p.0].children.push(id),
            None => self.tree.roots.push(id),
        }
        Ok(id)
    }

    /// Freezes the tree.
    #[must_use]
    pub fn build(self) -> ResourceTree {
        self.tree
    }
}
