//! Path matching against the resource tree.
//!
//! A path alternates collection segments and identifier values:
//! `/users/user12/stories/4`. Matching walks the tree one pair at a time,
//! comparing the static segment against each candidate's collection name
//! and capturing the following segment under that node's `id_name`.

use crate::action::Depth;
use crate::params::Params;
use crate::resource::{ResourceId, ResourceTree};

/// The result of matching a path against a [`ResourceTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMatch {
    /// The deepest resource addressed by the path.
    pub resource: ResourceId,
    /// Whether the path ends at the collection or at an item.
    pub depth: Depth,
    /// Identifier values captured along the way, keyed by `id_name`.
    pub params: Params,
}

impl ResourceTree {
    /// Matches a request path.
    ///
    /// Trailing slashes and empty segments are ignored. Returns `None` when
    /// a segment names no resource at its level.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ramify_router::{Depth, ResourceSpec, ResourceTree};
    ///
    /// let mut builder = ResourceTree::builder();
    /// let users = builder.add(None, ResourceSpec::new("user", "users")).unwrap();
    /// let tree = builder.build();
    ///
    /// let matched = tree.match_path("/users/42").unwrap();
    /// assert_eq!(matched.resource, users);
    /// assert_eq!(matched.depth, Depth::Item);
    /// assert_eq!(matched.params.get("user_id"), Some("42"));
    /// ```
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ResourceMatch> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let mut candidates = self.roots();
        let mut rest = segments.as_slice();

        loop {
            let (segment, after) = rest.split_first()?;
            let node = candidates
                .iter()
                .map(|id| &self.nodes()[id.index()])
                .find(|n| n.collection_name() == *segment)?;

            match after.split_first() {
                None => {
                    return Some(ResourceMatch {
                        resource: node.id(),
                        depth: Depth::Collection,
                        params,
                    })
                }
                Some((value, remaining)) => {
                    let value = urlencoding::decode(value)
                        .map_or_else(|_| (*value).to_string(), std::borrow::Cow::into_owned);
                    params.push(node.id_name(), value);
                    if remaining.is_empty() {
                        return Some(ResourceMatch {
                            resource: node.id(),
                            depth: Depth::Item,
                            params,
                        });
                    }
                    candidates = node.children();
                    rest = remaining;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::resource::ResourceSpec;

    use super::*;

    fn tree() -> (ResourceTree, ResourceId, ResourceId, ResourceId) {
        let mut builder = ResourceTree::builder();
        let users = builder
            .add(None, ResourceSpec::new("user", "users").id_field("username"))
            .unwrap();
        let stories = builder
            .add(Some(users), ResourceSpec::new("story", "stories"))
            .unwrap();
        let comments = builder
            .add(Some(stories), ResourceSpec::new("comment", "comments"))
            .unwrap();
        (builder.build(), users, stories, comments)
    }

    #[test]
    fn test_match_root_collection() {
        let (tree, users, _, _) = tree();
        let m = tree.match_path("/users").unwrap();
        assert_eq!(m.resource, users);
        assert_eq!(m.depth, Depth::Collection);
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_match_nested_item() {
        let (tree, _, stories, _) = tree();
        let m = tree.match_path("/users/user12/stories/4").unwrap();
        assert_eq!(m.resource, stories);
        assert_eq!(m.depth, Depth::Item);
        assert_eq!(m.params.get("user_username"), Some("user12"));
        assert_eq!(m.params.get("story_id"), Some("4"));
    }

    #[test]
    fn test_match_nested_collection() {
        let (tree, _, _, comments) = tree();
        let m = tree.match_path("/users/u/stories/1/comments/").unwrap();
        assert_eq!(m.resource, comments);
        assert_eq!(m.depth, Depth::Collection);
        assert_eq!(m.params.len(), 2);
    }

    #[test]
    fn test_no_match() {
        let (tree, _, _, _) = tree();
        assert!(tree.match_path("/posts").is_none());
        assert!(tree.match_path("/users/u/posts").is_none());
        assert!(tree.match_path("/").is_none());
        assert!(tree.match_path("/stories/1").is_none());
    }

    #[test]
    fn test_match_then_url_round_trip() {
        let (tree, _, stories, _) = tree();
        let m = tree.match_path("/users/user12/stories/4").unwrap();
        assert_eq!(
            tree.url_for(stories, m.depth, &m.params).unwrap(),
            "/users/user12/stories/4"
        );
    }

    #[test]
    fn test_encoded_identifier_round_trip() {
        let (tree, users, _, _) = tree();
        let m = tree.match_path("/users/a%2Fb").unwrap();
        assert_eq!(m.params.get("user_username"), Some("a/b"));
        assert_eq!(
            tree.url_for(users, m.depth, &m.params).unwrap(),
            "/users/a%2Fb"
        );
    }
}
