//! Path parameter storage and identifier decomposition.
//!
//! Parameter names collected across nesting levels carry a prefix
//! (`users_username`, `stories_id`) so that two levels may both use `id`
//! without colliding. [`decompose_identifier`] strips that prefix.

use smallvec::SmallVec;

/// Separator between a level prefix and the logical field name.
pub const IDENTIFIER_SEPARATOR: char = '_';

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Returns the logical field name of a (possibly compound) identifier.
///
/// Everything up to and including the first [`IDENTIFIER_SEPARATOR`] is
/// dropped. Names without a separator are returned unchanged.
///
/// # Example
///
/// ```rust
/// use ramify_router::decompose_identifier;
///
/// assert_eq!(decompose_identifier("users_username"), "username");
/// assert_eq!(decompose_identifier("foo_bar_qoo"), "bar_qoo");
/// assert_eq!(decompose_identifier("q"), "q");
/// ```
#[must_use]
pub fn decompose_identifier(name: &str) -> &str {
    match name.split_once(IDENTIFIER_SEPARATOR) {
        Some((_, rest)) => rest,
        None => name,
    }
}

/// Path parameters extracted from a request URL.
///
/// Uses small-vector optimization to avoid heap allocation for the common
/// case of a few nesting levels. Parameters are stored as (name, value)
/// pairs in path order.
///
/// # Example
///
/// ```rust
/// use ramify_router::Params;
///
/// let mut params = Params::new();
/// params.push("users_username", "user12");
/// params.push("stories_id", "4");
///
/// assert_eq!(params.get("stories_id"), Some("4"));
/// assert_eq!(params.narrowed("users_username").len(), 1);
/// assert_eq!(params.narrowed("stories_id").len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter to the set.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Sets a parameter, replacing any existing value with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.inner.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.inner.push((name, value));
        }
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a copy truncated after the named parameter, keeping it and
    /// the parameters captured before it in the path.
    ///
    /// A missing parameter yields an empty set; the parent lookup then
    /// reports the key as absent.
    #[must_use]
    pub fn narrowed(&self, name: &str) -> Self {
        match self.inner.iter().position(|(n, _)| n == name) {
            Some(end) => self.inner[..=end].iter().cloned().collect(),
            None => Self::new(),
        }
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decompose_identifier() {
        assert_eq!(decompose_identifier("users_username"), "username");
        assert_eq!(decompose_identifier("items_myid"), "myid");
        assert_eq!(decompose_identifier("foo_bar_qoo"), "bar_qoo");
        assert_eq!(decompose_identifier("id"), "id");
        assert_eq!(decompose_identifier("_id"), "id");
    }

    #[test]
    fn test_params_push_and_get() {
        let mut params = Params::new();
        params.push("users_username", "user12");
        params.push("stories_id", "4");

        assert_eq!(params.get("users_username"), Some("user12"));
        assert_eq!(params.get("stories_id"), Some("4"));
        assert_eq!(params.get("unknown"), None);
    }

    #[test]
    fn test_params_insert_replaces() {
        let mut params = Params::new();
        params.insert("id", "1");
        params.insert("id", "2");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id"), Some("2"));
    }

    #[test]
    fn test_params_narrowed() {
        let params: Params = [("users_username", "user12"), ("stories_id", "4")]
            .into_iter()
            .collect();

        let narrowed = params.narrowed("users_username");
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed.get("users_username"), Some("user12"));
        assert_eq!(params.narrowed("stories_id"), params);
        assert!(params.narrowed("missing").is_empty());
    }

    #[test]
    fn test_params_many_params() {
        let mut params = Params::new();
        for i in 0..10 {
            params.push(format!("level{i}_id"), format!("value{i}"));
        }

        assert_eq!(params.len(), 10);
        assert_eq!(params.get("level5_id"), Some("value5"));
    }

    proptest! {
        #[test]
        fn prop_decomposed_name_follows_first_separator(
            prefix in "[a-z]{1,8}",
            rest in "[a-z_]{0,12}",
        ) {
            let name = format!("{prefix}_{rest}");
            prop_assert_eq!(decompose_identifier(&name), rest.as_str());
        }

        #[test]
        fn prop_names_without_separator_unchanged(name in "[a-z]{1,16}") {
            prop_assert_eq!(decompose_identifier(&name), name.as_str());
        }
    }
}
