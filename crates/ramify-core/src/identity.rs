//! Caller identity.
//!
//! The access-control factory receives the [`CallerIdentity`] through the
//! request context when it is bound; the view layer itself only logs it.

use serde::{Deserialize, Serialize};

/// The authenticated identity of the caller.
///
/// # Example
///
/// ```rust
/// use ramify_core::CallerIdentity;
///
/// let identity = CallerIdentity::user("user12", ["editor"]);
/// assert_eq!(identity.log_id(), "user:user12");
/// assert_eq!(identity.roles(), vec!["editor"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallerIdentity {
    /// An end user.
    User {
        /// User identifier.
        user_id: String,
        /// Roles granted to the user.
        #[serde(default)]
        roles: Vec<String>,
    },
    /// A client authenticated with an API key.
    ApiKey {
        /// Key identifier (never the secret).
        key_id: String,
        /// Scopes granted to the key.
        #[serde(default)]
        scopes: Vec<String>,
    },
    /// No credentials presented.
    #[default]
    Anonymous,
}

impl CallerIdentity {
    /// Creates a user identity.
    pub fn user<I, S>(user_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::User {
            user_id: user_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an API key identity.
    pub fn api_key<I, S>(key_id: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ApiKey {
            key_id: key_id.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a string identifier suitable for logging.
    ///
    /// - User: `user:<user_id>`
    /// - ApiKey: `apikey:<key_id>`
    /// - Anonymous: `anonymous`
    #[must_use]
    pub fn log_id(&self) -> String {
        match self {
            Self::User { user_id, .. } => format!("user:{user_id}"),
            Self::ApiKey { key_id, .. } => format!("apikey:{key_id}"),
            Self::Anonymous => "anonymous".to_string(),
        }
    }

    /// Returns roles for authorization. API key scopes act as pseudo-roles.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        match self {
            Self::User { roles, .. } => roles.iter().map(String::as_str).collect(),
            Self::ApiKey { scopes, .. } => scopes.iter().map(String::as_str).collect(),
            Self::Anonymous => Vec::new(),
        }
    }

    /// Returns true for [`CallerIdentity::Anonymous`].
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_ids() {
        assert_eq!(CallerIdentity::user("u1", ["admin"]).log_id(), "user:u1");
        assert_eq!(
            CallerIdentity::api_key("k1", Vec::<String>::new()).log_id(),
            "apikey:k1"
        );
        assert_eq!(CallerIdentity::Anonymous.log_id(), "anonymous");
    }

    #[test]
    fn test_roles() {
        let user = CallerIdentity::user("u1", ["admin", "user"]);
        assert_eq!(user.roles(), vec!["admin", "user"]);

        let key = CallerIdentity::api_key("k1", ["read"]);
        assert_eq!(key.roles(), vec!["read"]);

        assert!(CallerIdentity::default().roles().is_empty());
        assert!(CallerIdentity::default().is_anonymous());
    }

    #[test]
    fn test_serialization() {
        let identity = CallerIdentity::user("u123", ["editor"]);
        let json = serde_json::to_string(&identity).expect("serialization should work");
        assert!(json.contains("\"type\":\"user\""));
        assert!(json.contains("\"user_id\":\"u123\""));

        let parsed: CallerIdentity =
            serde_json::from_str(&json).expect("deserialization should work");
        assert_eq!(identity, parsed);
    }
}
