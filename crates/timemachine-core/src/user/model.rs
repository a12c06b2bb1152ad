//! Identity domain model.
//!
//! Represents the logged-in user together with the bearer token issued by the
//! authentication backend.

use serde::{Deserialize, Serialize};

/// Token scheme used when the backend does not report one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// The logged-in user.
///
/// Created at successful login, persisted for session restore and dropped on
/// logout or when the backend rejects the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable numeric identifier, when the profile endpoint reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Login handle
    pub login_id: String,
    /// Issued access token
    pub access_token: String,
    /// Token scheme (`Bearer` unless the backend says otherwise)
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

impl Identity {
    /// Creates an identity from a freshly issued token.
    pub fn new(
        login_id: impl Into<String>,
        access_token: impl Into<String>,
        token_type: impl Into<String>,
    ) -> Self {
        let token_type = token_type.into();
        Self {
            id: None,
            login_id: login_id.into(),
            access_token: access_token.into(),
            token_type: if token_type.trim().is_empty() {
                default_token_type()
            } else {
                token_type
            },
            email: None,
            name: None,
            username: None,
        }
    }

    /// Returns the credentials used for authenticated backend calls.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.access_token.clone(),
            token_type: self.token_type.clone(),
        }
    }

    /// Name shown in greetings: name, then username, then login handle.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .and_then(non_empty)
            .or_else(|| self.username.as_deref().and_then(non_empty))
            .unwrap_or(&self.login_id)
    }

    /// Storage key suffix for per-identity data.
    ///
    /// Prefers the numeric id, then the login handle, then the email.
    pub fn storage_key(&self) -> Option<String> {
        if let Some(id) = self.id {
            return Some(id.to_string());
        }
        non_empty(&self.login_id)
            .or_else(|| self.email.as_deref().and_then(non_empty))
            .map(str::to_string)
    }

    /// Keys that older clients used for the same identity, in lookup order.
    ///
    /// The preferred key from [`Identity::storage_key`] is never included.
    pub fn legacy_storage_keys(&self) -> Vec<String> {
        let preferred = self.storage_key();
        let mut keys = Vec::new();
        for candidate in [Some(self.login_id.as_str()), self.email.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(non_empty)
        {
            let candidate = candidate.to_string();
            if preferred.as_ref() != Some(&candidate) && !keys.contains(&candidate) {
                keys.push(candidate);
            }
        }
        keys
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Bearer credentials attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub token_type: String,
}

impl Credentials {
    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        let scheme = if self.token_type.trim().is_empty() {
            DEFAULT_TOKEN_TYPE
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", scheme, self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("mina", "token-abc", "bearer")
    }

    #[test]
    fn test_empty_token_type_defaults_to_bearer() {
        let identity = Identity::new("mina", "t", "  ");
        assert_eq!(identity.token_type, "Bearer");
        assert_eq!(identity.credentials().authorization_header(), "Bearer t");
    }

    #[test]
    fn test_authorization_header_uses_reported_scheme() {
        assert_eq!(
            identity().credentials().authorization_header(),
            "bearer token-abc"
        );
    }

    #[test]
    fn test_storage_key_prefers_numeric_id() {
        let mut identity = identity();
        identity.email = Some("mina@example.com".to_string());
        assert_eq!(identity.storage_key().as_deref(), Some("mina"));
        assert_eq!(identity.legacy_storage_keys(), vec!["mina@example.com"]);

        identity.id = Some(42);
        assert_eq!(identity.storage_key().as_deref(), Some("42"));
        assert_eq!(
            identity.legacy_storage_keys(),
            vec!["mina".to_string(), "mina@example.com".to_string()]
        );
    }

    #[test]
    fn test_storage_key_falls_back_to_email() {
        let mut identity = Identity::new("", "t", "Bearer");
        assert_eq!(identity.storage_key(), None);
        identity.email = Some("only@example.com".to_string());
        assert_eq!(identity.storage_key().as_deref(), Some("only@example.com"));
        assert!(identity.legacy_storage_keys().is_empty());
    }

    #[test]
    fn test_display_name_order() {
        let mut identity = identity();
        assert_eq!(identity.display_name(), "mina");
        identity.username = Some("mina_k".to_string());
        assert_eq!(identity.display_name(), "mina_k");
        identity.name = Some("김민아".to_string());
        assert_eq!(identity.display_name(), "김민아");
    }

    #[test]
    fn test_blank_name_falls_through_to_username() {
        let mut identity = identity();
        identity.name = Some(" ".to_string());
        identity.username = Some("mina_k".to_string());
        assert_eq!(identity.display_name(), "mina_k");

        identity.username = Some(String::new());
        assert_eq!(identity.display_name(), "mina");
    }

    #[test]
    fn test_serde_shape_matches_stored_record() {
        let json = r#"{"loginId":"mina","accessToken":"abc","tokenType":"Bearer","id":7}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.id, Some(7));
        assert_eq!(identity.login_id, "mina");

        let missing_scheme = r#"{"loginId":"mina","accessToken":"abc"}"#;
        let identity: Identity = serde_json::from_str(missing_scheme).unwrap();
        assert_eq!(identity.token_type, "Bearer");
    }
}
