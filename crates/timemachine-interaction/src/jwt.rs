//! Best-effort decoding of access-token claims.
//!
//! The signature is not verified; the claims only seed display fields of the
//! identity.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

/// Profile hints carried in the token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub login_id: Option<String>,
}

/// Decodes the payload segment of a JWT.
///
/// Malformed tokens yield empty claims.
pub fn decode_claims(token: &str) -> TokenClaims {
    let Some(payload) = decode_payload(token) else {
        return TokenClaims::default();
    };
    TokenClaims {
        name: string_claim(&payload, "name").or_else(|| string_claim(&payload, "fullName")),
        username: string_claim(&payload, "username"),
        email: string_claim(&payload, "email"),
        login_id: string_claim(&payload, "loginId").or_else(|| string_claim(&payload, "sub")),
    }
}

fn decode_payload(token: &str) -> Option<Map<String, Value>> {
    let segment = token.split('.').nth(1)?;
    // accept standard-alphabet and padded segments as well
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes()).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn string_claim(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decodes_primary_claims() {
        let token = token_with(r#"{"name":"김지수","username":"jisu","email":"j@x.kr","loginId":"jisu01"}"#);
        let claims = decode_claims(&token);
        assert_eq!(claims.name.as_deref(), Some("김지수"));
        assert_eq!(claims.username.as_deref(), Some("jisu"));
        assert_eq!(claims.email.as_deref(), Some("j@x.kr"));
        assert_eq!(claims.login_id.as_deref(), Some("jisu01"));
    }

    #[test]
    fn test_falls_back_to_full_name_and_sub() {
        let token = token_with(r#"{"fullName":"Kim","sub":"kim","name":"  "}"#);
        let claims = decode_claims(&token);
        assert_eq!(claims.name.as_deref(), Some("Kim"));
        assert_eq!(claims.login_id.as_deref(), Some("kim"));
        assert!(claims.email.is_none());
    }

    #[test]
    fn test_malformed_tokens_yield_empty_claims() {
        assert_eq!(decode_claims("opaque-token"), TokenClaims::default());
        assert_eq!(decode_claims("a.!!!.c"), TokenClaims::default());
        assert_eq!(decode_claims(&token_with("[1,2]")), TokenClaims::default());
    }

    #[test]
    fn test_padded_segment_is_accepted() {
        let segment = base64::engine::general_purpose::STANDARD.encode(r#"{"sub":"x"}"#);
        let token = format!("h.{}.s", segment);
        assert_eq!(decode_claims(&token).login_id.as_deref(), Some("x"));
    }
}
