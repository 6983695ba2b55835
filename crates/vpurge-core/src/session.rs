//! Opaque authenticated context attached to every Command API call.
//!
//! Acquiring the credentials (reading the environment, logging in) happens
//! outside this crate; the engine only turns them into request headers.

use crate::error::{PurgeError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use std::fmt;

#[derive(Clone)]
pub enum Session {
    /// Public API key, sent as `x-api-key`.
    ApiKey(String),
    /// Tokens from a prior interactive login.
    Token {
        csrf_token: String,
        auth_token: String,
        user_id: String,
    },
}

impl Session {
    pub fn headers(&self, org_id: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        match self {
            Session::ApiKey(key) => {
                insert(&mut headers, "x-api-key", key)?;
            }
            Session::Token {
                csrf_token,
                auth_token,
                user_id,
            } => {
                insert(&mut headers, "x-csrf-token", csrf_token)?;
                insert(&mut headers, "x-verkada-auth", auth_token)?;
                insert(&mut headers, "x-verkada-user-id", user_id)?;
                insert(&mut headers, "x-verkada-organization", org_id)?;
            }
        }
        Ok(headers)
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let mut value =
        HeaderValue::from_str(value).map_err(|_| PurgeError::InvalidHeader(name.to_string()))?;
    value.set_sensitive(true);
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::ApiKey(_) => f.write_str("Session::ApiKey(<redacted>)"),
            Session::Token { user_id, .. } => f
                .debug_struct("Session::Token")
                .field("user_id", user_id)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_header() {
        let headers = Session::ApiKey("secret".into()).headers("org").unwrap();
        assert_eq!(headers["x-api-key"], "secret");
        assert_eq!(headers[ACCEPT], "application/json");
        assert!(headers.get("x-verkada-organization").is_none());
    }

    #[test]
    fn token_headers_include_org() {
        let session = Session::Token {
            csrf_token: "csrf".into(),
            auth_token: "auth".into(),
            user_id: "u-1".into(),
        };
        let headers = session.headers("org-9").unwrap();
        assert_eq!(headers["x-csrf-token"], "csrf");
        assert_eq!(headers["x-verkada-auth"], "auth");
        assert_eq!(headers["x-verkada-user-id"], "u-1");
        assert_eq!(headers["x-verkada-organization"], "org-9");
    }

    #[test]
    fn invalid_header_value_is_an_error() {
        let err = Session::ApiKey("bad\nkey".into()).headers("org").unwrap_err();
        assert!(matches!(err, PurgeError::InvalidHeader(_)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let dbg = format!("{:?}", Session::ApiKey("secret".into()));
        assert!(!dbg.contains("secret"));
        let dbg = format!(
            "{:?}",
            Session::Token {
                csrf_token: "csrf-secret".into(),
                auth_token: "auth-secret".into(),
                user_id: "u-1".into(),
            }
        );
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("u-1"));
    }
}
