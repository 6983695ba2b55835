use vpurge_core::config::Config;
use vpurge_core::session::Session;

pub const CSRF_TOKEN_ENV: &str = "VERKADA_CSRF_TOKEN";
pub const AUTH_TOKEN_ENV: &str = "VERKADA_AUTH_TOKEN";
pub const USER_ID_ENV: &str = "VERKADA_USER_ID";

/// Build a session from the environment.
///
/// An API key in `auth.api_key_env` wins; otherwise all three login tokens
/// must be present.
pub fn session_from_env(config: &Config) -> anyhow::Result<Session> {
    session_from(config, |name| std::env::var(name).ok())
}

fn session_from(
    config: &Config,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Session> {
    let present = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = present(&config.auth.api_key_env) {
        return Ok(Session::ApiKey(key));
    }

    match (
        present(CSRF_TOKEN_ENV),
        present(AUTH_TOKEN_ENV),
        present(USER_ID_ENV),
    ) {
        (Some(csrf_token), Some(auth_token), Some(user_id)) => Ok(Session::Token {
            csrf_token,
            auth_token,
            user_id,
        }),
        _ => anyhow::bail!(
            "no credentials: set {} or all of {CSRF_TOKEN_ENV}, {AUTH_TOKEN_ENV}, {USER_ID_ENV}",
            config.auth.api_key_env
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn api_key_preferred() {
        let cfg = Config::new("org");
        let session = session_from(
            &cfg,
            env(&[("VERKADA_API_KEY", "k"), (CSRF_TOKEN_ENV, "c")]),
        )
        .unwrap();
        assert!(matches!(session, Session::ApiKey(k) if k == "k"));
    }

    #[test]
    fn custom_key_variable() {
        let mut cfg = Config::new("org");
        cfg.auth.api_key_env = "DEMO_ORG_KEY".to_string();
        let session = session_from(&cfg, env(&[("DEMO_ORG_KEY", "k2")])).unwrap();
        assert!(matches!(session, Session::ApiKey(k) if k == "k2"));
    }

    #[test]
    fn token_triple() {
        let cfg = Config::new("org");
        let session = session_from(
            &cfg,
            env(&[
                (CSRF_TOKEN_ENV, "c"),
                (AUTH_TOKEN_ENV, "a"),
                (USER_ID_ENV, "u"),
            ]),
        )
        .unwrap();
        assert!(matches!(session, Session::Token { .. }));
    }

    #[test]
    fn partial_tokens_are_rejected() {
        let cfg = Config::new("org");
        let err = session_from(&cfg, env(&[(CSRF_TOKEN_ENV, "c"), ("VERKADA_API_KEY", " ")]))
            .unwrap_err();
        assert!(err.to_string().contains("no credentials"));
    }
}
