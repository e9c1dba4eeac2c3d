use std::fmt;

use crate::ConfigError;

/// Environment variable consulted when no token is given explicitly.
pub const TOKEN_ENV_VAR: &str = "waqi_token";

/// Access token for the air-quality data source.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Resolve the token from `explicit`, falling back to [`TOKEN_ENV_VAR`].
    pub fn resolve(explicit: Option<String>) -> Result<Self, ConfigError> {
        Self::resolve_with(explicit, |name| std::env::var(name).ok())
    }

    /// Same as [`Credential::resolve`] with a custom environment lookup.
    /// Empty values count as absent.
    pub fn resolve_with<F>(explicit: Option<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        explicit
            .filter(|token| !token.is_empty())
            .or_else(|| lookup(TOKEN_ENV_VAR).filter(|token| !token.is_empty()))
            .map(Credential)
            .ok_or(ConfigError::MissingCredential {
                var: TOKEN_ENV_VAR,
            })
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
