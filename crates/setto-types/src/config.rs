//! Configuration types for the Setto SDK.
//!
//! [`SettoConfig`] is set once when the host application starts and read by every
//! other part of the SDK. It can be built in code or deserialized from JSON.
//!
//! # Environment Variable Resolution
//!
//! The [`LiteralOrEnv`] wrapper type allows configuration values to be specified
//! either as literal values or as references to environment variables:
//!
//! ```json
//! {
//!   "environment": "prod",
//!   "merchant_id": "$SETTO_MERCHANT_ID",      // Simple env var
//!   "idp_token": "${SETTO_IDP_TOKEN}"         // Braced env var
//! }
//! ```
//!
//! This keeps merchant credentials out of configuration files while still
//! allowing them to be loaded at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use url::Url;

/// Deployment environment of the hosted wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub const DEV_BASE_URL: &'static str = "https://dev-wallet.settopay.com/";
    pub const PROD_BASE_URL: &'static str = "https://wallet.settopay.com/";

    /// Base URL of the hosted wallet for this environment.
    pub fn base_url(&self) -> Url {
        match self {
            Environment::Dev => base_urls::DEV.clone(),
            Environment::Prod => base_urls::PROD.clone(),
        }
    }
}

mod base_urls {
    use super::*;
    use std::sync::LazyLock;

    pub static DEV: LazyLock<Url> =
        LazyLock::new(|| Url::parse(Environment::DEV_BASE_URL).expect("valid base url"));
    pub static PROD: LazyLock<Url> =
        LazyLock::new(|| Url::parse(Environment::PROD_BASE_URL).expect("valid base url"));
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Dev => f.write_str("dev"),
            Environment::Prod => f.write_str("prod"),
        }
    }
}

/// Process-lifetime SDK configuration.
///
/// Immutable once handed to the SDK; re-initializing replaces it wholesale.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct SettoConfig {
    pub environment: Environment,
    /// Merchant identity issued by Setto.
    pub merchant_id: LiteralOrEnv<String>,
    /// Identity-provider token. When present, every payment goes through the token exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp_token: Option<LiteralOrEnv<String>>,
    #[serde(default)]
    pub debug: bool,
    /// Custom URI scheme the wallet redirects to. Defaults to `setto-{merchant_id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_scheme: Option<String>,
    /// Overrides the environment's base URL, e.g. for staging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
}

impl SettoConfig {
    /// Prefix shared by every default callback scheme.
    pub const SCHEME_PREFIX: &'static str = "setto-";

    pub fn new<S: Into<String>>(merchant_id: S, environment: Environment) -> Self {
        Self {
            environment,
            merchant_id: LiteralOrEnv::from_literal(merchant_id.into()),
            idp_token: None,
            debug: false,
            return_scheme: None,
            base_url: None,
        }
    }

    pub fn with_idp_token<S: Into<String>>(mut self, token: S) -> Self {
        self.idp_token = Some(LiteralOrEnv::from_literal(token.into()));
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_return_scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.return_scheme = Some(scheme.into());
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn merchant_id(&self) -> &str {
        self.merchant_id.inner()
    }

    pub fn idp_token(&self) -> Option<&str> {
        self.idp_token.as_ref().map(|t| t.inner().as_str())
    }

    /// Effective API base URL, normalized to end with exactly one `/` so that
    /// relative joins land underneath it.
    pub fn api_base(&self) -> Url {
        let mut base = self
            .base_url
            .clone()
            .unwrap_or_else(|| self.environment.base_url());
        let path = format!("{}/", base.path().trim_end_matches('/'));
        base.set_path(&path);
        base
    }

    /// The custom scheme inbound callbacks must carry, lowercased.
    pub fn callback_scheme(&self) -> String {
        match &self.return_scheme {
            Some(scheme) => scheme.to_ascii_lowercase(),
            None => format!("{}{}", Self::SCHEME_PREFIX, self.merchant_id()).to_ascii_lowercase(),
        }
    }
}

// ============================================================================
// Environment Variable Resolution
// ============================================================================

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"merchant-42"`
/// - Simple env var: `"$SETTO_MERCHANT_ID"`
/// - Braced env var: `"${SETTO_MERCHANT_ID}"`
///
/// The wrapper implements `Deref` to provide transparent access to the inner type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

/// Never prints the identity-provider token.
impl fmt::Debug for SettoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettoConfig")
            .field("environment", &self.environment)
            .field("merchant_id", &self.merchant_id())
            .field("idp_token", &self.idp_token.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .field("return_scheme", &self.return_scheme)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if the string matches `$VAR` or `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
            Some(braced)
        } else if let Some(var_name) = s.strip_prefix('$') {
            let valid = !var_name.is_empty()
                && var_name.chars().all(|c| c.is_alphanumeric() || c == '_');
            valid.then_some(var_name)
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for LiteralOrEnv<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = match Self::parse_env_var_syntax(&s) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?,
            None => s,
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_idp_token() {
        let config = SettoConfig::new("shop42", Environment::Dev).with_idp_token("idp-secret");
        let rendered = format!("{config:?}");
        assert!(rendered.contains("shop42"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("idp-secret"));
    }

    #[test]
    fn test_default_callback_scheme_uses_merchant_id() {
        let config = SettoConfig::new("Shop42", Environment::Dev);
        assert_eq!(config.callback_scheme(), "setto-shop42");
    }

    #[test]
    fn test_return_scheme_overrides_default() {
        let config = SettoConfig::new("shop42", Environment::Prod).with_return_scheme("MyApp");
        assert_eq!(config.callback_scheme(), "myapp");
    }

    #[test]
    fn test_api_base_follows_environment() {
        let dev = SettoConfig::new("m", Environment::Dev);
        let prod = SettoConfig::new("m", Environment::Prod);
        assert_eq!(dev.api_base().as_str(), Environment::DEV_BASE_URL);
        assert_eq!(prod.api_base().as_str(), Environment::PROD_BASE_URL);
    }

    #[test]
    fn test_api_base_override_is_normalized() {
        let config = SettoConfig::new("m", Environment::Dev)
            .with_base_url("http://127.0.0.1:9000/wallet//".parse().unwrap());
        assert_eq!(config.api_base().as_str(), "http://127.0.0.1:9000/wallet/");

        let config = SettoConfig::new("m", Environment::Dev)
            .with_base_url("http://127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.api_base().as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let config: SettoConfig =
            serde_json::from_str(r#"{"environment":"prod","merchant_id":"shop42"}"#).unwrap();
        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.merchant_id(), "shop42");
        assert!(!config.debug);
        assert!(config.idp_token().is_none());
        assert!(config.return_scheme.is_none());
    }

    #[test]
    fn test_deserialize_resolves_env_var() {
        // SAFETY: unique variable name, not read concurrently by other tests.
        unsafe { std::env::set_var("SETTO_TYPES_TEST_IDP_TOKEN", "idp-secret") };
        let config: SettoConfig = serde_json::from_str(
            r#"{"environment":"dev","merchant_id":"shop42","idp_token":"${SETTO_TYPES_TEST_IDP_TOKEN}"}"#,
        )
        .unwrap();
        assert_eq!(config.idp_token(), Some("idp-secret"));
    }

    #[test]
    fn test_deserialize_missing_env_var_fails() {
        let result: Result<SettoConfig, _> = serde_json::from_str(
            r#"{"environment":"dev","merchant_id":"$SETTO_TYPES_TEST_DEFINITELY_UNSET"}"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("SETTO_TYPES_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_env_var_syntax() {
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$FOO"), Some("FOO"));
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("${FOO_1}"), Some("FOO_1"));
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$"), None);
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$foo-bar"), None);
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("plain"), None);
    }
}
