//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from `CREDIT_*` environment variables, configuration files or
//! command-line flags. Everything except the JWT secret and the user
//! directory URL has a default.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::DispatchConfig;
use crate::outbound::jwt::{JwtClaimNames, JwtCredentialValidator};
use crate::outbound::user_directory::HttpRequesterLookup;

const DEFAULT_USER_DIRECTORY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 5_000;

/// Errors raised while turning settings into adapters.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A required value is absent.
    #[error("missing required setting: {name}")]
    Missing { name: &'static str },
    /// A value is present but unusable.
    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Settings for the credit request core and its adapters.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CREDIT")]
pub struct CreditSettings {
    /// Shared HS256 secret used to verify caller credentials.
    pub jwt_secret: Option<String>,
    /// Claim carrying the requester identifier.
    pub jwt_subject_claim: Option<String>,
    /// Claim carrying the base64-encoded email.
    pub jwt_email_claim: Option<String>,
    /// Claim carrying the declared base salary.
    pub jwt_income_claim: Option<String>,
    /// Claim carrying the comma-separated roles.
    pub jwt_roles_claim: Option<String>,
    /// Base URL of the user directory.
    pub user_directory_url: Option<String>,
    /// Request timeout for user directory calls, in milliseconds.
    #[ortho_config(default = 5_000)]
    pub user_directory_timeout_ms: u64,
    /// Upper bound on a single event publish, in milliseconds.
    #[ortho_config(default = 5_000)]
    pub publish_timeout_ms: u64,
    /// Comma-separated roles allowed to list credit requests; empty means
    /// every caller.
    pub listing_roles: Option<String>,
}

impl fmt::Debug for CreditSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditSettings")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("jwt_subject_claim", &self.jwt_subject_claim)
            .field("jwt_email_claim", &self.jwt_email_claim)
            .field("jwt_income_claim", &self.jwt_income_claim)
            .field("jwt_roles_claim", &self.jwt_roles_claim)
            .field("user_directory_url", &self.user_directory_url)
            .field("user_directory_timeout_ms", &self.user_directory_timeout_ms)
            .field("publish_timeout_ms", &self.publish_timeout_ms)
            .field("listing_roles", &self.listing_roles)
            .finish()
    }
}

impl CreditSettings {
    /// Claim names, falling back to the identity service defaults.
    pub fn claim_names(&self) -> JwtClaimNames {
        let defaults = JwtClaimNames::default();
        JwtClaimNames {
            subject: self.jwt_subject_claim.clone().unwrap_or(defaults.subject),
            email: self.jwt_email_claim.clone().unwrap_or(defaults.email),
            income: self.jwt_income_claim.clone().unwrap_or(defaults.income),
            roles: self.jwt_roles_claim.clone().unwrap_or(defaults.roles),
        }
    }

    /// Build the credential validator.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when no secret is configured.
    pub fn credential_validator(&self) -> Result<JwtCredentialValidator, SettingsError> {
        let secret = self
            .jwt_secret
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
            .map(|secret| Zeroizing::new(secret.as_bytes().to_vec()))
            .ok_or(SettingsError::Missing { name: "jwt_secret" })?;
        Ok(JwtCredentialValidator::new(&secret, self.claim_names()))
    }

    /// Parsed user directory base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the URL is absent or malformed.
    pub fn user_directory_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .user_directory_url
            .as_deref()
            .ok_or(SettingsError::Missing {
                name: "user_directory_url",
            })?;
        Url::parse(raw).map_err(|err| SettingsError::Invalid {
            name: "user_directory_url",
            message: err.to_string(),
        })
    }

    /// Request timeout for user directory calls.
    pub fn user_directory_timeout(&self) -> Duration {
        millis_or(self.user_directory_timeout_ms, DEFAULT_USER_DIRECTORY_TIMEOUT_MS)
    }

    /// Build the HTTP requester lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the URL is unusable or the HTTP client
    /// cannot be constructed.
    pub fn requester_lookup(&self) -> Result<HttpRequesterLookup, SettingsError> {
        HttpRequesterLookup::new(self.user_directory_url()?, self.user_directory_timeout()).map_err(
            |err| SettingsError::Invalid {
                name: "user_directory_url",
                message: err.to_string(),
            },
        )
    }

    /// Dispatcher tuning.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            publish_timeout: millis_or(self.publish_timeout_ms, DEFAULT_PUBLISH_TIMEOUT_MS),
        }
    }

    /// Roles allowed to list credit requests.
    pub fn listing_roles(&self) -> BTreeSet<String> {
        self.listing_roles
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Zero falls back to `default`.
fn millis_or(value: u64, default: u64) -> Duration {
    Duration::from_millis(if value == 0 { default } else { value })
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 10] = [
        "CREDIT_JWT_SECRET",
        "CREDIT_JWT_SUBJECT_CLAIM",
        "CREDIT_JWT_EMAIL_CLAIM",
        "CREDIT_JWT_INCOME_CLAIM",
        "CREDIT_JWT_ROLES_CLAIM",
        "CREDIT_USER_DIRECTORY_URL",
        "CREDIT_USER_DIRECTORY_TIMEOUT_MS",
        "CREDIT_PUBLISH_TIMEOUT_MS",
        "CREDIT_LISTING_ROLES",
        "CREDIT_CONFIG_PATH",
    ];

    fn load_from_empty_args() -> CreditSettings {
        CreditSettings::load_from_iter([OsString::from("credit")]).expect("config should load")
    }

    fn cleared_except(
        overrides: &[(&'static str, &str)],
    ) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(cleared_except(&[]));

        let settings = load_from_empty_args();

        assert_eq!(settings.claim_names(), JwtClaimNames::default());
        assert_eq!(settings.dispatch_config(), DispatchConfig::default());
        assert_eq!(settings.user_directory_timeout(), Duration::from_secs(5));
        assert!(settings.listing_roles().is_empty());
        assert!(matches!(
            settings.credential_validator(),
            Err(SettingsError::Missing { name: "jwt_secret" })
        ));
        assert!(matches!(
            settings.user_directory_url(),
            Err(SettingsError::Missing { .. })
        ));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_except(&[
            ("CREDIT_JWT_SECRET", "an-hs256-secret-long-enough-for-tests"),
            ("CREDIT_JWT_SUBJECT_CLAIM", "uid"),
            ("CREDIT_USER_DIRECTORY_URL", "http://directory.local:8081"),
            ("CREDIT_USER_DIRECTORY_TIMEOUT_MS", "750"),
            ("CREDIT_PUBLISH_TIMEOUT_MS", "1200"),
            ("CREDIT_LISTING_ROLES", "ADVISOR, ADMIN"),
        ]));

        let settings = load_from_empty_args();

        assert_eq!(settings.claim_names().subject, "uid");
        assert_eq!(settings.claim_names().email, "email");
        assert_eq!(
            settings.user_directory_url().expect("url parses").as_str(),
            "http://directory.local:8081/"
        );
        assert_eq!(settings.user_directory_timeout(), Duration::from_millis(750));
        assert_eq!(
            settings.dispatch_config().publish_timeout,
            Duration::from_millis(1200)
        );
        assert_eq!(
            settings.listing_roles(),
            BTreeSet::from(["ADMIN".to_owned(), "ADVISOR".to_owned()])
        );
        assert!(settings.credential_validator().is_ok());
        assert!(settings.requester_lookup().is_ok());
    }

    #[rstest]
    fn malformed_directory_url_is_invalid() {
        let _guard = lock_env(cleared_except(&[("CREDIT_USER_DIRECTORY_URL", "not a url")]));

        let settings = load_from_empty_args();

        assert!(matches!(
            settings.user_directory_url(),
            Err(SettingsError::Invalid { .. })
        ));
    }

    #[rstest]
    fn debug_output_redacts_the_secret() {
        let _guard = lock_env(cleared_except(&[("CREDIT_JWT_SECRET", "top-secret-value")]));

        let settings = load_from_empty_args();

        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("top-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
