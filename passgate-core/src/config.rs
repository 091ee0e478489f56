//! Relying Party configuration.
//!
//! Settings are gathered in a [`RelyingPartyBuilder`] (named setters, then
//! override closures in insertion order) and validated once in
//! [`RelyingPartyBuilder::build`]. A built [`RelyingParty`] never holds an
//! invalid origin or a short challenge length.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::challenge::DEFAULT_CHALLENGE_LEN;
use crate::client_data::{AllowedOrigins, ClientDataPolicy, TokenBindingPolicy};
use crate::entropy::{EntropySource, OsEntropy};
use crate::error::{ConfigError, MIN_CHALLENGE_LEN};
use crate::options::{
    AttestationConveyance, UserVerificationRequirement, COSE_ALG_EDDSA, COSE_ALG_ES256, COSE_ALG_RS256,
};
use crate::relying_party::RelyingParty;

/// Default ceremony timeout advertised to clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Validated Relying Party configuration.
#[derive(Debug, Clone)]
pub struct RelyingPartyConfig {
    pub rp_id: String,
    pub rp_name: String,
    pub client_data: ClientDataPolicy,
    pub timeout: Duration,
    pub challenge_len: usize,
    pub user_verification: UserVerificationRequirement,
    pub attestation: AttestationConveyance,
    /// COSE algorithms offered at registration, in preference order.
    pub cred_algorithms: Vec<i64>,
}

/// Unvalidated settings; what builder overrides operate on.
#[derive(Debug, Clone)]
pub struct RelyingPartySettings {
    pub rp_id: String,
    pub rp_name: String,
    pub origins: Vec<String>,
    pub timeout: Duration,
    pub challenge_len: usize,
    pub token_binding: TokenBindingPolicy,
    pub user_verification: UserVerificationRequirement,
    pub attestation: AttestationConveyance,
    pub cred_algorithms: Vec<i64>,
}

impl Default for RelyingPartySettings {
    fn default() -> Self {
        Self {
            rp_id: "localhost".to_string(),
            rp_name: "Passgate".to_string(),
            origins: vec!["http://localhost:3000".to_string()],
            timeout: DEFAULT_TIMEOUT,
            challenge_len: DEFAULT_CHALLENGE_LEN,
            token_binding: TokenBindingPolicy::Optional,
            user_verification: UserVerificationRequirement::Preferred,
            attestation: AttestationConveyance::None,
            cred_algorithms: vec![COSE_ALG_ES256, COSE_ALG_EDDSA, COSE_ALG_RS256],
        }
    }
}

impl RelyingPartySettings {
    fn validate(self) -> Result<RelyingPartyConfig, ConfigError> {
        if self.rp_id.trim().is_empty() {
            return Err(ConfigError::EmptyRpId);
        }
        if self.challenge_len < MIN_CHALLENGE_LEN {
            return Err(ConfigError::ChallengeTooShort(self.challenge_len));
        }
        if self.cred_algorithms.is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "cred_algorithms",
                value: String::new(),
            });
        }

        let urls = self
            .origins
            .iter()
            .map(|origin| Url::parse(origin.trim()).map_err(|_| ConfigError::InvalidOrigin(origin.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RelyingPartyConfig {
            rp_id: self.rp_id,
            rp_name: self.rp_name,
            client_data: ClientDataPolicy {
                origins: AllowedOrigins::new(&urls)?,
                token_binding: self.token_binding,
            },
            timeout: self.timeout,
            challenge_len: self.challenge_len,
            user_verification: self.user_verification,
            attestation: self.attestation,
            cred_algorithms: self.cred_algorithms,
        })
    }
}

pub type SettingsOverride = Box<dyn FnOnce(&mut RelyingPartySettings) + Send>;

/// Builder for [`RelyingParty`].
pub struct RelyingPartyBuilder {
    settings: RelyingPartySettings,
    overrides: Vec<SettingsOverride>,
    entropy: Option<Arc<dyn EntropySource>>,
}

impl RelyingPartyBuilder {
    /// Start from an RP id and at least one origin.
    pub fn new<I, S>(rp_id: impl Into<String>, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            settings: RelyingPartySettings {
                rp_id: rp_id.into(),
                origins: origins.into_iter().map(Into::into).collect(),
                ..RelyingPartySettings::default()
            },
            overrides: Vec::new(),
            entropy: None,
        }
    }

    /// Load settings from the process environment.
    ///
    /// Environment variables:
    /// - `PASSGATE_RP_ID` - Relying Party ID (default: "localhost")
    /// - `PASSGATE_RP_NAME` - display name (default: "Passgate")
    /// - `PASSGATE_RP_ORIGINS` - comma-separated origins (default: "http://localhost:3000")
    /// - `PASSGATE_TIMEOUT_MS` - ceremony timeout (default: 300000)
    /// - `PASSGATE_CHALLENGE_LEN` - challenge bytes (default: 32)
    /// - `PASSGATE_TOKEN_BINDING` - "optional" or "required" (default: optional)
    /// - `PASSGATE_USER_VERIFICATION` - "required", "preferred" or "discouraged"
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = RelyingPartySettings::default();

        if let Some(rp_id) = lookup("PASSGATE_RP_ID") {
            settings.rp_id = rp_id;
        }
        if let Some(rp_name) = lookup("PASSGATE_RP_NAME") {
            settings.rp_name = rp_name;
        }
        if let Some(origins) = lookup("PASSGATE_RP_ORIGINS") {
            settings.origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(ms) = parse_setting::<u64>(&lookup, "PASSGATE_TIMEOUT_MS")? {
            settings.timeout = Duration::from_millis(ms);
        }
        if let Some(len) = parse_setting::<usize>(&lookup, "PASSGATE_CHALLENGE_LEN")? {
            settings.challenge_len = len;
        }
        if let Some(policy) = parse_setting::<TokenBindingPolicy>(&lookup, "PASSGATE_TOKEN_BINDING")? {
            settings.token_binding = policy;
        }
        if let Some(uv) = parse_setting::<UserVerificationRequirement>(&lookup, "PASSGATE_USER_VERIFICATION")? {
            settings.user_verification = uv;
        }

        Ok(Self {
            settings,
            overrides: Vec::new(),
            entropy: None,
        })
    }

    pub fn rp_name(mut self, name: impl Into<String>) -> Self {
        self.settings.rp_name = name.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    pub fn challenge_len(mut self, len: usize) -> Self {
        self.settings.challenge_len = len;
        self
    }

    pub fn token_binding(mut self, policy: TokenBindingPolicy) -> Self {
        self.settings.token_binding = policy;
        self
    }

    pub fn user_verification(mut self, requirement: UserVerificationRequirement) -> Self {
        self.settings.user_verification = requirement;
        self
    }

    pub fn attestation(mut self, conveyance: AttestationConveyance) -> Self {
        self.settings.attestation = conveyance;
        self
    }

    pub fn cred_algorithms(mut self, algorithms: Vec<i64>) -> Self {
        self.settings.cred_algorithms = algorithms;
        self
    }

    /// Use a different entropy source. Defaults to [`OsEntropy`].
    pub fn entropy_source(mut self, source: Arc<dyn EntropySource>) -> Self {
        self.entropy = Some(source);
        self
    }

    pub fn with_override<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut RelyingPartySettings) + Send + 'static,
    {
        self.overrides.push(Box::new(f));
        self
    }

    /// Apply overrides in order, then validate.
    pub fn build(self) -> Result<RelyingParty, ConfigError> {
        let mut settings = self.settings;
        for f in self.overrides {
            f(&mut settings);
        }
        let config = settings.validate()?;
        let entropy = self.entropy.unwrap_or_else(|| Arc::new(OsEntropy));
        Ok(RelyingParty::from_parts(config, entropy))
    }
}

impl std::fmt::Debug for RelyingPartyBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelyingPartyBuilder")
            .field("settings", &self.settings)
            .field("overrides", &self.overrides.len())
            .field("entropy", &self.entropy.as_ref().map(|e| e.source_id()))
            .finish()
    }
}

fn parse_setting<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidSetting { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let rp = RelyingPartyBuilder::from_lookup(lookup(&[])).unwrap().build().unwrap();
        let config = rp.config();
        assert_eq!(config.rp_id, "localhost");
        assert_eq!(config.rp_name, "Passgate");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.challenge_len, 32);
        assert_eq!(config.client_data.token_binding, TokenBindingPolicy::Optional);
        assert_eq!(config.client_data.origins.iter().count(), 1);
    }

    #[test]
    fn test_env_values() {
        let builder = RelyingPartyBuilder::from_lookup(lookup(&[
            ("PASSGATE_RP_ID", "example.com"),
            ("PASSGATE_RP_ORIGINS", "https://example.com, https://login.example.com ,"),
            ("PASSGATE_TIMEOUT_MS", "60000"),
            ("PASSGATE_TOKEN_BINDING", "required"),
            ("PASSGATE_USER_VERIFICATION", "required"),
        ]))
        .unwrap();
        let rp = builder.build().unwrap();
        let config = rp.config();

        assert_eq!(config.rp_id, "example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.client_data.origins.iter().count(), 2);
        assert_eq!(config.client_data.token_binding, TokenBindingPolicy::Required);
        assert_eq!(config.user_verification, UserVerificationRequirement::Required);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = RelyingPartyBuilder::from_lookup(lookup(&[("PASSGATE_TIMEOUT_MS", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidSetting {
                key: "PASSGATE_TIMEOUT_MS",
                value: "soon".into()
            }
        );
    }

    #[test]
    fn test_build_validates() {
        assert_eq!(
            RelyingPartyBuilder::new("", ["https://example.com"]).build().unwrap_err(),
            ConfigError::EmptyRpId
        );
        assert_eq!(
            RelyingPartyBuilder::new("example.com", Vec::<String>::new()).build().unwrap_err(),
            ConfigError::NoOrigins
        );
        assert!(matches!(
            RelyingPartyBuilder::new("example.com", ["not a url"]).build().unwrap_err(),
            ConfigError::InvalidOrigin(_)
        ));
        assert_eq!(
            RelyingPartyBuilder::new("example.com", ["https://example.com"])
                .challenge_len(8)
                .build()
                .unwrap_err(),
            ConfigError::ChallengeTooShort(8)
        );
    }

    #[test]
    fn test_overrides_run_after_setters_in_order() {
        let rp = RelyingPartyBuilder::new("example.com", ["https://example.com"])
            .timeout(Duration::from_secs(10))
            .with_override(|s| s.timeout = Duration::from_secs(20))
            .with_override(|s| s.origins.push("https://other.example".into()))
            .build()
            .unwrap();

        assert_eq!(rp.config().timeout, Duration::from_secs(20));
        assert_eq!(rp.config().client_data.origins.iter().count(), 2);
    }
}
