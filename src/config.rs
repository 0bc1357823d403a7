//! Named environment profiles loaded from TOML.
//!
//! A harness run targets one environment at a time; the document maps
//! profile names to connection settings and the `PROBE_ENV` variable picks
//! the active one:
//!
//! ```toml
//! [test]
//! base_url = "http://127.0.0.1:8080"
//! timeout_secs = 30
//!
//! [staging]
//! base_url = "https://staging.example.com"
//! token = "staging-token"
//! ```
//!
//! The parsed [`Environments`] value is plain data to pass around; there is
//! no process-wide singleton.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{ProbeError, Result};

/// Environment variable naming the active profile.
pub const ENV_SELECTOR: &str = "PROBE_ENV";

const DEFAULT_PROFILE: &str = "test";

fn default_timeout_secs() -> u64 {
    30
}

/// Connection settings for one named environment.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Profile {
    /// Base URL of the service under test.
    pub base_url: String,
    /// Default request timeout in whole seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer token applied at client construction, if the environment
    /// requires one up front.
    #[serde(default)]
    pub token: Option<String>,
}

impl Profile {
    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// All named profiles from one configuration document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Environments {
    profiles: BTreeMap<String, Profile>,
}

impl Environments {
    /// Parses a TOML document.
    pub fn from_str(document: &str) -> Result<Self> {
        let environments: Self = toml::from_str(document)
            .map_err(|err| ProbeError::Config(format!("invalid environment config: {err}")))?;
        if environments.profiles.is_empty() {
            return Err(ProbeError::Config(
                "environment config defines no profiles".to_owned(),
            ));
        }
        Ok(environments)
    }

    /// Reads and parses a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|err| {
            ProbeError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_str(&document)
    }

    /// Looks up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ProbeError::Config(format!("unknown environment profile '{name}'")))
    }

    /// Selects the profile named by `PROBE_ENV`, defaulting to `"test"`.
    pub fn active(&self) -> Result<&Profile> {
        let name = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| DEFAULT_PROFILE.to_owned());
        self.profile(&name)
    }

    /// Names of all defined profiles, sorted.
    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{Environments, Profile};
    use std::time::Duration;

    const DOCUMENT: &str = r#"
[test]
base_url = "http://127.0.0.1:8080"
timeout_secs = 10

[staging]
base_url = "https://staging.example.com"
token = "staging-token"
"#;

    #[test]
    fn parses_profiles_with_defaults() {
        let environments = Environments::from_str(DOCUMENT).expect("document must parse");
        assert_eq!(
            environments.profile_names().collect::<Vec<_>>(),
            vec!["staging", "test"]
        );

        let test = environments.profile("test").expect("test profile exists");
        assert_eq!(
            test,
            &Profile {
                base_url: "http://127.0.0.1:8080".to_owned(),
                timeout_secs: 10,
                token: None,
            }
        );

        let staging = environments.profile("staging").expect("staging exists");
        assert_eq!(staging.timeout(), Duration::from_secs(30));
        assert_eq!(staging.token.as_deref(), Some("staging-token"));
    }

    #[test]
    fn unknown_profile_is_config_error() {
        let environments = Environments::from_str(DOCUMENT).expect("document must parse");
        let err = environments.profile("prod").expect_err("prod is undefined");
        assert!(err.to_string().contains("unknown environment profile"));
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = Environments::from_str("").expect_err("no profiles");
        assert!(err.to_string().contains("no profiles"));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = Environments::from_str("[test\nbase_url=").expect_err("syntax error");
        assert!(err.to_string().starts_with("config error"));
    }
}
