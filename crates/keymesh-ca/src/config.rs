//! Provisioning configuration shared by CA ensure and node issuance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{CaError, Result};

/// Default keystore directory, relative to the working directory.
pub const DEFAULT_KEYSTORE_DIR: &str = "keys";

/// Default CA certificate validity in days (10 years).
pub const DEFAULT_CA_VALIDITY_DAYS: u32 = 3650;

/// Default node certificate validity in days.
pub const DEFAULT_NODE_VALIDITY_DAYS: u32 = 825;

/// Default RSA modulus size for CA and node keys.
pub const DEFAULT_KEY_BITS: u32 = 4096;

/// Smallest accepted RSA modulus.
pub const MIN_KEY_BITS: u32 = 2048;

/// Largest accepted RSA modulus (ring refuses to sign with bigger keys).
pub const MAX_KEY_BITS: u32 = 8192;

/// Longest accepted certificate validity in days (100 years).
pub const MAX_VALIDITY_DAYS: u32 = 36_525;

/// Cryptographic toolchain used to produce keys and certificates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process generation (rcgen + rsa).
    #[default]
    Native,
    /// The external `openssl` command-line tool.
    OpenSsl,
}

impl FromStr for Backend {
    type Err = CaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "native" | "builtin" => Ok(Self::Native),
            "openssl" => Ok(Self::OpenSsl),
            _ => Err(CaError::InvalidInput(format!(
                "unknown backend: {s} (valid: native, openssl)"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::OpenSsl => write!(f, "openssl"),
        }
    }
}

/// What to do when only one of `ca.key` / `ca.crt` exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialCaPolicy {
    /// Abort and leave cleanup to the operator.
    #[default]
    Fail,
    /// Regenerate both files from scratch.
    Regenerate,
}

impl FromStr for PartialCaPolicy {
    type Err = CaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "regenerate" => Ok(Self::Regenerate),
            _ => Err(CaError::InvalidInput(format!(
                "unknown partial CA policy: {s} (valid: fail, regenerate)"
            ))),
        }
    }
}

impl fmt::Display for PartialCaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Regenerate => write!(f, "regenerate"),
        }
    }
}

/// Configuration for one provisioning invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Directory holding CA and node material.
    pub keystore_dir: PathBuf,

    /// CA certificate validity in days.
    pub ca_validity_days: u32,

    /// Node certificate validity in days.
    pub node_validity_days: u32,

    /// RSA key size for newly generated keys.
    pub key_bits: u32,

    /// Toolchain used to generate material.
    pub backend: Backend,

    /// Program invoked by the openssl backend.
    pub openssl_program: PathBuf,

    /// Handling of a half-present CA.
    pub partial_ca: PartialCaPolicy,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            keystore_dir: PathBuf::from(DEFAULT_KEYSTORE_DIR),
            ca_validity_days: DEFAULT_CA_VALIDITY_DAYS,
            node_validity_days: DEFAULT_NODE_VALIDITY_DAYS,
            key_bits: DEFAULT_KEY_BITS,
            backend: Backend::Native,
            openssl_program: PathBuf::from("openssl"),
            partial_ca: PartialCaPolicy::Fail,
        }
    }
}

impl ProvisionConfig {
    /// Default configuration rooted at `keystore_dir`.
    pub fn with_keystore(keystore_dir: impl Into<PathBuf>) -> Self {
        Self {
            keystore_dir: keystore_dir.into(),
            ..Self::default()
        }
    }

    /// Reject values no backend can honor.
    pub fn validate(&self) -> Result<()> {
        if self.keystore_dir.as_os_str().is_empty() {
            return Err(CaError::InvalidInput("keystore directory is empty".into()));
        }
        check_validity("CA", self.ca_validity_days)?;
        check_validity("node", self.node_validity_days)?;
        if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&self.key_bits) {
            return Err(CaError::InvalidInput(format!(
                "key size {} outside {MIN_KEY_BITS}..={MAX_KEY_BITS} bits",
                self.key_bits
            )));
        }
        Ok(())
    }
}

fn check_validity(what: &str, days: u32) -> Result<()> {
    if days == 0 {
        return Err(CaError::InvalidInput(format!(
            "{what} validity must be at least one day"
        )));
    }
    if days > MAX_VALIDITY_DAYS {
        return Err(CaError::InvalidInput(format!(
            "{what} validity of {days} days exceeds {MAX_VALIDITY_DAYS}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProvisionConfig::default();
        assert_eq!(config.keystore_dir, PathBuf::from("keys"));
        assert_eq!(config.ca_validity_days, 3650);
        assert_eq!(config.node_validity_days, 825);
        assert_eq!(config.key_bits, 4096);
        assert_eq!(config.backend, Backend::Native);
        assert_eq!(config.partial_ca, PartialCaPolicy::Fail);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = toml::from_str::<ProvisionConfig>(
            r#"
            keystore_dir = "/srv/keymesh/keys"
            backend = "openssl"
            node_validity_days = 90
            "#,
        )
        .unwrap();
        assert_eq!(config.keystore_dir, PathBuf::from("/srv/keymesh/keys"));
        assert_eq!(config.backend, Backend::OpenSsl);
        assert_eq!(config.node_validity_days, 90);
        assert_eq!(config.ca_validity_days, 3650);
        assert_eq!(config.partial_ca, PartialCaPolicy::Fail);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = ProvisionConfig::with_keystore("/tmp/ks");
        config.partial_ca = PartialCaPolicy::Regenerate;
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("partial_ca = \"regenerate\""));
        assert_eq!(toml::from_str::<ProvisionConfig>(&text).unwrap(), config);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(toml::from_str::<ProvisionConfig>("backend = \"gnutls\"").is_err());
        assert!("gnutls".parse::<Backend>().is_err());
        assert_eq!("OpenSSL".parse::<Backend>().unwrap(), Backend::OpenSsl);
    }

    #[test]
    fn test_validate_rejects_zero_days_and_bad_key_size() {
        let mut config = ProvisionConfig::default();
        config.node_validity_days = 0;
        assert!(matches!(config.validate(), Err(CaError::InvalidInput(_))));

        let mut config = ProvisionConfig::default();
        config.ca_validity_days = 0;
        assert!(config.validate().is_err());

        let mut config = ProvisionConfig::default();
        config.key_bits = 1024;
        assert!(config.validate().is_err());

        config.key_bits = 16384;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_validity_days() {
        let mut config = ProvisionConfig::default();
        config.ca_validity_days = MAX_VALIDITY_DAYS;
        assert!(config.validate().is_ok());

        config.ca_validity_days = 4_000_000;
        assert!(matches!(config.validate(), Err(CaError::InvalidInput(_))));

        let mut config = ProvisionConfig::default();
        config.node_validity_days = u32::MAX;
        assert!(matches!(config.validate(), Err(CaError::InvalidInput(_))));
    }
}
