//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use keymesh_ca::{CaError, ProvisionConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::output::OutputFormat;

/// CLI configuration file.
///
/// ```toml
/// output_format = "json"
///
/// [provision]
/// keystore_dir = "/srv/keymesh/keys"
/// backend = "openssl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Always show explanations (as if --explain was passed).
    #[serde(default)]
    pub explain_by_default: bool,

    /// Keystore, validity, key size and backend settings.
    #[serde(default)]
    pub provision: ProvisionConfig,
}

impl Config {
    /// Get the per-user config file path.
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("io", "keymesh", "keymesh-ca")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// File to read and write: `explicit` if given, else the per-user path.
    pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf> {
        explicit.map_or_else(Self::path, |p| Ok(p.to_path_buf()))
    }

    /// Load configuration. An explicit path must exist; a missing per-user
    /// file means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit.filter(|p| !p.exists()) {
            return Err(CaError::Config(format!(
                "config file {} does not exist",
                path.display()
            ))
            .into());
        }
        Self::load_or_default(explicit)
    }

    /// Load configuration, treating any missing file as defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::resolve(explicit)?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content)
            .map_err(|e| CaError::Config(format!("{}: {e}", path.display())).into())
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Set one key by name, validating the result.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let p = &mut self.provision;
        match key {
            "output_format" | "output" => self.output_format = Some(parse_value(key, value)?),
            "explain_by_default" | "explain" => self.explain_by_default = parse_value(key, value)?,
            "keystore_dir" | "keystore" => p.keystore_dir = PathBuf::from(value),
            "ca_validity_days" | "ca_days" => p.ca_validity_days = parse_value(key, value)?,
            "node_validity_days" | "node_days" => p.node_validity_days = parse_value(key, value)?,
            "key_bits" => p.key_bits = parse_value(key, value)?,
            "backend" => p.backend = parse_value(key, value)?,
            "openssl_program" | "openssl" => p.openssl_program = PathBuf::from(value),
            "partial_ca" => p.partial_ca = parse_value(key, value)?,
            _ => {
                return Err(CaError::InvalidInput(format!(
                    "Unknown config key: {key}\n\n\
                     Available keys:\n  \
                     output_format       - Default output format (pretty/json/yaml)\n  \
                     explain_by_default  - Always explain commands (true/false)\n  \
                     keystore_dir        - Keystore directory\n  \
                     ca_validity_days    - CA certificate validity\n  \
                     node_validity_days  - Node certificate validity\n  \
                     key_bits            - RSA key size (2048-8192)\n  \
                     backend             - Crypto backend (native/openssl)\n  \
                     openssl_program     - openssl executable\n  \
                     partial_ca          - Half-present CA handling (fail/regenerate)"
                ))
                .into());
            }
        }
        self.provision.validate()?;
        Ok(())
    }
}

/// Parse a `config set` value; bad values are invalid input like bad keys.
fn parse_value<T>(key: &str, value: &str) -> std::result::Result<T, CaError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| CaError::InvalidInput(format!("bad value '{value}' for {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keymesh_ca::{Backend, PartialCaPolicy};
    use tempfile::TempDir;

    #[test]
    fn test_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CaError>(),
            Some(CaError::Config(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_default_when_lenient() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_or_default(Some(&tmp.path().join("new.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[provision]\nkey_bits = \"many\"\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CaError>().map(CaError::exit_code),
            Some(2)
        );
    }

    #[test]
    fn test_nested_provision_table() {
        let config = Config::from_toml(
            r#"
            output_format = "yaml"

            [provision]
            keystore_dir = "/srv/keys"
            partial_ca = "regenerate"
            "#,
        )
        .unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Yaml));
        assert_eq!(config.provision.keystore_dir, PathBuf::from("/srv/keys"));
        assert_eq!(config.provision.partial_ca, PartialCaPolicy::Regenerate);
        assert_eq!(config.provision.node_validity_days, 825);
    }

    #[test]
    fn test_set_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sub/config.toml");

        let mut config = Config::default();
        config.set("backend", "openssl").unwrap();
        config.set("node_days", "90").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.provision.backend, Backend::OpenSsl);
        assert_eq!(loaded.provision.node_validity_days, 90);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("key_bits", "1024").is_err());
        assert!(config.set("key_bits", "lots").is_err());
        assert!(config.set("colour", "blue").is_err());
    }

    #[test]
    fn test_unparsable_value_is_invalid_input() {
        let mut config = Config::default();
        for (key, value) in [("key_bits", "lots"), ("explain", "maybe"), ("backend", "gnutls")] {
            let err = config.set(key, value).unwrap_err();
            assert_eq!(
                err.downcast_ref::<CaError>().map(CaError::exit_code),
                Some(2),
                "{key}={value}"
            );
        }
    }
}
