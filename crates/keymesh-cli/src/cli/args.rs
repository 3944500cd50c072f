//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use keymesh_ca::{Backend, PartialCaPolicy, ProvisionConfig};

use crate::output::OutputFormat;

/// Private CA bootstrap and node certificate issuance for KeyMesh
///
/// Creates the mesh CA on first use, then issues one key, CSR and
/// certificate per node. Existing node material is never overwritten.
/// Use --explain on any command to see what it will write.
#[derive(Parser, Debug)]
#[command(name = "keymesh-ca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: per-user config.toml)
    #[arg(short, long, env = "KEYMESH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Explain what this command does before running it
    #[arg(long, global = true)]
    pub explain: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue key, CSR and certificate for a node (creates the CA if needed)
    Issue(IssueArgs),

    /// Create the CA without issuing a node
    InitCa(InitCaArgs),

    /// Print the allow-list fingerprint of a certificate
    Fingerprint(FingerprintArgs),

    /// List certificates in the keystore
    List(ListArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Shared keystore / CA options
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct KeystoreArgs {
    /// Keystore directory
    #[arg(short = 'd', long, env = "KEYMESH_KEYSTORE")]
    pub keystore: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct CaOptions {
    #[command(flatten)]
    pub keystore: KeystoreArgs,

    /// CA certificate validity in days
    #[arg(long, env = "KEYMESH_CA_DAYS")]
    pub ca_days: Option<u32>,

    /// RSA key size for new keys
    #[arg(long, env = "KEYMESH_KEY_BITS")]
    pub key_bits: Option<u32>,

    /// Crypto backend (native, openssl)
    #[arg(short, long, env = "KEYMESH_BACKEND")]
    pub backend: Option<Backend>,

    /// Program run by the openssl backend
    #[arg(long = "openssl", env = "KEYMESH_OPENSSL", value_name = "PROGRAM")]
    pub openssl_program: Option<PathBuf>,

    /// What to do when only one CA file exists (fail, regenerate)
    #[arg(long, env = "KEYMESH_PARTIAL_CA")]
    pub partial_ca: Option<PartialCaPolicy>,
}

impl KeystoreArgs {
    /// Overlay onto a config loaded from file.
    pub fn apply(&self, config: &mut ProvisionConfig) {
        if let Some(dir) = &self.keystore {
            config.keystore_dir.clone_from(dir);
        }
    }
}

impl CaOptions {
    /// Overlay flags and env vars onto a config loaded from file.
    pub fn apply(&self, config: &mut ProvisionConfig) {
        self.keystore.apply(config);
        if let Some(days) = self.ca_days {
            config.ca_validity_days = days;
        }
        if let Some(bits) = self.key_bits {
            config.key_bits = bits;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(program) = &self.openssl_program {
            config.openssl_program.clone_from(program);
        }
        if let Some(policy) = self.partial_ca {
            config.partial_ca = policy;
        }
    }
}

// ============================================================================
// Issue command
// ============================================================================

/// Every provisioning option: CA options plus node validity.
#[derive(Args, Debug, Default)]
pub struct ProvisionOptions {
    /// Node certificate validity in days
    #[arg(long, env = "KEYMESH_NODE_DAYS")]
    pub node_days: Option<u32>,

    #[command(flatten)]
    pub ca: CaOptions,
}

impl ProvisionOptions {
    /// Overlay flags and env vars onto a config loaded from file.
    pub fn apply(&self, config: &mut ProvisionConfig) {
        self.ca.apply(config);
        if let Some(days) = self.node_days {
            config.node_validity_days = days;
        }
    }
}

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Node identifier; becomes the certificate CN and file stem verbatim
    pub node_id: String,

    #[command(flatten)]
    pub options: ProvisionOptions,
}

impl IssueArgs {
    pub fn apply(&self, config: &mut ProvisionConfig) {
        self.options.apply(config);
    }
}

// ============================================================================
// Init-CA command
// ============================================================================

#[derive(Args, Debug)]
pub struct InitCaArgs {
    #[command(flatten)]
    pub ca: CaOptions,
}

// ============================================================================
// Fingerprint command
// ============================================================================

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Certificate file, or a node id looked up in the keystore
    pub target: String,

    #[command(flatten)]
    pub keystore: KeystoreArgs,
}

// ============================================================================
// List command
// ============================================================================

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub keystore: KeystoreArgs,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration (file, then env vars and flags)
    Show(ShowArgs),

    /// Set a configuration value
    Set {
        /// Key to set (e.g., keystore_dir, backend, output_format)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub options: ProvisionOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "keymesh-ca",
            "issue",
            "node-7",
            "--keystore",
            "/srv/keys",
            "--node-days",
            "30",
            "--backend",
            "openssl",
            "--partial-ca",
            "regenerate",
        ]);
        let Commands::Issue(args) = cli.command else {
            panic!("expected issue");
        };
        assert_eq!(args.node_id, "node-7");

        let mut config = ProvisionConfig::default();
        args.apply(&mut config);
        assert_eq!(config.keystore_dir, PathBuf::from("/srv/keys"));
        assert_eq!(config.node_validity_days, 30);
        assert_eq!(config.ca_validity_days, 3650);
        assert_eq!(config.backend, Backend::OpenSsl);
        assert_eq!(config.partial_ca, PartialCaPolicy::Regenerate);
    }

    #[test]
    fn test_config_show_takes_provision_overrides() {
        let cli = Cli::parse_from(["keymesh-ca", "config", "show", "--key-bits", "3072"]);
        let Commands::Config(ConfigArgs {
            command: ConfigCommands::Show(args),
        }) = cli.command
        else {
            panic!("expected config show");
        };

        let mut config = ProvisionConfig::default();
        args.options.apply(&mut config);
        assert_eq!(config.key_bits, 3072);
        assert_eq!(config.node_validity_days, 825);
    }

    #[test]
    fn test_unknown_backend_is_usage_error() {
        let err = Cli::try_parse_from(["keymesh-ca", "issue", "n", "--backend", "gnutls"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::parse_from(["keymesh-ca", "-vv", "list"]);
        assert_eq!(cli.verbose, 2);
        assert!(Cli::try_parse_from(["keymesh-ca", "-v", "-q", "list"]).is_err());
    }
}
