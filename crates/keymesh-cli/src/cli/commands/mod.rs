//! Command implementations.

pub mod config;
pub mod fingerprint;
pub mod init_ca;
pub mod issue;
pub mod list;

use std::path::PathBuf;

use colored::Colorize;
use keymesh_ca::{CaOutcome, CaStatus, ProvisionConfig};

use crate::config::Config;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration file (or defaults)
    pub config: Config,

    /// `--config` path, if one was given
    pub config_path: Option<PathBuf>,

    /// Output format
    pub output_format: OutputFormat,

    /// Whether to explain before running
    pub explain: bool,
}

impl Context {
    /// Provisioning settings from the config file, before flag overrides.
    pub fn provision_config(&self) -> ProvisionConfig {
        self.config.provision.clone()
    }
}

/// One progress line describing what CA ensure did.
fn print_ca_outcome(ca: &CaOutcome) {
    let status = match ca.status {
        CaStatus::Created => "created".green().bold(),
        CaStatus::Reused => "reused".cyan(),
        CaStatus::Regenerated => "regenerated".yellow().bold(),
    };
    println!(
        "{} {} {}",
        "CA:".bold(),
        status,
        ca.certificate.path.display()
    );
}
