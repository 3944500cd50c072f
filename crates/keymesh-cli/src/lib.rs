//! # keymesh-cli
//!
//! Command-line front end for [`keymesh_ca`].
//!
//! ## Features
//!
//! - **Provisioning**: `issue` bootstraps the CA on first use and signs a node
//! - **CA only**: `init-ca` prepares a keystore ahead of time
//! - **Allow-lists**: `fingerprint` and `list` print `sha256:` fingerprints
//! - **Explain mode**: `--explain` describes the files and steps first
//! - **Multiple output formats**: pretty, JSON, YAML

pub mod cli;
pub mod config;
pub mod explain;
pub mod logging;
pub mod output;
pub mod report;

pub use cli::run;
