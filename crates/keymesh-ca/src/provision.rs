//! The provisioning workflow: preflight, CA ensure and node issuance.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{PartialCaPolicy, ProvisionConfig};
use crate::error::{CaError, Result, Step};
use crate::inspect::{self, CertSummary};
use crate::keystore::{CaState, Keystore, CA_STEM};
use crate::serial::{Serial, SerialCounter};
use crate::toolchain::{SignRequest, Toolchain};

/// What CA ensure did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaStatus {
    /// No CA existed; a new pair was written.
    Created,
    /// Both CA files existed and were left alone.
    Reused,
    /// One CA file existed; both were replaced.
    Regenerated,
}

/// Outcome of CA ensure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaOutcome {
    /// What happened
    pub status: CaStatus,
    /// CA private key path
    pub key: PathBuf,
    /// CA certificate, as found or written
    pub certificate: CertSummary,
}

/// Material written for one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedNode {
    /// Node identifier (CN and file stem)
    pub node_id: String,
    /// Private key path
    pub key: PathBuf,
    /// CSR path
    pub csr: PathBuf,
    /// Signed certificate path
    pub cert: PathBuf,
    /// CA certificate the node chains to
    pub ca_cert: PathBuf,
    /// Parsed node certificate
    pub certificate: CertSummary,
}

/// Result of a full provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provisioned {
    /// CA ensure outcome
    pub ca: CaOutcome,
    /// Issued node material
    pub node: IssuedNode,
}

/// Reject identifiers that cannot name node material.
pub fn validate_node_id(node_id: &str) -> Result<()> {
    if node_id.is_empty() {
        return Err(CaError::InvalidInput("node id must not be empty".into()));
    }
    if node_id == CA_STEM {
        return Err(CaError::InvalidInput(format!(
            "node id '{CA_STEM}' is reserved for the CA files"
        )));
    }
    Ok(())
}

/// Runs the provisioning steps against one keystore.
#[derive(Debug, Clone)]
pub struct Provisioner {
    config: ProvisionConfig,
    keystore: Keystore,
    toolchain: Toolchain,
}

impl Provisioner {
    /// Build a provisioner. Fails with [`CaError::InvalidInput`] on an
    /// unusable config; touches nothing on disk.
    pub fn new(config: ProvisionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            keystore: Keystore::new(&config.keystore_dir),
            toolchain: Toolchain::from_config(&config),
            config,
        })
    }

    /// Effective configuration.
    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Keystore being provisioned.
    pub fn keystore(&self) -> &Keystore {
        &self.keystore
    }

    /// Toolchain in use.
    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Confirm the toolchain is reachable.
    pub fn preflight(&self) -> Result<()> {
        self.toolchain.preflight()
    }

    /// Create the CA pair if absent; reuse it if complete.
    pub fn ensure_ca(&self) -> Result<CaOutcome> {
        let status = match self.keystore.ca_state() {
            CaState::Complete => {
                info!(dir = %self.keystore.root().display(), "reusing existing CA");
                CaStatus::Reused
            }
            CaState::Absent => {
                self.create_ca()?;
                CaStatus::Created
            }
            CaState::Partial { present, missing } => match self.config.partial_ca {
                PartialCaPolicy::Fail => return Err(CaError::PartialCa { present, missing }),
                PartialCaPolicy::Regenerate => {
                    warn!(
                        present = %present.display(),
                        missing = %missing.display(),
                        "partial CA found; regenerating both files, certificates signed by the old key will no longer chain"
                    );
                    self.create_ca()?;
                    CaStatus::Regenerated
                }
            },
        };

        Ok(CaOutcome {
            status,
            key: self.keystore.ca_key(),
            certificate: inspect::summarize(&self.keystore.ca_cert())?,
        })
    }

    fn create_ca(&self) -> Result<()> {
        self.keystore.ensure_dir()?;
        let key = self.keystore.ca_key();
        let cert = self.keystore.ca_cert();

        self.toolchain
            .generate_key(Step::CaKey, &key, self.config.key_bits)?;
        self.toolchain.self_sign_ca(
            &key,
            &cert,
            &Serial::random(),
            self.config.ca_validity_days,
        )?;

        info!(
            cert = %cert.display(),
            days = self.config.ca_validity_days,
            backend = %self.toolchain.backend(),
            "created CA"
        );
        Ok(())
    }

    /// Issue key, CSR and certificate for `node_id` from an existing CA.
    pub fn issue_node(&self, node_id: &str) -> Result<IssuedNode> {
        validate_node_id(node_id)?;
        self.keystore.guard_node(node_id)?;
        if self.keystore.ca_state() != CaState::Complete {
            return Err(CaError::CaNotInitialized {
                dir: self.keystore.root().to_path_buf(),
            });
        }

        let paths = self.keystore.node(node_id);
        let ca_key = self.keystore.ca_key();
        let ca_cert = self.keystore.ca_cert();

        self.toolchain
            .generate_key(Step::NodeKey, &paths.key, self.config.key_bits)?;
        self.toolchain.create_csr(&paths.key, &paths.csr, node_id)?;

        let serial = SerialCounter::new(self.keystore.serial_file()).next()?;
        self.toolchain.sign_csr(&SignRequest {
            csr: &paths.csr,
            ca_cert: &ca_cert,
            ca_key: &ca_key,
            out: &paths.cert,
            serial: &serial,
            validity_days: self.config.node_validity_days,
        })?;

        inspect::verify_issued_by(&paths.cert, &ca_cert)
            .map_err(|e| CaError::generation(Step::Verify, e))?;
        let certificate = inspect::summarize(&paths.cert)?;

        info!(
            node = node_id,
            serial = %serial,
            fingerprint = %certificate.fingerprint,
            "issued node certificate"
        );

        Ok(IssuedNode {
            node_id: node_id.to_string(),
            key: paths.key,
            csr: paths.csr,
            cert: paths.cert,
            ca_cert,
            certificate,
        })
    }

    /// Preflight, collision guard, CA ensure and issuance, in that order.
    pub fn provision(&self, node_id: &str) -> Result<Provisioned> {
        validate_node_id(node_id)?;
        self.preflight()?;
        self.keystore.guard_node(node_id)?;
        let ca = self.ensure_ca()?;
        let node = self.issue_node(node_id)?;
        Ok(Provisioned { ca, node })
    }

    /// Preflight and CA ensure without issuing a node.
    pub fn bootstrap(&self) -> Result<CaOutcome> {
        self.preflight()?;
        self.ensure_ca()
    }
}
