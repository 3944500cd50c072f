//! Cryptographic toolchains.
//!
//! Both backends write the same files with the same certificate profile:
//!
//! - CA: CN=KeyMesh-CA, SHA-256, basicConstraints CA:TRUE (critical),
//!   keyUsage keyCertSign + cRLSign + digitalSignature (critical).
//! - Node: CN=<node id>, SHA-256, basicConstraints CA:FALSE (critical),
//!   keyUsage digitalSignature + keyEncipherment (critical),
//!   extendedKeyUsage serverAuth + clientAuth.
//!
//! Private keys are PKCS#8 PEM; certificates and CSRs are PEM.

mod native;
mod openssl;

pub use native::Native;
pub use openssl::OpenSsl;

use std::path::Path;

use crate::config::{Backend, ProvisionConfig};
use crate::error::{Result, Step};
use crate::serial::Serial;

/// Inputs for signing a node CSR with the CA.
#[derive(Debug)]
pub(crate) struct SignRequest<'a> {
    pub csr: &'a Path,
    pub ca_cert: &'a Path,
    pub ca_key: &'a Path,
    pub out: &'a Path,
    pub serial: &'a Serial,
    pub validity_days: u32,
}

/// The toolchain selected by [`ProvisionConfig::backend`].
#[derive(Debug, Clone)]
pub enum Toolchain {
    /// In-process generation.
    Native(Native),
    /// External `openssl` program.
    OpenSsl(OpenSsl),
}

impl Toolchain {
    /// Build the toolchain a config asks for.
    pub fn from_config(config: &ProvisionConfig) -> Self {
        match config.backend {
            Backend::Native => Self::Native(Native),
            Backend::OpenSsl => Self::OpenSsl(OpenSsl::new(&config.openssl_program)),
        }
    }

    /// Backend this toolchain implements.
    pub const fn backend(&self) -> Backend {
        match self {
            Self::Native(_) => Backend::Native,
            Self::OpenSsl(_) => Backend::OpenSsl,
        }
    }

    /// Confirm the toolchain can run. Writes nothing.
    pub fn preflight(&self) -> Result<()> {
        match self {
            Self::Native(n) => n.preflight(),
            Self::OpenSsl(o) => o.preflight(),
        }
    }

    pub(crate) fn generate_key(&self, step: Step, path: &Path, bits: u32) -> Result<()> {
        match self {
            Self::Native(n) => n.generate_key(step, path, bits),
            Self::OpenSsl(o) => o.generate_key(step, path, bits),
        }
    }

    pub(crate) fn self_sign_ca(
        &self,
        key: &Path,
        cert: &Path,
        serial: &Serial,
        validity_days: u32,
    ) -> Result<()> {
        match self {
            Self::Native(n) => n.self_sign_ca(key, cert, serial, validity_days),
            Self::OpenSsl(o) => o.self_sign_ca(key, cert, serial, validity_days),
        }
    }

    pub(crate) fn create_csr(&self, key: &Path, csr: &Path, common_name: &str) -> Result<()> {
        match self {
            Self::Native(n) => n.create_csr(key, csr, common_name),
            Self::OpenSsl(o) => o.create_csr(key, csr, common_name),
        }
    }

    pub(crate) fn sign_csr(&self, request: &SignRequest<'_>) -> Result<()> {
        match self {
            Self::Native(n) => n.sign_csr(request),
            Self::OpenSsl(o) => o.sign_csr(request),
        }
    }
}
