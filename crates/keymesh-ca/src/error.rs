//! Error types for CA bootstrap and node issuance.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, CaError>;

/// Generation step that failed, reported with [`CaError::Generation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Generating the CA private key.
    CaKey,
    /// Self-signing the CA certificate.
    CaCertificate,
    /// Generating a node private key.
    NodeKey,
    /// Building the node CSR.
    NodeCsr,
    /// Signing the node CSR with the CA.
    NodeCertificate,
    /// Checking the fresh node certificate against the CA.
    Verify,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CaKey => "CA key generation",
            Self::CaCertificate => "CA self-signing",
            Self::NodeKey => "node key generation",
            Self::NodeCsr => "node CSR creation",
            Self::NodeCertificate => "node certificate signing",
            Self::Verify => "node certificate verification",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while provisioning a keystore.
#[derive(Error, Debug)]
pub enum CaError {
    /// The cryptographic toolchain is not reachable.
    #[error("missing dependency: {program} is not available ({reason})")]
    MissingDependency {
        /// Program that was looked up
        program: String,
        /// Why it was rejected
        reason: String,
    },

    /// Caller supplied an unusable value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Node material already exists; nothing was written.
    #[error("refusing to overwrite existing node material: {}", .existing.display())]
    Collision {
        /// The first pre-existing artifact found
        existing: PathBuf,
    },

    /// Exactly one of the CA key / certificate is present.
    #[error(
        "partial CA state: {} exists but {} is missing; remove it or restore the pair",
        .present.display(),
        .missing.display()
    )]
    PartialCa {
        /// The CA file that exists
        present: PathBuf,
        /// The CA file that does not
        missing: PathBuf,
    },

    /// Node issuance was requested before the CA exists.
    #[error("no CA in keystore {}", .dir.display())]
    CaNotInitialized {
        /// Keystore directory
        dir: PathBuf,
    },

    /// Key, CSR or certificate generation failed.
    #[error("{step} failed: {reason}")]
    Generation {
        /// Step that failed
        step: Step,
        /// Most specific diagnostic available
        reason: String,
    },

    /// An existing artifact could not be decoded.
    #[error("cannot parse {}: {reason}", .path.display())]
    Parse {
        /// Artifact path
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// Filesystem failure.
    #[error("io error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is unreadable or malformed.
    #[error("config error: {0}")]
    Config(String),
}

impl CaError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn generation(step: Step, reason: impl fmt::Display) -> Self {
        Self::Generation {
            step,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Process exit code for this failure class.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidInput(_) | Self::Config(_) => 2,
            Self::MissingDependency { .. } => 3,
            Self::Collision { .. } => 4,
            Self::PartialCa { .. } => 5,
            _ => 1,
        }
    }

    /// Returns true if node files may have been left behind.
    #[must_use]
    pub const fn may_leave_partial_artifacts(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_class() {
        let codes = [
            CaError::InvalidInput("x".into()).exit_code(),
            CaError::MissingDependency {
                program: "openssl".into(),
                reason: "not found".into(),
            }
            .exit_code(),
            CaError::Collision {
                existing: "keys/a.key".into(),
            }
            .exit_code(),
            CaError::PartialCa {
                present: "keys/ca.key".into(),
                missing: "keys/ca.crt".into(),
            }
            .exit_code(),
            CaError::generation(Step::NodeKey, "boom").exit_code(),
        ];
        assert_eq!(codes, [2, 3, 4, 5, 1]);
    }

    #[test]
    fn test_collision_message() {
        let err = CaError::Collision {
            existing: PathBuf::from("keys/host-a.key"),
        };
        let msg = err.to_string();
        assert!(msg.contains("refusing to overwrite"));
        assert!(msg.contains("host-a.key"));
    }

    #[test]
    fn test_generation_names_step() {
        let err = CaError::generation(Step::NodeCertificate, "bad signature");
        assert_eq!(err.to_string(), "node certificate signing failed: bad signature");
        assert!(err.may_leave_partial_artifacts());
    }
}
