//! # keymesh-ca
//!
//! Private certificate authority for the KeyMesh file-sharing mesh.
//!
//! Provisioning is a one-shot step run before a node joins the mesh:
//!
//! ```text
//! keys/ (keystore)
//!   ├── ca.key / ca.crt     created once, then only read
//!   ├── ca.srl              serial counter, bumped per signing
//!   └── <node>.key/.csr/.crt  created once per node, never overwritten
//! ```
//!
//! The mesh later reads `ca.crt` to validate peers and `<node>.crt` /
//! `<node>.key` to present its own identity. Peers are allow-listed by
//! [`Fingerprint`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use keymesh_ca::{ProvisionConfig, Provisioner};
//!
//! let provisioner = Provisioner::new(ProvisionConfig::with_keystore("keys"))?;
//! let out = provisioner.provision("node-1")?;
//! println!("{} {}", out.node.cert.display(), out.node.certificate.fingerprint);
//! # Ok::<(), keymesh_ca::CaError>(())
//! ```

pub mod config;
mod error;
pub mod inspect;
pub mod keystore;
mod provision;
pub mod serial;
pub mod toolchain;

pub use config::{Backend, PartialCaPolicy, ProvisionConfig};
pub use error::{CaError, Result, Step};
pub use inspect::{CertSummary, Fingerprint, InventoryEntry};
pub use keystore::{CaState, Keystore, NodePaths};
pub use provision::{
    validate_node_id, CaOutcome, CaStatus, IssuedNode, Provisioned, Provisioner,
};
pub use toolchain::Toolchain;

/// Subject CN of every KeyMesh CA certificate.
pub const CA_COMMON_NAME: &str = "KeyMesh-CA";
