//! Read-only certificate inspection: summaries, fingerprints and the
//! signing-time issuer check.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use x509_parser::prelude::*;
use x509_parser::time::ASN1Time;

use crate::error::{CaError, Result};
use crate::keystore::{read_text, Keystore};

/// Prefix used by the mesh allow-list.
pub const FINGERPRINT_PREFIX: &str = "sha256:";

/// SHA-256 over a DER certificate, rendered as `sha256:<lowercase hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of DER bytes.
    pub fn of_der(der: &[u8]) -> Self {
        let digest = ring::digest::digest(&ring::digest::SHA256, der);
        Self(format!("{FINGERPRINT_PREFIX}{}", hex::encode(digest.as_ref())))
    }

    /// The full `sha256:` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed view of one certificate file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertSummary {
    /// Source file
    pub path: PathBuf,
    /// Subject common name
    pub subject: String,
    /// Issuer common name
    pub issuer: String,
    /// Serial (uppercase hex)
    pub serial: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// basicConstraints CA flag
    pub is_ca: bool,
    /// Public key size in bits
    pub key_bits: usize,
    /// Allow-list fingerprint
    pub fingerprint: Fingerprint,
}

impl CertSummary {
    /// Whole days between not-before and not-after.
    pub fn validity_days(&self) -> i64 {
        (self.not_after - self.not_before).num_days()
    }

    /// Has the certificate expired?
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.not_after
    }
}

/// One certificate in a keystore listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// File stem (`ca` or the node id)
    pub name: String,
    /// Parsed certificate
    pub certificate: CertSummary,
    /// Whether the matching `.key` file exists
    pub key_present: bool,
}

/// Decode the first CERTIFICATE block of a PEM file into DER.
pub fn read_certificate_der(path: &Path) -> Result<Vec<u8>> {
    let text = read_text(path)?;
    certificate_der_from_pem(&text).map_err(|reason| CaError::parse(path, reason))
}

fn certificate_der_from_pem(text: &str) -> std::result::Result<Vec<u8>, String> {
    let blocks = ::pem::parse_many(text).map_err(|e| e.to_string())?;
    blocks
        .into_iter()
        .find(|p| p.tag() == "CERTIFICATE")
        .map(|p| p.into_contents())
        .ok_or_else(|| "no CERTIFICATE block".to_string())
}

/// Fingerprint of a PEM certificate file.
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint> {
    Ok(Fingerprint::of_der(&read_certificate_der(path)?))
}

/// Parse a PEM certificate file into a summary.
pub fn summarize(path: &Path) -> Result<CertSummary> {
    let der = read_certificate_der(path)?;
    let (_, cert) =
        X509Certificate::from_der(&der).map_err(|e| CaError::parse(path, e.to_string()))?;

    let key_bits = cert
        .public_key()
        .parsed()
        .map(|key| key.key_size())
        .unwrap_or_default();

    Ok(CertSummary {
        path: path.to_path_buf(),
        subject: common_name(cert.subject()),
        issuer: common_name(cert.issuer()),
        serial: hex::encode_upper(cert.serial.to_bytes_be()),
        not_before: asn1_to_utc(cert.validity().not_before),
        not_after: asn1_to_utc(cert.validity().not_after),
        is_ca: cert.is_ca(),
        key_bits,
        fingerprint: Fingerprint::of_der(&der),
    })
}

/// Check that `cert_path` names `ca_path`'s subject as issuer and carries a
/// signature made by its key.
pub fn verify_issued_by(cert_path: &Path, ca_path: &Path) -> Result<()> {
    let cert_der = read_certificate_der(cert_path)?;
    let ca_der = read_certificate_der(ca_path)?;
    verify_der(&cert_der, &ca_der).map_err(|reason| CaError::parse(cert_path, reason))
}

fn verify_der(cert_der: &[u8], ca_der: &[u8]) -> std::result::Result<(), String> {
    let (_, cert) = X509Certificate::from_der(cert_der).map_err(|e| e.to_string())?;
    let (_, ca) = X509Certificate::from_der(ca_der).map_err(|e| e.to_string())?;

    if cert.issuer().as_raw() != ca.subject().as_raw() {
        return Err(format!(
            "issuer '{}' does not match CA subject '{}'",
            cert.issuer(),
            ca.subject()
        ));
    }
    cert.verify_signature(Some(ca.public_key()))
        .map_err(|e| format!("signature does not verify against CA key: {e}"))
}

/// Summaries of the CA and every node certificate in a keystore.
pub fn inventory(keystore: &Keystore) -> Result<Vec<InventoryEntry>> {
    let mut entries = Vec::new();

    let ca_cert = keystore.ca_cert();
    if ca_cert.exists() {
        entries.push(InventoryEntry {
            name: crate::keystore::CA_STEM.to_string(),
            certificate: summarize(&ca_cert)?,
            key_present: keystore.ca_key().exists(),
        });
    }

    for id in keystore.node_ids()? {
        let paths = keystore.node(&id);
        entries.push(InventoryEntry {
            certificate: summarize(&paths.cert)?,
            key_present: paths.key.exists(),
            name: id,
        });
    }

    Ok(entries)
}

fn common_name(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map_or_else(|| name.to_string(), str::to_string)
}

fn asn1_to_utc(t: ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or_else(Utc::now)
}
