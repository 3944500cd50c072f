//! `--explain`: describe the files and toolchain steps before running.

use colored::Colorize;
use keymesh_ca::{Backend, CaState, Keystore, ProvisionConfig, CA_COMMON_NAME};

/// Command explanation builder.
#[derive(Debug, Default)]
pub struct Explain {
    description: String,
    toolchain: Option<String>,
    what_happens: Vec<String>,
    writes: Vec<String>,
}

impl Explain {
    fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            ..Self::default()
        }
    }

    fn toolchain(mut self, config: &ProvisionConfig) -> Self {
        self.toolchain = Some(match config.backend {
            Backend::Native => "native (built-in RSA and X.509)".to_string(),
            Backend::OpenSsl => format!("openssl ({})", config.openssl_program.display()),
        });
        self
    }

    fn step(mut self, step: impl Into<String>) -> Self {
        self.what_happens.push(step.into());
        self
    }

    fn writes(mut self, file: impl Into<String>) -> Self {
        self.writes.push(file.into());
        self
    }

    /// Print the explanation to stderr so structured stdout stays clean.
    pub fn print(&self) {
        eprintln!();
        eprintln!("{}", "=== What This Does ===".bold().cyan());
        eprintln!("{}", self.description);
        eprintln!();

        if !self.what_happens.is_empty() {
            eprintln!("{}", "How it works:".bold());
            for (i, step) in self.what_happens.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, step);
            }
            eprintln!();
        }

        if let Some(toolchain) = &self.toolchain {
            eprintln!("{} {}", "Toolchain:".bold(), toolchain);
        }

        if !self.writes.is_empty() {
            eprintln!("{}", "May write:".bold());
            for file in &self.writes {
                eprintln!("  {}", file.dimmed());
            }
        }

        eprintln!();
        eprintln!("{}", "=== Results ===".bold().cyan());
        eprintln!();
    }

    // ========================================================================
    // Factory methods for each command
    // ========================================================================

    pub fn issue(config: &ProvisionConfig, node_id: &str) -> Self {
        let ks = Keystore::new(&config.keystore_dir);
        let node = ks.node(node_id);

        Self::new(&format!(
            "Issues a mesh identity for node '{node_id}' signed by the keystore CA."
        ))
        .toolchain(config)
        .step("Checks the crypto toolchain is available")
        .step(format!(
            "Refuses to continue if {} or {} already exists",
            node.key.display(),
            node.cert.display()
        ))
        .ca_steps(config, &ks)
        .step(format!(
            "Generates a {}-bit RSA key for the node",
            config.key_bits
        ))
        .step(format!("Builds a CSR with CN={node_id}"))
        .step(format!(
            "Signs it with the CA for {} days using the next serial from {}",
            config.node_validity_days,
            ks.serial_file().display()
        ))
        .step("Verifies the new certificate against the CA public key")
        .writes(node.key.display().to_string())
        .writes(node.csr.display().to_string())
        .writes(node.cert.display().to_string())
        .writes(ks.serial_file().display().to_string())
    }

    pub fn init_ca(config: &ProvisionConfig) -> Self {
        let ks = Keystore::new(&config.keystore_dir);
        Self::new("Creates the mesh CA so nodes can be issued later. An existing CA is left untouched.")
            .toolchain(config)
            .step("Checks the crypto toolchain is available")
            .ca_steps(config, &ks)
    }

    fn ca_steps(self, config: &ProvisionConfig, ks: &Keystore) -> Self {
        match ks.ca_state() {
            CaState::Complete => self.step(format!(
                "Reuses the existing CA in {}",
                ks.root().display()
            )),
            CaState::Partial { present, missing } => self.step(format!(
                "Finds {} without {}; policy '{}' decides whether to stop or regenerate",
                present.display(),
                missing.display(),
                config.partial_ca
            )),
            CaState::Absent => self
                .step(format!(
                    "Generates a {}-bit RSA CA key",
                    config.key_bits
                ))
                .step(format!(
                    "Self-signs CN={CA_COMMON_NAME} for {} days",
                    config.ca_validity_days
                ))
                .writes(ks.ca_key().display().to_string())
                .writes(ks.ca_cert().display().to_string()),
        }
    }

    pub fn fingerprint() -> Self {
        Self::new("Prints the SHA-256 fingerprint of a certificate as peers store it in their allow-list.")
            .step("Reads the first CERTIFICATE block of the PEM file")
            .step("Hashes the DER bytes with SHA-256")
            .step("Prints sha256:<lowercase hex>")
    }

    pub fn list(config: &ProvisionConfig) -> Self {
        Self::new(&format!(
            "Lists the CA and node certificates in {}. Nothing is written.",
            config.keystore_dir.display()
        ))
        .step("Parses ca.crt and every <node>.crt")
        .step("Reports subject, serial, validity and fingerprint")
        .step("Checks whether each matching .key file exists")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_issue_on_empty_keystore_mentions_ca_files() {
        let tmp = TempDir::new().unwrap();
        let config = ProvisionConfig::with_keystore(tmp.path());
        let explain = Explain::issue(&config, "n1");

        let files = explain.writes.join(" ");
        assert!(files.contains("ca.key"));
        assert!(files.contains("n1.crt"));
        assert!(explain.what_happens.iter().any(|s| s.contains("CN=n1")));
    }

    #[test]
    fn test_issue_with_existing_ca_reuses_it() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("ca.key"), "k").unwrap();
        std::fs::write(tmp.path().join("ca.crt"), "c").unwrap();
        let config = ProvisionConfig::with_keystore(tmp.path());
        let explain = Explain::issue(&config, "n1");

        assert!(!explain.writes.iter().any(|f| f.ends_with("ca.key")));
        assert!(explain.what_happens.iter().any(|s| s.starts_with("Reuses")));
    }
}
