//! External backend driving the `openssl` command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::NamedTempFile;
use tracing::debug;

use super::SignRequest;
use crate::error::{CaError, Result, Step};
use crate::keystore::restrict_permissions;
use crate::serial::Serial;
use crate::CA_COMMON_NAME;

/// Extension profile handed to `req` and `x509` so no system openssl.cnf is
/// consulted.
const PROFILE: &str = "\
[ req ]
distinguished_name = req_dn
string_mask = utf8only

[ req_dn ]

[ keymesh_ca ]
basicConstraints = critical, CA:TRUE
keyUsage = critical, keyCertSign, cRLSign, digitalSignature
subjectKeyIdentifier = hash

[ keymesh_node ]
basicConstraints = critical, CA:FALSE
keyUsage = critical, digitalSignature, keyEncipherment
extendedKeyUsage = serverAuth, clientAuth
";

/// Runs `openssl` subcommands.
#[derive(Debug, Clone)]
pub struct OpenSsl {
    program: PathBuf,
}

impl OpenSsl {
    /// Backend invoking `program` (a name looked up on `PATH`, or a path).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub(crate) fn preflight(&self) -> Result<()> {
        let missing = |reason: String| CaError::MissingDependency {
            program: self.program.display().to_string(),
            reason,
        };

        let resolved = which::which(&self.program).map_err(|e| missing(e.to_string()))?;
        let output = Command::new(&resolved)
            .arg("version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| missing(e.to_string()))?;
        if !output.status.success() {
            return Err(missing(format!("`version` exited with {}", output.status)));
        }

        debug!(
            program = %resolved.display(),
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "openssl toolchain found"
        );
        Ok(())
    }

    pub(crate) fn generate_key(&self, step: Step, path: &Path, bits: u32) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(["genpkey", "-algorithm", "RSA", "-pkeyopt"])
            .arg(format!("rsa_keygen_bits:{bits}"))
            .arg("-out")
            .arg(path);
        self.run(step, &mut cmd)?;
        restrict_permissions(path)
    }

    pub(crate) fn self_sign_ca(
        &self,
        key: &Path,
        cert: &Path,
        serial: &Serial,
        validity_days: u32,
    ) -> Result<()> {
        let profile = write_profile(Step::CaCertificate)?;
        let mut cmd = self.command();
        cmd.args(["req", "-x509", "-new", "-sha256", "-utf8"])
            .arg("-key")
            .arg(key)
            .arg("-days")
            .arg(validity_days.to_string())
            .arg("-subj")
            .arg(subject(CA_COMMON_NAME))
            .arg("-set_serial")
            .arg(format!("0x{serial}"))
            .arg("-config")
            .arg(profile.path())
            .args(["-extensions", "keymesh_ca"])
            .arg("-out")
            .arg(cert);
        self.run(Step::CaCertificate, &mut cmd)
    }

    pub(crate) fn create_csr(&self, key: &Path, csr: &Path, common_name: &str) -> Result<()> {
        let profile = write_profile(Step::NodeCsr)?;
        let mut cmd = self.command();
        cmd.args(["req", "-new", "-sha256", "-utf8"])
            .arg("-key")
            .arg(key)
            .arg("-subj")
            .arg(subject(common_name))
            .arg("-config")
            .arg(profile.path())
            .arg("-out")
            .arg(csr);
        self.run(Step::NodeCsr, &mut cmd)
    }

    pub(crate) fn sign_csr(&self, request: &SignRequest<'_>) -> Result<()> {
        let profile = write_profile(Step::NodeCertificate)?;
        let mut cmd = self.command();
        cmd.args(["x509", "-req", "-sha256"])
            .arg("-in")
            .arg(request.csr)
            .arg("-CA")
            .arg(request.ca_cert)
            .arg("-CAkey")
            .arg(request.ca_key)
            .arg("-set_serial")
            .arg(format!("0x{}", request.serial))
            .arg("-days")
            .arg(request.validity_days.to_string())
            .arg("-extfile")
            .arg(profile.path())
            .args(["-extensions", "keymesh_node"])
            .arg("-out")
            .arg(request.out);
        self.run(Step::NodeCertificate, &mut cmd)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn run(&self, step: Step, cmd: &mut Command) -> Result<()> {
        debug!(program = %self.program.display(), args = ?cmd.get_args().collect::<Vec<_>>(), "running toolchain");
        let output = cmd.output().map_err(|e| {
            CaError::generation(step, format!("cannot run {}: {e}", self.program.display()))
        })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(CaError::generation(step, diagnostic(&output)))
        }
    }
}

/// `-subj` argument for a single CN, escaping openssl's separators.
fn subject(common_name: &str) -> String {
    let mut out = String::from("/CN=");
    for c in common_name.chars() {
        if matches!(c, '\\' | '/' | '+') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn write_profile(step: Step) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("keymesh-openssl-")
        .suffix(".cnf")
        .tempfile()
        .map_err(|e| CaError::generation(step, format!("cannot write openssl profile: {e}")))?;
    file.write_all(PROFILE.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| CaError::generation(step, format!("cannot write openssl profile: {e}")))?;
    Ok(file)
}

/// Last meaningful stderr line, or the exit status.
fn diagnostic(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.chars().all(|c| matches!(c, '.' | '+' | '*')))
        .map_or_else(
            || format!("openssl exited with {}", output.status),
            str::to_string,
        )
}
