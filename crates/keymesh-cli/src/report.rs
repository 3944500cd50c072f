//! Failure reporting: one `error:` line, an optional hint, an exit code.

use std::fmt::Write as _;
use std::path::PathBuf;

use colored::Colorize;
use keymesh_ca::CaError;
use thiserror::Error;

/// A failed issuance together with the node files it left behind.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct IssueFailure {
    /// Underlying provisioning error
    pub source: CaError,
    /// Node artifacts present after the failure
    pub left_behind: Vec<PathBuf>,
}

fn ca_error(err: &anyhow::Error) -> Option<&CaError> {
    err.downcast_ref::<IssueFailure>()
        .map(|f| &f.source)
        .or_else(|| err.downcast_ref::<CaError>())
}

/// Process exit code for a command failure.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    ca_error(err).map_or(1, CaError::exit_code)
}

/// Operator guidance printed under the error line.
pub fn hint(err: &anyhow::Error) -> Option<String> {
    if let Some(failure) = err.downcast_ref::<IssueFailure>() {
        if !failure.left_behind.is_empty() {
            let mut msg = String::from("partial node artifacts were left in place:");
            for path in &failure.left_behind {
                let _ = write!(msg, " {}", path.display());
            }
            msg.push_str("; remove them before retrying");
            return Some(msg);
        }
    }

    match ca_error(err)? {
        CaError::Collision { .. } => Some(
            "node identities are never rotated in place; remove the old files deliberately or choose another node id"
                .to_string(),
        ),
        CaError::PartialCa { .. } => Some(
            "restore the missing CA file, delete the remaining one, or rerun with --partial-ca regenerate"
                .to_string(),
        ),
        CaError::CaNotInitialized { .. } => Some("run `keymesh-ca init-ca` first".to_string()),
        CaError::MissingDependency { .. } => {
            Some("install openssl or use --backend native".to_string())
        }
        _ => None,
    }
}

/// Print a failure to stderr.
pub fn print(err: &anyhow::Error) {
    eprintln!("{} {err}", "error:".red().bold());
    if let Some(hint) = hint(err) {
        eprintln!("{} {hint}", "hint:".yellow().bold());
    }
}
