//! `keymesh-ca fingerprint` - Allow-list fingerprint of a certificate.

use std::path::PathBuf;

use anyhow::Result;
use keymesh_ca::{inspect, Keystore};
use serde::Serialize;

use super::Context;
use crate::cli::args::FingerprintArgs;
use crate::explain::Explain;
use crate::output::print_structured;

#[derive(Debug, Serialize)]
struct FingerprintOutput {
    certificate: PathBuf,
    fingerprint: String,
}

/// An existing file is used as-is; anything else names a node in the keystore.
fn resolve_target(target: &str, keystore: &Keystore) -> PathBuf {
    let as_path = PathBuf::from(target);
    if as_path.is_file() {
        as_path
    } else {
        keystore.node(target).cert
    }
}

pub fn execute(ctx: &Context, args: &FingerprintArgs) -> Result<()> {
    let mut config = ctx.provision_config();
    args.keystore.apply(&mut config);

    if ctx.explain {
        Explain::fingerprint().print();
    }

    let keystore = Keystore::new(&config.keystore_dir);
    let certificate = resolve_target(&args.target, &keystore);
    let fingerprint = inspect::fingerprint_file(&certificate)?;

    let out = FingerprintOutput {
        certificate,
        fingerprint: fingerprint.as_str().to_string(),
    };
    if !print_structured(ctx.output_format, &out)? {
        println!("{}", out.fingerprint);
    }
    Ok(())
}
