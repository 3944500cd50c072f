//! `keymesh-ca issue` - Provision a node identity.

use anyhow::Result;
use colored::Colorize;
use keymesh_ca::{Provisioned, Provisioner};

use super::{print_ca_outcome, Context};
use crate::cli::args::IssueArgs;
use crate::explain::Explain;
use crate::output::{print_certificate, print_structured};
use crate::report::IssueFailure;

pub fn execute(ctx: &Context, args: &IssueArgs) -> Result<()> {
    let mut config = ctx.provision_config();
    args.apply(&mut config);

    if ctx.explain {
        Explain::issue(&config, &args.node_id).print();
    }

    let provisioner = Provisioner::new(config)?;
    let out = provisioner.provision(&args.node_id).map_err(|source| {
        let left_behind = if source.may_leave_partial_artifacts() {
            provisioner.keystore().existing_node_artifacts(&args.node_id)
        } else {
            Vec::new()
        };
        IssueFailure {
            source,
            left_behind,
        }
    })?;

    if !print_structured(ctx.output_format, &out)? {
        print_pretty(&out);
    }
    Ok(())
}

fn print_pretty(out: &Provisioned) {
    let node = &out.node;

    print_ca_outcome(&out.ca);
    println!(
        "{} {}",
        "Issued:".green().bold(),
        node.node_id.as_str().cyan().bold()
    );
    println!();
    println!("  {} {}", "key:".bold(), node.key.display());
    println!("  {} {}", "csr:".bold(), node.csr.display());
    println!("  {} {}", "cert:".bold(), node.cert.display());
    println!("  {} {}", "ca:".bold(), node.ca_cert.display());
    println!();
    print_certificate(&node.certificate);
    println!();
    println!("Add this fingerprint to peers' allow-lists:");
    println!("  {}", node.certificate.fingerprint);
}
