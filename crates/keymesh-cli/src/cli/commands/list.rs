//! `keymesh-ca list` - Certificates in the keystore.

use anyhow::Result;
use colored::Colorize;
use keymesh_ca::{inspect, InventoryEntry, Keystore};

use super::Context;
use crate::cli::args::ListArgs;
use crate::explain::Explain;
use crate::output::{print_certificate, print_structured};

pub fn execute(ctx: &Context, args: &ListArgs) -> Result<()> {
    let mut config = ctx.provision_config();
    args.keystore.apply(&mut config);

    if ctx.explain {
        Explain::list(&config).print();
    }

    let keystore = Keystore::new(&config.keystore_dir);
    let entries = if keystore.root().is_dir() {
        inspect::inventory(&keystore)?
    } else {
        Vec::new()
    };

    if !print_structured(ctx.output_format, &entries)? {
        print_pretty(&keystore, &entries);
    }
    Ok(())
}

fn print_pretty(keystore: &Keystore, entries: &[InventoryEntry]) {
    if entries.is_empty() {
        println!(
            "{} {}",
            "No certificates in".dimmed(),
            keystore.root().display()
        );
        return;
    }

    println!(
        "{} {} ({} certificates)",
        "Keystore:".bold(),
        keystore.root().display(),
        entries.len()
    );
    for entry in entries {
        println!();
        let kind = if entry.certificate.is_ca { "CA" } else { "node" };
        println!("{} [{kind}]", entry.name.as_str().cyan().bold());
        print_certificate(&entry.certificate);
        if !entry.key_present {
            println!("  {}", "private key not present in keystore".yellow());
        }
    }
}
