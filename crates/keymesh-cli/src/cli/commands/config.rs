//! `keymesh-ca config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands, ShowArgs};
use crate::config::Config;
use crate::output::{print_structured, OutputFormat};

pub fn execute(ctx: &Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show(show) => show_config(ctx, &show),
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value),
        ConfigCommands::Path => show_path(ctx),
    }
}

/// Print the configuration commands would run with: the file, then
/// `KEYMESH_*` env vars and flags on top.
fn show_config(ctx: &Context, args: &ShowArgs) -> Result<()> {
    let mut effective = ctx.config.clone();
    args.options.apply(&mut effective.provision);
    let config = &effective;
    if print_structured(ctx.output_format, config)? {
        return Ok(());
    }

    let p = &config.provision;
    println!("{}", "Effective Configuration:".bold());
    println!();
    println!(
        "  {} {}",
        "output_format:".bold(),
        config.output_format.unwrap_or(OutputFormat::Pretty)
    );
    println!("  {} {}", "explain_by_default:".bold(), config.explain_by_default);
    println!("  {} {}", "keystore_dir:".bold(), p.keystore_dir.display());
    println!("  {} {}", "ca_validity_days:".bold(), p.ca_validity_days);
    println!("  {} {}", "node_validity_days:".bold(), p.node_validity_days);
    println!("  {} {}", "key_bits:".bold(), p.key_bits);
    println!("  {} {}", "backend:".bold(), p.backend);
    println!("  {} {}", "openssl_program:".bold(), p.openssl_program.display());
    println!("  {} {}", "partial_ca:".bold(), p.partial_ca);

    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let path = Config::resolve(ctx.config_path.as_deref())?;
    let mut config = ctx.config.clone();

    config.set(key, value)?;
    config.save(&path)?;

    println!(
        "{} {} set to {}.",
        "Success:".green().bold(),
        key,
        value.cyan()
    );
    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    let path = Config::resolve(ctx.config_path.as_deref())?;
    println!("{}", path.display());
    Ok(())
}
