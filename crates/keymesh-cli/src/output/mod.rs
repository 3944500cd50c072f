//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use keymesh_ca::CertSummary;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable, colored when stdout allows
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json, yaml",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Print `value` as JSON or YAML. Returns false for [`OutputFormat::Pretty`],
/// leaving rendering to the caller.
pub fn print_structured<T: Serialize>(format: OutputFormat, value: &T) -> Result<bool> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Pretty => return Ok(false),
    }
    Ok(true)
}

/// Indented certificate details for pretty output.
pub fn print_certificate(cert: &CertSummary) {
    let label = |s: &str| format!("{s:>12}").as_str().bold();

    println!("  {} {}", label("subject:"), cert.subject);
    println!("  {} {}", label("issuer:"), cert.issuer);
    println!("  {} {}", label("serial:"), cert.serial);
    println!(
        "  {} {} .. {} ({} days)",
        label("valid:"),
        cert.not_before.format("%Y-%m-%d"),
        cert.not_after.format("%Y-%m-%d"),
        cert.validity_days()
    );
    if cert.is_expired() {
        println!("  {} {}", label("status:"), "EXPIRED".red().bold());
    }
    println!("  {} RSA {}", label("key:"), cert.key_bits);
    println!("  {} {}", label("fingerprint:"), cert.fingerprint.as_str().cyan());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_pretty_is_left_to_caller() {
        assert!(!print_structured(OutputFormat::Pretty, &1).unwrap());
    }
}
