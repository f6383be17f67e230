//! `periphconf`: build and check PERIPHCONF configuration for Haltium SoCs.
//!
//! ```text
//! USAGE:
//!   periphconf build --topology T --tables S [--global L]... [--local L]...
//!                                             Generate UICR macro source
//!   periphconf check --blob B --registers R   Validate a PERIPHCONF blob
//!   periphconf address <addr>                 Decode a peripheral address
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use periphconf_builder::{PeriphconfBuilder, SocLookupTables, Topology};
use periphconf_check::{
    load_periphconf, render_periphconf_table, render_validation_status, validate_periphconf, ConfEntry,
    RegisterCatalog, TableStyle,
};
use periphconf_chip::{spu_address_for_peripheral, Address};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "periphconf", about = "Haltium PERIPHCONF builder and checker", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Generate the PERIPHCONF macro source for one processor.
    Build(BuildArgs),
    /// Validate a raw PERIPHCONF blob against a register catalog.
    Check(CheckArgs),
    /// Decode a peripheral address and print its SPU.
    Address {
        /// Address, decimal or 0x-prefixed hex.
        #[arg(value_parser = parse_u32)]
        address: u32,
    },
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Resolved hardware topology snapshot (JSON).
    #[arg(long)]
    topology: PathBuf,
    /// SoC lookup tables (JSON).
    #[arg(long)]
    tables: PathBuf,
    /// Global-domain peripheral, by label. Repeatable.
    #[arg(long = "global", value_name = "LABEL")]
    global: Vec<String>,
    /// Global-domain peripheral without IRQ mapping, by label. Repeatable.
    #[arg(long = "global-no-irq", value_name = "LABEL")]
    global_no_irq: Vec<String>,
    /// Local-domain peripheral, by label. Repeatable.
    #[arg(long = "local", value_name = "LABEL")]
    local: Vec<String>,
    /// GPIO consumer whose pins only need SPU permissions. Repeatable.
    #[arg(long = "gpio", value_name = "LABEL")]
    gpio: Vec<String>,
    /// Comment written at the top of the generated file.
    #[arg(long)]
    header_line: Option<String>,
    /// Output file; stdout if omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Raw little-endian PERIPHCONF blob.
    #[arg(long)]
    blob: PathBuf,
    /// Register catalog (JSON).
    #[arg(long)]
    registers: PathBuf,
    /// Which entries to print.
    #[arg(long, value_enum, default_value_t = Mode::Full)]
    mode: Mode,
    /// Register column style: `regs` or `raw`.
    #[arg(long, default_value_t = TableStyle::Regs)]
    style: TableStyle,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Every entry.
    Full,
    /// Only entries with errors.
    Errors,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Build(args) => cmd_build(&args)?,
        Cmd::Check(args) => cmd_check(&args)?,
        Cmd::Address { address } => cmd_address(address)?,
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_build(args: &BuildArgs) -> Result<()> {
    let topology = Topology::from_json(&read_text(&args.topology)?)
        .with_context(|| format!("invalid topology {}", args.topology.display()))?;
    let tables = SocLookupTables::from_json(&read_text(&args.tables)?)
        .with_context(|| format!("invalid lookup tables {}", args.tables.display()))?;

    let mut builder = PeriphconfBuilder::new(&topology, &tables)?;

    for label in &args.global {
        builder
            .add_global_peripheral_cfg(label.as_str(), true, true)
            .with_context(|| format!("global peripheral {label}"))?;
    }
    for label in &args.global_no_irq {
        builder
            .add_global_peripheral_cfg(label.as_str(), false, true)
            .with_context(|| format!("global peripheral {label}"))?;
    }
    for label in &args.local {
        builder
            .add_local_peripheral_cfg(label.as_str())
            .with_context(|| format!("local peripheral {label}"))?;
    }
    for label in &args.gpio {
        builder
            .add_gpio_spu_permissions(label.as_str())
            .with_context(|| format!("GPIO permissions for {label}"))?;
    }

    let source = builder.build_generated_source(args.header_line.as_deref());
    match &args.out {
        Some(path) => {
            fs::write(path, source).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Wrote {} macro calls to {}", builder.macros().len(), path.display());
        }
        None => print!("{source}"),
    }

    Ok(())
}

fn cmd_check(args: &CheckArgs) -> Result<()> {
    let catalog = RegisterCatalog::from_file(&args.registers)?;
    let blob = fs::read(&args.blob).with_context(|| format!("failed to read {}", args.blob.display()))?;

    let mut entries = load_periphconf(&catalog, &blob)?;
    let status = validate_periphconf(&mut entries)?;

    match args.mode {
        Mode::Errors => {
            if !status.is_error() {
                return Ok(());
            }
            let failed: Vec<&ConfEntry<'_>> = entries.iter().filter(|e| e.status.is_error()).collect();
            println!("Found errors in the PERIPHCONF table:");
            println!("{}", indent(&render_periphconf_table(failed, args.style)));
        }
        Mode::Full => {
            println!("PERIPHCONF table ({} entries):", entries.len());
            println!("{}", indent(&render_periphconf_table(&entries, args.style)));
        }
    }

    if status.is_error() {
        println!();
        println!("Error description:");
        println!("{}", indent(&render_validation_status(status)));
    }

    if status.is_fatal_error() {
        bail!(
            "PERIPHCONF at {} has errors that will prevent the device from booting correctly.",
            args.blob.display()
        );
    }

    Ok(())
}

fn cmd_address(raw: u32) -> Result<()> {
    let address = Address::from(raw);
    println!("{address}");
    match spu_address_for_peripheral(address) {
        Ok(spu) => println!("SPU: 0x{:08x}", u32::from(spu)),
        Err(e) => println!("SPU: none ({e})"),
    }
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("  {line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}
