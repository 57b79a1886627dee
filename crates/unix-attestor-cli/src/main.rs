//! Unix workload attestor CLI — `uattest` command.
//!
//! Drives the attestor the way a plugin host would: apply a configuration,
//! attest a pid, print the selectors. Useful for checking what a workload
//! will be attested as before writing registration entries for it.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use unix_attestor::{
    AttestationConfig, FactsSource, Selector, SystemResolver, UnixAttestor, PLUGIN_NAME,
};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// uattest — inspect a local process and print its unix attestation selectors.
#[derive(Parser, Debug)]
#[command(
    name = "uattest",
    about = "Unix workload attestor CLI",
    version,
    long_about = "uattest — Unix workload attestor CLI\n\nDerive uid, gid, group and binary digest selectors for a local process."
)]
struct Cli {
    /// Enable verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attest a process and print its selectors
    Attest {
        /// Process id to attest
        pid: i32,

        /// Configuration file (TOML)
        #[arg(long, conflicts_with = "set")]
        config: Option<PathBuf>,

        /// Inline configuration option, e.g. --set discover_workload_path=true
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Attest captured facts from a JSON file instead of /proc
        #[arg(long)]
        facts: Option<PathBuf>,

        /// Print selectors as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print plugin metadata
    Info,

    /// Validate a configuration file without attesting anything
    CheckConfig {
        /// Configuration file (TOML)
        path: PathBuf,
    },
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // stdout carries selectors; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

/// Turn `key=value` pairs into a configuration payload.
fn settings_to_config(settings: &[String]) -> Result<String> {
    let mut lines = Vec::with_capacity(settings.len());
    for setting in settings {
        let (key, value) = setting
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid setting '{setting}', expected KEY=VALUE"))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("invalid setting '{setting}', key is empty");
        }
        lines.push(format!("{key} = {}", value.trim()));
    }
    Ok(lines.join("\n"))
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))
}

fn load_facts(path: &Path) -> Result<FactsSource> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read facts {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse facts {}", path.display()))
}

fn print_selectors(selectors: &[Selector], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(selectors)?);
    } else {
        for selector in selectors {
            println!("{selector}");
        }
    }
    Ok(())
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_attest(
    pid: i32,
    config: Option<&Path>,
    settings: &[String],
    facts: Option<&Path>,
    json: bool,
) -> Result<()> {
    let attestor = match facts {
        Some(path) => UnixAttestor::with_hooks(load_facts(path)?, SystemResolver),
        None => UnixAttestor::new(),
    };

    let text = match config {
        Some(path) => read_config(path)?,
        None => settings_to_config(settings)?,
    };
    attestor
        .configure(&text)
        .map_err(|e| anyhow!("{PLUGIN_NAME}: {e}"))?;

    let selectors = attestor
        .attest(pid)
        .map_err(|e| anyhow!("{PLUGIN_NAME}: {e}"))?;
    print_selectors(&selectors, json)
}

fn cmd_info() -> Result<()> {
    let info = UnixAttestor::new().get_info();
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn cmd_check_config(path: &Path) -> Result<()> {
    let text = read_config(path)?;
    let config = AttestationConfig::parse(&text).map_err(|e| anyhow!("{PLUGIN_NAME}: {e}"))?;
    println!("discover_workload_path = {}", config.discover_workload_path);
    println!("workload_size_limit = {}", config.workload_size_limit);
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Attest {
            pid,
            config,
            set,
            facts,
            json,
        } => cmd_attest(pid, config.as_deref(), &set, facts.as_deref(), json),
        Commands::Info => cmd_info(),
        Commands::CheckConfig { path } => cmd_check_config(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
