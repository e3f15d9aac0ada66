//! Seawall change-unit CLI
//!
//! Command-line interface for managing change units: apply pending units,
//! preview them, provision the ledger, scaffold new unit files, and show
//! applied/pending status.
//!
//! The stock binary wires the in-memory reference backends, which is enough
//! for previewing, scaffolding, and exercising a compiled unit set in tests.
//! Applications with a real store embed the `seawall` library and supply
//! their own `Ledger` and `StoreExecutor` implementations.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use seawall::{
    EngineConfig, MemoryLedger, MemoryStore, NoteSink, RunOptions, Runner, StoreRegistry,
    UnitRegistry,
};

#[derive(Parser)]
#[command(name = "seawall")]
#[command(about = "Change-unit management tool for the seawall engine")]
#[command(version)]
struct Cli {
    /// Unit source location (repeatable; overrides configured paths)
    #[arg(long = "path")]
    paths: Vec<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending change units
    Run {
        /// Preview the operations without applying or recording anything
        #[arg(long)]
        pretend: bool,

        /// Give every unit its own batch number
        #[arg(long)]
        step: bool,
    },

    /// Provision the ledger
    Init,

    /// Show applied and pending units
    Status,

    /// Scaffold a new change-unit file
    Make {
        /// Unit name in snake_case (e.g. "create_users_table")
        name: String,
    },
}

/// Note sink that prints progress lines to stdout
struct ConsoleNotes;

impl NoteSink for ConsoleNotes {
    fn note(&self, message: &str) {
        println!("{message}");
    }
}

/// Units compiled into this binary
///
/// Applications embedding the engine register their change units here. The
/// stock binary ships with none.
fn registry() -> UnitRegistry {
    UnitRegistry::new()
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    } else if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(cli) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("❌ Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = EngineConfig::load().context("failed to load configuration")?;

    let paths: Vec<PathBuf> = if cli.paths.is_empty() {
        config.unit_paths.iter().map(PathBuf::from).collect()
    } else {
        cli.paths.clone()
    };

    let ledger = MemoryLedger::new();
    let registry = registry();
    let stores = StoreRegistry::new(Arc::new(MemoryStore::new()));
    let notes = ConsoleNotes;

    let mut runner = Runner::new(&ledger, &registry, &stores).with_notes(&notes);
    if let Some(store) = config.default_store.as_deref() {
        runner.set_default_store(Some(store));
    }

    match cli.command {
        Commands::Run { pretend, step } => handle_run(&runner, &paths, pretend, step),
        Commands::Init => handle_init(&runner),
        Commands::Status => handle_status(&runner, &ledger, &paths),
        Commands::Make { name } => handle_make(&name, &paths),
    }
}

fn handle_run(
    runner: &Runner<'_>,
    paths: &[PathBuf],
    pretend: bool,
    step: bool,
) -> anyhow::Result<()> {
    runner.create_ledger_if_missing()?;
    let processed = runner.run(paths, RunOptions { pretend, step })?;

    if processed.is_empty() {
        return Ok(());
    }
    if pretend {
        println!("✅ Previewed {} unit(s)", processed.len());
    } else {
        println!("✅ Applied {} unit(s)", processed.len());
    }
    Ok(())
}

fn handle_init(runner: &Runner<'_>) -> anyhow::Result<()> {
    if !runner.create_ledger_if_missing()? {
        println!("Ledger already exists.");
    }
    Ok(())
}

fn handle_status(
    runner: &Runner<'_>,
    ledger: &MemoryLedger,
    paths: &[PathBuf],
) -> anyhow::Result<()> {
    runner.create_ledger_if_missing()?;

    let applied = ledger.entries();
    let pending = runner.pending(paths)?;

    println!("\nChange Unit Status\n");

    if applied.is_empty() {
        println!("Applied: None");
    } else {
        println!("Applied ({}):", applied.len());
        for entry in &applied {
            println!(
                "  ✓ {} (batch {}, {})",
                entry.identifier,
                entry.batch,
                entry.applied_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    println!();

    if pending.is_empty() {
        println!("Pending: None");
    } else {
        println!("Pending ({}):", pending.len());
        for identifier in &pending {
            println!("  ⏳ {identifier}");
        }
    }

    println!(
        "\nSummary: {} applied, {} pending",
        applied.len(),
        pending.len()
    );
    Ok(())
}

fn handle_make(name: &str, paths: &[PathBuf]) -> anyhow::Result<()> {
    let dir = paths
        .first()
        .context("no unit path configured; pass --path or set engine.unit_paths")?;

    let path = seawall::scaffold_unit(name, dir)?;
    println!("✅ Created {}", path.display());
    Ok(())
}
