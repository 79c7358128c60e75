//! CLI frontend for the Fire Rescue simulation engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fire-rescue",
    about = "Fire Rescue: headless multi-robot rescue scenarios",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine internals at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a world_init document
    Check {
        /// Path to the scenario document
        file: PathBuf,
    },

    /// List entities in the loaded world
    List {
        /// Path to the scenario document
        file: PathBuf,

        /// Filter by entity kind (e.g. fire, survivor, obstacle)
        kind: Option<String>,

        /// Seed for entity placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Show one entity or robot in detail
    Show {
        /// Path to the scenario document
        file: PathBuf,

        /// Entity id
        id: String,

        /// Seed for entity placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// List the suggested commands in a scenario document
    Candidates {
        /// Path to the scenario document
        file: PathBuf,
    },

    /// Run a scenario for a number of ticks
    Run {
        /// Path to the scenario document
        file: PathBuf,

        /// Number of ticks to simulate after the commands
        #[arg(short, long, default_value = "10")]
        ticks: u64,

        /// Seed for placement and dynamics
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Simulated seconds per tick
        #[arg(long, default_value = "1.0")]
        seconds_per_tick: f64,

        /// Command script: one `<robot> <action> [target]` per line,
        /// plus `tick <n>`, `select <robot>` and `dynamics <on|off> <on|off> <seconds>`
        #[arg(short, long)]
        commands: Option<PathBuf>,

        /// Execute the document's candidate actions before the script
        #[arg(long)]
        candidates: bool,

        /// Report a step to the dynamics engine after each accepted command
        #[arg(long)]
        step: bool,

        /// Disable autonomous dynamics regardless of the document
        #[arg(long)]
        no_dynamics: bool,

        /// Print every logged event
        #[arg(short, long)]
        events: bool,

        /// Print the final frame and events as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { file } => commands::check::run(&file),
        Commands::List { file, kind, seed } => commands::list::run(&file, kind.as_deref(), seed),
        Commands::Show { file, id, seed } => commands::show::run(&file, &id, seed),
        Commands::Candidates { file } => commands::candidates::run(&file),
        Commands::Run {
            file,
            ticks,
            seed,
            seconds_per_tick,
            commands,
            candidates,
            step,
            no_dynamics,
            events,
            json,
        } => commands::run::run(
            &file,
            &commands::run::RunOptions {
                ticks,
                seed,
                seconds_per_tick,
                script: commands,
                candidates,
                step,
                no_dynamics,
                events,
                json,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
