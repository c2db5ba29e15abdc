//! Ferrite CLI: the command-line front end for the gate-sizing engine.
//!
//! Every subcommand loads a library and a design, runs one bounded resizer
//! command, renders the diagnostics it produced, and optionally writes the
//! edited design back out. `--trial` wraps the command in a journal
//! transaction and rolls it back afterwards.

#![warn(missing_docs)]

mod commands;
mod pipeline;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Ferrite: incremental gate sizing and buffering.
#[derive(Parser, Debug)]
#[command(name = "ferrite", version, about = "Ferrite gate sizing and buffering")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `ferrite.toml` file or a directory containing one.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Cell library JSON file.
    #[arg(long, global = true)]
    pub library: Option<String>,

    /// Design JSON file.
    #[arg(long, global = true)]
    pub design: Option<String>,

    /// Where to write the edited design.
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Run the command inside a journal transaction and roll it back.
    #[arg(long, global = true)]
    pub trial: bool,

    /// Output format for reports.
    #[arg(short, long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resize drivers to the target slew.
    Resize {
        /// Resize only the instance driving this pin (`inst/port`).
        #[arg(long)]
        pin: Option<String>,
    },
    /// Insert a buffer after every input port.
    BufferInputs,
    /// Insert a buffer before every output port.
    BufferOutputs,
    /// Remove buffers. With no names, every removable buffer goes.
    RemoveBuffers {
        /// Buffer instance names.
        instances: Vec<String>,
    },
    /// Give every load of a tie cell its own tie instance.
    RepairTieFanout {
        /// Tie cell and output port, e.g. `TIEHI/Z`.
        tie: String,

        /// Distance from the load's cell edge, in microns.
        #[arg(long)]
        separation: Option<f64>,
    },
    /// Move a signal to a faster commutative input of the same gate.
    SwapPins(SwapPinsArgs),
    /// Clone clock-tree inverters once per load.
    RepairClkInverters,
    /// Delete logic that drives no output.
    EliminateDeadLogic {
        /// Also delete nets left without pins.
        #[arg(long)]
        clean_nets: bool,
    },
    /// Print the target load of every characterized cell.
    ReportTargetLoads,
    /// Print the longest wire a buffer can drive without repeating.
    MaxWireLength,
    /// Print the drivers with the longest wires.
    ReportLongWires {
        /// Number of drivers to list.
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Print undriven nets and unconnected input pins.
    ReportFloating,
}

/// Arguments for the `ferrite swap-pins` subcommand.
#[derive(Parser, Debug)]
pub struct SwapPinsArgs {
    /// Instance name.
    #[arg(long)]
    pub inst: String,

    /// Input port whose signal may move.
    #[arg(long)]
    pub input: String,

    /// Output port the delay is measured to.
    #[arg(long)]
    pub output: String,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a config file or directory.
    pub config: Option<String>,
    /// Library file path.
    pub library: Option<String>,
    /// Design file path.
    pub design: Option<String>,
    /// Output design path.
    pub output: Option<String>,
    /// Roll the command back after running it.
    pub trial: bool,
    /// Report output format.
    pub format: ReportFormat,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
        library: cli.library,
        design: cli.design,
        output: cli.output,
        trial: cli.trial,
        format: cli.format,
    };
    init_tracing(&global);

    match commands::run(&cli.command, &global) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the `tracing` subscriber. `RUST_LOG` overrides the flags.
fn init_tracing(global: &GlobalArgs) {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .init();
}
