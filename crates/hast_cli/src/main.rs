//! Hast CLI: turns the members of a design into hardware state machines.
//!
//! `hast transform` lowers a design file and reports the generated machines,
//! `hast members` lists the members of a design with the invocation limits
//! `hast.toml` resolves for them.

#![warn(missing_docs)]

mod members;
mod pipeline;
mod transform;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Hast: hardware state machines from member statement trees.
#[derive(Parser, Debug)]
#[command(name = "hast", version, about = "Hardware state machine transformer")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `hast.toml`, or the directory holding it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transform the members of a design file.
    Transform(TransformArgs),
    /// List the members of a design file.
    Members(MembersArgs),
}

/// Arguments for the `hast transform` subcommand.
#[derive(Parser, Debug)]
pub struct TransformArgs {
    /// Design file in the JSON interchange format.
    pub design: String,

    /// Report format; defaults to `[output] format` from `hast.toml`.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Only report members whose full name starts with this prefix.
    #[arg(short, long)]
    pub member: Option<String>,
}

/// Arguments for the `hast members` subcommand.
#[derive(Parser, Debug)]
pub struct MembersArgs {
    /// Design file in the JSON interchange format.
    pub design: String,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// How `hast transform` reports its result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Full pseudo-HDL listing of every machine.
    Text,
    /// Machine-readable JSON.
    Json,
    /// One line per member.
    Summary,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
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
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Transform(ref args) => transform::run(args, &global),
        Command::Members(ref args) => members::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
