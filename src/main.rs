mod collector;
mod commands;
mod config;
mod diagnostics;
mod document;
mod error;
mod grammar;
mod header;
mod idl;
mod info;
mod normalize;
mod pipeline;
mod render;
mod resolver;
mod table;
mod types;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::Format;

#[derive(Parser)]
#[command(name = "dfnref", version, about = "Definition and reference linking for HTML specification documents")]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report diagnostics without writing anything
    Check {
        /// Document or directory of documents
        input: PathBuf,
        /// Report format
        #[arg(long, value_enum, default_value = "human")]
        format: Format,
    },
    /// Print the reference document: syntax, configuration, exit codes
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the definition table of a document
    List {
        /// Document to inspect
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Link definitions and references and write the result
    Render {
        /// Document or directory of documents
        input: PathBuf,
        /// Output file, or output directory for a directory input
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Report format
        #[arg(long, value_enum, default_value = "human")]
        format: Format,
    },
    /// Render, then re-render whenever the input changes
    Watch {
        /// Document or directory of documents
        input: PathBuf,
        /// Output file or directory
        #[arg(short, long)]
        out: PathBuf,
        /// Report format
        #[arg(long, value_enum, default_value = "human")]
        format: Format,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { input, format } => commands::check(&input, format),
        Commands::Info { json } => {
            commands::info(json);
            Ok(ExitCode::SUCCESS)
        },
        Commands::List { input, json } => commands::list(&input, json).map(|()| return ExitCode::SUCCESS),
        Commands::Render { input, out, format } => commands::render(&input, out.as_deref(), format),
        Commands::Watch { input, out, format } => watch::run(&input, &out, format),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}
