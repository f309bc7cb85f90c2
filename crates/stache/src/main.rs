//! Stache CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "stache")]
#[command(version)]
#[command(about = "Render and check Mustache templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against JSON or YAML data
    Render {
        /// Template file
        template: PathBuf,

        /// Data file (.json, .yaml or .yml)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Directory to load partials from (defaults to the template's directory)
        #[arg(short, long)]
        partials: Option<PathBuf>,

        /// Starting delimiters, e.g. "<% %>"
        #[arg(long)]
        delimiters: Option<String>,

        /// Do not HTML-escape {{name}} interpolations
        #[arg(long)]
        no_escape: bool,

        /// Write output to FILE (use '--output -' for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse templates and report syntax errors
    Check {
        /// Template files
        #[arg(required = true)]
        templates: Vec<PathBuf>,

        /// Starting delimiters, e.g. "<% %>"
        #[arg(long)]
        delimiters: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            data,
            partials,
            delimiters,
            no_escape,
            output,
        } => commands::render::execute(commands::render::RenderArgs {
            template,
            data,
            partials,
            delimiters,
            no_escape,
            output,
        }),
        Commands::Check {
            templates,
            delimiters,
        } => commands::check::execute(commands::check::CheckArgs {
            templates,
            delimiters,
        }),
    }
}
