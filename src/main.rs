// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! psychonaut-journal CLI - log ingestions, check doses, timelines and interactions

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use psychonaut_journal::commands::{self, experience::ExperienceArgs, ingest::IngestArgs, AppContext};
use psychonaut_journal::types::AdministrationRoute;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "psychonaut-journal")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "PSYJOURNAL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, env = "PSYJOURNAL_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage experiences
    Experience {
        /// Action: create, list, show, edit, delete
        action: String,

        /// Experience title, id or unique title prefix
        name: Option<String>,

        /// New title (edit)
        #[arg(long)]
        title: Option<String>,

        /// Notes
        #[arg(long)]
        text: Option<String>,

        /// Shulgin rating: -, +-, +, ++, +++, ++++ ("none" clears)
        #[arg(long, allow_hyphen_values = true)]
        rating: Option<String>,

        /// Mark or unmark as favorite
        #[arg(long)]
        favorite: Option<bool>,
    },

    /// Log an ingestion
    Ingest {
        /// Substance name
        substance: String,

        /// Dose amount (omit when unknown)
        #[arg(short, long)]
        dose: Option<f64>,

        /// Dose units (defaults to the reference units)
        #[arg(short, long)]
        units: Option<String>,

        /// Route of administration
        #[arg(short, long, value_enum, default_value = "oral")]
        route: AdministrationRoute,

        /// When it was taken (RFC 3339, "YYYY-MM-DD HH:MM" or "HH:MM")
        #[arg(short, long)]
        time: Option<String>,

        /// Experience to add to (defaults to one named after the date)
        #[arg(short, long)]
        experience: Option<String>,

        /// The dose is an estimate
        #[arg(long)]
        estimate: bool,

        /// Standard deviation of the estimated dose
        #[arg(long)]
        sd: Option<f64>,

        /// Purity in percent
        #[arg(long)]
        purity: Option<f64>,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },

    /// Manage single ingestions
    Ingestion {
        /// Action: delete
        action: String,

        /// Ingestion id or unique id prefix
        id: String,
    },

    /// Show dose bands, durations and interactions of a substance
    Substance {
        /// Substance name
        name: String,
    },

    /// Search substances by name or category
    Search {
        /// Query
        query: String,
    },

    /// Check interactions between substances
    Interactions {
        /// Substance names
        #[arg(required = true, num_args = 2..)]
        names: Vec<String>,
    },

    /// Show the timeline of an experience
    Timeline {
        /// Experience title, id or unique title prefix
        experience: String,
    },

    /// Usage statistics per substance
    Stats {
        /// Only the last N days
        #[arg(long)]
        days: Option<u32>,
    },

    /// Manage substance colors
    Color {
        /// Action: list, set
        action: String,

        /// Substance name
        substance: Option<String>,

        /// Color name
        color: Option<String>,
    },

    /// Manage custom substances
    Custom {
        /// Action: add, list
        action: String,

        /// Substance name
        name: Option<String>,

        /// Default units
        #[arg(long)]
        units: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Export the journal
    Export {
        /// Output format (json, csv)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a journal exported as JSON
    Import {
        /// File to import
        file: PathBuf,
    },

    /// Get or set configuration
    Config {
        /// Configuration key
        key: String,

        /// Value to set (omit to get)
        value: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = psychonaut_journal::config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    // RUST_LOG wins, then flags, then the configured level
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_deref().unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = AppContext {
        config,
        config_path: cli.config.clone(),
        json: cli.json,
        color: !cli.no_color,
    };

    match cli.command {
        Commands::Experience { action, name, title, text, rating, favorite } => {
            commands::experience::run(
                &ctx,
                &action,
                ExperienceArgs { name, title, text, rating, favorite },
            )
        }
        Commands::Ingest {
            substance,
            dose,
            units,
            route,
            time,
            experience,
            estimate,
            sd,
            purity,
            note,
        } => commands::ingest::run(
            &ctx,
            IngestArgs { substance, dose, units, route, time, experience, estimate, sd, purity, note },
        ),
        Commands::Ingestion { action, id } => commands::ingestion::run(&ctx, &action, &id),
        Commands::Substance { name } => commands::substance::run(&ctx, &name),
        Commands::Search { query } => commands::search::run(&ctx, &query),
        Commands::Interactions { names } => commands::interactions::run(&ctx, &names),
        Commands::Timeline { experience } => commands::timeline::run(&ctx, &experience),
        Commands::Stats { days } => commands::stats::run(&ctx, days),
        Commands::Color { action, substance, color } => {
            commands::color::run(&ctx, &action, substance, color)
        }
        Commands::Custom { action, name, units, description } => {
            commands::custom::run(&ctx, &action, name, units, description)
        }
        Commands::Export { format, output } => commands::export::run_export(&ctx, &format, output),
        Commands::Import { file } => commands::export::run_import(&ctx, &file),
        Commands::Config { key, value } => commands::config::run(&ctx, &key, value),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
