//! Grantview CLI - build dashboard views from a cleaned grant table
//!
//! # Views
//!
//! ```bash
//! grantview eligibility --signed yes      # Applications ready for review
//! grantview demographics --field gender   # Support given by demographics
//! grantview processing                    # Processing time analysis
//! grantview utilization                   # Grant utilization analysis
//! grantview impact                        # Foundation impact summary
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! grantview columns                       # List the expected columns
//! grantview parse                         # Dump loaded records as JSON
//! ```
//!
//! The data file comes from `--input`, then `GRANTVIEW_DATA`, then
//! `cleaned_data.csv`.

use clap::{Parser, Subcommand, ValueEnum};
use grantview::api::logs::LOG_BROADCASTER;
use grantview::parser::format_delimiter;
use grantview::{
    load_file, report_file, Column, DemographicField, Settings, SignedFilter, ViewRequest,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "grantview")]
#[command(about = "Build grant-assistance dashboard views from a cleaned CSV", long_about = None)]
struct Cli {
    /// Input CSV file (default: $GRANTVIEW_DATA or cleaned_data.csv)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long, global = true)]
    delimiter: Option<char>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Don't echo progress logs to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Pending applications, filtered by signature status
    Eligibility {
        #[arg(short, long, value_enum, default_value_t = SignedFilter::All)]
        signed: SignedFilter,
    },

    /// Total amount granted per value of a demographic field
    Demographics {
        #[arg(long, value_enum)]
        field: DemographicField,
    },

    /// Processing time statistics and distribution
    Processing,

    /// Unused grants by year and average grant by assistance type
    Utilization,

    /// Stakeholder impact and progress summary
    Impact,

    /// List the columns the input must contain
    Columns,

    /// Load the input and output the typed records as JSON
    Parse,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }

    let mut settings = Settings::from_env();
    if let Some(input) = cli.input {
        settings.data_path = input;
    }
    if cli.delimiter.is_some() {
        settings.load.delimiter = cli.delimiter;
    }

    let output = cli.output.as_deref();
    let result = match cli.command {
        Commands::Eligibility { signed } => {
            cmd_view(&settings, ViewRequest::Eligibility { signed }, cli.format, output)
        }
        Commands::Demographics { field } => {
            cmd_view(&settings, ViewRequest::Demographics { field }, cli.format, output)
        }
        Commands::Processing => cmd_view(&settings, ViewRequest::ProcessingTime, cli.format, output),
        Commands::Utilization => cmd_view(&settings, ViewRequest::Utilization, cli.format, output),
        Commands::Impact => cmd_view(&settings, ViewRequest::Impact, cli.format, output),
        Commands::Columns => cmd_columns(output),
        Commands::Parse => cmd_parse(&settings, output),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_view(
    settings: &Settings,
    request: ViewRequest,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = report_file(&settings.data_path, &request, &settings.load)?;

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&response)?,
        OutputFormat::Text => response.bundle.render_text(),
    };
    write_output(&content, output)
}

fn cmd_columns(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let lines: Vec<String> = Column::ALL
        .iter()
        .map(|c| {
            let kind = if c.is_numeric() { "number" } else { "text" };
            format!("{:<32} {}", c.header(), kind)
        })
        .collect();
    write_output(&lines.join("\n"), output)
}

fn cmd_parse(settings: &Settings, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_file(&settings.data_path, &settings.load)?;

    eprintln!("   Encoding: {}", loaded.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(loaded.delimiter));
    eprintln!("   Columns: {}", loaded.headers.join(", "));

    let json = serde_json::to_string_pretty(&loaded.dataset)?;
    write_output(&json, output)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
