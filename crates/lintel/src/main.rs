use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use lintel_core::config::Config;
use lintel_core::ingest;
use lintel_core::pipeline::{AnalysisOutput, Analyzer};
use lintel_core::types::{RawGeometry, Severity};
use lintel_report::{json, markdown, text};

#[derive(Parser)]
#[command(name = "lintel")]
#[command(about = "Classify structural drawing geometry and check code compliance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze drawing exports and print a full report
    Analyze {
        /// A drawing export (.json) or a directory of them
        path: PathBuf,
        /// Path to config file (defaults to .lintel.toml discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },
    /// Analyze and fail when warnings reach a severity bar
    Check {
        /// A drawing export (.json) or a directory of them
        path: PathBuf,
        /// Minimum severity that fails the check (info, warning, critical)
        #[arg(long)]
        fail_on: Option<String>,
        /// Path to config file (defaults to .lintel.toml discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },
    /// Create a default .lintel.toml configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            path,
            config,
            format,
            compact,
        } => cmd_analyze(&path, config.as_deref(), format, compact),
        Commands::Check {
            path,
            fail_on,
            config,
            format,
            compact,
        } => cmd_check(&path, fail_on.as_deref(), config.as_deref(), format, compact),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn cmd_analyze(
    path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let output = run_analysis(path, &config)?;

    let rendered = match format {
        OutputFormat::Text => text::format_report(&output),
        OutputFormat::Json => json::format_report(&output, compact),
        OutputFormat::Markdown => markdown::format_report(&output),
    };
    print!("{rendered}");
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn cmd_check(
    path: &Path,
    fail_on: Option<&str>,
    config_path: Option<&Path>,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let fail_on = match fail_on {
        Some(s) => s.parse::<Severity>()?,
        None => config.rules.fail_on,
    };
    let output = run_analysis(path, &config)?;

    let (rendered, passed) = match format {
        OutputFormat::Text => text::format_check(&output, fail_on),
        OutputFormat::Json => json::format_check(&output, fail_on, compact),
        OutputFormat::Markdown => markdown::format_check(&output, fail_on),
    };
    print!("{rendered}");
    if format == OutputFormat::Json {
        println!();
    }

    if !passed {
        process::exit(1);
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = Path::new(".lintel.toml");
    if config_path.exists() && !force {
        anyhow::bail!(".lintel.toml already exists. Use --force to overwrite.");
    }
    std::fs::write(config_path, Config::default_toml())?;
    println!("Created .lintel.toml");
    Ok(())
}

fn run_analysis(path: &Path, config: &Config) -> Result<AnalysisOutput> {
    let geometry = collect_geometry(path)?;
    let analyzer = Analyzer::new(config.clone());
    Ok(analyzer.analyze(&geometry))
}

/// Gather raw geometry from a single export or every export under a
/// directory. A directory is treated as one drawing set; files that fail to
/// parse are skipped with a warning.
fn collect_geometry(path: &Path) -> Result<Vec<RawGeometry>> {
    if !path.exists() {
        anyhow::bail!("path '{}' does not exist", path.display());
    }
    if path.is_file() {
        return ingest::load_drawing(path);
    }

    let drawings = ingest::discover_drawings(path);
    if drawings.is_empty() {
        anyhow::bail!("no drawing exports (*.json) found under '{}'", path.display());
    }

    let mut geometry = Vec::new();
    for drawing in &drawings {
        match ingest::load_drawing(drawing) {
            Ok(mut records) => geometry.append(&mut records),
            Err(e) => eprintln!("Warning: skipping '{}': {e:#}", drawing.display()),
        }
    }
    Ok(geometry)
}

fn load_config(project_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => {
            let start = if project_path.is_dir() {
                project_path
            } else {
                project_path.parent().unwrap_or(Path::new("."))
            };
            Config::load_or_default(start)
        }
    }
}
