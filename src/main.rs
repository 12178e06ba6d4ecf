use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tidyup::cli::{CliOptions, OrganizeCommand, run_cli};
use tidyup::config::{ExcludeRules, FilterConfig, FilterRules, IncludeRules};
use tidyup::output::OutputFormatter;
use tidyup::scheduler::{BatchOptions, Layout, Pacing};
use tracing_subscriber::EnvFilter;

/// Move files into category folders by extension.
#[derive(Debug, Parser)]
#[command(name = "tidyup", version, about)]
struct Args {
    /// Directory to take files from
    source: PathBuf,

    /// Directory to move files into (required unless --preview)
    destination: Option<PathBuf>,

    /// Only list what was found and where it would go
    #[arg(long)]
    preview: bool,

    /// Report every move without touching the filesystem
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Include files in subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Put files directly in the destination instead of category folders
    #[arg(long)]
    flat: bool,

    /// Do not pause between files
    #[arg(long, conflicts_with = "max_step_ms")]
    no_delay: bool,

    /// Longest pause between two files, in milliseconds
    #[arg(long, value_name = "MS")]
    max_step_ms: Option<u64>,

    /// Skip hidden files and everything under hidden directories
    #[arg(long)]
    skip_hidden: bool,

    /// Glob, relative to the source, of files to leave alone (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude_patterns: Vec<String>,

    /// Extension of files to leave alone (repeatable)
    #[arg(long = "exclude-ext", value_name = "EXT")]
    exclude_extensions: Vec<String>,

    /// Regex on the file name of files to leave alone (repeatable)
    #[arg(long = "exclude-regex", value_name = "REGEX")]
    exclude_regex: Vec<String>,

    /// Glob that overrides every exclusion (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    include_patterns: Vec<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Print one line per file and log moves
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn command(&self) -> OrganizeCommand {
        if self.preview {
            OrganizeCommand::Preview
        } else {
            OrganizeCommand::Organize
        }
    }

    fn into_options(self) -> CliOptions {
        let mut pacing = Pacing::default();
        if self.no_delay {
            pacing = Pacing::none();
        } else if let Some(ms) = self.max_step_ms {
            pacing.max_step = Duration::from_millis(ms);
        }

        CliOptions {
            source: self.source,
            destination: self.destination,
            recursive: self.recursive,
            filters: FilterConfig {
                filters: FilterRules {
                    enable_hidden_files: !self.skip_hidden,
                    exclude: ExcludeRules {
                        filenames: Vec::new(),
                        patterns: self.exclude_patterns,
                        extensions: self.exclude_extensions,
                        regex: self.exclude_regex,
                    },
                    include: IncludeRules {
                        patterns: self.include_patterns,
                    },
                },
            },
            batch: BatchOptions {
                dry_run: self.dry_run,
                layout: if self.flat {
                    Layout::Flat
                } else {
                    Layout::Categorized
                },
                pacing,
            },
            json: self.json,
            list_files: self.verbose,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "warn,tidyup=info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let command = args.command();
    let options = args.into_options();

    match run_cli(command, &options) {
        Ok(Some(report)) if report.failed() > 0 => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) if e.is_informational() => {
            OutputFormatter::info(&e.to_string());
            ExitCode::SUCCESS
        }
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
