use anyhow::{bail, Context};
use clap::Parser;
use dcompare_common::{load_config, load_config_from, AppConfig};
use dcompare_core::{write_report, ComparisonOutcome, ComparisonReport, DocumentComparator};
use std::fs::File;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dcompare")]
#[command(author = "DCompare Contributors")]
#[command(version)]
#[command(
    about = "Compare two text, Word, PDF or spreadsheet documents for equality, line-level differences and word-level similarity",
    long_about = None
)]
struct Cli {
    /// <path_to_first_file> <path_to_second_file>
    #[arg(short = 'f', long = "file", num_args = 2, value_names = ["FIRST", "SECOND"], required = true)]
    files: Vec<PathBuf>,

    /// File the comparison report is saved to [default: from config, output.txt]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Do not save the report to a file
    #[arg(long, conflicts_with = "output")]
    no_output: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Context lines around each diff hunk
    #[arg(long, value_name = "N")]
    context: Option<usize>,

    /// Fail instead of hashing document text when a byte hash fails
    #[arg(long)]
    no_hash_fallback: bool,

    /// Diagnostic log file [default: from config, compare.log]
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Configuration file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable ANSI colors in output
    #[arg(long)]
    no_color: bool,
}

/// Effective options after merging config file and flags
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    log_file: PathBuf,
    output: Option<PathBuf>,
    context_lines: usize,
    hash_fallback: bool,
    max_cell_diffs: Option<usize>,
    json: bool,
    use_color: bool,
}

impl Settings {
    fn resolve(cli: &Cli, config: AppConfig, stdout_is_terminal: bool) -> Self {
        let output = if cli.no_output {
            None
        } else {
            Some(cli.output.clone().unwrap_or(config.output_path))
        };

        Self {
            log_file: cli.log_file.clone().unwrap_or(config.log_file),
            output,
            context_lines: cli.context.unwrap_or(config.context_lines),
            hash_fallback: config.hash_fallback && !cli.no_hash_fallback,
            max_cell_diffs: config.max_cell_diffs,
            json: cli.json,
            use_color: !cli.no_color && !cli.json && stdout_is_terminal,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_settings_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            println!("✘ {:#}", e);
            return ExitCode::from(2);
        }
    };
    let settings = Settings::resolve(&cli, config, std::io::stdout().is_terminal());

    init_logging(&settings.log_file);

    run(&cli.files[0], &cli.files[1], &settings)
}

fn load_settings_file(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let loaded = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("Config file does not exist: {}", path.display());
            }
            load_config_from(path, false)
        }
        None => load_config(false),
    }
    .context("Failed to load configuration")?;
    Ok(loaded.config)
}

/// Install the process-wide log sink; falls back to stderr when the log
/// file cannot be created
fn init_logging(log_file: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match File::create(log_file) {
        Ok(file) => tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(filter)
            .init(),
        Err(e) => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
            warn!("Could not open log file {}: {}", log_file.display(), e);
        }
    }
}

fn run(left: &Path, right: &Path, settings: &Settings) -> ExitCode {
    if !left.exists() || !right.exists() {
        println!("✘ One or both file paths do not exist.");
        error!("✘ One or both file paths do not exist.");
        return ExitCode::from(2);
    }

    info!("Comparing {} and {}", left.display(), right.display());

    let comparator = DocumentComparator::new()
        .with_context_lines(settings.context_lines)
        .with_max_cell_diffs(settings.max_cell_diffs)
        .with_hash_fallback(settings.hash_fallback);

    let outcome = match comparator.compare(left, right) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("✘ {}", e);
            error!("✘ {}", error_chain(&e));
            return ExitCode::from(1);
        }
    };

    if settings.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("✘ Could not serialize comparison: {}", e);
                error!("Could not serialize comparison: {}", e);
                return ExitCode::from(1);
            }
        }
    } else {
        print_outcome(left, right, &outcome, settings.use_color);
    }

    if let (ComparisonOutcome::Different(report), Some(path)) = (&outcome, &settings.output) {
        save_report(path, report, settings.json);
    }

    info!("Terminating Program.");
    ExitCode::SUCCESS
}

fn print_outcome(left: &Path, right: &Path, outcome: &ComparisonOutcome, use_color: bool) {
    let report = match outcome {
        ComparisonOutcome::Identical { .. } => {
            println!("✔ Finished Comparison!");
            println!("{} and {} Are Identical.\n", left.display(), right.display());
            return;
        }
        ComparisonOutcome::Different(report) => report,
    };

    println!("⚠ Not Identical.\nPerforming Manual Comparison...\n");

    if let ComparisonReport::Spreadsheet(sheet) = report {
        if sheet.shape_mismatch {
            println!(
                "⚠ {} and {} Have Different Sizes.\nCalculating Partial Comparison...\n",
                left.display(),
                right.display()
            );
        }
    }

    let colored_diff = use_color && matches!(report, ComparisonReport::Text(_));
    for line in report.render().lines() {
        if colored_diff {
            println!("{}", colorize_diff_line(line));
        } else {
            println!("{}", line);
        }
    }
    println!("\nFinished Manual Comparison!");
}

fn save_report(path: &Path, report: &ComparisonReport, json: bool) {
    match write_report(path, report) {
        Ok(()) => {
            if !json {
                println!("Output Saved To {}", path.display());
            }
            info!("Output Saved To {}", path.display());
        }
        Err(e) => {
            // Keep stdout parseable in JSON mode
            if json {
                eprintln!("✘ {}", e);
            } else {
                println!("✘ {}", e);
            }
            error!("✘ {}", error_chain(&e));
        }
    }
}

fn colorize_diff_line(line: &str) -> String {
    let color = if line.starts_with("+++") || line.starts_with("---") {
        "\x1b[1m" // Bold
    } else if line.starts_with("@@") {
        "\x1b[36m" // Cyan
    } else if line.starts_with('+') {
        "\x1b[32m" // Green
    } else if line.starts_with('-') {
        "\x1b[31m" // Red
    } else {
        return line.to_string();
    };
    format!("{}{}\x1b[0m", color, line)
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // thiserror messages often embed their source already
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcompare_common::DCompareError;
    use std::io;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dcompare").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_file_flag_takes_two_paths() {
        let cli = parse(&["-f", "a.txt", "b.txt"]);
        assert_eq!(cli.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);

        let cli = parse(&["--file", "a.docx", "b.docx", "--json"]);
        assert_eq!(cli.files.len(), 2);
        assert!(cli.json);
    }

    #[test]
    fn test_argument_errors() {
        assert!(Cli::try_parse_from(["dcompare"]).is_err());
        assert!(Cli::try_parse_from(["dcompare", "-f", "a.txt"]).is_err());
        assert!(Cli::try_parse_from(["dcompare", "-f", "a.txt", "b.txt", "c.txt"]).is_err());
        assert!(Cli::try_parse_from([
            "dcompare", "-f", "a.txt", "b.txt", "-o", "out.txt", "--no-output"
        ])
        .is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let cli = parse(&["-f", "a.txt", "b.txt"]);
        let config = AppConfig {
            context_lines: 5,
            max_cell_diffs: Some(10),
            ..AppConfig::default()
        };

        let settings = Settings::resolve(&cli, config, true);
        assert_eq!(settings.output, Some(PathBuf::from("output.txt")));
        assert_eq!(settings.log_file, PathBuf::from("compare.log"));
        assert_eq!(settings.context_lines, 5);
        assert_eq!(settings.max_cell_diffs, Some(10));
        assert!(settings.hash_fallback);
        assert!(settings.use_color);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "-f",
            "a.txt",
            "b.txt",
            "-o",
            "report.txt",
            "--context",
            "1",
            "--no-hash-fallback",
            "--log-file",
            "run.log",
            "--no-color",
        ]);

        let settings = Settings::resolve(&cli, AppConfig::default(), true);
        assert_eq!(settings.output, Some(PathBuf::from("report.txt")));
        assert_eq!(settings.log_file, PathBuf::from("run.log"));
        assert_eq!(settings.context_lines, 1);
        assert!(!settings.hash_fallback);
        assert!(!settings.use_color);
    }

    #[test]
    fn test_no_output_and_json_disable_file_and_color() {
        let cli = parse(&["-f", "a.txt", "b.txt", "--no-output", "--json"]);
        let settings = Settings::resolve(&cli, AppConfig::default(), true);
        assert_eq!(settings.output, None);
        assert!(!settings.use_color);

        let cli = parse(&["-f", "a.txt", "b.txt"]);
        assert!(!Settings::resolve(&cli, AppConfig::default(), false).use_color);
    }

    #[test]
    fn test_colorize_diff_line() {
        assert_eq!(colorize_diff_line("-Test Case."), "\x1b[31m-Test Case.\x1b[0m");
        assert_eq!(colorize_diff_line("+Hello World."), "\x1b[32m+Hello World.\x1b[0m");
        assert_eq!(colorize_diff_line("@@ -1 +1 @@"), "\x1b[36m@@ -1 +1 @@\x1b[0m");
        assert_eq!(colorize_diff_line("--- a.txt"), "\x1b[1m--- a.txt\x1b[0m");
        assert_eq!(colorize_diff_line(" context"), " context");
    }

    #[test]
    fn test_error_chain_includes_source() {
        let err = DCompareError::Hash {
            path: PathBuf::from("a.txt"),
            source: io::Error::new(io::ErrorKind::Other, "device busy"),
        };
        assert_eq!(
            error_chain(&err),
            "Could not hash file a.txt: device busy"
        );
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = load_settings_file(Some(temp.path().join("nope.toml").as_path())).unwrap_err();
        assert!(format!("{:#}", err).contains("Config file does not exist"));
    }
}
