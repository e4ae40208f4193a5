//! Tally - an in-memory spreadsheet driven from the command line

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tally_core::storage::write_csv;
use tally_core::{Config, Spreadsheet};
use tally_engine::builtins::BUILTINS;
use tally_engine::engine::evaluate;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: tally [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Spreadsheet to load (.grd or .json)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <EXPR>      Evaluate EXPR against the sheet and print it (can be repeated)");
    eprintln!("  -o, --output <FILE>       Export evaluated cells to CSV");
    eprintln!("  --config <FILE>           Load settings from a TOML file");
    eprintln!("  -v, --verbose             Log diagnostics to stderr (filter with RUST_LOG)");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Functions:");
    for spec in BUILTINS {
        eprintln!("  {:<26}{}", spec.name, spec.description);
    }
}

struct Args {
    file_path: Option<PathBuf>,
    commands: Vec<String>,
    output_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    verbose: bool,
}

/// `Ok(None)` means help was printed.
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut parsed = Args {
        file_path: None,
        commands: Vec::new(),
        output_file: None,
        config_file: None,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "-v" | "--verbose" => parsed.verbose = true,
            "-c" | "--command" => {
                i += 1;
                let expr = args.get(i).ok_or("--command requires an expression")?;
                parsed.commands.push(expr.clone());
            }
            "-o" | "--output" => {
                i += 1;
                let path = args.get(i).ok_or("--output requires a file path")?;
                parsed.output_file = Some(PathBuf::from(path));
            }
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or("--config requires a file path")?;
                parsed.config_file = Some(PathBuf::from(path));
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("Unknown option: {}", arg));
            }
            arg => {
                if parsed.file_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                parsed.file_path = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }
    Ok(Some(parsed))
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Prints results and returns whether every `-c` expression evaluated cleanly.
fn run(args: Args) -> anyhow::Result<bool> {
    let (config, warnings) = Config::load(args.config_file.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let sheet = match &args.file_path {
        Some(path) => {
            let sheet = Spreadsheet::load_file(path, &config)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                cells = sheet.cells().len(),
                rows = sheet.row_count(),
                cols = sheet.col_count(),
                "loaded sheet"
            );
            sheet
        }
        None => Spreadsheet::with_config(&config),
    };

    let mut clean = true;
    let options = config.eval_options();
    for expr in &args.commands {
        let evaluation = evaluate(expr, &sheet, &options);
        tracing::debug!(expr = %expr, display = %evaluation.display, "evaluated command");
        clean &= evaluation.error.is_none();
        println!("{}", evaluation.display);
    }

    if let Some(output_path) = &args.output_file {
        write_csv(output_path, &sheet)
            .with_context(|| format!("failed to export {}", output_path.display()))?;
        tracing::info!(path = %output_path.display(), "exported csv");
        eprintln!("Exported to {}", output_path.display());
    }

    if args.commands.is_empty() && args.output_file.is_none() {
        for (key, _, display) in sheet.cells() {
            println!("{}\t{}", key, display);
        }
    }
    Ok(clean)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if args.verbose {
        init_logging();
    }

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
