use azd::compiler::diagnostic::CODES;
use azd::compiler::{FileReport, Level, TemplateCompiler};
use azd::config::Config;
use azd::output::{CompileStats, get_formatter};
use clap::Parser;
use eyre::{Context, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

const STDIN_PATH: &str = "-";

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if matches!(cli.command, Some(Commands::Codes)) {
        return list_codes();
    }

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli)?;

    if cli.show_config {
        return show_config(&config);
    }

    let compiler = TemplateCompiler::new(config).context("Failed to set up compiler")?;
    let files = cli.get_files();

    let ok = match &cli.command {
        Some(Commands::Compile { out_dir, dry_run, .. }) => {
            run_compile(&compiler, &files, out_dir.as_deref(), *dry_run, &cli)?
        }
        _ => run_check(&compiler, &files, &cli)?,
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply CLI overrides to the configuration
fn apply_cli_overrides(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(dialect) = cli.dialect {
        config.dialect = Some(dialect);
    }

    if let Some(nesting) = cli.nesting {
        config.nesting = Some(nesting);
    }

    for (field, value) in cli.get_overrides() {
        config
            .overrides
            .set(&field, value)
            .with_context(|| format!("Invalid --set override '{}'", field))?;
    }

    Ok(())
}

/// Compile the inputs, reading standard input for `-`
fn compile_inputs(compiler: &TemplateCompiler, files: &[PathBuf]) -> Result<Vec<FileReport>> {
    if files.iter().any(|f| f.as_os_str() == STDIN_PATH) {
        if files.len() > 1 {
            return Err(eyre::eyre!("'{}' cannot be combined with other paths", STDIN_PATH));
        }

        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read standard input")?;

        let mut report = compiler.compile_content("<stdin>", &content);
        report.relative_path = PathBuf::from(STDIN_PATH);
        return Ok(vec![report]);
    }

    compiler.compile_paths(files).context("Compilation failed")
}

/// Check templates and print a diagnostics report
fn run_check(compiler: &TemplateCompiler, files: &[PathBuf], cli: &Cli) -> Result<bool> {
    let results = filter_results(compile_inputs(compiler, files)?, cli);

    let formatter = get_formatter(cli.format);
    println!("{}", formatter.format_results(&results));

    let stats = CompileStats::from_results(&results);
    if cli.verbose {
        eprintln!("Processed {} files, {} with directives", stats.total_files, stats.files_changed);
    }

    Ok(!stats.has_errors())
}

/// Compile templates and print or write the output
fn run_compile(
    compiler: &TemplateCompiler,
    files: &[PathBuf],
    out_dir: Option<&Path>,
    dry_run: bool,
    cli: &Cli,
) -> Result<bool> {
    let results = filter_results(compile_inputs(compiler, files)?, cli);

    if let Some(dir) = out_dir {
        check_distinct_destinations(dir, &results)?;
    }

    for report in &results {
        let Some(output) = &report.output else { continue };

        match out_dir {
            Some(dir) if report.relative_path.as_os_str() != STDIN_PATH => {
                let destination = dir.join(&report.relative_path);
                if dry_run {
                    println!("Would write {}", destination.display());
                    continue;
                }

                if let Some(parent) = destination.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create directory {}", parent.display()))?;
                }
                std::fs::write(&destination, output)
                    .with_context(|| format!("Failed to write {}", destination.display()))?;
                info!(source = %report.path.display(), destination = %destination.display(), "wrote template");
            }
            _ if dry_run => println!("Would print {}", report.path.display()),
            _ => print!("{}", output),
        }
    }

    let stats = CompileStats::from_results(&results);
    if stats.has_problems() {
        let with_problems: Vec<FileReport> = results.into_iter().filter(|r| !r.diagnostics.is_empty()).collect();
        eprintln!("{}", get_formatter(cli.format).format_results(&with_problems));
    }

    Ok(!stats.has_errors())
}

/// Refuse to let two inputs write the same output file
fn check_distinct_destinations(out_dir: &Path, results: &[FileReport]) -> Result<()> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();

    for report in results {
        if report.relative_path.as_os_str() == STDIN_PATH {
            continue;
        }

        let destination = out_dir.join(&report.relative_path);
        if let Some(previous) = seen.insert(destination.clone(), &report.path) {
            return Err(eyre::eyre!(
                "{} and {} would both be written to {}",
                previous.display(),
                report.path.display(),
                destination.display()
            ));
        }
    }

    Ok(())
}

/// List every diagnostic code
fn list_codes() -> Result<()> {
    println!("Diagnostic codes:");
    println!();

    for (code, description) in CODES {
        println!("  {}", code);
        println!("    {}", description);
    }

    Ok(())
}

/// Show the effective configuration
fn show_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    let dialect = serde_yaml::to_string(&config.resolve_dialect()?).context("Failed to serialize dialect")?;

    println!("Effective configuration:");
    println!("{}", yaml);
    println!("Resolved dialect:");
    println!("{}", dialect);

    Ok(())
}

/// Filter results based on CLI options
fn filter_results(results: Vec<FileReport>, cli: &Cli) -> Vec<FileReport> {
    if !cli.errors_only {
        return results;
    }

    results
        .into_iter()
        .map(|mut report| {
            report.diagnostics.retain(|d| matches!(d.level, Level::Error));
            report
        })
        .collect()
}
