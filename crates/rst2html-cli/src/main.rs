//! rst2html: CLI tool to render reStructuredText files to HTML fragments

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rst2html_core::{RenderResult, Severity, render};

mod config;

use config::{Config, DiagnosticsFormat, FailOn};

#[derive(Parser, Debug)]
#[command(name = "rst2html")]
#[command(about = "Render reStructuredText files to HTML fragments")]
#[command(version)]
#[command(after_help = "Examples:
  rst2html file.rst                 # Render single file to file.html
  rst2html file.rst -o out.html     # Render to specific output file
  rst2html docs/ -o site/           # Render directory
  rst2html docs/ -o site/ -j4       # Use 4 parallel jobs
  rst2html - < file.rst             # Render stdin to stdout")]
struct Cli {
    /// Input .rst file, directory, or '-' for stdin
    #[arg(required_unless_present = "emit_config_schema")]
    input: Option<PathBuf>,

    /// Output file or directory (stdin input always writes to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of parallel jobs (defaults to number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Process directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Diagnostics output format
    #[arg(long, value_enum)]
    diagnostics: Option<DiagnosticsFormat>,

    /// Exit non-zero when diagnostics of this severity were reported
    #[arg(long, value_enum)]
    fail_on: Option<FailOn>,

    /// Extension for output files
    #[arg(long)]
    extension: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long)]
    quiet: bool,

    /// Print the JSON schema for _rst2html.toml and exit
    #[arg(long)]
    emit_config_schema: bool,
}

/// Effective settings after merging CLI flags over the config file
struct Settings {
    extension: String,
    format: DiagnosticsFormat,
    fail_on: FailOn,
}

impl Settings {
    fn resolve(cli: &Cli, config: Option<Config>) -> Self {
        let config = config.unwrap_or_default();
        Settings {
            extension: cli
                .extension
                .clone()
                .or(config.output.extension)
                .unwrap_or_else(|| "html".to_string()),
            format: cli
                .diagnostics
                .or(config.diagnostics.format)
                .unwrap_or_default(),
            fail_on: cli.fail_on.or(config.diagnostics.fail_on).unwrap_or_default(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.emit_config_schema {
        println!("{}", Config::json_schema_string()?);
        return Ok(());
    }

    let Some(input) = cli.input.clone() else {
        anyhow::bail!("No input given");
    };

    if input.as_os_str() == "-" {
        let config = Config::load_from_dir(Path::new("."))?;
        let settings = Settings::resolve(&cli, config);
        return render_stdin(&settings);
    }

    if input.is_file() {
        let config_dir = input.parent().filter(|p| !p.as_os_str().is_empty());
        let config = Config::load_from_dir(config_dir.unwrap_or(Path::new(".")))?;
        let settings = Settings::resolve(&cli, config);
        render_file(&input, cli.output.as_deref(), &settings, &cli)
    } else if input.is_dir() {
        let config = Config::load_from_dir(&input)?;
        let settings = Settings::resolve(&cli, config);
        render_directory(&input, cli.output.as_deref(), &settings, &cli)
    } else {
        anyhow::bail!("Input path does not exist: {}", input.display());
    }
}

/// Render stdin to stdout; diagnostics go to stderr.
fn render_stdin(settings: &Settings) -> Result<()> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("Failed to read from stdin")?;

    let result = render(&source);
    print!("{}", result.html_fragment);
    report_diagnostics("<stdin>", &result, settings.format)?;
    check_fail_on(&result, settings.fail_on, 1)
}

/// Render a single .rst file
fn render_file(
    input: &Path,
    output: Option<&Path>,
    settings: &Settings,
    cli: &Cli,
) -> Result<()> {
    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_extension(&settings.extension),
    };

    if cli.verbose {
        eprintln!(
            "Rendering: {} -> {}",
            input.display(),
            output_path.display()
        );
    }

    let result = render_file_inner(input, &output_path)?;
    report_diagnostics(&input.display().to_string(), &result, settings.format)?;

    if !cli.quiet {
        println!("{}", output_path.display());
    }

    check_fail_on(&result, settings.fail_on, 1)
}

/// Render a directory of .rst files
fn render_directory(
    input: &Path,
    output: Option<&Path>,
    settings: &Settings,
    cli: &Cli,
) -> Result<()> {
    let output_dir = output.unwrap_or(input);

    let files = collect_rst_files(input, cli.recursive)?;

    if files.is_empty() {
        if !cli.quiet {
            eprintln!("No .rst files found in {}", input.display());
        }
        return Ok(());
    }

    let total = files.len();
    if cli.verbose {
        eprintln!("Found {} .rst files", total);
    }

    // Configure thread pool if jobs specified
    if let Some(n) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    // Atomic counters for thread-safe progress tracking
    let success = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let flagged = AtomicUsize::new(0);

    // Parallel rendering; I/O errors are collected, diagnostics reported
    // per file as they finish.
    let errors: Vec<_> = files
        .par_iter()
        .filter_map(|file| {
            let relative = file.strip_prefix(input).unwrap_or(file);
            let output_file = output_dir
                .join(relative)
                .with_extension(&settings.extension);

            match render_file_inner(file, &output_file) {
                Ok(result) => {
                    success.fetch_add(1, Ordering::Relaxed);
                    if reaches_threshold(&result, settings.fail_on) {
                        flagged.fetch_add(1, Ordering::Relaxed);
                    }
                    let report =
                        report_diagnostics(&file.display().to_string(), &result, settings.format);
                    if !cli.quiet {
                        println!("{}", output_file.display());
                    }
                    report.err().map(|e| (file.clone(), e))
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    Some((file.clone(), e))
                }
            }
        })
        .collect();

    // Report errors
    for (file, e) in &errors {
        eprintln!("Error rendering {}: {}", file.display(), e);
    }

    let success_count = success.load(Ordering::Relaxed);
    let failed_count = failed.load(Ordering::Relaxed);
    let flagged_count = flagged.load(Ordering::Relaxed);

    if !cli.quiet {
        eprintln!("Rendered {} files, {} failed", success_count, failed_count);
    }

    if failed_count > 0 {
        anyhow::bail!("{} files failed to render", failed_count);
    }
    if flagged_count > 0 {
        anyhow::bail!(
            "{} files reported diagnostics at or above the fail-on threshold",
            flagged_count
        );
    }

    Ok(())
}

/// Inner render function that doesn't print progress (for parallel use)
fn render_file_inner(input: &Path, output: &Path) -> Result<RenderResult> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read: {}", input.display()))?;

    let result = render(&source);

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(output, &result.html_fragment)
        .with_context(|| format!("Failed to write: {}", output.display()))?;

    Ok(result)
}

/// Collect all .rst files in a directory
fn collect_rst_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                if ext.eq_ignore_ascii_case("rst") {
                    files.push(path);
                }
            }
        } else if path.is_dir() && recursive {
            files.extend(collect_rst_files(&path, recursive)?);
        }
    }

    files.sort();
    Ok(files)
}

/// Print a file's diagnostics to stderr in the configured format.
fn report_diagnostics(file: &str, result: &RenderResult, format: DiagnosticsFormat) -> Result<()> {
    if result.diagnostics.is_empty() {
        return Ok(());
    }
    match format {
        DiagnosticsFormat::Text => {
            for d in &result.diagnostics {
                eprintln!("{}:{}: {}: {}", file, d.line, d.severity, d.message);
            }
        }
        DiagnosticsFormat::Json => {
            #[derive(serde::Serialize)]
            struct FileDiagnostics<'a> {
                file: &'a str,
                diagnostics: &'a [rst2html_core::Diagnostic],
            }
            let line = serde_json::to_string(&FileDiagnostics {
                file,
                diagnostics: &result.diagnostics,
            })
            .context("Failed to serialize diagnostics")?;
            eprintln!("{line}");
        }
    }
    Ok(())
}

fn reaches_threshold(result: &RenderResult, fail_on: FailOn) -> bool {
    match fail_on {
        FailOn::Never => false,
        FailOn::Warning => result.has_severity(Severity::Warning),
        FailOn::Error => result.has_severity(Severity::Error),
    }
}

fn check_fail_on(result: &RenderResult, fail_on: FailOn, files: usize) -> Result<()> {
    if reaches_threshold(result, fail_on) {
        anyhow::bail!(
            "{} files reported diagnostics at or above the fail-on threshold",
            files
        );
    }
    Ok(())
}
