use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use verbprobe_core::batch::{BatchOptions, BatchProgressCallback, BatchResult, execute_batch};
use verbprobe_core::data::{Database, StoredResult};
use verbprobe_core::report::{ReportFormat, generate_report, save_report};
use verbprobe_scanner::ScanOutcome;
use verbprobe_scanner::result::UNREACHABLE_MESSAGE;
use verbprobe_scanner::scanner::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/verbprobe/";
pub const DATABASE_FILE: &str = "verbprobe.db";

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,verbprobe=debug,verbprobe_core=debug,verbprobe_scanner=debug"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        debug!("Log subscriber already installed: {}", e);
    }
}

/// Collect inputs from positional arguments followed by the hosts file.
pub fn load_inputs(urls: &[String], hosts_file: Option<&PathBuf>) -> Result<Vec<String>, String> {
    let mut inputs = urls.to_vec();
    if let Some(path) = hosts_file {
        inputs.extend(load_urls_from_file(path)?);
    }

    if inputs.is_empty() {
        return Err("Either URLs or --hosts-file must be provided".to_string());
    }

    Ok(inputs)
}

/// Load inputs from a newline-delimited file.
///
/// Blank lines and lines starting with `#` are skipped. Every other line is
/// trimmed and kept as-is, so malformed entries still reach the batch and
/// get reported there.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        return Err(format!("No URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Expand `~` in a user-supplied database path, or fall back to the default.
pub fn resolve_db_path(db: Option<&String>) -> PathBuf {
    match db {
        Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_DIR).as_ref()).join(DATABASE_FILE)
}

fn open_database(db_path: &Path) -> Result<Database> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Database::new(db_path).with_context(|| format!("Failed to open database {}", db_path.display()))
}

/// Store the merged view of a batch. Returns the new session id.
pub fn save_results(db_path: &Path, inputs: &[String], result: &BatchResult) -> Result<String> {
    let mut db = open_database(db_path)?;
    let session_id = db
        .save_batch(inputs, result)
        .with_context(|| format!("Failed to save results to {}", db_path.display()))?;
    info!(session = %session_id, urls = result.merged().len(), "saved batch");
    Ok(session_id)
}

pub async fn handle_check(args: &ArgMatches, quiet: bool) -> Result<()> {
    let urls: Vec<String> = args
        .get_many::<String>("URLS")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let hosts_file = args.get_one::<PathBuf>("hosts-file");
    let timeout = *args.get_one::<u64>("timeout").unwrap_or(&DEFAULT_TIMEOUT_SECS);
    let concurrency = *args
        .get_one::<usize>("concurrency")
        .unwrap_or(&DEFAULT_CONCURRENCY);
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Json);

    let inputs = load_inputs(&urls, hosts_file).map_err(|e| anyhow!(e))?;

    let options = BatchOptions {
        urls: inputs.clone(),
        timeout: Duration::from_secs(timeout),
        concurrency,
        show_progress_bars: !quiet,
    };

    let progress_callback: BatchProgressCallback = Arc::new(|msg: String| {
        info!("{}", msg);
    });

    let result = execute_batch(options, Some(progress_callback))
        .await
        .context("Check failed")?;

    for message in result.diagnostics() {
        println!("{}", message);
    }

    let report = generate_report(&result, format)?;
    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!(
                    "{} Report saved to: {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => println!("{}", report),
    }

    if args.get_flag("save") {
        let db_path = resolve_db_path(args.get_one::<String>("db"));
        let session_id = save_results(&db_path, &inputs, &result)?;
        if !quiet {
            eprintln!(
                "{} Results stored in {} (session {})",
                "✓".green().bold(),
                db_path.display().to_string().bright_white(),
                session_id.cyan()
            );
        }
    }

    Ok(())
}

/// Create the config directory and the database inside it.
///
/// An existing database is kept unless `force` is set, in which case it is
/// dropped and recreated. Returns the database path and whether a new
/// database was created.
pub fn initialize(config_dir: &Path, force: bool) -> Result<(PathBuf, bool)> {
    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create config directory {}", config_dir.display()))?;

    let db_path = config_dir.join(DATABASE_FILE);
    if Database::exists(&db_path) {
        if !force {
            return Ok((db_path, false));
        }
        Database::drop(&db_path)
            .with_context(|| format!("Failed to remove existing database {}", db_path.display()))?;
    }

    Database::new(&db_path)
        .with_context(|| format!("Failed to create database {}", db_path.display()))?;
    Ok((db_path, true))
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    let config_dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_DIR);
    let force = args.get_flag("force");
    let expanded_config_dir = shellexpand::tilde(config_dir);
    let config_dir = Path::new(expanded_config_dir.as_ref());

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );

    let (db_path, created) = initialize(config_dir, force)?;
    if created {
        println!(
            "{} Database initialized: {}",
            "✓".green().bold(),
            db_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!(
            "Database already exists at {} (use --force to recreate it)",
            db_path.display().to_string().bright_white()
        );
    }

    Ok(())
}

/// Render one stored result the way the text report renders a URL.
pub fn format_stored_result(stored: &StoredResult) -> String {
    let mut out = format!(
        "## {} {}\n",
        stored.url,
        format!("(checked {})", stored.checked_at).bright_black()
    );
    match &stored.outcome {
        ScanOutcome::Methods(methods) => {
            for (method, status) in methods.iter() {
                out.push_str(&format!("  {:<8} {}\n", method.as_str(), status));
            }
        }
        ScanOutcome::Unreachable => {
            out.push_str(&format!("  {}\n", UNREACHABLE_MESSAGE.red()));
        }
    }
    out
}

pub fn handle_history(args: &ArgMatches) -> Result<()> {
    let db_path = resolve_db_path(args.get_one::<String>("db"));
    if !Database::exists(&db_path) {
        return Err(anyhow!(
            "No database at {}. Run `verbprobe init` or `verbprobe check --save` first",
            db_path.display()
        ));
    }

    let db = Database::new(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let results = match args.get_one::<String>("url") {
        Some(url) => db.get_result(url)?.into_iter().collect(),
        None => db.list_results()?,
    };

    if results.is_empty() {
        println!("No stored results.");
        return Ok(());
    }

    for stored in &results {
        println!("{}", format_stored_result(stored));
    }

    Ok(())
}
