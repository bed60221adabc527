//! CLI command implementations

use crate::discovery::discover_files;
use crate::output::{self, RunSummary};
use anyhow::{Context, bail};
use colored::Colorize;
use rayon::prelude::*;
use recast_core::config::loader::CONFIG_FILE_NAMES;
use recast_core::{
    ConfigLoader, Diagnostic, Engine, RecastConfig, RecastError, Recipe, Severity,
};
use recast_java::{JavaParser, ParseError};
use recast_recipes::{builtin_recipes, resolve_recipes};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Options of `recast run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub paths: Vec<PathBuf>,
    pub recipes: Vec<String>,
    pub write: bool,
    pub diff: bool,
    pub check: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub report_unresolved: bool,
    pub use_colors: bool,
}

/// What happened to one file
#[derive(Debug)]
enum FileOutcome {
    Unchanged,
    Changed { after: String },
    /// The file was left alone; the message says why
    Skipped(String),
}

#[derive(Debug)]
struct FileReport {
    path: PathBuf,
    before: String,
    outcome: FileOutcome,
    parse_errors: Vec<ParseError>,
    diagnostics: Vec<Diagnostic>,
}

/// Parse, transform and print one file
fn process_file(
    path: &Path,
    parser: &JavaParser,
    engine: &Engine,
    recipes: &[Box<dyn Recipe>],
) -> FileReport {
    let mut report = FileReport {
        path: path.to_path_buf(),
        before: String::new(),
        outcome: FileOutcome::Unchanged,
        parse_errors: Vec::new(),
        diagnostics: Vec::new(),
    };

    report.before = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            report.outcome = FileOutcome::Skipped(RecastError::io_error(path, e).to_string());
            return report;
        }
    };

    let file = match parser.parse(&report.before) {
        Ok(file) => file,
        Err(e) => {
            // no rewrite can be trusted without the baseline
            report.outcome = FileOutcome::Skipped(e.with_path(path).to_string());
            return report;
        }
    };
    report.parse_errors = file.errors;

    let result = engine.run(recipes, &file.tree);
    report.diagnostics = result.diagnostics.clone();
    if result.changed {
        let after = result.print();
        if after != report.before {
            debug!(
                "{} changed after {} passes",
                path.display(),
                result.passes
            );
            report.outcome = FileOutcome::Changed { after };
        }
    }
    report
}

/// Run recipes over the discovered files
pub fn run_command(options: RunOptions, config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    debug!("Running recipes on paths: {:?}", options.paths);
    let start_time = Instant::now();

    let start_dir = options
        .paths
        .first()
        .map(|p| {
            if p.is_file() {
                p.parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."))
            } else {
                p.as_path()
            }
        })
        .filter(|p| p.exists());
    let mut config = ConfigLoader::load(config_path, start_dir)?;

    // Apply CLI overrides to configuration
    if !options.include.is_empty() {
        config.files.include = options.include.clone();
    }
    if !options.exclude.is_empty() {
        config.files.exclude = options.exclude.clone();
    }
    if options.report_unresolved {
        config.engine.report_unresolved = true;
    }

    let names = if options.recipes.is_empty() {
        config.recipes.clone()
    } else {
        options.recipes.clone()
    };
    if names.is_empty() {
        bail!("no recipes selected; pass --recipe NAME or list them under `recipes` in recast.toml");
    }
    let recipes = resolve_recipes(names.as_slice())?;
    info!("Running recipes: {}", names.join(", "));

    let files = discover_files(&options.paths, &config.files)?;
    if files.is_empty() {
        println!("No Java files found in specified paths.");
        return Ok(ExitCode::SUCCESS);
    }
    debug!("Found {} Java files", files.len());

    let parser = JavaParser::with_classpath(config.classpath.clone());
    let engine = Engine::new(config.engine.clone());
    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| process_file(path, &parser, &engine, &recipes))
        .collect();

    let mut summary = RunSummary {
        files_checked: reports.len(),
        ..RunSummary::default()
    };
    for report in &reports {
        if !report.parse_errors.is_empty() {
            eprint!(
                "{}",
                output::render_parse_errors(
                    &report.path,
                    &report.before,
                    &report.parse_errors,
                    options.use_colors,
                )
            );
        }
        for diagnostic in &report.diagnostics {
            if diagnostic.severity >= Severity::Warning {
                summary.warnings += 1;
            }
            eprintln!(
                "{}",
                output::render_diagnostic(&report.path, diagnostic, options.use_colors)
            );
        }

        match &report.outcome {
            FileOutcome::Unchanged => {}
            FileOutcome::Skipped(reason) => {
                summary.files_failed += 1;
                eprintln!("{} {reason}", "error:".red().bold());
            }
            FileOutcome::Changed { after } => {
                summary.files_changed += 1;
                if options.diff {
                    print!(
                        "{}",
                        output::render_diff(&report.path, &report.before, after, options.use_colors)
                    );
                }
                if options.write {
                    match fs::write(&report.path, after) {
                        Ok(()) => summary.files_written += 1,
                        Err(e) => {
                            summary.files_failed += 1;
                            eprintln!(
                                "{} {}",
                                "error:".red().bold(),
                                RecastError::io_error(&report.path, e)
                            );
                        }
                    }
                } else if !options.diff {
                    println!("{} {}", "would change".yellow(), report.path.display());
                }
            }
        }
    }

    output::print_summary(&summary, options.write);
    debug!("Completed in {:?}", start_time.elapsed());

    if summary.has_failures() || (options.check && summary.files_changed > 0) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// List built-in recipes
pub fn recipes_command(detailed: bool) {
    for recipe in builtin_recipes() {
        if detailed {
            println!("{}", recipe.name().bold());
            println!("  {}", recipe.display_name());
            println!("  {}\n", recipe.description());
        } else {
            println!("{}", recipe.name());
        }
    }
}

/// Write a default `recast.toml` into the current directory
pub fn config_init_command(force: bool) -> anyhow::Result<()> {
    let path = PathBuf::from(CONFIG_FILE_NAMES[0]);
    if path.exists() && !force {
        bail!(
            "{} already exists; use --force to overwrite it",
            path.display()
        );
    }

    let config = RecastConfig {
        recipes: builtin_recipes()
            .iter()
            .map(|r| r.name().to_string())
            .collect(),
        ..RecastConfig::default()
    };
    let content = config.to_toml()?;
    fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("{} Created {}", "✓".green(), path.display());
    Ok(())
}

/// Print the configuration in effect
pub fn config_show_command(config_path: Option<&Path>) -> anyhow::Result<()> {
    let source = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => ConfigLoader::auto_discover(Path::new("."))?,
    };
    match &source {
        Some(path) => println!("# {}", path.display()),
        None => {
            warn!("No config file found, showing defaults");
            println!("# defaults");
        }
    }
    let config = ConfigLoader::load(source.as_deref(), None)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
