//! Recast CLI
//!
//! Command-line interface for running migration recipes over Java sources

mod commands;
mod discovery;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use recast_core::init_tracing_with;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "recast")]
#[command(about = "Recast: automated source migrations for Java code")]
#[command(version = recast_core::VERSION)]
#[command(
    long_about = "Recast rewrites Java sources with composable recipes while keeping\n\
every untouched byte of the original formatting.\n\
\n\
Examples:\n  \
recast run --recipe mockito-mock-utils-to-static src/   # Preview changes\n  \
recast run --diff src/                                  # Show diffs for configured recipes\n  \
recast run --write src/                                 # Rewrite files in place\n  \
recast recipes                                          # List available recipes\n  \
recast config init                                      # Create recast.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (recast.toml/recast.json)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run recipes over Java files
    Run {
        /// Files or directories to process
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Recipes to run, in order
        #[arg(
            short,
            long = "recipe",
            value_name = "NAME",
            help = "Recipe to run; repeat to run several (default: recipes from the config file)"
        )]
        recipes: Vec<String>,

        /// Write results back to the files
        #[arg(long, help = "Write rewritten sources back to the files")]
        write: bool,

        /// Show a diff for every changed file
        #[arg(long, help = "Show a unified diff for every changed file")]
        diff: bool,

        /// Exit with non-zero code when any file would change
        #[arg(
            long,
            help = "Exit with code 1 when any file would change",
            conflicts_with = "write"
        )]
        check: bool,

        /// Include patterns (glob syntax)
        #[arg(
            long,
            help = "Include files matching pattern (can be used multiple times)"
        )]
        include: Vec<String>,

        /// Exclude patterns (glob syntax)
        #[arg(
            long,
            help = "Exclude files matching pattern (can be used multiple times)"
        )]
        exclude: Vec<String>,

        /// Report call sites skipped for missing type information
        #[arg(long, help = "Report call sites that could not be resolved")]
        report_unresolved: bool,
    },

    /// List available recipes
    Recipes {
        /// Show recipe descriptions
        #[arg(long, help = "Show the description of each recipe")]
        detailed: bool,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default recast.toml into the current directory
    Init {
        /// Overwrite existing configuration file
        #[arg(long, help = "Overwrite existing configuration file")]
        force: bool,
    },

    /// Show the configuration that applies to the current directory
    Show,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "recast=error",
        1 => "recast=warn",
        2 => "recast=info",
        3 => "recast=debug",
        _ => "recast=trace",
    };
    init_tracing_with(log_level);

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        eprintln!("{} failed to set thread pool size: {e}", "error:".red().bold());
        return ExitCode::FAILURE;
    }

    match run_command(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();
    match cli.command {
        Some(Commands::Run {
            paths,
            recipes,
            write,
            diff,
            check,
            include,
            exclude,
            report_unresolved,
        }) => {
            let paths = if paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                paths
            };
            let options = commands::RunOptions {
                paths,
                recipes,
                write,
                diff,
                check,
                include,
                exclude,
                report_unresolved,
                use_colors,
            };
            commands::run_command(options, cli.config.as_deref())
        }

        Some(Commands::Recipes { detailed }) => {
            commands::recipes_command(detailed);
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::Config { action }) => {
            match action {
                ConfigAction::Init { force } => commands::config_init_command(force)?,
                ConfigAction::Show => commands::config_show_command(cli.config.as_deref())?,
            }
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("recast {}", recast_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                println!("  Recipes: {}", recast_recipes::builtin_recipes().len());
            } else {
                println!("{}", recast_core::VERSION);
            }
            Ok(ExitCode::SUCCESS)
        }

        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
