//! Recast Core
//!
//! Rewrite engine for Java-like source trees. This crate holds the
//! language-agnostic machinery: the lossless immutable tree, call-site
//! matching, visitors and recipes, the fixpoint driver, import
//! reconciliation and the printer. Parsing lives in `recast-java`.

pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod imports;
pub mod matcher;
pub mod printer;
pub mod recipe;
pub mod result;
pub mod tree;
pub mod visitor;

// Re-export commonly used types
pub use config::{ClasspathConfig, ConfigLoader, EngineConfig, FilesConfig, RecastConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use driver::{Engine, FixpointResult, RunResult, apply};
pub use error::{ErrorKind, RecastError};
pub use imports::{ImportOutcome, reconcile_imports, reconcile_imports_with};
pub use matcher::{MatchOutcome, MatchPattern, NamePattern, TypePattern};
pub use printer::{LineEnding, PrintOutput, PrinterOptions, print, print_with_options};
pub use recipe::Recipe;
pub use result::{Result, ResultExt};
pub use tree::{
    Formatting, JavaType, MethodType, Node, NodeId, Primitive, SyntaxKind, TypeSignature,
    VariableType,
};
pub use visitor::{Visit, VisitContext, Visitor};

/// Initialize the tracing subscriber for logging
///
/// `RUST_LOG` wins when set; otherwise everything from the recast crates at
/// info level and above is logged.
pub fn init_tracing() {
    init_tracing_with("recast=info");
}

/// Initialize the tracing subscriber with a fallback filter directive
///
/// Logs go to stderr so they never mix with rewritten sources or diffs on
/// stdout.
pub fn init_tracing_with(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
