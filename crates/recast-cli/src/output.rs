//! Output formatting and reporting

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use colored::Colorize;
use recast_core::{Diagnostic, Severity};
use recast_java::ParseError;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

/// Totals of one `recast run`
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files_checked: usize,
    pub files_changed: usize,
    pub files_written: usize,
    /// Files skipped because they could not be read, parsed back or written
    pub files_failed: usize,
    pub warnings: usize,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }
}

/// Unified diff of one file, colored when `use_colors` is set
pub fn render_diff(path: &Path, before: &str, after: &str, use_colors: bool) -> String {
    let diff = TextDiff::from_lines(before, after);
    let name = path.display().to_string();
    let mut out = String::new();

    let header = format!("--- {name}\n+++ {name}\n");
    if use_colors {
        out.push_str(&header.bold().to_string());
    } else {
        out.push_str(&header);
    }

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        let range = format!("{}\n", hunk.header());
        out.push_str(&if use_colors { range.cyan().to_string() } else { range });
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            let mut line = format!("{sign}{}", change.to_string_lossy());
            if change.missing_newline() {
                line.push_str("\n\\ No newline at end of file\n");
            }
            let line = match (use_colors, change.tag()) {
                (true, ChangeTag::Delete) => line.red().to_string(),
                (true, ChangeTag::Insert) => line.green().to_string(),
                _ => line,
            };
            out.push_str(&line);
        }
    }
    out
}

/// Syntax errors of one file as source snippets
pub fn render_parse_errors(
    path: &Path,
    source: &str,
    errors: &[ParseError],
    use_colors: bool,
) -> String {
    let name = path.display().to_string();
    let mut buffer = Vec::new();
    for error in errors {
        let span = clamp(error.span.clone(), source.len());
        let report = Report::build(ReportKind::Warning, (name.as_str(), span.clone()))
            .with_config(Config::default().with_color(use_colors))
            .with_message("syntax not understood; the region is left untouched")
            .with_label(
                Label::new((name.as_str(), span))
                    .with_message(&error.message)
                    .with_color(Color::Yellow),
            )
            .finish();
        // writing into a Vec cannot fail
        let _ = report.write((name.as_str(), Source::from(source)), &mut buffer);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn clamp(span: std::ops::Range<usize>, len: usize) -> std::ops::Range<usize> {
    let start = span.start.min(len);
    start..span.end.clamp(start, len)
}

/// One engine diagnostic as a single line
pub fn render_diagnostic(path: &Path, diagnostic: &Diagnostic, use_colors: bool) -> String {
    let level = diagnostic.severity.to_string();
    let level = if use_colors {
        match diagnostic.severity {
            Severity::Error => level.red().bold().to_string(),
            Severity::Warning => level.yellow().bold().to_string(),
            Severity::Info => level.blue().bold().to_string(),
        }
    } else {
        level
    };
    match &diagnostic.recipe {
        Some(recipe) => format!("{level}: {}: {} [{recipe}]", path.display(), diagnostic.message),
        None => format!("{level}: {}: {}", path.display(), diagnostic.message),
    }
}

pub fn print_summary(summary: &RunSummary, write: bool) {
    println!("\n{}", "Summary:".bold());
    println!("  Files checked: {}", summary.files_checked);
    if write {
        println!("  Files rewritten: {}", summary.files_written.to_string().green());
    } else {
        println!("  Files to change: {}", summary.files_changed.to_string().green());
    }
    if summary.warnings > 0 {
        println!("  Warnings: {}", summary.warnings.to_string().yellow());
    }
    if summary.files_failed > 0 {
        println!("  Files skipped: {}", summary.files_failed.to_string().red());
    }
}
