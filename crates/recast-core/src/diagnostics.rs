//! Non-fatal conditions reported by the engine
//!
//! Nothing in here aborts a transformation. The engine keeps going and
//! hands the collected diagnostics back with its result.

use crate::tree::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages
    Info,
    /// Something was skipped or only partially done
    Warning,
    /// The result should not be trusted without review
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A node that looked like a candidate had no resolved type
    UnresolvedReference,
    /// A visitor found a shape it cannot rewrite (or an invalid removal)
    StructuralMismatch,
    /// The pass cap was reached before the tree stopped changing
    NonTerminatingFixpoint,
    /// A synthesized node had no formatting and got the printer default
    PrinterFormattingGap,
    /// An import could not be added without shadowing another name
    ImportConflict,
}

impl DiagnosticKind {
    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticKind::UnresolvedReference | DiagnosticKind::PrinterFormattingGap => {
                Severity::Info
            }
            DiagnosticKind::StructuralMismatch
            | DiagnosticKind::NonTerminatingFixpoint
            | DiagnosticKind::ImportConflict => Severity::Warning,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedReference => "unresolved-reference",
            DiagnosticKind::StructuralMismatch => "structural-mismatch",
            DiagnosticKind::NonTerminatingFixpoint => "non-terminating-fixpoint",
            DiagnosticKind::PrinterFormattingGap => "printer-formatting-gap",
            DiagnosticKind::ImportConflict => "import-conflict",
        }
    }
}

/// A single engine diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    /// Recipe that was running, if any
    pub recipe: Option<String>,
    /// Node the diagnostic is about; only meaningful for the tree it came from
    #[serde(skip)]
    pub node: Option<NodeId>,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            recipe: None,
            node: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_recipe(mut self, recipe: impl Into<String>) -> Self {
        self.recipe = Some(recipe.into());
        self
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.kind.code())?;
        if let Some(recipe) = &self.recipe {
            write!(f, " ({recipe})")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity() {
        let diag = Diagnostic::new(DiagnosticKind::NonTerminatingFixpoint, "cap reached");
        assert_eq!(diag.severity, Severity::Warning);
        let diag = Diagnostic::new(DiagnosticKind::UnresolvedReference, "no type");
        assert_eq!(diag.severity, Severity::Info);
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::new(DiagnosticKind::StructuralMismatch, "cannot remove argument")
            .with_recipe("remove-unused-local-variables");
        assert_eq!(
            diag.to_string(),
            "warning[structural-mismatch] (remove-unused-local-variables): cannot remove argument"
        );
    }

    #[test]
    fn test_serialize_skips_node() {
        let diag = Diagnostic::new(DiagnosticKind::ImportConflict, "List is ambiguous")
            .with_node(NodeId::fresh());
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "import-conflict");
        assert!(json.get("node").is_none());
    }
}
