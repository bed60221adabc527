//! Fixpoint application of recipe lists
//!
//! One pass runs every recipe once, in list order, each over the tree the
//! previous recipe produced. Passes repeat until a pass leaves the tree
//! structurally unchanged or the configured cap is hit. Reaching the cap is
//! reported, never fatal: the tree of the last pass is still returned.

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::imports::{self, ImportOutcome};
use crate::printer::{self, PrintOutput, PrinterOptions};
use crate::recipe::Recipe;
use crate::tree::Node;
use crate::visitor;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Outcome of [`Engine::apply`]
#[derive(Debug, Clone)]
pub struct FixpointResult {
    pub tree: Node,
    /// Full passes run, including the final one that changed nothing
    pub passes: usize,
    /// The result differs from the input
    pub changed: bool,
    /// A pass without changes was reached before the cap
    pub stabilized: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of [`Engine::run`]: fixpoint plus import reconciliation
#[derive(Debug, Clone)]
pub struct RunResult {
    pub tree: Node,
    pub passes: usize,
    pub changed: bool,
    pub stabilized: bool,
    pub imports_added: Vec<String>,
    pub imports_removed: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    printer: PrinterOptions,
}

impl RunResult {
    /// Output text of the final tree
    pub fn print(&self) -> String {
        self.print_output().text
    }

    /// Output text plus any formatting gaps the printer filled
    pub fn print_output(&self) -> PrintOutput {
        printer::print_with_options(&self.tree, &self.printer)
    }
}

/// A recipe runner with a fixed configuration
///
/// The engine holds no per-file state; one instance can be shared by many
/// threads, each running its own files.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Re-run `recipes` over `tree` until nothing changes
    pub fn apply(&self, recipes: &[Box<dyn Recipe>], tree: &Node) -> FixpointResult {
        let max_passes = self.config.max_passes.max(1);
        let mut diagnostics = Vec::new();
        let mut current = tree.clone();
        let mut passes = 0;
        let mut stabilized = false;

        while passes < max_passes {
            passes += 1;
            let start = current.clone();
            for recipe in recipes {
                current = self.apply_recipe(recipe.as_ref(), &current, &mut diagnostics);
            }
            if current == start {
                stabilized = true;
                break;
            }
            debug!(pass = passes, "pass changed the tree");
        }

        if !stabilized {
            warn!(
                max_passes,
                "recipes did not reach a fixpoint; keeping the result of the last pass"
            );
            let names: Vec<&str> = recipes.iter().map(|r| r.name()).collect();
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::NonTerminatingFixpoint,
                format!(
                    "tree still changing after {max_passes} passes of [{}]",
                    names.join(", ")
                ),
            ));
        }

        let changed = current != *tree;
        debug!(passes, changed, stabilized, "fixpoint finished");
        FixpointResult {
            tree: current,
            passes,
            changed,
            stabilized,
            diagnostics: dedup(diagnostics),
        }
    }

    fn apply_recipe(
        &self,
        recipe: &dyn Recipe,
        tree: &Node,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Node {
        if !recipe.precondition(tree) {
            trace!(recipe = recipe.name(), "precondition not met, skipping");
            return tree.clone();
        }
        let mut visitor = recipe.visitor();
        let result = visitor::walk(visitor.as_mut(), tree, recipe.name(), &self.config, diagnostics);
        if !result.ptr_eq(tree) {
            debug!(recipe = recipe.name(), "recipe rewrote the tree");
        }
        result
    }

    /// Fixpoint application followed by import reconciliation
    ///
    /// Imports are only reconciled when the recipes changed something, so an
    /// untouched file prints exactly as parsed.
    pub fn run(&self, recipes: &[Box<dyn Recipe>], tree: &Node) -> RunResult {
        let fixpoint = self.apply(recipes, tree);
        let mut diagnostics = fixpoint.diagnostics;

        let (tree, imports_added, imports_removed) = if fixpoint.changed {
            let ImportOutcome {
                tree,
                added,
                removed,
                diagnostics: import_diagnostics,
            } = imports::reconcile_imports_with(&fixpoint.tree, &self.config);
            diagnostics.extend(import_diagnostics);
            (tree, added, removed)
        } else {
            (fixpoint.tree, Vec::new(), Vec::new())
        };

        RunResult {
            tree,
            passes: fixpoint.passes,
            changed: fixpoint.changed,
            stabilized: fixpoint.stabilized,
            imports_added,
            imports_removed,
            diagnostics,
            printer: self.config.printer.clone(),
        }
    }
}

/// [`Engine::apply`] with the default configuration, returning only the tree
pub fn apply(recipes: &[Box<dyn Recipe>], tree: &Node) -> Node {
    Engine::default().apply(recipes, tree).tree
}

/// Drop repeats of the same report from later passes
fn dedup(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    diagnostics
        .into_iter()
        .filter(|d| seen.insert((d.kind, d.node, d.recipe.clone(), d.message.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::from_fn;
    use crate::tree::{Formatting, SyntaxKind, make};
    use crate::visitor::Visit;

    fn ident(text: &str) -> Node {
        Node::token(SyntaxKind::Ident, text).with_formatting(Formatting::default())
    }

    fn stmt(text: &str) -> Node {
        Node::new(SyntaxKind::ExprStmt, vec![ident(text), make::token(SyntaxKind::Semicolon)])
            .with_formatting(Formatting::default())
    }

    #[test]
    fn test_no_recipes_is_one_pass() {
        let tree = stmt("a");
        let result = Engine::default().apply(&[], &tree);
        assert_eq!(result.passes, 1);
        assert!(result.stabilized);
        assert!(!result.changed);
        assert!(result.tree.ptr_eq(&tree));
    }

    #[test]
    fn test_second_order_rewrite_needs_second_pass() {
        // b -> c only after a -> b happened; listed in the "wrong" order
        let recipes: Vec<Box<dyn Recipe>> = vec![
            Box::new(from_fn("b-to-c", |node, _cx| match node.text() {
                Some("b") => Visit::Replace(make::identifier("c")),
                _ => Visit::Keep,
            })),
            Box::new(from_fn("a-to-b", |node, _cx| match node.text() {
                Some("a") => Visit::Replace(make::identifier("b")),
                _ => Visit::Keep,
            })),
        ];
        let result = Engine::default().apply(&recipes, &stmt("a"));
        assert_eq!(result.tree.to_string(), "c;");
        assert_eq!(result.passes, 3);
        assert!(result.changed);
    }

    #[test]
    fn test_cap_reached_is_reported_not_fatal() {
        // flips forever between x and y
        let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(from_fn("flip", |node, _cx| {
            match node.text() {
                Some("x") => Visit::Replace(make::identifier("y")),
                Some("y") => Visit::Replace(make::identifier("x")),
                _ => Visit::Keep,
            }
        }))];
        let engine = Engine::new(EngineConfig::default().with_max_passes(3));
        let result = engine.apply(&recipes, &stmt("x"));

        assert!(!result.stabilized);
        assert_eq!(result.passes, 3);
        assert_eq!(result.tree.to_string(), "y;");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::NonTerminatingFixpoint);
    }

    #[test]
    fn test_failed_precondition_skips_recipe() {
        struct Never;

        impl Recipe for Never {
            fn name(&self) -> &str {
                "never"
            }

            fn precondition(&self, _tree: &Node) -> bool {
                false
            }

            fn visitor(&self) -> Box<dyn visitor::Visitor + '_> {
                panic!("visitor requested despite failed precondition")
            }
        }

        let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(Never)];
        let result = Engine::default().apply(&recipes, &stmt("a"));
        assert!(!result.changed);
    }

    #[test]
    fn test_run_leaves_unchanged_tree_alone() {
        let tree = stmt("a");
        let result = Engine::default().run(&[], &tree);
        assert!(result.tree.ptr_eq(&tree));
        assert!(result.imports_added.is_empty());
        assert_eq!(result.print(), "a;");
    }

    #[test]
    fn test_free_apply() {
        let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(from_fn("a-to-z", |node, _cx| {
            match node.text() {
                Some("a") => Visit::Replace(make::identifier("z")),
                _ => Visit::Keep,
            }
        }))];
        assert_eq!(apply(&recipes, &stmt("a")).to_string(), "z;");
    }
}
