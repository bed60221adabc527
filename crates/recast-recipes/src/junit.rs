//! JUnit 5 assertion cleanups

use recast_core::tree::ast::{AstNode, MethodInvocation, is_null_literal};
use recast_core::{
    MatchPattern, NamePattern, Node, Recipe, SyntaxKind, TypePattern, Visit, VisitContext,
    Visitor,
};

pub const ASSERTIONS: &str = "org.junit.jupiter.api.Assertions";

/// `assertEquals(x, null)` and `assertEquals(null, x)` to `assertNull(x)`
///
/// Only the two-argument overload is rewritten; the call keeps its form, so
/// `Assertions.assertEquals` becomes `Assertions.assertNull` and a statically
/// imported `assertEquals` becomes a statically imported `assertNull`.
pub struct AssertEqualsNullToAssertNull {
    pattern: MatchPattern,
}

impl AssertEqualsNullToAssertNull {
    pub const NAME: &'static str = "junit-assert-equals-null-to-assert-null";

    pub fn new() -> Self {
        let pattern = MatchPattern::new(
            TypePattern::exact(ASSERTIONS),
            NamePattern::Exact("assertEquals".to_string()),
            vec![TypePattern::Any, TypePattern::Any],
        )
        .with_static(true);
        Self { pattern }
    }
}

impl Default for AssertEqualsNullToAssertNull {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for AssertEqualsNullToAssertNull {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "`assertEquals(a, null)` to `assertNull(a)`"
    }

    fn description(&self) -> &str {
        "Using `assertNull(a)` is simpler and more clear."
    }

    /// Any mention of `assertEquals`, resolved or not, so that unresolved
    /// call sites can still be reported
    fn precondition(&self, tree: &Node) -> bool {
        tree.descendants()
            .any(|n| n.kind() == SyntaxKind::Ident && n.text() == Some("assertEquals"))
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(AssertNullVisitor {
            pattern: &self.pattern,
        })
    }
}

struct AssertNullVisitor<'r> {
    pattern: &'r MatchPattern,
}

impl Visitor for AssertNullVisitor<'_> {
    fn visit_method_invocation(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Visit {
        if !cx.matches(self.pattern, node) {
            return Visit::Keep;
        }
        let Some(call) = MethodInvocation::cast(node.clone()) else {
            return Visit::Keep;
        };
        let (Some(args), Some(method)) = (call.args(), call.method_type()) else {
            return Visit::Keep;
        };
        let values = args.args();
        let [first, second] = values.as_slice() else {
            cx.mismatch(node, "expected two arguments");
            return Visit::Keep;
        };
        let actual = match (is_null_literal(first), is_null_literal(second)) {
            (true, false) => second,
            (false, true) => first,
            _ => return Visit::Keep,
        };

        // the remaining argument takes the first slot
        let actual = actual.with_leading(first.leading());
        let method = method.with_name("assertNull");
        let rewritten = call
            .with_name("assertNull")
            .with_args(args.with_args(vec![actual]))
            .with_method_type(method);
        Visit::Replace(rewritten.into_node())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::{DiagnosticKind, Engine, EngineConfig};

    fn run_with(config: EngineConfig, source: &str) -> recast_core::RunResult {
        let tree = recast_java::parse(source).unwrap().tree;
        let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(AssertEqualsNullToAssertNull::new())];
        Engine::new(config).run(&recipes, &tree)
    }

    #[test]
    fn test_message_overload_is_left_alone() {
        let source = "import static org.junit.jupiter.api.Assertions.assertEquals;\n\
                      class T { void t(String s) { assertEquals(s, null, \"message\"); } }\n";
        let result = run_with(EngineConfig::default(), source);
        assert!(!result.changed);
        assert_eq!(result.print(), source);
    }

    #[test]
    fn test_two_nulls_are_left_alone() {
        let source = "import static org.junit.jupiter.api.Assertions.assertEquals;\n\
                      class T { void t() { assertEquals(null, null); } }\n";
        assert!(!run_with(EngineConfig::default(), source).changed);
    }

    #[test]
    fn test_spacing_inside_parentheses_is_kept() {
        let source = "import org.junit.jupiter.api.Assertions;\n\
                      class T { void t(String s) { Assertions.assertEquals( null, s ); } }\n";
        assert_eq!(
            run_with(EngineConfig::default(), source).print(),
            "import org.junit.jupiter.api.Assertions;\n\
             class T { void t(String s) { Assertions.assertNull( s ); } }\n"
        );
    }

    #[test]
    fn test_unresolved_call_reported_only_on_request() {
        // nothing tells which `Assertions` the on-demand import brings in
        let source = "import org.junit.jupiter.api.*;\n\
                      class T { void t(String s) { Assertions.assertEquals(s, null); } }\n";

        let quiet = run_with(EngineConfig::default(), source);
        assert!(!quiet.changed);
        assert!(quiet.diagnostics.is_empty());

        let loud = run_with(EngineConfig::default().with_report_unresolved(true), source);
        assert!(!loud.changed);
        assert_eq!(loud.diagnostics.len(), 1);
    }

    #[test]
    fn test_unresolved_static_import_reported_on_request() {
        let source = "import static org.junit.jupiter.api.Assertions.*;\n\
                      class T { void t(String s) { assertEquals(s, null); } }\n";
        let result = run_with(EngineConfig::default().with_report_unresolved(true), source);
        assert!(!result.changed);
        assert_eq!(result.print(), source);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnresolvedReference);
    }
}
