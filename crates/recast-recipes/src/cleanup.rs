//! Dead code removal

use recast_core::tree::ast::{AstNode, FieldAccess, NewClass, VariableDecl};
use recast_core::{JavaType, Node, NodeId, Recipe, SyntaxKind, Visit, VisitContext, Visitor};
use tracing::trace;

/// Drop local variable declarations nothing reads
///
/// A declaration is removed only when none of its variables is mentioned
/// again in the enclosing block and every initializer can be dropped
/// without losing an evaluation: literals, names, and `new` without
/// arguments or class body of a type whose constructor is known to be pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveUnusedLocalVariables;

impl RemoveUnusedLocalVariables {
    pub const NAME: &'static str = "remove-unused-local-variables";
}

impl Recipe for RemoveUnusedLocalVariables {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Remove unused local variables"
    }

    fn description(&self) -> &str {
        "Removes local variables that are never read and whose initializer has no side effects."
    }

    fn precondition(&self, tree: &Node) -> bool {
        tree.descendants().any(|n| n.kind() == SyntaxKind::VariableDecl)
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(UnusedLocalsVisitor)
    }
}

struct UnusedLocalsVisitor;

impl Visitor for UnusedLocalsVisitor {
    fn visit_variable_decl(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Visit {
        let Some(block) = cx.parent().filter(|p| p.kind() == SyntaxKind::Block) else {
            return Visit::Keep;
        };
        let Some(decl) = VariableDecl::cast(node.clone()) else {
            return Visit::Keep;
        };
        let declarators = decl.declarators();
        if declarators.is_empty() {
            return Visit::Keep;
        }

        for declarator in &declarators {
            let Some(name_node) = declarator.name_node() else {
                return Visit::Keep;
            };
            if declarator.initializer().is_some_and(|init| !is_side_effect_free(init)) {
                return Visit::Keep;
            }
            if is_mentioned(block, name_node.text(), name_node.id()) {
                return Visit::Keep;
            }
        }

        trace!(
            names = ?declarators.iter().filter_map(|d| d.name()).collect::<Vec<_>>(),
            "removing unused local variables"
        );
        Visit::Remove
    }
}

/// Types whose no-argument constructor only allocates
const PURE_CONSTRUCTORS: &[&str] = &[
    "java.lang.Object",
    "java.lang.String",
    "java.lang.StringBuilder",
    "java.util.ArrayDeque",
    "java.util.ArrayList",
    "java.util.HashMap",
    "java.util.HashSet",
    "java.util.LinkedHashMap",
    "java.util.LinkedHashSet",
    "java.util.LinkedList",
    "java.util.TreeMap",
    "java.util.TreeSet",
    crate::mockito::MOCK_UTIL,
];

/// Expressions whose evaluation can be skipped
///
/// Constructor calls qualify only for resolved types listed in
/// `PURE_CONSTRUCTORS`; anything else may run arbitrary code.
pub fn is_side_effect_free(expr: &Node) -> bool {
    match expr.kind() {
        kind if kind.is_literal() => true,
        SyntaxKind::Ident | SyntaxKind::ThisKw => true,
        SyntaxKind::Parens => expr.children().get(1).is_some_and(is_side_effect_free),
        SyntaxKind::FieldAccess => FieldAccess::cast(expr.clone())
            .and_then(|access| access.target().map(is_side_effect_free))
            .unwrap_or(false),
        SyntaxKind::NewClass => {
            let pure_type = expr
                .ty()
                .and_then(JavaType::as_class)
                .is_some_and(|sig| PURE_CONSTRUCTORS.contains(&sig.qualified_name()));
            pure_type
                && NewClass::cast(expr.clone()).is_some_and(|new| {
                    new.body().is_none() && new.args().is_some_and(|a| a.is_empty())
                })
        }
        _ => false,
    }
}

/// Some identifier other than the declaring one spells `name`
fn is_mentioned(scope: &Node, name: Option<&str>, declaring: NodeId) -> bool {
    scope
        .descendants()
        .any(|n| n.kind() == SyntaxKind::Ident && n.text() == name && n.id() != declaring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::Engine;

    fn run(source: &str) -> String {
        let tree = recast_java::parse(source).unwrap().tree;
        let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(RemoveUnusedLocalVariables)];
        Engine::default().run(&recipes, &tree).print()
    }

    #[test]
    fn test_unused_declaration_is_removed() {
        assert_eq!(
            run("class A {\n    void m() {\n        int unused = 1;\n        go();\n    }\n}\n"),
            "class A {\n    void m() {\n        go();\n    }\n}\n"
        );
    }

    #[test]
    fn test_read_variable_is_kept() {
        let source = "class A {\n    void m() {\n        int used = 1;\n        go(used);\n    }\n}\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_initializer_with_side_effects_is_kept() {
        let source = "class A {\n    void m() {\n        int n = next();\n        Object o = new Thread(task);\n    }\n}\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_mention_inside_lambda_counts() {
        let source = "class A {\n    void m() {\n        String s = \"x\";\n        run(() -> use(s));\n    }\n}\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_multiple_declarators_need_all_unused() {
        let source = "class A {\n    void m() {\n        int a = 1, b = 2;\n        go(b);\n    }\n}\n";
        assert_eq!(run(source), source);
        assert_eq!(
            run("class A {\n    void m() {\n        int a = 1, b;\n    }\n}\n"),
            "class A {\n    void m() {\n    }\n}\n"
        );
    }

    #[test]
    fn test_unknown_constructor_is_kept() {
        let source = "class A {\n    void m() {\n        Registry r = new Registry();\n        go();\n    }\n}\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_pure_constructor_is_dropped() {
        assert_eq!(
            run("import java.util.ArrayList;\nclass A {\n    void m() {\n        ArrayList l = new ArrayList();\n        go();\n    }\n}\n"),
            "class A {\n    void m() {\n        go();\n    }\n}\n"
        );
    }

    #[test]
    fn test_fields_are_not_touched() {
        let source = "class A {\n    int unused = 1;\n}\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_side_effect_free_shapes() {
        for (source, expected) in [
            ("1", true),
            ("(x)", true),
            ("this.x", true),
            ("new Object()", true),
            ("new B()", false),
            ("new C(1)", false),
            ("f()", false),
            ("a + b", false),
        ] {
            let tree = recast_java::parse(&format!("class A {{ Object o = {source}; }}"))
                .unwrap()
                .tree;
            let declarator = tree
                .descendants()
                .find(|n| n.kind() == SyntaxKind::VarDeclarator)
                .unwrap();
            let initializer = declarator.children().last().unwrap().clone();
            assert_eq!(is_side_effect_free(&initializer), expected, "{source}");
        }
    }
}
