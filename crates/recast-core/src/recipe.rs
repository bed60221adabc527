//! Named transformation units
//!
//! A recipe pairs a cheap whole-tree precondition with a visitor. Recipes
//! hold only immutable configuration (typically their [`MatchPattern`]s),
//! so one instance can serve many files on many threads; each traversal
//! gets a fresh visitor from [`Recipe::visitor`].

use crate::matcher::MatchPattern;
use crate::tree::Node;
use crate::visitor::{Visit, VisitContext, Visitor};

pub trait Recipe: Send + Sync {
    /// Stable identifier, e.g. `mockito-mock-utils-to-static`
    fn name(&self) -> &str;

    fn display_name(&self) -> &str {
        self.name()
    }

    fn description(&self) -> &str {
        ""
    }

    /// Skip the traversal entirely when this returns `false`
    fn precondition(&self, _tree: &Node) -> bool {
        true
    }

    /// Visitor for one traversal
    fn visitor(&self) -> Box<dyn Visitor + '_>;
}

/// Recipe made from a name and a node closure, handy in tests
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnRecipe<F>
where
    F: Fn(&Node, &mut VisitContext<'_>) -> Visit + Send + Sync,
{
    FnRecipe {
        name: name.into(),
        f,
    }
}

pub struct FnRecipe<F> {
    name: String,
    f: F,
}

impl<F> Recipe for FnRecipe<F>
where
    F: Fn(&Node, &mut VisitContext<'_>) -> Visit + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(FnVisitor(&self.f))
    }
}

struct FnVisitor<'f, F>(&'f F);

impl<F> Visitor for FnVisitor<'_, F>
where
    F: Fn(&Node, &mut VisitContext<'_>) -> Visit,
{
    fn visit(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Visit {
        (self.0)(node, cx)
    }
}

/// Whole-tree checks for [`Recipe::precondition`]
pub mod preconditions {
    use super::*;
    use crate::tree::{JavaType, SyntaxKind};

    /// Some node is typed as (or calls a method of) the given type
    pub fn uses_type(tree: &Node, qualified_name: &str) -> bool {
        tree.descendants().any(|node| match node.ty() {
            Some(JavaType::Class(sig)) => sig.qualified_name() == qualified_name,
            Some(JavaType::Method(method)) => {
                method.declaring_type.qualified_name() == qualified_name
            }
            Some(JavaType::Variable(variable)) => {
                variable
                    .ty
                    .as_deref()
                    .and_then(JavaType::as_class)
                    .is_some_and(|sig| sig.qualified_name() == qualified_name)
            }
            _ => false,
        })
    }

    /// Some call in the tree matches the pattern
    pub fn uses_method(tree: &Node, pattern: &MatchPattern) -> bool {
        tree.descendants()
            .filter(|n| matches!(n.kind(), SyntaxKind::MethodInvocation | SyntaxKind::NewClass))
            .any(|n| pattern.matches(&n))
    }
}

#[cfg(test)]
mod tests {
    use super::preconditions::*;
    use super::*;
    use crate::tree::{JavaType, MethodType, SyntaxKind, TypeSignature, make};

    #[test]
    fn test_from_fn_recipe() {
        let recipe = from_fn("noop", |_node, _cx| Visit::Keep);
        assert_eq!(recipe.name(), "noop");
        assert_eq!(recipe.display_name(), "noop");
        assert!(recipe.precondition(&make::identifier("x")));
    }

    #[test]
    fn test_preconditions() {
        let call = make::method_invocation(Some(make::identifier("MockUtil")), "isMock", vec![])
            .with_type(JavaType::Method(MethodType::new(
                TypeSignature::new("org.mockito.internal.util.MockUtil"),
                "isMock",
                true,
            )));
        let stmt = Node::new(SyntaxKind::ExprStmt, vec![call, make::token(SyntaxKind::Semicolon)]);

        assert!(uses_type(&stmt, "org.mockito.internal.util.MockUtil"));
        assert!(!uses_type(&stmt, "java.util.List"));

        let pattern = MatchPattern::parse("static org.mockito.internal.util.MockUtil isMock()").unwrap();
        assert!(uses_method(&stmt, &pattern));
        let other = MatchPattern::parse("org.mockito.internal.util.MockUtil isMock()").unwrap();
        assert!(!uses_method(&stmt, &other));
    }
}
