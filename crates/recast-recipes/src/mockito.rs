//! Mockito `MockUtil` migration
//!
//! The methods of `org.mockito.internal.util.MockUtil` are static since
//! Mockito 2. Calls made through an instance are rewritten to the static
//! form, and package-private `MockUtil` fields that only served as receivers
//! are dropped once nothing references them any more.

use crate::cleanup::is_side_effect_free;
use recast_core::recipe::preconditions;
use recast_core::tree::ast::{AstNode, MethodInvocation, VarDeclarator, has_modifier};
use recast_core::{
    Formatting, JavaType, MatchPattern, NamePattern, Node, Recipe, SyntaxKind, TypePattern,
    TypeSignature, Visit, VisitContext, Visitor,
};
use tracing::trace;

pub const MOCK_UTIL: &str = "org.mockito.internal.util.MockUtil";

/// Single-argument static methods of `MockUtil`
const STATIC_METHODS: &[&str] = &[
    "isMock",
    "isSpy",
    "getMockName",
    "getMockHandler",
    "getMockSettings",
];

pub struct MockUtilsToStatic {
    patterns: Vec<MatchPattern>,
}

impl MockUtilsToStatic {
    pub const NAME: &'static str = "mockito-mock-utils-to-static";

    pub fn new() -> Self {
        let patterns = STATIC_METHODS
            .iter()
            .map(|name| {
                MatchPattern::new(
                    TypePattern::exact(MOCK_UTIL),
                    NamePattern::Exact((*name).to_string()),
                    vec![TypePattern::Any],
                )
            })
            .collect();
        Self { patterns }
    }
}

impl Default for MockUtilsToStatic {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for MockUtilsToStatic {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Use static form of Mockito MockUtil"
    }

    fn description(&self) -> &str {
        "Rewrites `new MockUtil().isMock(x)` and calls through MockUtil variables to `MockUtil.isMock(x)`."
    }

    fn precondition(&self, tree: &Node) -> bool {
        preconditions::uses_type(tree, MOCK_UTIL)
    }

    fn visitor(&self) -> Box<dyn Visitor + '_> {
        Box::new(MockUtilVisitor {
            patterns: &self.patterns,
        })
    }
}

struct MockUtilVisitor<'r> {
    patterns: &'r [MatchPattern],
}

impl Visitor for MockUtilVisitor<'_> {
    fn visit_method_invocation(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Visit {
        if !self.patterns.iter().any(|pattern| cx.matches(pattern, node)) {
            return Visit::Keep;
        }
        let Some(call) = MethodInvocation::cast(node.clone()) else {
            return Visit::Keep;
        };
        let (Some(select), Some(method)) = (call.select(), call.method_type()) else {
            return Visit::Keep;
        };
        if !is_side_effect_free(select) {
            cx.mismatch(node, "MockUtil receiver may have side effects");
            return Visit::Keep;
        }

        let owner = TypeSignature::new(MOCK_UTIL);
        let simple_name = owner.simple_name().to_string();
        let type_name = Node::token(SyntaxKind::Ident, simple_name)
            .with_formatting(Formatting::leading(select.leading()))
            .with_type(JavaType::Class(owner));
        let method = method.with_static_call(true);
        Visit::Replace(call.with_select(type_name).with_method_type(method).into_node())
    }

    fn visit_other(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Visit {
        if node.kind() != SyntaxKind::FieldDecl {
            return Visit::Keep;
        }
        let Some(unit) = cx.ancestors().first() else {
            return Visit::Keep;
        };
        if is_unused_mock_util_field(node, unit) {
            trace!("removing unused MockUtil field");
            Visit::Remove
        } else {
            Visit::Keep
        }
    }
}

/// `MockUtil util = new MockUtil();` with no other mention of `util`
fn is_unused_mock_util_field(field: &Node, unit: &Node) -> bool {
    if has_modifier(field, SyntaxKind::PublicKw) || has_modifier(field, SyntaxKind::ProtectedKw) {
        return false;
    }
    let declarators: Vec<VarDeclarator> = field
        .children()
        .iter()
        .cloned()
        .filter_map(VarDeclarator::cast)
        .collect();
    let [declarator] = declarators.as_slice() else {
        return false;
    };
    let (Some(name_node), Some(initializer)) = (declarator.name_node(), declarator.initializer())
    else {
        return false;
    };
    let creates_mock_util = initializer
        .ty()
        .and_then(JavaType::as_class)
        .is_some_and(|sig| sig.qualified_name() == MOCK_UTIL)
        && is_side_effect_free(initializer);
    if initializer.kind() != SyntaxKind::NewClass || !creates_mock_util {
        return false;
    }

    let name = name_node.text();
    !unit
        .descendants()
        .any(|n| n.kind() == SyntaxKind::Ident && n.text() == name && n.id() != name_node.id())
}
