//! Bottom-up tree rewriting
//!
//! A [`Visitor`] is called once for every node of one traversal, children
//! before their parent and siblings left to right. It answers with a
//! [`Visit`]: keep the node, replace it, or remove it. A parent therefore
//! always sees its already rewritten children.
//!
//! Dispatch from [`Visitor::visit`] is an exhaustive match over
//! [`SyntaxKind`], so a new kind cannot be added without deciding which hook
//! handles it.

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::matcher::{MatchOutcome, MatchPattern};
use crate::tree::{Node, SyntaxKind};
use tracing::trace;

/// What a visitor wants done with the node it was shown
#[derive(Debug, Clone)]
pub enum Visit {
    Keep,
    /// Put this node in place of the visited one. A replacement without
    /// formatting takes over the formatting of the node it replaces.
    Replace(Node),
    /// Drop the node. Only honoured where the parent can lose the child
    /// (statements in a block, members, imports, modifiers).
    Remove,
}

/// Traversal state handed to every hook
pub struct VisitContext<'a> {
    ancestors: &'a [Node],
    recipe: &'a str,
    config: &'a EngineConfig,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> VisitContext<'a> {
    pub fn new(
        ancestors: &'a [Node],
        recipe: &'a str,
        config: &'a EngineConfig,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            ancestors,
            recipe,
            config,
            diagnostics,
        }
    }

    /// Ancestors from the root down to the parent, as they were before this
    /// traversal rewrote any of their children
    pub fn ancestors(&self) -> &[Node] {
        self.ancestors
    }

    pub fn parent(&self) -> Option<&Node> {
        self.ancestors.last()
    }

    /// Nearest ancestor of the given kind
    pub fn enclosing(&self, kind: SyntaxKind) -> Option<&Node> {
        self.ancestors.iter().rev().find(|n| n.kind() == kind)
    }

    pub fn recipe(&self) -> &str {
        self.recipe
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Record a diagnostic, attributed to the running recipe
    pub fn report(&mut self, diagnostic: Diagnostic) {
        let diagnostic = match diagnostic.recipe {
            Some(_) => diagnostic,
            None => diagnostic.with_recipe(self.recipe),
        };
        self.diagnostics.push(diagnostic);
    }

    /// A shape the visitor cannot rewrite; the node is left alone
    pub fn mismatch(&mut self, node: &Node, message: impl Into<String>) {
        self.report(Diagnostic::new(DiagnosticKind::StructuralMismatch, message).with_node(node.id()));
    }

    /// [`MatchPattern::matches`], reporting unresolved candidates when
    /// `reportUnresolved` is enabled
    pub fn matches(&mut self, pattern: &MatchPattern, node: &Node) -> bool {
        match pattern.check(node) {
            MatchOutcome::Matched => true,
            MatchOutcome::NoMatch => false,
            MatchOutcome::Unresolved => {
                if self.config.report_unresolved {
                    self.report(
                        Diagnostic::new(
                            DiagnosticKind::UnresolvedReference,
                            format!("skipped call site without type information for `{pattern}`"),
                        )
                        .with_node(node.id()),
                    );
                }
                false
            }
        }
    }
}

/// Per-kind rewrite hooks; every hook defaults to [`Visit::Keep`]
pub trait Visitor {
    fn visit(&mut self, node: &Node, cx: &mut VisitContext<'_>) -> Visit {
        use SyntaxKind::*;
        match node.kind() {
            CompilationUnit => self.visit_compilation_unit(node, cx),
            Import => self.visit_import(node, cx),
            ClassDecl => self.visit_class_decl(node, cx),
            MethodDecl => self.visit_method_decl(node, cx),
            Block => self.visit_block(node, cx),
            VariableDecl => self.visit_variable_decl(node, cx),
            ExprStmt => self.visit_expr_stmt(node, cx),
            MethodInvocation => self.visit_method_invocation(node, cx),
            NewClass => self.visit_new_class(node, cx),
            FieldAccess => self.visit_field_access(node, cx),
            Ident => self.visit_identifier(node, cx),
            IntLiteral | FloatLiteral | StringLiteral | CharLiteral | TrueKw | FalseKw
            | NullKw => self.visit_literal(node, cx),
            // Unparsed source is opaque
            Error | ErrorToken => Visit::Keep,
            Whitespace | LineComment | BlockComment | PackageKw | ImportKw | StaticKw
            | ClassKw | InterfaceKw | EnumKw | ExtendsKw | ImplementsKw | PublicKw
            | ProtectedKw | PrivateKw | AbstractKw | FinalKw | NativeKw | SynchronizedKw
            | TransientKw | VolatileKw | StrictfpKw | DefaultKw | NewKw | ReturnKw | IfKw
            | ElseKw | WhileKw | ThrowKw | ThrowsKw | ThisKw | SuperKw | VoidKw
            | InstanceofKw | OtherKw | LParen | RParen | LBrace | RBrace | LBracket
            | RBracket | Semicolon | Comma | Dot | Ellipsis | At | Question | Colon
            | ColonColon | Arrow | Eq | EqEq | Bang | BangEq | Lt | Gt | LtEq | GtEq
            | AmpAmp | PipePipe | Amp | Pipe | Caret | Tilde | Plus | Minus | Star | Slash
            | Percent | PlusPlus | MinusMinus | OpAssign | PackageDecl | QualifiedName
            | ExtendsClause | ImplementsClause | TypeParams | ClassBody | EnumConstants
            | Modifiers | Annotation | FieldDecl | ParamList | Param | ThrowsClause
            | VarDeclarator | ReturnStmt | IfStmt | WhileStmt | ThrowStmt | EmptyStmt | OtherStmt
            | ArrayAccess | ArgList | Parens | Cast | Unary | Binary | Assignment
            | Conditional | TypeRef | TypeArgs => self.visit_other(node, cx),
        }
    }

    fn visit_compilation_unit(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_import(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_class_decl(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_method_decl(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_block(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_variable_decl(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_expr_stmt(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_method_invocation(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_new_class(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_field_access(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_identifier(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    fn visit_literal(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }

    /// Every kind without a dedicated hook
    fn visit_other(&mut self, _node: &Node, _cx: &mut VisitContext<'_>) -> Visit {
        Visit::Keep
    }
}

/// Run one traversal of `visitor` over `tree`
///
/// Unchanged subtrees of the result are shared with `tree`. The root itself
/// cannot be removed.
pub fn walk(
    visitor: &mut dyn Visitor,
    tree: &Node,
    recipe: &str,
    config: &EngineConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Node {
    let mut walker = Walker {
        visitor,
        ancestors: Vec::new(),
        recipe,
        config,
        diagnostics,
    };
    walker.walk_node(tree).unwrap_or_else(|| tree.clone())
}

struct Walker<'v, 'a> {
    visitor: &'v mut dyn Visitor,
    ancestors: Vec<Node>,
    recipe: &'a str,
    config: &'a EngineConfig,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Walker<'_, '_> {
    /// `None` when the node was removed
    fn walk_node(&mut self, node: &Node) -> Option<Node> {
        if node.kind() == SyntaxKind::Error {
            return Some(node.clone());
        }

        let mut current = node.clone();
        if !node.is_token() {
            self.ancestors.push(node.clone());
            let mut children = Vec::with_capacity(node.children().len());
            let mut changed = false;
            for child in node.children() {
                match self.walk_node(child) {
                    Some(new_child) => {
                        changed |= !new_child.ptr_eq(child);
                        children.push(new_child);
                    }
                    None => changed = true,
                }
            }
            self.ancestors.pop();
            if changed {
                current = node.with_children(children);
            }
        }

        let mut cx = VisitContext::new(&self.ancestors, self.recipe, self.config, self.diagnostics);
        match self.visitor.visit(&current, &mut cx) {
            Visit::Keep => Some(current),
            Visit::Replace(replacement) => {
                trace!(recipe = self.recipe, kind = ?current.kind(), "replaced node {}", current.id());
                if replacement.formatting().is_none() {
                    Some(replacement.with_formatting_of(&current))
                } else {
                    Some(replacement)
                }
            }
            Visit::Remove => match self.ancestors.last() {
                Some(parent) if current.kind().removable_from(parent.kind()) => {
                    trace!(recipe = self.recipe, kind = ?current.kind(), "removed node {}", current.id());
                    None
                }
                parent => {
                    let message = match parent {
                        Some(parent) => format!(
                            "{:?} cannot be removed from {:?}",
                            current.kind(),
                            parent.kind()
                        ),
                        None => "the root node cannot be removed".to_string(),
                    };
                    self.diagnostics.push(
                        Diagnostic::new(DiagnosticKind::StructuralMismatch, message)
                            .with_recipe(self.recipe)
                            .with_node(current.id()),
                    );
                    Some(current)
                }
            },
        }
    }
}
