//! Builders for synthesized nodes
//!
//! The returned root has no formatting, so it either inherits the formatting
//! of the node it replaces or gets a printer default. Inner nodes are given
//! the minimal spacing the construct needs.

use super::{Formatting, Node, SyntaxKind};

fn tight(node: Node) -> Node {
    match node.formatting() {
        Some(_) => node,
        None => node.with_formatting(Formatting::default()),
    }
}

fn spaced(node: Node) -> Node {
    node.with_formatting(Formatting::leading(" "))
}

/// Keyword or punctuation leaf with its fixed text
///
/// Kinds without fixed text produce an empty leaf.
pub fn token(kind: SyntaxKind) -> Node {
    tight(Node::token(kind, kind.static_text().unwrap_or_default()))
}

pub fn identifier(name: &str) -> Node {
    Node::token(SyntaxKind::Ident, name)
}

/// `a.b.C` as a flat `QualifiedName`
pub fn qualified_name(name: &str) -> Node {
    let mut children = Vec::new();
    for (index, segment) in name.split('.').enumerate() {
        if index > 0 {
            children.push(token(SyntaxKind::Dot));
        }
        children.push(tight(identifier(segment)));
    }
    Node::new(SyntaxKind::QualifiedName, children)
}

/// `import [static] name[.*];`
pub fn import(name: &str, is_static: bool, on_demand: bool) -> Node {
    let mut children = vec![token(SyntaxKind::ImportKw)];
    if is_static {
        children.push(spaced(token(SyntaxKind::StaticKw)));
    }
    children.push(spaced(qualified_name(name)));
    if on_demand {
        children.push(token(SyntaxKind::Dot));
        children.push(token(SyntaxKind::Star));
    }
    children.push(token(SyntaxKind::Semicolon));
    Node::new(SyntaxKind::Import, children)
}

/// `(a, b, c)`
pub fn arg_list(args: Vec<Node>) -> Node {
    let mut children = vec![token(SyntaxKind::LParen)];
    for (index, arg) in args.into_iter().enumerate() {
        if index > 0 {
            children.push(token(SyntaxKind::Comma));
            children.push(match arg.formatting() {
                Some(_) => arg,
                None => spaced(arg),
            });
        } else {
            children.push(tight(arg));
        }
    }
    children.push(token(SyntaxKind::RParen));
    tight(Node::new(SyntaxKind::ArgList, children))
}

/// `select.name(args)` or `name(args)`
pub fn method_invocation(select: Option<Node>, name: &str, args: Vec<Node>) -> Node {
    let mut children = Vec::new();
    if let Some(select) = select {
        children.push(select);
        children.push(token(SyntaxKind::Dot));
    }
    children.push(tight(identifier(name)));
    children.push(arg_list(args));
    Node::new(SyntaxKind::MethodInvocation, children)
}

/// Type reference to a simple or dotted name
pub fn type_ref(name: &str) -> Node {
    let mut children = Vec::new();
    for (index, segment) in name.split('.').enumerate() {
        if index > 0 {
            children.push(token(SyntaxKind::Dot));
        }
        children.push(tight(identifier(segment)));
    }
    Node::new(SyntaxKind::TypeRef, children)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_text() {
        assert_eq!(
            import("org.junit.jupiter.api.Assertions.assertNull", true, false).to_string(),
            "import static org.junit.jupiter.api.Assertions.assertNull;"
        );
        assert_eq!(import("java.util", false, true).to_string(), "import java.util.*;");
    }

    #[test]
    fn test_root_is_synthesized() {
        let call = method_invocation(None, "isMock", vec![identifier("x")]);
        assert!(call.formatting().is_none());
        assert!(call.children()[0].formatting().is_some());
        assert_eq!(call.to_string(), "isMock(x)");
    }

    #[test]
    fn test_arg_list_spacing() {
        let args = arg_list(vec![identifier("a"), identifier("b")]);
        assert_eq!(args.to_string(), "(a, b)");
    }
}
