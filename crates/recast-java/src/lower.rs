//! Lowering of the Rowan CST into the rewrite tree
//!
//! Trivia tokens disappear as nodes: whitespace and comments in front of a
//! node become that node's leading formatting, trivia at the end of the file
//! becomes the trailing formatting of the compilation unit. Nodes without
//! any token (left behind by error recovery) are dropped.

use crate::cst::{JavaSyntaxElement, JavaSyntaxNode};
use recast_core::{Formatting, Node};
use rowan::NodeOrToken;

/// Convert a parsed CST into an untyped rewrite tree
pub fn lower(root: &JavaSyntaxNode) -> Node {
    let mut pending = String::new();
    let children = lower_children(root, &mut pending);
    Node::new(root.kind(), children).with_formatting(Formatting::new("", pending))
}

fn lower_children(node: &JavaSyntaxNode, pending: &mut String) -> Vec<Node> {
    let mut children = Vec::new();
    for element in node.children_with_tokens() {
        if let Some(child) = lower_element(element, pending) {
            children.push(child);
        }
    }
    children
}

fn lower_element(element: JavaSyntaxElement, pending: &mut String) -> Option<Node> {
    match element {
        NodeOrToken::Token(token) => {
            if token.kind().is_trivia() {
                pending.push_str(token.text());
                return None;
            }
            let leading = std::mem::take(pending);
            Some(Node::token(token.kind(), token.text()).with_formatting(Formatting::leading(leading)))
        }
        NodeOrToken::Node(node) => {
            let leading = std::mem::take(pending);
            let children = lower_children(&node, pending);
            if children.is_empty() {
                // nothing significant inside: give the trivia back
                let trailing = std::mem::replace(pending, leading);
                pending.push_str(&trailing);
                return None;
            }
            Some(Node::new(node.kind(), children).with_formatting(Formatting::leading(leading)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse_java;
    use recast_core::SyntaxKind;

    fn lower_source(source: &str) -> Node {
        let (cst, _) = parse_java(source);
        lower(&cst)
    }

    #[test]
    fn test_lowering_round_trips() {
        for source in [
            "",
            "// only a comment\n",
            "class A {}\n",
            "/* header */\npackage p;\n\nimport a.B; // trailing\n\nclass A { void m() { b(1, 2); } }\n\n",
            "class A { void m() { foo(; } }",
        ] {
            assert_eq!(lower_source(source).to_string(), source);
        }
    }

    #[test]
    fn test_trivia_attaches_as_leading_formatting() {
        let tree = lower_source("class A {\n    // note\n    int x;\n}\n");
        let field = tree
            .descendants()
            .find(|n| n.kind() == SyntaxKind::FieldDecl)
            .unwrap();
        assert_eq!(field.leading(), "\n    // note\n    ");
        assert_eq!(field.first_token().unwrap().leading(), "");
        assert_eq!(tree.trailing(), "\n");
    }

    #[test]
    fn test_no_trivia_nodes_remain() {
        let tree = lower_source("class A { /* c */ int x = 1; }\n");
        assert!(tree.descendants().all(|n| !n.kind().is_trivia()));
    }

    #[test]
    fn test_debug_dump_of_small_unit() {
        let tree = lower_source("import a.B;\n");
        insta::assert_snapshot!(tree.debug_dump(), @r#"
        CompilationUnit trailing="\n"
          Import
            ImportKw "import"
            QualifiedName leading=" "
              Ident "a"
              Dot "."
              Ident "B"
            Semicolon ";"
        "#);
    }
}
