//! Tree to text
//!
//! Every node prints as its leading formatting, its token text (or its
//! children in order), then its trailing formatting. A tree straight from
//! the parser therefore prints back to exactly the parsed text.
//!
//! Synthesized nodes have no formatting. They get the smallest separator
//! that keeps the output well formed: a line break in front of statements,
//! members and imports, a single space where two words would otherwise
//! fuse, nothing otherwise.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::tree::{Node, SyntaxKind};
use serde::{Deserialize, Serialize};

/// Line terminator for synthesized line breaks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Printer settings; only consulted for synthesized nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrinterOptions {
    pub line_ending: LineEnding,
}

/// Printed text plus the formatting gaps that were filled with defaults
#[derive(Debug, Clone, Default)]
pub struct PrintOutput {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Print with default options, discarding diagnostics
pub fn print(tree: &Node) -> String {
    print_with_options(tree, &PrinterOptions::default()).text
}

pub fn print_with_options(tree: &Node, options: &PrinterOptions) -> PrintOutput {
    let mut printer = Printer {
        options,
        out: String::new(),
        diagnostics: Vec::new(),
    };
    printer.emit(tree, false);
    PrintOutput {
        text: printer.out,
        diagnostics: printer.diagnostics,
    }
}

struct Printer<'a> {
    options: &'a PrinterOptions,
    out: String,
    diagnostics: Vec<Diagnostic>,
}

impl Printer<'_> {
    fn emit(&mut self, node: &Node, inside_gap: bool) {
        let gap = match node.formatting() {
            Some(formatting) => {
                self.out.push_str(&formatting.leading);
                false
            }
            None => {
                let separator = self.default_separator(node);
                self.out.push_str(separator);
                if !inside_gap {
                    self.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::PrinterFormattingGap,
                            format!("synthesized {:?} has no formatting donor", node.kind()),
                        )
                        .with_node(node.id()),
                    );
                }
                true
            }
        };

        match node.text() {
            Some(text) => self.out.push_str(text),
            None => {
                for child in node.children() {
                    self.emit(child, inside_gap || gap);
                }
            }
        }

        if let Some(formatting) = node.formatting() {
            self.out.push_str(&formatting.trailing);
        }
    }

    fn default_separator(&self, node: &Node) -> &'static str {
        let Some(prev) = self.out.chars().next_back() else {
            return "";
        };
        if starts_on_own_line(node.kind()) {
            return self.options.line_ending.as_str();
        }
        match first_char(node) {
            Some(next) if would_fuse(prev, next) => " ",
            _ => "",
        }
    }
}

fn starts_on_own_line(kind: SyntaxKind) -> bool {
    kind == SyntaxKind::Import
        || kind == SyntaxKind::PackageDecl
        || kind == SyntaxKind::FieldDecl
        || kind == SyntaxKind::MethodDecl
        || (kind.is_statement() && kind != SyntaxKind::Block)
}

fn first_char(node: &Node) -> Option<char> {
    node.descendants()
        .filter_map(|n| n.text().and_then(|t| t.chars().next()))
        .next()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Adjacent characters that would lex differently without a space
fn would_fuse(prev: char, next: char) -> bool {
    (is_word_char(prev) && is_word_char(next))
        || matches!(
            (prev, next),
            ('+', '+') | ('-', '-') | ('/', '/') | ('/', '*') | ('<', '<') | ('>', '>')
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Formatting, make};

    fn tok(kind: SyntaxKind, text: &str, leading: &str) -> Node {
        Node::token(kind, text).with_formatting(Formatting::leading(leading))
    }

    #[test]
    fn test_parsed_tree_prints_verbatim() {
        let stmt = Node::new(
            SyntaxKind::ReturnStmt,
            vec![
                tok(SyntaxKind::ReturnKw, "return", ""),
                tok(SyntaxKind::Ident, "x", " /* c */ "),
                tok(SyntaxKind::Semicolon, ";", ""),
            ],
        )
        .with_formatting(Formatting::new("\n    ", "  // tail"));
        let output = print_with_options(&stmt, &PrinterOptions::default());
        assert_eq!(output.text, "\n    return /* c */ x;  // tail");
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_synthesized_word_gets_space() {
        let stmt = Node::new(
            SyntaxKind::ReturnStmt,
            vec![
                tok(SyntaxKind::ReturnKw, "return", ""),
                make::identifier("x"),
                tok(SyntaxKind::Semicolon, ";", ""),
            ],
        )
        .with_formatting(Formatting::default());
        let output = print_with_options(&stmt, &PrinterOptions::default());
        assert_eq!(output.text, "return x;");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].kind, DiagnosticKind::PrinterFormattingGap);
    }

    #[test]
    fn test_synthesized_statement_gets_line_break() {
        let block = Node::new(
            SyntaxKind::Block,
            vec![
                tok(SyntaxKind::LBrace, "{", ""),
                Node::new(SyntaxKind::EmptyStmt, vec![make::token(SyntaxKind::Semicolon)]),
                tok(SyntaxKind::RBrace, "}", "\n"),
            ],
        )
        .with_formatting(Formatting::default());
        let options = PrinterOptions {
            line_ending: LineEnding::CrLf,
        };
        assert_eq!(print_with_options(&block, &options).text, "{\r\n;\n}");
    }

    #[test]
    fn test_only_outermost_gap_reported() {
        let call = make::method_invocation(Some(make::identifier("a")), "b", vec![]);
        let output = print_with_options(&call, &PrinterOptions::default());
        assert_eq!(output.text, "a.b()");
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[test]
    fn test_would_fuse() {
        assert!(would_fuse('a', 'b'));
        assert!(would_fuse('+', '+'));
        assert!(!would_fuse('.', 'b'));
        assert!(!would_fuse('(', 'x'));
    }
}
