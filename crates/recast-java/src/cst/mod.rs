//! Concrete Syntax Tree (CST) for Java sources
//!
//! A lossless Rowan tree: every whitespace run and comment is kept as a
//! trivia token, so `parse_java(source).text() == source` for any input.
//! The CST is the parser's output only; rewriting works on the core tree
//! produced by [`crate::lower`].

mod language;
mod lexer;
mod parser;

pub use language::{JavaLanguage, JavaSyntaxElement, JavaSyntaxNode, JavaSyntaxToken};
pub use lexer::{CstLexResult, CstSpan, CstToken, LexerError, lex_with_trivia};
pub use parser::{ParseError, parse_java};
