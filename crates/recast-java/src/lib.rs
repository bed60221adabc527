//! Recast Java
//!
//! Parser front-end producing the rewrite trees `recast-core` works on:
//!
//! 1. [`cst::lex_with_trivia`] splits the source into tokens, whitespace and
//!    comments included;
//! 2. [`cst::parse_java`] builds a lossless Rowan CST;
//! 3. [`lower::lower`] converts it into a [`recast_core::Node`] tree with
//!    the trivia attached as formatting;
//! 4. [`attribute::attribute`] annotates the tree with semantic types.
//!
//! [`JavaParser`] runs all four steps and verifies that the resulting tree
//! prints back to the source byte for byte.
//!
//! ## Example
//!
//! ```rust,ignore
//! use recast_java::JavaParser;
//!
//! let source = "class A { void m() { foo(); } }\n";
//! let file = JavaParser::new().parse(source)?;
//! assert_eq!(recast_core::print(&file.tree), source);
//! ```

pub mod attribute;
pub mod cst;
pub mod lower;

pub use attribute::attribute;
pub use cst::{ParseError, parse_java};
pub use lower::lower;

use recast_core::{ClasspathConfig, Node, RecastError, Result};
use tracing::debug;

/// A parsed and attributed compilation unit
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub tree: Node,
    /// Syntax errors; the affected regions are kept as opaque nodes
    pub errors: Vec<ParseError>,
}

impl SourceFile {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Source text to typed tree
#[derive(Debug, Clone, Default)]
pub struct JavaParser {
    classpath: ClasspathConfig,
}

impl JavaParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a catalog of known types and static members during attribution
    pub fn with_classpath(classpath: ClasspathConfig) -> Self {
        Self { classpath }
    }

    pub fn classpath(&self) -> &ClasspathConfig {
        &self.classpath
    }

    /// Parse, lower and attribute `source`
    ///
    /// Syntax errors do not fail the parse. The only error is a tree that
    /// does not print back to `source`, in which case no rewrite of this file
    /// can be trusted.
    pub fn parse(&self, source: &str) -> Result<SourceFile> {
        let (cst, errors) = parse_java(source);
        let tree = attribute(&lower(&cst), &self.classpath);

        let printed = recast_core::print(&tree);
        if printed != source {
            let offset = printed
                .bytes()
                .zip(source.bytes())
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| printed.len().min(source.len()));
            return Err(RecastError::round_trip(format!(
                "printed tree differs from the source at byte {offset}"
            )));
        }

        debug!("parsed {} bytes with {} syntax errors", source.len(), errors.len());
        Ok(SourceFile { tree, errors })
    }
}

/// Parse with an empty classpath
pub fn parse(source: &str) -> Result<SourceFile> {
    JavaParser::new().parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips() {
        let source = "package a;\n\nimport b.C;\n\nclass D extends C {\n    // body\n}\n";
        let file = parse(source).unwrap();
        assert!(!file.has_errors());
        assert_eq!(recast_core::print(&file.tree), source);
    }

    #[test]
    fn test_syntax_errors_are_reported_not_fatal() {
        let source = "class A { void m() { if (x { } }\n";
        let file = parse(source).unwrap();
        assert!(file.has_errors());
        assert_eq!(recast_core::print(&file.tree), source);
    }

    #[test]
    fn test_classpath_reaches_attribution() {
        let classpath = ClasspathConfig::default().with_type("java.util.List");
        let parser = JavaParser::with_classpath(classpath);
        let file = parser.parse("import java.util.*;\nclass A { List xs; }\n").unwrap();
        let typed = file
            .tree
            .descendants()
            .any(|n| n.text() == Some("List") && n.ty().is_some());
        assert!(typed);
        assert!(parser.classpath().contains_type("java.util.List"));
    }
}
