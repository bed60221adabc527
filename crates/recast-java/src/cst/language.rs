//! Rowan language implementation for Java
//!
//! Connects the shared [`SyntaxKind`] enum to Rowan's generic tree types.
//! Raw values are the enum discriminants.

use recast_core::SyntaxKind;
use rowan::Language;

/// Zero-sized marker implementing `rowan::Language`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JavaLanguage;

impl Language for JavaLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // only values produced by `kind_to_raw` ever reach the tree
        SyntaxKind::from_raw(raw.0).unwrap_or(SyntaxKind::Error)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

pub type JavaSyntaxNode = rowan::SyntaxNode<JavaLanguage>;
pub type JavaSyntaxToken = rowan::SyntaxToken<JavaLanguage>;
pub type JavaSyntaxElement = rowan::SyntaxElement<JavaLanguage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        let kinds = [
            SyntaxKind::Whitespace,
            SyntaxKind::ImportKw,
            SyntaxKind::Ident,
            SyntaxKind::Semicolon,
            SyntaxKind::CompilationUnit,
            SyntaxKind::MethodInvocation,
            SyntaxKind::Error,
        ];

        for &kind in &kinds {
            let raw = JavaLanguage::kind_to_raw(kind);
            let back = JavaLanguage::kind_from_raw(raw);
            assert_eq!(kind, back, "Roundtrip failed for {kind:?}");
        }
    }

    #[test]
    fn test_unknown_raw_is_error() {
        assert_eq!(
            JavaLanguage::kind_from_raw(rowan::SyntaxKind(u16::MAX)),
            SyntaxKind::Error
        );
    }
}
