//! Syntax kinds shared by the lossless CST and the rewrite tree
//!
//! The enum is closed: adding a kind means touching [`SyntaxKind::ALL`],
//! the visitor dispatch and the printer, all of which match exhaustively.

macro_rules! syntax_kinds {
    ($($(#[$meta:meta])* $name:ident,)*) => {
        /// Every token and node kind of the supported Java subset
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum SyntaxKind {
            $($(#[$meta])* $name,)*
        }

        impl SyntaxKind {
            /// All kinds in discriminant order
            pub const ALL: &'static [SyntaxKind] = &[$(SyntaxKind::$name,)*];
        }
    };
}

syntax_kinds! {
    // Trivia
    Whitespace,
    LineComment,
    BlockComment,

    // Keywords
    PackageKw,
    ImportKw,
    StaticKw,
    ClassKw,
    InterfaceKw,
    EnumKw,
    ExtendsKw,
    ImplementsKw,
    PublicKw,
    ProtectedKw,
    PrivateKw,
    AbstractKw,
    FinalKw,
    NativeKw,
    SynchronizedKw,
    TransientKw,
    VolatileKw,
    StrictfpKw,
    DefaultKw,
    NewKw,
    ReturnKw,
    IfKw,
    ElseKw,
    WhileKw,
    ThrowKw,
    ThrowsKw,
    ThisKw,
    SuperKw,
    VoidKw,
    InstanceofKw,
    TrueKw,
    FalseKw,
    NullKw,
    /// Reserved words outside the modelled grammar (`for`, `try`, `switch`, ...)
    OtherKw,

    // Literals & identifiers
    Ident,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    At,
    Question,
    Colon,
    ColonColon,
    Arrow,
    Eq,
    EqEq,
    Bang,
    BangEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AmpAmp,
    PipePipe,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    /// Compound assignment operators (`+=`, `-=`, ...)
    OpAssign,
    ErrorToken,

    // Declarations
    CompilationUnit,
    PackageDecl,
    Import,
    QualifiedName,
    ClassDecl,
    ExtendsClause,
    ImplementsClause,
    TypeParams,
    ClassBody,
    EnumConstants,
    Modifiers,
    Annotation,
    FieldDecl,
    MethodDecl,
    ParamList,
    Param,
    ThrowsClause,

    // Statements
    Block,
    VariableDecl,
    VarDeclarator,
    ExprStmt,
    ReturnStmt,
    IfStmt,
    WhileStmt,
    ThrowStmt,
    EmptyStmt,
    /// Statement led by a keyword outside the modelled grammar (`for`,
    /// `try`, `do`, ...); its header is kept as an `Error` node, nested
    /// statements are parsed
    OtherStmt,

    // Expressions
    MethodInvocation,
    NewClass,
    FieldAccess,
    ArrayAccess,
    ArgList,
    Parens,
    Cast,
    Unary,
    Binary,
    Assignment,
    Conditional,

    // Types
    TypeRef,
    TypeArgs,

    /// Source the parser could not structure; printed verbatim, never rewritten
    Error,
}

impl SyntaxKind {
    /// Convert a raw discriminant back into a kind
    pub fn from_raw(raw: u16) -> Option<SyntaxKind> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Whitespace and comments
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace | SyntaxKind::LineComment | SyntaxKind::BlockComment
        )
    }

    /// Leaf kinds (carry text rather than children)
    pub fn is_token(self) -> bool {
        self < SyntaxKind::CompilationUnit
    }

    pub fn is_keyword(self) -> bool {
        (SyntaxKind::PackageKw..=SyntaxKind::OtherKw).contains(&self)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntLiteral
                | SyntaxKind::FloatLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::CharLiteral
                | SyntaxKind::TrueKw
                | SyntaxKind::FalseKw
                | SyntaxKind::NullKw
        )
    }

    pub fn is_modifier_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::PublicKw
                | SyntaxKind::ProtectedKw
                | SyntaxKind::PrivateKw
                | SyntaxKind::StaticKw
                | SyntaxKind::AbstractKw
                | SyntaxKind::FinalKw
                | SyntaxKind::NativeKw
                | SyntaxKind::SynchronizedKw
                | SyntaxKind::TransientKw
                | SyntaxKind::VolatileKw
                | SyntaxKind::StrictfpKw
                | SyntaxKind::DefaultKw
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::VariableDecl
                | SyntaxKind::ExprStmt
                | SyntaxKind::ReturnStmt
                | SyntaxKind::IfStmt
                | SyntaxKind::WhileStmt
                | SyntaxKind::ThrowStmt
                | SyntaxKind::EmptyStmt
                | SyntaxKind::OtherStmt
                | SyntaxKind::ClassDecl
        )
    }

    pub fn is_member(self) -> bool {
        matches!(
            self,
            SyntaxKind::FieldDecl
                | SyntaxKind::MethodDecl
                | SyntaxKind::ClassDecl
                | SyntaxKind::Block
                | SyntaxKind::EmptyStmt
        )
    }

    /// Whether a child of this kind may be dropped from a parent of `parent` kind
    /// without leaving a hole the grammar requires to be filled.
    pub fn removable_from(self, parent: SyntaxKind) -> bool {
        match parent {
            SyntaxKind::Block => self.is_statement(),
            SyntaxKind::ClassBody => self.is_member(),
            SyntaxKind::CompilationUnit => {
                matches!(self, SyntaxKind::Import | SyntaxKind::ClassDecl)
            }
            SyntaxKind::Modifiers => self == SyntaxKind::Annotation || self.is_modifier_keyword(),
            _ => false,
        }
    }

    /// Fixed source text for keywords and punctuation
    pub fn static_text(self) -> Option<&'static str> {
        let text = match self {
            SyntaxKind::PackageKw => "package",
            SyntaxKind::ImportKw => "import",
            SyntaxKind::StaticKw => "static",
            SyntaxKind::ClassKw => "class",
            SyntaxKind::InterfaceKw => "interface",
            SyntaxKind::EnumKw => "enum",
            SyntaxKind::ExtendsKw => "extends",
            SyntaxKind::ImplementsKw => "implements",
            SyntaxKind::PublicKw => "public",
            SyntaxKind::ProtectedKw => "protected",
            SyntaxKind::PrivateKw => "private",
            SyntaxKind::AbstractKw => "abstract",
            SyntaxKind::FinalKw => "final",
            SyntaxKind::NativeKw => "native",
            SyntaxKind::SynchronizedKw => "synchronized",
            SyntaxKind::TransientKw => "transient",
            SyntaxKind::VolatileKw => "volatile",
            SyntaxKind::StrictfpKw => "strictfp",
            SyntaxKind::DefaultKw => "default",
            SyntaxKind::NewKw => "new",
            SyntaxKind::ReturnKw => "return",
            SyntaxKind::IfKw => "if",
            SyntaxKind::ElseKw => "else",
            SyntaxKind::WhileKw => "while",
            SyntaxKind::ThrowKw => "throw",
            SyntaxKind::ThrowsKw => "throws",
            SyntaxKind::ThisKw => "this",
            SyntaxKind::SuperKw => "super",
            SyntaxKind::VoidKw => "void",
            SyntaxKind::InstanceofKw => "instanceof",
            SyntaxKind::TrueKw => "true",
            SyntaxKind::FalseKw => "false",
            SyntaxKind::NullKw => "null",
            SyntaxKind::LParen => "(",
            SyntaxKind::RParen => ")",
            SyntaxKind::LBrace => "{",
            SyntaxKind::RBrace => "}",
            SyntaxKind::LBracket => "[",
            SyntaxKind::RBracket => "]",
            SyntaxKind::Semicolon => ";",
            SyntaxKind::Comma => ",",
            SyntaxKind::Dot => ".",
            SyntaxKind::Ellipsis => "...",
            SyntaxKind::At => "@",
            SyntaxKind::Question => "?",
            SyntaxKind::Colon => ":",
            SyntaxKind::ColonColon => "::",
            SyntaxKind::Arrow => "->",
            SyntaxKind::Eq => "=",
            SyntaxKind::EqEq => "==",
            SyntaxKind::Bang => "!",
            SyntaxKind::BangEq => "!=",
            SyntaxKind::Lt => "<",
            SyntaxKind::Gt => ">",
            SyntaxKind::LtEq => "<=",
            SyntaxKind::GtEq => ">=",
            SyntaxKind::AmpAmp => "&&",
            SyntaxKind::PipePipe => "||",
            SyntaxKind::Amp => "&",
            SyntaxKind::Pipe => "|",
            SyntaxKind::Caret => "^",
            SyntaxKind::Tilde => "~",
            SyntaxKind::Plus => "+",
            SyntaxKind::Minus => "-",
            SyntaxKind::Star => "*",
            SyntaxKind::Slash => "/",
            SyntaxKind::Percent => "%",
            SyntaxKind::PlusPlus => "++",
            SyntaxKind::MinusMinus => "--",
            _ => return None,
        };
        Some(text)
    }

    /// Keyword kind for a reserved word, if it is one
    pub fn keyword(word: &str) -> Option<SyntaxKind> {
        let kind = match word {
            "package" => SyntaxKind::PackageKw,
            "import" => SyntaxKind::ImportKw,
            "static" => SyntaxKind::StaticKw,
            "class" => SyntaxKind::ClassKw,
            "interface" => SyntaxKind::InterfaceKw,
            "enum" => SyntaxKind::EnumKw,
            "extends" => SyntaxKind::ExtendsKw,
            "implements" => SyntaxKind::ImplementsKw,
            "public" => SyntaxKind::PublicKw,
            "protected" => SyntaxKind::ProtectedKw,
            "private" => SyntaxKind::PrivateKw,
            "abstract" => SyntaxKind::AbstractKw,
            "final" => SyntaxKind::FinalKw,
            "native" => SyntaxKind::NativeKw,
            "synchronized" => SyntaxKind::SynchronizedKw,
            "transient" => SyntaxKind::TransientKw,
            "volatile" => SyntaxKind::VolatileKw,
            "strictfp" => SyntaxKind::StrictfpKw,
            "default" => SyntaxKind::DefaultKw,
            "new" => SyntaxKind::NewKw,
            "return" => SyntaxKind::ReturnKw,
            "if" => SyntaxKind::IfKw,
            "else" => SyntaxKind::ElseKw,
            "while" => SyntaxKind::WhileKw,
            "throw" => SyntaxKind::ThrowKw,
            "throws" => SyntaxKind::ThrowsKw,
            "this" => SyntaxKind::ThisKw,
            "super" => SyntaxKind::SuperKw,
            "void" => SyntaxKind::VoidKw,
            "instanceof" => SyntaxKind::InstanceofKw,
            "true" => SyntaxKind::TrueKw,
            "false" => SyntaxKind::FalseKw,
            "null" => SyntaxKind::NullKw,
            "for" | "do" | "switch" | "case" | "try" | "catch" | "finally" | "break"
            | "continue" | "assert" | "goto" | "const" => SyntaxKind::OtherKw,
            _ => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_discriminant_order() {
        for (index, kind) in SyntaxKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, index, "{kind:?} out of order");
        }
    }

    #[test]
    fn test_kind_roundtrip() {
        for &kind in SyntaxKind::ALL {
            assert_eq!(SyntaxKind::from_raw(kind as u16), Some(kind));
        }
        assert_eq!(SyntaxKind::from_raw(u16::MAX), None);
    }

    #[test]
    fn test_token_partition() {
        assert!(SyntaxKind::Ident.is_token());
        assert!(SyntaxKind::ErrorToken.is_token());
        assert!(!SyntaxKind::CompilationUnit.is_token());
        assert!(!SyntaxKind::Error.is_token());
    }

    #[test]
    fn test_keywords_have_text() {
        for &kind in SyntaxKind::ALL {
            if kind.is_keyword() && kind != SyntaxKind::OtherKw {
                let text = kind.static_text().expect("keyword text");
                assert_eq!(SyntaxKind::keyword(text), Some(kind));
            }
        }
    }

    #[test]
    fn test_removal_slots() {
        assert!(SyntaxKind::VariableDecl.removable_from(SyntaxKind::Block));
        assert!(SyntaxKind::Import.removable_from(SyntaxKind::CompilationUnit));
        assert!(!SyntaxKind::MethodInvocation.removable_from(SyntaxKind::ArgList));
        assert!(!SyntaxKind::ExprStmt.removable_from(SyntaxKind::IfStmt));
    }
}
