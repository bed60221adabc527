//! Hierarchical parser for Java sources
//!
//! Builds a Rowan CST from the trivia-preserving token stream. The grammar
//! covers declarations, the common statements and expressions; anything else
//! is wrapped in `Error` nodes so the tree stays lossless.
//!
//! Two kinds of `Error` nodes exist:
//!
//! - opaque regions of recognised constructs (`for` headers, `catch`
//!   clauses, switch labels, lambdas, method references, array creation and
//!   initializers) are kept as-is without reporting anything;
//! - input the parser cannot make sense of produces a [`ParseError`] too.
//!
//! Trivia is always emitted before a node is started, so every node begins
//! with a significant token and comments end up in front of the outermost
//! node they precede.

use super::language::{JavaLanguage, JavaSyntaxNode};
use super::lexer::{CstSpan, CstToken, lex_with_trivia};
use recast_core::SyntaxKind;
use rowan::{Checkpoint, GreenNodeBuilder, Language};
use serde::Serialize;

/// A syntax error with its byte range in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message} at {}..{}", span.start, span.end)]
pub struct ParseError {
    pub message: String,
    pub span: CstSpan,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Parse Java source into a lossless CST
///
/// Never fails: lexer errors and syntax errors are returned alongside the
/// tree, whose text is always exactly `source`.
///
/// # Example
///
/// ```rust,ignore
/// use recast_java::cst::parse_java;
///
/// let source = "class A { void m() { foo(1); } }\n";
/// let (cst, errors) = parse_java(source);
/// assert!(errors.is_empty());
/// assert_eq!(cst.text().to_string(), source);
/// ```
pub fn parse_java(source: &str) -> (JavaSyntaxNode, Vec<ParseError>) {
    let (tokens, lex_errors) = lex_with_trivia(source);
    let mut parser = Parser::new(&tokens, source.len());
    parser.errors.extend(
        lex_errors
            .into_iter()
            .map(|e| ParseError::new(e.message, e.span)),
    );
    parser.compilation_unit();
    let (cst, mut errors) = parser.finish();
    errors.sort_by_key(|e| e.span.start);
    (cst, errors)
}

fn raw(kind: SyntaxKind) -> rowan::SyntaxKind {
    JavaLanguage::kind_to_raw(kind)
}

fn is_opener(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::LParen | SyntaxKind::LBracket | SyntaxKind::LBrace
    )
}

fn is_closer(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::RBrace
    )
}

/// Tokens an expression never swallows during recovery
fn ends_expression(kind: SyntaxKind) -> bool {
    is_closer(kind) || matches!(kind, SyntaxKind::Semicolon | SyntaxKind::Comma)
}

fn is_primitive(word: &str) -> bool {
    matches!(
        word,
        "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double"
    )
}

/// Token stream parser
struct Parser<'a> {
    tokens: &'a [CstToken],
    /// Indices of the non-trivia tokens
    significant: Vec<usize>,
    /// Position in `significant`
    cursor: usize,
    /// Tokens before this index are already in the tree
    emitted: usize,
    source_len: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [CstToken], source_len: usize) -> Self {
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_trivia())
            .map(|(i, _)| i)
            .collect();
        Self {
            tokens,
            significant,
            cursor: 0,
            emitted: 0,
            source_len,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> (JavaSyntaxNode, Vec<ParseError>) {
        let green = self.builder.finish();
        (JavaSyntaxNode::new_root(green), self.errors)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn compilation_unit(&mut self) {
        self.builder.start_node(raw(SyntaxKind::CompilationUnit));

        if self.at(SyntaxKind::PackageKw) {
            self.package_decl();
        }
        while self.at(SyntaxKind::ImportKw) {
            self.import_decl();
        }
        while !self.at_end() {
            if self.at(SyntaxKind::Semicolon) {
                self.start(SyntaxKind::EmptyStmt);
                self.bump();
                self.finish_node();
            } else if self.at_type_decl() {
                self.type_decl();
            } else if self.at(SyntaxKind::ImportKw) {
                self.error("imports must precede type declarations");
                self.import_decl();
            } else {
                self.error_item("expected a class, interface or enum declaration");
            }
        }

        // end-of-file trivia
        self.flush_trivia_to(self.tokens.len());
        self.finish_node(); // COMPILATION_UNIT
    }

    /// Grammar: package a.b.c;
    fn package_decl(&mut self) {
        self.start(SyntaxKind::PackageDecl);
        self.bump();
        self.qualified_name();
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    /// Grammar: import [static] a.b.C[.*];
    fn import_decl(&mut self) {
        self.start(SyntaxKind::Import);
        self.bump();
        if self.at(SyntaxKind::StaticKw) {
            self.bump();
        }
        self.qualified_name();
        if self.at(SyntaxKind::Dot) && self.nth(1) == Some(SyntaxKind::Star) {
            self.bump();
            self.bump();
        }
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn qualified_name(&mut self) {
        self.start(SyntaxKind::QualifiedName);
        self.expect(SyntaxKind::Ident);
        while self.at(SyntaxKind::Dot) && self.nth(1) == Some(SyntaxKind::Ident) {
            self.bump();
            self.bump();
        }
        self.finish_node();
    }

    /// Grammar: Modifiers? (class | interface | enum | @interface) Name
    ///          TypeParams? Extends? Implements? ClassBody
    fn type_decl(&mut self) {
        self.start(SyntaxKind::ClassDecl);
        self.modifiers();

        let is_enum = self.at(SyntaxKind::EnumKw);
        match self.current() {
            Some(SyntaxKind::ClassKw | SyntaxKind::InterfaceKw | SyntaxKind::EnumKw) => {
                self.bump()
            }
            Some(SyntaxKind::At) => {
                self.bump();
                self.bump();
            }
            _ => self.error("expected class, interface or enum"),
        }
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Lt) {
            self.type_params();
        }
        if self.at(SyntaxKind::ExtendsKw) {
            self.type_list(SyntaxKind::ExtendsClause);
        }
        if self.at(SyntaxKind::ImplementsKw) {
            self.type_list(SyntaxKind::ImplementsClause);
        }
        if !self.at(SyntaxKind::LBrace) && !self.at_end() {
            // `permits` lists and anything else before the body
            self.start(SyntaxKind::Error);
            while !self.at_end() && !self.at(SyntaxKind::LBrace) && !self.at(SyntaxKind::Semicolon)
            {
                self.bump();
            }
            self.finish_node();
        }
        self.class_body(is_enum);
        self.finish_node(); // CLASS_DECL
    }

    /// `extends`, `implements` or `throws` followed by comma separated types
    fn type_list(&mut self, kind: SyntaxKind) {
        self.start(kind);
        self.bump();
        self.type_ref();
        while self.at(SyntaxKind::Comma) {
            self.bump();
            self.type_ref();
        }
        self.finish_node();
    }

    /// Grammar: < T [extends A & B], ... >
    fn type_params(&mut self) {
        self.start(SyntaxKind::TypeParams);
        self.bump();
        loop {
            while self.at(SyntaxKind::At) {
                self.annotation();
            }
            self.expect(SyntaxKind::Ident);
            if self.at(SyntaxKind::ExtendsKw) {
                self.bump();
                self.type_ref();
                while self.at(SyntaxKind::Amp) {
                    self.bump();
                    self.type_ref();
                }
            }
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::Gt);
        self.finish_node();
    }

    fn class_body(&mut self, is_enum: bool) {
        self.start(SyntaxKind::ClassBody);
        if !self.expect(SyntaxKind::LBrace) {
            self.finish_node();
            return;
        }
        if is_enum {
            self.enum_constants();
        }
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            let before = self.cursor;
            self.member();
            if self.cursor == before {
                self.error_bump("unexpected token in class body");
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node(); // CLASS_BODY
    }

    /// Grammar: (@A)* NAME (args)? (body)? , ... ;?
    fn enum_constants(&mut self) {
        let starts_constant = matches!(self.current(), Some(SyntaxKind::Ident | SyntaxKind::At));
        if !starts_constant && !self.at(SyntaxKind::Semicolon) {
            return;
        }
        self.start(SyntaxKind::EnumConstants);
        while matches!(self.current(), Some(SyntaxKind::Ident | SyntaxKind::At)) {
            self.modifiers();
            self.expect(SyntaxKind::Ident);
            if self.at(SyntaxKind::LParen) {
                self.arg_list();
            }
            if self.at(SyntaxKind::LBrace) {
                self.class_body(false);
            }
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        if self.at(SyntaxKind::Semicolon) {
            self.bump();
        }
        self.finish_node();
    }

    fn member(&mut self) {
        if self.at(SyntaxKind::Semicolon) {
            self.start(SyntaxKind::EmptyStmt);
            self.bump();
            self.finish_node();
            return;
        }
        if self.at_type_decl() {
            self.type_decl();
            return;
        }

        let mut n = self.skip_modifiers_ahead(0);
        if self.nth(n) == Some(SyntaxKind::LBrace) {
            // (static) initializer block
            self.start(SyntaxKind::MethodDecl);
            self.modifiers();
            self.block();
            self.finish_node();
            return;
        }
        if self.nth(n) == Some(SyntaxKind::Lt) {
            match self.skip_type_args_ahead(n) {
                Some(next) => n = next,
                None => {
                    self.error_item("malformed type parameters");
                    return;
                }
            }
        }
        if self.nth(n) == Some(SyntaxKind::Ident) && self.nth(n + 1) == Some(SyntaxKind::LParen) {
            self.method_decl();
            return;
        }
        match self.scan_type_ahead(n) {
            Some(m) if self.nth(m) == Some(SyntaxKind::Ident) => {
                if self.nth(m + 1) == Some(SyntaxKind::LParen) {
                    self.method_decl();
                } else {
                    self.field_decl();
                }
            }
            _ => self.error_item("expected a field, method or nested type"),
        }
    }

    /// Grammar: Modifiers? TypeParams? ReturnType? Name ParamList ([])*
    ///          Throws? (default value)? (Block | ;)
    fn method_decl(&mut self) {
        self.start(SyntaxKind::MethodDecl);
        self.modifiers();
        if self.at(SyntaxKind::Lt) {
            self.type_params();
        }
        let is_constructor =
            self.at(SyntaxKind::Ident) && self.nth(1) == Some(SyntaxKind::LParen);
        if !is_constructor {
            self.type_ref();
        }
        self.expect(SyntaxKind::Ident);
        self.param_list();
        while self.at(SyntaxKind::LBracket) {
            self.bump();
            self.expect(SyntaxKind::RBracket);
        }
        if self.at(SyntaxKind::ThrowsKw) {
            self.type_list(SyntaxKind::ThrowsClause);
        }
        if self.at(SyntaxKind::DefaultKw) {
            // annotation element default
            self.bump();
            self.expression();
        }
        if self.at(SyntaxKind::LBrace) {
            self.block();
        } else {
            self.expect(SyntaxKind::Semicolon);
        }
        self.finish_node(); // METHOD_DECL
    }

    fn field_decl(&mut self) {
        self.start(SyntaxKind::FieldDecl);
        self.modifiers();
        self.type_ref();
        self.var_declarators();
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn var_declarators(&mut self) {
        self.var_declarator();
        while self.at(SyntaxKind::Comma) {
            self.bump();
            self.var_declarator();
        }
    }

    /// Grammar: name ([])* (= initializer)?
    fn var_declarator(&mut self) {
        self.start(SyntaxKind::VarDeclarator);
        self.expect(SyntaxKind::Ident);
        while self.at(SyntaxKind::LBracket) {
            self.bump();
            self.expect(SyntaxKind::RBracket);
        }
        if self.at(SyntaxKind::Eq) {
            self.bump();
            self.expression();
        }
        self.finish_node();
    }

    fn modifiers(&mut self) {
        if !self.at_modifier() {
            return;
        }
        self.start(SyntaxKind::Modifiers);
        while self.at_modifier() {
            if self.at(SyntaxKind::At) {
                self.annotation();
            } else {
                self.bump();
            }
        }
        self.finish_node();
    }

    fn at_modifier(&self) -> bool {
        match self.current() {
            Some(SyntaxKind::At) => self.nth(1) != Some(SyntaxKind::InterfaceKw),
            Some(kind) => kind.is_modifier_keyword(),
            None => false,
        }
    }

    /// Grammar: @ QualifiedName ArgList?
    fn annotation(&mut self) {
        self.start(SyntaxKind::Annotation);
        self.bump();
        self.qualified_name();
        if self.at(SyntaxKind::LParen) {
            self.arg_list();
        }
        self.finish_node();
    }

    fn param_list(&mut self) {
        self.start(SyntaxKind::ParamList);
        self.expect(SyntaxKind::LParen);
        if !self.at(SyntaxKind::RParen) {
            loop {
                let before = self.cursor;
                self.param();
                if self.cursor == before {
                    break;
                }
                if self.at(SyntaxKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    /// Grammar: Modifiers? Type ...? name ([])*
    fn param(&mut self) {
        self.start(SyntaxKind::Param);
        self.modifiers();
        self.type_ref();
        if self.at(SyntaxKind::Ellipsis) {
            self.bump();
        }
        if self.at(SyntaxKind::ThisKw) {
            // receiver parameter
            self.bump();
        } else {
            self.expect(SyntaxKind::Ident);
        }
        while self.at(SyntaxKind::LBracket) {
            self.bump();
            self.expect(SyntaxKind::RBracket);
        }
        self.finish_node();
    }

    /// Grammar: (void | Name (. Name)* TypeArgs?) ([])*
    fn type_ref(&mut self) {
        self.start(SyntaxKind::TypeRef);
        match self.current() {
            Some(SyntaxKind::VoidKw) => self.bump(),
            Some(SyntaxKind::Ident) => {
                self.bump();
                loop {
                    if self.at(SyntaxKind::Lt) {
                        self.type_args();
                    }
                    if self.at(SyntaxKind::Dot) && self.nth(1) == Some(SyntaxKind::Ident) {
                        self.bump();
                        self.bump();
                    } else {
                        break;
                    }
                }
                while self.at(SyntaxKind::LBracket) && self.nth(1) == Some(SyntaxKind::RBracket) {
                    self.bump();
                    self.bump();
                }
            }
            _ => self.error("expected a type"),
        }
        self.finish_node();
    }

    /// Grammar: < (Type | ? [(extends | super) Type]), ... > or <>
    fn type_args(&mut self) {
        self.start(SyntaxKind::TypeArgs);
        self.bump();
        if !self.at(SyntaxKind::Gt) {
            loop {
                while self.at(SyntaxKind::At) {
                    self.annotation();
                }
                if self.at(SyntaxKind::Question) {
                    self.bump();
                    if matches!(
                        self.current(),
                        Some(SyntaxKind::ExtendsKw | SyntaxKind::SuperKw)
                    ) {
                        self.bump();
                        self.type_ref();
                    }
                } else {
                    self.type_ref();
                }
                if self.at(SyntaxKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::Gt);
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block(&mut self) {
        self.block_with(false);
    }

    /// `{ statements }`; inside a switch, case labels are kept as opaque
    /// regions between the statements
    fn block_with(&mut self, switch_labels: bool) {
        self.start(SyntaxKind::Block);
        if !self.expect(SyntaxKind::LBrace) {
            self.finish_node();
            return;
        }
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            let before = self.cursor;
            if switch_labels && self.at_switch_label() {
                self.switch_label();
            } else {
                self.statement();
            }
            if self.cursor == before {
                self.error_bump("unexpected token in block");
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node(); // BLOCK
    }

    fn at_switch_label(&self) -> bool {
        (self.at(SyntaxKind::OtherKw) && self.current_text() == "case")
            || (self.at(SyntaxKind::DefaultKw)
                && matches!(self.nth(1), Some(SyntaxKind::Colon | SyntaxKind::Arrow)))
    }

    fn switch_label(&mut self) {
        self.start(SyntaxKind::Error);
        self.bump();
        let mut depth = 0usize;
        while let Some(kind) = self.current() {
            if depth == 0 && matches!(kind, SyntaxKind::Colon | SyntaxKind::Arrow) {
                self.bump();
                break;
            }
            if is_opener(kind) {
                depth += 1;
            } else if is_closer(kind) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            self.bump();
        }
        self.finish_node();
    }

    fn statement(&mut self) {
        match self.current() {
            Some(SyntaxKind::LBrace) => self.block(),
            Some(SyntaxKind::Semicolon) => {
                self.start(SyntaxKind::EmptyStmt);
                self.bump();
                self.finish_node();
            }
            Some(SyntaxKind::ReturnKw) => {
                self.start(SyntaxKind::ReturnStmt);
                self.bump();
                if !self.at(SyntaxKind::Semicolon) {
                    self.expression();
                }
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            Some(SyntaxKind::IfKw) => {
                self.start(SyntaxKind::IfStmt);
                self.bump();
                self.condition();
                self.statement();
                if self.at(SyntaxKind::ElseKw) {
                    self.bump();
                    self.statement();
                }
                self.finish_node();
            }
            Some(SyntaxKind::WhileKw) => {
                self.start(SyntaxKind::WhileStmt);
                self.bump();
                self.condition();
                self.statement();
                self.finish_node();
            }
            Some(SyntaxKind::ThrowKw) => {
                self.start(SyntaxKind::ThrowStmt);
                self.bump();
                self.expression();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            Some(SyntaxKind::OtherKw) => self.other_statement(),
            Some(SyntaxKind::SynchronizedKw) if self.nth(1) == Some(SyntaxKind::LParen) => {
                self.other_statement()
            }
            _ if self.at_type_decl() => self.type_decl(),
            Some(SyntaxKind::Ident) if self.nth(1) == Some(SyntaxKind::Colon) => {
                // labeled statement
                self.start(SyntaxKind::OtherStmt);
                self.start(SyntaxKind::Error);
                self.bump();
                self.bump();
                self.finish_node();
                self.statement();
                self.finish_node();
            }
            _ if self.at_local_var_decl() => {
                self.start(SyntaxKind::VariableDecl);
                self.modifiers();
                self.type_ref();
                self.var_declarators();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            Some(kind) if ends_expression(kind) => {}
            Some(_) => {
                self.start(SyntaxKind::ExprStmt);
                self.expression();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            None => {}
        }
    }

    /// `( expression )` of `if` and `while`
    fn condition(&mut self) {
        self.expect(SyntaxKind::LParen);
        self.expression();
        self.expect(SyntaxKind::RParen);
    }

    /// Statements led by keywords outside the modelled grammar. Headers are
    /// kept opaque, nested statements and blocks are parsed.
    fn other_statement(&mut self) {
        self.start(SyntaxKind::OtherStmt);
        let keyword = self.current_text().to_string();
        self.bump();
        match keyword.as_str() {
            "for" => {
                self.opaque_parens();
                self.statement();
            }
            "switch" => {
                self.opaque_parens();
                if self.at(SyntaxKind::LBrace) {
                    self.block_with(true);
                }
            }
            "synchronized" => {
                self.opaque_parens();
                self.block();
            }
            "do" => {
                self.statement();
                if self.at(SyntaxKind::WhileKw) {
                    self.start(SyntaxKind::Error);
                    self.bump();
                    if self.at(SyntaxKind::LParen) {
                        self.bump_balanced();
                    }
                    self.finish_node();
                }
                self.expect(SyntaxKind::Semicolon);
            }
            "try" => {
                if self.at(SyntaxKind::LParen) {
                    self.opaque_parens();
                }
                self.block();
                loop {
                    if self.at(SyntaxKind::OtherKw) && self.current_text() == "catch" {
                        self.bump();
                        self.opaque_parens();
                        self.block();
                    } else if self.at(SyntaxKind::OtherKw) && self.current_text() == "finally" {
                        self.bump();
                        self.block();
                    } else {
                        break;
                    }
                }
            }
            _ => {
                // break, continue, assert, ...
                if !self.at(SyntaxKind::Semicolon) && !self.at_end() {
                    self.start(SyntaxKind::Error);
                    self.bump_until_expression_end();
                    self.finish_node();
                }
                self.expect(SyntaxKind::Semicolon);
            }
        }
        self.finish_node(); // OTHER_STMT
    }

    fn opaque_parens(&mut self) {
        if self.at(SyntaxKind::LParen) {
            self.start(SyntaxKind::Error);
            self.bump_balanced();
            self.finish_node();
        } else {
            self.error("expected '('");
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expression(&mut self) {
        let checkpoint = self.checkpoint();
        self.conditional();
        if matches!(
            self.current(),
            Some(SyntaxKind::Eq | SyntaxKind::OpAssign)
        ) {
            self.start_at(checkpoint, SyntaxKind::Assignment);
            self.bump();
            self.expression();
            self.finish_node();
        }
    }

    fn conditional(&mut self) {
        let checkpoint = self.checkpoint();
        self.binary(1);
        if self.at(SyntaxKind::Question) {
            self.start_at(checkpoint, SyntaxKind::Conditional);
            self.bump();
            self.expression();
            self.expect(SyntaxKind::Colon);
            self.conditional();
            self.finish_node();
        }
    }

    /// Precedence climbing over left-associative binary operators
    fn binary(&mut self, min_precedence: u8) {
        let checkpoint = self.checkpoint();
        self.unary();
        while let Some((precedence, width)) = self.binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.start_at(checkpoint, SyntaxKind::Binary);
            let is_instanceof = self.at(SyntaxKind::InstanceofKw);
            for _ in 0..width {
                self.bump();
            }
            if is_instanceof {
                if self.at(SyntaxKind::FinalKw) {
                    self.bump();
                }
                self.type_ref();
                // pattern binding
                if self.at(SyntaxKind::Ident) {
                    self.bump();
                }
            } else {
                self.binary(precedence + 1);
            }
            self.finish_node();
        }
    }

    /// Precedence and token count of the operator at the cursor
    fn binary_operator(&self) -> Option<(u8, usize)> {
        let operator = match self.current()? {
            SyntaxKind::PipePipe => (1, 1),
            SyntaxKind::AmpAmp => (2, 1),
            SyntaxKind::Pipe => (3, 1),
            SyntaxKind::Caret => (4, 1),
            SyntaxKind::Amp => (5, 1),
            SyntaxKind::EqEq | SyntaxKind::BangEq => (6, 1),
            SyntaxKind::LtEq | SyntaxKind::GtEq | SyntaxKind::InstanceofKw => (7, 1),
            SyntaxKind::Lt if self.joined(1, SyntaxKind::Lt) => (8, 2),
            SyntaxKind::Lt => (7, 1),
            SyntaxKind::Gt if self.joined(1, SyntaxKind::Gt) => {
                if self.joined(2, SyntaxKind::Gt) {
                    (8, 3)
                } else {
                    (8, 2)
                }
            }
            SyntaxKind::Gt => (7, 1),
            SyntaxKind::Plus | SyntaxKind::Minus => (9, 1),
            SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => (10, 1),
            _ => return None,
        };
        Some(operator)
    }

    fn unary(&mut self) {
        match self.current() {
            Some(
                SyntaxKind::Bang
                | SyntaxKind::Tilde
                | SyntaxKind::Plus
                | SyntaxKind::Minus
                | SyntaxKind::PlusPlus
                | SyntaxKind::MinusMinus,
            ) => {
                self.start(SyntaxKind::Unary);
                self.bump();
                self.unary();
                self.finish_node();
            }
            Some(SyntaxKind::LParen) if self.at_cast() => {
                self.start(SyntaxKind::Cast);
                self.bump();
                self.type_ref();
                self.expect(SyntaxKind::RParen);
                self.unary();
                self.finish_node();
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) {
        let checkpoint = self.checkpoint();
        self.primary();
        loop {
            match self.current() {
                Some(SyntaxKind::Dot) => match self.nth(1) {
                    Some(SyntaxKind::Ident) if self.nth(2) == Some(SyntaxKind::LParen) => {
                        self.start_at(checkpoint, SyntaxKind::MethodInvocation);
                        self.bump();
                        self.bump();
                        self.arg_list();
                        self.finish_node();
                    }
                    Some(SyntaxKind::Lt) => {
                        // explicit type arguments: a.<T>m()
                        self.start_at(checkpoint, SyntaxKind::MethodInvocation);
                        self.bump();
                        self.type_args();
                        self.expect(SyntaxKind::Ident);
                        self.arg_list();
                        self.finish_node();
                    }
                    Some(
                        SyntaxKind::Ident
                        | SyntaxKind::ClassKw
                        | SyntaxKind::ThisKw
                        | SyntaxKind::SuperKw,
                    ) => {
                        self.start_at(checkpoint, SyntaxKind::FieldAccess);
                        self.bump();
                        self.bump();
                        self.finish_node();
                    }
                    Some(SyntaxKind::NewKw) => {
                        // qualified inner class creation
                        self.start_at(checkpoint, SyntaxKind::Error);
                        self.bump_until_expression_end();
                        self.finish_node();
                    }
                    _ => {
                        self.error("expected a member name after '.'");
                        break;
                    }
                },
                Some(SyntaxKind::LBracket) => {
                    self.start_at(checkpoint, SyntaxKind::ArrayAccess);
                    self.bump();
                    self.expression();
                    self.expect(SyntaxKind::RBracket);
                    self.finish_node();
                }
                Some(SyntaxKind::PlusPlus | SyntaxKind::MinusMinus) => {
                    self.start_at(checkpoint, SyntaxKind::Unary);
                    self.bump();
                    self.finish_node();
                }
                Some(SyntaxKind::ColonColon) => {
                    // method reference
                    self.start_at(checkpoint, SyntaxKind::Error);
                    self.bump();
                    if matches!(self.current(), Some(SyntaxKind::Ident | SyntaxKind::NewKw)) {
                        self.bump();
                    }
                    self.finish_node();
                }
                _ => break,
            }
        }
    }

    fn primary(&mut self) {
        match self.current() {
            Some(kind) if kind.is_literal() => self.bump(),
            Some(SyntaxKind::Ident) => match self.nth(1) {
                Some(SyntaxKind::Arrow) => self.opaque_expression(),
                Some(SyntaxKind::LParen) => {
                    self.start(SyntaxKind::MethodInvocation);
                    self.bump();
                    self.arg_list();
                    self.finish_node();
                }
                _ => self.bump(),
            },
            Some(SyntaxKind::ThisKw | SyntaxKind::SuperKw) => {
                if self.nth(1) == Some(SyntaxKind::LParen) {
                    // explicit constructor invocation
                    self.start(SyntaxKind::MethodInvocation);
                    self.bump();
                    self.arg_list();
                    self.finish_node();
                } else {
                    self.bump();
                }
            }
            Some(SyntaxKind::NewKw) => self.new_expression(),
            Some(SyntaxKind::LParen) => {
                if self.at_lambda_parens() {
                    self.opaque_expression();
                } else {
                    self.start(SyntaxKind::Parens);
                    self.bump();
                    self.expression();
                    self.expect(SyntaxKind::RParen);
                    self.finish_node();
                }
            }
            // array initializer
            Some(SyntaxKind::LBrace) => {
                self.start(SyntaxKind::Error);
                self.bump_balanced();
                self.finish_node();
            }
            // `void.class`
            Some(SyntaxKind::VoidKw) => self.bump(),
            // switch expression
            Some(SyntaxKind::OtherKw) if self.current_text() == "switch" => {
                self.opaque_expression()
            }
            Some(kind) if ends_expression(kind) => self.error("expected an expression"),
            Some(_) => self.error_bump("expected an expression"),
            None => self.error("expected an expression"),
        }
    }

    /// Grammar: new TypeArgs? Type ArgList ClassBody?
    fn new_expression(&mut self) {
        let is_array = self
            .scan_type_ahead(1)
            .is_some_and(|m| matches!(self.nth(m), Some(SyntaxKind::LBracket | SyntaxKind::LBrace)));
        if is_array {
            self.opaque_expression();
            return;
        }
        self.start(SyntaxKind::NewClass);
        self.bump();
        if self.at(SyntaxKind::Lt) {
            self.type_args();
        }
        self.type_ref();
        if self.at(SyntaxKind::LParen) {
            self.arg_list();
        } else {
            self.error("expected '(' after the instantiated type");
        }
        if self.at(SyntaxKind::LBrace) {
            self.class_body(false);
        }
        self.finish_node();
    }

    fn arg_list(&mut self) {
        self.start(SyntaxKind::ArgList);
        self.expect(SyntaxKind::LParen);
        if !self.at(SyntaxKind::RParen) {
            loop {
                self.expression();
                if self.at(SyntaxKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    /// Keep an expression the grammar does not model (lambdas, array
    /// creation, switch expressions) as one opaque region
    fn opaque_expression(&mut self) {
        self.start(SyntaxKind::Error);
        self.bump_until_expression_end();
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Lookahead
    // ------------------------------------------------------------------

    fn at_type_decl(&self) -> bool {
        let n = self.skip_modifiers_ahead(0);
        match self.nth(n) {
            Some(SyntaxKind::ClassKw | SyntaxKind::InterfaceKw | SyntaxKind::EnumKw) => true,
            Some(SyntaxKind::At) => self.nth(n + 1) == Some(SyntaxKind::InterfaceKw),
            _ => false,
        }
    }

    fn at_local_var_decl(&self) -> bool {
        let n = self.skip_modifiers_ahead(0);
        if n > 0 {
            return true;
        }
        match self.scan_type_ahead(0) {
            Some(m) => {
                self.nth(m) == Some(SyntaxKind::Ident)
                    && matches!(
                        self.nth(m + 1),
                        Some(
                            SyntaxKind::Eq
                                | SyntaxKind::Semicolon
                                | SyntaxKind::Comma
                                | SyntaxKind::LBracket
                                | SyntaxKind::Colon
                        )
                    )
            }
            None => false,
        }
    }

    /// `(` Type `)` followed by something a cast can apply to
    fn at_cast(&self) -> bool {
        if self.at_lambda_parens() {
            return false;
        }
        let Some(m) = self.scan_type_ahead(1) else {
            return false;
        };
        if self.nth(m) != Some(SyntaxKind::RParen) {
            return false;
        }
        if is_primitive(self.nth_text(1)) {
            return true;
        }
        match self.nth(m + 1) {
            Some(kind) if kind.is_literal() => true,
            Some(
                SyntaxKind::Ident
                | SyntaxKind::LParen
                | SyntaxKind::Bang
                | SyntaxKind::Tilde
                | SyntaxKind::ThisKw
                | SyntaxKind::SuperKw
                | SyntaxKind::NewKw,
            ) => true,
            _ => false,
        }
    }

    fn at_lambda_parens(&self) -> bool {
        self.at(SyntaxKind::LParen)
            && self
                .skip_balanced_ahead(0)
                .is_some_and(|n| self.nth(n) == Some(SyntaxKind::Arrow))
    }

    /// Offset past modifier keywords and annotations starting at `n`
    fn skip_modifiers_ahead(&self, mut n: usize) -> usize {
        loop {
            match self.nth(n) {
                Some(SyntaxKind::At) if self.nth(n + 1) != Some(SyntaxKind::InterfaceKw) => {
                    n += 2;
                    while self.nth(n) == Some(SyntaxKind::Dot)
                        && self.nth(n + 1) == Some(SyntaxKind::Ident)
                    {
                        n += 2;
                    }
                    if self.nth(n) == Some(SyntaxKind::LParen) {
                        match self.skip_balanced_ahead(n) {
                            Some(next) => n = next,
                            None => return n,
                        }
                    }
                }
                // `synchronized (` starts a statement, not a declaration
                Some(SyntaxKind::SynchronizedKw) if self.nth(n + 1) == Some(SyntaxKind::LParen) => {
                    return n;
                }
                // `default:` / `default ->` are switch labels
                Some(SyntaxKind::DefaultKw)
                    if matches!(self.nth(n + 1), Some(SyntaxKind::Colon | SyntaxKind::Arrow)) =>
                {
                    return n;
                }
                Some(kind) if kind.is_modifier_keyword() => n += 1,
                _ => return n,
            }
        }
    }

    /// Offset past a type starting at `n`, if one is there
    fn scan_type_ahead(&self, mut n: usize) -> Option<usize> {
        match self.nth(n)? {
            SyntaxKind::VoidKw => return Some(n + 1),
            SyntaxKind::Ident => n += 1,
            _ => return None,
        }
        loop {
            if self.nth(n) == Some(SyntaxKind::Lt) {
                n = self.skip_type_args_ahead(n)?;
            }
            if self.nth(n) == Some(SyntaxKind::Dot) && self.nth(n + 1) == Some(SyntaxKind::Ident) {
                n += 2;
            } else {
                break;
            }
        }
        while self.nth(n) == Some(SyntaxKind::LBracket) && self.nth(n + 1) == Some(SyntaxKind::RBracket)
        {
            n += 2;
        }
        Some(n)
    }

    /// Offset past `<...>` starting at `n`, if it only holds type syntax
    fn skip_type_args_ahead(&self, mut n: usize) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            match self.nth(n)? {
                SyntaxKind::Lt => depth += 1,
                SyntaxKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(n + 1);
                    }
                }
                SyntaxKind::Ident
                | SyntaxKind::Dot
                | SyntaxKind::Comma
                | SyntaxKind::Question
                | SyntaxKind::ExtendsKw
                | SyntaxKind::SuperKw
                | SyntaxKind::LBracket
                | SyntaxKind::RBracket
                | SyntaxKind::Amp
                | SyntaxKind::At => {}
                _ => return None,
            }
            n += 1;
        }
    }

    /// Offset past the balanced group opening at `n`
    fn skip_balanced_ahead(&self, mut n: usize) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            let kind = self.nth(n)?;
            if is_opener(kind) {
                depth += 1;
            } else if is_closer(kind) {
                depth = depth.checked_sub(1)?;
            }
            n += 1;
            if depth == 0 {
                return Some(n);
            }
        }
    }

    // ------------------------------------------------------------------
    // Helper methods
    // ------------------------------------------------------------------

    fn current(&self) -> Option<SyntaxKind> {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.significant
            .get(self.cursor + n)
            .map(|&index| self.tokens[index].kind)
    }

    fn current_text(&self) -> &str {
        self.nth_text(0)
    }

    fn nth_text(&self, n: usize) -> &str {
        self.significant
            .get(self.cursor + n)
            .map(|&index| self.tokens[index].text.as_str())
            .unwrap_or_default()
    }

    /// The `n`th token is `kind` and directly follows the previous one
    fn joined(&self, n: usize, kind: SyntaxKind) -> bool {
        if self.nth(n) != Some(kind) {
            return false;
        }
        match (
            self.significant.get(self.cursor + n - 1),
            self.significant.get(self.cursor + n),
        ) {
            (Some(&prev), Some(&next)) => next == prev + 1,
            _ => false,
        }
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == Some(kind)
    }

    fn at_end(&self) -> bool {
        self.cursor >= self.significant.len()
    }

    fn flush_trivia_to(&mut self, end: usize) {
        while self.emitted < end {
            let token = &self.tokens[self.emitted];
            self.builder.token(raw(token.kind), &token.text);
            self.emitted += 1;
        }
    }

    /// Emit the trivia in front of the next significant token
    fn flush_trivia(&mut self) {
        let end = self
            .significant
            .get(self.cursor)
            .copied()
            .unwrap_or(self.tokens.len());
        self.flush_trivia_to(end);
    }

    fn bump(&mut self) {
        let Some(&index) = self.significant.get(self.cursor) else {
            return;
        };
        self.flush_trivia_to(index + 1);
        self.cursor += 1;
    }

    /// Bump a whole `( )`, `[ ]` or `{ }` group
    fn bump_balanced(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.current() {
            if is_opener(kind) {
                depth += 1;
            } else if is_closer(kind) {
                depth = depth.saturating_sub(1);
            }
            self.bump();
            if depth == 0 {
                break;
            }
        }
    }

    /// Bump tokens up to a `,` `;` or closer outside any group
    fn bump_until_expression_end(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.current() {
            if is_opener(kind) {
                depth += 1;
            } else if is_closer(kind) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            } else if depth == 0 && ends_expression(kind) {
                break;
            }
            self.bump();
        }
    }

    fn start(&mut self, kind: SyntaxKind) {
        self.flush_trivia();
        self.builder.start_node(raw(kind));
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        self.builder.checkpoint()
    }

    fn start_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, raw(kind));
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            let expected = kind.static_text().map_or_else(
                || format!("{kind:?}").to_lowercase(),
                |text| format!("'{text}'"),
            );
            self.error(format!("expected {expected}"));
            false
        }
    }

    fn current_span(&self) -> CstSpan {
        match self.significant.get(self.cursor) {
            Some(&index) => self.tokens[index].span.clone(),
            None => self.source_len..self.source_len,
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
    }

    /// Report and wrap the current token (or group) in an `Error` node
    fn error_bump(&mut self, message: &str) {
        self.error(message);
        self.start(SyntaxKind::Error);
        match self.current() {
            Some(kind) if is_opener(kind) => self.bump_balanced(),
            _ => self.bump(),
        }
        self.finish_node();
    }

    /// Report and skip one unrecognised declaration: up to and including the
    /// next `;` or balanced `{ }` group
    fn error_item(&mut self, message: &str) {
        self.error(message);
        self.start(SyntaxKind::Error);
        let mut depth = 0usize;
        let mut consumed = false;
        while let Some(kind) = self.current() {
            if is_opener(kind) {
                depth += 1;
            } else if is_closer(kind) {
                if depth == 0 {
                    if !consumed {
                        self.bump();
                    }
                    break;
                }
                depth -= 1;
                if depth == 0 && kind == SyntaxKind::RBrace {
                    self.bump();
                    break;
                }
            } else if depth == 0 && kind == SyntaxKind::Semicolon {
                self.bump();
                break;
            }
            self.bump();
            consumed = true;
        }
        self.finish_node();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::NodeOrToken;

    fn parse_ok(source: &str) -> JavaSyntaxNode {
        let (cst, errors) = parse_java(source);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(cst.text().to_string(), source);
        cst
    }

    fn find(node: &JavaSyntaxNode, kind: SyntaxKind) -> Option<JavaSyntaxNode> {
        node.descendants().find(|n| n.kind() == kind)
    }

    fn count(node: &JavaSyntaxNode, kind: SyntaxKind) -> usize {
        node.descendants().filter(|n| n.kind() == kind).count()
    }

    #[test]
    fn test_header() {
        let cst = parse_ok(
            "package com.example;\n\nimport java.util.List;\nimport static org.junit.Assert.*;\n",
        );
        assert_eq!(count(&cst, SyntaxKind::Import), 2);
        assert!(find(&cst, SyntaxKind::PackageDecl).is_some());
    }

    #[test]
    fn test_class_members() {
        let cst = parse_ok(
            r#"@Deprecated
public final class A<T extends Comparable<T>> extends B implements C, D {
    private static final int X = 1, Y[] = null;
    A(int a) { super(); }
    static { init(); }
    <R> R map(java.util.function.Function<T, R> f) throws Exception { return null; }
    abstract void none();
    enum E { ONE, TWO("2") { }, ; }
    interface I { default void m() {} }
}
"#,
        );
        assert_eq!(count(&cst, SyntaxKind::ClassDecl), 3);
        assert_eq!(count(&cst, SyntaxKind::FieldDecl), 1);
        assert_eq!(count(&cst, SyntaxKind::MethodDecl), 5);
        assert_eq!(count(&cst, SyntaxKind::EnumConstants), 1);
    }

    #[test]
    fn test_statements() {
        let cst = parse_ok(
            r#"class A {
    void m(String... args) {
        int i = 0;
        List<Map<String, Integer>> xs = new ArrayList<>();
        if (i > 0) i++; else { i--; }
        while (i < 10) i += 2;
        throw new IllegalStateException("x" + i);
    }
}
"#,
        );
        assert!(find(&cst, SyntaxKind::IfStmt).is_some());
        assert!(find(&cst, SyntaxKind::WhileStmt).is_some());
        assert!(find(&cst, SyntaxKind::ThrowStmt).is_some());
        assert_eq!(count(&cst, SyntaxKind::VariableDecl), 2);
        assert_eq!(count(&cst, SyntaxKind::NewClass), 2);
    }

    #[test]
    fn test_other_statements_keep_nested_blocks() {
        let cst = parse_ok(
            r#"class A {
    void m() {
        for (int i = 0; i < n; i++) { foo(i); }
        try (var r = open()) { bar(); } catch (Exception e) { baz(); } finally { qux(); }
        switch (x) { case 1: one(); break; default -> two(); }
        do { step(); } while (more());
        label: while (true) { continue label; }
    }
}
"#,
        );
        let calls: Vec<String> = cst
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::MethodInvocation)
            .filter_map(|n| {
                n.children_with_tokens()
                    .filter_map(NodeOrToken::into_token)
                    .find(|t| t.kind() == SyntaxKind::Ident)
                    .map(|t| t.text().to_string())
            })
            .collect();
        for name in ["foo", "bar", "baz", "qux", "one", "two", "step"] {
            assert!(calls.iter().any(|c| c == name), "{name} not parsed in {calls:?}");
        }
        // for, try, switch, break, do, label, continue
        assert_eq!(count(&cst, SyntaxKind::OtherStmt), 7);
    }

    #[test]
    fn test_expression_shapes() {
        let cst = parse_ok(
            "class A { void m() { x = (String) o; y = a.b.c(1).d; z = !f && g || h ? 1 : 2; \
             w = a << 2 >> 1 >>> 3; v = arr[0]; u = Foo.<T>bar(); t = o instanceof String s; } }",
        );
        assert!(find(&cst, SyntaxKind::Cast).is_some());
        assert!(find(&cst, SyntaxKind::Conditional).is_some());
        assert!(find(&cst, SyntaxKind::ArrayAccess).is_some());
        assert!(count(&cst, SyntaxKind::FieldAccess) >= 2);
        assert!(count(&cst, SyntaxKind::Binary) >= 5);
        assert_eq!(count(&cst, SyntaxKind::Assignment), 7);
    }

    #[test]
    fn test_lambdas_and_method_refs_are_opaque() {
        let cst = parse_ok(
            "class A { void m() { run(() -> { go(); }, x -> x + 1, String::valueOf, new int[] {1, 2}); } }",
        );
        let call = find(&cst, SyntaxKind::ArgList).unwrap();
        let errors = call
            .children()
            .filter(|n| n.kind() == SyntaxKind::Error)
            .count();
        assert_eq!(errors, 4);
    }

    #[test]
    fn test_shift_versus_generics() {
        let cst = parse_ok("class A { Map<K, List<V>> m; int s = a >> 2; }");
        assert_eq!(count(&cst, SyntaxKind::TypeArgs), 2);
        let binary = find(&cst, SyntaxKind::Binary).unwrap();
        let gts = binary
            .children_with_tokens()
            .filter(|e| e.kind() == SyntaxKind::Gt)
            .count();
        assert_eq!(gts, 2);
    }

    #[test]
    fn test_errors_are_lossless() {
        for source in [
            "class A { void m() { foo(; } }",
            "class { }",
            "}}} class A {",
            "class A { int x = ; }",
            "import ;\nrecord R(int a) {}",
            "class A { void m() { \"unterminated\n } }",
        ] {
            let (cst, errors) = parse_java(source);
            assert!(!errors.is_empty(), "expected errors for {source:?}");
            assert_eq!(cst.text().to_string(), source);
        }
    }

    #[test]
    fn test_comments_precede_nodes() {
        let cst = parse_ok("class A {\n    // note\n    void m() {}\n}\n");
        let body = find(&cst, SyntaxKind::ClassBody).unwrap();
        let comment_before_method = body
            .children_with_tokens()
            .take_while(|e| e.kind() != SyntaxKind::MethodDecl)
            .any(|e| e.kind() == SyntaxKind::LineComment);
        assert!(comment_before_method);
    }
}
