//! CST-aware lexer that preserves all trivia (whitespace, comments)
//!
//! Every byte of the input ends up in exactly one token, so concatenating
//! the token texts reproduces the source. Malformed input (unterminated
//! strings or comments, stray characters) still produces tokens, plus a
//! [`LexerError`].

use recast_core::SyntaxKind;
use std::ops::Range;

/// Byte range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

/// Lex input preserving ALL trivia for CST construction
///
/// Whitespace (newlines included) becomes `Whitespace` tokens, comments
/// become `LineComment` / `BlockComment` tokens.
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<CstToken>,
    errors: Vec<LexerError>,
}

impl Lexer<'_> {
    fn run(&mut self) {
        while let Some(c) = self.peek(0) {
            let start = self.pos;
            let kind = match c {
                c if c.is_whitespace() => {
                    self.eat_while(char::is_whitespace);
                    SyntaxKind::Whitespace
                }
                '/' if self.peek(1) == Some('/') => {
                    self.eat_while(|c| c != '\n' && c != '\r');
                    SyntaxKind::LineComment
                }
                '/' if self.peek(1) == Some('*') => self.block_comment(),
                '"' => self.string(),
                '\'' => self.char_literal(),
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
                c if is_ident_start(c) => {
                    self.eat_while(is_ident_continue);
                    let word = &self.input[start..self.pos];
                    SyntaxKind::keyword(word).unwrap_or(SyntaxKind::Ident)
                }
                _ => self.punctuation(c),
            };
            self.push(kind, start);
        }
    }

    fn push(&mut self, kind: SyntaxKind, start: usize) {
        let text = &self.input[start..self.pos];
        self.tokens.push(CstToken::new(kind, text, start..self.pos));
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek(0) == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek(0) {
            if !predicate(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn block_comment(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 2;
        match self.input[self.pos..].find("*/") {
            Some(end) => self.pos += end + 2,
            None => {
                self.pos = self.input.len();
                self.errors
                    .push(LexerError::new("unterminated block comment", start..self.pos));
            }
        }
        SyntaxKind::BlockComment
    }

    fn string(&mut self) -> SyntaxKind {
        let start = self.pos;
        if self.input[self.pos..].starts_with("\"\"\"") {
            self.pos += 3;
            return match self.input[self.pos..].find("\"\"\"") {
                Some(end) => {
                    self.pos += end + 3;
                    SyntaxKind::StringLiteral
                }
                None => {
                    self.pos = self.input.len();
                    self.errors
                        .push(LexerError::new("unterminated text block", start..self.pos));
                    SyntaxKind::ErrorToken
                }
            };
        }
        self.bump();
        self.quoted('"', start, "unterminated string literal", SyntaxKind::StringLiteral)
    }

    fn char_literal(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.bump();
        self.quoted('\'', start, "unterminated character literal", SyntaxKind::CharLiteral)
    }

    /// Rest of a single-line quoted literal after the opening quote
    fn quoted(&mut self, quote: char, start: usize, message: &str, kind: SyntaxKind) -> SyntaxKind {
        while let Some(c) = self.peek(0) {
            match c {
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '\n' | '\r' => break,
                c if c == quote => {
                    self.bump();
                    return kind;
                }
                _ => {
                    self.bump();
                }
            }
        }
        self.errors.push(LexerError::new(message, start..self.pos));
        SyntaxKind::ErrorToken
    }

    fn number(&mut self) -> SyntaxKind {
        let mut float = false;
        if self.peek(0) == Some('0') && matches!(self.peek(1), Some('x' | 'X' | 'b' | 'B')) {
            self.pos += 2;
            self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
        } else {
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
            if self.peek(0) == Some('.') && self.peek(1).is_none_or(|c| c.is_ascii_digit()) {
                float = true;
                self.bump();
                self.eat_while(|c| c.is_ascii_digit() || c == '_');
            } else if self.peek(0) == Some('.')
                && self.peek(1).is_some_and(|c| !is_ident_start(c))
            {
                // `1.` followed by an operator or punctuation
                float = true;
                self.bump();
            }
            if matches!(self.peek(0), Some('e' | 'E')) {
                let sign = usize::from(matches!(self.peek(1), Some('+' | '-')));
                if self.peek(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                    float = true;
                    self.pos += 1 + sign;
                    self.eat_while(|c| c.is_ascii_digit() || c == '_');
                }
            }
        }
        match self.peek(0) {
            Some('f' | 'F' | 'd' | 'D') => {
                self.bump();
                SyntaxKind::FloatLiteral
            }
            Some('l' | 'L') => {
                self.bump();
                SyntaxKind::IntLiteral
            }
            _ if float => SyntaxKind::FloatLiteral,
            _ => SyntaxKind::IntLiteral,
        }
    }

    fn punctuation(&mut self, c: char) -> SyntaxKind {
        let start = self.pos;
        self.bump();
        match c {
            '(' => SyntaxKind::LParen,
            ')' => SyntaxKind::RParen,
            '{' => SyntaxKind::LBrace,
            '}' => SyntaxKind::RBrace,
            '[' => SyntaxKind::LBracket,
            ']' => SyntaxKind::RBracket,
            ';' => SyntaxKind::Semicolon,
            ',' => SyntaxKind::Comma,
            '@' => SyntaxKind::At,
            '?' => SyntaxKind::Question,
            '~' => SyntaxKind::Tilde,
            '.' => {
                if self.input[self.pos..].starts_with("..") {
                    self.pos += 2;
                    SyntaxKind::Ellipsis
                } else {
                    SyntaxKind::Dot
                }
            }
            ':' => {
                if self.eat(':') {
                    SyntaxKind::ColonColon
                } else {
                    SyntaxKind::Colon
                }
            }
            '=' => {
                if self.eat('=') {
                    SyntaxKind::EqEq
                } else {
                    SyntaxKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    SyntaxKind::BangEq
                } else {
                    SyntaxKind::Bang
                }
            }
            // `>>`, `>>>` and `<<` stay separate so generic closers nest;
            // the parser joins adjacent ones into shift operators
            '<' => {
                if self.input[self.pos..].starts_with("<=") {
                    self.pos += 2;
                    SyntaxKind::OpAssign
                } else if self.eat('=') {
                    SyntaxKind::LtEq
                } else {
                    SyntaxKind::Lt
                }
            }
            '>' => {
                if self.input[self.pos..].starts_with(">>=") {
                    self.pos += 3;
                    SyntaxKind::OpAssign
                } else if self.input[self.pos..].starts_with(">=") {
                    self.pos += 2;
                    SyntaxKind::OpAssign
                } else if self.eat('=') {
                    SyntaxKind::GtEq
                } else {
                    SyntaxKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    SyntaxKind::AmpAmp
                } else if self.eat('=') {
                    SyntaxKind::OpAssign
                } else {
                    SyntaxKind::Amp
                }
            }
            '|' => {
                if self.eat('|') {
                    SyntaxKind::PipePipe
                } else if self.eat('=') {
                    SyntaxKind::OpAssign
                } else {
                    SyntaxKind::Pipe
                }
            }
            '+' => {
                if self.eat('+') {
                    SyntaxKind::PlusPlus
                } else if self.eat('=') {
                    SyntaxKind::OpAssign
                } else {
                    SyntaxKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    SyntaxKind::MinusMinus
                } else if self.eat('>') {
                    SyntaxKind::Arrow
                } else if self.eat('=') {
                    SyntaxKind::OpAssign
                } else {
                    SyntaxKind::Minus
                }
            }
            '*' | '/' | '%' | '^' => {
                if self.eat('=') {
                    SyntaxKind::OpAssign
                } else {
                    match c {
                        '*' => SyntaxKind::Star,
                        '/' => SyntaxKind::Slash,
                        '%' => SyntaxKind::Percent,
                        _ => SyntaxKind::Caret,
                    }
                }
            }
            _ => {
                self.errors.push(LexerError::new(
                    format!("unexpected character '{c}'"),
                    start..self.pos,
                ));
                SyntaxKind::ErrorToken
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
