//! Declarative call-site matching
//!
//! A [`MatchPattern`] names an owner type, a method name, the parameter
//! types and the call form. Owner types compare by exact qualified name; a
//! subtype of the owner never matches.
//!
//! Matching fails closed: a call without a resolved method type (or an
//! argument whose type the pattern needs but attribution could not
//! determine) never matches. [`MatchPattern::check`] distinguishes that case
//! as [`MatchOutcome::Unresolved`] so callers can report it.

use crate::error::RecastError;
use crate::result::Result;
use crate::tree::ast::{AstNode, MethodInvocation, NewClass};
use crate::tree::{JavaType, Node, SyntaxKind, TypeSignature};
use std::fmt;

/// Method name used for constructor patterns
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// A type position in a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypePattern {
    Any,
    Exact(TypeSignature),
}

impl TypePattern {
    pub fn exact(qualified_name: &str) -> Self {
        TypePattern::Exact(TypeSignature::new(qualified_name))
    }

    /// Generic arguments take part only when the pattern spells them out
    pub fn matches_signature(&self, sig: &TypeSignature) -> bool {
        match self {
            TypePattern::Any => true,
            TypePattern::Exact(expected) => {
                expected.qualified_name() == sig.qualified_name()
                    && (expected.type_parameters().is_empty()
                        || expected.type_parameters() == sig.type_parameters())
            }
        }
    }

    /// `None` when the type is needed but unknown
    fn matches_value(&self, ty: Option<&JavaType>) -> Option<bool> {
        let TypePattern::Exact(expected) = self else {
            return Some(true);
        };
        match ty? {
            JavaType::Null => Some(!is_primitive_name(expected.qualified_name())),
            ty => ty.signature().map(|sig| self.matches_signature(&sig)),
        }
    }
}

fn is_primitive_name(name: &str) -> bool {
    crate::tree::Primitive::from_keyword(name).is_some()
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypePattern::Any => f.write_str("*"),
            TypePattern::Exact(sig) => write!(f, "{sig}"),
        }
    }
}

/// A method name in a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamePattern {
    Any,
    Exact(String),
}

impl NamePattern {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Exact(expected) => expected == name,
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::Any => f.write_str("*"),
            NamePattern::Exact(name) => f.write_str(name),
        }
    }
}

/// Result of checking a node against a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    NoMatch,
    /// Name and arity fit but the types needed to decide are missing
    Unresolved,
}

/// Owner type, method name, parameter types and call form of a call site
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchPattern {
    pub owner: TypePattern,
    pub method_name: NamePattern,
    pub param_types: Vec<TypePattern>,
    /// Call written through a type name or a static import
    pub is_static: bool,
}

impl MatchPattern {
    pub fn new(owner: TypePattern, method_name: NamePattern, param_types: Vec<TypePattern>) -> Self {
        Self {
            owner,
            method_name,
            param_types,
            is_static: false,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Parse `[static] OWNER NAME(P1, P2, ...)`; `*` is a wildcard anywhere
    pub fn parse(text: &str) -> Result<MatchPattern> {
        let invalid = |message: &str| RecastError::invalid_pattern(text, message);

        let mut rest = text.trim();
        let mut is_static = false;
        if let Some(after) = rest.strip_prefix("static")
            && after.starts_with(char::is_whitespace)
        {
            is_static = true;
            rest = after.trim_start();
        }

        let owner_end = top_level_position(rest, char::is_whitespace)
            .ok_or_else(|| invalid("expected an owner type followed by a method name"))?;
        let (owner_text, rest) = rest.split_at(owner_end);
        let owner = parse_type_pattern(owner_text).ok_or_else(|| invalid("invalid owner type"))?;

        let rest = rest.trim_start();
        let open = rest
            .find('(')
            .ok_or_else(|| invalid("missing parameter list"))?;
        let name = rest[..open].trim();
        let method_name = match name {
            "*" => NamePattern::Any,
            CONSTRUCTOR_NAME => NamePattern::Exact(name.to_string()),
            _ if is_java_identifier(name) => NamePattern::Exact(name.to_string()),
            _ => return Err(invalid("invalid method name")),
        };

        let params_text = rest[open + 1..]
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| invalid("missing closing parenthesis"))?;
        let param_types = if params_text.trim().is_empty() {
            Vec::new()
        } else {
            split_top_level(params_text, ',')
                .into_iter()
                .map(|param| {
                    parse_type_pattern(param).ok_or_else(|| invalid("invalid parameter type"))
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(MatchPattern {
            owner,
            method_name,
            param_types,
            is_static,
        })
    }

    /// Whether `node` is a call this pattern describes
    pub fn matches(&self, node: &Node) -> bool {
        self.check(node) == MatchOutcome::Matched
    }

    pub fn check(&self, node: &Node) -> MatchOutcome {
        match node.kind() {
            SyntaxKind::MethodInvocation => MethodInvocation::cast(node.clone())
                .map_or(MatchOutcome::NoMatch, |call| self.check_invocation(&call)),
            SyntaxKind::NewClass => NewClass::cast(node.clone())
                .map_or(MatchOutcome::NoMatch, |new| self.check_new_class(&new)),
            _ => MatchOutcome::NoMatch,
        }
    }

    fn check_invocation(&self, call: &MethodInvocation) -> MatchOutcome {
        let Some(name) = call.name() else {
            return MatchOutcome::NoMatch;
        };
        let args = call.args().map(|a| a.args()).unwrap_or_default();
        if !self.method_name.matches(&name) || args.len() != self.param_types.len() {
            return MatchOutcome::NoMatch;
        }

        let Some(method) = call.method_type() else {
            return MatchOutcome::Unresolved;
        };
        if method.static_call != self.is_static
            || !self.method_name.matches(&method.name)
            || !self.owner.matches_signature(&method.declaring_type)
        {
            return MatchOutcome::NoMatch;
        }
        self.check_args(&args)
    }

    fn check_new_class(&self, new: &NewClass) -> MatchOutcome {
        let args = new.args().map(|a| a.args()).unwrap_or_default();
        if self.is_static
            || !self.method_name.matches(CONSTRUCTOR_NAME)
            || args.len() != self.param_types.len()
        {
            return MatchOutcome::NoMatch;
        }

        let Some(class) = new.syntax().ty().and_then(JavaType::as_class) else {
            return MatchOutcome::Unresolved;
        };
        if !self.owner.matches_signature(class) {
            return MatchOutcome::NoMatch;
        }
        self.check_args(&args)
    }

    fn check_args(&self, args: &[Node]) -> MatchOutcome {
        let mut unresolved = false;
        for (pattern, arg) in self.param_types.iter().zip(args) {
            let value = arg.ty().and_then(JavaType::value_type);
            match pattern.matches_value(value) {
                Some(true) => {}
                Some(false) => return MatchOutcome::NoMatch,
                None => unresolved = true,
            }
        }
        if unresolved {
            MatchOutcome::Unresolved
        } else {
            MatchOutcome::Matched
        }
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            f.write_str("static ")?;
        }
        write!(f, "{} {}(", self.owner, self.method_name)?;
        for (index, param) in self.param_types.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

fn parse_type_pattern(text: &str) -> Option<TypePattern> {
    let text = text.trim();
    if text == "*" {
        return Some(TypePattern::Any);
    }
    TypeSignature::parse(text).map(TypePattern::Exact)
}

fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Byte offset of the first char matching `pred` outside angle brackets
fn top_level_position(text: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && pred(c) => return Some(index),
            _ => {}
        }
    }
    None
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(index) = top_level_position(rest, |c| c == separator) {
        parts.push(&rest[..index]);
        rest = &rest[index + separator.len_utf8()..];
    }
    parts.push(rest);
    parts
}
