//! Resolved semantic types attached to tree nodes
//!
//! Types are produced by attribution (or by a recipe for the nodes it
//! synthesizes). A node without a type is unresolved; the matcher refuses to
//! match such nodes.

use std::fmt;

/// Fully qualified type name plus generic arguments. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeSignature {
    qualified_name: String,
    type_parameters: Vec<TypeSignature>,
}

impl TypeSignature {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            type_parameters: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<TypeSignature>) -> Self {
        self.type_parameters = parameters;
        self
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn type_parameters(&self) -> &[TypeSignature] {
        &self.type_parameters
    }

    /// Last segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or(self.qualified_name.as_str(), |(_, simple)| simple)
    }

    /// Everything before the last segment, empty for the default package
    pub fn package_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or("", |(package, _)| package)
    }

    /// Same signature without generic arguments
    pub fn erasure(&self) -> TypeSignature {
        TypeSignature::new(self.qualified_name.clone())
    }

    /// Parse `a.b.C<d.E, F[]>` style text
    pub fn parse(text: &str) -> Option<TypeSignature> {
        let mut chars = text.trim().char_indices().peekable();
        let sig = parse_signature(text.trim(), &mut chars)?;
        if chars.peek().is_some() {
            return None;
        }
        Some(sig)
    }
}

type CharCursor<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn parse_signature(text: &str, chars: &mut CharCursor<'_>) -> Option<TypeSignature> {
    while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    let start = chars.peek()?.0;
    let mut end = start;
    while let Some((index, c)) =
        chars.next_if(|&(_, c)| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'))
    {
        end = index + c.len_utf8();
    }
    if end == start {
        return None;
    }
    let mut name = text[start..end].to_string();
    if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return None;
    }

    let mut parameters = Vec::new();
    if chars.next_if(|&(_, c)| c == '<').is_some() {
        loop {
            parameters.push(parse_signature(text, chars)?);
            while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
            match chars.next()? {
                (_, ',') => continue,
                (_, '>') => break,
                _ => return None,
            }
        }
    }
    while chars.next_if(|&(_, c)| c == '[').is_some() {
        chars.next_if(|&(_, c)| c == ']')?;
        name.push_str("[]");
    }
    while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    Some(TypeSignature::new(name).with_parameters(parameters))
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (base, dims) = match self.qualified_name.find("[]") {
            Some(index) => self.qualified_name.split_at(index),
            None => (self.qualified_name.as_str(), ""),
        };
        f.write_str(base)?;
        if !self.type_parameters.is_empty() {
            f.write_str("<")?;
            for (i, param) in self.type_parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{param}")?;
            }
            f.write_str(">")?;
        }
        f.write_str(dims)
    }
}

/// Java primitive types (including `void` for method results)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    pub fn from_keyword(word: &str) -> Option<Primitive> {
        Some(match word {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "void" => Primitive::Void,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Boolean | Primitive::Void)
    }
}

/// Resolved method invocation target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub declaring_type: TypeSignature,
    pub name: String,
    pub return_type: Option<Box<JavaType>>,
    /// The call is written in static form: through a type name or a static import
    pub static_call: bool,
}

impl MethodType {
    pub fn new(declaring_type: TypeSignature, name: impl Into<String>, static_call: bool) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            return_type: None,
            static_call,
        }
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_static_call(&self, static_call: bool) -> Self {
        Self {
            static_call,
            ..self.clone()
        }
    }
}

/// Resolved variable reference (local, parameter or field)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableType {
    pub name: String,
    /// Declaring type for fields, `None` for locals and parameters
    pub owner: Option<TypeSignature>,
    pub ty: Option<Box<JavaType>>,
}

/// Semantic type of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaType {
    /// A class or interface; on a name node this marks a type reference
    Class(TypeSignature),
    Primitive(Primitive),
    Array(Box<JavaType>),
    /// Type of the `null` literal
    Null,
    Method(MethodType),
    Variable(VariableType),
}

impl JavaType {
    pub fn class(qualified_name: impl Into<String>) -> Self {
        JavaType::Class(TypeSignature::new(qualified_name))
    }

    /// Type of the value an expression with this annotation evaluates to
    pub fn value_type(&self) -> Option<&JavaType> {
        match self {
            JavaType::Method(method) => method.return_type.as_deref(),
            JavaType::Variable(variable) => variable.ty.as_deref(),
            other => Some(other),
        }
    }

    /// Signature form used for pattern comparison; `None` for `null` and members
    pub fn signature(&self) -> Option<TypeSignature> {
        match self {
            JavaType::Class(sig) => Some(sig.clone()),
            JavaType::Primitive(primitive) => Some(TypeSignature::new(primitive.keyword())),
            JavaType::Array(element) => {
                let element = element.signature()?;
                let name = format!("{}[]", element.qualified_name());
                Some(TypeSignature::new(name).with_parameters(element.type_parameters().to_vec()))
            }
            JavaType::Null | JavaType::Method(_) | JavaType::Variable(_) => None,
        }
    }

    pub fn as_class(&self) -> Option<&TypeSignature> {
        match self {
            JavaType::Class(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodType> {
        match self {
            JavaType::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableType> {
        match self {
            JavaType::Variable(variable) => Some(variable),
            _ => None,
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Class(sig) => write!(f, "{sig}"),
            JavaType::Primitive(primitive) => f.write_str(primitive.keyword()),
            JavaType::Array(element) => write!(f, "{element}[]"),
            JavaType::Null => f.write_str("null"),
            JavaType::Method(method) => {
                let kind = if method.static_call { "static " } else { "" };
                write!(f, "{kind}{}#{}()", method.declaring_type, method.name)
            }
            JavaType::Variable(variable) => match &variable.ty {
                Some(ty) => write!(f, "{}: {ty}", variable.name),
                None => write!(f, "{}: ?", variable.name),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_and_package_names() {
        let sig = TypeSignature::new("org.mockito.internal.util.MockUtil");
        assert_eq!(sig.simple_name(), "MockUtil");
        assert_eq!(sig.package_name(), "org.mockito.internal.util");

        let default_package = TypeSignature::new("Foo");
        assert_eq!(default_package.simple_name(), "Foo");
        assert_eq!(default_package.package_name(), "");
    }

    #[test]
    fn test_parse_generic_signature() {
        let sig = TypeSignature::parse("java.util.Map<java.lang.String, java.util.List<java.lang.Integer>>")
            .unwrap();
        assert_eq!(sig.qualified_name(), "java.util.Map");
        assert_eq!(sig.type_parameters().len(), 2);
        assert_eq!(
            sig.type_parameters()[1],
            TypeSignature::new("java.util.List")
                .with_parameters(vec![TypeSignature::new("java.lang.Integer")])
        );
        assert_eq!(
            sig.to_string(),
            "java.util.Map<java.lang.String, java.util.List<java.lang.Integer>>"
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TypeSignature::parse("").is_none());
        assert!(TypeSignature::parse("a..b").is_none());
        assert!(TypeSignature::parse("java.util.List<").is_none());
        assert!(TypeSignature::parse("a b").is_none());
    }

    #[test]
    fn test_structural_equality_includes_generics() {
        let raw = TypeSignature::new("java.util.List");
        let generic = raw.clone().with_parameters(vec![TypeSignature::new("java.lang.String")]);
        assert_ne!(raw, generic);
        assert_eq!(generic.erasure(), raw);
    }

    #[test]
    fn test_value_type_of_variable() {
        let var = JavaType::Variable(VariableType {
            name: "s".into(),
            owner: None,
            ty: Some(Box::new(JavaType::class("java.lang.String"))),
        });
        assert_eq!(var.value_type(), Some(&JavaType::class("java.lang.String")));
        assert_eq!(JavaType::Null.signature(), None);
        assert_eq!(
            JavaType::Array(Box::new(JavaType::Primitive(Primitive::Int))).signature(),
            Some(TypeSignature::new("int[]"))
        );
    }
}
