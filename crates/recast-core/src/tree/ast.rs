//! Typed views over the rewrite tree
//!
//! Views are thin wrappers around a [`Node`] of a known kind. They read
//! children by position and provide the few rebuild helpers recipes need.
//!
//! Child layouts:
//!
//! | kind               | children |
//! |--------------------|----------|
//! | `Import`           | `import` `static`? QualifiedName (`.` `*`)? `;` |
//! | `MethodInvocation` | (select `.`)? TypeArgs? name ArgList |
//! | `NewClass`         | `new` TypeRef ArgList ClassBody? |
//! | `FieldAccess`      | target `.` name |
//! | `VariableDecl`     | Modifiers? TypeRef VarDeclarator (`,` VarDeclarator)* `;` |
//! | `VarDeclarator`    | name (`[` `]`)* (`=` initializer)? |
//! | `ArgList`          | `(` (arg (`,` arg)*)? `)` |

use super::{Formatting, JavaType, MethodType, Node, SyntaxKind};

/// Cast a raw node into a typed view
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: Node) -> Option<Self>;
    fn syntax(&self) -> &Node;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            syntax: Node,
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: Node) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &Node {
                &self.syntax
            }
        }
    };
}

/// Concatenated token text of a subtree, without any formatting
pub fn compact_text(node: &Node) -> String {
    node.descendants()
        .filter_map(|n| n.text().map(str::to_string))
        .collect()
}

// ============================================================================
// Declarations
// ============================================================================

ast_node!(
    /// Root of one source file
    CompilationUnit,
    CompilationUnit
);

impl CompilationUnit {
    pub fn package(&self) -> Option<PackageDecl> {
        self.syntax.children().iter().cloned().find_map(PackageDecl::cast)
    }

    /// Dotted package name, `None` for the default package
    pub fn package_name(&self) -> Option<String> {
        self.package().map(|p| p.name())
    }

    pub fn imports(&self) -> impl Iterator<Item = Import> + '_ {
        self.syntax.children().iter().cloned().filter_map(Import::cast)
    }

    pub fn types(&self) -> impl Iterator<Item = ClassDecl> + '_ {
        self.syntax.children().iter().cloned().filter_map(ClassDecl::cast)
    }
}

ast_node!(PackageDecl, PackageDecl);

impl PackageDecl {
    pub fn name(&self) -> String {
        self.syntax
            .child_of_kind(SyntaxKind::QualifiedName)
            .map(compact_text)
            .unwrap_or_default()
    }
}

ast_node!(
    /// `import [static] a.b.C[.*];`
    Import,
    Import
);

impl Import {
    pub fn is_static(&self) -> bool {
        self.syntax.child_of_kind(SyntaxKind::StaticKw).is_some()
    }

    pub fn is_on_demand(&self) -> bool {
        self.syntax.child_of_kind(SyntaxKind::Star).is_some()
    }

    /// Imported name without the trailing `.*`
    pub fn name(&self) -> String {
        self.syntax
            .child_of_kind(SyntaxKind::QualifiedName)
            .map(compact_text)
            .unwrap_or_default()
    }

    /// Simple name a single-type (or single static member) import introduces
    pub fn simple_name(&self) -> Option<String> {
        if self.is_on_demand() {
            return None;
        }
        let name = self.name();
        Some(name.rsplit('.').next().unwrap_or(&name).to_string())
    }

    /// `(owner, member)` for a single static import
    pub fn static_member(&self) -> Option<(String, String)> {
        if !self.is_static() || self.is_on_demand() {
            return None;
        }
        let name = self.name();
        let (owner, member) = name.rsplit_once('.')?;
        Some((owner.to_string(), member.to_string()))
    }

    /// Sort key: regular imports first, then lexicographic
    pub fn sort_key(&self) -> (bool, String) {
        let mut name = self.name();
        if self.is_on_demand() {
            name.push_str(".*");
        }
        (self.is_static(), name)
    }
}

ast_node!(QualifiedName, QualifiedName);

impl QualifiedName {
    pub fn segments(&self) -> Vec<String> {
        self.syntax
            .children()
            .iter()
            .filter(|c| c.kind() == SyntaxKind::Ident)
            .filter_map(|c| c.text().map(str::to_string))
            .collect()
    }
}

ast_node!(
    /// Class, interface or enum declaration
    ClassDecl,
    ClassDecl
);

impl ClassDecl {
    pub fn name_node(&self) -> Option<&Node> {
        self.syntax.child_of_kind(SyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        self.name_node().and_then(|n| n.text()).map(str::to_string)
    }

    pub fn body(&self) -> Option<&Node> {
        self.syntax.child_of_kind(SyntaxKind::ClassBody)
    }

    pub fn members(&self) -> impl Iterator<Item = &Node> + '_ {
        self.body()
            .into_iter()
            .flat_map(|b| b.children().iter())
            .filter(|c| !c.is_token())
    }
}

ast_node!(MethodDecl, MethodDecl);

impl MethodDecl {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .child_of_kind(SyntaxKind::Ident)
            .and_then(|n| n.text())
            .map(str::to_string)
    }

    pub fn is_static(&self) -> bool {
        has_modifier(&self.syntax, SyntaxKind::StaticKw)
    }

    pub fn params(&self) -> impl Iterator<Item = &Node> + '_ {
        self.syntax
            .child_of_kind(SyntaxKind::ParamList)
            .into_iter()
            .flat_map(|p| p.children().iter())
            .filter(|c| c.kind() == SyntaxKind::Param)
    }

    pub fn body(&self) -> Option<Block> {
        self.syntax
            .child_of_kind(SyntaxKind::Block)
            .cloned()
            .and_then(Block::cast)
    }
}

/// Whether a declaration's `Modifiers` child contains the keyword
pub fn has_modifier(decl: &Node, keyword: SyntaxKind) -> bool {
    decl.child_of_kind(SyntaxKind::Modifiers)
        .is_some_and(|m| m.child_of_kind(keyword).is_some())
}

// ============================================================================
// Statements
// ============================================================================

ast_node!(Block, Block);

impl Block {
    /// Statements between the braces
    pub fn statements(&self) -> impl Iterator<Item = &Node> + '_ {
        self.syntax.children().iter().filter(|c| !c.is_token())
    }
}

ast_node!(
    /// Local variable declaration statement
    VariableDecl,
    VariableDecl
);

impl VariableDecl {
    pub fn type_ref(&self) -> Option<TypeRef> {
        self.syntax
            .child_of_kind(SyntaxKind::TypeRef)
            .cloned()
            .and_then(TypeRef::cast)
    }

    pub fn declarators(&self) -> Vec<VarDeclarator> {
        self.syntax
            .children()
            .iter()
            .cloned()
            .filter_map(VarDeclarator::cast)
            .collect()
    }
}

ast_node!(VarDeclarator, VarDeclarator);

impl VarDeclarator {
    pub fn name_node(&self) -> Option<&Node> {
        self.syntax.child_of_kind(SyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        self.name_node().and_then(|n| n.text()).map(str::to_string)
    }

    pub fn initializer(&self) -> Option<&Node> {
        let children = self.syntax.children();
        let eq = children.iter().position(|c| c.kind() == SyntaxKind::Eq)?;
        children.get(eq + 1)
    }
}

ast_node!(ExprStmt, ExprStmt);

impl ExprStmt {
    pub fn expr(&self) -> Option<&Node> {
        self.syntax.children().first()
    }
}

// ============================================================================
// Expressions
// ============================================================================

ast_node!(
    /// `select.name(args)` or `name(args)`
    MethodInvocation,
    MethodInvocation
);

impl MethodInvocation {
    fn arg_index(&self) -> Option<usize> {
        self.syntax
            .children()
            .iter()
            .rposition(|c| c.kind() == SyntaxKind::ArgList)
    }

    /// Receiver expression for qualified calls
    pub fn select(&self) -> Option<&Node> {
        let children = self.syntax.children();
        match children.get(1) {
            Some(dot) if dot.kind() == SyntaxKind::Dot => children.first(),
            _ => None,
        }
    }

    pub fn name_node(&self) -> Option<&Node> {
        let index = self.arg_index()?;
        self.syntax
            .children()
            .get(index.checked_sub(1)?)
            .filter(|n| n.kind() == SyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        self.name_node().and_then(|n| n.text()).map(str::to_string)
    }

    pub fn args(&self) -> Option<ArgList> {
        let index = self.arg_index()?;
        ArgList::cast(self.syntax.children()[index].clone())
    }

    pub fn method_type(&self) -> Option<&MethodType> {
        self.syntax.ty().and_then(JavaType::as_method)
    }

    /// Rename the call, keeping the name token's formatting
    pub fn with_name(&self, name: &str) -> MethodInvocation {
        let Some(index) = self.arg_index().and_then(|i| i.checked_sub(1)) else {
            return self.clone();
        };
        let renamed = self.syntax.children()[index].with_text(name);
        Self {
            syntax: self.syntax.with_child(index, renamed),
        }
    }

    pub fn with_args(&self, args: ArgList) -> MethodInvocation {
        match self.arg_index() {
            Some(index) => Self {
                syntax: self.syntax.with_child(index, args.syntax),
            },
            None => self.clone(),
        }
    }

    /// Replace the receiver, or qualify an unqualified call
    pub fn with_select(&self, select: Node) -> MethodInvocation {
        let syntax = if self.select().is_some() {
            self.syntax.with_child(0, select)
        } else {
            let dot = Node::token(SyntaxKind::Dot, ".").with_formatting(Formatting::default());
            let mut children = vec![select, dot];
            children.extend(self.syntax.children().iter().cloned());
            self.syntax.with_children(children)
        };
        Self { syntax }
    }

    pub fn with_method_type(&self, method: MethodType) -> MethodInvocation {
        Self {
            syntax: self.syntax.with_type(JavaType::Method(method)),
        }
    }

    pub fn into_node(self) -> Node {
        self.syntax
    }
}

ast_node!(
    /// `new T(args)`
    NewClass,
    NewClass
);

impl NewClass {
    pub fn type_ref(&self) -> Option<TypeRef> {
        self.syntax
            .child_of_kind(SyntaxKind::TypeRef)
            .cloned()
            .and_then(TypeRef::cast)
    }

    pub fn args(&self) -> Option<ArgList> {
        self.syntax
            .child_of_kind(SyntaxKind::ArgList)
            .cloned()
            .and_then(ArgList::cast)
    }

    /// Anonymous class body
    pub fn body(&self) -> Option<&Node> {
        self.syntax.child_of_kind(SyntaxKind::ClassBody)
    }
}

ast_node!(
    /// `target.name`
    FieldAccess,
    FieldAccess
);

impl FieldAccess {
    pub fn target(&self) -> Option<&Node> {
        self.syntax.children().first()
    }

    pub fn name_node(&self) -> Option<&Node> {
        self.syntax.children().get(2)
    }

    pub fn name(&self) -> Option<String> {
        self.name_node().and_then(|n| n.text()).map(str::to_string)
    }
}

ast_node!(ArgList, ArgList);

impl ArgList {
    /// Argument expressions, without parentheses and commas
    pub fn args(&self) -> Vec<Node> {
        self.syntax
            .children()
            .iter()
            .filter(|c| {
                !matches!(
                    c.kind(),
                    SyntaxKind::LParen | SyntaxKind::RParen | SyntaxKind::Comma
                )
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.args().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same parentheses around a new argument sequence; existing commas are
    /// reused in order, missing ones synthesized
    pub fn with_args(&self, args: Vec<Node>) -> ArgList {
        let children = self.syntax.children();
        let mut commas = children
            .iter()
            .filter(|c| c.kind() == SyntaxKind::Comma)
            .cloned();
        let open = children
            .first()
            .filter(|c| c.kind() == SyntaxKind::LParen)
            .cloned()
            .unwrap_or_else(|| super::make::token(SyntaxKind::LParen));
        let close = children
            .last()
            .filter(|c| c.kind() == SyntaxKind::RParen)
            .cloned()
            .unwrap_or_else(|| super::make::token(SyntaxKind::RParen));

        let mut rebuilt = vec![open];
        for (index, arg) in args.into_iter().enumerate() {
            if index > 0 {
                rebuilt.push(
                    commas
                        .next()
                        .unwrap_or_else(|| super::make::token(SyntaxKind::Comma)),
                );
            }
            rebuilt.push(arg);
        }
        rebuilt.push(close);
        Self {
            syntax: self.syntax.with_children(rebuilt),
        }
    }
}

ast_node!(
    /// Type reference: `a.b.C<D>[]`, primitive or `void`
    TypeRef,
    TypeRef
);

impl TypeRef {
    /// Dotted name without type arguments or dimensions
    pub fn name(&self) -> String {
        self.syntax
            .children()
            .iter()
            .take_while(|c| matches!(c.kind(), SyntaxKind::Ident | SyntaxKind::Dot))
            .filter_map(|c| c.text())
            .collect()
    }

    pub fn type_args(&self) -> Option<&Node> {
        self.syntax.child_of_kind(SyntaxKind::TypeArgs)
    }

    pub fn dimensions(&self) -> usize {
        self.syntax
            .children()
            .iter()
            .filter(|c| c.kind() == SyntaxKind::LBracket)
            .count()
    }
}

/// Literal leaf (numbers, strings, chars, booleans, `null`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    syntax: Node,
}

impl AstNode for Literal {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind.is_literal()
    }

    fn cast(node: Node) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &Node {
        &self.syntax
    }
}

impl Literal {
    pub fn is_null(&self) -> bool {
        self.syntax.kind() == SyntaxKind::NullKw
    }

    pub fn value(&self) -> &str {
        self.syntax.text().unwrap_or_default()
    }
}

/// Whether the expression is the `null` literal, looking through parentheses
pub fn is_null_literal(node: &Node) -> bool {
    match node.kind() {
        SyntaxKind::NullKw => true,
        SyntaxKind::Parens => node.children().get(1).is_some_and(is_null_literal),
        _ => false,
    }
}

ast_node!(
    /// Simple name leaf
    Identifier,
    Ident
);

impl Identifier {
    pub fn name(&self) -> &str {
        self.syntax.text().unwrap_or_default()
    }
}
