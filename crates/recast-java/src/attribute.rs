//! Type attribution
//!
//! Annotates a lowered tree with the semantic types the matcher and the
//! import reconciler rely on:
//!
//! - type references and type names in expressions get `Class` types,
//!   resolved through declarations in the file, single-type imports, the
//!   file's package, `java.lang` and on-demand imports (the last three
//!   consult the classpath catalog);
//! - names of locals, parameters and fields get `Variable` types;
//! - literals, `new` expressions and simple operators get value types;
//! - method invocations get a `Method` type naming the declaring type and
//!   the call form.
//!
//! Anything that cannot be resolved with certainty stays unannotated.
//! Regions the parser kept opaque are not looked into.

use recast_core::tree::ast::{AstNode, ClassDecl, CompilationUnit, MethodDecl, MethodInvocation};
use recast_core::{
    ClasspathConfig, JavaType, MethodType, Node, Primitive, SyntaxKind, TypeSignature,
    VariableType,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Types of `java.lang` resolvable without a classpath entry
const JAVA_LANG: &[&str] = &[
    "AutoCloseable",
    "Boolean",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "ClassCastException",
    "CloneNotSupportedException",
    "Comparable",
    "Deprecated",
    "Double",
    "Enum",
    "Error",
    "Exception",
    "Float",
    "FunctionalInterface",
    "IllegalArgumentException",
    "IllegalStateException",
    "IndexOutOfBoundsException",
    "Integer",
    "InterruptedException",
    "Iterable",
    "Long",
    "Math",
    "NullPointerException",
    "Number",
    "Object",
    "Override",
    "Record",
    "Runnable",
    "RuntimeException",
    "SafeVarargs",
    "Short",
    "String",
    "StringBuilder",
    "SuppressWarnings",
    "System",
    "Thread",
    "Throwable",
    "UnsupportedOperationException",
    "Void",
];

const STRING: &str = "java.lang.String";

/// Annotate a compilation unit with semantic types
///
/// Trees that are not a compilation unit are returned unchanged.
pub fn attribute(tree: &Node, classpath: &ClasspathConfig) -> Node {
    let Some(unit) = CompilationUnit::cast(tree.clone()) else {
        return tree.clone();
    };
    let mut attributor = Attributor::new(&unit, classpath);
    let attributed = attributor.node(tree);
    debug!(
        "attributed compilation unit with {} declared types",
        attributor.classes.len()
    );
    attributed
}

/// Names the import list and the file's declarations bring into scope
#[derive(Debug, Default)]
struct FileScope {
    package: Option<String>,
    /// Simple name -> qualified name of single-type imports
    single: HashMap<String, String>,
    /// Packages (or types) imported on demand
    on_demand: Vec<String>,
    /// Member -> owner of single static imports
    static_single: HashMap<String, String>,
    /// Owners imported with `import static Owner.*`
    static_on_demand: Vec<String>,
    /// Simple name -> qualified name of the classes declared in the file
    declared: HashMap<String, String>,
}

impl FileScope {
    fn new(unit: &CompilationUnit) -> Self {
        let mut scope = FileScope {
            package: unit.package_name(),
            ..FileScope::default()
        };
        for import in unit.imports() {
            let name = import.name();
            match (import.is_static(), import.is_on_demand()) {
                (false, false) => {
                    let simple = name.rsplit('.').next().unwrap_or(&name).to_string();
                    scope.single.insert(simple, name);
                }
                (false, true) => scope.on_demand.push(name),
                (true, false) => {
                    if let Some((owner, member)) = import.static_member() {
                        scope.static_single.insert(member, owner);
                    }
                }
                (true, true) => scope.static_on_demand.push(name),
            }
        }
        let prefix = scope.package.clone().unwrap_or_default();
        for decl in unit.types() {
            scope.declare(&decl, &prefix);
        }
        scope
    }

    fn declare(&mut self, decl: &ClassDecl, prefix: &str) {
        let Some(name) = decl.name() else {
            return;
        };
        let qualified = qualify(prefix, &name);
        for member in decl.members() {
            if let Some(nested) = ClassDecl::cast(member.clone()) {
                self.declare(&nested, &qualified);
            }
        }
        self.declared.entry(name).or_insert(qualified);
    }

    /// Qualified name of the type a simple name denotes
    fn resolve(&self, name: &str, classpath: &ClasspathConfig) -> Option<String> {
        if let Some(qualified) = self.declared.get(name).or_else(|| self.single.get(name)) {
            return Some(qualified.clone());
        }
        let same_package = match &self.package {
            Some(package) => classpath.type_in_package(package, name),
            None => classpath.contains_type(name).then(|| name.to_string()),
        };
        if same_package.is_some() {
            return same_package;
        }
        if JAVA_LANG.contains(&name) {
            return Some(format!("java.lang.{name}"));
        }
        if let Some(qualified) = classpath.type_in_package("java.lang", name) {
            return Some(qualified);
        }
        // on-demand imports only count when exactly one of them has the name
        let mut candidates = self
            .on_demand
            .iter()
            .filter_map(|package| classpath.type_in_package(package, name));
        match (candidates.next(), candidates.next()) {
            (Some(qualified), None) => Some(qualified),
            _ => None,
        }
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Members of a class declared in the file
#[derive(Debug, Default)]
struct ClassInfo {
    fields: HashMap<String, Option<JavaType>>,
    /// Method name -> whether some overload is static
    methods: HashMap<String, bool>,
    superclass: Option<String>,
}

/// Lexical scope of a class, method or block
#[derive(Debug, Default)]
struct Scope {
    locals: HashMap<String, Option<JavaType>>,
    type_params: HashSet<String>,
}

struct Attributor<'a> {
    classpath: &'a ClasspathConfig,
    file: FileScope,
    classes: HashMap<String, ClassInfo>,
    class_stack: Vec<String>,
    scopes: Vec<Scope>,
}

impl<'a> Attributor<'a> {
    fn new(unit: &CompilationUnit, classpath: &'a ClasspathConfig) -> Self {
        let file = FileScope::new(unit);
        let mut attributor = Self {
            classpath,
            file,
            classes: HashMap::new(),
            class_stack: Vec::new(),
            scopes: Vec::new(),
        };
        let prefix = attributor.file.package.clone().unwrap_or_default();
        for decl in unit.types() {
            attributor.collect_class(&decl, &prefix);
        }
        attributor
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn collect_class(&mut self, decl: &ClassDecl, prefix: &str) {
        let Some(name) = decl.name() else {
            return;
        };
        let qualified = qualify(prefix, &name);
        let type_params = type_param_names(decl.syntax());
        let resolve = |name: &str| {
            if type_params.contains(name) {
                Some(TypeSignature::new(name))
            } else {
                self.file.resolve(name, self.classpath).map(TypeSignature::new)
            }
        };

        let mut info = ClassInfo {
            superclass: decl
                .syntax()
                .child_of_kind(SyntaxKind::ExtendsClause)
                .and_then(|clause| clause.child_of_kind(SyntaxKind::TypeRef))
                .and_then(|type_ref| type_of_type_ref(type_ref, &resolve))
                .and_then(|ty| ty.as_class().map(|sig| sig.qualified_name().to_string())),
            ..ClassInfo::default()
        };
        let mut nested = Vec::new();
        for member in decl.members() {
            match member.kind() {
                SyntaxKind::FieldDecl => {
                    let base = member
                        .child_of_kind(SyntaxKind::TypeRef)
                        .and_then(|type_ref| type_of_type_ref(type_ref, &resolve));
                    for declarator in member
                        .children()
                        .iter()
                        .filter(|c| c.kind() == SyntaxKind::VarDeclarator)
                    {
                        if let Some(field) = declared_name(declarator) {
                            let ty = base.clone().map(|ty| with_dimensions(ty, declarator));
                            info.fields.insert(field, ty);
                        }
                    }
                }
                SyntaxKind::MethodDecl => {
                    let Some(method) = MethodDecl::cast(member.clone()) else {
                        continue;
                    };
                    if let Some(method_name) = method.name() {
                        *info.methods.entry(method_name).or_insert(false) |= method.is_static();
                    }
                }
                SyntaxKind::EnumConstants => {
                    for constant in member.children().iter().filter(|c| c.kind() == SyntaxKind::Ident) {
                        if let Some(text) = constant.text() {
                            info.fields
                                .insert(text.to_string(), Some(JavaType::class(qualified.as_str())));
                        }
                    }
                }
                SyntaxKind::ClassDecl => nested.extend(ClassDecl::cast(member.clone())),
                _ => {}
            }
        }
        self.classes.insert(qualified.clone(), info);
        for decl in nested {
            self.collect_class(&decl, &qualified);
        }
    }

    fn node(&mut self, node: &Node) -> Node {
        match node.kind() {
            SyntaxKind::Import | SyntaxKind::PackageDecl | SyntaxKind::Error => node.clone(),
            SyntaxKind::ClassDecl => self.class_decl(node),
            SyntaxKind::MethodDecl | SyntaxKind::Block | SyntaxKind::OtherStmt => {
                self.scopes.push(Scope::default());
                let node = self.children(node);
                self.scopes.pop();
                node
            }
            SyntaxKind::TypeParams => self.type_params(node),
            SyntaxKind::TypeRef => self.type_ref(node),
            SyntaxKind::Param => self.param(node),
            SyntaxKind::VariableDecl => self.variable_decl(node, None),
            SyntaxKind::FieldDecl => {
                let owner = self.class_stack.last().map(TypeSignature::new);
                self.variable_decl(node, owner)
            }
            SyntaxKind::Annotation => self.annotation(node),
            SyntaxKind::Binary => {
                let node = self.binary(node);
                self.typed(node)
            }
            kind if kind.is_token() => node.clone(),
            _ => {
                let node = self.children(node);
                self.typed(node)
            }
        }
    }

    fn children(&mut self, node: &Node) -> Node {
        let children = node
            .children()
            .iter()
            .enumerate()
            .map(|(index, child)| self.child(node, index, child))
            .collect();
        node.with_children(children)
    }

    fn child(&mut self, parent: &Node, index: usize, child: &Node) -> Node {
        match child.kind() {
            SyntaxKind::Ident if is_expression_name(parent, index) => self.name(child),
            SyntaxKind::ThisKw if is_expression_name(parent, index) => {
                match self.class_stack.last() {
                    Some(class) => child.with_type(JavaType::class(class.as_str())),
                    None => child.clone(),
                }
            }
            SyntaxKind::SuperKw if is_expression_name(parent, index) => {
                match self.superclass() {
                    Some(class) => child.with_type(JavaType::class(class)),
                    None => child.clone(),
                }
            }
            kind if kind.is_literal() => match literal_type(child) {
                Some(ty) => child.with_type(ty),
                None => child.clone(),
            },
            _ if child.is_token() => child.clone(),
            _ => self.node(child),
        }
    }

    fn class_decl(&mut self, node: &Node) -> Node {
        let name = node
            .child_of_kind(SyntaxKind::Ident)
            .and_then(Node::text)
            .unwrap_or_default();
        let prefix = match self.class_stack.last() {
            Some(outer) => outer.clone(),
            None => self.file.package.clone().unwrap_or_default(),
        };
        self.class_stack.push(qualify(&prefix, name));
        self.scopes.push(Scope::default());
        let node = self.children(node);
        self.scopes.pop();
        self.class_stack.pop();
        node
    }

    fn type_params(&mut self, node: &Node) -> Node {
        if let Some(scope) = self.scopes.last_mut() {
            scope.type_params.extend(
                node.children()
                    .iter()
                    .filter(|c| c.kind() == SyntaxKind::Ident)
                    .filter_map(|c| c.text().map(str::to_string)),
            );
        }
        self.children(node)
    }

    fn type_ref(&mut self, node: &Node) -> Node {
        let ty = type_of_type_ref(node, &|name: &str| self.resolve_type_name(name));
        let first_segment = node
            .children()
            .first()
            .filter(|c| c.kind() == SyntaxKind::Ident)
            .and_then(Node::text)
            .filter(|name| Primitive::from_keyword(name).is_none() && *name != "var")
            .and_then(|name| self.resolve_type_name(name));

        let mut children = Vec::with_capacity(node.children().len());
        for (index, child) in node.children().iter().enumerate() {
            let child = match (&first_segment, index) {
                (Some(sig), 0) => child.with_type(JavaType::Class(sig.erasure())),
                _ if child.is_token() => child.clone(),
                _ => self.node(child),
            };
            children.push(child);
        }
        let node = node.with_children(children);
        match ty {
            Some(ty) => node.with_type(ty),
            None => node,
        }
    }

    fn param(&mut self, node: &Node) -> Node {
        let mut children = Vec::with_capacity(node.children().len());
        let mut ty = None;
        let mut varargs = false;
        let mut name_index = None;
        for (index, child) in node.children().iter().enumerate() {
            match child.kind() {
                SyntaxKind::TypeRef => {
                    let typed = self.type_ref(child);
                    ty = typed.ty().cloned();
                    children.push(typed);
                }
                SyntaxKind::Ellipsis => {
                    varargs = true;
                    children.push(child.clone());
                }
                SyntaxKind::Ident if name_index.is_none() => {
                    name_index = Some(index);
                    children.push(child.clone());
                }
                _ => children.push(self.child(node, index, child)),
            }
        }
        let node = node.with_children(children);
        let Some(index) = name_index else {
            return node;
        };
        let mut ty = ty.map(|ty| with_dimensions(ty, &node));
        if varargs {
            ty = ty.map(|ty| JavaType::Array(Box::new(ty)));
        }
        let name = node.children()[index].text().unwrap_or_default().to_string();
        self.declare_local(&name, ty.clone());
        let variable = JavaType::Variable(VariableType {
            name,
            owner: None,
            ty: ty.map(Box::new),
        });
        let name_node = node.children()[index].with_type(variable);
        node.with_child(index, name_node)
    }

    /// Local variable or field declaration; `owner` is set for fields
    fn variable_decl(&mut self, node: &Node, owner: Option<TypeSignature>) -> Node {
        let mut declared = None;
        let mut infer = false;
        let mut children = Vec::with_capacity(node.children().len());
        for (index, child) in node.children().iter().enumerate() {
            match child.kind() {
                SyntaxKind::TypeRef => {
                    infer = owner.is_none() && is_var_type(child);
                    let typed = self.type_ref(child);
                    declared = typed.ty().cloned();
                    children.push(typed);
                }
                SyntaxKind::VarDeclarator => {
                    children.push(self.declarator(child, declared.as_ref(), infer, owner.as_ref()))
                }
                _ => children.push(self.child(node, index, child)),
            }
        }
        node.with_children(children)
    }

    fn declarator(
        &mut self,
        node: &Node,
        declared: Option<&JavaType>,
        infer: bool,
        owner: Option<&TypeSignature>,
    ) -> Node {
        let node = self.children(node);
        let ty = if infer {
            node.children()
                .iter()
                .skip_while(|c| c.kind() != SyntaxKind::Eq)
                .nth(1)
                .and_then(Node::ty)
                .and_then(JavaType::value_type)
                .filter(|ty| **ty != JavaType::Null)
                .cloned()
        } else {
            declared.cloned().map(|ty| with_dimensions(ty, &node))
        };
        let Some(index) = node
            .children()
            .iter()
            .position(|c| c.kind() == SyntaxKind::Ident)
        else {
            return node;
        };
        let name = node.children()[index].text().unwrap_or_default().to_string();
        if owner.is_none() {
            self.declare_local(&name, ty.clone());
        }
        let variable = JavaType::Variable(VariableType {
            name,
            owner: owner.cloned(),
            ty: ty.map(Box::new),
        });
        let name_node = node.children()[index].with_type(variable);
        node.with_child(index, name_node)
    }

    fn annotation(&mut self, node: &Node) -> Node {
        let mut children = Vec::with_capacity(node.children().len());
        for (index, child) in node.children().iter().enumerate() {
            let child = if child.kind() == SyntaxKind::QualifiedName && child.children().len() == 1 {
                let name = &child.children()[0];
                match name.text().and_then(|text| self.resolve_type_name(text)) {
                    Some(sig) => child.with_child(0, name.with_type(JavaType::Class(sig))),
                    None => child.clone(),
                }
            } else {
                self.child(node, index, child)
            };
            children.push(child);
        }
        node.with_children(children)
    }

    /// Binary expression; the binding of `x instanceof T name` is declared
    fn binary(&mut self, node: &Node) -> Node {
        let mut children: Vec<Node> = Vec::with_capacity(node.children().len());
        for (index, child) in node.children().iter().enumerate() {
            let binding_type = children
                .last()
                .filter(|prev| prev.kind() == SyntaxKind::TypeRef && child.kind() == SyntaxKind::Ident)
                .map(|prev| prev.ty().cloned());
            let child = match binding_type {
                Some(ty) => {
                    let name = child.text().unwrap_or_default().to_string();
                    self.declare_local(&name, ty.clone());
                    child.with_type(JavaType::Variable(VariableType {
                        name,
                        owner: None,
                        ty: ty.map(Box::new),
                    }))
                }
                None => self.child(node, index, child),
            };
            children.push(child);
        }
        node.with_children(children)
    }

    // ------------------------------------------------------------------
    // Names and expressions
    // ------------------------------------------------------------------

    fn declare_local(&mut self, name: &str, ty: Option<JavaType>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.locals.insert(name.to_string(), ty);
        }
    }

    fn resolve_type_name(&self, name: &str) -> Option<TypeSignature> {
        if self.scopes.iter().any(|s| s.type_params.contains(name)) {
            return Some(TypeSignature::new(name));
        }
        self.file.resolve(name, self.classpath).map(TypeSignature::new)
    }

    fn superclass(&self) -> Option<&str> {
        let class = self.class_stack.last()?;
        self.classes.get(class)?.superclass.as_deref()
    }

    /// Field `name` of `class` or one of its superclasses declared in the file
    fn lookup_field(&self, class: &str, name: &str) -> Option<(String, Option<JavaType>)> {
        let mut current = Some(class.to_string());
        let mut seen = HashSet::new();
        while let Some(class) = current {
            if !seen.insert(class.clone()) {
                break;
            }
            let info = self.classes.get(&class)?;
            if let Some(ty) = info.fields.get(name) {
                return Some((class, ty.clone()));
            }
            current = info.superclass.clone();
        }
        None
    }

    /// Declaring class and static flag of method `name` visible in `class`
    fn lookup_method(&self, class: &str, name: &str) -> Option<(String, bool)> {
        let mut current = Some(class.to_string());
        let mut seen = HashSet::new();
        while let Some(class) = current {
            if !seen.insert(class.clone()) {
                break;
            }
            let info = self.classes.get(&class)?;
            if let Some(is_static) = info.methods.get(name) {
                return Some((class, *is_static));
            }
            current = info.superclass.clone();
        }
        None
    }

    /// Owner of a member reachable through `import static Owner.*`
    fn static_on_demand_owner(&self, member: &str) -> Option<&String> {
        let mut owners = self
            .file
            .static_on_demand
            .iter()
            .filter(|owner| self.classpath.has_static_member(owner, member));
        match (owners.next(), owners.next()) {
            (Some(owner), None) => Some(owner),
            _ => None,
        }
    }

    /// Simple name in expression position
    fn name(&self, ident: &Node) -> Node {
        let Some(name) = ident.text() else {
            return ident.clone();
        };
        match self.name_type(name) {
            Some(ty) => ident.with_type(ty),
            None => {
                trace!("unresolved name `{name}`");
                ident.clone()
            }
        }
    }

    fn name_type(&self, name: &str) -> Option<JavaType> {
        let variable = |owner: Option<&str>, ty: Option<JavaType>| {
            JavaType::Variable(VariableType {
                name: name.to_string(),
                owner: owner.map(TypeSignature::new),
                ty: ty.map(Box::new),
            })
        };
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.locals.get(name) {
                return Some(variable(None, ty.clone()));
            }
        }
        for class in self.class_stack.iter().rev() {
            if let Some((owner, ty)) = self.lookup_field(class, name) {
                return Some(variable(Some(owner.as_str()), ty));
            }
        }
        if let Some(owner) = self.file.static_single.get(name) {
            return Some(variable(Some(owner.as_str()), None));
        }
        if let Some(owner) = self.static_on_demand_owner(name) {
            return Some(variable(Some(owner.as_str()), None));
        }
        self.resolve_type_name(name).map(JavaType::Class)
    }

    fn typed(&self, node: Node) -> Node {
        match self.expression_type(&node) {
            Some(ty) => node.with_type(ty),
            None => node,
        }
    }

    fn expression_type(&self, node: &Node) -> Option<JavaType> {
        let children = node.children();
        match node.kind() {
            SyntaxKind::MethodInvocation => self.invocation_type(node),
            SyntaxKind::FieldAccess => self.field_access_type(node),
            SyntaxKind::NewClass => node
                .child_of_kind(SyntaxKind::TypeRef)
                .and_then(Node::ty)
                .filter(|ty| matches!(ty, JavaType::Class(_)))
                .cloned(),
            SyntaxKind::Parens => children.get(1).and_then(value_type),
            SyntaxKind::Cast => node.child_of_kind(SyntaxKind::TypeRef).and_then(Node::ty).cloned(),
            SyntaxKind::Assignment => children.first().and_then(value_type),
            SyntaxKind::ArrayAccess => match children.first().and_then(value_type)? {
                JavaType::Array(element) => Some(*element),
                _ => None,
            },
            SyntaxKind::Unary => {
                let operator = children.iter().find(|c| is_operator(c))?;
                if operator.kind() == SyntaxKind::Bang {
                    return Some(JavaType::Primitive(Primitive::Boolean));
                }
                let operand = children.iter().find(|c| !is_operator(c))?;
                match value_type(operand)? {
                    JavaType::Primitive(p) if p.is_numeric() => Some(JavaType::Primitive(promote(p, Primitive::Int))),
                    _ => None,
                }
            }
            SyntaxKind::Binary => binary_type(node),
            SyntaxKind::Conditional => {
                let branches: Vec<&Node> = children.iter().filter(|c| !is_operator(c)).collect();
                let (then, otherwise) = (value_type(branches.get(1)?)?, value_type(branches.get(2)?)?);
                match (then, otherwise) {
                    (a, b) if a == b => Some(a),
                    (JavaType::Null, other) | (other, JavaType::Null) => Some(other),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn invocation_type(&self, node: &Node) -> Option<JavaType> {
        let call = MethodInvocation::cast(node.clone())?;
        let name = call.name()?;
        let method = match call.select() {
            Some(select) if is_type_name(select) => {
                let owner = select.ty().and_then(JavaType::as_class)?;
                MethodType::new(owner.erasure(), name, true)
            }
            Some(select) => {
                let owner = value_type(select)?;
                MethodType::new(owner.as_class()?.erasure(), name, false)
            }
            None => {
                if matches!(
                    node.children().first().map(Node::kind),
                    Some(SyntaxKind::ThisKw | SyntaxKind::SuperKw)
                ) {
                    return None;
                }
                match self.unqualified_method(&name) {
                    Some(method) => method,
                    None => {
                        trace!("unresolved method invocation `{name}`");
                        return None;
                    }
                }
            }
        };
        Some(JavaType::Method(method))
    }

    fn unqualified_method(&self, name: &str) -> Option<MethodType> {
        for class in self.class_stack.iter().rev() {
            if let Some((owner, is_static)) = self.lookup_method(class, name) {
                return Some(MethodType::new(TypeSignature::new(owner), name, is_static));
            }
        }
        if let Some(owner) = self.file.static_single.get(name) {
            return Some(MethodType::new(TypeSignature::new(owner.as_str()), name, true));
        }
        let owner = self.static_on_demand_owner(name)?;
        Some(MethodType::new(TypeSignature::new(owner.as_str()), name, true))
    }

    fn field_access_type(&self, node: &Node) -> Option<JavaType> {
        let children = node.children();
        let target = children.first()?;
        let member = children.get(2)?;
        match member.kind() {
            SyntaxKind::ClassKw => return Some(JavaType::class("java.lang.Class")),
            SyntaxKind::ThisKw => return target.ty().filter(|_| is_type_name(target)).cloned(),
            SyntaxKind::Ident => {}
            _ => return None,
        }
        let name = member.text()?;

        if is_type_name(target) {
            let owner = target.ty().and_then(JavaType::as_class)?.qualified_name();
            let nested = format!("{owner}.{name}");
            if self.classes.contains_key(&nested) || self.classpath.contains_type(&nested) {
                return Some(JavaType::class(nested));
            }
            if let Some((owner, ty)) = self.lookup_field(owner, name) {
                return Some(member_variable(name, &owner, ty));
            }
            if self.classpath.has_static_member(owner, name) {
                return Some(member_variable(name, owner, None));
            }
            return None;
        }

        if target.ty().is_none() {
            // a.b.C written out in full
            let dotted = format!("{}.{name}", dotted_name(target)?);
            if self.classes.contains_key(&dotted) || self.classpath.contains_type(&dotted) {
                return Some(JavaType::class(dotted));
            }
            return None;
        }

        match value_type(target)? {
            JavaType::Array(_) if name == "length" => Some(JavaType::Primitive(Primitive::Int)),
            JavaType::Class(sig) => {
                let (owner, ty) = self.lookup_field(sig.qualified_name(), name)?;
                Some(member_variable(name, &owner, ty))
            }
            _ => None,
        }
    }
}

fn member_variable(name: &str, owner: &str, ty: Option<JavaType>) -> JavaType {
    JavaType::Variable(VariableType {
        name: name.to_string(),
        owner: Some(TypeSignature::new(owner)),
        ty: ty.map(Box::new),
    })
}

/// Identifier (or dotted chain) in a position where it is evaluated
fn is_expression_name(parent: &Node, index: usize) -> bool {
    let children = parent.children();
    match parent.kind() {
        SyntaxKind::ExprStmt
        | SyntaxKind::ReturnStmt
        | SyntaxKind::IfStmt
        | SyntaxKind::WhileStmt
        | SyntaxKind::ThrowStmt
        | SyntaxKind::ArgList
        | SyntaxKind::Parens
        | SyntaxKind::Cast
        | SyntaxKind::Unary
        | SyntaxKind::Binary
        | SyntaxKind::Assignment
        | SyntaxKind::Conditional
        | SyntaxKind::ArrayAccess => true,
        SyntaxKind::VarDeclarator => children[..index].iter().any(|c| c.kind() == SyntaxKind::Eq),
        // annotation element default value
        SyntaxKind::MethodDecl => children[..index]
            .iter()
            .any(|c| c.kind() == SyntaxKind::DefaultKw),
        SyntaxKind::MethodInvocation => {
            index == 0 && children.get(1).is_some_and(|c| c.kind() == SyntaxKind::Dot)
        }
        SyntaxKind::FieldAccess => index == 0,
        _ => false,
    }
}

/// A name that denotes a type rather than a value
fn is_type_name(node: &Node) -> bool {
    matches!(node.kind(), SyntaxKind::Ident | SyntaxKind::FieldAccess)
        && matches!(node.ty(), Some(JavaType::Class(_)))
}

fn is_operator(node: &Node) -> bool {
    node.is_token()
        && !node.kind().is_literal()
        && !matches!(
            node.kind(),
            SyntaxKind::Ident | SyntaxKind::ThisKw | SyntaxKind::SuperKw
        )
}

fn is_string(ty: Option<&JavaType>) -> bool {
    ty.and_then(JavaType::as_class)
        .is_some_and(|sig| sig.qualified_name() == STRING)
}

/// `a.b.c` of untyped identifiers
fn dotted_name(node: &Node) -> Option<String> {
    match node.kind() {
        SyntaxKind::Ident => node.text().map(str::to_string),
        SyntaxKind::FieldAccess => {
            let children = node.children();
            let target = dotted_name(children.first()?)?;
            let member = children.get(2).filter(|c| c.kind() == SyntaxKind::Ident)?;
            Some(format!("{target}.{}", member.text()?))
        }
        _ => None,
    }
}

fn value_type(node: &Node) -> Option<JavaType> {
    node.ty().and_then(JavaType::value_type).cloned()
}

fn literal_type(token: &Node) -> Option<JavaType> {
    let text = token.text()?;
    let primitive = match token.kind() {
        SyntaxKind::IntLiteral if text.ends_with(['l', 'L']) => Primitive::Long,
        SyntaxKind::IntLiteral => Primitive::Int,
        SyntaxKind::FloatLiteral if text.ends_with(['f', 'F']) => Primitive::Float,
        SyntaxKind::FloatLiteral => Primitive::Double,
        SyntaxKind::CharLiteral => Primitive::Char,
        SyntaxKind::TrueKw | SyntaxKind::FalseKw => Primitive::Boolean,
        SyntaxKind::StringLiteral => return Some(JavaType::class(STRING)),
        SyntaxKind::NullKw => return Some(JavaType::Null),
        _ => return None,
    };
    Some(JavaType::Primitive(primitive))
}

/// Binary numeric promotion
fn promote(a: Primitive, b: Primitive) -> Primitive {
    let rank = |p: Primitive| match p {
        Primitive::Double => 4,
        Primitive::Float => 3,
        Primitive::Long => 2,
        _ => 1,
    };
    match rank(a).max(rank(b)) {
        4 => Primitive::Double,
        3 => Primitive::Float,
        2 => Primitive::Long,
        _ => Primitive::Int,
    }
}

fn binary_type(node: &Node) -> Option<JavaType> {
    let children = node.children();
    let operators: Vec<SyntaxKind> = children
        .iter()
        .skip(1)
        .take_while(|c| is_operator(c))
        .map(Node::kind)
        .collect();
    let boolean = JavaType::Primitive(Primitive::Boolean);
    let lhs = children.first().and_then(value_type);
    let rhs = children.last().and_then(value_type);
    if operators.len() > 1 {
        // shift: type of the promoted left operand
        return match lhs? {
            JavaType::Primitive(p) if p.is_numeric() => Some(JavaType::Primitive(promote(p, Primitive::Int))),
            _ => None,
        };
    }
    let operator = *operators.first()?;
    match operator {
        SyntaxKind::InstanceofKw
        | SyntaxKind::EqEq
        | SyntaxKind::BangEq
        | SyntaxKind::Lt
        | SyntaxKind::Gt
        | SyntaxKind::LtEq
        | SyntaxKind::GtEq
        | SyntaxKind::AmpAmp
        | SyntaxKind::PipePipe => Some(boolean),
        SyntaxKind::Plus if is_string(lhs.as_ref()) || is_string(rhs.as_ref()) => {
            Some(JavaType::class(STRING))
        }
        SyntaxKind::Amp | SyntaxKind::Pipe | SyntaxKind::Caret
            if lhs.as_ref() == Some(&boolean) && rhs.as_ref() == Some(&boolean) =>
        {
            Some(boolean)
        }
        SyntaxKind::Plus
        | SyntaxKind::Minus
        | SyntaxKind::Star
        | SyntaxKind::Slash
        | SyntaxKind::Percent
        | SyntaxKind::Amp
        | SyntaxKind::Pipe
        | SyntaxKind::Caret => match (lhs?, rhs?) {
            (JavaType::Primitive(a), JavaType::Primitive(b)) if a.is_numeric() && b.is_numeric() => {
                Some(JavaType::Primitive(promote(a, b)))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Names declared by a `TypeParams` child
fn type_param_names(decl: &Node) -> HashSet<String> {
    decl.child_of_kind(SyntaxKind::TypeParams)
        .map(|params| {
            params
                .children()
                .iter()
                .filter(|c| c.kind() == SyntaxKind::Ident)
                .filter_map(|c| c.text().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn declared_name(declarator: &Node) -> Option<String> {
    declarator
        .child_of_kind(SyntaxKind::Ident)
        .and_then(Node::text)
        .map(str::to_string)
}

fn is_var_type(type_ref: &Node) -> bool {
    let children = type_ref.children();
    children.len() == 1 && children[0].text() == Some("var")
}

/// Wrap `ty` in one array level per `[]` pair directly under `node`
fn with_dimensions(ty: JavaType, node: &Node) -> JavaType {
    let dimensions = node
        .children()
        .iter()
        .filter(|c| c.kind() == SyntaxKind::LBracket)
        .count();
    (0..dimensions).fold(ty, |ty, _| JavaType::Array(Box::new(ty)))
}

/// Type a `TypeRef` denotes, with `resolve` answering simple type names
fn type_of_type_ref(
    node: &Node,
    resolve: &dyn Fn(&str) -> Option<TypeSignature>,
) -> Option<JavaType> {
    let children = node.children();
    if children.first().map(Node::kind) == Some(SyntaxKind::VoidKw) {
        return Some(JavaType::Primitive(Primitive::Void));
    }
    let segments: Vec<&str> = children
        .iter()
        .filter(|c| c.kind() == SyntaxKind::Ident)
        .filter_map(Node::text)
        .collect();
    let (first, rest) = segments.split_first()?;

    let base = if rest.is_empty() {
        if *first == "var" {
            return None;
        }
        if let Some(primitive) = Primitive::from_keyword(first) {
            return Some(with_dimensions(JavaType::Primitive(primitive), node));
        }
        resolve(first)?
    } else {
        match resolve(first) {
            // Outer.Inner
            Some(outer) => TypeSignature::new(format!("{}.{}", outer.qualified_name(), rest.join("."))),
            // a fully qualified name, trusted when it looks like one
            None if first.starts_with(|c: char| c.is_ascii_lowercase()) => {
                TypeSignature::new(segments.join("."))
            }
            None => return None,
        }
    };

    let parameters = node
        .child_of_kind(SyntaxKind::TypeArgs)
        .and_then(|args| type_arguments(args, resolve))
        .unwrap_or_default();
    let class = JavaType::Class(base.erasure().with_parameters(parameters));
    Some(with_dimensions(class, node))
}

/// Resolved type arguments; `None` when any is a wildcard or unknown
fn type_arguments(
    args: &Node,
    resolve: &dyn Fn(&str) -> Option<TypeSignature>,
) -> Option<Vec<TypeSignature>> {
    if args.child_of_kind(SyntaxKind::Question).is_some() {
        return None;
    }
    args.children()
        .iter()
        .filter(|c| c.kind() == SyntaxKind::TypeRef)
        .map(|arg| type_of_type_ref(arg, resolve).and_then(|ty| ty.signature()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse_java;
    use crate::lower::lower;
    use recast_core::tree::ast::{FieldAccess, NewClass};

    fn attributed(source: &str, classpath: &ClasspathConfig) -> Node {
        let (cst, errors) = parse_java(source);
        assert!(errors.is_empty(), "{errors:?}");
        attribute(&lower(&cst), classpath)
    }

    fn calls(tree: &Node) -> Vec<MethodInvocation> {
        tree.descendants().filter_map(MethodInvocation::cast).collect()
    }

    fn call_named(tree: &Node, name: &str) -> MethodType {
        calls(tree)
            .into_iter()
            .find(|c| c.name().as_deref() == Some(name))
            .and_then(|c| c.method_type().cloned())
            .unwrap_or_else(|| panic!("no typed call to {name}"))
    }

    fn ident_type(tree: &Node, text: &str, nth: usize) -> Option<JavaType> {
        tree.descendants()
            .filter(|n| n.kind() == SyntaxKind::Ident && n.text() == Some(text))
            .nth(nth)
            .and_then(|n| n.ty().cloned())
    }

    const MOCK_UTIL: &str = "org.mockito.internal.util.MockUtil";
    const ASSERTIONS: &str = "org.junit.jupiter.api.Assertions";

    #[test]
    fn test_instance_and_static_calls() {
        let source = r#"
import org.mockito.internal.util.MockUtil;

class T {
    void m() {
        new MockUtil().isMock("x");
        MockUtil util = new MockUtil();
        util.isMock("y");
        MockUtil.isMock("z");
    }
}
"#;
        let tree = attributed(source, &ClasspathConfig::default());
        let calls = calls(&tree);
        assert_eq!(calls.len(), 3);
        let forms: Vec<(String, bool)> = calls
            .iter()
            .map(|c| {
                let method = c.method_type().unwrap();
                (method.declaring_type.qualified_name().to_string(), method.static_call)
            })
            .collect();
        assert_eq!(
            forms,
            vec![
                (MOCK_UTIL.to_string(), false),
                (MOCK_UTIL.to_string(), false),
                (MOCK_UTIL.to_string(), true),
            ]
        );
        let new = tree.descendants().find_map(NewClass::cast).unwrap();
        assert_eq!(new.syntax().ty(), Some(&JavaType::class(MOCK_UTIL)));
    }

    #[test]
    fn test_static_import_calls_and_argument_types() {
        let source = r#"
import static org.junit.jupiter.api.Assertions.assertEquals;

class T {
    void m(String s) {
        assertEquals(s, null);
    }
}
"#;
        let tree = attributed(source, &ClasspathConfig::default());
        let method = call_named(&tree, "assertEquals");
        assert_eq!(method.declaring_type.qualified_name(), ASSERTIONS);
        assert!(method.static_call);

        let call = calls(&tree).remove(0);
        let args = call.args().unwrap().args();
        assert_eq!(
            args[0].ty().and_then(JavaType::value_type),
            Some(&JavaType::class("java.lang.String"))
        );
        assert_eq!(args[1].ty(), Some(&JavaType::Null));
    }

    #[test]
    fn test_static_on_demand_needs_classpath() {
        let source = "import static org.junit.jupiter.api.Assertions.*;\n\
                      class T { void m() { assertEquals(1, 2); } }\n";
        let without = attributed(source, &ClasspathConfig::default());
        assert!(calls(&without)[0].method_type().is_none());

        let classpath = ClasspathConfig::default().with_static_members(ASSERTIONS, ["assertEquals"]);
        let with = attributed(source, &classpath);
        assert_eq!(
            call_named(&with, "assertEquals").declaring_type.qualified_name(),
            ASSERTIONS
        );
    }

    #[test]
    fn test_on_demand_types_resolve_only_through_classpath() {
        let source = "import java.util.*;\nclass T { List<String> xs; }\n";
        let without = attributed(source, &ClasspathConfig::default());
        assert_eq!(ident_type(&without, "List", 0), None);

        let classpath = ClasspathConfig::default().with_type("java.util.List");
        let with = attributed(source, &classpath);
        assert_eq!(ident_type(&with, "List", 0), Some(JavaType::class("java.util.List")));
        let field = with
            .descendants()
            .find(|n| n.kind() == SyntaxKind::TypeRef)
            .unwrap();
        assert_eq!(
            field.ty().map(ToString::to_string).as_deref(),
            Some("java.util.List<java.lang.String>")
        );
    }

    #[test]
    fn test_unresolved_sites_stay_unannotated() {
        let source = "class T { void m() { helper(x); unknown.call(); } }\n";
        let tree = attributed(source, &ClasspathConfig::default());
        assert!(calls(&tree).iter().all(|c| c.method_type().is_none()));
        assert_eq!(ident_type(&tree, "x", 0), None);
        assert_eq!(ident_type(&tree, "unknown", 0), None);
    }

    #[test]
    fn test_locals_fields_and_own_methods() {
        let source = r#"
package p;

class T {
    static int count;
    String name;

    static void reset() {}

    void m(int[] values) {
        var copy = name;
        long total = count + values.length;
        reset();
        this.name = copy;
    }
}
"#;
        let tree = attributed(source, &ClasspathConfig::default());
        let count = ident_type(&tree, "count", 1).unwrap();
        let count = count.as_variable().unwrap();
        assert_eq!(count.owner, Some(TypeSignature::new("p.T")));
        assert_eq!(count.ty.as_deref(), Some(&JavaType::Primitive(Primitive::Int)));

        let copy = ident_type(&tree, "copy", 1).unwrap();
        assert_eq!(
            copy.value_type(),
            Some(&JavaType::class("java.lang.String"))
        );

        let reset = call_named(&tree, "reset");
        assert_eq!(reset.declaring_type.qualified_name(), "p.T");
        assert!(reset.static_call);

        let length = tree
            .descendants()
            .filter_map(FieldAccess::cast)
            .find(|f| f.name().as_deref() == Some("length"))
            .unwrap();
        assert_eq!(length.syntax().ty(), Some(&JavaType::Primitive(Primitive::Int)));
    }

    #[test]
    fn test_annotations_and_qualified_types() {
        let source = "import org.junit.jupiter.api.Test;\n\
                      class T { @Test void m() { org.junit.jupiter.api.Assertions.fail(); } }\n";
        let classpath = ClasspathConfig::default().with_type(ASSERTIONS);
        let tree = attributed(source, &classpath);
        assert_eq!(
            ident_type(&tree, "Test", 1),
            Some(JavaType::class("org.junit.jupiter.api.Test"))
        );
        let fail = call_named(&tree, "fail");
        assert_eq!(fail.declaring_type.qualified_name(), ASSERTIONS);
        assert!(fail.static_call);
    }

    #[test]
    fn test_type_parameters_are_not_imported_types() {
        let source = "class Box<T> { T value; <R> R map(R r) { return r; } }\n";
        let tree = attributed(source, &ClasspathConfig::default());
        assert_eq!(ident_type(&tree, "T", 1), Some(JavaType::class("T")));
        assert_eq!(ident_type(&tree, "R", 1), Some(JavaType::class("R")));
    }
}
