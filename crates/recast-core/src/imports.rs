//! Import list reconciliation
//!
//! After the recipes have run, the import list is brought in line with what
//! the final tree references:
//!
//! - a type referenced by simple name that is neither in `java.lang`, in the
//!   file's package, declared in the file, nor covered by an existing
//!   single-type or on-demand import gets a single-type import;
//! - a static method called (or static field read) by simple name through
//!   a static import that no longer exists gets a single static import;
//! - imports nothing references are removed, except those listed in
//!   `preserveImports`. On-demand imports are only removed when every name
//!   in the file is resolved, since an unresolved name may come through them.
//!
//! When imports are added, the list is put in sorted order (regular before
//! static, then by name) and kept imports keep their formatting. When
//! imports are only removed, the remaining ones stay where they are.

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::tree::ast::{AstNode, ClassDecl, CompilationUnit, Import, MethodInvocation};
use crate::tree::{JavaType, Node, SyntaxKind, make};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Result of [`reconcile_imports_with`]
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub tree: Node,
    /// Added imports, as written after `import`
    pub added: Vec<String>,
    /// Removed imports, as written after `import`
    pub removed: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Reconcile with the default configuration, returning only the tree
pub fn reconcile_imports(tree: &Node) -> Node {
    reconcile_imports_with(tree, &EngineConfig::default()).tree
}

/// Add missing and remove unused imports of a compilation unit
///
/// Trees that are not a compilation unit are returned unchanged.
pub fn reconcile_imports_with(tree: &Node, config: &EngineConfig) -> ImportOutcome {
    let Some(unit) = CompilationUnit::cast(tree.clone()) else {
        return ImportOutcome {
            tree: tree.clone(),
            added: Vec::new(),
            removed: Vec::new(),
            diagnostics: Vec::new(),
        };
    };
    Reconciler::new(&unit, config).run()
}

/// Names the final tree refers to
#[derive(Debug, Default)]
struct References {
    /// Qualified names of types referenced by simple name
    types: BTreeSet<String>,
    /// `(owner, member)` used without qualification
    statics: BTreeSet<(String, String)>,
    /// A simple name no import can be ruled out for
    unresolved_types: bool,
    /// An unqualified call or name that may come from a static import
    unresolved_statics: bool,
    /// Identifiers inside unparsed regions
    opaque: HashSet<String>,
}

impl References {
    fn collect(root: &Node) -> Self {
        let mut refs = References::default();
        for child in root.children() {
            refs.visit(child, root, 0, false);
        }
        refs
    }

    fn visit(&mut self, node: &Node, parent: &Node, index: usize, in_annotation: bool) {
        match node.kind() {
            SyntaxKind::Import | SyntaxKind::PackageDecl => return,
            SyntaxKind::Error => {
                self.opaque.extend(
                    node.descendants()
                        .filter(|n| n.kind() == SyntaxKind::Ident)
                        .filter_map(|n| n.text().map(str::to_string)),
                );
                return;
            }
            SyntaxKind::Ident => self.ident(node, parent, index, in_annotation),
            SyntaxKind::MethodInvocation => self.call(node),
            SyntaxKind::Annotation => self.annotation(node),
            _ => {}
        }
        let in_annotation = in_annotation || node.kind() == SyntaxKind::Annotation;
        for (index, child) in node.children().iter().enumerate() {
            self.visit(child, node, index, in_annotation);
        }
    }

    fn ident(&mut self, node: &Node, parent: &Node, index: usize, in_annotation: bool) {
        match node.ty() {
            Some(JavaType::Class(sig)) => {
                if !sig.package_name().is_empty() {
                    self.types.insert(sig.qualified_name().to_string());
                }
            }
            Some(JavaType::Variable(variable)) => {
                if let Some(owner) = &variable.owner
                    && is_name_reference(node, parent, index, in_annotation)
                {
                    self.statics
                        .insert((owner.qualified_name().to_string(), variable.name.clone()));
                }
            }
            Some(_) => {}
            None => {
                if is_name_reference(node, parent, index, in_annotation) {
                    self.unresolved_types = true;
                    // a bare expression name may be a statically imported field
                    if parent.kind() != SyntaxKind::TypeRef {
                        self.unresolved_statics = true;
                    }
                }
            }
        }
    }

    fn call(&mut self, node: &Node) {
        let Some(call) = MethodInvocation::cast(node.clone()) else {
            return;
        };
        if call.select().is_some() {
            return;
        }
        match call.method_type() {
            Some(method) if method.static_call => {
                self.statics.insert((
                    method.declaring_type.qualified_name().to_string(),
                    method.name.clone(),
                ));
            }
            Some(_) => {}
            None => self.unresolved_statics = true,
        }
    }

    fn annotation(&mut self, node: &Node) {
        let Some(name) = node.child_of_kind(SyntaxKind::QualifiedName) else {
            return;
        };
        if name.children().len() == 1 && name.children()[0].ty().is_none() {
            self.unresolved_types = true;
        }
    }
}

/// Identifier in a position where it names a type, variable or field
/// (rather than declaring one, or naming a member of a qualified access)
fn is_name_reference(node: &Node, parent: &Node, index: usize, in_annotation: bool) -> bool {
    match parent.kind() {
        SyntaxKind::TypeRef => {
            index == 0 && parent.ty().is_none() && node.text() != Some("var")
        }
        SyntaxKind::MethodInvocation => MethodInvocation::cast(parent.clone())
            .and_then(|call| call.select().map(|select| select.ptr_eq(node)))
            .unwrap_or(false),
        SyntaxKind::FieldAccess => index == 0,
        // element names of annotation arguments
        SyntaxKind::Assignment if in_annotation => index != 0,
        // the declared name is not a reference, the initializer after `=` is
        SyntaxKind::VarDeclarator => parent.children()[..index]
            .iter()
            .any(|c| c.kind() == SyntaxKind::Eq),
        SyntaxKind::ClassDecl
        | SyntaxKind::MethodDecl
        | SyntaxKind::Param
        | SyntaxKind::EnumConstants
        | SyntaxKind::TypeParams
        | SyntaxKind::QualifiedName
        | SyntaxKind::Modifiers
        | SyntaxKind::Annotation
        | SyntaxKind::OtherStmt => false,
        _ => true,
    }
}

/// Qualified names of all classes declared in the file, nested ones included
fn declared_types(unit: &CompilationUnit, package: Option<&str>) -> BTreeSet<String> {
    fn walk(decl: &ClassDecl, prefix: &str, out: &mut BTreeSet<String>) {
        let Some(name) = decl.name() else {
            return;
        };
        let qualified = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };
        for member in decl.members() {
            if let Some(nested) = ClassDecl::cast(member.clone()) {
                walk(&nested, &qualified, out);
            }
        }
        out.insert(qualified);
    }

    let mut out = BTreeSet::new();
    for decl in unit.types() {
        walk(&decl, package.unwrap_or_default(), &mut out);
    }
    out
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

fn package_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or("", |(package, _)| package)
}

/// `[static ]name[.*]`
fn describe(import: &Import) -> String {
    let (is_static, name) = import.sort_key();
    if is_static {
        format!("static {name}")
    } else {
        name
    }
}

/// An import in the final list
struct Entry {
    node: Node,
    key: (bool, String),
    /// Index among the original imports, `None` for added ones
    original: Option<usize>,
}

struct Reconciler<'a> {
    unit: &'a CompilationUnit,
    config: &'a EngineConfig,
    package: Option<String>,
    declared: BTreeSet<String>,
    refs: References,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Reconciler<'a> {
    fn new(unit: &'a CompilationUnit, config: &'a EngineConfig) -> Self {
        let package = unit.package_name();
        let declared = declared_types(unit, package.as_deref());
        let refs = References::collect(unit.syntax());
        Self {
            unit,
            config,
            package,
            declared,
            refs,
            diagnostics: Vec::new(),
        }
    }

    fn is_declared(&self, qualified: &str) -> bool {
        self.declared.contains(qualified)
            || self
                .declared
                .iter()
                .any(|d| qualified.starts_with(d.as_str()) && qualified[d.len()..].starts_with('.'))
    }

    fn is_preserved(&self, import: &Import) -> bool {
        let name = import.name();
        let wildcard = format!("{name}.*");
        self.config
            .preserve_imports
            .iter()
            .any(|p| *p == name || *p == wildcard)
    }

    /// Types referenced by simple name that need an import at all
    fn importable_types(&self) -> Vec<&String> {
        self.refs
            .types
            .iter()
            .filter(|t| {
                let package = package_of(t);
                package != "java.lang"
                    && Some(package) != self.package.as_deref()
                    && !self.is_declared(t)
            })
            .collect()
    }

    fn importable_statics(&self) -> Vec<&(String, String)> {
        self.refs
            .statics
            .iter()
            .filter(|(owner, _)| !self.is_declared(owner))
            .collect()
    }

    fn is_used(&self, import: &Import) -> bool {
        let name = import.name();
        let opaque = !self.refs.opaque.is_empty();
        match (import.is_static(), import.is_on_demand()) {
            (false, false) => {
                self.refs.types.contains(&name)
                    || self.refs.opaque.contains(simple_name(&name))
            }
            (false, true) => {
                self.refs.unresolved_types
                    || opaque
                    || self.refs.types.iter().any(|t| package_of(t) == name)
            }
            (true, false) => {
                let member = simple_name(&name);
                self.refs
                    .statics
                    .contains(&(package_of(&name).to_string(), member.to_string()))
                    || self.refs.opaque.contains(member)
            }
            (true, true) => {
                self.refs.unresolved_statics
                    || opaque
                    || self.refs.statics.iter().any(|(owner, _)| *owner == name)
            }
        }
    }

    fn run(mut self) -> ImportOutcome {
        let root = self.unit.syntax().clone();
        let originals: Vec<Import> = self.unit.imports().collect();

        // keep or drop existing imports
        let mut kept = Vec::new();
        let mut removed = Vec::new();
        for (index, import) in originals.iter().enumerate() {
            if self.is_used(import) || self.is_preserved(import) {
                kept.push(Entry {
                    node: import.syntax().clone(),
                    key: import.sort_key(),
                    original: Some(index),
                });
            } else {
                debug!("removing unused import {}", describe(import));
                removed.push(describe(import));
            }
        }
        let kept_imports: Vec<Import> = kept
            .iter()
            .filter_map(|e| Import::cast(e.node.clone()))
            .collect();

        let additions = self.additions(&kept_imports);
        if additions.is_empty() && removed.is_empty() {
            return ImportOutcome {
                tree: root,
                added: Vec::new(),
                removed,
                diagnostics: self.diagnostics,
            };
        }

        let mut added = Vec::new();
        let mut entries = kept;
        for (name, is_static) in additions {
            let node = make::import(&name, is_static, false);
            let key = (is_static, name);
            debug!(
                "adding import {}{}",
                if is_static { "static " } else { "" },
                key.1
            );
            added.push(if is_static {
                format!("static {}", key.1)
            } else {
                key.1.clone()
            });
            entries.push(Entry {
                node,
                key,
                original: None,
            });
        }
        // stable, so an already sorted list only gains the new entries
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let tree = self.rebuild(&root, &originals, entries);
        ImportOutcome {
            tree,
            added,
            removed,
            diagnostics: self.diagnostics,
        }
    }

    /// Imports to add, sorted, conflicts reported and skipped
    fn additions(&mut self, kept: &[Import]) -> Vec<(String, bool)> {
        // simple name -> qualified name of what that name already denotes
        let mut type_names: BTreeMap<String, String> = BTreeMap::new();
        for decl in &self.declared {
            type_names.insert(simple_name(decl).to_string(), decl.clone());
        }
        for import in kept.iter().filter(|i| !i.is_static() && !i.is_on_demand()) {
            let name = import.name();
            type_names.insert(simple_name(&name).to_string(), name);
        }

        let mut additions = Vec::new();
        let types: Vec<String> = self.importable_types().into_iter().cloned().collect();
        for ty in &types {
            let covered = kept.iter().any(|i| {
                !i.is_static()
                    && ((!i.is_on_demand() && i.name() == *ty)
                        || (i.is_on_demand() && i.name() == package_of(ty)))
            });
            if covered {
                continue;
            }
            let simple = simple_name(ty).to_string();
            match type_names.get(&simple) {
                Some(existing) if existing != ty => {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::ImportConflict,
                        format!("cannot import {ty}: `{simple}` already refers to {existing}"),
                    ));
                }
                _ => {
                    type_names.insert(simple, ty.clone());
                    additions.push((ty.clone(), false));
                }
            }
        }

        let mut member_names: BTreeMap<String, String> = BTreeMap::new();
        for (owner, member) in kept.iter().filter_map(Import::static_member) {
            member_names.insert(member, owner);
        }
        let statics: Vec<(String, String)> =
            self.importable_statics().into_iter().cloned().collect();
        for (owner, member) in statics {
            let covered = kept.iter().any(|i| {
                i.is_static()
                    && ((i.is_on_demand() && i.name() == owner)
                        || i.static_member().as_ref() == Some(&(owner.clone(), member.clone())))
            });
            if covered {
                continue;
            }
            match member_names.get(&member) {
                Some(existing) if *existing != owner => {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::ImportConflict,
                        format!(
                            "cannot statically import {owner}.{member}: `{member}` already comes from {existing}"
                        ),
                    ));
                }
                _ => {
                    member_names.insert(member.clone(), owner.clone());
                    additions.push((format!("{owner}.{member}"), true));
                }
            }
        }

        additions.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));
        additions
    }

    /// Put the final import list into the compilation unit
    fn rebuild(&self, root: &Node, originals: &[Import], entries: Vec<Entry>) -> Node {
        let children = root.children();
        let has_package = self.package.is_some();
        // a new section in a file without a package takes over the file header
        let first_leading = match originals.first() {
            Some(import) => Some(import.syntax().leading().to_string()),
            None if !has_package => children.first().map(|c| c.leading().to_string()),
            None => None,
        };
        let entries = format_entries(entries, originals, first_leading.as_deref(), has_package);

        let first_import = children.iter().position(|c| c.kind() == SyntaxKind::Import);
        let insert_at = first_import.unwrap_or_else(|| {
            children
                .iter()
                .position(|c| c.kind() == SyntaxKind::PackageDecl)
                .map_or(0, |p| p + 1)
        });

        let mut rebuilt = Vec::with_capacity(children.len() + entries.len());
        let mut imports = Some(entries);
        let mut after_imports = false;
        for (index, child) in children.iter().enumerate() {
            if index == insert_at
                && let Some(imports) = imports.take()
            {
                after_imports = !imports.is_empty();
                rebuilt.extend(imports);
            }
            if child.kind() == SyntaxKind::Import {
                continue;
            }
            let child = self.fix_following(
                child,
                &rebuilt,
                originals,
                after_imports,
                first_leading.as_deref(),
            );
            rebuilt.push(child);
            after_imports = false;
        }
        if let Some(imports) = imports.take() {
            rebuilt.extend(imports);
        }
        root.with_children(rebuilt)
    }

    /// Adjust the node right after the import section when the section
    /// appears or disappears in a file without a package declaration
    fn fix_following(
        &self,
        child: &Node,
        rebuilt: &[Node],
        originals: &[Import],
        after_imports: bool,
        first_leading: Option<&str>,
    ) -> Node {
        if self.package.is_some() || child.kind() == SyntaxKind::Error {
            return child.clone();
        }
        let section_now = rebuilt.iter().any(|n| n.kind() == SyntaxKind::Import);
        let is_first_decl = rebuilt.iter().all(|n| n.kind() == SyntaxKind::Import);
        if !is_first_decl {
            return child.clone();
        }
        match (originals.is_empty(), section_now) {
            // imports appeared in front of the first declaration
            (true, true) if after_imports => child.with_leading("\n\n"),
            // import section vanished: the declaration now starts the file
            (false, false) => child.with_leading(format!(
                "{}{}",
                first_leading.unwrap_or_default(),
                child.leading().trim_start()
            )),
            _ => child.clone(),
        }
    }
}

fn separator(prev_static: bool, is_static: bool) -> &'static str {
    if !prev_static && is_static {
        "\n\n"
    } else {
        "\n"
    }
}

fn is_blank_separator(leading: &str) -> bool {
    leading.chars().all(char::is_whitespace)
}

/// Assign leading formatting to the final import list
fn format_entries(
    entries: Vec<Entry>,
    originals: &[Import],
    first_leading: Option<&str>,
    has_package: bool,
) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(entries.len());
    let mut prev: Option<&Entry> = None;
    for (position, entry) in entries.iter().enumerate() {
        let node = if position == 0 {
            let leading = match (first_leading, has_package) {
                (Some(leading), _) => leading.to_string(),
                (None, true) => "\n\n".to_string(),
                (None, false) => String::new(),
            };
            entry.node.with_leading(leading)
        } else {
            let prev_entry = prev.map(|p| p.key.0).unwrap_or(false);
            let wanted = separator(prev_entry, entry.key.0);
            match entry.original {
                None => entry.node.with_leading(wanted),
                Some(0) => entry.node.with_leading(wanted),
                Some(index) => {
                    let previous_original = &originals[index - 1];
                    let neighbour_changed = prev.and_then(|p| p.original) != Some(index - 1);
                    let boundary_changed = previous_original.is_static() != prev_entry;
                    if neighbour_changed
                        && boundary_changed
                        && is_blank_separator(entry.node.leading())
                    {
                        entry.node.with_leading(wanted)
                    } else {
                        entry.node.clone()
                    }
                }
            }
        };
        nodes.push(node);
        prev = Some(entry);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Formatting, MethodType, TypeSignature};

    fn tok(kind: SyntaxKind, text: &str, leading: &str) -> Node {
        Node::token(kind, text).with_formatting(Formatting::leading(leading))
    }

    fn qualified(name: &str) -> Node {
        let mut children = Vec::new();
        for (index, segment) in name.split('.').enumerate() {
            if index > 0 {
                children.push(tok(SyntaxKind::Dot, ".", ""));
            }
            children.push(tok(SyntaxKind::Ident, segment, ""));
        }
        Node::new(SyntaxKind::QualifiedName, children).with_formatting(Formatting::leading(" "))
    }

    fn import(leading: &str, name: &str, is_static: bool) -> Node {
        let mut children = vec![tok(SyntaxKind::ImportKw, "import", "")];
        if is_static {
            children.push(tok(SyntaxKind::StaticKw, "static", " "));
        }
        children.push(qualified(name));
        children.push(tok(SyntaxKind::Semicolon, ";", ""));
        Node::new(SyntaxKind::Import, children).with_formatting(Formatting::leading(leading))
    }

    /// `class T { <body> }` where body is a single expression statement
    fn class_with(leading: &str, expr: Node) -> Node {
        let stmt = Node::new(
            SyntaxKind::ExprStmt,
            vec![expr, tok(SyntaxKind::Semicolon, ";", "")],
        )
        .with_formatting(Formatting::leading(" "));
        let block = Node::new(
            SyntaxKind::Block,
            vec![tok(SyntaxKind::LBrace, "{", ""), stmt, tok(SyntaxKind::RBrace, "}", " ")],
        )
        .with_formatting(Formatting::leading(" "));
        let method = Node::new(
            SyntaxKind::MethodDecl,
            vec![
                Node::new(SyntaxKind::TypeRef, vec![tok(SyntaxKind::VoidKw, "void", "")])
                    .with_formatting(Formatting::leading(" ")),
                tok(SyntaxKind::Ident, "m", " "),
                Node::new(
                    SyntaxKind::ParamList,
                    vec![tok(SyntaxKind::LParen, "(", ""), tok(SyntaxKind::RParen, ")", "")],
                )
                .with_formatting(Formatting::default()),
                block,
            ],
        )
        .with_formatting(Formatting::default());
        let body = Node::new(
            SyntaxKind::ClassBody,
            vec![tok(SyntaxKind::LBrace, "{", " "), method, tok(SyntaxKind::RBrace, "}", " ")],
        )
        .with_formatting(Formatting::default());
        Node::new(
            SyntaxKind::ClassDecl,
            vec![
                tok(SyntaxKind::ClassKw, "class", ""),
                tok(SyntaxKind::Ident, "T", " "),
                body,
            ],
        )
        .with_formatting(Formatting::leading(leading))
    }

    fn static_call(owner: &str, name: &str) -> Node {
        Node::new(
            SyntaxKind::MethodInvocation,
            vec![
                tok(SyntaxKind::Ident, name, ""),
                Node::new(
                    SyntaxKind::ArgList,
                    vec![tok(SyntaxKind::LParen, "(", ""), tok(SyntaxKind::RParen, ")", "")],
                )
                .with_formatting(Formatting::default()),
            ],
        )
        .with_formatting(Formatting::default())
        .with_type(JavaType::Method(MethodType::new(TypeSignature::new(owner), name, true)))
    }

    fn unit(children: Vec<Node>) -> Node {
        Node::new(SyntaxKind::CompilationUnit, children).with_formatting(Formatting::new("", "\n"))
    }

    const ASSERTIONS: &str = "org.junit.jupiter.api.Assertions";

    #[test]
    fn test_replaces_static_import_in_place() {
        let tree = unit(vec![
            import("", &format!("{ASSERTIONS}.assertEquals"), true),
            class_with("\n\n", static_call(ASSERTIONS, "assertNull")),
        ]);
        let outcome = reconcile_imports_with(&tree, &EngineConfig::default());
        assert_eq!(
            outcome.tree.to_string(),
            "import static org.junit.jupiter.api.Assertions.assertNull;\n\nclass T { void m() { assertNull(); } }\n"
        );
        assert_eq!(outcome.added, vec![format!("static {ASSERTIONS}.assertNull")]);
        assert_eq!(outcome.removed, vec![format!("static {ASSERTIONS}.assertEquals")]);
    }

    #[test]
    fn test_adds_first_import_without_package() {
        let tree = unit(vec![class_with("", static_call(ASSERTIONS, "assertNull"))]);
        let result = reconcile_imports(&tree);
        assert_eq!(
            result.to_string(),
            "import static org.junit.jupiter.api.Assertions.assertNull;\n\nclass T { void m() { assertNull(); } }\n"
        );
    }

    #[test]
    fn test_removing_last_import_without_package() {
        let tree = unit(vec![
            import("", "java.util.List", false),
            class_with("\n\n", tok(SyntaxKind::IntLiteral, "1", "")),
        ]);
        let result = reconcile_imports(&tree);
        assert_eq!(result.to_string(), "class T { void m() { 1; } }\n");
    }

    #[test]
    fn test_type_reference_added_sorted_before_statics() {
        let mock_util = tok(SyntaxKind::Ident, "MockUtil", "")
            .with_type(JavaType::class("org.mockito.internal.util.MockUtil"));
        let tree = unit(vec![
            import("", "a.b.Used", false),
            import("\n\n", &format!("{ASSERTIONS}.assertNull"), true),
            class_with(
                "\n\n",
                Node::new(
                    SyntaxKind::Binary,
                    vec![
                        mock_util,
                        tok(SyntaxKind::Plus, "+", " "),
                        Node::new(SyntaxKind::Binary, vec![
                            tok(SyntaxKind::Ident, "Used", " ").with_type(JavaType::class("a.b.Used")),
                            tok(SyntaxKind::Plus, "+", " "),
                            static_call(ASSERTIONS, "assertNull").with_leading(" "),
                        ])
                        .with_formatting(Formatting::default()),
                    ],
                )
                .with_formatting(Formatting::default()),
            ),
        ]);
        let outcome = reconcile_imports_with(&tree, &EngineConfig::default());
        let text = outcome.tree.to_string();
        assert!(
            text.starts_with(
                "import a.b.Used;\nimport org.mockito.internal.util.MockUtil;\n\nimport static org.junit.jupiter.api.Assertions.assertNull;\n\nclass T"
            ),
            "{text}"
        );
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_adding_to_misordered_list_sorts_it() {
        let tree = unit(vec![
            import("", &format!("{ASSERTIONS}.assertEquals"), true),
            import("\n", "a.b.Used", false),
            class_with(
                "\n\n",
                Node::new(
                    SyntaxKind::Binary,
                    vec![
                        tok(SyntaxKind::Ident, "Used", "").with_type(JavaType::class("a.b.Used")),
                        tok(SyntaxKind::Plus, "+", " "),
                        Node::new(SyntaxKind::Binary, vec![
                            static_call(ASSERTIONS, "assertEquals").with_leading(" "),
                            tok(SyntaxKind::Plus, "+", " "),
                            static_call(ASSERTIONS, "assertNull").with_leading(" "),
                        ])
                        .with_formatting(Formatting::default()),
                    ],
                )
                .with_formatting(Formatting::default()),
            ),
        ]);
        let outcome = reconcile_imports_with(&tree, &EngineConfig::default());
        let text = outcome.tree.to_string();
        assert!(
            text.starts_with(
                "import a.b.Used;\n\nimport static org.junit.jupiter.api.Assertions.assertEquals;\nimport static org.junit.jupiter.api.Assertions.assertNull;\n\nclass T"
            ),
            "{text}"
        );
        assert_eq!(outcome.added, vec![format!("static {ASSERTIONS}.assertNull")]);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_removal_only_keeps_existing_order() {
        let tree = unit(vec![
            import("", &format!("{ASSERTIONS}.assertEquals"), true),
            import("\n", "a.b.Used", false),
            import("\n", "a.b.Unused", false),
            class_with(
                "\n\n",
                Node::new(
                    SyntaxKind::Binary,
                    vec![
                        tok(SyntaxKind::Ident, "Used", "").with_type(JavaType::class("a.b.Used")),
                        tok(SyntaxKind::Plus, "+", " "),
                        static_call(ASSERTIONS, "assertEquals").with_leading(" "),
                    ],
                )
                .with_formatting(Formatting::default()),
            ),
        ]);
        let outcome = reconcile_imports_with(&tree, &EngineConfig::default());
        let text = outcome.tree.to_string();
        assert!(
            text.starts_with(
                "import static org.junit.jupiter.api.Assertions.assertEquals;\nimport a.b.Used;\n\nclass T"
            ),
            "{text}"
        );
        assert_eq!(outcome.removed, vec!["a.b.Unused".to_string()]);
    }

    #[test]
    fn test_preserved_import_is_kept() {
        let tree = unit(vec![
            import("", "com.example.Registrations", false),
            class_with("\n\n", tok(SyntaxKind::IntLiteral, "1", "")),
        ]);
        let config = EngineConfig::default().with_preserved_import("com.example.Registrations");
        let outcome = reconcile_imports_with(&tree, &config);
        assert!(outcome.tree.ptr_eq(&tree));
    }

    #[test]
    fn test_on_demand_kept_while_names_unresolved() {
        let on_demand = Node::new(
            SyntaxKind::Import,
            vec![
                tok(SyntaxKind::ImportKw, "import", ""),
                qualified("java.util"),
                tok(SyntaxKind::Dot, ".", ""),
                tok(SyntaxKind::Star, "*", ""),
                tok(SyntaxKind::Semicolon, ";", ""),
            ],
        )
        .with_formatting(Formatting::default());
        let tree = unit(vec![
            on_demand,
            class_with("\n\n", tok(SyntaxKind::Ident, "unknown", "")),
        ]);
        let outcome = reconcile_imports_with(&tree, &EngineConfig::default());
        assert!(outcome.removed.is_empty());
        assert!(outcome.tree.ptr_eq(&tree));
    }

    #[test]
    fn test_conflicting_simple_name_is_reported() {
        // `T` is declared in the file, so `a.b.T` cannot be imported
        let other = tok(SyntaxKind::Ident, "T", "").with_type(JavaType::class("a.b.T"));
        let tree = unit(vec![class_with("", other)]);
        let outcome = reconcile_imports_with(&tree, &EngineConfig::default());
        assert!(
            outcome
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::ImportConflict)
        );
        assert!(outcome.added.is_empty());
        assert!(outcome.tree.ptr_eq(&tree));
    }

    #[test]
    fn test_non_unit_tree_is_untouched() {
        let node = tok(SyntaxKind::Ident, "x", "");
        assert!(reconcile_imports(&node).ptr_eq(&node));
    }
}
