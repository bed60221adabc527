//! Lossless, immutable rewrite tree
//!
//! A [`Node`] is a cheap handle (`Arc`) to an immutable node value. Every
//! transformation builds new nodes and shares untouched subtrees with the
//! previous tree version, so handing a tree to another thread is free and
//! safe.
//!
//! Each node carries the whitespace and comments that surrounded it in the
//! source (its [`Formatting`]). Printing every node's leading formatting,
//! its token text or children, then its trailing formatting reproduces the
//! parsed text byte for byte.

pub mod ast;
pub mod kind;
pub mod make;
pub mod types;

pub use kind::SyntaxKind;
pub use types::{JavaType, MethodType, Primitive, TypeSignature, VariableType};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a node, stable across tree versions
///
/// Rebuilding a node (new children, new type, new formatting) keeps its id;
/// only freshly created nodes receive a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whitespace and comments captured around a node at parse time
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Formatting {
    pub leading: String,
    pub trailing: String,
}

impl Formatting {
    pub fn new(leading: impl Into<String>, trailing: impl Into<String>) -> Self {
        Self {
            leading: leading.into(),
            trailing: trailing.into(),
        }
    }

    /// Formatting with only a leading part
    pub fn leading(leading: impl Into<String>) -> Self {
        Self::new(leading, "")
    }

    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq)]
enum Content {
    Token(String),
    Children(Vec<Node>),
}

struct NodeData {
    id: NodeId,
    kind: SyntaxKind,
    /// `None` for synthesized nodes that never saw the source
    formatting: Option<Formatting>,
    ty: Option<JavaType>,
    content: Content,
}

/// A node of the rewrite tree
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    /// Create a synthesized leaf
    pub fn token(kind: SyntaxKind, text: impl Into<String>) -> Node {
        Node(Arc::new(NodeData {
            id: NodeId::fresh(),
            kind,
            formatting: None,
            ty: None,
            content: Content::Token(text.into()),
        }))
    }

    /// Create a synthesized inner node
    pub fn new(kind: SyntaxKind, children: Vec<Node>) -> Node {
        Node(Arc::new(NodeData {
            id: NodeId::fresh(),
            kind,
            formatting: None,
            ty: None,
            content: Content::Children(children),
        }))
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    /// Formatting captured at parse time (or donated), `None` when synthesized
    pub fn formatting(&self) -> Option<&Formatting> {
        self.0.formatting.as_ref()
    }

    /// Leading whitespace and comments, empty when synthesized
    pub fn leading(&self) -> &str {
        self.0.formatting.as_ref().map_or("", |f| f.leading.as_str())
    }

    pub fn trailing(&self) -> &str {
        self.0.formatting.as_ref().map_or("", |f| f.trailing.as_str())
    }

    /// Resolved semantic type, `None` when attribution could not decide
    pub fn ty(&self) -> Option<&JavaType> {
        self.0.ty.as_ref()
    }

    /// Token text for leaves
    pub fn text(&self) -> Option<&str> {
        match &self.0.content {
            Content::Token(text) => Some(text),
            Content::Children(_) => None,
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self.0.content, Content::Token(_))
    }

    pub fn children(&self) -> &[Node] {
        match &self.0.content {
            Content::Token(_) => &[],
            Content::Children(children) => children,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index)
    }

    /// First child of the given kind
    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<&Node> {
        self.children().iter().find(|c| c.kind() == kind)
    }

    /// Same underlying allocation (not merely equal)
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn rebuild(&self, update: impl FnOnce(&mut NodeData)) -> Node {
        let mut data = NodeData {
            id: self.0.id,
            kind: self.0.kind,
            formatting: self.0.formatting.clone(),
            ty: self.0.ty.clone(),
            content: self.0.content.clone(),
        };
        update(&mut data);
        Node(Arc::new(data))
    }

    /// Same node with new children; a leaf is turned into an inner node
    pub fn with_children(&self, children: Vec<Node>) -> Node {
        self.rebuild(|data| data.content = Content::Children(children))
    }

    /// Same node with the child at `index` replaced
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn with_child(&self, index: usize, child: Node) -> Node {
        let mut children = self.children().to_vec();
        children[index] = child;
        self.with_children(children)
    }

    /// Same leaf with different text
    pub fn with_text(&self, text: impl Into<String>) -> Node {
        let text = text.into();
        self.rebuild(|data| data.content = Content::Token(text))
    }

    pub fn with_type(&self, ty: JavaType) -> Node {
        self.rebuild(|data| data.ty = Some(ty))
    }

    pub fn without_type(&self) -> Node {
        self.rebuild(|data| data.ty = None)
    }

    pub fn with_formatting(&self, formatting: Formatting) -> Node {
        self.rebuild(|data| data.formatting = Some(formatting))
    }

    /// Copy the donor's formatting (or lack of it) onto this node
    pub fn with_formatting_of(&self, donor: &Node) -> Node {
        let formatting = donor.0.formatting.clone();
        self.rebuild(|data| data.formatting = formatting)
    }

    /// Replace only the leading part of the formatting
    pub fn with_leading(&self, leading: impl Into<String>) -> Node {
        let leading = leading.into();
        self.rebuild(|data| {
            let trailing = data
                .formatting
                .take()
                .map(|f| f.trailing)
                .unwrap_or_default();
            data.formatting = Some(Formatting::new(leading, trailing));
        })
    }

    /// Pre-order iterator over this node and all its descendants
    pub fn descendants(&self) -> Descendants {
        Descendants {
            stack: vec![self.clone()],
        }
    }

    /// Find the node with the given id in this subtree
    pub fn find(&self, id: NodeId) -> Option<Node> {
        self.descendants().find(|n| n.id() == id)
    }

    /// Chain of nodes from this root down to (and including) the node `id`
    pub fn path_to(&self, id: NodeId) -> Option<Vec<Node>> {
        if self.id() == id {
            return Some(vec![self.clone()]);
        }
        self.children().iter().find_map(|child| {
            child.path_to(id).map(|mut path| {
                path.insert(0, self.clone());
                path
            })
        })
    }

    /// First leaf in source order
    pub fn first_token(&self) -> Option<Node> {
        if self.is_token() {
            return Some(self.clone());
        }
        self.children().iter().find_map(Node::first_token)
    }

    /// Replace the node `id` with `replacement`
    ///
    /// Every ancestor on the path is rebuilt; all other subtrees are shared
    /// with `self`.
    ///
    /// # Panics
    ///
    /// Panics if no node with `id` exists in the tree. Ids handed out by a
    /// traversal of this tree are always present.
    pub fn replace_node(&self, id: NodeId, replacement: Node) -> Node {
        match self.try_replace_node(id, replacement) {
            Some(tree) => tree,
            None => panic!("node {id} is not part of this tree"),
        }
    }

    /// Like [`Node::replace_node`] but `None` when `id` is absent
    pub fn try_replace_node(&self, id: NodeId, replacement: Node) -> Option<Node> {
        if self.id() == id {
            return Some(replacement);
        }
        for (index, child) in self.children().iter().enumerate() {
            if let Some(new_child) = child.try_replace_node(id, replacement.clone()) {
                return Some(self.with_child(index, new_child));
            }
        }
        None
    }

    /// Indented structural dump used by snapshot tests
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        use std::fmt::Write;

        let _ = write!(out, "{}{:?}", "  ".repeat(depth), self.kind());
        if let Some(text) = self.text() {
            let _ = write!(out, " {text:?}");
        }
        match self.formatting() {
            Some(formatting) => {
                if !formatting.leading.is_empty() {
                    let _ = write!(out, " leading={:?}", formatting.leading);
                }
                if !formatting.trailing.is_empty() {
                    let _ = write!(out, " trailing={:?}", formatting.trailing);
                }
            }
            None => out.push_str(" synthesized"),
        }
        if let Some(ty) = self.ty() {
            let _ = write!(out, " : {ty}");
        }
        out.push('\n');
        for child in self.children() {
            child.dump_into(out, depth + 1);
        }
    }
}

/// Structural equality: ids are ignored, shared subtrees compare in O(1)
impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.0.kind == other.0.kind
            && self.0.formatting == other.0.formatting
            && self.0.ty == other.0.ty
            && self.0.content == other.0.content
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("id", &self.id()).field("kind", &self.kind());
        if let Some(text) = self.text() {
            s.field("text", &text);
        } else {
            s.field("children", &self.children());
        }
        s.finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::printer::print(self))
    }
}

/// Iterator returned by [`Node::descendants`]
pub struct Descendants {
    stack: Vec<Node>,
}

impl Iterator for Descendants {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev().cloned());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(text: &str, leading: &str) -> Node {
        Node::token(SyntaxKind::Ident, text).with_formatting(Formatting::leading(leading))
    }

    fn sample() -> Node {
        let args = Node::new(
            SyntaxKind::ArgList,
            vec![
                Node::token(SyntaxKind::LParen, "(").with_formatting(Formatting::default()),
                ident("x", ""),
                Node::token(SyntaxKind::RParen, ")").with_formatting(Formatting::default()),
            ],
        )
        .with_formatting(Formatting::default());
        Node::new(SyntaxKind::MethodInvocation, vec![ident("foo", "  "), args])
            .with_formatting(Formatting::default())
    }

    #[test]
    fn test_replace_node_shares_siblings() {
        let tree = sample();
        let target = tree.children()[1].children()[1].clone();
        let new_tree = tree.replace_node(target.id(), ident("y", ""));

        assert!(new_tree.children()[0].ptr_eq(&tree.children()[0]));
        assert!(!new_tree.children()[1].ptr_eq(&tree.children()[1]));
        assert_eq!(new_tree.id(), tree.id());
        assert_eq!(new_tree.children()[1].children()[1].text(), Some("y"));
        // original untouched
        assert_eq!(tree.children()[1].children()[1].text(), Some("x"));
    }

    #[test]
    #[should_panic(expected = "is not part of this tree")]
    fn test_replace_missing_id_panics() {
        let tree = sample();
        let stranger = Node::token(SyntaxKind::Ident, "z");
        tree.replace_node(stranger.id(), stranger.clone());
    }

    #[test]
    fn test_try_replace_missing_id() {
        let tree = sample();
        let stranger = Node::token(SyntaxKind::Ident, "z");
        assert!(tree.try_replace_node(stranger.id(), stranger.clone()).is_none());
    }

    #[test]
    fn test_structural_equality_ignores_ids() {
        assert_eq!(sample(), sample());
        assert_ne!(sample().id(), sample().id());

        let tree = sample();
        let retyped = tree.with_type(JavaType::class("a.B"));
        assert_ne!(tree, retyped);
    }

    #[test]
    fn test_with_formatting_of() {
        let donor = ident("a", "\n    ");
        let synthesized = Node::token(SyntaxKind::Ident, "b");
        assert!(synthesized.formatting().is_none());

        let blended = synthesized.with_formatting_of(&donor);
        assert_eq!(blended.leading(), "\n    ");
        assert_eq!(blended.id(), synthesized.id());
    }

    #[test]
    fn test_descendants_pre_order() {
        let kinds: Vec<_> = sample().descendants().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::MethodInvocation,
                SyntaxKind::Ident,
                SyntaxKind::ArgList,
                SyntaxKind::LParen,
                SyntaxKind::Ident,
                SyntaxKind::RParen,
            ]
        );
    }

    #[test]
    fn test_path_to() {
        let tree = sample();
        let x = tree.children()[1].children()[1].clone();
        let path = tree.path_to(x.id()).unwrap();
        assert_eq!(path.len(), 3);
        assert!(path[0].ptr_eq(&tree));
        assert!(path[2].ptr_eq(&x));
    }

    #[test]
    fn test_display_prints_source() {
        assert_eq!(sample().to_string(), "  foo(x)");
    }
}
