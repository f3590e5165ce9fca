use crate::path::PathSegment;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    Property,
    String,
    Number,
    Boolean,
    Null,
}

/// The decoded value carried by a leaf node (or a property's key).
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<LiteralValue> for Value {
    fn from(v: LiteralValue) -> Self {
        match v {
            LiteralValue::Null => Value::Null,
            LiteralValue::Bool(b) => Value::Bool(b),
            LiteralValue::Number(n) => Value::Number(n),
            LiteralValue::String(s) => Value::String(s),
        }
    }
}

pub type NodeId = usize;

/// A node in a parsed concrete syntax tree. Children are owned by the arena
/// ([`Tree`]); a node reaches its parent through an index rather than a
/// shared/cyclic pointer, so the whole tree is a single `Vec` with no `Rc`
/// or unsafe code involved.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub offset: usize,
    pub length: usize,
    /// Set for String/Number/Boolean/Null leaves, and for the key half of a
    /// Property node.
    pub value: Option<LiteralValue>,
    /// Set for Property nodes once a `:` has been seen.
    pub colon_offset: Option<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// An owning arena of [`NodeData`], produced by [`crate::parse_tree`].
#[derive(Debug, Clone)]
pub struct Tree {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) root: Option<NodeId>,
}

impl Tree {
    pub(crate) fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root.map(|id| NodeRef { tree: self, id })
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }
}

/// A borrowed, ergonomic view of one node in a [`Tree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn offset(&self) -> usize {
        self.data().offset
    }

    pub fn length(&self) -> usize {
        self.data().length
    }

    pub fn end(&self) -> usize {
        self.offset() + self.length()
    }

    pub fn value(&self) -> Option<&'a LiteralValue> {
        self.data().value.as_ref()
    }

    pub fn colon_offset(&self) -> Option<usize> {
        self.data().colon_offset
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| NodeRef { tree: self.tree, id })
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| NodeRef { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// For a Property node: the key's text.
    pub fn property_key(&self) -> Option<&'a str> {
        match (&self.data().kind, &self.data().value) {
            (NodeKind::Property, Some(LiteralValue::String(s))) => Some(s),
            _ => None,
        }
    }

    /// For a Property node: its value node, if one was parsed.
    pub fn property_value(&self) -> Option<NodeRef<'a>> {
        if self.data().kind != NodeKind::Property {
            return None;
        }
        self.data().children.first().map(|&id| NodeRef { tree: self.tree, id })
    }
}

/// Walks from the tree root following `path`, returning the node at the end
/// if every segment resolves.
pub fn find_node_at_location<'a>(tree: &'a Tree, path: &[PathSegment]) -> Option<NodeRef<'a>> {
    let mut current = tree.root()?;

    for segment in path {
        current = match (segment, current.kind()) {
            (PathSegment::Key(key), NodeKind::Object) => current
                .children()
                .rev()
                .find(|prop| prop.property_key() == Some(key.as_str()))
                .and_then(|prop| prop.property_value())?,
            (PathSegment::Index(i), NodeKind::Array) => current.children().nth(*i)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Finds the most specific node whose span contains `offset`. When
/// `include_right_bound` is set, a node whose span ends exactly at `offset`
/// is also considered a match (useful for completion requests right after a
/// token).
pub fn find_node_at_offset(tree: &Tree, offset: usize, include_right_bound: bool) -> Option<NodeRef<'_>> {
    fn contains(node: &NodeRef, offset: usize, include_right_bound: bool) -> bool {
        offset >= node.offset() && (offset < node.end() || (include_right_bound && offset == node.end()))
    }

    fn descend<'a>(node: NodeRef<'a>, offset: usize, include_right_bound: bool) -> NodeRef<'a> {
        for child in node.children() {
            if contains(&child, offset, include_right_bound) {
                return descend(child, offset, include_right_bound);
            }
        }
        node
    }

    let root = tree.root()?;
    if !contains(&root, offset, include_right_bound) {
        return None;
    }
    Some(descend(root, offset, include_right_bound))
}

/// Walks parent pointers from `node` up to the root, returning the path from
/// the root down to `node`.
pub fn get_node_path(node: NodeRef<'_>) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = node;

    loop {
        let parent = match current.parent() {
            Some(p) => p,
            None => break,
        };

        match parent.kind() {
            NodeKind::Array => {
                let index = parent.children().position(|c| c.id() == current.id()).unwrap();
                segments.push(PathSegment::Index(index));
                current = parent;
            }
            NodeKind::Property => {
                segments.push(PathSegment::Key(parent.property_key().unwrap().to_string()));
                current = parent;
            }
            _ => {
                current = parent;
            }
        }
    }

    segments.reverse();
    segments
}

/// Materializes a [`Value`] from a subtree.
pub fn get_node_value(node: NodeRef<'_>) -> Value {
    match node.kind() {
        NodeKind::Null => Value::Null,
        NodeKind::Boolean => match node.value() {
            Some(LiteralValue::Bool(b)) => Value::Bool(*b),
            _ => Value::Null,
        },
        NodeKind::Number => match node.value() {
            Some(LiteralValue::Number(n)) => Value::Number(*n),
            _ => Value::Null,
        },
        NodeKind::String => match node.value() {
            Some(LiteralValue::String(s)) => Value::String(s.clone()),
            _ => Value::String(String::new()),
        },
        NodeKind::Array => Value::Array(node.children().map(get_node_value).collect()),
        NodeKind::Object => Value::Object(
            node.children()
                .filter_map(|prop| {
                    let key = prop.property_key()?.to_string();
                    let value = prop.property_value().map(get_node_value).unwrap_or(Value::Null);
                    Some((key, value))
                })
                .collect(),
        ),
        NodeKind::Property => {
            // Not addressable directly from the public API, but handled for
            // completeness: a property's "value" is its value subtree.
            node.property_value().map(get_node_value).unwrap_or(Value::Null)
        }
    }
}
