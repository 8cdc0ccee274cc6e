//! Node tree consumed by the Lumen layout engine.
//!
//! This crate provides an arena-based tree of element and text nodes. The
//! markup parser and the style cascade that fill it in live elsewhere; layout
//! only reads from it.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships,
//! providing O(1) access and traversal without borrow checker issues. Parent
//! links are plain indices, so walking from a text node up to its enclosing
//! anchor never creates a second ownership edge.

mod animation;

use std::collections::HashMap;

use serde::Serialize;

pub use animation::NumericAnimation;

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// A type-safe index into the node tree.
///
/// `NodeId` doubles as the node identity used by the hit-test bounds tables
/// and by display commands that need cross-frame identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// Already-cascaded style properties of an element.
///
/// Layout reads a fixed set of string keys (`font-weight`, `color`,
/// `opacity`, ...) and parses the values itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleMap {
    properties: HashMap<String, String>,
}

impl StyleMap {
    /// Create an empty style map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, key: &str, value: &str) {
        let _ = self.properties.insert(key.to_string(), value.to_string());
    }

    /// Number of properties set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A node in the tree.
///
/// This node stores indices for its parent and children, enabling O(1)
/// traversal in either direction.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Text or element payload.
    pub kind: NodeKind,

    /// Non-owning link to the parent, `None` for the root.
    pub parent: Option<NodeId>,

    /// Children in document order.
    pub children: Vec<NodeId>,
}

/// Payload of a node.
#[derive(Debug, Clone, Serialize)]
pub enum NodeKind {
    /// A run of raw text.
    Text(String),
    /// An element with a tag, attributes and computed style.
    Element(ElementData),
}

/// Element-specific data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag_name: String,
    /// Attribute list.
    pub attrs: AttributesMap,
    /// Cascaded style.
    pub style: StyleMap,
    /// Whether the element currently holds input focus.
    pub is_focused: bool,
    /// Running per-property animations, keyed by property name.
    pub animations: HashMap<String, NumericAnimation>,
}

impl ElementData {
    /// Create element data for `tag_name` with no attributes or style.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Whether the space-separated `class` attribute contains `class_name`.
    #[must_use]
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attrs
            .get("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
    }

    /// Current value of the animation running on `property`, if any.
    #[must_use]
    pub fn animated_value(&self, property: &str) -> Option<f64> {
        self.animations.get(property).map(NumericAnimation::value)
    }
}

/// Arena-based node tree with O(1) node access and traversal.
///
/// This structure stores all nodes in a contiguous vector, using indices
/// for all relationships. This provides:
/// - O(1) access to any node by `NodeId`
/// - O(1) parent traversal
/// - No borrowing issues (indices instead of references)
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeTree {
    /// All nodes in the tree, indexed by `NodeId`.
    nodes: Vec<Node>,
}

impl NodeTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Allocate an element and append it to `parent` when given.
    pub fn create_element(&mut self, element: ElementData, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc(NodeKind::Element(element));
        if let Some(parent) = parent {
            self.append_child(parent, id);
        }
        id
    }

    /// Allocate a text node and append it to `parent` when given.
    pub fn create_text(&mut self, text: &str, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc(NodeKind::Text(text.to_string()));
        if let Some(parent) = parent {
            self.append_child(parent, id);
        }
        id
    }

    /// Appends `child` as the last child of `parent`, updating both links.
    ///
    /// # Panics
    /// Panics if either handle was not allocated by this tree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Text(s) => Some(s.as_str()),
            NodeKind::Element(_) => None,
        })
    }

    /// Tag name of an element node, `None` for text.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag_name.as_str())
    }

    /// Concatenated text of every text node below `id`, in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(id, &mut text);
        text
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(s)) => out.push_str(s),
            Some(NodeKind::Element(_)) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Every node ID in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a NodeTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
