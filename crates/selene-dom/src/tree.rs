//! DOM Tree (arena-based allocation)
//!
//! Navigation, text content, document order, and the direct element
//! collections the selector engine uses as fast paths.

use crate::{DomError, DomResult, Node, NodeData, NodeId};

/// Arena-based DOM tree
///
/// Node 0 is always the document root.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree containing only the document root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// Get a node by ID
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// The document root
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree holds only the document root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element node
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(crate::ElementData::new(tag)))
    }

    /// Create a detached element with attributes
    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        if let Some(e) = self.nodes[id.index()].as_element_mut() {
            for (name, value) in attrs {
                e.set_attr(name, value);
            }
        }
        id
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    /// Set an attribute on an element node
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.get_mut(id)
            .and_then(Node::as_element_mut)
            .map(|e| e.set_attr(name, value))
            .ok_or(DomError::NotFound)
    }

    /// Append `child` as the last child of `parent`
    ///
    /// A child that is already attached elsewhere is detached first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.get(parent).is_none() || self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if self.nodes[child.index()].parent.is_valid() {
            tracing::debug!("re-appending attached node {:?}", child);
            self.detach(child);
        }

        let old_last = self.nodes[parent.index()].last_child;
        self.nodes[child.index()].parent = parent;
        self.nodes[child.index()].prev_sibling = old_last;
        if old_last.is_valid() {
            self.nodes[old_last.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
        Ok(child)
    }

    /// Unlink a node from its parent and siblings
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else if parent.is_valid() {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else if parent.is_valid() {
            self.nodes[parent.index()].last_child = prev;
        }
        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    // Navigation

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.first_child).filter(|c| c.is_valid())
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.last_child).filter(|c| c.is_valid())
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.prev_sibling).filter(|s| s.is_valid())
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.next_sibling).filter(|s| s.is_valid())
    }

    /// Iterate the direct children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            cur: self.first_child(id),
        }
    }

    /// Iterate the subtree below `root` in preorder, excluding `root` itself
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root,
            cur: self.first_child(root),
        }
    }

    // Element info

    /// Check if a node is an element
    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).map(Node::is_element).unwrap_or(false)
    }

    /// Tag name of an element node (lowercased)
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::as_element).map(|e| e.name.as_str())
    }

    /// Attribute lookup on an element node
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(Node::as_element).and_then(|e| e.attr(name))
    }

    /// Class-list membership on an element node
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id)
            .and_then(Node::as_element)
            .map(|e| e.has_class(class))
            .unwrap_or(false)
    }

    /// Concatenated text of the subtree, preorder
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            out.push_str(text);
        }
        for d in self.descendants(id) {
            if let Some(text) = self.get(d).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }

    // Document order

    /// Preorder traversal index of a node (root is 0)
    ///
    /// O(tree size); batch callers should walk `descendants` once instead.
    pub fn document_position(&self, id: NodeId) -> usize {
        if id == NodeId::ROOT {
            return 0;
        }
        let mut pos = 1;
        for d in self.descendants(NodeId::ROOT) {
            if d == id {
                return pos;
            }
            pos += 1;
        }
        // Detached nodes sort after the whole document
        pos + id.index()
    }

    /// Compare two nodes by document order
    pub fn compare_document_order(&self, a: NodeId, b: NodeId) -> std::cmp::Ordering {
        if a == b {
            return std::cmp::Ordering::Equal;
        }
        self.document_position(a).cmp(&self.document_position(b))
    }

    /// Strict containment: a node does not contain itself
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = self.parent(node);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.contains(ancestor, node)
    }

    // Native collections

    /// First element with the given `id` attribute, in the subtree of `root`
    pub fn element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root).find(|&d| {
            self.get(d)
                .and_then(Node::as_element)
                .map(|e| e.id() == Some(id))
                .unwrap_or(false)
        })
    }

    /// Elements matching a tag name (or `*`) in the subtree of `root`, preorder
    pub fn elements_by_tag_name(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let all = tag == "*";
        self.descendants(root)
            .filter(|&d| match self.get(d).and_then(Node::as_element) {
                Some(e) => all || e.name.eq_ignore_ascii_case(tag),
                None => false,
            })
            .collect()
    }

    /// Elements carrying a class token in the subtree of `root`, preorder
    pub fn elements_by_class_name(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&d| self.has_class(d, class))
            .collect()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    cur: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.cur?;
        self.cur = self.tree.next_sibling(id);
        Some(id)
    }
}

/// Preorder iterator over a subtree, excluding its root
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    cur: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.cur?;
        // Advance: first child, else next sibling, else climb until one exists
        let mut next = self.tree.first_child(id);
        if next.is_none() {
            let mut at = id;
            while at != self.root {
                if let Some(sib) = self.tree.next_sibling(at) {
                    next = Some(sib);
                    break;
                }
                match self.tree.parent(at) {
                    Some(p) if p != self.root => at = p,
                    _ => break,
                }
            }
        }
        self.cur = next;
        Some(id)
    }
}
