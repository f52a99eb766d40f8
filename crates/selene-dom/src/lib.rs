//! Selene DOM - arena tree
//!
//! Memory-efficient DOM tree: the node surface the selector engine queries.

mod node;
mod tree;

pub use node::{ElementData, Node, NodeData};
pub use tree::{Children, Descendants, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document root ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Create from a raw arena index
    #[inline]
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node ID does not exist in this tree
    #[error("node not found")]
    NotFound,
    /// Insertion would create a cycle
    #[error("hierarchy request error")]
    HierarchyRequest,
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;
