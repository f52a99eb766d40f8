//! Selene Select - CSS selector query engine
//!
//! Tokenizes, compiles, and runs CSS selectors against the Selene DOM.
//! Compiled selectors and token streams are cached per engine; results
//! always come back in document order without duplicates.

mod cache;
mod combinator;
mod compile;
mod engine;
mod error;
mod matcher;
mod pseudo;
mod tokenizer;

pub use compile::{Branch, CompiledSelector, SetPipeline, Stage};
pub use engine::{contains, escape, unique_sort, QueryContext, SelectorEngine};
pub use error::{SelectorError, SelectorResult};
pub use pseudo::{Positional, PseudoToken};
pub use tokenizer::{tokenize, AttrOp, ChildKind, Combinator, Token, TokenGroup, TokenKind};

use selene_dom::{DomTree, NodeId};

/// One-shot query with a throwaway engine
///
/// Callers issuing repeated queries should hold a [`SelectorEngine`] to
/// benefit from its caches.
pub fn select(selector: &str, tree: &DomTree, context: NodeId) -> SelectorResult<Vec<NodeId>> {
    SelectorEngine::new().select(selector, tree, context)
}

/// One-shot single-element check with a throwaway engine
pub fn matches_selector(tree: &DomTree, element: NodeId, selector: &str) -> SelectorResult<bool> {
    SelectorEngine::new().matches_selector(tree, element, selector)
}
