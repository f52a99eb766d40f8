//! Query entry points
//!
//! The engine owns the three bounded caches, the run counter, and the
//! per-query memo side tables. A QueryContext snapshot is threaded
//! through matching, so nested sub-queries (`:has`, `:not`) run against
//! their own memo namespace and can never satisfy a probe from the pass
//! that spawned them.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use selene_dom::{DomTree, NodeId};

use crate::cache::{FifoCache, DEFAULT_CACHE_CAPACITY};
use crate::combinator::SiteId;
use crate::compile::{exists_compiled, run_compiled, CompiledSelector};
use crate::error::SelectorResult;
use crate::pseudo::PseudoToken;
use crate::tokenizer::{self, Token, TokenGroup, TokenKind};

/// Namespace tag for anchor-free (`:not`) evaluation within a run
const ANY_ANCHOR_BIT: u64 = 1 << 63;

/// CSS selector query engine
///
/// Single-threaded by construction: interior state uses Cell/RefCell,
/// so the type is deliberately !Sync.
pub struct SelectorEngine {
    token_cache: RefCell<FifoCache<Rc<Vec<TokenGroup>>>>,
    compiled_cache: RefCell<FifoCache<Rc<CompiledSelector>>>,
    /// Selectors the quick single-compound matcher cannot express
    quick_reject: RefCell<FifoCache<()>>,
    /// Monotonic run counter; one tick per top-level query and one per
    /// nested sub-run
    runs: Cell<u64>,
    next_site: Cell<SiteId>,
    /// (node, relative-step site) -> (namespace, walk result)
    dir_memo: RefCell<HashMap<(NodeId, SiteId), (u64, bool)>>,
    /// parent -> (run, element children in order)
    sibling_memo: RefCell<HashMap<NodeId, (u64, Rc<Vec<NodeId>>)>>,
}

impl Default for SelectorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorEngine {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Engine with a custom per-cache entry bound
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            token_cache: RefCell::new(FifoCache::new(capacity)),
            compiled_cache: RefCell::new(FifoCache::new(capacity)),
            quick_reject: RefCell::new(FifoCache::new(capacity)),
            runs: Cell::new(0),
            next_site: Cell::new(0),
            dir_memo: RefCell::new(HashMap::new()),
            sibling_memo: RefCell::new(HashMap::new()),
        }
    }

    /// Tokenize a selector, caching by exact string
    pub fn tokenize(&self, selector: &str) -> SelectorResult<Rc<Vec<TokenGroup>>> {
        if let Some(hit) = self.token_cache.borrow().get(selector) {
            return Ok(hit);
        }
        let groups = Rc::new(tokenizer::tokenize(selector)?);
        self.token_cache.borrow_mut().insert(selector, groups.clone());
        Ok(groups)
    }

    /// Compile a selector, caching by exact string
    pub fn compile(&self, selector: &str) -> SelectorResult<Rc<CompiledSelector>> {
        if let Some(hit) = self.compiled_cache.borrow().get(selector) {
            return Ok(hit);
        }
        let groups = self.tokenize(selector)?;
        tracing::debug!("compiling selector: {}", selector);
        let compiled = Rc::new(self.compile_groups(selector, &groups)?);
        self.compiled_cache
            .borrow_mut()
            .insert(selector, compiled.clone());
        Ok(compiled)
    }

    /// Compile a partial selector rebuilt from its remaining tokens
    fn compile_remainder(
        &self,
        key: &str,
        groups: &[TokenGroup],
    ) -> SelectorResult<Rc<CompiledSelector>> {
        if let Some(hit) = self.compiled_cache.borrow().get(key) {
            return Ok(hit);
        }
        let compiled = Rc::new(self.compile_groups(key, groups)?);
        self.compiled_cache.borrow_mut().insert(key, compiled.clone());
        Ok(compiled)
    }

    /// Select all elements matching `selector` within `context`
    ///
    /// Results are in document order with no duplicates. Grammar errors
    /// abort with zero results, never a partial set.
    pub fn select(
        &self,
        selector: &str,
        tree: &DomTree,
        context: NodeId,
    ) -> SelectorResult<Vec<NodeId>> {
        self.select_impl(selector, tree, context, None)
    }

    /// Run a compiled selector against a caller-supplied candidate list
    pub fn select_with_seed(
        &self,
        selector: &str,
        tree: &DomTree,
        context: NodeId,
        seed: &[NodeId],
    ) -> SelectorResult<Vec<NodeId>> {
        self.select_impl(selector, tree, context, Some(seed))
    }

    /// Filter `elements` down to those matching `selector`
    pub fn matches(
        &self,
        selector: &str,
        tree: &DomTree,
        elements: &[NodeId],
    ) -> SelectorResult<Vec<NodeId>> {
        self.select_impl(selector, tree, tree.root(), Some(elements))
    }

    /// Single-element check, quick path first
    ///
    /// Selectors the quick matcher cannot express are recorded once in
    /// the negative cache and routed through the compiled engine.
    pub fn matches_selector(
        &self,
        tree: &DomTree,
        element: NodeId,
        selector: &str,
    ) -> SelectorResult<bool> {
        if !self.quick_reject.borrow().contains(selector) {
            match quick_match(tree, element, selector) {
                Some(hit) => return Ok(hit),
                None => {
                    tracing::debug!("quick matcher cannot handle {:?}", selector);
                    self.quick_reject.borrow_mut().insert(selector, ());
                }
            }
        }
        Ok(!self.matches(selector, tree, &[element])?.is_empty())
    }

    fn select_impl(
        &self,
        selector: &str,
        tree: &DomTree,
        mut context: NodeId,
        seed: Option<&[NodeId]>,
    ) -> SelectorResult<Vec<NodeId>> {
        let groups = self.tokenize(selector)?;
        self.begin_query();

        if seed.is_none() && groups.len() == 1 {
            let mut toks: Vec<Token> = groups[0].clone();

            // consume leading tokens through the native collections
            loop {
                if toks.len() == 1 {
                    match &toks[0].kind {
                        TokenKind::Id(id) => {
                            return Ok(tree.element_by_id(context, id).into_iter().collect());
                        }
                        TokenKind::Tag(tag) => {
                            return Ok(
                                tree.elements_by_tag_name(context, &tag.to_ascii_lowercase())
                            );
                        }
                        TokenKind::Universal => {
                            return Ok(tree.elements_by_tag_name(context, "*"));
                        }
                        TokenKind::Class(class) => {
                            return Ok(tree.elements_by_class_name(context, class));
                        }
                        _ => break,
                    }
                }
                let narrowed = match (&toks[0].kind, toks.get(1).map(|t| &t.kind)) {
                    (TokenKind::Id(id), Some(TokenKind::Combinator(c))) => {
                        match tree.element_by_id(context, id) {
                            Some(el) => {
                                context = el;
                                Some(*c)
                            }
                            None => return Ok(Vec::new()),
                        }
                    }
                    _ => None,
                };
                match narrowed {
                    Some(tokenizer::Combinator::Descendant) => {
                        toks.drain(..2);
                    }
                    Some(_) => {
                        toks.remove(0);
                    }
                    None => break,
                }
            }

            // a seed set for right-to-left matching, unless the group
            // needs its context (positional pseudo or leading combinator)
            if !needs_context(&toks) {
                let compound_start = toks
                    .iter()
                    .rposition(|t| matches!(t.kind, TokenKind::Combinator(_)))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                let pick = (compound_start..toks.len())
                    .filter_map(|i| find_rank(&toks[i].kind).map(|rank| (rank, i)))
                    .min()
                    .map(|(_, i)| i);
                if let Some(i) = pick {
                    let seed_list: Vec<NodeId> = match &toks[i].kind {
                        TokenKind::Id(id) => tree.element_by_id(context, id).into_iter().collect(),
                        TokenKind::Class(class) => tree.elements_by_class_name(context, class),
                        TokenKind::Tag(tag) => {
                            tree.elements_by_tag_name(context, &tag.to_ascii_lowercase())
                        }
                        _ => Vec::new(),
                    };
                    if seed_list.is_empty() {
                        return Ok(Vec::new());
                    }
                    toks.remove(i);
                    let key: String = toks.iter().map(|t| t.text.as_str()).collect();
                    tracing::trace!("seed of {} candidates for {:?}", seed_list.len(), key);
                    let remainder = vec![toks];
                    let compiled = self.compile_remainder(&key, &remainder)?;
                    let ctx = self.query_ctx(tree, context);
                    return Ok(run_compiled(&ctx, &compiled, &seed_list));
                }
            }

            let key: String = toks.iter().map(|t| t.text.as_str()).collect();
            let remainder = vec![toks];
            let compiled = self.compile_remainder(&key, &remainder)?;
            let candidates = gather_candidates(tree, context, &remainder);
            let ctx = self.query_ctx(tree, context);
            return Ok(run_compiled(&ctx, &compiled, &candidates));
        }

        let compiled = self.compile(selector)?;
        let candidates: Vec<NodeId> = match seed {
            Some(s) => {
                let mut seen = HashSet::new();
                s.iter().copied().filter(|n| seen.insert(*n)).collect()
            }
            None => gather_candidates(tree, context, &groups),
        };
        let ctx = self.query_ctx(tree, context);
        Ok(run_compiled(&ctx, &compiled, &candidates))
    }

    /// Per-query memo scope: cleared at each top-level entry
    fn begin_query(&self) {
        self.dir_memo.borrow_mut().clear();
        self.sibling_memo.borrow_mut().clear();
    }

    fn query_ctx<'a>(&'a self, tree: &'a DomTree, scope: NodeId) -> QueryContext<'a> {
        let run = self.next_run();
        QueryContext {
            tree,
            engine: self,
            scope,
            generation: run,
            ns: run,
            anchor: AnchorTarget::Scope,
        }
    }

    fn next_run(&self) -> u64 {
        let v = self.runs.get().wrapping_add(1);
        self.runs.set(v);
        v
    }

    pub(crate) fn fresh_site(&self) -> SiteId {
        let v = self.next_site.get();
        self.next_site.set(v.wrapping_add(1));
        v
    }
}

fn needs_context(tokens: &[Token]) -> bool {
    matches!(tokens.first().map(|t| &t.kind), Some(TokenKind::Combinator(_)))
        || tokens.iter().any(|t| {
            matches!(t.kind, TokenKind::Pseudo(PseudoToken::Positional(_)))
        })
}

/// Findability rank for seed extraction: prefer ID, then class, then tag
fn find_rank(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Id(_) => Some(0),
        TokenKind::Class(_) => Some(1),
        TokenKind::Tag(_) => Some(2),
        _ => None,
    }
}

/// All elements a compiled selector could match, in document order
///
/// A group led by a sibling combinator is relative to the context's
/// siblings, so candidates come from the parent's subtree.
fn gather_candidates(tree: &DomTree, context: NodeId, groups: &[TokenGroup]) -> Vec<NodeId> {
    let leading_sibling = groups.iter().any(|g| {
        matches!(
            g.first().map(|t| &t.kind),
            Some(TokenKind::Combinator(c)) if c.is_sibling()
        )
    });
    let root = if leading_sibling {
        tree.parent(context).unwrap_or(context)
    } else {
        context
    };
    tree.elements_by_tag_name(root, "*")
}

/// Direct evaluation of a single tag/id/class compound, no compilation
///
/// Returns None when the selector is outside the quick grammar.
fn quick_match(tree: &DomTree, el: NodeId, selector: &str) -> Option<bool> {
    let s = selector.trim();
    if s.is_empty()
        || s.chars().any(|c| {
            matches!(
                c,
                ' ' | '\t' | '\n' | '\r' | '\x0C'
                    | '>' | '+' | '~' | ',' | ':'
                    | '[' | ']' | '(' | ')'
                    | '"' | '\'' | '\\'
                    | '=' | '!' | '|' | '^' | '$'
            )
        })
    {
        return None;
    }

    let split = s.find(['#', '.']).unwrap_or(s.len());
    let (tag, mut rest) = s.split_at(split);
    if !tree.is_element(el) {
        return Some(false);
    }
    if !tag.is_empty() && tag != "*" {
        let hit = tree
            .tag_name(el)
            .map(|t| t.eq_ignore_ascii_case(tag))
            .unwrap_or(false);
        if !hit {
            return Some(false);
        }
    }
    while !rest.is_empty() {
        let marker = rest.chars().next();
        let tail = &rest[1..];
        let end = tail.find(['#', '.']).unwrap_or(tail.len());
        let name = &tail[..end];
        if name.is_empty() {
            return None;
        }
        let hit = match marker {
            Some('#') => tree.attr(el, "id") == Some(name),
            Some('.') => tree.has_class(el, name),
            _ => return None,
        };
        if !hit {
            return Some(false);
        }
        rest = &tail[end..];
    }
    Some(true)
}

/// Sort into document order and drop duplicate node identities
pub fn unique_sort(tree: &DomTree, nodes: &mut Vec<NodeId>) {
    if nodes.len() <= 1 {
        return;
    }
    let mut order: HashMap<NodeId, usize> = HashMap::with_capacity(tree.len());
    order.insert(tree.root(), 0);
    for (i, n) in tree.descendants(tree.root()).enumerate() {
        order.insert(n, i + 1);
    }
    // detached nodes sort after the document, by arena index
    nodes.sort_by_key(|n| (order.get(n).copied().unwrap_or(usize::MAX), n.index()));
    nodes.dedup();
}

/// Strict ancestor containment
pub fn contains(tree: &DomTree, ancestor: NodeId, node: NodeId) -> bool {
    tree.contains(ancestor, node)
}

/// Escape an arbitrary string as a CSS identifier
pub fn escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => {
                out.push_str(&format!("\\{:x} ", c as u32));
            }
            '0'..='9' if i == 0 || (i == 1 && chars[0] == '-') => {
                out.push_str(&format!("\\{:x} ", c as u32));
            }
            '-' if i == 0 && chars.len() == 1 => {
                out.push('\\');
                out.push('-');
            }
            _ if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c >= '\u{80}' => {
                out.push(c);
            }
            _ => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

#[derive(Clone)]
enum AnchorTarget {
    /// The query context node itself
    Scope,
    /// Survivors of a positional stage
    Set(Rc<HashSet<NodeId>>),
    /// No anchoring (`:not` evaluation)
    Any,
}

/// Per-run matching state threaded through every matcher call
#[derive(Clone)]
pub struct QueryContext<'a> {
    pub(crate) tree: &'a DomTree,
    engine: &'a SelectorEngine,
    scope: NodeId,
    /// Run stamp for tree-shape memos (sibling lists)
    generation: u64,
    /// Namespace for anchor-dependent memos (directional walks)
    ns: u64,
    anchor: AnchorTarget,
}

impl<'a> QueryContext<'a> {
    pub(crate) fn anchor_is_any(&self) -> bool {
        matches!(self.anchor, AnchorTarget::Any)
    }

    pub(crate) fn anchor_hits(&self, node: NodeId) -> bool {
        match &self.anchor {
            AnchorTarget::Scope => node == self.scope,
            AnchorTarget::Set(set) => set.contains(&node),
            AnchorTarget::Any => true,
        }
    }

    /// Same run, re-anchored to a survivor set (post-finder stages)
    pub(crate) fn with_anchor_set(&self, set: Rc<HashSet<NodeId>>) -> QueryContext<'a> {
        QueryContext {
            ns: self.engine.next_run(),
            anchor: AnchorTarget::Set(set),
            ..self.clone()
        }
    }

    pub(crate) fn dir_memo_get(&self, node: NodeId, site: SiteId) -> Option<bool> {
        self.engine
            .dir_memo
            .borrow()
            .get(&(node, site))
            .and_then(|&(ns, hit)| (ns == self.ns).then_some(hit))
    }

    pub(crate) fn dir_memo_set(&self, node: NodeId, site: SiteId, hit: bool) {
        self.engine
            .dir_memo
            .borrow_mut()
            .insert((node, site), (self.ns, hit));
    }

    /// Element children of a parent, memoized per run
    pub(crate) fn element_children(&self, parent: NodeId) -> Rc<Vec<NodeId>> {
        if let Some((run, list)) = self.engine.sibling_memo.borrow().get(&parent) {
            if *run == self.generation {
                return list.clone();
            }
        }
        let list: Rc<Vec<NodeId>> = Rc::new(
            self.tree
                .children(parent)
                .filter(|&c| self.tree.is_element(c))
                .collect(),
        );
        self.engine
            .sibling_memo
            .borrow_mut()
            .insert(parent, (self.generation, list.clone()));
        list
    }

    /// `:has` - nested existential sub-query relative to the element
    ///
    /// Candidates are the element's subtree; a branch led by a sibling
    /// combinator widens enumeration to the parent's subtree so sibling
    /// forms can reach the element's own siblings. The element itself is
    /// never a candidate. Runs under a fresh generation so inner memo
    /// writes can never be read back by the pass that is still in
    /// progress.
    pub(crate) fn run_existential(&self, compiled: &CompiledSelector, el: NodeId) -> bool {
        let root = if compiled.leading_sibling {
            self.tree.parent(el).unwrap_or(el)
        } else {
            el
        };
        let candidates: Vec<NodeId> = self
            .tree
            .descendants(root)
            .filter(|&d| d != el && self.tree.is_element(d))
            .collect();
        if candidates.is_empty() {
            return false;
        }
        let run = self.engine.next_run();
        let sub = QueryContext {
            tree: self.tree,
            engine: self.engine,
            scope: el,
            generation: run,
            ns: run,
            anchor: AnchorTarget::Scope,
        };
        exists_compiled(&sub, compiled, &candidates)
    }

    /// `:not` - does this single element match the compiled selector?
    ///
    /// Anchoring is disabled: negation asks about the element itself,
    /// not its position relative to the query context.
    pub(crate) fn matches_element(&self, compiled: &CompiledSelector, el: NodeId) -> bool {
        let sub = QueryContext {
            ns: self.ns | ANY_ANCHOR_BIT,
            anchor: AnchorTarget::Any,
            ..self.clone()
        };
        !run_compiled(&sub, compiled, &[el]).is_empty()
    }
}
