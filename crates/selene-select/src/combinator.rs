//! Combinator composition
//!
//! An element chain is a conjunction of steps tested against one
//! candidate. A Relative step wraps everything to its left behind a
//! directional walk; the walking variants (descendant, general sibling)
//! memoize their boolean result per visited node so one query never
//! re-walks the same subtree for the same compile site.

use selene_dom::NodeId;

use crate::engine::QueryContext;
use crate::matcher::{matches_simple, SimpleMatcher};
use crate::tokenizer::Combinator;

/// Identity of one Relative step within a compiled selector
pub type SiteId = u32;

/// Conjunction of steps over a single candidate element
#[derive(Debug, Clone)]
pub struct ElementChain(pub Vec<Step>);

#[derive(Debug, Clone)]
pub enum Step {
    /// One simple-selector test
    Simple(SimpleMatcher),
    /// Query-context membership for the leftmost compound
    Anchor { leading: Option<Combinator> },
    /// The chain to the left, reached through a combinator
    Relative {
        combinator: Combinator,
        inner: ElementChain,
        site: SiteId,
    },
}

/// Test a candidate element against a whole chain
pub fn matches_chain(ctx: &QueryContext<'_>, chain: &ElementChain, el: NodeId) -> bool {
    chain.0.iter().all(|step| matches_step(ctx, step, el))
}

fn matches_step(ctx: &QueryContext<'_>, step: &Step, el: NodeId) -> bool {
    match step {
        Step::Simple(m) => matches_simple(ctx, m, el),
        Step::Anchor { leading } => matches_anchor(ctx, *leading, el),
        Step::Relative {
            combinator,
            inner,
            site,
        } => match combinator {
            Combinator::Child => match ctx.tree.parent(el) {
                Some(p) if ctx.tree.is_element(p) => matches_chain(ctx, inner, p),
                _ => false,
            },
            Combinator::NextSibling => match prev_element(ctx, el) {
                Some(p) => matches_chain(ctx, inner, p),
                None => false,
            },
            Combinator::Descendant => walk_memoized(ctx, el, Axis::Ancestors, inner, *site),
            Combinator::SubsequentSibling => {
                walk_memoized(ctx, el, Axis::PrevSiblings, inner, *site)
            }
        },
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Ancestors,
    PrevSiblings,
}

fn advance(ctx: &QueryContext<'_>, from: NodeId, axis: Axis) -> Option<NodeId> {
    match axis {
        Axis::Ancestors => ctx.tree.parent(from),
        Axis::PrevSiblings => ctx.tree.prev_sibling(from),
    }
}

/// Walk an "all" combinator axis until the inner chain matches
///
/// Every visited element gets the final boolean stamped into the side
/// table, so later candidates sharing the path answer from the memo.
fn walk_memoized(
    ctx: &QueryContext<'_>,
    el: NodeId,
    axis: Axis,
    inner: &ElementChain,
    site: SiteId,
) -> bool {
    let mut visited: Vec<NodeId> = Vec::new();
    let mut result = false;
    let mut cur = advance(ctx, el, axis);
    while let Some(n) = cur {
        if ctx.tree.is_element(n) {
            if let Some(hit) = ctx.dir_memo_get(n, site) {
                result = hit;
                break;
            }
            visited.push(n);
            if matches_chain(ctx, inner, n) {
                result = true;
                break;
            }
        }
        cur = advance(ctx, n, axis);
    }
    for v in visited {
        ctx.dir_memo_set(v, site, result);
    }
    result
}

fn matches_anchor(ctx: &QueryContext<'_>, leading: Option<Combinator>, el: NodeId) -> bool {
    if ctx.anchor_is_any() {
        return true;
    }
    match leading {
        // implicit: the compound sits at or under the query context
        None => ctx.anchor_hits(el) || any_ancestor_hits(ctx, el),
        Some(Combinator::Descendant) => any_ancestor_hits(ctx, el),
        Some(Combinator::Child) => ctx
            .tree
            .parent(el)
            .map(|p| ctx.anchor_hits(p))
            .unwrap_or(false),
        Some(Combinator::NextSibling) => prev_element(ctx, el)
            .map(|p| ctx.anchor_hits(p))
            .unwrap_or(false),
        Some(Combinator::SubsequentSibling) => {
            let mut cur = ctx.tree.prev_sibling(el);
            while let Some(n) = cur {
                if ctx.tree.is_element(n) && ctx.anchor_hits(n) {
                    return true;
                }
                cur = ctx.tree.prev_sibling(n);
            }
            false
        }
    }
}

fn any_ancestor_hits(ctx: &QueryContext<'_>, el: NodeId) -> bool {
    let mut cur = ctx.tree.parent(el);
    while let Some(n) = cur {
        if ctx.anchor_hits(n) {
            return true;
        }
        cur = ctx.tree.parent(n);
    }
    false
}

fn prev_element(ctx: &QueryContext<'_>, el: NodeId) -> Option<NodeId> {
    let mut cur = ctx.tree.prev_sibling(el);
    while let Some(n) = cur {
        if ctx.tree.is_element(n) {
            return Some(n);
        }
        cur = ctx.tree.prev_sibling(n);
    }
    None
}
