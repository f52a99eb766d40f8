//! Per-token element matchers
//!
//! One data variant per simple-selector kind; `matches_simple` is the
//! single evaluation entry. Sibling-position pseudos memoize the element
//! child list per parent through the query context.

use selene_dom::NodeId;

use crate::engine::QueryContext;
use crate::pseudo::{matches_pseudo, PseudoMatcher};
use crate::tokenizer::{AttrOp, ChildKind};

/// Compiled form of one non-combinator token
#[derive(Debug, Clone)]
pub enum SimpleMatcher {
    Universal,
    /// Tag name, lowercased at compile time
    Tag(String),
    Id(String),
    Class(String),
    Attr {
        name: String,
        op: AttrOp,
        value: Option<String>,
    },
    Child {
        kind: ChildKind,
        of_type: bool,
        step: i32,
        offset: i32,
    },
    Pseudo(PseudoMatcher),
}

/// Test one element against one simple matcher
pub fn matches_simple(ctx: &QueryContext<'_>, m: &SimpleMatcher, el: NodeId) -> bool {
    if !ctx.tree.is_element(el) {
        return false;
    }
    match m {
        SimpleMatcher::Universal => true,
        SimpleMatcher::Tag(tag) => ctx.tree.tag_name(el) == Some(tag.as_str()),
        SimpleMatcher::Id(id) => ctx.tree.attr(el, "id") == Some(id.as_str()),
        SimpleMatcher::Class(class) => ctx.tree.has_class(el, class),
        SimpleMatcher::Attr { name, op, value } => {
            matches_attr(ctx, el, name, *op, value.as_deref())
        }
        SimpleMatcher::Child {
            kind,
            of_type,
            step,
            offset,
        } => matches_child(ctx, el, *kind, *of_type, *step, *offset),
        SimpleMatcher::Pseudo(p) => matches_pseudo(ctx, p, el),
    }
}

/// The seven attribute operators; a missing attribute satisfies only `!=`
fn matches_attr(
    ctx: &QueryContext<'_>,
    el: NodeId,
    name: &str,
    op: AttrOp,
    value: Option<&str>,
) -> bool {
    let value = value.unwrap_or("");
    if op == AttrOp::Exists {
        return ctx.tree.attr(el, name).is_some();
    }
    if op == AttrOp::NotEqual {
        return ctx.tree.attr(el, name) != Some(value);
    }
    let Some(actual) = ctx.tree.attr(el, name) else {
        return false;
    };
    match op {
        AttrOp::Equals => actual == value,
        AttrOp::Prefix => !value.is_empty() && actual.starts_with(value),
        AttrOp::Suffix => !value.is_empty() && actual.ends_with(value),
        AttrOp::Substring => !value.is_empty() && actual.contains(value),
        AttrOp::Includes => actual.split_ascii_whitespace().any(|t| t == value),
        AttrOp::DashMatch => {
            actual == value
                || (actual.len() > value.len()
                    && actual.starts_with(value)
                    && actual[value.len()..].starts_with('-'))
        }
        AttrOp::Exists | AttrOp::NotEqual => false,
    }
}

fn matches_child(
    ctx: &QueryContext<'_>,
    el: NodeId,
    kind: ChildKind,
    of_type: bool,
    step: i32,
    offset: i32,
) -> bool {
    match kind {
        ChildKind::First => prev_matching(ctx, el, of_type).is_none(),
        ChildKind::Last => next_matching(ctx, el, of_type).is_none(),
        ChildKind::Only => {
            prev_matching(ctx, el, of_type).is_none() && next_matching(ctx, el, of_type).is_none()
        }
        ChildKind::Nth | ChildKind::NthLast => {
            let Some(idx) = sibling_index(ctx, el, of_type, kind == ChildKind::NthLast) else {
                return false;
            };
            let diff = idx as i32 - offset;
            if step == 0 {
                diff == 0
            } else {
                diff % step == 0 && diff / step >= 0
            }
        }
    }
}

/// Nearest previous element sibling, optionally restricted to the same tag
pub(crate) fn prev_matching(ctx: &QueryContext<'_>, el: NodeId, of_type: bool) -> Option<NodeId> {
    let tag = ctx.tree.tag_name(el);
    let mut cur = ctx.tree.prev_sibling(el);
    while let Some(n) = cur {
        if ctx.tree.is_element(n) && (!of_type || ctx.tree.tag_name(n) == tag) {
            return Some(n);
        }
        cur = ctx.tree.prev_sibling(n);
    }
    None
}

fn next_matching(ctx: &QueryContext<'_>, el: NodeId, of_type: bool) -> Option<NodeId> {
    let tag = ctx.tree.tag_name(el);
    let mut cur = ctx.tree.next_sibling(el);
    while let Some(n) = cur {
        if ctx.tree.is_element(n) && (!of_type || ctx.tree.tag_name(n) == tag) {
            return Some(n);
        }
        cur = ctx.tree.next_sibling(n);
    }
    None
}

/// 1-based index among element siblings, from the end for -last- variants
fn sibling_index(ctx: &QueryContext<'_>, el: NodeId, of_type: bool, from_end: bool) -> Option<usize> {
    let parent = ctx.tree.parent(el)?;
    let siblings = ctx.element_children(parent);
    let tag = ctx.tree.tag_name(el);
    let mut count = 0usize;
    let mut found = None;
    for &sib in siblings.iter() {
        if of_type && ctx.tree.tag_name(sib) != tag {
            continue;
        }
        count += 1;
        if sib == el {
            found = Some(count);
        }
    }
    let idx = found?;
    Some(if from_end { count - idx + 1 } else { idx })
}
