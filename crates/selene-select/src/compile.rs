//! Token-group compiler and matcher execution
//!
//! A group with no positional pseudo folds into a single element chain.
//! A positional pseudo splits the group into a set pipeline: the prefix
//! chain bounds the candidate set, each positional slices the ordered
//! set by index, and trailing tokens either filter the survivors in
//! place or re-find relatives of them. The two compiled kinds are
//! distinct variants and are never interchangeable.

use std::collections::HashSet;
use std::rc::Rc;

use selene_dom::NodeId;

use crate::combinator::{matches_chain, ElementChain, Step};
use crate::engine::{QueryContext, SelectorEngine};
use crate::error::{SelectorError, SelectorResult};
use crate::matcher::SimpleMatcher;
use crate::pseudo::{Positional, PseudoMatcher, PseudoToken};
use crate::tokenizer::{Token, TokenGroup, TokenKind};

/// A fully compiled selector: one branch per comma group
#[derive(Debug)]
pub struct CompiledSelector {
    /// The exact selector text this was compiled from
    pub source: String,
    pub branches: Vec<Branch>,
    /// Some branch opens with a sibling combinator; relative sub-queries
    /// must then enumerate candidates from the parent's subtree
    pub leading_sibling: bool,
}

/// Element matchers test one node; set matchers rewrite the candidate set
#[derive(Debug)]
pub enum Branch {
    Element(ElementChain),
    Set(SetPipeline),
}

/// Prefix chain plus positional stages
#[derive(Debug)]
pub struct SetPipeline {
    pub first: ElementChain,
    pub stages: Vec<Stage>,
}

#[derive(Debug)]
pub struct Stage {
    /// Consecutive positional pseudos, applied to the ordered set in turn
    pub positionals: Vec<Positional>,
    /// Same-compound tokens after the positionals: filter survivors in place
    pub compound: Option<ElementChain>,
    /// Combinator-led remainder: re-find candidates that reach a survivor
    pub finder: Option<ElementChain>,
}

fn positional_of(token: &Token) -> Option<Positional> {
    match &token.kind {
        TokenKind::Pseudo(PseudoToken::Positional(p)) => Some(*p),
        _ => None,
    }
}

fn is_combinator(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Combinator(_))
}

impl SelectorEngine {
    pub(crate) fn compile_groups(
        &self,
        source: &str,
        groups: &[TokenGroup],
    ) -> SelectorResult<CompiledSelector> {
        let branches = groups
            .iter()
            .map(|g| self.compile_group(g))
            .collect::<SelectorResult<Vec<_>>>()?;
        let leading_sibling = groups.iter().any(|g| {
            matches!(
                g.first().map(|t| &t.kind),
                Some(TokenKind::Combinator(c)) if c.is_sibling()
            )
        });
        Ok(CompiledSelector {
            source: source.to_string(),
            branches,
            leading_sibling,
        })
    }

    fn compile_group(&self, tokens: &[Token]) -> SelectorResult<Branch> {
        let Some(first_pos) = tokens.iter().position(|t| positional_of(t).is_some()) else {
            return Ok(Branch::Element(self.compile_chain(tokens)?));
        };

        let first = self.compile_chain(&tokens[..first_pos])?;
        let mut stages = Vec::new();
        let mut i = first_pos;
        while i < tokens.len() {
            let mut positionals = Vec::new();
            while let Some(p) = tokens.get(i).and_then(positional_of) {
                positionals.push(p);
                i += 1;
            }
            let seg_start = i;
            while i < tokens.len() && positional_of(&tokens[i]).is_none() {
                i += 1;
            }
            let seg = &tokens[seg_start..i];
            let split = seg.iter().position(is_combinator).unwrap_or(seg.len());
            let compound = if split == 0 {
                None
            } else {
                Some(self.compile_bare_compound(&seg[..split])?)
            };
            let finder = if split == seg.len() {
                None
            } else {
                Some(self.compile_chain(&seg[split..])?)
            };
            stages.push(Stage {
                positionals,
                compound,
                finder,
            });
        }
        Ok(Branch::Set(SetPipeline { first, stages }))
    }

    /// Fold a token run into an anchored element chain
    fn compile_chain(&self, tokens: &[Token]) -> SelectorResult<ElementChain> {
        let mut idx = 0;
        let mut leading = None;
        if let Some(Token {
            kind: TokenKind::Combinator(c),
            ..
        }) = tokens.first()
        {
            leading = Some(*c);
            idx = 1;
        }
        let mut steps = vec![Step::Anchor { leading }];
        for token in &tokens[idx..] {
            match &token.kind {
                TokenKind::Combinator(c) => {
                    steps = vec![Step::Relative {
                        combinator: *c,
                        inner: ElementChain(steps),
                        site: self.fresh_site(),
                    }];
                }
                _ => steps.push(Step::Simple(self.lower_simple(token)?)),
            }
        }
        Ok(ElementChain(steps))
    }

    /// Simple steps only, no anchor: used for in-place survivor filtering
    fn compile_bare_compound(&self, tokens: &[Token]) -> SelectorResult<ElementChain> {
        let steps = tokens
            .iter()
            .map(|t| self.lower_simple(t).map(Step::Simple))
            .collect::<SelectorResult<Vec<_>>>()?;
        Ok(ElementChain(steps))
    }

    fn lower_simple(&self, token: &Token) -> SelectorResult<SimpleMatcher> {
        match &token.kind {
            TokenKind::Universal => Ok(SimpleMatcher::Universal),
            TokenKind::Tag(tag) => Ok(SimpleMatcher::Tag(tag.to_ascii_lowercase())),
            TokenKind::Id(id) => Ok(SimpleMatcher::Id(id.clone())),
            TokenKind::Class(class) => Ok(SimpleMatcher::Class(class.clone())),
            TokenKind::Attr { name, op, value } => Ok(SimpleMatcher::Attr {
                name: name.clone(),
                op: *op,
                value: value.clone(),
            }),
            TokenKind::Child {
                kind,
                of_type,
                step,
                offset,
            } => Ok(SimpleMatcher::Child {
                kind: *kind,
                of_type: *of_type,
                step: *step,
                offset: *offset,
            }),
            TokenKind::Pseudo(p) => Ok(SimpleMatcher::Pseudo(self.lower_pseudo(p)?)),
            // combinators and positionals are consumed structurally above
            TokenKind::Combinator(_) => Err(SelectorError::Syntax(token.text.clone())),
        }
    }

    fn lower_pseudo(&self, pseudo: &PseudoToken) -> SelectorResult<PseudoMatcher> {
        Ok(match pseudo {
            PseudoToken::Empty => PseudoMatcher::Empty,
            PseudoToken::Parent => PseudoMatcher::Parent,
            PseudoToken::Root => PseudoMatcher::Root,
            PseudoToken::Checked => PseudoMatcher::Checked,
            PseudoToken::Selected => PseudoMatcher::Selected,
            PseudoToken::Enabled => PseudoMatcher::Enabled,
            PseudoToken::Disabled => PseudoMatcher::Disabled,
            PseudoToken::Header => PseudoMatcher::Header,
            PseudoToken::Input => PseudoMatcher::Input,
            PseudoToken::Button => PseudoMatcher::Button,
            PseudoToken::Text => PseudoMatcher::Text,
            PseudoToken::TypedInput(kind) => PseudoMatcher::TypedInput(kind.clone()),
            PseudoToken::SubmitReset(kind) => PseudoMatcher::SubmitReset(kind.clone()),
            PseudoToken::Has(inner) => PseudoMatcher::Has(self.compile(inner)?),
            PseudoToken::Not(inner) => PseudoMatcher::Not(self.compile(inner)?),
            PseudoToken::Contains(text) => PseudoMatcher::Contains(text.clone()),
            PseudoToken::Lang(code) => PseudoMatcher::Lang(code.clone()),
            PseudoToken::Positional(_) => {
                // a positional can only appear where the group splitter
                // extracts it; reaching here means it sat in a bare-compound
                // position it cannot occupy
                return Err(SelectorError::Syntax(String::new()));
            }
        })
    }
}

/// Run a compiled selector over an ordered candidate list
///
/// Candidates are supplied in document (or seed) order; element branches
/// preserve that order by construction, and set-branch output is folded
/// back through the same ordered list, so the result needs no final sort.
pub(crate) fn run_compiled(
    ctx: &QueryContext<'_>,
    compiled: &CompiledSelector,
    candidates: &[NodeId],
) -> Vec<NodeId> {
    let mut set_matched: Option<HashSet<NodeId>> = None;
    for branch in &compiled.branches {
        if let Branch::Set(pipe) = branch {
            let matched = run_set(ctx, pipe, candidates);
            set_matched
                .get_or_insert_with(HashSet::new)
                .extend(matched);
        }
    }
    candidates
        .iter()
        .copied()
        .filter(|&el| {
            compiled.branches.iter().any(|b| match b {
                Branch::Element(chain) => matches_chain(ctx, chain, el),
                Branch::Set(_) => false,
            }) || set_matched.as_ref().map(|s| s.contains(&el)).unwrap_or(false)
        })
        .collect()
}

/// Existence check with element-branch short-circuiting
pub(crate) fn exists_compiled(
    ctx: &QueryContext<'_>,
    compiled: &CompiledSelector,
    candidates: &[NodeId],
) -> bool {
    for branch in &compiled.branches {
        match branch {
            Branch::Element(chain) => {
                if candidates.iter().any(|&el| matches_chain(ctx, chain, el)) {
                    return true;
                }
            }
            Branch::Set(pipe) => {
                if !run_set(ctx, pipe, candidates).is_empty() {
                    return true;
                }
            }
        }
    }
    false
}

fn run_set(ctx: &QueryContext<'_>, pipe: &SetPipeline, candidates: &[NodeId]) -> Vec<NodeId> {
    let mut current: Vec<NodeId> = candidates
        .iter()
        .copied()
        .filter(|&el| matches_chain(ctx, &pipe.first, el))
        .collect();

    for stage in &pipe.stages {
        for &pos in &stage.positionals {
            current = apply_positional(pos, current);
        }
        if let Some(compound) = &stage.compound {
            current.retain(|&el| matches_chain(ctx, compound, el));
        }
        if let Some(finder) = &stage.finder {
            let survivors: Rc<HashSet<NodeId>> = Rc::new(current.iter().copied().collect());
            let sub = ctx.with_anchor_set(survivors);
            current = candidates
                .iter()
                .copied()
                .filter(|&el| matches_chain(&sub, finder, el))
                .collect();
        }
    }
    current
}

/// Index-slice the ordered set; "first" means first of the matched set
fn apply_positional(pos: Positional, list: Vec<NodeId>) -> Vec<NodeId> {
    let len = list.len() as i32;
    let resolve = |arg: i32| if arg < 0 { arg + len } else { arg };
    match pos {
        Positional::First => list.into_iter().take(1).collect(),
        Positional::Last => {
            let skip = list.len().saturating_sub(1);
            list.into_iter().skip(skip).collect()
        }
        Positional::Eq(arg) => {
            let want = resolve(arg);
            list.into_iter()
                .enumerate()
                .filter(|(i, _)| *i as i32 == want)
                .map(|(_, el)| el)
                .collect()
        }
        Positional::Even => list
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 0)
            .map(|(_, el)| el)
            .collect(),
        Positional::Odd => list
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 1)
            .map(|(_, el)| el)
            .collect(),
        Positional::Lt(arg) => {
            let bound = resolve(arg);
            list.into_iter()
                .enumerate()
                .filter(|(i, _)| (*i as i32) < bound)
                .map(|(_, el)| el)
                .collect()
        }
        Positional::Gt(arg) => {
            let bound = resolve(arg);
            list.into_iter()
                .enumerate()
                .filter(|(i, _)| (*i as i32) > bound)
                .map(|(_, el)| el)
                .collect()
        }
    }
}
