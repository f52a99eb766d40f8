//! Pseudo-class kinds and predicates
//!
//! A closed enum plus a name table: unknown pseudo names are rejected at
//! tokenize time, argument shapes are checked here, and the per-element
//! predicates live next to the kinds they implement. Positional
//! pseudo-classes are a separate kind entirely - they operate on the
//! ordered candidate set, not on single elements, and compile to the
//! set-matcher side of the engine.

use std::rc::Rc;

use selene_dom::NodeId;

use crate::compile::CompiledSelector;
use crate::engine::QueryContext;
use crate::error::{SelectorError, SelectorResult};

/// Positional pseudo-class over the ordered candidate set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positional {
    First,
    Last,
    Eq(i32),
    Even,
    Odd,
    Lt(i32),
    Gt(i32),
}

/// Pseudo-class as tokenized; nested selectors are still raw text
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoToken {
    Empty,
    Parent,
    Root,
    Checked,
    Selected,
    Enabled,
    Disabled,
    Header,
    Input,
    Button,
    Text,
    /// radio / checkbox / file / password / image
    TypedInput(String),
    /// submit / reset (input or button)
    SubmitReset(String),
    Has(String),
    Not(String),
    Contains(String),
    Lang(String),
    Positional(Positional),
}

/// Pseudo-class as compiled; nested selectors are compiled programs
#[derive(Debug, Clone)]
pub enum PseudoMatcher {
    Empty,
    Parent,
    Root,
    Checked,
    Selected,
    Enabled,
    Disabled,
    Header,
    Input,
    Button,
    Text,
    TypedInput(String),
    SubmitReset(String),
    Has(Rc<CompiledSelector>),
    Not(Rc<CompiledSelector>),
    Contains(String),
    Lang(String),
}

/// Resolve a pseudo-class name and raw argument into a kind
pub fn parse_pseudo(name: &str, arg: Option<&str>) -> SelectorResult<PseudoToken> {
    let no_arg = |kind: PseudoToken| -> SelectorResult<PseudoToken> {
        if arg.is_some() {
            Err(SelectorError::Requirement(format!(
                ":{name} does not take an argument"
            )))
        } else {
            Ok(kind)
        }
    };
    let required = || -> SelectorResult<&str> {
        arg.filter(|a| !a.is_empty())
            .ok_or_else(|| SelectorError::Requirement(format!(":{name} requires an argument")))
    };

    match name {
        "empty" => no_arg(PseudoToken::Empty),
        "parent" => no_arg(PseudoToken::Parent),
        "root" => no_arg(PseudoToken::Root),
        "checked" => no_arg(PseudoToken::Checked),
        "selected" => no_arg(PseudoToken::Selected),
        "enabled" => no_arg(PseudoToken::Enabled),
        "disabled" => no_arg(PseudoToken::Disabled),
        "header" => no_arg(PseudoToken::Header),
        "input" => no_arg(PseudoToken::Input),
        "button" => no_arg(PseudoToken::Button),
        "text" => no_arg(PseudoToken::Text),
        "radio" | "checkbox" | "file" | "password" | "image" => {
            no_arg(PseudoToken::TypedInput(name.to_string()))
        }
        "submit" | "reset" => no_arg(PseudoToken::SubmitReset(name.to_string())),
        "has" => Ok(PseudoToken::Has(required()?.to_string())),
        "not" => Ok(PseudoToken::Not(required()?.to_string())),
        "contains" => Ok(PseudoToken::Contains(unquote(required()?))),
        "lang" => Ok(PseudoToken::Lang(unquote(required()?).to_ascii_lowercase())),
        "first" => no_arg(PseudoToken::Positional(Positional::First)),
        "last" => no_arg(PseudoToken::Positional(Positional::Last)),
        "even" => no_arg(PseudoToken::Positional(Positional::Even)),
        "odd" => no_arg(PseudoToken::Positional(Positional::Odd)),
        "eq" => Ok(PseudoToken::Positional(Positional::Eq(int_arg(
            name,
            required()?,
        )?))),
        "lt" => Ok(PseudoToken::Positional(Positional::Lt(int_arg(
            name,
            required()?,
        )?))),
        "gt" => Ok(PseudoToken::Positional(Positional::Gt(int_arg(
            name,
            required()?,
        )?))),
        _ => Err(SelectorError::UnsupportedPseudo(name.to_string())),
    }
}

fn int_arg(name: &str, arg: &str) -> SelectorResult<i32> {
    arg.trim()
        .parse::<i32>()
        .map_err(|_| SelectorError::Requirement(format!(":{name} expects an integer, got {arg:?}")))
}

/// Strip matching quotes and resolve backslash escapes
fn unquote(s: &str) -> String {
    let cs: Vec<char> = s.chars().collect();
    let quoted = cs.len() >= 2 && (cs[0] == '"' || cs[0] == '\'') && cs[cs.len() - 1] == cs[0];
    if !quoted {
        return s.to_string();
    }
    let mut out = String::new();
    let mut i = 1;
    while i < cs.len() - 1 {
        if cs[i] == '\\' && i + 1 < cs.len() - 1 {
            out.push(cs[i + 1]);
            i += 2;
        } else {
            out.push(cs[i]);
            i += 1;
        }
    }
    out
}

/// Evaluate an element-kind pseudo-class against one element
pub fn matches_pseudo(ctx: &QueryContext<'_>, m: &PseudoMatcher, el: NodeId) -> bool {
    let tree = ctx.tree;
    match m {
        PseudoMatcher::Empty => is_empty(ctx, el),
        PseudoMatcher::Parent => !is_empty(ctx, el),
        PseudoMatcher::Root => tree.parent(el) == Some(tree.root()),
        PseudoMatcher::Checked => {
            let tag = tree.tag_name(el).unwrap_or("");
            (tag == "input" && tree.attr(el, "checked").is_some())
                || (tag == "option" && tree.attr(el, "selected").is_some())
        }
        PseudoMatcher::Selected => {
            tree.tag_name(el) == Some("option") && tree.attr(el, "selected").is_some()
        }
        PseudoMatcher::Enabled => disabled_state(ctx, el) == Some(false),
        PseudoMatcher::Disabled => disabled_state(ctx, el) == Some(true),
        PseudoMatcher::Header => matches!(
            tree.tag_name(el),
            Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        ),
        PseudoMatcher::Input => matches!(
            tree.tag_name(el),
            Some("input" | "select" | "textarea" | "button")
        ),
        PseudoMatcher::Button => {
            let tag = tree.tag_name(el).unwrap_or("");
            tag == "button" || (tag == "input" && input_type(ctx, el) == "button")
        }
        PseudoMatcher::Text => {
            tree.tag_name(el) == Some("input") && input_type(ctx, el) == "text"
        }
        PseudoMatcher::TypedInput(kind) => {
            tree.tag_name(el) == Some("input") && input_type(ctx, el) == *kind
        }
        PseudoMatcher::SubmitReset(kind) => {
            matches!(tree.tag_name(el), Some("input" | "button"))
                && input_type(ctx, el) == *kind
        }
        PseudoMatcher::Has(inner) => ctx.run_existential(inner, el),
        PseudoMatcher::Not(inner) => !ctx.matches_element(inner, el),
        PseudoMatcher::Contains(text) => tree.text_content(el).contains(text.as_str()),
        PseudoMatcher::Lang(code) => matches_lang(ctx, el, code),
    }
}

/// No element or text children (comments are ignored)
fn is_empty(ctx: &QueryContext<'_>, el: NodeId) -> bool {
    for child in ctx.tree.children(el) {
        if let Some(node) = ctx.tree.get(child) {
            if node.is_element() || node.is_text() {
                return false;
            }
        }
    }
    true
}

/// The `type` attribute, defaulting to `text` for inputs
fn input_type(ctx: &QueryContext<'_>, el: NodeId) -> String {
    match ctx.tree.attr(el, "type") {
        Some(t) => t.to_ascii_lowercase(),
        None if ctx.tree.tag_name(el) == Some("input") => "text".to_string(),
        None => String::new(),
    }
}

/// Disabled state for form controls; None for elements that cannot be disabled
fn disabled_state(ctx: &QueryContext<'_>, el: NodeId) -> Option<bool> {
    let tree = ctx.tree;
    let tag = tree.tag_name(el)?;
    match tag {
        "option" => {
            // an option is disabled by its own attribute or its optgroup's;
            // the optgroup takes precedence over an enabled option
            if tree.attr(el, "disabled").is_some() {
                return Some(true);
            }
            let in_disabled_optgroup = tree
                .parent(el)
                .filter(|&p| tree.tag_name(p) == Some("optgroup"))
                .map(|p| tree.attr(p, "disabled").is_some())
                .unwrap_or(false);
            Some(in_disabled_optgroup)
        }
        "optgroup" => Some(tree.attr(el, "disabled").is_some()),
        "input" | "select" | "textarea" | "button" | "fieldset" => {
            if tree.attr(el, "disabled").is_some() {
                return Some(true);
            }
            Some(in_disabled_fieldset(ctx, el))
        }
        _ => None,
    }
}

/// Disabling inherited from an ancestor disabled fieldset, except for
/// controls inside that fieldset's first legend
fn in_disabled_fieldset(ctx: &QueryContext<'_>, el: NodeId) -> bool {
    let tree = ctx.tree;
    let mut node = el;
    while let Some(p) = tree.parent(node) {
        if tree.tag_name(p) == Some("fieldset") && tree.attr(p, "disabled").is_some() {
            let first_legend = tree
                .children(p)
                .find(|&c| tree.tag_name(c) == Some("legend"));
            let exempt = first_legend
                .map(|legend| legend == el || tree.contains(legend, el))
                .unwrap_or(false);
            if !exempt {
                return true;
            }
        }
        node = p;
    }
    false
}

fn matches_lang(ctx: &QueryContext<'_>, el: NodeId, code: &str) -> bool {
    let tree = ctx.tree;
    let mut node = Some(el);
    while let Some(n) = node {
        if let Some(lang) = tree.attr(n, "lang") {
            let lang = lang.to_ascii_lowercase();
            return lang == code || lang.starts_with(&format!("{code}-"));
        }
        node = tree.parent(n);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_table_rejects_bad_arguments() {
        assert!(matches!(
            parse_pseudo("first", Some("1")),
            Err(SelectorError::Requirement(_))
        ));
        assert!(matches!(
            parse_pseudo("eq", None),
            Err(SelectorError::Requirement(_))
        ));
        assert!(matches!(
            parse_pseudo("eq", Some("x")),
            Err(SelectorError::Requirement(_))
        ));
        assert!(matches!(
            parse_pseudo("hover", None),
            Err(SelectorError::UnsupportedPseudo(_))
        ));
    }

    #[test]
    fn quoted_arguments_are_unwrapped() {
        assert_eq!(
            parse_pseudo("contains", Some("'Hello'")).unwrap(),
            PseudoToken::Contains("Hello".into())
        );
        assert_eq!(
            parse_pseudo("contains", Some("\"a'b\"")).unwrap(),
            PseudoToken::Contains("a'b".into())
        );
        assert_eq!(
            parse_pseudo("lang", Some("EN")).unwrap(),
            PseudoToken::Lang("en".into())
        );
    }

    #[test]
    fn positional_arguments() {
        assert_eq!(
            parse_pseudo("eq", Some("-1")).unwrap(),
            PseudoToken::Positional(Positional::Eq(-1))
        );
        assert_eq!(
            parse_pseudo("gt", Some(" 2 ")).unwrap(),
            PseudoToken::Positional(Positional::Gt(2))
        );
    }
}
