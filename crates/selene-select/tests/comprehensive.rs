//! Comprehensive tests for selene-select
//!
//! End-to-end queries over a small document covering combinators,
//! attribute operators, pseudo-classes, positional pipelines, grouping,
//! and error handling.

use selene_dom::{DomTree, NodeId};
use selene_select::{SelectorEngine, SelectorError};

fn el(t: &mut DomTree, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let id = t.create_element_with_attrs(tag, attrs);
    t.append_child(parent, id).unwrap();
    id
}

fn txt(t: &mut DomTree, parent: NodeId, text: &str) {
    let id = t.create_text(text);
    t.append_child(parent, id).unwrap();
}

struct Fixture {
    tree: DomTree,
    main: NodeId,
    p1: NodeId,
    p2: NodeId,
    list: NodeId,
    lis: Vec<NodeId>,
    a1: NodeId,
    a2: NodeId,
    hidden_div: NodeId,
    tail: NodeId,
    span: NodeId,
    em: NodeId,
}

/// <div id="main" class="container">
///   <p class="note">first para Hello</p>
///   <p>second para hello</p>
///   <ul id="list">
///     <li class="a">one</li>
///     <li class="b hidden">two</li>
///     <li class="a">three</li>
///     <li class="b">four</li>
///   </ul>
///   <a href="https://example.org" rel="nofollow friend">link</a>
///   <a href="http://example.org">plain</a>
/// </div>
/// <div class="hidden">x</div>
/// <div class="tail"><span lang="en-US"><em>deep</em></span></div>
fn fixture() -> Fixture {
    let mut t = DomTree::new();
    let root = t.root();
    let main = el(&mut t, root, "div", &[("id", "main"), ("class", "container")]);
    let p1 = el(&mut t, main, "p", &[("class", "note")]);
    txt(&mut t, p1, "first para Hello");
    let p2 = el(&mut t, main, "p", &[]);
    txt(&mut t, p2, "second para hello");
    let list = el(&mut t, main, "ul", &[("id", "list")]);
    let classes = ["a", "b hidden", "a", "b"];
    let texts = ["one", "two", "three", "four"];
    let mut lis = Vec::new();
    for (class, text) in classes.iter().zip(texts) {
        let li = el(&mut t, list, "li", &[("class", class)]);
        txt(&mut t, li, text);
        lis.push(li);
    }
    let a1 = el(
        &mut t,
        main,
        "a",
        &[("href", "https://example.org"), ("rel", "nofollow friend")],
    );
    txt(&mut t, a1, "link");
    let a2 = el(&mut t, main, "a", &[("href", "http://example.org")]);
    txt(&mut t, a2, "plain");
    let hidden_div = el(&mut t, root, "div", &[("class", "hidden")]);
    txt(&mut t, hidden_div, "x");
    let tail = el(&mut t, root, "div", &[("class", "tail")]);
    let span = el(&mut t, tail, "span", &[("lang", "en-US")]);
    let em = el(&mut t, span, "em", &[]);
    txt(&mut t, em, "deep");
    Fixture {
        tree: t,
        main,
        p1,
        p2,
        list,
        lis,
        a1,
        a2,
        hidden_div,
        tail,
        span,
        em,
    }
}

#[test]
fn test_tag_id_class_collections() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("p", &f.tree, f.tree.root()).unwrap(),
        vec![f.p1, f.p2]
    );
    assert_eq!(
        engine.select("#list", &f.tree, f.tree.root()).unwrap(),
        vec![f.list]
    );
    assert_eq!(
        engine.select(".a", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[0], f.lis[2]]
    );
    assert_eq!(
        engine.select("li", &f.tree, f.tree.root()).unwrap(),
        f.lis
    );
}

#[test]
fn test_results_strictly_ascending_in_document_order() {
    let f = fixture();
    let engine = SelectorEngine::new();
    let got = engine
        .select("a, li, p, div", &f.tree, f.tree.root())
        .unwrap();
    assert_eq!(got.len(), 11);
    let positions: Vec<usize> = got.iter().map(|&n| f.tree.document_position(n)).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_grouping_dedups_overlapping_branches() {
    let f = fixture();
    let engine = SelectorEngine::new();
    // p.note is hit by both branches but appears once
    assert_eq!(
        engine
            .select("p, .note, ul li.a", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.p1, f.p2, f.lis[0], f.lis[2]]
    );
}

#[test]
fn test_idempotent_across_cache_states() {
    let f = fixture();
    let engine = SelectorEngine::new();
    let first = engine
        .select("ul li:nth-child(odd)", &f.tree, f.tree.root())
        .unwrap();
    let second = engine
        .select("ul li:nth-child(odd)", &f.tree, f.tree.root())
        .unwrap();
    let third = engine
        .select("ul li:nth-child(odd)", &f.tree, f.tree.root())
        .unwrap();
    assert_eq!(first, vec![f.lis[0], f.lis[2]]);
    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[test]
fn test_descendant_and_child_combinators() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("div em", &f.tree, f.tree.root()).unwrap(),
        vec![f.em]
    );
    assert_eq!(
        engine.select("div > em", &f.tree, f.tree.root()).unwrap(),
        vec![]
    );
    assert_eq!(
        engine.select("#main > ul > li", &f.tree, f.tree.root()).unwrap(),
        f.lis
    );
    assert_eq!(
        engine
            .select("div > p.note:first-child", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.p1]
    );
}

#[test]
fn test_sibling_combinators() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("p + p", &f.tree, f.tree.root()).unwrap(),
        vec![f.p2]
    );
    assert_eq!(
        engine.select("p ~ a", &f.tree, f.tree.root()).unwrap(),
        vec![f.a1, f.a2]
    );
    assert_eq!(
        engine.select(".a + .b", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[1], f.lis[3]]
    );
    assert_eq!(
        engine.select("ul + a", &f.tree, f.tree.root()).unwrap(),
        vec![f.a1]
    );
}

#[test]
fn test_leading_combinators_are_context_relative() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(engine.select("> li", &f.tree, f.list).unwrap(), f.lis);
    assert_eq!(engine.select("> em", &f.tree, f.span).unwrap(), vec![f.em]);
    assert_eq!(engine.select("+ p", &f.tree, f.p1).unwrap(), vec![f.p2]);
    assert_eq!(
        engine.select("~ a", &f.tree, f.p1).unwrap(),
        vec![f.a1, f.a2]
    );
}

#[test]
fn test_scoped_context() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(engine.select("li", &f.tree, f.list).unwrap(), f.lis);
    assert_eq!(engine.select("li", &f.tree, f.p1).unwrap(), vec![]);
    assert_eq!(
        engine.select(".hidden", &f.tree, f.main).unwrap(),
        vec![f.lis[1]]
    );
}

#[test]
fn test_id_narrowing_fast_path() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("#list .a", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[0], f.lis[2]]
    );
    assert_eq!(
        engine.select("#nope li", &f.tree, f.tree.root()).unwrap(),
        vec![]
    );
}

#[test]
fn test_attr_operator_truth_table() {
    let mut t = DomTree::new();
    let subject = el(&mut t, NodeId::ROOT, "i", &[("x", "abc")]);
    let engine = SelectorEngine::new();
    let check = |sel: &str| engine.matches_selector(&t, subject, sel).unwrap();

    assert!(check("[x]"));
    assert!(check("[x=abc]"));
    assert!(!check("[x=ab]"));
    assert!(!check("[x!=abc]"));
    assert!(check("[x!=ab]"));
    assert!(check("[x^=a]"));
    assert!(!check("[x^=b]"));
    assert!(check("[x$=c]"));
    assert!(!check("[x$=b]"));
    assert!(check("[x*=b]"));
    assert!(!check("[x*=d]"));
    assert!(check("[x~=abc]"));
    assert!(!check("[x~=ab]"));
    assert!(check("[x|=abc]"));
    assert!(!check("[x|=a]"));

    // empty needle never matches the substring family
    assert!(!check("[x^='']"));
    assert!(!check("[x$='']"));
    assert!(!check("[x*='']"));

    // a missing attribute satisfies only !=
    assert!(!check("[y]"));
    assert!(!check("[y=abc]"));
    assert!(check("[y!=abc]"));
    assert!(!check("[y^=a]"));
}

#[test]
fn test_attr_includes_and_dash_match() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("a[rel~=friend]", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.a1]
    );
    assert_eq!(
        engine
            .select("a[rel~=frie]", &f.tree, f.tree.root())
            .unwrap(),
        vec![]
    );
    assert_eq!(
        engine
            .select("span[lang|=en]", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.span]
    );
}

#[test]
fn test_attr_prefix_quoted() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("a[href^='https']", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.a1]
    );
}

#[test]
fn test_nth_child_family() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("li:nth-child(2n+1)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[0], f.lis[2]]
    );
    assert_eq!(
        engine
            .select("li:nth-child(even)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[1], f.lis[3]]
    );
    assert_eq!(
        engine
            .select("li:nth-child(2)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[1]]
    );
    assert_eq!(
        engine
            .select("li:nth-last-child(1)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[3]]
    );
    assert_eq!(
        engine
            .select("li:nth-child(-n+2)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[0], f.lis[1]]
    );
}

#[test]
fn test_first_last_only_of_type() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("#main > :first-child", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.p1]
    );
    assert_eq!(
        engine
            .select("a:first-of-type", &f.tree, f.main)
            .unwrap(),
        vec![f.a1]
    );
    assert_eq!(
        engine.select("p:last-of-type", &f.tree, f.main).unwrap(),
        vec![f.p2]
    );
    assert_eq!(
        engine
            .select("ul:only-of-type", &f.tree, f.main)
            .unwrap(),
        vec![f.list]
    );
    assert_eq!(
        engine.select("li:only-child", &f.tree, f.main).unwrap(),
        vec![]
    );
}

#[test]
fn test_positional_pseudos_slice_the_matched_set() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("li:eq(0)", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[0]]
    );
    assert_eq!(
        engine.select("li:eq(-1)", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[3]]
    );
    assert_eq!(
        engine.select("li:first", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[0]]
    );
    assert_eq!(
        engine.select("li:last", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[3]]
    );
    assert_eq!(
        engine.select("li:even", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[0], f.lis[2]]
    );
    assert_eq!(
        engine.select("li:odd", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[1], f.lis[3]]
    );
    assert_eq!(
        engine.select("li:gt(1)", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[2], f.lis[3]]
    );
    assert_eq!(
        engine.select("li:lt(2)", &f.tree, f.tree.root()).unwrap(),
        vec![f.lis[0], f.lis[1]]
    );
}

#[test]
fn test_positional_is_relative_to_the_matched_set_not_siblings() {
    let f = fixture();
    let engine = SelectorEngine::new();
    // .b elements are the 2nd and 4th children; :first slices the .b set
    assert_eq!(
        engine
            .select("li.b:first", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[1]]
    );
    assert_eq!(
        engine.select("li:eq(0)", &f.tree, f.list).unwrap(),
        vec![f.lis[0]]
    );
}

#[test]
fn test_positional_with_trailing_tokens() {
    let f = fixture();
    let engine = SelectorEngine::new();
    // compound continuation filters survivors in place
    assert_eq!(
        engine
            .select("li:lt(3).a", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[0], f.lis[2]]
    );
    // combinator continuation re-finds relatives of the survivors
    assert_eq!(
        engine
            .select("li:first ~ li", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[1], f.lis[2], f.lis[3]]
    );
    assert_eq!(
        engine
            .select("div:first p", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.p1, f.p2]
    );
}

#[test]
fn test_not_pseudo() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("div:not(.hidden)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.main, f.tail]
    );
    assert_eq!(
        engine
            .select("li:not(.a):not(.hidden)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[3]]
    );
    // negation does not re-anchor: a nested combinator asks about the
    // element's own ancestry, not the query context
    assert_eq!(
        engine
            .select("li:not(ul .b)", &f.tree, f.list)
            .unwrap(),
        vec![f.lis[0], f.lis[2]]
    );
}

#[test]
fn test_double_negation_is_identity() {
    let f = fixture();
    let engine = SelectorEngine::new();
    let direct = engine.select("li.a", &f.tree, f.tree.root()).unwrap();
    let doubled = engine
        .select("li:not(:not(.a))", &f.tree, f.tree.root())
        .unwrap();
    assert_eq!(direct, doubled);
    assert_eq!(direct, vec![f.lis[0], f.lis[2]]);
}

#[test]
fn test_has_pseudo() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("div:has(li.hidden)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.main]
    );
    assert_eq!(
        engine
            .select("div:has(em)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.tail]
    );
    assert_eq!(
        engine
            .select("div:not(:has(.hidden))", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.hidden_div, f.tail]
    );
}

#[test]
fn test_has_with_leading_sibling_combinators() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("p:has(~ a)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.p1, f.p2]
    );
    assert_eq!(
        engine
            .select("ul:has(+ a)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.list]
    );
    assert_eq!(
        engine
            .select("p:has(+ ul)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.p2]
    );
    // an element is never a candidate for its own relative sub-query
    assert_eq!(
        engine
            .select("li:has(~ .hidden)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[0]]
    );
    assert_eq!(
        engine
            .select("a:has(~ a)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.a1]
    );
}

#[test]
fn test_nested_has_runs_are_isolated() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("div:has(span:has(em))", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.tail]
    );
    // a sub-query in the middle of a pass must not corrupt the outer
    // walk and sibling memos
    assert_eq!(
        engine
            .select("div:has(.a) li:nth-child(odd)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.lis[0], f.lis[2]]
    );
}

#[test]
fn test_contains_is_case_sensitive() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine
            .select("p:contains('Hello')", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.p1]
    );
    assert_eq!(
        engine
            .select("p:contains('hello')", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.p2]
    );
    // text is gathered from the whole subtree
    assert_eq!(
        engine
            .select("div:contains('deep')", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.tail]
    );
}

#[test]
fn test_lang_inherits_from_ancestors() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("em:lang(en)", &f.tree, f.tree.root()).unwrap(),
        vec![f.em]
    );
    assert_eq!(
        engine
            .select(":lang(en-US)", &f.tree, f.tree.root())
            .unwrap(),
        vec![f.span, f.em]
    );
    assert_eq!(
        engine.select("em:lang(fr)", &f.tree, f.tree.root()).unwrap(),
        vec![]
    );
}

#[test]
fn test_empty_and_parent() {
    let mut t = DomTree::new();
    let root = t.root();
    let full = el(&mut t, root, "span", &[]);
    txt(&mut t, full, "text");
    let blank = el(&mut t, root, "span", &[]);
    let commented = el(&mut t, root, "span", &[]);
    let c = t.create_comment("note");
    t.append_child(commented, c).unwrap();

    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("span:empty", &t, root).unwrap(),
        vec![blank, commented]
    );
    assert_eq!(engine.select("span:parent", &t, root).unwrap(), vec![full]);
}

#[test]
fn test_form_pseudos() {
    let mut t = DomTree::new();
    let root = t.root();
    let form = el(&mut t, root, "form", &[]);
    let text_input = el(&mut t, form, "input", &[]);
    let checkbox = el(&mut t, form, "input", &[("type", "checkbox"), ("checked", "")]);
    let submit = el(&mut t, form, "input", &[("type", "submit")]);
    let button = el(&mut t, form, "button", &[]);
    let select = el(&mut t, form, "select", &[]);
    let opt1 = el(&mut t, select, "option", &[]);
    let opt2 = el(&mut t, select, "option", &[("selected", "")]);

    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select(":input", &t, root).unwrap(),
        vec![text_input, checkbox, submit, button, select]
    );
    assert_eq!(engine.select(":text", &t, root).unwrap(), vec![text_input]);
    assert_eq!(engine.select(":checkbox", &t, root).unwrap(), vec![checkbox]);
    assert_eq!(engine.select(":checked", &t, root).unwrap(), vec![checkbox, opt2]);
    assert_eq!(engine.select(":selected", &t, root).unwrap(), vec![opt2]);
    assert_eq!(engine.select(":submit", &t, root).unwrap(), vec![submit]);
    assert_eq!(engine.select(":button", &t, root).unwrap(), vec![button]);
    let _ = opt1;
}

#[test]
fn test_disabled_inherits_from_fieldset_except_first_legend() {
    let mut t = DomTree::new();
    let root = t.root();
    let form = el(&mut t, root, "form", &[]);
    let fieldset = el(&mut t, form, "fieldset", &[("disabled", "")]);
    let legend = el(&mut t, fieldset, "legend", &[]);
    let exempt = el(&mut t, legend, "input", &[]);
    let inherited = el(&mut t, fieldset, "input", &[]);
    let own = el(&mut t, form, "input", &[("disabled", "")]);
    let free = el(&mut t, form, "input", &[]);

    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("input:disabled", &t, root).unwrap(),
        vec![inherited, own]
    );
    assert_eq!(
        engine.select("input:enabled", &t, root).unwrap(),
        vec![exempt, free]
    );
}

#[test]
fn test_option_disabled_via_optgroup() {
    let mut t = DomTree::new();
    let root = t.root();
    let select = el(&mut t, root, "select", &[]);
    let group = el(&mut t, select, "optgroup", &[("disabled", "")]);
    let inherited = el(&mut t, group, "option", &[]);
    let own = el(&mut t, select, "option", &[("disabled", "")]);
    let free = el(&mut t, select, "option", &[]);

    let engine = SelectorEngine::new();
    assert_eq!(
        engine.select("option:disabled", &t, root).unwrap(),
        vec![inherited, own]
    );
    assert_eq!(engine.select("option:enabled", &t, root).unwrap(), vec![free]);
}

#[test]
fn test_header_and_root() {
    let f = fixture();
    let mut t = DomTree::new();
    let root = t.root();
    let html = el(&mut t, root, "html", &[]);
    let body = el(&mut t, html, "body", &[]);
    let h1 = el(&mut t, body, "h1", &[]);
    let h6 = el(&mut t, body, "h6", &[]);
    let _p = el(&mut t, body, "p", &[]);

    let engine = SelectorEngine::new();
    assert_eq!(engine.select(":header", &t, root).unwrap(), vec![h1, h6]);
    assert_eq!(engine.select(":root", &t, root).unwrap(), vec![html]);
    assert_eq!(
        engine.select(":root", &f.tree, f.tree.root()).unwrap(),
        vec![f.main, f.hidden_div, f.tail]
    );
}

#[test]
fn test_matches_preserves_seed_order() {
    let f = fixture();
    let engine = SelectorEngine::new();
    let seed = [f.lis[2], f.lis[0], f.lis[0], f.lis[3]];
    assert_eq!(
        engine.matches("li.a, li.b", &f.tree, &seed).unwrap(),
        vec![f.lis[2], f.lis[0], f.lis[3]]
    );
    assert_eq!(
        engine.matches(".a", &f.tree, &seed).unwrap(),
        vec![f.lis[2], f.lis[0]]
    );
}

#[test]
fn test_matches_selector_single_element() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert!(engine.matches_selector(&f.tree, f.p1, "p.note").unwrap());
    assert!(engine.matches_selector(&f.tree, f.p1, "#main p").unwrap());
    assert!(!engine.matches_selector(&f.tree, f.p2, ".note").unwrap());
    assert!(engine
        .matches_selector(&f.tree, f.lis[1], "li:nth-child(2)")
        .unwrap());
}

#[test]
fn test_grammar_errors_abort_with_no_partial_results() {
    let f = fixture();
    let engine = SelectorEngine::new();
    assert!(matches!(
        engine.select("[foo", &f.tree, f.tree.root()),
        Err(SelectorError::Syntax(_))
    ));
    assert!(matches!(
        engine.select("div:blink", &f.tree, f.tree.root()),
        Err(SelectorError::UnsupportedPseudo(_))
    ));
    assert!(matches!(
        engine.select("div:not(.a", &f.tree, f.tree.root()),
        Err(SelectorError::UnbalancedArgument(_))
    ));
    assert!(matches!(
        engine.select("li:nth-child", &f.tree, f.tree.root()),
        Err(SelectorError::Requirement(_))
    ));
    // one bad branch poisons the whole group
    assert!(engine.select("p, [foo", &f.tree, f.tree.root()).is_err());
    assert!(engine
        .select("p, div:not(:bogus)", &f.tree, f.tree.root())
        .is_err());
}

#[test]
fn test_escaped_identifiers_in_queries() {
    let mut t = DomTree::new();
    let root = t.root();
    let odd = el(&mut t, root, "div", &[("class", "a.b"), ("id", "1st")]);
    let engine = SelectorEngine::new();
    assert_eq!(engine.select(".a\\.b", &t, root).unwrap(), vec![odd]);
    assert_eq!(engine.select("#\\31 st", &t, root).unwrap(), vec![odd]);
    assert_eq!(
        engine
            .select(&format!(".{}", selene_select::escape("a.b")), &t, root)
            .unwrap(),
        vec![odd]
    );
}
