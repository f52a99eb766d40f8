//! Selector tokenizer
//!
//! Splits a selector string into comma-separated groups of
//! (combinator, compound) tokens. Per-type normalization happens here as
//! well: attribute operators are resolved, `an+b` arguments are parsed to
//! a (step, offset) pair, and nested pseudo arguments are balance-scanned
//! and probe-tokenized so a malformed `:not(...)` fails at tokenize time.

use crate::error::{SelectorError, SelectorResult};
use crate::pseudo::{self, PseudoToken};

/// Structural relationship between two compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: ancestor descendant
    Descendant,
    /// `>`: parent > child
    Child,
    /// `+`: prev + next
    NextSibling,
    /// `~`: prev ~ subsequent
    SubsequentSibling,
}

impl Combinator {
    /// Sibling combinators walk the previous-sibling axis
    #[inline]
    pub fn is_sibling(self) -> bool {
        matches!(self, Self::NextSibling | Self::SubsequentSibling)
    }
}

/// Attribute selector operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[attr]`
    Exists,
    /// `[attr=val]`
    Equals,
    /// `[attr!=val]`
    NotEqual,
    /// `[attr^=val]`
    Prefix,
    /// `[attr$=val]`
    Suffix,
    /// `[attr*=val]`
    Substring,
    /// `[attr~=val]` - whitespace-token containment
    Includes,
    /// `[attr|=val]` - exact or `val-` prefix
    DashMatch,
}

/// Child pseudo-class family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    First,
    Last,
    Only,
    Nth,
    NthLast,
}

/// One parsed unit of a selector
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Combinator(Combinator),
    Universal,
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
    Pseudo(PseudoToken),
}

/// Token with its source text (used to rebuild partial selectors)
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// One comma-branch of a selector
pub type TokenGroup = Vec<Token>;

const WS: &[char] = &[' ', '\t', '\r', '\n', '\x0C'];

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c >= '\u{80}'
}

fn is_combinator(t: &Token) -> bool {
    matches!(t.kind, TokenKind::Combinator(_))
}

/// Tokenize a selector into groups; errors name the unparsed remainder
pub fn tokenize(selector: &str) -> SelectorResult<Vec<TokenGroup>> {
    let trimmed = selector.trim_matches(|c| WS.contains(&c));
    if trimmed.is_empty() {
        return Err(SelectorError::Syntax(selector.to_string()));
    }

    let mut cur = Cursor::new(trimmed);
    let mut groups: Vec<TokenGroup> = Vec::new();
    let mut group: TokenGroup = Vec::new();

    loop {
        let had_ws = cur.skip_whitespace();
        if cur.eof() {
            break;
        }
        if cur.peek() == Some(',') {
            let at = cur.pos;
            cur.bump();
            if group.is_empty() || group.last().map(is_combinator).unwrap_or(false) {
                return Err(SelectorError::Syntax(cur.slice_from(at)));
            }
            groups.push(std::mem::take(&mut group));
            continue;
        }
        if let Some(c) = cur.peek_combinator() {
            let at = cur.pos;
            cur.bump();
            if group.last().map(is_combinator).unwrap_or(false) {
                return Err(SelectorError::Syntax(cur.slice_from(at)));
            }
            group.push(Token {
                kind: TokenKind::Combinator(c),
                text: cur.slice(at, cur.pos),
            });
            continue;
        }
        if had_ws && !group.is_empty() && !group.last().map(is_combinator).unwrap_or(false) {
            group.push(Token {
                kind: TokenKind::Combinator(Combinator::Descendant),
                text: " ".to_string(),
            });
        }
        match parse_simple(&mut cur)? {
            Some(tok) => group.push(tok),
            None => return Err(SelectorError::Syntax(cur.remainder())),
        }
    }

    if group.is_empty() {
        // trailing comma
        return Err(SelectorError::Syntax(selector.to_string()));
    }
    if let Some(last) = group.last() {
        if is_combinator(last) {
            return Err(SelectorError::Syntax(last.text.clone()));
        }
    }
    groups.push(group);
    Ok(groups)
}

/// Parse `even` / `odd` / `an+b` into (step, offset)
pub fn parse_nth(arg: &str) -> SelectorResult<(i32, i32)> {
    let t = arg.trim().to_ascii_lowercase();
    match t.as_str() {
        "even" => return Ok((2, 0)),
        "odd" => return Ok((2, 1)),
        _ => {}
    }

    let mut cur = Cursor::new(&t);
    let sign1 = cur.eat_sign();
    let digits1 = cur.eat_digits()?;
    if cur.peek() == Some('n') {
        cur.bump();
        let coeff = digits1.unwrap_or(1);
        let step = if sign1 == 0 { coeff } else { sign1 * coeff };
        cur.skip_whitespace();
        if cur.eof() {
            return Ok((step, 0));
        }
        let sign2 = cur.eat_sign();
        if sign2 == 0 {
            return Err(SelectorError::Syntax(arg.to_string()));
        }
        cur.skip_whitespace();
        let digits2 = cur
            .eat_digits()?
            .ok_or_else(|| SelectorError::Syntax(arg.to_string()))?;
        if !cur.eof() {
            return Err(SelectorError::Syntax(arg.to_string()));
        }
        Ok((step, sign2 * digits2))
    } else {
        let b = digits1.ok_or_else(|| SelectorError::Syntax(arg.to_string()))?;
        if !cur.eof() {
            return Err(SelectorError::Syntax(arg.to_string()));
        }
        Ok((0, if sign1 == 0 { b } else { sign1 * b }))
    }
}

fn parse_simple(cur: &mut Cursor) -> SelectorResult<Option<Token>> {
    let start = cur.pos;
    let kind = match cur.peek() {
        Some('#') => {
            cur.bump();
            match cur.parse_ident() {
                Some(id) => TokenKind::Id(id),
                None => return Err(SelectorError::Syntax(cur.slice_from(start))),
            }
        }
        Some('.') => {
            cur.bump();
            match cur.parse_ident() {
                Some(class) => TokenKind::Class(class),
                None => return Err(SelectorError::Syntax(cur.slice_from(start))),
            }
        }
        Some('*') => {
            cur.bump();
            TokenKind::Universal
        }
        Some('[') => parse_attr(cur)?,
        Some(':') => parse_pseudo(cur)?,
        Some(c) if is_ident_char(c) || c == '\\' => match cur.parse_ident() {
            Some(tag) => TokenKind::Tag(tag),
            None => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(Token {
        kind,
        text: cur.slice(start, cur.pos),
    }))
}

fn parse_attr(cur: &mut Cursor) -> SelectorResult<TokenKind> {
    let start = cur.pos;
    cur.bump(); // '['
    cur.skip_whitespace();
    let name = cur
        .parse_ident()
        .ok_or_else(|| SelectorError::Syntax(cur.slice_from(start)))?
        .to_ascii_lowercase();
    cur.skip_whitespace();

    let op = match cur.peek() {
        Some(']') => {
            cur.bump();
            return Ok(TokenKind::Attr {
                name,
                op: AttrOp::Exists,
                value: None,
            });
        }
        Some('=') => AttrOp::Equals,
        Some('!') => AttrOp::NotEqual,
        Some('^') => AttrOp::Prefix,
        Some('$') => AttrOp::Suffix,
        Some('*') => AttrOp::Substring,
        Some('~') => AttrOp::Includes,
        Some('|') => AttrOp::DashMatch,
        _ => return Err(SelectorError::Syntax(cur.slice_from(start))),
    };
    cur.bump();
    if op != AttrOp::Equals {
        // two-char operators end with '='
        if cur.peek() != Some('=') {
            return Err(SelectorError::Syntax(cur.slice_from(start)));
        }
        cur.bump();
    }
    cur.skip_whitespace();

    let value = match cur.peek() {
        Some(q @ ('"' | '\'')) => {
            cur.bump();
            cur.parse_string(q)
                .ok_or_else(|| SelectorError::Syntax(cur.slice_from(start)))?
        }
        _ => cur
            .parse_ident()
            .ok_or_else(|| SelectorError::Syntax(cur.slice_from(start)))?,
    };
    cur.skip_whitespace();
    if cur.peek() != Some(']') {
        return Err(SelectorError::Syntax(cur.slice_from(start)));
    }
    cur.bump();
    Ok(TokenKind::Attr {
        name,
        op,
        value: Some(value),
    })
}

fn child_kind(name: &str) -> Option<(ChildKind, bool)> {
    match name {
        "first-child" => Some((ChildKind::First, false)),
        "last-child" => Some((ChildKind::Last, false)),
        "only-child" => Some((ChildKind::Only, false)),
        "first-of-type" => Some((ChildKind::First, true)),
        "last-of-type" => Some((ChildKind::Last, true)),
        "only-of-type" => Some((ChildKind::Only, true)),
        "nth-child" => Some((ChildKind::Nth, false)),
        "nth-last-child" => Some((ChildKind::NthLast, false)),
        "nth-of-type" => Some((ChildKind::Nth, true)),
        "nth-last-of-type" => Some((ChildKind::NthLast, true)),
        _ => None,
    }
}

fn parse_pseudo(cur: &mut Cursor) -> SelectorResult<TokenKind> {
    let start = cur.pos;
    cur.bump(); // ':'
    if cur.peek() == Some(':') {
        // pseudo-elements are not selectors
        return Err(SelectorError::Syntax(cur.slice_from(start)));
    }
    let name = cur
        .parse_ident()
        .ok_or_else(|| SelectorError::Syntax(cur.slice_from(start)))?
        .to_ascii_lowercase();

    let arg = if cur.peek() == Some('(') {
        Some(parse_balanced_arg(cur, &name)?)
    } else {
        None
    };

    if let Some((kind, of_type)) = child_kind(&name) {
        return match kind {
            ChildKind::Nth | ChildKind::NthLast => {
                let raw = arg.ok_or_else(|| {
                    SelectorError::Requirement(format!(":{name} requires an argument"))
                })?;
                let (step, offset) = parse_nth(&raw)?;
                Ok(TokenKind::Child {
                    kind,
                    of_type,
                    step,
                    offset,
                })
            }
            _ => {
                if arg.is_some() {
                    return Err(SelectorError::Requirement(format!(
                        ":{name} does not take an argument"
                    )));
                }
                Ok(TokenKind::Child {
                    kind,
                    of_type,
                    step: 0,
                    offset: 0,
                })
            }
        };
    }

    let pseudo = pseudo::parse_pseudo(&name, arg.as_deref())?;
    // probe nested selector arguments now, so syntax errors surface at
    // tokenize time rather than on first use of the compiled matcher
    match &pseudo {
        PseudoToken::Not(inner) | PseudoToken::Has(inner) => {
            tokenize(inner)?;
        }
        _ => {}
    }
    Ok(TokenKind::Pseudo(pseudo))
}

/// Consume a parenthesized argument, respecting nested parens and quotes
fn parse_balanced_arg(cur: &mut Cursor, name: &str) -> SelectorResult<String> {
    cur.bump(); // '('
    let start = cur.pos;
    let mut depth = 1usize;
    loop {
        match cur.peek() {
            None => return Err(SelectorError::UnbalancedArgument(name.to_string())),
            Some('(') => {
                depth += 1;
                cur.bump();
            }
            Some(')') => {
                depth -= 1;
                if depth == 0 {
                    let inner = cur.slice(start, cur.pos);
                    cur.bump();
                    let inner = inner.trim_matches(|c| WS.contains(&c)).to_string();
                    return Ok(inner);
                }
                cur.bump();
            }
            Some(q @ ('"' | '\'')) => {
                cur.bump();
                loop {
                    match cur.bump() {
                        None => {
                            return Err(SelectorError::UnbalancedArgument(name.to_string()));
                        }
                        Some('\\') => {
                            cur.bump();
                        }
                        Some(c) if c == q => break,
                        Some(_) => {}
                    }
                }
            }
            Some('\\') => {
                cur.bump();
                cur.bump();
            }
            Some(_) => {
                cur.bump();
            }
        }
    }
}

/// Character cursor over a selector string
pub(crate) struct Cursor {
    chars: Vec<char>,
    pub(crate) pos: usize,
}

impl Cursor {
    pub(crate) fn new(s: &str) -> Self {
        Self {
            chars: s.chars().collect(),
            pos: 0,
        }
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    #[inline]
    pub(crate) fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub(crate) fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().map(|c| WS.contains(&c)).unwrap_or(false) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn peek_combinator(&self) -> Option<Combinator> {
        match self.peek() {
            Some('>') => Some(Combinator::Child),
            Some('+') => Some(Combinator::NextSibling),
            Some('~') => Some(Combinator::SubsequentSibling),
            _ => None,
        }
    }

    pub(crate) fn slice(&self, from: usize, to: usize) -> String {
        self.chars[from..to].iter().collect()
    }

    pub(crate) fn slice_from(&self, from: usize) -> String {
        self.chars[from..].iter().collect()
    }

    pub(crate) fn remainder(&self) -> String {
        self.slice_from(self.pos)
    }

    /// CSS identifier, with `\`-escapes resolved; None if empty
    pub(crate) fn parse_ident(&mut self) -> Option<String> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(c) if is_ident_char(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                Some('\\') => {
                    self.pos += 1;
                    out.push(self.parse_escape());
                }
                _ => break,
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// Quoted string body; the opening quote is already consumed
    pub(crate) fn parse_string(&mut self, quote: char) -> Option<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return None,
                Some(c) if c == quote => return Some(out),
                Some('\\') => out.push(self.parse_escape()),
                Some(c) => out.push(c),
            }
        }
    }

    /// Resolve a `\`-escape; the backslash is already consumed
    fn parse_escape(&mut self) -> char {
        match self.peek() {
            None => '\u{FFFD}',
            Some(c) if c.is_ascii_hexdigit() => {
                let mut code = 0u32;
                let mut n = 0;
                while n < 6 {
                    match self.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            code = code * 16 + h.to_digit(16).unwrap_or(0);
                            self.pos += 1;
                            n += 1;
                        }
                        _ => break,
                    }
                }
                // a single whitespace terminates the escape
                if self.peek().map(|c| WS.contains(&c)).unwrap_or(false) {
                    self.pos += 1;
                }
                char::from_u32(code).unwrap_or('\u{FFFD}')
            }
            Some(c) => {
                self.pos += 1;
                c
            }
        }
    }

    fn eat_sign(&mut self) -> i32 {
        match self.peek() {
            Some('+') => {
                self.pos += 1;
                1
            }
            Some('-') => {
                self.pos += 1;
                -1
            }
            _ => 0,
        }
    }

    fn eat_digits(&mut self) -> SelectorResult<Option<i32>> {
        let start = self.pos;
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        if self.pos == start {
            return Ok(None);
        }
        self.slice(start, self.pos)
            .parse::<i32>()
            .map(Some)
            .map_err(|_| SelectorError::Syntax(self.slice_from(start)))
    }
}
