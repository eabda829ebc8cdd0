//! Element Query
//!
//! querySelector / querySelectorAll over a `DomTree`.
//!
//! Supported grammar: selector lists (`a, b`), descendant (`a b`) and child
//! (`a > b`) combinators, and compound selectors built from a tag or `*`,
//! `#id`, `.class`, `[attr]` and `[attr=value]` / `[attr~=value]` /
//! `[attr^=value]` / `[attr$=value]` / `[attr*=value]`.

use crate::node::ElementData;
use crate::{DomError, DomResult, DomTree, NodeId};

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute(AttributeSelector),
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<(AttributeOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `=`
    Exact,
    /// `~=`
    Includes,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (&self.matcher, value) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some((op, expected)), Some(val)) => match op {
                AttributeOp::Exact => val == expected,
                AttributeOp::Includes => val.split_whitespace().any(|w| w == expected),
                AttributeOp::Prefix => !expected.is_empty() && val.starts_with(expected.as_str()),
                AttributeOp::Suffix => !expected.is_empty() && val.ends_with(expected.as_str()),
                AttributeOp::Substring => !expected.is_empty() && val.contains(expected.as_str()),
            },
        }
    }
}

impl SimpleSelector {
    fn matches(&self, elem: &ElementData) -> bool {
        match self {
            Self::Universal => true,
            Self::Tag(tag) => elem.name.eq_ignore_ascii_case(tag),
            Self::Id(id) => elem.id() == Some(id.as_str()),
            Self::Class(class) => elem.classes().any(|c| c == class),
            Self::Attribute(attr) => attr.matches(elem.get_attr(&attr.name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Complex selector: compounds joined by combinators, stored right to left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// `parts[0]` is the subject compound; each later entry is paired with
    /// the combinator linking it to the previous one
    parts: Vec<(Vec<SimpleSelector>, Combinator)>,
}

/// Comma separated list of selectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(input: &str) -> DomResult<Self> {
        let invalid = || DomError::InvalidSelector(input.to_string());
        let mut selectors = Vec::new();
        for group in split_top_level(input, ',').ok_or_else(invalid)? {
            selectors.push(Selector::parse(group).ok_or_else(invalid)?);
        }
        if selectors.is_empty() {
            return Err(invalid());
        }
        Ok(Self { selectors })
    }

    /// Whether a node matches any selector of the list
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, id))
    }
}

impl Selector {
    fn parse(input: &str) -> Option<Self> {
        let mut compounds: Vec<(Vec<SimpleSelector>, Combinator)> = Vec::new();
        let mut pending = Combinator::Descendant;
        let mut rest = input.trim();
        if rest.is_empty() {
            return None;
        }
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('>') {
                if compounds.is_empty() || pending == Combinator::Child {
                    return None;
                }
                pending = Combinator::Child;
                rest = after.trim_start();
                continue;
            }
            let (compound, after) = parse_compound(rest)?;
            compounds.push((compound, pending));
            pending = Combinator::Descendant;
            let trimmed = after.trim_start();
            if trimmed.len() == after.len() && !trimmed.is_empty() && !trimmed.starts_with('>') {
                // Compound ended without whitespace or combinator
                return None;
            }
            rest = trimmed;
        }
        if pending == Combinator::Child {
            return None;
        }
        // Store right to left; the combinator on each entry links it to the
        // entry before it in the new order
        let mut parts = Vec::with_capacity(compounds.len());
        let mut link = Combinator::Descendant;
        for (compound, combinator) in compounds.into_iter().rev() {
            parts.push((compound, link));
            link = combinator;
        }
        Some(Self { parts })
    }

    fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        self.matches_from(tree, id, 0)
    }

    fn matches_from(&self, tree: &DomTree, id: NodeId, part: usize) -> bool {
        let Some(elem) = tree.get(id).and_then(|n| n.as_element()) else {
            return false;
        };
        let (compound, _) = &self.parts[part];
        if !compound.iter().all(|s| s.matches(elem)) {
            return false;
        }
        let Some((_, combinator)) = self.parts.get(part + 1) else {
            return true;
        };
        // The combinator stored on the next (leftward) part links it to this one
        match combinator {
            Combinator::Child => tree
                .parent(id)
                .is_some_and(|p| self.matches_from(tree, p, part + 1)),
            Combinator::Descendant => {
                let mut current = tree.parent(id);
                while let Some(ancestor) = current {
                    if self.matches_from(tree, ancestor, part + 1) {
                        return true;
                    }
                    current = tree.parent(ancestor);
                }
                false
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(input: &str) -> Option<(&str, &str)> {
    let end = input
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    Some((&input[..end], &input[end..]))
}

fn parse_compound(input: &str) -> Option<(Vec<SimpleSelector>, &str)> {
    let mut parts = Vec::new();
    let mut rest = input;
    if let Some(after) = rest.strip_prefix('*') {
        parts.push(SimpleSelector::Universal);
        rest = after;
    } else if let Some((tag, after)) = take_ident(rest) {
        parts.push(SimpleSelector::Tag(tag.to_ascii_lowercase()));
        rest = after;
    }
    loop {
        if let Some(after) = rest.strip_prefix('#') {
            let (id, after) = take_ident(after)?;
            parts.push(SimpleSelector::Id(id.to_string()));
            rest = after;
        } else if let Some(after) = rest.strip_prefix('.') {
            let (class, after) = take_ident(after)?;
            parts.push(SimpleSelector::Class(class.to_string()));
            rest = after;
        } else if let Some(after) = rest.strip_prefix('[') {
            let close = find_unquoted(after, ']')?;
            parts.push(SimpleSelector::Attribute(parse_attribute(&after[..close])?));
            rest = &after[close + 1..];
        } else {
            break;
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some((parts, rest))
}

fn parse_attribute(body: &str) -> Option<AttributeSelector> {
    let ops = [
        ("~=", AttributeOp::Includes),
        ("^=", AttributeOp::Prefix),
        ("$=", AttributeOp::Suffix),
        ("*=", AttributeOp::Substring),
        ("=", AttributeOp::Exact),
    ];
    let (name, rest) = take_ident(body.trim())?;
    let name = name.to_ascii_lowercase();
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Some(AttributeSelector {
            name,
            matcher: None,
        });
    }
    // The operator follows the name directly, so quoted values may contain one
    let (op, raw) = ops
        .into_iter()
        .find_map(|(token, op)| rest.strip_prefix(token).map(|raw| (op, raw)))?;
    let value = unquote(raw.trim())?;
    Some(AttributeSelector {
        name,
        matcher: Some((op, value.to_string())),
    })
}

/// Byte offset of the first `target` outside a quoted string
fn find_unquoted(input: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, c) if c == target => return Some(i),
            _ => {}
        }
    }
    None
}

fn unquote(raw: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if let Some(inner) = raw.strip_prefix(quote) {
            return inner.strip_suffix(quote);
        }
    }
    if raw.chars().all(is_ident_char) && !raw.is_empty() {
        Some(raw)
    } else {
        None
    }
}

/// Split on `sep` outside of brackets and quotes
fn split_top_level(input: &str, sep: char) -> Option<Vec<&str>> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1)?,
            (None, c) if c == sep && depth == 0 => {
                groups.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    groups.push(&input[start..]);
    Some(groups)
}

impl DomTree {
    /// All descendants of `root` matching `selector`, in document order
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(root)
            .filter(|&id| list.matches(self, id))
            .collect())
    }

    /// First descendant of `root` matching `selector`
    pub fn query_selector(&self, root: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self.descendants(root).find(|&id| list.matches(self, id)))
    }

    /// Check if a node matches a selector
    pub fn matches(&self, id: NodeId, selector: &str) -> DomResult<bool> {
        Ok(SelectorList::parse(selector)?.matches(self, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (DomTree, NodeId, NodeId, NodeId) {
        // <div id="main" class="box"><ul><li class="a">..</li><li data-bind="name">..</li></ul></div>
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.set_attribute(div, "id", "main").unwrap();
        tree.set_attribute(div, "class", "box wide").unwrap();
        let ul = tree.create_element("ul");
        let first = tree.create_element("li");
        tree.set_attribute(first, "class", "a").unwrap();
        let second = tree.create_element("li");
        tree.set_attribute(second, "data-bind", "name").unwrap();
        tree.append_child(ul, first).unwrap();
        tree.append_child(ul, second).unwrap();
        tree.append_child(div, ul).unwrap();
        tree.append_child(tree.root(), div).unwrap();
        (tree, div, first, second)
    }

    #[test]
    fn test_simple_selectors() {
        let (tree, div, first, second) = fixture();
        let root = tree.root();
        assert_eq!(tree.query_selector_all(root, "li").unwrap(), vec![first, second]);
        assert_eq!(tree.query_selector(root, "#main").unwrap(), Some(div));
        assert_eq!(tree.query_selector(root, ".wide").unwrap(), Some(div));
        assert_eq!(tree.query_selector(root, "*").unwrap(), Some(div));
    }

    #[test]
    fn test_attribute_selectors() {
        let (tree, _, _, second) = fixture();
        let root = tree.root();
        assert_eq!(
            tree.query_selector_all(root, r#"[data-bind="name"]"#).unwrap(),
            vec![second]
        );
        assert_eq!(tree.query_selector(root, "[data-bind]").unwrap(), Some(second));
        assert!(tree.query_selector(root, "[class~=wide]").unwrap().is_some());
        assert!(tree.query_selector(root, "[data-bind='other']").unwrap().is_none());
    }

    #[test]
    fn test_combinators() {
        let (tree, _, first, second) = fixture();
        let root = tree.root();
        assert_eq!(tree.query_selector_all(root, "div li").unwrap(), vec![first, second]);
        assert_eq!(tree.query_selector_all(root, "div > li").unwrap(), Vec::<NodeId>::new());
        assert_eq!(tree.query_selector_all(root, "ul > li.a").unwrap(), vec![first]);
        assert_eq!(
            tree.query_selector_all(root, "li.a, [data-bind]").unwrap(),
            vec![first, second]
        );
    }

    #[test]
    fn test_quoted_attribute_values() {
        let mut tree = DomTree::new();
        let bound = tree.create_element("span");
        tree.set_attribute(bound, "data-bind", "a]b").unwrap();
        let titled = tree.create_element("p");
        tree.set_attribute(titled, "title", "x~=y").unwrap();
        tree.append_child(tree.root(), bound).unwrap();
        tree.append_child(tree.root(), titled).unwrap();
        let root = tree.root();

        assert_eq!(tree.query_selector_all(root, "[data-bind=\"a]b\"]").unwrap(), vec![bound]);
        assert_eq!(tree.query_selector_all(root, "[title='x~=y']").unwrap(), vec![titled]);
        assert_eq!(tree.query_selector_all(root, "[title=\"x ~= y\"]").unwrap(), Vec::<NodeId>::new());
        assert_eq!(tree.query_selector_all(root, "[title^=\"x~\"]").unwrap(), vec![titled]);
    }

    #[test]
    fn test_query_excludes_root() {
        let (tree, div, _, _) = fixture();
        assert!(tree.query_selector(div, "#main").unwrap().is_none());
        assert!(tree.matches(div, "div.box").unwrap());
    }

    #[test]
    fn test_invalid_selectors() {
        let (tree, _, _, _) = fixture();
        for bad in ["", "   ", "[data-bind", "div >", "> div", "a,,b", ".", "li!"] {
            assert!(
                matches!(
                    tree.query_selector_all(tree.root(), bad),
                    Err(DomError::InvalidSelector(_))
                ),
                "expected {bad:?} to be rejected"
            );
        }
    }
}
