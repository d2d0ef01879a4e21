//! CSS selector subset understood by the in-memory DOM.
//!
//! Supported: type, `*`, `#id`, `.class`, `[attr]`, `[attr=v]`, `[attr^=v]`,
//! `[attr$=v]`, `[attr*=v]`, the descendant combinator and selector lists.

use super::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SelectorList(Vec<Complex>);

/// Compounds joined by descendant combinators, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex(Vec<Compound>);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeTest {
    name: String,
    operation: Option<(Operator, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equals,
    StartsWith,
    EndsWith,
    Contains,
}

impl SelectorList {
    pub(super) fn parse(selector: &str) -> Result<Self, String> {
        let groups = split_outside_brackets(selector, |c| c == ',');
        let mut list = Vec::with_capacity(groups.len());
        for group in groups {
            let compounds = split_outside_brackets(group, char::is_whitespace)
                .into_iter()
                .filter(|part| !part.is_empty())
                .map(parse_compound)
                .collect::<Result<Vec<_>, _>>()?;
            if compounds.is_empty() {
                return Err(format!("empty selector in `{selector}`"));
            }
            list.push(Complex(compounds));
        }
        Ok(Self(list))
    }

    pub(super) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.0.iter().any(|complex| complex.matches(tree, node))
    }
}

impl Complex {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let Some((last, ancestors)) = self.0.split_last() else {
            return false;
        };
        if !last.matches(tree, node) {
            return false;
        }
        let mut current = tree.node(node).parent;
        for compound in ancestors.iter().rev() {
            loop {
                let Some(candidate) = current else {
                    return false;
                };
                current = tree.node(candidate).parent;
                if compound.matches(tree, candidate) {
                    break;
                }
            }
        }
        true
    }
}

impl Compound {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let data = tree.node(node);
        if let Some(tag) = &self.tag {
            if !data.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if data.attributes.get("id") != Some(id) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| data.has_class(class)) {
            return false;
        }
        self.attributes.iter().all(|test| {
            let Some(actual) = data.attributes.get(&test.name) else {
                return false;
            };
            match &test.operation {
                None => true,
                Some((Operator::Equals, expected)) => actual == expected,
                Some((Operator::StartsWith, expected)) => !expected.is_empty() && actual.starts_with(expected.as_str()),
                Some((Operator::EndsWith, expected)) => !expected.is_empty() && actual.ends_with(expected.as_str()),
                Some((Operator::Contains, expected)) => !expected.is_empty() && actual.contains(expected.as_str()),
            }
        })
    }
}

fn split_outside_brackets(input: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    for (index, c) in input.char_indices() {
        match (quote, c) {
            (Some(open), _) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 && is_separator(c) => {
                parts.push(input[start..index].trim());
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

fn parse_compound(source: &str) -> Result<Compound, String> {
    let mut compound = Compound::default();
    let mut chars = source.chars().peekable();

    if chars.peek() == Some(&'*') {
        chars.next();
    } else {
        let tag = take_ident(&mut chars);
        if !tag.is_empty() {
            compound.tag = Some(tag);
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '.' | '#' => {
                let ident = take_ident(&mut chars);
                if ident.is_empty() {
                    return Err(format!("expected a name after `{c}` in `{source}`"));
                }
                if c == '.' {
                    compound.classes.push(ident);
                } else {
                    compound.id = Some(ident);
                }
            }
            '[' => {
                let mut inner = String::new();
                let mut quote = None;
                loop {
                    let Some(c) = chars.next() else {
                        return Err(format!("unclosed `[` in `{source}`"));
                    };
                    match (quote, c) {
                        (None, ']') => break,
                        (None, '"' | '\'') => quote = Some(c),
                        (Some(open), _) if c == open => quote = None,
                        _ => {}
                    }
                    inner.push(c);
                }
                compound.attributes.push(parse_attribute(&inner)?);
            }
            _ => return Err(format!("unsupported `{c}` in selector `{source}`")),
        }
    }
    Ok(compound)
}

fn parse_attribute(inner: &str) -> Result<AttributeTest, String> {
    let Some(position) = inner.find('=') else {
        let name = inner.trim();
        if name.is_empty() || !name.chars().all(is_ident_char) {
            return Err(format!("invalid attribute selector `[{inner}]`"));
        }
        return Ok(AttributeTest {
            name: name.to_owned(),
            operation: None,
        });
    };

    let (mut name, operator) = (&inner[..position], Operator::Equals);
    let operator = match name.chars().last() {
        Some('^') => Operator::StartsWith,
        Some('$') => Operator::EndsWith,
        Some('*') => Operator::Contains,
        _ => operator,
    };
    if operator != Operator::Equals {
        name = &name[..name.len() - 1];
    }
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(format!("invalid attribute selector `[{inner}]`"));
    }

    let raw_value = inner[position + 1..].trim();
    let value = raw_value
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
        .or_else(|| raw_value.strip_prefix('\'').and_then(|value| value.strip_suffix('\'')))
        .unwrap_or(raw_value);

    Ok(AttributeTest {
        name: name.to_owned(),
        operation: Some((operator, value.to_owned())),
    })
}
