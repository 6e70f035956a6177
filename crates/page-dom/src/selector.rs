//! Minimal CSS selector engine
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors with `=`, `~=`, `|=`, `^=`, `$=`, `*=` (optionally with the `i`
//! flag), descendant and child combinators, and comma-separated lists.
//! Pseudo-classes and sibling combinators are rejected with
//! [`SelectorError::Unsupported`].

use std::iter::Peekable;
use std::str::CharIndices;

use crate::document::{Document, ElementData, NodeId};
use crate::errors::SelectorError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    // combinators[i] joins compounds[i] and compounds[i + 1]
    combinators: Vec<Combinator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
    case_insensitive: bool,
}

/// Parse a selector list.
pub fn parse_selector(input: &str) -> Result<SelectorList, SelectorError> {
    let mut parser = Parser {
        chars: input.char_indices().peekable(),
    };
    let mut selectors = Vec::new();
    loop {
        selectors.push(parser.complex()?);
        match parser.chars.next() {
            Some((_, ',')) => continue,
            None => break,
            Some((position, found)) => return Err(SelectorError::Unexpected { found, position }),
        }
    }
    Ok(SelectorList { selectors })
}

impl SelectorList {
    /// Whether the element at `node` matches any selector of the list.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|complex| match_at(doc, node, complex, complex.compounds.len() - 1))
    }
}

fn match_at(doc: &Document, node: NodeId, complex: &ComplexSelector, idx: usize) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    if !complex.compounds[idx].matches(element) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match complex.combinators[idx - 1] {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|parent| match_at(doc, parent, complex, idx - 1)),
        Combinator::Descendant => {
            let mut current = doc.parent(node);
            while let Some(ancestor) = current {
                if match_at(doc, ancestor, complex, idx - 1) {
                    return true;
                }
                current = doc.parent(ancestor);
            }
            false
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|class| element.classes().any(|c| c == class))
        {
            return false;
        }
        self.attrs.iter().all(|attr| attr.matches(element))
    }
}

impl AttrSelector {
    fn matches(&self, element: &ElementData) -> bool {
        let Some(actual) = element.attr(&self.name) else {
            return false;
        };
        if self.op == AttrOp::Exists {
            return true;
        }
        let (actual, expected) = if self.case_insensitive {
            (actual.to_lowercase(), self.value.to_lowercase())
        } else {
            (actual.to_string(), self.value.clone())
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => actual.split_whitespace().any(|word| word == expected),
            AttrOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{expected}-"))
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

impl Parser<'_> {
    fn skip_ws(&mut self) -> bool {
        let mut skipped = false;
        while let Some((_, c)) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        self.skip_ws();
        loop {
            let compound = self.compound()?;
            if compound.is_empty() {
                return match self.chars.peek() {
                    Some(&(position, found)) if found != ',' => {
                        Err(self.reject(found, position))
                    }
                    _ => Err(SelectorError::Empty),
                };
            }
            compounds.push(compound);

            let had_ws = self.skip_ws();
            match self.chars.peek() {
                None | Some((_, ',')) => break,
                Some((_, '>')) => {
                    self.chars.next();
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(&(_, c)) if c == '+' || c == '~' => {
                    return Err(SelectorError::Unsupported(format!("combinator '{c}'")));
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(&(position, found)) => return Err(self.reject(found, position)),
            }
        }
        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn reject(&self, found: char, position: usize) -> SelectorError {
        if found == ':' {
            SelectorError::Unsupported("pseudo-classes".to_string())
        } else {
            SelectorError::Unexpected { found, position }
        }
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        if let Some(&(_, c)) = self.chars.peek() {
            if c == '*' {
                self.chars.next();
                compound.tag = Some("*".to_string());
            } else if is_ident_char(c) {
                compound.tag = Some(self.ident()?.to_lowercase());
            }
        }
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '#' => {
                    self.chars.next();
                    compound.id = Some(self.ident()?);
                }
                '.' => {
                    self.chars.next();
                    compound.classes.push(self.ident()?);
                }
                '[' => {
                    self.chars.next();
                    compound.attrs.push(self.attribute()?);
                }
                _ => break,
            }
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\\' {
                self.chars.next();
                match self.chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                }
                continue;
            }
            if !is_ident_char(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        if out.is_empty() {
            return match self.chars.peek() {
                Some(&(position, found)) => Err(SelectorError::Unexpected { found, position }),
                None => Err(SelectorError::Empty),
            };
        }
        Ok(out)
    }

    fn attribute(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_lowercase();
        self.skip_ws();
        let op = match self.chars.next() {
            Some((_, ']')) => {
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                    case_insensitive: false,
                })
            }
            Some((_, '=')) => AttrOp::Equals,
            Some((position, prefix)) => {
                let op = match prefix {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    '*' => AttrOp::Substring,
                    found => return Err(SelectorError::Unexpected { found, position }),
                };
                match self.chars.next() {
                    Some((_, '=')) => op,
                    Some((position, found)) => {
                        return Err(SelectorError::Unexpected { found, position })
                    }
                    None => return Err(SelectorError::UnterminatedAttribute),
                }
            }
            None => return Err(SelectorError::UnterminatedAttribute),
        };
        self.skip_ws();
        let value = match self.chars.peek() {
            Some(&(_, quote)) if quote == '"' || quote == '\'' => {
                self.chars.next();
                self.quoted(quote)?
            }
            Some(_) => self.ident()?,
            None => return Err(SelectorError::UnterminatedAttribute),
        };
        self.skip_ws();
        let mut case_insensitive = false;
        if let Some(&(_, flag)) = self.chars.peek() {
            if flag == 'i' || flag == 'I' {
                case_insensitive = true;
                self.chars.next();
                self.skip_ws();
            } else if flag == 's' || flag == 'S' {
                self.chars.next();
                self.skip_ws();
            }
        }
        match self.chars.next() {
            Some((_, ']')) => Ok(AttrSelector {
                name,
                op,
                value,
                case_insensitive,
            }),
            Some((position, found)) => Err(SelectorError::Unexpected { found, position }),
            None => Err(SelectorError::UnterminatedAttribute),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.next() {
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                if let Some((_, escaped)) = self.chars.next() {
                    out.push(escaped);
                }
                continue;
            }
            out.push(c);
        }
        Err(SelectorError::UnterminatedAttribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::el;

    fn sample() -> Document {
        Document::from_spec(
            "t",
            &el("body").child(
                el("div")
                    .class("report-card featured")
                    .attr("data-kind", "weekly")
                    .child(el("h3").text("Weekly"))
                    .child(
                        el("button")
                            .id("open")
                            .attr("aria-label", "View Report")
                            .text("Open"),
                    ),
            ),
        )
    }

    fn select(doc: &Document, sel: &str) -> Vec<String> {
        doc.query_selector_all(sel)
            .unwrap()
            .into_iter()
            .map(|id| doc.tag(id).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn compound_and_combinators() {
        let doc = sample();
        assert_eq!(select(&doc, "div.report-card > button#open"), vec!["button"]);
        assert_eq!(select(&doc, "body button"), vec!["button"]);
        assert!(select(&doc, "body > button").is_empty());
        assert_eq!(select(&doc, "h3, button"), vec!["h3", "button"]);
        assert_eq!(select(&doc, "*").len(), 4);
    }

    #[test]
    fn attribute_operators() {
        let doc = sample();
        assert_eq!(select(&doc, "[class*='card']"), vec!["div"]);
        assert_eq!(select(&doc, "[class~=featured]"), vec!["div"]);
        assert_eq!(select(&doc, "[data-kind^=week]"), vec!["div"]);
        assert_eq!(select(&doc, "[data-kind$=ly]"), vec!["div"]);
        assert_eq!(select(&doc, "[aria-label=\"view report\" i]"), vec!["button"]);
        assert!(select(&doc, "[aria-label=\"view report\"]").is_empty());
        assert_eq!(select(&doc, "[aria-label]"), vec!["button"]);
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(matches!(
            parse_selector("button:hover"),
            Err(SelectorError::Unsupported(_))
        ));
        assert!(matches!(
            parse_selector("a + b"),
            Err(SelectorError::Unsupported(_))
        ));
        assert_eq!(parse_selector(""), Err(SelectorError::Empty));
        assert_eq!(parse_selector("a,"), Err(SelectorError::Empty));
        assert_eq!(
            parse_selector("[name='x'"),
            Err(SelectorError::UnterminatedAttribute)
        );
    }
}
