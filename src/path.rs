// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Path queries over records.
//!
//! A path is a `/`-separated list of element steps, optionally ending in an
//! attribute selector:
//!
//! ```text
//! Components/SAttachableComponentParams/AttachDef@Type
//! Ports/SItemPortDef[@Name='hardpoint_cargo']/Types
//! capacity/SCentiCargoUnit/@centiSCU
//! centiSCU                      (shorthand for @centiSCU)
//! ```
//!
//! Steps are tag names, `*` (any element) or `.` (the current element).
//! Each step may carry predicates: `[N]` (1-based position among the
//! step's matches for one context node), `[@attr]`, `[@attr='value']` and
//! `[child]`. An `@` inside brackets belongs to the predicate, not to the
//! attribute selector, so the splitter tracks bracket depth and quoting.
//!
//! Queries are always relative to the record they are evaluated on. `..`
//! and absolute paths would escape that subtree and are rejected, as is the
//! `//` descendant axis.

use crate::record::Record;
use crate::value::{coerce, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("unbalanced brackets or quotes in path `{0}`")]
    Unbalanced(String),
    #[error("empty step in path `{0}`")]
    EmptyStep(String),
    #[error("path `{0}` escapes the current record")]
    EscapesScope(String),
    #[error("attribute selector must end path `{0}`")]
    MisplacedAttribute(String),
    #[error("invalid name `{name}` in path `{path}`")]
    InvalidName { path: String, name: String },
    #[error("unsupported predicate `[{predicate}]` in path `{path}`")]
    UnsupportedPredicate { path: String, predicate: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Current,
    Any,
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    HasAttribute(String),
    AttributeEquals(String, String),
    HasChild(String),
}

impl Predicate {
    fn apply<'a>(&self, candidates: Vec<Record<'a>>) -> Vec<Record<'a>> {
        match self {
            Predicate::Position(n) => candidates.into_iter().skip(n - 1).take(1).collect(),
            Predicate::HasAttribute(name) => candidates
                .into_iter()
                .filter(|r| r.has_attribute(name))
                .collect(),
            Predicate::AttributeEquals(name, value) => candidates
                .into_iter()
                .filter(|r| r.raw(name) == Some(value.as_str()))
                .collect(),
            Predicate::HasChild(tag) => candidates
                .into_iter()
                .filter(|r| r.child(tag).is_some())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A parsed path expression. Parse once with [`PathQuery::parse`] and
/// evaluate as often as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    steps: Vec<Step>,
    attribute: Option<String>,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn is_plain_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_name_char)
}

fn check_name(path: &str, name: &str) -> Result<(), PathError> {
    if is_plain_name(name) {
        Ok(())
    } else {
        Err(PathError::InvalidName {
            path: path.to_string(),
            name: name.to_string(),
        })
    }
}

/// Scanner state shared by the splitters: bracket depth and open quote.
#[derive(Default)]
struct Nesting {
    depth: usize,
    quote: Option<char>,
}

impl Nesting {
    /// Feed one char. Returns false on a `]` with no matching `[`.
    fn feed(&mut self, c: char) -> bool {
        match self.quote {
            Some(q) if c == q => self.quote = None,
            Some(_) => (),
            None => match c {
                '\'' | '"' if self.depth > 0 => self.quote = Some(c),
                '[' => self.depth += 1,
                ']' if self.depth == 0 => return false,
                ']' => self.depth -= 1,
                _ => (),
            },
        }
        true
    }

    fn at_top(&self) -> bool {
        self.depth == 0 && self.quote.is_none()
    }
}

/// Split on `/` outside brackets.
fn split_steps(path: &str) -> Result<Vec<&str>, PathError> {
    let mut parts = vec![];
    let mut nesting = Nesting::default();
    let mut start = 0;
    for (idx, c) in path.char_indices() {
        if c == '/' && nesting.at_top() {
            parts.push(&path[start..idx]);
            start = idx + 1;
            continue;
        }
        if !nesting.feed(c) {
            return Err(PathError::Unbalanced(path.to_string()));
        }
    }
    if !nesting.at_top() {
        return Err(PathError::Unbalanced(path.to_string()));
    }
    parts.push(&path[start..]);
    Ok(parts)
}

/// Split a step into its element part and an optional attribute selector,
/// using the first `@` found outside brackets.
fn split_attribute(step: &str) -> (&str, Option<&str>) {
    let mut nesting = Nesting::default();
    for (idx, c) in step.char_indices() {
        if c == '@' && nesting.at_top() {
            return (&step[..idx], Some(&step[idx + 1..]));
        }
        nesting.feed(c);
    }
    (step, None)
}

fn unquote(s: &str) -> Option<&str> {
    let s = s.trim();
    for q in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return Some(&s[1..s.len() - 1]);
        }
    }
    None
}

fn parse_predicate(path: &str, text: &str) -> Result<Predicate, PathError> {
    let unsupported = || PathError::UnsupportedPredicate {
        path: path.to_string(),
        predicate: text.to_string(),
    };
    let body = text.trim();

    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        return match body.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Predicate::Position(n)),
            _ => Err(unsupported()),
        };
    }

    if let Some(rest) = body.strip_prefix('@') {
        return match rest.split_once('=') {
            Some((name, value)) => {
                let name = name.trim();
                if !is_plain_name(name) {
                    return Err(unsupported());
                }
                let value = match unquote(value) {
                    Some(v) => v,
                    None if is_plain_name(value.trim()) => value.trim(),
                    None => return Err(unsupported()),
                };
                Ok(Predicate::AttributeEquals(
                    name.to_string(),
                    value.to_string(),
                ))
            }
            None if is_plain_name(rest.trim()) => {
                Ok(Predicate::HasAttribute(rest.trim().to_string()))
            }
            None => Err(unsupported()),
        };
    }

    if is_plain_name(body) && body != "." && body != ".." {
        return Ok(Predicate::HasChild(body.to_string()));
    }

    Err(unsupported())
}

fn parse_step(path: &str, text: &str) -> Result<Step, PathError> {
    let (name, mut rest) = match text.find('[') {
        Some(pos) => (&text[..pos], &text[pos..]),
        None => (text, ""),
    };

    let test = match name {
        "" => return Err(PathError::EmptyStep(path.to_string())),
        ".." => return Err(PathError::EscapesScope(path.to_string())),
        "." => NameTest::Current,
        "*" => NameTest::Any,
        _ => {
            check_name(path, name)?;
            NameTest::Tag(name.to_string())
        }
    };

    let mut predicates = vec![];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return Err(PathError::InvalidName {
                path: path.to_string(),
                name: text.to_string(),
            });
        }
        // Find the matching close bracket.
        let mut nesting = Nesting::default();
        let mut end = None;
        for (idx, c) in rest.char_indices() {
            nesting.feed(c);
            if c == ']' && nesting.at_top() {
                end = Some(idx);
                break;
            }
        }
        let end = end.ok_or_else(|| PathError::Unbalanced(path.to_string()))?;
        predicates.push(parse_predicate(path, &rest[1..end])?);
        rest = &rest[end + 1..];
    }

    Ok(Step { test, predicates })
}

impl PathQuery {
    pub fn parse(path: &str) -> Result<PathQuery, PathError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        if trimmed.starts_with('/') {
            return Err(PathError::EscapesScope(path.to_string()));
        }

        let parts = split_steps(trimmed)?;

        // A lone plain name addresses an attribute of the current record.
        if let [single] = parts.as_slice() {
            if is_plain_name(single) && *single != "." && *single != ".." {
                return Ok(PathQuery {
                    steps: vec![],
                    attribute: Some(single.to_string()),
                });
            }
        }

        let last = parts.len() - 1;
        let mut steps = vec![];
        let mut attribute = None;
        for (idx, part) in parts.iter().enumerate() {
            if part.is_empty() {
                return Err(PathError::EmptyStep(path.to_string()));
            }
            let (element, attr) = split_attribute(part);
            if let Some(attr) = attr {
                if idx != last {
                    return Err(PathError::MisplacedAttribute(path.to_string()));
                }
                check_name(path, attr)?;
                attribute = Some(attr.to_string());
            }
            if !element.is_empty() {
                steps.push(parse_step(path, element)?);
            }
        }

        Ok(PathQuery { steps, attribute })
    }

    /// True if the path selects an attribute rather than an element.
    pub fn selects_attribute(&self) -> bool {
        self.attribute.is_some()
    }

    /// Elements matched by the element steps, in document order. An
    /// attribute-only path matches the record itself.
    pub fn matches<'a>(&self, record: Record<'a>) -> Vec<Record<'a>> {
        let mut current = vec![record];
        for step in &self.steps {
            let mut next = vec![];
            for ctx in &current {
                let mut candidates: Vec<Record<'a>> = match &step.test {
                    NameTest::Current => vec![*ctx],
                    NameTest::Any => ctx.children().collect(),
                    NameTest::Tag(tag) => ctx.children_named(tag).collect(),
                };
                for predicate in &step.predicates {
                    if candidates.is_empty() {
                        break;
                    }
                    candidates = predicate.apply(candidates);
                }
                next.extend(candidates);
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    /// Evaluate against `record`: the first matching attribute (coerced) or
    /// element in document order, else `default`.
    pub fn eval<'a>(&self, record: Record<'a>, default: Value<'a>) -> Value<'a> {
        let matches = self.matches(record);
        match &self.attribute {
            Some(attr) => matches
                .iter()
                .find_map(|m| m.raw(attr))
                .map(coerce)
                .unwrap_or(default),
            None => matches.first().map(|m| Value::Record(*m)).unwrap_or(default),
        }
    }

    /// Numeric result, if the path selects a number.
    pub fn number(&self, record: Record<'_>) -> Option<f64> {
        self.eval(record, Value::Undefined).to_number()
    }

    /// Raw attribute text, if the path selects an attribute that is present.
    pub fn text<'a>(&self, record: Record<'a>) -> Option<&'a str> {
        let attr = self.attribute.as_ref()?;
        self.matches(record).iter().find_map(|m| m.raw(attr))
    }

    /// First matched element.
    pub fn record<'a>(&self, record: Record<'a>) -> Option<Record<'a>> {
        self.eval(record, Value::Undefined).to_record()
    }
}
