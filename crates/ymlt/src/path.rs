//! path queries against a [Document]
//!
//! A small JSONPath-like dialect. Queries run directly on the arena and return [NodeId]s, so callers can tell
//! apart two leaves holding the same text.
//!
//! | syntax | selects |
//! |---|---|
//! | `$` | the document content (optional, `a.b` is `$.a.b`) |
//! | `.name` `['name']` `["name"]` | value of a mapping entry |
//! | `.*` `[*]` | all values of a mapping or all items of a sequence |
//! | `[1]` `[-1]` | sequence item, negative indices count from the end |
//! | `[1:3]` `[::2]` | sequence slice |
//! | `[0,'a']` | union of selectors |
//! | `..name` `..*` `..[0]` | selector applied to a node and all its descendants |
//!
//! Filter expressions (`[?(...)]`) are not supported.
use crate::document::{Document, NodeId, NodeKind};
use crate::error::ResolveError;
use crate::visit::VisitValues;

/// A parsed path expression
#[derive(Debug, Clone, PartialEq)]
pub struct YamlPath {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Child(Vec<Selector>),
    Descendant(Vec<Selector>),
}

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Wildcard,
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
}

impl YamlPath {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let segments = PathParser::new(raw.trim())
            .segments()
            .map_err(|message| ResolveError::PathSyntax {
                path: raw.to_string(),
                message,
            })?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// All matching nodes in document order
    pub fn find(&self, document: &Document) -> Vec<NodeId> {
        let mut current: Vec<NodeId> = document.content().into_iter().collect();

        for segment in &self.segments {
            let mut next = vec![];
            for node in current {
                match segment {
                    Segment::Child(selectors) => select(document, node, selectors, &mut next),
                    Segment::Descendant(selectors) => {
                        let mut descendants = vec![];
                        document.visit_values_from(node, &mut |_: &Document, n: NodeId| {
                            descendants.push(n)
                        });
                        for descendant in descendants {
                            select(document, descendant, selectors, &mut next);
                        }
                    }
                }
            }
            current = next;
        }

        tracing::trace!(path = %self.raw, matches = current.len(), "path evaluated");
        current
    }
}

impl std::str::FromStr for YamlPath {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for YamlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn select(document: &Document, node: NodeId, selectors: &[Selector], out: &mut Vec<NodeId>) {
    let children = document.children(node);

    for selector in selectors {
        match (selector, document.kind(node)) {
            (Selector::Name(name), NodeKind::Mapping) => {
                out.extend(
                    document
                        .entries(node)
                        .filter(|(key, _)| document.scalar_text(*key) == Some(name.as_str()))
                        .map(|(_, value)| value),
                );
            }
            (Selector::Wildcard, NodeKind::Mapping) => {
                out.extend(document.entries(node).map(|(_, value)| value))
            }
            (Selector::Wildcard, NodeKind::Sequence) => out.extend_from_slice(children),
            (Selector::Index(index), NodeKind::Sequence) => {
                if let Some(index) = normalize(*index, children.len()) {
                    out.push(children[index]);
                }
            }
            (Selector::Slice { start, end, step }, NodeKind::Sequence) => {
                out.extend(slice(children.len(), *start, *end, *step).map(|i| children[i]))
            }
            _ => {}
        }
    }
}

fn normalize(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { len + index } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

fn slice(
    len: usize,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> impl Iterator<Item = usize> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let step = step.unwrap_or(1);
    let bound = |value: i64, low: i64, high: i64| {
        let value = if value < 0 { len + value } else { value };
        value.clamp(low, high)
    };

    let indices: Vec<i64> = if step > 0 {
        let start = start.map(|s| bound(s, 0, len)).unwrap_or(0);
        let end = end.map(|e| bound(e, 0, len)).unwrap_or(len);
        (start..end).step_by(step as usize).collect()
    } else if step < 0 {
        let start = start.map(|s| bound(s, -1, len - 1)).unwrap_or(len - 1);
        let end = end.map(|e| bound(e, -1, len - 1)).unwrap_or(-1);
        let mut indices = vec![];
        let mut i = start;
        while i > end {
            indices.push(i);
            i += step;
        }
        indices
    } else {
        vec![]
    };

    indices.into_iter().filter_map(|i| usize::try_from(i).ok())
}

struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn segments(&mut self) -> Result<Vec<Segment>, String> {
        let mut segments = vec![];

        if !self.eat('$') {
            // implicit root: `a.b` means `$.a.b`
            match self.peek() {
                None | Some('.') | Some('[') => {}
                Some(_) => segments.push(Segment::Child(vec![self.dotted()?])),
            }
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    if self.eat('.') {
                        let selectors = match self.peek() {
                            Some('[') => self.bracket()?,
                            _ => vec![self.dotted()?],
                        };
                        segments.push(Segment::Descendant(selectors));
                    } else {
                        segments.push(Segment::Child(vec![self.dotted()?]));
                    }
                }
                '[' => segments.push(Segment::Child(self.bracket()?)),
                other => return Err(format!("unexpected '{other}' at position {}", self.pos)),
            }
        }

        Ok(segments)
    }

    /// Selector after a dot: `*` or a name
    fn dotted(&mut self) -> Result<Selector, String> {
        if self.eat('*') {
            Ok(Selector::Wildcard)
        } else {
            self.name()
        }
    }

    fn name(&mut self) -> Result<Selector, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '.' && c != '[') {
            self.bump();
        }

        let name = self.input[start..self.pos].trim();
        if name.is_empty() {
            return Err(format!("expected a name at position {start}"));
        }
        Ok(Selector::Name(name.to_string()))
    }

    fn bracket(&mut self) -> Result<Vec<Selector>, String> {
        let open = self.pos;
        if !self.eat('[') {
            return Err(format!("expected '[' at position {open}"));
        }

        let mut selectors = vec![];
        loop {
            self.skip_whitespace();
            selectors.push(self.selector()?);
            self.skip_whitespace();

            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                Some(other) => {
                    return Err(format!(
                        "unexpected '{other}' at position {}",
                        self.pos - other.len_utf8()
                    ))
                }
                None => return Err(format!("unclosed '[' at position {open}")),
            }
        }

        Ok(selectors)
    }

    fn selector(&mut self) -> Result<Selector, String> {
        match self.peek() {
            Some('*') => {
                self.bump();
                Ok(Selector::Wildcard)
            }
            Some(quote @ ('\'' | '"')) => {
                self.bump();
                self.quoted(quote).map(Selector::Name)
            }
            Some('?') => Err("filter expressions are not supported".to_string()),
            Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => self.index_or_slice(),
            Some(other) => Err(format!("unexpected '{other}' at position {}", self.pos)),
            None => Err("unexpected end of path".to_string()),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, String> {
        let start = self.pos;
        let mut value = String::new();

        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => break,
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => break,
            }
        }

        Err(format!("unterminated string at position {start}"))
    }

    fn integer(&mut self) -> Result<Option<i64>, String> {
        self.skip_whitespace();
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }

        let text = &self.input[start..self.pos];
        if text.is_empty() {
            return Ok(None);
        }
        text.parse()
            .map(Some)
            .map_err(|_| format!("invalid number '{text}' at position {start}"))
    }

    fn index_or_slice(&mut self) -> Result<Selector, String> {
        let start = self.integer()?;
        self.skip_whitespace();

        if !self.eat(':') {
            return start
                .map(Selector::Index)
                .ok_or_else(|| format!("expected an index at position {}", self.pos));
        }

        let end = self.integer()?;
        self.skip_whitespace();
        let step = if self.eat(':') { self.integer()? } else { None };

        Ok(Selector::Slice { start, end, step })
    }
}
