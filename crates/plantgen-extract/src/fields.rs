//! Top-level field assignments of a record block.
//!
//! A record block is the inner text of an object initializer:
//!
//! ```text
//! Id = 3,
//! Section = "Sektion 1: Basics",
//! PlantUMLSources = new List<string> { "...", "..." }
//! ```
//!
//! [`BlockFields`] splits it on commas that sit outside literals, braces,
//! parentheses and brackets, and keeps each `Name = value` pair. Segments that
//! are not an assignment are kept aside as loose segments.

use std::ops::Range;

use crate::scanner::{Event, Lexer};

/// One `Name = value` assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub name: &'a str,
    /// Raw value text, trimmed.
    pub value: &'a str,
}

/// Assignments of a block, in source order.
#[derive(Debug, Default)]
pub struct BlockFields<'a> {
    fields: Vec<Field<'a>>,
    loose: Vec<&'a str>,
}

impl<'a> BlockFields<'a> {
    /// Split a block's inner text into its assignments.
    ///
    /// Segments that are not an assignment to a plain identifier end up in
    /// [`BlockFields::loose`].
    #[must_use]
    pub fn parse(block: &'a str) -> Self {
        let mut fields = Self::default();
        let mut nesting = 0usize;
        let mut segment_start = 0;
        let mut equals = None;

        for (at, event) in Lexer::new(block, 0) {
            match event {
                Event::Open | Event::Code(b'(' | b'[') => nesting += 1,
                Event::Close | Event::Code(b')' | b']') => nesting = nesting.saturating_sub(1),
                Event::Code(b'=') if nesting == 0 && equals.is_none() => equals = Some(at),
                Event::Code(b',') if nesting == 0 => {
                    fields.push_segment(block, segment_start..at, equals);
                    segment_start = at + 1;
                    equals = None;
                }
                _ => {}
            }
        }
        fields.push_segment(block, segment_start..block.len(), equals);

        fields
    }

    fn push_segment(&mut self, block: &'a str, segment: Range<usize>, equals: Option<usize>) {
        match equals.and_then(|at| field(block, segment.start, at, segment.end)) {
            Some(field) => self.fields.push(field),
            None => {
                let text = block[segment].trim();
                if !text.is_empty() {
                    self.loose.push(text);
                }
            }
        }
    }

    /// First assignment to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field<'a>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of assignments found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Trimmed segments that are not an assignment, in source order.
    ///
    /// A well-formed initializer has none besides stray values; sibling
    /// initializers show up here when the block swallowed them.
    #[must_use]
    pub fn loose(&self) -> &[&'a str] {
        &self.loose
    }
}

fn field(block: &str, start: usize, equals: usize, end: usize) -> Option<Field<'_>> {
    // Comments before the name leave words in front of it; the name is the
    // last one.
    let name = block[start..equals].split_whitespace().last()?;
    if !is_identifier(name) {
        return None;
    }
    Some(Field {
        name,
        value: block[equals + 1..end].trim(),
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
