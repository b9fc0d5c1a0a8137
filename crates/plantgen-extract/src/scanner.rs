//! String-aware brace scanner.
//!
//! Walks C#-like source text one transition at a time, tracking whether the
//! cursor is in plain code, inside an escaped `"..."` literal, or inside a
//! verbatim `@"..."` literal. Braces only count in plain code, so diagram text
//! containing `{`, `}` or quotes never closes a block early.
//!
//! All delimiters are ASCII, so the scanner works on bytes and every index it
//! reports is a valid `str` char boundary.

/// Lexical state of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexState {
    #[default]
    Normal,
    InQuotedString,
    InVerbatimString,
}

/// What a single transition consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// `{` in plain code.
    Open,
    /// `}` in plain code.
    Close,
    /// Opening marker of a literal (`"` or `@"`).
    LiteralStart,
    /// Closing `"` of a literal.
    LiteralEnd,
    /// Any other byte in plain code.
    Code(u8),
    /// Literal content, including escape pairs and doubled quotes.
    Text,
}

/// Apply one transition at the start of `rest`.
///
/// Returns the next state, the number of bytes consumed and the event those
/// bytes produced, or `None` once the input is exhausted.
#[must_use]
pub fn transition(state: LexState, rest: &[u8]) -> Option<(LexState, usize, Event)> {
    use LexState::{InQuotedString, InVerbatimString, Normal};

    let step = match (state, rest) {
        (_, []) => return None,
        (Normal, [b'@', b'"', ..]) => (InVerbatimString, 2, Event::LiteralStart),
        (Normal, [b'"', ..]) => (InQuotedString, 1, Event::LiteralStart),
        (Normal, [b'{', ..]) => (Normal, 1, Event::Open),
        (Normal, [b'}', ..]) => (Normal, 1, Event::Close),
        (Normal, [byte, ..]) => (Normal, 1, Event::Code(*byte)),
        // A backslash swallows whatever follows, including a quote.
        (InQuotedString, [b'\\', _, ..]) => (InQuotedString, 2, Event::Text),
        (InQuotedString, [b'"', ..]) => (Normal, 1, Event::LiteralEnd),
        (InQuotedString, [_, ..]) => (InQuotedString, 1, Event::Text),
        (InVerbatimString, [b'"', b'"', ..]) => (InVerbatimString, 2, Event::Text),
        (InVerbatimString, [b'"', ..]) => (Normal, 1, Event::LiteralEnd),
        (InVerbatimString, [_, ..]) => (InVerbatimString, 1, Event::Text),
    };
    Some(step)
}

/// Iterator of `(byte offset, event)` pairs over a text.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: LexState,
}

impl<'a> Lexer<'a> {
    /// Start lexing `text` at byte offset `start` in [`LexState::Normal`].
    #[must_use]
    pub fn new(text: &'a str, start: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: start,
            state: LexState::Normal,
        }
    }

    /// Current lexical state.
    #[must_use]
    pub fn state(&self) -> LexState {
        self.state
    }
}

impl Iterator for Lexer<'_> {
    type Item = (usize, Event);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.bytes.get(self.pos..)?;
        let (state, consumed, event) = transition(self.state, rest)?;
        let at = self.pos;
        self.pos += consumed;
        self.state = state;
        Some((at, event))
    }
}

/// Find the brace closing a block whose opening `{` sits just before `start`.
///
/// Returns the byte offset of the matching `}`, or `None` when the text ends
/// with the block still open.
#[must_use]
pub fn find_block(text: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (at, event) in Lexer::new(text, start) {
        match event {
            Event::Open => depth += 1,
            Event::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(at);
                }
            }
            _ => {}
        }
    }
    None
}

/// Inner text of the first brace-delimited block in `text`.
///
/// Used for collection literals such as `new List<string> { ... }` or
/// `new[] { ... }`. Returns `None` if there is no `{` or it is never closed.
#[must_use]
pub fn first_block(text: &str) -> Option<&str> {
    let open = Lexer::new(text, 0).find_map(|(at, event)| (event == Event::Open).then_some(at))?;
    let close = find_block(text, open + 1)?;
    Some(&text[open + 1..close])
}

/// The raw literal token (markers included) starting exactly at `start`.
#[must_use]
pub fn literal_at(text: &str, start: usize) -> Option<&str> {
    let mut lexer = Lexer::new(text, start);
    let (_, first) = lexer.next()?;
    if first != Event::LiteralStart {
        return None;
    }
    lexer.find_map(|(at, event)| (event == Event::LiteralEnd).then(|| &text[start..=at]))
}

/// All complete literal tokens in `text`, in order, markers included.
///
/// A literal left open at the end of the text is ignored.
#[must_use]
pub fn string_literals(text: &str) -> Vec<&str> {
    let mut literals = Vec::new();
    let mut open = None;
    for (at, event) in Lexer::new(text, 0) {
        match event {
            Event::LiteralStart => open = Some(at),
            Event::LiteralEnd => {
                if let Some(start) = open.take() {
                    literals.push(&text[start..=at]);
                }
            }
            _ => {}
        }
    }
    literals
}
