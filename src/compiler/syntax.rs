use std::fmt;

use crate::common::span::Span;

/// A note attached to a `Syntax` error: a location in the source together
/// with an optional hint specific to that location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub span: Span,
    pub hint: Option<String>,
}

impl Note {
    pub fn new(span: Span) -> Note {
        Note { span, hint: None }
    }

    pub fn with_hint(span: Span, hint: &str) -> Note {
        Note { span, hint: Some(hint.to_string()) }
    }
}

/// Represents a static error -- lexical or syntactic -- found before
/// evaluation begins. The lexer and parser both report through this single
/// type; neither produces a runtime `Error` value (see SPEC_FULL.md §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub reason: String,
    pub notes: Vec<Note>,
}

impl Syntax {
    /// Creates a static error with a single, hint-less note.
    pub fn error(reason: &str, span: &Span) -> Syntax {
        Syntax { reason: reason.to_string(), notes: vec![Note::new(span.clone())] }
    }

    /// Creates a static error with a single note carrying a hint.
    pub fn error_with_hint(reason: &str, span: &Span, hint: &str) -> Syntax {
        Syntax { reason: reason.to_string(), notes: vec![Note::with_hint(span.clone(), hint)] }
    }

    /// Extends a syntax error with another note.
    pub fn add_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for note in &self.notes {
            if !note.span.is_empty() {
                writeln!(f, "{}", note.span)?;
            }
            if let Some(hint) = &note.hint {
                writeln!(f, "note: {}", hint)?;
            }
        }
        write!(f, "Syntax Error: {}", self.reason)
    }
}

impl std::error::Error for Syntax {}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::*;
    use crate::common::source::Source;

    #[test]
    fn formats_reason_even_without_notes() {
        let error = Syntax { reason: "something broke".to_string(), notes: vec![] };
        assert_eq!(format!("{}", error), "Syntax Error: something broke");
    }

    #[test]
    fn carries_a_span_into_the_offending_source() {
        let source = Rc::new(Source::source("set x = "));
        let error = Syntax::error("expected an expression", &Span::new(&source, 6, 1));
        let formatted = format!("{}", error);
        assert!(formatted.contains("Syntax Error: expected an expression"));
    }
}
