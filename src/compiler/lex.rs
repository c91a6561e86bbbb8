use std::{
    iter::Peekable,
    rc::Rc,
    str::Chars,
};

use crate::common::{source::Source, span::{Span, Spanned}};
use crate::compiler::{
    syntax::Syntax,
    token::{Keyword, Punct, Token},
};

type Remaining<'a> = Peekable<Chars<'a>>;

/// Tokenizes a `Source` into a flat stream of `Spanned<Token>`s, ending in a
/// single `Token::Eof`. A `Lexer` is independent of any parser state and
/// makes a single forward pass over the source, `O(n)` in its length.
#[derive(Debug)]
pub struct Lexer {
    source: Rc<Source>,
    index: usize,
}

impl Lexer {
    pub fn lex(source: Rc<Source>) -> Result<Vec<Spanned<Token>>, Syntax> {
        let mut lexer = Lexer { source, index: 0 };
        let mut tokens = vec![];

        lexer.strip();
        while lexer.index < lexer.source.contents.len() {
            tokens.push(lexer.next_token()?);
            lexer.strip();
        }

        let eof_span = Span::point(&lexer.source, lexer.index);
        tokens.push(Spanned::new(Token::Eof, eof_span));
        Ok(tokens)
    }

    fn remaining(&self) -> Remaining {
        self.source.contents[self.index..].chars().peekable()
    }

    fn grab(&self, len: usize) -> &str {
        &self.source.contents[self.index..self.index + len]
    }

    /// Eats whitespace (including newlines -- newlines are whitespace, not
    /// statement separators, see SPEC_FULL.md Open Question i) and line
    /// comments, in a loop, so that a comment followed by more whitespace is
    /// fully consumed before the next token is scanned.
    fn strip(&mut self) {
        loop {
            let before = self.index;
            let mut chars = self.remaining();

            while let Some(c) = chars.peek() {
                if !matches!(c, ' ' | '\t' | '\r' | '\n') {
                    break;
                }
                self.index += c.len_utf8();
                chars.next();
            }

            let mut chars = self.remaining();
            if chars.next() == Some('/') && chars.next() == Some('/') {
                self.index += 2;
                for c in self.remaining() {
                    if c == '\n' {
                        break;
                    }
                    self.index += c.len_utf8();
                }
            }

            if self.index == before {
                break;
            }
        }
    }

    fn take_while(&self, mut chars: Remaining, pred: impl Fn(char) -> bool) -> usize {
        let mut len = 0;
        while let Some(c) = chars.peek() {
            if !pred(*c) {
                break;
            }
            len += c.len_utf8();
            chars.next();
        }
        len
    }

    fn string(&self) -> Result<(Token, usize), Syntax> {
        // opening quote has already been peeked, not consumed
        let mut len = 1;
        let mut escape = false;
        let mut out = String::new();

        for c in self.remaining().skip(1) {
            let bytes = c.len_utf8();
            len += bytes;
            if escape {
                escape = false;
                match c {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    '0' => out.push('\0'),
                    // unrecognized escape: preserve both the backslash and the byte
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            } else {
                match c {
                    '\\' => escape = true,
                    '"' => return Ok((Token::String(out), len)),
                    c => out.push(c),
                }
            }
        }

        Err(Syntax::error(
            "unterminated string literal",
            &Span::new(&self.source, self.index, len),
        ))
    }

    /// `digit` or `.digit` begins a number: optional integer part, optional
    /// `.` fractional part, optional `[eE][+-]?digits` exponent. An invalid
    /// suffix simply halts the number rather than erroring.
    fn number(&self) -> (Token, usize) {
        let chars = self.remaining();
        let mut len = self.take_while(chars, |c| c.is_ascii_digit());

        let rest = &self.source.contents[self.index + len..];
        let mut rest_chars = rest.chars().peekable();

        if rest_chars.peek() == Some(&'.') {
            let mut lookahead = rest_chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                len += 1;
                len += self.take_while(
                    self.source.contents[self.index + len..].chars().peekable(),
                    |c| c.is_ascii_digit(),
                );
            }
        }

        let rest = &self.source.contents[self.index + len..];
        let mut rest_chars = rest.chars().peekable();
        if matches!(rest_chars.peek(), Some('e') | Some('E')) {
            let mut lookahead = rest_chars.clone();
            lookahead.next();
            let mut exp_len = 1;
            if matches!(lookahead.peek(), Some('+') | Some('-')) {
                exp_len += 1;
                lookahead.next();
            }
            let digits = self.take_while(lookahead, |c| c.is_ascii_digit());
            if digits > 0 {
                len += exp_len + digits;
            }
        }

        let text = self.grab(len);
        let value: f64 = text.parse().unwrap_or(f64::NAN);
        (Token::Number(value), len)
    }

    fn ident_or_keyword(&self) -> (Token, usize) {
        let len = self.take_while(self.remaining(), |c| c.is_alphanumeric() || c == '_');
        let text = self.grab(len);
        let token = match Keyword::from_ident(text) {
            Some(k) => Token::Keyword(k),
            None => Token::Ident(text.to_string()),
        };
        (token, len)
    }

    fn next_token(&mut self) -> Result<Spanned<Token>, Syntax> {
        let start = self.index;
        let mut chars = self.remaining();
        let c = chars.next().expect("strip() guarantees a char remains");

        let (token, len) = match c {
            '"' => self.string()?,

            '0'..='9' => self.number(),
            '.' if chars.peek().is_some_and(|n| n.is_ascii_digit()) => self.number(),

            c if c.is_alphabetic() || c == '_' => self.ident_or_keyword(),

            // multi-byte punctuation, longest match first
            '=' if chars.peek() == Some(&'=') => (Token::Punct(Punct::Eq), 2),
            '!' if chars.peek() == Some(&'=') => (Token::Punct(Punct::NotEq), 2),
            '<' if chars.peek() == Some(&'=') => (Token::Punct(Punct::LtEq), 2),
            '>' if chars.peek() == Some(&'=') => (Token::Punct(Punct::GtEq), 2),
            '-' if chars.peek() == Some(&'>') => (Token::Punct(Punct::Arrow), 2),
            '=' if chars.peek() == Some(&'>') => (Token::Punct(Punct::FatArrow), 2),
            '.' if self.starts_with_ellipsis() => (Token::Punct(Punct::Ellipsis), 3),

            '(' => (Token::Punct(Punct::LParen), 1),
            ')' => (Token::Punct(Punct::RParen), 1),
            '[' => (Token::Punct(Punct::LBracket), 1),
            ']' => (Token::Punct(Punct::RBracket), 1),
            '{' => (Token::Punct(Punct::LBrace), 1),
            '}' => (Token::Punct(Punct::RBrace), 1),
            ',' => (Token::Punct(Punct::Comma), 1),
            '.' => (Token::Punct(Punct::Dot), 1),
            ':' => (Token::Punct(Punct::Colon), 1),
            ';' => (Token::Punct(Punct::Semi), 1),
            '=' => (Token::Punct(Punct::Assign), 1),
            '<' => (Token::Punct(Punct::Lt), 1),
            '>' => (Token::Punct(Punct::Gt), 1),
            '+' => (Token::Punct(Punct::Plus), 1),
            '-' => (Token::Punct(Punct::Minus), 1),
            '*' => (Token::Punct(Punct::Star), 1),
            '/' => (Token::Punct(Punct::Slash), 1),
            '%' => (Token::Punct(Punct::Percent), 1),
            '@' => (Token::Punct(Punct::At), 1),

            // Unicode mathematical/logical glyphs
            '\u{2192}' => (Token::Punct(Punct::Arrow), '\u{2192}'.len_utf8()),       // →
            '\u{21d2}' => (Token::Punct(Punct::FatArrow), '\u{21d2}'.len_utf8()),    // ⇒
            '\u{2227}' => (Token::Punct(Punct::LogAnd), '\u{2227}'.len_utf8()),      // ∧
            '\u{2228}' => (Token::Punct(Punct::LogOr), '\u{2228}'.len_utf8()),       // ∨
            '\u{00ac}' => (Token::Punct(Punct::LogNot), '\u{00ac}'.len_utf8()),      // ¬
            '\u{2297}' => (Token::Punct(Punct::Otimes), '\u{2297}'.len_utf8()),      // ⊗
            '\u{2295}' => (Token::Punct(Punct::Oplus), '\u{2295}'.len_utf8()),       // ⊕
            '\u{2200}' => (Token::Punct(Punct::ForallGlyph), '\u{2200}'.len_utf8()), // ∀
            '\u{2203}' => (Token::Punct(Punct::ExistsGlyph), '\u{2203}'.len_utf8()), // ∃

            unknown => {
                return Err(Syntax::error(
                    &format!("unrecognized character '{}'", unknown),
                    &Span::point(&self.source, start),
                ));
            }
        };

        let span = Span::new(&self.source, start, len);
        self.index += len;
        Ok(Spanned::new(token, span))
    }

    fn starts_with_ellipsis(&self) -> bool {
        let mut chars = self.remaining();
        chars.next() == Some('.') && chars.next() == Some('.') && chars.next() == Some('.')
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lex(s: &str) -> Vec<Token> {
        Lexer::lex(Source::source(s))
            .unwrap()
            .into_iter()
            .map(|t| t.item)
            .collect()
    }

    #[test]
    fn lex_empty() {
        assert_eq!(lex(""), vec![Token::Eof]);
    }

    #[test]
    fn lex_assignment() {
        assert_eq!(
            lex("set x 10"),
            vec![
                Token::Keyword(Keyword::Set),
                Token::Ident("x".to_string()),
                Token::Number(10.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn newlines_are_whitespace() {
        // per Open Question (i): newlines never appear as tokens
        assert_eq!(
            lex("set x 1\nset y 2"),
            vec![
                Token::Keyword(Keyword::Set),
                Token::Ident("x".to_string()),
                Token::Number(1.0),
                Token::Keyword(Keyword::Set),
                Token::Ident("y".to_string()),
                Token::Number(2.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn escape_sequence_produces_control_bytes() {
        // scenario H: "line1\nline2" is a single STRING of 11 bytes
        let tokens = lex("\"line1\\nline2\"");
        match &tokens[0] {
            Token::String(s) => assert_eq!(s.as_bytes().len(), 11),
            other => panic!("expected a string token, got {:?}", other),
        }
    }

    #[test]
    fn unknown_escape_preserves_both_bytes() {
        let tokens = lex("\"a\\qb\"");
        assert_eq!(tokens[0], Token::String("a\\qb".to_string()));
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        assert!(Lexer::lex(Source::source("\"abc")).is_err());
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(lex("6.022e23"), vec![Token::Number(6.022e23), Token::Eof]);
        assert_eq!(lex("1e-3"), vec![Token::Number(1e-3), Token::Eof]);
    }

    #[test]
    fn line_comment_runs_to_newline() {
        assert_eq!(lex("// hello\nset x 1"), lex("set x 1"));
    }

    #[test]
    fn longest_match_punctuation() {
        assert_eq!(lex("<="), vec![Token::Punct(Punct::LtEq), Token::Eof]);
        assert_eq!(
            lex("< ="),
            vec![Token::Punct(Punct::Lt), Token::Punct(Punct::Assign), Token::Eof]
        );
    }

    #[test]
    fn unicode_operator_glyphs() {
        assert_eq!(
            lex("\u{2200}"),
            vec![Token::Punct(Punct::ForallGlyph), Token::Eof]
        );
    }

    #[test]
    fn last_token_is_always_eof() {
        let tokens = Lexer::lex(Source::source("set x 1")).unwrap();
        assert!(matches!(tokens.last().unwrap().item, Token::Eof));
    }
}
