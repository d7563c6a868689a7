use logos::Logos;
use lox_common::error::{ErrorS, SyntaxError};
use lox_common::types::Span;

use crate::token::{Literal, Token, TokenKind};

/// Turns source text into [`Token`]s, ending with a single [`TokenKind::Eof`].
///
/// Errors are yielded inline so that the caller can keep lexing past them.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    pending: Option<(TokenKind, Span)>,
    line: usize,
    line_pos: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { inner: TokenKind::lexer(source), pending: None, line: 1, line_pos: 0, done: false }
    }

    /// Lexes the whole source, splitting tokens from errors.
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<ErrorS>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        for result in Lexer::new(source) {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }
        (tokens, errors)
    }

    fn line_at(&mut self, pos: usize) -> usize {
        let source = self.inner.source();
        let pos = pos.min(source.len());
        if pos > self.line_pos {
            self.line += source[self.line_pos..pos].matches('\n').count();
            self.line_pos = pos;
        }
        self.line
    }

    fn token(&mut self, kind: TokenKind, span: Span) -> Token {
        let lexeme = self.inner.source()[span.clone()].to_string();
        let literal = match kind {
            TokenKind::Number => lexeme.parse().ok().map(Literal::Number),
            TokenKind::String => Some(Literal::String(lexeme[1..lexeme.len() - 1].to_string())),
            TokenKind::True => Some(Literal::Bool(true)),
            TokenKind::False => Some(Literal::Bool(false)),
            _ => None,
        };
        let line = self.line_at(span.start);
        Token { kind, lexeme, literal, line, span }
    }

    fn eof(&mut self) -> Token {
        let end = self.inner.source().len();
        let line = self.line_at(end);
        Token { kind: TokenKind::Eof, lexeme: String::new(), literal: None, line, span: end..end }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, ErrorS>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((kind, span)) = self.pending.take() {
            return Some(Ok(self.token(kind, span)));
        }
        if self.done {
            return None;
        }

        match self.inner.next() {
            None => {
                self.done = true;
                Some(Ok(self.eof()))
            }
            Some(TokenKind::Error) => {
                let mut span = self.inner.span();

                // An unterminated string swallows the rest of the input.
                if self.inner.slice().starts_with('"') {
                    let end = self.inner.source().len();
                    while self.inner.next().is_some() {}
                    return Some(Err((SyntaxError::UnterminatedString.into(), span.start..end)));
                }

                // Merge a run of adjacent invalid characters into one error.
                while let Some(kind) = self.inner.next() {
                    let span_new = self.inner.span();
                    if kind == TokenKind::Error && span.end == span_new.start {
                        span.end = span_new.end;
                    } else {
                        self.pending = Some((kind, span_new));
                        break;
                    }
                }

                let token = self.inner.source()[span.clone()].to_string();
                Some(Err((SyntaxError::UnexpectedInput { token }.into(), span)))
            }
            Some(kind) => {
                let span = self.inner.span();
                Some(Ok(self.token(kind, span)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lox_common::error::Error;
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::tokenize(source);
        assert_eq!(errors, vec![]);
        tokens.into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn lex_ends_with_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(
            kinds("var a = 1; // comment"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_operators() {
        assert_eq!(
            kinds("!= ! == = <= < >= >"),
            vec![
                TokenKind::BangEqual,
                TokenKind::Bang,
                TokenKind::EqualEqual,
                TokenKind::Equal,
                TokenKind::LessEqual,
                TokenKind::Less,
                TokenKind::GreaterEqual,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_literals() {
        let (tokens, _) = Lexer::tokenize(r#"12.5 "hi" true orchid"#);
        let literals = tokens.iter().map(|token| token.literal.clone()).collect::<Vec<_>>();
        assert_eq!(
            literals,
            vec![
                Some(Literal::Number(12.5)),
                Some(Literal::String("hi".to_string())),
                Some(Literal::Bool(true)),
                None,
                None,
            ]
        );
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].lexeme, "orchid");
    }

    #[test]
    fn lex_tracks_lines() {
        let (tokens, _) = Lexer::tokenize("a\n\"b\nc\"\nd");
        let lines = tokens.iter().map(|token| token.line).collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 2, 4, 4]);
    }

    #[test]
    fn lex_invalid_token() {
        let got = Lexer::new("@# bar").collect::<Vec<_>>();
        assert_eq!(got.len(), 3);
        assert_eq!(
            got[0],
            Err((Error::SyntaxError(SyntaxError::UnexpectedInput { token: "@#".to_string() }), 0..2))
        );
        assert_eq!(got[1].as_ref().map(|token| token.lexeme.as_str()), Ok("bar"));
    }

    #[test]
    fn lex_unterminated_string() {
        let (tokens, errors) = Lexer::tokenize("\"\nfoo");
        assert_eq!(errors, vec![(Error::SyntaxError(SyntaxError::UnterminatedString), 0..5)]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].line, 2);
    }
}
