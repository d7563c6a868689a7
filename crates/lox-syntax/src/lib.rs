pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

use lox_common::error::{ErrorS, SyntaxError};

use crate::ast::{ExprIds, Program};
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Lexes and parses `source`. Lexical and syntax errors are reported
/// together, in source order; a program is only returned if there were none.
pub fn parse(source: &str, ids: &mut ExprIds) -> Result<Program, Vec<ErrorS>> {
    let (tokens, mut errors) = Lexer::tokenize(source);
    let (program, parse_errors) = Parser::new(tokens, ids).parse();
    errors.extend(parse_errors);

    if errors.is_empty() {
        tracing::debug!(stmts = program.stmts.len(), "parsed program");
        Ok(program)
    } else {
        errors.sort_by_key(|(_, span)| span.start);
        Err(errors)
    }
}

/// Whether `source` is a complete program, i.e. it does not stop in the
/// middle of a statement or string. Drives multiline input in the REPL.
pub fn is_complete(source: &str) -> bool {
    let (tokens, errors) = Lexer::tokenize(source);
    let (_, parse_errors) = Parser::new(tokens, &mut ExprIds::default()).parse();
    !errors.iter().chain(parse_errors.iter()).any(|(e, _)| {
        matches!(
            e,
            lox_common::error::Error::SyntaxError(
                SyntaxError::UnrecognizedEof { .. } | SyntaxError::UnterminatedString
            )
        )
    })
}

#[cfg(test)]
mod tests {
    use lox_common::error::Error;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_merges_lexer_and_parser_errors() {
        let errors = parse("print @;\nprint 1 +;", &mut ExprIds::default()).unwrap_err();
        let messages = errors.iter().map(|(e, _)| e.to_string()).collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                r#"SyntaxError: unexpected input: "@""#,
                r#"SyntaxError: unexpected ";""#,
                r#"SyntaxError: unexpected ";""#,
            ]
        );
        assert!(errors.windows(2).all(|w| w[0].1.start <= w[1].1.start));
    }

    #[test]
    fn incomplete_input() {
        assert!(is_complete("print 1;"));
        assert!(is_complete("print 1 +;"));
        assert!(!is_complete("fun f() {"));
        assert!(!is_complete("print \"abc"));
        assert!(!is_complete("print 1"));
    }

    #[test]
    fn unterminated_string_error() {
        let errors = parse("\"abc", &mut ExprIds::default()).unwrap_err();
        assert_eq!(errors, vec![(Error::SyntaxError(SyntaxError::UnterminatedString), 0..4)]);
    }
}
