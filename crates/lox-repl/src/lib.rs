use std::borrow::Cow;

use anyhow::{Context, Result};
use lox_syntax::lexer::Lexer;
use lox_syntax::token::TokenKind;
use nu_ansi_term::{Color, Style};
use reedline::{
    EditCommand, Emacs, FileBackedHistory, KeyCode, KeyModifiers, PromptEditMode,
    PromptHistorySearch, Reedline, ReedlineEvent, StyledText, ValidationResult,
};
pub use reedline::Signal;

pub fn editor() -> Result<Reedline> {
    let mut keybindings = reedline::default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );

    let data_dir = dirs::data_dir().context("could not find data directory")?;
    let history_path = data_dir.join("lox/history.txt");
    let history = Box::new(
        FileBackedHistory::with_file(10000, history_path.clone())
            .with_context(|| format!("could not open history file: {}", history_path.display()))?,
    );

    let editor = Reedline::create()
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
        .with_highlighter(Box::new(Highlighter))
        .with_history(history)
        .with_validator(Box::new(Validator));
    Ok(editor)
}

// Colour scheme inspired by base16-google-dark, using the high-intensity
// variants which are easier to read on most terminals.
mod palette {
    use nu_ansi_term::Color;

    pub const DEFAULT: Color = Color::LightGray;
    pub const CLASS: Color = Color::LightYellow;
    pub const COMMENT: Color = Color::DarkGray;
    pub const CONSTANT: Color = Color::LightCyan;
    pub const FUNCTION: Color = Color::LightBlue;
    pub const KEYWORD: Color = Color::LightPurple;
    pub const STRING: Color = Color::LightGreen;
    pub const VARIABLE: Color = Color::LightRed;
}

/// Colours input token by token, using the same lexer as the parser.
struct Highlighter;

impl Highlighter {
    fn color(tokens: &[(usize, usize, Option<TokenKind>)], idx: usize, line: &str) -> Color {
        let (start, end, kind) = tokens[idx];
        let next = tokens.get(idx + 1).and_then(|&(_, _, kind)| kind);
        match kind {
            Some(TokenKind::True | TokenKind::False | TokenKind::Nil | TokenKind::Number) => {
                palette::CONSTANT
            }
            Some(TokenKind::This | TokenKind::Super) => palette::VARIABLE,
            Some(kind) if kind.is_keyword() => palette::KEYWORD,
            Some(TokenKind::String) => palette::STRING,
            Some(TokenKind::Identifier) if next == Some(TokenKind::LtParen) => palette::FUNCTION,
            Some(TokenKind::Identifier) if line[start..end].starts_with(char::is_uppercase) => {
                palette::CLASS
            }
            Some(TokenKind::Identifier) => palette::VARIABLE,
            // An unterminated string is reported as an error but still reads as a string.
            None if line[start..end].starts_with('"') => palette::STRING,
            _ => palette::DEFAULT,
        }
    }
}

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let tokens = Lexer::new(line)
            .map(|result| match result {
                Ok(token) => (token.span.start, token.span.end, Some(token.kind)),
                Err((_, span)) => (span.start, span.end, None),
            })
            .collect::<Vec<_>>();

        let mut output = StyledText::new();
        let mut curr_end = 0;
        for idx in 0..tokens.len() {
            let (start, end, _) = tokens[idx];
            if start > curr_end {
                push_gap(&mut output, &line[curr_end..start]);
            }
            if end > start {
                let style = Style::new().fg(Self::color(&tokens, idx, line));
                output.push((style, line[start..end].to_string()));
            }
            curr_end = curr_end.max(end);
        }
        if curr_end < line.len() {
            push_gap(&mut output, &line[curr_end..]);
        }

        output
    }
}

/// Text skipped by the lexer is whitespace, possibly followed by a comment.
fn push_gap(output: &mut StyledText, gap: &str) {
    let (text, comment) = gap.split_at(gap.find("//").unwrap_or(gap.len()));
    if !text.is_empty() {
        output.push((Style::new().fg(palette::DEFAULT), text.to_string()));
    }
    if !comment.is_empty() {
        output.push((Style::new().fg(palette::COMMENT), comment.to_string()));
    }
}

/// Keeps reading lines while the input stops in the middle of a statement.
struct Validator;

impl reedline::Validator for Validator {
    fn validate(&self, line: &str) -> ValidationResult {
        if lox_syntax::is_complete(line) {
            ValidationResult::Complete
        } else {
            ValidationResult::Incomplete
        }
    }
}

pub struct Prompt;

impl reedline::Prompt for Prompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed(">>> ")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, _: PromptHistorySearch) -> Cow<str> {
        Cow::Borrowed("")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reedline::Highlighter as _;

    use super::*;

    fn highlight(line: &str) -> Vec<(Color, String)> {
        Highlighter
            .highlight(line, 0)
            .buffer
            .into_iter()
            .map(|(style, text)| (style.foreground.unwrap_or(palette::DEFAULT), text))
            .collect()
    }

    #[test]
    fn highlight_keeps_all_text() {
        let line = r#"var greeting = "hi"; // say hi"#;
        let text = highlight(line).into_iter().map(|(_, text)| text).collect::<String>();
        assert_eq!(text, line);
    }

    #[test]
    fn highlight_token_kinds() {
        let got = highlight("print Foo(x, 1);");
        assert_eq!(
            got,
            vec![
                (palette::KEYWORD, "print".to_string()),
                (palette::DEFAULT, " ".to_string()),
                (palette::FUNCTION, "Foo".to_string()),
                (palette::DEFAULT, "(".to_string()),
                (palette::VARIABLE, "x".to_string()),
                (palette::DEFAULT, ",".to_string()),
                (palette::DEFAULT, " ".to_string()),
                (palette::CONSTANT, "1".to_string()),
                (palette::DEFAULT, ")".to_string()),
                (palette::DEFAULT, ";".to_string()),
            ]
        );
    }

    #[test]
    fn highlight_comment_and_unterminated_string() {
        let got = highlight("Foo // note");
        assert_eq!(got[0], (palette::CLASS, "Foo".to_string()));
        assert_eq!(got.last(), Some(&(palette::COMMENT, "// note".to_string())));

        let got = highlight(r#"print "open"#);
        assert_eq!(got.last(), Some(&(palette::STRING, r#""open"#.to_string())));
    }

    #[test]
    fn validator_waits_for_complete_input() {
        use reedline::Validator as _;
        assert!(matches!(Validator.validate("fun f() {"), ValidationResult::Incomplete));
        assert!(matches!(Validator.validate("print 1;"), ValidationResult::Complete));
    }
}
