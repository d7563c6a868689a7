use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use termcolor::WriteColor;
use thiserror::Error;

use crate::types::{Span, Spanned};

pub type ErrorS = Spanned<Error>;
pub type Result<T, E = ErrorS> = std::result::Result<T, E>;

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("AttributeError: {0}")]
    AttributeError(#[from] AttributeError),
    #[error("IOError: {0}")]
    IoError(#[from] IoError),
    #[error("NameError: {0}")]
    NameError(#[from] NameError),
    #[error("OverflowError: {0}")]
    OverflowError(#[from] OverflowError),
    #[error("SyntaxError: {0}")]
    SyntaxError(#[from] SyntaxError),
    #[error("TypeError: {0}")]
    TypeError(#[from] TypeError),
}

impl Error {
    /// The category name, shown as the diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::AttributeError(_) => "AttributeError",
            Error::IoError(_) => "IOError",
            Error::NameError(_) => "NameError",
            Error::OverflowError(_) => "OverflowError",
            Error::SyntaxError(_) => "SyntaxError",
            Error::TypeError(_) => "TypeError",
        }
    }

    fn message(&self) -> String {
        match self {
            Error::AttributeError(e) => e.to_string(),
            Error::IoError(e) => e.to_string(),
            Error::NameError(e) => e.to_string(),
            Error::OverflowError(e) => e.to_string(),
            Error::SyntaxError(e) => e.to_string(),
            Error::TypeError(e) => e.to_string(),
        }
    }

    fn notes(&self) -> Vec<String> {
        match self {
            Error::SyntaxError(
                SyntaxError::UnrecognizedEof { expected }
                | SyntaxError::UnrecognizedToken { expected, .. },
            ) => vec![format!("expected: {}", one_of(expected))],
            _ => Vec::new(),
        }
    }

    pub fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        Diagnostic::error()
            .with_code(self.code())
            .with_message(self.message())
            .with_labels(vec![Label::primary((), span.clone())])
            .with_notes(self.notes())
    }
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AttributeError {
    #[error("{type_:?} object has no attribute {name:?}")]
    NoSuchAttribute { type_: String, name: String },
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum IoError {
    #[error("unable to write to file: {file:?}")]
    WriteError { file: String },
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum NameError {
    #[error("cannot access {name:?} in its own initializer")]
    AccessInsideInitializer { name: String },
    #[error("name {name:?} is already defined")]
    AlreadyDefined { name: String },
    #[error("class {name:?} cannot inherit from itself")]
    ClassInheritFromSelf { name: String },
    #[error("name {name:?} is not defined")]
    NotDefined { name: String },
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OverflowError {
    #[error("maximum recursion depth exceeded")]
    StackOverflow,
    #[error("cannot have more than 255 arguments")]
    TooManyArgs,
    #[error("cannot have more than 255 parameters")]
    TooManyParams,
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SyntaxError {
    #[error(r#""init" cannot return a value"#)]
    InitReturnValue,
    #[error("invalid assignment target")]
    InvalidAssignTarget,
    #[error(r#""return" outside function"#)]
    ReturnOutsideFunction,
    #[error(r#""super" outside class"#)]
    SuperOutsideClass,
    #[error(r#""super" in class with no superclass"#)]
    SuperWithoutSuperclass,
    #[error(r#""this" outside class"#)]
    ThisOutsideClass,
    #[error("unexpected input: {token:?}")]
    UnexpectedInput { token: String },
    #[error("unexpected end of file")]
    UnrecognizedEof { expected: Vec<String> },
    #[error("unexpected {token:?}")]
    UnrecognizedToken { token: String, expected: Vec<String> },
    #[error("unterminated string")]
    UnterminatedString,
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TypeError {
    #[error("{name}() takes {exp_args} arguments but {got_args} were given")]
    ArityMismatch { name: String, exp_args: usize, got_args: usize },
    #[error("only instances have properties, not {type_:?}")]
    NotAnInstance { type_: String },
    #[error("{type_:?} object is not callable")]
    NotCallable { type_: String },
    #[error(r#"superclass should be of type "class", not {type_:?}"#)]
    SuperclassInvalidType { type_: String },
    #[error("unsupported operand type(s) for {op}: {lt_type:?} and {rt_type:?}")]
    UnsupportedOperandInfix { op: String, lt_type: String, rt_type: String },
    #[error("unsupported operand type for {op}: {rt_type:?}")]
    UnsupportedOperandPrefix { op: String, rt_type: String },
}

fn one_of(tokens: &[String]) -> String {
    let (token_last, tokens) = match tokens.split_last() {
        Some((token_last, &[])) => return token_last.to_string(),
        Some((token_last, tokens)) => (token_last, tokens),
        None => return "nothing".to_string(),
    };

    let mut output = String::new();
    for token in tokens {
        output.push_str(token);
        output.push_str(", ");
    }
    output.push_str("or ");
    output.push_str(token_last);
    output
}

/// Renders errors against `source`, ordered by where they occur.
pub fn report_errors(writer: &mut dyn WriteColor, name: &str, source: &str, errors: &[ErrorS]) {
    let mut errors = errors.iter().collect::<Vec<_>>();
    errors.sort_by_key(|(_, span)| (span.start, span.end));

    let file = SimpleFile::new(name, source);
    let config = term::Config::default();
    for (error, span) in errors {
        let diagnostic = error.as_diagnostic(span);
        if let Err(e) = term::emit(writer, &config, &file, &diagnostic) {
            tracing::warn!("unable to emit diagnostic: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use termcolor::NoColor;

    use super::*;

    #[test]
    fn display_includes_category() {
        let error = Error::from(TypeError::ArityMismatch {
            name: "f".to_string(),
            exp_args: 0,
            got_args: 1,
        });
        assert_eq!(error.to_string(), "TypeError: f() takes 0 arguments but 1 were given");
    }

    #[test]
    fn one_of_lists_alternatives() {
        let tokens = ["a", "b", "c"].map(str::to_string);
        assert_eq!(one_of(&tokens), "a, b, or c");
        assert_eq!(one_of(&tokens[..1]), "a");
        assert_eq!(one_of(&[]), "nothing");
    }

    #[test]
    fn report_points_at_line() {
        let source = "print 1;\nprint x;\n";
        let errors: Vec<ErrorS> =
            vec![(NameError::NotDefined { name: "x".to_string() }.into(), 15..16)];
        let mut writer = NoColor::new(Vec::new());
        report_errors(&mut writer, "<script>", source, &errors);

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.contains(r#"error[NameError]: name "x" is not defined"#), "{output}");
        assert!(output.contains("<script>:2:7"), "{output}");
    }
}
