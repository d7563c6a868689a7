use std::fmt::{self, Display, Formatter};

use logos::Logos;
use lox_common::types::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    /// 1-based line on which the token starts.
    pub line: usize,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Clone, Copy, Debug, Eq, Hash, Logos, PartialEq)]
pub enum TokenKind {
    // Single-character tokens.
    #[token("(")]
    LtParen,
    #[token(")")]
    RtParen,
    #[token("{")]
    LtBrace,
    #[token("}")]
    RtBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token(";")]
    Semicolon,
    #[token("/")]
    Slash,
    #[token("*")]
    Asterisk,

    // One or two character tokens.
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    // Literals.
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,
    #[regex(r#""[^"]*""#)]
    String,
    #[regex(r#"[0-9]+(\.[0-9]+)?"#)]
    Number,

    // Keywords.
    #[token("and")]
    And,
    #[token("class")]
    Class,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("for")]
    For,
    #[token("fun")]
    Fun,
    #[token("if")]
    If,
    #[token("nil")]
    Nil,
    #[token("or")]
    Or,
    #[token("print")]
    Print,
    #[token("return")]
    Return,
    #[token("super")]
    Super,
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("var")]
    Var,
    #[token("while")]
    While,

    /// End of input. Never produced by `logos`, appended by the lexer.
    Eof,

    #[regex(r"//.*", logos::skip)]
    #[regex(r"[ \r\n\t\f]+", logos::skip)]
    #[error]
    Error,
}

impl TokenKind {
    /// Keywords which begin a declaration or statement; the parser
    /// resynchronizes on these after a syntax error.
    pub fn starts_stmt(self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
        )
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Class
                | TokenKind::Else
                | TokenKind::False
                | TokenKind::For
                | TokenKind::Fun
                | TokenKind::If
                | TokenKind::Nil
                | TokenKind::Or
                | TokenKind::Print
                | TokenKind::Return
                | TokenKind::Super
                | TokenKind::This
                | TokenKind::True
                | TokenKind::Var
                | TokenKind::While
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::LtParen => r#""(""#,
            TokenKind::RtParen => r#"")""#,
            TokenKind::LtBrace => r#""{""#,
            TokenKind::RtBrace => r#""}""#,
            TokenKind::Comma => r#"",""#,
            TokenKind::Dot => r#"".""#,
            TokenKind::Minus => r#""-""#,
            TokenKind::Plus => r#""+""#,
            TokenKind::Semicolon => r#"";""#,
            TokenKind::Slash => r#""/""#,
            TokenKind::Asterisk => r#""*""#,
            TokenKind::Bang => r#""!""#,
            TokenKind::BangEqual => r#""!=""#,
            TokenKind::Equal => r#""=""#,
            TokenKind::EqualEqual => r#""==""#,
            TokenKind::Greater => r#"">""#,
            TokenKind::GreaterEqual => r#"">=""#,
            TokenKind::Less => r#""<""#,
            TokenKind::LessEqual => r#""<=""#,
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::And => r#""and""#,
            TokenKind::Class => r#""class""#,
            TokenKind::Else => r#""else""#,
            TokenKind::False => r#""false""#,
            TokenKind::For => r#""for""#,
            TokenKind::Fun => r#""fun""#,
            TokenKind::If => r#""if""#,
            TokenKind::Nil => r#""nil""#,
            TokenKind::Or => r#""or""#,
            TokenKind::Print => r#""print""#,
            TokenKind::Return => r#""return""#,
            TokenKind::Super => r#""super""#,
            TokenKind::This => r#""this""#,
            TokenKind::True => r#""true""#,
            TokenKind::Var => r#""var""#,
            TokenKind::While => r#""while""#,
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid input",
        };
        f.write_str(s)
    }
}
