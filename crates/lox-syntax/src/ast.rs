use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

pub use lox_common::types::{Span, Spanned};

/// Identity of an expression node, used as the key of the resolver's
/// scope-distance table. Two identical expressions at different positions
/// always get different ids.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExprId(pub u32);

/// Hands out [`ExprId`]s. A single allocator is shared by every program
/// parsed within one interpreter session, so ids never collide across REPL
/// lines.
#[derive(Debug, Default)]
pub struct ExprIds {
    next: u32,
}

impl ExprIds {
    pub fn next(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Default)]
pub struct Program {
    pub stmts: Vec<StmtS>,
}

pub type StmtS = Spanned<Stmt>;

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Block(StmtBlock),
    Class(Box<StmtClass>),
    Expr(StmtExpr),
    Fun(Rc<StmtFun>),
    If(Box<StmtIf>),
    Print(StmtPrint),
    Return(StmtReturn),
    Var(StmtVar),
    While(Box<StmtWhile>),
}

#[derive(Debug, Default, PartialEq)]
pub struct StmtBlock {
    pub stmts: Vec<StmtS>,
}

/// A class declaration. Methods are functions declared without `fun`.
#[derive(Debug, PartialEq)]
pub struct StmtClass {
    pub name: String,
    pub super_: Option<ExprS>,
    pub methods: Vec<Spanned<Rc<StmtFun>>>,
}

/// An expression statement evaluates an expression and discards the result.
#[derive(Debug, PartialEq)]
pub struct StmtExpr {
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct StmtFun {
    pub name: String,
    pub params: Vec<Spanned<String>>,
    pub body: StmtBlock,
}

#[derive(Debug, PartialEq)]
pub struct StmtIf {
    pub cond: ExprS,
    pub then: StmtS,
    pub else_: Option<StmtS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtPrint {
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct StmtReturn {
    pub value: Option<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtVar {
    pub name: String,
    pub value: Option<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtWhile {
    pub cond: ExprS,
    pub body: StmtS,
}

#[derive(Debug, PartialEq)]
pub struct ExprS {
    pub id: ExprId,
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Assign(Box<ExprAssign>),
    Call(Box<ExprCall>),
    Get(Box<ExprGet>),
    Grouping(Box<ExprS>),
    Infix(Box<ExprInfix>),
    Literal(ExprLiteral),
    Logical(Box<ExprLogical>),
    Prefix(Box<ExprPrefix>),
    Set(Box<ExprSet>),
    Super(ExprSuper),
    This,
    Var(ExprVar),
}

#[derive(Debug, PartialEq)]
pub struct ExprAssign {
    pub name: String,
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct ExprCall {
    pub callee: ExprS,
    pub args: Vec<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct ExprGet {
    pub object: ExprS,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprLiteral {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, PartialEq)]
pub struct ExprInfix {
    pub lt: ExprS,
    pub op: OpInfix,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpInfix {
    Add,
    Subtract,
    Multiply,
    Divide,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl Display for OpInfix {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let op = match self {
            OpInfix::Add => "+",
            OpInfix::Subtract => "-",
            OpInfix::Multiply => "*",
            OpInfix::Divide => "/",
            OpInfix::Less => "<",
            OpInfix::LessEqual => "<=",
            OpInfix::Greater => ">",
            OpInfix::GreaterEqual => ">=",
            OpInfix::Equal => "==",
            OpInfix::NotEqual => "!=",
        };
        write!(f, "{op}")
    }
}

#[derive(Debug, PartialEq)]
pub struct ExprLogical {
    pub lt: ExprS,
    pub op: OpLogical,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpLogical {
    /// Short-circuiting logical AND.
    And,
    /// Short-circuiting logical OR.
    Or,
}

impl Display for OpLogical {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let op = match self {
            OpLogical::And => "and",
            OpLogical::Or => "or",
        };
        write!(f, "{op}")
    }
}

#[derive(Debug, PartialEq)]
pub struct ExprPrefix {
    pub op: OpPrefix,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpPrefix {
    Negate,
    Not,
}

impl Display for OpPrefix {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let op = match self {
            OpPrefix::Negate => "-",
            OpPrefix::Not => "!",
        };
        write!(f, "{op}")
    }
}

#[derive(Debug, PartialEq)]
pub struct ExprSet {
    pub object: ExprS,
    pub name: String,
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct ExprSuper {
    pub name: String,
}

#[derive(Debug, PartialEq)]
pub struct ExprVar {
    pub name: String,
}
