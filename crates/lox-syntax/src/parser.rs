use std::rc::Rc;

use lox_common::error::{ErrorS, OverflowError, Result, SyntaxError};
use lox_common::types::Span;
use tracing::debug;

use crate::ast::{
    Expr, ExprAssign, ExprCall, ExprGet, ExprIds, ExprInfix, ExprLiteral, ExprLogical, ExprPrefix,
    ExprS, ExprSet, ExprSuper, ExprVar, OpInfix, OpLogical, OpPrefix, Program, Stmt, StmtBlock,
    StmtClass, StmtExpr, StmtFun, StmtIf, StmtPrint, StmtReturn, StmtS, StmtVar, StmtWhile,
};
use crate::token::{Literal, Token, TokenKind};

/// Call arguments and function parameters are capped at this count.
pub const MAX_ARGS: usize = 255;

/// Recursive-descent parser over a token list ending in [`TokenKind::Eof`].
///
/// Syntax errors are collected rather than returned eagerly: after an error
/// the parser skips to the next statement boundary and carries on, so one
/// pass reports every independently broken statement.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    ids: &'a mut ExprIds,
    errors: Vec<ErrorS>,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token>, ids: &'a mut ExprIds) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map_or(0, |token| token.span.end);
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                literal: None,
                line,
                span: end..end,
            });
        }
        Self { tokens, current: 0, ids, errors: Vec::new() }
    }

    pub fn parse(mut self) -> (Program, Vec<ErrorS>) {
        let mut program = Program::default();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                program.stmts.push(stmt);
            }
        }
        (program, self.errors)
    }

    /// Parses one declaration, recovering from any syntax error inside it.
    fn declaration(&mut self) -> Option<StmtS> {
        match self.declaration_inner() {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                debug!(error = %e.0, line = self.peek().line, "syntax error, resynchronizing");
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn declaration_inner(&mut self) -> Result<StmtS> {
        let start = self.peek().span.start;
        if self.match_(TokenKind::Class) {
            let class = self.class()?;
            Ok((Stmt::Class(Box::new(class)), self.span_from(start)))
        } else if self.match_(TokenKind::Fun) {
            let fun = self.function()?;
            Ok((Stmt::Fun(Rc::new(fun)), self.span_from(start)))
        } else if self.match_(TokenKind::Var) {
            self.var(start)
        } else {
            self.statement()
        }
    }

    fn class(&mut self) -> Result<StmtClass> {
        let name = self.consume(TokenKind::Identifier)?.lexeme.clone();

        let super_ = if self.match_(TokenKind::Less) {
            let token = self.consume(TokenKind::Identifier)?;
            let (name, span) = (token.lexeme.clone(), token.span.clone());
            Some(self.expr(Expr::Var(ExprVar { name }), span))
        } else {
            None
        };

        self.consume(TokenKind::LtBrace)?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RtBrace) && !self.is_at_end() {
            let start = self.peek().span.start;
            let method = self.function()?;
            methods.push((Rc::new(method), self.span_from(start)));
        }
        self.consume(TokenKind::RtBrace)?;

        Ok(StmtClass { name, super_, methods })
    }

    /// Parses the part of a function or method after `fun`: its name,
    /// parameter list and body.
    fn function(&mut self) -> Result<StmtFun> {
        let name = self.consume(TokenKind::Identifier)?.lexeme.clone();

        self.consume(TokenKind::LtParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RtParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.errors.push((OverflowError::TooManyParams.into(), self.peek().span.clone()));
                }
                let token = self.consume(TokenKind::Identifier)?;
                params.push((token.lexeme.clone(), token.span.clone()));
                if !self.match_(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RtParen)?;

        self.consume(TokenKind::LtBrace)?;
        let body = self.block()?;

        Ok(StmtFun { name, params, body })
    }

    fn var(&mut self, start: usize) -> Result<StmtS> {
        let name = self.consume(TokenKind::Identifier)?.lexeme.clone();
        let value = if self.match_(TokenKind::Equal) { Some(self.expression()?) } else { None };
        self.consume(TokenKind::Semicolon)?;
        Ok((Stmt::Var(StmtVar { name, value }), self.span_from(start)))
    }

    fn statement(&mut self) -> Result<StmtS> {
        let start = self.peek().span.start;
        if self.match_(TokenKind::For) {
            self.for_(start)
        } else if self.match_(TokenKind::If) {
            self.consume(TokenKind::LtParen)?;
            let cond = self.expression()?;
            self.consume(TokenKind::RtParen)?;
            let then = self.statement()?;
            let else_ = if self.match_(TokenKind::Else) { Some(self.statement()?) } else { None };
            Ok((Stmt::If(Box::new(StmtIf { cond, then, else_ })), self.span_from(start)))
        } else if self.match_(TokenKind::Print) {
            let value = self.expression()?;
            self.consume(TokenKind::Semicolon)?;
            Ok((Stmt::Print(StmtPrint { value }), self.span_from(start)))
        } else if self.match_(TokenKind::Return) {
            let value =
                if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
            self.consume(TokenKind::Semicolon)?;
            Ok((Stmt::Return(StmtReturn { value }), self.span_from(start)))
        } else if self.match_(TokenKind::While) {
            self.consume(TokenKind::LtParen)?;
            let cond = self.expression()?;
            self.consume(TokenKind::RtParen)?;
            let body = self.statement()?;
            Ok((Stmt::While(Box::new(StmtWhile { cond, body })), self.span_from(start)))
        } else if self.match_(TokenKind::LtBrace) {
            let block = self.block()?;
            Ok((Stmt::Block(block), self.span_from(start)))
        } else {
            let value = self.expression()?;
            self.consume(TokenKind::Semicolon)?;
            Ok((Stmt::Expr(StmtExpr { value }), self.span_from(start)))
        }
    }

    /// `for` has no node of its own: it becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_(&mut self, start: usize) -> Result<StmtS> {
        self.consume(TokenKind::LtParen)?;

        let init_start = self.peek().span.start;
        let init = if self.match_(TokenKind::Semicolon) {
            None
        } else if self.match_(TokenKind::Var) {
            Some(self.var(init_start)?)
        } else {
            let value = self.expression()?;
            self.consume(TokenKind::Semicolon)?;
            Some((Stmt::Expr(StmtExpr { value }), self.span_from(init_start)))
        };

        let cond = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(TokenKind::Semicolon)?;

        let incr = if self.check(TokenKind::RtParen) { None } else { Some(self.expression()?) };
        self.consume(TokenKind::RtParen)?;

        let mut body = self.statement()?;
        let span = self.span_from(start);

        if let Some(incr) = incr {
            let incr_span = incr.span.clone();
            let stmts = vec![body, (Stmt::Expr(StmtExpr { value: incr }), incr_span)];
            body = (Stmt::Block(StmtBlock { stmts }), span.clone());
        }

        let cond = match cond {
            Some(cond) => cond,
            None => self.expr(Expr::Literal(ExprLiteral::Bool(true)), span.clone()),
        };
        body = (Stmt::While(Box::new(StmtWhile { cond, body })), span.clone());

        if let Some(init) = init {
            body = (Stmt::Block(StmtBlock { stmts: vec![init, body] }), span);
        }

        Ok(body)
    }

    /// Parses the statements of a block whose `{` has been consumed.
    fn block(&mut self) -> Result<StmtBlock> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RtBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::RtBrace)?;
        Ok(StmtBlock { stmts })
    }

    fn expression(&mut self) -> Result<ExprS> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<ExprS> {
        let target = self.or()?;
        if !self.match_(TokenKind::Equal) {
            return Ok(target);
        }

        let value = self.assignment()?;
        let span = target.span.start..value.span.end;
        match target.expr {
            Expr::Var(var) => {
                Ok(self.expr(Expr::Assign(Box::new(ExprAssign { name: var.name, value })), span))
            }
            Expr::Get(get) => {
                let ExprGet { object, name } = *get;
                Ok(self.expr(Expr::Set(Box::new(ExprSet { object, name, value })), span))
            }
            expr => {
                // Reported, but the parser is not confused: keep going.
                self.errors.push((SyntaxError::InvalidAssignTarget.into(), target.span.clone()));
                Ok(ExprS { id: target.id, expr, span: target.span })
            }
        }
    }

    fn or(&mut self) -> Result<ExprS> {
        let mut lt = self.and()?;
        while self.match_(TokenKind::Or) {
            let rt = self.and()?;
            let span = lt.span.start..rt.span.end;
            lt = self.expr(Expr::Logical(Box::new(ExprLogical { lt, op: OpLogical::Or, rt })), span);
        }
        Ok(lt)
    }

    fn and(&mut self) -> Result<ExprS> {
        let mut lt = self.equality()?;
        while self.match_(TokenKind::And) {
            let rt = self.equality()?;
            let span = lt.span.start..rt.span.end;
            lt = self.expr(Expr::Logical(Box::new(ExprLogical { lt, op: OpLogical::And, rt })), span);
        }
        Ok(lt)
    }

    fn equality(&mut self) -> Result<ExprS> {
        self.infix(
            Self::comparison,
            &[(TokenKind::EqualEqual, OpInfix::Equal), (TokenKind::BangEqual, OpInfix::NotEqual)],
        )
    }

    fn comparison(&mut self) -> Result<ExprS> {
        self.infix(
            Self::term,
            &[
                (TokenKind::Greater, OpInfix::Greater),
                (TokenKind::GreaterEqual, OpInfix::GreaterEqual),
                (TokenKind::Less, OpInfix::Less),
                (TokenKind::LessEqual, OpInfix::LessEqual),
            ],
        )
    }

    fn term(&mut self) -> Result<ExprS> {
        self.infix(
            Self::factor,
            &[(TokenKind::Plus, OpInfix::Add), (TokenKind::Minus, OpInfix::Subtract)],
        )
    }

    fn factor(&mut self) -> Result<ExprS> {
        self.infix(
            Self::unary,
            &[(TokenKind::Asterisk, OpInfix::Multiply), (TokenKind::Slash, OpInfix::Divide)],
        )
    }

    /// One left-associative precedence level.
    fn infix(
        &mut self,
        operand: fn(&mut Self) -> Result<ExprS>,
        ops: &[(TokenKind, OpInfix)],
    ) -> Result<ExprS> {
        let mut lt = operand(self)?;
        while let Some(&(_, op)) = ops.iter().find(|(kind, _)| self.check(*kind)) {
            self.advance();
            let rt = operand(self)?;
            let span = lt.span.start..rt.span.end;
            lt = self.expr(Expr::Infix(Box::new(ExprInfix { lt, op, rt })), span);
        }
        Ok(lt)
    }

    fn unary(&mut self) -> Result<ExprS> {
        let op = match self.peek().kind {
            TokenKind::Bang => OpPrefix::Not,
            TokenKind::Minus => OpPrefix::Negate,
            _ => return self.call(),
        };
        let start = self.advance().span.start;
        let rt = self.unary()?;
        let span = start..rt.span.end;
        Ok(self.expr(Expr::Prefix(Box::new(ExprPrefix { op, rt })), span))
    }

    fn call(&mut self) -> Result<ExprS> {
        let mut expr = self.primary()?;
        loop {
            if self.match_(TokenKind::LtParen) {
                let args = self.args()?;
                let span = expr.span.start..self.previous().span.end;
                expr = self.expr(Expr::Call(Box::new(ExprCall { callee: expr, args })), span);
            } else if self.match_(TokenKind::Dot) {
                let name = self.consume(TokenKind::Identifier)?.lexeme.clone();
                let span = expr.span.start..self.previous().span.end;
                expr = self.expr(Expr::Get(Box::new(ExprGet { object: expr, name })), span);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Parses call arguments after the opening parenthesis, up to and
    /// including the closing one.
    fn args(&mut self) -> Result<Vec<ExprS>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RtParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    self.errors.push((OverflowError::TooManyArgs.into(), self.peek().span.clone()));
                }
                args.push(self.expression()?);
                if !self.match_(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RtParen)?;
        Ok(args)
    }

    fn primary(&mut self) -> Result<ExprS> {
        let token = self.peek().clone();
        let literal = match (&token.kind, token.literal) {
            (TokenKind::Nil, _) => Some(ExprLiteral::Nil),
            (_, Some(Literal::Bool(bool))) => Some(ExprLiteral::Bool(bool)),
            (_, Some(Literal::Number(number))) => Some(ExprLiteral::Number(number)),
            (_, Some(Literal::String(string))) => Some(ExprLiteral::String(string)),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(self.expr(Expr::Literal(literal), token.span));
        }

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(self.expr(Expr::Var(ExprVar { name: token.lexeme }), token.span))
            }
            TokenKind::This => {
                self.advance();
                Ok(self.expr(Expr::This, token.span))
            }
            TokenKind::Super => {
                self.advance();
                self.consume(TokenKind::Dot)?;
                let name = self.consume(TokenKind::Identifier)?.lexeme.clone();
                let span = self.span_from(token.span.start);
                Ok(self.expr(Expr::Super(ExprSuper { name }), span))
            }
            TokenKind::LtParen => {
                self.advance();
                let inner = self.expression()?;
                self.consume(TokenKind::RtParen)?;
                let span = self.span_from(token.span.start);
                Ok(self.expr(Expr::Grouping(Box::new(inner)), span))
            }
            _ => Err(self.unexpected(&["expression"])),
        }
    }

    /// Skips tokens until the start of what is likely the next statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon || self.peek().kind.starts_stmt() {
                return;
            }
            self.advance();
        }
    }

    fn expr(&mut self, expr: Expr, span: Span) -> ExprS {
        ExprS { id: self.ids.next(), expr, span }
    }

    fn span_from(&self, start: usize) -> Span {
        start..self.previous().span.end.max(start)
    }

    fn consume(&mut self, kind: TokenKind) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[&kind.to_string()]))
        }
    }

    fn unexpected(&self, expected: &[&str]) -> ErrorS {
        let token = self.peek();
        let expected = expected.iter().map(|s| s.to_string()).collect();
        let error = match token.kind {
            TokenKind::Eof => SyntaxError::UnrecognizedEof { expected },
            _ => SyntaxError::UnrecognizedToken { token: token.lexeme.clone(), expected },
        };
        (error.into(), token.span.clone())
    }

    fn match_(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}

#[cfg(test)]
mod tests {
    use lox_common::error::Error;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> (Program, Vec<ErrorS>) {
        let (tokens, errors) = Lexer::tokenize(source);
        assert_eq!(errors, vec![]);
        Parser::new(tokens, &mut ExprIds::default()).parse()
    }

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse(source);
        assert_eq!(errors, vec![]);
        program
    }

    fn expr_of(program: &Program) -> &ExprS {
        match &program.stmts[..] {
            [(Stmt::Expr(StmtExpr { value }), _)] => value,
            stmts => panic!("expected a single expression statement, got {stmts:?}"),
        }
    }

    #[test]
    fn precedence_factor_binds_tighter_than_term() {
        let program = parse_ok("1 + 2 * 3;");
        let Expr::Infix(infix) = &expr_of(&program).expr else { panic!("expected infix") };
        assert_eq!(infix.op, OpInfix::Add);
        assert_eq!(infix.lt.expr, Expr::Literal(ExprLiteral::Number(1.0)));
        let Expr::Infix(rt) = &infix.rt.expr else { panic!("expected infix") };
        assert_eq!(rt.op, OpInfix::Multiply);
    }

    #[test]
    fn infix_is_left_associative() {
        let program = parse_ok("1 - 2 - 3;");
        let Expr::Infix(infix) = &expr_of(&program).expr else { panic!("expected infix") };
        assert_eq!(infix.rt.expr, Expr::Literal(ExprLiteral::Number(3.0)));
        assert!(matches!(infix.lt.expr, Expr::Infix(_)));
    }

    #[test]
    fn or_binds_looser_than_and() {
        let program = parse_ok("a or b and c;");
        let Expr::Logical(logical) = &expr_of(&program).expr else { panic!("expected logical") };
        assert_eq!(logical.op, OpLogical::Or);
        assert!(matches!(&logical.rt.expr, Expr::Logical(rt) if rt.op == OpLogical::And));
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse_ok("a = b = 1;");
        let Expr::Assign(assign) = &expr_of(&program).expr else { panic!("expected assign") };
        assert_eq!(assign.name, "a");
        assert!(matches!(&assign.value.expr, Expr::Assign(inner) if inner.name == "b"));
    }

    #[test]
    fn property_assignment_becomes_set() {
        let program = parse_ok("a.b.c = 1;");
        let Expr::Set(set) = &expr_of(&program).expr else { panic!("expected set") };
        assert_eq!(set.name, "c");
        assert!(matches!(&set.object.expr, Expr::Get(get) if get.name == "b"));
    }

    #[test]
    fn invalid_assignment_target_is_not_fatal() {
        let (program, errors) = parse("1 + 2 = 3; print 4;");
        assert_eq!(errors, vec![(SyntaxError::InvalidAssignTarget.into(), 0..5)]);
        assert_eq!(program.stmts.len(), 2);
    }

    #[test]
    fn expression_ids_are_unique() {
        let program = parse_ok("a; a;");
        let ids = program
            .stmts
            .iter()
            .map(|stmt| match stmt {
                (Stmt::Expr(StmtExpr { value }), _) => value.id,
                _ => unreachable!(),
            })
            .collect::<Vec<_>>();
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn ids_continue_across_parses() {
        let mut ids = ExprIds::default();
        let (tokens, _) = Lexer::tokenize("a;");
        let (first, _) = Parser::new(tokens.clone(), &mut ids).parse();
        let (second, _) = Parser::new(tokens, &mut ids).parse();
        let id = |program: &Program| match &program.stmts[0] {
            (Stmt::Expr(StmtExpr { value }), _) => value.id,
            _ => unreachable!(),
        };
        assert_ne!(id(&first), id(&second));
    }

    #[test]
    fn for_desugars_to_while() {
        let program = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");
        let [(Stmt::Block(outer), _)] = &program.stmts[..] else { panic!("expected block") };
        let [(Stmt::Var(var), _), (Stmt::While(while_), _)] = &outer.stmts[..] else {
            panic!("expected initializer and loop, got {:?}", outer.stmts)
        };
        assert_eq!(var.name, "i");
        let (Stmt::Block(body), _) = &while_.body else { panic!("expected loop body block") };
        assert!(matches!(body.stmts[..], [(Stmt::Print(_), _), (Stmt::Expr(_), _)]));
    }

    #[test]
    fn for_without_clauses_loops_forever() {
        let program = parse_ok("for (;;) {}");
        let [(Stmt::While(while_), _)] = &program.stmts[..] else { panic!("expected while") };
        assert_eq!(while_.cond.expr, Expr::Literal(ExprLiteral::Bool(true)));
    }

    #[test]
    fn class_with_superclass_and_methods() {
        let program = parse_ok("class B < A { init(x) { this.x = x; } get() { return super.get(); } }");
        let [(Stmt::Class(class), _)] = &program.stmts[..] else { panic!("expected class") };
        assert_eq!(class.name, "B");
        assert!(matches!(&class.super_, Some(ExprS { expr: Expr::Var(var), .. }) if var.name == "A"));
        let names = class.methods.iter().map(|(fun, _)| fun.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["init", "get"]);
        assert_eq!(class.methods[0].0.params.len(), 1);
    }

    #[test]
    fn recovers_from_independent_errors() {
        let (program, errors) = parse("print 1 +;\nvar = 2;\nprint 3;");
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert_eq!(
            errors[0].0,
            Error::SyntaxError(SyntaxError::UnrecognizedToken {
                token: ";".to_string(),
                expected: vec!["expression".to_string()],
            })
        );
        assert_eq!(
            errors[1].0,
            Error::SyntaxError(SyntaxError::UnrecognizedToken {
                token: "=".to_string(),
                expected: vec!["identifier".to_string()],
            })
        );
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn recovers_inside_blocks() {
        let (program, errors) = parse("{ var a = ; print 1; }");
        assert_eq!(errors.len(), 1);
        let [(Stmt::Block(block), _)] = &program.stmts[..] else { panic!("expected block") };
        assert_eq!(block.stmts.len(), 1);
    }

    #[test]
    fn missing_brace_is_unexpected_eof() {
        let (_, errors) = parse("fun f() { print 1;");
        assert_eq!(
            errors,
            vec![(
                SyntaxError::UnrecognizedEof { expected: vec![r#""}""#.to_string()] }.into(),
                18..18
            )]
        );
    }

    #[test]
    fn too_many_arguments_is_reported_once_parsing_continues() {
        let args = vec!["1"; 256].join(", ");
        let (program, errors) = parse(&format!("f({args});"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, Error::OverflowError(OverflowError::TooManyArgs));
        assert_eq!(program.stmts.len(), 1);
    }
}
