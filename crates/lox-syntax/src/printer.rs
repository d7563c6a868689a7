//! Renders a [`Program`] as parenthesized prefix notation, one statement per
//! line. Used by `lox run --ast` and by parser tests.

use std::fmt::Write;

use crate::ast::{Expr, ExprLiteral, ExprS, Program, Stmt, StmtFun, StmtS};

pub fn print(program: &Program) -> String {
    let mut out = String::new();
    for stmt in &program.stmts {
        print_stmt(&mut out, stmt);
        out.push('\n');
    }
    out
}

fn print_stmt(out: &mut String, (stmt, _): &StmtS) {
    match stmt {
        Stmt::Block(block) => {
            out.push_str("(block");
            for stmt in &block.stmts {
                out.push(' ');
                print_stmt(out, stmt);
            }
            out.push(')');
        }
        Stmt::Class(class) => {
            let _ = write!(out, "(class {}", class.name);
            if let Some(super_) = &class.super_ {
                out.push_str(" < ");
                write_expr(out, super_);
            }
            for (method, _) in &class.methods {
                out.push(' ');
                print_fun(out, method);
            }
            out.push(')');
        }
        Stmt::Expr(expr) => {
            out.push_str("(; ");
            write_expr(out, &expr.value);
            out.push(')');
        }
        Stmt::Fun(fun) => print_fun(out, fun),
        Stmt::If(if_) => {
            out.push_str("(if ");
            write_expr(out, &if_.cond);
            out.push(' ');
            print_stmt(out, &if_.then);
            if let Some(else_) = &if_.else_ {
                out.push(' ');
                print_stmt(out, else_);
            }
            out.push(')');
        }
        Stmt::Print(print) => {
            out.push_str("(print ");
            write_expr(out, &print.value);
            out.push(')');
        }
        Stmt::Return(return_) => match &return_.value {
            Some(value) => {
                out.push_str("(return ");
                write_expr(out, value);
                out.push(')');
            }
            None => out.push_str("(return)"),
        },
        Stmt::Var(var) => match &var.value {
            Some(value) => {
                let _ = write!(out, "(var {} ", var.name);
                write_expr(out, value);
                out.push(')');
            }
            None => {
                let _ = write!(out, "(var {})", var.name);
            }
        },
        Stmt::While(while_) => {
            out.push_str("(while ");
            write_expr(out, &while_.cond);
            out.push(' ');
            print_stmt(out, &while_.body);
            out.push(')');
        }
    }
}

fn print_fun(out: &mut String, fun: &StmtFun) {
    let params = fun.params.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
    let _ = write!(out, "(fun {} ({})", fun.name, params.join(" "));
    for stmt in &fun.body.stmts {
        out.push(' ');
        print_stmt(out, stmt);
    }
    out.push(')');
}

fn write_expr(out: &mut String, expr: &ExprS) {
    match &expr.expr {
        Expr::Assign(assign) => {
            let _ = write!(out, "(= {} ", assign.name);
            write_expr(out, &assign.value);
            out.push(')');
        }
        Expr::Call(call) => {
            out.push_str("(call ");
            write_expr(out, &call.callee);
            for arg in &call.args {
                out.push(' ');
                write_expr(out, arg);
            }
            out.push(')');
        }
        Expr::Get(get) => {
            out.push_str("(. ");
            write_expr(out, &get.object);
            let _ = write!(out, " {})", get.name);
        }
        Expr::Grouping(inner) => {
            out.push_str("(group ");
            write_expr(out, inner);
            out.push(')');
        }
        Expr::Infix(infix) => {
            let _ = write!(out, "({} ", infix.op);
            write_expr(out, &infix.lt);
            out.push(' ');
            write_expr(out, &infix.rt);
            out.push(')');
        }
        Expr::Literal(literal) => {
            let _ = match literal {
                ExprLiteral::Nil => write!(out, "nil"),
                ExprLiteral::Bool(bool) => write!(out, "{bool}"),
                ExprLiteral::Number(number) => write!(out, "{number}"),
                ExprLiteral::String(string) => write!(out, "{string:?}"),
            };
        }
        Expr::Logical(logical) => {
            let _ = write!(out, "({} ", logical.op);
            write_expr(out, &logical.lt);
            out.push(' ');
            write_expr(out, &logical.rt);
            out.push(')');
        }
        Expr::Prefix(prefix) => {
            let _ = write!(out, "({} ", prefix.op);
            write_expr(out, &prefix.rt);
            out.push(')');
        }
        Expr::Set(set) => {
            out.push_str("(=. ");
            write_expr(out, &set.object);
            let _ = write!(out, " {} ", set.name);
            write_expr(out, &set.value);
            out.push(')');
        }
        Expr::Super(super_) => {
            let _ = write!(out, "(super {})", super_.name);
        }
        Expr::This => out.push_str("this"),
        Expr::Var(var) => out.push_str(&var.name),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::ExprIds;

    fn print_source(source: &str) -> String {
        let program = crate::parse(source, &mut ExprIds::default()).expect("source should parse");
        print(&program)
    }

    #[test]
    fn print_expressions() {
        assert_eq!(print_source("-(1 + 2) * 3 == !nil;"), "(; (== (* (- (group (+ 1 2))) 3) (! nil)))\n");
        assert_eq!(print_source(r#"a.b = "s" or c;"#), "(; (=. a b (or \"s\" c)))\n");
    }

    #[test]
    fn print_desugared_for() {
        assert_eq!(
            print_source("for (var i = 0; i < 2; i = i + 1) print i;"),
            "(block (var i 0) (while (< i 2) (block (print i) (; (= i (+ i 1))))))\n"
        );
    }

    #[test]
    fn print_class() {
        assert_eq!(
            print_source("class A < B { f(x) { return super.f(x); } }"),
            "(class A < B (fun f (x) (return (call (super f) x))))\n"
        );
    }
}
