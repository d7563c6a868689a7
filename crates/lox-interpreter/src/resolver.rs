use std::mem;

use lox_common::error::{ErrorS, NameError, SyntaxError};
use lox_common::types::Span;
use lox_syntax::ast::{Expr, ExprId, ExprS, Program, Stmt, StmtFun, StmtS};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Scope distance of every locally-resolved variable, `this` and `super`
/// expression. Expressions missing from the table are globals.
pub type Locals = FxHashMap<ExprId, usize>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Static pass run between parsing and interpretation. Computes scope
/// distances into `locals` and reports misuse of `return`, `this` and
/// `super`, duplicate locals and self-referencing initializers.
pub struct Resolver<'a> {
    locals: &'a mut Locals,
    /// Local scopes only; the global scope is never on the stack. `false`
    /// marks a name that is declared but whose initializer is still running.
    scopes: Vec<FxHashMap<String, bool>>,
    function_type: FunctionType,
    class_type: ClassType,
    errors: Vec<ErrorS>,
}

impl<'a> Resolver<'a> {
    pub fn new(locals: &'a mut Locals) -> Self {
        Self {
            locals,
            scopes: Vec::new(),
            function_type: FunctionType::None,
            class_type: ClassType::None,
            errors: Vec::new(),
        }
    }

    pub fn resolve(mut self, program: &Program) -> Vec<ErrorS> {
        for stmt_s in &program.stmts {
            self.resolve_stmt(stmt_s);
        }
        self.errors
    }

    fn resolve_stmt(&mut self, (stmt, span): &StmtS) {
        match stmt {
            Stmt::Block(block) => {
                self.begin_scope();
                for stmt_s in &block.stmts {
                    self.resolve_stmt(stmt_s);
                }
                self.end_scope();
            }
            Stmt::Class(class) => {
                let class_type = mem::replace(&mut self.class_type, ClassType::Class);
                self.declare_define(&class.name, span);

                if let Some(super_) = &class.super_ {
                    if let Expr::Var(var) = &super_.expr {
                        if var.name == class.name {
                            self.error(
                                NameError::ClassInheritFromSelf { name: class.name.clone() },
                                &super_.span,
                            );
                        }
                    }
                    self.class_type = ClassType::Subclass;
                    self.resolve_expr(super_);
                    self.begin_scope();
                    self.define("super");
                }

                self.begin_scope();
                self.define("this");
                for (method, span) in &class.methods {
                    let type_ = if method.name == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };
                    self.resolve_function(method, type_, span);
                }
                self.end_scope();

                if class.super_.is_some() {
                    self.end_scope();
                }
                self.class_type = class_type;
            }
            Stmt::Expr(expr) => self.resolve_expr(&expr.value),
            Stmt::Fun(fun) => {
                self.declare_define(&fun.name, span);
                self.resolve_function(fun, FunctionType::Function, span);
            }
            Stmt::If(if_) => {
                self.resolve_expr(&if_.cond);
                self.resolve_stmt(&if_.then);
                if let Some(else_) = &if_.else_ {
                    self.resolve_stmt(else_);
                }
            }
            Stmt::Print(print) => self.resolve_expr(&print.value),
            Stmt::Return(return_) => {
                match self.function_type {
                    FunctionType::None => self.error(SyntaxError::ReturnOutsideFunction, span),
                    FunctionType::Initializer if return_.value.is_some() => {
                        self.error(SyntaxError::InitReturnValue, span)
                    }
                    _ => (),
                }
                if let Some(value) = &return_.value {
                    self.resolve_expr(value);
                }
            }
            Stmt::Var(var) => {
                self.declare(&var.name, span);
                if let Some(value) = &var.value {
                    self.resolve_expr(value);
                }
                self.define(&var.name);
            }
            Stmt::While(while_) => {
                self.resolve_expr(&while_.cond);
                self.resolve_stmt(&while_.body);
            }
        }
    }

    fn resolve_expr(&mut self, expr_s: &ExprS) {
        let span = &expr_s.span;
        match &expr_s.expr {
            Expr::Assign(assign) => {
                self.resolve_expr(&assign.value);
                self.resolve_local(expr_s.id, &assign.name);
            }
            Expr::Call(call) => {
                self.resolve_expr(&call.callee);
                for arg in &call.args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get(get) => self.resolve_expr(&get.object),
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Infix(infix) => {
                self.resolve_expr(&infix.lt);
                self.resolve_expr(&infix.rt);
            }
            Expr::Literal(_) => (),
            Expr::Logical(logical) => {
                self.resolve_expr(&logical.lt);
                self.resolve_expr(&logical.rt);
            }
            Expr::Prefix(prefix) => self.resolve_expr(&prefix.rt),
            Expr::Set(set) => {
                self.resolve_expr(&set.value);
                self.resolve_expr(&set.object);
            }
            Expr::Super(_) => match self.class_type {
                ClassType::None => self.error(SyntaxError::SuperOutsideClass, span),
                ClassType::Class => self.error(SyntaxError::SuperWithoutSuperclass, span),
                ClassType::Subclass => self.resolve_local(expr_s.id, "super"),
            },
            Expr::This => match self.class_type {
                ClassType::None => self.error(SyntaxError::ThisOutsideClass, span),
                _ => self.resolve_local(expr_s.id, "this"),
            },
            Expr::Var(var) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&var.name) == Some(&false) {
                        self.error(NameError::AccessInsideInitializer { name: var.name.clone() }, span);
                    }
                }
                self.resolve_local(expr_s.id, &var.name);
            }
        }
    }

    fn resolve_function(&mut self, fun: &StmtFun, type_: FunctionType, span: &Span) {
        trace!(name = %fun.name, ?type_, span = ?span, "resolving function");
        let function_type = mem::replace(&mut self.function_type, type_);
        self.begin_scope();
        for (param, span) in &fun.params {
            self.declare_define(param, span);
        }
        for stmt_s in &fun.body.stmts {
            self.resolve_stmt(stmt_s);
        }
        self.end_scope();
        self.function_type = function_type;
    }

    /// Records how many scopes out `name` lives, if it is local at all.
    fn resolve_local(&mut self, id: ExprId, name: &str) {
        if let Some(depth) = self.scopes.iter().rev().position(|scope| scope.contains_key(name)) {
            trace!(name, depth, ?id, "resolved local");
            self.locals.insert(id, depth);
        }
    }

    fn declare_define(&mut self, name: &str, span: &Span) {
        self.declare(name, span);
        self.define(name);
    }

    fn declare(&mut self, name: &str, span: &Span) {
        let Some(scope) = self.scopes.last_mut() else { return };
        if scope.insert(name.to_string(), false).is_some() {
            self.error(NameError::AlreadyDefined { name: name.to_string() }, span);
        }
    }

    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop().unwrap_or_else(|| unreachable!("attempted to pop global scope"));
    }

    fn error(&mut self, error: impl Into<lox_common::error::Error>, span: &Span) {
        let error = error.into();
        debug!(%error, ?span, "resolver error");
        self.errors.push((error, span.clone()));
    }
}

#[cfg(test)]
mod tests {
    use lox_syntax::ast::{ExprIds, StmtExpr};
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolve(source: &str) -> (Program, Locals, Vec<String>) {
        let program = lox_syntax::parse(source, &mut ExprIds::default()).expect("source should parse");
        let mut locals = Locals::default();
        let errors = Resolver::new(&mut locals).resolve(&program);
        let errors = errors.into_iter().map(|(e, _)| e.to_string()).collect();
        (program, locals, errors)
    }

    fn errors(source: &str) -> Vec<String> {
        resolve(source).2
    }

    #[test]
    fn globals_are_not_recorded() {
        let (_, locals, errors) = resolve("var a = 1; print a;");
        assert_eq!(errors, Vec::<String>::new());
        assert!(locals.is_empty());
    }

    #[test]
    fn distance_counts_enclosing_scopes() {
        let (program, locals, _) = resolve("{ var a = 1; { { a; } } }");
        let (Stmt::Block(outer), _) = &program.stmts[0] else { panic!("expected block") };
        let (Stmt::Block(middle), _) = &outer.stmts[1] else { panic!("expected block") };
        let (Stmt::Block(inner), _) = &middle.stmts[0] else { panic!("expected block") };
        let (Stmt::Expr(StmtExpr { value }), _) = &inner.stmts[0] else { panic!("expected expr") };
        assert_eq!(locals.get(&value.id), Some(&2));
    }

    #[test]
    fn identical_expressions_resolve_independently() {
        let (program, locals, _) = resolve("{ var a; a; { var a; a; } }");
        let (Stmt::Block(outer), _) = &program.stmts[0] else { panic!("expected block") };
        let (Stmt::Expr(StmtExpr { value: first }), _) = &outer.stmts[1] else { panic!() };
        let (Stmt::Block(inner), _) = &outer.stmts[2] else { panic!("expected block") };
        let (Stmt::Expr(StmtExpr { value: second }), _) = &inner.stmts[1] else { panic!() };
        assert_eq!(locals.get(&first.id), Some(&0));
        assert_eq!(locals.get(&second.id), Some(&0));
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn this_and_super_scopes() {
        let (_, locals, errors) =
            resolve("class A { f() {} } class B < A { f() { this; super.f(); } }");
        assert_eq!(errors, Vec::<String>::new());
        let mut distances = locals.values().copied().collect::<Vec<_>>();
        distances.sort_unstable();
        // `this` is one scope out from the method body, `super` two.
        assert_eq!(distances, vec![1, 2]);
    }

    #[test]
    fn redeclare_local() {
        assert_eq!(
            errors("{ var a = 1; var a = 2; }"),
            vec![r#"NameError: name "a" is already defined"#]
        );
        assert_eq!(errors("var a = 1; var a = 2;"), Vec::<String>::new());
        assert_eq!(
            errors("fun f(a, a) {}"),
            vec![r#"NameError: name "a" is already defined"#]
        );
    }

    #[test]
    fn read_in_own_initializer() {
        assert_eq!(
            errors("var a = 1; { var a = a; }"),
            vec![r#"NameError: cannot access "a" in its own initializer"#]
        );
    }

    #[test]
    fn return_rules() {
        assert_eq!(errors("return 1;"), vec![r#"SyntaxError: "return" outside function"#]);
        assert_eq!(
            errors("class A { init() { return 1; } }"),
            vec![r#"SyntaxError: "init" cannot return a value"#]
        );
        assert_eq!(errors("class A { init() { return; } }"), Vec::<String>::new());
        assert_eq!(errors("fun f() { return 1; }"), Vec::<String>::new());
    }

    #[test]
    fn this_and_super_outside_class() {
        assert_eq!(errors("print this;"), vec![r#"SyntaxError: "this" outside class"#]);
        assert_eq!(errors("fun f() { super.g(); }"), vec![r#"SyntaxError: "super" outside class"#]);
        assert_eq!(
            errors("class A { f() { super.f(); } }"),
            vec![r#"SyntaxError: "super" in class with no superclass"#]
        );
    }

    #[test]
    fn inherit_from_self() {
        assert_eq!(
            errors("class A < A {}"),
            vec![r#"NameError: class "A" cannot inherit from itself"#]
        );
    }

    #[test]
    fn keeps_going_after_errors() {
        assert_eq!(errors("return; print this;").len(), 2);
    }
}
