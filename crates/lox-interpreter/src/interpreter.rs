use std::io::Write;
use std::ops::ControlFlow;

use lox_common::error::{
    AttributeError, ErrorS, IoError, NameError, OverflowError, Result, TypeError,
};
use lox_syntax::ast::{
    Expr, ExprId, ExprIds, ExprLiteral, ExprS, OpInfix, OpLogical, OpPrefix, Program, Stmt, StmtS,
};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::env::Env;
use crate::object::{Callable, Class, Function, Native, Object};
use crate::resolver::{Locals, Resolver};

/// Maximum depth of nested calls before a program is stopped with a
/// stack overflow error.
pub const MAX_DEPTH: usize = 256;

/// A tree-walking interpreter session.
///
/// Globals, resolved scope distances and expression ids persist across calls
/// to [`Interpreter::run`], so a REPL can feed it one line at a time.
#[derive(Debug)]
pub struct Interpreter<W> {
    globals: Env,
    locals: Locals,
    ids: ExprIds,
    depth: usize,
    max_depth: usize,
    stdout: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(stdout: W) -> Self {
        let globals = Env::default();
        globals.define(Native::Clock.name(), Object::Native(Native::Clock));
        Self {
            globals,
            locals: FxHashMap::default(),
            ids: ExprIds::default(),
            depth: 0,
            max_depth: MAX_DEPTH,
            stdout,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Scans, parses, resolves and interprets `source`. Each stage only runs
    /// if the previous one reported no errors.
    pub fn run(&mut self, source: &str) -> Result<(), Vec<ErrorS>> {
        let program = self.parse(source)?;
        self.resolve(&program)?;
        self.interpret(&program).map_err(|e| vec![e])
    }

    pub fn parse(&mut self, source: &str) -> Result<Program, Vec<ErrorS>> {
        lox_syntax::parse(source, &mut self.ids)
    }

    pub fn resolve(&mut self, program: &Program) -> Result<(), Vec<ErrorS>> {
        let errors = Resolver::new(&mut self.locals).resolve(program);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Runs the top-level statements of a resolved program, stopping at the
    /// first runtime error.
    pub fn interpret(&mut self, program: &Program) -> Result<()> {
        self.depth = 0;
        let globals = self.globals.clone();
        for stmt_s in &program.stmts {
            // The resolver rejects `return` outside a function.
            let flow = self.run_stmt(&globals, stmt_s)?;
            debug_assert!(matches!(flow, ControlFlow::Continue(())), "top-level return");
        }
        Ok(())
    }

    /// Runs statements in order. A `return` anywhere inside stops execution
    /// and comes back as [`ControlFlow::Break`] carrying the returned value.
    pub(crate) fn run_stmts(&mut self, env: &Env, stmts: &[StmtS]) -> Result<ControlFlow<Object>> {
        for stmt_s in stmts {
            if let ControlFlow::Break(object) = self.run_stmt(env, stmt_s)? {
                return Ok(ControlFlow::Break(object));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn run_stmt(&mut self, env: &Env, stmt_s: &StmtS) -> Result<ControlFlow<Object>> {
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Block(block) => {
                let env = Env::with_parent(env);
                self.run_stmts(&env, &block.stmts)
            }
            Stmt::Class(class) => {
                let super_ = match &class.super_ {
                    Some(super_) => match &self.run_expr(env, super_)? {
                        Object::Class(super_) => Some(super_.clone()),
                        object => {
                            return Err((
                                TypeError::SuperclassInvalidType { type_: object.type_() }.into(),
                                super_.span.clone(),
                            ));
                        }
                    },
                    None => None,
                };

                // Methods may refer to the class by name before it exists.
                env.define(&class.name, Object::Nil);

                let methods_env = match &super_ {
                    Some(super_) => {
                        let env = Env::with_parent(env);
                        env.define("super", Object::Class(super_.clone()));
                        env
                    }
                    None => env.clone(),
                };
                let methods = class
                    .methods
                    .iter()
                    .map(|(method, _)| {
                        let is_init = method.name == "init";
                        (method.name.clone(), Function::new(method, &methods_env, is_init))
                    })
                    .collect();

                trace!(name = %class.name, methods = class.methods.len(), "defined class");
                let class_obj = Class::new(&class.name, super_, methods);
                env.assign(&class.name, Object::Class(class_obj));
                Ok(ControlFlow::Continue(()))
            }
            Stmt::Expr(expr) => {
                self.run_expr(env, &expr.value)?;
                Ok(ControlFlow::Continue(()))
            }
            Stmt::Fun(fun) => {
                env.define(&fun.name, Object::Function(Function::new(fun, env, false)));
                Ok(ControlFlow::Continue(()))
            }
            Stmt::If(if_) => {
                if self.run_expr(env, &if_.cond)?.bool() {
                    self.run_stmt(env, &if_.then)
                } else if let Some(else_) = &if_.else_ {
                    self.run_stmt(env, else_)
                } else {
                    Ok(ControlFlow::Continue(()))
                }
            }
            Stmt::Print(print) => {
                let value = self.run_expr(env, &print.value)?;
                writeln!(self.stdout, "{value}").map_err(|_| -> ErrorS {
                    (IoError::WriteError { file: "stdout".to_string() }.into(), span.clone())
                })?;
                Ok(ControlFlow::Continue(()))
            }
            Stmt::Return(return_) => {
                let object = match &return_.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Object::Nil,
                };
                Ok(ControlFlow::Break(object))
            }
            Stmt::Var(var) => {
                let value = match &var.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Object::Nil,
                };
                env.define(&var.name, value);
                Ok(ControlFlow::Continue(()))
            }
            Stmt::While(while_) => {
                while self.run_expr(env, &while_.cond)?.bool() {
                    if let ControlFlow::Break(object) = self.run_stmt(env, &while_.body)? {
                        return Ok(ControlFlow::Break(object));
                    }
                }
                Ok(ControlFlow::Continue(()))
            }
        }
    }

    fn run_expr(&mut self, env: &Env, expr_s: &ExprS) -> Result<Object> {
        let span = &expr_s.span;
        match &expr_s.expr {
            Expr::Assign(assign) => {
                let value = self.run_expr(env, &assign.value)?;
                let assigned = match self.locals.get(&expr_s.id) {
                    Some(&depth) => env.assign_at(&assign.name, value.clone(), depth),
                    None => self.globals.assign(&assign.name, value.clone()),
                };
                if !assigned {
                    return Err((
                        NameError::NotDefined { name: assign.name.clone() }.into(),
                        span.clone(),
                    ));
                }
                Ok(value)
            }
            Expr::Call(call) => {
                let callee = self.run_expr(env, &call.callee)?;
                let args =
                    call.args.iter().map(|arg| self.run_expr(env, arg)).collect::<Result<Vec<_>>>()?;

                if self.depth >= self.max_depth {
                    return Err((OverflowError::StackOverflow.into(), span.clone()));
                }
                self.depth += 1;
                trace!(%callee, depth = self.depth, "call");
                let result = callee.call(self, args, span);
                self.depth -= 1;
                result
            }
            Expr::Get(get) => {
                let object = self.run_expr(env, &get.object)?;
                object.get(&get.name, span)
            }
            Expr::Grouping(inner) => self.run_expr(env, inner),
            Expr::Infix(infix) => {
                let lt = self.run_expr(env, &infix.lt)?;
                let rt = self.run_expr(env, &infix.rt)?;
                match (infix.op, &lt, &rt) {
                    (OpInfix::Add, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a + b)),
                    (OpInfix::Add, Object::String(a), Object::String(b)) => {
                        Ok(Object::String(format!("{a}{b}")))
                    }
                    (OpInfix::Subtract, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a - b))
                    }
                    (OpInfix::Multiply, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a * b))
                    }
                    (OpInfix::Divide, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a / b))
                    }
                    (OpInfix::Less, Object::Number(a), Object::Number(b)) => Ok(Object::Bool(a < b)),
                    (OpInfix::LessEqual, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a <= b))
                    }
                    (OpInfix::Greater, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a > b))
                    }
                    (OpInfix::GreaterEqual, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a >= b))
                    }
                    (OpInfix::Equal, a, b) => Ok(Object::Bool(a == b)),
                    (OpInfix::NotEqual, a, b) => Ok(Object::Bool(a != b)),
                    (op, a, b) => Err((
                        TypeError::UnsupportedOperandInfix {
                            op: op.to_string(),
                            lt_type: a.type_(),
                            rt_type: b.type_(),
                        }
                        .into(),
                        span.clone(),
                    )),
                }
            }
            Expr::Literal(literal) => Ok(match literal {
                ExprLiteral::Nil => Object::Nil,
                ExprLiteral::Bool(bool) => Object::Bool(*bool),
                ExprLiteral::Number(number) => Object::Number(*number),
                ExprLiteral::String(string) => Object::String(string.clone()),
            }),
            Expr::Logical(logical) => {
                let lt = self.run_expr(env, &logical.lt)?;
                match (logical.op, lt.bool()) {
                    (OpLogical::And, false) | (OpLogical::Or, true) => Ok(lt),
                    _ => self.run_expr(env, &logical.rt),
                }
            }
            Expr::Prefix(prefix) => {
                let rt = self.run_expr(env, &prefix.rt)?;
                match (prefix.op, &rt) {
                    (OpPrefix::Negate, Object::Number(number)) => Ok(Object::Number(-number)),
                    (OpPrefix::Not, rt) => Ok(Object::Bool(!rt.bool())),
                    (op, rt) => Err((
                        TypeError::UnsupportedOperandPrefix { op: op.to_string(), rt_type: rt.type_() }
                            .into(),
                        span.clone(),
                    )),
                }
            }
            Expr::Set(set) => {
                let object = self.run_expr(env, &set.object)?;
                if !matches!(object, Object::Instance(_)) {
                    return Err((TypeError::NotAnInstance { type_: object.type_() }.into(), span.clone()));
                }
                let value = self.run_expr(env, &set.value)?;
                object.set(&set.name, value.clone(), span)?;
                Ok(value)
            }
            Expr::Super(super_) => {
                let depth = self.local_depth(expr_s.id, "super");
                let class = match &env.get_at("super", depth) {
                    Some(Object::Class(class)) => class.clone(),
                    _ => unreachable!(r#""super" was resolved but is not a class"#),
                };
                let this = env
                    .get_at("this", depth - 1)
                    .unwrap_or_else(|| unreachable!(r#""this" not bound inside "super" scope"#));
                match class.find_method(&super_.name) {
                    Some(method) => Ok(Object::Function(method.bind(this))),
                    None => Err((
                        AttributeError::NoSuchAttribute {
                            type_: class.name.clone(),
                            name: super_.name.clone(),
                        }
                        .into(),
                        span.clone(),
                    )),
                }
            }
            Expr::This => {
                let depth = self.local_depth(expr_s.id, "this");
                Ok(env
                    .get_at("this", depth)
                    .unwrap_or_else(|| unreachable!(r#""this" was resolved but is not bound"#)))
            }
            Expr::Var(var) => {
                let object = match self.locals.get(&expr_s.id) {
                    Some(&depth) => env.get_at(&var.name, depth),
                    None => self.globals.get(&var.name),
                };
                object.ok_or_else(|| {
                    (NameError::NotDefined { name: var.name.clone() }.into(), span.clone())
                })
            }
        }
    }

    fn local_depth(&self, id: ExprId, name: &str) -> usize {
        self.locals
            .get(&id)
            .copied()
            .unwrap_or_else(|| unreachable!("{name:?} was not resolved to a local scope"))
    }
}
