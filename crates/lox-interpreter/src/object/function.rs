use std::fmt::{self, Display, Formatter};
use std::io::Write;
use std::ops::{ControlFlow, Deref};
use std::rc::Rc;

use gc::{Finalize, Gc, Trace};
use lox_common::error::Result;
use lox_common::types::Span;
use lox_syntax::ast::StmtFun;

use crate::env::Env;
use crate::object::{Callable, Object};
use crate::Interpreter;

/// A user-defined function or method together with the scope it closes over.
#[derive(Clone, Debug, Finalize, Trace)]
pub struct Function(Gc<FunctionImpl>);

impl Function {
    pub fn new(decl: &Rc<StmtFun>, env: &Env, is_init: bool) -> Self {
        Function(Gc::new(FunctionImpl { decl: Rc::clone(decl), env: env.clone(), is_init }))
    }

    /// Returns a copy of this method whose scope has `this` bound to the
    /// given instance. The original is left untouched.
    pub fn bind(&self, this: Object) -> Function {
        let env = Env::with_parent(&self.env);
        env.define("this", this);
        Function::new(&self.decl, &env, self.is_init)
    }

    fn this(&self) -> Object {
        self.env
            .get("this")
            .unwrap_or_else(|| unreachable!(r#""this" not present inside "init" method"#))
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn name(&self) -> &str {
        &self.decl.name
    }

    fn call_unchecked<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        _span: &Span,
    ) -> Result<Object> {
        let env = Env::with_parent(&self.env);
        for ((param, _), arg) in self.decl.params.iter().zip(args) {
            env.define(param, arg);
        }

        let flow = interpreter.run_stmts(&env, &self.decl.body.stmts)?;
        if self.is_init {
            return Ok(self.this());
        }
        Ok(match flow {
            ControlFlow::Break(object) => object,
            ControlFlow::Continue(()) => Object::Nil,
        })
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

impl Deref for Function {
    type Target = FunctionImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Eq for Function {}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Finalize, Trace)]
pub struct FunctionImpl {
    #[unsafe_ignore_trace]
    pub decl: Rc<StmtFun>,
    pub env: Env,
    pub is_init: bool,
}
