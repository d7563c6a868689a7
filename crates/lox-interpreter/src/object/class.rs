use std::fmt::{self, Display, Formatter};
use std::io::Write;
use std::ops::Deref;

use gc::{Finalize, Gc, Trace};
use lox_common::error::Result;
use lox_common::types::Span;
use rustc_hash::FxHashMap;

use crate::object::{Callable, Function, Instance, Object};
use crate::Interpreter;

#[derive(Clone, Debug, Finalize, Trace)]
pub struct Class(Gc<ClassImpl>);

impl Class {
    pub fn new(name: &str, super_: Option<Class>, methods: FxHashMap<String, Function>) -> Self {
        Self(Gc::new(ClassImpl { name: name.to_string(), super_, methods }))
    }

    /// Looks a method up on this class, then on each superclass in turn.
    /// The result is unbound.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        let mut class = self;
        loop {
            if let Some(method) = class.methods.get(name) {
                return Some(method.clone());
            }
            class = class.super_.as_ref()?;
        }
    }
}

impl Callable for Class {
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn call_unchecked<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        let instance = Object::Instance(Instance::new(self));
        if let Some(init) = self.find_method("init") {
            init.bind(instance.clone()).call_unchecked(interpreter, args, span)?;
        }
        Ok(instance)
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name())
    }
}

impl Deref for Class {
    type Target = ClassImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Eq for Class {}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Finalize, Trace)]
pub struct ClassImpl {
    pub name: String,
    pub super_: Option<Class>,
    pub methods: FxHashMap<String, Function>,
}
