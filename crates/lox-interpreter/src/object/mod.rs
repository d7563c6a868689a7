mod callable;
mod class;
mod function;
mod instance;
mod native;

use std::fmt::{self, Display, Formatter};
use std::io::Write;

pub use callable::Callable;
pub use class::Class;
pub use function::Function;
use gc::{Finalize, Trace};
pub use instance::Instance;
use lox_common::error::{AttributeError, Result, TypeError};
use lox_common::types::Span;
pub use native::Native;

use crate::Interpreter;

#[derive(Clone, Debug, Finalize, Trace)]
pub enum Object {
    Bool(bool),
    Class(Class),
    Function(Function),
    Instance(Instance),
    Native(Native),
    Nil,
    Number(f64),
    String(String),
}

impl Object {
    /// Truthiness: `nil` and `false` are falsy, everything else is truthy.
    pub fn bool(&self) -> bool {
        !matches!(self, Object::Nil | Object::Bool(false))
    }

    pub fn type_(&self) -> String {
        match self {
            Object::Bool(_) => "bool".to_string(),
            Object::Class(_) => "class".to_string(),
            Object::Function(_) | Object::Native(_) => "function".to_string(),
            Object::Instance(instance) => instance.class().name().to_string(),
            Object::Nil => "nil".to_string(),
            Object::Number(_) => "number".to_string(),
            Object::String(_) => "string".to_string(),
        }
    }

    /// Property access: fields shadow methods, and methods come back bound
    /// to the instance.
    pub fn get(&self, name: &str, span: &Span) -> Result<Object> {
        let instance = match self {
            Object::Instance(instance) => instance,
            _ => return Err((TypeError::NotAnInstance { type_: self.type_() }.into(), span.clone())),
        };

        if let Some(object) = instance.get(name) {
            return Ok(object);
        }

        match instance.class().find_method(name) {
            Some(method) => Ok(Object::Function(method.bind(self.clone()))),
            None => Err((
                AttributeError::NoSuchAttribute { type_: self.type_(), name: name.to_string() }
                    .into(),
                span.clone(),
            )),
        }
    }

    pub fn set(&self, name: &str, value: Object, span: &Span) -> Result<()> {
        match self {
            Object::Instance(instance) => {
                instance.set(name, value);
                Ok(())
            }
            _ => Err((TypeError::NotAnInstance { type_: self.type_() }.into(), span.clone())),
        }
    }

    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        match self {
            Object::Class(class) => class.call(interpreter, args, span),
            Object::Function(function) => function.call(interpreter, args, span),
            Object::Native(native) => native.call(interpreter, args, span),
            object => Err((TypeError::NotCallable { type_: object.type_() }.into(), span.clone())),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Bool(bool) => write!(f, "{bool}"),
            Object::Class(class) => write!(f, "{class}"),
            Object::Function(function) => write!(f, "{function}"),
            Object::Instance(instance) => write!(f, "{instance}"),
            Object::Native(native) => write!(f, "{native}"),
            Object::Nil => write!(f, "nil"),
            Object::Number(number) => write!(f, "{number}"),
            Object::String(string) => write!(f, "{string}"),
        }
    }
}

/// Value equality for primitives, identity for heap values.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Bool(b1), Object::Bool(b2)) => b1 == b2,
            (Object::Class(c1), Object::Class(c2)) => c1 == c2,
            (Object::Function(f1), Object::Function(f2)) => f1 == f2,
            (Object::Instance(i1), Object::Instance(i2)) => i1 == i2,
            (Object::Native(n1), Object::Native(n2)) => n1 == n2,
            (Object::Nil, Object::Nil) => true,
            (Object::Number(n1), Object::Number(n2)) => n1 == n2,
            (Object::String(s1), Object::String(s2)) => s1 == s2,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Object::Nil.bool());
        assert!(!Object::Bool(false).bool());
        assert!(Object::Bool(true).bool());
        assert!(Object::Number(0.0).bool());
        assert!(Object::String(String::new()).bool());
    }

    #[test]
    fn equality() {
        assert_eq!(Object::Nil, Object::Nil);
        assert_ne!(Object::Nil, Object::Number(0.0));
        assert_ne!(Object::Nil, Object::Bool(false));
        assert_eq!(Object::String("a".to_string()), Object::String("a".to_string()));
        assert_eq!(Object::Number(1.5), Object::Number(1.5));
        assert_ne!(Object::Number(1.0), Object::String("1".to_string()));
    }

    #[test]
    fn display() {
        assert_eq!(Object::Number(3.0).to_string(), "3");
        assert_eq!(Object::Number(2.5).to_string(), "2.5");
        assert_eq!(Object::Nil.to_string(), "nil");
        assert_eq!(Object::Bool(true).to_string(), "true");
        assert_eq!(Object::String("hi".to_string()).to_string(), "hi");
        assert_eq!(Object::Native(Native::Clock).to_string(), "<native clock>");
    }

    #[test]
    fn get_on_non_instance() {
        let got = Object::Number(1.0).get("x", &(0..1));
        assert_eq!(
            got.map_err(|(e, _)| e.to_string()),
            Err(r#"TypeError: only instances have properties, not "number""#.to_string())
        );
    }
}
