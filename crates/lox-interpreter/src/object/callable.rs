use std::io::Write;

use lox_common::error::{Result, TypeError};
use lox_common::types::Span;

use crate::object::Object;
use crate::Interpreter;

pub trait Callable {
    fn arity(&self) -> usize;

    fn name(&self) -> &str;

    /// Runs the callable. The argument count has already been checked.
    fn call_unchecked<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object>;

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        let exp_args = self.arity();
        let got_args = args.len();
        if exp_args != got_args {
            return Err((
                TypeError::ArityMismatch { name: self.name().to_string(), exp_args, got_args }
                    .into(),
                span.clone(),
            ));
        }
        self.call_unchecked(interpreter, args, span)
    }
}
