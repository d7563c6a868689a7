mod env;
mod interpreter;
mod object;
mod resolver;

pub use crate::interpreter::{Interpreter, MAX_DEPTH};
pub use crate::object::Object;
pub use crate::resolver::{Locals, Resolver};
