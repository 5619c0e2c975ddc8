use std::fmt;
use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::interpreter::Interpreter;
use crate::lox_callable::LoxCallable;
use crate::object::Object;

/// Wraps a builtin (`clock`, ...) so it can travel through `Object::Native`
/// the same way a `LoxFunction` travels through `Object::Function`.
pub struct NativeFunction {
    pub name: String,
    function: Rc<dyn LoxCallable>,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>, function: Rc<dyn LoxCallable>) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

impl LoxCallable for NativeFunction {
    fn arity(&self) -> usize {
        self.function.arity()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        self.function.call(interpreter, arguments)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
