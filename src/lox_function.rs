use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::errors::{RuntimeError, Unwind};
use crate::interpreter::Interpreter;
use crate::lox_callable::LoxCallable;
use crate::lox_instance::LoxInstanceRef;
use crate::object::Object;
use crate::stmt::FunctionDecl;

pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Environment,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Environment, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Returns a copy of this function whose closure has `this` bound to
    /// `instance` — used when a method is looked up off an instance.
    pub fn bind(&self, instance: LoxInstanceRef) -> LoxFunction {
        let env = Environment::with_enclosing(&self.closure);
        env.define("this", Object::Instance(instance));
        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }
}

impl LoxCallable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let env = Environment::with_enclosing(&self.closure);
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            env.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, env) {
            Ok(()) => {
                if self.is_initializer {
                    Ok(self.closure.get_at(0, "this"))
                } else {
                    Ok(Object::Nil)
                }
            }
            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    Ok(self.closure.get_at(0, "this"))
                } else {
                    Ok(value)
                }
            }
            Err(Unwind::Error(e)) => Err(e),
        }
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
