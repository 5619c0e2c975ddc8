use crate::errors::RuntimeError;
use crate::interpreter::Interpreter;
use crate::lox_callable::LoxCallable;
use crate::object::Object;

pub struct NativeClock;

impl LoxCallable for NativeClock {
    fn arity(&self) -> usize {
        0
    }

    fn call(&self, _interpreter: &mut Interpreter, _arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        Ok(Object::Num(
            chrono::offset::Local::now().timestamp_millis() as f64 / 1000.0,
        ))
    }
}
