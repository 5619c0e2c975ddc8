use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::lox_class::LoxClass;
use crate::object::Object;
use crate::token::Token;

/// Instances are always accessed through a shared, mutable handle: a `Get`
/// expression can return a bound method that outlives the `Get` that
/// produced it, and a `Set` expression mutates fields through whatever
/// handle evaluated the target object.
pub type LoxInstanceRef = Rc<RefCell<LoxInstance>>;

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Object>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn get(&self, name: &Token, this: &LoxInstanceRef) -> Result<Object, RuntimeError> {
        if let Some(value) = self.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Object::Function(Rc::new(method.bind(Rc::clone(this)))));
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
