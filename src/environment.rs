use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::object::Object;
use crate::token::Token;

struct EnvironmentInner {
    values: HashMap<String, Object>,
    enclosing: Option<Environment>,
}

/// A chained scope frame. Cloning an `Environment` clones the `Rc` handle,
/// not the frame itself, so closures that capture one share the live frame
/// (and see later assignments to it) rather than a snapshot.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<EnvironmentInner>>);

impl Environment {
    pub fn new() -> Self {
        Environment(Rc::new(RefCell::new(EnvironmentInner {
            values: HashMap::new(),
            enclosing: None,
        })))
    }

    pub fn with_enclosing(enclosing: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(EnvironmentInner {
            values: HashMap::new(),
            enclosing: Some(enclosing.clone()),
        })))
    }

    pub fn define(&self, name: &str, value: Object) {
        self.0.borrow_mut().values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        let inner = self.0.borrow();
        if let Some(value) = inner.values.get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(enclosing) = &inner.enclosing {
            return enclosing.get(name);
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    pub fn assign(&self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        let mut inner = self.0.borrow_mut();
        if inner.values.contains_key(&name.lexeme) {
            inner.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }
        if let Some(enclosing) = &inner.enclosing {
            return enclosing.assign(name, value);
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    /// Looks up `name` in the frame `distance` hops out from this one. The
    /// resolver guarantees this distance is correct for any expression id it
    /// resolved, so a miss here means the resolver and interpreter have
    /// fallen out of sync, not a user-facing error.
    pub fn get_at(&self, distance: usize, name: &str) -> Object {
        self.ancestor(distance)
            .0
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("resolver distance {distance} missing variable '{name}'"))
    }

    pub fn assign_at(&self, distance: usize, name: &Token, value: Object) {
        self.ancestor(distance)
            .0
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), value);
    }

    fn ancestor(&self, distance: usize) -> Environment {
        let mut env = self.clone();
        for _ in 0..distance {
            let next = env
                .0
                .borrow()
                .enclosing
                .clone()
                .unwrap_or_else(|| panic!("resolver distance {distance} exceeds scope chain"));
            env = next;
        }
        env
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
