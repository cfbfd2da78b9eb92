use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::object::Value;

/// Shared handle to a scope. Every closure keeps the environment it was
/// created in alive; `Rc` shares the chain between frames and closures,
/// `RefCell` lets `let` bind into a scope other holders still reference.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    /// Bindings for *this* scope
    values: HashMap<String, Value>,

    /// Optional parent scope
    enclosing: Option<Env>,
}

impl Environment {
    /// Create the top-level (global) environment.
    pub fn new_global() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Create a nested environment chained to its parent.
    pub fn new_enclosed(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    /// Insert or shadow in this scope without extra checks.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Nearest-enclosing binding for `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.enclosing
            .as_ref()
            .and_then(|parent| parent.borrow().get(name))
    }
}

// Closures stored in their own defining scope make the chain cyclic, so
// Debug must not follow bound values or the parent link.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("enclosed", &self.enclosing.is_some())
            .finish()
    }
}
