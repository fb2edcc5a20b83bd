use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::{Callable, Value};

/// A class declaration: its own method table plus, if it extends another
/// class, a link to the superclass for method-lookup fallthrough.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<RefCell<Class>>>,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(name: String, superclass: Option<Rc<RefCell<Class>>>, methods: HashMap<String, Rc<Function>>) -> Self {
        Class { name, superclass, methods }
    }

    /// Looks up `name` in this class's own methods, then its superclass
    /// chain. Unqualified `this.method()` calls and `super.method()`
    /// resolution both go through this.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass.as_ref().and_then(|superclass| superclass.borrow().find_method(name))
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

/// Implemented on the `Rc<RefCell<Class>>` handle, not on `Class` itself,
/// so instantiation can hand the new `Instance` a clone of the exact `Rc`
/// the interpreter already holds instead of constructing a disconnected copy.
impl Callable for Rc<RefCell<Class>> {
    fn arity(&self) -> usize {
        self.borrow().find_method("init").map_or(0, |initializer| initializer.arity())
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(initializer) = self.borrow().find_method("init") {
            initializer.bind(Rc::clone(&instance)).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// A live object: a class pointer plus its own field map. Fields are
/// looked up before methods, so an instance can shadow an inherited method
/// name with a plain value.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<RefCell<Class>>,
    pub fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<RefCell<Class>>) -> Self {
        Instance { class, fields: HashMap::new() }
    }

    pub fn get(this: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value, RuntimeError> {
        let instance = this.borrow();

        if let Some(field) = instance.fields.get(&name.lexeme) {
            return Ok(field.clone());
        }

        if let Some(method) = instance.class.borrow().find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(this)))));
        }

        Err(RuntimeError::new(name.clone(), format!("Undefined property '{}'.", name.lexeme)))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> instance", self.class.borrow().name)
    }
}
