use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::class::Instance;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Interpreter, Unwind};
use crate::literal::Literal;
use crate::stmt::FunctionDecl;
use crate::value::{Callable, Value};

/// A user-declared function or method. Carries its own closure — the
/// environment that was live when the `fun`/method declaration executed —
/// so a function called long after its enclosing block has returned can
/// still see the variables it captured.
#[derive(Debug, Clone)]
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Self {
        Function { declaration, closure, is_initializer }
    }

    /// Produces a copy of this function whose closure is a fresh scope,
    /// chained off the original closure, defining `this` as `instance`.
    /// Used both for bound methods (`instance.method`) and for `super`
    /// lookups, which rebind the found method to the current `this`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));
        environment.define("this", Value::Instance(instance));
        Function {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    fn bound_this(&self) -> Option<Value> {
        self.closure.borrow().variables.get("this").cloned()
    }
}

impl Callable for Function {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, Rc::new(RefCell::new(environment))) {
            Ok(()) => {
                if self.is_initializer {
                    Ok(self.bound_this().expect("initializer always has a bound `this`"))
                } else {
                    Ok(Value::Literal(Literal::Nil))
                }
            }
            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    Ok(self.bound_this().expect("initializer always has a bound `this`"))
                } else {
                    Ok(value)
                }
            }
            Err(Unwind::Error(error)) => Err(error),
        }
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.declaration, &other.declaration) && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

/// A function implemented in Rust rather than Lox, exposed to Lox code
/// under a fixed name (see [`NativeFunction::get_globals`]).
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub function: fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>,
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.function)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl NativeFunction {
    /// The built-ins installed into the global scope before any user code
    /// runs: just `clock`, returning whole seconds since the Unix epoch.
    pub fn get_globals() -> Vec<NativeFunction> {
        vec![NativeFunction {
            name: "clock",
            arity: 0,
            function: |_, _| {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs_f64();
                Ok(Value::from(now))
            },
        }]
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
