use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{Diagnostics, RuntimeError};
use crate::expr::{Expr, ExprId, ExprKind};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::stmt::Stmt;
use crate::token::{Token, Type};
use crate::value::{Callable, Value};

/// Non-local control flow raised while executing a statement: either a
/// `return` unwinding to the nearest `Function::call`, or a genuine runtime
/// error unwinding all the way out. Sharing one channel means `execute_block`
/// restores the caller's environment identically on either path; only
/// `Function::call` ever catches the `Return` variant.
pub enum Unwind {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

/// Walks the resolved AST, producing `Value`s. `print` and REPL
/// value-echoing go through a boxed writer so a test can capture output
/// without spawning the built binary, while the real binary plugs in stdout.
pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    writer: Box<dyn Write>,
    repl: bool,
}

impl Interpreter {
    pub fn new(writer: Box<dyn Write>, repl: bool) -> Self {
        let globals = Rc::new(RefCell::new(Environment::default()));

        for native in NativeFunction::get_globals() {
            globals.borrow_mut().define(native.name, Value::from(native));
        }

        Interpreter { environment: Rc::clone(&globals), globals, locals: HashMap::new(), writer, repl }
    }

    /// REPL lines re-echo the value of a bare expression statement; a
    /// script run from a file never does.
    pub fn set_repl(&mut self, repl: bool) {
        self.repl = repl;
    }

    /// Merges in the id→distance table the resolver computed for the
    /// statements about to be interpreted. Merging (not replacing) lets a
    /// REPL session accumulate resolutions across lines instead of losing
    /// earlier lines' closures' entries.
    pub fn add_locals(&mut self, locals: HashMap<ExprId, usize>) {
        self.locals.extend(locals);
    }

    pub fn interpret(&mut self, statements: &[Stmt], diagnostics: &mut Diagnostics) {
        for statement in statements {
            if let Err(unwind) = self.execute(statement) {
                match unwind {
                    Unwind::Error(error) => {
                        diagnostics.runtime_error(&error);
                        return;
                    }
                    Unwind::Return(_) => unreachable!("return outside of any function call"),
                }
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;
                if self.repl {
                    writeln!(self.writer, "{value}").ok();
                }
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.writer, "{value}").ok();
                Ok(())
            }
            Stmt::Var(data) => {
                let value = match &data.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Literal(Literal::Nil),
                };
                self.environment.borrow_mut().define(&data.name.lexeme, value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let scope = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.environment)))));
                self.execute_block(statements, scope)
            }
            Stmt::If(data) => {
                if self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.then_branch)?;
                } else if let Some(else_branch) = &data.else_branch {
                    self.execute(else_branch)?;
                }
                Ok(())
            }
            Stmt::While(data) => {
                while self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.body)?;
                }
                Ok(())
            }
            Stmt::Function(declaration) => {
                let function = Function::new(Rc::clone(declaration), Rc::clone(&self.environment), false);
                self.environment.borrow_mut().define(&declaration.name.lexeme, Value::from(function));
                Ok(())
            }
            Stmt::Return(data) => {
                let value = match &data.value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Literal(Literal::Nil),
                };
                Err(Unwind::Return(value))
            }
            Stmt::Class(data) => self.execute_class(data),
        }
    }

    fn execute_class(&mut self, data: &crate::stmt::ClassData) -> Result<(), Unwind> {
        let superclass = match &data.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(RuntimeError::new(
                        self.superclass_token(expr),
                        "Superclass must be a class.",
                    )
                    .into())
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, Value::Literal(Literal::Nil));

        let enclosing_environment = if let Some(superclass) = &superclass {
            let enclosing = Rc::clone(&self.environment);
            self.environment = Rc::new(RefCell::new(Environment::new(Some(enclosing.clone()))));
            self.environment.borrow_mut().define("super", Value::Class(Rc::clone(superclass)));
            Some(enclosing)
        } else {
            None
        };

        let mut methods = HashMap::new();
        for method in &data.methods {
            let is_initializer = method.name.lexeme == "init";
            let function = Function::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);
            methods.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class = Rc::new(RefCell::new(Class::new(data.name.lexeme.clone(), superclass, methods)));

        if let Some(enclosing) = enclosing_environment {
            self.environment = enclosing;
        }

        self.environment.borrow_mut().assign(&data.name, Value::Class(class)).map_err(Unwind::from)?;
        Ok(())
    }

    fn superclass_token(&self, expr: &Expr) -> Token {
        match &expr.kind {
            ExprKind::Variable(data) => data.name.clone(),
            _ => unreachable!("superclass expression is always a Variable"),
        }
    }

    /// Executes `statements` in `environment`, restoring the previously
    /// current environment on every exit path — normal completion, a
    /// `return` unwinding through, or a runtime error.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = (|| {
            for statement in statements {
                self.execute(statement)?;
            }
            Ok(())
        })();

        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(Value::Literal(literal.clone())),
            ExprKind::Grouping(data) => self.evaluate(&data.expr),
            ExprKind::Unary(data) => self.evaluate_unary(data),
            ExprKind::Binary(data) => self.evaluate_binary(data),
            ExprKind::Logical(data) => self.evaluate_logical(data),
            ExprKind::Variable(data) => self.look_up_variable(expr.id, &data.name),
            ExprKind::Assign(data) => self.evaluate_assign(expr.id, data),
            ExprKind::Call(data) => self.evaluate_call(data),
            ExprKind::Get(data) => self.evaluate_get(data),
            ExprKind::Set(data) => self.evaluate_set(data),
            ExprKind::This(data) => self.look_up_variable(expr.id, &data.keyword),
            ExprKind::Super(data) => self.evaluate_super(expr.id, data),
        }
    }

    fn evaluate_unary(&mut self, data: &crate::expr::UnaryData) -> Result<Value, RuntimeError> {
        let right = self.evaluate(&data.expr)?;

        match data.operator.kind {
            Type::Minus => match right {
                Value::Literal(Literal::Number(n)) => Ok(Value::from(-n)),
                _ => Err(RuntimeError::new(data.operator.clone(), "Operand must be a number.")),
            },
            Type::Bang => Ok(Value::from(!right.is_truthy())),
            _ => unreachable!("unary operator is always '-' or '!'"),
        }
    }

    fn evaluate_binary(&mut self, data: &crate::expr::BinaryData) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;
        let operator = &data.operator;

        use Literal::Number;

        match operator.kind {
            Type::Minus => numeric(operator, left, right, |a, b| a - b),
            Type::Slash => numeric(operator, left, right, |a, b| a / b),
            Type::Star => numeric(operator, left, right, |a, b| a * b),
            Type::Greater => numeric_bool(operator, left, right, |a, b| a > b),
            Type::GreaterEqual => numeric_bool(operator, left, right, |a, b| a >= b),
            Type::Less => numeric_bool(operator, left, right, |a, b| a < b),
            Type::LessEqual => numeric_bool(operator, left, right, |a, b| a <= b),
            Type::Plus => match (left, right) {
                (Value::Literal(Number(l)), Value::Literal(Number(r))) => Ok(Value::from(l + r)),
                (Value::Literal(Literal::String(l)), Value::Literal(Literal::String(r))) => {
                    Ok(Value::from(l + &r))
                }
                _ => Err(RuntimeError::new(
                    operator.clone(),
                    "Operands must be two numbers or two strings.",
                )),
            },
            Type::EqualEqual => Ok(Value::from(is_equal(&left, &right))),
            Type::BangEqual => Ok(Value::from(!is_equal(&left, &right))),
            _ => unreachable!("binary operator is always one of the above"),
        }
    }

    fn evaluate_logical(&mut self, data: &crate::expr::LogicalData) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&data.left)?;

        if data.operator.kind == Type::Or {
            if left.is_truthy() {
                return Ok(left);
            }
        } else if !left.is_truthy() {
            return Ok(left);
        }

        self.evaluate(&data.right)
    }

    fn evaluate_assign(&mut self, id: ExprId, data: &crate::expr::AssignData) -> Result<Value, RuntimeError> {
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&id) {
            Some(&distance) => {
                self.environment.borrow_mut().assign_at(distance, &data.name, value.clone());
            }
            None => {
                self.globals.borrow_mut().assign(&data.name, value.clone())?;
            }
        }

        Ok(value)
    }

    fn evaluate_call(&mut self, data: &crate::expr::CallData) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let arity = match &callee {
            Value::Function(function) => function.arity(),
            Value::NativeFunction(function) => function.arity(),
            Value::Class(class) => class.arity(),
            _ => {
                return Err(RuntimeError::new(
                    data.paren.clone(),
                    "Can only call functions and classes.",
                ))
            }
        };

        if arguments.len() != arity {
            return Err(RuntimeError::new(
                data.paren.clone(),
                format!("Expected {arity} arguments but got {}.", arguments.len()),
            ));
        }

        match callee {
            Value::Function(function) => function.call(self, arguments),
            Value::NativeFunction(function) => function.call(self, arguments),
            Value::Class(class) => class.call(self, arguments),
            _ => unreachable!("checked above"),
        }
    }

    fn evaluate_get(&mut self, data: &crate::expr::GetData) -> Result<Value, RuntimeError> {
        match self.evaluate(&data.object)? {
            Value::Instance(instance) => Instance::get(&instance, &data.name),
            _ => Err(RuntimeError::new(data.name.clone(), "Only instances have properties.")),
        }
    }

    fn evaluate_set(&mut self, data: &crate::expr::SetData) -> Result<Value, RuntimeError> {
        match self.evaluate(&data.object)? {
            Value::Instance(instance) => {
                let value = self.evaluate(&data.value)?;
                instance.borrow_mut().set(&data.name, value.clone());
                Ok(value)
            }
            _ => Err(RuntimeError::new(data.name.clone(), "Only instances have fields.")),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, data: &crate::expr::SuperData) -> Result<Value, RuntimeError> {
        let distance = *self
            .locals
            .get(&id)
            .expect("resolver always resolves a `super` expression to a local distance");

        let superclass = match self.environment.borrow().get_at(distance, &super_token(&data.keyword))? {
            Value::Class(class) => class,
            _ => unreachable!("`super` always resolves to a Class"),
        };

        let this = match self.environment.borrow().get_at(distance - 1, &this_token(&data.keyword))? {
            Value::Instance(instance) => instance,
            _ => unreachable!("`this` always resolves to an Instance"),
        };

        let method = superclass
            .borrow()
            .find_method(&data.method.lexeme)
            .ok_or_else(|| {
                RuntimeError::new(data.method.clone(), format!("Undefined property '{}'.", data.method.lexeme))
            })?;

        Ok(Value::Function(Rc::new(method.bind(this))))
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => self.environment.borrow().get_at(distance, name),
            None => self.globals.borrow().get(name),
        }
    }
}

fn super_token(keyword: &Token) -> Token {
    Token::new(Type::Super, "super".to_string(), None, keyword.line)
}

fn this_token(keyword: &Token) -> Token {
    Token::new(Type::This, "this".to_string(), None, keyword.line)
}

fn numeric(
    operator: &Token,
    left: Value,
    right: Value,
    op: impl Fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Literal(Literal::Number(l)), Value::Literal(Literal::Number(r))) => Ok(Value::from(op(l, r))),
        _ => Err(RuntimeError::new(operator.clone(), "Operands must be numbers.")),
    }
}

fn numeric_bool(
    operator: &Token,
    left: Value,
    right: Value,
    op: impl Fn(f64, f64) -> bool,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Literal(Literal::Number(l)), Value::Literal(Literal::Number(r))) => Ok(Value::from(op(l, r))),
        _ => Err(RuntimeError::new(operator.clone(), "Operands must be numbers.")),
    }
}

/// `nil` equals only `nil`; everything else compares structurally within
/// its own kind and never across kinds. Callables and instances compare by
/// reference identity, matching `Value`'s derived `PartialEq`.
fn is_equal(left: &Value, right: &Value) -> bool {
    left == right
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;
    use std::io;

    /// A `Write` sink that shares ownership with the test so output can be
    /// inspected after the interpreter (which owns a boxed `Write`) runs.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(source: &str) -> (String, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source, &mut diagnostics).scan_tokens();
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        let locals = Resolver::new(&mut diagnostics).resolve(&statements);

        let buffer = SharedBuffer::default();
        let mut interpreter = Interpreter::new(Box::new(buffer.clone()), false);
        interpreter.add_locals(locals);
        interpreter.interpret(&statements, &mut diagnostics);

        let output = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        (output, diagnostics)
    }

    #[test]
    fn arithmetic_and_print() {
        let (output, diagnostics) = run("print 1 + 2 * 3;");
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(output, "7\n");
    }

    #[test]
    fn string_concatenation() {
        let (output, _) = run("print \"foo\" + \"bar\";");
        assert_eq!(output, "foobar\n");
    }

    #[test]
    fn adding_number_to_string_is_a_runtime_error() {
        let (_, diagnostics) = run("print 1 + \"a\";");
        assert!(diagnostics.had_runtime_error());
    }

    #[test]
    fn closures_capture_their_declaring_environment() {
        let (output, diagnostics) = run(
            "fun makeCounter() { var i = 0; fun counter() { i = i + 1; print i; } return counter; } \
             var counter = makeCounter(); counter(); counter();",
        );
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(output, "1\n2\n");
    }

    #[test]
    fn integral_numbers_stringify_without_decimal() {
        let (output, _) = run("print 6 - 2 * 3;");
        assert_eq!(output, "0\n");
    }

    #[test]
    fn class_instantiation_and_methods() {
        let (output, diagnostics) = run(
            "class Greeter { greet(name) { print \"hi \" + name; } } var g = Greeter(); g.greet(\"sam\");",
        );
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(output, "hi sam\n");
    }

    #[test]
    fn init_always_returns_the_bound_instance() {
        let (output, diagnostics) = run(
            "class Thing { init(x) { this.x = x; } } var t = Thing(5); print t.x;",
        );
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(output, "5\n");
    }

    #[test]
    fn subclass_methods_call_super() {
        let (output, diagnostics) = run(
            "class A { speak() { print \"a\"; } } \
             class B < A { speak() { super.speak(); print \"b\"; } } \
             B().speak();",
        );
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(output, "a\nb\n");
    }

    #[test]
    fn shadowed_locals_do_not_leak_into_each_other() {
        let (output, diagnostics) = run(
            "var a = \"global\"; { var a = \"inner\"; print a; } print a;",
        );
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(output, "inner\nglobal\n");
    }
}
