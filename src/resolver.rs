use std::collections::HashMap;
use std::mem;

use crate::error::{Diagnostics, ResolveError};
use crate::expr::{Expr, ExprId, ExprKind};
use crate::stmt::{ClassData, FunctionDecl, Stmt};
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolves each variable reference to the number of scope hops between the
/// reference and the scope that declares it. Keyed by the referencing
/// expression's node id, never by name: two occurrences of the same
/// identifier are distinct nodes and can resolve to different distances
/// once shadowing is involved.
pub struct Resolver<'a> {
    diagnostics: &'a mut Diagnostics,
    scopes: Vec<HashMap<String, bool>>,
    locals: HashMap<ExprId, usize>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a> Resolver<'a> {
    pub fn new(diagnostics: &'a mut Diagnostics) -> Self {
        Resolver {
            diagnostics,
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Resolves a whole program and hands back the id→distance table the
    /// interpreter consults for every variable lookup.
    pub fn resolve(mut self, statements: &[Stmt]) -> HashMap<ExprId, usize> {
        self.resolve_stmts(statements);
        self.locals
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.diagnostics.resolve_error(&ResolveError {
            token: token.clone(),
            message: message.to_string(),
        });
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => self.resolve_expr(expr),
            Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Var(data) => {
                self.declare(&data.name);
                if let Some(initializer) = &data.initializer {
                    self.resolve_expr(initializer);
                }
                self.define(&data.name);
            }
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }
            Stmt::If(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.then_branch);
                if let Some(else_branch) = &data.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.body);
            }
            Stmt::Function(declaration) => {
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }
            Stmt::Return(data) => {
                if self.current_function == FunctionType::None {
                    self.error(&data.keyword, "Cannot return from top-level code.");
                }

                if let Some(value) = &data.value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(&data.keyword, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Class(data) => self.resolve_class(data),
        }
    }

    fn resolve_class(&mut self, data: &ClassData) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&data.name);
        self.define(&data.name);

        if let Some(superclass) = &data.superclass {
            if let ExprKind::Variable(variable) = &superclass.kind {
                if variable.name.lexeme == data.name.lexeme {
                    self.error(&variable.name, "A class cannot inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.scopes
                .last_mut()
                .expect("scope stack is non-empty inside a class body")
                .insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes
            .last_mut()
            .expect("scope stack is non-empty inside a class body")
            .insert("this".to_string(), true);

        for method in &data.methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if data.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&declaration.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Unary(data) => self.resolve_expr(&data.expr),
            ExprKind::Binary(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            ExprKind::Logical(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            ExprKind::Grouping(data) => self.resolve_expr(&data.expr),
            ExprKind::Variable(data) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&data.name.lexeme) == Some(&false) {
                        self.error(&data.name, "Cannot read local variable in its own initializer.");
                    }
                }
                self.resolve_local(expr.id, &data.name);
            }
            ExprKind::Assign(data) => {
                self.resolve_expr(&data.value);
                self.resolve_local(expr.id, &data.name);
            }
            ExprKind::Call(data) => {
                self.resolve_expr(&data.callee);
                for argument in &data.arguments {
                    self.resolve_expr(argument);
                }
            }
            ExprKind::Get(data) => self.resolve_expr(&data.object),
            ExprKind::Set(data) => {
                self.resolve_expr(&data.value);
                self.resolve_expr(&data.object);
            }
            ExprKind::This(data) => {
                if self.current_class == ClassType::None {
                    self.error(&data.keyword, "Cannot use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(expr.id, &data.keyword);
            }
            ExprKind::Super(data) => {
                match self.current_class {
                    ClassType::Subclass => {}
                    ClassType::None => self.error(&data.keyword, "Cannot use 'super' outside of a class."),
                    ClassType::Class => {
                        self.error(&data.keyword, "Cannot use 'super' in a class with no superclass.")
                    }
                }
                self.resolve_local(expr.id, &data.keyword);
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };

        if scope.contains_key(&name.lexeme) {
            let message = "Variable with this name already declared in this scope.".to_string();
            self.diagnostics.resolve_error(&ResolveError { token: name.clone(), message });
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        scope.insert(name.lexeme.clone(), true);
    }

    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(id, depth);
                return;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve_source(source: &str) -> (HashMap<ExprId, usize>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source, &mut diagnostics).scan_tokens();
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        let locals = Resolver::new(&mut diagnostics).resolve(&statements);
        (locals, diagnostics)
    }

    #[test]
    fn shadowed_locals_resolve_to_distinct_distances() {
        let (locals, diagnostics) = resolve_source(
            "var a = \"global\"; { var a = \"outer\"; { var a = \"inner\"; print a; } print a; } print a;",
        );
        assert!(!diagnostics.had_error());
        assert_eq!(locals.len(), 2);
        let mut distances: Vec<usize> = locals.values().copied().collect();
        distances.sort_unstable();
        assert_eq!(distances, vec![0, 0]);
    }

    #[test]
    fn self_reference_in_initializer_is_an_error() {
        let (_locals, diagnostics) = resolve_source("{ var a = a; }");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn return_from_initializer_with_value_is_an_error() {
        let (_locals, diagnostics) = resolve_source("class A { init() { return 1; } }");
        assert!(diagnostics.had_error());
    }
}
