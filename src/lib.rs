#![allow(clippy::needless_return)]

//! Rocks is a tree-walking interpreter for Lox, the language from Bob
//! Nystrom's [Crafting Interpreters](https://craftinginterpreters.com/).
//! Rocks is a dynamically typed language with lexical scoping, closures and
//! single-inheritance classes.
//!
//! ## Scanning
//! The first step is scanning: turning a string of source characters into a
//! flat list of tokens. The scanner is implemented in the
//! [`scanner`](scanner) module over a lookahead character iterator. It
//! reports errors — an unterminated string, an unterminated block comment,
//! an unexpected character — through [`Diagnostics`](error::Diagnostics)
//! and keeps scanning past them so a user can fix more than one mistake at
//! once before trying again.
//!
//! ## Parsing
//! The second step is parsing: turning the token list into an abstract
//! syntax tree. The parser is a hand-written recursive-descent parser in
//! the [`parser`](parser) module. [`Expr`](expr::Expr) nodes produce a
//! [`Value`](value::Value) when evaluated; [`Stmt`](stmt::Stmt) nodes
//! perform a side effect instead. On a malformed production the parser
//! reports the error and synchronizes at the next statement boundary rather
//! than aborting the whole parse.
//!
//! ## Resolving
//! The third step is resolving: a static pass over the AST that computes,
//! for every variable reference, how many enclosing scopes separate it from
//! its declaration. The [`resolver`](resolver) module hands this table back
//! as a plain `HashMap` keyed by the referencing expression's node id, kept
//! independent of both the parser and the interpreter. Resolving also
//! catches scoping mistakes that are syntactically valid but semantically
//! wrong — `return` outside a function, `this` outside a class, a variable
//! reading itself in its own initializer.
//!
//! ## Interpreting
//! The last step is interpreting: walking the resolved AST and producing
//! values. The [`interpreter`](interpreter) module holds the live
//! environment chain and the locals table, and reports type and arity
//! mistakes as [`RuntimeError`](error::RuntimeError)s that can only be
//! caught once the program is actually running.

use std::io;
use std::process;

pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use error::Diagnostics;
use expr::ExprId;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// The interpreter session: a file run starts one fresh, a REPL session
/// keeps one alive across lines so that later lines can still see earlier
/// lines' variables and call earlier lines' closures.
#[allow(non_camel_case_types)]
pub struct rocks {
    interpreter: Interpreter,
    next_id: ExprId,
}

impl rocks {
    pub fn new() -> Self {
        rocks { interpreter: Interpreter::new(Box::new(io::stdout()), false), next_id: 0 }
    }

    pub fn run_file(&mut self, path: String) {
        let contents =
            std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("couldn't read {path}: {err}"));

        let mut diagnostics = Diagnostics::new();
        self.run(contents, &mut diagnostics);

        if diagnostics.had_error() {
            process::exit(65);
        }
        if diagnostics.had_runtime_error() {
            process::exit(70);
        }
    }

    pub fn run_prompt(&mut self) {
        self.interpreter.set_repl(true);

        let mut editor = rustyline::DefaultEditor::new().expect("initialize line editor");
        let history_path = home::home_dir().map(|home| home.join(".rocks_history"));
        if let Some(path) = &history_path {
            editor.load_history(path).ok();
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    editor.add_history_entry(line.as_str()).ok();
                    let mut diagnostics = Diagnostics::new();
                    self.run(line, &mut diagnostics);
                }
                Err(rustyline::error::ReadlineError::Interrupted | rustyline::error::ReadlineError::Eof) => {
                    break
                }
                Err(_) => break,
            }
        }

        if let Some(path) = &history_path {
            editor.save_history(path).ok();
        }
    }

    /// Scans, parses, resolves and interprets one chunk of source. Node ids
    /// and the interpreter's environment/locals persist across calls, so a
    /// REPL line can read a variable or invoke a closure a previous line
    /// defined; a fresh [`Diagnostics`] per call keeps one line's mistakes
    /// from marking the next line as already failed.
    fn run(&mut self, source: String, diagnostics: &mut Diagnostics) {
        let tokens = Scanner::new(&source, diagnostics).scan_tokens();
        if diagnostics.had_error() {
            return;
        }

        let mut parser = Parser::resume(tokens, diagnostics, self.next_id);
        let statements = parser.parse();
        self.next_id = parser.next_id();
        if diagnostics.had_error() {
            return;
        }

        let locals = Resolver::new(diagnostics).resolve(&statements);
        if diagnostics.had_error() {
            return;
        }

        self.interpreter.add_locals(locals);
        self.interpreter.interpret(&statements, diagnostics);
    }
}

impl Default for rocks {
    fn default() -> Self {
        Self::new()
    }
}
