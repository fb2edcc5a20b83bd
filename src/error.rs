use std::fmt;

use crate::token::{Token, Type};

/// Accumulates error state for a single run (one `run_file` call, or one
/// REPL line) instead of the process-global flags a naive port would reach
/// for. A fresh `Diagnostics` is handed to the scanner/parser/resolver and
/// interpreter of each run so that, in the REPL, a mistake on one line can
/// never leave the next line's run looking pre-failed.
#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Reports a scan-time error with no `at ...` clause.
    pub fn error(&mut self, line: usize, message: &str) {
        self.report(line, "", message);
        self.had_error = true;
    }

    /// Reports a parse- or resolve-time error anchored to a token.
    pub fn error_at(&mut self, token: &Token, message: &str) {
        let location = if token.kind == Type::Eof {
            "at end".to_string()
        } else {
            format!("at '{}'", token.lexeme)
        };
        self.report(token.line, &location, message);
        self.had_error = true;
    }

    pub fn parse_error(&mut self, error: &ParseError) {
        self.error_at(&error.token, &error.message);
    }

    pub fn resolve_error(&mut self, error: &ResolveError) {
        self.error_at(&error.token, &error.message);
    }

    pub fn runtime_error(&mut self, error: &RuntimeError) {
        eprintln!("{}\n[line {}]", error.message, error.token.line);
        self.had_runtime_error = true;
    }

    fn report(&self, line: usize, location: &str, message: &str) {
        eprintln!("[line {line}] Error {location}: {message}");
    }
}

/// Raised by the parser on a malformed production. Carries the offending
/// token so the caller can report it, and (via `synchronize`) recover at
/// statement boundaries instead of aborting the whole parse.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Raised by the resolver on a scoping violation (self-reference in an
/// initializer, `return` outside a function, `this`/`super` outside a
/// class, and so on).
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ResolveError {}

/// Raised by the interpreter for a type or arity violation discovered at
/// run time. Token is kept for its line, matching the `<message>\n[line N]`
/// diagnostic format.
#[derive(Debug)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> RuntimeError {
        RuntimeError { token, message: message.into() }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::Token;

    #[test]
    fn scan_error_sets_had_error_only() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(3, "Unexpected character.");
        assert!(diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
    }

    #[test]
    fn runtime_error_sets_had_runtime_error_only() {
        let mut diagnostics = Diagnostics::new();
        let token = Token::new(Type::Plus, "+".into(), None, 1);
        diagnostics.runtime_error(&RuntimeError::new(token, "Operands must be numbers."));
        assert!(diagnostics.had_runtime_error());
        assert!(!diagnostics.had_error());
    }
}
