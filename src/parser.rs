use std::rc::Rc;

use crate::error::{Diagnostics, ParseError};
use crate::expr::{
    AssignData, BinaryData, CallData, Expr, ExprId, ExprKind, GetData, GroupingData, LogicalData,
    SetData, SuperData, ThisData, UnaryData, VariableData,
};
use crate::literal::Literal;
use crate::stmt::{ClassData, FunctionDecl, IfData, ReturnData, Stmt, VarData, WhileData};
use crate::token::{Token, Type};

type ParseResult<T> = Result<T, ParseError>;

/// Returns whether the next token is any of the given types, consuming it if so.
macro_rules! matches {
    ( $self:ident, $( $type:expr ),+ ) => {
        {
            if $( $self.check($type) )||* {
                $self.advance();
                true
            } else {
                false
            }
        }
    }
}

/// Recursive-descent parser over the flat token vector produced by the
/// scanner. Owns a monotonic counter used to stamp every `Expr` it builds
/// with a node id, so the resolver can key its side-table on node identity
/// instead of on a name or lexeme.
///
/// ```text
/// program      -> declaration* EOF
/// declaration  -> classDecl | funDecl | varDecl | statement
/// classDecl    -> "class" IDENT ( "<" IDENT )? "{" function* "}"
/// funDecl      -> "fun" function
/// function     -> IDENT "(" params? ")" block
/// varDecl      -> "var" IDENT ( "=" expression )? ";"
/// statement    -> exprStmt | forStmt | ifStmt | printStmt | returnStmt
///               | whileStmt | block
/// block        -> "{" declaration* "}"
/// expression   -> assignment
/// assignment   -> ( call "." IDENT | IDENT ) "=" assignment | logic_or
/// logic_or     -> logic_and ( "or" logic_and )*
/// logic_and    -> equality  ( "and" equality )*
/// equality     -> comparison ( ("!="|"==") comparison )*
/// comparison   -> term       ( (">"|">="|"<"|"<=") term )*
/// term         -> factor     ( ("-"|"+") factor )*
/// factor       -> unary      ( ("/"|"*") unary )*
/// unary        -> ("!"|"-") unary | call
/// call         -> primary ( "(" args? ")" | "." IDENT )*
/// primary      -> "true"|"false"|"nil"|"this"|NUMBER|STRING|IDENT
///               | "(" expression ")" | "super" "." IDENT
/// ```
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    next_id: ExprId,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, diagnostics: &'a mut Diagnostics) -> Self {
        Self::resume(tokens, diagnostics, 0)
    }

    /// Like [`Parser::new`], but starts stamping node ids from `start_id`
    /// instead of zero. The REPL front-end uses this to keep node ids
    /// unique across lines: a closure captured on one line may be called
    /// from a later line, and its body's node ids must never collide with
    /// ids the resolver assigns while processing that later line.
    pub fn resume(tokens: Vec<Token>, diagnostics: &'a mut Diagnostics, start_id: ExprId) -> Self {
        Parser { tokens, current: 0, next_id: start_id, diagnostics }
    }

    /// The first node id not yet used; callers that parse multiple chunks
    /// against a shared id space pass this back in as the next chunk's
    /// `start_id`.
    pub fn next_id(&self) -> ExprId {
        self.next_id
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        let id = self.next_id;
        self.next_id += 1;
        Expr { id, kind }
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        statements
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == Type::Eof
    }

    fn check(&self, kind: Type) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn consume(&mut self, kind: Type, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }

        Err(ParseError { token: self.peek().clone(), message: message.to_string() })
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let statement = if matches!(self, Type::Class) {
            self.class_declaration()
        } else if matches!(self, Type::Fun) {
            self.function("function").map(Stmt::Function)
        } else if matches!(self, Type::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match statement {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.diagnostics.parse_error(&error);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expect class name.")?.clone();

        let superclass = if matches!(self, Type::Less) {
            self.consume(Type::Identifier, "Expect superclass name.")?;
            Some(self.expr(ExprKind::Variable(VariableData { name: self.previous().clone() })))
        } else {
            None
        };

        self.consume(Type::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(Type::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expect variable name.")?.clone();

        let initializer = if matches!(self, Type::Equal) { Some(self.expression()?) } else { None };

        self.consume(Type::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While(WhileData { condition, body }))
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if matches!(self, Type::For) {
            return self.for_statement();
        }
        if matches!(self, Type::If) {
            return self.if_statement();
        }
        if matches!(self, Type::Print) {
            return self.print_statement();
        }
        if matches!(self, Type::Return) {
            return self.return_statement();
        }
        if matches!(self, Type::While) {
            return self.while_statement();
        }
        if matches!(self, Type::LeftBrace) {
            return Ok(Stmt::Block(self.block()?));
        }

        self.expression_statement()
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if matches!(self, Type::Semicolon) {
            None
        } else if matches!(self, Type::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(Type::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(Type::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Type::RightParen) { Some(self.expression()?) } else { None };
        self.consume(Type::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or_else(|| self.expr(ExprKind::Literal(Literal::Bool(true))));
        body = Stmt::While(WhileData { condition, body: Box::new(body) });

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch =
            if matches!(self, Type::Else) { Some(Box::new(self.statement()?)) } else { None };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(expr))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = if self.check(Type::Semicolon) { None } else { Some(self.expression()?) };

        self.consume(Type::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn function(&mut self, kind: &str) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.consume(Type::Identifier, &format!("Expect {kind} name.")).map(Clone::clone)?;

        self.consume(Type::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= 255 {
                    self.diagnostics.parse_error(&ParseError {
                        token: self.peek().clone(),
                        message: "Cannot have more than 255 parameters.".to_string(),
                    });
                }

                params.push(self.consume(Type::Identifier, "Expect parameter name.").map(Clone::clone)?);

                if !matches!(self, Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen, "Expect ')' after parameters.")?;
        self.consume(Type::LeftBrace, &format!("Expect '{{' before {kind} body."))?;

        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(Type::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(Type::RightBrace, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if matches!(self, Type::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            match expr.kind {
                ExprKind::Variable(data) => {
                    return Ok(self.expr(ExprKind::Assign(AssignData {
                        name: data.name,
                        value: Box::new(value),
                    })));
                }
                ExprKind::Get(data) => {
                    return Ok(self.expr(ExprKind::Set(SetData {
                        object: data.object,
                        name: data.name,
                        value: Box::new(value),
                    })));
                }
                _ => {
                    self.diagnostics.parse_error(&ParseError {
                        token: equals,
                        message: "Invalid assignment target.".to_string(),
                    });
                    return Ok(expr);
                }
            }
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while matches!(self, Type::Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = self.expr(ExprKind::Logical(LogicalData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }));
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while matches!(self, Type::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = self.expr(ExprKind::Logical(LogicalData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }));
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while matches!(self, Type::BangEqual, Type::EqualEqual) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = self.expr(ExprKind::Binary(BinaryData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }));
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while matches!(self, Type::Greater, Type::GreaterEqual, Type::Less, Type::LessEqual) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = self.expr(ExprKind::Binary(BinaryData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }));
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while matches!(self, Type::Minus, Type::Plus) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = self.expr(ExprKind::Binary(BinaryData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }));
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while matches!(self, Type::Slash, Type::Star) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = self.expr(ExprKind::Binary(BinaryData {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }));
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if matches!(self, Type::Bang, Type::Minus) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(self.expr(ExprKind::Unary(UnaryData { operator, expr: Box::new(right) })));
        }

        self.call()
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(Type::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    self.diagnostics.parse_error(&ParseError {
                        token: self.peek().clone(),
                        message: "Cannot have more than 255 arguments.".to_string(),
                    });
                }

                arguments.push(self.expression()?);

                if !matches!(self, Type::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(Type::RightParen, "Expect ')' after arguments.")?.clone();

        Ok(self.expr(ExprKind::Call(CallData { callee: Box::new(callee), paren, arguments })))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if matches!(self, Type::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if matches!(self, Type::Dot) {
                let name = self.consume(Type::Identifier, "Expect property name after '.'.")?.clone();
                expr = self.expr(ExprKind::Get(GetData { object: Box::new(expr), name }));
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if matches!(self, Type::False) {
            return Ok(self.expr(ExprKind::Literal(Literal::Bool(false))));
        }
        if matches!(self, Type::True) {
            return Ok(self.expr(ExprKind::Literal(Literal::Bool(true))));
        }
        if matches!(self, Type::Nil) {
            return Ok(self.expr(ExprKind::Literal(Literal::Nil)));
        }

        if matches!(self, Type::Number) {
            let value = match &self.previous().literal {
                Some(crate::token::TokenLiteral::Number(n)) => *n,
                _ => unreachable!("NUMBER token always carries a numeric literal"),
            };
            return Ok(self.expr(ExprKind::Literal(Literal::Number(value))));
        }

        if matches!(self, Type::String) {
            let value = match &self.previous().literal {
                Some(crate::token::TokenLiteral::Str(s)) => s.clone(),
                _ => unreachable!("STRING token always carries a string literal"),
            };
            return Ok(self.expr(ExprKind::Literal(Literal::String(value))));
        }

        if matches!(self, Type::Super) {
            let keyword = self.previous().clone();
            self.consume(Type::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(Type::Identifier, "Expect superclass method name.")?.clone();
            return Ok(self.expr(ExprKind::Super(SuperData { keyword, method })));
        }

        if matches!(self, Type::This) {
            let keyword = self.previous().clone();
            return Ok(self.expr(ExprKind::This(ThisData { keyword })));
        }

        if matches!(self, Type::Identifier) {
            let name = self.previous().clone();
            return Ok(self.expr(ExprKind::Variable(VariableData { name })));
        }

        if matches!(self, Type::LeftParen) {
            let inner = self.expression()?;
            self.consume(Type::RightParen, "Expect ')' after expression.")?;
            return Ok(self.expr(ExprKind::Grouping(GroupingData { expr: Box::new(inner) })));
        }

        Err(ParseError { token: self.peek().clone(), message: "Expect expression.".to_string() })
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == Type::Semicolon {
                return;
            }

            match self.peek().kind {
                Type::Class
                | Type::Fun
                | Type::Var
                | Type::For
                | Type::If
                | Type::While
                | Type::Print
                | Type::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source, &mut diagnostics).scan_tokens();
        let statements = Parser::new(tokens, &mut diagnostics).parse();
        (statements, diagnostics)
    }

    #[test]
    fn for_loop_desugars_to_while() {
        let (statements, diagnostics) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!diagnostics.had_error());
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Block(_)));
    }

    #[test]
    fn invalid_assignment_target_reports_but_does_not_abort_parse() {
        let (statements, diagnostics) = parse("1 = 2; print 3;");
        assert!(diagnostics.had_error());
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn malformed_expression_synchronizes_at_next_statement() {
        let (statements, diagnostics) = parse("1 + ; print 2;");
        assert!(diagnostics.had_error());
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn each_occurrence_of_a_name_gets_a_distinct_node_id() {
        let (statements, _) = parse("print a; print a;");
        let ids: Vec<ExprId> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Print(expr) => expr.id,
                _ => unreachable!(),
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
    }
}
