use std::rc::Rc;

use crate::errors::ParserError;
use crate::expr::{Expr, ExprId};
use crate::object::Object;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;
use crate::token_type::TokenType;

const MAX_ARGS: usize = 8;

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    id_counter: ExprId,
    errors: Vec<ParserError>,
}

impl<'a> Parser<'a> {
    /// `start_id` lets the driver keep expression ids monotonic across a
    /// whole REPL session (not just within one parse), so closures captured
    /// on one line keep resolving correctly after later lines are parsed.
    pub fn new(tokens: &'a [Token], start_id: ExprId) -> Self {
        Parser {
            tokens,
            current: 0,
            id_counter: start_id,
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> (Vec<Stmt>, Vec<ParserError>, ExprId) {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        (statements, self.errors, self.id_counter)
    }

    fn next_id(&mut self) -> ExprId {
        let id = self.id_counter;
        self.id_counter += 1;
        id
    }

    // ---- declarations ----

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_token(&[TokenType::CLASS]) {
            self.class_declaration()
        } else if self.match_token(&[TokenType::FUN]) {
            self.function(String::from("function"))
                .map(|decl| Stmt::Function(Rc::new(decl)))
        } else if self.match_token(&[TokenType::VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt, ParserError> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;
        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(Rc::new(self.function(String::from("method"))?));
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;
        Ok(Stmt::Class { name, methods })
    }

    fn function(&mut self, kind: String) -> Result<FunctionDecl, ParserError> {
        let name = self.consume(TokenType::IDENTIFIER, &format!("Expect {kind} name."))?;
        self.consume(TokenType::LEFT_PAREN, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.errors.push(ParserError::new(
                        self.peek(),
                        format!("Can't have more than {MAX_ARGS} parameters."),
                    ));
                }
                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);
                if !self.match_token(&[TokenType::COMMA]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(TokenType::LEFT_BRACE, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(FunctionDecl { name, params, body })
    }

    fn var_declaration(&mut self) -> Result<Stmt, ParserError> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;
        let initializer = if self.match_token(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    // ---- statements ----

    fn statement(&mut self) -> Result<Stmt, ParserError> {
        if self.match_token(&[TokenType::FOR]) {
            return self.for_statement();
        }
        if self.match_token(&[TokenType::IF]) {
            return self.if_statement();
        }
        if self.match_token(&[TokenType::PRINT]) {
            return self.print_statement();
        }
        if self.match_token(&[TokenType::RETURN]) {
            return self.return_statement();
        }
        if self.match_token(&[TokenType::WHILE]) {
            return self.while_statement();
        }
        if self.match_token(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expression_statement()
    }

    fn for_statement(&mut self) -> Result<Stmt, ParserError> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if self.match_token(&[TokenType::SEMICOLON]) {
            None
        } else if self.match_token(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or_else(|| Expr::Literal {
            id: self.next_id(),
            value: Object::Bool(true),
        });
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt, ParserError> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_token(&[TokenType::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, ParserError> {
        let value = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt, ParserError> {
        let keyword = self.previous();
        let value = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt, ParserError> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParserError> {
        let mut statements = Vec::new();
        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParserError> {
        let expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // ---- expressions ----

    fn expression(&mut self) -> Result<Expr, ParserError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParserError> {
        let expr = self.or_expr()?;

        if self.match_token(&[TokenType::EQUAL]) {
            let equals = self.previous();
            let value = self.assignment()?;
            let id = self.next_id();

            return Ok(match expr {
                Expr::Variable { name, .. } => Expr::Assign {
                    id,
                    name,
                    value: Box::new(value),
                },
                Expr::Get { object, name, .. } => Expr::Set {
                    id,
                    object,
                    name,
                    value: Box::new(value),
                },
                other => {
                    self.errors
                        .push(ParserError::new(equals, "Invalid assignment target."));
                    other
                }
            });
        }

        Ok(expr)
    }

    fn or_expr(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.and_expr()?;
        while self.match_token(&[TokenType::OR]) {
            let operator = self.previous();
            let right = self.and_expr()?;
            expr = Expr::Logical {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.equality()?;
        while self.match_token(&[TokenType::AND]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = Expr::Logical {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.comparison()?;
        while self.match_token(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator = self.previous();
            let right = self.comparison()?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.term()?;
        while self.match_token(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator = self.previous();
            let right = self.term()?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.factor()?;
        while self.match_token(&[TokenType::MINUS, TokenType::PLUS]) {
            let operator = self.previous();
            let right = self.factor()?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.unary()?;
        while self.match_token(&[TokenType::SLASH, TokenType::STAR]) {
            let operator = self.previous();
            let right = self.unary()?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParserError> {
        if self.match_token(&[TokenType::BANG, TokenType::MINUS]) {
            let operator = self.previous();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                id: self.next_id(),
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.primary()?;
        loop {
            if self.match_token(&[TokenType::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(&[TokenType::DOT]) {
                let name = self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;
                expr = Expr::Get {
                    id: self.next_id(),
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParserError> {
        let mut arguments = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    self.errors.push(ParserError::new(
                        self.peek(),
                        format!("Can't have more than {MAX_ARGS} arguments."),
                    ));
                }
                arguments.push(self.expression()?);
                if !self.match_token(&[TokenType::COMMA]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;
        Ok(Expr::Call {
            id: self.next_id(),
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr, ParserError> {
        if self.match_token(&[TokenType::FALSE]) {
            return Ok(self.literal(Object::Bool(false)));
        }
        if self.match_token(&[TokenType::TRUE]) {
            return Ok(self.literal(Object::Bool(true)));
        }
        if self.match_token(&[TokenType::NIL]) {
            return Ok(self.literal(Object::Nil));
        }
        if self.match_token(&[TokenType::NUMBER, TokenType::STRING]) {
            let value = self
                .previous()
                .literal
                .clone()
                .expect("scanner always attaches a literal to NUMBER/STRING tokens");
            return Ok(self.literal(value));
        }
        if self.match_token(&[TokenType::THIS]) {
            let keyword = self.previous();
            return Ok(Expr::This {
                id: self.next_id(),
                keyword,
            });
        }
        if self.match_token(&[TokenType::IDENTIFIER]) {
            let name = self.previous();
            return Ok(Expr::Variable {
                id: self.next_id(),
                name,
            });
        }
        if self.match_token(&[TokenType::LEFT_PAREN]) {
            let expression = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping {
                id: self.next_id(),
                expression: Box::new(expression),
            });
        }

        Err(ParserError::new(self.peek(), "Expect expression."))
    }

    fn literal(&mut self, value: Object) -> Expr {
        Expr::Literal {
            id: self.next_id(),
            value,
        }
    }

    // ---- token-stream helpers ----

    fn match_token(&mut self, types: &[TokenType]) -> bool {
        for &ttype in types {
            if self.check(ttype) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, ttype: TokenType) -> bool {
        !self.is_at_end() && self.peek().ttype == ttype
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().ttype == TokenType::EOF
    }

    fn peek(&self) -> Token {
        self.tokens[self.current].clone()
    }

    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token, ParserError> {
        if self.check(ttype) {
            return Ok(self.advance());
        }
        Err(ParserError::new(self.peek(), message))
    }

    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().ttype == TokenType::SEMICOLON {
                return;
            }
            match self.peek().ttype {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<ParserError>) {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        assert!(scan_errors.is_empty());
        let (stmts, errors, _) = Parser::new(&tokens, 0).parse();
        (stmts, errors)
    }

    #[test]
    fn parses_var_declaration() {
        let (stmts, errors) = parse("var a = 1 + 2;");
        assert!(errors.is_empty());
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Var { .. }));
    }

    #[test]
    fn reinterprets_assignment_target() {
        let (stmts, errors) = parse("a = 2;");
        assert!(errors.is_empty());
        match &stmts[0] {
            Stmt::Expression(Expr::Assign { name, .. }) => assert_eq!(name.lexeme, "a"),
            other => panic!("expected assign expression, got {other:?}"),
        }
    }

    #[test]
    fn invalid_assignment_target_reports_and_continues() {
        let (stmts, errors) = parse("1 = 2;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid assignment target.");
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn desugars_for_loop_to_while() {
        let (stmts, errors) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(errors.is_empty());
        match &stmts[0] {
            Stmt::Block(inner) => {
                assert!(matches!(inner[0], Stmt::Var { .. }));
                assert!(matches!(inner[1], Stmt::While { .. }));
            }
            other => panic!("expected desugared block, got {other:?}"),
        }
    }

    #[test]
    fn missing_semicolon_is_a_parse_error_and_synchronizes() {
        let (stmts, errors) = parse("var a = 1\nvar b = 2;");
        assert_eq!(errors.len(), 1);
        assert_eq!(stmts.len(), 1);
    }
}
