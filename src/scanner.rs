use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::errors::ScannerError;
use crate::object::Object;
use crate::token::Token;
use crate::token_type::TokenType;

lazy_static! {
    static ref RESERVED_IDENTIFIERS: HashMap<&'static str, TokenType> = HashMap::from([
        ("and", TokenType::AND),
        ("class", TokenType::CLASS),
        ("else", TokenType::ELSE),
        ("false", TokenType::FALSE),
        ("for", TokenType::FOR),
        ("fun", TokenType::FUN),
        ("if", TokenType::IF),
        ("nil", TokenType::NIL),
        ("or", TokenType::OR),
        ("print", TokenType::PRINT),
        ("return", TokenType::RETURN),
        ("this", TokenType::THIS),
        ("true", TokenType::TRUE),
        ("var", TokenType::VAR),
        ("while", TokenType::WHILE),
    ]);
}

pub struct Scanner {
    source: Vec<char>,
    tokens: Vec<Token>,
    errors: Vec<ScannerError>,
    start: usize,
    current: usize,
    line: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            errors: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<ScannerError>) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens
            .push(Token::new(TokenType::EOF, "", None, self.line));
        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenType::LEFT_PAREN),
            ')' => self.add_token(TokenType::RIGHT_PAREN),
            '{' => self.add_token(TokenType::LEFT_BRACE),
            '}' => self.add_token(TokenType::RIGHT_BRACE),
            ',' => self.add_token(TokenType::COMMA),
            '.' => self.add_token(TokenType::DOT),
            '-' => self.add_token(TokenType::MINUS),
            '+' => self.add_token(TokenType::PLUS),
            ';' => self.add_token(TokenType::SEMICOLON),
            '*' => self.add_token(TokenType::STAR),
            '!' => {
                let t = if self.match_next('=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };
                self.add_token(t);
            }
            '=' => {
                let t = if self.match_next('=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };
                self.add_token(t);
            }
            '<' => {
                let t = if self.match_next('=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };
                self.add_token(t);
            }
            '>' => {
                let t = if self.match_next('=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };
                self.add_token(t);
            }
            '/' => {
                if self.match_next('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.scan_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),
            c => self.errors.push(ScannerError::UnexpectedCharacter {
                line: self.line,
                character: c,
            }),
        }
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn peek(&self) -> char {
        *self.source.get(self.current).unwrap_or(&'\0')
    }

    fn peek_next(&self) -> char {
        *self.source.get(self.current + 1).unwrap_or(&'\0')
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, ttype: TokenType) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(ttype, lexeme, None, self.line));
    }

    fn scan_string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.errors
                .push(ScannerError::UnterminatedString { line: self.line });
            return;
        }

        self.advance(); // closing quote
        let value: String = self.source[self.start + 1..self.current - 1]
            .iter()
            .collect();
        self.tokens.push(Token::new(
            TokenType::STRING,
            self.lexeme(),
            Some(Object::Str(value)),
            self.line,
        ));
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme = self.lexeme();
        let value: f64 = lexeme
            .parse()
            .expect("scanned number lexeme is always valid f64 syntax");
        self.tokens.push(Token::new(
            TokenType::NUMBER,
            lexeme,
            Some(Object::Num(value)),
            self.line,
        ));
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let lexeme = self.lexeme();
        let ttype = RESERVED_IDENTIFIERS
            .get(lexeme.as_str())
            .copied()
            .unwrap_or(TokenType::IDENTIFIER);
        self.tokens.push(Token::new(ttype, lexeme, None, self.line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<TokenType> {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty(), "unexpected scanner errors: {errors:?}");
        tokens.into_iter().map(|t| t.ttype).collect()
    }

    #[test]
    fn scans_punctuation_and_operators() {
        let types = scan("() {} , . - + ; * != == <= >= < >");
        assert_eq!(
            types,
            vec![
                TokenType::LEFT_PAREN,
                TokenType::RIGHT_PAREN,
                TokenType::LEFT_BRACE,
                TokenType::RIGHT_BRACE,
                TokenType::COMMA,
                TokenType::DOT,
                TokenType::MINUS,
                TokenType::PLUS,
                TokenType::SEMICOLON,
                TokenType::STAR,
                TokenType::BANG_EQUAL,
                TokenType::EQUAL_EQUAL,
                TokenType::LESS_EQUAL,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::GREATER,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn identifier_continues_through_digits() {
        let (tokens, errors) = Scanner::new("foo1bar2").scan_tokens();
        assert!(errors.is_empty());
        assert_eq!(tokens[0].ttype, TokenType::IDENTIFIER);
        assert_eq!(tokens[0].lexeme, "foo1bar2");
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_, errors) = Scanner::new("\"abc").scan_tokens();
        assert_eq!(errors, vec![ScannerError::UnterminatedString { line: 1 }]);
    }

    #[test]
    fn unexpected_character_is_reported_and_scanning_continues() {
        let (tokens, errors) = Scanner::new("@ 1").scan_tokens();
        assert_eq!(
            errors,
            vec![ScannerError::UnexpectedCharacter {
                line: 1,
                character: '@'
            }]
        );
        assert_eq!(tokens[0].ttype, TokenType::NUMBER);
    }

    #[test]
    fn number_literal_carries_parsed_value() {
        let (tokens, _) = Scanner::new("12.5").scan_tokens();
        assert_eq!(tokens[0].literal, Some(Object::Num(12.5)));
    }

    #[test]
    fn non_ascii_letters_are_not_lexically_significant() {
        let (tokens, errors) = Scanner::new("caf\u{e9}").scan_tokens();
        assert_eq!(tokens[0].ttype, TokenType::IDENTIFIER);
        assert_eq!(tokens[0].lexeme, "caf");
        assert_eq!(
            errors,
            vec![ScannerError::UnexpectedCharacter {
                line: 1,
                character: '\u{e9}'
            }]
        );
    }
}
