use std::fmt;

use crate::token::Token;
use crate::token_type::TokenType;

#[derive(Debug, Clone, PartialEq)]
pub enum ScannerError {
    UnexpectedCharacter { line: usize, character: char },
    UnterminatedString { line: usize },
}

impl ScannerError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { line, .. } => *line,
            Self::UnterminatedString { line } => *line,
        }
    }
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter { character, .. } => {
                write!(f, "Unexpected character: {character}")
            }
            Self::UnterminatedString { .. } => write!(f, "Unterminated string."),
        }
    }
}

impl std::error::Error for ScannerError {}

fn at(token: &Token) -> String {
    if token.ttype == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// A syntax error raised by the parser or resolver: both report the same
/// shape (`[line N] Error at 'lexeme': message`), so they share this type.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub token: Token,
    pub message: String,
}

impl SyntaxError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        Self {
            token,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}] Error{}: {}",
            self.token.line,
            at(&self.token),
            self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

pub type ParserError = SyntaxError;
pub type ResolverError = SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        Self {
            token,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n[line {}]", self.message, self.token.line)
    }
}

impl std::error::Error for RuntimeError {}

/// Non-local control flow produced while executing a statement: either a
/// genuine runtime error, or a `return` unwinding to the nearest
/// `LoxFunction::call`.
#[derive(Debug, Clone)]
pub enum Unwind {
    Return(crate::object::Object),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(e: RuntimeError) -> Self {
        Unwind::Error(e)
    }
}
