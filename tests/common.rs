use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use lox::errors::{ParserError, ResolverError, RuntimeError};
use lox::expr::ExprId;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::stmt::Stmt;

/// A `Write` sink backed by a `Vec<u8>` that stays readable after the
/// `Box<dyn Write>` has been moved into an `Interpreter`.
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

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is valid utf-8")
    }
}

/// Runs the full scan -> parse -> resolve -> interpret pipeline once, with
/// a fresh interpreter, and hands back every stage's diagnostics plus
/// whatever the program printed, so a test can assert on whichever it
/// cares about.
pub struct RunOutcome {
    pub statements: Vec<Stmt>,
    pub parse_errors: Vec<ParserError>,
    pub resolve_errors: Vec<ResolverError>,
    pub runtime_error: Option<RuntimeError>,
    pub stdout: String,
}

pub fn run(source: &str) -> RunOutcome {
    let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
    assert!(scan_errors.is_empty(), "unexpected scanner errors: {scan_errors:?}");

    let (statements, parse_errors, _next_id): (_, _, ExprId) = Parser::new(&tokens, 0).parse();
    if !parse_errors.is_empty() {
        return RunOutcome {
            statements,
            parse_errors,
            resolve_errors: Vec::new(),
            runtime_error: None,
            stdout: String::new(),
        };
    }

    let (locals, resolve_errors) = Resolver::new().resolve(&statements);
    if !resolve_errors.is_empty() {
        return RunOutcome {
            statements,
            parse_errors,
            resolve_errors,
            runtime_error: None,
            stdout: String::new(),
        };
    }

    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_writer(Box::new(buffer.clone()));
    interpreter.load_locals(locals);
    let runtime_error = interpreter.interpret(&statements, false).err();

    RunOutcome {
        statements,
        parse_errors,
        resolve_errors,
        runtime_error,
        stdout: buffer.contents(),
    }
}
