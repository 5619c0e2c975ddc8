use std::fs;
use std::io::{self, Write};

use crate::expr::ExprId;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Owns the pipeline end to end: one `Interpreter` lives for the whole
/// process so that global state (and, in the REPL, closures from earlier
/// lines) survives across runs of `run`.
pub struct Lox {
    interpreter: Interpreter,
    next_expr_id: ExprId,
    had_error: bool,
    had_runtime_error: bool,
}

impl Lox {
    pub fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
            next_expr_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn run_file(mut self, path: &str) -> i32 {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Unable to read file '{path}': {e}");
                return 66;
            }
        };
        self.run(&source, false);

        if self.had_error {
            65
        } else if self.had_runtime_error {
            70
        } else {
            0
        }
    }

    pub fn run_prompt(mut self) -> io::Result<()> {
        let stdin = io::stdin();
        loop {
            print!("> ");
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                println!();
                return Ok(());
            }

            self.run(&line, true);
            self.had_error = false;
            self.had_runtime_error = false;
        }
    }

    fn run(&mut self, source: &str, repl: bool) {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        for error in &scan_errors {
            eprintln!("[line {}] Error: {error}", error.line());
        }
        if !scan_errors.is_empty() {
            self.had_error = true;
            return;
        }

        let (statements, parse_errors, next_id) = Parser::new(&tokens, self.next_expr_id).parse();
        self.next_expr_id = next_id;
        for error in &parse_errors {
            eprintln!("{error}");
        }
        if !parse_errors.is_empty() {
            self.had_error = true;
            return;
        }

        let (locals, resolve_errors) = Resolver::new().resolve(&statements);
        for error in &resolve_errors {
            eprintln!("{error}");
        }
        if !resolve_errors.is_empty() {
            self.had_error = true;
            return;
        }
        self.interpreter.load_locals(locals);

        if let Err(e) = self.interpreter.interpret(&statements, repl) {
            eprintln!("{e}");
            self.had_runtime_error = true;
        }
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
