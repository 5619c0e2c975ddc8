use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::environment::Environment;
use crate::errors::{RuntimeError, Unwind};
use crate::expr::{Expr, ExprId};
use crate::lox_callable::LoxCallable;
use crate::lox_class::LoxClass;
use crate::lox_function::LoxFunction;
use crate::lox_instance::LoxInstance;
use crate::lox_native::NativeFunction;
use crate::native_functions::NativeClock;
use crate::object::Object;
use crate::stmt::Stmt;
use crate::token::Token;
use crate::token_type::TokenType;

/// Walks the parsed tree directly (no visitor indirection): `evaluate`
/// dispatches on `Expr`, `execute` on `Stmt`. Holds the global environment
/// plus the current frame, and the resolver's `ExprId -> scope depth` map
/// used to jump straight to the right frame for local variable access.
pub struct Interpreter {
    pub globals: Environment,
    environment: Environment,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Builds an interpreter that writes `print` output (and the REPL's
    /// `=> value` echo) to `out` instead of stdout — lets tests capture
    /// what the program actually printed rather than only checking that it
    /// ran without error.
    pub fn with_writer(out: Box<dyn Write>) -> Self {
        let globals = Environment::new();
        globals.define(
            "clock",
            Object::Native(Rc::new(NativeFunction::new("clock", Rc::new(NativeClock)))),
        );
        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Merges freshly resolved distances into the running map rather than
    /// replacing it, so a closure created on an earlier REPL line keeps
    /// resolving correctly after a later line is resolved.
    pub fn load_locals(&mut self, locals: HashMap<ExprId, usize>) {
        self.locals.extend(locals);
    }

    pub fn interpret(&mut self, statements: &[Stmt], repl: bool) -> Result<(), RuntimeError> {
        for statement in statements {
            if repl {
                if let Stmt::Expression(expr) = statement {
                    match self.evaluate(expr) {
                        Ok(value) => writeln!(self.out, "=> {value}")
                            .expect("write to interpreter output should not fail"),
                        Err(e) => return Err(e),
                    }
                    continue;
                }
            }
            match self.execute(statement) {
                Ok(()) => {}
                Err(Unwind::Error(e)) => return Err(e),
                Err(Unwind::Return(_)) => unreachable!("return outside function body"),
            }
        }
        Ok(())
    }

    // ---- statements ----

    pub fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Block(statements) => {
                let env = Environment::with_enclosing(&self.environment);
                self.execute_block(statements, env)
            }
            Stmt::Class { name, methods } => {
                self.environment.define(&name.lexeme, Object::Nil);

                let mut method_map = HashMap::new();
                for method in methods {
                    let function = LoxFunction::new(
                        Rc::clone(method),
                        self.environment.clone(),
                        method.name.lexeme == "init",
                    );
                    method_map.insert(method.name.lexeme.clone(), Rc::new(function));
                }

                let class = LoxClass::new(name.lexeme.clone(), method_map);
                self.environment
                    .assign(name, Object::Class(Rc::new(class)))?;
                Ok(())
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Function(decl) => {
                let function = LoxFunction::new(Rc::clone(decl), self.environment.clone(), false);
                self.environment
                    .define(&decl.name.lexeme, Object::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{value}").expect("write to interpreter output should not fail");
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                self.environment.define(&name.lexeme, value);
                Ok(())
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
        }
    }

    /// Runs `statements` in `env`, restoring the caller's environment on
    /// every exit path (including an error or a return unwinding through).
    pub fn execute_block(&mut self, statements: &[Stmt], env: Environment) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));
        self.environment = previous;
        result
    }

    // ---- expressions ----

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Object, RuntimeError> {
        match expr {
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => self.environment.assign_at(distance, name, value.clone()),
                    None => self.globals.assign(name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => self.evaluate_binary(operator, left, right),
            Expr::Call {
                callee,
                paren,
                arguments,
                ..
            } => self.evaluate_call(callee, paren, arguments),
            Expr::Get { object, name, .. } => {
                let object = self.evaluate(object)?;
                match object {
                    Object::Instance(instance) => {
                        let value = instance.borrow().get(name, &instance)?;
                        Ok(value)
                    }
                    _ => Err(RuntimeError::new(
                        name.clone(),
                        "Only instances have properties.".to_string(),
                    )),
                }
            }
            Expr::Grouping { expression, .. } => self.evaluate(expression),
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                if operator.ttype == TokenType::OR {
                    if left.is_truthy() {
                        return Ok(left);
                    }
                } else if !left.is_truthy() {
                    return Ok(left);
                }
                self.evaluate(right)
            }
            Expr::Set {
                object,
                name,
                value,
                ..
            } => {
                let object = self.evaluate(object)?;
                match object {
                    Object::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(RuntimeError::new(
                        name.clone(),
                        "Only instances have fields.".to_string(),
                    )),
                }
            }
            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),
            Expr::Unary {
                operator, right, ..
            } => {
                let right = self.evaluate(right)?;
                match operator.ttype {
                    TokenType::MINUS => match right {
                        Object::Num(n) => Ok(Object::Num(-n)),
                        _ => Err(RuntimeError::new(
                            operator.clone(),
                            "Operand must be a number.".to_string(),
                        )),
                    },
                    TokenType::BANG => Ok(Object::Bool(!right.is_truthy())),
                    _ => unreachable!("unary operator is always '-' or '!'"),
                }
            }
            Expr::Variable { id, name } => self.lookup_variable(*id, name),
        }
    }

    fn lookup_variable(&self, id: ExprId, name: &Token) -> Result<Object, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(self.environment.get_at(distance, &name.lexeme)),
            None => self.globals.get(name),
        }
    }

    fn evaluate_binary(
        &mut self,
        operator: &Token,
        left: &Expr,
        right: &Expr,
    ) -> Result<Object, RuntimeError> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.ttype {
            TokenType::MINUS => match (left, right) {
                (Object::Num(a), Object::Num(b)) => Ok(Object::Num(a - b)),
                _ => Err(number_operands_error(operator)),
            },
            TokenType::SLASH => match (left, right) {
                (Object::Num(a), Object::Num(b)) => Ok(Object::Num(a / b)),
                _ => Err(number_operands_error(operator)),
            },
            TokenType::STAR => match (left, right) {
                (Object::Num(a), Object::Num(b)) => Ok(Object::Num(a * b)),
                _ => Err(number_operands_error(operator)),
            },
            TokenType::PLUS => match (left, right) {
                (Object::Num(a), Object::Num(b)) => Ok(Object::Num(a + b)),
                (Object::Str(a), Object::Str(b)) => Ok(Object::Str(a + &b)),
                _ => Err(RuntimeError::new(
                    operator.clone(),
                    "Operands must be two numbers or two strings.".to_string(),
                )),
            },
            TokenType::GREATER => match (left, right) {
                (Object::Num(a), Object::Num(b)) => Ok(Object::Bool(a > b)),
                _ => Err(number_operands_error(operator)),
            },
            TokenType::GREATER_EQUAL => match (left, right) {
                (Object::Num(a), Object::Num(b)) => Ok(Object::Bool(a >= b)),
                _ => Err(number_operands_error(operator)),
            },
            TokenType::LESS => match (left, right) {
                (Object::Num(a), Object::Num(b)) => Ok(Object::Bool(a < b)),
                _ => Err(number_operands_error(operator)),
            },
            TokenType::LESS_EQUAL => match (left, right) {
                (Object::Num(a), Object::Num(b)) => Ok(Object::Bool(a <= b)),
                _ => Err(number_operands_error(operator)),
            },
            TokenType::BANG_EQUAL => Ok(Object::Bool(left != right)),
            TokenType::EQUAL_EQUAL => Ok(Object::Bool(left == right)),
            _ => unreachable!("binary operator is always one of the above"),
        }
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        arguments: &[Expr],
    ) -> Result<Object, RuntimeError> {
        let callee = self.evaluate(callee)?;

        let mut evaluated = Vec::with_capacity(arguments.len());
        for argument in arguments {
            evaluated.push(self.evaluate(argument)?);
        }

        match callee {
            Object::Function(function) => self.call_checked(function.as_ref(), paren, evaluated),
            Object::Native(native) => self.call_checked(native.as_ref(), paren, evaluated),
            Object::Class(class) => self.call_class(class, paren, evaluated),
            _ => Err(RuntimeError::new(
                paren.clone(),
                "Can only call functions and classes.".to_string(),
            )),
        }
    }

    fn call_checked(
        &mut self,
        callable: &dyn LoxCallable,
        paren: &Token,
        arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError> {
        if arguments.len() != callable.arity() {
            return Err(RuntimeError::new(
                paren.clone(),
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }
        callable.call(self, arguments)
    }

    fn call_class(
        &mut self,
        class: Rc<LoxClass>,
        paren: &Token,
        arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError> {
        if arguments.len() != class.arity() {
            return Err(RuntimeError::new(
                paren.clone(),
                format!(
                    "Expected {} arguments but got {}.",
                    class.arity(),
                    arguments.len()
                ),
            ));
        }

        let instance = Rc::new(std::cell::RefCell::new(LoxInstance::new(Rc::clone(&class))));
        if let Some(initializer) = class.find_method("init") {
            let bound = initializer.bind(Rc::clone(&instance));
            bound.call(self, arguments)?;
        }
        Ok(Object::Instance(instance))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn number_operands_error(operator: &Token) -> RuntimeError {
    RuntimeError::new(operator.clone(), "Operands must be numbers.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    /// A `Write` sink backed by a `Vec<u8>` that stays readable after the
    /// `Box<dyn Write>` has been moved into an `Interpreter`.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<std::cell::RefCell<Vec<u8>>>);

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

    fn run(source: &str) -> Interpreter {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        assert!(scan_errors.is_empty(), "{scan_errors:?}");
        let (stmts, parse_errors, _) = Parser::new(&tokens, 0).parse();
        assert!(parse_errors.is_empty(), "{parse_errors:?}");
        let (locals, resolve_errors) = Resolver::new().resolve(&stmts);
        assert!(resolve_errors.is_empty(), "{resolve_errors:?}");
        let mut interpreter = Interpreter::new();
        interpreter.load_locals(locals);
        interpreter.interpret(&stmts, false).expect("no runtime error");
        interpreter
    }

    fn run_capturing(source: &str) -> String {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        assert!(scan_errors.is_empty(), "{scan_errors:?}");
        let (stmts, parse_errors, _) = Parser::new(&tokens, 0).parse();
        assert!(parse_errors.is_empty(), "{parse_errors:?}");
        let (locals, resolve_errors) = Resolver::new().resolve(&stmts);
        assert!(resolve_errors.is_empty(), "{resolve_errors:?}");
        let buffer = SharedBuffer::default();
        let mut interpreter = Interpreter::with_writer(Box::new(buffer.clone()));
        interpreter.load_locals(locals);
        interpreter.interpret(&stmts, false).expect("no runtime error");
        buffer.contents()
    }

    #[test]
    fn print_writes_the_stringified_value_to_the_interpreter_output() {
        assert_eq!(run_capturing("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn arithmetic_and_string_concatenation() {
        let mut interpreter = Interpreter::new();
        let (tokens, _) = Scanner::new("1 + 2").scan_tokens();
        let (stmts, _, _) = Parser::new(&tokens, 0).parse();
        let Stmt::Expression(expr) = &stmts[0] else {
            panic!("expected expression statement");
        };
        assert_eq!(interpreter.evaluate(expr).unwrap(), Object::Num(3.0));
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let source = r#"
            fun makeCounter() {
                var count = 0;
                fun counter() {
                    count = count + 1;
                    return count;
                }
                return counter;
            }
            var counter = makeCounter();
            var a = counter();
            var b = counter();
        "#;
        let interpreter = run(source);
        let a = interpreter.globals.get(&Token::new(
            TokenType::IDENTIFIER,
            "a",
            None,
            1,
        ));
        let b = interpreter.globals.get(&Token::new(
            TokenType::IDENTIFIER,
            "b",
            None,
            1,
        ));
        assert_eq!(a.unwrap(), Object::Num(1.0));
        assert_eq!(b.unwrap(), Object::Num(2.0));
    }

    #[test]
    fn class_methods_see_this() {
        let source = r#"
            class Counter {
                init() {
                    this.count = 0;
                }
                increment() {
                    this.count = this.count + 1;
                    return this.count;
                }
            }
            var c = Counter();
            var first = c.increment();
            var second = c.increment();
        "#;
        let interpreter = run(source);
        let first = interpreter
            .globals
            .get(&Token::new(TokenType::IDENTIFIER, "first", None, 1));
        let second = interpreter
            .globals
            .get(&Token::new(TokenType::IDENTIFIER, "second", None, 1));
        assert_eq!(first.unwrap(), Object::Num(1.0));
        assert_eq!(second.unwrap(), Object::Num(2.0));
    }

    #[test]
    fn adding_number_and_string_is_a_runtime_error() {
        let (tokens, _) = Scanner::new("1 + \"a\";").scan_tokens();
        let (stmts, _, _) = Parser::new(&tokens, 0).parse();
        let mut interpreter = Interpreter::new();
        let err = interpreter.interpret(&stmts, false).unwrap_err();
        assert_eq!(err.message, "Operands must be two numbers or two strings.");
    }
}
