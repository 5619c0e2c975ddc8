use std::collections::HashMap;

use crate::errors::ResolverError;
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

#[derive(PartialEq, Clone, Copy)]
enum FunctionKind {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(PartialEq, Clone, Copy)]
enum ClassKind {
    None,
    Class,
}

/// Static pass between parsing and interpretation: for every variable
/// reference, counts how many enclosing block scopes separate it from its
/// declaration, so the interpreter can jump straight to the right
/// environment frame instead of walking the chain name-by-name.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionKind,
    current_class: ClassKind,
    locals: HashMap<ExprId, usize>,
    errors: Vec<ResolverError>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            locals: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn resolve(mut self, statements: &[Stmt]) -> (HashMap<ExprId, usize>, Vec<ResolverError>) {
        self.resolve_stmts(statements);
        (self.locals, self.errors)
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(ResolverError::new(token.clone(), message.to_string()));
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.error(name, "Already a variable with this name in this scope.");
            }
            self.scopes
                .last_mut()
                .unwrap()
                .insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.locals.insert(id, depth);
                return;
            }
        }
        // Not found in any scope: treat as global, left unresolved.
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }
            Stmt::Class { name, methods } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassKind::Class;

                self.declare(name);
                self.define(name);

                self.begin_scope();
                self.scopes
                    .last_mut()
                    .unwrap()
                    .insert("this".to_string(), true);

                for method in methods {
                    let kind = if method.name.lexeme == "init" {
                        FunctionKind::Initializer
                    } else {
                        FunctionKind::Method
                    };
                    self.resolve_function(method, kind);
                }

                self.end_scope();
                self.current_class = enclosing_class;
            }
            Stmt::Expression(expr) => self.resolve_expr(expr),
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }
                if let Some(value) = value {
                    if self.current_function == FunctionKind::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, &name.lexeme);
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Grouping { expression, .. } => self.resolve_expr(expression),
            Expr::Literal { .. } => {}
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassKind::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, "this");
            }
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Cannot read local variable in its own initializer.");
                    }
                }
                self.resolve_local(*id, &name.lexeme);
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> Vec<ResolverError> {
        let (tokens, _) = Scanner::new(source).scan_tokens();
        let (stmts, parse_errors, _) = Parser::new(&tokens, 0).parse();
        assert!(parse_errors.is_empty(), "{parse_errors:?}");
        Resolver::new().resolve(&stmts).1
    }

    #[test]
    fn top_level_return_is_an_error() {
        let errors = resolve("return 1;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Cannot return from top-level code.");
    }

    #[test]
    fn this_outside_class_is_an_error() {
        let errors = resolve("print this;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Can't use 'this' outside of a class.");
    }

    #[test]
    fn self_referential_initializer_is_an_error() {
        let errors = resolve("var a = a;");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Cannot read local variable in its own initializer."
        );
    }

    #[test]
    fn returning_a_value_from_init_is_an_error() {
        let errors = resolve("class A { init() { return 1; } }");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Cannot return a value from an initializer."
        );
    }

    #[test]
    fn redeclaring_in_same_scope_is_an_error() {
        let errors = resolve("{ var a = 1; var a = 2; }");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Already a variable with this name in this scope."
        );
    }

    #[test]
    fn shadowing_in_nested_scope_is_fine() {
        let errors = resolve("var a = 1; { var a = 2; print a; }");
        assert!(errors.is_empty());
    }
}
