use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// A function or method declaration. `Rc`-wrapped so `LoxFunction` values
/// (and every closure created each time the declaration is evaluated) can
/// share the same parsed body instead of cloning the statement tree.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Class {
        name: Token,
        methods: Vec<Rc<FunctionDecl>>,
    },
    Expression(Expr),
    Function(Rc<FunctionDecl>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Print(Expr),
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}
