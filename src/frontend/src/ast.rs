use derive_more::{Display, From};

pub type Word = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinOp {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
    #[display("%")]
    Mod,
}

#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum Expr<'src> {
    #[from]
    Int(Word),
    #[from]
    Var(&'src str),
    BinOp {
        op: BinOp,
        lhs: Box<Expr<'src>>,
        rhs: Box<Expr<'src>>,
    },
}

impl<'src> Expr<'src> {
    pub fn binop(op: BinOp, lhs: impl Into<Expr<'src>>, rhs: impl Into<Expr<'src>>) -> Self {
        Expr::BinOp {
            op,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn add(lhs: impl Into<Expr<'src>>, rhs: impl Into<Expr<'src>>) -> Self {
        Self::binop(BinOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: impl Into<Expr<'src>>, rhs: impl Into<Expr<'src>>) -> Self {
        Self::binop(BinOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: impl Into<Expr<'src>>, rhs: impl Into<Expr<'src>>) -> Self {
        Self::binop(BinOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: impl Into<Expr<'src>>, rhs: impl Into<Expr<'src>>) -> Self {
        Self::binop(BinOp::Div, lhs, rhs)
    }

    pub fn rem(lhs: impl Into<Expr<'src>>, rhs: impl Into<Expr<'src>>) -> Self {
        Self::binop(BinOp::Mod, lhs, rhs)
    }
}

impl std::fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Expr::Int(value) => write!(f, "{value}"),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::BinOp { op, ref lhs, ref rhs } => write!(f, "({lhs} {op} {rhs})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'src> {
    /// `let name;`
    Let { name: &'src str },
    /// `name = value;`
    Assign { name: &'src str, value: Expr<'src> },
    /// `to = from;` between two declared variables
    Move { from: &'src str, to: &'src str },
    /// `fn name() { body }`
    FuncDecl {
        name: &'src str,
        body: Vec<Statement<'src>>,
    },
    /// `name();`
    Call { name: &'src str },
}

impl<'src> Statement<'src> {
    pub fn assign(name: &'src str, value: impl Into<Expr<'src>>) -> Self {
        Statement::Assign {
            name,
            value: value.into(),
        }
    }

    pub fn func(name: &'src str, body: impl IntoIterator<Item = Statement<'src>>) -> Self {
        Statement::FuncDecl {
            name,
            body: body.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ast<'src> {
    pub statements: Vec<Statement<'src>>,
}

impl<'src> From<Vec<Statement<'src>>> for Ast<'src> {
    fn from(statements: Vec<Statement<'src>>) -> Self {
        Ast { statements }
    }
}

impl<'src> FromIterator<Statement<'src>> for Ast<'src> {
    fn from_iter<I: IntoIterator<Item = Statement<'src>>>(iter: I) -> Self {
        Ast {
            statements: iter.into_iter().collect(),
        }
    }
}

pub fn int<'src>(value: Word) -> Expr<'src> {
    Expr::Int(value)
}

pub fn var(name: &str) -> Expr<'_> {
    Expr::Var(name)
}

pub fn declare(name: &str) -> Statement<'_> {
    Statement::Let { name }
}

pub fn call(name: &str) -> Statement<'_> {
    Statement::Call { name }
}

pub fn mov<'src>(from: &'src str, to: &'src str) -> Statement<'src> {
    Statement::Move { from, to }
}
