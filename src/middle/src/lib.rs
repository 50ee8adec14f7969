pub mod ir;
pub mod listings;
pub mod lowering;

mod assembly;
mod state;

use {derive_more::Display, frontend::ast::Ast};

pub use {
    assembly::Compiled,
    state::{CompileOptions, ReclaimPolicy},
};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum CompileError {
    #[display("{kind} `{name}` is already declared")]
    Redeclaration { name: String, kind: &'static str },
    #[display("unknown variable `{name}`")]
    UnknownName { name: String },
    #[display("call to undefined function `{name}`")]
    UndefinedFunction { name: String },
    #[display("function `{name}` was never given an entry point")]
    UnresolvedFunction { name: String },
    #[display("division by zero while folding `{expr}`")]
    DivisionByZero { expr: String },
    #[display("internal compiler error: {detail}")]
    InternalInvariantViolation { detail: String },
}

impl std::error::Error for CompileError {}

/// Compiles a program tree: top-level statements, then a halt, then every
/// function body, with call sites resolved last.
pub fn compile(ast: &Ast<'_>, options: CompileOptions) -> Result<Compiled, CompileError> {
    assembly::assemble(ast, options)
}

impl TryFrom<&Ast<'_>> for ir::Program {
    type Error = CompileError;

    fn try_from(ast: &Ast<'_>) -> Result<Self, Self::Error> {
        compile(ast, CompileOptions::default()).map(|compiled| compiled.program)
    }
}
