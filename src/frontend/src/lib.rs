pub mod ast;
pub mod demos;
