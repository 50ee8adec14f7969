//! Ready-made program trees.
//!
//! Each demo documents the final value of the variables it declares so that
//! hosts and tests can check a run against it.

use super::ast::{call, declare, int, mov, var, Ast, Expr, Statement, Word};

#[derive(Debug, Clone)]
pub struct Demo {
    pub name: &'static str,
    pub ast: Ast<'static>,
    pub expected: Vec<(&'static str, Word)>,
}

/// `x = 2 + 3 * 4`
pub fn arithmetic() -> Demo {
    Demo {
        name: "arithmetic",
        ast: Ast::from(vec![
            declare("x"),
            Statement::assign("x", Expr::add(int(2), Expr::mul(int(3), int(4)))),
        ]),
        expected: vec![("x", 14)],
    }
}

/// `x = 42; y = x` through a move
pub fn move_between_vars() -> Demo {
    Demo {
        name: "move",
        ast: Ast::from(vec![
            declare("x"),
            Statement::assign("x", int(42)),
            declare("y"),
            mov("x", "y"),
        ]),
        expected: vec![("x", 42), ("y", 42)],
    }
}

/// A function bumping a counter, called three times
pub fn counter() -> Demo {
    Demo {
        name: "counter",
        ast: Ast::from(vec![
            declare("counter"),
            Statement::assign("counter", int(0)),
            Statement::func(
                "increment",
                [Statement::assign(
                    "counter",
                    Expr::add(var("counter"), int(1)),
                )],
            ),
            call("increment"),
            call("increment"),
            call("increment"),
        ]),
        expected: vec![("counter", 3)],
    }
}

/// Functions calling each other, with a callee declared after its caller
pub fn nested_calls() -> Demo {
    Demo {
        name: "nested_calls",
        ast: Ast::from(vec![
            declare("total"),
            declare("step"),
            Statement::assign("total", int(1)),
            Statement::assign("step", int(5)),
            Statement::func(
                "bump",
                [Statement::assign("total", Expr::add(var("total"), var("step")))],
            ),
            Statement::func(
                "twice",
                [call("bump"), call("double"), call("bump")],
            ),
            Statement::func(
                "double",
                [Statement::assign("total", Expr::mul(var("total"), int(2)))],
            ),
            call("twice"),
            declare("result"),
            mov("total", "result"),
        ]),
        // ((1 + 5) * 2) + 5
        expected: vec![("total", 17), ("step", 5), ("result", 17)],
    }
}

/// DIV and MOD round toward negative infinity, both folded and at runtime
pub fn floor_division() -> Demo {
    Demo {
        name: "floor_division",
        ast: Ast::from(vec![
            declare("a"),
            declare("b"),
            declare("folded_quot"),
            declare("folded_rem"),
            declare("quot"),
            declare("rem"),
            Statement::assign("a", int(-7)),
            Statement::assign("b", int(2)),
            Statement::assign("folded_quot", Expr::div(int(-7), int(2))),
            Statement::assign("folded_rem", Expr::rem(int(-7), int(2))),
            Statement::assign("quot", Expr::div(var("a"), var("b"))),
            Statement::assign("rem", Expr::rem(var("a"), var("b"))),
        ]),
        expected: vec![
            ("a", -7),
            ("b", 2),
            ("folded_quot", -4),
            ("folded_rem", 1),
            ("quot", -4),
            ("rem", 1),
        ],
    }
}

/// Mixed static and runtime operands sharing temporaries
pub fn mixed_expression() -> Demo {
    Demo {
        name: "mixed_expression",
        ast: Ast::from(vec![
            declare("a"),
            declare("b"),
            declare("c"),
            Statement::assign("a", int(9)),
            Statement::assign("b", Expr::sub(Expr::mul(int(9), int(10)), var("a"))),
            // (9 * 10 + 4 * b) % 100
            Statement::assign(
                "c",
                Expr::rem(
                    Expr::add(Expr::mul(int(9), int(10)), Expr::mul(int(4), var("b"))),
                    int(100),
                ),
            ),
            Statement::assign("a", Expr::sub(var("c"), var("a"))),
        ]),
        expected: vec![("a", 5), ("b", 81), ("c", 14)],
    }
}

pub fn all() -> Vec<Demo> {
    vec![
        arithmetic(),
        move_between_vars(),
        counter(),
        nested_calls(),
        floor_division(),
        mixed_expression(),
    ]
}
