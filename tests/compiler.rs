use {
    backend::{Execute, DEFAULT_MEMORY_SIZE},
    frontend::ast::{call, declare, int, mov, var, Ast, Expr, Statement},
    middle::{ir, CompileError, CompileOptions, ReclaimPolicy},
    rstest::rstest,
};

fn run(ast: &Ast, reclaim: ReclaimPolicy) -> Vec<(String, i64)> {
    let compiled = middle::compile(ast, CompileOptions { reclaim }).unwrap();
    let memory = compiled.program.execute(DEFAULT_MEMORY_SIZE).unwrap();
    compiled
        .variables
        .iter()
        .filter_map(|(name, &address)| Some((name.clone(), memory.peek(address)?)))
        .collect()
}

#[test]
fn arithmetic_assignment() {
    let ast = Ast::from(vec![
        declare("x"),
        Statement::assign("x", Expr::add(int(2), Expr::mul(int(3), int(4)))),
    ]);
    let program = ir::Program::try_from(&ast).unwrap();
    // folded into a single set, copied into x, then halt
    assert_eq!(program.len(), 3);
    assert_eq!(
        program.get(1),
        Some(&ir::Instruction::Set { dst: 2, value: 14 })
    );
    assert_eq!(run(&ast, ReclaimPolicy::Monotonic), [("x".to_owned(), 14)]);
}

#[test]
fn move_copies_value() {
    let ast = Ast::from(vec![
        declare("x"),
        Statement::assign("x", int(-3)),
        declare("y"),
        mov("x", "y"),
    ]);
    assert_eq!(
        run(&ast, ReclaimPolicy::Monotonic),
        [("x".to_owned(), -3), ("y".to_owned(), -3)]
    );
}

#[rstest]
#[case(ReclaimPolicy::Monotonic)]
#[case(ReclaimPolicy::Reuse)]
fn temporaries_never_clobber_variables(#[case] reclaim: ReclaimPolicy) {
    let ast = Ast::from(vec![
        declare("a"),
        declare("b"),
        Statement::assign("a", int(3)),
        Statement::assign("b", Expr::mul(var("a"), Expr::add(var("a"), int(1)))),
        declare("c"),
        Statement::assign(
            "c",
            Expr::sub(
                Expr::mul(Expr::add(var("b"), int(2)), Expr::add(var("a"), var("b"))),
                Expr::div(var("b"), Expr::add(int(1), int(2))),
            ),
        ),
        Statement::assign("a", Expr::rem(var("c"), int(10))),
    ]);
    // b = 12, c = 14 * 15 - 4 = 206, a = 6
    assert_eq!(
        run(&ast, reclaim),
        [
            ("a".to_owned(), 6),
            ("b".to_owned(), 12),
            ("c".to_owned(), 206)
        ]
    );
}

#[test]
fn variable_read_before_assignment_fails_at_runtime() {
    let ast = Ast::from(vec![
        declare("x"),
        declare("y"),
        Statement::assign("y", Expr::add(var("x"), int(1))),
    ]);
    let program = ir::Program::try_from(&ast).unwrap();
    assert_eq!(
        program.execute(DEFAULT_MEMORY_SIZE),
        Err(backend::MachineError::UninitializedRead { address: 1 })
    );
}

#[rstest]
#[case::redeclared_variable(
    vec![declare("x"), declare("x")],
    CompileError::Redeclaration { name: "x".to_owned(), kind: "variable" }
)]
#[case::assign_to_unknown(
    vec![Statement::assign("x", int(1))],
    CompileError::UnknownName { name: "x".to_owned() }
)]
#[case::read_unknown(
    vec![declare("x"), Statement::assign("x", var("y"))],
    CompileError::UnknownName { name: "y".to_owned() }
)]
#[case::move_from_unknown(
    vec![declare("y"), mov("x", "y")],
    CompileError::UnknownName { name: "x".to_owned() }
)]
#[case::call_before_declaration(
    vec![call("f"), Statement::func("f", [])],
    CompileError::UndefinedFunction { name: "f".to_owned() }
)]
#[case::folded_division_by_zero(
    vec![declare("x"), Statement::assign("x", Expr::div(int(1), int(0)))],
    CompileError::DivisionByZero { expr: "(1 / 0)".to_owned() }
)]
fn compile_errors(#[case] statements: Vec<Statement<'static>>, #[case] expected: CompileError) {
    let ast = Ast::from(statements);
    assert_eq!(
        middle::compile(&ast, CompileOptions::default()).unwrap_err(),
        expected
    );
}

#[test]
fn function_called_from_several_sites_returns_to_each() {
    let ast = Ast::from(vec![
        declare("log"),
        Statement::assign("log", int(0)),
        Statement::func(
            "shift",
            [Statement::assign("log", Expr::mul(var("log"), int(10)))],
        ),
        Statement::assign("log", Expr::add(var("log"), int(1))),
        call("shift"),
        Statement::assign("log", Expr::add(var("log"), int(2))),
        call("shift"),
        Statement::assign("log", Expr::add(var("log"), int(3))),
    ]);
    assert_eq!(run(&ast, ReclaimPolicy::Monotonic), [("log".to_owned(), 123)]);
}

#[test]
fn listing_uses_mnemonics() {
    let ast = Ast::from(vec![
        declare("x"),
        Statement::assign("x", Expr::add(var("x"), int(1))),
    ]);
    let program = ir::Program::try_from(&ast).unwrap();
    assert_eq!(
        program.to_string(),
        "1: set  @2, 1\n2: math add @1, @2, @3\n3: mov  @3, @1\n4: halt\n"
    );
    assert_eq!(program.encode()[1].to_string(), "I: 4 0: 1 1: 1 2: 2 3: 3");
}
