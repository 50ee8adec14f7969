use {
    super::{
        ir::{self, Address, Instruction, Word},
        state::{CompileOptions, CompileState, Emitted},
        CompileError,
    },
    frontend::ast,
    std::collections::BTreeMap,
};

/// The result of compiling a program tree.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub program: ir::Program,
    /// Address of every declared variable.
    pub variables: BTreeMap<String, Address>,
    /// Highest address the program touches.
    pub memory_used: Address,
}

impl Compiled {
    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.variables.get(name).copied()
    }
}

fn count_functions(statements: &[ast::Statement]) -> usize {
    statements
        .iter()
        .map(|statement| match statement {
            ast::Statement::FuncDecl { body, .. } => 1 + count_functions(body),
            _ => 0,
        })
        .sum()
}

pub(crate) fn assemble<'src>(
    ast: &'src ast::Ast<'src>,
    options: CompileOptions,
) -> Result<Compiled, CompileError> {
    let mut state = CompileState::new(options);

    // entry table, filled in once every body has been placed
    for _ in 0..count_functions(&ast.statements) {
        state.emit(Emitted::EntrySlot);
    }

    for statement in &ast.statements {
        state.compile_statement(statement)?;
    }
    state.emit(Instruction::Halt);

    // bodies may declare further functions, which join the back of the queue
    let mut next_func = 0;
    while let Some(name) = state.nth_func(next_func) {
        let entry = state.next_index();
        let record = state.func_mut(name)?;
        record.entry = Some(entry);
        let (body, return_cell) = (record.body, record.return_cell);
        for statement in body {
            state.compile_statement(statement)?;
        }
        state.emit(Instruction::Jump {
            target: return_cell,
        });
        next_func += 1;
    }

    let program = fix_up(&state)?;
    Ok(Compiled {
        program,
        variables: state
            .vars()
            .map(|(name, address)| (name.to_owned(), address))
            .collect(),
        memory_used: state.allocator.high_water() - 1,
    })
}

/// Rewrites every placeholder now that all entry indices are known.
fn fix_up(state: &CompileState) -> Result<ir::Program, CompileError> {
    let mut slots_filled = 0;
    let instructions = state
        .instructions
        .iter()
        .map(|emitted| -> Result<Instruction, CompileError> {
            match *emitted {
                Emitted::Resolved(instruction) => Ok(instruction),
                Emitted::CallPlaceholder { function } => {
                    let record = state.func(function)?;
                    match record.entry {
                        Some(_) => Ok(Instruction::Jump {
                            target: record.entry_cell,
                        }),
                        None => Err(CompileError::UnresolvedFunction {
                            name: function.to_owned(),
                        }),
                    }
                }
                Emitted::EntrySlot => {
                    let name = state.nth_func(slots_filled).ok_or_else(|| {
                        CompileError::InternalInvariantViolation {
                            detail: format!("entry slot {} has no function", slots_filled + 1),
                        }
                    })?;
                    slots_filled += 1;
                    let record = state.func(name)?;
                    let entry = record.entry.ok_or_else(|| CompileError::UnresolvedFunction {
                        name: name.to_owned(),
                    })?;
                    Ok(Instruction::Set {
                        dst: record.entry_cell,
                        value: entry as Word,
                    })
                }
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(name) = state.nth_func(slots_filled) {
        return Err(CompileError::InternalInvariantViolation {
            detail: format!("function `{name}` has no entry slot"),
        });
    }

    Ok(ir::Program::from(instructions))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        frontend::ast::{call, declare, int, var, Expr, Statement},
    };

    fn compile(ast: &ast::Ast) -> Result<Compiled, CompileError> {
        assemble(ast, CompileOptions::default())
    }

    #[test]
    fn plain_program_ends_in_halt() {
        let ast = ast::Ast::from(vec![declare("x"), Statement::assign("x", int(3))]);
        let compiled = compile(&ast).unwrap();
        let x = compiled.address_of("x").unwrap();
        assert_eq!(
            compiled.program.instructions,
            [
                Instruction::Set { dst: 2, value: 3 },
                Instruction::Move { src: 2, dst: x },
                Instruction::Halt,
            ]
        );
        assert_eq!(compiled.memory_used, 2);
    }

    #[test]
    fn calls_resolve_through_entry_table() {
        let ast = ast::Ast::from(vec![
            declare("n"),
            Statement::func("f", [Statement::assign("n", Expr::add(var("n"), int(1)))]),
            Statement::assign("n", int(0)),
            call("f"),
        ]);
        let compiled = compile(&ast).unwrap();
        // n = 1, f's return cell = 2, f's entry cell = 3, temporaries after
        let listing = &compiled.program.instructions;
        assert_eq!(listing[0], Instruction::Set { dst: 3, value: 7 });
        assert_eq!(listing[3], Instruction::Set { dst: 2, value: 6 });
        assert_eq!(listing[4], Instruction::Jump { target: 3 });
        assert_eq!(listing[5], Instruction::Halt);
        assert_eq!(*listing.last().unwrap(), Instruction::Jump { target: 2 });
        assert_eq!(listing.len(), 10);
    }

    #[test]
    fn functions_may_be_declared_inside_bodies() {
        let ast = ast::Ast::from(vec![
            Statement::func("outer", [Statement::func("inner", []), call("inner")]),
            call("outer"),
        ]);
        let compiled = compile(&ast).unwrap();
        let sets = compiled.program.instructions[..2].to_vec();
        assert!(sets
            .iter()
            .all(|instruction| matches!(instruction, Instruction::Set { .. })));
        assert_eq!(
            compiled
                .program
                .instructions
                .iter()
                .filter(|instruction| matches!(instruction, Instruction::Jump { .. }))
                .count(),
            4
        );
    }

    #[test]
    fn duplicate_function_is_rejected() {
        let ast = ast::Ast::from(vec![Statement::func("f", []), Statement::func("f", [])]);
        assert_eq!(
            compile(&ast).unwrap_err(),
            CompileError::Redeclaration {
                name: "f".to_owned(),
                kind: "function"
            }
        );
    }

    #[test]
    fn body_errors_surface_from_second_pass() {
        let ast = ast::Ast::from(vec![Statement::func(
            "f",
            [Statement::assign("missing", int(1))],
        )]);
        assert_eq!(
            compile(&ast).unwrap_err(),
            CompileError::UnknownName {
                name: "missing".to_owned()
            }
        );
    }
}
