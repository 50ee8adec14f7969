use {
    super::{
        ir::{ArithOp, Instruction, Word},
        state::{CompileState, Emitted, Slot},
        CompileError,
    },
    frontend::ast,
};

/// Whether the value of `expr` is known without running anything.
pub fn is_computable(expr: &ast::Expr) -> bool {
    match *expr {
        ast::Expr::Int(_) => true,
        ast::Expr::Var(_) => false,
        ast::Expr::BinOp { ref lhs, ref rhs, .. } => is_computable(lhs) && is_computable(rhs),
    }
}

/// Folds a computable expression. Asking for the value of anything that reads
/// a variable is a caller bug and reported as an invariant violation.
pub fn get_value(expr: &ast::Expr) -> Result<Word, CompileError> {
    match *expr {
        ast::Expr::Int(value) => Ok(value),
        ast::Expr::Var(name) => Err(CompileError::InternalInvariantViolation {
            detail: format!("`{name}` has no static value"),
        }),
        ast::Expr::BinOp {
            op,
            ref lhs,
            ref rhs,
        } => {
            let lhs = get_value(lhs)?;
            let rhs = get_value(rhs)?;
            ArithOp::from(op)
                .apply(lhs, rhs)
                .ok_or_else(|| CompileError::DivisionByZero {
                    expr: expr.to_string(),
                })
        }
    }
}

impl<'src> CompileState<'src> {
    /// Lowers `expr` and returns its answer location.
    pub(crate) fn compile_expr(&mut self, expr: &ast::Expr<'src>) -> Result<Slot, CompileError> {
        match *expr {
            ast::Expr::Var(name) => Ok(Slot::Named(self.var_address(name)?)),
            _ if is_computable(expr) => {
                let value = get_value(expr)?;
                let dst = self.allocator.claim_temp();
                self.emit_set(dst, value);
                Ok(Slot::Temp(dst))
            }
            ast::Expr::BinOp {
                op,
                ref lhs,
                ref rhs,
            } => {
                let lhs = self.compile_expr(lhs)?;
                let rhs = self.compile_expr(rhs)?;
                // the destination may reuse an operand: operands are read before it is written
                self.allocator.release(lhs);
                self.allocator.release(rhs);
                let dst = self.allocator.claim_temp();
                self.emit(Instruction::Arithmetic {
                    op: op.into(),
                    lhs: lhs.address(),
                    rhs: rhs.address(),
                    dst,
                });
                Ok(Slot::Temp(dst))
            }
            ast::Expr::Int(_) => Err(CompileError::InternalInvariantViolation {
                detail: format!("literal `{expr}` was not treated as computable"),
            }),
        }
    }

    pub(crate) fn compile_statement(
        &mut self,
        statement: &'src ast::Statement<'src>,
    ) -> Result<(), CompileError> {
        match *statement {
            ast::Statement::Let { name } => {
                self.declare_var(name)?;
            }
            ast::Statement::Assign { name, ref value } => {
                let dst = self.var_address(name)?;
                let src = self.compile_expr(value)?;
                self.emit(Instruction::Move {
                    src: src.address(),
                    dst,
                });
                self.allocator.release(src);
            }
            ast::Statement::Move { from, to } => {
                let src = self.var_address(from)?;
                let dst = self.var_address(to)?;
                self.emit(Instruction::Move { src, dst });
            }
            ast::Statement::FuncDecl { name, ref body } => {
                self.declare_func(name, body)?;
            }
            ast::Statement::Call { name } => {
                let record = self.func(name)?;
                let (function, return_cell) = (record.name, record.return_cell);
                // resume right after the set and the jump
                let resume = self.next_index() + 2;
                self.emit_set(return_cell, resume as Word);
                self.emit(Emitted::CallPlaceholder { function });
            }
        }
        Ok(())
    }
}
