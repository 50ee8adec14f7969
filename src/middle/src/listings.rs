//! Programs written directly as instructions, for control flow the program
//! tree cannot express.

use {
    super::ir::{Address, ArithOp, CmpOp, Instruction, Program, Word},
    velcro::vec,
};

pub mod counting_loop {
    use super::Address;

    pub const COUNTER: Address = 1;
    pub const STEP: Address = 2;
    pub const BOUND: Address = 3;
    pub const LOOP_START: Address = 4;
}

/// `counter = start; do { counter += step } while counter < bound`
pub fn counting_loop(start: Word, step: Word, bound: Word) -> Program {
    use counting_loop::*;

    let constants = [(COUNTER, start), (STEP, step), (BOUND, bound)];
    // the body begins right after the constants and the loop start itself
    let loop_start = constants.len() + 2;
    Program::from(vec![
        ..constants.map(|(dst, value)| Instruction::Set { dst, value }),
        Instruction::Set {
            dst: LOOP_START,
            value: loop_start as Word,
        },
        Instruction::Arithmetic {
            op: ArithOp::Add,
            lhs: COUNTER,
            rhs: STEP,
            dst: COUNTER,
        },
        Instruction::ConditionalJump {
            lhs: COUNTER,
            rhs: BOUND,
            cmp: CmpOp::Lt,
            target: LOOP_START,
        },
        Instruction::Halt,
    ])
}
