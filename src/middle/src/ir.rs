use {
    derive_more::Display,
    frontend::ast::BinOp,
    std::fmt::{self, Write},
};

pub use frontend::ast::Word;

/// 1-based index into machine memory.
pub type Address = usize;

/// 1-based index into the instruction sequence.
pub type InstrIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ArithOp {
    #[display("add")]
    Add = 1,
    #[display("sub")]
    Sub = 2,
    #[display("mul")]
    Mul = 3,
    #[display("div")]
    Div = 4,
    #[display("mod")]
    Mod = 5,
}

impl ArithOp {
    pub fn code(self) -> Word {
        self as Word
    }

    pub fn from_code(code: Word) -> Option<Self> {
        Some(match code {
            1 => ArithOp::Add,
            2 => ArithOp::Sub,
            3 => ArithOp::Mul,
            4 => ArithOp::Div,
            5 => ArithOp::Mod,
            _ => return None,
        })
    }

    /// Returns `None` when dividing by zero. DIV and MOD round toward negative
    /// infinity, and everything wraps on overflow.
    pub fn apply(self, lhs: Word, rhs: Word) -> Option<Word> {
        Some(match self {
            ArithOp::Add => lhs.wrapping_add(rhs),
            ArithOp::Sub => lhs.wrapping_sub(rhs),
            ArithOp::Mul => lhs.wrapping_mul(rhs),
            ArithOp::Div => {
                if rhs == 0 {
                    return None;
                }
                let quot = lhs.wrapping_div(rhs);
                if lhs.wrapping_rem(rhs) != 0 && (lhs < 0) != (rhs < 0) {
                    quot.wrapping_sub(1)
                } else {
                    quot
                }
            }
            ArithOp::Mod => {
                if rhs == 0 {
                    return None;
                }
                let rem = lhs.wrapping_rem(rhs);
                if rem != 0 && (rem < 0) != (rhs < 0) {
                    rem.wrapping_add(rhs)
                } else {
                    rem
                }
            }
        })
    }
}

impl From<BinOp> for ArithOp {
    fn from(op: BinOp) -> Self {
        match op {
            BinOp::Add => ArithOp::Add,
            BinOp::Sub => ArithOp::Sub,
            BinOp::Mul => ArithOp::Mul,
            BinOp::Div => ArithOp::Div,
            BinOp::Mod => ArithOp::Mod,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CmpOp {
    #[display("gt")]
    Gt = 1,
    #[display("lt")]
    Lt = 2,
    #[display("eq")]
    Eq = 3,
}

impl CmpOp {
    pub fn code(self) -> Word {
        self as Word
    }

    pub fn from_code(code: Word) -> Option<Self> {
        Some(match code {
            1 => CmpOp::Gt,
            2 => CmpOp::Lt,
            3 => CmpOp::Eq,
            _ => return None,
        })
    }

    pub fn holds(self, lhs: Word, rhs: Word) -> bool {
        match self {
            CmpOp::Gt => lhs > rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Eq => lhs == rhs,
        }
    }
}

pub mod opcode {
    use super::Word;

    pub const HALT: Word = 1;
    pub const SET: Word = 2;
    pub const JUMP: Word = 3;
    pub const ARITHMETIC: Word = 4;
    pub const MOVE: Word = 5;
    pub const CONDITIONAL_JUMP: Word = 6;

    pub fn arity(opcode: Word) -> Option<usize> {
        Some(match opcode {
            HALT => 0,
            SET | MOVE => 2,
            JUMP => 1,
            ARITHMETIC | CONDITIONAL_JUMP => 4,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Halt,
    Set {
        dst: Address,
        value: Word,
    },
    Move {
        src: Address,
        dst: Address,
    },
    /// Indirect: the target instruction index is read from `target`.
    Jump {
        target: Address,
    },
    Arithmetic {
        op: ArithOp,
        lhs: Address,
        rhs: Address,
        dst: Address,
    },
    /// Indirect like [`Instruction::Jump`], taken only when `cmp` holds.
    ConditionalJump {
        lhs: Address,
        rhs: Address,
        cmp: CmpOp,
        target: Address,
    },
}

impl Instruction {
    pub fn opcode(&self) -> Word {
        match self {
            Instruction::Halt => opcode::HALT,
            Instruction::Set { .. } => opcode::SET,
            Instruction::Move { .. } => opcode::MOVE,
            Instruction::Jump { .. } => opcode::JUMP,
            Instruction::Arithmetic { .. } => opcode::ARITHMETIC,
            Instruction::ConditionalJump { .. } => opcode::CONDITIONAL_JUMP,
        }
    }

    pub fn encode(&self) -> RawInstruction {
        let args = match *self {
            Instruction::Halt => vec![],
            Instruction::Set { dst, value } => vec![dst as Word, value],
            Instruction::Move { src, dst } => vec![src as Word, dst as Word],
            Instruction::Jump { target } => vec![target as Word],
            Instruction::Arithmetic { op, lhs, rhs, dst } => {
                vec![op.code(), lhs as Word, rhs as Word, dst as Word]
            }
            Instruction::ConditionalJump {
                lhs,
                rhs,
                cmp,
                target,
            } => vec![lhs as Word, rhs as Word, cmp.code(), target as Word],
        };
        RawInstruction {
            opcode: self.opcode(),
            args,
        }
    }

    pub fn decode(raw: &RawInstruction) -> Result<Self, DecodeError> {
        let expected = opcode::arity(raw.opcode).ok_or(DecodeError::UnknownOpcode {
            opcode: raw.opcode,
        })?;
        if raw.args.len() != expected {
            return Err(DecodeError::ArityMismatch {
                opcode: raw.opcode,
                expected,
                found: raw.args.len(),
            });
        }
        let address = |word: Word| {
            Address::try_from(word).map_err(|_| DecodeError::NegativeAddress { address: word })
        };
        let args = &raw.args;
        Ok(match raw.opcode {
            opcode::HALT => Instruction::Halt,
            opcode::SET => Instruction::Set {
                dst: address(args[0])?,
                value: args[1],
            },
            opcode::MOVE => Instruction::Move {
                src: address(args[0])?,
                dst: address(args[1])?,
            },
            opcode::JUMP => Instruction::Jump {
                target: address(args[0])?,
            },
            opcode::ARITHMETIC => Instruction::Arithmetic {
                op: ArithOp::from_code(args[0]).ok_or(DecodeError::UnknownSubOpcode {
                    opcode: raw.opcode,
                    sub_opcode: args[0],
                })?,
                lhs: address(args[1])?,
                rhs: address(args[2])?,
                dst: address(args[3])?,
            },
            opcode::CONDITIONAL_JUMP => Instruction::ConditionalJump {
                lhs: address(args[0])?,
                rhs: address(args[1])?,
                cmp: CmpOp::from_code(args[2]).ok_or(DecodeError::UnknownSubOpcode {
                    opcode: raw.opcode,
                    sub_opcode: args[2],
                })?,
                target: address(args[3])?,
            },
            _ => unreachable!("opcode {} has an arity but no decoding", raw.opcode),
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Instruction::Halt => write!(f, "halt"),
            Instruction::Set { dst, value } => write!(f, "set  @{dst}, {value}"),
            Instruction::Move { src, dst } => write!(f, "mov  @{src}, @{dst}"),
            Instruction::Jump { target } => write!(f, "jmp  [@{target}]"),
            Instruction::Arithmetic { op, lhs, rhs, dst } => {
                write!(f, "math {op} @{lhs}, @{rhs}, @{dst}")
            }
            Instruction::ConditionalJump {
                lhs,
                rhs,
                cmp,
                target,
            } => write!(f, "jif  @{lhs} {cmp} @{rhs}, [@{target}]"),
        }
    }
}

/// The fixed-format machine word form of an instruction: an opcode tag and
/// its integer arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawInstruction {
    pub opcode: Word,
    pub args: Vec<Word>,
}

impl RawInstruction {
    pub fn new(opcode: Word, args: impl Into<Vec<Word>>) -> Self {
        Self {
            opcode,
            args: args.into(),
        }
    }
}

impl fmt::Display for RawInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "I: {}", self.opcode)?;
        for (i, arg) in self.args.iter().enumerate() {
            write!(f, " {i}: {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DecodeError {
    #[display("unknown opcode {opcode}")]
    UnknownOpcode { opcode: Word },
    #[display("unknown sub-opcode {sub_opcode} for opcode {opcode}")]
    UnknownSubOpcode { opcode: Word, sub_opcode: Word },
    #[display("opcode {opcode} takes {expected} arguments, found {found}")]
    ArityMismatch {
        opcode: Word,
        expected: usize,
        found: usize,
    },
    #[display("negative address {address}")]
    NegativeAddress { address: Word },
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn encode(&self) -> Vec<RawInstruction> {
        self.instructions.iter().map(Instruction::encode).collect()
    }

    /// Looks up an instruction by its 1-based index.
    pub fn get(&self, index: InstrIndex) -> Option<&Instruction> {
        index
            .checked_sub(1)
            .and_then(|index| self.instructions.get(index))
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Program { instructions }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self.instructions.len().to_string().len();
        for (i, instruction) in self.instructions.iter().enumerate() {
            write!(f, "{:>width$}: {instruction}", i + 1)?;
            f.write_char('\n')?;
        }
        Ok(())
    }
}
