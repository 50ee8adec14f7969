use {
    derive_more::Display,
    middle::ir::{self, Address, DecodeError, InstrIndex, Instruction, RawInstruction, Word},
    std::fmt,
};

pub const DEFAULT_MEMORY_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum MachineError {
    #[display("address {address} is outside memory 1..={size}")]
    OutOfRangeAddress { address: Word, size: usize },
    #[display("read of uninitialized address {address}")]
    UninitializedRead { address: Address },
    #[display(
        "unknown opcode {opcode} at instruction {pointer} (opcodes run from 1 to 6)"
    )]
    UnknownOpcode { opcode: Word, pointer: InstrIndex },
    #[display("opcode {opcode} at instruction {pointer} has unknown sub-opcode {sub_opcode}")]
    UnknownSubOpcode {
        opcode: Word,
        sub_opcode: Word,
        pointer: InstrIndex,
    },
    #[display(
        "opcode {opcode} at instruction {pointer} takes {expected} arguments, found {found}"
    )]
    MalformedInstruction {
        opcode: Word,
        expected: usize,
        found: usize,
        pointer: InstrIndex,
    },
    #[display("instruction pointer {pointer} is outside the program 1..={len}")]
    InstructionOutOfRange { pointer: Word, len: usize },
    #[display("division by zero at instruction {pointer}")]
    DivisionByZero { pointer: InstrIndex },
    #[display("the machine has halted")]
    Halted,
}

impl std::error::Error for MachineError {}

/// Fixed-size, 1-indexed memory. Cells start out unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<Option<Word>>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![None; size],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, address: Address) -> Result<usize, MachineError> {
        if (1..=self.cells.len()).contains(&address) {
            Ok(address - 1)
        } else {
            Err(MachineError::OutOfRangeAddress {
                address: address as Word,
                size: self.cells.len(),
            })
        }
    }

    pub fn get(&self, address: Address) -> Result<Word, MachineError> {
        self.cells[self.index(address)?].ok_or(MachineError::UninitializedRead { address })
    }

    /// Reads a cell without failing on unset or out-of-range addresses.
    pub fn peek(&self, address: Address) -> Option<Word> {
        self.index(address).ok().and_then(|index| self.cells[index])
    }

    pub fn set(&mut self, address: Address, value: Word) -> Result<(), MachineError> {
        let index = self.index(address)?;
        self.cells[index] = Some(value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Every cell that holds a value, by address.
    pub fn iter_set(&self) -> impl Iterator<Item = (Address, Word)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.map(|value| (index + 1, value)))
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (address, value) in self.iter_set() {
            writeln!(f, "@{address}: {value}")?;
        }
        Ok(())
    }
}

pub struct Machine {
    memory: Memory,
    code: Vec<RawInstruction>,
    pointer: Word,
    halted: bool,
    steps: u64,
}

impl Machine {
    pub fn new(code: impl Into<Vec<RawInstruction>>, memory_size: usize) -> Self {
        Self {
            memory: Memory::new(memory_size),
            code: code.into(),
            pointer: 1,
            halted: false,
            steps: 0,
        }
    }

    pub fn load(program: &ir::Program, memory_size: usize) -> Self {
        Self::new(program.encode(), memory_size)
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn into_memory(self) -> Memory {
        self.memory
    }

    pub fn pointer(&self) -> Word {
        self.pointer
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of instructions executed since the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn current_instruction(&self) -> Option<&RawInstruction> {
        usize::try_from(self.pointer)
            .ok()
            .and_then(|pointer| pointer.checked_sub(1))
            .and_then(|index| self.code.get(index))
    }

    pub fn reset(&mut self) {
        self.memory.clear();
        self.pointer = 1;
        self.halted = false;
        self.steps = 0;
    }

    /// Executes exactly one instruction. Any error halts the machine.
    pub fn step(&mut self) -> Result<(), MachineError> {
        if self.halted {
            return Err(MachineError::Halted);
        }
        let result = self
            .fetch()
            .and_then(|(pointer, instruction)| self.execute(pointer, instruction));
        match result {
            Ok(()) => self.steps += 1,
            Err(_) => self.halted = true,
        }
        result
    }

    pub fn run(&mut self) -> Result<(), MachineError> {
        while !self.halted {
            self.step()?;
        }
        Ok(())
    }

    /// Runs at most `max_steps` instructions and reports whether the machine halted.
    pub fn run_for(&mut self, max_steps: u64) -> Result<bool, MachineError> {
        for _ in 0..max_steps {
            if self.halted {
                break;
            }
            self.step()?;
        }
        Ok(self.halted)
    }

    fn fetch(&self) -> Result<(InstrIndex, Instruction), MachineError> {
        let raw = self
            .current_instruction()
            .ok_or(MachineError::InstructionOutOfRange {
                pointer: self.pointer,
                len: self.code.len(),
            })?;
        let pointer = self.pointer as InstrIndex;
        let instruction = Instruction::decode(raw).map_err(|err| match err {
            DecodeError::UnknownOpcode { opcode } => {
                MachineError::UnknownOpcode { opcode, pointer }
            }
            DecodeError::UnknownSubOpcode { opcode, sub_opcode } => {
                MachineError::UnknownSubOpcode {
                    opcode,
                    sub_opcode,
                    pointer,
                }
            }
            DecodeError::ArityMismatch {
                opcode,
                expected,
                found,
            } => MachineError::MalformedInstruction {
                opcode,
                expected,
                found,
                pointer,
            },
            DecodeError::NegativeAddress { address } => MachineError::OutOfRangeAddress {
                address,
                size: self.memory.len(),
            },
        })?;
        Ok((pointer, instruction))
    }

    fn execute(&mut self, pointer: InstrIndex, instruction: Instruction) -> Result<(), MachineError> {
        match instruction {
            Instruction::Halt => self.halted = true,
            Instruction::Set { dst, value } => {
                self.memory.set(dst, value)?;
                self.pointer += 1;
            }
            Instruction::Move { src, dst } => {
                let value = self.memory.get(src)?;
                self.memory.set(dst, value)?;
                self.pointer += 1;
            }
            Instruction::Jump { target } => self.pointer = self.memory.get(target)?,
            Instruction::Arithmetic { op, lhs, rhs, dst } => {
                let lhs = self.memory.get(lhs)?;
                let rhs = self.memory.get(rhs)?;
                let value = op
                    .apply(lhs, rhs)
                    .ok_or(MachineError::DivisionByZero { pointer })?;
                self.memory.set(dst, value)?;
                self.pointer += 1;
            }
            Instruction::ConditionalJump {
                lhs,
                rhs,
                cmp,
                target,
            } => {
                if cmp.holds(self.memory.get(lhs)?, self.memory.get(rhs)?) {
                    self.pointer = self.memory.get(target)?;
                } else {
                    self.pointer += 1;
                }
            }
        }
        Ok(())
    }
}

pub trait Execute {
    /// Runs to completion on a fresh machine and returns its final memory.
    fn execute(&self, memory_size: usize) -> Result<Memory, MachineError>;
}

impl Execute for ir::Program {
    fn execute(&self, memory_size: usize) -> Result<Memory, MachineError> {
        let mut machine = Machine::load(self, memory_size);
        machine.run()?;
        Ok(machine.into_memory())
    }
}

impl Execute for [RawInstruction] {
    fn execute(&self, memory_size: usize) -> Result<Memory, MachineError> {
        let mut machine = Machine::new(self.to_vec(), memory_size);
        machine.run()?;
        Ok(machine.into_memory())
    }
}
