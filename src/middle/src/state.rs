use {
    super::{
        ir::{Address, InstrIndex, Instruction, Word},
        CompileError,
    },
    frontend::ast,
    std::collections::BTreeMap,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Every claim returns a fresh address.
    #[default]
    Monotonic,
    /// Released temporaries are handed out again before fresh addresses.
    Reuse,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub reclaim: ReclaimPolicy,
}

/// An address owned by whoever claimed it. Only temporaries can be released,
/// so a variable's address never returns to the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Temp(Address),
    Named(Address),
}

impl Slot {
    pub(crate) fn address(self) -> Address {
        match self {
            Slot::Temp(address) | Slot::Named(address) => address,
        }
    }
}

#[derive(Debug)]
pub(crate) struct AddressAllocator {
    next: Address,
    policy: ReclaimPolicy,
    free: Vec<Address>,
}

impl AddressAllocator {
    fn new(policy: ReclaimPolicy) -> Self {
        Self {
            next: 1,
            policy,
            free: vec![],
        }
    }

    fn fresh(&mut self) -> Address {
        let address = self.next;
        self.next += 1;
        address
    }

    /// Claims an address that stays bound for the whole compilation.
    pub(crate) fn claim_named(&mut self) -> Address {
        self.fresh()
    }

    pub(crate) fn claim_temp(&mut self) -> Address {
        self.free.pop().unwrap_or_else(|| self.fresh())
    }

    pub(crate) fn release(&mut self, slot: Slot) {
        if let (Slot::Temp(address), ReclaimPolicy::Reuse) = (slot, self.policy) {
            debug_assert!(!self.free.contains(&address), "double release of @{address}");
            self.free.push(address);
        }
    }

    /// One past the highest address handed out so far.
    pub(crate) fn high_water(&self) -> Address {
        self.next
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FunctionRecord<'src> {
    pub(crate) name: &'src str,
    pub(crate) body: &'src [ast::Statement<'src>],
    /// Holds the instruction index a call resumes at; written by each call site.
    pub(crate) return_cell: Address,
    /// Holds the entry index; written once by the entry table.
    pub(crate) entry_cell: Address,
    pub(crate) entry: Option<InstrIndex>,
}

/// An instruction as emitted during compilation. Call sites name their callee
/// until the fix-up pass knows where its body starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Emitted<'src> {
    Resolved(Instruction),
    CallPlaceholder { function: &'src str },
    /// One slot of the entry table; the nth slot belongs to the nth declared function.
    EntrySlot,
}

impl From<Instruction> for Emitted<'_> {
    fn from(instruction: Instruction) -> Self {
        Emitted::Resolved(instruction)
    }
}

#[derive(Debug)]
pub(crate) struct CompileState<'src> {
    vars: BTreeMap<&'src str, Address>,
    funcs: BTreeMap<&'src str, FunctionRecord<'src>>,
    /// Function names in declaration order.
    func_order: Vec<&'src str>,
    pub(crate) allocator: AddressAllocator,
    pub(crate) instructions: Vec<Emitted<'src>>,
}

impl<'src> CompileState<'src> {
    pub(crate) fn new(options: CompileOptions) -> Self {
        Self {
            vars: BTreeMap::new(),
            funcs: BTreeMap::new(),
            func_order: vec![],
            allocator: AddressAllocator::new(options.reclaim),
            instructions: vec![],
        }
    }

    /// Index the next emitted instruction will occupy.
    pub(crate) fn next_index(&self) -> InstrIndex {
        self.instructions.len() + 1
    }

    pub(crate) fn emit(&mut self, instruction: impl Into<Emitted<'src>>) {
        self.instructions.push(instruction.into());
    }

    pub(crate) fn emit_set(&mut self, dst: Address, value: Word) {
        self.emit(Instruction::Set { dst, value });
    }

    pub(crate) fn declare_var(&mut self, name: &'src str) -> Result<Address, CompileError> {
        if self.vars.contains_key(name) {
            return Err(CompileError::Redeclaration {
                name: name.to_owned(),
                kind: "variable",
            });
        }
        let address = self.allocator.claim_named();
        self.vars.insert(name, address);
        Ok(address)
    }

    pub(crate) fn var_address(&self, name: &str) -> Result<Address, CompileError> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| CompileError::UnknownName {
                name: name.to_owned(),
            })
    }

    pub(crate) fn declare_func(
        &mut self,
        name: &'src str,
        body: &'src [ast::Statement<'src>],
    ) -> Result<&FunctionRecord<'src>, CompileError> {
        if self.funcs.contains_key(name) {
            return Err(CompileError::Redeclaration {
                name: name.to_owned(),
                kind: "function",
            });
        }
        let record = FunctionRecord {
            name,
            body,
            return_cell: self.allocator.claim_named(),
            entry_cell: self.allocator.claim_named(),
            entry: None,
        };
        self.func_order.push(name);
        Ok(self.funcs.entry(name).or_insert(record))
    }

    pub(crate) fn func(&self, name: &str) -> Result<&FunctionRecord<'src>, CompileError> {
        self.funcs
            .get(name)
            .ok_or_else(|| CompileError::UndefinedFunction {
                name: name.to_owned(),
            })
    }

    pub(crate) fn func_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut FunctionRecord<'src>, CompileError> {
        self.funcs
            .get_mut(name)
            .ok_or_else(|| CompileError::UndefinedFunction {
                name: name.to_owned(),
            })
    }

    /// Name of the `n`th declared function, if that many exist yet.
    pub(crate) fn nth_func(&self, n: usize) -> Option<&'src str> {
        self.func_order.get(n).copied()
    }

    pub(crate) fn vars(&self) -> impl Iterator<Item = (&'src str, Address)> + '_ {
        self.vars.iter().map(|(&name, &address)| (name, address))
    }
}
