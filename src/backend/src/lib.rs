pub mod machine;

pub use machine::{Execute, Machine, MachineError, Memory, DEFAULT_MEMORY_SIZE};
