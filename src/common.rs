use std::sync::atomic::AtomicBool;

pub(crate) static DEBUG: AtomicBool = AtomicBool::new(false);

macro_rules! debug_print {
    ($($arg:tt)*) => {
        if $crate::common::DEBUG.load(::std::sync::atomic::Ordering::Relaxed) {
            eprint!($($arg)*);
        }
    };
}

macro_rules! debug_println {
    ($($arg:tt)*) => {
        if $crate::common::DEBUG.load(::std::sync::atomic::Ordering::Relaxed) {
            eprintln!($($arg)*);
        }
    };
}

macro_rules! indented_println {
    ($depth:expr, $($arg:tt)*) => {
        $crate::common::debug_print!("{:width$}", "", width = $depth * 4);
        $crate::common::debug_println!($($arg)*);
    };
    () => {
        $crate::common::debug_println!();
    };
}

/// One trace line per executed instruction, indented under the run header.
macro_rules! trace_step {
    ($pointer:expr, $instruction:expr) => {
        $crate::common::indented_println!(1, "{:>4}: {}", $pointer, $instruction);
    };
}

pub(crate) use debug_print;
pub(crate) use debug_println;
pub(crate) use indented_println;
pub(crate) use trace_step;
