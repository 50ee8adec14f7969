use {
    crate::common::{debug_println, trace_step, DEBUG},
    anyhow::{bail, Context},
    backend::{Machine, DEFAULT_MEMORY_SIZE},
    clap::{Parser, Subcommand, ValueEnum},
    frontend::{ast::Word, demos},
    middle::{
        ir::{self, Address},
        listings::{self, counting_loop},
        ReclaimPolicy,
    },
    std::{collections::BTreeMap, path::PathBuf, sync::atomic::Ordering},
};

#[derive(Debug, Parser)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a demo program and print its instructions
    Compile {
        /// Program to compile
        demo: Demo,

        #[command(flatten)]
        compile_options: CompileOptions,
    },
    /// Compile and run a demo program
    Run {
        /// Program to run
        demo: Demo,

        #[command(flatten)]
        run_options: RunOptions,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Demo {
    Arithmetic,
    Move,
    Counter,
    NestedCalls,
    FloorDivision,
    MixedExpression,
    /// Hand-written loop: counts from 0 to 7 in steps of 1
    Loop,
}

#[derive(Debug, Parser)]
struct CompileOptions {
    /// Output file for the instruction listing [leave unspecified for stdout]
    #[arg(short)]
    output_path: Option<PathBuf>,

    /// Print raw opcodes and arguments instead of mnemonics
    #[arg(long)]
    raw: bool,

    /// Reuse addresses of temporaries once they are no longer needed
    #[arg(long)]
    reclaim: bool,
}

#[derive(Debug, Parser)]
struct RunOptions {
    /// Number of memory cells
    #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE)]
    memory_size: usize,

    /// Stop with an error after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print the final memory state after execution
    #[arg(long)]
    print_memory: bool,

    /// Reuse addresses of temporaries once they are no longer needed
    #[arg(long)]
    reclaim: bool,
}

struct Loaded {
    program: ir::Program,
    variables: BTreeMap<String, Address>,
    expected: Vec<(&'static str, Word)>,
}

fn reclaim_policy(reclaim: bool) -> ReclaimPolicy {
    if reclaim {
        ReclaimPolicy::Reuse
    } else {
        ReclaimPolicy::Monotonic
    }
}

fn load(demo: Demo, reclaim: ReclaimPolicy) -> anyhow::Result<Loaded> {
    let demo = match demo {
        Demo::Arithmetic => demos::arithmetic(),
        Demo::Move => demos::move_between_vars(),
        Demo::Counter => demos::counter(),
        Demo::NestedCalls => demos::nested_calls(),
        Demo::FloorDivision => demos::floor_division(),
        Demo::MixedExpression => demos::mixed_expression(),
        Demo::Loop => {
            let program = listings::counting_loop(0, 1, 7);
            debug_println!("{program}");
            return Ok(Loaded {
                program,
                variables: BTreeMap::from([
                    ("counter".to_owned(), counting_loop::COUNTER),
                    ("step".to_owned(), counting_loop::STEP),
                    ("bound".to_owned(), counting_loop::BOUND),
                ]),
                expected: vec![("counter", 7), ("step", 1), ("bound", 7)],
            });
        }
    };
    debug_println!("{:#?}", demo.ast);
    let compiled = middle::compile(&demo.ast, middle::CompileOptions { reclaim })
        .with_context(|| format!("failed to compile `{}`", demo.name))?;
    debug_println!("{}", compiled.program);
    debug_println!("{} memory cells used", compiled.memory_used);
    Ok(Loaded {
        program: compiled.program,
        variables: compiled.variables,
        expected: demo.expected,
    })
}

fn listing(program: &ir::Program, raw: bool) -> String {
    if raw {
        program
            .encode()
            .iter()
            .map(|instruction| format!("{instruction}\n"))
            .collect()
    } else {
        program.to_string()
    }
}

fn execute(loaded: &Loaded, run_options: &RunOptions) -> anyhow::Result<Machine> {
    let mut machine = Machine::load(&loaded.program, run_options.memory_size);
    while !machine.is_halted() {
        if let Some(max_steps) = run_options.max_steps {
            if machine.steps() >= max_steps {
                bail!(
                    "step budget of {max_steps} exhausted at instruction {}",
                    machine.pointer()
                );
            }
        }
        if let Some(instruction) = machine.current_instruction() {
            trace_step!(machine.pointer(), instruction);
        }
        machine
            .step()
            .with_context(|| format!("execution failed after {} steps", machine.steps()))?;
    }
    debug_println!("halted after {} steps", machine.steps());
    Ok(machine)
}

pub(crate) fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    DEBUG.store(cli.debug, Ordering::Relaxed);
    match cli.command {
        Command::Compile {
            demo,
            compile_options,
        } => {
            let loaded = load(demo, reclaim_policy(compile_options.reclaim))?;
            let listing = listing(&loaded.program, compile_options.raw);
            if let Some(output_path) = compile_options.output_path {
                std::fs::write(&output_path, listing)
                    .with_context(|| format!("failed to write {}", output_path.display()))?;
            } else {
                print!("{listing}");
            }
        }
        Command::Run { demo, run_options } => {
            let loaded = load(demo, reclaim_policy(run_options.reclaim))?;
            let machine = execute(&loaded, &run_options)?;
            let memory = machine.memory();
            for (name, &address) in &loaded.variables {
                match memory.peek(address) {
                    Some(value) => println!("{name} = {value}"),
                    None => println!("{name} is unset"),
                }
            }
            if run_options.print_memory {
                println!("final memory state:\n{memory}");
            }
            for &(name, expected) in &loaded.expected {
                let actual = loaded
                    .variables
                    .get(name)
                    .and_then(|&address| memory.peek(address));
                if actual != Some(expected) {
                    bail!("expected {name} = {expected}, found {actual:?}");
                }
            }
        }
    }
    Ok(())
}
