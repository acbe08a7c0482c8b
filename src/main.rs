use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use mu::printer;
use mu::reader::Reader;
use mu::{Machine, Value};

#[derive(Parser)]
#[command(name = "mu", about = "Interpreter for the mu_ language")]
struct Args {
    /// Source files to evaluate before reading stdin
    #[arg(long = "load", value_name = "FILE")]
    load: Vec<PathBuf>,

    /// Cons heap capacity, in cells
    #[arg(long, default_value_t = 1 << 22)]
    heap_cells: usize,

    /// Evaluate one expression and exit
    #[arg(short = 'e', long = "eval", value_name = "EXPR")]
    expr: Option<String>,
}

fn main() {
    env_logger::builder().format_timestamp(None).init();
    let args = Args::parse();

    let mut machine = Machine::new(args.heap_cells);
    register_emit(&mut machine);

    for path in &args.load {
        load_file(&mut machine, path);
    }

    if let Some(source) = &args.expr {
        eval_and_print(source, &mut machine);
        return;
    }

    if io::stdin().is_terminal() {
        println!("mu_ interpreter");
        println!(
            "  Heap: {} cells used, {} names interned",
            machine.heap.cell_count(),
            machine.symbols.records().len()
        );
        println!("Ready.\n");
        run_interactive(&mut machine);
    } else {
        run_piped(&mut machine);
    }
}

/// Install the demo `emit` system operation: evaluate the operand,
/// print it, return it.
fn register_emit(machine: &mut Machine) {
    let name = machine
        .symbols
        .intern_str("emit")
        .expect("yard space at startup");
    machine
        .register_system_operation(
            name,
            Arc::new(|machine: &mut Machine, operand, env| {
                let anchor = machine.heap.anchor();
                let value = machine.eval(operand, env, anchor)?;
                println!(
                    "{}",
                    printer::print_val(value, &machine.heap, &machine.symbols)
                );
                Ok(value)
            }),
        )
        .expect("emit registration");
}

/// Load a file silently, stopping on the first host-level failure.
fn load_file(machine: &mut Machine, path: &PathBuf) {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };
    if let Err(e) = machine.run(&source) {
        eprintln!("Error in {}: {}", path.display(), e);
        std::process::exit(1);
    }
}

/// Interactive REPL: accumulate lines until parens are balanced.
fn run_interactive(machine: &mut Machine) {
    let stdin = io::stdin();
    let mut buf = String::new();
    let mut depth: i32 = 0;

    loop {
        if depth == 0 {
            print!("> ");
        } else {
            print!("  ");
        }
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }

        // Naive paren tracking, sufficient for well-formed input.
        for ch in line.chars() {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }

        buf.push_str(&line);

        if depth <= 0 {
            depth = 0;
            let input = buf.trim().to_string();
            buf.clear();
            if input.is_empty() {
                continue;
            }
            eval_and_print(&input, machine);
        }
    }
}

/// Piped mode: read all input, evaluate one expression at a time.
fn run_piped(machine: &mut Machine) {
    let mut input = String::new();
    if io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("Failed to read input");
        return;
    }
    let input = input.trim();
    if !input.is_empty() {
        eval_and_print(input, machine);
    }
}

/// Evaluate every expression in a string, printing each result.
fn eval_and_print(input: &str, machine: &mut Machine) {
    let (offset, length) = match machine.load_str(input) {
        Ok(region) => region,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let end = offset + length;
    let mut pos = offset;
    loop {
        let mut reader = Reader::new(&mut machine.heap, &mut machine.symbols, pos, end - pos);
        let parsed = match reader.read() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };
        pos = reader.position();
        match parsed {
            Some(expr) => {
                let anchor = machine.heap.anchor();
                match machine.eval(expr, Value::NIL, anchor) {
                    Ok(val) => println!(
                        "{}",
                        printer::print_val(val, &machine.heap, &machine.symbols)
                    ),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            None => break,
        }
    }
}
