// tarn - A small embeddable Lisp over pooled persistent containers
// Copyright (c) 2025 the tarn authors. MIT licensed.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use tarn_core::Runtime;
use tarn_parser::{to_typed_string, Value};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        println!("Tarn v0.1.0");
        return;
    }

    let rt = Runtime::new();
    rt.set_args(&args);

    if args.len() > 1 {
        run_file(&args[1], &rt);
    } else {
        run_repl(&rt);
    }
}

/// Evaluate a single source file and print the result.
fn run_file(path: &str, rt: &Runtime) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Could not read file '{}': {}", path, e);
            process::exit(1);
        }
    };
    match rt.read_eval(&source) {
        Ok(result) => println!("{}", result),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        "Tarn repl\n\
         'help'           Show this help.\n\
         'quit'           Exit the interpreter.\n\
         'memory'         Display used memory (live/reserved).\n\
         'gc'             Force a collection and report memory.\n\
         'eval'           Evaluate entered forms (default).\n\
         'print'          Pretty-print entered forms without evaluating.\n\
         'echo-types-on'  Prefix printed values with their type tags.\n\
         'echo-types-off' Print values plainly.\n\
         'envprint'       Dump the root environment bindings."
    );
}

fn print_memory(rt: &Runtime) {
    println!(
        "(live/reserved): {} B / {} B",
        rt.live_bytes(),
        rt.reserved_bytes()
    );
}

fn render(v: &Value, echo_types: bool) -> String {
    if echo_types {
        to_typed_string(v)
    } else {
        v.to_string()
    }
}

enum Mode {
    Eval,
    Print,
}

/// Run the interactive loop.
fn run_repl(rt: &Runtime) {
    println!("Tarn repl");

    let mut mode = Mode::Eval;
    let mut echo_types = false;

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }

        let line = input.trim();
        match line {
            "" => {}
            "quit" => break,
            "help" => print_help(),
            "memory" => print_memory(rt),
            "gc" => {
                let live_before = rt.live_bytes();
                let reserved_before = rt.reserved_bytes();
                rt.gc();
                println!("Garbage collection done.");
                println!(
                    "Before: (live/reserved): {} B / {} B",
                    live_before, reserved_before
                );
                print_memory(rt);
            }
            "eval" => mode = Mode::Eval,
            "print" => mode = Mode::Print,
            "echo-types-on" => echo_types = true,
            "echo-types-off" => echo_types = false,
            "envprint" => {
                for (key, value) in rt.env().snapshot().iter() {
                    println!("{} : {}", key, value);
                }
            }
            _ => match rt.parse(line) {
                Ok(parsed) => match mode {
                    Mode::Print => println!("{}", render(&parsed, echo_types)),
                    Mode::Eval => match rt.eval(&parsed) {
                        Ok(result) => println!("{}", render(&result, echo_types)),
                        Err(e) => println!("Error: {}", e),
                    },
                },
                // The message already carries the "Parse error at L:C" prefix.
                Err(e) => println!("{}", e),
            },
        }
    }
}
