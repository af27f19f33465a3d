use std::env;
use std::process;

use minnow::compiler::Compiler;
use minnow::error::format_error;
use minnow::lexer::Lexer;
use minnow::parser::Parser;
use minnow::value::Value;
use minnow::vm::Vm;

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => {
            println!("minnow {} (type .exit to quit)", env!("CARGO_PKG_VERSION"));
            minnow::repl::start();
        }
        2 => {
            let path = &args[1];
            let source = match std::fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error reading '{}': {}", path, e);
                    process::exit(1);
                }
            };

            if let Err(e) = run(&source) {
                eprintln!("{}", format_error(&e, &source, path));
                process::exit(1);
            }
        }
        _ => {
            eprintln!("Usage: minnow [file.mnw]");
            process::exit(1);
        }
    }
}

fn run(source: &str) -> Result<(), minnow::error::MinnowError> {
    let tokens = Lexer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse()?;

    let mut compiler = Compiler::new();
    compiler.compile(&program)?;
    let bytecode = compiler.bytecode();

    let mut vm = Vm::new(&bytecode);
    vm.run()?;

    let result = vm.last_popped();
    if !matches!(result, Value::Null) {
        println!("{}", result.to_display_string());
    }

    Ok(())
}
