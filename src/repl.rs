//! # REPL Module
//!
//! Interactive shell. Each line is compiled as a single program and run
//! on a fresh VM; the symbol table, constant pool, and globals array
//! persist across lines so earlier `let` bindings stay visible.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::compiler::Compiler;
use crate::error::format_error;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::symbol::SymbolTable;
use crate::value::Value;
use crate::vm::{GLOBALS_SIZE, Vm};

const PROMPT: &str = "[In]> ";
const CONTINUATION_PROMPT: &str = ".. ";

pub fn start() {
    let mut editor = match DefaultEditor::new() {
        Ok(ed) => ed,
        Err(e) => {
            eprintln!("failed to initialize REPL: {}", e);
            std::process::exit(1);
        }
    };

    let mut symbols = SymbolTable::new();
    let mut constants: Vec<Value> = Vec::new();
    let mut globals = vec![Value::Null; GLOBALS_SIZE];

    loop {
        let input = match read_input(&mut editor) {
            Some(line) => line,
            None => break,
        };

        if input.trim().is_empty() {
            continue;
        }

        let tokens = match Lexer::new(&input).tokenize() {
            Ok(tokens) => tokens,
            Err(e) => {
                eprintln!("{}", format_error(&e, &input, "<repl>"));
                continue;
            }
        };

        let program = match Parser::new(tokens).parse() {
            Ok(program) => program,
            Err(e) => {
                println!("parser errors:");
                println!("\t{}", e);
                continue;
            }
        };

        if program.stmts.is_empty() {
            continue;
        }

        // Thread the symbol table and constant pool through so names and
        // constant indices stay stable; the instruction buffer is fresh.
        let mut compiler =
            Compiler::with_state(std::mem::take(&mut symbols), std::mem::take(&mut constants));
        let compiled = compiler.compile(&program);
        let bytecode = compiler.bytecode();
        let (kept_symbols, kept_constants) = compiler.into_state();
        symbols = kept_symbols;
        constants = kept_constants;

        if let Err(e) = compiled {
            eprintln!("{}", format_error(&e, &input, "<repl>"));
            continue;
        }

        let mut vm = Vm::with_globals(&bytecode, std::mem::take(&mut globals));
        match vm.run() {
            Ok(()) => {
                let result = vm.last_popped().clone();
                globals = vm.into_globals();
                println!("[Out]> {}", result.to_display_string());
            }
            Err(e) => {
                globals = vm.into_globals();
                eprintln!("{}", format_error(&e, &input, "<repl>"));
            }
        }
    }
}

fn read_input(editor: &mut DefaultEditor) -> Option<String> {
    let first_line = match editor.readline(PROMPT) {
        Ok(line) => line,
        Err(ReadlineError::Eof | ReadlineError::Interrupted) => return None,
        Err(e) => {
            eprintln!("readline error: {}", e);
            return None;
        }
    };

    if first_line.trim() == ".exit" {
        return None;
    }

    let mut buffer = first_line;

    while needs_continuation(&buffer) {
        match editor.readline(CONTINUATION_PROMPT) {
            Ok(line) => {
                buffer.push('\n');
                buffer.push_str(&line);
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }

    let _ = editor.add_history_entry(&buffer);
    Some(buffer)
}

fn needs_continuation(input: &str) -> bool {
    let mut braces: i32 = 0;
    let mut parens: i32 = 0;
    let mut brackets: i32 = 0;
    let mut in_string = false;
    let mut prev_byte: u8 = 0;

    for &byte in input.as_bytes() {
        if in_string {
            if byte == b'"' && prev_byte != b'\\' {
                in_string = false;
            }
            prev_byte = byte;
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => braces += 1,
            b'}' => braces -= 1,
            b'(' => parens += 1,
            b')' => parens -= 1,
            b'[' => brackets += 1,
            b']' => brackets -= 1,
            _ => {}
        }

        prev_byte = byte;
    }

    braces > 0 || parens > 0 || brackets > 0
}
