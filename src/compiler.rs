//! # Compiler Module
//!
//! Walks the AST and emits byte-encoded stack machine instructions.
//! Single pass: forward jumps are emitted with placeholder operands and
//! back-patched once their target offset is known.
//!
//! ## Key Design
//! - Instructions grow in a flat `Vec<u8>`; constants are interned
//!   append-only, without deduplication.
//! - The last two emitted instructions are tracked as (opcode, position)
//!   so an `OpPop` ending an if-arm can be peeled off, keeping the arm's
//!   value on the stack.
//! - Scoping is a single global symbol table; `let` compiles to
//!   `OpSetGlobal`, identifier reads to `OpGetGlobal`.
//! - `a < b` compiles as `b`, `a`, `OpGreaterThan` — there is no
//!   dedicated less-than opcode.

use crate::ast::{Block, Expr, Program, Stmt};
use crate::error::{MinnowError, MinnowResult, Span};
use crate::opcode::{self, Op};
use crate::symbol::SymbolTable;
use crate::value::Value;

use std::rc::Rc;

// -----------------------------------------------------------------------------
// BYTECODE
// -----------------------------------------------------------------------------

/// The compiler's output: a flat instruction stream plus the constant
/// pool its `OpConstant` operands index into.
#[derive(Debug, Clone, Default)]
pub struct ByteCode {
    pub instructions: Vec<u8>,
    pub constants: Vec<Value>,
}

// -----------------------------------------------------------------------------
// EMITTED INSTRUCTION TRACKING
// -----------------------------------------------------------------------------

/// An already-emitted instruction: its opcode and the byte offset of its
/// opcode byte. Powers the remove-last-pop peephole.
#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Op,
    position: usize,
}

// -----------------------------------------------------------------------------
// COMPILER STATE
// -----------------------------------------------------------------------------

/// The Minnow bytecode compiler. Transforms a parsed program into
/// [`ByteCode`] ready for VM execution.
pub struct Compiler {
    /// Instructions being emitted.
    instructions: Vec<u8>,
    /// Constant pool (append-only, not deduplicated).
    constants: Vec<Value>,
    /// Global name-to-slot bindings.
    symbols: SymbolTable,
    /// The most recently emitted instruction.
    last_instruction: Option<EmittedInstruction>,
    /// The instruction emitted before `last_instruction`.
    previous_instruction: Option<EmittedInstruction>,
}

impl Compiler {
    /// Creates a fresh compiler with an empty symbol table and constant
    /// pool.
    pub fn new() -> Self {
        Self::with_state(SymbolTable::new(), Vec::new())
    }

    /// Creates a compiler that continues from existing state. The REPL
    /// uses this to keep names and constants stable across lines while
    /// each line gets its own instruction buffer.
    pub fn with_state(symbols: SymbolTable, constants: Vec<Value>) -> Self {
        Self {
            instructions: Vec::new(),
            constants,
            symbols,
            last_instruction: None,
            previous_instruction: None,
        }
    }

    /// Compiles a program into the instruction buffer.
    ///
    /// # Errors
    /// Returns a `MinnowError` for unresolvable identifiers and operators
    /// the instruction set has no encoding for.
    pub fn compile(&mut self, program: &Program) -> MinnowResult<()> {
        for stmt in &program.stmts {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    /// Returns the compiled instructions and constant pool.
    pub fn bytecode(&self) -> ByteCode {
        ByteCode {
            instructions: self.instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    /// Releases the symbol table and constant pool for reuse by a future
    /// compiler instance.
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbols, self.constants)
    }

    // -------------------------------------------------------------------------
    // STATEMENT COMPILATION
    // -------------------------------------------------------------------------

    fn compile_stmt(&mut self, stmt: &Stmt) -> MinnowResult<()> {
        match stmt {
            Stmt::Let { name, value, .. } => {
                self.compile_expr(value)?;
                let symbol = self.symbols.define(name);
                self.emit(Op::SetGlobal, &[symbol.index]);
                Ok(())
            }
            Stmt::ExprStmt { expr, .. } => {
                self.compile_expr(expr)?;
                // Statements leave the stack as they found it.
                self.emit(Op::Pop, &[]);
                Ok(())
            }
        }
    }

    fn compile_block(&mut self, block: &Block) -> MinnowResult<()> {
        for stmt in &block.stmts {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // EXPRESSION COMPILATION
    // -------------------------------------------------------------------------

    fn compile_expr(&mut self, expr: &Expr) -> MinnowResult<()> {
        match expr {
            Expr::Int { value, .. } => {
                let idx = self.add_constant(Value::Int(*value));
                self.emit(Op::Constant, &[idx]);
                Ok(())
            }
            Expr::Str { value, .. } => {
                let idx = self.add_constant(Value::Str(Rc::new(value.clone())));
                self.emit(Op::Constant, &[idx]);
                Ok(())
            }
            Expr::Bool { value, .. } => {
                if *value {
                    self.emit(Op::True, &[]);
                } else {
                    self.emit(Op::False, &[]);
                }
                Ok(())
            }
            Expr::Ident { name, span } => match self.symbols.resolve(name) {
                Some(symbol) => {
                    let index = symbol.index;
                    self.emit(Op::GetGlobal, &[index]);
                    Ok(())
                }
                None => Err(MinnowError::compiler(
                    format!("unknown symbol {}", name),
                    *span,
                )),
            },
            Expr::Prefix { op, operand, span } => {
                self.compile_expr(operand)?;
                match op.as_str() {
                    "!" => self.emit(Op::Bang, &[]),
                    "-" => self.emit(Op::Minus, &[]),
                    _ => {
                        return Err(MinnowError::compiler(
                            format!("unknown operator {}", op),
                            *span,
                        ));
                    }
                };
                Ok(())
            }
            Expr::Infix {
                left,
                op,
                right,
                span,
            } => self.compile_infix(left, op, right, *span),
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => self.compile_if(condition, consequence, alternative.as_ref()),
            Expr::Array { elements, .. } => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                self.emit(Op::Array, &[elements.len()]);
                Ok(())
            }
            Expr::Hash { pairs, .. } => {
                for (key, value) in pairs {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.emit(Op::Hash, &[pairs.len() * 2]);
                Ok(())
            }
            Expr::Index { object, index, .. } => {
                self.compile_expr(object)?;
                self.compile_expr(index)?;
                self.emit(Op::Index, &[]);
                Ok(())
            }
        }
    }

    fn compile_infix(&mut self, left: &Expr, op: &str, right: &Expr, span: Span) -> MinnowResult<()> {
        // `<` has no opcode: swap the operand order and reuse OpGreaterThan.
        if op == "<" {
            self.compile_expr(right)?;
            self.compile_expr(left)?;
            self.emit(Op::GreaterThan, &[]);
            return Ok(());
        }

        self.compile_expr(left)?;
        self.compile_expr(right)?;

        match op {
            "+" => self.emit(Op::Add, &[]),
            "-" => self.emit(Op::Sub, &[]),
            "*" => self.emit(Op::Mul, &[]),
            "/" => self.emit(Op::Div, &[]),
            ">" => self.emit(Op::GreaterThan, &[]),
            "==" => self.emit(Op::Equal, &[]),
            "!=" => self.emit(Op::NotEqual, &[]),
            _ => {
                return Err(MinnowError::compiler(
                    format!("unknown operator {}", op),
                    span,
                ));
            }
        };
        Ok(())
    }

    // -------------------------------------------------------------------------
    // CONTROL FLOW COMPILATION
    // -------------------------------------------------------------------------

    /// Compiles an if-expression. Both arms must leave exactly one value
    /// on the stack, so a trailing `OpPop` inside an arm is removed, and a
    /// missing else-arm becomes `OpNull`.
    fn compile_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
    ) -> MinnowResult<()> {
        self.compile_expr(condition)?;

        // Patched to jump past the consequence once its extent is known.
        let jump_not_truthy_pos = self.emit(Op::JumpNotTruthy, &[0xFFFF]);

        self.compile_block(consequence)?;
        if self.last_instruction_is(Op::Pop) {
            self.remove_last_instruction();
        }

        let jump_pos = self.emit(Op::Jump, &[0xFFFF]);
        self.change_operand(jump_not_truthy_pos, self.instructions.len());

        match alternative {
            None => {
                self.emit(Op::Null, &[]);
            }
            Some(block) => {
                self.compile_block(block)?;
                if self.last_instruction_is(Op::Pop) {
                    self.remove_last_instruction();
                }
            }
        }

        self.change_operand(jump_pos, self.instructions.len());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // EMISSION & PATCHING
    // -------------------------------------------------------------------------

    /// Assembles and appends an instruction, returning the byte position
    /// of its opcode byte.
    fn emit(&mut self, op: Op, operands: &[usize]) -> usize {
        let instruction = opcode::make(op, operands);
        let position = self.instructions.len();
        self.instructions.extend_from_slice(&instruction);

        self.previous_instruction = self.last_instruction;
        self.last_instruction = Some(EmittedInstruction {
            opcode: op,
            position,
        });

        position
    }

    fn last_instruction_is(&self, op: Op) -> bool {
        matches!(self.last_instruction, Some(last) if last.opcode == op)
    }

    /// Truncates the buffer back to the start of the last instruction and
    /// restores the previous instruction as the new last.
    fn remove_last_instruction(&mut self) {
        if let Some(last) = self.last_instruction {
            self.instructions.truncate(last.position);
            self.last_instruction = self.previous_instruction;
            self.previous_instruction = None;
        }
    }

    /// Rebuilds the instruction at `pos` with a new operand, overwriting
    /// the old bytes in place. The opcode (and therefore the width) must
    /// not change.
    fn change_operand(&mut self, pos: usize, operand: usize) {
        let op = Op::from_u8(self.instructions[pos])
            .expect("change_operand target is not an opcode byte");
        let instruction = opcode::make(op, &[operand]);
        self.instructions[pos..pos + instruction.len()].copy_from_slice(&instruction);
    }

    /// Appends a value to the constant pool and returns its index.
    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
