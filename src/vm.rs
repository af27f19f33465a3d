//! # VM Module
//!
//! Stack-based virtual machine executing Minnow bytecode. A tight
//! fetch-decode-dispatch loop walks the instruction bytes; operands live
//! on a fixed-size stack and globals in a fixed-size slot array.
//!
//! ## Key Design
//! - Instructions and constants are borrowed from the [`ByteCode`] for
//!   the VM's lifetime; the stack and globals are owned.
//! - `pop` decrements the stack pointer without clearing the slot, so the
//!   result of a completed program stays readable via [`Vm::last_popped`].
//! - Jump operands are absolute byte offsets into the instruction buffer.
//! - ARC-based value cloning — cheap refcount bumps, no GC pauses.

use crate::compiler::ByteCode;
use crate::error::{MinnowError, MinnowResult};
use crate::opcode::{self, Op};
use crate::value::{HashPair, Value};

use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Operand stack capacity. Exceeding it is a `stack overflow` error.
pub const STACK_SIZE: usize = 2048;
/// Global slot capacity, matching the u16 operand width of
/// `OpGetGlobal`/`OpSetGlobal`.
pub const GLOBALS_SIZE: usize = 65536;

// -----------------------------------------------------------------------------
// VM STATE
// -----------------------------------------------------------------------------

/// The Minnow virtual machine.
///
/// Borrows the instruction bytes and constant pool from a [`ByteCode`];
/// both must stay unchanged while `run` is in progress.
pub struct Vm<'b> {
    /// Constant pool, indexed by `OpConstant` operands.
    constants: &'b [Value],
    /// The flat instruction byte stream.
    instructions: &'b [u8],
    /// Global variable slots, indexed by `OpSetGlobal`/`OpGetGlobal`.
    globals: Vec<Value>,
    /// The operand stack. Slots above `sp` hold stale values on purpose.
    stack: Vec<Value>,
    /// Index of the next free stack slot.
    sp: usize,
}

impl<'b> Vm<'b> {
    /// Creates a VM with a fresh globals array.
    pub fn new(bytecode: &'b ByteCode) -> Self {
        Self::with_globals(bytecode, vec![Value::Null; GLOBALS_SIZE])
    }

    /// Creates a VM that reuses an existing globals array. The REPL keeps
    /// globals alive across lines this way; `globals` must come from
    /// [`Vm::into_globals`] or be `GLOBALS_SIZE` long.
    pub fn with_globals(bytecode: &'b ByteCode, globals: Vec<Value>) -> Self {
        Self {
            constants: &bytecode.constants,
            instructions: &bytecode.instructions,
            globals,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
        }
    }

    /// Returns the value on top of the stack, if any.
    pub fn stack_top(&self) -> Option<&Value> {
        if self.sp == 0 {
            None
        } else {
            Some(&self.stack[self.sp - 1])
        }
    }

    /// Returns the most recently popped value: the slot just above the
    /// stack pointer. This is the canonical result accessor after a
    /// completed run, since every statement ends in `OpPop`.
    pub fn last_popped(&self) -> &Value {
        &self.stack[self.sp]
    }

    /// Hands the globals array back for reuse in a later VM.
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    // -------------------------------------------------------------------------
    // MAIN DISPATCH LOOP
    // -------------------------------------------------------------------------

    /// Executes the instruction stream to completion.
    ///
    /// # Errors
    /// Returns a `MinnowError` on stack overflow, type mismatches,
    /// unusable hash keys, unsupported index operations, or division by
    /// zero.
    pub fn run(&mut self) -> MinnowResult<()> {
        let mut ip = 0;

        while ip < self.instructions.len() {
            let byte = self.instructions[ip];
            let op = Op::from_u8(byte)
                .ok_or_else(|| MinnowError::runtime(format!("undefined opcode {}", byte)))?;

            match op {
                Op::Constant => {
                    let idx = opcode::read_u16(&self.instructions[ip + 1..]) as usize;
                    ip += 2;
                    self.push(self.constants[idx].clone())?;
                }
                Op::True => self.push(Value::Bool(true))?,
                Op::False => self.push(Value::Bool(false))?,
                Op::Null => self.push(Value::Null)?,
                Op::Add | Op::Sub | Op::Mul | Op::Div => {
                    self.execute_binary_operation(op)?;
                }
                Op::Equal | Op::NotEqual | Op::GreaterThan => {
                    self.execute_comparison(op)?;
                }
                Op::Bang => {
                    let operand = self.pop();
                    self.push(Value::Bool(!operand.is_truthy()))?;
                }
                Op::Minus => {
                    self.execute_minus_operator()?;
                }
                Op::Pop => {
                    self.pop();
                }
                Op::Jump => {
                    let target = opcode::read_u16(&self.instructions[ip + 1..]) as usize;
                    ip = target;
                    continue;
                }
                Op::JumpNotTruthy => {
                    let target = opcode::read_u16(&self.instructions[ip + 1..]) as usize;
                    ip += 2;

                    let condition = self.pop();
                    if !condition.is_truthy() {
                        ip = target;
                        continue;
                    }
                }
                Op::GetGlobal => {
                    let slot = opcode::read_u16(&self.instructions[ip + 1..]) as usize;
                    ip += 2;
                    self.push(self.globals[slot].clone())?;
                }
                Op::SetGlobal => {
                    let slot = opcode::read_u16(&self.instructions[ip + 1..]) as usize;
                    ip += 2;
                    self.globals[slot] = self.pop();
                }
                Op::Array => {
                    let count = opcode::read_u16(&self.instructions[ip + 1..]) as usize;
                    ip += 2;

                    let array = self.build_array(self.sp - count, self.sp);
                    self.sp -= count;
                    self.push(array)?;
                }
                Op::Hash => {
                    let count = opcode::read_u16(&self.instructions[ip + 1..]) as usize;
                    ip += 2;

                    let hash = self.build_hash(self.sp - count, self.sp)?;
                    self.sp -= count;
                    self.push(hash)?;
                }
                Op::Index => {
                    self.execute_index_expression()?;
                }
            }

            ip += 1;
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // STACK PRIMITIVES
    // -------------------------------------------------------------------------

    fn push(&mut self, value: Value) -> MinnowResult<()> {
        if self.sp >= STACK_SIZE {
            return Err(MinnowError::runtime("stack overflow"));
        }

        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    /// Pops the top value. The vacated slot keeps its value so
    /// `last_popped` can read it.
    fn pop(&mut self) -> Value {
        self.sp -= 1;
        self.stack[self.sp].clone()
    }

    // -------------------------------------------------------------------------
    // ARITHMETIC & COMPARISON
    // -------------------------------------------------------------------------

    fn execute_binary_operation(&mut self, op: Op) -> MinnowResult<()> {
        let right = self.pop();
        let left = self.pop();

        match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => self.execute_integer_binary_operation(op, *l, *r),
            (Value::Str(l), Value::Str(r)) => {
                if op != Op::Add {
                    return Err(MinnowError::runtime(format!(
                        "unknown string operation: {}",
                        op as u8
                    )));
                }
                self.push(Value::Str(Rc::new(format!("{}{}", l, r))))
            }
            _ => Err(MinnowError::runtime(format!(
                "unsupported types for binary operation: left={}, right={}",
                left.type_name(),
                right.type_name()
            ))),
        }
    }

    /// Integer arithmetic wraps on overflow. Division by zero is the one
    /// fault the host would otherwise panic on, so it surfaces as a
    /// runtime error instead.
    fn execute_integer_binary_operation(&mut self, op: Op, left: i64, right: i64) -> MinnowResult<()> {
        let result = match op {
            Op::Add => left.wrapping_add(right),
            Op::Sub => left.wrapping_sub(right),
            Op::Mul => left.wrapping_mul(right),
            Op::Div => {
                if right == 0 {
                    return Err(MinnowError::runtime("division by zero"));
                }
                left.wrapping_div(right)
            }
            _ => {
                return Err(MinnowError::runtime(format!(
                    "unknown operator: {}",
                    op as u8
                )));
            }
        };

        self.push(Value::Int(result))
    }

    fn execute_comparison(&mut self, op: Op) -> MinnowResult<()> {
        let right = self.pop();
        let left = self.pop();

        if let (Value::Int(l), Value::Int(r)) = (&left, &right) {
            return self.execute_integer_comparison(op, *l, *r);
        }

        match op {
            Op::Equal => self.push(Value::Bool(left.is_identical(&right))),
            Op::NotEqual => self.push(Value::Bool(!left.is_identical(&right))),
            _ => Err(MinnowError::runtime(format!(
                "unknown operator: {} ({} {})",
                op as u8,
                left.type_name(),
                right.type_name()
            ))),
        }
    }

    fn execute_integer_comparison(&mut self, op: Op, left: i64, right: i64) -> MinnowResult<()> {
        let result = match op {
            Op::Equal => left == right,
            Op::NotEqual => left != right,
            Op::GreaterThan => left > right,
            _ => {
                return Err(MinnowError::runtime(format!(
                    "unknown operator: {}",
                    op as u8
                )));
            }
        };

        self.push(Value::Bool(result))
    }

    fn execute_minus_operator(&mut self) -> MinnowResult<()> {
        let operand = self.pop();

        match operand {
            Value::Int(n) => self.push(Value::Int(n.wrapping_neg())),
            other => Err(MinnowError::runtime(format!(
                "unsupported type for minus operation: {}",
                other.type_name()
            ))),
        }
    }

    // -------------------------------------------------------------------------
    // COMPOSITE CONSTRUCTION
    // -------------------------------------------------------------------------

    /// Wraps the stack slots `[start, end)` into an array, preserving
    /// their order.
    fn build_array(&self, start: usize, end: usize) -> Value {
        let elements = self.stack[start..end].to_vec();
        Value::Array(Rc::new(elements))
    }

    /// Builds a hash from the stack slots `[start, end)`, taken as
    /// alternating key, value pairs. A later duplicate key overwrites an
    /// earlier one.
    fn build_hash(&self, start: usize, end: usize) -> MinnowResult<Value> {
        let mut pairs = FxHashMap::default();

        let mut i = start;
        while i < end {
            let key = self.stack[i].clone();
            let value = self.stack[i + 1].clone();

            let hash_key = key.hash_key().ok_or_else(|| {
                MinnowError::runtime(format!("unusable as hash key: {}", key.type_name()))
            })?;

            pairs.insert(hash_key, HashPair { key, value });
            i += 2;
        }

        Ok(Value::Hash(Rc::new(pairs)))
    }

    // -------------------------------------------------------------------------
    // INDEXING
    // -------------------------------------------------------------------------

    fn execute_index_expression(&mut self) -> MinnowResult<()> {
        let index = self.pop();
        let left = self.pop();

        match (&left, &index) {
            (Value::Array(elements), Value::Int(i)) => {
                // Out-of-range reads produce null, not an error.
                let element = if *i < 0 || *i as usize >= elements.len() {
                    Value::Null
                } else {
                    elements[*i as usize].clone()
                };
                self.push(element)
            }
            (Value::Hash(pairs), _) => {
                let key = index.hash_key().ok_or_else(|| {
                    MinnowError::runtime(format!("unusable as hash key: {}", index.type_name()))
                })?;

                let value = match pairs.get(&key) {
                    Some(pair) => pair.value.clone(),
                    None => Value::Null,
                };
                self.push(value)
            }
            _ => Err(MinnowError::runtime(format!(
                "index not supported for object with type={}",
                left.type_name()
            ))),
        }
    }
}
