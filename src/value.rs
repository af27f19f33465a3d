//! # Value Module
//!
//! Runtime value representation for the Minnow interpreter.
//! Heap-allocated payloads (strings, arrays, hashes) are shared via `Rc`
//! — **no garbage collector**. Memory is freed deterministically when the
//! last reference is dropped.
//!
//! ## Key Design
//! - `Int`, `Bool`, `Null` are inline (no heap allocation).
//! - `Str` uses `Rc<String>` for shared ownership with cheap cloning.
//! - `Array` uses `Rc<Vec<Value>>`; arrays are immutable once built.
//! - `Hash` maps a [`HashKey`] to its original key/value pair, so lookups
//!   are by content while the stored key keeps its display form.
//! - Only `Int`, `Bool`, and `Str` values can serve as hash keys.

use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;

// -----------------------------------------------------------------------------
// HASH KEY
// -----------------------------------------------------------------------------

/// Canonical equality identity for hashable values.
///
/// Two hashable values are the same key iff their tag and contents are
/// equal: integers key by numeric value, booleans by their bool, strings
/// by byte content. `Null`, arrays, and hashes produce no key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Int(i64),
    Bool(bool),
    Str(Rc<String>),
}

/// A key/value entry stored in a hash, keeping the original key value
/// for display purposes.
#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

// -----------------------------------------------------------------------------
// VALUE — Core Runtime Type
// -----------------------------------------------------------------------------

/// The core runtime value type for the Minnow interpreter.
///
/// Designed for minimal overhead:
/// - Primitives (`Int`, `Bool`, `Null`) are stored inline.
/// - Heap types use `Rc` for deterministic shared ownership.
/// - Clone is cheap: primitives are copied, heap types bump a refcount.
#[derive(Clone)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// The null value.
    Null,
    /// Reference-counted string.
    Str(Rc<String>),
    /// Reference-counted, immutable array.
    Array(Rc<Vec<Value>>),
    /// Reference-counted hash, keyed by content identity.
    Hash(Rc<FxHashMap<HashKey, HashPair>>),
}

impl Value {
    /// Returns `true` if this value is considered "truthy" in boolean context.
    ///
    /// Only `false` and `null` are falsy. Everything else is truthy,
    /// including `0` and the empty string.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            _ => true,
        }
    }

    /// Returns the type name of this value as a static string.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
        }
    }

    /// Derives the hash key for this value, or `None` if the value is not
    /// hashable (`null`, arrays, and hashes).
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Int(n) => Some(HashKey::Int(*n)),
            Value::Bool(b) => Some(HashKey::Bool(*b)),
            Value::Str(s) => Some(HashKey::Str(s.clone())),
            _ => None,
        }
    }

    /// Identity comparison, as used by the VM's equality opcodes on
    /// non-integer operands.
    ///
    /// `Bool` and `Null` compare by contents, which is indistinguishable
    /// from shared-singleton identity. Heap values compare by pointer, so
    /// two separately built strings or arrays are never identical even
    /// when their contents agree.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns the string representation of this value.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Int(n) => format!("{}", n),
            Value::Bool(b) => format!("{}", b),
            Value::Null => "null".to_string(),
            Value::Str(s) => s.as_ref().clone(),
            Value::Array(elements) => {
                let parts: Vec<String> = elements.iter().map(quoted_display).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Hash(pairs) => {
                let parts: Vec<String> = pairs
                    .values()
                    .map(|pair| {
                        format!("{}: {}", quoted_display(&pair.key), quoted_display(&pair.value))
                    })
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }
}

/// Like `to_display_string`, but strings keep their quotes. Used inside
/// array and hash listings so elements stay readable.
fn quoted_display(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("\"{}\"", s),
        other => other.to_display_string(),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// Structural equality — used by tests and by integer comparison in the VM.
// The VM's equality opcodes go through `is_identical` for non-integers.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
