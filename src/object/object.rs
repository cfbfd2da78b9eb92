use std::collections::HashMap;

use crate::environment::Env;
use crate::parser::BlockStatement;

/// Native function: takes the evaluated arguments, returns a value (which
/// may itself be an `Error`).
pub type BuiltinFunction = fn(Vec<Value>) -> Value;

/// A runtime value. `ReturnValue` and `Error` are in-band control values:
/// the first only exists between a `return` statement and the enclosing
/// function or program boundary, the second aborts every operation it flows
/// through.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
    ReturnValue(Box<Value>),
    Error(String),
    Function {
        parameters: Vec<String>,
        body: BlockStatement,
        env: Env,
    },
    Builtin {
        name: &'static str,
        function: BuiltinFunction,
    },
    Array(Vec<Value>),
    Hash(HashMap<HashKey, HashPair>),
}

// Structural equality for the primitives, plus error/return wrappers and
// arrays so tests can compare results directly. Functions, builtins and
// hashes are never equal; the evaluator implements the language's own
// comparison rules itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::ReturnValue(a), Value::ReturnValue(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Null => "NULL",
            Value::ReturnValue(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
            Value::Function { .. } => "FUNCTION",
            Value::Builtin { .. } => "BUILTIN",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
        }
    }

    /// Human-facing rendering. Not parseable back; strings print raw and
    /// hash iteration order is unspecified.
    pub fn inspect(&self) -> String {
        match self {
            Value::Integer(value) => value.to_string(),
            Value::Boolean(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Null => "null".to_string(),
            Value::ReturnValue(value) => value.inspect(),
            Value::Error(message) => format!("ERROR: {}", message),
            Value::Function {
                parameters, body, ..
            } => format!("fn({}) {{\n{}\n}}", parameters.join(", "), body),
            Value::Builtin { .. } => "builtin function".to_string(),
            Value::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(|e| e.inspect()).collect();
                format!("[{}]", elements.join(", "))
            }
            Value::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect();
                format!("{{{}}}", pairs.join(", "))
            }
        }
    }

    /// Only integers, booleans and strings can key a hash.
    pub fn hash_key(&self) -> Option<HashKey> {
        let key = match self {
            Value::Integer(value) => HashKey {
                object_type: self.type_name(),
                value: *value as u64,
            },
            Value::Boolean(value) => HashKey {
                object_type: self.type_name(),
                value: u64::from(*value),
            },
            Value::String(value) => HashKey {
                object_type: self.type_name(),
                value: fnv1a(value.as_bytes()),
            },
            _ => return None,
        };
        Some(key)
    }
}

/// Key identity inside a hash value: the operand's type tag plus a 64-bit
/// fingerprint. Two strings with colliding fingerprints would compare equal;
/// acceptable at the input sizes this language sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub object_type: &'static str,
    pub value: u64,
}

/// A stored hash entry keeps the original key value so pairs can be
/// inspected back out.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
