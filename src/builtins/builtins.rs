use crate::object::{BuiltinFunction, Value};

/// Name → native function table. Consulted only after the environment chain
/// misses, so user bindings shadow builtins.
pub const BUILTINS: &[(&str, BuiltinFunction)] = &[
    ("len", len),
    ("puts", puts),
    ("first", first),
    ("last", last),
    ("rest", rest),
    ("push", push),
];

pub fn lookup(name: &str) -> Option<Value> {
    BUILTINS
        .iter()
        .copied()
        .find(|(builtin_name, _)| *builtin_name == name)
        .map(|(name, function)| Value::Builtin { name, function })
}

fn wrong_arity(want: usize, got: usize) -> Value {
    Value::Error(format!(
        "wrong number of arguments: want={}, got={}",
        want, got
    ))
}

fn unsupported_argument(builtin: &str, argument: &Value) -> Value {
    Value::Error(format!(
        "argument to `{}` not supported, got {}",
        builtin,
        argument.type_name()
    ))
}

// string length is in bytes, matching the byte-oriented lexer
fn len(arguments: Vec<Value>) -> Value {
    if arguments.len() != 1 {
        return wrong_arity(1, arguments.len());
    }
    match &arguments[0] {
        Value::String(value) => Value::Integer(value.len() as i64),
        Value::Array(elements) => Value::Integer(elements.len() as i64),
        other => unsupported_argument("len", other),
    }
}

fn puts(arguments: Vec<Value>) -> Value {
    for argument in &arguments {
        println!("{}", argument.inspect());
    }
    Value::Null
}

fn first(arguments: Vec<Value>) -> Value {
    if arguments.len() != 1 {
        return wrong_arity(1, arguments.len());
    }
    match &arguments[0] {
        Value::Array(elements) => elements.first().cloned().unwrap_or(Value::Null),
        other => unsupported_argument("first", other),
    }
}

fn last(arguments: Vec<Value>) -> Value {
    if arguments.len() != 1 {
        return wrong_arity(1, arguments.len());
    }
    match &arguments[0] {
        Value::Array(elements) => elements.last().cloned().unwrap_or(Value::Null),
        other => unsupported_argument("last", other),
    }
}

// a new array without the head; the empty array has no tail
fn rest(arguments: Vec<Value>) -> Value {
    if arguments.len() != 1 {
        return wrong_arity(1, arguments.len());
    }
    match &arguments[0] {
        Value::Array(elements) => {
            if elements.is_empty() {
                Value::Null
            } else {
                Value::Array(elements[1..].to_vec())
            }
        }
        other => unsupported_argument("rest", other),
    }
}

// non-destructive: the source array is left untouched
fn push(arguments: Vec<Value>) -> Value {
    if arguments.len() != 2 {
        return wrong_arity(2, arguments.len());
    }
    match &arguments[0] {
        Value::Array(elements) => {
            let mut pushed = elements.clone();
            pushed.push(arguments[1].clone());
            Value::Array(pushed)
        }
        other => unsupported_argument("push", other),
    }
}
