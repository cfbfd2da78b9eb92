use std::collections::HashMap;
use std::rc::Rc;

use crate::builtins;
use crate::environment::{Env, Environment};
use crate::object::{HashPair, Value};
use crate::parser::{BlockStatement, Expression, Program, Statement};

pub const TRUE: Value = Value::Boolean(true);
pub const FALSE: Value = Value::Boolean(false);
pub const NULL: Value = Value::Null;

/*
Evaluation is a plain recursive walk: every node maps to a value, and two
in-band sentinels steer control flow. `Error` aborts whatever contains it.
`ReturnValue` bubbles up through blocks untouched and is unwrapped in exactly
two places, the program loop and function application, which is how `return`
escapes nested blocks but never crosses a call boundary.
*/

/// Evaluate a whole program. The terminal `ReturnValue` is unwrapped here;
/// an `Error` stops evaluation and is returned as-is.
pub fn eval(program: &Program, env: &Env) -> Value {
    let mut result = NULL;
    for statement in &program.statements {
        match eval_statement(statement, env) {
            Value::ReturnValue(value) => return *value,
            error @ Value::Error(_) => return error,
            value => result = value,
        }
    }
    result
}

fn eval_statement(statement: &Statement, env: &Env) -> Value {
    match statement {
        Statement::Expression(expression) => eval_expression(expression, env),
        Statement::Return(value) => {
            let value = eval_expression(value, env);
            if is_error(&value) {
                return value;
            }
            Value::ReturnValue(Box::new(value))
        }
        Statement::Let { name, value } => {
            let value = eval_expression(value, env);
            if is_error(&value) {
                return value;
            }
            env.borrow_mut().define(name.clone(), value);
            NULL
        }
    }
}

// Unlike the program loop this leaves ReturnValue wrapped, so a `return`
// inside nested blocks reaches the enclosing function boundary intact.
fn eval_block_statement(block: &BlockStatement, env: &Env) -> Value {
    let mut result = NULL;
    for statement in &block.statements {
        result = eval_statement(statement, env);
        if matches!(result, Value::ReturnValue(_) | Value::Error(_)) {
            return result;
        }
    }
    result
}

fn eval_expression(expression: &Expression, env: &Env) -> Value {
    match expression {
        Expression::IntegerLiteral(value) => Value::Integer(*value),
        Expression::StringLiteral(value) => Value::String(value.clone()),
        Expression::Boolean(value) => native_bool_to_boolean(*value),
        Expression::Identifier(name) => eval_identifier(name, env),
        Expression::Prefix { operator, right } => {
            let right = eval_expression(right, env);
            if is_error(&right) {
                return right;
            }
            eval_prefix_expression(operator, right)
        }
        Expression::Infix {
            left,
            operator,
            right,
        } => {
            let left = eval_expression(left, env);
            if is_error(&left) {
                return left;
            }
            let right = eval_expression(right, env);
            if is_error(&right) {
                return right;
            }
            eval_infix_expression(operator, left, right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env);
            if is_error(&condition) {
                return condition;
            }
            if is_truthy(&condition) {
                eval_block_statement(consequence, env)
            } else if let Some(alternative) = alternative {
                eval_block_statement(alternative, env)
            } else {
                NULL
            }
        }
        Expression::FunctionLiteral { parameters, body } => Value::Function {
            parameters: parameters.clone(),
            body: body.clone(),
            env: Rc::clone(env),
        },
        Expression::Call {
            function,
            arguments,
        } => {
            let function = eval_expression(function, env);
            if is_error(&function) {
                return function;
            }
            match eval_expressions(arguments, env) {
                Ok(arguments) => apply_function(function, arguments),
                Err(error) => error,
            }
        }
        Expression::ArrayLiteral(elements) => match eval_expressions(elements, env) {
            Ok(elements) => Value::Array(elements),
            Err(error) => error,
        },
        Expression::Index { left, index } => {
            let left = eval_expression(left, env);
            if is_error(&left) {
                return left;
            }
            let index = eval_expression(index, env);
            if is_error(&index) {
                return index;
            }
            eval_index_expression(left, index)
        }
        Expression::HashLiteral(pairs) => eval_hash_literal(pairs, env),
    }
}

// left to right; the first error comes back alone
fn eval_expressions(expressions: &[Expression], env: &Env) -> Result<Vec<Value>, Value> {
    let mut values = Vec::with_capacity(expressions.len());
    for expression in expressions {
        let value = eval_expression(expression, env);
        if is_error(&value) {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

fn eval_identifier(name: &str, env: &Env) -> Value {
    if let Some(value) = env.borrow().get(name) {
        return value;
    }
    // bound names shadow builtins, so this comes second
    if let Some(builtin) = builtins::lookup(name) {
        return builtin;
    }
    Value::Error(format!("identifier not found: {}", name))
}

fn eval_prefix_expression(operator: &str, right: Value) -> Value {
    match operator {
        "!" => eval_bang_operator(right),
        "-" => match right {
            Value::Integer(value) => Value::Integer(-value),
            other => Value::Error(format!("unknown operator: -{}", other.type_name())),
        },
        _ => Value::Error(format!(
            "unknown operator: {}{}",
            operator,
            right.type_name()
        )),
    }
}

fn eval_bang_operator(right: Value) -> Value {
    match right {
        Value::Boolean(true) => FALSE,
        Value::Boolean(false) => TRUE,
        Value::Null => TRUE,
        _ => FALSE,
    }
}

fn eval_infix_expression(operator: &str, left: Value, right: Value) -> Value {
    match (&left, &right) {
        (Value::Integer(l), Value::Integer(r)) => eval_integer_infix_expression(operator, *l, *r),
        (Value::String(l), Value::String(r)) => eval_string_infix_expression(operator, l, r),
        _ => {
            if left.type_name() != right.type_name() {
                return Value::Error(format!(
                    "type mismatch: {} {} {}",
                    left.type_name(),
                    operator,
                    right.type_name()
                ));
            }
            match operator {
                "==" => native_bool_to_boolean(values_identical(&left, &right)),
                "!=" => native_bool_to_boolean(!values_identical(&left, &right)),
                _ => Value::Error(format!(
                    "unknown operator: {} {} {}",
                    left.type_name(),
                    operator,
                    right.type_name()
                )),
            }
        }
    }
}

// Identity comparison for the non-integer, non-string operands of == and !=.
// Booleans and null are singletons, so comparing the variant is comparing
// the identity; functions, arrays and hashes are distinct objects every time
// they are evaluated and therefore never equal.
fn values_identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Boolean(l), Value::Boolean(r)) => l == r,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

fn eval_integer_infix_expression(operator: &str, left: i64, right: i64) -> Value {
    match operator {
        "+" => Value::Integer(left.wrapping_add(right)),
        "-" => Value::Integer(left.wrapping_sub(right)),
        "*" => Value::Integer(left.wrapping_mul(right)),
        "/" => {
            if right == 0 {
                Value::Error("division by zero".to_string())
            } else {
                Value::Integer(left.wrapping_div(right))
            }
        }
        "<" => native_bool_to_boolean(left < right),
        ">" => native_bool_to_boolean(left > right),
        "==" => native_bool_to_boolean(left == right),
        "!=" => native_bool_to_boolean(left != right),
        _ => Value::Error(format!(
            "unknown operator: INTEGER {} INTEGER",
            operator
        )),
    }
}

fn eval_string_infix_expression(operator: &str, left: &str, right: &str) -> Value {
    if operator != "+" {
        return Value::Error(format!("unknown operator: STRING {} STRING", operator));
    }
    Value::String(format!("{}{}", left, right))
}

fn apply_function(function: Value, arguments: Vec<Value>) -> Value {
    match function {
        Value::Function {
            parameters,
            body,
            env,
        } => {
            if arguments.len() != parameters.len() {
                return Value::Error(format!(
                    "wrong number of arguments: want={}, got={}",
                    parameters.len(),
                    arguments.len()
                ));
            }
            // fresh activation record chained to the captured environment
            let call_env = Environment::new_enclosed(&env);
            {
                let mut scope = call_env.borrow_mut();
                for (parameter, argument) in parameters.iter().zip(arguments) {
                    scope.define(parameter.clone(), argument);
                }
            }
            unwrap_return_value(eval_block_statement(&body, &call_env))
        }
        Value::Builtin { function, .. } => function(arguments),
        other => Value::Error(format!("not a function: {}", other.type_name())),
    }
}

// peel exactly one layer; errors pass through untouched
fn unwrap_return_value(value: Value) -> Value {
    match value {
        Value::ReturnValue(inner) => *inner,
        other => other,
    }
}

fn eval_index_expression(left: Value, index: Value) -> Value {
    match (&left, &index) {
        (Value::Array(elements), Value::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                NULL
            } else {
                elements[*i as usize].clone()
            }
        }
        (Value::Hash(pairs), _) => match index.hash_key() {
            Some(key) => pairs
                .get(&key)
                .map(|pair| pair.value.clone())
                .unwrap_or(NULL),
            None => Value::Error(format!("unusable as hash key: {}", index.type_name())),
        },
        _ => Value::Error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Env) -> Value {
    let mut hash = HashMap::new();
    for (key_expression, value_expression) in pairs {
        let key = eval_expression(key_expression, env);
        if is_error(&key) {
            return key;
        }
        let Some(hash_key) = key.hash_key() else {
            return Value::Error(format!("unusable as hash key: {}", key.type_name()));
        };
        let value = eval_expression(value_expression, env);
        if is_error(&value) {
            return value;
        }
        hash.insert(hash_key, HashPair { key, value });
    }
    Value::Hash(hash)
}

fn native_bool_to_boolean(value: bool) -> Value {
    if value { TRUE } else { FALSE }
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Boolean(false) | Value::Null)
}

fn is_error(value: &Value) -> bool {
    matches!(value, Value::Error(_))
}
