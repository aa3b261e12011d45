use super::ast::{BinOp, FuncDef};
use super::builtins::Builtin;
use super::format::{format_float, percent_format, quote_str};
use super::{ErrorKind, InterpResult, InterpreterError};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// A user-defined function with its defaults evaluated at `def` time
#[derive(Debug)]
pub struct Function {
    pub def: Rc<FuncDef>,
    pub defaults: Vec<Option<Value>>,
}

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Range(i64, i64, i64),
    Function(Rc<Function>),
    Builtin(Builtin),
}

enum Num {
    Int(i64),
    Float(f64),
}

fn type_error(message: impl Into<String>) -> InterpreterError {
    InterpreterError::runtime(ErrorKind::Type, message)
}

fn zero_division(message: &str) -> InterpreterError {
    InterpreterError::runtime(ErrorKind::ZeroDivision, message)
}

/// Longest string or list a repetition may build
const MAX_REPEAT_LEN: usize = 1 << 26;

fn repeat_count(len: usize, n: &Value) -> InterpResult<usize> {
    let times = usize::try_from(n.as_int().unwrap_or(0).max(0)).unwrap_or(usize::MAX);
    match len.checked_mul(times) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(times),
        _ => Err(InterpreterError::runtime(
            ErrorKind::Overflow,
            "repeated sequence is too long",
        )),
    }
}

pub fn overflow() -> InterpreterError {
    InterpreterError::runtime(ErrorKind::Overflow, "integer overflow")
}

/// Truncate a float to an int the way `int()` does, raising instead of saturating
pub fn float_to_int(f: f64) -> InterpResult<i64> {
    if f.is_nan() {
        return Err(InterpreterError::runtime(
            ErrorKind::Value,
            "cannot convert float NaN to integer",
        ));
    }
    if f.is_infinite() {
        return Err(InterpreterError::runtime(
            ErrorKind::Overflow,
            "cannot convert float infinity to integer",
        ));
    }
    let truncated = f.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(overflow());
    }
    Ok(truncated as i64)
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(items))
    }

    pub fn str(text: impl Into<String>) -> Value {
        Value::Str(text.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Range(..) => "range",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin_function_or_method",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Range(start, stop, step) => range_len(*start, *stop, *step) > 0,
            Value::Function(_) | Value::Builtin(_) => true,
        }
    }

    /// Integer view, treating bools as 0/1
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            other => other.as_int().map(|i| i as f64),
        }
    }

    fn number(&self) -> Option<Num> {
        match self {
            Value::Float(f) => Some(Num::Float(*f)),
            other => other.as_int().map(Num::Int),
        }
    }

    /// Python `str()`
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// Python `repr()`
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => quote_str(s),
            Value::List(items) => {
                let inner: Vec<String> = items.borrow().iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                if inner.len() == 1 {
                    format!("({},)", inner[0])
                } else {
                    format!("({})", inner.join(", "))
                }
            }
            Value::Range(start, stop, 1) => format!("range({}, {})", start, stop),
            Value::Range(start, stop, step) => format!("range({}, {}, {})", start, stop, step),
            Value::Function(func) => format!("<function {}>", func.def.name),
            Value::Builtin(builtin) => format!("<built-in function {}>", builtin.name()),
        }
    }

    /// Python `==`
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || seq_eq(&a.borrow(), &b.borrow())
            }
            (Value::Tuple(a), Value::Tuple(b)) => seq_eq(a, b),
            (Value::Range(a, b, c), Value::Range(x, y, z)) => (a, b, c) == (x, y, z),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => match (self.number(), other.number()) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
                (Some(a), Some(b)) => a.to_f64() == b.to_f64(),
                _ => false,
            },
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`; `None` when unordered (NaN)
    pub fn compare(&self, other: &Value, symbol: &str) -> InterpResult<Option<Ordering>> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
            (Value::List(a), Value::List(b)) => seq_cmp(&a.borrow(), &b.borrow(), symbol),
            (Value::Tuple(a), Value::Tuple(b)) => seq_cmp(a, b, symbol),
            _ => match (self.number(), other.number()) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Some(a.cmp(&b))),
                (Some(a), Some(b)) => Ok(a.to_f64().partial_cmp(&b.to_f64())),
                _ => Err(type_error(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    symbol,
                    self.type_name(),
                    other.type_name()
                ))),
            },
        }
    }

    /// Items of an iterable, snapshotted
    pub fn iterate(&self) -> InterpResult<Vec<Value>> {
        match self {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Tuple(items) => Ok(items.as_ref().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Range(start, stop, step) => {
                if range_len(*start, *stop, *step) > MAX_REPEAT_LEN {
                    return Err(InterpreterError::runtime(
                        ErrorKind::Overflow,
                        "range is too long to materialize",
                    ));
                }
                Ok(range_items(*start, *stop, *step))
            }
            other => Err(type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Python `in`
    pub fn contains(&self, needle: &Value) -> InterpResult<bool> {
        match self {
            Value::Str(haystack) => match needle {
                Value::Str(n) => Ok(haystack.contains(n.as_str())),
                other => Err(type_error(format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ))),
            },
            Value::List(items) => Ok(items.borrow().iter().any(|v| v.py_eq(needle))),
            Value::Tuple(items) => Ok(items.iter().any(|v| v.py_eq(needle))),
            Value::Range(start, stop, step) => Ok(match needle.as_int() {
                Some(n) => {
                    let in_bounds = if *step > 0 {
                        n >= *start && n < *stop
                    } else {
                        n <= *start && n > *stop
                    };
                    in_bounds && (n - start) % step == 0
                }
                None => false,
            }),
            other => Err(type_error(format!(
                "argument of type '{}' is not iterable",
                other.type_name()
            ))),
        }
    }
}

impl Num {
    fn to_f64(&self) -> f64 {
        match self {
            Num::Int(i) => *i as f64,
            Num::Float(f) => *f,
        }
    }
}

fn seq_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
}

fn seq_cmp(a: &[Value], b: &[Value], symbol: &str) -> InterpResult<Option<Ordering>> {
    for (x, y) in a.iter().zip(b) {
        if !x.py_eq(y) {
            return x.compare(y, symbol);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

pub fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let span = if step > 0 {
        (stop as i128 - start as i128 + step as i128 - 1) / step as i128
    } else {
        (start as i128 - stop as i128 - step as i128 - 1) / (-(step as i128))
    };
    usize::try_from(span.max(0)).unwrap_or(usize::MAX)
}

pub fn range_items(start: i64, stop: i64, step: i64) -> Vec<Value> {
    let mut items = Vec::with_capacity(range_len(start, stop, step));
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        items.push(Value::Int(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    items
}

/// Evaluate `left <op> right` with Python semantics
pub fn binary_op(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{}{}", a, b))),
        (BinOp::Add, Value::Str(_), other) => {
            return Err(type_error(format!(
                "can only concatenate str (not \"{}\") to str",
                other.type_name()
            )))
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            return Ok(Value::list(items));
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            return Ok(Value::tuple(items));
        }
        (BinOp::Mul, Value::Str(s), n) | (BinOp::Mul, n, Value::Str(s)) if n.as_int().is_some() => {
            let times = repeat_count(s.len(), n)?;
            return Ok(Value::Str(s.repeat(times)));
        }
        (BinOp::Mul, Value::List(items), n) | (BinOp::Mul, n, Value::List(items))
            if n.as_int().is_some() =>
        {
            let items = items.borrow();
            let times = repeat_count(items.len(), n)?;
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            return Ok(Value::list(repeated));
        }
        (BinOp::Mod, Value::Str(template), args) => {
            return percent_format(template, args).map(Value::Str)
        }
        _ => {}
    }

    match (left.number(), right.number()) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => int_op(op, a, b),
        (Some(a), Some(b)) => float_op(op, a.to_f64(), b.to_f64()),
        _ => Err(type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn int_op(op: BinOp, a: i64, b: i64) -> InterpResult<Value> {
    let value = match op {
        BinOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinOp::Div => {
            if b == 0 {
                return Err(zero_division("division by zero"));
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(zero_division("integer modulo by zero"));
            }
            let r = a.checked_rem(b).ok_or_else(overflow)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if b < 0 {
                return float_op(op, a as f64, b as f64);
            }
            let exp = u32::try_from(b).map_err(|_| overflow())?;
            a.checked_pow(exp).ok_or_else(overflow)?
        }
    };
    Ok(Value::Int(value))
}

fn float_op(op: BinOp, a: f64, b: f64) -> InterpResult<Value> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(zero_division("float division by zero"));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(zero_division("float floor division by zero"));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(zero_division("float modulo"));
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(zero_division("0.0 cannot be raised to a negative power"));
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(InterpreterError::runtime(
                    ErrorKind::Value,
                    "negative number cannot be raised to a fractional power",
                ));
            }
            let result = a.powf(b);
            if result.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(InterpreterError::runtime(
                    ErrorKind::Overflow,
                    "(34, 'Numerical result out of range')",
                ));
            }
            result
        }
    };
    Ok(Value::Float(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(op: BinOp, a: Value, b: Value) -> Value {
        binary_op(op, &a, &b).unwrap()
    }

    #[test]
    fn test_floor_division_and_modulo_follow_divisor_sign() {
        assert!(op(BinOp::FloorDiv, Value::Int(-7), Value::Int(2)).py_eq(&Value::Int(-4)));
        assert!(op(BinOp::Mod, Value::Int(-7), Value::Int(2)).py_eq(&Value::Int(1)));
        assert!(op(BinOp::Mod, Value::Int(7), Value::Int(-2)).py_eq(&Value::Int(-1)));
        assert!(op(BinOp::Mod, Value::Float(-7.5), Value::Int(2)).py_eq(&Value::Float(0.5)));
    }

    #[test]
    fn test_true_division_is_float() {
        let result = op(BinOp::Div, Value::Int(8), Value::Int(2));
        assert_eq!(result.repr(), "4.0");
    }

    #[test]
    fn test_zero_division_messages() {
        let err = binary_op(BinOp::Div, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.to_string(), "division by zero");
        let err = binary_op(BinOp::Mod, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.to_string(), "integer modulo by zero");
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = binary_op(BinOp::Mul, &Value::Int(i64::MAX), &Value::Int(2)).unwrap_err();
        assert_eq!(err.kind_name(), "OverflowError");
    }

    #[test]
    fn test_str_concat_type_error() {
        let err = binary_op(BinOp::Add, &Value::str("a"), &Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "can only concatenate str (not \"int\") to str");
    }

    #[test]
    fn test_repetition() {
        assert_eq!(op(BinOp::Mul, Value::str("ab"), Value::Int(3)).to_str(), "ababab");
        assert_eq!(op(BinOp::Mul, Value::Int(2), Value::list(vec![Value::Int(0)])).repr(), "[0, 0]");
    }

    #[test]
    fn test_repr_of_containers() {
        let value = Value::list(vec![Value::str("a"), Value::Int(1), Value::Bool(true), Value::None]);
        assert_eq!(value.repr(), "['a', 1, True, None]");
        assert_eq!(Value::tuple(vec![Value::Int(1)]).repr(), "(1,)");
    }

    #[test]
    fn test_mixed_numeric_equality() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::str("1").py_eq(&Value::Int(1)));
    }

    #[test]
    fn test_ordering_type_error() {
        let err = Value::str("a").compare(&Value::Int(1), "<").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'<' not supported between instances of 'str' and 'int'"
        );
    }

    #[test]
    fn test_range_helpers() {
        assert_eq!(range_len(0, 10, 3), 4);
        assert_eq!(range_len(10, 0, -2), 5);
        assert_eq!(range_len(5, 0, 1), 0);
        let items: Vec<i64> = range_items(10, 0, -3).iter().filter_map(Value::as_int).collect();
        assert_eq!(items, vec![10, 7, 4, 1]);
        assert!(Value::Range(0, 10, 2).contains(&Value::Int(4)).unwrap());
        assert!(!Value::Range(0, 10, 2).contains(&Value::Int(5)).unwrap());
    }
}
