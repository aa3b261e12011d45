use super::eval::Interpreter;
use super::format::{format_spec, quote_str};
use super::value::{float_to_int, overflow, range_len, Value};
use super::{ErrorKind, InterpResult, InterpreterError};
use crate::stdio::write_stdout;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Input,
    Int,
    Float,
    Str,
    Bool,
    Len,
    Abs,
    Max,
    Min,
    Sum,
    Range,
    Round,
    List,
    Tuple,
    Map,
    Sorted,
    Reversed,
    Enumerate,
    Zip,
    Ord,
    Chr,
    Format,
}

const BUILTINS: &[(&str, Builtin)] = &[
    ("print", Builtin::Print),
    ("input", Builtin::Input),
    ("int", Builtin::Int),
    ("float", Builtin::Float),
    ("str", Builtin::Str),
    ("bool", Builtin::Bool),
    ("len", Builtin::Len),
    ("abs", Builtin::Abs),
    ("max", Builtin::Max),
    ("min", Builtin::Min),
    ("sum", Builtin::Sum),
    ("range", Builtin::Range),
    ("round", Builtin::Round),
    ("list", Builtin::List),
    ("tuple", Builtin::Tuple),
    ("map", Builtin::Map),
    ("sorted", Builtin::Sorted),
    ("reversed", Builtin::Reversed),
    ("enumerate", Builtin::Enumerate),
    ("zip", Builtin::Zip),
    ("ord", Builtin::Ord),
    ("chr", Builtin::Chr),
    ("format", Builtin::Format),
];

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, b)| *b)
    }

    pub fn name(self) -> &'static str {
        BUILTINS
            .iter()
            .find(|(_, b)| *b == self)
            .map(|(n, _)| *n)
            .unwrap_or("builtin")
    }
}

fn type_error(message: impl Into<String>) -> InterpreterError {
    InterpreterError::runtime(ErrorKind::Type, message)
}

fn value_error(message: impl Into<String>) -> InterpreterError {
    InterpreterError::runtime(ErrorKind::Value, message)
}

type Kwargs = Vec<(String, Value)>;

fn check_arity(name: &str, args: &[Value], min: usize, max: usize) -> InterpResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("exactly {}", min)
        } else if args.len() < min {
            format!("at least {}", min)
        } else {
            format!("at most {}", max)
        };
        let noun = if expected.ends_with(" 1") { "argument" } else { "arguments" };
        return Err(type_error(format!(
            "{}() takes {} {} ({} given)",
            name,
            expected,
            noun,
            args.len()
        )));
    }
    Ok(())
}

/// Take the named keyword arguments; anything left over is an error
fn take_kwargs<const N: usize>(
    name: &str,
    kwargs: Kwargs,
    allowed: [&str; N],
) -> InterpResult<[Option<Value>; N]> {
    let mut found: [Option<Value>; N] = std::array::from_fn(|_| None);
    for (key, value) in kwargs {
        match allowed.iter().position(|a| *a == key) {
            Some(i) => found[i] = Some(value),
            None => {
                return Err(type_error(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    name, key
                )))
            }
        }
    }
    Ok(found)
}

fn expect_int(value: &Value) -> InterpResult<i64> {
    value.as_int().ok_or_else(|| {
        type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn expect_str<'v>(value: &'v Value, context: &str) -> InterpResult<&'v str> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(type_error(format!(
            "{} must be str, not {}",
            context,
            other.type_name()
        ))),
    }
}

fn optional_str(value: Option<Value>, default: &str, context: &str) -> InterpResult<String> {
    match value {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(value) => expect_str(&value, context).map(str::to_string),
    }
}

/// Parse an `int()` string argument: optional sign, digits, inner underscores
fn parse_int_literal(text: &str, base: u32) -> InterpResult<i64> {
    let invalid = || {
        value_error(format!(
            "invalid literal for int() with base {}: {}",
            base,
            quote_str(text)
        ))
    };
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return Err(invalid());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if !cleaned.chars().all(|c| c.is_digit(base)) {
        return Err(invalid());
    }
    let magnitude = i64::from_str_radix(&cleaned, base).map_err(|_| overflow())?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_float_literal(text: &str) -> InterpResult<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    cleaned.parse::<f64>().map_err(|_| {
        value_error(format!(
            "could not convert string to float: {}",
            quote_str(text)
        ))
    })
}

fn len_of(value: &Value) -> InterpResult<usize> {
    match value {
        Value::Str(s) => Ok(s.chars().count()),
        Value::List(items) => Ok(items.borrow().len()),
        Value::Tuple(items) => Ok(items.len()),
        Value::Range(start, stop, step) => Ok(range_len(*start, *stop, *step)),
        other => Err(type_error(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
    }
}

/// Sort with Python ordering; the first comparison error wins
fn sort_values(items: &mut [(Value, Value)], reverse: bool) -> InterpResult<()> {
    let mut error = None;
    items.sort_by(|(a, _), (b, _)| {
        let (left, right) = if reverse { (b, a) } else { (a, b) };
        match left.compare(right, "<") {
            Ok(Some(ordering)) => ordering,
            Ok(None) => Ordering::Equal,
            Err(e) => {
                error.get_or_insert(e);
                Ordering::Equal
            }
        }
    });
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

impl<'a> Interpreter<'a> {
    /// Pair each item with its sort key
    fn keyed(&mut self, items: Vec<Value>, key: Option<Value>) -> InterpResult<Vec<(Value, Value)>> {
        match key {
            None | Some(Value::None) => Ok(items.into_iter().map(|v| (v.clone(), v)).collect()),
            Some(func) => items
                .into_iter()
                .map(|item| {
                    let k = self.call_value(func.clone(), vec![item.clone()], Vec::new())?;
                    Ok((k, item))
                })
                .collect(),
        }
    }

    fn extreme(&mut self, name: &str, args: Vec<Value>, kwargs: Kwargs, want: Ordering) -> InterpResult<Value> {
        let [key, default] = take_kwargs(name, kwargs, ["key", "default"])?;
        if args.is_empty() {
            return Err(type_error(format!("{} expected at least 1 argument, got 0", name)));
        }
        let items = if args.len() == 1 {
            args[0].iterate()?
        } else {
            args
        };
        if items.is_empty() {
            return default
                .ok_or_else(|| value_error(format!("{}() arg is an empty sequence", name)));
        }

        let mut best: Option<(Value, Value)> = None;
        for (k, item) in self.keyed(items, key)? {
            let replace = match &best {
                None => true,
                Some((best_key, _)) => k.compare(best_key, if want == Ordering::Greater { ">" } else { "<" })? == Some(want),
            };
            if replace {
                best = Some((k, item));
            }
        }
        Ok(best.map(|(_, item)| item).unwrap_or(Value::None))
    }

    pub(crate) fn call_builtin(&mut self, builtin: Builtin, args: Vec<Value>, kwargs: Kwargs) -> InterpResult<Value> {
        let name = builtin.name();
        match builtin {
            Builtin::Print => {
                let [sep, end, _flush] = take_kwargs(name, kwargs, ["sep", "end", "flush"])?;
                let sep = optional_str(sep, " ", "sep")?;
                let end = optional_str(end, "\n", "end")?;
                let parts: Vec<String> = args.iter().map(Value::to_str).collect();
                write_stdout(&format!("{}{}", parts.join(&sep), end));
                Ok(Value::None)
            }
            Builtin::Input => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 0, 1)?;
                // the prompt is accepted but never echoed
                Ok(Value::Str(self.read_input()))
            }
            Builtin::Int => {
                let [base_kw] = take_kwargs(name, kwargs, ["base"])?;
                check_arity(name, &args, 0, 2)?;
                let base = match args.get(1).or(base_kw.as_ref()) {
                    Some(base) => {
                        let base = expect_int(base)?;
                        u32::try_from(base)
                            .ok()
                            .filter(|b| (2..=36).contains(b))
                            .ok_or_else(|| value_error("int() base must be >= 2 and <= 36, or 0"))?
                    }
                    None => 10,
                };
                match args.first() {
                    None => Ok(Value::Int(0)),
                    Some(Value::Str(s)) => parse_int_literal(s, base).map(Value::Int),
                    Some(_) if args.len() == 2 => Err(type_error(
                        "int() can't convert non-string with explicit base",
                    )),
                    Some(Value::Float(f)) => float_to_int(*f).map(Value::Int),
                    Some(v) => v.as_int().map(Value::Int).ok_or_else(|| {
                        type_error(format!(
                            "int() argument must be a string or a real number, not '{}'",
                            v.type_name()
                        ))
                    }),
                }
            }
            Builtin::Float => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 0, 1)?;
                match args.first() {
                    None => Ok(Value::Float(0.0)),
                    Some(Value::Str(s)) => parse_float_literal(s).map(Value::Float),
                    Some(v) => v.as_f64().map(Value::Float).ok_or_else(|| {
                        type_error(format!(
                            "float() argument must be a string or a real number, not '{}'",
                            v.type_name()
                        ))
                    }),
                }
            }
            Builtin::Str => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 0, 1)?;
                Ok(Value::Str(args.first().map(Value::to_str).unwrap_or_default()))
            }
            Builtin::Bool => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 0, 1)?;
                Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
            }
            Builtin::Len => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 1, 1)?;
                let len = len_of(&args[0])?;
                Ok(Value::Int(i64::try_from(len).map_err(|_| overflow())?))
            }
            Builtin::Abs => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 1, 1)?;
                match &args[0] {
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    v => match v.as_int() {
                        Some(i) => i.checked_abs().map(Value::Int).ok_or_else(overflow),
                        None => Err(type_error(format!(
                            "bad operand type for abs(): '{}'",
                            v.type_name()
                        ))),
                    },
                }
            }
            Builtin::Max => self.extreme(name, args, kwargs, Ordering::Greater),
            Builtin::Min => self.extreme(name, args, kwargs, Ordering::Less),
            Builtin::Sum => {
                let [start_kw] = take_kwargs(name, kwargs, ["start"])?;
                check_arity(name, &args, 1, 2)?;
                let mut total = args.get(1).cloned().or(start_kw).unwrap_or(Value::Int(0));
                if let Value::Str(_) = total {
                    return Err(type_error("sum() can't sum strings [use ''.join(seq) instead]"));
                }
                for item in args[0].iterate()? {
                    total = super::value::binary_op(super::ast::BinOp::Add, &total, &item)?;
                }
                Ok(total)
            }
            Builtin::Range => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 1, 3)?;
                let ints = args.iter().map(expect_int).collect::<InterpResult<Vec<_>>>()?;
                let (start, stop, step) = match ints.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => unreachable!("arity checked above"),
                };
                if step == 0 {
                    return Err(value_error("range() arg 3 must not be zero"));
                }
                Ok(Value::Range(start, stop, step))
            }
            Builtin::Round => {
                let [ndigits_kw] = take_kwargs(name, kwargs, ["ndigits"])?;
                check_arity(name, &args, 1, 2)?;
                let ndigits = match args.get(1).or(ndigits_kw.as_ref()) {
                    None | Some(Value::None) => None,
                    Some(n) => Some(expect_int(n)?),
                };
                round(&args[0], ndigits)
            }
            Builtin::List | Builtin::Tuple => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 0, 1)?;
                let items = match args.first() {
                    Some(v) => v.iterate()?,
                    None => Vec::new(),
                };
                Ok(if builtin == Builtin::List {
                    Value::list(items)
                } else {
                    Value::tuple(items)
                })
            }
            Builtin::Map => {
                take_kwargs(name, kwargs, [])?;
                if args.len() < 2 {
                    return Err(type_error("map() must have at least two arguments."));
                }
                let mut args = args.into_iter();
                let func = args.next().unwrap_or(Value::None);
                let columns = args.map(|v| v.iterate()).collect::<InterpResult<Vec<_>>>()?;
                let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
                let mut out = Vec::with_capacity(rows);
                for row in 0..rows {
                    let call_args = columns.iter().map(|c| c[row].clone()).collect();
                    out.push(self.call_value(func.clone(), call_args, Vec::new())?);
                }
                Ok(Value::list(out))
            }
            Builtin::Sorted => {
                let [key, reverse] = take_kwargs(name, kwargs, ["key", "reverse"])?;
                check_arity(name, &args, 1, 1)?;
                let items = args[0].iterate()?;
                let mut keyed = self.keyed(items, key)?;
                sort_values(&mut keyed, reverse.is_some_and(|r| r.is_truthy()))?;
                Ok(Value::list(keyed.into_iter().map(|(_, v)| v).collect()))
            }
            Builtin::Reversed => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 1, 1)?;
                let mut items = args[0].iterate()?;
                items.reverse();
                Ok(Value::list(items))
            }
            Builtin::Enumerate => {
                let [start_kw] = take_kwargs(name, kwargs, ["start"])?;
                check_arity(name, &args, 1, 2)?;
                let start = match args.get(1).or(start_kw.as_ref()) {
                    Some(v) => expect_int(v)?,
                    None => 0,
                };
                let mut out = Vec::new();
                for (offset, item) in args[0].iterate()?.into_iter().enumerate() {
                    let index = start.checked_add(offset as i64).ok_or_else(overflow)?;
                    out.push(Value::tuple(vec![Value::Int(index), item]));
                }
                Ok(Value::list(out))
            }
            Builtin::Zip => {
                take_kwargs(name, kwargs, [])?;
                let columns = args.iter().map(Value::iterate).collect::<InterpResult<Vec<_>>>()?;
                let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
                let out = (0..rows)
                    .map(|row| Value::tuple(columns.iter().map(|c| c[row].clone()).collect()))
                    .collect();
                Ok(Value::list(out))
            }
            Builtin::Ord => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 1, 1)?;
                let s = expect_str(&args[0], "ord() argument")?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
                    _ => Err(type_error(format!(
                        "ord() expected a character, but string of length {} found",
                        s.chars().count()
                    ))),
                }
            }
            Builtin::Chr => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 1, 1)?;
                let code = expect_int(&args[0])?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|c| Value::Str(c.to_string()))
                    .ok_or_else(|| value_error("chr() arg not in range(0x110000)"))
            }
            Builtin::Format => {
                take_kwargs(name, kwargs, [])?;
                check_arity(name, &args, 1, 2)?;
                let spec = match args.get(1) {
                    Some(v) => expect_str(v, "format() argument 2")?.to_string(),
                    None => String::new(),
                };
                format_spec(&args[0], &spec).map(Value::Str)
            }
        }
    }

    pub(crate) fn call_method(
        &mut self,
        receiver: &Value,
        method: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> InterpResult<Value> {
        match receiver {
            Value::Str(s) => self.str_method(s, method, args, kwargs),
            Value::List(_) => self.list_method(receiver, method, args, kwargs),
            other => Err(no_attribute(other, method)),
        }
    }

    fn str_method(&mut self, s: &str, method: &str, args: Vec<Value>, kwargs: Kwargs) -> InterpResult<Value> {
        let strings = |items: Vec<&str>| Value::list(items.into_iter().map(Value::str).collect());
        match method {
            "split" => {
                let [sep_kw, maxsplit_kw] = take_kwargs(method, kwargs, ["sep", "maxsplit"])?;
                check_arity(method, &args, 0, 2)?;
                let sep = args.first().cloned().or(sep_kw);
                let maxsplit = match args.get(1).or(maxsplit_kw.as_ref()) {
                    Some(v) => expect_int(v)?,
                    None => -1,
                };
                match sep {
                    None | Some(Value::None) => {
                        if maxsplit < 0 {
                            return Ok(strings(s.split_whitespace().collect()));
                        }
                        Ok(strings(split_whitespace_n(s, maxsplit as usize)))
                    }
                    Some(sep) => {
                        let sep = expect_str(&sep, "separator")?;
                        if sep.is_empty() {
                            return Err(value_error("empty separator"));
                        }
                        if maxsplit < 0 {
                            Ok(strings(s.split(sep).collect()))
                        } else {
                            Ok(strings(s.splitn(maxsplit as usize + 1, sep).collect()))
                        }
                    }
                }
            }
            "strip" | "lstrip" | "rstrip" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 0, 1)?;
                let chars = match args.first() {
                    None | Some(Value::None) => None,
                    Some(v) => Some(expect_str(v, "strip arg")?.to_string()),
                };
                let matcher = |c: char| match &chars {
                    Some(set) => set.contains(c),
                    None => c.is_whitespace(),
                };
                let stripped = match method {
                    "strip" => s.trim_matches(matcher),
                    "lstrip" => s.trim_start_matches(matcher),
                    _ => s.trim_end_matches(matcher),
                };
                Ok(Value::str(stripped))
            }
            "lower" | "upper" | "title" | "capitalize" | "swapcase" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 0, 0)?;
                let text = match method {
                    "lower" => s.to_lowercase(),
                    "upper" => s.to_uppercase(),
                    "title" => title_case(s),
                    "capitalize" => {
                        let mut chars = s.chars();
                        match chars.next() {
                            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                            None => String::new(),
                        }
                    }
                    _ => s
                        .chars()
                        .flat_map(|c| {
                            if c.is_uppercase() {
                                c.to_lowercase().collect::<Vec<_>>()
                            } else {
                                c.to_uppercase().collect::<Vec<_>>()
                            }
                        })
                        .collect(),
                };
                Ok(Value::Str(text))
            }
            "isdigit" | "isalpha" | "isalnum" | "isspace" | "isupper" | "islower" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 0, 0)?;
                let result = match method {
                    "isdigit" => !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
                    "isalpha" => !s.is_empty() && s.chars().all(char::is_alphabetic),
                    "isalnum" => !s.is_empty() && s.chars().all(char::is_alphanumeric),
                    "isspace" => !s.is_empty() && s.chars().all(char::is_whitespace),
                    "isupper" => s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase),
                    _ => s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase),
                };
                Ok(Value::Bool(result))
            }
            "join" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 1, 1)?;
                let mut parts = Vec::new();
                for (i, item) in args[0].iterate()?.iter().enumerate() {
                    match item {
                        Value::Str(part) => parts.push(part.clone()),
                        other => {
                            return Err(type_error(format!(
                                "sequence item {}: expected str instance, {} found",
                                i,
                                other.type_name()
                            )))
                        }
                    }
                }
                Ok(Value::Str(parts.join(s)))
            }
            "replace" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 2, 3)?;
                let old = expect_str(&args[0], "replace() argument 1")?;
                let new = expect_str(&args[1], "replace() argument 2")?;
                match args.get(2) {
                    Some(count) => {
                        let count = expect_int(count)?;
                        if count < 0 {
                            Ok(Value::Str(s.replace(old, new)))
                        } else {
                            Ok(Value::Str(s.replacen(old, new, count as usize)))
                        }
                    }
                    None => Ok(Value::Str(s.replace(old, new))),
                }
            }
            "startswith" | "endswith" | "find" | "count" | "index" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 1, 1)?;
                let needle = expect_str(&args[0], "argument")?;
                match method {
                    "startswith" => Ok(Value::Bool(s.starts_with(needle))),
                    "endswith" => Ok(Value::Bool(s.ends_with(needle))),
                    "count" => {
                        let n = if needle.is_empty() {
                            s.chars().count() + 1
                        } else {
                            s.matches(needle).count()
                        };
                        Ok(Value::Int(n as i64))
                    }
                    _ => match s.find(needle) {
                        Some(byte) => Ok(Value::Int(s[..byte].chars().count() as i64)),
                        None if method == "find" => Ok(Value::Int(-1)),
                        None => Err(value_error("substring not found")),
                    },
                }
            }
            "format" => format_method(s, &args, &kwargs).map(Value::Str),
            _ => Err(no_attribute(&Value::str(s), method)),
        }
    }

    fn list_method(&mut self, receiver: &Value, method: &str, args: Vec<Value>, kwargs: Kwargs) -> InterpResult<Value> {
        let Value::List(items) = receiver else {
            return Err(no_attribute(receiver, method));
        };
        match method {
            "append" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 1, 1)?;
                items.borrow_mut().extend(args);
                Ok(Value::None)
            }
            "extend" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 1, 1)?;
                let extra = args[0].iterate()?;
                items.borrow_mut().extend(extra);
                Ok(Value::None)
            }
            "insert" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 2, 2)?;
                let mut list = items.borrow_mut();
                let len = list.len() as i64;
                let mut at = expect_int(&args[0])?;
                if at < 0 {
                    at = (at + len).max(0);
                }
                let at = at.min(len) as usize;
                list.insert(at, args[1].clone());
                Ok(Value::None)
            }
            "pop" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 0, 1)?;
                let mut list = items.borrow_mut();
                if list.is_empty() {
                    return Err(InterpreterError::runtime(ErrorKind::Index, "pop from empty list"));
                }
                let len = list.len() as i64;
                let index = match args.first() {
                    Some(v) => expect_int(v)?,
                    None => -1,
                };
                let resolved = if index < 0 { index + len } else { index };
                if resolved < 0 || resolved >= len {
                    return Err(InterpreterError::runtime(ErrorKind::Index, "pop index out of range"));
                }
                Ok(list.remove(resolved as usize))
            }
            "remove" | "index" | "count" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 1, 1)?;
                let position = items.borrow().iter().position(|v| v.py_eq(&args[0]));
                match method {
                    "count" => Ok(Value::Int(
                        items.borrow().iter().filter(|v| v.py_eq(&args[0])).count() as i64,
                    )),
                    "index" => position
                        .map(|p| Value::Int(p as i64))
                        .ok_or_else(|| value_error(format!("{} is not in list", args[0].repr()))),
                    _ => match position {
                        Some(p) => {
                            items.borrow_mut().remove(p);
                            Ok(Value::None)
                        }
                        None => Err(value_error("list.remove(x): x not in list")),
                    },
                }
            }
            "sort" => {
                let [key, reverse] = take_kwargs(method, kwargs, ["key", "reverse"])?;
                check_arity(method, &args, 0, 0)?;
                let snapshot = items.borrow().clone();
                let mut keyed = self.keyed(snapshot, key)?;
                sort_values(&mut keyed, reverse.is_some_and(|r| r.is_truthy()))?;
                *items.borrow_mut() = keyed.into_iter().map(|(_, v)| v).collect();
                Ok(Value::None)
            }
            "reverse" | "clear" | "copy" => {
                take_kwargs(method, kwargs, [])?;
                check_arity(method, &args, 0, 0)?;
                match method {
                    "reverse" => {
                        items.borrow_mut().reverse();
                        Ok(Value::None)
                    }
                    "clear" => {
                        items.borrow_mut().clear();
                        Ok(Value::None)
                    }
                    _ => Ok(Value::list(items.borrow().clone())),
                }
            }
            _ => Err(no_attribute(receiver, method)),
        }
    }
}

fn no_attribute(receiver: &Value, name: &str) -> InterpreterError {
    InterpreterError::runtime(
        ErrorKind::Attribute,
        format!("'{}' object has no attribute '{}'", receiver.type_name(), name),
    )
}

fn split_whitespace_n(s: &str, maxsplit: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if parts.len() == maxsplit {
            parts.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                parts.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }
    parts
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_cased = false;
    for c in s.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = c.is_alphabetic();
    }
    out
}

fn round(value: &Value, ndigits: Option<i64>) -> InterpResult<Value> {
    match (value, ndigits) {
        (Value::Float(f), None) => float_to_int(f.round_ties_even()).map(Value::Int),
        (Value::Float(f), Some(_)) if !f.is_finite() => Ok(Value::Float(*f)),
        (Value::Float(f), Some(n)) if n >= 0 => {
            let digits = usize::try_from(n.min(300)).unwrap_or(300);
            let text = format!("{:.*}", digits, f);
            Ok(Value::Float(text.parse().unwrap_or(*f)))
        }
        // every finite float rounds to zero this far left of the point
        (Value::Float(f), Some(n)) if n < -308 => Ok(Value::Float(0.0 * f)),
        (Value::Float(f), Some(n)) => {
            let scale = 10f64.powi(i32::try_from(-n).unwrap_or(i32::MAX));
            let rounded = (f / scale).round_ties_even() * scale;
            if rounded.is_infinite() {
                return Err(InterpreterError::runtime(
                    ErrorKind::Overflow,
                    "rounded value too large to represent",
                ));
            }
            Ok(Value::Float(rounded))
        }
        (v, ndigits) => match v.as_int() {
            Some(i) => match ndigits {
                Some(n) if n < 0 => {
                    let scale = 10i64.checked_pow(u32::try_from(-n).unwrap_or(u32::MAX));
                    Ok(Value::Int(match scale {
                        Some(scale) => round_int_half_even(i, scale)?,
                        None => 0,
                    }))
                }
                _ => Ok(Value::Int(i)),
            },
            None => Err(type_error(format!(
                "type {} doesn't define __round__ method",
                v.type_name()
            ))),
        },
    }
}

/// Round `i` to a multiple of `scale`, ties to even, in exact integer arithmetic
fn round_int_half_even(i: i64, scale: i64) -> InterpResult<i64> {
    let quotient = i.div_euclid(scale);
    let twice_remainder = i.rem_euclid(scale) * 2;
    let quotient = if twice_remainder > scale || (twice_remainder == scale && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    };
    quotient.checked_mul(scale).ok_or_else(overflow)
}

/// `str.format` with `{}`, `{0}` and `{name}` fields plus optional specs
fn format_method(template: &str, args: &[Value], kwargs: &[(String, Value)]) -> InterpResult<String> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::new();
    let mut auto_index = 0usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                out.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                out.push('}');
                i += 2;
            }
            '{' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == '}')
                    .map(|offset| i + offset)
                    .ok_or_else(|| value_error("expected '}' before end of string"))?;
                let field: String = chars[i + 1..close].iter().collect();
                let (name, spec) = match field.split_once(':') {
                    Some((name, spec)) => (name.to_string(), spec.to_string()),
                    None => (field, String::new()),
                };
                let value = if name.is_empty() {
                    let value = args.get(auto_index);
                    auto_index += 1;
                    value
                } else if let Ok(index) = name.parse::<usize>() {
                    args.get(index)
                } else {
                    kwargs.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
                };
                let value = value.ok_or_else(|| {
                    InterpreterError::runtime(
                        ErrorKind::Index,
                        "Replacement index out of range for positional args tuple",
                    )
                })?;
                out.push_str(&format_spec(value, &spec)?);
                i = close + 1;
            }
            '}' => return Err(value_error("Single '}' encountered in format string")),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_round_trip() {
        for (name, builtin) in BUILTINS {
            assert_eq!(Builtin::from_name(name), Some(*builtin));
            assert_eq!(builtin.name(), *name);
        }
        assert_eq!(Builtin::from_name("exec"), None);
    }

    #[test]
    fn test_parse_int_literal() {
        assert_eq!(parse_int_literal(" 42 ", 10).unwrap(), 42);
        assert_eq!(parse_int_literal("-7", 10).unwrap(), -7);
        assert_eq!(parse_int_literal("1_000", 10).unwrap(), 1000);
        assert_eq!(parse_int_literal("ff", 16).unwrap(), 255);
        let err = parse_int_literal("", 10).unwrap_err();
        assert_eq!(err.to_string(), "invalid literal for int() with base 10: ''");
        let err = parse_int_literal("4.5", 10).unwrap_err();
        assert_eq!(err.to_string(), "invalid literal for int() with base 10: '4.5'");
    }

    #[test]
    fn test_parse_float_literal() {
        assert_eq!(parse_float_literal(" 2.5\n").unwrap(), 2.5);
        assert_eq!(parse_float_literal("1e3").unwrap(), 1000.0);
        let err = parse_float_literal("abc").unwrap_err();
        assert_eq!(err.to_string(), "could not convert string to float: 'abc'");
    }

    #[test]
    fn test_round_half_to_even() {
        assert!(round(&Value::Float(2.5), None).unwrap().py_eq(&Value::Int(2)));
        assert!(round(&Value::Float(3.5), None).unwrap().py_eq(&Value::Int(4)));
        assert!(round(&Value::Float(3.14159), Some(2)).unwrap().py_eq(&Value::Float(3.14)));
        assert!(round(&Value::Int(1234), Some(-2)).unwrap().py_eq(&Value::Int(1200)));
        assert!(round(&Value::Int(250), Some(-2)).unwrap().py_eq(&Value::Int(200)));
        assert!(round(&Value::Int(-150), Some(-2)).unwrap().py_eq(&Value::Int(-200)));
    }

    #[test]
    fn test_round_extreme_ndigits() {
        let Value::Float(f) = round(&Value::Float(1.5), Some(-400)).unwrap() else {
            panic!("round of a float must stay a float");
        };
        assert_eq!(f, 0.0);
        assert!(round(&Value::Float(1234.5), Some(-2)).unwrap().py_eq(&Value::Float(1200.0)));
        assert!(round(&Value::Float(1.5), Some(400)).unwrap().py_eq(&Value::Float(1.5)));
        assert!(round(&Value::Int(i64::MAX), Some(-1)).is_err());
        assert!(round(&Value::Int(7), Some(-400)).unwrap().py_eq(&Value::Int(0)));
        let err = round(&Value::Float(f64::MAX), Some(-308)).unwrap_err();
        assert_eq!(err.to_string(), "rounded value too large to represent");
        assert!(round(&Value::Float(f64::NAN), None).is_err());
    }

    #[test]
    fn test_split_whitespace_with_limit() {
        assert_eq!(split_whitespace_n("  a b   c ", 1), vec!["a", "b   c "]);
        assert_eq!(split_whitespace_n("a b", 5), vec!["a", "b"]);
    }

    #[test]
    fn test_format_method() {
        let args = vec![Value::str("x"), Value::Float(0.5)];
        assert_eq!(format_method("{} = {:.2f}", &args, &[]).unwrap(), "x = 0.50");
        assert_eq!(format_method("{1}{0}", &args, &[]).unwrap(), "0.5x");
        let kwargs = vec![("n".to_string(), Value::Int(3))];
        assert_eq!(format_method("n={n} {{}}", &[], &kwargs).unwrap(), "n=3 {}");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hello wORLD"), "Hello World");
    }
}
