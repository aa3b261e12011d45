use super::ast::{BinOp, BoolOp, CmpOp, CompClause, Expr, FStrPart, FuncDef, Stmt, StmtKind, UnaryOp};
use super::format::format_spec;
use super::value::{binary_op, overflow, Function, Value};
use super::builtins::Builtin;
use super::{ErrorKind, InterpResult, InterpreterError, MAX_CALL_DEPTH};
use crate::stdio::InputCursor;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Local scope of a function call or a list comprehension
#[derive(Default)]
struct Frame {
    vars: HashMap<String, Value>,
    globals: HashSet<String>,
    /// Comprehension frames see through to the enclosing scope
    transparent: bool,
}

/// How a statement finished
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter<'a> {
    input: &'a mut InputCursor,
    globals: HashMap<String, Value>,
    frames: Vec<Frame>,
    depth: usize,
}

fn type_error(message: impl Into<String>) -> InterpreterError {
    InterpreterError::runtime(ErrorKind::Type, message)
}

fn index_error(message: impl Into<String>) -> InterpreterError {
    InterpreterError::runtime(ErrorKind::Index, message)
}

impl<'a> Interpreter<'a> {
    pub fn new(input: &'a mut InputCursor) -> Self {
        Interpreter {
            input,
            globals: HashMap::new(),
            frames: Vec::new(),
            depth: 0,
        }
    }

    pub fn run(&mut self, program: &[Stmt]) -> InterpResult<()> {
        match self.exec_block(program)? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(InterpreterError::syntax("'return' outside function", 0)),
            Flow::Break | Flow::Continue => {
                Err(InterpreterError::syntax("'break' outside loop", 0))
            }
        }
    }

    /// Next input line; empty once the case's input is used up
    pub(crate) fn read_input(&mut self) -> String {
        self.input.read_line()
    }

    fn lookup(&self, name: &str) -> InterpResult<Value> {
        for frame in self.frames.iter().rev() {
            if frame.globals.contains(name) {
                break;
            }
            if let Some(value) = frame.vars.get(name) {
                return Ok(value.clone());
            }
            if !frame.transparent {
                break;
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        Builtin::from_name(name).map(Value::Builtin).ok_or_else(|| {
            InterpreterError::runtime(
                ErrorKind::Name,
                format!("name '{}' is not defined", name),
            )
        })
    }

    fn bind(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) if !frame.globals.contains(name) => {
                frame.vars.insert(name.to_string(), value);
            }
            _ => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    fn exec_block(&mut self, body: &[Stmt]) -> InterpResult<Flow> {
        for stmt in body {
            match self.exec(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> InterpResult<Flow> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::Assign(targets, value) => {
                let value = self.eval(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
            }
            StmtKind::AugAssign(target, op, value) => self.aug_assign(target, *op, value)?,
            StmtKind::If { branches, orelse } => {
                for (cond, body) in branches {
                    if self.eval(cond)?.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                if let Some(body) = orelse {
                    return self.exec_block(body);
                }
            }
            StmtKind::While(cond, body) => {
                while self.eval(cond)?.is_truthy() {
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            StmtKind::For(target, iter, body) => return self.exec_for(target, iter, body),
            StmtKind::Def(def) => {
                let defaults = def
                    .params
                    .iter()
                    .map(|p| p.default.as_ref().map(|d| self.eval(d)).transpose())
                    .collect::<InterpResult<Vec<_>>>()?;
                let function = Function {
                    def: Rc::clone(def),
                    defaults,
                };
                self.bind(&def.name, Value::Function(Rc::new(function)));
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Global(names) => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.globals.extend(names.iter().cloned());
                }
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Pass => {}
        }
        Ok(Flow::Normal)
    }

    fn exec_for(&mut self, target: &Expr, iter: &Expr, body: &[Stmt]) -> InterpResult<Flow> {
        let iterable = self.eval(iter)?;

        // ranges are walked lazily so `range(10**9)` with an early break stays cheap
        if let Value::Range(start, stop, step) = iterable {
            let mut current = start;
            while (step > 0 && current < stop) || (step < 0 && current > stop) {
                self.assign(target, Value::Int(current))?;
                match self.exec_block(body)? {
                    Flow::Break => break,
                    Flow::Return(value) => return Ok(Flow::Return(value)),
                    Flow::Normal | Flow::Continue => {}
                }
                match current.checked_add(step) {
                    Some(next) => current = next,
                    None => break,
                }
            }
            return Ok(Flow::Normal);
        }

        for item in iterable.iterate()? {
            self.assign(target, item)?;
            match self.exec_block(body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    fn assign(&mut self, target: &Expr, value: Value) -> InterpResult<()> {
        match target {
            Expr::Name(name) => {
                self.bind(name, value);
                Ok(())
            }
            Expr::Index(container, index) => {
                let container = self.eval(container)?;
                let index = self.eval(index)?;
                set_item(&container, &index, value)
            }
            Expr::Tuple(targets) | Expr::List(targets) => {
                let values = value.iterate()?;
                if values.len() < targets.len() {
                    return Err(InterpreterError::runtime(
                        ErrorKind::Value,
                        format!(
                            "not enough values to unpack (expected {}, got {})",
                            targets.len(),
                            values.len()
                        ),
                    ));
                }
                if values.len() > targets.len() {
                    return Err(InterpreterError::runtime(
                        ErrorKind::Value,
                        format!("too many values to unpack (expected {})", targets.len()),
                    ));
                }
                for (target, value) in targets.iter().zip(values) {
                    self.assign(target, value)?;
                }
                Ok(())
            }
            _ => Err(type_error("cannot assign to expression")),
        }
    }

    fn aug_assign(&mut self, target: &Expr, op: BinOp, value: &Expr) -> InterpResult<()> {
        match target {
            Expr::Name(name) => {
                let current = self.lookup(name)?;
                let rhs = self.eval(value)?;
                // `lst += other` extends in place so aliases see the change
                if let (BinOp::Add, Value::List(items)) = (op, &current) {
                    if matches!(rhs, Value::List(_) | Value::Tuple(_) | Value::Str(_) | Value::Range(..)) {
                        let extra = rhs.iterate()?;
                        items.borrow_mut().extend(extra);
                        return Ok(());
                    }
                }
                let updated = binary_op(op, &current, &rhs)?;
                self.bind(name, updated);
                Ok(())
            }
            Expr::Index(container, index) => {
                let container = self.eval(container)?;
                let index = self.eval(index)?;
                let current = get_item(&container, &index)?;
                let rhs = self.eval(value)?;
                let updated = binary_op(op, &current, &rhs)?;
                set_item(&container, &index, updated)
            }
            _ => Err(type_error("illegal expression for augmented assignment")),
        }
    }

    fn eval(&mut self, expr: &Expr) -> InterpResult<Value> {
        match expr {
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::FString(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FStrPart::Lit(text) => out.push_str(text),
                        FStrPart::Expr(expr, spec) => {
                            let value = self.eval(expr)?;
                            match spec {
                                Some(spec) => out.push_str(&format_spec(&value, spec)?),
                                None => out.push_str(&value.to_str()),
                            }
                        }
                    }
                }
                Ok(Value::Str(out))
            }
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => Ok(Value::list(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::tuple(self.eval_all(items)?)),
            Expr::ListComp(element, clauses) => {
                self.frames.push(Frame {
                    transparent: true,
                    ..Frame::default()
                });
                let mut out = Vec::new();
                let result = self.comprehension(element, clauses, &mut out);
                self.frames.pop();
                result.map(|()| Value::list(out))
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                unary_op(*op, &value)
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary_op(*op, &left, &right)
            }
            Expr::Compare(first, rest) => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::BoolOp(op, left, right) => {
                let left = self.eval(left)?;
                match (op, left.is_truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::IfExp { cond, then, orelse } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(orelse)
                }
            }
            Expr::Call { func, args, kwargs } => {
                if let Expr::Attribute(object, method) = func.as_ref() {
                    let object = self.eval(object)?;
                    let (args, kwargs) = self.eval_args(args, kwargs)?;
                    return self.call_method(&object, method, args, kwargs);
                }
                let callee = self.eval(func)?;
                let (args, kwargs) = self.eval_args(args, kwargs)?;
                self.call_value(callee, args, kwargs)
            }
            Expr::Attribute(object, name) => {
                let object = self.eval(object)?;
                Err(InterpreterError::runtime(
                    ErrorKind::Attribute,
                    format!("'{}' object has no attribute '{}'", object.type_name(), name),
                ))
            }
            Expr::Index(container, index) => {
                let container = self.eval(container)?;
                let index = self.eval(index)?;
                get_item(&container, &index)
            }
            Expr::Slice {
                target,
                lower,
                upper,
                step,
            } => {
                let target = self.eval(target)?;
                let lower = self.slice_bound(lower.as_deref())?;
                let upper = self.slice_bound(upper.as_deref())?;
                let step = self.slice_bound(step.as_deref())?;
                get_slice(&target, lower, upper, step)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> InterpResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn eval_args(
        &mut self,
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> InterpResult<(Vec<Value>, Vec<(String, Value)>)> {
        let args = self.eval_all(args)?;
        let kwargs = kwargs
            .iter()
            .map(|(name, value)| Ok((name.clone(), self.eval(value)?)))
            .collect::<InterpResult<Vec<_>>>()?;
        Ok((args, kwargs))
    }

    fn slice_bound(&mut self, expr: Option<&Expr>) -> InterpResult<Option<i64>> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        match self.eval(expr)? {
            Value::None => Ok(None),
            value => value.as_int().map(Some).ok_or_else(|| {
                type_error("slice indices must be integers or None or have an __index__ method")
            }),
        }
    }

    fn comprehension(&mut self, element: &Expr, clauses: &[CompClause], out: &mut Vec<Value>) -> InterpResult<()> {
        let Some((clause, rest)) = clauses.split_first() else {
            out.push(self.eval(element)?);
            return Ok(());
        };
        match clause {
            CompClause::If(cond) => {
                if self.eval(cond)?.is_truthy() {
                    self.comprehension(element, rest, out)?;
                }
            }
            CompClause::For(target, iter) => {
                for item in self.eval(iter)?.iterate()? {
                    self.assign(target, item)?;
                    self.comprehension(element, rest, out)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn call_value(&mut self, callee: Value, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> InterpResult<Value> {
        match callee {
            Value::Builtin(builtin) => self.call_builtin(builtin, args, kwargs),
            Value::Function(function) => self.call_function(&function, args, kwargs),
            other => Err(type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> InterpResult<Value> {
        let def: &FuncDef = &function.def;
        let vars = bind_arguments(function, args, kwargs)?;

        if self.depth >= MAX_CALL_DEPTH {
            return Err(InterpreterError::runtime(
                ErrorKind::Recursion,
                "maximum recursion depth exceeded",
            ));
        }
        self.frames.push(Frame {
            vars,
            ..Frame::default()
        });
        self.depth += 1;
        let result = self.exec_block(&def.body);
        self.depth -= 1;
        self.frames.pop();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
            Flow::Break | Flow::Continue => Err(InterpreterError::syntax("'break' outside loop", 0)),
        }
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

/// Match call arguments to parameters, filling defaults
fn bind_arguments(function: &Function, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> InterpResult<HashMap<String, Value>> {
    let def = &function.def;
    let name = &def.name;
    if args.len() > def.params.len() {
        return Err(type_error(format!(
            "{}() takes {} but {} given",
            name,
            plural(def.params.len(), "positional argument"),
            if args.len() == 1 { "1 was".to_string() } else { format!("{} were", args.len()) }
        )));
    }

    let mut slots: Vec<Option<Value>> = vec![None; def.params.len()];
    for (slot, value) in slots.iter_mut().zip(args) {
        *slot = Some(value);
    }
    for (key, value) in kwargs {
        let index = def
            .params
            .iter()
            .position(|p| p.name == key)
            .ok_or_else(|| type_error(format!("{}() got an unexpected keyword argument '{}'", name, key)))?;
        if slots[index].is_some() {
            return Err(type_error(format!("{}() got multiple values for argument '{}'", name, key)));
        }
        slots[index] = Some(value);
    }

    let mut vars = HashMap::with_capacity(slots.len());
    let mut missing = Vec::new();
    for ((param, slot), default) in def.params.iter().zip(slots).zip(&function.defaults) {
        match slot.or_else(|| default.clone()) {
            Some(value) => {
                vars.insert(param.name.clone(), value);
            }
            None => missing.push(format!("'{}'", param.name)),
        }
    }
    if !missing.is_empty() {
        let listed = match missing.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
            _ => missing.join(""),
        };
        return Err(type_error(format!(
            "{}() missing {}: {}",
            name,
            plural(missing.len(), "required positional argument"),
            listed
        )));
    }
    Ok(vars)
}

fn unary_op(op: UnaryOp, value: &Value) -> InterpResult<Value> {
    match (op, value) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Float(f)) => Ok(Value::Float(*f)),
        (op, v) => match v.as_int() {
            Some(i) if op == UnaryOp::Neg => i.checked_neg().map(Value::Int).ok_or_else(overflow),
            Some(i) => Ok(Value::Int(i)),
            None => Err(type_error(format!(
                "bad operand type for unary {}: '{}'",
                if op == UnaryOp::Neg { "-" } else { "+" },
                v.type_name()
            ))),
        },
    }
}

/// Identity for `is`; immutable scalars compare by value
fn is_same(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
        (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        _ => false,
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> InterpResult<bool> {
    let ordered = |symbol: &str, accept: &[Ordering]| -> InterpResult<bool> {
        Ok(left
            .compare(right, symbol)?
            .is_some_and(|ordering| accept.contains(&ordering)))
    };
    match op {
        CmpOp::Eq => Ok(left.py_eq(right)),
        CmpOp::NotEq => Ok(!left.py_eq(right)),
        CmpOp::Lt => ordered("<", &[Ordering::Less]),
        CmpOp::LtE => ordered("<=", &[Ordering::Less, Ordering::Equal]),
        CmpOp::Gt => ordered(">", &[Ordering::Greater]),
        CmpOp::GtE => ordered(">=", &[Ordering::Greater, Ordering::Equal]),
        CmpOp::In => right.contains(left),
        CmpOp::NotIn => right.contains(left).map(|found| !found),
        CmpOp::Is => Ok(is_same(left, right)),
        CmpOp::IsNot => Ok(!is_same(left, right)),
    }
}

/// Resolve a possibly negative index against `len`
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

fn integer_index(container: &Value, index: &Value) -> InterpResult<i64> {
    index.as_int().ok_or_else(|| match container {
        Value::Str(_) => type_error("string indices must be integers"),
        other => type_error(format!(
            "{} indices must be integers or slices, not {}",
            other.type_name(),
            index.type_name()
        )),
    })
}

fn get_item(container: &Value, index: &Value) -> InterpResult<Value> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let i = integer_index(container, index)?;
            resolve_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| index_error("list index out of range"))
        }
        Value::Tuple(items) => {
            let i = integer_index(container, index)?;
            resolve_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| index_error("tuple index out of range"))
        }
        Value::Str(s) => {
            let i = integer_index(container, index)?;
            let len = s.chars().count();
            resolve_index(i, len)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(|| index_error("string index out of range"))
        }
        Value::Range(start, stop, step) => {
            let i = integer_index(container, index)?;
            let len = super::value::range_len(*start, *stop, *step);
            resolve_index(i, len)
                .and_then(|i| (i as i64).checked_mul(*step))
                .and_then(|offset| start.checked_add(offset))
                .map(Value::Int)
                .ok_or_else(|| index_error("range object index out of range"))
        }
        other => Err(type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn set_item(container: &Value, index: &Value, value: Value) -> InterpResult<()> {
    match container {
        Value::List(items) => {
            let i = integer_index(container, index)?;
            let mut items = items.borrow_mut();
            let slot = resolve_index(i, items.len())
                .ok_or_else(|| index_error("list assignment index out of range"))?;
            items[slot] = value;
            Ok(())
        }
        other => Err(type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Positions selected by `[lower:upper:step]` on a sequence of `len`
fn slice_positions(len: usize, lower: Option<i64>, upper: Option<i64>, step: i64) -> Vec<usize> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64, floor: i64, ceiling: i64| {
        let bound = if bound < 0 { bound.saturating_add(len) } else { bound };
        bound.clamp(floor, ceiling)
    };
    let mut positions = Vec::new();
    if step > 0 {
        let mut i = lower.map_or(0, |b| clamp(b, 0, len));
        let end = upper.map_or(len, |b| clamp(b, 0, len));
        while i < end {
            positions.push(i as usize);
            i = i.saturating_add(step);
        }
    } else {
        let mut i = lower.map_or(len - 1, |b| clamp(b, -1, len - 1));
        let end = upper.map_or(-1, |b| clamp(b, -1, len - 1));
        while i > end {
            positions.push(i as usize);
            i = i.saturating_add(step);
        }
    }
    positions
}

fn get_slice(target: &Value, lower: Option<i64>, upper: Option<i64>, step: Option<i64>) -> InterpResult<Value> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(InterpreterError::runtime(
            ErrorKind::Value,
            "slice step cannot be zero",
        ));
    }
    match target {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let picked = slice_positions(chars.len(), lower, upper, step)
                .into_iter()
                .map(|i| chars[i])
                .collect();
            Ok(Value::Str(picked))
        }
        Value::List(items) => {
            let items = items.borrow();
            let picked = slice_positions(items.len(), lower, upper, step)
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(Value::list(picked))
        }
        Value::Tuple(items) => {
            let picked = slice_positions(items.len(), lower, upper, step)
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(Value::tuple(picked))
        }
        Value::Range(..) => {
            let items = target.iterate()?;
            let picked = slice_positions(items.len(), lower, upper, step)
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(Value::list(picked))
        }
        other => Err(type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::interp::run;
    use crate::stdio::{InputCursor, StdoutRedirect};

    /// Run a program with the given input lines and return what it printed
    fn exec(source: &str, input: &[&str]) -> Result<String, String> {
        let redirect = StdoutRedirect::acquire(1 << 20);
        let mut cursor = InputCursor::new(input.iter().map(|s| s.to_string()).collect());
        let result = run(source, &mut cursor);
        let (output, _) = redirect.finish();
        result.map(|()| output).map_err(|e| e.to_string())
    }

    #[test]
    fn test_sum_of_two_numbers() {
        let source = "a = int(input())\nb = int(input())\nprint(a + b)\n";
        assert_eq!(exec(source, &["5", "3"]).unwrap(), "8\n");
    }

    #[test]
    fn test_exhausted_input_reads_empty() {
        let source = "a = input()\nb = input()\nprint(len(a), len(b))\n";
        assert_eq!(exec(source, &[]).unwrap(), "0 0\n");
    }

    #[test]
    fn test_functions_defaults_and_recursion() {
        let source = "\
def fact(n, acc=1):
    if n <= 1:
        return acc
    return fact(n - 1, acc * n)

print(fact(5), fact(3, acc=2))
";
        assert_eq!(exec(source, &[]).unwrap(), "120 12\n");
    }

    #[test]
    fn test_recursion_limit() {
        let source = "def f(n):\n    return f(n + 1)\nf(0)\n";
        assert_eq!(exec(source, &[]).unwrap_err(), "maximum recursion depth exceeded");
    }

    #[test]
    fn test_loops_break_continue() {
        let source = "\
total = 0
for i in range(10):
    if i % 2 == 0:
        continue
    if i > 7:
        break
    total += i
n = 0
while True:
    n += 1
    if n == 3:
        break
print(total, n)
";
        assert_eq!(exec(source, &[]).unwrap(), "16 3\n");
    }

    #[test]
    fn test_lazy_range_with_early_break() {
        let source = "for i in range(10**12):\n    if i == 2:\n        break\nprint(i)\n";
        assert_eq!(exec(source, &[]).unwrap(), "2\n");
    }

    #[test]
    fn test_name_error() {
        assert_eq!(exec("print(x)\n", &[]).unwrap_err(), "name 'x' is not defined");
    }

    #[test]
    fn test_global_statement() {
        let source = "count = 0\ndef bump():\n    global count\n    count += 1\nbump()\nbump()\nprint(count)\n";
        assert_eq!(exec(source, &[]).unwrap(), "2\n");
    }

    #[test]
    fn test_local_scope_does_not_leak() {
        let source = "def f():\n    y = 1\n    return y\nf()\nprint(y)\n";
        assert_eq!(exec(source, &[]).unwrap_err(), "name 'y' is not defined");
    }

    #[test]
    fn test_list_operations_and_aliasing() {
        let source = "\
a = [3, 1, 2]
b = a
b.append(0)
a += [9]
a.sort()
print(a, b is a, a[-1], a[1:3], a[::-1])
";
        assert_eq!(
            exec(source, &[]).unwrap(),
            "[0, 1, 2, 3, 9] True 9 [1, 2] [9, 3, 2, 1, 0]\n"
        );
    }

    #[test]
    fn test_comprehension_and_map() {
        let source = "\
nums = list(map(int, input().split()))
squares = [n * n for n in nums if n % 2]
print(squares, sum(nums), max(nums), min(nums))
";
        assert_eq!(exec(source, &["1 2 3 4 5"]).unwrap(), "[1, 9, 25] 15 5 1\n");
    }

    #[test]
    fn test_tuple_unpacking_errors() {
        assert_eq!(
            exec("a, b = [1]\n", &[]).unwrap_err(),
            "not enough values to unpack (expected 2, got 1)"
        );
        assert_eq!(
            exec("a, b = 1, 2, 3\n", &[]).unwrap_err(),
            "too many values to unpack (expected 2)"
        );
    }

    #[test]
    fn test_string_formatting() {
        let source = "\
x = 3.14159
name = 'Ada'
print(f'{name}: {x:.2f}', '%d items' % 4, '{} and {}'.format(1, 2))
print(10 / 4, 7 // 2, 2 ** 10, -7 % 3)
";
        assert_eq!(
            exec(source, &[]).unwrap(),
            "Ada: 3.14 4 items 1 and 2\n2.5 3 1024 2\n"
        );
    }

    #[test]
    fn test_print_sep_and_end() {
        let source = "print(1, 2, 3, sep='-', end='!')\nprint()\n";
        assert_eq!(exec(source, &[]).unwrap(), "1-2-3!\n");
    }

    #[test]
    fn test_boolean_operators_return_operands() {
        let source = "print(0 or 'x', 1 and 2, not 0, 1 < 2 < 3, 3 > 2 > 5)\n";
        assert_eq!(exec(source, &[]).unwrap(), "x 2 True True False\n");
    }

    #[test]
    fn test_call_arity_errors() {
        let source = "def f(a, b):\n    return a\nf(1)\n";
        assert_eq!(
            exec(source, &[]).unwrap_err(),
            "f() missing 1 required positional argument: 'b'"
        );
        let source = "def f(a):\n    return a\nf(1, 2)\n";
        assert_eq!(
            exec(source, &[]).unwrap_err(),
            "f() takes 1 positional argument but 2 were given"
        );
    }

    #[test]
    fn test_index_errors() {
        assert_eq!(exec("[1][3]\n", &[]).unwrap_err(), "list index out of range");
        assert_eq!(exec("'ab'[5]\n", &[]).unwrap_err(), "string index out of range");
        assert_eq!(
            exec("t = (1, 2)\nt[0] = 5\n", &[]).unwrap_err(),
            "'tuple' object does not support item assignment"
        );
    }

    #[test]
    fn test_even_or_odd() {
        let source = "n = int(input())\nprint('Even' if n % 2 == 0 else 'Odd')\n";
        assert_eq!(exec(source, &["-3"]).unwrap(), "Odd\n");
        assert_eq!(exec(source, &["0"]).unwrap(), "Even\n");
    }
}
