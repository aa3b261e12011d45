// Text rendering of values: float repr, format specs, and %-formatting

use super::value::{float_to_int, Value};
use super::{ErrorKind, InterpResult, InterpreterError};

fn value_error(message: impl Into<String>) -> InterpreterError {
    InterpreterError::runtime(ErrorKind::Value, message)
}

fn type_error(message: impl Into<String>) -> InterpreterError {
    InterpreterError::runtime(ErrorKind::Type, message)
}

/// Largest width or precision a format spec may ask for
pub const MAX_FORMAT_WIDTH: usize = 1_000_000;

/// Parse a width or precision field, refusing sizes past `MAX_FORMAT_WIDTH`
fn format_count(digits: &str, message: &str) -> InterpResult<usize> {
    if digits.is_empty() {
        return Ok(0);
    }
    match digits.parse::<usize>() {
        Ok(count) if count <= MAX_FORMAT_WIDTH => Ok(count),
        _ => Err(value_error(message)),
    }
}

/// Shortest round-trip float text, Python style (`8.0`, `1e+20`, `1e-05`)
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let abs = f.abs();
    if !(1e-4..1e16).contains(&abs) {
        return python_exponent(&format!("{:e}", f));
    }
    let text = format!("{}", f);
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Rewrite Rust's `1.5e-7` exponent form into Python's `1.5e-07`
fn python_exponent(text: &str) -> String {
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => text.to_string(),
    }
}

/// Python `repr()` of a string
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn fixed(f: f64, precision: usize) -> String {
    if !f.is_finite() {
        return format_float(f);
    }
    format!("{:.*}", precision, f)
}

fn scientific(f: f64, precision: usize) -> String {
    if !f.is_finite() {
        return format_float(f);
    }
    python_exponent(&format!("{:.*e}", precision, f))
}

fn strip_fraction_zeros(text: &str) -> String {
    match text.split_once('e') {
        Some((mantissa, exp)) => format!("{}e{}", strip_fraction_zeros(mantissa), exp),
        None if text.contains('.') => text.trim_end_matches('0').trim_end_matches('.').to_string(),
        None => text.to_string(),
    }
}

/// `%g`-style: `precision` significant digits, trailing zeros removed
fn general(f: f64, precision: usize) -> String {
    if !f.is_finite() {
        return format_float(f);
    }
    let precision = precision.max(1);
    if f == 0.0 {
        return "0".to_string();
    }
    let exp = f.abs().log10().floor() as i64;
    if exp >= -4 && exp < precision as i64 {
        let decimals = (precision as i64 - 1 - exp).max(0) as usize;
        strip_fraction_zeros(&fixed(f, decimals))
    } else {
        strip_fraction_zeros(&scientific(f, precision - 1))
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let (int_part, rest) = match digits.find('.') {
        Some(dot) => digits.split_at(dot),
        None => (digits, ""),
    };
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped.push_str(rest);
    grouped
}

fn pad(body: &str, width: usize, fill: char, align: char, sign: &str) -> String {
    let len = sign.chars().count() + body.chars().count();
    if len >= width {
        return format!("{}{}", sign, body);
    }
    let padding = width - len;
    let fill_str = |n: usize| fill.to_string().repeat(n);
    match align {
        '<' => format!("{}{}{}", sign, body, fill_str(padding)),
        '^' => format!(
            "{}{}{}{}",
            fill_str(padding / 2),
            sign,
            body,
            fill_str(padding - padding / 2)
        ),
        '=' => format!("{}{}{}", sign, fill_str(padding), body),
        _ => format!("{}{}{}", fill_str(padding), sign, body),
    }
}

struct Spec {
    fill: char,
    align: Option<char>,
    sign: char,
    zero: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

fn parse_spec(spec: &str) -> InterpResult<Spec> {
    let chars: Vec<char> = spec.chars().collect();
    let mut i = 0;
    let mut parsed = Spec {
        fill: ' ',
        align: None,
        sign: '-',
        zero: false,
        width: 0,
        grouping: None,
        precision: None,
        kind: None,
    };
    let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');

    if chars.len() >= 2 && is_align(chars[1]) {
        parsed.fill = chars[0];
        parsed.align = Some(chars[1]);
        i = 2;
    } else if chars.first().copied().is_some_and(is_align) {
        parsed.align = Some(chars[0]);
        i = 1;
    }
    if let Some(&c) = chars.get(i) {
        if matches!(c, '+' | '-' | ' ') {
            parsed.sign = c;
            i += 1;
        }
    }
    if chars.get(i) == Some(&'0') {
        parsed.zero = true;
        i += 1;
    }
    let mut width = String::new();
    while let Some(c) = chars.get(i).filter(|c| c.is_ascii_digit()) {
        width.push(*c);
        i += 1;
    }
    parsed.width = format_count(&width, "Too many decimal digits in format string")?;
    if let Some(&c) = chars.get(i) {
        if c == ',' || c == '_' {
            parsed.grouping = Some(c);
            i += 1;
        }
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        let mut precision = String::new();
        while let Some(c) = chars.get(i).filter(|c| c.is_ascii_digit()) {
            precision.push(*c);
            i += 1;
        }
        if precision.is_empty() {
            return Err(value_error("Format specifier missing precision"));
        }
        parsed.precision = Some(format_count(
            &precision,
            "Too many decimal digits in format string",
        )?);
    }
    if let Some(&c) = chars.get(i) {
        parsed.kind = Some(c);
        i += 1;
    }
    if i != chars.len() {
        return Err(value_error("Invalid format specifier"));
    }
    Ok(parsed)
}

/// Apply a format-spec mini-language string, as in `f"{x:>8.2f}"`
pub fn format_spec(value: &Value, spec: &str) -> InterpResult<String> {
    if spec.is_empty() {
        return Ok(value.to_str());
    }
    let spec = parse_spec(spec)?;
    let is_number = matches!(value, Value::Int(_) | Value::Float(_) | Value::Bool(_));

    let unknown = |code: char| {
        value_error(format!(
            "Unknown format code '{}' for object of type '{}'",
            code,
            value.type_name()
        ))
    };

    let (negative, mut body) = match (spec.kind, value) {
        (None | Some('s'), Value::Str(s)) => {
            let text = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.clone(),
            };
            (false, text)
        }
        (Some('d'), v) => match v.as_int() {
            Some(i) => (i < 0, i.unsigned_abs().to_string()),
            None => return Err(unknown('d')),
        },
        (Some(code @ ('f' | 'F' | 'e' | 'E' | 'g' | 'G' | '%')), v) if is_number => {
            let f = v.as_f64().unwrap_or(0.0);
            let precision = spec.precision.unwrap_or(6);
            let text = match code {
                'f' | 'F' => fixed(f.abs(), precision),
                'e' => scientific(f.abs(), precision),
                'E' => scientific(f.abs(), precision).to_uppercase(),
                'g' => general(f.abs(), precision),
                'G' => general(f.abs(), precision).to_uppercase(),
                _ => format!("{}%", fixed(f.abs() * 100.0, precision)),
            };
            (f.is_sign_negative() && f != 0.0, text)
        }
        (None, Value::Float(f)) => {
            let text = match spec.precision {
                Some(p) => general(f.abs(), p),
                None => format_float(f.abs()),
            };
            (f.is_sign_negative() && *f != 0.0, text)
        }
        (None, v) if is_number => {
            let i = v.as_int().unwrap_or(0);
            (i < 0, i.unsigned_abs().to_string())
        }
        (None, v) => (false, v.to_str()),
        (Some(code), _) => return Err(unknown(code)),
    };

    if let Some(separator) = spec.grouping {
        if is_number {
            body = group_thousands(&body, separator);
        }
    }

    let sign = match (negative, spec.sign) {
        (true, _) => "-",
        (false, '+') if is_number => "+",
        (false, ' ') if is_number => " ",
        _ => "",
    };

    let (fill, align) = match (spec.align, spec.zero) {
        (Some(align), _) => (spec.fill, align),
        (None, true) if is_number => ('0', '='),
        (None, _) if is_number => (spec.fill, '>'),
        (None, _) => (spec.fill, '<'),
    };
    Ok(pad(&body, spec.width, fill, align, sign))
}

/// Python `template % args`
pub fn percent_format(template: &str, args: &Value) -> InterpResult<String> {
    let values: Vec<Value> = match args {
        Value::Tuple(items) => items.as_ref().clone(),
        other => vec![other.clone()],
    };
    let mut next_arg = values.iter();
    let mut out = String::new();
    let chars: Vec<char> = template.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut left = false;
        let mut zero = false;
        let mut plus = false;
        let mut space = false;
        while let Some(&flag) = chars.get(i) {
            match flag {
                '-' => left = true,
                '0' => zero = true,
                '+' => plus = true,
                ' ' => space = true,
                '#' => {}
                _ => break,
            }
            i += 1;
        }
        let mut width = String::new();
        while let Some(c) = chars.get(i).filter(|c| c.is_ascii_digit()) {
            width.push(*c);
            i += 1;
        }
        let width = format_count(&width, "width too big")?;
        let mut precision = None;
        if chars.get(i) == Some(&'.') {
            i += 1;
            let mut digits = String::new();
            while let Some(c) = chars.get(i).filter(|c| c.is_ascii_digit()) {
                digits.push(*c);
                i += 1;
            }
            precision = Some(format_count(&digits, "precision too big")?);
        }
        let Some(&conversion) = chars.get(i) else {
            return Err(value_error("incomplete format"));
        };
        i += 1;

        if conversion == '%' {
            out.push('%');
            continue;
        }

        let arg = next_arg
            .next()
            .ok_or_else(|| type_error("not enough arguments for format string"))?;

        let numeric_arg = || {
            arg.as_f64().ok_or_else(|| {
                type_error(format!(
                    "%{} format: a real number is required, not {}",
                    conversion,
                    arg.type_name()
                ))
            })
        };

        let (negative, body, numeric) = match conversion {
            's' => (false, arg.to_str(), false),
            'r' => (false, arg.repr(), false),
            'd' | 'i' | 'u' => {
                let n = match arg.as_int() {
                    Some(n) => n,
                    None => float_to_int(numeric_arg()?)?,
                };
                (n < 0, n.unsigned_abs().to_string(), true)
            }
            'f' | 'F' => {
                let f = numeric_arg()?;
                (f < 0.0, fixed(f.abs(), precision.unwrap_or(6)), true)
            }
            'e' | 'E' => {
                let f = numeric_arg()?;
                let text = scientific(f.abs(), precision.unwrap_or(6));
                let text = if conversion == 'E' { text.to_uppercase() } else { text };
                (f < 0.0, text, true)
            }
            'g' | 'G' => {
                let f = numeric_arg()?;
                let text = general(f.abs(), precision.unwrap_or(6));
                let text = if conversion == 'G' { text.to_uppercase() } else { text };
                (f < 0.0, text, true)
            }
            'x' | 'X' | 'o' => {
                let n = arg.as_int().ok_or_else(|| {
                    type_error(format!(
                        "%{} format: an integer is required, not {}",
                        conversion,
                        arg.type_name()
                    ))
                })?;
                let text = match conversion {
                    'x' => format!("{:x}", n.unsigned_abs()),
                    'X' => format!("{:X}", n.unsigned_abs()),
                    _ => format!("{:o}", n.unsigned_abs()),
                };
                (n < 0, text, true)
            }
            'c' => {
                let text = match arg {
                    Value::Str(s) if s.chars().count() == 1 => s.clone(),
                    other => other
                        .as_int()
                        .and_then(|n| u32::try_from(n).ok())
                        .and_then(char::from_u32)
                        .map(String::from)
                        .ok_or_else(|| type_error("%c requires int or char"))?,
                };
                (false, text, false)
            }
            other => {
                return Err(value_error(format!(
                    "unsupported format character '{}'",
                    other
                )))
            }
        };

        let body = match (precision, conversion) {
            (Some(p), 's' | 'r') => body.chars().take(p).collect(),
            _ => body,
        };
        let sign = match (negative, plus, space) {
            (true, _, _) => "-",
            (false, true, _) if numeric => "+",
            (false, false, true) if numeric => " ",
            _ => "",
        };
        let (fill, align) = if left {
            (' ', '<')
        } else if zero && numeric {
            ('0', '=')
        } else {
            (' ', '>')
        };
        out.push_str(&pad(&body, width, fill, align, sign));
    }

    if next_arg.next().is_some() {
        return Err(type_error(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(out)
}
