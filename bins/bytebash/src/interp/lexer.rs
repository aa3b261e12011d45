use super::{InterpResult, InterpreterError};

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Name(String),
    Kw(&'static str),
    Int(i64),
    Float(f64),
    Str(String),
    FStr(Vec<FStrPiece>),
    Op(&'static str),
    Newline,
    Indent,
    Dedent,
    Eof,
}

/// Raw piece of an f-string; expression text is parsed later
#[derive(Debug, Clone, PartialEq)]
pub enum FStrPiece {
    Lit(String),
    Expr { source: String, spec: Option<String> },
}

/// Outcome of a backslash escape inside a string literal
enum Escape {
    Char(char),
    /// Not an escape Python knows; the backslash stays in the text
    Unknown(char),
    LineContinuation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

const KEYWORDS: &[&str] = &[
    "and", "break", "continue", "def", "elif", "else", "for", "global", "if", "in", "is",
    "not", "or", "pass", "return", "while", "True", "False", "None",
];

/// Deepest allowed block nesting
const MAX_INDENT_LEVELS: usize = 100;

// Longest first so that prefixes never shadow longer operators
const OPERATORS: &[&str] = &[
    "**=", "//=", "**", "//", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "+",
    "-", "*", "/", "%", "<", ">", "=", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";",
];

pub fn tokenize(source: &str) -> InterpResult<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    indents: Vec<usize>,
    depth: usize,
    at_line_start: bool,
    /// Start of the string literal being scanned
    literal_start: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            indents: vec![0],
            depth: 0,
            at_line_start: true,
            literal_start: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn push(&mut self, tok: Tok) {
        self.tokens.push(Token {
            tok,
            line: self.line,
        });
    }

    fn error<T>(&self, message: impl Into<String>) -> InterpResult<T> {
        Err(InterpreterError::syntax(message, self.line))
    }

    fn last_is_newline(&self) -> bool {
        matches!(
            self.tokens.last().map(|t| &t.tok),
            None | Some(Tok::Newline) | Some(Tok::Indent) | Some(Tok::Dedent)
        )
    }

    fn run(mut self) -> InterpResult<Vec<Token>> {
        loop {
            if self.at_line_start {
                if !self.indentation()? {
                    break;
                }
                continue;
            }

            let Some(c) = self.peek() else { break };
            match c {
                '\n' => {
                    if self.depth == 0 {
                        if !self.last_is_newline() {
                            self.push(Tok::Newline);
                        }
                        self.at_line_start = true;
                    }
                    self.advance();
                }
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.advance();
                }
                '#' => self.skip_comment(),
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                c if c.is_ascii_digit() => {
                    let tok = self.number()?;
                    self.push(tok);
                }
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    let tok = self.number()?;
                    self.push(tok);
                }
                '\'' | '"' => {
                    let tok = self.string("")?;
                    self.push(tok);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let tok = self.word()?;
                    self.push(tok);
                }
                _ => {
                    let tok = self.operator()?;
                    self.push(tok);
                }
            }
        }

        if self.depth > 0 {
            return self.error("unexpected EOF while parsing");
        }
        if !self.last_is_newline() {
            self.push(Tok::Newline);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(Tok::Dedent);
        }
        self.push(Tok::Eof);
        Ok(self.tokens)
    }

    /// Measure the indentation of a logical line and emit INDENT/DEDENT.
    /// Returns false at end of input.
    fn indentation(&mut self) -> InterpResult<bool> {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.pos += 1;
        }

        match self.peek() {
            None => return Ok(false),
            Some('\n') | Some('\r') => {
                self.advance();
                return Ok(true);
            }
            Some('#') => {
                self.skip_comment();
                return Ok(true);
            }
            Some(_) => {}
        }

        self.at_line_start = false;
        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            if self.indents.len() > MAX_INDENT_LEVELS {
                return self.error("too many levels of indentation");
            }
            self.indents.push(width);
            self.push(Tok::Indent);
        } else {
            while width < self.indents.last().copied().unwrap_or(0) {
                self.indents.pop();
                self.push(Tok::Dedent);
            }
            if width != self.indents.last().copied().unwrap_or(0) {
                return self.error("unindent does not match any outer indentation level");
            }
        }
        Ok(true)
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn number(&mut self) -> InterpResult<Tok> {
        let start = self.pos;
        let mut is_float = false;

        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            self.digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let signed = matches!(self.peek_at(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += digit_at;
                self.digits();
            }
        }

        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();

        if is_float {
            text.parse::<f64>()
                .map(Tok::Float)
                .or_else(|_| self.error(format!("invalid decimal literal '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(Tok::Int)
                .or_else(|_| self.error(format!("integer literal too large: {}", text)))
        }
    }

    fn digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn word(&mut self) -> InterpResult<Tok> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        let lower = word.to_lowercase();
        let is_prefix = matches!(lower.as_str(), "f" | "r" | "fr" | "rf" | "b" | "u");
        if is_prefix && matches!(self.peek(), Some('\'') | Some('"')) {
            if lower.contains('b') {
                return self.error("bytes literals are not supported");
            }
            return self.string(&lower);
        }

        match KEYWORDS.iter().find(|k| **k == word) {
            Some(kw) => Ok(Tok::Kw(kw)),
            None => Ok(Tok::Name(word)),
        }
    }

    fn string(&mut self, prefix: &str) -> InterpResult<Tok> {
        let raw = prefix.contains('r');
        let formatted = prefix.contains('f');
        let quote = match self.advance() {
            Some(q) => q,
            None => return self.error("unterminated string literal"),
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        self.literal_start = self.pos;
        let mut body = String::new();
        loop {
            let Some(c) = self.advance() else {
                return self.error("unterminated string literal");
            };
            if c == quote {
                if !triple {
                    break;
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.pos += 2;
                    break;
                }
            }
            if c == '\n' && !triple {
                return self.error("unterminated string literal");
            }
            if c == '\\' && !raw {
                match self.escape(self.pos - 1)? {
                    Escape::Char(decoded) => body.push(decoded),
                    Escape::Unknown(other) => {
                        body.push('\\');
                        body.push(other);
                    }
                    Escape::LineContinuation => {}
                }
                continue;
            }
            body.push(c);
        }

        if formatted {
            Ok(Tok::FStr(self.fstring_pieces(&body)?))
        } else {
            Ok(Tok::Str(body))
        }
    }

    /// Decode one escape sequence; the backslash at `start` is already consumed
    fn escape(&mut self, start: usize) -> InterpResult<Escape> {
        let Some(escaped) = self.advance() else {
            return self.error("unterminated string literal");
        };
        let decoded = match escaped {
            '\n' => return Ok(Escape::LineContinuation),
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '\\' | '\'' | '"' => escaped,
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                self.code_point(code, start)?
            }
            'x' => self.hex_escape(2, "\\xXX", start)?,
            'u' => self.hex_escape(4, "\\uXXXX", start)?,
            'U' => self.hex_escape(8, "\\UXXXXXXXX", start)?,
            'N' => self.named_escape(start)?,
            other => return Ok(Escape::Unknown(other)),
        };
        Ok(Escape::Char(decoded))
    }

    fn unicode_error<T>(&self, start: usize, reason: &str) -> InterpResult<T> {
        self.error(format!(
            "(unicode error) 'unicodeescape' codec can't decode bytes in position {}-{}: {}",
            start - self.literal_start,
            self.pos.saturating_sub(1) - self.literal_start,
            reason
        ))
    }

    fn hex_escape(&mut self, digits: usize, form: &str, start: usize) -> InterpResult<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    code = code * 16 + digit;
                    self.pos += 1;
                }
                None => return self.unicode_error(start, &format!("truncated {} escape", form)),
            }
        }
        self.code_point(code, start)
    }

    fn named_escape(&mut self, start: usize) -> InterpResult<char> {
        if self.peek() != Some('{') {
            return self.unicode_error(start, "malformed \\N character escape");
        }
        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(c) if c != '\n' && c != '\\' => {
                    name.push(c);
                    self.pos += 1;
                }
                _ => return self.unicode_error(start, "malformed \\N character escape"),
            }
        }
        if name.is_empty() {
            return self.unicode_error(start, "malformed \\N character escape");
        }
        match unicode_names2::character(&name) {
            Some(c) => Ok(c),
            None => self.unicode_error(start, "unknown Unicode character name"),
        }
    }

    fn code_point(&self, code: u32, start: usize) -> InterpResult<char> {
        match char::from_u32(code) {
            Some(c) => Ok(c),
            None if code > 0x10FFFF => self.unicode_error(start, "illegal Unicode character"),
            None => self.unicode_error(start, "surrogate code points are not supported"),
        }
    }

    fn fstring_pieces(&self, body: &str) -> InterpResult<Vec<FStrPiece>> {
        let chars: Vec<char> = body.chars().collect();
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    literal.push('{');
                    i += 2;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    literal.push('}');
                    i += 2;
                }
                '}' => return self.error("f-string: single '}' is not allowed"),
                '{' => {
                    if !literal.is_empty() {
                        pieces.push(FStrPiece::Lit(std::mem::take(&mut literal)));
                    }
                    let (piece, next) = self.fstring_field(&chars, i + 1)?;
                    pieces.push(piece);
                    i = next;
                }
                _ => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        if !literal.is_empty() {
            pieces.push(FStrPiece::Lit(literal));
        }
        Ok(pieces)
    }

    /// Scan one `{expr[:spec]}` field starting just past the brace
    fn fstring_field(&self, chars: &[char], start: usize) -> InterpResult<(FStrPiece, usize)> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut split: Option<usize> = None;
        let mut i = start;

        while i < chars.len() {
            let c = chars[i];
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
            } else {
                match c {
                    '\'' | '"' => quote = Some(c),
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' => depth = depth.saturating_sub(1),
                    '}' if depth > 0 => depth -= 1,
                    '}' => {
                        let end = split.unwrap_or(i);
                        let source: String = chars[start..end].iter().collect();
                        if source.trim().is_empty() {
                            return self.error("f-string: empty expression not allowed");
                        }
                        let spec = split.map(|s| chars[s + 1..i].iter().collect::<String>());
                        return Ok((FStrPiece::Expr { source, spec }, i + 1));
                    }
                    ':' if depth == 0 && split.is_none() => split = Some(i),
                    _ => {}
                }
            }
            i += 1;
        }
        self.error("f-string: expecting '}'")
    }

    fn operator(&mut self) -> InterpResult<Tok> {
        for op in OPERATORS {
            let matches = op
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_at(i) == Some(c));
            if matches {
                self.pos += op.len();
                match *op {
                    "(" | "[" | "{" => self.depth += 1,
                    ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
                    _ => {}
                }
                return Ok(Tok::Op(op));
            }
        }
        let c = self.peek().unwrap_or(' ');
        self.error(format!("invalid character '{}'", c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(source: &str) -> Vec<Tok> {
        tokenize(source).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_simple_statement() {
        assert_eq!(
            toks("a = 5"),
            vec![
                Tok::Name("a".into()),
                Tok::Op("="),
                Tok::Int(5),
                Tok::Newline,
                Tok::Eof
            ]
        );
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = toks("if x:\n    y = 1\nz = 2\n");
        assert!(tokens.contains(&Tok::Indent));
        assert!(tokens.contains(&Tok::Dedent));
        let indent = tokens.iter().position(|t| *t == Tok::Indent).unwrap();
        let dedent = tokens.iter().position(|t| *t == Tok::Dedent).unwrap();
        assert!(indent < dedent);
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        let tokens = toks("# header\n\nx = 1  # trailing\n\n   \n");
        assert_eq!(
            tokens,
            vec![
                Tok::Name("x".into()),
                Tok::Op("="),
                Tok::Int(1),
                Tok::Newline,
                Tok::Eof
            ]
        );
    }

    #[test]
    fn test_newlines_inside_brackets_are_ignored() {
        let tokens = toks("print(1,\n      2)\n");
        assert_eq!(tokens.iter().filter(|t| **t == Tok::Newline).count(), 1);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(toks("3.5")[0], Tok::Float(3.5));
        assert_eq!(toks("1e3")[0], Tok::Float(1000.0));
        assert_eq!(toks("1_000")[0], Tok::Int(1000));
        assert_eq!(toks(".5")[0], Tok::Float(0.5));
    }

    #[test]
    fn test_string_escapes_and_raw() {
        assert_eq!(toks(r#""a\nb""#)[0], Tok::Str("a\nb".into()));
        assert_eq!(toks(r#"r"a\nb""#)[0], Tok::Str("a\\nb".into()));
        assert_eq!(toks("'''x\ny'''")[0], Tok::Str("x\ny".into()));
    }

    #[test]
    fn test_hex_unicode_and_octal_escapes() {
        assert_eq!(toks(r"'\x41\u00e9'")[0], Tok::Str("Aé".into()));
        assert_eq!(toks(r"'\U0001F600'")[0], Tok::Str("😀".into()));
        assert_eq!(toks(r"'\101\0\7'")[0], Tok::Str("A\0\x07".into()));
        assert_eq!(toks(r"'\a\b\f\v'")[0], Tok::Str("\x07\x08\x0c\x0b".into()));
        assert_eq!(
            toks(r"'caf\N{LATIN SMALL LETTER E WITH ACUTE}'")[0],
            Tok::Str("café".into())
        );
    }

    #[test]
    fn test_unknown_escape_keeps_backslash() {
        assert_eq!(toks(r"'\q\d'")[0], Tok::Str("\\q\\d".into()));
        assert_eq!(toks(r"'a\
b'")[0], Tok::Str("ab".into()));
    }

    #[test]
    fn test_bad_escapes_are_syntax_errors() {
        let err = tokenize(r"print('\x4')").unwrap_err();
        assert_eq!(
            err.to_string(),
            "(unicode error) 'unicodeescape' codec can't decode bytes in position 0-2: truncated \\xXX escape (line 1)"
        );
        assert!(tokenize(r"'\u12'").is_err());
        assert!(tokenize(r"'\U00110000'").is_err());
        assert!(tokenize(r"'\N{NOT A REAL CHARACTER NAME}'").is_err());
        assert!(tokenize(r"'\N'").is_err());
    }

    #[test]
    fn test_raw_string_keeps_escapes() {
        assert_eq!(toks(r"r'\x41'")[0], Tok::Str("\\x41".into()));
    }

    #[test]
    fn test_indentation_depth_limit() {
        let mut source = String::new();
        for level in 0..150 {
            source.push_str(&" ".repeat(level));
            source.push_str("if True:\n");
        }
        source.push_str(&" ".repeat(150));
        source.push_str("pass\n");
        let err = tokenize(&source).unwrap_err();
        assert!(err.to_string().starts_with("too many levels of indentation"));
    }

    #[test]
    fn test_fstring_pieces() {
        let tokens = toks("f\"total: {a + b:.2f} {{ok}}\"");
        assert_eq!(
            tokens[0],
            Tok::FStr(vec![
                FStrPiece::Lit("total: ".into()),
                FStrPiece::Expr {
                    source: "a + b".into(),
                    spec: Some(".2f".into())
                },
                FStrPiece::Lit(" {ok}".into()),
            ])
        );
    }

    #[test]
    fn test_unterminated_string_is_syntax_error() {
        let err = tokenize("print('oops)").unwrap_err();
        assert!(matches!(err, InterpreterError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_bad_dedent() {
        let err = tokenize("if x:\n    a = 1\n  b = 2\n").unwrap_err();
        assert!(err.to_string().contains("unindent"));
    }
}
