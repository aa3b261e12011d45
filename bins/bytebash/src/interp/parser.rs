use super::ast::*;
use super::lexer::{tokenize, FStrPiece, Tok, Token};
use super::{InterpResult, InterpreterError};
use std::rc::Rc;

/// Deepest allowed nesting of brackets, unary operators and `**` exponents
pub const MAX_NESTING: usize = 100;

/// Deepest allowed expression tree, counting chained binary operators
pub const MAX_EXPR_DEPTH: usize = 200;

pub fn parse(source: &str) -> InterpResult<Vec<Stmt>> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).program()
}

/// Parse a standalone expression, as used inside f-string fields
pub fn parse_expression(source: &str, line: usize) -> InterpResult<Expr> {
    let mut tokens = tokenize(source.trim()).map_err(|e| relocate(e, line))?;
    for token in &mut tokens {
        token.line = line;
    }
    let mut parser = Parser::new(tokens);
    let expr = parser.test()?;
    parser.skip_newlines();
    if !parser.at(&Tok::Eof) {
        return parser.error("f-string: invalid expression");
    }
    Ok(expr)
}

fn relocate(err: InterpreterError, line: usize) -> InterpreterError {
    match err {
        InterpreterError::Syntax { message, .. } => InterpreterError::Syntax { message, line },
        other => other,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Open brackets and prefix operators on the current path
    nesting: usize,
    /// Expression tree depth on the current path
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            nesting: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> InterpResult<T>) -> InterpResult<T> {
        if self.nesting >= MAX_NESTING {
            return self.error("too many nested parentheses");
        }
        self.deepen(1)?;
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        self.depth -= 1;
        result
    }

    /// Account for `levels` more tree levels on the current path
    fn deepen(&mut self, levels: usize) -> InterpResult<()> {
        if self.depth + levels > MAX_EXPR_DEPTH {
            return self.error("expression too deeply nested");
        }
        self.depth += levels;
        Ok(())
    }

    fn peek(&self) -> &Tok {
        self.tokens
            .get(self.pos)
            .map(|t| &t.tok)
            .unwrap_or(&Tok::Eof)
    }

    fn peek_next(&self) -> &Tok {
        self.tokens
            .get(self.pos + 1)
            .map(|t| &t.tok)
            .unwrap_or(&Tok::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, tok: &Tok) -> bool {
        self.peek() == tok
    }

    fn at_op(&self, op: &str) -> bool {
        matches!(self.peek(), Tok::Op(o) if *o == op)
    }

    fn at_kw(&self, kw: &str) -> bool {
        matches!(self.peek(), Tok::Kw(k) if *k == kw)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.at_kw(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> InterpResult<T> {
        Err(InterpreterError::syntax(message, self.line()))
    }

    fn expect_op(&mut self, op: &str) -> InterpResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            self.error(format!("expected '{}'", op))
        }
    }

    fn expect_name(&mut self) -> InterpResult<String> {
        match self.bump() {
            Tok::Name(name) => Ok(name),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                self.error("invalid syntax")
            }
        }
    }

    fn skip_newlines(&mut self) {
        while self.at(&Tok::Newline) {
            self.pos += 1;
        }
    }

    fn program(&mut self) -> InterpResult<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                Tok::Eof => break,
                Tok::Indent => return self.error("unexpected indent"),
                _ => body.extend(self.statement()?),
            }
        }
        Ok(body)
    }

    fn statement(&mut self) -> InterpResult<Vec<Stmt>> {
        match self.peek() {
            Tok::Kw("if") => Ok(vec![self.if_stmt()?]),
            Tok::Kw("while") => Ok(vec![self.while_stmt()?]),
            Tok::Kw("for") => Ok(vec![self.for_stmt()?]),
            Tok::Kw("def") => Ok(vec![self.def_stmt()?]),
            _ => self.simple_statements(),
        }
    }

    /// `small (';' small)* [';'] NEWLINE`
    fn simple_statements(&mut self) -> InterpResult<Vec<Stmt>> {
        let mut stmts = vec![self.small_statement()?];
        while self.eat_op(";") {
            if self.at(&Tok::Newline) || self.at(&Tok::Eof) {
                break;
            }
            stmts.push(self.small_statement()?);
        }
        match self.peek() {
            Tok::Newline => {
                self.pos += 1;
                Ok(stmts)
            }
            Tok::Eof | Tok::Dedent => Ok(stmts),
            _ => self.error("invalid syntax"),
        }
    }

    fn small_statement(&mut self) -> InterpResult<Stmt> {
        let line = self.line();
        let kind = match self.peek() {
            Tok::Kw("pass") => {
                self.pos += 1;
                StmtKind::Pass
            }
            Tok::Kw("break") => {
                self.pos += 1;
                StmtKind::Break
            }
            Tok::Kw("continue") => {
                self.pos += 1;
                StmtKind::Continue
            }
            Tok::Kw("return") => {
                self.pos += 1;
                if self.at_statement_end() {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.expr_list()?))
                }
            }
            Tok::Kw("global") => {
                self.pos += 1;
                let mut names = vec![self.expect_name()?];
                while self.eat_op(",") {
                    names.push(self.expect_name()?);
                }
                StmtKind::Global(names)
            }
            _ => self.expression_statement()?,
        };
        Ok(Stmt { kind, line })
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), Tok::Newline | Tok::Eof | Tok::Dedent) || self.at_op(";")
    }

    fn expression_statement(&mut self) -> InterpResult<StmtKind> {
        let first = self.expr_list()?;

        if self.at_op("=") {
            let mut targets = vec![first];
            let mut value = None;
            while self.eat_op("=") {
                if let Some(previous) = value.take() {
                    targets.push(previous);
                }
                value = Some(self.expr_list()?);
            }
            for target in &targets {
                self.check_target(target)?;
            }
            let value = match value {
                Some(value) => value,
                None => return self.error("invalid syntax"),
            };
            return Ok(StmtKind::Assign(targets, value));
        }

        let aug = match self.peek() {
            Tok::Op("+=") => Some(BinOp::Add),
            Tok::Op("-=") => Some(BinOp::Sub),
            Tok::Op("*=") => Some(BinOp::Mul),
            Tok::Op("/=") => Some(BinOp::Div),
            Tok::Op("//=") => Some(BinOp::FloorDiv),
            Tok::Op("%=") => Some(BinOp::Mod),
            Tok::Op("**=") => Some(BinOp::Pow),
            _ => None,
        };
        if let Some(op) = aug {
            self.pos += 1;
            if !matches!(first, Expr::Name(_) | Expr::Index(..)) {
                return self.error("illegal expression for augmented assignment");
            }
            let value = self.expr_list()?;
            return Ok(StmtKind::AugAssign(first, op, value));
        }

        Ok(StmtKind::Expr(first))
    }

    fn check_target(&self, target: &Expr) -> InterpResult<()> {
        match target {
            Expr::Name(_) | Expr::Index(..) => Ok(()),
            Expr::Tuple(items) | Expr::List(items) => {
                items.iter().try_for_each(|item| self.check_target(item))
            }
            Expr::Call { .. } => self.error("cannot assign to function call"),
            _ => self.error("cannot assign to expression"),
        }
    }

    /// Either an indented block or a simple statement on the header line
    fn block(&mut self) -> InterpResult<Vec<Stmt>> {
        self.expect_op(":")?;
        if !self.at(&Tok::Newline) {
            return self.simple_statements();
        }
        self.skip_newlines();
        if !self.at(&Tok::Indent) {
            return self.error("expected an indented block");
        }
        self.pos += 1;

        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                Tok::Dedent => {
                    self.pos += 1;
                    break;
                }
                Tok::Eof => break,
                Tok::Indent => return self.error("unexpected indent"),
                _ => body.extend(self.statement()?),
            }
        }
        Ok(body)
    }

    fn if_stmt(&mut self) -> InterpResult<Stmt> {
        let line = self.line();
        self.pos += 1;
        let mut branches = Vec::new();
        let cond = self.test()?;
        branches.push((cond, self.block()?));

        let mut orelse = None;
        loop {
            if self.eat_kw("elif") {
                let cond = self.test()?;
                branches.push((cond, self.block()?));
            } else if self.eat_kw("else") {
                orelse = Some(self.block()?);
                break;
            } else {
                break;
            }
        }
        Ok(Stmt {
            kind: StmtKind::If { branches, orelse },
            line,
        })
    }

    fn while_stmt(&mut self) -> InterpResult<Stmt> {
        let line = self.line();
        self.pos += 1;
        let cond = self.test()?;
        let body = self.block()?;
        Ok(Stmt {
            kind: StmtKind::While(cond, body),
            line,
        })
    }

    fn for_stmt(&mut self) -> InterpResult<Stmt> {
        let line = self.line();
        self.pos += 1;
        let target = self.target_list()?;
        if !self.eat_kw("in") {
            return self.error("expected 'in'");
        }
        let iter = self.expr_list()?;
        let body = self.block()?;
        Ok(Stmt {
            kind: StmtKind::For(target, iter, body),
            line,
        })
    }

    fn def_stmt(&mut self) -> InterpResult<Stmt> {
        let line = self.line();
        self.pos += 1;
        let name = self.expect_name()?;
        self.expect_op("(")?;

        let mut params: Vec<Param> = Vec::new();
        while !self.at_op(")") {
            let param = self.expect_name()?;
            if params.iter().any(|p| p.name == param) {
                return self.error(format!(
                    "duplicate argument '{}' in function definition",
                    param
                ));
            }
            let default = if self.eat_op("=") {
                Some(self.test()?)
            } else {
                if params.iter().any(|p| p.default.is_some()) {
                    return self.error("non-default argument follows default argument");
                }
                None
            };
            params.push(Param {
                name: param,
                default,
            });
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;

        let body = self.block()?;
        Ok(Stmt {
            kind: StmtKind::Def(Rc::new(FuncDef { name, params, body })),
            line,
        })
    }

    /// Loop and comprehension targets: names, optionally comma-separated
    fn target_list(&mut self) -> InterpResult<Expr> {
        let first = self.or_expr_target()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_kw("in") {
                break;
            }
            items.push(self.or_expr_target()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn or_expr_target(&mut self) -> InterpResult<Expr> {
        let target = self.arith()?;
        self.check_target(&target)?;
        Ok(target)
    }

    /// Comma-separated expressions; more than one (or a trailing comma) makes a tuple
    fn expr_list(&mut self) -> InterpResult<Expr> {
        let first = self.test()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_statement_end() || self.at_op("=") || self.at_op(")") {
                break;
            }
            items.push(self.test()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn test(&mut self) -> InterpResult<Expr> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> InterpResult<Expr> {
        let expr = self.or_test()?;
        if self.at_kw("if") && !self.in_comprehension_guard() {
            self.pos += 1;
            let cond = self.or_test()?;
            if !self.eat_kw("else") {
                return self.error("expected 'else' after 'if' expression");
            }
            let orelse = self.test()?;
            return Ok(Expr::IfExp {
                cond: Box::new(cond),
                then: Box::new(expr),
                orelse: Box::new(orelse),
            });
        }
        Ok(expr)
    }

    // A conditional expression always has an `else`; a comprehension filter never does.
    fn in_comprehension_guard(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.pos..] {
            match &token.tok {
                Tok::Op("(") | Tok::Op("[") | Tok::Op("{") => depth += 1,
                Tok::Op(")") | Tok::Op("]") | Tok::Op("}") => {
                    if depth == 0 {
                        return true;
                    }
                    depth -= 1;
                }
                Tok::Kw("else") if depth == 0 => return false,
                Tok::Kw("for") if depth == 0 => return true,
                Tok::Newline | Tok::Eof => return true,
                _ => {}
            }
        }
        true
    }

    fn or_test(&mut self) -> InterpResult<Expr> {
        let mut left = self.and_test()?;
        let mut links = 0;
        while self.eat_kw("or") {
            self.deepen(1)?;
            links += 1;
            let right = self.and_test()?;
            left = Expr::BoolOp(BoolOp::Or, Box::new(left), Box::new(right));
        }
        self.depth -= links;
        Ok(left)
    }

    fn and_test(&mut self) -> InterpResult<Expr> {
        let mut left = self.not_test()?;
        let mut links = 0;
        while self.eat_kw("and") {
            self.deepen(1)?;
            links += 1;
            let right = self.not_test()?;
            left = Expr::BoolOp(BoolOp::And, Box::new(left), Box::new(right));
        }
        self.depth -= links;
        Ok(left)
    }

    fn not_test(&mut self) -> InterpResult<Expr> {
        if self.eat_kw("not") {
            let operand = self.nested(Self::not_test)?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> InterpResult<Expr> {
        let left = self.arith()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Tok::Op("==") => CmpOp::Eq,
                Tok::Op("!=") => CmpOp::NotEq,
                Tok::Op("<") => CmpOp::Lt,
                Tok::Op("<=") => CmpOp::LtE,
                Tok::Op(">") => CmpOp::Gt,
                Tok::Op(">=") => CmpOp::GtE,
                Tok::Kw("in") => CmpOp::In,
                Tok::Kw("not") if matches!(self.peek_next(), Tok::Kw("in")) => {
                    self.pos += 1;
                    CmpOp::NotIn
                }
                Tok::Kw("is") => {
                    if matches!(self.peek_next(), Tok::Kw("not")) {
                        self.pos += 1;
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    }
                }
                _ => break,
            };
            self.pos += 1;
            rest.push((op, self.arith()?));
        }
        if rest.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare(Box::new(left), rest))
        }
    }

    fn arith(&mut self) -> InterpResult<Expr> {
        let mut left = self.term()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Tok::Op("+") => BinOp::Add,
                Tok::Op("-") => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.deepen(1)?;
            links += 1;
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= links;
        Ok(left)
    }

    fn term(&mut self) -> InterpResult<Expr> {
        let mut left = self.factor()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Tok::Op("*") => BinOp::Mul,
                Tok::Op("/") => BinOp::Div,
                Tok::Op("//") => BinOp::FloorDiv,
                Tok::Op("%") => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            self.deepen(1)?;
            links += 1;
            let right = self.factor()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= links;
        Ok(left)
    }

    fn factor(&mut self) -> InterpResult<Expr> {
        let op = match self.peek() {
            Tok::Op("-") => Some(UnaryOp::Neg),
            Tok::Op("+") => Some(UnaryOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.nested(Self::factor)?;
            return Ok(Expr::Unary(op, Box::new(operand)));
        }
        self.power()
    }

    fn power(&mut self) -> InterpResult<Expr> {
        let base = self.primary()?;
        if self.eat_op("**") {
            // right-associative, and binds tighter than unary minus on the left only
            let exponent = self.nested(Self::factor)?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> InterpResult<Expr> {
        let mut expr = self.atom()?;
        let mut links = 0;
        loop {
            if matches!(self.peek(), Tok::Op("(") | Tok::Op("[") | Tok::Op(".")) {
                self.deepen(1)?;
                links += 1;
            }
            if self.eat_op("(") {
                let (args, kwargs) = self.call_args()?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    kwargs,
                };
            } else if self.eat_op("[") {
                expr = self.subscript(expr)?;
            } else if self.eat_op(".") {
                let attr = self.expect_name()?;
                expr = Expr::Attribute(Box::new(expr), attr);
            } else {
                break;
            }
        }
        self.depth -= links;
        Ok(expr)
    }

    fn call_args(&mut self) -> InterpResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        while !self.at_op(")") {
            let keyword = match (self.peek(), self.peek_next()) {
                (Tok::Name(name), Tok::Op("=")) => Some(name.clone()),
                _ => None,
            };
            if let Some(name) = keyword {
                self.pos += 2;
                if kwargs.iter().any(|(k, _)| *k == name) {
                    return self.error(format!("keyword argument repeated: {}", name));
                }
                let value = self.test()?;
                kwargs.push((name, value));
            } else {
                if !kwargs.is_empty() {
                    return self.error("positional argument follows keyword argument");
                }
                let arg = self.test()?;
                if self.at_kw("for") {
                    // bare generator argument: sum(x for x in xs)
                    let clauses = self.comp_clauses()?;
                    args.push(Expr::ListComp(Box::new(arg), clauses));
                } else {
                    args.push(arg);
                }
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;
        Ok((args, kwargs))
    }

    fn subscript(&mut self, target: Expr) -> InterpResult<Expr> {
        let lower = if self.at_op(":") {
            None
        } else {
            Some(Box::new(self.test()?))
        };

        if self.eat_op("]") {
            return match lower {
                Some(index) => Ok(Expr::Index(Box::new(target), index)),
                None => self.error("invalid syntax"),
            };
        }

        self.expect_op(":")?;
        let upper = if self.at_op(":") || self.at_op("]") {
            None
        } else {
            Some(Box::new(self.test()?))
        };
        let step = if self.eat_op(":") && !self.at_op("]") {
            Some(Box::new(self.test()?))
        } else {
            None
        };
        self.expect_op("]")?;
        Ok(Expr::Slice {
            target: Box::new(target),
            lower,
            upper,
            step,
        })
    }

    fn comp_clauses(&mut self) -> InterpResult<Vec<CompClause>> {
        let mut clauses = Vec::new();
        loop {
            if self.eat_kw("for") {
                let target = self.target_list()?;
                if !self.eat_kw("in") {
                    return self.error("expected 'in'");
                }
                let iter = self.or_test()?;
                clauses.push(CompClause::For(target, iter));
            } else if self.eat_kw("if") {
                clauses.push(CompClause::If(self.or_test()?));
            } else {
                break;
            }
        }
        Ok(clauses)
    }

    fn atom(&mut self) -> InterpResult<Expr> {
        let line = self.line();
        match self.bump() {
            Tok::Int(v) => Ok(Expr::Int(v)),
            Tok::Float(v) => Ok(Expr::Float(v)),
            Tok::Kw("True") => Ok(Expr::Bool(true)),
            Tok::Kw("False") => Ok(Expr::Bool(false)),
            Tok::Kw("None") => Ok(Expr::None),
            Tok::Name(name) => Ok(Expr::Name(name)),
            Tok::Str(first) => {
                // adjacent literals concatenate
                let mut text = first;
                while let Tok::Str(next) = self.peek() {
                    text.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Str(text))
            }
            Tok::FStr(pieces) => self.fstring(pieces, line),
            Tok::Op("(") => {
                if self.eat_op(")") {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let first = self.test()?;
                if self.at_kw("for") {
                    let clauses = self.comp_clauses()?;
                    self.expect_op(")")?;
                    return Ok(Expr::ListComp(Box::new(first), clauses));
                }
                if self.eat_op(")") {
                    return Ok(first);
                }
                let mut items = vec![first];
                while self.eat_op(",") {
                    if self.at_op(")") {
                        break;
                    }
                    items.push(self.test()?);
                }
                self.expect_op(")")?;
                Ok(Expr::Tuple(items))
            }
            Tok::Op("[") => {
                if self.eat_op("]") {
                    return Ok(Expr::List(Vec::new()));
                }
                let first = self.test()?;
                if self.at_kw("for") {
                    let clauses = self.comp_clauses()?;
                    self.expect_op("]")?;
                    return Ok(Expr::ListComp(Box::new(first), clauses));
                }
                let mut items = vec![first];
                while self.eat_op(",") {
                    if self.at_op("]") {
                        break;
                    }
                    items.push(self.test()?);
                }
                self.expect_op("]")?;
                Ok(Expr::List(items))
            }
            Tok::Op("{") => self.error("dict and set literals are not supported"),
            Tok::Eof | Tok::Newline => {
                self.pos = self.pos.saturating_sub(1);
                self.error("unexpected EOF while parsing")
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                self.error("invalid syntax")
            }
        }
    }

    fn fstring(&mut self, pieces: Vec<FStrPiece>, line: usize) -> InterpResult<Expr> {
        let mut parts = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match piece {
                FStrPiece::Lit(text) => parts.push(FStrPart::Lit(text)),
                FStrPiece::Expr { source, spec } => {
                    let expr = parse_expression(&source, line)?;
                    parts.push(FStrPart::Expr(Box::new(expr), spec));
                }
            }
        }
        Ok(Expr::FString(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> StmtKind {
        let mut program = parse(source).unwrap();
        assert_eq!(program.len(), 1, "expected one statement in {:?}", source);
        program.remove(0).kind
    }

    #[test]
    fn test_semicolon_separated_statements() {
        let program = parse("a = int(input()); b = int(input()); print(a + b)").unwrap();
        assert_eq!(program.len(), 3);
        assert!(matches!(program[2].kind, StmtKind::Expr(Expr::Call { .. })));
    }

    #[test]
    fn test_precedence() {
        let StmtKind::Expr(expr) = single("1 + 2 * 3") else {
            panic!("not an expression");
        };
        assert_eq!(
            expr,
            Expr::Binary(
                BinOp::Add,
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(
                    BinOp::Mul,
                    Box::new(Expr::Int(2)),
                    Box::new(Expr::Int(3))
                ))
            )
        );
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        let StmtKind::Expr(expr) = single("-2 ** 2") else {
            panic!("not an expression");
        };
        assert!(matches!(expr, Expr::Unary(UnaryOp::Neg, _)));
    }

    #[test]
    fn test_if_elif_else() {
        let kind = single("if n % 2 == 0:\n    print('Even')\nelif n < 0:\n    pass\nelse:\n    print('Odd')\n");
        let StmtKind::If { branches, orelse } = kind else {
            panic!("not an if");
        };
        assert_eq!(branches.len(), 2);
        assert!(orelse.is_some());
    }

    #[test]
    fn test_tuple_unpacking_and_chained_assignment() {
        assert!(matches!(single("a, b = 1, 2"), StmtKind::Assign(ref t, Expr::Tuple(_)) if t.len() == 1));
        assert!(matches!(single("a = b = 0"), StmtKind::Assign(ref t, Expr::Int(0)) if t.len() == 2));
    }

    #[test]
    fn test_list_comprehension_with_filter() {
        let StmtKind::Expr(expr) = single("[x * 2 for x in nums if x > 0]") else {
            panic!("not an expression");
        };
        let Expr::ListComp(_, clauses) = expr else {
            panic!("not a comprehension");
        };
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn test_conditional_expression() {
        let StmtKind::Expr(expr) = single("'Even' if n % 2 == 0 else 'Odd'") else {
            panic!("not an expression");
        };
        assert!(matches!(expr, Expr::IfExp { .. }));
    }

    #[test]
    fn test_slices() {
        let StmtKind::Expr(expr) = single("s[::-1]") else {
            panic!("not an expression");
        };
        assert!(matches!(expr, Expr::Slice { lower: None, upper: None, step: Some(_), .. }));
    }

    #[test]
    fn test_keyword_arguments() {
        let StmtKind::Expr(Expr::Call { args, kwargs, .. }) = single("print(1, 2, sep='-', end='')") else {
            panic!("not a call");
        };
        assert_eq!(args.len(), 2);
        assert_eq!(kwargs.len(), 2);
    }

    #[test]
    fn test_def_with_defaults() {
        let StmtKind::Def(def) = single("def f(a, b=2):\n    return a + b\n") else {
            panic!("not a def");
        };
        assert_eq!(def.params.len(), 2);
        assert!(def.params[1].default.is_some());
    }

    #[test]
    fn test_inline_block() {
        let StmtKind::While(_, body) = single("while x: x -= 1") else {
            panic!("not a while");
        };
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_syntax_errors_carry_line() {
        let err = parse("a = 1\nb = (2 +\n").unwrap_err();
        assert!(matches!(err, InterpreterError::Syntax { .. }));

        let err = parse("x = 1\n  y = 2\n").unwrap_err();
        assert_eq!(err.to_string(), "unexpected indent (line 2)");

        let err = parse("1 = x").unwrap_err();
        assert!(err.to_string().contains("cannot assign"));
    }

    #[test]
    fn test_deep_parentheses_are_syntax_error() {
        let source = format!("print({}1{})", "(".repeat(20_000), ")".repeat(20_000));
        let err = parse(&source).unwrap_err();
        assert_eq!(err.to_string(), "too many nested parentheses (line 1)");

        let ok = format!("print({}1{})", "(".repeat(50), ")".repeat(50));
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn test_deep_prefix_operators_are_syntax_error() {
        assert!(parse(&format!("x = {}1", "-".repeat(20_000))).is_err());
        assert!(parse(&format!("x = {}True", "not ".repeat(20_000))).is_err());
        assert!(parse(&format!("x = 2{}", " ** 2".repeat(20_000))).is_err());
    }

    #[test]
    fn test_long_operator_chains() {
        let long = vec!["1"; 20_000].join(" + ");
        let err = parse(&format!("print({})", long)).unwrap_err();
        assert_eq!(err.to_string(), "expression too deeply nested (line 1)");

        let short = vec!["1"; 150].join(" + ");
        assert!(parse(&format!("print({})", short)).is_ok());
        assert!(parse(&format!("x{}", "[0]".repeat(20_000))).is_err());
    }

    #[test]
    fn test_fstring_fields_are_parsed() {
        let StmtKind::Expr(Expr::FString(parts)) = single("f'{a + 1} items'") else {
            panic!("not an f-string");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0], FStrPart::Expr(_, None)));
    }
}
