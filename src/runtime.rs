use std::io::{self, Write};
use std::rc::Rc;

use crate::{
    ast::{AssignOp, BinaryOp, Expr, ExprKind, Literal, Stmt, StmtKind, UnaryOp},
    diagnostics::{fault, AbacusError, DiagnosticKind, Result},
    environment::Environment,
    fraction::Fraction,
    matrix::Matrix,
    parser,
    sequence::{Sequence, Text},
    value::{Closure, Function, Param, UserFunction, Value},
};

/// Token interpolation re-enters the evaluator; this bounds runaway
/// cycles such as a variable whose text mentions itself.
const INTERPOLATION_LIMIT: usize = 16;

/// The tree-walking evaluator. Holds the single flat environment and the
/// output sink the `print` native writes through.
pub struct Interpreter {
    env: Environment,
    output: Box<dyn Write>,
    interpolation_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// Builds an interpreter writing `print` output to the given sink.
    pub fn with_output(output: impl Write + 'static) -> Self {
        let mut interpreter = Self {
            env: Environment::new(),
            output: Box::new(output),
            interpolation_depth: 0,
        };
        crate::stdlib::install(&mut interpreter.env);
        interpreter
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Evaluates a whole program; the result is the last value any
    /// element produced, or the `true` sentinel when nothing did. A
    /// top-level `return` stops evaluation with its value.
    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let results = self.eval_program(source)?;
        Ok(results.into_iter().last().unwrap_or(Value::bool(true)))
    }

    /// Evaluates a whole program into the ordered values of its elements.
    /// Void-like constructs (a false `when`, a loop, a declaration)
    /// contribute nothing.
    pub fn eval_program(&mut self, source: &str) -> Result<Vec<Value>> {
        let program = parser::parse_program(source).map_err(AbacusError::from)?;
        let mut results = Vec::new();
        for stmt in program.items {
            match self.execute_statement(&stmt)? {
                Flow::Next => {}
                Flow::NextValue(value) => results.push(value),
                Flow::Return(value) => {
                    results.push(value);
                    break;
                }
            }
        }
        Ok(results)
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Flow> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                let value = self.evaluate(expr)?;
                Ok(Flow::NextValue(value))
            }
            StmtKind::When { condition, body } => {
                if self.evaluate(condition)?.expect_bool()? {
                    self.execute_block(body)
                } else {
                    Ok(Flow::Next)
                }
            }
            StmtKind::For {
                bindings,
                iterable,
                body,
            } => {
                let iterable_value = self.evaluate(iterable)?;
                for item in self.iterate(iterable_value)? {
                    self.bind_loop_item(bindings, item)?;
                    match self.execute_block(body)? {
                        Flow::Next | Flow::NextValue(_) => {}
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                }
                Ok(Flow::Next)
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::bool(true),
                };
                Ok(Flow::Return(value))
            }
            StmtKind::Function { name, params, body } => {
                // Default parameter expressions are evaluated now, at
                // declaration time.
                let mut declared = Vec::with_capacity(params.len());
                for param in params {
                    let default = match &param.default {
                        Some(expr) => Some(self.evaluate(expr)?),
                        None => None,
                    };
                    declared.push(Param {
                        name: param.name.clone(),
                        default,
                    });
                }
                let function = Function::User(Rc::new(UserFunction {
                    name: name.clone(),
                    params: declared,
                    body: body.clone(),
                }));
                self.env.set_function(name, function);
                Ok(Flow::Next)
            }
        }
    }

    /// Blocks do not open a scope; they run against the same flat
    /// environment and short-circuit on the first `Return`.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<Flow> {
        let mut last_value: Option<Value> = None;
        for stmt in statements {
            match self.execute_statement(stmt)? {
                Flow::Next => {}
                Flow::NextValue(value) => last_value = Some(value),
                Flow::Return(value) => return Ok(Flow::Return(value)),
            }
        }
        Ok(match last_value {
            Some(value) => Flow::NextValue(value),
            None => Flow::Next,
        })
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal),
            ExprKind::Identifier(name) => self.env.get_var(name),
            ExprKind::Group(inner) => self.evaluate(inner),
            ExprKind::Assign { name, op, value } => {
                let value = self.evaluate(value)?;
                let result = match op {
                    AssignOp::Set => value,
                    compound => {
                        let current = self.env.get_var(name)?;
                        let op = match compound {
                            AssignOp::Add => BinaryOp::Add,
                            AssignOp::Sub => BinaryOp::Sub,
                            AssignOp::Mul => BinaryOp::Mul,
                            AssignOp::Div => BinaryOp::Div,
                            AssignOp::Pow => BinaryOp::Pow,
                            AssignOp::Mod => BinaryOp::Mod,
                            AssignOp::Set => unreachable!(),
                        };
                        self.binary(op, current, value)?
                    }
                };
                self.env.set_var(name, result.clone());
                Ok(result)
            }
            ExprKind::Ternary {
                condition,
                then_value,
                else_value,
            } => {
                if self.evaluate(condition)?.expect_bool()? {
                    self.evaluate(then_value)
                } else {
                    self.evaluate(else_value)
                }
            }
            ExprKind::Binary { op, left, right } => match op {
                // Logical operators short-circuit; the right operand is
                // only touched when it can still decide the outcome.
                BinaryOp::And => {
                    if !self.evaluate(left)?.expect_bool()? {
                        return Ok(Value::bool(false));
                    }
                    Ok(Value::bool(self.evaluate(right)?.expect_bool()?))
                }
                BinaryOp::Or => {
                    if self.evaluate(left)?.expect_bool()? {
                        return Ok(Value::bool(true));
                    }
                    Ok(Value::bool(self.evaluate(right)?.expect_bool()?))
                }
                _ => {
                    let left_value = self.evaluate(left)?;
                    let right_value = self.evaluate(right)?;
                    self.binary(*op, left_value, right_value)
                }
            },
            ExprKind::Unary { op, expr } => {
                let value = self.evaluate(expr)?;
                self.unary(*op, value)
            }
            ExprKind::Pipe(inner) => {
                let value = self.evaluate(inner)?;
                self.pipe(value)
            }
            ExprKind::Call { name, args } => {
                let function = self.callable(name).ok_or_else(|| {
                    fault(
                        DiagnosticKind::UnknownIdentifier,
                        format!("unknown function `{name}`"),
                    )
                })?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.evaluate(arg)?);
                }
                self.call_function(&function, evaluated)
            }
            ExprKind::Closure { params, body } => {
                Ok(Value::Function(Function::Closure(Rc::new(Closure {
                    params: params.clone(),
                    body: (**body).clone(),
                }))))
            }
            ExprKind::ArrayLiteral(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element)?);
                }
                Ok(Value::Sequence(Sequence::new(values)))
            }
            ExprKind::MatrixLiteral(rows) => {
                let mut grid = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut cells = Vec::with_capacity(row.len());
                    for cell in row {
                        cells.push(self.evaluate(cell)?.expect_fraction()?);
                    }
                    grid.push(cells);
                }
                Ok(Value::Matrix(Matrix::new(grid)))
            }
        }
    }

    fn literal(&self, literal: &Literal) -> Result<Value> {
        match literal {
            Literal::Number(text) => Ok(Value::Fraction(Fraction::from_literal(text)?)),
            Literal::Bool(b) => Ok(Value::bool(*b)),
            Literal::Char(ch) => Ok(Value::Text(Text::from_char(*ch))),
            Literal::Str(text) => Ok(Value::text(text)),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: Value, right: Value) -> Result<Value> {
        use BinaryOp::*;
        match op {
            Equal => return Ok(Value::bool(left.loose_eq(&right))),
            NotEqual => return Ok(Value::bool(!left.loose_eq(&right))),
            Less | LessEqual | Greater | GreaterEqual => {
                // Ordering is defined for fractions only.
                let (a, b) = match (&left, &right) {
                    (Value::Fraction(a), Value::Fraction(b)) => (*a, *b),
                    _ => {
                        return Err(fault(
                            DiagnosticKind::TypeMismatch,
                            format!(
                                "cannot order {} and {}",
                                left.type_name(),
                                right.type_name()
                            ),
                        ));
                    }
                };
                let result = match op {
                    Less => a < b,
                    LessEqual => a <= b,
                    Greater => a > b,
                    GreaterEqual => a >= b,
                    _ => unreachable!(),
                };
                return Ok(Value::bool(result));
            }
            _ => {}
        }

        match (&left, &right) {
            (Value::Fraction(a), Value::Fraction(b)) => {
                let result = match op {
                    Add => a.add(b)?,
                    Sub => a.subtract(b)?,
                    Mul => a.multiply(b)?,
                    Div => a.divide(b)?,
                    Mod => a.modulo(b)?,
                    Pow => a.pow(b)?,
                    _ => unreachable!(),
                };
                Ok(Value::Fraction(result))
            }
            (Value::Complex(_), Value::Fraction(_) | Value::Complex(_))
            | (Value::Fraction(_), Value::Complex(_)) => {
                let a = left.expect_complex()?;
                let b = right.expect_complex()?;
                let result = match op {
                    Add => a.add(&b)?,
                    Sub => a.subtract(&b)?,
                    Mul => a.multiply(&b)?,
                    Div => a.divide(&b)?,
                    Pow => {
                        if !b.is_real() {
                            return Err(fault(
                                DiagnosticKind::TypeMismatch,
                                "complex exponents are not supported",
                            ));
                        }
                        a.pow(&b.re)?
                    }
                    Mod => {
                        return Err(fault(
                            DiagnosticKind::TypeMismatch,
                            "modulo is not defined for complex numbers",
                        ));
                    }
                    _ => unreachable!(),
                };
                Ok(Value::Complex(result))
            }
            (Value::Matrix(a), Value::Matrix(b)) => {
                let result = match op {
                    Add => a.add(b)?,
                    Sub => a.subtract(b)?,
                    Mul => a.multiply(b)?,
                    _ => {
                        return Err(fault(
                            DiagnosticKind::TypeMismatch,
                            "matrices support `+`, `-`, and `*`",
                        ));
                    }
                };
                Ok(Value::Matrix(result))
            }
            (Value::Matrix(matrix), Value::Fraction(scalar))
            | (Value::Fraction(scalar), Value::Matrix(matrix)) => match op {
                Mul => Ok(Value::Matrix(matrix.scale(scalar)?)),
                _ => Err(fault(
                    DiagnosticKind::TypeMismatch,
                    "only `*` combines a matrix and a scalar",
                )),
            },
            (Value::Text(a), Value::Text(b)) => match op {
                Add => {
                    let joined = Text::new(&a.as_string());
                    joined.append(b);
                    Ok(Value::Text(joined))
                }
                _ => Err(fault(
                    DiagnosticKind::TypeMismatch,
                    "text values support `+` only",
                )),
            },
            _ => Err(fault(
                DiagnosticKind::TypeMismatch,
                format!(
                    "operator is not defined for {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
            )),
        }
    }

    fn unary(&mut self, op: UnaryOp, value: Value) -> Result<Value> {
        match op {
            UnaryOp::Negate => match &value {
                Value::Fraction(fraction) => Ok(Value::Fraction(fraction.negate())),
                Value::Complex(complex) => Ok(Value::Complex(complex.negate())),
                _ => Err(fault(
                    DiagnosticKind::TypeMismatch,
                    format!("unary `-` expects a number, found {}", value.type_name()),
                )),
            },
            UnaryOp::Not => Ok(Value::bool(!value.expect_bool()?)),
            UnaryOp::Factorial => match &value {
                Value::Fraction(fraction) => Ok(Value::Fraction(fraction.factorial()?)),
                _ => Err(fault(
                    DiagnosticKind::TypeMismatch,
                    format!("`!` expects a fraction, found {}", value.type_name()),
                )),
            },
        }
    }

    /// `|x|`: absolute value for numbers, length for sequence-derived
    /// values, pass-through for anything else.
    fn pipe(&mut self, value: Value) -> Result<Value> {
        match &value {
            Value::Fraction(fraction) => Ok(Value::Fraction(fraction.abs())),
            Value::Complex(complex) => Ok(Value::Fraction(complex.abs()?)),
            Value::Sequence(sequence) => Ok(Value::integer(sequence.len() as i64)),
            Value::Text(text) => Ok(Value::integer(text.len() as i64)),
            Value::Matrix(matrix) => Ok(Value::integer(matrix.row_count() as i64)),
            _ => Ok(value),
        }
    }

    fn iterate(&self, value: Value) -> Result<Vec<Value>> {
        match value {
            Value::Sequence(sequence) => Ok(sequence.snapshot()),
            Value::Text(text) => Ok(text
                .as_string()
                .chars()
                .map(|ch| Value::Text(Text::from_char(ch)))
                .collect()),
            Value::Matrix(matrix) => Ok(matrix
                .snapshot()
                .into_iter()
                .map(|row| {
                    Value::Sequence(Sequence::new(
                        row.into_iter().map(Value::Fraction).collect(),
                    ))
                })
                .collect()),
            other => Err(fault(
                DiagnosticKind::TypeMismatch,
                format!("cannot iterate over {}", other.type_name()),
            )),
        }
    }

    /// One binding takes the item whole; several bindings destructure an
    /// index-addressable item positionally. Bindings land in the global
    /// registry and outlive the loop.
    fn bind_loop_item(&mut self, bindings: &[String], item: Value) -> Result<()> {
        if bindings.len() == 1 {
            self.env.set_var(&bindings[0], item);
            return Ok(());
        }
        for (position, name) in bindings.iter().enumerate() {
            let element = match &item {
                Value::Sequence(sequence) => sequence.get(position)?,
                Value::Text(text) => Value::Text(Text::from_char(text.get(position)?)),
                other => {
                    return Err(fault(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "cannot destructure {} across {} loop variables",
                            other.type_name(),
                            bindings.len()
                        ),
                    ));
                }
            };
            self.env.set_var(name, element);
        }
        Ok(())
    }

    /// Invokes any callable. Arguments are bound into the single global
    /// registry under the parameter names, so a reentrant call with
    /// identically named parameters overwrites the outer call's bindings.
    pub fn call_function(&mut self, function: &Function, args: Vec<Value>) -> Result<Value> {
        match function {
            Function::Native(native) => native.clone().call(self, &args),
            Function::Closure(closure) => {
                if args.len() != closure.params.len() {
                    return Err(arity_error(
                        function.name(),
                        closure.params.len(),
                        args.len(),
                    ));
                }
                for (name, value) in closure.params.iter().zip(args) {
                    self.env.set_var(name, value);
                }
                let body = closure.body.clone();
                self.evaluate(&body)
            }
            Function::User(user) => {
                let required = user
                    .params
                    .iter()
                    .take_while(|param| param.default.is_none())
                    .count();
                if args.len() < required || args.len() > user.params.len() {
                    return Err(arity_error(&user.name, user.params.len(), args.len()));
                }
                let mut args = args.into_iter();
                for param in &user.params {
                    let value = match args.next() {
                        Some(value) => value,
                        None => param.default.clone().ok_or_else(|| {
                            arity_error(&user.name, user.params.len(), required)
                        })?,
                    };
                    self.env.set_var(&param.name, value);
                }
                let body = user.body.clone();
                for stmt in &body {
                    match self.execute_statement(stmt)? {
                        Flow::Next | Flow::NextValue(_) => {}
                        Flow::Return(value) => return Ok(value),
                    }
                }
                // A body without `return` yields the true sentinel.
                Ok(Value::bool(true))
            }
        }
    }

    /// Resolves a callable name: the function registry first, then a
    /// function-valued variable, so assigned anonymous functions can be
    /// invoked by name.
    fn callable(&self, name: &str) -> Option<Function> {
        match self.env.get_function(name) {
            Ok(function) => Some(function),
            Err(_) => match self.env.lookup_var(name) {
                Some(Value::Function(function)) => Some(function),
                _ => None,
            },
        }
    }

    /// Whether `print` and interpolation render fractions as decimals.
    pub fn pretty_enabled(&self) -> bool {
        matches!(self.env.lookup_var("pretty"), Some(Value::Bool(true)))
    }

    /// Renders a value for output, running token interpolation over text.
    pub fn stringify(&mut self, value: &Value) -> Result<String> {
        match value {
            Value::Text(text) => self.fill_tokens(&text.as_string()),
            other => Ok(other.render(self.pretty_enabled())),
        }
    }

    /// Substitutes `$identifier` and `$identifier(args)` tokens. A bare
    /// identifier resolves against the variable registry; the call form
    /// re-invokes the top-level evaluate entry point on the captured
    /// argument text. Unresolved tokens stay verbatim.
    pub fn fill_tokens(&mut self, raw: &str) -> Result<String> {
        if self.interpolation_depth >= INTERPOLATION_LIMIT {
            return Err(fault(
                DiagnosticKind::Runtime,
                "token interpolation exceeded the recursion limit",
            ));
        }
        self.interpolation_depth += 1;
        let result = self.fill_tokens_inner(raw);
        self.interpolation_depth -= 1;
        result
    }

    fn fill_tokens_inner(&mut self, raw: &str) -> Result<String> {
        let chars: Vec<char> = raw.chars().collect();
        let mut output = String::with_capacity(raw.len());
        let mut cursor = 0;
        while cursor < chars.len() {
            if chars[cursor] != '$' {
                output.push(chars[cursor]);
                cursor += 1;
                continue;
            }
            let name_start = cursor + 1;
            let mut name_end = name_start;
            while name_end < chars.len()
                && (chars[name_end].is_alphanumeric() || chars[name_end] == '_')
            {
                name_end += 1;
            }
            if name_end == name_start {
                output.push('$');
                cursor += 1;
                continue;
            }
            let name: String = chars[name_start..name_end].iter().collect();
            if name_end < chars.len() && chars[name_end] == '(' {
                // Call form: capture up to the balanced closing paren.
                let mut depth = 0usize;
                let mut close = name_end;
                loop {
                    if close == chars.len() {
                        break;
                    }
                    match chars[close] {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    close += 1;
                }
                let token: String = chars[cursor..(close + 1).min(chars.len())].iter().collect();
                if close < chars.len() && self.callable(&name).is_some() {
                    let call_source: String = chars[name_start..=close].iter().collect();
                    let value = self.eval_source(&call_source)?;
                    output.push_str(&self.stringify(&value)?);
                } else {
                    output.push_str(&token);
                }
                cursor = (close + 1).min(chars.len());
            } else {
                match self.env.lookup_var(&name) {
                    Some(value) => output.push_str(&self.stringify(&value)?),
                    None => {
                        output.push('$');
                        output.push_str(&name);
                    }
                }
                cursor = name_end;
            }
        }
        Ok(output)
    }

    /// The `write(text)` collaborator behind the `print` native.
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }
}

fn arity_error(name: &str, expected: usize, received: usize) -> AbacusError {
    let label = if name.is_empty() { "<anonymous>" } else { name };
    fault(
        DiagnosticKind::ArityMismatch,
        format!("function `{label}` expected {expected} arguments but received {received}"),
    )
}

/// Control-flow signal threaded through block evaluation. The first
/// `Return` short-circuits out to the enclosing call.
enum Flow {
    Next,
    NextValue(Value),
    Return(Value),
}
