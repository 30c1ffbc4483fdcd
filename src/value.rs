use std::{fmt, rc::Rc};

use crate::{
    ast::{Expr, Stmt},
    complex::Complex,
    diagnostics::{fault, DiagnosticKind, Result},
    fraction::Fraction,
    matrix::Matrix,
    runtime::Interpreter,
    sequence::{Sequence, Text},
};

/// The closed set of runtime values. Dispatch over operators and native
/// boundaries matches exhaustively on this enum instead of relying on
/// dynamic capability probing.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Fraction(Fraction),
    Complex(Complex),
    Matrix(Matrix),
    Sequence(Sequence),
    Text(Text),
    Function(Function),
}

impl Value {
    pub fn bool(value: bool) -> Self {
        Value::Bool(value)
    }

    pub fn integer(value: i64) -> Self {
        Value::Fraction(Fraction::integer(value))
    }

    pub fn text(value: impl AsRef<str>) -> Self {
        Value::Text(Text::new(value.as_ref()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Fraction(_) => "Fraction",
            Value::Complex(_) => "Complex",
            Value::Matrix(_) => "Matrix",
            Value::Sequence(_) => "Sequence",
            Value::Text(_) => "Text",
            Value::Function(_) => "Function",
        }
    }

    pub fn expect_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.mismatch("Bool")),
        }
    }

    pub fn expect_fraction(&self) -> Result<Fraction> {
        match self {
            Value::Fraction(fraction) => Ok(*fraction),
            _ => Err(self.mismatch("Fraction")),
        }
    }

    /// Accepts a Fraction as a real complex number as well.
    pub fn expect_complex(&self) -> Result<Complex> {
        match self {
            Value::Complex(complex) => Ok(*complex),
            Value::Fraction(fraction) => Ok(Complex::from_real(*fraction)),
            _ => Err(self.mismatch("Complex")),
        }
    }

    pub fn expect_matrix(&self) -> Result<Matrix> {
        match self {
            Value::Matrix(matrix) => Ok(matrix.clone()),
            _ => Err(self.mismatch("Matrix")),
        }
    }

    pub fn expect_sequence(&self) -> Result<Sequence> {
        match self {
            Value::Sequence(sequence) => Ok(sequence.clone()),
            _ => Err(self.mismatch("Sequence")),
        }
    }

    pub fn expect_text(&self) -> Result<Text> {
        match self {
            Value::Text(text) => Ok(text.clone()),
            _ => Err(self.mismatch("Text")),
        }
    }

    pub fn expect_function(&self) -> Result<Function> {
        match self {
            Value::Function(function) => Ok(function.clone()),
            _ => Err(self.mismatch("Function")),
        }
    }

    /// Index of a fraction that must be a non-negative integer.
    pub fn expect_index(&self) -> Result<usize> {
        let fraction = self.expect_fraction()?;
        if !fraction.is_integer() || fraction.numerator() < 0 {
            return Err(fault(
                DiagnosticKind::TypeMismatch,
                format!("expected a non-negative integer index, found {fraction}"),
            ));
        }
        Ok(fraction.numerator() as usize)
    }

    fn mismatch(&self, expected: &str) -> crate::diagnostics::AbacusError {
        fault(
            DiagnosticKind::TypeMismatch,
            format!("expected {expected}, found {}", self.type_name()),
        )
    }

    /// Equality as the language defines it: fractions by numeric value,
    /// complex numbers by components, sequence-derived values by length
    /// plus identical stringified structural form, functions by identity.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Fraction(a), Value::Fraction(b)) => a.cmp(b).is_eq(),
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => {
                a.len() == b.len() && a.to_string() == b.to_string()
            }
            (Value::Text(a), Value::Text(b)) => {
                a.len() == b.len() && a.as_string() == b.as_string()
            }
            (Value::Matrix(a), Value::Matrix(b)) => {
                a.row_count() == b.row_count() && a.to_string() == b.to_string()
            }
            (Value::Function(a), Value::Function(b)) => a.is_same(b),
            _ => false,
        }
    }

    /// Rendering used by `print` and interpolation; when `pretty` is set
    /// fractions render as evaluated decimals instead of `num/den`.
    pub fn render(&self, pretty: bool) -> String {
        match self {
            Value::Fraction(fraction) if pretty => fraction.to_decimal_string(),
            Value::Complex(complex) if pretty => {
                let real = Value::Fraction(complex.re).render(true);
                if complex.is_real() {
                    real
                } else if complex.re.is_zero() {
                    format!("{}i", Value::Fraction(complex.im).render(true))
                } else if complex.im < Fraction::ZERO {
                    format!(
                        "{real} - {}i",
                        Value::Fraction(complex.im.abs()).render(true)
                    )
                } else {
                    format!("{real} + {}i", Value::Fraction(complex.im).render(true))
                }
            }
            Value::Sequence(sequence) if pretty => {
                let parts: Vec<String> = sequence
                    .snapshot()
                    .iter()
                    .map(|item| item.render(true))
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Fraction(fraction) => write!(f, "{fraction}"),
            Value::Complex(complex) => write!(f, "{complex}"),
            Value::Matrix(matrix) => write!(f, "{matrix}"),
            Value::Sequence(sequence) => write!(f, "{sequence}"),
            Value::Text(text) => write!(f, "{text}"),
            Value::Function(function) => write!(f, "{function}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "\"{text}\""),
            other => write!(f, "{other}"),
        }
    }
}

/// A callable entity: declared function, anonymous single-expression
/// closure, or host-provided native.
#[derive(Clone)]
pub enum Function {
    User(Rc<UserFunction>),
    Closure(Rc<Closure>),
    Native(NativeFunction),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::User(fun) => &fun.name,
            Function::Closure(_) => "",
            Function::Native(fun) => fun.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::User(fun) => fun.params.len(),
            Function::Closure(fun) => fun.params.len(),
            Function::Native(fun) => fun.arity,
        }
    }

    fn is_same(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::User(a), Function::User(b)) => Rc::ptr_eq(a, b),
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            (Function::Native(a), Function::Native(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::User(fun) => write!(f, "<fn {}>", fun.name),
            Function::Closure(_) => write!(f, "<fn>"),
            Function::Native(fun) => write!(f, "<native fn {}>", fun.name),
        }
    }
}

/// A declared function with a block body. Default parameter expressions
/// are evaluated once, at declaration time, into stored values.
pub struct UserFunction {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

/// An anonymous single-expression function. Its body is evaluated and
/// returned directly; explicit `return` is not part of the closure form.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Expr,
}

/// Marker arity for variadic natives.
pub const VARIADIC: usize = usize::MAX;

#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub callback: fn(&mut Interpreter, &[Value]) -> Result<Value>,
}

impl NativeFunction {
    pub fn call(&self, interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
        if self.arity != VARIADIC && args.len() != self.arity {
            return Err(fault(
                DiagnosticKind::ArityMismatch,
                format!(
                    "function `{}` expected {} arguments but received {}",
                    self.name,
                    self.arity,
                    args.len()
                ),
            ));
        }
        (self.callback)(interpreter, args)
    }
}
