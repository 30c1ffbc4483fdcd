//! Built-in constants and native functions installed into every fresh
//! environment.

use crate::{
    complex::Complex,
    diagnostics::{fault, DiagnosticKind, Result},
    environment::Environment,
    fraction::Fraction,
    matrix::Matrix,
    runtime::Interpreter,
    sequence::{Sequence, Text},
    value::{Function, NativeFunction, Value, VARIADIC},
};

pub fn install(env: &mut Environment) {
    env.set_var("pretty", Value::bool(false));
    env.set_var("i", Value::Complex(Complex::I));
    // The irrational constants are the one deliberately inexact corner
    // of the numeric tower.
    if let Ok(pi) = Fraction::approximate(std::f64::consts::PI) {
        env.set_var("pi", Value::Fraction(pi));
    }
    if let Ok(e) = Fraction::approximate(std::f64::consts::E) {
        env.set_var("e", Value::Fraction(e));
    }

    let natives: &[(&'static str, usize, fn(&mut Interpreter, &[Value]) -> Result<Value>)] = &[
        ("print", VARIADIC, print),
        ("str", 1, str_native),
        ("fill", 1, fill),
        ("range", 3, range),
        // scalar numerics
        ("fraction", 2, fraction),
        ("abs", 1, abs),
        ("pow", 2, pow),
        ("factorial", 1, factorial),
        ("sqrt", 1, sqrt),
        ("floor", 1, floor),
        ("ceil", 1, ceil),
        ("round", 1, round),
        // complex numbers
        ("complex", 2, complex),
        ("re", 1, re),
        ("im", 1, im),
        ("conjugate", 1, conjugate),
        ("arg", 1, arg),
        ("argd", 1, argd),
        ("exp", 1, exp),
        ("sin", 1, sin),
        ("cos", 1, cos),
        ("tan", 1, tan),
        ("sinh", 1, sinh),
        ("cosh", 1, cosh),
        ("tanh", 1, tanh),
        // sequences and text
        ("length", 1, length),
        ("append", 2, append),
        ("insert", 3, insert),
        ("remove", 2, remove),
        ("get", 2, get),
        ("set", 3, set),
        ("index_of", 2, index_of),
        ("contains", 2, contains),
        ("slice", 3, slice),
        ("map", 2, map),
        ("filter", 2, filter),
        ("reduce", 3, reduce),
        // text only
        ("find", 2, find),
        ("substring", 3, substring),
        ("upper", 1, upper),
        ("lower", 1, lower),
        ("trim", 1, trim),
        ("reverse", 1, reverse),
        ("replace", 3, replace),
        ("pad_start", 3, pad_start),
        ("pad_end", 3, pad_end),
        ("truncate", 2, truncate),
        ("split", 2, split),
        // matrices
        ("matrix", 2, matrix_native),
        ("identity", 1, identity),
        ("transpose", 1, transpose),
        ("det", 1, det),
        ("inverse", 1, inverse),
        ("rref", 1, rref),
        ("rank", 1, rank),
        ("solve", 2, solve),
        ("rows", 1, rows),
        ("cols", 1, cols),
        ("cell", 3, cell),
        ("set_cell", 4, set_cell),
        ("is_square", 1, is_square),
        ("is_diagonal", 1, is_diagonal),
        ("is_identity", 1, is_identity),
        ("is_lower_triangular", 1, is_lower_triangular),
        ("is_upper_triangular", 1, is_upper_triangular),
        ("is_symmetric", 1, is_symmetric),
        ("is_skew_symmetric", 1, is_skew_symmetric),
        ("is_orthogonal", 1, is_orthogonal),
    ];
    for (name, arity, callback) in natives {
        env.set_function(
            name,
            Function::Native(NativeFunction {
                name: *name,
                arity: *arity,
                callback: *callback,
            }),
        );
    }
}

/// Renders every argument, joins them with single spaces, and forwards
/// the line to the interpreter's output sink.
fn print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(interpreter.stringify(arg)?);
    }
    interpreter.write_line(&parts.join(" "))?;
    Ok(Value::bool(true))
}

fn str_native(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let rendered = interpreter.stringify(&args[0])?;
    Ok(Value::text(rendered))
}

fn fill(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = args[0].expect_text()?;
    let filled = interpreter.fill_tokens(&text.as_string())?;
    Ok(Value::text(filled))
}

/// `range(start, end, step)`: start-inclusive, end-exclusive.
fn range(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let start = args[0].expect_fraction()?;
    let end = args[1].expect_fraction()?;
    let step = args[2].expect_fraction()?;
    if step.is_zero() {
        return Err(fault(
            DiagnosticKind::Runtime,
            "range step must be non-zero",
        ));
    }
    let ascending = step > Fraction::ZERO;
    let mut items = Vec::new();
    let mut cursor = start;
    while (ascending && cursor < end) || (!ascending && cursor > end) {
        items.push(Value::Fraction(cursor));
        cursor = cursor.add(&step)?;
    }
    Ok(Value::Sequence(Sequence::new(items)))
}

fn fraction(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let num = args[0].expect_fraction()?;
    let den = args[1].expect_fraction()?;
    Ok(Value::Fraction(num.divide(&den)?))
}

fn abs(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Fraction(fraction) => Ok(Value::Fraction(fraction.abs())),
        Value::Complex(complex) => Ok(Value::Fraction(complex.abs()?)),
        other => Err(type_error("abs", "a number", other)),
    }
}

fn pow(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let exponent = args[1].expect_fraction()?;
    match &args[0] {
        Value::Fraction(base) => Ok(Value::Fraction(base.pow(&exponent)?)),
        Value::Complex(base) => Ok(Value::Complex(base.pow(&exponent)?)),
        other => Err(type_error("pow", "a number", other)),
    }
}

fn factorial(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Fraction(args[0].expect_fraction()?.factorial()?))
}

/// Square root; a negative fraction lifts into the complex plane.
fn sqrt(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let half = Fraction::new(1, 2)?;
    match &args[0] {
        Value::Fraction(fraction) => {
            if *fraction < Fraction::ZERO {
                let magnitude = Fraction::approximate(fraction.abs().to_f64().sqrt())?;
                Ok(Value::Complex(Complex::new(Fraction::ZERO, magnitude)))
            } else {
                Ok(Value::Fraction(Fraction::approximate(
                    fraction.to_f64().sqrt(),
                )?))
            }
        }
        Value::Complex(complex) => Ok(demote(complex.pow(&half)?)),
        other => Err(type_error("sqrt", "a number", other)),
    }
}

fn floor(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let fraction = args[0].expect_fraction()?;
    // The denominator is kept positive, so Euclidean division floors.
    Ok(Value::integer(
        fraction.numerator().div_euclid(fraction.denominator()),
    ))
}

fn ceil(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let fraction = args[0].expect_fraction()?;
    Ok(Value::integer(
        -(-fraction.numerator()).div_euclid(fraction.denominator()),
    ))
}

fn round(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let shifted = args[0].expect_fraction()?.add(&Fraction::new(1, 2)?)?;
    Ok(Value::integer(
        shifted.numerator().div_euclid(shifted.denominator()),
    ))
}

fn complex(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let re = args[0].expect_fraction()?;
    let im = args[1].expect_fraction()?;
    Ok(Value::Complex(Complex::new(re, im)))
}

fn re(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Fraction(args[0].expect_complex()?.re))
}

fn im(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Fraction(args[0].expect_complex()?.im))
}

fn conjugate(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Complex(args[0].expect_complex()?.conjugate()))
}

fn arg(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Fraction(args[0].expect_complex()?.arg(false)?))
}

/// Argument in degrees rather than radians.
fn argd(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Fraction(args[0].expect_complex()?.arg(true)?))
}

/// A complex result with a vanishing imaginary part collapses back to a
/// fraction, so real inputs keep real outputs.
fn demote(complex: Complex) -> Value {
    if complex.is_real() {
        Value::Fraction(complex.re)
    } else {
        Value::Complex(complex)
    }
}

macro_rules! analytic {
    ($name:ident) => {
        fn $name(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
            Ok(demote(args[0].expect_complex()?.$name()?))
        }
    };
}

analytic!(exp);
analytic!(sin);
analytic!(cos);
analytic!(tan);
analytic!(sinh);
analytic!(cosh);
analytic!(tanh);

fn length(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Sequence(sequence) => Ok(Value::integer(sequence.len() as i64)),
        Value::Text(text) => Ok(Value::integer(text.len() as i64)),
        Value::Matrix(matrix) => Ok(Value::integer(matrix.row_count() as i64)),
        other => Err(type_error("length", "a sequence-derived value", other)),
    }
}

/// Mutates the receiver in place and hands it back for chaining.
fn append(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Sequence(sequence) => {
            sequence.append(args[1].clone());
            Ok(args[0].clone())
        }
        Value::Text(text) => {
            text.append(&args[1].expect_text()?);
            Ok(args[0].clone())
        }
        other => Err(type_error("append", "a sequence or text", other)),
    }
}

fn insert(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let index = args[1].expect_index()?;
    match &args[0] {
        Value::Sequence(sequence) => {
            sequence.insert(index, args[2].clone())?;
            Ok(args[0].clone())
        }
        Value::Text(text) => {
            text.insert(index, single_char(&args[2])?)?;
            Ok(args[0].clone())
        }
        other => Err(type_error("insert", "a sequence or text", other)),
    }
}

/// Removes and returns the element at the index.
fn remove(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let index = args[1].expect_index()?;
    match &args[0] {
        Value::Sequence(sequence) => sequence.remove(index),
        Value::Text(text) => Ok(Value::Text(Text::from_char(text.remove(index)?))),
        other => Err(type_error("remove", "a sequence or text", other)),
    }
}

fn get(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let index = args[1].expect_index()?;
    match &args[0] {
        Value::Sequence(sequence) => sequence.get(index),
        Value::Text(text) => Ok(Value::Text(Text::from_char(text.get(index)?))),
        other => Err(type_error("get", "a sequence or text", other)),
    }
}

fn set(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let index = args[1].expect_index()?;
    match &args[0] {
        Value::Sequence(sequence) => {
            sequence.set(index, args[2].clone())?;
            Ok(args[0].clone())
        }
        Value::Text(text) => {
            text.set(index, single_char(&args[2])?)?;
            Ok(args[0].clone())
        }
        other => Err(type_error("set", "a sequence or text", other)),
    }
}

/// First matching position, `-1` when absent.
fn index_of(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let found = match &args[0] {
        Value::Sequence(sequence) => sequence.index_of(&args[1]),
        Value::Text(text) => text.find(&args[1].expect_text()?),
        other => return Err(type_error("index_of", "a sequence or text", other)),
    };
    Ok(match found {
        Some(index) => Value::integer(index as i64),
        None => Value::integer(-1),
    })
}

fn contains(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Sequence(sequence) => Ok(Value::bool(sequence.contains(&args[1]))),
        Value::Text(text) => Ok(Value::bool(text.contains(&args[1].expect_text()?))),
        other => Err(type_error("contains", "a sequence or text", other)),
    }
}

/// End-inclusive window copy.
fn slice(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let start = args[1].expect_index()?;
    let end = args[2].expect_index()?;
    match &args[0] {
        Value::Sequence(sequence) => Ok(Value::Sequence(sequence.slice(start, end)?)),
        Value::Text(text) => Ok(Value::Text(text.substring(start, end)?)),
        other => Err(type_error("slice", "a sequence or text", other)),
    }
}

fn map(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let sequence = args[0].expect_sequence()?;
    let function = args[1].expect_function()?;
    let mut mapped = Vec::with_capacity(sequence.len());
    for item in sequence.snapshot() {
        mapped.push(interpreter.call_function(&function, vec![item])?);
    }
    Ok(Value::Sequence(Sequence::new(mapped)))
}

fn filter(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let sequence = args[0].expect_sequence()?;
    let function = args[1].expect_function()?;
    let mut kept = Vec::new();
    for item in sequence.snapshot() {
        if interpreter
            .call_function(&function, vec![item.clone()])?
            .expect_bool()?
        {
            kept.push(item);
        }
    }
    Ok(Value::Sequence(Sequence::new(kept)))
}

/// `reduce(sequence, fn(acc, item) => ..., initial)`.
fn reduce(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let sequence = args[0].expect_sequence()?;
    let function = args[1].expect_function()?;
    let mut accumulator = args[2].clone();
    for item in sequence.snapshot() {
        accumulator = interpreter.call_function(&function, vec![accumulator, item])?;
    }
    Ok(accumulator)
}

/// Character index of the first occurrence, `-1` when absent.
fn find(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let haystack = args[0].expect_text()?;
    let needle = args[1].expect_text()?;
    Ok(match haystack.find(&needle) {
        Some(index) => Value::integer(index as i64),
        None => Value::integer(-1),
    })
}

fn substring(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = args[0].expect_text()?;
    let start = args[1].expect_index()?;
    let end = args[2].expect_index()?;
    Ok(Value::Text(text.substring(start, end)?))
}

fn upper(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Text(args[0].expect_text()?.to_upper()))
}

fn lower(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Text(args[0].expect_text()?.to_lower()))
}

fn trim(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Text(args[0].expect_text()?.trim()))
}

fn reverse(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Text(args[0].expect_text()?.reverse()))
}

fn replace(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = args[0].expect_text()?;
    let from = args[1].expect_text()?;
    let to = args[2].expect_text()?;
    Ok(Value::Text(text.replace(&from, &to)))
}

fn pad_start(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = args[0].expect_text()?;
    let width = args[1].expect_index()?;
    Ok(Value::Text(text.pad_start(width, single_char(&args[2])?)))
}

fn pad_end(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = args[0].expect_text()?;
    let width = args[1].expect_index()?;
    Ok(Value::Text(text.pad_end(width, single_char(&args[2])?)))
}

fn truncate(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = args[0].expect_text()?;
    Ok(Value::Text(text.truncate(args[1].expect_index()?)))
}

fn split(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let text = args[0].expect_text()?;
    let separator = args[1].expect_text()?;
    let pieces = text
        .split(&separator)
        .into_iter()
        .map(Value::Text)
        .collect();
    Ok(Value::Sequence(Sequence::new(pieces)))
}

/// Zero-filled matrix of the given shape.
fn matrix_native(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let rows = args[0].expect_index()?;
    let cols = args[1].expect_index()?;
    Ok(Value::Matrix(Matrix::new(vec![
        vec![Fraction::ZERO; cols];
        rows
    ])))
}

fn identity(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Matrix(Matrix::identity(args[0].expect_index()?)))
}

fn transpose(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Matrix(args[0].expect_matrix()?.transpose()))
}

fn det(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Fraction(args[0].expect_matrix()?.determinant()?))
}

fn inverse(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Matrix(args[0].expect_matrix()?.inverse()?))
}

fn rref(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Matrix(args[0].expect_matrix()?.rref()?))
}

fn rank(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::integer(args[0].expect_matrix()?.rank()? as i64))
}

fn solve(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let coefficients = args[0].expect_matrix()?;
    let rhs = args[1].expect_matrix()?;
    Ok(Value::Matrix(coefficients.solve(&rhs)?))
}

fn rows(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::integer(args[0].expect_matrix()?.row_count() as i64))
}

fn cols(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::integer(args[0].expect_matrix()?.col_count() as i64))
}

fn cell(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let matrix = args[0].expect_matrix()?;
    let row = args[1].expect_index()?;
    let col = args[2].expect_index()?;
    Ok(Value::Fraction(matrix.get(row, col)?))
}

fn set_cell(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let matrix = args[0].expect_matrix()?;
    let row = args[1].expect_index()?;
    let col = args[2].expect_index()?;
    matrix.set(row, col, args[3].expect_fraction()?)?;
    Ok(args[0].clone())
}

macro_rules! predicate {
    ($name:ident) => {
        fn $name(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
            Ok(Value::bool(args[0].expect_matrix()?.$name()))
        }
    };
}

predicate!(is_square);
predicate!(is_diagonal);
predicate!(is_identity);
predicate!(is_lower_triangular);
predicate!(is_upper_triangular);
predicate!(is_symmetric);
predicate!(is_skew_symmetric);

fn is_orthogonal(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::bool(args[0].expect_matrix()?.is_orthogonal()?))
}

fn single_char(value: &Value) -> Result<char> {
    let text = value.expect_text()?;
    let rendered = text.as_string();
    let mut chars = rendered.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(fault(
            DiagnosticKind::TypeMismatch,
            format!("expected a single character, found \"{rendered}\""),
        )),
    }
}

fn type_error(name: &str, expected: &str, found: &Value) -> crate::diagnostics::AbacusError {
    fault(
        DiagnosticKind::TypeMismatch,
        format!("`{name}` expects {expected}, found {}", found.type_name()),
    )
}
