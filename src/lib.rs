//! Core library for the Abacus scripting language: an expression-oriented
//! calculator language with exact fraction arithmetic, complex numbers,
//! and matrix algebra over a single flat environment.

pub mod ast;
pub mod complex;
pub mod diagnostics;
pub mod environment;
pub mod fraction;
pub mod lexer;
pub mod matrix;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod sequence;
pub mod stdlib;
pub mod value;

pub use complex::Complex;
pub use diagnostics::{AbacusError, Diagnostic, DiagnosticKind, SourceSpan};
pub use fraction::Fraction;
pub use matrix::Matrix;
pub use repl::Repl;
pub use runtime::Interpreter;
pub use sequence::{Sequence, Text};
pub use value::{Function, Value};
