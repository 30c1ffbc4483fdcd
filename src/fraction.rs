use std::{cmp::Ordering, fmt};

use crate::diagnostics::{fault, DiagnosticKind, Result};

/// An exact rational number kept in lowest terms with the sign carried on
/// the numerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    num: i64,
    den: i64,
}

fn gcd(a: i128, b: i128) -> i128 {
    if b == 0 {
        // gcd(0, 0) would otherwise produce a zero divisor downstream.
        if a == 0 {
            1
        } else {
            a
        }
    } else {
        gcd(b, a % b)
    }
}

impl Fraction {
    pub const ZERO: Fraction = Fraction { num: 0, den: 1 };
    pub const ONE: Fraction = Fraction { num: 1, den: 1 };

    pub fn new(num: i64, den: i64) -> Result<Self> {
        if den == 0 {
            return Err(fault(
                DiagnosticKind::DivisionByZero,
                format!("fraction {num}/0 has a zero denominator"),
            ));
        }
        Ok(Self { num, den }.simplify())
    }

    pub const fn integer(value: i64) -> Self {
        Self { num: value, den: 1 }
    }

    /// Reduces a cross-multiplied intermediate back into `i64` range.
    /// The products of two in-range fractions always fit an `i128`; only
    /// the reduced result can overflow, which is a runtime fault rather
    /// than a panic.
    fn from_parts(num: i128, den: i128) -> Result<Self> {
        if den == 0 {
            return Err(fault(
                DiagnosticKind::DivisionByZero,
                format!("fraction {num}/0 has a zero denominator"),
            ));
        }
        let divisor = gcd(num.abs(), den.abs());
        let mut num = num / divisor;
        let mut den = den / divisor;
        if den < 0 {
            num = -num;
            den = -den;
        }
        match (i64::try_from(num), i64::try_from(den)) {
            (Ok(num), Ok(den)) => Ok(Self { num, den }),
            _ => Err(fault(
                DiagnosticKind::Runtime,
                format!("fraction {num}/{den} overflows 64-bit components"),
            )),
        }
    }

    /// Builds a fraction from the raw text of a numeric literal. The
    /// denominator comes from the count of fractional digits in the text,
    /// not from the binary value of a parsed float, so `0.1` is exactly
    /// 1/10.
    pub fn from_literal(text: &str) -> Result<Self> {
        let cleaned = text.replace('_', "");
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| {
                fault(
                    DiagnosticKind::Lexer,
                    format!("numeric literal `{text}` does not fit a 64-bit integer"),
                )
            })?
        };
        let mut num = whole;
        let mut den = 1i64;
        for ch in frac.chars() {
            let digit = ch.to_digit(10).ok_or_else(|| {
                fault(
                    DiagnosticKind::Lexer,
                    format!("numeric literal `{text}` contains a non-digit"),
                )
            })? as i64;
            num = num
                .checked_mul(10)
                .and_then(|n| n.checked_add(digit))
                .ok_or_else(|| {
                    fault(
                        DiagnosticKind::Lexer,
                        format!("numeric literal `{text}` overflows"),
                    )
                })?;
            den *= 10;
        }
        let num = if negative { -num } else { num };
        Self::new(num, den)
    }

    /// Reconstructs an approximate fraction from a float, used by the
    /// operations that evaluate through f64 (`pow`, the complex
    /// transcendentals). Precision is limited to nine fractional digits.
    pub fn approximate(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(fault(
                DiagnosticKind::Runtime,
                format!("cannot represent {value} as a fraction"),
            ));
        }
        let rendered = format!("{value:.9}");
        Self::from_literal(rendered.trim_end_matches('0').trim_end_matches('.')).map_err(|_| {
            fault(
                DiagnosticKind::Runtime,
                format!("cannot represent {value} as a fraction"),
            )
        })
    }

    pub fn simplify(self) -> Self {
        let divisor = gcd((self.num as i128).abs(), (self.den as i128).abs()) as i64;
        let mut num = self.num / divisor;
        let mut den = self.den / divisor;
        if den < 0 {
            num = -num;
            den = -den;
        }
        Self { num, den }
    }

    pub fn numerator(&self) -> i64 {
        self.num
    }

    pub fn denominator(&self) -> i64 {
        self.den
    }

    pub fn add(&self, other: &Fraction) -> Result<Fraction> {
        Fraction::from_parts(
            self.num as i128 * other.den as i128 + other.num as i128 * self.den as i128,
            self.den as i128 * other.den as i128,
        )
    }

    pub fn subtract(&self, other: &Fraction) -> Result<Fraction> {
        Fraction::from_parts(
            self.num as i128 * other.den as i128 - other.num as i128 * self.den as i128,
            self.den as i128 * other.den as i128,
        )
    }

    pub fn multiply(&self, other: &Fraction) -> Result<Fraction> {
        Fraction::from_parts(
            self.num as i128 * other.num as i128,
            self.den as i128 * other.den as i128,
        )
    }

    pub fn divide(&self, other: &Fraction) -> Result<Fraction> {
        if other.num == 0 {
            return Err(fault(
                DiagnosticKind::DivisionByZero,
                format!("{self} divided by zero"),
            ));
        }
        Fraction::from_parts(
            self.num as i128 * other.den as i128,
            self.den as i128 * other.num as i128,
        )
    }

    /// Exact remainder: `a - b * trunc(a / b)`.
    pub fn modulo(&self, other: &Fraction) -> Result<Fraction> {
        if other.num == 0 {
            return Err(fault(
                DiagnosticKind::DivisionByZero,
                format!("{self} modulo zero"),
            ));
        }
        let quotient = self.divide(other)?;
        let truncated = Fraction::integer(quotient.num / quotient.den);
        self.subtract(&other.multiply(&truncated)?)
    }

    /// Raises through f64 and reconstructs, so non-integer exponents are
    /// approximate by design.
    pub fn pow(&self, exponent: &Fraction) -> Result<Fraction> {
        Fraction::approximate(self.to_f64().powf(exponent.to_f64()))
    }

    pub fn factorial(&self) -> Result<Fraction> {
        if !self.is_integer() || self.num < 0 {
            return Err(fault(
                DiagnosticKind::TypeMismatch,
                format!("factorial requires a non-negative integer, found {self}"),
            ));
        }
        let mut product: i64 = 1;
        for step in 2..=self.num {
            product = product.checked_mul(step).ok_or_else(|| {
                fault(
                    DiagnosticKind::Runtime,
                    format!("{}! overflows a 64-bit integer", self.num),
                )
            })?;
        }
        Ok(Fraction::integer(product))
    }

    pub fn negate(&self) -> Fraction {
        Fraction {
            num: -self.num,
            den: self.den,
        }
    }

    pub fn abs(&self) -> Fraction {
        Fraction {
            num: self.num.abs(),
            den: self.den,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.simplify().den == 1
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Decimal rendering used by `print` when the `pretty` flag is set.
    pub fn to_decimal_string(&self) -> String {
        if self.is_integer() {
            self.simplify().num.to_string()
        } else {
            self.to_f64().to_string()
        }
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Cross-multiplied comparison in i128 to dodge overflow; both
        // denominators are positive after simplification.
        let lhs = self.num as i128 * other.den as i128;
        let rhs = other.num as i128 * self.den as i128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reduced = self.simplify();
        if reduced.den == 1 {
            write!(f, "{}", reduced.num)
        } else {
            write!(f, "{}/{}", reduced.num, reduced.den)
        }
    }
}
