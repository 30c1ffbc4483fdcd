use std::fmt;

use crate::{diagnostics::Result, fraction::Fraction};

/// A complex number with exact rational components. The transcendental
/// operations evaluate through f64 and reconstruct approximate fractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Complex {
    pub re: Fraction,
    pub im: Fraction,
}

impl Complex {
    pub const I: Complex = Complex {
        re: Fraction::ZERO,
        im: Fraction::ONE,
    };

    pub fn new(re: Fraction, im: Fraction) -> Self {
        Self { re, im }
    }

    pub fn from_real(re: Fraction) -> Self {
        Self {
            re,
            im: Fraction::ZERO,
        }
    }

    pub fn is_real(&self) -> bool {
        self.im.is_zero()
    }

    pub fn add(&self, other: &Complex) -> Result<Complex> {
        Ok(Complex {
            re: self.re.add(&other.re)?,
            im: self.im.add(&other.im)?,
        })
    }

    pub fn subtract(&self, other: &Complex) -> Result<Complex> {
        Ok(Complex {
            re: self.re.subtract(&other.re)?,
            im: self.im.subtract(&other.im)?,
        })
    }

    /// `(a+bi)(c+di) = (ac - bd) + (ad + bc)i`
    pub fn multiply(&self, other: &Complex) -> Result<Complex> {
        let ac = self.re.multiply(&other.re)?;
        let bd = self.im.multiply(&other.im)?;
        let ad = self.re.multiply(&other.im)?;
        let bc = self.im.multiply(&other.re)?;
        Ok(Complex {
            re: ac.subtract(&bd)?,
            im: ad.add(&bc)?,
        })
    }

    /// Conjugate-multiplication division:
    /// `(a+bi)/(c+di) = (ac+bd)/(c²+d²) + (bc-ad)/(c²+d²) i`.
    pub fn divide(&self, other: &Complex) -> Result<Complex> {
        let denom = other
            .re
            .multiply(&other.re)?
            .add(&other.im.multiply(&other.im)?)?;
        let ac = self.re.multiply(&other.re)?;
        let bd = self.im.multiply(&other.im)?;
        let bc = self.im.multiply(&other.re)?;
        let ad = self.re.multiply(&other.im)?;
        Ok(Complex {
            re: ac.add(&bd)?.divide(&denom)?,
            im: bc.subtract(&ad)?.divide(&denom)?,
        })
    }

    pub fn conjugate(&self) -> Complex {
        Complex {
            re: self.re,
            im: self.im.negate(),
        }
    }

    pub fn negate(&self) -> Complex {
        Complex {
            re: self.re.negate(),
            im: self.im.negate(),
        }
    }

    /// Euclidean magnitude `sqrt(re² + im²)`.
    pub fn abs(&self) -> Result<Fraction> {
        let squared = self.re.to_f64().powi(2) + self.im.to_f64().powi(2);
        Fraction::approximate(squared.sqrt())
    }

    /// Argument as `atan2(im, re)`, in radians or degrees.
    pub fn arg(&self, degrees: bool) -> Result<Fraction> {
        let radians = self.im.to_f64().atan2(self.re.to_f64());
        if degrees {
            Fraction::approximate(radians.to_degrees())
        } else {
            Fraction::approximate(radians)
        }
    }

    /// Polar-form power: `r^n (cos(nθ) + i sin(nθ))`.
    pub fn pow(&self, exponent: &Fraction) -> Result<Complex> {
        let n = exponent.to_f64();
        let magnitude = (self.re.to_f64().powi(2) + self.im.to_f64().powi(2)).sqrt();
        let theta = self.im.to_f64().atan2(self.re.to_f64());
        let scale = magnitude.powf(n);
        Ok(Complex {
            re: Fraction::approximate(scale * (n * theta).cos())?,
            im: Fraction::approximate(scale * (n * theta).sin())?,
        })
    }

    /// `e^(a+bi) = e^a (cos b + i sin b)`
    pub fn exp(&self) -> Result<Complex> {
        let scale = self.re.to_f64().exp();
        let b = self.im.to_f64();
        Ok(Complex {
            re: Fraction::approximate(scale * b.cos())?,
            im: Fraction::approximate(scale * b.sin())?,
        })
    }

    /// `sin(a+bi) = sin a cosh b + i cos a sinh b`
    pub fn sin(&self) -> Result<Complex> {
        let (a, b) = (self.re.to_f64(), self.im.to_f64());
        Ok(Complex {
            re: Fraction::approximate(a.sin() * b.cosh())?,
            im: Fraction::approximate(a.cos() * b.sinh())?,
        })
    }

    /// `cos(a+bi) = cos a cosh b - i sin a sinh b`
    pub fn cos(&self) -> Result<Complex> {
        let (a, b) = (self.re.to_f64(), self.im.to_f64());
        Ok(Complex {
            re: Fraction::approximate(a.cos() * b.cosh())?,
            im: Fraction::approximate(-(a.sin() * b.sinh()))?,
        })
    }

    pub fn tan(&self) -> Result<Complex> {
        self.sin()?.divide(&self.cos()?)
    }

    /// `sinh(a+bi) = sinh a cos b + i cosh a sin b`
    pub fn sinh(&self) -> Result<Complex> {
        let (a, b) = (self.re.to_f64(), self.im.to_f64());
        Ok(Complex {
            re: Fraction::approximate(a.sinh() * b.cos())?,
            im: Fraction::approximate(a.cosh() * b.sin())?,
        })
    }

    /// `cosh(a+bi) = cosh a cos b + i sinh a sin b`
    pub fn cosh(&self) -> Result<Complex> {
        let (a, b) = (self.re.to_f64(), self.im.to_f64());
        Ok(Complex {
            re: Fraction::approximate(a.cosh() * b.cos())?,
            im: Fraction::approximate(a.sinh() * b.sin())?,
        })
    }

    pub fn tanh(&self) -> Result<Complex> {
        self.sinh()?.divide(&self.cosh()?)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_zero() {
            return write!(f, "{}", self.re);
        }
        if self.re.is_zero() {
            return write!(f, "{}i", self.im);
        }
        if self.im < Fraction::ZERO {
            write!(f, "{} - {}i", self.re, self.im.abs())
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}
