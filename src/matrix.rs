use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    diagnostics::{fault, DiagnosticKind, Result},
    fraction::Fraction,
};

/// A rectangular grid of fractions. The backing rows are shared and
/// interior-mutable so that `set` through one binding is visible through
/// every clone of the same matrix value; every algebraic operation
/// returns a fresh matrix.
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: Rc<RefCell<Vec<Vec<Fraction>>>>,
}

impl Matrix {
    /// Builds a matrix from a possibly ragged grid; short rows are padded
    /// with zeros to the longest row's length.
    pub fn new(grid: Vec<Vec<Fraction>>) -> Self {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        let rows = grid
            .into_iter()
            .map(|mut row| {
                row.resize(width, Fraction::ZERO);
                row
            })
            .collect();
        Self {
            rows: Rc::new(RefCell::new(rows)),
        }
    }

    pub fn identity(size: usize) -> Self {
        let rows = (0..size)
            .map(|i| {
                (0..size)
                    .map(|j| if i == j { Fraction::ONE } else { Fraction::ZERO })
                    .collect()
            })
            .collect();
        Self::new(rows)
    }

    pub fn snapshot(&self) -> Vec<Vec<Fraction>> {
        self.rows.borrow().clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.borrow().first().map(Vec::len).unwrap_or(0)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Fraction> {
        self.rows
            .borrow()
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
            .ok_or_else(|| {
                fault(
                    DiagnosticKind::IndexOutOfRange,
                    format!(
                        "cell ({row}, {col}) is outside a {}x{} matrix",
                        self.row_count(),
                        self.col_count()
                    ),
                )
            })
    }

    pub fn set(&self, row: usize, col: usize, value: Fraction) -> Result<()> {
        let mut rows = self.rows.borrow_mut();
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let cell = rows
            .get_mut(row)
            .and_then(|cells| cells.get_mut(col))
            .ok_or_else(|| {
                fault(
                    DiagnosticKind::IndexOutOfRange,
                    format!("cell ({row}, {col}) is outside a {height}x{width} matrix"),
                )
            })?;
        *cell = value;
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let rows = self.rows.borrow();
        let transposed = (0..self.col_count())
            .map(|col| rows.iter().map(|row| row[col]).collect())
            .collect();
        Matrix::new(transposed)
    }

    fn require_same_shape(&self, other: &Matrix, op: &str) -> Result<()> {
        if self.row_count() != other.row_count() || self.col_count() != other.col_count() {
            return Err(fault(
                DiagnosticKind::DimensionMismatch,
                format!(
                    "cannot {op} a {}x{} matrix and a {}x{} matrix",
                    self.row_count(),
                    self.col_count(),
                    other.row_count(),
                    other.col_count()
                ),
            ));
        }
        Ok(())
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.require_same_shape(other, "add")?;
        self.zip_cells(other, Fraction::add)
    }

    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        self.require_same_shape(other, "subtract")?;
        self.zip_cells(other, Fraction::subtract)
    }

    fn zip_cells(
        &self,
        other: &Matrix,
        op: impl Fn(&Fraction, &Fraction) -> Result<Fraction>,
    ) -> Result<Matrix> {
        let left = self.rows.borrow();
        let right = other.rows.borrow();
        let mut rows = Vec::with_capacity(left.len());
        for (a, b) in left.iter().zip(right.iter()) {
            let mut row = Vec::with_capacity(a.len());
            for (x, y) in a.iter().zip(b.iter()) {
                row.push(op(x, y)?);
            }
            rows.push(row);
        }
        Ok(Matrix::new(rows))
    }

    /// Matrix product via the dot-product-of-row-by-column rule.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.col_count() != other.row_count() {
            return Err(fault(
                DiagnosticKind::DimensionMismatch,
                format!(
                    "cannot multiply a {}x{} matrix by a {}x{} matrix",
                    self.row_count(),
                    self.col_count(),
                    other.row_count(),
                    other.col_count()
                ),
            ));
        }
        let left = self.rows.borrow();
        let right = other.rows.borrow();
        let mut rows = Vec::with_capacity(left.len());
        for a_row in left.iter() {
            let mut row = Vec::with_capacity(other.col_count());
            for col in 0..other.col_count() {
                let mut sum = Fraction::ZERO;
                for (k, cell) in a_row.iter().enumerate() {
                    sum = sum.add(&cell.multiply(&right[k][col])?)?;
                }
                row.push(sum);
            }
            rows.push(row);
        }
        Ok(Matrix::new(rows))
    }

    pub fn scale(&self, scalar: &Fraction) -> Result<Matrix> {
        let rows = self.rows.borrow();
        let mut scaled = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let mut out = Vec::with_capacity(row.len());
            for cell in row {
                out.push(cell.multiply(scalar)?);
            }
            scaled.push(out);
        }
        Ok(Matrix::new(scaled))
    }

    fn require_square(&self, op: &str) -> Result<()> {
        if !self.is_square() || self.row_count() == 0 {
            return Err(fault(
                DiagnosticKind::DimensionMismatch,
                format!(
                    "{op} requires a square matrix, found {}x{}",
                    self.row_count(),
                    self.col_count()
                ),
            ));
        }
        Ok(())
    }

    pub fn determinant(&self) -> Result<Fraction> {
        self.require_square("determinant")?;
        determinant_of(&self.rows.borrow())
    }

    /// Adjugate divided by the determinant.
    pub fn inverse(&self) -> Result<Matrix> {
        self.require_square("inverse")?;
        let det = self.determinant()?;
        if det.is_zero() {
            return Err(fault(
                DiagnosticKind::Singular,
                "matrix with zero determinant has no inverse",
            ));
        }
        let rows = self.rows.borrow();
        let size = rows.len();
        let mut cofactors = Vec::with_capacity(size);
        for i in 0..size {
            let mut row = Vec::with_capacity(size);
            for j in 0..size {
                let cofactor = determinant_of(&minor_of(&rows, i, j))?;
                let signed = if (i + j) % 2 == 0 {
                    cofactor
                } else {
                    cofactor.negate()
                };
                row.push(signed.divide(&det)?);
            }
            cofactors.push(row);
        }
        // Transposing the signed cofactor grid yields the adjugate.
        Ok(Matrix::new(cofactors).transpose())
    }

    /// Row-reduced echelon form via Gaussian elimination with row swaps
    /// on zero pivots, in exact fraction arithmetic.
    pub fn rref(&self) -> Result<Matrix> {
        let mut rows = self.snapshot();
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut pivot_row = 0;
        for col in 0..width {
            if pivot_row == height {
                break;
            }
            let Some(found) = (pivot_row..height).find(|&r| !rows[r][col].is_zero()) else {
                continue;
            };
            rows.swap(pivot_row, found);
            let pivot = rows[pivot_row][col];
            for cell in rows[pivot_row].iter_mut() {
                *cell = cell.divide(&pivot)?;
            }
            for r in 0..height {
                if r == pivot_row || rows[r][col].is_zero() {
                    continue;
                }
                let factor = rows[r][col];
                for c in 0..width {
                    let delta = rows[pivot_row][c].multiply(&factor)?;
                    rows[r][c] = rows[r][c].subtract(&delta)?;
                }
            }
            pivot_row += 1;
        }
        Ok(Matrix::new(rows))
    }

    /// Number of nonzero rows in the row-echelon form.
    pub fn rank(&self) -> Result<usize> {
        let reduced = self.rref()?;
        let rows = reduced.rows.borrow();
        Ok(rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.is_zero()))
            .count())
    }

    /// Solves `self · x = rhs` as `inverse(self) · rhs`.
    pub fn solve(&self, rhs: &Matrix) -> Result<Matrix> {
        self.inverse()?.multiply(rhs)
    }

    pub fn is_square(&self) -> bool {
        self.row_count() == self.col_count()
    }

    pub fn is_diagonal(&self) -> bool {
        self.is_square()
            && self.scan_cells(|i, j, cell| i == j || cell.is_zero())
    }

    pub fn is_identity(&self) -> bool {
        self.is_square()
            && self.scan_cells(|i, j, cell| {
                if i == j {
                    *cell == Fraction::ONE
                } else {
                    cell.is_zero()
                }
            })
    }

    pub fn is_lower_triangular(&self) -> bool {
        self.is_square() && self.scan_cells(|i, j, cell| j <= i || cell.is_zero())
    }

    pub fn is_upper_triangular(&self) -> bool {
        self.is_square() && self.scan_cells(|i, j, cell| j >= i || cell.is_zero())
    }

    pub fn is_symmetric(&self) -> bool {
        let rows = self.rows.borrow();
        self.is_square() && self.scan_cells(|i, j, cell| *cell == rows[j][i])
    }

    pub fn is_skew_symmetric(&self) -> bool {
        let rows = self.rows.borrow();
        self.is_square() && self.scan_cells(|i, j, cell| *cell == rows[j][i].negate())
    }

    /// Determinant in {1, -1} and pairwise-orthogonal distinct columns.
    pub fn is_orthogonal(&self) -> Result<bool> {
        if !self.is_square() || self.row_count() == 0 {
            return Ok(false);
        }
        let det = self.determinant()?;
        if det != Fraction::ONE && det != Fraction::integer(-1) {
            return Ok(false);
        }
        let rows = self.rows.borrow();
        let size = rows.len();
        for a in 0..size {
            for b in (a + 1)..size {
                let mut dot = Fraction::ZERO;
                for row in rows.iter() {
                    dot = dot.add(&row[a].multiply(&row[b])?)?;
                }
                if !dot.is_zero() {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn scan_cells(&self, predicate: impl Fn(usize, usize, &Fraction) -> bool) -> bool {
        let rows = self.rows.borrow();
        rows.iter().enumerate().all(|(i, row)| {
            row.iter()
                .enumerate()
                .all(|(j, cell)| predicate(i, j, cell))
        })
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        *self.rows.borrow() == *other.rows.borrow()
    }
}

fn minor_of(rows: &[Vec<Fraction>], skip_row: usize, skip_col: usize) -> Vec<Vec<Fraction>> {
    rows.iter()
        .enumerate()
        .filter(|(i, _)| *i != skip_row)
        .map(|(_, row)| {
            row.iter()
                .enumerate()
                .filter(|(j, _)| *j != skip_col)
                .map(|(_, cell)| *cell)
                .collect()
        })
        .collect()
}

/// Laplace cofactor expansion along the first row, 2x2 closed form at the
/// base.
fn determinant_of(rows: &[Vec<Fraction>]) -> Result<Fraction> {
    match rows.len() {
        0 => Ok(Fraction::ONE),
        1 => Ok(rows[0][0]),
        2 => rows[0][0]
            .multiply(&rows[1][1])?
            .subtract(&rows[0][1].multiply(&rows[1][0])?),
        size => {
            let mut total = Fraction::ZERO;
            for col in 0..size {
                if rows[0][col].is_zero() {
                    continue;
                }
                let cofactor = determinant_of(&minor_of(rows, 0, col))?;
                let term = rows[0][col].multiply(&cofactor)?;
                total = if col % 2 == 0 {
                    total.add(&term)?
                } else {
                    total.subtract(&term)?
                };
            }
            Ok(total)
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows.borrow();
        write!(f, "[")?;
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (j, cell) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{cell}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
