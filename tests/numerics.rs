use abacus::{
    complex::Complex,
    diagnostics::DiagnosticKind,
    fraction::Fraction,
    matrix::Matrix,
};

fn frac(num: i64, den: i64) -> Fraction {
    Fraction::new(num, den).expect("valid fraction")
}

fn grid(rows: &[&[i64]]) -> Matrix {
    Matrix::new(
        rows.iter()
            .map(|row| row.iter().map(|n| Fraction::integer(*n)).collect())
            .collect(),
    )
}

#[test]
fn fraction_simplifies_on_construction() {
    assert_eq!(frac(2, 4), frac(1, 2));
    assert_eq!(frac(2, 4).numerator(), 1);
    assert_eq!(frac(2, 4).denominator(), 2);
    // Sign lives on the numerator.
    assert_eq!(frac(1, -2).numerator(), -1);
    assert_eq!(frac(1, -2).denominator(), 2);
}

#[test]
fn fraction_rejects_zero_denominator() {
    let err = Fraction::new(1, 0).unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::DivisionByZero));
}

#[test]
fn literal_parsing_builds_exact_values() {
    assert_eq!(Fraction::from_literal("3.25").unwrap(), frac(13, 4));
    assert_eq!(Fraction::from_literal("10").unwrap(), Fraction::integer(10));
    assert_eq!(Fraction::from_literal("0.1").unwrap(), frac(1, 10));
}

#[test]
fn fraction_arithmetic_is_exact() {
    assert_eq!(frac(1, 3).add(&frac(1, 6)).unwrap(), frac(1, 2));
    assert_eq!(frac(1, 2).subtract(&frac(1, 3)).unwrap(), frac(1, 6));
    assert_eq!(frac(2, 3).multiply(&frac(3, 4)).unwrap(), frac(1, 2));
    assert_eq!(frac(1, 2).divide(&frac(1, 4)).unwrap(), Fraction::integer(2));
    assert_eq!(frac(7, 2).modulo(&Fraction::integer(2)).unwrap(), frac(3, 2));
}

#[test]
fn large_operands_fault_instead_of_panicking() {
    let big = Fraction::integer(10_000_000_000);
    let err = big.multiply(&big).unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::Runtime));
    let err = Fraction::integer(i64::MAX)
        .add(&Fraction::integer(i64::MAX))
        .unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::Runtime));
}

#[test]
fn near_limit_operands_still_reduce_exactly() {
    // Denominator product stays just under i64::MAX.
    let sum = frac(1, 3_000_000_000)
        .add(&frac(1, 3_000_000_001))
        .unwrap();
    assert_eq!(sum.numerator(), 6_000_000_001);
    assert_eq!(sum.denominator(), 9_000_000_003_000_000_000);
}

#[test]
fn unrepresentable_pow_result_is_a_runtime_fault() {
    let err = Fraction::integer(10)
        .pow(&Fraction::integer(100))
        .unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::Runtime));
}

#[test]
fn fraction_ordering_cross_multiplies() {
    assert!(frac(1, 3) < frac(1, 2));
    assert!(frac(-1, 2) < Fraction::ZERO);
}

#[test]
fn factorial_requires_non_negative_integer() {
    assert_eq!(
        Fraction::integer(5).factorial().unwrap(),
        Fraction::integer(120)
    );
    let err = frac(1, 2).factorial().unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::TypeMismatch));
    let err = Fraction::integer(-1).factorial().unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::TypeMismatch));
}

#[test]
fn complex_multiplication_expands_products() {
    // (1 + 2i)(3 + 4i) = -5 + 10i
    let product = Complex::new(Fraction::integer(1), Fraction::integer(2))
        .multiply(&Complex::new(Fraction::integer(3), Fraction::integer(4)))
        .unwrap();
    assert_eq!(product.re, Fraction::integer(-5));
    assert_eq!(product.im, Fraction::integer(10));
}

#[test]
fn complex_division_uses_the_conjugate() {
    // (1 + 2i)/(3 + 4i) = 11/25 + (2/25)i
    let quotient = Complex::new(Fraction::integer(1), Fraction::integer(2))
        .divide(&Complex::new(Fraction::integer(3), Fraction::integer(4)))
        .unwrap();
    assert_eq!(quotient.re, frac(11, 25));
    assert_eq!(quotient.im, frac(2, 25));
}

#[test]
fn complex_conjugate_flips_imaginary_sign() {
    let z = Complex::new(frac(1, 2), frac(-3, 4));
    let conj = z.conjugate();
    assert_eq!(conj.re, frac(1, 2));
    assert_eq!(conj.im, frac(3, 4));
}

#[test]
fn imaginary_square_is_negative() {
    let squared = Complex::I.multiply(&Complex::I).unwrap();
    assert_eq!(squared.re, Fraction::integer(-1));
    assert!(squared.im.is_zero());
}

#[test]
fn complex_pow_goes_through_polar_form() {
    // (2i)^2 = -4
    let squared = Complex::new(Fraction::ZERO, Fraction::integer(2))
        .pow(&Fraction::integer(2))
        .unwrap();
    assert_eq!(squared.re, Fraction::integer(-4));
    assert!(squared.im.is_zero());
}

#[test]
fn ragged_rows_are_zero_padded() {
    let matrix = Matrix::new(vec![
        vec![Fraction::integer(1)],
        vec![Fraction::integer(2), Fraction::integer(3)],
    ]);
    assert_eq!(matrix.col_count(), 2);
    assert!(matrix.get(0, 1).unwrap().is_zero());
}

#[test]
fn determinant_by_cofactor_expansion() {
    assert_eq!(
        grid(&[&[1, 2], &[3, 4]]).determinant().unwrap(),
        Fraction::integer(-2)
    );
    assert_eq!(
        grid(&[&[1, 2, 3], &[4, 5, 6], &[7, 8, 10]])
            .determinant()
            .unwrap(),
        Fraction::integer(-3)
    );
}

#[test]
fn inverse_times_original_is_identity() {
    let matrix = grid(&[&[4, 7], &[2, 6]]);
    let product = matrix.inverse().unwrap().multiply(&matrix).unwrap();
    assert!(product.is_identity());
}

#[test]
fn singular_matrix_has_no_inverse() {
    let err = grid(&[&[1, 2], &[2, 4]]).inverse().unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::Singular));
}

#[test]
fn rref_and_rank_agree_on_deficient_matrices() {
    let matrix = grid(&[&[1, 2], &[2, 4]]);
    assert_eq!(matrix.rref().unwrap(), grid(&[&[1, 2], &[0, 0]]));
    assert_eq!(matrix.rank().unwrap(), 1);
    assert_eq!(grid(&[&[1, 0], &[0, 1]]).rank().unwrap(), 2);
}

#[test]
fn solve_recovers_the_unknown_column() {
    let coefficients = grid(&[&[2, 0], &[0, 3]]);
    let rhs = grid(&[&[4], &[9]]);
    assert_eq!(coefficients.solve(&rhs).unwrap(), grid(&[&[2], &[3]]));
}

#[test]
fn shape_mismatch_is_a_dimension_error() {
    let err = grid(&[&[1, 2]]).add(&grid(&[&[1], &[2]])).unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::DimensionMismatch));
    let err = grid(&[&[1, 2]]).multiply(&grid(&[&[1, 2]])).unwrap_err();
    assert_eq!(err.kind(), Some(DiagnosticKind::DimensionMismatch));
}

#[test]
fn structural_predicates() {
    let identity = Matrix::identity(3);
    assert!(identity.is_square());
    assert!(identity.is_diagonal());
    assert!(identity.is_identity());
    assert!(identity.is_orthogonal().unwrap());

    let symmetric = grid(&[&[1, 7], &[7, 3]]);
    assert!(symmetric.is_symmetric());
    assert!(!symmetric.is_skew_symmetric());

    let lower = grid(&[&[1, 0], &[5, 2]]);
    assert!(lower.is_lower_triangular());
    assert!(!lower.is_upper_triangular());
}

#[test]
fn transpose_swaps_axes() {
    assert_eq!(
        grid(&[&[1, 2, 3], &[4, 5, 6]]).transpose(),
        grid(&[&[1, 4], &[2, 5], &[3, 6]])
    );
}

#[test]
fn matrix_clones_share_storage() {
    let matrix = grid(&[&[1, 2], &[3, 4]]);
    let alias = matrix.clone();
    matrix.set(0, 0, Fraction::integer(9)).unwrap();
    assert_eq!(alias.get(0, 0).unwrap(), Fraction::integer(9));
}
