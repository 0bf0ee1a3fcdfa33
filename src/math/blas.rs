//! Strided vector and row-major matrix kernels.
//!
//! Every kernel treats an invalid call as a silent no-op: a zero count, a zero
//! stride, a leading dimension too small for the logical shape, or a slice too
//! short for the requested walk leaves the output untouched. Callers rely on
//! "invalid call, no mutation" rather than on an error value.
//!
//! A negative stride walks the vector backward, starting from its logical end
//! at `(n - 1) * |inc|`.

use log::trace;
use serde::{Serialize, Deserialize};

/// Whether a matrix operand is used as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transpose {
    NoTrans,
    Trans,
}

/// Index of the first element visited by a strided walk of `n` elements.
fn first_index(n: usize, inc: isize) -> usize {
    if inc > 0 { 0 } else { (n - 1) * inc.unsigned_abs() }
}

/// True if a walk of `n` elements with stride `inc` stays inside `len`.
fn walk_fits(len: usize, n: usize, inc: isize) -> bool {
    if n < 1 || inc == 0 {
        return false;
    }
    match (n - 1).checked_mul(inc.unsigned_abs()) {
        Some(last) => last < len && last <= isize::MAX as usize,
        None => false,
    }
}

fn strided(n: usize, inc: isize) -> impl Iterator<Item = usize> {
    let start = first_index(n, inc) as isize;
    (0..n).map(move |i| (start + i as isize * inc) as usize)
}

/// True if a row-major `rows x cols` matrix with leading dimension `ld`
/// is consistent and fits inside `len` elements.
fn matrix_fits(len: usize, rows: usize, cols: usize, ld: usize) -> bool {
    if rows < 1 || cols < 1 || ld < cols {
        return false;
    }
    (rows - 1)
        .checked_mul(ld)
        .and_then(|end| end.checked_add(cols))
        .map_or(false, |end| end <= len)
}

/// y := x
pub fn copy(n: usize, x: &[f64], incx: isize, y: &mut [f64], incy: isize) {
    if !walk_fits(x.len(), n, incx) || !walk_fits(y.len(), n, incy) {
        trace!("copy: rejected n={n} incx={incx} incy={incy}");
        return;
    }
    for (xi, yi) in strided(n, incx).zip(strided(n, incy)) {
        y[yi] = x[xi];
    }
}

/// Inner product of two strided vectors; 0 for an invalid call.
pub fn dot(n: usize, x: &[f64], incx: isize, y: &[f64], incy: isize) -> f64 {
    if !walk_fits(x.len(), n, incx) || !walk_fits(y.len(), n, incy) {
        trace!("dot: rejected n={n} incx={incx} incy={incy}");
        return 0.0;
    }
    if incx == 1 && incy == 1 {
        let mut sum = 0.0;
        for i in 0..n {
            sum += x[i] * y[i];
        }
        return sum;
    }
    strided(n, incx).zip(strided(n, incy))
        .map(|(xi, yi)| x[xi] * y[yi])
        .sum()
}

/// Euclidean norm of a strided vector; 0 for an invalid call.
pub fn nrm2(n: usize, x: &[f64], incx: isize) -> f64 {
    if !walk_fits(x.len(), n, incx) {
        trace!("nrm2: rejected n={n} incx={incx}");
        return 0.0;
    }
    strided(n, incx)
        .map(|i| x[i] * x[i])
        .sum::<f64>()
        .sqrt()
}

/// y := alpha * x + y
pub fn axpy(n: usize, alpha: f64, x: &[f64], incx: isize, y: &mut [f64], incy: isize) {
    if !walk_fits(x.len(), n, incx) || !walk_fits(y.len(), n, incy) {
        trace!("axpy: rejected n={n} incx={incx} incy={incy}");
        return;
    }
    if incx == 1 && incy == 1 {
        for i in 0..n {
            y[i] += alpha * x[i];
        }
        return;
    }
    for (xi, yi) in strided(n, incx).zip(strided(n, incy)) {
        y[yi] += alpha * x[xi];
    }
}

/// y := alpha * op(A) * x + beta * y
///
/// `op(A)` is `m x n`: `y` holds `m` elements and `x` holds `n`. With
/// `NoTrans`, A is stored `m x n` (`lda >= n`); with `Trans`, A is stored
/// `n x m` (`lda >= m`). `beta == 0` overwrites `y`.
#[allow(clippy::too_many_arguments)]
pub fn gemv(
    trans: Transpose,
    m: usize, n: usize,
    alpha: f64, a: &[f64], lda: usize,
    x: &[f64], incx: isize,
    beta: f64, y: &mut [f64], incy: isize,
) {
    let (rows, cols) = match trans {
        Transpose::NoTrans => (m, n),
        Transpose::Trans => (n, m),
    };
    if !matrix_fits(a.len(), rows, cols, lda)
        || !walk_fits(x.len(), n, incx)
        || !walk_fits(y.len(), m, incy)
    {
        trace!("gemv: rejected {trans:?} m={m} n={n} lda={lda}");
        return;
    }

    for (i, yi) in strided(m, incy).enumerate() {
        let mut sum = 0.0;
        for (j, xj) in strided(n, incx).enumerate() {
            let aij = match trans {
                Transpose::NoTrans => a[i * lda + j],
                Transpose::Trans => a[j * lda + i],
            };
            sum += aij * x[xj];
        }
        y[yi] = if beta == 0.0 { alpha * sum } else { beta * y[yi] + alpha * sum };
    }
}

/// C := alpha * op(A) * op(B) + beta * C
///
/// `op(A)` is `m x k`, `op(B)` is `k x n` and C is `m x n`, all row-major.
/// A is stored `m x k` (`lda >= k`) or, transposed, `k x m` (`lda >= m`);
/// B is stored `k x n` (`ldb >= n`) or `n x k` (`ldb >= k`); `ldc >= n`.
/// `beta == 0` overwrites C.
#[allow(clippy::too_many_arguments)]
pub fn gemm(
    transa: Transpose, transb: Transpose,
    m: usize, n: usize, k: usize,
    alpha: f64, a: &[f64], lda: usize,
    b: &[f64], ldb: usize,
    beta: f64, c: &mut [f64], ldc: usize,
) {
    let (a_rows, a_cols) = match transa {
        Transpose::NoTrans => (m, k),
        Transpose::Trans => (k, m),
    };
    let (b_rows, b_cols) = match transb {
        Transpose::NoTrans => (k, n),
        Transpose::Trans => (n, k),
    };
    if !matrix_fits(a.len(), a_rows, a_cols, lda)
        || !matrix_fits(b.len(), b_rows, b_cols, ldb)
        || !matrix_fits(c.len(), m, n, ldc)
    {
        trace!("gemm: rejected {transa:?}/{transb:?} m={m} n={n} k={k} lda={lda} ldb={ldb} ldc={ldc}");
        return;
    }

    let a_at = |i: usize, p: usize| match transa {
        Transpose::NoTrans => a[i * lda + p],
        Transpose::Trans => a[p * lda + i],
    };
    let b_at = |p: usize, j: usize| match transb {
        Transpose::NoTrans => b[p * ldb + j],
        Transpose::Trans => b[j * ldb + p],
    };

    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0;
            for p in 0..k {
                sum += a_at(i, p) * b_at(p, j);
            }
            let cij = &mut c[i * ldc + j];
            *cij = if beta == 0.0 { alpha * sum } else { beta * *cij + alpha * sum };
        }
    }
}
