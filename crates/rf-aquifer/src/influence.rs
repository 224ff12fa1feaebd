//! Tabulated influence function and its least-squares fit.
//!
//! The table stores (tD, pD) samples of the dimensionless pressure response.
//! The operative evaluator is a polynomial fit through the samples; the
//! default (and currently only consumed) order is the straight line
//! `pD(tD) = c0 + c1*tD`.

use nalgebra::{DMatrix, DVector};
use rf_core::Real;

use crate::error::{AquiferError, AquiferResult};

/// Ordered (tD, pD) sample pairs.
#[derive(Clone, Debug)]
pub struct InfluenceTable {
    td: Vec<Real>,
    pd: Vec<Real>,
}

impl InfluenceTable {
    /// Validates sample count and strict monotonicity in tD.
    pub fn new(td: Vec<Real>, pd: Vec<Real>) -> AquiferResult<Self> {
        if td.len() < 2 || td.len() != pd.len() {
            return Err(AquiferError::InsufficientSamples {
                got: td.len().min(pd.len()),
                need: 2,
            });
        }
        if td.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AquiferError::NonMonotonicTable);
        }
        Ok(Self { td, pd })
    }

    pub fn len(&self) -> usize {
        self.td.len()
    }

    pub fn is_empty(&self) -> bool {
        self.td.is_empty()
    }

    pub fn td(&self) -> &[Real] {
        &self.td
    }

    pub fn pd(&self) -> &[Real] {
        &self.pd
    }

    /// Linear fit through the samples; the authoritative evaluator used by
    /// the Carter-Tracy engine.
    pub fn linear_fit(&self) -> AquiferResult<LinearFit> {
        let coeff = polynomial_fit(&self.td, &self.pd, 1, true)?;
        Ok(LinearFit {
            c0: coeff[0],
            c1: coeff[1],
        })
    }
}

/// `pD(tD) = c0 + c1*tD`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub c0: Real,
    pub c1: Real,
}

impl LinearFit {
    pub fn pd_at(&self, td: Real) -> Real {
        self.c0 + self.c1 * td
    }

    /// d(pD)/d(tD), constant for the linear fit.
    pub fn slope(&self) -> Real {
        self.c1
    }
}

/// Least-squares polynomial fit through (x, y) samples via QR.
///
/// With `bias` the columns are `x^0 .. x^order`, otherwise `x^1 .. x^order`.
/// Returns the coefficients in column order.
pub fn polynomial_fit(x: &[Real], y: &[Real], order: usize, bias: bool) -> AquiferResult<Vec<Real>> {
    let cols = if bias { order + 1 } else { order };
    if x.len() != y.len() || x.len() < cols {
        return Err(AquiferError::InsufficientSamples {
            got: x.len().min(y.len()),
            need: cols,
        });
    }

    let mut a = DMatrix::zeros(x.len(), cols);
    for (i, xi) in x.iter().enumerate() {
        for j in 0..cols {
            let p = if bias { j } else { j + 1 };
            a[(i, j)] = xi.powi(p as i32);
        }
    }
    let rhs = DVector::from_column_slice(y);

    let qr = a.qr();
    let r = qr.r();
    let qtb = qr.q().transpose() * rhs;
    let solution = r
        .solve_upper_triangular(&qtb)
        .ok_or(AquiferError::SingularFit {
            what: "upper-triangular solve failed (degenerate sample abscissae)",
        })?;

    Ok(solution.iter().copied().collect())
}
