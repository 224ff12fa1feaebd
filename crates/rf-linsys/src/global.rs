//! Global block system addressed by cell pairs.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use rf_core::{CellId, Real};

/// Block-sparse Jacobian: `J[row_cell][col_cell][eq, pv]`.
///
/// Blocks materialize on first touch; all updates are additive. Writers own
/// disjoint row footprints, so no synchronization is needed.
#[derive(Debug)]
pub struct BlockJacobian {
    num_eq: usize,
    num_pv: usize,
    blocks: HashMap<(CellId, CellId), DMatrix<Real>>,
}

impl BlockJacobian {
    pub fn new(num_eq: usize, num_pv: usize) -> Self {
        Self {
            num_eq,
            num_pv,
            blocks: HashMap::new(),
        }
    }

    pub fn num_equations(&self) -> usize {
        self.num_eq
    }

    pub fn num_primary_variables(&self) -> usize {
        self.num_pv
    }

    /// Add `value` to `J[row][col][eq, pv]`.
    pub fn add(&mut self, row: CellId, col: CellId, eq: usize, pv: usize, value: Real) {
        let block = self
            .blocks
            .entry((row, col))
            .or_insert_with(|| DMatrix::zeros(self.num_eq, self.num_pv));
        block[(eq, pv)] += value;
    }

    /// Read `J[row][col][eq, pv]`; zero for untouched blocks.
    pub fn get(&self, row: CellId, col: CellId, eq: usize, pv: usize) -> Real {
        self.blocks
            .get(&(row, col))
            .map(|b| b[(eq, pv)])
            .unwrap_or(0.0)
    }

    pub fn block(&self, row: CellId, col: CellId) -> Option<&DMatrix<Real>> {
        self.blocks.get(&(row, col))
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

/// Residual addressed as `R[cell][eq]`, additive updates only.
#[derive(Debug)]
pub struct ResidualVector {
    num_eq: usize,
    rows: HashMap<CellId, DVector<Real>>,
}

impl ResidualVector {
    pub fn new(num_eq: usize) -> Self {
        Self {
            num_eq,
            rows: HashMap::new(),
        }
    }

    pub fn num_equations(&self) -> usize {
        self.num_eq
    }

    pub fn add(&mut self, cell: CellId, eq: usize, value: Real) {
        let row = self
            .rows
            .entry(cell)
            .or_insert_with(|| DVector::zeros(self.num_eq));
        row[eq] += value;
    }

    pub fn get(&self, cell: CellId, eq: usize) -> Real {
        self.rows.get(&cell).map(|r| r[eq]).unwrap_or(0.0)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
