//! Well-local block linear system.
//!
//! Blocks are `NUM_WELL_EQ x NUM_WELL_EQ`, addressed by (row segment, column
//! segment). Assembly helpers implement the derivative-attribution rule for
//! upwinded terms: the WQTotal derivative belongs to the evaluating segment,
//! fraction derivatives to the upwind segment, and the SPres derivative to
//! whichever segment's pressure entered the term.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use rf_core::{Ad, Real};

use crate::primary::{G_FRAC, NUM_WELL_EQ, SPRES, WQ_TOTAL, W_FRAC};

#[derive(Debug)]
pub struct WellLinSys {
    residual: Vec<DVector<Real>>,
    blocks: HashMap<(usize, usize), DMatrix<Real>>,
}

impl WellLinSys {
    pub fn new(num_segments: usize) -> Self {
        Self {
            residual: vec![DVector::zeros(NUM_WELL_EQ); num_segments],
            blocks: HashMap::new(),
        }
    }

    pub fn num_segments(&self) -> usize {
        self.residual.len()
    }

    pub fn residual(&self, seg: usize, eq: usize) -> Real {
        self.residual[seg][eq]
    }

    pub fn block(&self, row: usize, col: usize) -> Option<&DMatrix<Real>> {
        self.blocks.get(&(row, col))
    }

    pub fn jacobian_entry(&self, row: usize, col: usize, eq: usize, var: usize) -> Real {
        self.blocks
            .get(&(row, col))
            .map(|b| b[(eq, var)])
            .unwrap_or(0.0)
    }

    pub fn clear(&mut self) {
        for row in &mut self.residual {
            row.fill(0.0);
        }
        self.blocks.clear();
    }

    fn block_mut(&mut self, row: usize, col: usize) -> &mut DMatrix<Real> {
        self.blocks
            .entry((row, col))
            .or_insert_with(|| DMatrix::zeros(NUM_WELL_EQ, NUM_WELL_EQ))
    }

    /// Add an AD term to equation `eq` of segment `row`, splitting derivative
    /// columns: WQTotal to `col_rate`, fractions to `col_frac`, SPres to
    /// `col_pressure`.
    pub fn add_term(
        &mut self,
        row: usize,
        eq: usize,
        term: &Ad,
        col_rate: usize,
        col_frac: usize,
        col_pressure: usize,
    ) {
        self.residual[row][eq] += term.value();
        self.block_mut(row, col_rate)[(eq, WQ_TOTAL)] += term.derivative(WQ_TOTAL);
        let frac_block = self.block_mut(row, col_frac);
        frac_block[(eq, W_FRAC)] += term.derivative(W_FRAC);
        frac_block[(eq, G_FRAC)] += term.derivative(G_FRAC);
        self.block_mut(row, col_pressure)[(eq, SPRES)] += term.derivative(SPRES);
    }

    /// Pressure equation of `seg`: the drop-adjusted segment pressure minus
    /// the outlet pressure.
    pub fn assemble_pressure_eq(
        &mut self,
        seg: usize,
        seg_upwind: usize,
        outlet: usize,
        pressure_equation: &Ad,
        outlet_pressure: &Ad,
    ) {
        self.add_term(seg, SPRES, pressure_equation, seg, seg_upwind, seg);
        self.add_term(seg, SPRES, &(-outlet_pressure.clone()), outlet, outlet, outlet);
    }

    /// Subtract a separately assembled pressure loss (acceleration term).
    pub fn assemble_pressure_loss(&mut self, seg: usize, seg_upwind: usize, loss: &Ad) {
        self.add_term(seg, SPRES, &(-loss.clone()), seg, seg_upwind, seg);
    }

    /// `WQTotal(seg) = 0`, used for SHUT valves.
    pub fn assemble_trivial_eq(&mut self, seg: usize, q_total: &Ad) {
        self.add_term(seg, SPRES, q_total, seg, seg, seg);
    }

    /// Control equation occupies the pressure row of the top segment.
    pub fn assemble_control_eq(&mut self, control_eq: &Ad) {
        self.add_term(0, SPRES, control_eq, 0, 0, 0);
    }

    /// Component-rate contribution to a mass-balance row.
    pub fn assemble_rate_term(
        &mut self,
        row: usize,
        component: usize,
        term: &Ad,
        rate_seg: usize,
        upwind_seg: usize,
    ) {
        self.add_term(row, component, term, rate_seg, upwind_seg, rate_seg);
    }
}
