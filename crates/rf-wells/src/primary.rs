//! Per-segment primary variables of a multi-segment well.
//!
//! Four unknowns per segment: total surface volume rate (WQTotal), water and
//! gas volume fractions, and segment pressure (SPres). The AD view of a
//! segment carries one derivative slot per unknown, in that order.

use rf_core::{Ad, Real};
use rf_fluids::PhaseMap;

use crate::error::{WellError, WellResult};

/// Variable index of the total rate.
pub const WQ_TOTAL: usize = 0;
/// Variable index of the water volume fraction.
pub const W_FRAC: usize = 1;
/// Variable index of the gas volume fraction.
pub const G_FRAC: usize = 2;
/// Variable index of the segment pressure.
pub const SPRES: usize = 3;
/// Well equations (and primary variables) per segment.
pub const NUM_WELL_EQ: usize = 4;

/// AD view of one segment's unknowns.
#[derive(Clone, Debug)]
pub struct SegmentEval {
    pub q_total: Ad,
    pub water_frac: Ad,
    pub gas_frac: Ad,
    pub pressure: Ad,
}

impl SegmentEval {
    /// Oil fraction closes the volume balance.
    pub fn oil_frac(&self) -> Ad {
        1.0 - (self.water_frac.clone() + &self.gas_frac)
    }
}

/// Primary-variable storage for all segments of one well.
#[derive(Clone, Debug)]
pub struct PrimaryVariables {
    values: Vec<[Real; NUM_WELL_EQ]>,
}

impl PrimaryVariables {
    /// The segment formulation needs the full three-phase system.
    pub fn new(phase_map: PhaseMap, num_segments: usize) -> WellResult<Self> {
        if phase_map.num_phases() != 3 {
            return Err(WellError::UnsupportedPhaseConfig);
        }
        Ok(Self {
            values: vec![[0.0; NUM_WELL_EQ]; num_segments],
        })
    }

    pub fn num_segments(&self) -> usize {
        self.values.len()
    }

    pub fn set_segment(&mut self, seg: usize, q_total: Real, water_frac: Real, gas_frac: Real, pressure: Real) {
        self.values[seg] = [q_total, water_frac, gas_frac, pressure];
    }

    pub fn value(&self, seg: usize, var: usize) -> Real {
        self.values[seg][var]
    }

    pub fn pressure(&self, seg: usize) -> Real {
        self.values[seg][SPRES]
    }

    pub fn total_rate(&self, seg: usize) -> Real {
        self.values[seg][WQ_TOTAL]
    }

    /// AD view of a segment: each unknown is a variable in its own slot.
    pub fn eval(&self, seg: usize) -> SegmentEval {
        let v = &self.values[seg];
        SegmentEval {
            q_total: Ad::variable(v[WQ_TOTAL], WQ_TOTAL, NUM_WELL_EQ),
            water_frac: Ad::variable(v[W_FRAC], W_FRAC, NUM_WELL_EQ),
            gas_frac: Ad::variable(v[G_FRAC], G_FRAC, NUM_WELL_EQ),
            pressure: Ad::variable(v[SPRES], SPRES, NUM_WELL_EQ),
        }
    }

    /// Segment pressure as an AD quantity.
    pub fn segment_pressure(&self, seg: usize) -> Ad {
        Ad::variable(self.values[seg][SPRES], SPRES, NUM_WELL_EQ)
    }
}
