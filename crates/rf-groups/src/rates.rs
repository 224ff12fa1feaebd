//! Phase-rate aggregation across the tree.

use std::ops::AddAssign;

use rf_core::Real;
use rf_fluids::Phase;
use rf_schedule::{InjectionControlMode, ProductionControlMode};

use crate::error::{GroupError, GroupResult};

/// Whether a rate is measured at surface or reservoir conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateBasis {
    Surface,
    Reservoir,
}

/// Per-node phase sums gathered by the constraint pass. Canonical
/// water/oil/gas slots; production entries are negative.
#[derive(Clone, Copy, Debug, Default)]
pub struct WellPhasesSummed {
    pub res_inj_rates: [Real; 3],
    pub res_prod_rates: [Real; 3],
    pub surf_inj_rates: [Real; 3],
    pub surf_prod_rates: [Real; 3],
}

impl AddAssign for WellPhasesSummed {
    fn add_assign(&mut self, other: Self) {
        for i in 0..3 {
            self.res_inj_rates[i] += other.res_inj_rates[i];
            self.res_prod_rates[i] += other.res_prod_rates[i];
            self.surf_inj_rates[i] += other.surf_inj_rates[i];
            self.surf_prod_rates[i] += other.surf_prod_rates[i];
        }
    }
}

/// The aggregated rate a production control mode contracts against.
pub fn production_rate_by_mode(
    res_rates: &[Real; 3],
    surf_rates: &[Real; 3],
    mode: ProductionControlMode,
) -> GroupResult<Real> {
    use ProductionControlMode as M;
    Ok(match mode {
        M::Orat => surf_rates[Phase::Oil.slot()],
        M::Wrat => surf_rates[Phase::Water.slot()],
        M::Grat => surf_rates[Phase::Gas.slot()],
        M::Lrat => surf_rates[Phase::Oil.slot()] + surf_rates[Phase::Water.slot()],
        M::Resv => res_rates.iter().sum(),
        other => {
            return Err(GroupError::UnhandledMode {
                layer: "production rate aggregation",
                mode: format!("{other:?}"),
            })
        }
    })
}

/// The aggregated rate an injection control mode contracts against.
pub fn injection_rate_by_mode(
    res_rates: &[Real; 3],
    surf_rates: &[Real; 3],
    mode: InjectionControlMode,
) -> GroupResult<Real> {
    use InjectionControlMode as M;
    let rates = match mode {
        M::Rate => surf_rates,
        M::Resv => res_rates,
        other => {
            return Err(GroupError::UnhandledMode {
                layer: "injection rate aggregation",
                mode: format!("{other:?}"),
            })
        }
    };
    Ok(rates.iter().sum())
}
