//! Production and injection specifications carried by every tree node.
//!
//! Targets are `Option<Real>`; `None` means unset and is never encoded as a
//! sentinel. `target(mode)` answers "what is the limit for mode M" for the
//! modes that have one; querying a mode without target semantics is a
//! programmer error reported as `UnhandledMode`.

use rf_core::Real;
use rf_schedule::{
    InjectionControlMode, InjectorType, ProductionControlMode, ProductionProcedure,
};

use crate::error::{GroupError, GroupResult};

#[derive(Clone, Debug)]
pub struct ProductionSpec {
    pub control_mode: ProductionControlMode,
    pub procedure: ProductionProcedure,
    pub oil_max_rate: Option<Real>,
    pub water_max_rate: Option<Real>,
    pub gas_max_rate: Option<Real>,
    pub liquid_max_rate: Option<Real>,
    pub reservoir_max_rate: Option<Real>,
    pub bhp_limit: Option<Real>,
    pub thp_limit: Option<Real>,
    pub guide_rate: Real,
}

impl Default for ProductionSpec {
    fn default() -> Self {
        Self {
            control_mode: ProductionControlMode::None,
            procedure: ProductionProcedure::NoneP,
            oil_max_rate: None,
            water_max_rate: None,
            gas_max_rate: None,
            liquid_max_rate: None,
            reservoir_max_rate: None,
            bhp_limit: None,
            thp_limit: None,
            guide_rate: 0.0,
        }
    }
}

impl ProductionSpec {
    /// Limit for a rate mode, `None` when unset.
    pub fn target(&self, mode: ProductionControlMode) -> GroupResult<Option<Real>> {
        use ProductionControlMode as M;
        Ok(match mode {
            M::Orat => self.oil_max_rate,
            M::Wrat => self.water_max_rate,
            M::Grat => self.gas_max_rate,
            M::Lrat => self.liquid_max_rate,
            M::Resv => self.reservoir_max_rate,
            other => {
                return Err(GroupError::UnhandledMode {
                    layer: "production target",
                    mode: format!("{other:?}"),
                })
            }
        })
    }
}

#[derive(Clone, Debug)]
pub struct InjectionSpec {
    pub control_mode: InjectionControlMode,
    pub injector_type: InjectorType,
    pub surface_max_rate: Option<Real>,
    pub reservoir_max_rate: Option<Real>,
    pub bhp_limit: Option<Real>,
    pub thp_limit: Option<Real>,
    pub reinjection_fraction: Option<Real>,
    pub voidage_fraction: Option<Real>,
    pub guide_rate: Real,
}

impl Default for InjectionSpec {
    fn default() -> Self {
        Self {
            control_mode: InjectionControlMode::None,
            injector_type: InjectorType::Water,
            surface_max_rate: None,
            reservoir_max_rate: None,
            bhp_limit: None,
            thp_limit: None,
            reinjection_fraction: None,
            voidage_fraction: None,
            guide_rate: 0.0,
        }
    }
}

impl InjectionSpec {
    pub fn target(&self, mode: InjectionControlMode) -> GroupResult<Option<Real>> {
        use InjectionControlMode as M;
        Ok(match mode {
            M::Rate => self.surface_max_rate,
            M::Resv => self.reservoir_max_rate,
            other => {
                return Err(GroupError::UnhandledMode {
                    layer: "injection target",
                    mode: format!("{other:?}"),
                })
            }
        })
    }
}
