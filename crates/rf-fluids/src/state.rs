//! Fluid-state facade traits.
//!
//! All AD-carrying quantities are expressed in the *reservoir* primary
//! variable domain (one derivative slot per primary variable of the cell).

use rf_core::{Ad, CellId, Real};

use crate::error::FluidResult;
use crate::phase::Phase;

/// Per-cell fluid state as seen by the aquifer and well assembly.
pub trait CellStateProvider {
    /// Number of primary variables per cell (AD derivative count).
    fn num_primary_variables(&self) -> usize;

    /// Water-phase pressure at the cell, AD in the cell's primary variables.
    fn water_pressure(&self, cell: CellId) -> FluidResult<Ad>;

    /// Water-phase density at the cell.
    fn water_density(&self, cell: CellId) -> FluidResult<Ad>;

    /// Water-phase viscosity at the cell.
    fn water_viscosity(&self, cell: CellId) -> FluidResult<Ad>;

    /// Cell temperature (not a primary variable in this fluid system).
    fn temperature(&self, cell: CellId) -> FluidResult<Real>;

    /// Cell-valued quantity by writer name (`1/Bw`, `RHOW`, `MUW`, `RS`, ...).
    ///
    /// Writers consume these; the core only exposes them. `None` for names
    /// this provider does not carry.
    fn named_quantity(&self, name: &str, cell: CellId) -> Option<Real>;
}

/// Water PVT evaluator keyed by PVT table id.
pub trait WaterPvt {
    fn viscosity(&self, table: usize, temperature: Real, pressure: &Ad) -> FluidResult<Ad>;

    fn inverse_fvf(&self, table: usize, temperature: Real, pressure: &Ad) -> FluidResult<Ad>;

    fn reference_density(&self, table: usize) -> FluidResult<Real>;
}

/// Per-phase PVT used by the multi-segment well mixture model.
///
/// Pressures arrive AD in the *well-equation* domain; implementations must
/// not introduce derivatives of their own beyond the chain rule on `p`.
pub trait PhasePvt {
    /// Phase density at the given pressure.
    fn phase_density(&self, phase: Phase, p: &Ad) -> FluidResult<Ad>;

    /// Phase viscosity at the given pressure.
    fn phase_viscosity(&self, phase: Phase, p: &Ad) -> FluidResult<Ad>;

    /// Density at surface conditions.
    fn surface_density(&self, phase: Phase) -> Real;

    /// Inverse formation volume factor at the given pressure.
    fn inverse_fvf(&self, phase: Phase, p: &Ad) -> FluidResult<Ad>;
}
