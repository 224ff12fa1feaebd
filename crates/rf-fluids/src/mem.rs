//! In-memory facade implementations.
//!
//! These back the integration tests and let the core run without a full
//! grid/PVT stack. Cell state is stored exactly as the traits hand it out.

use std::collections::HashMap;

use rf_core::{Ad, CellId, Real};

use crate::error::{FluidError, FluidResult};
use crate::grid::{CellFace, GridGeometry};
use crate::phase::Phase;
use crate::state::{CellStateProvider, PhasePvt, WaterPvt};

/// Per-cell stored fluid state.
#[derive(Clone, Debug)]
struct CellRecord {
    pressure: Ad,
    density: Ad,
    viscosity: Ad,
    temperature: Real,
    named: HashMap<String, Real>,
}

/// Map-backed [`CellStateProvider`].
#[derive(Debug, Default)]
pub struct InMemoryCellStates {
    num_pv: usize,
    cells: HashMap<CellId, CellRecord>,
}

impl InMemoryCellStates {
    pub fn new(num_pv: usize) -> Self {
        Self {
            num_pv,
            cells: HashMap::new(),
        }
    }

    /// Insert or replace a cell's state. Pressure is stored as the cell's
    /// first primary variable; density and viscosity as given.
    pub fn set_cell(&mut self, cell: CellId, pressure: Ad, density: Ad, viscosity: Ad, temperature: Real) {
        self.cells.insert(
            cell,
            CellRecord {
                pressure,
                density,
                viscosity,
                temperature,
                named: HashMap::new(),
            },
        );
    }

    /// Convenience: store value-level state, making pressure the AD variable
    /// at slot 0 and freezing density/viscosity.
    pub fn set_cell_values(
        &mut self,
        cell: CellId,
        pressure: Real,
        density: Real,
        viscosity: Real,
        temperature: Real,
    ) {
        let n = self.num_pv;
        self.set_cell(
            cell,
            Ad::variable(pressure, 0, n),
            Ad::constant(density, n),
            Ad::constant(viscosity, n),
            temperature,
        );
    }

    pub fn set_named(&mut self, cell: CellId, name: &str, value: Real) -> FluidResult<()> {
        let rec = self
            .cells
            .get_mut(&cell)
            .ok_or(FluidError::UnknownCell { cell })?;
        rec.named.insert(name.to_string(), value);
        Ok(())
    }

    fn record(&self, cell: CellId) -> FluidResult<&CellRecord> {
        self.cells
            .get(&cell)
            .ok_or(FluidError::UnknownCell { cell })
    }
}

impl CellStateProvider for InMemoryCellStates {
    fn num_primary_variables(&self) -> usize {
        self.num_pv
    }

    fn water_pressure(&self, cell: CellId) -> FluidResult<Ad> {
        Ok(self.record(cell)?.pressure.clone())
    }

    fn water_density(&self, cell: CellId) -> FluidResult<Ad> {
        Ok(self.record(cell)?.density.clone())
    }

    fn water_viscosity(&self, cell: CellId) -> FluidResult<Ad> {
        Ok(self.record(cell)?.viscosity.clone())
    }

    fn temperature(&self, cell: CellId) -> FluidResult<Real> {
        Ok(self.record(cell)?.temperature)
    }

    fn named_quantity(&self, name: &str, cell: CellId) -> Option<Real> {
        self.cells.get(&cell)?.named.get(name).copied()
    }
}

/// Vec-backed [`GridGeometry`].
#[derive(Debug, Default)]
pub struct InMemoryGeometry {
    depths: Vec<Real>,
    faces: Vec<Vec<CellFace>>,
}

impl InMemoryGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell; returns its id.
    pub fn push_cell(&mut self, depth: Real, faces: Vec<CellFace>) -> CellId {
        self.depths.push(depth);
        self.faces.push(faces);
        CellId::from_index((self.depths.len() - 1) as u32)
    }
}

impl GridGeometry for InMemoryGeometry {
    fn cell_depth(&self, cell: CellId) -> FluidResult<Real> {
        self.depths
            .get(cell.index() as usize)
            .copied()
            .ok_or(FluidError::UnknownCell { cell })
    }

    fn cell_faces(&self, cell: CellId) -> FluidResult<&[CellFace]> {
        self.faces
            .get(cell.index() as usize)
            .map(|f| f.as_slice())
            .ok_or(FluidError::UnknownCell { cell })
    }
}

/// Slightly-compressible PVT with constant viscosity per phase.
///
/// `rho(p) = rho_surface * (1 + c * (p - p_ref))`, `1/B(p)` likewise.
/// Serves as both [`WaterPvt`] (every table id maps to the water entry) and
/// [`PhasePvt`].
#[derive(Clone, Debug)]
pub struct SimplePvt {
    surface_density: [Real; 3],
    compressibility: [Real; 3],
    viscosity: [Real; 3],
    reference_pressure: Real,
}

impl SimplePvt {
    pub fn new(
        surface_density: [Real; 3],
        compressibility: [Real; 3],
        viscosity: [Real; 3],
        reference_pressure: Real,
    ) -> Self {
        Self {
            surface_density,
            compressibility,
            viscosity,
            reference_pressure,
        }
    }

    /// Incompressible water of the given density and viscosity.
    pub fn incompressible_water(density: Real, viscosity: Real) -> Self {
        Self::new([density, 800.0, 1.0], [0.0; 3], [viscosity, 1e-3, 1e-5], 1.0e5)
    }

    fn expansion(&self, phase: Phase, p: &Ad) -> Ad {
        let c = self.compressibility[phase.slot()];
        (p.clone() - self.reference_pressure) * c + 1.0
    }
}

impl WaterPvt for SimplePvt {
    fn viscosity(&self, _table: usize, _temperature: Real, p: &Ad) -> FluidResult<Ad> {
        Ok(Ad::constant(
            self.viscosity[Phase::Water.slot()],
            p.num_derivatives(),
        ))
    }

    fn inverse_fvf(&self, _table: usize, _temperature: Real, p: &Ad) -> FluidResult<Ad> {
        Ok(self.expansion(Phase::Water, p))
    }

    fn reference_density(&self, _table: usize) -> FluidResult<Real> {
        Ok(self.surface_density[Phase::Water.slot()])
    }
}

impl PhasePvt for SimplePvt {
    fn phase_density(&self, phase: Phase, p: &Ad) -> FluidResult<Ad> {
        Ok(self.expansion(phase, p) * self.surface_density[phase.slot()])
    }

    fn phase_viscosity(&self, phase: Phase, p: &Ad) -> FluidResult<Ad> {
        Ok(Ad::constant(
            self.viscosity[phase.slot()],
            p.num_derivatives(),
        ))
    }

    fn surface_density(&self, phase: Phase) -> Real {
        self.surface_density[phase.slot()]
    }

    fn inverse_fvf(&self, phase: Phase, p: &Ad) -> FluidResult<Ad> {
        Ok(self.expansion(phase, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::grid::FaceDir;

    #[test]
    fn cell_state_round_trip() {
        let mut states = InMemoryCellStates::new(3);
        let cell = CellId::from_index(7);
        states.set_cell_values(cell, 2.0e7, 1000.0, 5.0e-4, 350.0);
        assert_eq!(states.water_pressure(cell).unwrap().value(), 2.0e7);
        assert_eq!(states.water_pressure(cell).unwrap().derivative(0), 1.0);
        assert_eq!(states.water_density(cell).unwrap().value(), 1000.0);
        assert!(states.water_pressure(CellId::from_index(8)).is_err());
    }

    #[test]
    fn named_quantities_for_writers() {
        let mut states = InMemoryCellStates::new(3);
        let cell = CellId::from_index(0);
        states.set_cell_values(cell, 2.0e7, 1000.0, 5.0e-4, 350.0);
        states.set_named(cell, "1/Bw", 1.02).unwrap();
        assert_eq!(states.named_quantity("1/Bw", cell), Some(1.02));
        assert_eq!(states.named_quantity("RS", cell), None);
        assert!(states.set_named(CellId::from_index(9), "1/Bw", 1.0).is_err());
    }

    #[test]
    fn geometry_faces() {
        let mut geo = InMemoryGeometry::new();
        let c = geo.push_cell(
            1000.0,
            vec![CellFace {
                dir: FaceDir::XPlus,
                area: 25.0,
            }],
        );
        assert_eq!(geo.cell_depth(c).unwrap(), 1000.0);
        assert_eq!(geo.cell_faces(c).unwrap().len(), 1);
    }

    #[test]
    fn simple_pvt_density_slope() {
        let pvt = SimplePvt::new([1000.0, 800.0, 1.0], [1e-9, 0.0, 0.0], [5e-4, 1e-3, 1e-5], 1.0e5);
        let p = Ad::variable(1.0e5 + 1.0e6, 3, 4);
        let rho = pvt.phase_density(Phase::Water, &p).unwrap();
        assert_relative_eq!(rho.value(), 1000.0 * (1.0 + 1e-9 * 1.0e6));
        assert_relative_eq!(rho.derivative(3), 1000.0 * 1e-9);
    }
}
