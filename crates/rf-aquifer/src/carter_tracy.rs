//! The Carter-Tracy aquifer engine.
//!
//! Per reporting step:
//! - `before_step` snapshots the previous-step water pressures,
//! - `assemble` recomputes per-connection inflow rates and writes them into
//!   the water rows of the global residual/Jacobian,
//! - `after_step` accumulates the cumulative flux.
//!
//! Only the current water pressure carries derivatives; the a/b coefficients
//! and the previous pressure are frozen values inside a step.

use rf_core::units::{constants::G0_MPS2, Area, Length, Pressure};
use rf_core::{Ad, CellId, Real, StepTimer};
use rf_fluids::{CellStateProvider, GridGeometry, Phase, PhaseMap, WaterPvt};
use rf_linsys::{BlockJacobian, ResidualVector};
use tracing::debug;

use crate::connections::{AquiferConnections, ConnectionGeometry};
use crate::error::{AquiferError, AquiferResult};
use crate::influence::{InfluenceTable, LinearFit};

/// Static Carter-Tracy parameters, immutable once constructed.
#[derive(Clone, Debug)]
pub struct CarterTracyParams {
    pub aquifer_id: u32,
    pub influence_table_id: usize,
    pub pvt_table_id: usize,
    /// Aquifer porosity φ.
    pub porosity: Real,
    /// Total (rock + water) compressibility, 1/Pa.
    pub total_compressibility: Real,
    /// Inner radius r₀.
    pub inner_radius: Length,
    /// Aquifer permeability kₐ.
    pub permeability: Area,
    /// Aquifer thickness h.
    pub thickness: Length,
    /// Fraction of the circle subtended by the aquifer boundary, θ.
    pub angle_fraction: Real,
    /// Datum depth d₀.
    pub datum_depth: Length,
    /// Time-constant unit coefficient (deck unit system).
    pub c1: Real,
    /// Influx-constant unit coefficient (deck unit system).
    pub c2: Real,
    /// Initial aquifer pressure p₀; `None` requests equilibration against the
    /// reservoir at initialization.
    pub initial_pressure: Option<Pressure>,
}

impl CarterTracyParams {
    /// Influx constant β = c₂·h·θ·φ·Cₜ·r₀².
    fn influx_constant(&self) -> Real {
        let r0 = self.inner_radius.value;
        self.c2 * self.thickness.value * self.angle_fraction * self.porosity
            * self.total_compressibility
            * r0
            * r0
    }

    /// Time constant Tc = μ_w·φ·Cₜ·r₀² / (kₐ·c₁).
    fn time_constant(&self, mu_w: Real) -> Real {
        let r0 = self.inner_radius.value;
        mu_w * self.porosity * self.total_compressibility * r0 * r0
            / (self.permeability.value * self.c1)
    }
}

/// Runtime state and assembly engine of one Carter-Tracy aquifer.
pub struct CarterTracyAquifer {
    params: CarterTracyParams,
    cells: Vec<CellId>,
    geometry: ConnectionGeometry,
    fit: LinearFit,
    phase_map: PhaseMap,
    gravity: Real,
    num_pv: usize,

    /// Effective aquifer water viscosity, fixed at initialization.
    mu_w: Real,
    /// Initial (datum) aquifer pressure, possibly equilibrated.
    pa0: Real,

    pressure_previous: Vec<Ad>,
    pressure_current: Vec<Ad>,
    rhow: Vec<Ad>,
    qai: Vec<Ad>,
    w_flux: Ad,
}

impl CarterTracyAquifer {
    /// Build and initialize: resolve connection geometry, equilibrate the
    /// initial pressure when defaulted, evaluate the effective viscosity, and
    /// fit the influence table.
    pub fn new(
        params: CarterTracyParams,
        connections: &AquiferConnections,
        table: &InfluenceTable,
        phase_map: PhaseMap,
        provider: &dyn CellStateProvider,
        water_pvt: &dyn WaterPvt,
        grid: &dyn GridGeometry,
    ) -> AquiferResult<Self> {
        let geometry = connections.initialize(params.aquifer_id, grid)?;
        let cells = connections.cells();
        let num_pv = provider.num_primary_variables();
        let n = cells.len();

        let mut rhow = Vec::with_capacity(n);
        for cell in &cells {
            rhow.push(provider.water_density(*cell)?);
        }

        let gravity = G0_MPS2;
        let pa0 = match params.initial_pressure {
            Some(p0) => p0.value,
            None => equilibrium_pressure(&cells, &geometry, &rhow, params.datum_depth.value, gravity, provider)?,
        };

        // Effective viscosity at (temperature of the first connected cell, p₀).
        let temperature = provider.temperature(cells[0])?;
        let mu_w = water_pvt
            .viscosity(params.pvt_table_id, temperature, &Ad::constant(pa0, num_pv))?
            .value();

        let fit = table.linear_fit()?;
        debug!(
            aquifer = params.aquifer_id,
            pa0, mu_w, "initialized Carter-Tracy aquifer"
        );

        Ok(Self {
            params,
            cells,
            geometry,
            fit,
            phase_map,
            gravity,
            num_pv,
            mu_w,
            pa0,
            pressure_previous: vec![Ad::constant(0.0, num_pv); n],
            pressure_current: vec![Ad::constant(0.0, num_pv); n],
            rhow,
            qai: vec![Ad::constant(0.0, num_pv); n],
            w_flux: Ad::constant(0.0, num_pv),
        })
    }

    pub fn aquifer_id(&self) -> u32 {
        self.params.aquifer_id
    }

    pub fn cell_ids(&self) -> &[CellId] {
        &self.cells
    }

    pub fn area_fraction(&self, idx: usize) -> Real {
        self.geometry.alphas[idx]
    }

    /// Initial aquifer pressure after (possible) equilibration.
    pub fn initial_pressure(&self) -> Real {
        self.pa0
    }

    /// Cumulative water flux W.
    pub fn cumulative_flux(&self) -> Real {
        self.w_flux.value()
    }

    /// Inflow rate of connection `idx` from the last assembly.
    pub fn inflow_rate(&self, idx: usize) -> &Ad {
        &self.qai[idx]
    }

    /// Snapshot previous-step pressures. Call at the start of every report
    /// step, before the first Newton iteration.
    pub fn before_step(&mut self, provider: &dyn CellStateProvider) -> AquiferResult<()> {
        for (idx, cell) in self.cells.iter().enumerate() {
            self.pressure_previous[idx] = provider.water_pressure(*cell)?;
        }
        Ok(())
    }

    /// Recompute inflow rates at the current primary-variable state and write
    /// them into the water rows of the residual and Jacobian.
    pub fn assemble(
        &mut self,
        provider: &dyn CellStateProvider,
        timer: &StepTimer,
        jacobian: &mut BlockJacobian,
        residual: &mut ResidualVector,
    ) -> AquiferResult<()> {
        let water_eq = self.phase_map.pos(Phase::Water)?;

        for idx in 0..self.cells.len() {
            let cell = self.cells[idx];
            self.pressure_current[idx] = provider.water_pressure(cell)?;
            self.rhow[idx] = provider.water_density(cell)?;

            let (a, b) = self.inflow_coefficients(idx, timer)?;
            let p_prev = self.pressure_previous[idx].value();
            let qai = (Ad::constant(a, self.num_pv)
                - (self.pressure_current[idx].clone() - p_prev) * b)
                * self.geometry.alphas[idx];

            residual.add(cell, water_eq, -qai.value());
            for pv in 0..self.num_pv {
                jacobian.add(cell, cell, water_eq, pv, -qai.derivative(pv));
            }
            self.qai[idx] = qai;
        }
        Ok(())
    }

    /// Accumulate the cumulative flux. Call once after the step converges.
    pub fn after_step(&mut self, timer: &StepTimer) {
        for qai in &self.qai {
            let mut inc = qai.clone() * timer.step_length();
            // W is a frozen value inside the next step's a coefficient;
            // derivative history across steps is meaningless.
            inc.clear_derivatives();
            self.w_flux += &inc;
        }
    }

    /// Potential drop Δpₐᵢ for connection `idx`, constant inside a step.
    fn potential_drop(&self, idx: usize) -> Real {
        let depth = self.geometry.depths[idx];
        self.pa0
            + self.rhow[idx].value() * self.gravity * (depth - self.params.datum_depth.value)
            - self.pressure_previous[idx].value()
    }

    /// The frozen a/b coefficients of the inflow expression.
    fn inflow_coefficients(&self, idx: usize, timer: &StepTimer) -> AquiferResult<(Real, Real)> {
        let beta = self.params.influx_constant();
        let tc = self.params.time_constant(self.mu_w);
        let td = timer.elapsed() / tc;
        let td_plus_dt = (timer.elapsed() + timer.step_length()) / tc;

        let pitd_prime = self.fit.slope();
        let pitd = self.fit.pd_at(td_plus_dt);
        let denom = pitd - td * pitd_prime;
        if denom <= 0.0 {
            return Err(AquiferError::InfluenceFitInvalid {
                aquifer_id: self.params.aquifer_id,
                denominator: denom,
            });
        }

        let a = (beta * self.potential_drop(idx) - self.w_flux.value() * pitd_prime) / (tc * denom);
        let b = beta / (tc * denom);
        Ok((a, b))
    }
}

/// Area-weighted equilibration of the defaulted initial pressure:
/// `p₀ = mean_i[(p_w,res(i) - ρ_w(i)·g·(depthᵢ - d₀))·αᵢ]`.
fn equilibrium_pressure(
    cells: &[CellId],
    geometry: &ConnectionGeometry,
    rhow: &[Ad],
    datum_depth: Real,
    gravity: Real,
    provider: &dyn CellStateProvider,
) -> AquiferResult<Real> {
    let mut sum = 0.0;
    for (idx, cell) in cells.iter().enumerate() {
        let p_res = provider.water_pressure(*cell)?.value();
        let head = rhow[idx].value() * gravity * (geometry.depths[idx] - datum_depth);
        sum += (p_res - head) * geometry.alphas[idx];
    }
    Ok(sum / cells.len() as Real)
}
