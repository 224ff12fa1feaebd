//! Multi-segment well evaluator.
//!
//! Assembly order per Newton step: derived per-segment quantities first, then
//! mass-balance and pressure equations for every segment below the top, then
//! the control equation on the top segment's pressure row.

use rf_core::units::constants::G0_MPS2;
use rf_core::{Ad, Real};
use rf_fluids::{Phase, PhaseMap, PhasePvt};
use rf_schedule::{SegmentType, ValveStatus, WellKind};
use tracing::debug;

use crate::controls::WellControlType;
use crate::convergence::{
    ConvergenceReport, ConvergenceTolerances, Severity, WellFailure, WellFailureKind,
};
use crate::drops::{
    auto_icd_drop, friction_pressure_loss, hydrostatic_drop, spiral_icd_drop, valve_drop,
    velocity_head,
};
use crate::error::{WellError, WellResult};
use crate::linsys::WellLinSys;
use crate::primary::{PrimaryVariables, NUM_WELL_EQ, SPRES};
use crate::segment::{SegmentDevice, SegmentSet};
use crate::state::WellState;

/// Assembly switches of one well.
#[derive(Clone, Copy, Debug)]
pub struct WellEvalOptions {
    pub friction_enabled: bool,
    pub acceleration_enabled: bool,
    pub gravity: Real,
}

impl Default for WellEvalOptions {
    fn default() -> Self {
        Self {
            friction_enabled: true,
            acceleration_enabled: true,
            gravity: G0_MPS2,
        }
    }
}

/// Residual/Jacobian engine of one multi-segment well.
pub struct MultisegmentWellEval {
    name: String,
    kind: WellKind,
    segments: SegmentSet,
    primary: PrimaryVariables,
    options: WellEvalOptions,
    num_components: usize,

    /// Upwind segment per segment: self or outlet.
    upwinding: Vec<usize>,
    /// Mixture density at segment conditions.
    densities: Vec<Ad>,
    /// Mixture viscosity at segment conditions.
    viscosities: Vec<Ad>,
    /// Mixed mass rate through the segment.
    mass_rates: Vec<Ad>,

    linsys: WellLinSys,

    /// Per-perforation depth/pressure offsets from the owning segment.
    perf_depth_diffs: Vec<Real>,
    perf_pressure_diffs: Vec<Real>,
    /// Owning segment of each perforation.
    perf_segments: Vec<usize>,
}

impl MultisegmentWellEval {
    pub fn new(
        name: impl Into<String>,
        kind: WellKind,
        segments: SegmentSet,
        phase_map: PhaseMap,
        options: WellEvalOptions,
    ) -> WellResult<Self> {
        let n = segments.len();
        let primary = PrimaryVariables::new(phase_map, n)?;
        let zero = Ad::constant(0.0, NUM_WELL_EQ);
        Ok(Self {
            name: name.into(),
            kind,
            segments,
            primary,
            options,
            num_components: 3,
            upwinding: (0..n).collect(),
            densities: vec![zero.clone(); n],
            viscosities: vec![zero.clone(); n],
            mass_rates: vec![zero; n],
            linsys: WellLinSys::new(n),
            perf_depth_diffs: Vec::new(),
            perf_pressure_diffs: Vec::new(),
            perf_segments: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_producer(&self) -> bool {
        self.kind == WellKind::Producer
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn primary(&self) -> &PrimaryVariables {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut PrimaryVariables {
        &mut self.primary
    }

    pub fn linsys(&self) -> &WellLinSys {
        &self.linsys
    }

    pub fn upwind_segment(&self, seg: usize) -> usize {
        self.upwinding[seg]
    }

    /// Register the well's perforations: owning segment plus depth and
    /// pressure offsets relative to that segment.
    pub fn set_perforations(
        &mut self,
        segments: Vec<usize>,
        depth_diffs: Vec<Real>,
        pressure_diffs: Vec<Real>,
    ) {
        self.perf_segments = segments;
        self.perf_depth_diffs = depth_diffs;
        self.perf_pressure_diffs = pressure_diffs;
    }

    /// Pressure seen by a perforation: its segment's pressure plus the
    /// stored offset.
    pub fn perforation_pressure(&self, perf: usize) -> Real {
        self.primary.pressure(self.perf_segments[perf]) + self.perf_pressure_diffs[perf]
    }

    /// True depth of a perforation.
    pub fn perforation_depth(&self, perf: usize) -> Real {
        self.segments.segment(self.perf_segments[perf]).depth + self.perf_depth_diffs[perf]
    }

    /// Phase volume fraction of a segment, in the segment's own AD domain.
    fn fraction(&self, seg: usize, phase: Phase) -> Ad {
        let e = self.primary.eval(seg);
        match phase {
            Phase::Water => e.water_frac,
            Phase::Gas => e.gas_frac,
            Phase::Oil => e.oil_frac(),
        }
    }

    /// Upwinded phase fraction: taken from `upw(seg)` with derivatives
    /// cleared when that is a different segment.
    fn upwind_fraction(&self, seg: usize, phase: Phase) -> Ad {
        let upw = self.upwinding[seg];
        let mut frac = self.fraction(upw, phase);
        if upw != seg {
            frac.clear_derivatives();
        }
        frac
    }

    /// Upwinded mixture density with foreign derivatives cleared.
    fn upwind_density(&self, seg: usize) -> Ad {
        let upw = self.upwinding[seg];
        let mut rho = self.densities[upw].clone();
        if upw != seg {
            rho.clear_derivatives();
        }
        rho
    }

    /// Surface-volume rate of one component leaving `seg` toward its outlet.
    fn component_rate(&self, seg: usize, phase: Phase) -> Ad {
        let e = self.primary.eval(seg);
        e.q_total * self.upwind_fraction(seg, phase)
    }

    /// Refresh upwinding, mixture densities/viscosities and mass rates from
    /// the current primary variables.
    pub fn update_derived(&mut self, pvt: &dyn PhasePvt) -> WellResult<()> {
        let n = self.segments.len();

        // Upwinding first: negative total rate is the producer direction,
        // carried by the segment itself; positive flow donates from the outlet.
        for seg in 0..n {
            self.upwinding[seg] = match self.segments.outlet_index(seg) {
                Some(outlet) if self.primary.total_rate(seg) > 0.0 => outlet,
                _ => seg,
            };
        }

        for seg in 0..n {
            let e = self.primary.eval(seg);
            let mut rho_mix = Ad::constant(0.0, NUM_WELL_EQ);
            let mut mu_mix = Ad::constant(0.0, NUM_WELL_EQ);
            for phase in Phase::ALL {
                let frac = self.fraction(seg, phase);
                rho_mix += &(frac.clone() * pvt.phase_density(phase, &e.pressure)?);
                mu_mix += &(frac * pvt.phase_viscosity(phase, &e.pressure)?);
            }
            self.densities[seg] = rho_mix;
            self.viscosities[seg] = mu_mix;
        }

        for seg in 0..n {
            let mut mdot = Ad::constant(0.0, NUM_WELL_EQ);
            for phase in Phase::ALL {
                let q = self.component_rate(seg, phase);
                mdot += &(q * pvt.surface_density(phase));
            }
            self.mass_rates[seg] = mdot;
        }
        Ok(())
    }

    /// Assemble all well equations at the current primary-variable state.
    ///
    /// `perforation_rates` holds per-segment component inflow from the
    /// reservoir coupling (well AD domain); an empty slice means no
    /// perforation flow, which keeps pure pressure-network tests simple.
    pub fn assemble(
        &mut self,
        pvt: &dyn PhasePvt,
        well_state: &mut WellState,
        perforation_rates: &[Vec<Ad>],
    ) -> WellResult<()> {
        self.update_derived(pvt)?;
        self.linsys.clear();

        let n = self.segments.len();
        well_state.segments.resize(n);

        for seg in 1..n {
            self.assemble_mass_equations(seg, perforation_rates);
            match self.segments.segment(seg).device.segment_type() {
                SegmentType::Regular => self.assemble_default_pressure_eq(seg, well_state),
                _ => self.assemble_icd_pressure_eq(seg, well_state)?,
            }
        }
        // Top segment mass balance closes against its inlets and perforations.
        self.assemble_mass_equations(0, perforation_rates);
        self.assemble_control_equation(pvt, well_state)?;

        for seg in 0..n {
            well_state.segments.pressure[seg] = self.primary.pressure(seg);
        }
        well_state.bhp = self.primary.pressure(0);
        Ok(())
    }

    fn assemble_mass_equations(&mut self, seg: usize, perforation_rates: &[Vec<Ad>]) {
        let upw = self.upwinding[seg];
        for phase in Phase::ALL {
            let comp = phase.slot();
            let out_rate = self.component_rate(seg, phase);
            self.linsys.assemble_rate_term(seg, comp, &out_rate, seg, upw);

            let inlets: Vec<usize> = self.segments.inlets(seg).to_vec();
            for inlet in inlets {
                let inflow = -self.component_rate(inlet, phase);
                self.linsys
                    .assemble_rate_term(seg, comp, &inflow, inlet, self.upwinding[inlet]);
            }

            if let Some(perf) = perforation_rates.get(seg) {
                let term = -perf[comp].clone();
                self.linsys.add_term(seg, comp, &term, seg, seg, seg);
            }
        }
    }

    fn assemble_default_pressure_eq(&mut self, seg: usize, well_state: &mut WellState) {
        debug_assert_ne!(seg, 0);
        let upw = self.upwinding[seg];
        let rho_upw = self.upwind_density(seg);

        let mut pressure_equation = self.primary.segment_pressure(seg);

        let hydro = hydrostatic_drop(
            &rho_upw,
            self.segments.depth_diff_to_outlet(seg),
            self.options.gravity,
        );
        well_state.segments.pressure_drop_hydrostatic[seg] = hydro.value();
        pressure_equation -= &hydro;

        if self.options.friction_enabled {
            let mut mu_upw = self.viscosities[upw].clone();
            if upw != seg {
                mu_upw.clear_derivatives();
            }
            let friction = friction_pressure_loss(
                self.segments.segment(seg),
                &self.mass_rates[seg],
                &rho_upw,
                &mu_upw,
            );
            well_state.segments.pressure_drop_friction[seg] = friction.value();
            pressure_equation -= &friction;
        }

        let outlet = self.segments.outlet_index(seg).expect("non-top segment");
        let outlet_pressure = self.primary.segment_pressure(outlet);
        self.linsys
            .assemble_pressure_eq(seg, upw, outlet, &pressure_equation, &outlet_pressure);

        if self.options.acceleration_enabled {
            self.handle_acceleration_pressure_loss(seg, well_state);
        }
    }

    fn handle_acceleration_pressure_loss(&mut self, seg: usize, well_state: &mut WellState) {
        let area = self.segments.segment(seg).cross_area;
        let mass_rate = self.mass_rates[seg].clone();
        let upw = self.upwinding[seg];

        let mut loss = velocity_head(area, &mass_rate, &self.upwind_density(seg));

        for &inlet in self.segments.inlets(seg) {
            let inlet_area = self.segments.segment(inlet).cross_area;
            let upw_inlet = self.upwinding[inlet];
            let mut inlet_density = self.densities[upw_inlet].clone();
            if inlet != upw_inlet {
                inlet_density.clear_derivatives();
            }
            loss -= &velocity_head(inlet_area.max(area), &self.mass_rates[inlet], &inlet_density);
        }

        // Sign chosen to match the reference simulator: flipped for producers.
        let sign = if mass_rate.value() < 0.0 { 1.0 } else { -1.0 };
        loss = loss * sign;

        well_state.segments.pressure_drop_accel[seg] = loss.value();
        self.linsys.assemble_pressure_loss(seg, upw, &loss);
    }

    fn assemble_icd_pressure_eq(&mut self, seg: usize, well_state: &mut WellState) -> WellResult<()> {
        debug_assert_ne!(seg, 0);
        if let SegmentDevice::Valve(valve) = &self.segments.segment(seg).device {
            if valve.status == ValveStatus::Shut {
                // A shut valve degenerates to the zero-rate equation.
                let q_total = self.primary.eval(seg).q_total;
                self.linsys.assemble_trivial_eq(seg, &q_total);
                well_state.segments.pressure_drop_friction[seg] = 0.0;
                return Ok(());
            }
        }

        let upw = self.upwinding[seg];
        let rho_upw = self.upwind_density(seg);
        let mass_rate = &self.mass_rates[seg];

        let icd_drop = match &self.segments.segment(seg).device {
            SegmentDevice::SpiralIcd(icd) => spiral_icd_drop(icd, mass_rate, &rho_upw),
            SegmentDevice::AutoIcd(icd) => auto_icd_drop(icd, mass_rate, &rho_upw),
            SegmentDevice::Valve(valve) => valve_drop(valve, mass_rate, &rho_upw),
            SegmentDevice::Regular => {
                return Err(WellError::NotAnIcdSegment {
                    well: self.name.clone(),
                    segment: self.segments.segment(seg).number,
                })
            }
        };
        well_state.segments.pressure_drop_friction[seg] = icd_drop.value();

        let pressure_equation = self.primary.segment_pressure(seg) - &icd_drop;
        let outlet = self.segments.outlet_index(seg).expect("non-top segment");
        let outlet_pressure = self.primary.segment_pressure(outlet);
        self.linsys
            .assemble_pressure_eq(seg, upw, outlet, &pressure_equation, &outlet_pressure);
        Ok(())
    }

    /// The control equation installed on the top segment's pressure row.
    pub fn control_equation(
        &self,
        pvt: &dyn PhasePvt,
        well_state: &WellState,
    ) -> WellResult<Ad> {
        if !well_state.controls.is_open() {
            // A stopped well pins its total rate at zero.
            return Ok(self.primary.eval(0).q_total);
        }

        let slot = well_state.controls.current();
        let eq = match slot.kind {
            WellControlType::Bhp | WellControlType::Thp => {
                self.primary.segment_pressure(0) - slot.target
            }
            WellControlType::SurfaceRate => {
                let mut sum = Ad::constant(0.0, NUM_WELL_EQ);
                for phase in Phase::ALL {
                    let weight = slot.distribution[phase.slot()];
                    if weight != 0.0 {
                        sum += &(self.component_rate(0, phase) * weight);
                    }
                }
                sum - slot.target
            }
            WellControlType::ReservoirRate => {
                let p_top = self.primary.segment_pressure(0);
                let mut sum = Ad::constant(0.0, NUM_WELL_EQ);
                for phase in Phase::ALL {
                    let weight = slot.distribution[phase.slot()];
                    if weight != 0.0 {
                        let q_res = self.component_rate(0, phase) / pvt.inverse_fvf(phase, &p_top)?;
                        sum += &(q_res * weight);
                    }
                }
                sum - slot.target
            }
        };
        Ok(eq)
    }

    fn assemble_control_equation(
        &mut self,
        pvt: &dyn PhasePvt,
        well_state: &WellState,
    ) -> WellResult<()> {
        let eq = self.control_equation(pvt, well_state)?;
        self.linsys.assemble_control_eq(&eq);
        Ok(())
    }

    /// Tolerance the control equation is held to, by active control kind.
    pub fn control_tolerance(&self, well_state: &WellState, tol: &ConvergenceTolerances) -> Real {
        match well_state.controls.current().kind {
            WellControlType::Thp => tol.tolerance_pressure_ms_wells,
            WellControlType::Bhp
            | WellControlType::SurfaceRate
            | WellControlType::ReservoirRate => tol.tolerance_wells,
        }
    }

    /// Per-equation-family convergence classification.
    pub fn get_well_convergence(
        &self,
        well_state: &WellState,
        b_avg: &[Real],
        tol: &ConvergenceTolerances,
        relax_tolerance: bool,
    ) -> ConvergenceReport {
        debug_assert_eq!(b_avg.len(), self.num_components);
        let n = self.segments.len();

        let mut maximum_residual = [0.0_f64; NUM_WELL_EQ];
        for seg in 0..n {
            for eq in 0..NUM_WELL_EQ {
                let abs_residual = self.linsys.residual(seg, eq).abs();
                if eq < self.num_components {
                    let flux_residual = b_avg[eq] * abs_residual;
                    if !(flux_residual <= maximum_residual[eq]) {
                        maximum_residual[eq] = flux_residual;
                    }
                } else if seg > 0 {
                    // Top-segment pressure row is the control equation,
                    // checked separately below.
                    if !(abs_residual <= maximum_residual[eq]) {
                        maximum_residual[eq] = abs_residual;
                    }
                }
            }
        }

        let mut report = ConvergenceReport::new();
        for eq in 0..NUM_WELL_EQ {
            let residual = maximum_residual[eq];
            if eq < self.num_components {
                let kind = WellFailureKind::MassBalance { component: eq };
                if residual.is_nan() {
                    self.fail(&mut report, kind, Severity::NotANumber);
                } else if residual > tol.max_residual_allowed {
                    self.fail(&mut report, kind, Severity::TooLarge);
                } else if !relax_tolerance && residual > tol.tolerance_wells {
                    self.fail(&mut report, kind, Severity::Normal);
                } else if residual > tol.relaxed_tolerance_flow {
                    self.fail(&mut report, kind, Severity::Normal);
                }
            } else {
                let kind = WellFailureKind::Pressure;
                if residual.is_nan() {
                    self.fail(&mut report, kind, Severity::NotANumber);
                } else if residual.is_infinite() {
                    self.fail(&mut report, kind, Severity::TooLarge);
                } else if !relax_tolerance && residual > tol.tolerance_pressure_ms_wells {
                    self.fail(&mut report, kind, Severity::Normal);
                } else if residual > tol.relaxed_tolerance_pressure {
                    self.fail(&mut report, kind, Severity::Normal);
                }
            }
        }

        // Control equation, against its mode-dependent tolerance.
        let control_residual = self.linsys.residual(0, SPRES).abs();
        let control_tolerance = self.control_tolerance(well_state, tol);
        let kind = WellFailureKind::ControlEquation;
        if control_residual.is_nan() {
            self.fail(&mut report, kind, Severity::NotANumber);
        } else if control_residual > tol.max_residual_allowed {
            self.fail(&mut report, kind, Severity::TooLarge);
        } else if control_residual > control_tolerance {
            self.fail(&mut report, kind, Severity::Normal);
        }

        report
    }

    fn fail(&self, report: &mut ConvergenceReport, kind: WellFailureKind, severity: Severity) {
        debug!(well = %self.name, ?kind, ?severity, "well equation failed tolerance");
        report.set_well_failed(WellFailure {
            kind,
            severity,
            well: self.name.clone(),
        });
    }

    /// Scaled residual maxima, or `(false, partial)` on the first NaN/Inf.
    pub fn get_finite_well_residuals(&self, b_avg: &[Real]) -> (bool, Vec<Real>) {
        debug_assert_eq!(b_avg.len(), self.num_components);
        let mut residuals = vec![0.0; NUM_WELL_EQ + 1];

        for seg in 0..self.segments.len() {
            for eq in 0..NUM_WELL_EQ {
                let residual = if eq < self.num_components {
                    self.linsys.residual(seg, eq).abs() * b_avg[eq]
                } else if seg > 0 {
                    self.linsys.residual(seg, eq).abs()
                } else {
                    0.0
                };
                if !residual.is_finite() {
                    debug!(well = %self.name, seg, eq, "non-finite well residual");
                    return (false, residuals);
                }
                if residual > residuals[eq] {
                    residuals[eq] = residual;
                }
            }
        }

        let control_residual = self.linsys.residual(0, SPRES).abs();
        if !control_residual.is_finite() {
            debug!(well = %self.name, "non-finite control residual");
            return (false, residuals);
        }
        residuals[NUM_WELL_EQ] = control_residual;
        (true, residuals)
    }

    /// Sum of above-tolerance residual ratios, handed to the outer Newton
    /// loop for step-acceptance decisions.
    pub fn residual_measure(
        &self,
        well_state: &WellState,
        residuals: &[Real],
        tol: &ConvergenceTolerances,
    ) -> Real {
        debug_assert_eq!(residuals.len(), NUM_WELL_EQ + 1);
        let mut sum = 0.0;

        for residual in residuals.iter().take(self.num_components) {
            if *residual > tol.tolerance_wells {
                sum += residual / tol.tolerance_wells;
            }
        }
        if residuals[SPRES] > tol.tolerance_pressure_ms_wells {
            sum += residuals[SPRES] / tol.tolerance_pressure_ms_wells;
        }
        let control_tolerance = self.control_tolerance(well_state, tol);
        if residuals[NUM_WELL_EQ] > control_tolerance {
            sum += residuals[NUM_WELL_EQ] / control_tolerance;
        }
        sum
    }
}
