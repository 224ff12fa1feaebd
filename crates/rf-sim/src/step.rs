//! The reporting-step driver.

use rf_aquifer::CarterTracyAquifer;
use rf_core::{Ad, Real, StepTimer};
use rf_fluids::{CellStateProvider, PhasePvt};
use rf_groups::{WellGroupTree, WellPhasesSummed};
use rf_linsys::{BlockJacobian, ResidualVector};
use rf_schedule::ProductionControlMode;
use rf_wells::{ConvergenceReport, ConvergenceTolerances, MultisegmentWellEval, WellStates};
use tracing::debug;

use crate::error::SimResult;

/// What one assemble pass tells the outer Newton loop.
#[derive(Debug)]
pub struct StepReport {
    pub well_reports: Vec<ConvergenceReport>,
    pub group_conditions_met: bool,
}

impl StepReport {
    pub fn wells_converged(&self) -> bool {
        self.well_reports.iter().all(|r| r.converged())
    }
}

/// The simulator core for one schedule step: aquifers, wells, and the group
/// tree sharing one well-state object.
pub struct SimCore {
    pub aquifers: Vec<CarterTracyAquifer>,
    pub wells: Vec<MultisegmentWellEval>,
    pub tree: WellGroupTree,
    pub well_states: WellStates,
    pub tolerances: ConvergenceTolerances,
}

impl SimCore {
    /// Called once at the start of each report step, before the first Newton
    /// iteration: snapshots previous-step aquifer pressures.
    pub fn begin_step(&mut self, provider: &dyn CellStateProvider) -> SimResult<()> {
        for aquifer in &mut self.aquifers {
            aquifer.before_step(provider)?;
        }
        Ok(())
    }

    /// One Newton-iteration assembly: every owner writes its residual rows
    /// and Jacobian blocks, then the group tree checks its constraints.
    pub fn assemble(
        &mut self,
        provider: &dyn CellStateProvider,
        pvt: &dyn PhasePvt,
        timer: &StepTimer,
        jacobian: &mut BlockJacobian,
        residual: &mut ResidualVector,
        b_avg: &[Real],
        perforation_rates: &[Vec<Vec<Ad>>],
    ) -> SimResult<StepReport> {
        for aquifer in &mut self.aquifers {
            aquifer.assemble(provider, timer, jacobian, residual)?;
        }

        let mut well_reports = Vec::with_capacity(self.wells.len());
        for (index, well) in self.wells.iter_mut().enumerate() {
            let well_index = self.well_states.index_of(well.name())?;
            let perf = perforation_rates.get(index).map(|p| p.as_slice()).unwrap_or(&[]);
            well.assemble(pvt, self.well_states.well_mut(well_index), perf)?;
            well_reports.push(well.get_well_convergence(
                self.well_states.well(well_index),
                b_avg,
                &self.tolerances,
                false,
            ));
        }

        let mut summed = WellPhasesSummed::default();
        let group_conditions_met =
            self.tree
                .conditions_met(self.tree.root(), &mut self.well_states, &mut summed)?;
        debug!(
            group_conditions_met,
            oil_production = summed.surf_prod_rates[1],
            "assembly pass complete"
        );

        Ok(StepReport {
            well_reports,
            group_conditions_met,
        })
    }

    /// Called once after the step converges: accumulate aquifer flux, apply
    /// reinjection policies, and redistribute targets where a well left
    /// group control.
    pub fn end_step(&mut self, timer: &StepTimer) -> SimResult<()> {
        for aquifer in &mut self.aquifers {
            aquifer.after_step(timer);
        }

        self.tree
            .apply_explicit_reinjection_controls(self.tree.root(), &mut self.well_states)?;

        let mut flagged = Vec::new();
        self.tree.visit_depth_first(|id, node| {
            if !node.is_leaf() && node.should_update_targets {
                flagged.push((id, node.prod_spec.control_mode));
            }
        });
        for (id, mode) in flagged {
            if mode != ProductionControlMode::None {
                self.tree
                    .update_well_production_targets(id, &mut self.well_states)?;
            }
            self.tree
                .update_well_injection_targets(id, &self.well_states)?;
            self.tree.node_mut(id).should_update_targets = false;
        }
        Ok(())
    }
}
