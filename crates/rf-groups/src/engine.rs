//! The group control engine: recursive constraint checks, target
//! propagation, reinjection policies and per-well control installs.
//!
//! Ordering matters everywhere here. `conditions_met` walks bottom-up and
//! stops at the first violation, after mutating the offending control state;
//! the outer loop calls it again until it reports met.

use rf_core::{NodeId, Real};
use rf_fluids::Phase;
use rf_schedule::{InjectionControlMode, InjectorType, ProductionControlMode, ProductionProcedure};
use rf_wells::{ControlSlot, WellControlType, WellStates};
use tracing::{info, warn};

use crate::error::{GroupError, GroupResult};
use crate::node::{NodeKind, WellGroupTree};
use crate::rates::{injection_rate_by_mode, production_rate_by_mode, RateBasis, WellPhasesSummed};

/// Explicit engine configuration. These used to be global sentinels and a
/// compile-time flag in older simulators; they are ordinary data here.
#[derive(Clone, Copy, Debug)]
pub struct GroupControlConfig {
    /// REIN distributes reservoir-volume controls instead of surface-rate.
    pub reinjection_uses_resv: bool,
    /// Shutting a well disables it outright instead of pinning a zero rate.
    pub hard_stop_on_shut: bool,
}

impl Default for GroupControlConfig {
    fn default() -> Self {
        Self {
            reinjection_uses_resv: false,
            hard_stop_on_shut: true,
        }
    }
}

/// Relative slack for reservoir-rate limit checks.
const RESV_LIMIT_RELTOL: Real = 1.0e-6;

const INJECTION_CHECK_MODES: [InjectionControlMode; 2] =
    [InjectionControlMode::Rate, InjectionControlMode::Resv];

const PRODUCTION_CHECK_MODES: [ProductionControlMode; 5] = [
    ProductionControlMode::Orat,
    ProductionControlMode::Wrat,
    ProductionControlMode::Grat,
    ProductionControlMode::Lrat,
    ProductionControlMode::Resv,
];

fn production_distribution(
    mode: ProductionControlMode,
) -> GroupResult<(WellControlType, [Real; 3])> {
    use ProductionControlMode as M;
    Ok(match mode {
        M::Orat => (WellControlType::SurfaceRate, [0.0, 1.0, 0.0]),
        M::Wrat => (WellControlType::SurfaceRate, [1.0, 0.0, 0.0]),
        M::Grat => (WellControlType::SurfaceRate, [0.0, 0.0, 1.0]),
        M::Lrat => (WellControlType::SurfaceRate, [1.0, 1.0, 0.0]),
        M::Resv => (WellControlType::ReservoirRate, [1.0, 1.0, 1.0]),
        other => {
            return Err(GroupError::UnhandledMode {
                layer: "group production control",
                mode: format!("{other:?}"),
            })
        }
    })
}

fn injection_distribution(
    mode: InjectionControlMode,
) -> GroupResult<(WellControlType, [Real; 3])> {
    use InjectionControlMode as M;
    Ok(match mode {
        M::Rate => (WellControlType::SurfaceRate, [1.0, 1.0, 1.0]),
        M::Resv => (WellControlType::ReservoirRate, [1.0, 1.0, 1.0]),
        other => {
            return Err(GroupError::UnhandledMode {
                layer: "group injection control",
                mode: format!("{other:?}"),
            })
        }
    })
}

fn injector_phase(injector_type: InjectorType) -> Phase {
    match injector_type {
        InjectorType::Water => Phase::Water,
        InjectorType::Oil => Phase::Oil,
        InjectorType::Gas => Phase::Gas,
    }
}

impl WellGroupTree {
    /// Recursive constraint pass. Returns `Ok(false)` after the first
    /// violation, having already mutated control state in response; phase
    /// sums of met subtrees accumulate into `summed`.
    pub fn conditions_met(
        &mut self,
        id: NodeId,
        well_states: &mut WellStates,
        summed: &mut WellPhasesSummed,
    ) -> GroupResult<bool> {
        if self.node(id).is_leaf() {
            return self.conditions_met_at_well(id, well_states, summed);
        }

        let children = self.children(id).to_vec();
        let mut child_sum = WellPhasesSummed::default();
        for child in &children {
            let mut current = WellPhasesSummed::default();
            if !self.conditions_met(*child, well_states, &mut current)? {
                return Ok(false);
            }
            child_sum += current;
        }

        // Injection constraints on inactive modes.
        for mode in INJECTION_CHECK_MODES {
            if self.node(id).inj_spec.control_mode == mode {
                continue;
            }
            let Some(target) = self.node(id).inj_spec.target(mode)? else {
                continue;
            };
            let my_rate =
                injection_rate_by_mode(&child_sum.res_inj_rates, &child_sum.surf_inj_rates, mode)?;
            if my_rate > target {
                warn!(
                    group = %self.node(id).name,
                    ?mode,
                    target,
                    rate = my_rate,
                    "group injection target exceeded"
                );
                self.apply_inj_group_control(id, mode, target, false, well_states)?;
                self.node_mut(id).inj_spec.control_mode = mode;
                return Ok(false);
            }
        }

        // Production constraints on inactive modes.
        let mut violation = None;
        for mode in PRODUCTION_CHECK_MODES {
            if self.node(id).prod_spec.control_mode == mode {
                continue;
            }
            let Some(target) = self.node(id).prod_spec.target(mode)? else {
                continue;
            };
            let my_rate = production_rate_by_mode(
                &child_sum.res_prod_rates,
                &child_sum.surf_prod_rates,
                mode,
            )?;
            if my_rate.abs() > target {
                warn!(
                    group = %self.node(id).name,
                    ?mode,
                    target,
                    rate = my_rate,
                    "group production target exceeded"
                );
                violation = Some((mode, target));
                break;
            }
        }

        if let Some((mode, target)) = violation {
            match self.node(id).prod_spec.procedure {
                ProductionProcedure::Well => {
                    if let Some((worst, rate)) = self.get_worst_offending(id, well_states, mode)? {
                        info!(
                            well = %self.node(worst).name,
                            rate,
                            "shutting worst-offending well"
                        );
                        self.shut_well(worst, well_states)?;
                    }
                    return Ok(false);
                }
                ProductionProcedure::Rate => {
                    self.apply_prod_group_control(id, mode, target, false, well_states)?;
                    return Ok(false);
                }
                ProductionProcedure::NoneP => return Ok(false),
            }
        }

        *summed += child_sum;
        Ok(true)
    }

    fn conditions_met_at_well(
        &mut self,
        id: NodeId,
        well_states: &mut WellStates,
        summed: &mut WellPhasesSummed,
    ) -> GroupResult<bool> {
        let (well_index, group_slot) = match &self.node(id).kind {
            NodeKind::Well {
                well_index,
                group_control_slot,
                ..
            } => (*well_index, *group_control_slot),
            NodeKind::Group { .. } => unreachable!("leaf dispatch"),
        };

        let (is_producer, bhp, surface_rates, reservoir_rates, current, num_slots) = {
            let well = well_states.well(well_index);
            (
                well.is_producer(),
                well.bhp,
                well.surface_rates,
                well.reservoir_rates,
                well.controls.current_index(),
                well.controls.len(),
            )
        };

        // Report this well's rates upward.
        if is_producer {
            summed.res_prod_rates = reservoir_rates;
            summed.surf_prod_rates = surface_rates;
        } else {
            summed.res_inj_rates = reservoir_rates;
            summed.surf_inj_rates = surface_rates;
        }

        // Constraints used as the active control, or installed by group
        // control, are not re-checked.
        for ctrl_index in 0..num_slots {
            if ctrl_index == current || Some(ctrl_index) == group_slot {
                continue;
            }
            let slot = *well_states.well(well_index).controls.slot(ctrl_index)?;
            let violated = match slot.kind {
                WellControlType::Bhp => {
                    if is_producer {
                        slot.target > bhp
                    } else {
                        slot.target < bhp
                    }
                }
                WellControlType::Thp => {
                    return Err(GroupError::ThpUnsupported {
                        well: self.node(id).name.clone(),
                    })
                }
                WellControlType::ReservoirRate => {
                    let my_rate = dot(slot.distribution, reservoir_rates);
                    my_rate.abs() - slot.target.abs()
                        > my_rate.abs().max(slot.target.abs()) * RESV_LIMIT_RELTOL
                }
                WellControlType::SurfaceRate => {
                    let my_rate = dot(slot.distribution, surface_rates);
                    my_rate.abs() > slot.target.abs()
                }
            };

            if violated {
                warn!(
                    well = %self.node(id).name,
                    slot = ctrl_index,
                    kind = ?slot.kind,
                    target = slot.target,
                    "well limit violated, switching to local control"
                );
                well_states
                    .well_mut(well_index)
                    .controls
                    .set_current(ctrl_index)?;
                self.node_mut(id).individual_control = true;
                // The parent group's split no longer adds up; redistribute
                // at the end of the step.
                if let Some(parent) = self.node(id).parent {
                    self.node_mut(parent).should_update_targets = true;
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Impose a production target on the subtree, split by guide rates.
    pub fn apply_prod_group_control(
        &mut self,
        id: NodeId,
        mode: ProductionControlMode,
        target: Real,
        only_group: bool,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        if self.node(id).is_leaf() {
            return self.apply_prod_control_at_well(id, mode, target, only_group, well_states);
        }

        if self.node(id).prod_spec.control_mode == ProductionControlMode::None {
            return Ok(());
        }
        if !only_group || self.node(id).prod_spec.control_mode == ProductionControlMode::Fld {
            let my_guide_rate = self.production_guide_rate(id, only_group);
            if my_guide_rate == 0.0 {
                return Ok(());
            }
            let efficiency = self.node(id).efficiency_factor;
            for child in self.children(id).to_vec() {
                let child_target = target / efficiency
                    * self.production_guide_rate(child, only_group)
                    / my_guide_rate;
                self.apply_prod_group_control(child, mode, child_target, false, well_states)?;
            }
            self.node_mut(id).prod_spec.control_mode = ProductionControlMode::Fld;
        }
        Ok(())
    }

    fn apply_prod_control_at_well(
        &mut self,
        id: NodeId,
        mode: ProductionControlMode,
        target: Real,
        only_group: bool,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        let well_index = self.node(id).well_index().expect("leaf node");
        if !well_states.well(well_index).is_producer() {
            return Ok(());
        }
        if only_group && self.node(id).individual_control {
            return Ok(());
        }

        // Producers flow negative; the target arrives positive.
        let effective_target = -target / self.node(id).efficiency_factor;
        let (kind, distribution) = production_distribution(mode)?;
        self.install_group_slot(
            id,
            well_states,
            ControlSlot {
                kind,
                target: effective_target,
                distribution,
            },
        )?;
        self.node_mut(id).individual_control = false;
        info!(
            well = %self.node(id).name,
            ?mode,
            target = effective_target,
            "installed group production control"
        );
        Ok(())
    }

    /// Impose an injection target on the subtree, split by guide rates.
    pub fn apply_inj_group_control(
        &mut self,
        id: NodeId,
        mode: InjectionControlMode,
        target: Real,
        only_group: bool,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        if self.node(id).is_leaf() {
            return self.apply_inj_control_at_well(id, mode, target, only_group, well_states);
        }

        if self.node(id).inj_spec.control_mode == InjectionControlMode::None {
            return Ok(());
        }
        if !only_group || self.node(id).inj_spec.control_mode == InjectionControlMode::Fld {
            let my_guide_rate = self.injection_guide_rate(id, only_group);
            if my_guide_rate == 0.0 {
                return Ok(());
            }
            let efficiency = self.node(id).efficiency_factor;
            for child in self.children(id).to_vec() {
                let child_target = target / efficiency
                    * self.injection_guide_rate(child, only_group)
                    / my_guide_rate;
                self.apply_inj_group_control(child, mode, child_target, false, well_states)?;
            }
            self.node_mut(id).inj_spec.control_mode = InjectionControlMode::Fld;
        }
        Ok(())
    }

    fn apply_inj_control_at_well(
        &mut self,
        id: NodeId,
        mode: InjectionControlMode,
        target: Real,
        only_group: bool,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        let well_index = self.node(id).well_index().expect("leaf node");
        if !well_states.well(well_index).is_injector() {
            return Ok(());
        }
        if only_group && self.node(id).individual_control {
            return Ok(());
        }

        let effective_target = target / self.node(id).efficiency_factor;
        let (kind, distribution) = injection_distribution(mode)?;
        self.install_group_slot(
            id,
            well_states,
            ControlSlot {
                kind,
                target: effective_target,
                distribution,
            },
        )?;
        self.node_mut(id).individual_control = false;
        info!(
            well = %self.node(id).name,
            ?mode,
            target = effective_target,
            "installed group injection control"
        );
        Ok(())
    }

    /// Write a slot into the well's group-control position: appended the
    /// first time, overwritten afterwards; always selected as current.
    fn install_group_slot(
        &mut self,
        id: NodeId,
        well_states: &mut WellStates,
        slot: ControlSlot,
    ) -> GroupResult<()> {
        let (well_index, existing) = match &self.node(id).kind {
            NodeKind::Well {
                well_index,
                group_control_slot,
                ..
            } => (*well_index, *group_control_slot),
            NodeKind::Group { .. } => {
                return Err(GroupError::NodeKindMismatch {
                    name: self.node(id).name.clone(),
                    expected: "well",
                })
            }
        };

        let controls = &mut well_states.well_mut(well_index).controls;
        let index = match existing {
            Some(index) => {
                controls.set(index, slot)?;
                index
            }
            None => {
                let index = controls.push(slot);
                if let NodeKind::Well {
                    group_control_slot, ..
                } = &mut self.node_mut(id).kind
                {
                    *group_control_slot = Some(index);
                }
                index
            }
        };
        well_states
            .well_mut(well_index)
            .controls
            .set_current(index)?;
        Ok(())
    }

    /// Shut a well: disable it outright, or pin a zero surface rate and keep
    /// it open, depending on the node's shut policy.
    pub fn shut_well(&mut self, id: NodeId, well_states: &mut WellStates) -> GroupResult<()> {
        let (well_index, hard_shut) = match &self.node(id).kind {
            NodeKind::Well {
                well_index,
                hard_shut,
                ..
            } => (*well_index, *hard_shut),
            NodeKind::Group { .. } => {
                return Err(GroupError::NodeKindMismatch {
                    name: self.node(id).name.clone(),
                    expected: "well",
                })
            }
        };

        if hard_shut {
            well_states.well_mut(well_index).controls.stop();
            info!(well = %self.node(id).name, "well stopped");
        } else {
            self.install_group_slot(
                id,
                well_states,
                ControlSlot::surface_rate(0.0, [1.0, 1.0, 1.0]),
            )?;
            well_states.well_mut(well_index).controls.reopen();
            info!(well = %self.node(id).name, "well pinned to zero rate");
        }
        Ok(())
    }

    /// The well with the largest absolute rate in the given mode. Injector
    /// leaves are skipped.
    pub fn get_worst_offending(
        &self,
        id: NodeId,
        well_states: &WellStates,
        mode: ProductionControlMode,
    ) -> GroupResult<Option<(NodeId, Real)>> {
        match &self.node(id).kind {
            NodeKind::Well { well_index, .. } => {
                let well = well_states.well(*well_index);
                if well.is_injector() {
                    return Ok(None);
                }
                let rate =
                    production_rate_by_mode(&well.reservoir_rates, &well.surface_rates, mode)?;
                Ok(Some((id, rate)))
            }
            NodeKind::Group { children } => {
                let mut worst: Option<(NodeId, Real)> = None;
                for child in children {
                    if let Some((node, rate)) =
                        self.get_worst_offending(*child, well_states, mode)?
                    {
                        if worst.map_or(true, |(_, w)| w.abs() < rate.abs()) {
                            worst = Some((node, rate));
                        }
                    }
                }
                Ok(worst)
            }
        }
    }

    /// Apply REIN/VREP policies. Must run once per report step; groups whose
    /// injection mode is neither recurse so a single root call covers the
    /// tree.
    pub fn apply_explicit_reinjection_controls(
        &mut self,
        id: NodeId,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        if self.node(id).is_leaf() {
            return Ok(());
        }
        match self.node(id).inj_spec.control_mode {
            InjectionControlMode::Rein => {
                let phase = injector_phase(self.node(id).inj_spec.injector_type);
                let fraction = self.node(id).inj_spec.reinjection_fraction.ok_or_else(|| {
                    GroupError::MissingFraction {
                        group: self.node(id).name.clone(),
                        policy: "REIN",
                    }
                })?;
                // Production is negative, injection positive.
                let total_reinjected =
                    -self.total_production_flow(id, well_states, phase, RateBasis::Surface);
                let mode = if self.config.reinjection_uses_resv {
                    InjectionControlMode::Resv
                } else {
                    InjectionControlMode::Rate
                };
                self.distribute_reinjection(id, mode, total_reinjected * fraction, well_states)
            }
            InjectionControlMode::Vrep => {
                let fraction = self.node(id).inj_spec.voidage_fraction.ok_or_else(|| {
                    GroupError::MissingFraction {
                        group: self.node(id).name.clone(),
                        policy: "VREP",
                    }
                })?;
                let mut total_produced = 0.0;
                for phase in Phase::ALL {
                    total_produced +=
                        self.total_production_flow(id, well_states, phase, RateBasis::Reservoir);
                }
                let total_reinjected = -total_produced;
                self.distribute_reinjection(
                    id,
                    InjectionControlMode::Resv,
                    total_reinjected * fraction,
                    well_states,
                )
            }
            _ => {
                for child in self.children(id).to_vec() {
                    self.apply_explicit_reinjection_controls(child, well_states)?;
                }
                Ok(())
            }
        }
    }

    fn distribute_reinjection(
        &mut self,
        id: NodeId,
        mode: InjectionControlMode,
        total_target: Real,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        let my_guide_rate = self.injection_guide_rate(id, true);
        if my_guide_rate == 0.0 {
            if total_target != 0.0 {
                return Err(GroupError::ZeroGuideRate {
                    group: self.node(id).name.clone(),
                });
            }
            return Ok(());
        }
        for child in self.children(id).to_vec() {
            let child_target =
                self.injection_guide_rate(child, true) / my_guide_rate * total_target;
            self.apply_inj_group_control(child, mode, child_target, true, well_states)?;
        }
        Ok(())
    }

    /// Redistribute the group's production target among its group-controlled
    /// producer wells, subtracting what the individually-controlled ones
    /// already take.
    pub fn update_well_production_targets(
        &mut self,
        id: NodeId,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        if self.node(id).is_leaf() {
            return Ok(());
        }

        use ProductionControlMode as M;
        let mut prod_mode = self.node(id).prod_spec.control_mode;
        let mut target_rate = match prod_mode {
            M::Fld => {
                let parent = self.node(id).parent.ok_or_else(|| GroupError::MissingParent {
                    name: self.node(id).name.clone(),
                })?;
                prod_mode = self.node(parent).prod_spec.control_mode;
                let target = self.node(parent).prod_spec.target(prod_mode)?.ok_or_else(|| {
                    GroupError::MissingTarget {
                        group: self.node(parent).name.clone(),
                        mode: format!("{prod_mode:?}"),
                    }
                })?;
                target / self.node(parent).efficiency_factor
            }
            M::Lrat | M::Orat | M::Grat | M::Wrat => self
                .node(id)
                .prod_spec
                .target(prod_mode)?
                .ok_or_else(|| GroupError::MissingTarget {
                    group: self.node(id).name.clone(),
                    mode: format!("{prod_mode:?}"),
                })?,
            other => {
                return Err(GroupError::UnhandledMode {
                    layer: "well production target update",
                    mode: format!("{other:?}"),
                })
            }
        };
        target_rate /= self.node(id).efficiency_factor;

        let children = self.children(id).to_vec();

        // Wells holding their own limits cannot be redirected; what they
        // produce comes off the top.
        let mut rate_individual_control = 0.0;
        for child in &children {
            let node = self.node(*child);
            let Some(well_index) = node.well_index() else {
                continue;
            };
            if node.individual_control && well_states.well(well_index).is_producer() {
                let rate = self.well_production_rate(*child, well_states, prod_mode)?;
                rate_individual_control += (rate * node.efficiency_factor).abs();
            }
        }
        let rate_for_group_control = target_rate - rate_individual_control;

        let my_guide_rate = self.production_guide_rate(id, true);
        if my_guide_rate == 0.0 {
            let any_group_producer = children.iter().any(|c| {
                let node = self.node(*c);
                node.well_index()
                    .map(|w| !node.individual_control && well_states.well(w).is_producer())
                    .unwrap_or(false)
            });
            if any_group_producer && rate_for_group_control != 0.0 {
                return Err(GroupError::ZeroGuideRate {
                    group: self.node(id).name.clone(),
                });
            }
            return Ok(());
        }

        for child in children {
            let node = self.node(child);
            let Some(well_index) = node.well_index() else {
                continue;
            };
            if !node.individual_control && well_states.well(well_index).is_producer() {
                let share = self.production_guide_rate(child, true) / my_guide_rate;
                self.apply_prod_group_control(
                    child,
                    prod_mode,
                    share * rate_for_group_control,
                    true,
                    well_states,
                )?;
                self.node_mut(child).should_update_targets = false;
            }
        }
        Ok(())
    }

    /// Injection-side counterpart. Partitioning semantics for multi-injector
    /// groups are deliberately not invented here; this only clears the
    /// update flags on group-controlled injectors.
    pub fn update_well_injection_targets(
        &mut self,
        id: NodeId,
        well_states: &WellStates,
    ) -> GroupResult<()> {
        if self.node(id).is_leaf() {
            return Ok(());
        }
        for child in self.children(id).to_vec() {
            let node = self.node(child);
            let Some(well_index) = node.well_index() else {
                continue;
            };
            if !node.individual_control && well_states.well(well_index).is_injector() {
                self.node_mut(child).should_update_targets = false;
            }
        }
        Ok(())
    }

    /// Schedule-time top-down application of explicit production targets.
    pub fn apply_prod_group_controls(
        &mut self,
        id: NodeId,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        if self.node(id).is_leaf() {
            return Ok(());
        }
        use ProductionControlMode as M;
        let mode = self.node(id).prod_spec.control_mode;
        match mode {
            M::Orat | M::Wrat | M::Grat | M::Lrat | M::Resv => {
                let target = self.node(id).prod_spec.target(mode)?.ok_or_else(|| {
                    GroupError::MissingTarget {
                        group: self.node(id).name.clone(),
                        mode: format!("{mode:?}"),
                    }
                })?;
                let my_guide_rate = self.production_guide_rate(id, false);
                if my_guide_rate == 0.0 {
                    return Err(GroupError::ZeroGuideRate {
                        group: self.node(id).name.clone(),
                    });
                }
                for child in self.children(id).to_vec() {
                    let share = self.production_guide_rate(child, false) / my_guide_rate;
                    self.apply_prod_group_control(
                        child,
                        mode,
                        share * target,
                        false,
                        well_states,
                    )?;
                }
                Ok(())
            }
            M::Fld | M::None => {
                for child in self.children(id).to_vec() {
                    self.apply_prod_group_controls(child, well_states)?;
                }
                Ok(())
            }
            other => Err(GroupError::UnhandledMode {
                layer: "group production control application",
                mode: format!("{other:?}"),
            }),
        }
    }

    /// Schedule-time top-down application of explicit injection targets.
    pub fn apply_inj_group_controls(
        &mut self,
        id: NodeId,
        well_states: &mut WellStates,
    ) -> GroupResult<()> {
        if self.node(id).is_leaf() {
            return Ok(());
        }
        use InjectionControlMode as M;
        let mode = self.node(id).inj_spec.control_mode;
        match mode {
            M::Rate | M::Resv => {
                let target = self.node(id).inj_spec.target(mode)?.ok_or_else(|| {
                    GroupError::MissingTarget {
                        group: self.node(id).name.clone(),
                        mode: format!("{mode:?}"),
                    }
                })?;
                let my_guide_rate = self.injection_guide_rate(id, false);
                if my_guide_rate == 0.0 {
                    return Err(GroupError::ZeroGuideRate {
                        group: self.node(id).name.clone(),
                    });
                }
                let efficiency = self.node(id).efficiency_factor;
                for child in self.children(id).to_vec() {
                    let share = self.injection_guide_rate(child, false) / my_guide_rate;
                    self.apply_inj_group_control(
                        child,
                        mode,
                        share * target / efficiency,
                        true,
                        well_states,
                    )?;
                }
                Ok(())
            }
            M::Rein | M::Vrep => {
                info!(
                    group = %self.node(id).name,
                    "replacement policy active; explicit reinjection controls run per step"
                );
                Ok(())
            }
            M::Fld | M::None => {
                for child in self.children(id).to_vec() {
                    self.apply_inj_group_controls(child, well_states)?;
                }
                Ok(())
            }
            other => Err(GroupError::UnhandledMode {
                layer: "group injection control application",
                mode: format!("{other:?}"),
            }),
        }
    }

    /// Surface production rate of a leaf well in the given mode.
    fn well_production_rate(
        &self,
        id: NodeId,
        well_states: &WellStates,
        mode: ProductionControlMode,
    ) -> GroupResult<Real> {
        use ProductionControlMode as M;
        let flow = |phase| self.total_production_flow(id, well_states, phase, RateBasis::Surface);
        Ok(match mode {
            M::Lrat => flow(Phase::Oil) + flow(Phase::Water),
            M::Orat => flow(Phase::Oil),
            M::Wrat => flow(Phase::Water),
            M::Grat => flow(Phase::Gas),
            other => {
                return Err(GroupError::UnhandledMode {
                    layer: "well production rate",
                    mode: format!("{other:?}"),
                })
            }
        })
    }
}

fn dot(weights: [Real; 3], rates: [Real; 3]) -> Real {
    weights
        .iter()
        .zip(rates.iter())
        .map(|(w, r)| w * r)
        .sum()
}
