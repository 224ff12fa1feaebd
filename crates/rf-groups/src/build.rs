//! Building the tree and the initial well-control state from a schedule step.

use std::collections::HashMap;

use rf_core::NodeId;
use rf_schedule::{
    validate_step, GroupDef, InjectionControlMode, ProductionControlMode, ScheduleStep, WellDef,
    WellKind,
};
use rf_wells::{ControlSlot, WellControlType, WellState, WellStates};

use crate::engine::GroupControlConfig;
use crate::error::{GroupError, GroupResult};
use crate::node::WellGroupTree;
use crate::spec::{InjectionSpec, ProductionSpec};

fn production_spec(def: &WellDef) -> ProductionSpec {
    match &def.producer {
        Some(p) => ProductionSpec {
            control_mode: p.control_mode,
            procedure: rf_schedule::ProductionProcedure::NoneP,
            oil_max_rate: p.oil_rate_m3_per_s,
            water_max_rate: p.water_rate_m3_per_s,
            gas_max_rate: p.gas_rate_m3_per_s,
            liquid_max_rate: p.liquid_rate_m3_per_s,
            reservoir_max_rate: p.reservoir_rate_m3_per_s,
            bhp_limit: p.bhp_limit_pa,
            thp_limit: p.thp_limit_pa,
            guide_rate: p.guide_rate.unwrap_or(0.0),
        },
        // Injectors carry a zero production guide rate.
        None => ProductionSpec::default(),
    }
}

fn injection_spec(def: &WellDef) -> InjectionSpec {
    match &def.injector {
        Some(i) => InjectionSpec {
            control_mode: i.control_mode,
            injector_type: i.injector_type,
            surface_max_rate: i.surface_rate_m3_per_s,
            reservoir_max_rate: i.reservoir_rate_m3_per_s,
            bhp_limit: i.bhp_limit_pa,
            thp_limit: i.thp_limit_pa,
            reinjection_fraction: None,
            voidage_fraction: None,
            guide_rate: i.guide_rate.unwrap_or(0.0),
        },
        None => InjectionSpec::default(),
    }
}

fn group_production_spec(def: &GroupDef) -> ProductionSpec {
    match &def.production {
        Some(p) => ProductionSpec {
            control_mode: p.control_mode,
            procedure: p.procedure,
            oil_max_rate: p.oil_target_m3_per_s,
            water_max_rate: p.water_target_m3_per_s,
            gas_max_rate: p.gas_target_m3_per_s,
            liquid_max_rate: p.liquid_target_m3_per_s,
            reservoir_max_rate: p.reservoir_target_m3_per_s,
            bhp_limit: None,
            thp_limit: None,
            guide_rate: p.guide_rate.unwrap_or(0.0),
        },
        None => ProductionSpec::default(),
    }
}

fn group_injection_spec(def: &GroupDef) -> InjectionSpec {
    match &def.injection {
        Some(i) => InjectionSpec {
            control_mode: i.control_mode,
            injector_type: i.injector_type,
            surface_max_rate: i.surface_target_m3_per_s,
            reservoir_max_rate: i.reservoir_target_m3_per_s,
            bhp_limit: None,
            thp_limit: None,
            reinjection_fraction: i.reinjection_fraction,
            voidage_fraction: i.voidage_fraction,
            guide_rate: i.guide_rate.unwrap_or(0.0),
        },
        None => InjectionSpec::default(),
    }
}

fn missing(well: &str, what: &str) -> GroupError {
    GroupError::MissingTarget {
        group: well.to_string(),
        mode: what.to_string(),
    }
}

/// Control slot matching the well's declared control mode.
fn initial_producer_slot(def: &WellDef, spec: &ProductionSpec) -> GroupResult<Option<ControlSlot>> {
    use ProductionControlMode as M;
    let p = def.producer.as_ref().expect("validated producer");
    Ok(match p.control_mode {
        M::Bhp => Some(ControlSlot::bhp(
            spec.bhp_limit.ok_or_else(|| missing(&def.name, "BHP"))?,
        )),
        M::Thp => Some(ControlSlot::thp(
            spec.thp_limit.ok_or_else(|| missing(&def.name, "THP"))?,
        )),
        M::Orat => Some(ControlSlot::surface_rate(
            -spec.oil_max_rate.ok_or_else(|| missing(&def.name, "ORAT"))?,
            [0.0, 1.0, 0.0],
        )),
        M::Wrat => Some(ControlSlot::surface_rate(
            -spec
                .water_max_rate
                .ok_or_else(|| missing(&def.name, "WRAT"))?,
            [1.0, 0.0, 0.0],
        )),
        M::Grat => Some(ControlSlot::surface_rate(
            -spec.gas_max_rate.ok_or_else(|| missing(&def.name, "GRAT"))?,
            [0.0, 0.0, 1.0],
        )),
        M::Lrat => Some(ControlSlot::surface_rate(
            -spec
                .liquid_max_rate
                .ok_or_else(|| missing(&def.name, "LRAT"))?,
            [1.0, 1.0, 0.0],
        )),
        M::Resv => Some(ControlSlot::reservoir_rate(
            -spec
                .reservoir_max_rate
                .ok_or_else(|| missing(&def.name, "RESV"))?,
            [1.0, 1.0, 1.0],
        )),
        M::None | M::Grup | M::Fld => None,
        other => {
            return Err(GroupError::UnhandledMode {
                layer: "well production control",
                mode: format!("{other:?}"),
            })
        }
    })
}

fn initial_injector_slot(def: &WellDef, spec: &InjectionSpec) -> GroupResult<Option<ControlSlot>> {
    use InjectionControlMode as M;
    let i = def.injector.as_ref().expect("validated injector");
    Ok(match i.control_mode {
        M::Bhp => Some(ControlSlot::bhp(
            spec.bhp_limit.ok_or_else(|| missing(&def.name, "BHP"))?,
        )),
        M::Thp => Some(ControlSlot::thp(
            spec.thp_limit.ok_or_else(|| missing(&def.name, "THP"))?,
        )),
        M::Rate => Some(ControlSlot::surface_rate(
            spec.surface_max_rate
                .ok_or_else(|| missing(&def.name, "RATE"))?,
            [1.0, 1.0, 1.0],
        )),
        M::Resv => Some(ControlSlot::reservoir_rate(
            spec.reservoir_max_rate
                .ok_or_else(|| missing(&def.name, "RESV"))?,
            [1.0, 1.0, 1.0],
        )),
        M::None | M::Grup | M::Fld | M::Rein | M::Vrep => None,
    })
}

/// Build the tree and the flat well-state array for one schedule step.
///
/// Each well starts under individual control on the slot matching its
/// declared mode; a BHP-limit slot is appended when a limit exists and is
/// not already the active control.
pub fn build_from_schedule(
    step: &ScheduleStep,
    config: GroupControlConfig,
) -> GroupResult<(WellGroupTree, WellStates)> {
    validate_step(step)?;

    let root_def = step
        .groups
        .iter()
        .find(|g| g.parent.is_none())
        .expect("validated single root");

    let mut tree = WellGroupTree::with_root(
        &root_def.name,
        root_def.efficiency_factor,
        group_production_spec(root_def),
        group_injection_spec(root_def),
        config,
    );

    let mut ids: HashMap<&str, NodeId> = HashMap::new();
    ids.insert(root_def.name.as_str(), tree.root());

    // Parents are acyclic after validation, so repeated passes terminate.
    let mut remaining: Vec<&GroupDef> =
        step.groups.iter().filter(|g| g.parent.is_some()).collect();
    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|def| {
            let parent_name = def.parent.as_deref().expect("non-root group");
            match ids.get(parent_name) {
                Some(parent) => {
                    let id = tree
                        .add_group(
                            *parent,
                            &def.name,
                            def.efficiency_factor,
                            group_production_spec(def),
                            group_injection_spec(def),
                        )
                        .expect("parent is a group");
                    ids.insert(def.name.as_str(), id);
                    false
                }
                None => true,
            }
        });
        debug_assert!(remaining.len() < before, "validated parents always resolve");
    }

    let mut wells = Vec::with_capacity(step.wells.len());
    for (well_index, def) in step.wells.iter().enumerate() {
        let prod_spec = production_spec(def);
        let inj_spec = injection_spec(def);

        let mode_slot = match def.kind {
            WellKind::Producer => initial_producer_slot(def, &prod_spec)?,
            WellKind::Injector => initial_injector_slot(def, &inj_spec)?,
        };
        let bhp_limit = match def.kind {
            WellKind::Producer => prod_spec.bhp_limit,
            WellKind::Injector => inj_spec.bhp_limit,
        };

        let initial = match (mode_slot, bhp_limit) {
            (Some(slot), _) => slot,
            (None, Some(limit)) => ControlSlot::bhp(limit),
            // No mode target and no limit: hold zero rate until a group
            // control arrives.
            (None, None) => ControlSlot::surface_rate(0.0, [1.0, 1.0, 1.0]),
        };
        let mut state = WellState::new(&def.name, def.kind, initial);
        if let Some(limit) = bhp_limit {
            if state.controls.current().kind != WellControlType::Bhp {
                state.controls.push(ControlSlot::bhp(limit));
            }
        }
        wells.push(state);

        let parent = ids
            .get(def.group.as_str())
            .copied()
            .ok_or_else(|| GroupError::UnknownNode {
                name: def.group.clone(),
            })?;
        tree.add_well(
            parent,
            &def.name,
            def.efficiency_factor,
            prod_spec,
            inj_spec,
            well_index,
            config.hard_stop_on_shut,
        )?;
    }

    Ok((tree, WellStates::new(wells)))
}
