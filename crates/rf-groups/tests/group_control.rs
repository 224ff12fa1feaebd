//! Group-control scenarios over a small platform tree.

use approx::assert_relative_eq;
use rf_fluids::Phase;
use rf_groups::{
    build_from_schedule, GroupControlConfig, GroupError, WellGroupTree, WellPhasesSummed,
};
use rf_schedule::{
    GroupDef, GroupInjectionDef, GroupProductionDef, InjectionControlMode, InjectorType,
    ProductionControlMode, ProductionProcedure, ScheduleStep, WellDef, WellInjectionDef,
    WellKind, WellProductionDef,
};
use rf_wells::{WellControlType, WellStates};

fn producer_def(name: &str, group: &str, guide: f64) -> WellDef {
    WellDef {
        name: name.into(),
        group: group.into(),
        kind: WellKind::Producer,
        efficiency_factor: 1.0,
        producer: Some(WellProductionDef {
            control_mode: ProductionControlMode::Bhp,
            bhp_limit_pa: Some(1.0e7),
            thp_limit_pa: None,
            oil_rate_m3_per_s: None,
            water_rate_m3_per_s: None,
            gas_rate_m3_per_s: None,
            liquid_rate_m3_per_s: None,
            reservoir_rate_m3_per_s: None,
            guide_rate: Some(guide),
        }),
        injector: None,
        segments: vec![],
    }
}

fn injector_def(name: &str, group: &str, guide: f64, efficiency: f64) -> WellDef {
    WellDef {
        name: name.into(),
        group: group.into(),
        kind: WellKind::Injector,
        efficiency_factor: efficiency,
        producer: None,
        injector: Some(WellInjectionDef {
            control_mode: InjectionControlMode::Bhp,
            injector_type: InjectorType::Water,
            bhp_limit_pa: Some(3.0e7),
            thp_limit_pa: None,
            surface_rate_m3_per_s: None,
            reservoir_rate_m3_per_s: None,
            guide_rate: Some(guide),
        }),
        segments: vec![],
    }
}

/// FIELD <- PLAT <- {P1, P2}; PLAT holds an oil target of 100 on an LRAT
/// active mode so that ORAT is an inactive-mode constraint.
fn platform_step(procedure: ProductionProcedure) -> ScheduleStep {
    ScheduleStep {
        groups: vec![
            GroupDef {
                name: "FIELD".into(),
                parent: None,
                efficiency_factor: 1.0,
                production: None,
                injection: None,
            },
            GroupDef {
                name: "PLAT".into(),
                parent: Some("FIELD".into()),
                efficiency_factor: 1.0,
                production: Some(GroupProductionDef {
                    control_mode: ProductionControlMode::Lrat,
                    procedure,
                    oil_target_m3_per_s: Some(100.0),
                    water_target_m3_per_s: None,
                    gas_target_m3_per_s: None,
                    liquid_target_m3_per_s: None,
                    reservoir_target_m3_per_s: None,
                    guide_rate: None,
                }),
                injection: None,
            },
        ],
        wells: vec![
            producer_def("P1", "PLAT", 1.0),
            producer_def("P2", "PLAT", 1.0),
        ],
    }
}

fn set_oil_production(ws: &mut WellStates, name: &str, rate: f64) {
    let idx = ws.index_of(name).unwrap();
    let well = ws.well_mut(idx);
    well.surface_rates[Phase::Oil.slot()] = rate;
    well.reservoir_rates[Phase::Oil.slot()] = rate * 1.1;
    well.bhp = 2.0e7;
}

#[test]
fn orat_violation_reapplies_group_target() {
    let (mut tree, mut ws) =
        build_from_schedule(&platform_step(ProductionProcedure::Rate), GroupControlConfig::default())
            .unwrap();
    set_oil_production(&mut ws, "P1", -80.0);
    set_oil_production(&mut ws, "P2", -30.0);

    let mut summed = WellPhasesSummed::default();
    let met = tree.conditions_met(tree.root(), &mut ws, &mut summed).unwrap();
    assert!(!met, "110 > 100 must violate the inactive ORAT target");

    // Each equal-guide producer gets 50, installed negated on a fresh slot.
    for name in ["P1", "P2"] {
        let idx = ws.index_of(name).unwrap();
        let controls = &ws.well(idx).controls;
        assert_eq!(controls.len(), 2, "bhp limit + group slot");
        let slot = controls.current();
        assert_eq!(slot.kind, WellControlType::SurfaceRate);
        assert_relative_eq!(slot.target, -50.0);
        assert_eq!(slot.distribution, [0.0, 1.0, 0.0]);

        let node = tree.find_node(name).unwrap();
        assert!(!tree.node(node).individual_control);
    }
    let plat = tree.find_node("PLAT").unwrap();
    assert_eq!(
        tree.node(plat).prod_spec.control_mode,
        ProductionControlMode::Fld
    );

    // Once the wells actually produce their shares the pass reports met.
    set_oil_production(&mut ws, "P1", -50.0);
    set_oil_production(&mut ws, "P2", -50.0);
    let mut summed = WellPhasesSummed::default();
    let met = tree.conditions_met(tree.root(), &mut ws, &mut summed).unwrap();
    assert!(met);
    assert_relative_eq!(summed.surf_prod_rates[Phase::Oil.slot()], -100.0);
}

#[test]
fn worst_offender_is_shut_under_well_procedure() {
    let config = GroupControlConfig {
        hard_stop_on_shut: false,
        ..GroupControlConfig::default()
    };
    let (mut tree, mut ws) =
        build_from_schedule(&platform_step(ProductionProcedure::Well), config).unwrap();
    set_oil_production(&mut ws, "P1", -80.0);
    set_oil_production(&mut ws, "P2", -30.0);

    let plat = tree.find_node("PLAT").unwrap();
    let (worst, rate) = tree
        .get_worst_offending(plat, &ws, ProductionControlMode::Orat)
        .unwrap()
        .expect("two producers present");
    assert_eq!(tree.node(worst).name, "P1");
    assert_relative_eq!(rate.abs(), 80.0);

    let mut summed = WellPhasesSummed::default();
    let met = tree.conditions_met(tree.root(), &mut ws, &mut summed).unwrap();
    assert!(!met);

    // Soft shut: zero surface-rate control on all phases, well kept open.
    let p1 = ws.index_of("P1").unwrap();
    let controls = &ws.well(p1).controls;
    assert!(controls.is_open());
    let slot = controls.current();
    assert_eq!(slot.kind, WellControlType::SurfaceRate);
    assert_relative_eq!(slot.target, 0.0);
    assert_eq!(slot.distribution, [1.0, 1.0, 1.0]);
}

#[test]
fn hard_shut_policy_stops_the_well() {
    let (mut tree, mut ws) =
        build_from_schedule(&platform_step(ProductionProcedure::Well), GroupControlConfig::default())
            .unwrap();
    set_oil_production(&mut ws, "P1", -80.0);
    set_oil_production(&mut ws, "P2", -30.0);

    let mut summed = WellPhasesSummed::default();
    assert!(!tree.conditions_met(tree.root(), &mut ws, &mut summed).unwrap());
    let p1 = ws.index_of("P1").unwrap();
    assert!(!ws.well(p1).controls.is_open());
}

/// FIELD <- G <- {P1 producer, I1 injector}; G replaces voidage at 100%.
fn vrep_step() -> ScheduleStep {
    ScheduleStep {
        groups: vec![
            GroupDef {
                name: "FIELD".into(),
                parent: None,
                efficiency_factor: 1.0,
                production: None,
                injection: None,
            },
            GroupDef {
                name: "G".into(),
                parent: Some("FIELD".into()),
                efficiency_factor: 1.0,
                production: None,
                injection: Some(GroupInjectionDef {
                    control_mode: InjectionControlMode::Vrep,
                    injector_type: InjectorType::Water,
                    surface_target_m3_per_s: None,
                    reservoir_target_m3_per_s: None,
                    reinjection_fraction: None,
                    voidage_fraction: Some(1.0),
                    guide_rate: None,
                }),
            },
        ],
        wells: vec![
            producer_def("P1", "G", 1.0),
            injector_def("I1", "G", 1.0, 0.8),
        ],
    }
}

#[test]
fn vrep_installs_scaled_reservoir_target() {
    let (mut tree, mut ws) = build_from_schedule(&vrep_step(), GroupControlConfig::default()).unwrap();

    // Total reservoir production of -50 split over oil and water.
    let p1 = ws.index_of("P1").unwrap();
    ws.well_mut(p1).reservoir_rates = [-10.0, -40.0, 0.0];

    // The injector is already under group control from an earlier pass.
    let i1 = tree.find_node("I1").unwrap();
    tree.node_mut(i1).individual_control = false;

    tree.apply_explicit_reinjection_controls(tree.root(), &mut ws)
        .unwrap();

    let i1_idx = ws.index_of("I1").unwrap();
    let slot = ws.well(i1_idx).controls.current();
    assert_eq!(slot.kind, WellControlType::ReservoirRate);
    // 50 reinjected, divided by the well's efficiency factor of 0.8.
    assert_relative_eq!(slot.target, 62.5);
    assert_eq!(slot.distribution, [1.0, 1.0, 1.0]);
}

#[test]
fn rein_uses_surface_rate_of_the_injected_phase() {
    let mut step = vrep_step();
    step.groups[1].injection = Some(GroupInjectionDef {
        control_mode: InjectionControlMode::Rein,
        injector_type: InjectorType::Water,
        surface_target_m3_per_s: None,
        reservoir_target_m3_per_s: None,
        reinjection_fraction: Some(0.5),
        voidage_fraction: None,
        guide_rate: None,
    });
    let (mut tree, mut ws) = build_from_schedule(&step, GroupControlConfig::default()).unwrap();

    let p1 = ws.index_of("P1").unwrap();
    ws.well_mut(p1).surface_rates = [-40.0, -80.0, 0.0];

    let i1 = tree.find_node("I1").unwrap();
    tree.node_mut(i1).individual_control = false;

    tree.apply_explicit_reinjection_controls(tree.root(), &mut ws)
        .unwrap();

    let i1_idx = ws.index_of("I1").unwrap();
    let slot = ws.well(i1_idx).controls.current();
    // Water production 40, half reinjected, over efficiency 0.8.
    assert_eq!(slot.kind, WellControlType::SurfaceRate);
    assert_relative_eq!(slot.target, 40.0 * 0.5 / 0.8);
}

#[test]
fn rein_without_fraction_is_a_configuration_error() {
    let mut step = vrep_step();
    step.groups[1].injection = Some(GroupInjectionDef {
        control_mode: InjectionControlMode::Rein,
        injector_type: InjectorType::Water,
        surface_target_m3_per_s: None,
        reservoir_target_m3_per_s: None,
        reinjection_fraction: None,
        voidage_fraction: None,
        guide_rate: None,
    });
    let (mut tree, mut ws) = build_from_schedule(&step, GroupControlConfig::default()).unwrap();
    let err = tree
        .apply_explicit_reinjection_controls(tree.root(), &mut ws)
        .unwrap_err();
    assert!(matches!(err, GroupError::MissingFraction { .. }));
}

#[test]
fn update_production_targets_respects_individual_wells() {
    let (mut tree, mut ws) =
        build_from_schedule(&platform_step(ProductionProcedure::Rate), GroupControlConfig::default())
            .unwrap();
    set_oil_production(&mut ws, "P1", -80.0);
    set_oil_production(&mut ws, "P2", -30.0);

    // Drive both wells under group control first.
    let mut summed = WellPhasesSummed::default();
    assert!(!tree.conditions_met(tree.root(), &mut ws, &mut summed).unwrap());

    // P1 trips its own limit and leaves group control at 30 sm3/s oil.
    let p1 = tree.find_node("P1").unwrap();
    tree.node_mut(p1).individual_control = true;
    set_oil_production(&mut ws, "P1", -30.0);

    // Put PLAT on explicit ORAT control for the redistribution.
    let plat = tree.find_node("PLAT").unwrap();
    tree.node_mut(plat).prod_spec.control_mode = ProductionControlMode::Orat;
    tree.update_well_production_targets(plat, &mut ws).unwrap();

    // Remaining 70 goes to the only group-controlled producer.
    let p2 = ws.index_of("P2").unwrap();
    let slot = ws.well(p2).controls.current();
    assert_eq!(slot.kind, WellControlType::SurfaceRate);
    assert_relative_eq!(slot.target, -70.0);
    let p2_node = tree.find_node("P2").unwrap();
    assert!(!tree.node(p2_node).should_update_targets);
}

fn tree_signature(tree: &WellGroupTree) -> Vec<(String, bool, f64, String, f64)> {
    let mut signature = Vec::new();
    tree.visit_depth_first(|_, node| {
        signature.push((
            node.name.clone(),
            node.is_leaf(),
            node.efficiency_factor,
            format!("{:?}", node.prod_spec.control_mode),
            node.prod_spec.guide_rate,
        ));
    });
    signature
}

#[test]
fn schedule_round_trip_rebuilds_identical_tree() {
    let step = platform_step(ProductionProcedure::Rate);
    let (tree, _) = build_from_schedule(&step, GroupControlConfig::default()).unwrap();

    let yaml = rf_schedule::to_yaml_string(&step).unwrap();
    let reloaded = rf_schedule::from_yaml_str(&yaml).unwrap();
    let (tree2, _) = build_from_schedule(&reloaded, GroupControlConfig::default()).unwrap();

    assert_eq!(tree_signature(&tree), tree_signature(&tree2));
    assert_eq!(tree.number_of_leaves(tree.root()), 2);
}
