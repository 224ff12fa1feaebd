//! One full reporting step: aquifer + multi-segment well + group tree.

use approx::assert_relative_eq;
use rf_aquifer::{
    AquiferConnections, CarterTracyAquifer, CarterTracyParams, ConnectionEntry, InfluenceTable,
};
use rf_core::units::{m, m2, pa};
use rf_core::StepTimer;
use rf_fluids::{
    CellFace, FaceDir, InMemoryCellStates, InMemoryGeometry, PhaseMap, SimplePvt,
};
use rf_groups::{build_from_schedule, GroupControlConfig};
use rf_linsys::{BlockJacobian, ResidualVector};
use rf_schedule::{
    GroupDef, ProductionControlMode, ScheduleStep, SegmentDef, SegmentDeviceDef, WellDef,
    WellKind, WellProductionDef,
};
use rf_sim::SimCore;
use rf_wells::{ConvergenceTolerances, MultisegmentWellEval, SegmentSet, WellEvalOptions};

const NUM_PV: usize = 3;

fn schedule() -> ScheduleStep {
    ScheduleStep {
        groups: vec![GroupDef {
            name: "FIELD".into(),
            parent: None,
            efficiency_factor: 1.0,
            production: None,
            injection: None,
        }],
        wells: vec![WellDef {
            name: "P1".into(),
            group: "FIELD".into(),
            kind: WellKind::Producer,
            efficiency_factor: 1.0,
            producer: Some(WellProductionDef {
                control_mode: ProductionControlMode::Bhp,
                bhp_limit_pa: Some(1.5e7),
                thp_limit_pa: None,
                oil_rate_m3_per_s: None,
                water_rate_m3_per_s: None,
                gas_rate_m3_per_s: None,
                liquid_rate_m3_per_s: None,
                reservoir_rate_m3_per_s: None,
                guide_rate: Some(1.0),
            }),
            injector: None,
            segments: vec![
                SegmentDef {
                    number: 1,
                    outlet: 0,
                    cross_area_m2: 0.01,
                    length_m: 0.0,
                    depth_m: 1000.0,
                    diameter_m: 0.1128,
                    roughness_m: 1.0e-5,
                    device: SegmentDeviceDef::Regular,
                },
                SegmentDef {
                    number: 2,
                    outlet: 1,
                    cross_area_m2: 0.01,
                    length_m: 25.0,
                    depth_m: 1025.0,
                    diameter_m: 0.1128,
                    roughness_m: 1.0e-5,
                    device: SegmentDeviceDef::Regular,
                },
            ],
        }],
    }
}

#[test]
fn full_reporting_step_flows_through_all_owners() {
    // Reservoir cell feeding the aquifer connection.
    let mut geometry = InMemoryGeometry::new();
    let cell = geometry.push_cell(
        1000.0,
        vec![CellFace {
            dir: FaceDir::XPlus,
            area: 100.0,
        }],
    );
    let p_res = 2.0e7;
    let mut states = InMemoryCellStates::new(NUM_PV);
    states.set_cell_values(cell, p_res, 1000.0, 5.0e-4, 350.0);

    let pvt = SimplePvt::new([1000.0, 800.0, 1.0], [0.0; 3], [1.0, 1.0e-3, 1.0e-5], 1.0e5);

    // Aquifer engineered for a small positive inflow.
    let params = CarterTracyParams {
        aquifer_id: 1,
        influence_table_id: 1,
        pvt_table_id: 0,
        porosity: 1.0,
        total_compressibility: 1.0,
        inner_radius: m(1.0),
        permeability: m2(0.01),
        thickness: m(1.0),
        angle_fraction: 1.0,
        datum_depth: m(1000.0),
        c1: 1.0,
        c2: 1.0,
        initial_pressure: Some(pa(p_res + 1.0e5)),
    };
    let connections =
        AquiferConnections::new(1, vec![ConnectionEntry::new(cell, FaceDir::XPlus)]).unwrap();
    let table = InfluenceTable::new(vec![0.0, 10.0], vec![0.0, 5.0]).unwrap();
    let aquifer = CarterTracyAquifer::new(
        params,
        &connections,
        &table,
        PhaseMap::all_three(),
        &states,
        &pvt,
        &geometry,
    )
    .unwrap();

    // Well and tree from the same declarative step.
    let step = schedule();
    let (tree, well_states) =
        build_from_schedule(&step, GroupControlConfig::default()).unwrap();
    let segments = SegmentSet::from_defs("P1", &step.wells[0].segments).unwrap();
    let mut well = MultisegmentWellEval::new(
        "P1",
        WellKind::Producer,
        segments,
        PhaseMap::all_three(),
        WellEvalOptions::default(),
    )
    .unwrap();
    // Top segment sits at the BHP target; the lower segment carries the
    // hydrostatic column.
    well.primary_mut().set_segment(0, -0.01, 0.2, 0.1, 1.5e7);
    well.primary_mut().set_segment(1, -0.01, 0.2, 0.1, 1.52e7);

    let mut core = SimCore {
        aquifers: vec![aquifer],
        wells: vec![well],
        tree,
        well_states,
        tolerances: ConvergenceTolerances::default(),
    };

    let timer = StepTimer::new(0.0, 10.0);
    let mut jacobian = BlockJacobian::new(NUM_PV, NUM_PV);
    let mut residual = ResidualVector::new(NUM_PV);

    core.begin_step(&states).unwrap();
    let report = core
        .assemble(
            &states,
            &pvt,
            &timer,
            &mut jacobian,
            &mut residual,
            &[1.0, 1.0, 1.0],
            &[],
        )
        .unwrap();

    // Aquifer influx landed in the water row of the connected cell.
    assert!(residual.get(cell, 0) < 0.0, "influx subtracts from the residual");
    assert!(jacobian.get(cell, cell, 0, 0) > 0.0);

    // No group targets configured, so the tree is satisfied.
    assert!(report.group_conditions_met);
    assert_eq!(report.well_reports.len(), 1);

    // BHP control equation holds exactly at the target.
    assert_relative_eq!(core.wells[0].linsys().residual(0, 3), 0.0);
    assert_relative_eq!(core.well_states.well(0).bhp, 1.5e7);

    core.end_step(&timer).unwrap();
    assert!(core.aquifers[0].cumulative_flux() > 0.0);
}
