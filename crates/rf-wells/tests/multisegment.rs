//! Multi-segment well scenarios.

use approx::assert_relative_eq;
use rf_core::Real;
use rf_fluids::{PhaseMap, SimplePvt};
use rf_schedule::{SegmentDef, SegmentDeviceDef, ValveStatus, WellKind};
use rf_wells::primary::{SPRES, WQ_TOTAL};
use rf_wells::{
    ControlSlot, ConvergenceTolerances, MultisegmentWellEval, SegmentSet, Severity, WellEvalOptions,
    WellFailureKind, WellState,
};

fn seg_def(number: u32, outlet: u32, depth: Real, device: SegmentDeviceDef) -> SegmentDef {
    SegmentDef {
        number,
        outlet,
        cross_area_m2: 0.01,
        length_m: 20.0,
        depth_m: depth,
        diameter_m: 0.1128,
        roughness_m: 1.0e-5,
        device,
    }
}

fn incompressible_pvt() -> SimplePvt {
    SimplePvt::new(
        [1000.0, 800.0, 1.0],
        [0.0; 3],
        [5.0e-4, 1.0e-3, 1.0e-5],
        1.0e5,
    )
}

fn two_segment_producer(options: WellEvalOptions) -> MultisegmentWellEval {
    let set = SegmentSet::from_defs(
        "P1",
        &[
            seg_def(1, 0, 1000.0, SegmentDeviceDef::Regular),
            seg_def(2, 1, 1020.0, SegmentDeviceDef::Regular),
        ],
    )
    .unwrap();
    MultisegmentWellEval::new("P1", WellKind::Producer, set, PhaseMap::all_three(), options).unwrap()
}

#[test]
fn converged_pressure_equation_telescopes() {
    // Set the downhole pressure to the outlet pressure plus the recorded
    // drops; re-assembly must then leave a vanishing pressure residual.
    let mut well = two_segment_producer(WellEvalOptions::default());
    let pvt = incompressible_pvt();
    let mut ws = WellState::new("P1", WellKind::Producer, ControlSlot::bhp(1.5e7));

    let p_top = 1.5e7;
    well.primary_mut().set_segment(0, -0.01, 0.2, 0.1, p_top);
    well.primary_mut().set_segment(1, -0.01, 0.2, 0.1, p_top);
    well.assemble(&pvt, &mut ws, &[]).unwrap();

    let total_drop = ws.segments.pressure_drop_hydrostatic[1]
        + ws.segments.pressure_drop_friction[1]
        + ws.segments.pressure_drop_accel[1];
    assert!(total_drop > 0.0, "producer drops should stack up positive");

    well.primary_mut()
        .set_segment(1, -0.01, 0.2, 0.1, p_top + total_drop);
    well.assemble(&pvt, &mut ws, &[]).unwrap();

    assert!(
        well.linsys().residual(1, SPRES).abs() < 1e-8,
        "pressure equation residual: {}",
        well.linsys().residual(1, SPRES)
    );
}

#[test]
fn bhp_control_equation_is_exact_at_target() {
    let mut well = two_segment_producer(WellEvalOptions::default());
    let pvt = incompressible_pvt();
    let mut ws = WellState::new("P1", WellKind::Producer, ControlSlot::bhp(1.5e7));

    well.primary_mut().set_segment(0, -0.01, 0.2, 0.1, 1.5e7);
    well.primary_mut().set_segment(1, -0.01, 0.2, 0.1, 1.52e7);
    well.assemble(&pvt, &mut ws, &[]).unwrap();

    assert_relative_eq!(well.linsys().residual(0, SPRES), 0.0);
    // dE/d(SPres(0)) = 1 on the diagonal block.
    assert_relative_eq!(well.linsys().jacobian_entry(0, 0, SPRES, SPRES), 1.0);
    assert_relative_eq!(ws.bhp, 1.5e7);
}

#[test]
fn surface_rate_control_contracts_oil_rate() {
    let mut well = two_segment_producer(WellEvalOptions::default());
    let pvt = incompressible_pvt();
    // Producer target installed negated: -0.01 sm3/s of oil.
    let mut ws = WellState::new(
        "P1",
        WellKind::Producer,
        ControlSlot::surface_rate(-0.01, [0.0, 1.0, 0.0]),
    );

    // Pure oil: fractions zero, oil closes to 1.
    well.primary_mut().set_segment(0, -0.01, 0.0, 0.0, 1.5e7);
    well.primary_mut().set_segment(1, -0.01, 0.0, 0.0, 1.52e7);
    well.assemble(&pvt, &mut ws, &[]).unwrap();

    assert!(well.linsys().residual(0, SPRES).abs() < 1e-12);
    // The control row depends on the top segment's rate variable.
    assert_relative_eq!(well.linsys().jacobian_entry(0, 0, SPRES, WQ_TOTAL), 1.0);
}

#[test]
fn shut_valve_pins_segment_rate() {
    // Deck segments 1 <- 2 <- 3; segment 3 carries a SHUT valve.
    let set = SegmentSet::from_defs(
        "P1",
        &[
            seg_def(1, 0, 1000.0, SegmentDeviceDef::Regular),
            seg_def(2, 1, 1020.0, SegmentDeviceDef::Regular),
            seg_def(
                3,
                2,
                1040.0,
                SegmentDeviceDef::Valve {
                    flow_coefficient: 0.7,
                    constriction_area_m2: 0.002,
                    status: ValveStatus::Shut,
                },
            ),
        ],
    )
    .unwrap();
    let mut well = MultisegmentWellEval::new(
        "P1",
        WellKind::Producer,
        set,
        PhaseMap::all_three(),
        WellEvalOptions::default(),
    )
    .unwrap();
    let pvt = incompressible_pvt();
    let mut ws = WellState::new("P1", WellKind::Producer, ControlSlot::bhp(1.5e7));

    well.primary_mut().set_segment(0, -0.02, 0.2, 0.1, 1.5e7);
    well.primary_mut().set_segment(1, -0.02, 0.2, 0.1, 1.52e7);
    // Leftover flow through the shut valve: must be driven to zero.
    well.primary_mut().set_segment(2, 0.05, 0.2, 0.1, 1.54e7);
    well.assemble(&pvt, &mut ws, &[]).unwrap();

    // Row 3 (index 2) encodes WQTotal = 0.
    assert_relative_eq!(well.linsys().residual(2, SPRES), 0.05);
    assert_relative_eq!(well.linsys().jacobian_entry(2, 2, SPRES, WQ_TOTAL), 1.0);
    assert_relative_eq!(well.linsys().jacobian_entry(2, 2, SPRES, SPRES), 0.0);
    assert_eq!(ws.segments.pressure_drop_friction[2], 0.0);
}

#[test]
fn convergence_report_classifies_severities() {
    let mut well = two_segment_producer(WellEvalOptions::default());
    let pvt = incompressible_pvt();
    let mut ws = WellState::new("P1", WellKind::Producer, ControlSlot::bhp(1.5e7));

    // Grossly unbalanced state: large mass residuals on purpose.
    well.primary_mut().set_segment(0, -0.5, 0.2, 0.1, 1.5e7);
    well.primary_mut().set_segment(1, -0.01, 0.2, 0.1, 2.0e7);
    well.assemble(&pvt, &mut ws, &[]).unwrap();

    let b_avg = [1.0, 1.0, 1.0];
    let tol = ConvergenceTolerances::default();
    let report = well.get_well_convergence(&ws, &b_avg, &tol, false);
    assert!(!report.converged());
    assert!(report
        .failures()
        .iter()
        .all(|f| f.severity == Severity::Normal));

    // Shrinking the hard cap reclassifies the worst rows as TooLarge.
    let strict = ConvergenceTolerances {
        max_residual_allowed: 1.0e-9,
        ..tol
    };
    let report = well.get_well_convergence(&ws, &b_avg, &strict, false);
    assert!(report.has_severe_failure());
    assert!(report
        .failures()
        .iter()
        .any(|f| matches!(f.kind, WellFailureKind::MassBalance { .. })
            && f.severity == Severity::TooLarge));
}

#[test]
fn relaxed_tolerance_suppresses_marginal_failures() {
    let mut well = two_segment_producer(WellEvalOptions::default());
    let pvt = incompressible_pvt();
    let mut ws = WellState::new("P1", WellKind::Producer, ControlSlot::bhp(1.5e7));

    well.primary_mut().set_segment(0, -0.01, 0.2, 0.1, 1.5e7);
    well.primary_mut().set_segment(1, -0.012, 0.2, 0.1, 1.52e7);
    well.assemble(&pvt, &mut ws, &[]).unwrap();

    let b_avg = [1.0, 1.0, 1.0];
    // Residuals sit between the strict and relaxed flux tolerances.
    let tol = ConvergenceTolerances {
        tolerance_wells: 1.0e-6,
        relaxed_tolerance_flow: 1.0e3,
        tolerance_pressure_ms_wells: 1.0e9,
        relaxed_tolerance_pressure: 1.0e9,
        max_residual_allowed: 1.0e12,
    };
    let strict_report = well.get_well_convergence(&ws, &b_avg, &tol, false);
    let relaxed_report = well.get_well_convergence(&ws, &b_avg, &tol, true);
    let mass_failures = |r: &rf_wells::ConvergenceReport| {
        r.failures()
            .iter()
            .filter(|f| matches!(f.kind, WellFailureKind::MassBalance { .. }))
            .count()
    };
    assert!(mass_failures(&strict_report) > 0);
    assert_eq!(mass_failures(&relaxed_report), 0);
}

#[test]
fn residual_measure_counts_only_exceedances() {
    let mut well = two_segment_producer(WellEvalOptions::default());
    let pvt = incompressible_pvt();
    let mut ws = WellState::new("P1", WellKind::Producer, ControlSlot::bhp(1.5e7));

    well.primary_mut().set_segment(0, -0.01, 0.2, 0.1, 1.5e7);
    well.primary_mut().set_segment(1, -0.01, 0.2, 0.1, 2.0e7);
    well.assemble(&pvt, &mut ws, &[]).unwrap();

    let b_avg = [1.0, 1.0, 1.0];
    let (finite, residuals) = well.get_finite_well_residuals(&b_avg);
    assert!(finite);

    let tol = ConvergenceTolerances::default();
    let measure = well.residual_measure(&ws, &residuals, &tol);
    assert!(measure > 0.0);

    // With huge tolerances nothing exceeds and the measure vanishes.
    let loose = ConvergenceTolerances {
        tolerance_wells: 1.0e12,
        tolerance_pressure_ms_wells: 1.0e12,
        ..tol
    };
    assert_eq!(well.residual_measure(&ws, &residuals, &loose), 0.0);
}
