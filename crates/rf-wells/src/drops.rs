//! Segment pressure-drop kernels.
//!
//! All kernels share one sign convention: the returned drop enters the
//! pressure equation `P(seg) - drop - P(outlet) = 0`, so it is positive for
//! flow in the producer direction (mass rate toward the outlet negative) and
//! negative for injection. Densities handed in must already be upwinded, with
//! foreign derivatives cleared by the caller.

use rf_core::{Ad, Real};

use crate::segment::{AutoIcd, Segment, SpiralIcd, Valve};

/// Mass rates below this are treated as no flow.
const EPSILON_MDOT: Real = 1.0e-10;

const LN10: Real = core::f64::consts::LN_10;

fn flow_sign(mass_rate: &Ad) -> Real {
    if mass_rate.value() >= 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Kinetic energy per volume: `0.5 * mdot^2 / (rho * A^2)`.
pub fn velocity_head(area: Real, mass_rate: &Ad, density: &Ad) -> Ad {
    mass_rate.powi(2) / (density.clone() * (2.0 * area * area))
}

/// Hydrostatic drop across a segment: `rho * g * (depth(seg) - depth(outlet))`.
pub fn hydrostatic_drop(density: &Ad, depth_diff: Real, gravity: Real) -> Ad {
    density.clone() * gravity * depth_diff
}

/// Darcy-Weisbach friction factor on AD Reynolds number: laminar below 2300,
/// Swamee-Jain above.
fn friction_factor(reynolds: &Ad, roughness: Real, diameter: Real) -> Ad {
    if reynolds.value() < 2300.0 {
        64.0 / reynolds.clone()
    } else {
        let e_d = roughness / diameter;
        let arg = reynolds.powf(-0.9) * 5.74 + e_d / 3.7;
        let log10 = arg.ln() / LN10;
        0.25 / log10.powi(2)
    }
}

/// Frictional drop along a segment of the given geometry.
pub fn friction_pressure_loss(segment: &Segment, mass_rate: &Ad, density: &Ad, viscosity: &Ad) -> Ad {
    let n = mass_rate.num_derivatives();
    if mass_rate.value().abs() < EPSILON_MDOT {
        return Ad::constant(0.0, n);
    }
    let area = segment.cross_area;
    let mdot_abs = mass_rate.abs();
    let reynolds = mdot_abs.clone() * (segment.diameter / area) / viscosity.clone();
    let f = friction_factor(&reynolds, segment.roughness, segment.diameter);

    // 0.5 * f * (L/D) * mdot^2 / (rho * A^2)
    let magnitude = f
        * mdot_abs.powi(2)
        * (0.5 * segment.length / (segment.diameter * area * area))
        / density.clone();
    magnitude * flow_sign(mass_rate)
}

/// Spiral ICD drop: strength-scaled square of the calibrated volume rate.
pub fn spiral_icd_drop(icd: &SpiralIcd, mass_rate: &Ad, density: &Ad) -> Ad {
    let q_cal = mass_rate.clone() / icd.density_calibration;
    let magnitude =
        q_cal.powi(2) * (density.clone() / icd.density_calibration) * icd.strength;
    magnitude * flow_sign(mass_rate)
}

/// Autonomous ICD drop: like the spiral ICD with a free rate exponent.
pub fn auto_icd_drop(icd: &AutoIcd, mass_rate: &Ad, density: &Ad) -> Ad {
    let n = mass_rate.num_derivatives();
    if mass_rate.value().abs() < EPSILON_MDOT {
        return Ad::constant(0.0, n);
    }
    let q_cal = (mass_rate.clone() / icd.density_calibration).abs();
    let magnitude =
        q_cal.powf(icd.rate_exponent) * (density.clone() / icd.density_calibration) * icd.strength;
    magnitude * flow_sign(mass_rate)
}

/// Head loss through an open valve constriction.
pub fn valve_drop(valve: &Valve, mass_rate: &Ad, density: &Ad) -> Ad {
    let ac = valve.constriction_area;
    let cv = valve.flow_coefficient;
    // 0.5 * rho * v_c^2 / cv^2 with v_c = mdot / (rho * Ac)
    let magnitude = mass_rate.powi(2) / (density.clone() * (2.0 * ac * ac * cv * cv));
    magnitude * flow_sign(mass_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentDevice;
    use approx::assert_relative_eq;

    fn test_segment() -> Segment {
        Segment {
            number: 2,
            cross_area: 0.01,
            length: 100.0,
            depth: 1020.0,
            diameter: 0.1128,
            roughness: 1.0e-5,
            device: SegmentDevice::Regular,
        }
    }

    #[test]
    fn velocity_head_value() {
        let mdot = Ad::constant(-2.0, 4);
        let rho = Ad::constant(800.0, 4);
        let vh = velocity_head(0.01, &mdot, &rho);
        assert_relative_eq!(vh.value(), 0.5 * 4.0 / (800.0 * 1.0e-4));
    }

    #[test]
    fn hydrostatic_scales_with_depth() {
        let rho = Ad::constant(1000.0, 4);
        let dp = hydrostatic_drop(&rho, 20.0, 9.81);
        assert_relative_eq!(dp.value(), 1000.0 * 9.81 * 20.0);
    }

    #[test]
    fn friction_zero_without_flow() {
        let seg = test_segment();
        let mdot = Ad::constant(0.0, 4);
        let rho = Ad::constant(800.0, 4);
        let mu = Ad::constant(1.0e-3, 4);
        assert_eq!(friction_pressure_loss(&seg, &mdot, &rho, &mu).value(), 0.0);
    }

    #[test]
    fn friction_positive_for_producer_flow() {
        let seg = test_segment();
        // Producer direction: mass toward the outlet is negative.
        let mdot = Ad::variable(-5.0, 0, 4);
        let rho = Ad::constant(800.0, 4);
        let mu = Ad::constant(1.0e-3, 4);
        let dp = friction_pressure_loss(&seg, &mdot, &rho, &mu);
        assert!(dp.value() > 0.0);
        // Loss grows with |mdot|, so d(dp)/d(mdot) < 0 on the producer branch.
        assert!(dp.derivative(0) < 0.0);
    }

    #[test]
    fn friction_laminar_matches_closed_form() {
        let seg = test_segment();
        // Tiny rate keeps Re < 2300.
        let mdot_v = -1.0e-3;
        let mdot = Ad::constant(mdot_v, 4);
        let rho = Ad::constant(800.0, 4);
        let mu_v = 1.0e-3;
        let mu = Ad::constant(mu_v, 4);
        let dp = friction_pressure_loss(&seg, &mdot, &rho, &mu);

        let re = mdot_v.abs() * seg.diameter / (seg.cross_area * mu_v);
        assert!(re < 2300.0);
        let f = 64.0 / re;
        let expect = 0.5 * f * seg.length / seg.diameter * mdot_v * mdot_v
            / (800.0 * seg.cross_area * seg.cross_area);
        assert_relative_eq!(dp.value(), expect, max_relative = 1e-12);
    }

    #[test]
    fn valve_drop_signs() {
        let valve = Valve {
            flow_coefficient: 0.7,
            constriction_area: 0.002,
            status: rf_schedule::ValveStatus::Open,
        };
        let rho = Ad::constant(800.0, 4);
        let producer = valve_drop(&valve, &Ad::constant(-1.0, 4), &rho);
        let injector = valve_drop(&valve, &Ad::constant(1.0, 4), &rho);
        assert!(producer.value() > 0.0);
        assert!(injector.value() < 0.0);
        assert_relative_eq!(producer.value(), -injector.value());
    }

    #[test]
    fn spiral_icd_quadratic_in_rate() {
        let icd = SpiralIcd {
            strength: 1.0e8,
            density_calibration: 1000.0,
        };
        let rho = Ad::constant(1000.0, 4);
        let d1 = spiral_icd_drop(&icd, &Ad::constant(-1.0, 4), &rho).value();
        let d2 = spiral_icd_drop(&icd, &Ad::constant(-2.0, 4), &rho).value();
        assert_relative_eq!(d2 / d1, 4.0, max_relative = 1e-12);
    }
}
