//! Convergence reporting for well equations.

use rf_core::Real;

/// How badly an equation family missed its tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Normal,
    TooLarge,
    NotANumber,
}

/// Which equation family failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WellFailureKind {
    MassBalance { component: usize },
    Pressure,
    ControlEquation,
}

#[derive(Clone, Debug)]
pub struct WellFailure {
    pub kind: WellFailureKind,
    pub severity: Severity,
    pub well: String,
}

/// Collected failures for one convergence check.
#[derive(Clone, Debug, Default)]
pub struct ConvergenceReport {
    failures: Vec<WellFailure>,
}

impl ConvergenceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_well_failed(&mut self, failure: WellFailure) {
        self.failures.push(failure);
    }

    pub fn converged(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[WellFailure] {
        &self.failures
    }

    /// Whether any failure is unrecoverable by plain iteration (NaN or
    /// over the hard residual cap), signalling the outer loop to cut the step.
    pub fn has_severe_failure(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.severity != Severity::Normal)
    }
}

/// Tolerances used by the multi-segment convergence check.
#[derive(Clone, Copy, Debug)]
pub struct ConvergenceTolerances {
    /// Hard cap; residuals beyond it are `TooLarge`.
    pub max_residual_allowed: Real,
    /// Flux (and rate-control) tolerance.
    pub tolerance_wells: Real,
    /// Relaxed flux tolerance used when the outer loop allows it.
    pub relaxed_tolerance_flow: Real,
    /// Pressure-equation tolerance for segment pressure rows.
    pub tolerance_pressure_ms_wells: Real,
    /// Relaxed pressure tolerance.
    pub relaxed_tolerance_pressure: Real,
}

impl Default for ConvergenceTolerances {
    fn default() -> Self {
        Self {
            max_residual_allowed: 1.0e7,
            tolerance_wells: 1.0e-4,
            relaxed_tolerance_flow: 1.0e-3,
            tolerance_pressure_ms_wells: 1.0e3,
            relaxed_tolerance_pressure: 1.0e4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_converged() {
        let report = ConvergenceReport::new();
        assert!(report.converged());
        assert!(!report.has_severe_failure());
    }

    #[test]
    fn severe_failures_detected() {
        let mut report = ConvergenceReport::new();
        report.set_well_failed(WellFailure {
            kind: WellFailureKind::MassBalance { component: 0 },
            severity: Severity::Normal,
            well: "P1".into(),
        });
        assert!(!report.converged());
        assert!(!report.has_severe_failure());
        report.set_well_failed(WellFailure {
            kind: WellFailureKind::Pressure,
            severity: Severity::NotANumber,
            well: "P1".into(),
        });
        assert!(report.has_severe_failure());
    }
}
