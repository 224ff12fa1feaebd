//! Externally visible well state.
//!
//! `WellStates` is the shared object the evaluators write into and the group
//! engine reads rates from and installs controls on. Phase arrays use the
//! canonical water/oil/gas slots; producers carry negative rates.

use rf_core::Real;
use rf_fluids::Phase;
use rf_schedule::WellKind;

use crate::controls::{ControlSlot, WellControls};
use crate::error::{WellError, WellResult};

/// Per-segment reported values (filled during assembly).
#[derive(Clone, Debug, Default)]
pub struct SegmentRecords {
    pub pressure: Vec<Real>,
    pub pressure_drop_hydrostatic: Vec<Real>,
    pub pressure_drop_friction: Vec<Real>,
    pub pressure_drop_accel: Vec<Real>,
}

impl SegmentRecords {
    pub fn resize(&mut self, num_segments: usize) {
        self.pressure.resize(num_segments, 0.0);
        self.pressure_drop_hydrostatic.resize(num_segments, 0.0);
        self.pressure_drop_friction.resize(num_segments, 0.0);
        self.pressure_drop_accel.resize(num_segments, 0.0);
    }
}

/// Runtime state of one well.
#[derive(Clone, Debug)]
pub struct WellState {
    pub name: String,
    pub kind: WellKind,
    pub controls: WellControls,
    pub bhp: Real,
    /// Surface volume rates by canonical phase slot; producers negative.
    pub surface_rates: [Real; 3],
    /// Reservoir volume rates by canonical phase slot; producers negative.
    pub reservoir_rates: [Real; 3],
    pub segments: SegmentRecords,
}

impl WellState {
    pub fn new(name: impl Into<String>, kind: WellKind, initial_control: ControlSlot) -> Self {
        let name = name.into();
        Self {
            controls: WellControls::new(name.clone(), initial_control),
            name,
            kind,
            bhp: 0.0,
            surface_rates: [0.0; 3],
            reservoir_rates: [0.0; 3],
            segments: SegmentRecords::default(),
        }
    }

    pub fn is_producer(&self) -> bool {
        self.kind == WellKind::Producer
    }

    pub fn is_injector(&self) -> bool {
        self.kind == WellKind::Injector
    }

    pub fn surface_rate(&self, phase: Phase) -> Real {
        self.surface_rates[phase.slot()]
    }

    pub fn reservoir_rate(&self, phase: Phase) -> Real {
        self.reservoir_rates[phase.slot()]
    }
}

/// All wells of the run, indexed by the flat well order of the schedule.
#[derive(Clone, Debug, Default)]
pub struct WellStates {
    wells: Vec<WellState>,
}

impl WellStates {
    pub fn new(wells: Vec<WellState>) -> Self {
        Self { wells }
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    pub fn well(&self, index: usize) -> &WellState {
        &self.wells[index]
    }

    pub fn well_mut(&mut self, index: usize) -> &mut WellState {
        &mut self.wells[index]
    }

    pub fn index_of(&self, name: &str) -> WellResult<usize> {
        self.wells
            .iter()
            .position(|w| w.name == name)
            .ok_or_else(|| WellError::UnknownWell {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &WellState> {
        self.wells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let states = WellStates::new(vec![
            WellState::new("P1", WellKind::Producer, ControlSlot::bhp(1.0e7)),
            WellState::new("I1", WellKind::Injector, ControlSlot::bhp(3.0e7)),
        ]);
        assert_eq!(states.index_of("I1").unwrap(), 1);
        assert!(states.index_of("X9").is_err());
        assert!(states.well(0).is_producer());
    }
}
