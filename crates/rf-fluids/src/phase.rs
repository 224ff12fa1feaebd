//! Phase bookkeeping for the black-oil system.

use crate::error::{FluidError, FluidResult};

/// The three black-oil phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Water,
    Oil,
    Gas,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Water, Phase::Oil, Phase::Gas];

    /// Canonical storage slot (water, oil, gas).
    pub fn slot(self) -> usize {
        match self {
            Phase::Water => 0,
            Phase::Oil => 1,
            Phase::Gas => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Water => "water",
            Phase::Oil => "oil",
            Phase::Gas => "gas",
        }
    }
}

/// Which phases are active and where each lives in compressed phase arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseMap {
    used: [bool; 3],
}

impl PhaseMap {
    pub fn new(water: bool, oil: bool, gas: bool) -> Self {
        Self {
            used: [water, oil, gas],
        }
    }

    pub fn all_three() -> Self {
        Self::new(true, true, true)
    }

    pub fn oil_water() -> Self {
        Self::new(true, true, false)
    }

    pub fn is_active(&self, phase: Phase) -> bool {
        self.used[phase.slot()]
    }

    pub fn num_phases(&self) -> usize {
        self.used.iter().filter(|u| **u).count()
    }

    /// Position of a phase in compressed per-well phase arrays.
    pub fn pos(&self, phase: Phase) -> FluidResult<usize> {
        if !self.is_active(phase) {
            return Err(FluidError::InactivePhase {
                phase: phase.name(),
            });
        }
        Ok(self.used[..phase.slot()].iter().filter(|u| **u).count())
    }

    pub fn active(&self) -> impl Iterator<Item = Phase> + '_ {
        Phase::ALL.into_iter().filter(|p| self.is_active(*p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_compressed() {
        let pm = PhaseMap::oil_water();
        assert_eq!(pm.num_phases(), 2);
        assert_eq!(pm.pos(Phase::Water).unwrap(), 0);
        assert_eq!(pm.pos(Phase::Oil).unwrap(), 1);
        assert!(pm.pos(Phase::Gas).is_err());
    }

    #[test]
    fn all_three_ordering() {
        let pm = PhaseMap::all_three();
        assert_eq!(pm.pos(Phase::Water).unwrap(), 0);
        assert_eq!(pm.pos(Phase::Oil).unwrap(), 1);
        assert_eq!(pm.pos(Phase::Gas).unwrap(), 2);
    }
}
