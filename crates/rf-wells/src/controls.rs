//! Well control slots.
//!
//! A well carries an ordered list of control slots; one is current. The group
//! engine appends (or overwrites) a dedicated slot when it imposes a target,
//! and records that slot's index at the tree leaf.

use rf_core::Real;

use crate::error::{WellError, WellResult};

/// Kind of constraint a control slot imposes on the top-segment equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WellControlType {
    Bhp,
    Thp,
    ReservoirRate,
    SurfaceRate,
}

/// One control slot: type, target, and the phase distribution the rate-type
/// constraints contract against (canonical water/oil/gas slots).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlSlot {
    pub kind: WellControlType,
    pub target: Real,
    pub distribution: [Real; 3],
}

impl ControlSlot {
    pub fn bhp(target: Real) -> Self {
        Self {
            kind: WellControlType::Bhp,
            target,
            distribution: [0.0; 3],
        }
    }

    pub fn thp(target: Real) -> Self {
        Self {
            kind: WellControlType::Thp,
            target,
            distribution: [0.0; 3],
        }
    }

    pub fn surface_rate(target: Real, distribution: [Real; 3]) -> Self {
        Self {
            kind: WellControlType::SurfaceRate,
            target,
            distribution,
        }
    }

    pub fn reservoir_rate(target: Real, distribution: [Real; 3]) -> Self {
        Self {
            kind: WellControlType::ReservoirRate,
            target,
            distribution,
        }
    }
}

/// The control list of one well.
#[derive(Clone, Debug)]
pub struct WellControls {
    well: String,
    slots: Vec<ControlSlot>,
    current: usize,
    open: bool,
}

impl WellControls {
    pub fn new(well: impl Into<String>, initial: ControlSlot) -> Self {
        Self {
            well: well.into(),
            slots: vec![initial],
            current: 0,
            open: true,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> WellResult<&ControlSlot> {
        self.slots.get(index).ok_or_else(|| WellError::ControlSlotOob {
            well: self.well.clone(),
            index,
            len: self.slots.len(),
        })
    }

    /// Append a slot, returning its index.
    pub fn push(&mut self, slot: ControlSlot) -> usize {
        self.slots.push(slot);
        self.slots.len() - 1
    }

    /// Overwrite an existing slot.
    pub fn set(&mut self, index: usize, slot: ControlSlot) -> WellResult<()> {
        let len = self.slots.len();
        let entry = self
            .slots
            .get_mut(index)
            .ok_or_else(|| WellError::ControlSlotOob {
                well: self.well.clone(),
                index,
                len,
            })?;
        *entry = slot;
        Ok(())
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn set_current(&mut self, index: usize) -> WellResult<()> {
        if index >= self.slots.len() {
            return Err(WellError::ControlSlotOob {
                well: self.well.clone(),
                index,
                len: self.slots.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    pub fn current(&self) -> &ControlSlot {
        &self.slots[self.current]
    }

    /// Disable the well entirely (hard stop).
    pub fn stop(&mut self) {
        self.open = false;
    }

    pub fn reopen(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_select() {
        let mut ctrls = WellControls::new("P1", ControlSlot::bhp(1.0e7));
        let idx = ctrls.push(ControlSlot::surface_rate(-0.01, [0.0, 1.0, 0.0]));
        assert_eq!(idx, 1);
        ctrls.set_current(idx).unwrap();
        assert_eq!(ctrls.current().kind, WellControlType::SurfaceRate);
    }

    #[test]
    fn overwrite_keeps_length() {
        let mut ctrls = WellControls::new("P1", ControlSlot::bhp(1.0e7));
        let idx = ctrls.push(ControlSlot::surface_rate(-0.01, [0.0, 1.0, 0.0]));
        ctrls
            .set(idx, ControlSlot::reservoir_rate(-0.02, [1.0, 1.0, 1.0]))
            .unwrap();
        assert_eq!(ctrls.len(), 2);
        assert_eq!(ctrls.slot(idx).unwrap().kind, WellControlType::ReservoirRate);
    }

    #[test]
    fn out_of_range_slot_is_error() {
        let mut ctrls = WellControls::new("P1", ControlSlot::bhp(1.0e7));
        assert!(ctrls.set_current(3).is_err());
        assert!(ctrls.slot(3).is_err());
    }
}
