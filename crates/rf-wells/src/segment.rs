//! Segment geometry and topology.
//!
//! Segments are indexed 0-based with index 0 the top segment (deck number 1).
//! The outlet relation forms a tree rooted at the top; inlets are derived.

use rf_core::Real;
use rf_schedule::{SegmentDef, SegmentDeviceDef, SegmentType, ValveStatus};

use crate::error::{WellError, WellResult};

/// Spiral ICD parameters.
#[derive(Clone, Copy, Debug)]
pub struct SpiralIcd {
    pub strength: Real,
    pub density_calibration: Real,
}

/// Autonomous ICD parameters.
#[derive(Clone, Copy, Debug)]
pub struct AutoIcd {
    pub strength: Real,
    pub density_calibration: Real,
    pub rate_exponent: Real,
}

/// Valve parameters.
#[derive(Clone, Copy, Debug)]
pub struct Valve {
    pub flow_coefficient: Real,
    pub constriction_area: Real,
    pub status: ValveStatus,
}

/// Flow-control device of a segment.
#[derive(Clone, Copy, Debug)]
pub enum SegmentDevice {
    Regular,
    SpiralIcd(SpiralIcd),
    AutoIcd(AutoIcd),
    Valve(Valve),
}

impl SegmentDevice {
    pub fn segment_type(&self) -> SegmentType {
        match self {
            SegmentDevice::Regular => SegmentType::Regular,
            SegmentDevice::SpiralIcd(_) => SegmentType::SpiralIcd,
            SegmentDevice::AutoIcd(_) => SegmentType::AutoIcd,
            SegmentDevice::Valve(_) => SegmentType::Valve,
        }
    }

    fn from_def(def: &SegmentDeviceDef) -> Self {
        match def {
            SegmentDeviceDef::Regular => SegmentDevice::Regular,
            SegmentDeviceDef::SpiralIcd {
                strength,
                density_calibration_kg_per_m3,
            } => SegmentDevice::SpiralIcd(SpiralIcd {
                strength: *strength,
                density_calibration: *density_calibration_kg_per_m3,
            }),
            SegmentDeviceDef::AutoIcd {
                strength,
                density_calibration_kg_per_m3,
                rate_exponent,
            } => SegmentDevice::AutoIcd(AutoIcd {
                strength: *strength,
                density_calibration: *density_calibration_kg_per_m3,
                rate_exponent: *rate_exponent,
            }),
            SegmentDeviceDef::Valve {
                flow_coefficient,
                constriction_area_m2,
                status,
            } => SegmentDevice::Valve(Valve {
                flow_coefficient: *flow_coefficient,
                constriction_area: *constriction_area_m2,
                status: *status,
            }),
        }
    }
}

/// One well segment.
#[derive(Clone, Debug)]
pub struct Segment {
    /// Deck segment number (1-based; 1 = top).
    pub number: u32,
    pub cross_area: Real,
    pub length: Real,
    pub depth: Real,
    pub diameter: Real,
    pub roughness: Real,
    pub device: SegmentDevice,
}

/// The ordered segment list with resolved topology.
#[derive(Clone, Debug)]
pub struct SegmentSet {
    segments: Vec<Segment>,
    outlet: Vec<Option<usize>>,
    inlets: Vec<Vec<usize>>,
}

impl SegmentSet {
    /// Build from a validated segment table. Segments are sorted by deck
    /// number so that index 0 is the top segment.
    pub fn from_defs(well: &str, defs: &[SegmentDef]) -> WellResult<Self> {
        let invalid = |what: String| WellError::InvalidSegmentTable {
            well: well.to_string(),
            what,
        };
        if defs.is_empty() {
            return Err(invalid("empty segment table".into()));
        }

        let mut sorted: Vec<&SegmentDef> = defs.iter().collect();
        sorted.sort_by_key(|d| d.number);
        if sorted[0].number != 1 {
            return Err(invalid("segment table lacks top segment 1".into()));
        }

        let index_of = |number: u32| sorted.iter().position(|d| d.number == number);

        let mut segments = Vec::with_capacity(sorted.len());
        let mut outlet = Vec::with_capacity(sorted.len());
        for def in &sorted {
            segments.push(Segment {
                number: def.number,
                cross_area: def.cross_area_m2,
                length: def.length_m,
                depth: def.depth_m,
                diameter: def.diameter_m,
                roughness: def.roughness_m,
                device: SegmentDevice::from_def(&def.device),
            });
            if def.number == 1 {
                outlet.push(None);
            } else {
                let out = index_of(def.outlet).ok_or_else(|| {
                    invalid(format!(
                        "segment {} references unknown outlet {}",
                        def.number, def.outlet
                    ))
                })?;
                outlet.push(Some(out));
            }
        }

        let mut inlets = vec![Vec::new(); segments.len()];
        for (idx, out) in outlet.iter().enumerate() {
            if let Some(out) = out {
                inlets[*out].push(idx);
            }
        }

        let set = Self {
            segments,
            outlet,
            inlets,
        };
        set.check_rooted(well)?;
        Ok(set)
    }

    /// Every outlet chain must reach the top segment.
    fn check_rooted(&self, well: &str) -> WellResult<()> {
        for start in 0..self.len() {
            let mut cursor = start;
            let mut hops = 0;
            while let Some(out) = self.outlet[cursor] {
                cursor = out;
                hops += 1;
                if hops > self.len() {
                    return Err(WellError::InvalidSegmentTable {
                        well: well.to_string(),
                        what: format!(
                            "outlet chain from segment {} does not reach the top",
                            self.segments[start].number
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, idx: usize) -> &Segment {
        &self.segments[idx]
    }

    /// Outlet segment index; `None` only for the top segment.
    pub fn outlet_index(&self, idx: usize) -> Option<usize> {
        self.outlet[idx]
    }

    pub fn inlets(&self, idx: usize) -> &[usize] {
        &self.inlets[idx]
    }

    /// Depth increase from the outlet down to this segment.
    pub fn depth_diff_to_outlet(&self, idx: usize) -> Real {
        match self.outlet[idx] {
            Some(out) => self.segments[idx].depth - self.segments[out].depth,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(number: u32, outlet: u32, depth: Real) -> SegmentDef {
        SegmentDef {
            number,
            outlet,
            cross_area_m2: 0.01,
            length_m: 20.0,
            depth_m: depth,
            diameter_m: 0.11,
            roughness_m: 1.0e-5,
            device: SegmentDeviceDef::Regular,
        }
    }

    #[test]
    fn builds_branched_topology() {
        // 1 <- 2 <- 3 and 2 <- 4: two inlets at segment 2.
        let set = SegmentSet::from_defs(
            "P1",
            &[def(1, 0, 1000.0), def(2, 1, 1020.0), def(3, 2, 1040.0), def(4, 2, 1035.0)],
        )
        .unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.outlet_index(0), None);
        assert_eq!(set.outlet_index(1), Some(0));
        assert_eq!(set.inlets(1), &[2, 3]);
        assert_eq!(set.depth_diff_to_outlet(1), 20.0);
    }

    #[test]
    fn missing_top_segment_rejected() {
        let err = SegmentSet::from_defs("P1", &[def(2, 1, 1000.0)]).unwrap_err();
        assert!(matches!(err, WellError::InvalidSegmentTable { .. }));
    }

    #[test]
    fn unknown_outlet_rejected() {
        let err =
            SegmentSet::from_defs("P1", &[def(1, 0, 1000.0), def(3, 7, 1020.0)]).unwrap_err();
        assert!(matches!(err, WellError::InvalidSegmentTable { .. }));
    }
}
