//! Schedule validation: referential integrity and structural invariants.

use std::collections::{HashMap, HashSet};

use crate::error::{ScheduleError, ScheduleResult};
use crate::schema::{ScheduleStep, SegmentDef, WellDef};
use crate::types::WellKind;

fn fail(what: impl Into<String>) -> ScheduleError {
    ScheduleError::Validation { what: what.into() }
}

/// Validate one schedule step before any engine is built from it.
pub fn validate_step(step: &ScheduleStep) -> ScheduleResult<()> {
    let mut group_names = HashSet::new();
    for g in &step.groups {
        if !group_names.insert(g.name.as_str()) {
            return Err(fail(format!("Duplicate group name '{}'", g.name)));
        }
        if !(g.efficiency_factor > 0.0 && g.efficiency_factor <= 1.0) {
            return Err(fail(format!(
                "Group '{}' efficiency factor {} outside (0, 1]",
                g.name, g.efficiency_factor
            )));
        }
    }

    let roots: Vec<_> = step.groups.iter().filter(|g| g.parent.is_none()).collect();
    if roots.len() != 1 {
        return Err(fail(format!(
            "Expected exactly one root group, found {}",
            roots.len()
        )));
    }

    for g in &step.groups {
        if let Some(parent) = &g.parent {
            if !group_names.contains(parent.as_str()) {
                return Err(fail(format!(
                    "Group '{}' references unknown parent '{}'",
                    g.name, parent
                )));
            }
            if parent == &g.name {
                return Err(fail(format!("Group '{}' is its own parent", g.name)));
            }
        }
    }

    // Parent chains must reach the root (no cycles).
    let by_name: HashMap<&str, &Option<String>> = step
        .groups
        .iter()
        .map(|g| (g.name.as_str(), &g.parent))
        .collect();
    for g in &step.groups {
        let mut seen = HashSet::new();
        let mut cursor = g.name.as_str();
        while let Some(Some(parent)) = by_name.get(cursor) {
            if !seen.insert(cursor) {
                return Err(fail(format!("Group parent cycle through '{}'", g.name)));
            }
            cursor = parent.as_str();
        }
    }

    let mut well_names = HashSet::new();
    for w in &step.wells {
        if !well_names.insert(w.name.as_str()) {
            return Err(fail(format!("Duplicate well name '{}'", w.name)));
        }
        if !group_names.contains(w.group.as_str()) {
            return Err(fail(format!(
                "Well '{}' references unknown group '{}'",
                w.name, w.group
            )));
        }
        validate_well(w)?;
    }

    Ok(())
}

fn validate_well(well: &WellDef) -> ScheduleResult<()> {
    match well.kind {
        WellKind::Producer => {
            if well.producer.is_none() {
                return Err(fail(format!(
                    "Producer '{}' has no production properties",
                    well.name
                )));
            }
        }
        WellKind::Injector => {
            if well.injector.is_none() {
                return Err(fail(format!(
                    "Injector '{}' has no injection properties",
                    well.name
                )));
            }
        }
    }
    if !(well.efficiency_factor > 0.0 && well.efficiency_factor <= 1.0) {
        return Err(fail(format!(
            "Well '{}' efficiency factor {} outside (0, 1]",
            well.name, well.efficiency_factor
        )));
    }
    if !well.segments.is_empty() {
        validate_segments(&well.name, &well.segments)?;
    }
    Ok(())
}

fn validate_segments(well: &str, segments: &[SegmentDef]) -> ScheduleResult<()> {
    let numbers: HashSet<u32> = segments.iter().map(|s| s.number).collect();
    if numbers.len() != segments.len() {
        return Err(fail(format!("Well '{well}' has duplicate segment numbers")));
    }
    if !numbers.contains(&1) {
        return Err(fail(format!("Well '{well}' segment table lacks segment 1")));
    }

    for s in segments {
        if s.number == 1 {
            if s.outlet != 0 {
                return Err(fail(format!(
                    "Well '{well}' top segment must have outlet 0, got {}",
                    s.outlet
                )));
            }
        } else if !numbers.contains(&s.outlet) {
            return Err(fail(format!(
                "Well '{well}' segment {} references unknown outlet {}",
                s.number, s.outlet
            )));
        }
        if s.cross_area_m2 <= 0.0 || s.diameter_m <= 0.0 {
            return Err(fail(format!(
                "Well '{well}' segment {} has non-positive geometry",
                s.number
            )));
        }
    }

    // Outlet chains must terminate at segment 1.
    let outlet_of: HashMap<u32, u32> = segments.iter().map(|s| (s.number, s.outlet)).collect();
    for s in segments {
        let mut seen = HashSet::new();
        let mut cursor = s.number;
        while cursor != 1 {
            if !seen.insert(cursor) {
                return Err(fail(format!(
                    "Well '{well}' segment outlet cycle through {}",
                    s.number
                )));
            }
            cursor = outlet_of[&cursor];
        }
    }

    Ok(())
}
