//! Control-mode and classification enums shared across the schedule and the
//! runtime engines.

use serde::{Deserialize, Serialize};

/// Production control mode of a well or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductionControlMode {
    None,
    Orat,
    Wrat,
    Grat,
    Lrat,
    Crat,
    Resv,
    Prbl,
    Bhp,
    Thp,
    Grup,
    Fld,
}

/// Injection control mode of a well or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InjectionControlMode {
    None,
    Rate,
    Resv,
    Bhp,
    Thp,
    Rein,
    Vrep,
    Grup,
    Fld,
}

/// Response of a production group when an inactive-mode target is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductionProcedure {
    /// Report the violation and do nothing else.
    #[serde(rename = "NONE")]
    NoneP,
    /// Re-apply the violated target as a group control.
    Rate,
    /// Shut the worst-offending well.
    Well,
}

/// Phase injected by an injection well or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InjectorType {
    Water,
    Oil,
    Gas,
}

/// Producer or injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WellKind {
    Producer,
    Injector,
}

/// Flow-control device carried by a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentType {
    Regular,
    SpiralIcd,
    AutoIcd,
    Valve,
}

/// Valve device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValveStatus {
    Open,
    Shut,
}
