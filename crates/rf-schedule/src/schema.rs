//! Schedule schema definitions.
//!
//! Quantities are stored in plain SI floats with unit-suffixed field names;
//! unset targets are `None` and never a sentinel value.

use serde::{Deserialize, Serialize};

use crate::types::{
    InjectionControlMode, InjectorType, ProductionControlMode, ProductionProcedure, ValveStatus,
    WellKind,
};

fn default_efficiency() -> f64 {
    1.0
}

fn default_procedure() -> ProductionProcedure {
    ProductionProcedure::NoneP
}

/// Everything the engines need for one report step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleStep {
    pub groups: Vec<GroupDef>,
    pub wells: Vec<WellDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupDef {
    pub name: String,
    /// Parent group name; `None` marks the root group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default = "default_efficiency")]
    pub efficiency_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<GroupProductionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection: Option<GroupInjectionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupProductionDef {
    pub control_mode: ProductionControlMode,
    #[serde(default = "default_procedure")]
    pub procedure: ProductionProcedure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oil_target_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_target_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_target_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid_target_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservoir_target_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupInjectionDef {
    pub control_mode: InjectionControlMode,
    pub injector_type: InjectorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_target_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservoir_target_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinjection_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voidage_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellDef {
    pub name: String,
    /// Name of the containing group.
    pub group: String,
    pub kind: WellKind,
    #[serde(default = "default_efficiency")]
    pub efficiency_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<WellProductionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injector: Option<WellInjectionDef>,
    /// Segment table; empty for a standard (non-segmented) well.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<SegmentDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellProductionDef {
    pub control_mode: ProductionControlMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bhp_limit_pa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thp_limit_pa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oil_rate_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_rate_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_rate_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid_rate_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservoir_rate_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellInjectionDef {
    pub control_mode: InjectionControlMode,
    pub injector_type: InjectorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bhp_limit_pa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thp_limit_pa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_rate_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservoir_rate_m3_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_rate: Option<f64>,
}

/// One row of a well's segment table.
///
/// Segment numbers are 1-based as in the input deck; segment 1 is the top
/// segment and its `outlet` is 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentDef {
    pub number: u32,
    #[serde(default)]
    pub outlet: u32,
    pub cross_area_m2: f64,
    pub length_m: f64,
    pub depth_m: f64,
    pub diameter_m: f64,
    pub roughness_m: f64,
    #[serde(default)]
    pub device: SegmentDeviceDef,
}

/// Device-specific segment parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum SegmentDeviceDef {
    #[default]
    Regular,
    SpiralIcd {
        /// Pressure-drop strength coefficient.
        strength: f64,
        /// Density used when the device was calibrated.
        density_calibration_kg_per_m3: f64,
    },
    AutoIcd {
        strength: f64,
        density_calibration_kg_per_m3: f64,
        /// Exponent applied to the volume-rate ratio.
        rate_exponent: f64,
    },
    Valve {
        /// Dimensionless flow coefficient of the open valve.
        flow_coefficient: f64,
        /// Constriction cross-section.
        constriction_area_m2: f64,
        status: ValveStatus,
    },
}
