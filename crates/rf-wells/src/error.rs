use rf_fluids::FluidError;
use thiserror::Error;

pub type WellResult<T> = Result<T, WellError>;

#[derive(Error, Debug)]
pub enum WellError {
    #[error("Well '{well}': {what}")]
    InvalidSegmentTable { well: String, what: String },

    #[error("Well '{well}': segment {segment} is not an ICD or valve segment")]
    NotAnIcdSegment { well: String, segment: u32 },

    #[error("Well '{well}' has no control slots")]
    NoControls { well: String },

    #[error("Control slot {index} out of range for well '{well}' ({len} slots)")]
    ControlSlotOob {
        well: String,
        index: usize,
        len: usize,
    },

    #[error("Unsupported phase configuration: multi-segment wells need water, oil and gas active")]
    UnsupportedPhaseConfig,

    #[error("Unknown well '{name}'")]
    UnknownWell { name: String },

    #[error(transparent)]
    Fluid(#[from] FluidError),
}
