//! rf-wells: multi-segment wells.
//!
//! A multi-segment well is a tree of segments rooted at the wellhead. Each
//! segment carries four primary variables (total rate, water fraction, gas
//! fraction, pressure); the evaluator assembles per-segment mass-balance and
//! pressure equations into a well-local block system and reports convergence
//! per equation family. Control slots installed by the group engine select
//! the equation assembled for the top segment.

pub mod controls;
pub mod convergence;
pub mod drops;
pub mod error;
pub mod eval;
pub mod linsys;
pub mod primary;
pub mod segment;
pub mod state;

pub use controls::{ControlSlot, WellControlType, WellControls};
pub use convergence::{
    ConvergenceReport, ConvergenceTolerances, Severity, WellFailure, WellFailureKind,
};
pub use error::{WellError, WellResult};
pub use eval::{MultisegmentWellEval, WellEvalOptions};
pub use linsys::WellLinSys;
pub use primary::PrimaryVariables;
pub use segment::{Segment, SegmentDevice, SegmentSet};
pub use state::{SegmentRecords, WellState, WellStates};
