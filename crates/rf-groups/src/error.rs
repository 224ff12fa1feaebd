use rf_schedule::ScheduleError;
use rf_wells::WellError;
use thiserror::Error;

pub type GroupResult<T> = Result<T, GroupError>;

#[derive(Error, Debug)]
pub enum GroupError {
    /// A control mode reached a layer that has no semantics for it. These are
    /// programmer errors surfaced as values, not panics.
    #[error("No {layer} semantics for control mode {mode}")]
    UnhandledMode { layer: &'static str, mode: String },

    #[error("Group '{group}' cannot split its target: aggregate guide rate is zero")]
    ZeroGuideRate { group: String },

    #[error("Group '{group}' has no target set for its active mode {mode}")]
    MissingTarget { group: String, mode: String },

    #[error("Group '{group}' uses {policy} but no fraction is configured")]
    MissingFraction {
        group: String,
        policy: &'static str,
    },

    #[error("THP limit checks are not implemented (well '{well}')")]
    ThpUnsupported { well: String },

    #[error("Node '{name}' is not a {expected}")]
    NodeKindMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("Unknown node '{name}' in group tree")]
    UnknownNode { name: String },

    #[error("Group tree has no root above node '{name}'")]
    MissingParent { name: String },

    #[error(transparent)]
    Well(#[from] WellError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
