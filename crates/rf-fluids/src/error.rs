use rf_core::CellId;
use thiserror::Error;

pub type FluidResult<T> = Result<T, FluidError>;

#[derive(Error, Debug)]
pub enum FluidError {
    #[error("Unknown cell {cell} in facade")]
    UnknownCell { cell: CellId },

    #[error("Phase {phase} not active in this fluid system")]
    InactivePhase { phase: &'static str },

    #[error("Unknown PVT table {table}")]
    UnknownPvtTable { table: usize },

    #[error("Invalid face tag {tag} (expected 0..=5)")]
    InvalidFaceTag { tag: u8 },

    #[error("Non-physical fluid state: {what}")]
    NonPhysical { what: &'static str },
}
