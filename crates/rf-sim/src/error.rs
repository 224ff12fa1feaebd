//! Error types for step orchestration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Aquifer error: {0}")]
    Aquifer(#[from] rf_aquifer::AquiferError),

    #[error("Well error: {0}")]
    Well(#[from] rf_wells::WellError),

    #[error("Group control error: {0}")]
    Group(#[from] rf_groups::GroupError),

    #[error("Fluid facade error: {0}")]
    Fluid(#[from] rf_fluids::FluidError),
}

pub type SimResult<T> = Result<T, SimError>;
