use rf_fluids::FluidError;
use thiserror::Error;

pub type AquiferResult<T> = Result<T, AquiferError>;

#[derive(Error, Debug)]
pub enum AquiferError {
    #[error("Influence table needs at least {need} samples, got {got}")]
    InsufficientSamples { got: usize, need: usize },

    #[error("Influence table dimensionless times must be strictly increasing")]
    NonMonotonicTable,

    #[error("Least-squares fit failed: {what}")]
    SingularFit { what: &'static str },

    #[error("Aquifer {aquifer_id} has no connection entries")]
    EmptyConnections { aquifer_id: u32 },

    #[error("Aquifer {aquifer_id} has no faces matching its connection directions")]
    NoConnectedFaces { aquifer_id: u32 },

    #[error(
        "Influence fit invalid for aquifer {aquifer_id}: PItd - tD*PItd' = {denominator} <= 0"
    )]
    InfluenceFitInvalid { aquifer_id: u32, denominator: f64 },

    #[error(transparent)]
    Fluid(#[from] FluidError),
}
