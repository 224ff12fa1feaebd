//! rf-core: stable foundation for resflow.
//!
//! Contains:
//! - units (uom SI types + constructors for the configuration boundary)
//! - numeric (Real + tolerances + step timer + float helpers)
//! - ids (stable compact IDs for grid cells and tree nodes)
//! - ad (forward-mode AD scalar carried through all assembled physics)
//! - error (shared error types)

pub mod ad;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use ad::Ad;
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
