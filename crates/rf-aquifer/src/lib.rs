//! rf-aquifer: the Carter-Tracy analytical aquifer.
//!
//! A Carter-Tracy aquifer is a time-convolution boundary source: water flows
//! across a set of reservoir boundary faces at a rate controlled by a
//! dimensionless influence function of dimensionless time. The engine here
//! computes per-connection inflow rates as AD quantities and writes them into
//! the water-component rows of the global residual and Jacobian.

pub mod carter_tracy;
pub mod connections;
pub mod error;
pub mod influence;

pub use carter_tracy::{CarterTracyAquifer, CarterTracyParams};
pub use connections::{AquiferConnections, ConnectionEntry, ConnectionGeometry};
pub use error::{AquiferError, AquiferResult};
pub use influence::{polynomial_fit, InfluenceTable, LinearFit};
