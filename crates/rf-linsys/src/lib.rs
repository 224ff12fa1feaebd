//! rf-linsys: block-sparse Jacobian and residual storage.
//!
//! The assembly code in rf-aquifer and rf-wells writes into these through
//! additive updates only; the sparsity pattern is whatever the writers touch.
//! Solving the system is someone else's job.

pub mod error;
pub mod global;

pub use error::{LinSysError, LinSysResult};
pub use global::{BlockJacobian, ResidualVector};
