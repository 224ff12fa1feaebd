//! rf-groups: the hierarchical well-group control tree.
//!
//! Groups own wells and other groups; rate and pressure targets propagate
//! down the tree split by guide rates, and the recursive constraint pass
//! (`conditions_met`) mutates well-control state when a target is exceeded.
//! The tree is rebuilt from the declarative schedule every schedule step.

pub mod build;
pub mod engine;
pub mod error;
pub mod node;
pub mod rates;
pub mod spec;

pub use build::build_from_schedule;
pub use engine::GroupControlConfig;
pub use error::{GroupError, GroupResult};
pub use node::{NodeKind, WellGroupTree};
pub use rates::{injection_rate_by_mode, production_rate_by_mode, RateBasis, WellPhasesSummed};
pub use spec::{InjectionSpec, ProductionSpec};
