//! rf-schedule: declarative per-step simulation schedule.
//!
//! A [`ScheduleStep`] describes the group hierarchy, the wells with their
//! control properties, and each well's segment table. The group tree and the
//! multi-segment wells are *built* from these definitions each schedule step;
//! nothing here holds runtime state.

pub mod error;
pub mod io;
pub mod schema;
pub mod types;
pub mod validate;

pub use error::{ScheduleError, ScheduleResult};
pub use io::{from_yaml_str, load_yaml, save_yaml, to_yaml_string};
pub use schema::*;
pub use types::*;
pub use validate::validate_step;
