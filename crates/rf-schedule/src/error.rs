use thiserror::Error;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Schedule validation failed: {what}")]
    Validation { what: String },
}
