//! YAML load/save for schedule steps.

use std::path::Path;

use crate::error::ScheduleResult;
use crate::schema::ScheduleStep;

pub fn to_yaml_string(step: &ScheduleStep) -> ScheduleResult<String> {
    Ok(serde_yaml::to_string(step)?)
}

pub fn from_yaml_str(text: &str) -> ScheduleResult<ScheduleStep> {
    Ok(serde_yaml::from_str(text)?)
}

pub fn save_yaml(path: &Path, step: &ScheduleStep) -> ScheduleResult<()> {
    let text = to_yaml_string(step)?;
    std::fs::write(path, text)?;
    Ok(())
}

pub fn load_yaml(path: &Path) -> ScheduleResult<ScheduleStep> {
    let text = std::fs::read_to_string(path)?;
    from_yaml_str(&text)
}
