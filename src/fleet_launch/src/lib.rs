//! fleet_launch library

pub mod condition;
pub mod error;
pub mod evaluator;
pub mod fleet;
pub mod ir;
pub mod record;
pub mod substitution;

use error::{ComposeError, ConfigError, FleetError};
use evaluator::evaluate_program;
use fleet::{ShareDir, SharedConfiguration};
use ir::LaunchProgram;
use record::RecordJson;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Build the shared configuration: the YAML file at `path` (or the
/// defaults), rooted at `share_dir` if given, then the `key:=value`
/// overrides naming shared settings.
pub fn load_configuration(
    path: Option<&Path>,
    share_dir: Option<PathBuf>,
    overrides: &[(String, String)],
) -> Result<SharedConfiguration, ConfigError> {
    let mut config = match path {
        Some(path) => SharedConfiguration::load(path, share_dir)?,
        None => SharedConfiguration::with_share(share_dir.map(ShareDir::Path).unwrap_or_default()),
    };

    for (key, value) in overrides {
        if !config.apply_override(key, value)? {
            log::debug!("Launch argument {} is not a shared setting", key);
        }
    }
    Ok(config)
}

/// Unevaluated launch description for `count` robots
pub fn compose_program(
    count: i64,
    config: &SharedConfiguration,
) -> Result<LaunchProgram, ComposeError> {
    Ok(fleet::compose(count, config)?.into_program())
}

/// Compose `count` robots and evaluate the result into launcher records
pub fn launch_record(
    count: i64,
    config: &SharedConfiguration,
    launch_args: HashMap<String, String>,
) -> Result<RecordJson, FleetError> {
    let program = compose_program(count, config)?;
    Ok(evaluate_program(&program, launch_args)?)
}
