//! Robot descriptors generated for one composition run

use crate::error::ComposeError;
use serde::Serialize;
use std::fmt;

/// Prefix of generated robot names; robot `i` is named `robot{i}`
pub const ROBOT_NAME_PREFIX: &str = "robot";

/// X offset of the first robot, keeps it clear of the scenery at the world origin
pub const SPAWN_X_OFFSET: f64 = 4.0;

/// Spawn height above the ground plane
pub const SPAWN_Z: f64 = 0.01;

/// Largest fleet one composition accepts
pub const MAX_ROBOT_COUNT: i64 = 1000;

/// World-space spawn coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpawnPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl fmt::Display for SpawnPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            format_coordinate(self.x),
            format_coordinate(self.y),
            format_coordinate(self.z)
        )
    }
}

/// One robot to spawn and navigate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotDescriptor {
    pub name: String,
    pub spawn_pose: SpawnPose,
}

impl RobotDescriptor {
    /// Descriptor for robot number `index`; a pure function of the index
    pub fn from_index(index: usize) -> Self {
        Self {
            name: format!("{}{}", ROBOT_NAME_PREFIX, index),
            spawn_pose: SpawnPose {
                x: SPAWN_X_OFFSET + index as f64,
                y: 0.0,
                z: SPAWN_Z,
            },
        }
    }

    /// Name of the launch argument holding this robot's navigation parameter file
    pub fn param_file_arg(&self) -> String {
        format!("{}_param_file", self.name)
    }

    pub fn spawn_unit_id(&self) -> String {
        format!("spawn/{}", self.name)
    }

    pub fn navigation_unit_id(&self) -> String {
        format!("navigation/{}", self.name)
    }
}

/// Generate `count` robot descriptors with distinct names and spawn poses
pub fn generate_robot_descriptors(count: i64) -> Result<Vec<RobotDescriptor>, ComposeError> {
    if count < 0 {
        return Err(ComposeError::InvalidArgument(format!(
            "robot count must be non-negative, got {}",
            count
        )));
    }
    if count > MAX_ROBOT_COUNT {
        return Err(ComposeError::InvalidArgument(format!(
            "robot count must be at most {}, got {}",
            MAX_ROBOT_COUNT, count
        )));
    }
    let count = count as usize;

    Ok((0..count).map(RobotDescriptor::from_index).collect())
}

/// Format a coordinate the way the spawner expects it (`4.0`, `0.01`)
pub fn format_coordinate(value: f64) -> String {
    format!("{:?}", value)
}
