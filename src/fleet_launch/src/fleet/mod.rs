//! Multi-robot fleet composition

pub mod compose;
pub mod config;
pub mod descriptions;
pub mod robot;

pub use compose::{build_navigation_group, build_spawn_unit, compose, Composition, FleetComposer};
pub use config::{GatingMode, ParamFileTemplate, ShareDir, SharedConfiguration, Simulator};
pub use robot::{generate_robot_descriptors, RobotDescriptor, SpawnPose, MAX_ROBOT_COUNT};
