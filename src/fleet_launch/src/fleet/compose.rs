//! Fleet launch composition
//!
//! Turns a robot count and a `SharedConfiguration` into an ordered list of
//! launch units: the simulator, one parameter-file declaration per robot, one
//! spawn unit per robot and one navigation group per robot. Spawn units
//! require the simulator; a navigation group requires its robot's spawn unit.

use crate::{
    condition::flag_str,
    error::ComposeError,
    fleet::{
        config::{GatingMode, SharedConfiguration},
        descriptions::{
            bringup_description, declare, include, launch_file, spawn_description, FLEET_LAUNCH,
            GAZEBO_PLUGINS, BRINGUP_LAUNCH, RVIZ_LAUNCH, SPAWN_LAUNCH,
        },
        robot::{format_coordinate, generate_robot_descriptors, RobotDescriptor},
    },
    ir::{Action, ActionKind, Condition, Expr, IncludeArg, LaunchProgram, Output, ProcessDecl},
};

/// Id of the shared simulator unit
pub const SIMULATOR_UNIT: &str = "simulator";

/// Result of one composition run
#[derive(Debug, Clone)]
pub struct Composition {
    /// Shared launch argument declarations
    pub arguments: Vec<Action>,
    /// Ordered launch units
    pub units: Vec<Action>,
    pub robots: Vec<RobotDescriptor>,
}

impl Composition {
    /// Full launch description: argument declarations followed by the units
    pub fn into_program(self) -> LaunchProgram {
        let mut body = self.arguments;
        body.extend(self.units);
        LaunchProgram::new(FLEET_LAUNCH, body)
    }
}

/// Whether a gated unit is emitted, and under which condition
enum Gate {
    Omit,
    Emit(Option<Condition>),
}

pub struct FleetComposer<'a> {
    config: &'a SharedConfiguration,
}

impl<'a> FleetComposer<'a> {
    pub fn new(config: &'a SharedConfiguration) -> Self {
        Self { config }
    }

    /// Value bound for a shared setting: the configured value itself, or a
    /// reference to the launch argument when evaluation is deferred
    fn setting(&self, name: &str, value: &Expr) -> Expr {
        match self.config.gating {
            GatingMode::Static => value.clone(),
            GatingMode::Deferred => Expr::var(name),
        }
    }

    fn flag(&self, name: &str, value: bool) -> Expr {
        self.setting(name, &Expr::literal(flag_str(value)))
    }

    fn gate(&self, name: &str, enabled: bool) -> Gate {
        match self.config.gating {
            GatingMode::Static if enabled => Gate::Emit(None),
            GatingMode::Static => Gate::Omit,
            GatingMode::Deferred => Gate::Emit(Some(Condition::If(Expr::var(name)))),
        }
    }

    /// Declarations of the shared launch arguments, defaulting to the configured values
    pub fn shared_arguments(&self) -> Vec<Action> {
        let config = self.config;
        vec![
            declare(
                "simulator",
                Some(config.simulator.as_str().into()),
                "The simulator to use (gazebo or gzserver)",
            ),
            declare(
                "world",
                Some(config.world.clone()),
                "Full path to world file to load",
            ),
            declare(
                "map",
                Some(config.map.clone()),
                "Full path to map file to load",
            ),
            declare(
                "use_rviz",
                Some(flag_str(config.use_rviz).into()),
                "Whether to start RVIZ",
            ),
            declare(
                "autostart",
                Some(flag_str(config.autostart).into()),
                "Automatically startup the stacks",
            ),
            declare(
                "rviz_config",
                Some(config.rviz_config.clone()),
                "Full path to the RVIZ config file to use.",
            ),
            declare(
                "use_robot_state_pub",
                Some(flag_str(config.use_robot_state_pub).into()),
                "Whether to start the robot state publisher",
            ),
            declare(
                "log_settings",
                Some(flag_str(config.log_settings).into()),
                "Whether to log the settings of every robot",
            ),
        ]
    }

    /// Start the simulator with the plugins providing the spawn service
    pub fn build_simulator_unit(&self) -> Action {
        let mut cmd = vec![
            self.setting("simulator", &self.config.simulator.as_str().into()),
            "--verbose".into(),
        ];
        for plugin in GAZEBO_PLUGINS {
            cmd.push("-s".into());
            cmd.push(plugin.into());
        }
        cmd.push(self.setting("world", &self.config.world));

        Action::new(ActionKind::ExecuteProcess(ProcessDecl {
            cmd,
            cwd: None,
            output: Some(Output::Screen),
        }))
        .with_id(SIMULATOR_UNIT)
    }

    /// Declare `<robot>_param_file`, defaulting to the template rendered for the robot
    pub fn build_param_file_declaration(&self, robot: &RobotDescriptor) -> Action {
        declare(
            &robot.param_file_arg(),
            Some(self.config.param_file_template.render(&robot.name)),
            &format!(
                "Full path to the ROS2 parameters file to use for {} launched nodes",
                robot.name
            ),
        )
    }

    /// Ask the spawner to place the robot at its spawn pose under its namespace
    pub fn build_spawn_unit(&self, robot: &RobotDescriptor) -> Action {
        let pose = robot.spawn_pose;
        include(
            launch_file(&self.config.share, SPAWN_LAUNCH),
            vec![
                IncludeArg::new("x_pose", format_coordinate(pose.x).as_str()),
                IncludeArg::new("y_pose", format_coordinate(pose.y).as_str()),
                IncludeArg::new("z_pose", format_coordinate(pose.z).as_str()),
                IncludeArg::new("robot_name", robot.name.as_str()),
                IncludeArg::new("turtlebot_type", self.config.robot_type.as_str()),
            ],
            Some(spawn_description()),
        )
        .with_id(robot.spawn_unit_id())
        .requiring(SIMULATOR_UNIT)
    }

    /// Visualization, navigation stack and settings log for one robot
    pub fn build_navigation_group(&self, robot: &RobotDescriptor) -> Action {
        let config = self.config;
        let name = robot.name.as_str();
        let params_file = Expr::var(robot.param_file_arg());
        let map = self.setting("map", &config.map);
        let rviz_config = self.setting("rviz_config", &config.rviz_config);
        let autostart = self.flag("autostart", config.autostart);
        let use_robot_state_pub = self.flag("use_robot_state_pub", config.use_robot_state_pub);

        let mut body = Vec::new();

        if let Gate::Emit(condition) = self.gate("use_rviz", config.use_rviz) {
            body.push(
                include(
                    launch_file(&config.share, RVIZ_LAUNCH),
                    vec![
                        IncludeArg::new("namespace", name),
                        IncludeArg::new("use_namespace", "True"),
                        IncludeArg::new("rviz_config", rviz_config.clone()),
                    ],
                    None,
                )
                .when(condition),
            );
        }

        body.push(include(
            launch_file(&config.share, BRINGUP_LAUNCH),
            vec![
                IncludeArg::new("namespace", name),
                IncludeArg::new("use_namespace", "True"),
                IncludeArg::new("map", map.clone()),
                IncludeArg::new("use_sim_time", "True"),
                IncludeArg::new("params_file", params_file.clone()),
                IncludeArg::new("autostart", autostart.clone()),
                IncludeArg::new("use_rviz", "False"),
                IncludeArg::new("use_simulator", "False"),
                IncludeArg::new("headless", "False"),
                IncludeArg::new("use_robot_state_pub", use_robot_state_pub.clone()),
            ],
            Some(bringup_description(&config.share)),
        ));

        if let Gate::Emit(condition) = self.gate("log_settings", config.log_settings) {
            let messages = [
                Expr::literal(format!("Launching {}", name)),
                Expr::concat([Expr::literal(format!("{} map yaml: ", name)), map]),
                Expr::concat([Expr::literal(format!("{} params yaml: ", name)), params_file]),
                Expr::concat([
                    Expr::literal(format!("{} rviz config file: ", name)),
                    rviz_config,
                ]),
                Expr::concat([
                    Expr::literal(format!("{} using robot state pub: ", name)),
                    use_robot_state_pub,
                ]),
                Expr::concat([Expr::literal(format!("{} autostart: ", name)), autostart]),
            ];
            body.extend(messages.into_iter().map(|msg| {
                Action::new(ActionKind::LogInfo { msg }).when(condition.clone())
            }));
        }

        Action::new(ActionKind::Group {
            namespace: None,
            body,
        })
        .with_id(robot.navigation_unit_id())
        .requiring(robot.spawn_unit_id())
    }

    /// Compose the fleet: simulator, parameter-file declarations, spawn units,
    /// navigation groups, in that order
    pub fn compose(&self, count: i64) -> Result<Composition, ComposeError> {
        let robots = generate_robot_descriptors(count)?;
        log::debug!(
            "Composing {} robot(s) with {:?} gating",
            robots.len(),
            self.config.gating
        );

        let mut units = Vec::with_capacity(1 + robots.len() * 3);
        units.push(self.build_simulator_unit());
        units.extend(robots.iter().map(|r| self.build_param_file_declaration(r)));
        units.extend(robots.iter().map(|r| self.build_spawn_unit(r)));
        units.extend(robots.iter().map(|r| self.build_navigation_group(r)));

        Ok(Composition {
            arguments: self.shared_arguments(),
            units,
            robots,
        })
    }
}

/// Compose `count` robots sharing `config`
pub fn compose(count: i64, config: &SharedConfiguration) -> Result<Composition, ComposeError> {
    FleetComposer::new(config).compose(count)
}

/// Spawn unit for one robot
pub fn build_spawn_unit(robot: &RobotDescriptor, config: &SharedConfiguration) -> Action {
    FleetComposer::new(config).build_spawn_unit(robot)
}

/// Navigation group for one robot
pub fn build_navigation_group(robot: &RobotDescriptor, config: &SharedConfiguration) -> Action {
    FleetComposer::new(config).build_navigation_group(robot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_body(action: &Action) -> &[Action] {
        match &action.kind {
            ActionKind::Group { body, .. } => body,
            other => panic!("Expected Group, got {:?}", other),
        }
    }

    fn include_arg<'a>(action: &'a Action, name: &str) -> &'a Expr {
        match &action.kind {
            ActionKind::Include { args, .. } => {
                &args.iter().find(|a| a.name == name).unwrap().value
            }
            other => panic!("Expected Include, got {:?}", other),
        }
    }

    #[test]
    fn test_compose_two_robots_unit_order() {
        let config = SharedConfiguration::default();
        let composition = compose(2, &config).unwrap();
        assert_eq!(composition.units.len(), 7);

        let units = &composition.units;
        assert_eq!(units[0].id.as_deref(), Some(SIMULATOR_UNIT));
        for (i, unit) in units[1..3].iter().enumerate() {
            match &unit.kind {
                ActionKind::DeclareArgument { name, .. } => {
                    assert_eq!(name, &format!("robot{}_param_file", i))
                }
                other => panic!("Expected DeclareArgument, got {:?}", other),
            }
        }
        assert_eq!(units[3].id.as_deref(), Some("spawn/robot0"));
        assert_eq!(units[4].id.as_deref(), Some("spawn/robot1"));
        assert_eq!(units[5].id.as_deref(), Some("navigation/robot0"));
        assert_eq!(units[6].id.as_deref(), Some("navigation/robot1"));
    }

    #[test]
    fn test_compose_zero_robots() {
        let composition = compose(0, &SharedConfiguration::default()).unwrap();
        assert_eq!(composition.units.len(), 1);
        assert_eq!(composition.units[0].id.as_deref(), Some(SIMULATOR_UNIT));
        assert!(composition.robots.is_empty());
    }

    #[test]
    fn test_compose_negative_count() {
        assert!(matches!(
            compose(-3, &SharedConfiguration::default()),
            Err(ComposeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_simulator_command() {
        let mut config = SharedConfiguration::default();
        config.world = Expr::literal("/worlds/house.world");
        config.simulator = crate::fleet::config::Simulator::Gzserver;
        let unit = FleetComposer::new(&config).build_simulator_unit();
        match &unit.kind {
            ActionKind::ExecuteProcess(process) => {
                let cmd: Vec<_> = process.cmd.iter().map(|e| e.to_string()).collect();
                assert_eq!(
                    cmd,
                    vec![
                        "gzserver",
                        "--verbose",
                        "-s",
                        "libgazebo_ros_init.so",
                        "-s",
                        "libgazebo_ros_factory.so",
                        "/worlds/house.world",
                    ]
                );
                assert_eq!(process.output, Some(Output::Screen));
            }
            other => panic!("Expected ExecuteProcess, got {:?}", other),
        }
        assert!(unit.condition.is_none());
    }

    #[test]
    fn test_spawn_unit_arguments() {
        let config = SharedConfiguration::default();
        let robot = RobotDescriptor::from_index(1);
        let unit = build_spawn_unit(&robot, &config);

        assert_eq!(include_arg(&unit, "x_pose").as_literal(), Some("5.0"));
        assert_eq!(include_arg(&unit, "y_pose").as_literal(), Some("0.0"));
        assert_eq!(include_arg(&unit, "z_pose").as_literal(), Some("0.01"));
        assert_eq!(include_arg(&unit, "robot_name").as_literal(), Some("robot1"));
        assert_eq!(
            include_arg(&unit, "turtlebot_type").as_literal(),
            Some("waffle")
        );
        assert_eq!(unit.requires, vec![SIMULATOR_UNIT.to_string()]);
    }

    #[test]
    fn test_navigation_group_static() {
        let config = SharedConfiguration::default();
        let robot = RobotDescriptor::from_index(0);
        let group = build_navigation_group(&robot, &config);
        let body = group_body(&group);

        // rviz include, bringup include, six log lines
        assert_eq!(body.len(), 8);
        assert!(body.iter().all(|a| a.condition.is_none()));

        let bringup = &body[1];
        assert_eq!(include_arg(bringup, "namespace").as_literal(), Some("robot0"));
        assert_eq!(
            include_arg(bringup, "params_file"),
            &Expr::var("robot0_param_file")
        );
        assert_eq!(include_arg(bringup, "autostart").as_literal(), Some("False"));
        assert_eq!(group.requires, vec!["spawn/robot0".to_string()]);
    }

    #[test]
    fn test_navigation_group_static_flags_off() {
        let mut config = SharedConfiguration::default();
        config.use_rviz = false;
        config.log_settings = false;
        let group = build_navigation_group(&RobotDescriptor::from_index(0), &config);
        let body = group_body(&group);
        assert_eq!(body.len(), 1);
        assert!(matches!(&body[0].kind, ActionKind::Include { .. }));
    }

    #[test]
    fn test_navigation_group_deferred() {
        let mut config = SharedConfiguration::default();
        config.gating = GatingMode::Deferred;
        config.use_rviz = false;
        let group = build_navigation_group(&RobotDescriptor::from_index(0), &config);
        let body = group_body(&group);

        // Deferred gating keeps every unit and lets the launcher decide
        assert_eq!(body.len(), 8);
        assert_eq!(
            body[0].condition,
            Some(Condition::If(Expr::var("use_rviz")))
        );
        assert_eq!(include_arg(&body[1], "map"), &Expr::var("map"));
        assert_eq!(
            body[2].condition,
            Some(Condition::If(Expr::var("log_settings")))
        );
    }

    #[test]
    fn test_log_messages() {
        let mut config = SharedConfiguration::default();
        config.map = Expr::literal("/maps/a.yaml");
        let group = build_navigation_group(&RobotDescriptor::from_index(1), &config);
        let messages: Vec<String> = group_body(&group)
            .iter()
            .filter_map(|a| match &a.kind {
                ActionKind::LogInfo { msg } => Some(msg.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(messages[0], "Launching robot1");
        assert_eq!(messages[1], "robot1 map yaml: /maps/a.yaml");
        assert_eq!(messages[2], "robot1 params yaml: $(var robot1_param_file)");
        assert_eq!(messages[4], "robot1 using robot state pub: True");
        assert_eq!(messages[5], "robot1 autostart: False");
    }

    #[test]
    fn test_param_file_declaration_uses_template() {
        let mut config = SharedConfiguration::default();
        config.param_file_template =
            crate::fleet::config::ParamFileTemplate::parse("/params/{robot}.yaml").unwrap();
        let decl = FleetComposer::new(&config)
            .build_param_file_declaration(&RobotDescriptor::from_index(2));
        match decl.kind {
            ActionKind::DeclareArgument { name, default, .. } => {
                assert_eq!(name, "robot2_param_file");
                assert_eq!(
                    default.unwrap().as_literal(),
                    Some("/params/robot2.yaml")
                );
            }
            other => panic!("Expected DeclareArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_program_prepends_arguments() {
        let composition = compose(1, &SharedConfiguration::default()).unwrap();
        let arguments = composition.arguments.len();
        let program = composition.into_program();
        assert_eq!(program.source, FLEET_LAUNCH);
        assert_eq!(program.body.len(), arguments + 4);
        assert!(program.arguments().contains(&"log_settings"));
        assert_eq!(
            program.dependencies(),
            vec![
                ("spawn/robot0", SIMULATOR_UNIT),
                ("navigation/robot0", "spawn/robot0"),
            ]
        );
    }
}
