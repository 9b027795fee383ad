//! Launch descriptions installed by the bringup package and included per robot

use crate::{
    fleet::config::ShareDir,
    ir::{
        Action, ActionKind, Condition, Expr, IncludeArg, LaunchProgram, NodeDecl, Output,
        ParamDecl, ProcessDecl, RemapDecl,
    },
};

pub const FLEET_LAUNCH: &str = "multirobot_spawn.py";
pub const SPAWN_LAUNCH: &str = "spawn_bot_box_launch.py";
pub const BRINGUP_LAUNCH: &str = "bot_simulation.py";
pub const RVIZ_LAUNCH: &str = "rviz_launch.py";
pub const SLAM_LAUNCH: &str = "slam_launch.py";
pub const LOCALIZATION_LAUNCH: &str = "localization_launch.py";
pub const NAVIGATION_LAUNCH: &str = "navigation_launch.py";

/// Gazebo plugins providing ROS initialisation and the spawn service
pub const GAZEBO_PLUGINS: [&str; 2] = ["libgazebo_ros_init.so", "libgazebo_ros_factory.so"];

/// `<share>/launch/<file>`
pub fn launch_file(share: &ShareDir, file: &str) -> Expr {
    share.join(&format!("launch/{}", file))
}

pub(crate) fn declare(name: &str, default: Option<Expr>, description: &str) -> Action {
    Action::new(ActionKind::DeclareArgument {
        name: name.to_string(),
        default,
        description: Some(description.to_string()),
    })
}

pub(crate) fn include(file: Expr, args: Vec<IncludeArg>, body: Option<LaunchProgram>) -> Action {
    Action::new(ActionKind::Include {
        file,
        args,
        body: body.map(Box::new),
    })
}

fn if_var(name: &str) -> Option<Condition> {
    Some(Condition::If(Expr::var(name)))
}

/// Spawns one robot into the running simulator through the bringup
/// package's `spawn_bot` node.
pub fn spawn_description() -> LaunchProgram {
    let mut node = NodeDecl::new("multirobots_gazebo", "spawn_bot");
    node.output = Some(Output::Screen);
    node.args = vec![
        "--robot_name".into(),
        Expr::var("robot_name"),
        "--robot_namespace".into(),
        Expr::var("robot_name"),
        "--turtlebot_type".into(),
        Expr::var("turtlebot_type"),
        "-x".into(),
        Expr::var("x_pose"),
        "-y".into(),
        Expr::var("y_pose"),
        "-z".into(),
        Expr::var("z_pose"),
    ];

    LaunchProgram::new(
        SPAWN_LAUNCH,
        vec![
            declare("robot_name", None, "Name and namespace of the spawned robot"),
            declare("turtlebot_type", Some("waffle".into()), "Robot model to spawn"),
            declare("x_pose", Some("0.0".into()), "Spawn x coordinate"),
            declare("y_pose", Some("0.0".into()), "Spawn y coordinate"),
            declare("z_pose", Some("0.0".into()), "Spawn z coordinate"),
            Action::new(ActionKind::SpawnNode(node)),
        ],
    )
}

/// Per-robot bringup: optional simulator, robot state publisher, RViz, and
/// the SLAM or localization stack plus navigation under the robot namespace.
pub fn bringup_description(share: &ShareDir) -> LaunchProgram {
    let launch_dir = share.join("launch");
    let var = Expr::var;

    let mut body = vec![
        declare("namespace", Some("".into()), "Top-level namespace"),
        declare(
            "use_namespace",
            Some("false".into()),
            "Whether to apply a namespace to the navigation stack",
        ),
        declare("slam", Some("True".into()), "Whether run a SLAM"),
        declare(
            "map",
            Some(share.join("resource/turtlebot3_world.yaml")),
            "Full path to map file to load",
        ),
        declare(
            "use_sim_time",
            Some("true".into()),
            "Use simulation (Gazebo) clock if true",
        ),
        declare(
            "params_file",
            Some(share.join("resource/nav2_params.yaml")),
            "Full path to the ROS2 parameters file to use for all launched nodes",
        ),
        declare(
            "autostart",
            Some("true".into()),
            "Automatically startup the nav2 stack",
        ),
        Action::new(ActionKind::SetEnv {
            name: "RCUTILS_LOGGING_BUFFERED_STREAM".to_string(),
            value: "1".into(),
        }),
        declare(
            "rviz_config_file",
            Some(share.join("resource/nav2_default_view.rviz")),
            "Full path to the RVIZ config file to use",
        ),
        declare(
            "use_simulator",
            Some("False".into()),
            "Whether to start the simulator",
        ),
        declare(
            "use_robot_state_pub",
            Some("True".into()),
            "Whether to start the robot state publisher",
        ),
        declare("use_rviz", Some("True".into()), "Whether to start RVIZ"),
        declare(
            "headless",
            Some("False".into()),
            "Whether to execute gzclient",
        ),
        declare(
            "world",
            Some(share.join("world/aws_house.world")),
            "Full path to world model file to load",
        ),
    ];

    let mut server_cmd = vec![Expr::literal("gzserver")];
    for plugin in GAZEBO_PLUGINS {
        server_cmd.push("-s".into());
        server_cmd.push(plugin.into());
    }
    server_cmd.push(var("world"));

    body.push(
        Action::new(ActionKind::ExecuteProcess(ProcessDecl {
            cmd: server_cmd,
            cwd: Some(launch_dir.clone()),
            output: Some(Output::Screen),
        }))
        .when(if_var("use_simulator")),
    );
    body.push(
        Action::new(ActionKind::ExecuteProcess(ProcessDecl {
            cmd: vec!["gzclient".into()],
            cwd: Some(launch_dir),
            output: Some(Output::Screen),
        }))
        .when(Some(Condition::All(vec![
            Condition::If(var("use_simulator")),
            Condition::Unless(var("headless")),
        ]))),
    );

    let mut state_publisher = NodeDecl::new("robot_state_publisher", "robot_state_publisher");
    state_publisher.name = Some("robot_state_publisher".into());
    state_publisher.namespace = Some(var("namespace"));
    state_publisher.output = Some(Output::Screen);
    state_publisher.params = vec![ParamDecl {
        name: "use_sim_time".to_string(),
        value: var("use_sim_time"),
    }];
    // Map fully qualified tf topics to relative ones so the namespace applies
    state_publisher.remaps = vec![
        RemapDecl {
            from: "/tf".into(),
            to: "tf".into(),
        },
        RemapDecl {
            from: "/tf_static".into(),
            to: "tf_static".into(),
        },
    ];
    state_publisher.args = vec![share.join("resource/turtlebot3_waffle.urdf")];
    body.push(
        Action::new(ActionKind::SpawnNode(state_publisher)).when(if_var("use_robot_state_pub")),
    );

    body.push(
        include(
            launch_file(share, RVIZ_LAUNCH),
            vec![
                IncludeArg::new("namespace", ""),
                IncludeArg::new("use_namespace", "false"),
                IncludeArg::new("rviz_config", var("rviz_config_file")),
            ],
            None,
        )
        .when(if_var("use_rviz")),
    );

    body.push(Action::new(ActionKind::Group {
        namespace: None,
        body: vec![
            Action::new(ActionKind::PushNamespace {
                namespace: var("namespace"),
            })
            .when(if_var("use_namespace")),
            include(launch_file(share, SLAM_LAUNCH), stack_args(vec![]), None)
                .when(if_var("slam")),
            include(
                launch_file(share, LOCALIZATION_LAUNCH),
                stack_args(vec![
                    ("map", var("map")),
                    ("use_lifecycle_mgr", "false".into()),
                ]),
                None,
            )
            .when(Some(Condition::Unless(var("slam")))),
            include(
                launch_file(share, NAVIGATION_LAUNCH),
                stack_args(vec![
                    ("map", var("map")),
                    ("use_lifecycle_mgr", "false".into()),
                    ("map_subscribe_transient_local", "true".into()),
                ]),
                None,
            ),
        ],
    }));

    LaunchProgram::new(BRINGUP_LAUNCH, body)
}

/// Arguments shared by the SLAM, localization and navigation includes
fn stack_args(extra: Vec<(&str, Expr)>) -> Vec<IncludeArg> {
    let mut args = vec![
        IncludeArg::new("namespace", Expr::var("namespace")),
        IncludeArg::new("use_sim_time", Expr::var("use_sim_time")),
        IncludeArg::new("autostart", Expr::var("autostart")),
        IncludeArg::new("params_file", Expr::var("params_file")),
    ];
    args.extend(
        extra
            .into_iter()
            .map(|(name, value)| IncludeArg::new(name, value)),
    );
    args
}
