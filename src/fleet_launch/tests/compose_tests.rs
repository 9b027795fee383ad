use fleet_launch::{
    compose_program,
    error::ComposeError,
    fleet::{
        build_navigation_group, compose, generate_robot_descriptors, GatingMode, RobotDescriptor,
        ShareDir, SharedConfiguration, MAX_ROBOT_COUNT,
    },
    ir::{ActionKind, Condition, Expr},
};

fn share_config() -> SharedConfiguration {
    SharedConfiguration::with_share(ShareDir::Path("/ws/share/multirobots_gazebo".into()))
}

#[test]
fn test_descriptors_are_distinct() {
    let robots = generate_robot_descriptors(5).unwrap();
    assert_eq!(robots.len(), 5);
    for (i, a) in robots.iter().enumerate() {
        for b in &robots[i + 1..] {
            assert_ne!(a.name, b.name);
            assert_ne!(a.spawn_pose, b.spawn_pose);
        }
    }
}

#[test]
fn test_two_robot_descriptors() {
    let robots = generate_robot_descriptors(2).unwrap();
    let summary: Vec<String> = robots
        .iter()
        .map(|r| format!("{} {}", r.name, r.spawn_pose))
        .collect();
    assert_eq!(summary, vec!["robot0 (4.0, 0.0, 0.01)", "robot1 (5.0, 0.0, 0.01)"]);
}

#[test]
fn test_negative_count_is_rejected() {
    assert!(matches!(
        generate_robot_descriptors(-1),
        Err(ComposeError::InvalidArgument(_))
    ));
    assert!(compose(-1, &share_config()).is_err());
}

#[test]
fn test_zero_robots_only_simulator() {
    let composition = compose(0, &share_config()).unwrap();
    assert_eq!(composition.units.len(), 1);
    assert_eq!(composition.units[0].id.as_deref(), Some("simulator"));
    assert!(composition.units[0].requires.is_empty());
}

#[test]
fn test_oversized_count_is_rejected() {
    assert!(matches!(
        compose(i64::MAX, &share_config()),
        Err(ComposeError::InvalidArgument(_))
    ));
    assert!(compose_program(MAX_ROBOT_COUNT + 1, &share_config()).is_err());
}

#[test]
fn test_two_robots_seven_units() {
    let composition = compose(2, &share_config()).unwrap();
    assert_eq!(composition.units.len(), 7);
}

#[test]
fn test_compose_is_idempotent() {
    let config = share_config();
    let first = serde_json::to_value(compose_program(3, &config).unwrap()).unwrap();
    let second = serde_json::to_value(compose_program(3, &config).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_navigation_groups_are_isolated() {
    for gating in [GatingMode::Static, GatingMode::Deferred] {
        let mut config = share_config();
        config.gating = gating;
        // Two-digit names share a prefix with the one-digit ones
        let robots = generate_robot_descriptors(12).unwrap();

        for a in &robots {
            let group = build_navigation_group(a, &config);
            assert!(group.mentions(&a.name));
            for b in robots.iter().filter(|b| b.name != a.name) {
                assert!(
                    !group.mentions(&b.name),
                    "{} references {}",
                    a.name,
                    b.name
                );
            }
        }
    }
}

#[test]
fn test_dependency_edges() {
    let program = compose_program(2, &share_config()).unwrap();
    assert_eq!(
        program.dependencies(),
        vec![
            ("spawn/robot0", "simulator"),
            ("spawn/robot1", "simulator"),
            ("navigation/robot0", "spawn/robot0"),
            ("navigation/robot1", "spawn/robot1"),
        ]
    );
}

#[test]
fn test_static_gating_omits_disabled_units() {
    let mut config = share_config();
    config.use_rviz = false;
    let group = build_navigation_group(&RobotDescriptor::from_index(0), &config);
    let ActionKind::Group { body, .. } = &group.kind else {
        panic!("Expected Group");
    };
    // bringup include and six log lines
    assert_eq!(body.len(), 7);
    assert!(body.iter().all(|a| a.condition.is_none()));
}

#[test]
fn test_deferred_gating_keeps_conditions() {
    let mut config = share_config();
    config.gating = GatingMode::Deferred;
    config.log_settings = false;
    let group = build_navigation_group(&RobotDescriptor::from_index(0), &config);
    let ActionKind::Group { body, .. } = &group.kind else {
        panic!("Expected Group");
    };
    assert_eq!(body.len(), 8);
    assert_eq!(
        body.last().and_then(|a| a.condition.clone()),
        Some(Condition::If(Expr::var("log_settings")))
    );
}

#[test]
fn test_plan_serializes_to_yaml() {
    let program = compose_program(1, &share_config()).unwrap();
    let yaml = serde_yaml::to_string(&program).unwrap();
    assert!(yaml.contains("spawn/robot0"));
    assert!(yaml.contains("type: declare_argument"));
}
