use fleet_launch::{
    fleet::{GatingMode, ShareDir, SharedConfiguration},
    launch_record, load_configuration,
    record::RecordJson,
};
use std::{collections::HashMap, io::Write};
use tempfile::NamedTempFile;

const SHARE: &str = "/ws/share/multirobots_gazebo";

fn share_config() -> SharedConfiguration {
    SharedConfiguration::with_share(ShareDir::Path(SHARE.into()))
}

/// Helper: write YAML to a temp file.
fn write_yaml(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn executables(record: &RecordJson, exec: &str) -> usize {
    record
        .node
        .iter()
        .filter(|n| n.executable.ends_with(exec))
        .count()
}

fn include_files(record: &RecordJson) -> Vec<&str> {
    record
        .include
        .iter()
        .map(|i| i.file.rsplit('/').next().unwrap_or_default())
        .collect()
}

#[test]
fn test_default_two_robot_record() {
    let record = launch_record(2, &share_config(), HashMap::new()).unwrap();

    // simulator + (spawner + state publisher) per robot
    assert_eq!(record.node.len(), 5);
    assert_eq!(record.nodes_in_unit("simulator").count(), 1);
    assert_eq!(record.node[0].executable, "gazebo");
    assert_eq!(executables(&record, "/spawn_bot"), 2);
    assert_eq!(executables(&record, "/robot_state_publisher"), 2);

    let namespaces: Vec<_> = record
        .node
        .iter()
        .filter(|n| n.executable.ends_with("/robot_state_publisher"))
        .filter_map(|n| n.namespace.as_deref())
        .collect();
    assert_eq!(namespaces, vec!["/robot0", "/robot1"]);

    assert_eq!(
        include_files(&record),
        vec![
            "rviz_launch.py",
            "slam_launch.py",
            "navigation_launch.py",
            "rviz_launch.py",
            "slam_launch.py",
            "navigation_launch.py",
        ]
    );
    assert_eq!(record.log.len(), 12);
}

#[test]
fn test_spawn_records_require_simulator() {
    let record = launch_record(2, &share_config(), HashMap::new()).unwrap();
    for (i, name) in ["robot0", "robot1"].iter().enumerate() {
        let unit = format!("spawn/{}", name);
        let spawn: Vec<_> = record.nodes_in_unit(&unit).collect();
        assert_eq!(spawn.len(), 1);
        assert_eq!(spawn[0].requires, vec!["simulator".to_string()]);

        let args = spawn[0].args.as_ref().unwrap();
        assert_eq!(args[1], *name);
        assert_eq!(args[7], format!("{}.0", 4 + i));
        assert_eq!(args[11], "0.01");
    }
}

#[test]
fn test_navigation_records_require_spawn() {
    let record = launch_record(1, &share_config(), HashMap::new()).unwrap();
    let publisher: Vec<_> = record.nodes_in_unit("navigation/robot0").collect();
    assert_eq!(publisher.len(), 1);
    assert_eq!(publisher[0].requires, vec!["spawn/robot0".to_string()]);
    assert_eq!(
        publisher[0].env,
        Some(vec![(
            "RCUTILS_LOGGING_BUFFERED_STREAM".to_string(),
            "1".to_string()
        )])
    );

    let navigation = record
        .include
        .iter()
        .find(|i| i.file.ends_with("navigation_launch.py"))
        .unwrap();
    assert_eq!(navigation.namespace, "/robot0");
    let params_file = navigation
        .args
        .iter()
        .find(|(k, _)| k == "params_file")
        .map(|(_, v)| v.as_str());
    assert_eq!(
        params_file,
        Some("/ws/share/multirobots_gazebo/resource/nav2_multirobot_params_1.yaml")
    );
}

#[test]
fn test_settings_log_messages() {
    let record = launch_record(1, &share_config(), HashMap::new()).unwrap();
    let messages: Vec<&str> = record.log.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Launching robot0",
            "robot0 map yaml: /ws/share/multirobots_gazebo/resource/turtlebot3_world.yaml",
            "robot0 params yaml: /ws/share/multirobots_gazebo/resource/nav2_multirobot_params_1.yaml",
            "robot0 rviz config file: /ws/share/multirobots_gazebo/resource/nav2_namespaced_view.rviz",
            "robot0 using robot state pub: True",
            "robot0 autostart: False",
        ]
    );
    assert!(record
        .log
        .iter()
        .all(|l| l.unit.as_deref() == Some("navigation/robot0")));
}

#[test]
fn test_static_flags_from_config_file() {
    let file = write_yaml(
        "use_rviz: false\n\
         log_settings: false\n\
         use_robot_state_pub: false\n\
         param_file_template: /params/{robot}.yaml\n",
    );
    let config = load_configuration(Some(file.path()), Some(SHARE.into()), &[]).unwrap();
    let record = launch_record(2, &config, HashMap::new()).unwrap();

    assert!(record.log.is_empty());
    assert_eq!(executables(&record, "/robot_state_publisher"), 0);
    assert!(!include_files(&record).contains(&"rviz_launch.py"));

    let params: Vec<_> = record
        .include
        .iter()
        .filter(|i| i.file.ends_with("navigation_launch.py"))
        .filter_map(|i| i.args.iter().find(|(k, _)| k == "params_file"))
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(params, vec!["/params/robot0.yaml", "/params/robot1.yaml"]);
}

#[test]
fn test_deferred_gating_follows_launch_arguments() {
    let mut config = share_config();
    config.gating = GatingMode::Deferred;

    let mut args = HashMap::new();
    args.insert("use_rviz".to_string(), "False".to_string());
    args.insert("autostart".to_string(), "True".to_string());
    let record = launch_record(1, &config, args).unwrap();

    assert!(!include_files(&record).contains(&"rviz_launch.py"));
    assert_eq!(record.log.len(), 6);
    assert_eq!(record.log[5].message, "robot0 autostart: True");
}

#[test]
fn test_localization_when_slam_disabled() {
    let mut args = HashMap::new();
    args.insert("slam".to_string(), "False".to_string());
    let record = launch_record(1, &share_config(), args).unwrap();

    let files = include_files(&record);
    assert!(files.contains(&"localization_launch.py"));
    assert!(!files.contains(&"slam_launch.py"));
}

#[test]
fn test_record_is_repeatable() {
    let config = share_config();
    let first = launch_record(3, &config, HashMap::new()).unwrap();
    let second = launch_record(3, &config, HashMap::new()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}
