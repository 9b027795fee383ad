//! Shared configuration for all robots of one composition run

use crate::{
    condition::parse_flag,
    error::ConfigError,
    ir::Expr,
    substitution::{parse_substitutions, Substitution},
};
use serde::Deserialize;
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Package that installs the bringup launch files and resources
pub const PACKAGE_NAME: &str = "multirobots_gazebo";

/// Placeholder replaced by the robot name in parameter file templates
pub const ROBOT_PLACEHOLDER: &str = "{robot}";

/// Number of robots composed when neither the config file nor the CLI says otherwise
pub const DEFAULT_ROBOT_COUNT: i64 = 2;

/// Where the bringup package's launch files and resources live
#[derive(Debug, Clone, PartialEq)]
pub enum ShareDir {
    /// Resolved at launch time with `$(find-pkg-share ...)`
    Package(String),
    /// A fixed directory
    Path(PathBuf),
}

impl ShareDir {
    pub fn expr(&self) -> Expr {
        match self {
            ShareDir::Package(pkg) => Substitution::FindPackageShare(pkg.clone()).into(),
            ShareDir::Path(path) => Expr::literal(path.to_string_lossy()),
        }
    }

    /// `<share>/<relative>`
    pub fn join(&self, relative: &str) -> Expr {
        self.expr().join(&format!("/{}", relative.trim_start_matches('/')))
    }
}

impl Default for ShareDir {
    fn default() -> Self {
        ShareDir::Package(PACKAGE_NAME.to_string())
    }
}

/// When gating flags are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatingMode {
    /// Flags are evaluated while composing; disabled units are left out
    #[default]
    Static,
    /// Flags become launch-time conditions evaluated by the launcher
    Deferred,
}

impl FromStr for GatingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(GatingMode::Static),
            "deferred" => Ok(GatingMode::Deferred),
            _ => Err(ConfigError::InvalidValue {
                option: "gating".to_string(),
                value: s.to_string(),
                expected: "'static' or 'deferred'",
            }),
        }
    }
}

/// Simulator binary started once for the whole fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Simulator {
    /// Server and client
    #[default]
    Gazebo,
    /// Server only
    Gzserver,
}

impl Simulator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Simulator::Gazebo => "gazebo",
            Simulator::Gzserver => "gzserver",
        }
    }
}

impl fmt::Display for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Simulator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gazebo" => Ok(Simulator::Gazebo),
            "gzserver" => Ok(Simulator::Gzserver),
            _ => Err(ConfigError::InvalidValue {
                option: "simulator".to_string(),
                value: s.to_string(),
                expected: "'gazebo' or 'gzserver'",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TemplatePart {
    Expr(Expr),
    RobotName,
}

/// Path pattern for per-robot navigation parameter files.
///
/// `{robot}` is replaced by the robot name; the rest may use `$(...)`
/// substitutions. A template without the placeholder gives every robot the
/// same file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamFileTemplate {
    parts: Vec<TemplatePart>,
}

impl ParamFileTemplate {
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidTemplate {
            template: template.to_string(),
            message: message.to_string(),
        };

        if template.trim().is_empty() {
            return Err(invalid("template is empty"));
        }

        let mut parts = Vec::new();
        for (i, piece) in template.split(ROBOT_PLACEHOLDER).enumerate() {
            if i > 0 {
                parts.push(TemplatePart::RobotName);
            }
            if piece.contains('{') || piece.contains('}') {
                return Err(invalid("only the {robot} placeholder is supported"));
            }
            if !piece.is_empty() {
                let subs = parse_substitutions(piece)?;
                parts.push(TemplatePart::Expr(Expr(subs)));
            }
        }

        Ok(Self { parts })
    }

    /// A template that resolves to the same path for every robot
    pub fn fixed(path: Expr) -> Self {
        Self {
            parts: vec![TemplatePart::Expr(path)],
        }
    }

    pub fn is_per_robot(&self) -> bool {
        self.parts.contains(&TemplatePart::RobotName)
    }

    /// Instantiate the template for one robot
    pub fn render(&self, robot_name: &str) -> Expr {
        Expr::concat(self.parts.iter().map(|part| match part {
            TemplatePart::Expr(expr) => expr.clone(),
            TemplatePart::RobotName => Expr::literal(robot_name),
        }))
    }
}

/// Settings common to every robot in one composition run
#[derive(Debug, Clone, PartialEq)]
pub struct SharedConfiguration {
    pub share: ShareDir,
    pub world: Expr,
    pub map: Expr,
    pub rviz_config: Expr,
    pub simulator: Simulator,
    pub autostart: bool,
    pub use_rviz: bool,
    pub use_robot_state_pub: bool,
    pub log_settings: bool,
    pub param_file_template: ParamFileTemplate,
    pub robot_type: String,
    pub robots: i64,
    pub gating: GatingMode,
}

impl SharedConfiguration {
    /// Defaults with resources resolved under `share`
    pub fn with_share(share: ShareDir) -> Self {
        Self {
            world: share.join("world/aws_house.world"),
            map: share.join("resource/turtlebot3_world.yaml"),
            rviz_config: share.join("resource/nav2_namespaced_view.rviz"),
            param_file_template: ParamFileTemplate::fixed(
                share.join("resource/nav2_multirobot_params_1.yaml"),
            ),
            simulator: Simulator::Gazebo,
            autostart: false,
            use_rviz: true,
            use_robot_state_pub: true,
            log_settings: true,
            robot_type: "waffle".to_string(),
            robots: DEFAULT_ROBOT_COUNT,
            gating: GatingMode::Static,
            share,
        }
    }

    /// Load a YAML configuration file on top of the defaults.
    /// `share_dir` takes precedence over the file's `share_dir`.
    pub fn load(path: &Path, share_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        log::debug!("Loading fleet configuration: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content, share_dir)
    }

    pub fn from_yaml_str(content: &str, share_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(content)?
        };

        let share = share_dir
            .or(file.share_dir.clone())
            .map(ShareDir::Path)
            .unwrap_or_default();
        let mut config = Self::with_share(share);
        file.apply_to(&mut config)?;
        Ok(config)
    }

    /// Apply a `key:=value` launch argument. Returns `false` for keys that
    /// are not shared settings; those only matter to the launcher.
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        match key {
            "world" => self.world = Expr::parse(value)?,
            "map" => self.map = Expr::parse(value)?,
            "rviz_config" => self.rviz_config = Expr::parse(value)?,
            "simulator" => self.simulator = value.parse()?,
            "autostart" => self.autostart = flag(key, value)?,
            "use_rviz" => self.use_rviz = flag(key, value)?,
            "use_robot_state_pub" => self.use_robot_state_pub = flag(key, value)?,
            "log_settings" => self.log_settings = flag(key, value)?,
            "param_file_template" => {
                self.param_file_template = ParamFileTemplate::parse(value)?
            }
            "robot_type" | "turtlebot_type" => self.robot_type = value.to_string(),
            "robots" => {
                self.robots = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    option: key.to_string(),
                    value: value.to_string(),
                    expected: "an integer",
                })?
            }
            "gating" => self.gating = value.parse()?,
            _ => return Ok(false),
        }
        log::debug!("Shared setting {} overridden with '{}'", key, value);
        Ok(true)
    }
}

impl Default for SharedConfiguration {
    fn default() -> Self {
        Self::with_share(ShareDir::default())
    }
}

fn flag(option: &str, value: &str) -> Result<bool, ConfigError> {
    parse_flag(value).ok_or_else(|| ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        expected: "a boolean",
    })
}

/// On-disk form of `SharedConfiguration`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    share_dir: Option<PathBuf>,
    world: Option<String>,
    map: Option<String>,
    rviz_config: Option<String>,
    simulator: Option<String>,
    autostart: Option<bool>,
    use_rviz: Option<bool>,
    use_robot_state_pub: Option<bool>,
    log_settings: Option<bool>,
    param_file_template: Option<String>,
    robot_type: Option<String>,
    robots: Option<i64>,
    gating: Option<String>,
}

impl ConfigFile {
    fn apply_to(self, config: &mut SharedConfiguration) -> Result<(), ConfigError> {
        if let Some(world) = self.world {
            config.world = Expr::parse(&world)?;
        }
        if let Some(map) = self.map {
            config.map = Expr::parse(&map)?;
        }
        if let Some(rviz_config) = self.rviz_config {
            config.rviz_config = Expr::parse(&rviz_config)?;
        }
        if let Some(simulator) = self.simulator {
            config.simulator = simulator.parse()?;
        }
        if let Some(template) = self.param_file_template {
            config.param_file_template = ParamFileTemplate::parse(&template)?;
        }
        if let Some(gating) = self.gating {
            config.gating = gating.parse()?;
        }
        if let Some(robot_type) = self.robot_type {
            config.robot_type = robot_type;
        }
        config.autostart = self.autostart.unwrap_or(config.autostart);
        config.use_rviz = self.use_rviz.unwrap_or(config.use_rviz);
        config.use_robot_state_pub = self
            .use_robot_state_pub
            .unwrap_or(config.use_robot_state_pub);
        config.log_settings = self.log_settings.unwrap_or(config.log_settings);
        config.robots = self.robots.unwrap_or(config.robots);
        Ok(())
    }
}
