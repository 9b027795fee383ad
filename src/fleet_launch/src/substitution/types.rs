//! Substitution types

use crate::error::SubstitutionError;
use crate::substitution::context::LaunchContext;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A single piece of a launch-time string
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Substitution {
    /// Plain text (no substitution)
    Text(String),
    /// $(var name) - Launch configuration variable
    LaunchConfiguration(String),
    /// $(env VAR [default]) - Environment variable with optional default
    EnvironmentVariable {
        name: String,
        default: Option<String>,
    },
    /// $(find-pkg-share package_name) - Find ROS 2 package share directory
    FindPackageShare(String),
}

impl Substitution {
    /// Resolve substitution to string value
    pub fn resolve(&self, context: &LaunchContext) -> Result<String, SubstitutionError> {
        match self {
            Substitution::Text(s) => Ok(s.clone()),
            Substitution::LaunchConfiguration(name) => context
                .get_configuration(name)
                .ok_or_else(|| SubstitutionError::UndefinedVariable(name.clone())),
            Substitution::EnvironmentVariable { name, default } => {
                std::env::var(name).or_else(|_| {
                    default
                        .clone()
                        .ok_or_else(|| SubstitutionError::UndefinedEnvVar(name.clone()))
                })
            }
            Substitution::FindPackageShare(package_name) => find_package_share(package_name)
                .ok_or_else(|| SubstitutionError::PackageNotFound(package_name.clone())),
        }
    }

    /// Whether this substitution mentions the word `needle` in its text or variable name.
    pub fn mentions(&self, needle: &str) -> bool {
        match self {
            Substitution::Text(s)
            | Substitution::LaunchConfiguration(s)
            | Substitution::FindPackageShare(s) => contains_word(s, needle),
            Substitution::EnvironmentVariable { name, default } => {
                contains_word(name, needle)
                    || default.as_deref().is_some_and(|d| contains_word(d, needle))
            }
        }
    }
}

/// Whether `needle` occurs in `haystack` not adjacent to another alphanumeric
/// character, so `robot1` is found in `robot1_param_file` and `/robot1/map`
/// but not in `robot10`.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Substitution::Text(s) => write!(f, "{}", s),
            Substitution::LaunchConfiguration(name) => write!(f, "$(var {})", name),
            Substitution::EnvironmentVariable {
                name,
                default: Some(default),
            } => write!(f, "$(env {} {})", name, default),
            Substitution::EnvironmentVariable {
                name,
                default: None,
            } => write!(f, "$(env {})", name),
            Substitution::FindPackageShare(pkg) => write!(f, "$(find-pkg-share {})", pkg),
        }
    }
}

/// Find ROS 2 package share directory
fn find_package_share(package_name: &str) -> Option<String> {
    // Workspace overlays come first
    if let Ok(prefix_path) = std::env::var("AMENT_PREFIX_PATH") {
        for prefix in prefix_path.split(':').filter(|p| !p.is_empty()) {
            let share_path = format!("{}/share/{}", prefix, package_name);
            if Path::new(&share_path).exists() {
                return Some(share_path);
            }
        }
    }

    if let Ok(distro) = std::env::var("ROS_DISTRO") {
        let share_path = format!("/opt/ros/{}/share/{}", distro, package_name);
        if Path::new(&share_path).exists() {
            return Some(share_path);
        }
    }

    for distro in &["jazzy", "iron", "humble", "galactic", "foxy"] {
        let share_path = format!("/opt/ros/{}/share/{}", distro, package_name);
        if Path::new(&share_path).exists() {
            return Some(share_path);
        }
    }

    None
}

/// Resolve list of substitutions to single string
pub fn resolve_substitutions(
    subs: &[Substitution],
    context: &LaunchContext,
) -> Result<String, SubstitutionError> {
    let mut result = String::new();
    for sub in subs {
        result.push_str(&sub.resolve(context)?);
    }
    Ok(result)
}
