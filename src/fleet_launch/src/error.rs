//! Error types for fleet_launch

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid value '{value}' for option '{option}' (expected {expected})")]
    InvalidValue {
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid parameter file template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("Substitution error: {0}")]
    Substitution(#[from] SubstitutionError),
}

#[derive(Error, Debug)]
pub enum SubstitutionError {
    #[error("Undefined variable: '{0}'. Did you forget to declare it as a launch argument?")]
    UndefinedVariable(String),

    #[error(
        "Undefined environment variable: '{0}'. Make sure the variable is set in your environment."
    )]
    UndefinedEnvVar(String),

    #[error("Package '{0}' not found. Ensure the package is installed and sourced.")]
    PackageNotFound(String),

    #[error("Invalid substitution: {0}")]
    InvalidSubstitution(String),
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Substitution error: {0}")]
    Substitution(#[from] SubstitutionError),
}

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Failure of a full compose and evaluate run
#[derive(Error, Debug)]
pub enum FleetError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
