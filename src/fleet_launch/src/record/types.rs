//! record.json data structures

use serde::{Deserialize, Serialize};

/// Root structure for record.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordJson {
    pub node: Vec<NodeRecord>,
    pub include: Vec<IncludeRecord>,
    pub log: Vec<LogRecord>,
}

impl RecordJson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Records attributed to the launch unit `unit`
    pub fn nodes_in_unit<'a>(&'a self, unit: &'a str) -> impl Iterator<Item = &'a NodeRecord> {
        self.node
            .iter()
            .filter(move |n| n.unit.as_deref() == Some(unit))
    }
}

/// A process to start: a ROS node or a plain executable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub executable: String,
    pub package: Option<String>,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub params: Vec<(String, String)>,
    pub remaps: Vec<(String, String)>,
    pub args: Option<Vec<String>>,
    pub cmd: Vec<String>,
    pub cwd: Option<String>,
    pub output: Option<String>,
    pub env: Option<Vec<(String, String)>>,
    /// Launch unit the process belongs to
    pub unit: Option<String>,
    /// Units that must be running first
    pub requires: Vec<String>,
}

/// An include of an external launch description that this crate does not own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeRecord {
    pub file: String,
    pub namespace: String,
    pub args: Vec<(String, String)>,
    pub unit: Option<String>,
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub message: String,
    pub unit: Option<String>,
}
