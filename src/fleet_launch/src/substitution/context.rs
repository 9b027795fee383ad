//! Launch context for managing configurations

use std::collections::{BTreeMap, HashMap};

/// Unit attribution saved by `LaunchContext::enter_unit`
#[derive(Debug, Clone)]
pub struct UnitScope {
    unit: Option<String>,
    requires: Vec<String>,
}

/// Launch context holding configurations and scoped state
#[derive(Debug, Clone)]
pub struct LaunchContext {
    configurations: HashMap<String, String>,
    environment: BTreeMap<String, String>,
    namespace_stack: Vec<String>,
    unit: Option<String>,
    requires: Vec<String>,
}

impl LaunchContext {
    pub fn new() -> Self {
        Self {
            configurations: HashMap::new(),
            environment: BTreeMap::new(),
            namespace_stack: vec!["/".to_string()], // Start with root namespace
            unit: None,
            requires: Vec::new(),
        }
    }

    pub fn set_configuration(&mut self, name: String, value: String) {
        self.configurations.insert(name, value);
    }

    pub fn get_configuration(&self, name: &str) -> Option<String> {
        self.configurations.get(name).cloned()
    }

    pub fn has_configuration(&self, name: &str) -> bool {
        self.configurations.contains_key(name)
    }

    pub fn configurations(&self) -> &HashMap<String, String> {
        &self.configurations
    }

    pub fn set_environment_variable(&mut self, name: String, value: String) {
        self.environment.insert(name, value);
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Enter a launch unit; records generated inside are attributed to it.
    /// Returns the previous unit scope for `leave_unit`.
    pub fn enter_unit(&mut self, id: Option<&str>, requires: &[String]) -> UnitScope {
        let previous = UnitScope {
            unit: self.unit.clone(),
            requires: self.requires.clone(),
        };
        if let Some(id) = id {
            self.unit = Some(id.to_string());
        }
        for dep in requires {
            if !self.requires.contains(dep) {
                self.requires.push(dep.clone());
            }
        }
        previous
    }

    pub fn leave_unit(&mut self, scope: UnitScope) {
        self.unit = scope.unit;
        self.requires = scope.requires;
    }

    pub fn current_unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// Combine `namespace` with the current namespace without pushing it
    pub fn namespaced(&self, namespace: &str) -> String {
        let trimmed = namespace.trim();
        let normalized = trimmed.trim_end_matches('/');

        if trimmed.starts_with('/') && normalized.is_empty() {
            return "/".to_string();
        }
        if normalized.is_empty() {
            return self.current_namespace();
        }

        let current = self.current_namespace();
        if trimmed.starts_with('/') {
            normalized.to_string()
        } else if current == "/" {
            format!("/{}", normalized)
        } else {
            format!("{}/{}", current, normalized)
        }
    }

    /// Push a namespace onto the stack
    pub fn push_namespace(&mut self, namespace: String) {
        let trimmed = namespace.trim();

        if trimmed.is_empty() || trimmed == "/" {
            return;
        }

        let new_ns = self.namespaced(trimmed);
        self.namespace_stack.push(new_ns);
    }

    /// Get the current namespace
    pub fn current_namespace(&self) -> String {
        self.namespace_stack
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }
}

impl Default for LaunchContext {
    fn default() -> Self {
        Self::new()
    }
}
