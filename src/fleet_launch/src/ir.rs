//! Launch unit intermediate representation (IR)
//!
//! An unevaluated description of a launch: argument declarations, processes,
//! includes and namespace groups. Conditions and substitutions are kept as
//! expressions so the same program can be evaluated against different launch
//! arguments, or handed unevaluated to an external launcher.

use crate::error::SubstitutionError;
use crate::substitution::types::contains_word;
use crate::substitution::{parse_substitutions, resolve_substitutions, LaunchContext, Substitution};
use serde::Serialize;

/// A lazy string expression (unevaluated substitution chain).
/// Evaluate with a `LaunchContext` to resolve to a concrete string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Expr(pub Vec<Substitution>);

impl Expr {
    /// Create an `Expr` from a literal string (no substitutions).
    pub fn literal(s: impl Into<String>) -> Self {
        Expr(vec![Substitution::Text(s.into())])
    }

    /// `$(var name)`
    pub fn var(name: impl Into<String>) -> Self {
        Expr(vec![Substitution::LaunchConfiguration(name.into())])
    }

    /// Parse `$(...)` syntax into an expression.
    pub fn parse(input: &str) -> Result<Self, SubstitutionError> {
        parse_substitutions(input).map(Expr)
    }

    /// Concatenate expressions, merging adjacent text.
    pub fn concat(parts: impl IntoIterator<Item = Expr>) -> Self {
        let mut out: Vec<Substitution> = Vec::new();
        for sub in parts.into_iter().flat_map(|e| e.0) {
            if let (Some(Substitution::Text(prev)), Substitution::Text(next)) =
                (out.last_mut(), &sub)
            {
                prev.push_str(next);
                continue;
            }
            out.push(sub);
        }
        if out.is_empty() {
            out.push(Substitution::Text(String::new()));
        }
        Expr(out)
    }

    /// Append a literal suffix.
    pub fn join(self, suffix: &str) -> Self {
        Expr::concat([self, Expr::literal(suffix)])
    }

    /// Returns `true` if this expression is a single literal text with no substitutions.
    pub fn is_literal(&self) -> bool {
        self.as_literal().is_some()
    }

    /// If this expression is a literal, return its value.
    pub fn as_literal(&self) -> Option<&str> {
        match self.0.as_slice() {
            [Substitution::Text(s)] => Some(s.as_str()),
            _ => None,
        }
    }

    /// Whether any part of the expression mentions `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|s| s.mentions(needle))
    }

    /// Resolve this expression against a `LaunchContext`.
    pub fn resolve(&self, context: &LaunchContext) -> Result<String, SubstitutionError> {
        resolve_substitutions(&self.0, context)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::literal(s)
    }
}

impl From<Substitution> for Expr {
    fn from(sub: Substitution) -> Self {
        Expr(vec![sub])
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for sub in &self.0 {
            write!(f, "{}", sub)?;
        }
        Ok(())
    }
}

/// Condition gating an action's execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Execute when the expression evaluates to truthy.
    If(Expr),
    /// Execute when the expression evaluates to falsy.
    Unless(Expr),
    /// Execute when every inner condition holds.
    All(Vec<Condition>),
}

impl Condition {
    fn mentions(&self, needle: &str) -> bool {
        match self {
            Condition::If(e) | Condition::Unless(e) => e.mentions(needle),
            Condition::All(all) => all.iter().any(|c| c.mentions(needle)),
        }
    }
}

/// Output policy of a spawned process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    Screen,
    Log,
    Both,
}

impl Output {
    pub fn as_str(&self) -> &'static str {
        match self {
            Output::Screen => "screen",
            Output::Log => "log",
            Output::Both => "both",
        }
    }
}

/// A single launch unit with optional condition and dependency edges.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    /// Identifier other units can depend on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Units that must be running before this one is useful.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            id: None,
            requires: Vec::new(),
            condition: None,
            kind,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn requiring(mut self, id: impl Into<String>) -> Self {
        self.requires.push(id.into());
        self
    }

    pub fn when(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    /// Whether this action, or anything nested under it, mentions `needle`
    /// in an expression, condition or argument name.
    pub fn mentions(&self, needle: &str) -> bool {
        self.condition.as_ref().is_some_and(|c| c.mentions(needle))
            || self.kind.mentions(needle)
    }
}

/// All launch action types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Declares a launch argument with optional default.
    DeclareArgument {
        name: String,
        default: Option<Expr>,
        description: Option<String>,
    },

    /// Sets an environment variable for subsequently started processes in scope.
    SetEnv { name: String, value: Expr },

    /// Pushes a namespace for the remainder of the enclosing scope.
    PushNamespace { namespace: Expr },

    /// Scoped block with optional namespace.
    Group {
        namespace: Option<Expr>,
        body: Vec<Action>,
    },

    /// Includes another launch description. `body` is attached when the
    /// description is owned by this crate; otherwise the include is opaque.
    Include {
        file: Expr,
        args: Vec<IncludeArg>,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<Box<LaunchProgram>>,
    },

    /// Spawns a non-ROS process.
    ExecuteProcess(ProcessDecl),

    /// Spawns a ROS 2 node.
    SpawnNode(NodeDecl),

    /// Emits an informational message when the launch runs.
    LogInfo { msg: Expr },
}

impl ActionKind {
    fn mentions(&self, needle: &str) -> bool {
        let opt = |e: &Option<Expr>| e.as_ref().is_some_and(|e| e.mentions(needle));
        match self {
            ActionKind::DeclareArgument { name, default, .. } => {
                contains_word(name, needle) || opt(default)
            }
            ActionKind::SetEnv { name, value } => {
                contains_word(name, needle) || value.mentions(needle)
            }
            ActionKind::PushNamespace { namespace } => namespace.mentions(needle),
            ActionKind::Group { namespace, body } => {
                opt(namespace) || body.iter().any(|a| a.mentions(needle))
            }
            ActionKind::Include { file, args, body } => {
                file.mentions(needle)
                    || args
                        .iter()
                        .any(|a| contains_word(&a.name, needle) || a.value.mentions(needle))
                    || body
                        .as_ref()
                        .is_some_and(|p| p.body.iter().any(|a| a.mentions(needle)))
            }
            ActionKind::ExecuteProcess(process) => {
                process.cmd.iter().any(|e| e.mentions(needle)) || opt(&process.cwd)
            }
            ActionKind::SpawnNode(node) => {
                node.package.mentions(needle)
                    || node.executable.mentions(needle)
                    || opt(&node.name)
                    || opt(&node.namespace)
                    || node
                        .params
                        .iter()
                        .any(|p| contains_word(&p.name, needle) || p.value.mentions(needle))
                    || node
                        .remaps
                        .iter()
                        .any(|r| r.from.mentions(needle) || r.to.mentions(needle))
                    || node.args.iter().any(|e| e.mentions(needle))
            }
            ActionKind::LogInfo { msg } => msg.mentions(needle),
        }
    }
}

/// A complete launch description.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchProgram {
    /// File name the description is installed as.
    pub source: String,
    pub body: Vec<Action>,
}

impl LaunchProgram {
    pub fn new(source: impl Into<String>, body: Vec<Action>) -> Self {
        Self {
            source: source.into(),
            body,
        }
    }

    /// Collect all declared argument names (recursive into groups and includes).
    pub fn arguments(&self) -> Vec<&str> {
        let mut result = Vec::new();
        collect_arguments(&self.body, &mut result);
        result
    }

    /// Collect all process-spawning actions (SpawnNode, ExecuteProcess).
    pub fn all_processes(&self) -> Vec<&Action> {
        let mut result = Vec::new();
        collect_processes(&self.body, &mut result);
        result
    }

    /// Dependency edges `(unit, required)` between top-level units.
    pub fn dependencies(&self) -> Vec<(&str, &str)> {
        self.body
            .iter()
            .filter_map(|a| a.id.as_deref().map(|id| (id, &a.requires)))
            .flat_map(|(id, reqs)| reqs.iter().map(move |r| (id, r.as_str())))
            .collect()
    }
}

fn collect_arguments<'a>(actions: &'a [Action], out: &mut Vec<&'a str>) {
    for action in actions {
        match &action.kind {
            ActionKind::DeclareArgument { name, .. } => out.push(name.as_str()),
            ActionKind::Group { body, .. } => collect_arguments(body, out),
            ActionKind::Include {
                body: Some(program),
                ..
            } => collect_arguments(&program.body, out),
            _ => {}
        }
    }
}

fn collect_processes<'a>(actions: &'a [Action], out: &mut Vec<&'a Action>) {
    for action in actions {
        match &action.kind {
            ActionKind::SpawnNode(_) | ActionKind::ExecuteProcess(_) => out.push(action),
            ActionKind::Group { body, .. } => collect_processes(body, out),
            ActionKind::Include {
                body: Some(program),
                ..
            } => collect_processes(&program.body, out),
            _ => {}
        }
    }
}

// --- Supporting types ---

/// A plain process invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessDecl {
    pub cmd: Vec<Expr>,
    pub cwd: Option<Expr>,
    pub output: Option<Output>,
}

/// A ROS 2 node invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDecl {
    pub package: Expr,
    pub executable: Expr,
    pub name: Option<Expr>,
    pub namespace: Option<Expr>,
    pub params: Vec<ParamDecl>,
    pub remaps: Vec<RemapDecl>,
    pub args: Vec<Expr>,
    pub output: Option<Output>,
}

impl NodeDecl {
    pub fn new(package: impl Into<Expr>, executable: impl Into<Expr>) -> Self {
        Self {
            package: package.into(),
            executable: executable.into(),
            name: None,
            namespace: None,
            params: Vec::new(),
            remaps: Vec::new(),
            args: Vec::new(),
            output: None,
        }
    }
}

/// An argument bound on an include.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncludeArg {
    pub name: String,
    pub value: Expr,
}

impl IncludeArg {
    pub fn new(name: impl Into<String>, value: impl Into<Expr>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An inline parameter declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDecl {
    pub name: String,
    pub value: Expr,
}

/// A topic remapping declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemapDecl {
    pub from: Expr,
    pub to: Expr,
}
