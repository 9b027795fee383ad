//! IR evaluator: walks a `LaunchProgram`, resolves expressions and conditions,
//! and produces records for the external launcher.

use crate::{
    condition::evaluate_condition,
    error::Result,
    ir::{Action, ActionKind, LaunchProgram},
    record::{CommandGenerator, LogRecord, RecordJson},
    substitution::LaunchContext,
};
use std::collections::HashMap;

pub struct LaunchEvaluator {
    context: LaunchContext,
    records: RecordJson,
}

impl LaunchEvaluator {
    /// Launch arguments given on the command line win over declared defaults
    pub fn new(launch_args: HashMap<String, String>) -> Self {
        let mut context = LaunchContext::new();
        for (k, v) in launch_args {
            context.set_configuration(k, v);
        }

        Self {
            context,
            records: RecordJson::new(),
        }
    }

    pub fn evaluate(&mut self, program: &LaunchProgram) -> Result<()> {
        log::debug!("Evaluating launch description {}", program.source);
        self.evaluate_actions(&program.body)
    }

    fn evaluate_actions(&mut self, actions: &[Action]) -> Result<()> {
        for action in actions {
            self.evaluate_action(action)?;
        }
        Ok(())
    }

    fn evaluate_action(&mut self, action: &Action) -> Result<()> {
        if let Some(condition) = &action.condition {
            if !evaluate_condition(condition, &self.context)? {
                log::debug!("Skipping {} due to condition", describe(action));
                return Ok(());
            }
        }

        let unit_scope = self
            .context
            .enter_unit(action.id.as_deref(), &action.requires);

        let result = self.evaluate_kind(&action.kind);

        self.context.leave_unit(unit_scope);
        result
    }

    fn evaluate_kind(&mut self, kind: &ActionKind) -> Result<()> {
        match kind {
            ActionKind::DeclareArgument { name, default, .. } => {
                if !self.context.has_configuration(name) {
                    match default {
                        Some(default) => {
                            let value = default.resolve(&self.context)?;
                            self.context.set_configuration(name.clone(), value);
                        }
                        None => log::debug!("Argument {} declared without a default", name),
                    }
                }
            }

            ActionKind::SetEnv { name, value } => {
                let value = value.resolve(&self.context)?;
                self.context.set_environment_variable(name.clone(), value);
            }

            ActionKind::PushNamespace { namespace } => {
                let namespace = namespace.resolve(&self.context)?;
                self.context.push_namespace(namespace);
            }

            ActionKind::Group { namespace, body } => {
                let saved = self.context.clone();

                if let Some(namespace) = namespace {
                    let namespace = namespace.resolve(&self.context)?;
                    self.context.push_namespace(namespace);
                }
                let result = self.evaluate_actions(body);

                self.context = saved;
                result?;
            }

            ActionKind::Include { file, args, body } => match body {
                Some(program) => {
                    // Arguments resolve in the including scope, then seed the included one
                    let resolved = args
                        .iter()
                        .map(|a| Ok((a.name.clone(), a.value.resolve(&self.context)?)))
                        .collect::<Result<Vec<_>>>()?;

                    let saved = self.context.clone();
                    for (name, value) in resolved {
                        self.context.set_configuration(name, value);
                    }
                    log::info!("Including launch description: {}", program.source);
                    let result = self.evaluate(program);

                    self.context = saved;
                    result?;
                }
                None => {
                    let record =
                        CommandGenerator::generate_include_record(file, args, &self.context)?;
                    log::debug!("External include: {}", record.file);
                    self.records.include.push(record);
                }
            },

            ActionKind::ExecuteProcess(process) => {
                let record = CommandGenerator::generate_process_record(process, &self.context)?;
                self.records.node.push(record);
            }

            ActionKind::SpawnNode(node) => {
                let record = CommandGenerator::generate_node_record(node, &self.context)?;
                self.records.node.push(record);
            }

            ActionKind::LogInfo { msg } => {
                let message = msg.resolve(&self.context)?;
                log::info!("{}", message);
                self.records.log.push(LogRecord {
                    message,
                    unit: self.context.current_unit().map(str::to_string),
                });
            }
        }
        Ok(())
    }

    pub fn into_record_json(self) -> RecordJson {
        self.records
    }
}

fn describe(action: &Action) -> String {
    let kind = match &action.kind {
        ActionKind::DeclareArgument { .. } => "argument",
        ActionKind::SetEnv { .. } => "set_env",
        ActionKind::PushNamespace { .. } => "push_namespace",
        ActionKind::Group { .. } => "group",
        ActionKind::Include { .. } => "include",
        ActionKind::ExecuteProcess(_) => "process",
        ActionKind::SpawnNode(_) => "node",
        ActionKind::LogInfo { .. } => "log",
    };
    match &action.id {
        Some(id) => format!("{} {}", kind, id),
        None => kind.to_string(),
    }
}

/// Evaluate `program` with the given launch arguments
pub fn evaluate_program(
    program: &LaunchProgram,
    launch_args: HashMap<String, String>,
) -> Result<RecordJson> {
    let mut evaluator = LaunchEvaluator::new(launch_args);
    evaluator.evaluate(program)?;
    Ok(evaluator.into_record_json())
}
