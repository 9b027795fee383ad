//! Command-line and record generation

use crate::error::GenerationError;
use crate::ir::{Expr, IncludeArg, NodeDecl, ProcessDecl};
use crate::record::types::{IncludeRecord, NodeRecord};
use crate::substitution::LaunchContext;
use std::path::Path;

pub struct CommandGenerator;

impl CommandGenerator {
    pub fn generate_node_record(
        node: &NodeDecl,
        context: &LaunchContext,
    ) -> Result<NodeRecord, GenerationError> {
        let cmd = Self::generate_node_command(node, context)?;

        let package = node.package.resolve(context)?;
        let executable = node.executable.resolve(context)?;
        let name = Self::node_name(node, &executable, context)?;
        let namespace = Self::node_namespace(node, context)?;

        let params = node
            .params
            .iter()
            .map(|p| Ok((p.name.clone(), p.value.resolve(context)?)))
            .collect::<Result<Vec<_>, GenerationError>>()?;

        let remaps = node
            .remaps
            .iter()
            .map(|r| Ok((r.from.resolve(context)?, r.to.resolve(context)?)))
            .collect::<Result<Vec<_>, GenerationError>>()?;

        let args = Self::resolve_all(&node.args, context)?;

        Ok(NodeRecord {
            executable,
            package: Some(package),
            name: Some(name),
            namespace: Some(namespace),
            params,
            remaps,
            args: if args.is_empty() { None } else { Some(args) },
            cmd,
            cwd: None,
            output: node.output.map(|o| o.as_str().to_string()),
            env: Self::environment(context),
            unit: context.current_unit().map(str::to_string),
            requires: context.requires().to_vec(),
        })
    }

    pub fn generate_node_command(
        node: &NodeDecl,
        context: &LaunchContext,
    ) -> Result<Vec<String>, GenerationError> {
        let mut cmd = Vec::new();

        // 1. Resolve executable path
        let package = node.package.resolve(context)?;
        let executable = node.executable.resolve(context)?;
        cmd.push(Self::resolve_executable_path(&package, &executable));

        // 2. Node arguments come before the ROS arguments
        cmd.extend(Self::resolve_all(&node.args, context)?);

        // 3. ROS args delimiter
        cmd.push("--ros-args".to_string());

        // 4. Node name and namespace
        cmd.push("-r".to_string());
        cmd.push(format!(
            "__node:={}",
            Self::node_name(node, &executable, context)?
        ));
        cmd.push("-r".to_string());
        cmd.push(format!("__ns:={}", Self::node_namespace(node, context)?));

        // 5. Remappings
        for remap in &node.remaps {
            cmd.push("-r".to_string());
            cmd.push(format!(
                "{}:={}",
                remap.from.resolve(context)?,
                remap.to.resolve(context)?
            ));
        }

        // 6. Parameters
        for param in &node.params {
            cmd.push("-p".to_string());
            cmd.push(format!("{}:={}", param.name, param.value.resolve(context)?));
        }

        Ok(cmd)
    }

    pub fn generate_process_record(
        process: &ProcessDecl,
        context: &LaunchContext,
    ) -> Result<NodeRecord, GenerationError> {
        let cmd = Self::resolve_all(&process.cmd, context)?;
        let executable = cmd.first().cloned().unwrap_or_default();
        let name = Path::new(&executable)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let cwd = process
            .cwd
            .as_ref()
            .map(|c| c.resolve(context))
            .transpose()?;

        Ok(NodeRecord {
            executable,
            package: None, // Plain processes don't have packages
            name,
            namespace: None,
            params: Vec::new(),
            remaps: Vec::new(),
            args: if cmd.len() > 1 {
                Some(cmd[1..].to_vec())
            } else {
                None
            },
            cmd,
            cwd,
            output: process.output.map(|o| o.as_str().to_string()),
            env: Self::environment(context),
            unit: context.current_unit().map(str::to_string),
            requires: context.requires().to_vec(),
        })
    }

    /// Record an include of a description this crate does not own.
    /// Arguments are resolved against `outer`, the scope the include appears in.
    pub fn generate_include_record(
        file: &Expr,
        args: &[IncludeArg],
        outer: &LaunchContext,
    ) -> Result<IncludeRecord, GenerationError> {
        let args = args
            .iter()
            .map(|a| Ok((a.name.clone(), a.value.resolve(outer)?)))
            .collect::<Result<Vec<_>, GenerationError>>()?;

        Ok(IncludeRecord {
            file: file.resolve(outer)?,
            namespace: outer.current_namespace(),
            args,
            unit: outer.current_unit().map(str::to_string),
            requires: outer.requires().to_vec(),
        })
    }

    fn node_name(
        node: &NodeDecl,
        executable: &str,
        context: &LaunchContext,
    ) -> Result<String, GenerationError> {
        match &node.name {
            Some(name) => Ok(name.resolve(context)?),
            None => Ok(executable.to_string()),
        }
    }

    /// Explicit namespaces are relative to the pushed namespace unless absolute
    fn node_namespace(node: &NodeDecl, context: &LaunchContext) -> Result<String, GenerationError> {
        match &node.namespace {
            Some(ns) => Ok(context.namespaced(&ns.resolve(context)?)),
            None => Ok(context.current_namespace()),
        }
    }

    fn resolve_all(
        exprs: &[Expr],
        context: &LaunchContext,
    ) -> Result<Vec<String>, GenerationError> {
        exprs
            .iter()
            .map(|e| e.resolve(context).map_err(GenerationError::from))
            .collect()
    }

    fn environment(context: &LaunchContext) -> Option<Vec<(String, String)>> {
        let env = context.environment();
        if env.is_empty() {
            None
        } else {
            Some(env.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        }
    }

    /// Locate `lib/<package>/<executable>` under the sourced prefixes
    fn resolve_executable_path(package: &str, executable: &str) -> String {
        if let Ok(prefix_path) = std::env::var("AMENT_PREFIX_PATH") {
            for prefix in prefix_path.split(':').filter(|p| !p.is_empty()) {
                let candidate = Path::new(prefix).join("lib").join(package).join(executable);
                if candidate.exists() {
                    return candidate.to_string_lossy().into_owned();
                }
            }
        }

        let distro = std::env::var("ROS_DISTRO").unwrap_or_else(|_| "humble".to_string());
        log::debug!(
            "Executable {}/{} not found in AMENT_PREFIX_PATH, assuming /opt/ros/{}",
            package,
            executable,
            distro
        );
        format!("/opt/ros/{}/lib/{}/{}", distro, package, executable)
    }
}
