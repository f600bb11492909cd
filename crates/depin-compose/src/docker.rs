//! `docker compose` implementation of [`ComposeRuntime`].

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use depin_core::BundleRef;
use depin_core::config::RuntimeConfig;

use crate::project::sanitize_project_name;
use crate::runtime::{ComposeFuture, ComposeOutput, ComposeRuntime, ProbeFuture};

/// Drives compose projects through the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerCompose {
    docker_bin: String,
    command_timeout: Duration,
    probe_timeout: Duration,
}

impl DockerCompose {
    pub fn new(docker_bin: impl Into<String>, command_timeout: Duration, probe_timeout: Duration) -> Self {
        Self {
            docker_bin: docker_bin.into(),
            command_timeout,
            probe_timeout,
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(
            config.docker_bin.clone(),
            config.command_timeout(),
            config.probe_timeout(),
        )
    }

    /// `docker compose -f <bundle> -p <project> <verb...>`, run from the
    /// bundle's directory.
    fn bundle_command(&self, bundle: &BundleRef, project: &str, verb: &[&str]) -> Command {
        let mut args: Vec<OsString> = vec![
            "compose".into(),
            "-f".into(),
            bundle.compose_file().as_os_str().to_owned(),
            "-p".into(),
            sanitize_project_name(project).into(),
        ];
        args.extend(verb.iter().map(OsString::from));

        let mut cmd = Command::new(&self.docker_bin);
        cmd.args(args).current_dir(bundle.dir());
        cmd
    }

    /// `docker compose -p <project> <verb...>` for commands that only need
    /// the project scope.
    fn project_command(&self, project: &str, verb: &[String]) -> Command {
        let mut cmd = Command::new(&self.docker_bin);
        cmd.arg("compose")
            .arg("-p")
            .arg(sanitize_project_name(project))
            .args(verb);
        cmd
    }

    /// Run a prepared command to completion, capturing both streams.
    async fn run(&self, mut cmd: Command, label: &str, timeout: Duration) -> ComposeOutput {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %label, "running compose command");

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(command = %label, error = %e, "failed to spawn compose command");
                return ComposeOutput::failed(
                    format!("failed to execute `{label}`: {e}"),
                    String::new(),
                );
            }
            Err(_) => {
                warn!(command = %label, timeout_secs = timeout.as_secs(), "compose command timed out");
                return ComposeOutput::failed(
                    format!("`{label}` timed out after {}s", timeout.as_secs()),
                    String::new(),
                );
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{stdout}{stderr}");

        if output.status.success() {
            debug!(command = %label, "compose command succeeded");
            ComposeOutput::ok(combined)
        } else {
            let exit_code = output.status.code().unwrap_or(-1);
            let last_line = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("no diagnostic output");
            warn!(command = %label, exit_code, "compose command failed");
            ComposeOutput::failed(
                format!("`{label}` failed (exit code {exit_code}): {}", last_line.trim()),
                combined,
            )
        }
    }

    async fn lifecycle(&self, bundle: &BundleRef, project: &str, verb: &[&str]) -> ComposeOutput {
        let label = format!("docker compose {}", verb.join(" "));
        let cmd = self.bundle_command(bundle, project, verb);
        let out = self.run(cmd, &label, self.command_timeout).await;
        if out.success {
            info!(project = %sanitize_project_name(project), command = %label, "compose lifecycle command completed");
        }
        out
    }
}

impl ComposeRuntime for DockerCompose {
    fn up<'a>(&'a self, bundle: &'a BundleRef, project: &'a str) -> ComposeFuture<'a> {
        Box::pin(self.lifecycle(bundle, project, &["up", "-d"]))
    }

    fn stop<'a>(&'a self, bundle: &'a BundleRef, project: &'a str) -> ComposeFuture<'a> {
        Box::pin(self.lifecycle(bundle, project, &["stop"]))
    }

    fn start<'a>(&'a self, bundle: &'a BundleRef, project: &'a str) -> ComposeFuture<'a> {
        Box::pin(self.lifecycle(bundle, project, &["start"]))
    }

    fn down<'a>(&'a self, bundle: &'a BundleRef, project: &'a str) -> ComposeFuture<'a> {
        Box::pin(self.lifecycle(bundle, project, &["down", "--volumes", "--remove-orphans"]))
    }

    fn logs<'a>(&'a self, project: &'a str, tail: u32) -> ComposeFuture<'a> {
        Box::pin(async move {
            let verb = vec![
                "logs".to_string(),
                format!("--tail={tail}"),
                "--no-color".to_string(),
            ];
            let cmd = self.project_command(project, &verb);
            self.run(cmd, "docker compose logs", self.command_timeout).await
        })
    }

    fn ps<'a>(&'a self, project: &'a str) -> ComposeFuture<'a> {
        Box::pin(async move {
            let verb = vec!["ps".to_string(), "--format".to_string(), "json".to_string()];
            let cmd = self.project_command(project, &verb);
            self.run(cmd, "docker compose ps", self.probe_timeout).await
        })
    }

    fn probe(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            let mut compose = Command::new(&self.docker_bin);
            compose.args(["compose", "version"]);
            let compose = self.run(compose, "docker compose version", self.probe_timeout).await;
            if !compose.success {
                debug!(error = compose.error_detail(), "compose subcommand unavailable");
                return false;
            }

            // Reaches the daemon, unlike `--version`.
            let mut info = Command::new(&self.docker_bin);
            info.args(["info", "--format", "{{.ServerVersion}}"]);
            let info = self.run(info, "docker info", self.probe_timeout).await;
            if !info.success {
                debug!(error = info.error_detail(), "container runtime daemon unreachable");
            }
            info.success
        })
    }
}
