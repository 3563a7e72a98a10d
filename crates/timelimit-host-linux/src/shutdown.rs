//! Shutdown actions

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::Arc;
use timelimit_config::ShutdownPolicy;
use timelimit_host_api::{HostError, HostResult, ShutdownTrigger};
use tracing::{debug, error, info, warn};

/// Runs a shutdown command such as `systemctl poweroff`.
///
/// The command is started in a new session so signals aimed at the daemon
/// (e.g. Ctrl-C in its terminal) do not reach it. The daemon does not wait
/// for it; a detached thread reaps the child and logs its exit status.
#[derive(Debug, Clone)]
pub struct CommandShutdown {
    argv: Vec<String>,
}

impl CommandShutdown {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    /// Start the command and return its pid without waiting for it
    pub fn spawn(&self) -> HostResult<u32> {
        let (program, args) = self.argv.split_first().ok_or(HostError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // SAFETY: This is safe in the pre-exec context
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid().map_err(|e| std::io::Error::other(e.to_string()))?;
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| HostError::SpawnFailed {
            command: self.argv.join(" "),
            source,
        })?;

        let pid = child.id();
        debug!(pid, program = %program, "Shutdown command spawned");

        let command = self.argv.join(" ");
        std::thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => debug!(%command, "Shutdown command finished"),
            Ok(status) => warn!(%command, %status, "Shutdown command exited with failure"),
            Err(e) => warn!(%command, error = %e, "Failed to wait for shutdown command"),
        });

        Ok(pid)
    }
}

impl ShutdownTrigger for CommandShutdown {
    fn request_shutdown(&self) {
        info!(command = %self.argv.join(" "), "Shutting down");
        if let Err(e) = self.spawn() {
            error!(error = %e, "Failed to initiate shutdown");
        }
    }
}

/// Logs the request and does nothing else
#[derive(Debug, Clone, Default)]
pub struct DryRunShutdown;

impl ShutdownTrigger for DryRunShutdown {
    fn request_shutdown(&self) {
        info!("Shutdown requested (dry run, machine stays on)");
    }
}

/// Build the trigger described by the policy
pub fn shutdown_from_policy(policy: &ShutdownPolicy) -> Arc<dyn ShutdownTrigger> {
    if policy.dry_run {
        Arc::new(DryRunShutdown)
    } else {
        Arc::new(CommandShutdown::new(policy.command.clone()))
    }
}
