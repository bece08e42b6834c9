use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::Mutex;

use super::CatalogClient;
use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};

impl CatalogClient {
    /// Start an engine process and talk to it over its stdin/stdout.
    ///
    /// The process is killed when the client is closed or dropped.
    pub fn spawn<I, S>(program: impl AsRef<OsStr>, args: I, config: &ClientConfig) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Internal("backend stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Internal("backend stdout unavailable".to_string()))?;

        tracing::info!(
            "Spawned backend {:?} (pid={})",
            program,
            child.id().map(|pid| pid.to_string()).unwrap_or_default()
        );

        let mut client = Self::connect(stdout, stdin, config);
        client.child = Mutex::new(Some(child));
        Ok(client)
    }
}
