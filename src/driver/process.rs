//! Game program hosted by an external process over JSON lines

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;

use crate::driver::protocol::{HostEvent, HostRequest, PROTOCOL_VERSION};
use crate::driver::script::ScriptSource;
use crate::driver::surface::{DialogSurface, SurfaceFactory};
use crate::driver::DriverError;

/// Extra time granted on top of a host-side wait before the host counts as hung
const HOST_GRACE: Duration = Duration::from_secs(5);

/// Creates [`ProcessSurface`]s for a host command found on `PATH`
pub struct ProcessSurfaceFactory {
    host_command: String,
    host_args: Vec<String>,
    script_url: Option<String>,
    script_path: PathBuf,
    pages_dir: PathBuf,
}

impl ProcessSurfaceFactory {
    pub fn new(
        host_command: impl Into<String>,
        script_url: Option<String>,
        script_path: PathBuf,
        pages_dir: PathBuf,
    ) -> Self {
        Self {
            host_command: host_command.into(),
            host_args: Vec::new(),
            script_url,
            script_path,
            pages_dir,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.host_args = args;
        self
    }
}

impl SurfaceFactory for ProcessSurfaceFactory {
    fn create(&self, game_id: u64) -> Result<Box<dyn DialogSurface>, DriverError> {
        let binary = which::which(&self.host_command)
            .map_err(|_| DriverError::BinaryNotFound(self.host_command.clone()))?;
        Ok(Box::new(ProcessSurface {
            binary,
            args: self.host_args.clone(),
            game_id,
            pages_dir: self.pages_dir.clone(),
            script: ScriptSource::new(self.script_url.clone(), self.script_path.clone()),
            host: None,
        }))
    }
}

struct Host {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// One host process running the game program for one session
pub struct ProcessSurface {
    binary: PathBuf,
    args: Vec<String>,
    game_id: u64,
    pages_dir: PathBuf,
    script: ScriptSource,
    host: Option<Host>,
}

impl ProcessSurface {
    fn spawn(&self) -> Result<Host, DriverError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args);
        cmd.arg("--pages-dir").arg(&self.pages_dir);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            tracing::error!(binary = %self.binary.display(), error = %e, "Failed to spawn game host");
            DriverError::ProcessSpawnFailed
        })?;
        let stdin = child.stdin.take().ok_or(DriverError::ProcessSpawnFailed)?;
        let stdout = child.stdout.take().ok_or(DriverError::ProcessSpawnFailed)?;
        tracing::debug!(game_id = self.game_id, pid = ?child.id(), "Spawned game host");

        Ok(Host {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    /// Send one request and read its answer, allowing `wait` for host-side waiting
    async fn exchange(
        &mut self,
        request: HostRequest,
        wait: Duration,
    ) -> Result<HostEvent, DriverError> {
        let host = self.host.as_mut().ok_or(DriverError::NotLoaded)?;
        let line = request.to_line()?;
        host.stdin.write_all(line.as_bytes()).await?;
        host.stdin.flush().await?;

        let limit = wait + HOST_GRACE;
        let next = timeout(limit, host.stdout.next_line())
            .await
            .map_err(|_| DriverError::Timeout(limit.as_millis() as u64))??;
        match next {
            Some(line) => match HostEvent::from_line(&line)? {
                HostEvent::Error { message } => Err(DriverError::Protocol(message)),
                event => Ok(event),
            },
            None => Err(DriverError::Protocol("game host closed its output".to_string())),
        }
    }

    async fn expect_ack(&mut self, request: HostRequest) -> Result<(), DriverError> {
        match self.exchange(request, Duration::ZERO).await? {
            HostEvent::Ack | HostEvent::Ready => Ok(()),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(event: &HostEvent) -> DriverError {
    DriverError::Protocol(format!("unexpected host event: {event:?}"))
}

#[async_trait]
impl DialogSurface for ProcessSurface {
    async fn open(&mut self, user: &str, blob: &str) -> Result<(), DriverError> {
        self.script.ensure().await?;
        if self.host.is_none() {
            self.host = Some(self.spawn()?);
        }
        self.expect_ack(HostRequest::Open {
            version: PROTOCOL_VERSION,
            game_id: self.game_id,
            user: user.to_string(),
            state: blob.to_string(),
            script: self.script.path().display().to_string(),
        })
        .await
    }

    async fn identity(&mut self) -> Result<Option<String>, DriverError> {
        match self.exchange(HostRequest::Identity, Duration::ZERO).await? {
            HostEvent::Identity { user } => Ok(user),
            other => Err(unexpected(&other)),
        }
    }

    async fn wait_dialog(&mut self, wait: Duration) -> Result<Option<String>, DriverError> {
        let request = HostRequest::WaitDialog {
            timeout_ms: wait.as_millis() as u64,
        };
        match self.exchange(request, wait).await? {
            HostEvent::Dialog { markup } => Ok(Some(markup)),
            HostEvent::Idle => Ok(None),
            other => Err(unexpected(&other)),
        }
    }

    async fn press(&mut self, ordinal: usize) -> Result<(), DriverError> {
        self.expect_ack(HostRequest::Press { ordinal }).await
    }

    async fn enter_text(&mut self, text: &str) -> Result<(), DriverError> {
        self.expect_ack(HostRequest::Type {
            text: text.to_string(),
        })
        .await
    }

    async fn wait_dismissed(&mut self, wait: Duration) -> Result<bool, DriverError> {
        let request = HostRequest::WaitDismissed {
            timeout_ms: wait.as_millis() as u64,
        };
        match self.exchange(request, wait).await? {
            HostEvent::Dismissed => Ok(true),
            HostEvent::Dialog { .. } => Ok(false),
            other => Err(unexpected(&other)),
        }
    }

    async fn read_state(&mut self) -> Result<String, DriverError> {
        match self.exchange(HostRequest::State, Duration::ZERO).await? {
            HostEvent::State { blob } => Ok(blob),
            other => Err(unexpected(&other)),
        }
    }

    async fn script_changed(&mut self) -> Result<bool, DriverError> {
        self.script.has_changed()
    }

    async fn reload_script(&mut self) -> Result<(), DriverError> {
        self.expect_ack(HostRequest::ReloadScript).await?;
        self.script.mark_loaded()
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if self.host.is_none() {
            return Ok(());
        }
        if let Err(e) = self.expect_ack(HostRequest::Close).await {
            tracing::debug!(game_id = self.game_id, error = %e, "Game host did not acknowledge close");
        }
        if let Some(mut host) = self.host.take() {
            if let Err(e) = host.child.kill().await {
                tracing::debug!(game_id = self.game_id, error = %e, "Failed to kill game host");
            }
        }
        Ok(())
    }
}
