//! Driver process transport and the concrete [`Session`] implementation.
//!
//! A [`DriverProcess`] owns one helper child process and speaks the
//! line-delimited JSON protocol with it. Anything transport-shaped (pipe
//! closed, no reply within the command timeout, unparseable reply) maps to
//! `SessionUnresponsive` so the pool discards the session; in-band error
//! replies are page-level failures and leave the session in circulation.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::config::{Config, DEFAULT_COMMAND_TIMEOUT, DEFAULT_NAVIGATION_TIMEOUT};
use crate::error::{PrerenderError, Result};
use crate::pool::SessionFactory;
use crate::session::Session;

use super::playwright::{map_spawn_error, DriverReply, DRIVER_SCRIPT};

/// Options for spawning driver helper processes.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// The Node.js command to use (default: "node").
    pub node_command: String,
    /// Page-load ceiling passed to the helper.
    pub navigation_timeout: Duration,
    /// Ceiling for one command round-trip over the pipe.
    pub command_timeout: Duration,
    /// File the helper's stderr is appended to.
    pub log_path: PathBuf,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            node_command: "node".to_string(),
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            log_path: PathBuf::from("prerender-driver.log"),
        }
    }
}

impl From<&Config> for DriverOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            node_command: cfg.node_command.clone(),
            navigation_timeout: cfg.navigation_timeout,
            command_timeout: cfg.command_timeout,
            log_path: PathBuf::from(&cfg.driver_log_path),
        }
    }
}

/// One live helper process. Killed on drop, so a discarded session never
/// leaks a browser.
#[derive(Debug)]
pub struct DriverProcess {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    command_timeout: Duration,
    next_id: u64,
}

impl DriverProcess {
    /// Spawn a helper and wait for its ready line.
    pub async fn spawn(options: &DriverOptions) -> Result<Self> {
        let log = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&options.log_path)
            .map_err(|e| {
                PrerenderError::config(format!(
                    "Failed to open driver log {}: {}",
                    options.log_path.display(),
                    e
                ))
            })?;

        let mut child = Command::new(&options.node_command)
            .arg("-e")
            .arg(DRIVER_SCRIPT)
            .arg(options.navigation_timeout.as_millis().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(log))
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| map_spawn_error(err, &options.node_command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PrerenderError::pool("driver stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PrerenderError::pool("driver stdout unavailable"))?;

        let mut process = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            command_timeout: options.command_timeout,
            next_id: 1,
        };

        // Browser launch happens before the ready line; a helper that dies
        // here (missing playwright, no chromium) surfaces as a pool error.
        let ready = process.read_reply().await.map_err(|e| {
            PrerenderError::pool(format!("driver failed to start: {}", e))
        })?;
        if !ready.is_ok() {
            return Err(PrerenderError::pool(format!(
                "driver failed to start: {}",
                ready.message()
            )));
        }

        debug!("driver process started");
        Ok(process)
    }

    async fn request(&mut self, mut payload: Value) -> Result<DriverReply> {
        let id = self.next_id;
        self.next_id += 1;
        payload["id"] = json!(id);

        let mut line = serde_json::to_string(&payload)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| PrerenderError::SessionUnresponsive(format!("write failed: {}", e)))?;

        // A command abandoned at the render deadline can leave its reply in
        // the pipe; skip anything carrying an older id.
        loop {
            let reply = self.read_reply().await?;
            match reply.id {
                Some(reply_id) if reply_id != id => {
                    debug!(reply_id, expected = id, "skipping stale driver reply");
                }
                _ => return Ok(reply),
            }
        }
    }

    async fn read_reply(&mut self) -> Result<DriverReply> {
        let line = tokio::time::timeout(self.command_timeout, self.stdout.next_line())
            .await
            .map_err(|_| {
                PrerenderError::SessionUnresponsive(format!(
                    "no reply within {:?}",
                    self.command_timeout
                ))
            })?
            .map_err(|e| PrerenderError::SessionUnresponsive(format!("read failed: {}", e)))?
            .ok_or_else(|| {
                PrerenderError::SessionUnresponsive("driver closed its stdout".to_string())
            })?;

        serde_json::from_str(&line).map_err(|e| {
            PrerenderError::SessionUnresponsive(format!("unparseable driver reply: {}", e))
        })
    }
}

/// Browser session backed by a [`DriverProcess`].
pub struct DriverSession {
    process: DriverProcess,
}

impl DriverSession {
    pub fn new(process: DriverProcess) -> Self {
        Self { process }
    }
}

#[async_trait]
impl Session for DriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let reply = self
            .process
            .request(json!({ "cmd": "navigate", "url": url }))
            .await?;
        if !reply.is_ok() {
            return Err(PrerenderError::Navigation(reply.message()));
        }
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let reply = self
            .process
            .request(json!({ "cmd": "eval", "expression": expression }))
            .await?;
        if !reply.is_ok() {
            return Err(PrerenderError::Evaluation(reply.message()));
        }
        Ok(reply.value.unwrap_or(Value::Null))
    }

    async fn content(&mut self) -> Result<String> {
        let reply = self.process.request(json!({ "cmd": "content" })).await?;
        if !reply.is_ok() {
            return Err(PrerenderError::Evaluation(reply.message()));
        }
        match reply.value {
            Some(Value::String(html)) => Ok(html),
            other => Err(PrerenderError::SessionUnresponsive(format!(
                "driver returned non-string content: {:?}",
                other
            ))),
        }
    }
}

/// Spawns [`DriverSession`]s for the pool.
pub struct DriverSessionFactory {
    options: DriverOptions,
}

impl DriverSessionFactory {
    pub fn new(options: DriverOptions) -> Self {
        Self { options }
    }

    pub fn shared(options: DriverOptions) -> Arc<Self> {
        Arc::new(Self::new(options))
    }
}

#[async_trait]
impl SessionFactory for DriverSessionFactory {
    async fn create(&self) -> Result<Box<dyn Session>> {
        let process = DriverProcess::spawn(&self.options).await?;
        Ok(Box::new(DriverSession::new(process)))
    }
}
