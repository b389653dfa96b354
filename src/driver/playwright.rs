//! Playwright helper integration.
//!
//! Each browser session is one long-lived Node process running the embedded
//! helper script: a single Chromium page driven through a line-delimited
//! JSON command loop on stdin/stdout. This module holds the script, the
//! availability preflights for Node and Playwright, and the wire types.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{PrerenderError, Result};

/// Helper script run with `node -e`. argv[1] is the navigation timeout in
/// milliseconds. Prints one ready line once the browser is up, then answers
/// one JSON reply per JSON request line.
pub(crate) const DRIVER_SCRIPT: &str = r#"
const [, navTimeoutArg] = process.argv;
const navTimeout = parseInt(navTimeoutArg, 10) || 30000;

async function run() {
  const { chromium } = require('playwright');
  const browser = await chromium.launch({ headless: true });
  const page = await browser.newPage();
  const write = (payload) => process.stdout.write(JSON.stringify(payload) + '\n');
  write({ status: 'ok' });

  const readline = require('readline');
  const rl = readline.createInterface({ input: process.stdin, terminal: false });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let request;
    try {
      request = JSON.parse(line);
    } catch (err) {
      write({ status: 'error', message: 'malformed request line' });
      continue;
    }
    const reply = (payload) => write(Object.assign({ id: request.id }, payload));
    try {
      switch (request.cmd) {
        case 'navigate':
          await page.goto(request.url, { waitUntil: 'load', timeout: navTimeout });
          reply({ status: 'ok' });
          break;
        case 'eval': {
          const value = await page.evaluate(request.expression);
          reply({ status: 'ok', value: value === undefined ? null : value });
          break;
        }
        case 'content':
          reply({ status: 'ok', value: await page.content() });
          break;
        case 'close':
          await browser.close();
          process.exit(0);
        default:
          reply({ status: 'error', message: 'unknown command ' + request.cmd });
      }
    } catch (err) {
      reply({ status: 'error', message: err && err.message ? err.message : String(err) });
    }
  }
  await browser.close();
}

run().catch((err) => {
  console.error(err && err.message ? err.message : String(err));
  process.exit(1);
});
"#;

/// Timeout for checking node/playwright availability.
pub(crate) const NODE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Script to check if Playwright is installed.
const PLAYWRIGHT_CHECK_SCRIPT: &str = "require('playwright'); process.stdout.write('ok');";

/// One reply line from the helper. `id` echoes the request id so stale
/// replies from abandoned commands can be skipped.
#[derive(Debug, Deserialize)]
pub(crate) struct DriverReply {
    pub status: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DriverReply {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    pub fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("driver replied with status {}", self.status))
    }
}

/// Maps a spawn error to a configuration or IO error.
pub(crate) fn map_spawn_error(err: io::Error, command: &str) -> PrerenderError {
    if err.kind() == io::ErrorKind::NotFound {
        PrerenderError::config(format!(
            "Unable to spawn Playwright helper; '{}' was not found on PATH",
            command
        ))
    } else {
        PrerenderError::Io(err)
    }
}

/// Ensures Node.js is available on the system.
pub async fn ensure_node_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.status())
        .await
        .map_err(|_| {
            PrerenderError::config(format!(
                "Timed out checking node availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !status.success() {
        return Err(PrerenderError::config(format!(
            "Node command {:?} is not available (exit {})",
            node_command, status
        )));
    }

    Ok(())
}

/// Ensures the Playwright npm package is installed.
pub async fn ensure_playwright_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("-e")
        .arg(PLAYWRIGHT_CHECK_SCRIPT)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            PrerenderError::config(format!(
                "Timed out checking Playwright availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr
            .to_ascii_lowercase()
            .contains("cannot find module 'playwright'")
        {
            return Err(PrerenderError::config(
                "Playwright npm package is missing; install with `npm install playwright` and `npx playwright install chromium`.",
            ));
        }
        return Err(PrerenderError::config(format!(
            "Playwright check exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}
