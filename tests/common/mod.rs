//! Scripted pool and session doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use prerender_lib::{PrerenderError, ReleaseOptions, Result, Session, SessionPool};
use serde_json::{json, Value};

/// What `navigate` does on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigateBehavior {
    #[default]
    Succeed,
    /// Page-level failure; the session stays usable.
    PageError,
    /// Transport-level failure; the session should be discarded.
    Unresponsive,
    /// Never resolves, forcing the attempt deadline to fire.
    Hang,
}

/// Scripted behavior for every session the mock pool hands out.
#[derive(Debug, Clone)]
pub struct SessionScript {
    pub navigate: NavigateBehavior,
    /// Successive readiness probe values; the last one repeats forever.
    pub readiness: Vec<Value>,
    pub marker_present: bool,
    pub html: String,
    /// Fail DOM extraction with a transport error.
    pub content_unresponsive: bool,
}

impl Default for SessionScript {
    fn default() -> Self {
        Self {
            navigate: NavigateBehavior::Succeed,
            readiness: vec![json!(true)],
            marker_present: true,
            html: "<html><body id=\"prerender-status\">ok</body></html>".to_string(),
            content_unresponsive: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub discarded: AtomicUsize,
    pub probes: AtomicUsize,
    pub navigations: AtomicUsize,
}

impl Counters {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

pub struct MockSession {
    script: SessionScript,
    counters: Arc<Counters>,
    probe_index: Mutex<usize>,
}

#[async_trait]
impl Session for MockSession {
    async fn navigate(&mut self, _url: &str) -> Result<()> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        match self.script.navigate {
            NavigateBehavior::Succeed => Ok(()),
            NavigateBehavior::PageError => {
                Err(PrerenderError::Navigation("net::ERR_FAILED".to_string()))
            }
            NavigateBehavior::Unresponsive => Err(PrerenderError::SessionUnresponsive(
                "driver pipe closed".to_string(),
            )),
            NavigateBehavior::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        // The orchestrator evaluates two expressions: the readiness signal
        // and the marker-presence check.
        if expression.contains("querySelector") {
            return Ok(json!(self.script.marker_present));
        }

        self.counters.probes.fetch_add(1, Ordering::SeqCst);
        let mut index = self.probe_index.lock().unwrap();
        let value = self
            .script
            .readiness
            .get(*index)
            .or_else(|| self.script.readiness.last())
            .cloned()
            .unwrap_or(Value::Null);
        *index += 1;
        Ok(value)
    }

    async fn content(&mut self) -> Result<String> {
        if self.script.content_unresponsive {
            return Err(PrerenderError::SessionUnresponsive(
                "no reply from driver".to_string(),
            ));
        }
        Ok(self.script.html.clone())
    }
}

/// Pool double that mints a fresh scripted session per acquire and counts
/// every lifecycle step.
pub struct MockPool {
    script: SessionScript,
    pub counters: Arc<Counters>,
}

impl MockPool {
    pub fn new(script: SessionScript) -> Self {
        Self {
            script,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn shared(script: SessionScript) -> Arc<Self> {
        Arc::new(Self::new(script))
    }
}

#[async_trait]
impl SessionPool for MockPool {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            script: self.script.clone(),
            counters: Arc::clone(&self.counters),
            probe_index: Mutex::new(0),
        }))
    }

    async fn release(&self, session: Box<dyn Session>, opts: ReleaseOptions) -> Result<()> {
        drop(session);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        if opts.discard {
            self.counters.discarded.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn ready(&self) -> Result<()> {
        Ok(())
    }
}
