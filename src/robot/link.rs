//! Freshness of the operator link.
//!
//! The link delivers intents at its own pace. [`LinkMonitor`] keeps the latest one with
//! its arrival time and reports it as disconnected once it has gone stale.
use super::commands::Intent;
use crate::config::INTENT_TIMEOUT_MS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkMonitor {
    intent: Intent,
    received_ms: Option<u64>,
    timeout_ms: u64,
}

impl Default for LinkMonitor {
    fn default() -> Self {
        Self::new(INTENT_TIMEOUT_MS)
    }
}

impl LinkMonitor {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            intent: Intent::default(),
            received_ms: None,
            timeout_ms,
        }
    }

    /// Stores `intent` as the latest frame, received at `now_ms`.
    pub fn receive(&mut self, intent: Intent, now_ms: u64) {
        self.intent = intent;
        self.received_ms = Some(now_ms);
    }

    /// The operator hung up; nothing received so far counts any more.
    pub fn close(&mut self) {
        self.received_ms = None;
    }

    /// Intent to feed the engine at `now_ms`.
    ///
    /// Older than the timeout, or after [`LinkMonitor::close`], the last intent comes
    /// back with `connected` cleared.
    pub fn current(&self, now_ms: u64) -> Intent {
        let fresh = self
            .received_ms
            .is_some_and(|at| now_ms.saturating_sub(at) <= self.timeout_ms);
        Intent {
            connected: fresh && self.intent.connected,
            ..self.intent
        }
    }
}
