use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use domain::alert::entity::AlertState;
use domain::alert::error::StateLogError;
use domain::alert::fingerprint::Fingerprint;

use crate::secondary::metrics_port::{MarkerMetrics, StateLogMetrics};
use crate::secondary::state_appender::StateAppender;

/// No-op implementation of all metrics sub-traits for use in tests.
pub struct NoopMetrics;

impl MarkerMetrics for NoopMetrics {}
impl StateLogMetrics for NoopMetrics {}

/// One call received by a [`RecordingAppender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendCall {
    Append(Fingerprint, AlertState),
    AppendInhibited(Fingerprint, Vec<String>),
}

/// Appender that records every call instead of persisting it.
#[derive(Default)]
pub struct RecordingAppender {
    calls: Mutex<Vec<AppendCall>>,
    pub flush_calls: AtomicU32,
    pub close_calls: AtomicU32,
}

impl RecordingAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the calls received so far, in order.
    pub fn calls(&self) -> Vec<AppendCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Calls received for one fingerprint, in order.
    pub fn calls_for(&self, fingerprint: Fingerprint) -> Vec<AppendCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                AppendCall::Append(fp, _) | AppendCall::AppendInhibited(fp, _) => {
                    *fp == fingerprint
                }
            })
            .collect()
    }

    fn record(&self, call: AppendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl StateAppender for RecordingAppender {
    fn append(&self, fingerprint: Fingerprint, state: AlertState) {
        self.record(AppendCall::Append(fingerprint, state));
    }

    fn append_inhibited(&self, fingerprint: Fingerprint, inhibited_by: &[String]) {
        self.record(AppendCall::AppendInhibited(
            fingerprint,
            inhibited_by.to_vec(),
        ));
    }

    fn flush(&self) -> Result<(), StateLogError> {
        self.flush_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn close(&self) -> Result<(), StateLogError> {
        self.close_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
