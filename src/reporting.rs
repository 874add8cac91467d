use std::sync::Mutex;

use crate::error::DashError;

/// Receives every error a service runs into.
pub trait ErrorSink: Send + Sync {
    fn post(&self, error: &DashError);
}

/// Logs errors through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn post(&self, error: &DashError) {
        tracing::error!("{}", error);
    }
}

/// Keeps every posted error, mostly useful in tests.
#[derive(Debug, Default)]
pub struct RecordingErrorSink {
    errors: Mutex<Vec<DashError>>,
}

impl RecordingErrorSink {
    pub fn errors(&self) -> Vec<DashError> {
        self.errors
            .lock()
            .map(|errors| errors.clone())
            .unwrap_or_default()
    }
}

impl ErrorSink for RecordingErrorSink {
    fn post(&self, error: &DashError) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(error.clone());
        }
        tracing::debug!("recorded error: {}", error);
    }
}
