//! Operator-facing side channel for validation failures

use shared::{ErrorMessageSet, FieldError};
use tracing::warn;

/// Receives every message of a failed validation.
///
/// Implementations must not panic; recording is fire-and-forget.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, error: &FieldError);
}

/// Default sink: one `warn` event per message
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, error: &FieldError) {
        warn!(field = %error.field, message = %error.message, "Validation error");
    }
}

/// Forward each message of a non-empty set to the sink, in order
pub fn log_errors(errors: Option<&ErrorMessageSet>, sink: &dyn DiagnosticSink) {
    let Some(errors) = errors else {
        return;
    };
    for error in errors {
        sink.record(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl DiagnosticSink for Lines {
        fn record(&self, error: &FieldError) {
            self.0.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn test_logs_every_message_in_order() {
        let mut errors = ErrorMessageSet::new();
        errors.add("email", "is required").add("name", "is too long");

        let sink = Lines::default();
        log_errors(Some(&errors), &sink);

        assert_eq!(
            *sink.0.lock().unwrap(),
            vec!["email: is required", "name: is too long"]
        );
    }

    #[test]
    fn test_absent_or_empty_logs_nothing() {
        let sink = Lines::default();
        log_errors(None, &sink);
        log_errors(Some(&ErrorMessageSet::new()), &sink);
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
