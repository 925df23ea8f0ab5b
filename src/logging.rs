//! Structured error logging
//!
//! A thin layer over `tracing` that records every surfaced [`BlueprintError`]
//! with its id, kind, location, context, suggestions and a timestamp. Logging
//! can be disabled globally; error-id generation is unaffected by the switch.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::error::BlueprintError;

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

/// Severity at which an error is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

pub fn enable() {
    LOGGING_ENABLED.store(true, Ordering::SeqCst);
}

pub fn disable() {
    LOGGING_ENABLED.store(false, Ordering::SeqCst);
}

pub fn is_enabled() -> bool {
    LOGGING_ENABLED.load(Ordering::SeqCst)
}

/// Record an error with full context at the given severity
pub fn log_error(err: &BlueprintError, severity: Severity) {
    if !is_enabled() {
        return;
    }

    let timestamp = chrono::Utc::now().to_rfc3339();
    let context = serde_json::to_string(&err.context).unwrap_or_default();
    let suggestions = err.suggestions.join("; ");
    let (file, line) = match &err.location {
        Some(loc) => (loc.file.clone().unwrap_or_default(), loc.line),
        None => (String::new(), 0),
    };
    let backtrace = std::backtrace::Backtrace::capture().to_string();

    match severity {
        Severity::Debug => debug!(
            error_id = %err.error_id,
            kind = %err.category(),
            %file,
            line,
            %context,
            %suggestions,
            %timestamp,
            %backtrace,
            "{}", err.kind
        ),
        Severity::Info => info!(
            error_id = %err.error_id,
            kind = %err.category(),
            %file,
            line,
            %context,
            %suggestions,
            %timestamp,
            "{}", err.kind
        ),
        Severity::Warning => warn!(
            error_id = %err.error_id,
            kind = %err.category(),
            %file,
            line,
            %context,
            %suggestions,
            %timestamp,
            "{}", err.kind
        ),
        Severity::Error => error!(
            error_id = %err.error_id,
            kind = %err.category(),
            %file,
            line,
            %context,
            %suggestions,
            %timestamp,
            %backtrace,
            "{}", err.kind
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex, MutexGuard};

    // Tests toggling the global switch must not interleave.
    static FLAG_LOCK: Mutex<()> = Mutex::new(());

    fn flag_guard() -> MutexGuard<'static, ()> {
        FLAG_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_log_error_emits_id_and_context() {
        let _guard = flag_guard();
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();

        let err = BlueprintError::internal("emitter exploded")
            .with_location(Some("draft.yaml".to_string()), 7)
            .with_suggestion("check the output directory");
        tracing::subscriber::with_default(subscriber, || {
            enable();
            log_error(&err, Severity::Error);
        });

        let output = capture.contents();
        assert!(output.contains(&err.error_id));
        assert!(output.contains("emitter exploded"));
        assert!(output.contains("draft.yaml"));
        assert!(output.contains("check the output directory"));
    }

    #[test]
    fn test_disabled_logger_emits_nothing() {
        let _guard = flag_guard();
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();

        let err = BlueprintError::internal("quiet");
        tracing::subscriber::with_default(subscriber, || {
            disable();
            log_error(&err, Severity::Error);
            enable();
        });

        assert!(capture.contents().is_empty());
    }

    #[test]
    fn test_disable_does_not_affect_error_ids() {
        let _guard = flag_guard();
        disable();
        let err = BlueprintError::internal("silent");
        log_error(&err, Severity::Error);
        assert!(!err.error_id.is_empty());
        enable();
    }

    #[test]
    fn test_toggle() {
        let _guard = flag_guard();
        enable();
        assert!(is_enabled());
        disable();
        assert!(!is_enabled());
        enable();
    }
}
