//! Custom error handlers that replace the default alert path.

use std::fmt;

use crate::alerts::trace::{ErrorContext, TraceFormatter};

/// Error returned by a custom handler. `AppLogger::exception` hands it back
/// to its caller untouched.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Called by `exception` instead of sending the default alert.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, trace: &TraceFormatter, context: &ErrorContext<'_>) -> Result<(), HandlerError>;
}

struct FnHandler<F>(F);

impl<F> ErrorHandler for FnHandler<F>
where
    F: Fn(&TraceFormatter, &ErrorContext<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, trace: &TraceFormatter, context: &ErrorContext<'_>) -> Result<(), HandlerError> {
        (self.0)(trace, context)
    }
}

/// A named handler ready to be registered on a logger.
pub struct CustomErrorHandler {
    name: String,
    handler: Box<dyn ErrorHandler>,
}

impl CustomErrorHandler {
    pub fn new(name: impl Into<String>, handler: impl ErrorHandler + 'static) -> Self {
        Self {
            name: name.into(),
            handler: Box::new(handler),
        }
    }

    /// Wrap a closure taking the trace formatter and the error context.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&TraceFormatter, &ErrorContext<'_>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self::new(name, FnHandler(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self, trace: &TraceFormatter, context: &ErrorContext<'_>) -> Result<(), HandlerError> {
        self.handler.handle(trace, context)
    }
}

impl fmt::Debug for CustomErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomErrorHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_from_fn_receives_context() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let handler = CustomErrorHandler::from_fn("count", move |trace, context| {
            assert!(trace.text(context).contains("boom"));
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let context = ErrorContext::capture("failed", &err);
        handler.handle(&TraceFormatter, &context).unwrap();

        assert_eq!(handler.name(), "count");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_error_is_returned() {
        let handler = CustomErrorHandler::from_fn("fails", |_, _| Err("handler broke".into()));
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let context = ErrorContext::capture("failed", &err);

        let result = handler.handle(&TraceFormatter, &context);
        assert_eq!(result.unwrap_err().to_string(), "handler broke");
    }
}
