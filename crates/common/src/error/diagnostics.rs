use std::{borrow::Cow, fmt, panic::Location};

/// Human-friendly error message that automatically records the call-site.
///
/// Call [`DiagnosticMessage::new`] or the [`diag!`] macro to create an
/// instance. A diagnostic may also name the resource address it is about
/// (e.g. `google_pubsub_topic.transformer_queue`) via
/// [`DiagnosticMessage::for_subject`], which is printed ahead of the message.
#[derive(Clone, Debug)]
pub struct DiagnosticMessage {
    message: Cow<'static, str>,
    subject: Option<String>,
    location: &'static Location<'static>,
}

impl DiagnosticMessage {
    /// Create a message and record the caller location.
    #[track_caller]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            subject: None,
            location: Location::caller(),
        }
    }

    /// Create a message attached to a resource address or config field.
    #[track_caller]
    pub fn for_subject(subject: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            subject: Some(subject.into()),
            location: Location::caller(),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(subject) = &self.subject {
            write!(f, "[{}] ", subject)?;
        }
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// Convenience macro for creating [`DiagnosticMessage`] values with `format!`
/// style syntax while capturing the file/line automatically.
#[macro_export]
macro_rules! diag {
    ($msg:literal $(,)?) => {
        $crate::error::diagnostics::DiagnosticMessage::new($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::diagnostics::DiagnosticMessage::new(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_subject_and_location() {
        let msg = DiagnosticMessage::for_subject("google_pubsub_topic.queue", "not declared");
        let rendered = msg.to_string();
        assert!(rendered.starts_with("[google_pubsub_topic.queue] not declared (at "));
        assert!(rendered.contains("diagnostics.rs"));
    }

    #[test]
    fn diag_macro_formats_arguments() {
        let msg = diag!("missing {}", "cities");
        assert_eq!(msg.message(), "missing cities");
        assert!(msg.subject().is_none());
    }
}
