//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use truetrack::ConfigError;
use truetrack_scan::{ErrorKind, VerifyError};

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// Stable machine-readable code for `--json` output
    pub code: Option<&'static str>,
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// The scan session ended without a decoded code
    pub fn scan_failed(kind: ErrorKind) -> Self {
        let err = Self::new(kind.notice())
            .with_code(kind.as_str())
            .with_context("The scan session closed before a code was decoded");
        match kind {
            ErrorKind::PermissionDenied => err.with_suggestions([
                "TRY: Allow camera access and run the scan again".to_string(),
                "TRY: Check [camera] deny_permission in config.toml: truetrack config".to_string(),
            ]),
            ErrorKind::DeviceUnavailable => err.with_suggestions([
                "TRY: Close other applications using the camera".to_string(),
                "TRY: Reconnect the camera and run the scan again".to_string(),
            ]),
            ErrorKind::InvalidPayload | ErrorKind::Unknown => {
                err.with_suggestion("TRY: Run the scan again")
            }
        }
    }

    /// Decoded text is not a TrueTrack code
    pub fn invalid_payload(payload: &str, err: &VerifyError) -> Self {
        let shown: String = payload.chars().take(48).collect();
        Self::new(format!("Not a TrueTrack code: '{}'", shown))
            .with_code(err.kind().as_str())
            .with_context(err.to_string())
            .with_suggestions([
                "TRY: TrueTrack codes start with TT-, e.g. TT-12345".to_string(),
                "TRY: Verify a known code: truetrack verify TT-12345".to_string(),
            ])
    }

    /// config.toml exists but cannot be used
    pub fn config_invalid(err: &ConfigError) -> Self {
        Self::new(format!("Cannot load configuration: {}", err.path().display()))
            .with_code("config_invalid")
            .with_context(err.to_string())
            .with_suggestions([
                format!("TRY: Fix or remove the file: {}", err.path().display()),
                "TRY: Valid sections are [scan] and [camera]".to_string(),
            ])
    }
}

impl From<ConfigError> for HelpfulError {
    fn from(err: ConfigError) -> Self {
        Self::config_invalid(&err)
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print a command failure as `{"error": {...}}` on stdout.
pub fn print_json_error(err: &anyhow::Error) {
    let body = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": {
                "code": helpful.code,
                "message": helpful.message,
                "context": helpful.context,
                "suggestions": helpful.suggestions,
            }
        }),
        None => serde_json::json!({
            "error": {
                "code": null,
                "message": format!("{:#}", err),
                "context": null,
                "suggestions": [],
            }
        }),
    };
    println!("{:#}", body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While scanning")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While scanning"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_scan_failed_carries_kind_code() {
        let err = HelpfulError::scan_failed(ErrorKind::PermissionDenied);
        assert_eq!(err.code, Some("permission_denied"));
        assert!(err.message.contains("camera"));
        assert!(err.suggestions.iter().all(|s| s.starts_with("TRY:")));
    }

    #[test]
    fn test_invalid_payload_truncates_long_input() {
        let payload = "x".repeat(500);
        let verify_err = VerifyError::InvalidPayload {
            reason: "too long".into(),
        };
        let err = HelpfulError::invalid_payload(&payload, &verify_err);
        assert_eq!(err.code, Some("invalid_payload"));
        assert!(err.message.len() < 100);
    }
}
