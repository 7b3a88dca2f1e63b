//! Structured warnings for partially extracted records.

use std::fmt;

/// A field that could not be extracted for a record.
///
/// Extraction never aborts on a missing node; it records one of these and
/// carries on with the field left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWarning {
    /// Episode link, if the record got far enough to have one.
    pub link: Option<String>,
    /// Name of the field or container that was missing.
    pub field: &'static str,
    pub message: String,
}

impl ExtractionWarning {
    pub fn new(link: Option<&str>, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            link: link.map(str::to_string),
            field,
            message: message.into(),
        }
    }

    /// Emit this warning through tracing.
    pub fn log(&self) {
        tracing::warn!(
            link = self.link.as_deref().unwrap_or("-"),
            field = self.field,
            "{}",
            self.message
        );
    }
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.link {
            Some(link) => write!(f, "{} [{}]: {}", link, self.field, self.message),
            None => write!(f, "[{}]: {}", self.field, self.message),
        }
    }
}
