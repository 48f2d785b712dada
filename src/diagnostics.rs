//! Diagnostics collection for container loading and saving.
//!
//! Most irregularities in a map container are not fatal: an unknown extra header is carried
//! along opaquely, a feature table that claims more records than the file can hold is
//! treated as empty, an unreadable section source falls back to the next strategy. Each of
//! these is reported once, here, instead of being raised as an error.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - append-only container for diagnostic entries
//! - [`Diagnostic`] - individual entry with severity, category and optional file offset
//! - [`DiagnosticSeverity`] - severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - which part of the container the entry concerns
//!
//! Every entry is also forwarded to the `log` facade at the matching level, so callers that
//! only install a logger still see the messages, gated by whatever verbosity they chose.
//!
//! # Usage Examples
//!
//! ```rust
//! use smfkit::diagnostics::{DiagnosticCategory, Diagnostics};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.warning(DiagnosticCategory::ExtraHeader, "unknown extra header tag 7");
//!
//! assert!(diagnostics.has_warnings());
//! for entry in diagnostics.iter() {
//!     println!("{entry}");
//! }
//! ```

use std::fmt::{self, Write};

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational observation, nothing was changed.
    Info,

    /// Something was ignored, replaced or zeroed to keep going.
    Warning,

    /// A part of the container could not be used at all.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Part of the container a diagnostic relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// The fixed header record.
    Header,

    /// The extra header chain.
    ExtraHeader,

    /// Section offsets and sizes.
    Layout,

    /// Raster section content.
    Section,

    /// The tile-file reference table.
    TileTable,

    /// The feature list.
    Features,

    /// Acquisition of a section source.
    Source,

    /// Anything else.
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Header => write!(f, "Header"),
            DiagnosticCategory::ExtraHeader => write!(f, "ExtraHeader"),
            DiagnosticCategory::Layout => write!(f, "Layout"),
            DiagnosticCategory::Section => write!(f, "Section"),
            DiagnosticCategory::TileTable => write!(f, "TileTable"),
            DiagnosticCategory::Features => write!(f, "Features"),
            DiagnosticCategory::Source => write!(f, "Source"),
            DiagnosticCategory::General => write!(f, "General"),
        }
    }
}

/// A single diagnostic entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Optional file offset where the issue was found.
    pub offset: Option<u64>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic source
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            offset: None,
        }
    }

    /// Adds file offset information to the diagnostic.
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(offset) = self.offset {
            write!(f, " (offset: 0x{:08x})", offset)?;
        }

        Ok(())
    }
}

/// Append-only container for diagnostic entries.
///
/// Uses `boxcar::Vec` internally so entries can be appended through a shared reference; a
/// document and the source views it opens can all report into the same collection.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an informational diagnostic.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Adds a warning diagnostic.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds an error diagnostic.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Adds a diagnostic entry directly, forwarding it to the `log` facade.
    pub fn push(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            DiagnosticSeverity::Info => log::info!("{diagnostic}"),
            DiagnosticSeverity::Warning => log::warn!("{diagnostic}"),
            DiagnosticSeverity::Error => log::error!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any error-level diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Error)
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Warning)
    }

    /// Returns the number of info-level diagnostics.
    pub fn info_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Info)
    }

    fn count_severity(&self, severity: DiagnosticSeverity) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Returns an iterator over all diagnostics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} info(s)",
            self.error_count(),
            self.warning_count(),
            self.info_count()
        );

        for diag in self.iter() {
            let _ = writeln!(output, "  {diag}");
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::Features,
            "Test message",
        );

        assert_eq!(diag.severity, DiagnosticSeverity::Warning);
        assert_eq!(diag.category, DiagnosticCategory::Features);
        assert_eq!(diag.message, "Test message");
        assert!(diag.offset.is_none());
    }

    #[test]
    fn test_diagnostics_container() {
        let diagnostics = Diagnostics::new();

        diagnostics.info(DiagnosticCategory::General, "Info message");
        diagnostics.warning(DiagnosticCategory::ExtraHeader, "Warning message");
        diagnostics.error(DiagnosticCategory::Section, "Error message");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.info_count(), 1);
        assert!(diagnostics.has_errors());
        assert!(diagnostics.has_warnings());
        assert!(diagnostics.has_any());
    }

    #[test]
    fn test_diagnostics_by_category() {
        let diagnostics = Diagnostics::new();

        diagnostics.warning(DiagnosticCategory::Features, "count too large");
        diagnostics.warning(DiagnosticCategory::Features, "bad type index");
        diagnostics.info(DiagnosticCategory::TileTable, "tile count mismatch");

        assert_eq!(diagnostics.by_category(DiagnosticCategory::Features).len(), 2);
        assert_eq!(diagnostics.by_category(DiagnosticCategory::TileTable).len(), 1);
        assert!(diagnostics.by_category(DiagnosticCategory::Header).is_empty());
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::ExtraHeader,
            "Unknown tag 7",
        )
        .with_offset(0x50);

        let display = format!("{}", diag);
        assert!(display.contains("WARN"));
        assert!(display.contains("ExtraHeader"));
        assert!(display.contains("Unknown tag 7"));
        assert!(display.contains("0x00000050"));
    }

    #[test]
    fn test_summary_lists_entries() {
        let diagnostics = Diagnostics::new();
        diagnostics.warning(DiagnosticCategory::Source, "height.png unreadable");

        let summary = diagnostics.summary();
        assert!(summary.contains("0 error(s), 1 warning(s), 0 info(s)"));
        assert!(summary.contains("height.png unreadable"));
    }
}
