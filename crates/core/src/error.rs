use std::path::PathBuf;
use thiserror::Error;

/// Location of a line inside a named source file, used in error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// File identity (short name or path as given by the caller).
    pub file: String,
    /// Line number (1-indexed)
    pub line: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Errors emitted while reading a metadata section.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// YAML failed to parse.
    #[error("metadata parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("metadata must be a key/value mapping at the top level")]
    InvalidRootType,
}

/// Errors that can occur while building a cento project.
#[derive(Debug, Error)]
pub enum CentoError {
    /// The outline (configuration) file could not be read.
    #[error("settings file {} not found: {source}", path.display())]
    ConfigNotFound {
        /// Offending path
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },
    /// The outline file was readable but is not valid INI.
    #[error("settings file {} is malformed: {message}", path.display())]
    ConfigParse {
        /// Offending path
        path: PathBuf,
        /// Parser message
        message: String,
    },
    /// A required top-level section is absent from the outline.
    #[error("outline has no [{section}] section")]
    MissingSection {
        /// Name of the missing section
        section: String,
    },
    /// A key that cannot name an outline section.
    #[error("the key {key:?} cannot be used as an outline section name")]
    UnhashableKey {
        /// Rejected key
        key: String,
    },
    /// A project option whose value has the wrong shape.
    #[error("option {key:?} has invalid value {value:?}: expected {expected}")]
    InvalidOption {
        /// Option name
        key: String,
        /// Rejected value
        value: String,
        /// What the option accepts
        expected: &'static str,
    },
    /// Deleting or reading a key that does not exist.
    #[error("key {key:?} not found")]
    KeyNotFound {
        /// Missing key
        key: String,
    },
    /// A section kind name with no variant or no registered divider.
    #[error("unknown section kind {kind:?}")]
    UnknownKind {
        /// Requested kind
        kind: String,
    },
    /// A style name with no built-in definition.
    #[error("unknown style {name:?}")]
    UnknownStyle {
        /// Requested style
        name: String,
    },
    /// A divider table that breaks the one-marker-per-kind rules.
    #[error("invalid divider for {kind}: {reason}")]
    InvalidDivider {
        /// Kind whose marker was rejected
        kind: String,
        /// Why the marker was rejected
        reason: String,
    },
    /// A marker line that is present but truncated.
    #[error("malformed section marker at {location}: {line_text:?} looks like a truncated {marker:?}")]
    MalformedSection {
        /// File and line of the marker
        location: SourceLocation,
        /// Marker the line was meant to be
        marker: String,
        /// Text of the offending line
        line_text: String,
    },
    /// A source file could not be read.
    #[error("source file {} not found: {source}", path.display())]
    SourceNotFound {
        /// Offending path
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },
    /// The metadata section of a file could not be parsed.
    #[error("invalid metadata in {file}: {source}")]
    Metadata {
        /// File identity
        file: String,
        /// Underlying metadata failure
        #[source]
        source: MetadataError,
    },
    /// The markup converter rejected a section.
    #[error("failed to convert {kind} section of {file}: {message}")]
    Conversion {
        /// File identity
        file: String,
        /// Section kind name
        kind: String,
        /// Converter message
        message: String,
    },
}

impl CentoError {
    /// Create an unknown kind error
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind { kind: kind.into() }
    }

    /// Create a missing section error
    pub fn missing_section(section: impl Into<String>) -> Self {
        Self::MissingSection {
            section: section.into(),
        }
    }

    /// Create a key-not-found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create a malformed section error with location
    pub fn malformed_section(
        file: impl Into<String>,
        line: usize,
        marker: impl Into<String>,
        line_text: impl Into<String>,
    ) -> Self {
        Self::MalformedSection {
            location: SourceLocation::new(file, line),
            marker: marker.into(),
            line_text: line_text.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = CentoError> = std::result::Result<T, E>;
