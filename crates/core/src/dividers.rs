//! Section kinds and the literal marker lines that open them.
//!
//! The registry is a fixed table built once per process. Custom tables can be
//! assembled with [`DividerRegistry::builder`], which validates that markers
//! are non-empty, single-line and distinct.

use crate::error::{CentoError, Result};
use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

/// Category of content a source file may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    /// File-level key/value data.
    Metadata,
    /// Manuscript prose.
    Text,
    /// Footnotes and endnotes accompanying the text.
    Notes,
    /// Speaker slide content.
    Slides,
}

impl SectionKind {
    /// Every built-in kind, in declaration order.
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Metadata,
        SectionKind::Text,
        SectionKind::Notes,
        SectionKind::Slides,
    ];

    /// Lower-case label used in configuration and result maps.
    pub const fn name(self) -> &'static str {
        match self {
            SectionKind::Metadata => "metadata",
            SectionKind::Text => "text",
            SectionKind::Notes => "notes",
            SectionKind::Slides => "slides",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SectionKind {
    type Err = CentoError;

    fn from_str(s: &str) -> Result<Self> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CentoError::unknown_kind(s))
    }
}

static DEFAULT_DIVIDERS: Lazy<DividerRegistry> = Lazy::new(|| DividerRegistry {
    entries: vec![
        (SectionKind::Metadata, "%%METADATA%%".to_string()),
        (SectionKind::Text, "%%TEXT%%".to_string()),
        (SectionKind::Notes, "%%NOTES%%".to_string()),
        (SectionKind::Slides, "%%SLIDES%%".to_string()),
    ],
});

/// Lookup table from section kind to its marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DividerRegistry {
    entries: Vec<(SectionKind, String)>,
}

impl Default for DividerRegistry {
    fn default() -> Self {
        DividerRegistry::standard().clone()
    }
}

impl DividerRegistry {
    /// The process-wide default table.
    pub fn standard() -> &'static DividerRegistry {
        &DEFAULT_DIVIDERS
    }

    /// Start an empty table.
    pub fn builder() -> DividerRegistryBuilder {
        DividerRegistryBuilder::default()
    }

    /// Returns the marker registered for `kind`.
    pub fn lookup(&self, kind: SectionKind) -> Result<&str> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == kind)
            .map(|(_, marker)| marker.as_str())
            .ok_or_else(|| CentoError::unknown_kind(kind.name()))
    }

    /// Returns the marker registered for the kind named `name`.
    pub fn lookup_name(&self, name: &str) -> Result<&str> {
        self.lookup(name.parse()?)
    }

    /// Registered `(kind, marker)` pairs in table order.
    pub fn entries(&self) -> impl Iterator<Item = (SectionKind, &str)> {
        self.entries
            .iter()
            .map(|(kind, marker)| (*kind, marker.as_str()))
    }

    /// Returns the kind whose marker is exactly `line`.
    ///
    /// A trailing `\r` and trailing spaces or tabs are ignored.
    pub fn kind_for_line(&self, line: &str) -> Option<SectionKind> {
        let normalized = normalize_line(line);
        self.entries
            .iter()
            .find(|(_, marker)| marker == normalized)
            .map(|(kind, _)| *kind)
    }

    /// Returns the marker `line` is a truncated copy of, if any.
    ///
    /// A line counts as truncated when it is a strict prefix of a marker and
    /// reaches past the marker's leading punctuation into its label, so a
    /// bare `%%` is prose but `%%TEX` is a broken `%%TEXT%%`.
    ///
    /// Only markers that close with punctuation can be truncated. A prefix of
    /// `## Notes` such as `## Note` reads as an ordinary heading.
    pub fn truncated_marker(&self, line: &str) -> Option<&str> {
        let normalized = normalize_line(line);
        if normalized.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .map(|(_, marker)| marker.as_str())
            .filter(|marker| trailing_punctuation_len(marker) > 0)
            .find(|marker| {
                normalized.len() < marker.len()
                    && marker.starts_with(normalized)
                    && normalized.len() > leading_punctuation_len(marker)
            })
    }
}

/// Builder for custom divider tables.
///
/// A marker that ends in a word (`## Notes`) is matched only in full; lines
/// that stop short of it are prose rather than malformed markers.
#[derive(Debug, Default)]
pub struct DividerRegistryBuilder {
    entries: Vec<(SectionKind, String)>,
}

impl DividerRegistryBuilder {
    /// Register `marker` for `kind`.
    pub fn with_marker(mut self, kind: SectionKind, marker: impl Into<String>) -> Self {
        self.entries.push((kind, marker.into()));
        self
    }

    /// Validate and freeze the table.
    pub fn build(self) -> Result<DividerRegistry> {
        for (index, (kind, marker)) in self.entries.iter().enumerate() {
            let invalid = |reason: &str| CentoError::InvalidDivider {
                kind: kind.name().to_string(),
                reason: reason.to_string(),
            };
            if marker.trim().is_empty() {
                return Err(invalid("marker is empty"));
            }
            if marker.contains(['\n', '\r']) {
                return Err(invalid("marker spans more than one line"));
            }
            if normalize_line(marker) != marker {
                return Err(invalid("marker has trailing whitespace"));
            }
            for (other_kind, other_marker) in &self.entries[..index] {
                if other_kind == kind {
                    return Err(invalid("kind registered twice"));
                }
                if other_marker == marker {
                    return Err(invalid("marker already used by another kind"));
                }
            }
        }
        Ok(DividerRegistry {
            entries: self.entries,
        })
    }
}

fn normalize_line(line: &str) -> &str {
    line.trim_end_matches('\r').trim_end_matches([' ', '\t'])
}

fn leading_punctuation_len(marker: &str) -> usize {
    marker
        .bytes()
        .take_while(|b| b.is_ascii_punctuation())
        .count()
}

fn trailing_punctuation_len(marker: &str) -> usize {
    marker
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_punctuation())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_every_kind() {
        let registry = DividerRegistry::standard();
        for kind in SectionKind::ALL {
            assert!(registry.lookup(kind).is_ok(), "{kind} missing");
        }
        assert_eq!(registry.lookup(SectionKind::Text).unwrap(), "%%TEXT%%");
    }

    #[test]
    fn lookup_fails_for_unregistered_kind() {
        let registry = DividerRegistry::builder()
            .with_marker(SectionKind::Text, "%%TEXT%%")
            .build()
            .unwrap();
        let err = registry.lookup(SectionKind::Slides).unwrap_err();
        assert!(matches!(err, CentoError::UnknownKind { ref kind } if kind == "slides"));
    }

    #[test]
    fn lookup_name_rejects_unknown_names() {
        let err = DividerRegistry::standard().lookup_name("appendix").unwrap_err();
        assert!(matches!(err, CentoError::UnknownKind { .. }));
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in SectionKind::ALL {
            assert_eq!(kind.name().parse::<SectionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn marker_lines_tolerate_trailing_whitespace() {
        let registry = DividerRegistry::standard();
        assert_eq!(registry.kind_for_line("%%NOTES%%  \r"), Some(SectionKind::Notes));
        assert_eq!(registry.kind_for_line(" %%NOTES%%"), None);
        assert_eq!(registry.kind_for_line("%%NOTES%% extra"), None);
    }

    #[test]
    fn detects_truncated_markers() {
        let registry = DividerRegistry::standard();
        assert_eq!(registry.truncated_marker("%%TEX"), Some("%%TEXT%%"));
        assert_eq!(registry.truncated_marker("%%SLIDES%"), Some("%%SLIDES%%"));
        assert_eq!(registry.truncated_marker("%%"), None);
        assert_eq!(registry.truncated_marker("%%TEXT%%"), None);
        assert_eq!(registry.truncated_marker("plain prose"), None);
    }

    #[test]
    fn word_ending_markers_are_never_truncated() {
        let registry = DividerRegistry::builder()
            .with_marker(SectionKind::Text, "## Text")
            .with_marker(SectionKind::Notes, "## Notes")
            .with_marker(SectionKind::Slides, "[slides]")
            .build()
            .unwrap();
        assert_eq!(registry.truncated_marker("## Note"), None);
        assert_eq!(registry.kind_for_line("## Notes"), Some(SectionKind::Notes));
        assert_eq!(registry.truncated_marker("[slid"), Some("[slides]"));
    }

    #[test]
    fn builder_rejects_duplicates_and_blanks() {
        let duplicate = DividerRegistry::builder()
            .with_marker(SectionKind::Text, "##")
            .with_marker(SectionKind::Notes, "##")
            .build();
        assert!(matches!(duplicate, Err(CentoError::InvalidDivider { .. })));

        let blank = DividerRegistry::builder()
            .with_marker(SectionKind::Text, "  ")
            .build();
        assert!(matches!(blank, Err(CentoError::InvalidDivider { .. })));

        let twice = DividerRegistry::builder()
            .with_marker(SectionKind::Text, "[text]")
            .with_marker(SectionKind::Text, "[prose]")
            .build();
        assert!(matches!(twice, Err(CentoError::InvalidDivider { .. })));
    }
}
