//! The section variant family.
//!
//! Each variant knows its start marker and how to turn its raw slice into
//! output content. Variants are stateless and shared by every file in a run.
//! Construction by name goes through an explicit table instead of a runtime
//! registry of subclasses.

use crate::convert::{ConvertOptions, Converter, visual_references};
use crate::dividers::{DividerRegistry, SectionKind};
use crate::error::{CentoError, Result};
use crate::metadata::{JsonMap, parse_metadata};
use crate::split::{SplitDocument, split};

/// File identity used when a section is parsed without a file name.
pub const ANONYMOUS_FILE: &str = "<input>";

/// Output of one parsed section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    /// Structured key/value data from a metadata section.
    Metadata(JsonMap),
    /// Converted prose from a text, notes or slides section.
    Prose(String),
}

impl SectionContent {
    /// The metadata map, if this is metadata.
    pub fn as_metadata(&self) -> Option<&JsonMap> {
        match self {
            SectionContent::Metadata(map) => Some(map),
            SectionContent::Prose(_) => None,
        }
    }

    /// The converted prose, if this is prose.
    pub fn as_prose(&self) -> Option<&str> {
        match self {
            SectionContent::Prose(text) => Some(text),
            SectionContent::Metadata(_) => None,
        }
    }
}

/// Rules for the metadata section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Marker opening the section.
    pub start: Option<String>,
    /// Copy visuals found in the text section into the notes section.
    pub visuals_in_notes: bool,
}

impl Metadata {
    /// Appends the visuals of `text` to `notes`.
    ///
    /// Returns `notes` untouched when the flag is off or the text has no
    /// visuals. A file without notes gets a notes body made of its visuals.
    pub fn notes_with_visuals(
        &self,
        file: &str,
        text: Option<&str>,
        notes: Option<String>,
        options: &ConvertOptions,
    ) -> Result<Option<String>> {
        let Some(text) = text.filter(|_| self.visuals_in_notes) else {
            return Ok(notes);
        };
        let visuals = visual_references(text, options).map_err(|err| CentoError::Conversion {
            file: file.to_string(),
            kind: SectionKind::Text.name().to_string(),
            message: err.to_string(),
        })?;
        if visuals.is_empty() {
            return Ok(notes);
        }

        let mut combined = notes.unwrap_or_default();
        if !combined.is_empty() && !combined.ends_with("\n\n") {
            combined.push_str(if combined.ends_with('\n') { "\n" } else { "\n\n" });
        }
        combined.push_str(&visuals.join("\n\n"));
        combined.push('\n');
        Ok(Some(combined))
    }
}

/// Rules for a prose section (text, notes or slides).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prose {
    /// Marker opening the section.
    pub start: Option<String>,
}

/// One section kind together with its parsing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// File-level metadata.
    Metadata(Metadata),
    /// Manuscript text.
    Text(Prose),
    /// Notes accompanying the text.
    Notes(Prose),
    /// Slide content.
    Slides(Prose),
}

type Constructor = fn(&DividerRegistry) -> Section;

const CONSTRUCTORS: &[(&str, Constructor)] = &[
    ("metadata", Section::metadata),
    ("text", Section::text),
    ("notes", Section::notes),
    ("slides", Section::slides),
];

fn marker_for(dividers: &DividerRegistry, kind: SectionKind) -> Option<String> {
    dividers.lookup(kind).ok().map(str::to_string)
}

impl Section {
    /// Builds the section named `name` with the standard dividers.
    pub fn create(name: &str) -> Result<Section> {
        Section::create_with(name, DividerRegistry::standard())
    }

    /// Builds the section named `name` with markers from `dividers`.
    pub fn create_with(name: &str, dividers: &DividerRegistry) -> Result<Section> {
        CONSTRUCTORS
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, constructor)| constructor(dividers))
            .ok_or_else(|| CentoError::unknown_kind(name))
    }

    /// Builds the section for `kind` with markers from `dividers`.
    pub fn for_kind(kind: SectionKind, dividers: &DividerRegistry) -> Section {
        match kind {
            SectionKind::Metadata => Section::metadata(dividers),
            SectionKind::Text => Section::text(dividers),
            SectionKind::Notes => Section::notes(dividers),
            SectionKind::Slides => Section::slides(dividers),
        }
    }

    fn metadata(dividers: &DividerRegistry) -> Section {
        Section::Metadata(Metadata {
            start: marker_for(dividers, SectionKind::Metadata),
            visuals_in_notes: true,
        })
    }

    fn text(dividers: &DividerRegistry) -> Section {
        Section::Text(Prose {
            start: marker_for(dividers, SectionKind::Text),
        })
    }

    fn notes(dividers: &DividerRegistry) -> Section {
        Section::Notes(Prose {
            start: marker_for(dividers, SectionKind::Notes),
        })
    }

    fn slides(dividers: &DividerRegistry) -> Section {
        Section::Slides(Prose {
            start: marker_for(dividers, SectionKind::Slides),
        })
    }

    /// Kind handled by this section.
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Metadata(_) => SectionKind::Metadata,
            Section::Text(_) => SectionKind::Text,
            Section::Notes(_) => SectionKind::Notes,
            Section::Slides(_) => SectionKind::Slides,
        }
    }

    /// Human-readable kind label.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Marker opening this section, if it has one.
    pub fn start(&self) -> Option<&str> {
        match self {
            Section::Metadata(rules) => rules.start.as_deref(),
            Section::Text(rules) | Section::Notes(rules) | Section::Slides(rules) => {
                rules.start.as_deref()
            }
        }
    }

    /// Parses this section out of a whole source file.
    ///
    /// Returns `None` when the file has no marker for this section or the
    /// section is blank. The slice ends at the next standard marker of any
    /// kind.
    pub fn parse(
        &self,
        contents: &str,
        converter: &dyn Converter,
    ) -> Result<Option<SectionContent>> {
        if self.start().is_none() {
            return Ok(None);
        }
        let dividers = self.dividers()?;
        let document = split(ANONYMOUS_FILE, contents, &dividers, None)?;
        self.parse_document(ANONYMOUS_FILE, &document, converter)
    }

    /// Parses this section out of an already split file.
    pub fn parse_document(
        &self,
        file: &str,
        document: &SplitDocument<'_>,
        converter: &dyn Converter,
    ) -> Result<Option<SectionContent>> {
        match document.raw(self.kind()) {
            Some(raw) => self.convert(file, &raw, converter).map(Some),
            None => Ok(None),
        }
    }

    /// Converts the raw body of this section.
    pub fn convert(
        &self,
        file: &str,
        raw: &str,
        converter: &dyn Converter,
    ) -> Result<SectionContent> {
        match self {
            Section::Metadata(_) => parse_metadata(raw)
                .map(SectionContent::Metadata)
                .map_err(|source| CentoError::Metadata {
                    file: file.to_string(),
                    source,
                }),
            _ => converter
                .convert(self.kind(), raw)
                .map(SectionContent::Prose)
                .map_err(|err| CentoError::Conversion {
                    file: file.to_string(),
                    kind: self.name().to_string(),
                    message: err.to_string(),
                }),
        }
    }

    /// Standard dividers with this section's own marker swapped in.
    fn dividers(&self) -> Result<DividerRegistry> {
        let own = self.kind();
        let mut builder = DividerRegistry::builder();
        for (kind, marker) in DividerRegistry::standard().entries() {
            let marker = match (kind == own, self.start()) {
                (true, Some(start)) => start,
                _ => marker,
            };
            builder = builder.with_marker(kind, marker);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{MarkdownConverter, PassthroughConverter};
    use serde_json::Value as JsonValue;

    const SCENARIO: &str = "%%METADATA%%\ntitle: X\n%%TEXT%%\nHello world.\n";

    #[test]
    fn create_uses_the_name_table() {
        for kind in SectionKind::ALL {
            let section = Section::create(kind.name()).unwrap();
            assert_eq!(section.kind(), kind);
            assert_eq!(
                section.start(),
                Some(DividerRegistry::standard().lookup(kind).unwrap())
            );
        }
        let err = Section::create("appendix").unwrap_err();
        assert!(matches!(err, CentoError::UnknownKind { .. }));
    }

    #[test]
    fn metadata_defaults_to_visuals_in_notes() {
        match Section::create("metadata").unwrap() {
            Section::Metadata(rules) => assert!(rules.visuals_in_notes),
            other => panic!("unexpected section {other:?}"),
        }
    }

    #[test]
    fn unregistered_kind_has_no_start() {
        let dividers = DividerRegistry::builder()
            .with_marker(SectionKind::Text, "%%TEXT%%")
            .build()
            .unwrap();
        let slides = Section::for_kind(SectionKind::Slides, &dividers);
        assert_eq!(slides.start(), None);
        assert_eq!(slides.parse(SCENARIO, &PassthroughConverter).unwrap(), None);
    }

    #[test]
    fn parses_metadata_as_key_values() {
        let section = Section::create("metadata").unwrap();
        let content = section
            .parse(SCENARIO, &PassthroughConverter)
            .unwrap()
            .expect("metadata present");
        let map = content.as_metadata().unwrap();
        assert_eq!(map.get("title").and_then(JsonValue::as_str), Some("X"));
    }

    #[test]
    fn parses_text_with_converter() {
        let section = Section::create("text").unwrap();
        let raw = section.parse(SCENARIO, &PassthroughConverter).unwrap();
        assert_eq!(raw, Some(SectionContent::Prose("Hello world.\n".into())));

        let html = section
            .parse(SCENARIO, &MarkdownConverter::default())
            .unwrap()
            .unwrap();
        assert!(html.as_prose().unwrap().contains("<p>Hello world.</p>"));
    }

    #[test]
    fn absent_marker_yields_nothing() {
        let notes = Section::create("notes").unwrap();
        assert_eq!(notes.parse(SCENARIO, &PassthroughConverter).unwrap(), None);
    }

    #[test]
    fn custom_start_marker_is_honored() {
        let section = Section::Text(Prose {
            start: Some("== body ==".into()),
        });
        let content = section
            .parse("%%METADATA%%\na: 1\n== body ==\nprose\n", &PassthroughConverter)
            .unwrap();
        assert_eq!(content, Some(SectionContent::Prose("prose\n".into())));
    }

    #[test]
    fn invalid_metadata_reports_file() {
        let section = Section::create("metadata").unwrap();
        let err = section
            .convert("ch3", "- not\n- a map\n", &PassthroughConverter)
            .unwrap_err();
        assert!(matches!(err, CentoError::Metadata { ref file, .. } if file == "ch3"));
    }

    #[test]
    fn visuals_are_appended_to_notes() {
        let rules = Metadata {
            start: None,
            visuals_in_notes: true,
        };
        let text = "Body ![fig](fig.png).\n";
        let notes = rules
            .notes_with_visuals("ch1", Some(text), Some("A note.\n".into()), &ConvertOptions::default())
            .unwrap();
        assert_eq!(notes.as_deref(), Some("A note.\n\n![fig](fig.png)\n"));

        let created = rules
            .notes_with_visuals("ch1", Some(text), None, &ConvertOptions::default())
            .unwrap();
        assert_eq!(created.as_deref(), Some("![fig](fig.png)\n"));
    }

    #[test]
    fn visuals_stay_put_when_disabled() {
        let rules = Metadata {
            start: None,
            visuals_in_notes: false,
        };
        let notes = rules
            .notes_with_visuals("ch1", Some("![fig](fig.png)\n"), None, &ConvertOptions::default())
            .unwrap();
        assert_eq!(notes, None);
    }
}
