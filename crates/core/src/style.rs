//! Publishing styles: which section kinds a format needs and in what order.
//!
//! Styles are plain data. Built-in styles are looked up by name through an
//! explicit table; custom styles are assembled with [`Style::new`].

use crate::dividers::{DividerRegistry, SectionKind};
use crate::error::{CentoError, Result};
use crate::section::Section;

/// Name of the style used when an outline does not pick one.
pub const DEFAULT_STYLE: &str = "textbook";

/// Section requirements and output defaults for one publishing format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    name: String,
    sections: Vec<SectionKind>,
    default: SectionKind,
    text_format: Option<String>,
    text_reference: Option<String>,
}

const BUILT_INS: &[(&str, fn() -> Style)] = &[
    ("law_review", Style::law_review),
    ("textbook", Style::textbook),
];

impl Style {
    /// Create a style requiring `sections` (in output order).
    ///
    /// `default` receives unmarked content. It does not have to be listed in
    /// `sections`, but then unmarked content is dropped by this style.
    pub fn new(name: impl Into<String>, sections: Vec<SectionKind>, default: SectionKind) -> Self {
        let mut unique = Vec::with_capacity(sections.len());
        for kind in sections {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        Self {
            name: name.into(),
            sections: unique,
            default,
            text_format: None,
            text_reference: None,
        }
    }

    /// Set the word-processor format for the manuscript.
    pub fn with_text_format(mut self, format: impl Into<String>) -> Self {
        self.text_format = Some(format.into());
        self
    }

    /// Set the reference document used to style the manuscript.
    pub fn with_text_reference(mut self, reference: impl Into<String>) -> Self {
        self.text_reference = Some(reference.into());
        self
    }

    /// Looks up a built-in style by name.
    pub fn create(name: &str) -> Result<Style> {
        BUILT_INS
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, constructor)| constructor())
            .ok_or_else(|| CentoError::UnknownStyle {
                name: name.to_string(),
            })
    }

    /// Names of the built-in styles.
    pub fn built_in_names() -> impl Iterator<Item = &'static str> {
        BUILT_INS.iter().map(|(name, _)| *name)
    }

    /// Law review article: manuscript and slides, rendered for Word.
    pub fn law_review() -> Style {
        Style::new(
            "law_review",
            vec![SectionKind::Metadata, SectionKind::Text, SectionKind::Slides],
            SectionKind::Text,
        )
        .with_text_format("word")
        .with_text_reference("law_review")
    }

    /// Textbook: manuscript, notes, and slides.
    pub fn textbook() -> Style {
        Style::new(
            "textbook",
            vec![
                SectionKind::Metadata,
                SectionKind::Text,
                SectionKind::Notes,
                SectionKind::Slides,
            ],
            SectionKind::Text,
        )
    }

    /// Style name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required kinds in output order.
    pub fn sections(&self) -> &[SectionKind] {
        &self.sections
    }

    /// Kind that receives unmarked content.
    pub fn default_kind(&self) -> SectionKind {
        self.default
    }

    /// Word-processor format for the manuscript, if any.
    pub fn text_format(&self) -> Option<&str> {
        self.text_format.as_deref()
    }

    /// Reference document for the manuscript, if any.
    pub fn text_reference(&self) -> Option<&str> {
        self.text_reference.as_deref()
    }

    /// Whether `kind` is part of this style.
    pub fn requires(&self, kind: SectionKind) -> bool {
        self.sections.contains(&kind)
    }

    /// Section parsers for the required kinds, in output order.
    pub fn section_rules(&self, dividers: &DividerRegistry) -> Vec<Section> {
        self.sections
            .iter()
            .map(|kind| Section::for_kind(*kind, dividers))
            .collect()
    }
}
