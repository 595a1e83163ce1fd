//! Markup-to-output conversion for prose sections.
//!
//! Conversion is an opaque, synchronous step: the pipeline hands each
//! non-empty prose slice to a [`Converter`] once and stores whatever comes
//! back. [`MarkdownConverter`] renders through markdown-rs;
//! [`PassthroughConverter`] keeps the source text untouched.

use crate::dividers::SectionKind;
use markdown::mdast::Node;
use markdown::message::{Message, Place};
use thiserror::Error;

/// Failure reported by a converter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {line}:{column}")]
pub struct ConvertError {
    /// Converter message
    pub message: String,
    /// Line inside the section body (1-indexed)
    pub line: usize,
    /// Column (1-indexed)
    pub column: usize,
}

impl ConvertError {
    /// Create a converter error with location
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    fn from_message(message: &Message) -> Self {
        let (line, column) = match &message.place {
            Some(place) => match place.as_ref() {
                Place::Point(point) => (point.line, point.column),
                Place::Position(position) => (position.start.line, position.start.column),
            },
            None => (1, 1),
        };
        Self::new(message.to_string(), line, column)
    }
}

/// Turns the raw markup of one section into output-ready content.
pub trait Converter: Send + Sync {
    /// Convert `raw`, the body of a `kind` section.
    fn convert(&self, kind: SectionKind, raw: &str) -> Result<String, ConvertError>;
}

impl<F> Converter for F
where
    F: Fn(SectionKind, &str) -> Result<String, ConvertError> + Send + Sync,
{
    fn convert(&self, kind: SectionKind, raw: &str) -> Result<String, ConvertError> {
        (self)(kind, raw)
    }
}

/// Returns section bodies unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughConverter;

impl Converter for PassthroughConverter {
    fn convert(&self, _kind: SectionKind, raw: &str) -> Result<String, ConvertError> {
        Ok(raw.to_string())
    }
}

/// Markdown dialect switches for [`MarkdownConverter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Enable GitHub Flavored Markdown constructs (tables, footnotes, ...).
    pub gfm: bool,
    /// Pass raw HTML through to the output.
    pub raw_html: bool,
    /// Enable math constructs ($inline$ and $$block$$).
    pub math: bool,
}

impl ConvertOptions {
    /// Manuscript defaults: GFM on, raw HTML escaped.
    pub const fn manuscript() -> Self {
        Self {
            gfm: true,
            raw_html: false,
            math: false,
        }
    }

    /// CommonMark only.
    pub const fn commonmark() -> Self {
        Self {
            gfm: false,
            raw_html: false,
            math: false,
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_parse_options(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            html_flow: self.raw_html,
            html_text: self.raw_html,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        if self.math {
            constructs.math_flow = true;
            constructs.math_text = true;
        }

        markdown::ParseOptions {
            constructs,
            math_text_single_dollar: self.math,
            ..markdown::ParseOptions::default()
        }
    }

    /// Convert to full markdown-rs `Options` (parse + compile).
    pub fn to_markdown(self) -> markdown::Options {
        markdown::Options {
            parse: self.to_parse_options(),
            compile: markdown::CompileOptions {
                allow_dangerous_html: self.raw_html,
                ..markdown::CompileOptions::default()
            },
        }
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::manuscript()
    }
}

/// Renders Markdown sections to HTML.
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter {
    options: ConvertOptions,
}

impl MarkdownConverter {
    /// Create a converter with the given dialect.
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Dialect in use.
    pub fn options(&self) -> ConvertOptions {
        self.options
    }
}

impl Converter for MarkdownConverter {
    fn convert(&self, _kind: SectionKind, raw: &str) -> Result<String, ConvertError> {
        markdown::to_html_with_options(raw, &self.options.to_markdown())
            .map_err(|err| ConvertError::from_message(&err))
    }
}

/// Source snippets of every visual (image) in `raw`, in document order.
///
/// Image references bring their link definitions along so the snippets stay
/// resolvable when pasted elsewhere.
pub fn visual_references<'a>(
    raw: &'a str,
    options: &ConvertOptions,
) -> Result<Vec<&'a str>, ConvertError> {
    let root = markdown::to_mdast(raw, &options.to_parse_options())
        .map_err(|err| ConvertError::from_message(&err))?;

    let mut visuals = Vec::new();
    let mut referenced = Vec::new();
    collect_visuals(&root, raw, &mut visuals, &mut referenced);

    if !referenced.is_empty() {
        collect_definitions(&root, raw, &referenced, &mut visuals);
    }
    Ok(visuals)
}

fn collect_visuals<'a>(
    node: &Node,
    raw: &'a str,
    visuals: &mut Vec<&'a str>,
    referenced: &mut Vec<String>,
) {
    match node {
        Node::Image(_) => push_source(node, raw, visuals),
        Node::ImageReference(reference) => {
            push_source(node, raw, visuals);
            referenced.push(reference.identifier.clone());
        }
        _ => {
            if let Some(children) = node.children() {
                for child in children {
                    collect_visuals(child, raw, visuals, referenced);
                }
            }
        }
    }
}

fn collect_definitions<'a>(
    node: &Node,
    raw: &'a str,
    referenced: &[String],
    visuals: &mut Vec<&'a str>,
) {
    if let Node::Definition(definition) = node {
        if referenced.contains(&definition.identifier) {
            push_source(node, raw, visuals);
        }
        return;
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, raw, referenced, visuals);
        }
    }
}

fn push_source<'a>(node: &Node, raw: &'a str, out: &mut Vec<&'a str>) {
    if let Some(position) = node.position() {
        if let Some(snippet) = raw.get(position.start.offset..position.end.offset) {
            out.push(snippet);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_converter_renders_html() {
        let html = MarkdownConverter::default()
            .convert(SectionKind::Text, "Hello *world*.\n")
            .unwrap();
        assert!(html.contains("<p>Hello <em>world</em>.</p>"), "{html}");
    }

    #[test]
    fn gfm_tables_follow_options() {
        let table = "| a | b |\n| - | - |\n| 1 | 2 |\n";
        let gfm = MarkdownConverter::new(ConvertOptions::manuscript())
            .convert(SectionKind::Text, table)
            .unwrap();
        assert!(gfm.contains("<table>"), "{gfm}");

        let plain = MarkdownConverter::new(ConvertOptions::commonmark())
            .convert(SectionKind::Text, table)
            .unwrap();
        assert!(!plain.contains("<table>"), "{plain}");
    }

    #[test]
    fn raw_html_is_escaped_by_default() {
        let html = MarkdownConverter::default()
            .convert(SectionKind::Notes, "<span>x</span>\n")
            .unwrap();
        assert!(!html.contains("<span>"), "{html}");
    }

    #[test]
    fn passthrough_keeps_source() {
        let out = PassthroughConverter
            .convert(SectionKind::Slides, "# Slide\n")
            .unwrap();
        assert_eq!(out, "# Slide\n");
    }

    #[test]
    fn closures_are_converters() {
        let upper = |_: SectionKind, raw: &str| Ok::<_, ConvertError>(raw.to_uppercase());
        assert_eq!(upper.convert(SectionKind::Text, "abc").unwrap(), "ABC");
    }

    #[test]
    fn finds_inline_images() {
        let raw = "Intro ![chart](chart.png \"Sales\") text.\n\nNo image here.\n";
        let visuals = visual_references(raw, &ConvertOptions::default()).unwrap();
        assert_eq!(visuals, vec!["![chart](chart.png \"Sales\")"]);
    }

    #[test]
    fn image_references_bring_definitions() {
        let raw = "See ![map][m].\n\n[m]: map.svg\n[unused]: x.png\n";
        let visuals = visual_references(raw, &ConvertOptions::default()).unwrap();
        assert_eq!(visuals, vec!["![map][m]", "[m]: map.svg"]);
    }

    #[test]
    fn plain_links_are_not_visuals() {
        let raw = "A [link](https://example.com).\n";
        let visuals = visual_references(raw, &ConvertOptions::default()).unwrap();
        assert!(visuals.is_empty());
    }
}
