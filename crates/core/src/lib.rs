#![deny(missing_docs)]
//! cento core: split marker-divided source files into metadata, text, notes,
//! and slides, and gather them into project-wide collections.

/// Markup conversion for prose sections.
pub mod convert;
/// Section kinds and their marker lines.
pub mod dividers;
/// Core error types.
pub mod error;
/// Filesystem helpers.
pub mod loaders;
/// Metadata section parsing.
pub mod metadata;
/// INI project configuration.
pub mod outline;
/// Project assembly from an outline and source files.
pub mod project;
/// Section variants and their parsing rules.
pub mod section;
/// Aggregation of parsed sources.
pub mod sources;
/// Marker-based splitting.
pub mod split;
/// Publishing styles.
pub mod style;

pub use convert::{
    ConvertError, ConvertOptions, Converter, MarkdownConverter, PassthroughConverter,
    visual_references,
};
pub use dividers::{DividerRegistry, DividerRegistryBuilder, SectionKind};
pub use error::{CentoError, MetadataError, Result, SourceLocation};
pub use metadata::{JsonMap, merge_metadata, parse_metadata};
pub use outline::{OUTLINE_SECTION, OptionMap, Outline, PROJECT_SECTION, ParserOptions};
pub use project::{Project, ProjectOptions};
pub use section::{Metadata, Prose, Section, SectionContent};
pub use sources::{BatchOptions, BatchOutcome, FileFailure, ParsedSource, Pipeline, Sources};
pub use split::{RawSection, SplitDocument, split};
pub use style::{DEFAULT_STYLE, Style};
