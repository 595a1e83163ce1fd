//! Aggregation of parsed source files into project-wide collections.
//!
//! A [`Pipeline`] turns the contents of one file into a [`ParsedSource`].
//! [`Sources`] runs the pipeline over many files and merges the results into
//! four maps keyed by each file's short name.
//!
//! Loading and parsing may run on a rayon pool; merging always happens in a
//! single pass over the results in input order, so a later file wins
//! conflicts regardless of scheduling.

use crate::convert::{ConvertOptions, Converter, MarkdownConverter};
use crate::dividers::{DividerRegistry, SectionKind};
use crate::error::{CentoError, Result};
use crate::loaders;
use crate::metadata::{JsonMap, merge_metadata};
use crate::section::{Section, SectionContent};
use crate::split::{SplitDocument, split};
use crate::style::Style;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Non-empty sections extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSource {
    /// Metadata key/values.
    pub metadata: Option<JsonMap>,
    /// Converted manuscript text.
    pub text: Option<String>,
    /// Converted notes.
    pub notes: Option<String>,
    /// Converted slides.
    pub slides: Option<String>,
}

impl ParsedSource {
    /// Kinds present, in [`SectionKind::ALL`] order.
    pub fn kinds(&self) -> Vec<SectionKind> {
        SectionKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    /// Whether a section of `kind` was extracted.
    pub fn contains(&self, kind: SectionKind) -> bool {
        match kind {
            SectionKind::Metadata => self.metadata.is_some(),
            SectionKind::Text => self.text.is_some(),
            SectionKind::Notes => self.notes.is_some(),
            SectionKind::Slides => self.slides.is_some(),
        }
    }

    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    fn insert(&mut self, kind: SectionKind, content: SectionContent) {
        match content {
            SectionContent::Metadata(map) if map.is_empty() => {}
            SectionContent::Metadata(map) => self.metadata = Some(map),
            SectionContent::Prose(text) => match kind {
                SectionKind::Notes => self.notes = Some(text),
                SectionKind::Slides => self.slides = Some(text),
                _ => self.text = Some(text),
            },
        }
    }
}

/// Everything needed to parse a source file for one style.
pub struct Pipeline {
    style: Style,
    dividers: DividerRegistry,
    sections: Vec<Section>,
    converter: Box<dyn Converter>,
    convert_options: ConvertOptions,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("style", &self.style)
            .field("dividers", &self.dividers)
            .field("sections", &self.sections)
            .field("convert_options", &self.convert_options)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline for `style` with the standard dividers and Markdown output.
    pub fn new(style: Style) -> Self {
        let dividers = DividerRegistry::standard().clone();
        let sections = style.section_rules(&dividers);
        Self {
            style,
            dividers,
            sections,
            converter: Box::new(MarkdownConverter::default()),
            convert_options: ConvertOptions::default(),
        }
    }

    /// Use a custom divider table.
    pub fn with_dividers(mut self, dividers: DividerRegistry) -> Self {
        let visuals = self.visuals_in_notes();
        self.sections = self.style.section_rules(&dividers);
        self.dividers = dividers;
        self.with_visuals_in_notes(visuals)
    }

    /// Use `converter` for prose sections.
    pub fn with_converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Render Markdown with `options`; also used to find visuals.
    pub fn with_markdown(mut self, options: ConvertOptions) -> Self {
        self.convert_options = options;
        self.with_converter(MarkdownConverter::new(options))
    }

    /// Toggle copying text visuals into notes.
    pub fn with_visuals_in_notes(mut self, enabled: bool) -> Self {
        for section in &mut self.sections {
            if let Section::Metadata(rules) = section {
                rules.visuals_in_notes = enabled;
            }
        }
        self
    }

    /// Active style.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Active divider table.
    pub fn dividers(&self) -> &DividerRegistry {
        &self.dividers
    }

    /// Section rules in style order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn visuals_in_notes(&self) -> bool {
        self.sections.iter().any(|section| {
            matches!(section, Section::Metadata(rules) if rules.visuals_in_notes)
        })
    }

    /// Splits and converts one file's `contents`.
    ///
    /// Only kinds required by the style are extracted. `file` identifies the
    /// input in errors.
    pub fn parse(&self, file: &str, contents: &str) -> Result<ParsedSource> {
        let document = split(file, contents, &self.dividers, Some(self.style.default_kind()))?;

        for kind in document.kinds() {
            if !self.style.requires(kind) {
                log::debug!(
                    "{file}: {kind} section ignored by style {}",
                    self.style.name()
                );
            }
        }

        let mut parsed = ParsedSource::default();
        for section in &self.sections {
            let raw = match section.kind() {
                SectionKind::Notes => self.notes_with_visuals(file, &document)?,
                kind => document.raw(kind),
            };
            let Some(raw) = raw else {
                continue;
            };
            let content = section.convert(file, &raw, self.converter.as_ref())?;
            parsed.insert(section.kind(), content);
        }
        Ok(parsed)
    }

    fn notes_with_visuals(
        &self,
        file: &str,
        document: &SplitDocument<'_>,
    ) -> Result<Option<String>> {
        let notes = document.raw(SectionKind::Notes);
        let rules = self.sections.iter().find_map(|section| match section {
            Section::Metadata(rules) => Some(rules),
            _ => None,
        });
        match rules {
            Some(rules) => {
                let text = document.raw(SectionKind::Text);
                rules.notes_with_visuals(file, text.as_deref(), notes, &self.convert_options)
            }
            None => Ok(notes),
        }
    }
}

/// Batch settings for [`Sources::create_with_options`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Maximum number of threads to use. Defaults to rayon's global pool.
    pub max_threads: Option<usize>,
    /// Skip files that fail instead of aborting the batch.
    pub continue_on_error: bool,
}

/// A file skipped by a best-effort batch.
#[derive(Debug)]
pub struct FileFailure {
    /// Path as given by the caller.
    pub path: PathBuf,
    /// Why the file was skipped.
    pub error: CentoError,
}

/// Result of a batch: merged sources plus skipped files.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Sources merged from every file that succeeded.
    pub sources: Sources,
    /// Files that failed, in input order.
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    /// Whether every file was merged.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Project-wide collections of parsed sections keyed by short name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sources {
    /// Metadata per file.
    pub metadata: BTreeMap<String, JsonMap>,
    /// Manuscript text per file.
    pub text: BTreeMap<String, String>,
    /// Slides per file.
    pub slides: BTreeMap<String, String>,
    /// Notes per file.
    pub notes: BTreeMap<String, String>,
}

impl Sources {
    /// Create empty collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the raw text of one source file.
    pub fn load(path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let contents = loaders::read_text(path).map_err(|source| CentoError::SourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded {} ({} bytes)", path.display(), contents.len());
        Ok(contents)
    }

    /// Parses one file's contents with `pipeline`.
    pub fn parse(pipeline: &Pipeline, file: &str, contents: &str) -> Result<ParsedSource> {
        pipeline.parse(file, contents)
    }

    /// Loads, parses, and merges every file in `paths`.
    ///
    /// The batch is all-or-nothing: the first failing file (in input order)
    /// aborts it and no partial result is returned.
    pub fn create<P>(paths: &[P], pipeline: &Pipeline) -> Result<Sources>
    where
        P: AsRef<Path> + Sync,
    {
        Sources::create_with_options(paths, pipeline, &BatchOptions::default())
            .map(|outcome| outcome.sources)
    }

    /// Like [`Sources::create`] with explicit batch settings.
    ///
    /// With `continue_on_error`, failing files are reported in
    /// [`BatchOutcome::failures`] and every other file is merged.
    pub fn create_with_options<P>(
        paths: &[P],
        pipeline: &Pipeline,
        options: &BatchOptions,
    ) -> Result<BatchOutcome>
    where
        P: AsRef<Path> + Sync,
    {
        let pool = match options.max_threads {
            Some(max_threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build()
                .ok(),
            None => None,
        };

        let process_path = |path: &P| -> (PathBuf, Result<ParsedSource>) {
            let path = path.as_ref();
            let parsed = Sources::load(path)
                .and_then(|contents| pipeline.parse(&path.display().to_string(), &contents));
            (path.to_path_buf(), parsed)
        };

        let results: Vec<(PathBuf, Result<ParsedSource>)> = match pool {
            Some(pool) => pool.install(|| paths.par_iter().map(process_path).collect()),
            None => paths.par_iter().map(process_path).collect(),
        };

        let mut outcome = BatchOutcome::default();
        for (path, parsed) in results {
            match parsed {
                Ok(parsed) => outcome.sources.merge(&loaders::short_name(&path), parsed),
                Err(error) if options.continue_on_error => {
                    log::warn!("skipping {}: {error}", path.display());
                    outcome.failures.push(FileFailure { path, error });
                }
                Err(error) => return Err(error),
            }
        }
        Ok(outcome)
    }

    /// Merges one file's sections under `name`.
    ///
    /// Metadata merges key by key; prose from a later file replaces prose
    /// already stored under the same name and kind.
    pub fn merge(&mut self, name: &str, parsed: ParsedSource) {
        if let Some(map) = parsed.metadata.filter(|map| !map.is_empty()) {
            merge_metadata(self.metadata.entry(name.to_string()).or_default(), map);
        }
        merge_prose(&mut self.text, name, parsed.text, SectionKind::Text);
        merge_prose(&mut self.notes, name, parsed.notes, SectionKind::Notes);
        merge_prose(&mut self.slides, name, parsed.slides, SectionKind::Slides);
    }

    /// Whether `name` has a section of `kind`.
    pub fn contains(&self, kind: SectionKind, name: &str) -> bool {
        match kind {
            SectionKind::Metadata => self.metadata.contains_key(name),
            SectionKind::Text => self.text.contains_key(name),
            SectionKind::Notes => self.notes.contains_key(name),
            SectionKind::Slides => self.slides.contains_key(name),
        }
    }

    /// Every short name with at least one section.
    pub fn names(&self) -> BTreeSet<&str> {
        self.metadata
            .keys()
            .chain(self.text.keys())
            .chain(self.notes.keys())
            .chain(self.slides.keys())
            .map(String::as_str)
            .collect()
    }

    /// Whether no file contributed anything.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
            && self.text.is_empty()
            && self.notes.is_empty()
            && self.slides.is_empty()
    }
}

fn merge_prose(
    target: &mut BTreeMap<String, String>,
    name: &str,
    value: Option<String>,
    kind: SectionKind,
) {
    if let Some(text) = value {
        if target.insert(name.to_string(), text).is_some() {
            log::warn!("{kind} section of {name} replaced by a later file");
        }
    }
}
