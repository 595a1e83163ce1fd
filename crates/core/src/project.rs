//! A project: an outline, the style it selects, and the parsed sources.

use crate::convert::ConvertOptions;
use crate::error::Result;
use crate::outline::{OptionMap, Outline, ParserOptions};
use crate::sources::{BatchOptions, FileFailure, Pipeline, Sources};
use crate::style::{DEFAULT_STYLE, Style};
use serde_json::Value as JsonValue;
use std::path::Path;

/// Project option toggling [`crate::section::Metadata::visuals_in_notes`].
pub const VISUALS_IN_NOTES: &str = "visuals_in_notes";

/// Settings for [`Project::create`].
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    /// INI dialect of the outline file.
    pub parser: ParserOptions,
    /// Markdown dialect for prose sections.
    pub convert: ConvertOptions,
    /// Batch behavior while reading sources.
    pub batch: BatchOptions,
}

/// Project options used when the outline leaves them out.
pub fn default_options() -> OptionMap {
    let mut defaults = OptionMap::new();
    defaults.insert("style".into(), JsonValue::String(DEFAULT_STYLE.into()));
    defaults.insert(VISUALS_IN_NOTES.into(), JsonValue::Bool(true));
    defaults
}

/// A configured project with its sources loaded.
#[derive(Debug)]
pub struct Project {
    outline: Outline,
    style: Style,
    sources: Sources,
    failures: Vec<FileFailure>,
}

impl Project {
    /// Loads the outline at `outline_path` and parses every file in `paths`.
    pub fn create<P>(
        outline_path: impl AsRef<Path>,
        paths: &[P],
        options: &ProjectOptions,
    ) -> Result<Project>
    where
        P: AsRef<Path> + Sync,
    {
        let mut outline =
            Outline::create(outline_path, options.parser)?.with_defaults(default_options());
        outline.apply_defaults();

        let pipeline = Project::pipeline(&outline, options.convert)?;
        let outcome = Sources::create_with_options(paths, &pipeline, &options.batch)?;
        log::debug!(
            "project uses style {} with {} source names",
            pipeline.style().name(),
            outcome.sources.names().len()
        );

        Ok(Project {
            outline,
            style: pipeline.style().clone(),
            sources: outcome.sources,
            failures: outcome.failures,
        })
    }

    /// Pipeline configured from the outline's project options.
    pub fn pipeline(outline: &Outline, convert: ConvertOptions) -> Result<Pipeline> {
        let style = outline.style()?;
        let visuals = outline.option_bool(VISUALS_IN_NOTES)?.unwrap_or(true);
        Ok(Pipeline::new(style)
            .with_markdown(convert)
            .with_visuals_in_notes(visuals))
    }

    /// Assembles a project from already built parts.
    pub fn from_parts(outline: Outline, sources: Sources) -> Result<Project> {
        let style = outline.style()?;
        Ok(Project {
            outline,
            style,
            sources,
            failures: Vec::new(),
        })
    }

    /// Project configuration.
    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// Selected style.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Parsed sources.
    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// Files skipped by a best-effort batch.
    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    /// `(title, short name)` pairs of the `[outline]` section, in order.
    ///
    /// An entry without a value uses its title as the short name.
    pub fn chapters(&self) -> Result<Vec<(&str, &str)>> {
        let structure = self.outline.structure()?;
        Ok(structure
            .iter()
            .map(|(title, value)| {
                let short = value
                    .as_str()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(title.as_str());
                (title.as_str(), short)
            })
            .collect())
    }

    /// Short names listed in the outline that no source file provided.
    pub fn missing_chapters(&self) -> Result<Vec<&str>> {
        let names = self.sources.names();
        Ok(self
            .chapters()?
            .into_iter()
            .map(|(_, short)| short)
            .filter(|short| !names.contains(short))
            .collect())
    }
}
