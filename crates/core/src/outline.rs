//! Project configuration read from an INI outline file.
//!
//! An outline has two well-known sections: `[project]` holds project-wide
//! options and `[outline]` holds the logical document structure. Option names
//! keep their case. Every other section is kept as-is and reachable through
//! [`Outline::get`].

use crate::error::{CentoError, Result};
use crate::loaders;
use crate::style::{DEFAULT_STYLE, Style};
use ini::{Ini, ParseOption};
use serde_json::{Map, Value as JsonValue};
use std::io;
use std::path::{Path, PathBuf};

/// Section holding project-wide options.
pub const PROJECT_SECTION: &str = "project";
/// Section holding the document structure.
pub const OUTLINE_SECTION: &str = "outline";

/// Options of one outline section, in file order.
pub type OptionMap = Map<String, JsonValue>;

/// INI dialect switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ParserOptions {
    /// Strip matching quotes around values.
    pub quotes: bool,
    /// Interpret backslash escapes in values.
    pub escapes: bool,
}

impl ParserOptions {
    /// Convert to rust-ini `ParseOption`.
    pub fn to_ini(self) -> ParseOption {
        ParseOption {
            enabled_quote: self.quotes,
            enabled_escape: self.escapes,
            ..ParseOption::default()
        }
    }
}

/// Parsed outline contents plus instance-level defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    contents: Vec<(String, OptionMap)>,
    defaults: OptionMap,
}

impl Outline {
    /// Create an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the INI file at `path`.
    pub fn create(path: impl AsRef<Path>, options: ParserOptions) -> Result<Self> {
        let path = path.as_ref();
        let text = loaders::read_text(path).map_err(|source| match source.kind() {
            io::ErrorKind::InvalidData => CentoError::ConfigParse {
                path: path.to_path_buf(),
                message: source.to_string(),
            },
            _ => CentoError::ConfigNotFound {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let outline = Self::parse_at(&text, path, options)?;
        log::debug!(
            "loaded outline {} with sections {:?}",
            path.display(),
            outline.keys()
        );
        Ok(outline)
    }

    /// Parses INI text held in memory.
    pub fn parse(text: &str, options: ParserOptions) -> Result<Self> {
        Self::parse_at(text, Path::new("<inline>"), options)
    }

    fn parse_at(text: &str, path: &Path, options: ParserOptions) -> Result<Self> {
        let malformed = |message: String| CentoError::ConfigParse {
            path: PathBuf::from(path),
            message,
        };
        let ini = Ini::load_from_str_opt(text, options.to_ini())
            .map_err(|err| malformed(err.to_string()))?;

        let mut outline = Outline::new();
        for (section, properties) in ini.iter() {
            let Some(section) = section else {
                if let Some((key, _)) = properties.iter().next() {
                    return Err(malformed(format!(
                        "option {key:?} appears before any section header"
                    )));
                }
                continue;
            };
            let mut map = OptionMap::new();
            for (key, value) in properties.iter() {
                map.insert(key.to_string(), JsonValue::String(value.to_string()));
            }
            outline.add(section, map)?;
        }
        Ok(outline)
    }

    /// Replace the fallback project options.
    pub fn with_defaults(mut self, defaults: OptionMap) -> Self {
        self.defaults = defaults;
        self
    }

    /// Fallback project options.
    pub fn defaults(&self) -> &OptionMap {
        &self.defaults
    }

    /// The `[project]` section.
    pub fn options(&self) -> Result<&OptionMap> {
        self.get(PROJECT_SECTION)
            .map_err(|_| CentoError::missing_section(PROJECT_SECTION))
    }

    /// The `[outline]` section.
    pub fn structure(&self) -> Result<&OptionMap> {
        self.get(OUTLINE_SECTION)
            .map_err(|_| CentoError::missing_section(OUTLINE_SECTION))
    }

    /// Entry names of the `[outline]` section, in file order.
    pub fn chapters(&self) -> Result<Vec<&str>> {
        Ok(self.structure()?.keys().map(String::as_str).collect())
    }

    /// Project option `key`, falling back to the defaults.
    pub fn option(&self, key: &str) -> Option<&JsonValue> {
        self.get(PROJECT_SECTION)
            .ok()
            .and_then(|options| options.get(key))
            .or_else(|| self.defaults.get(key))
    }

    /// Project option `key` read as a boolean.
    ///
    /// Accepts `1`/`yes`/`true`/`on` and `0`/`no`/`false`/`off`, in any case.
    pub fn option_bool(&self, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.option(key) else {
            return Ok(None);
        };
        let invalid = || CentoError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            expected: "a boolean",
        };
        match value {
            JsonValue::Bool(flag) => Ok(Some(*flag)),
            JsonValue::String(text) => match text.to_ascii_lowercase().as_str() {
                "1" | "yes" | "true" | "on" => Ok(Some(true)),
                "0" | "no" | "false" | "off" => Ok(Some(false)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }

    /// Copies default options missing from `[project]` into it.
    ///
    /// Creates the `[project]` section when the defaults are not empty.
    pub fn apply_defaults(&mut self) {
        if self.defaults.is_empty() {
            return;
        }
        let missing: OptionMap = match self.get(PROJECT_SECTION) {
            Ok(options) => self
                .defaults
                .iter()
                .filter(|(key, _)| !options.contains_key(*key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            Err(_) => self.defaults.clone(),
        };
        self.merge(PROJECT_SECTION, missing);
    }

    /// Style named by the `style` project option, or the default style.
    pub fn style(&self) -> Result<Style> {
        match self.option("style") {
            None => Style::create(DEFAULT_STYLE),
            Some(JsonValue::String(name)) => Style::create(name.trim()),
            Some(other) => Err(CentoError::InvalidOption {
                key: "style".to_string(),
                value: other.to_string(),
                expected: "a style name",
            }),
        }
    }

    /// Adds `value` under `key`, merging into an existing section.
    ///
    /// Keys already in the section are overwritten by `value`; other keys
    /// are preserved. Fails for keys that cannot name an INI section.
    pub fn add(&mut self, key: &str, value: OptionMap) -> Result<()> {
        if !is_section_name(key) {
            return Err(CentoError::UnhashableKey {
                key: key.to_string(),
            });
        }
        self.merge(key, value);
        Ok(())
    }

    /// Alias of [`Outline::add`] for indexed assignment.
    pub fn set(&mut self, key: &str, value: OptionMap) -> Result<()> {
        self.add(key, value)
    }

    /// Removes `key` and returns its options.
    pub fn delete(&mut self, key: &str) -> Result<OptionMap> {
        let index = self
            .position(key)
            .ok_or_else(|| CentoError::key_not_found(key))?;
        Ok(self.contents.remove(index).1)
    }

    /// Options stored under `key`.
    pub fn get(&self, key: &str) -> Result<&OptionMap> {
        self.position(key)
            .map(|index| &self.contents[index].1)
            .ok_or_else(|| CentoError::key_not_found(key))
    }

    /// Mutable options stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut OptionMap> {
        match self.position(key) {
            Some(index) => Ok(&mut self.contents[index].1),
            None => Err(CentoError::key_not_found(key)),
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// `(key, options)` pairs in insertion order.
    pub fn items(&self) -> Vec<(&str, &OptionMap)> {
        self.contents
            .iter()
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<&str> {
        self.contents.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Option maps in insertion order.
    pub fn values(&self) -> Vec<&OptionMap> {
        self.contents.iter().map(|(_, value)| value).collect()
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether there are no sections.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.contents.iter().position(|(name, _)| name == key)
    }

    fn merge(&mut self, key: &str, value: OptionMap) {
        match self.position(key) {
            Some(index) => {
                let existing = &mut self.contents[index].1;
                for (option, setting) in value {
                    existing.insert(option, setting);
                }
            }
            None => self.contents.push((key.to_string(), value)),
        }
    }
}

fn is_section_name(key: &str) -> bool {
    !key.trim().is_empty() && !key.contains(['[', ']', '\n', '\r'])
}
