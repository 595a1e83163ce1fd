//! Marker-based splitting of a source file into raw section slices.
//!
//! Slices are contiguous and never overlap: every slice ends exactly where the
//! next marker line begins, in file order. Concatenating each slice's marker
//! line and body reproduces the input byte for byte.
//!
//! Marker lines inside fenced code blocks are ordinary content, so a source
//! file can document the marker syntax itself.

use crate::dividers::{DividerRegistry, SectionKind};
use crate::error::{CentoError, Result};

/// One contiguous slice of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection<'a> {
    /// Kind owning the slice; `None` for unmarked text with no default kind.
    pub kind: Option<SectionKind>,
    /// The marker line that opened the slice, including its line ending.
    pub marker_line: Option<&'a str>,
    /// Text between the marker line and the next marker (or end of file).
    pub body: &'a str,
    /// 1-indexed line where the slice starts (the marker line when present).
    pub line: usize,
}

impl RawSection<'_> {
    /// Whether the body carries anything besides whitespace.
    pub fn has_content(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// A source file cut into its raw sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitDocument<'a> {
    sections: Vec<RawSection<'a>>,
}

impl<'a> SplitDocument<'a> {
    /// All slices in file order.
    pub fn sections(&self) -> &[RawSection<'a>] {
        &self.sections
    }

    /// Whether any marker line was found.
    pub fn has_markers(&self) -> bool {
        self.sections.iter().any(|s| s.marker_line.is_some())
    }

    /// Joined bodies of every non-empty slice of `kind`, in file order.
    pub fn raw(&self, kind: SectionKind) -> Option<String> {
        let mut joined = String::new();
        for section in &self.sections {
            if section.kind == Some(kind) && section.has_content() {
                joined.push_str(section.body);
            }
        }
        (!joined.is_empty()).then_some(joined)
    }

    /// Kinds that own at least one non-empty slice, in first-seen order.
    pub fn kinds(&self) -> Vec<SectionKind> {
        let mut kinds = Vec::new();
        for section in &self.sections {
            if let Some(kind) = section.kind {
                if section.has_content() && !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    /// Unassigned text that precedes the first marker, if any.
    pub fn stray_preamble(&self) -> Option<&'a str> {
        self.sections
            .first()
            .filter(|s| s.kind.is_none() && s.has_content())
            .map(|s| s.body)
    }

    /// Rebuilds the original input from marker lines and bodies.
    pub fn reassemble(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            if let Some(marker) = section.marker_line {
                out.push_str(marker);
            }
            out.push_str(section.body);
        }
        out
    }
}

/// Splits `contents` into raw sections using the markers in `dividers`.
///
/// Text before the first marker (or the whole file when there is no marker)
/// belongs to `default`. `file` only identifies the input in errors.
pub fn split<'a>(
    file: &str,
    contents: &'a str,
    dividers: &DividerRegistry,
    default: Option<SectionKind>,
) -> Result<SplitDocument<'a>> {
    let mut sections = Vec::new();
    let mut open = Pending {
        kind: default,
        marker_line: None,
        body_start: 0,
        line: 1,
    };
    let mut fence: Option<Fence> = None;
    let mut cursor = 0usize;
    let mut line_number = 0usize;

    while let Some((line, next_cursor)) = next_line(contents, cursor) {
        line_number += 1;
        let (next_fence, in_code) = advance_fence(line, line_number, fence);
        fence = next_fence;

        if !in_code {
            if let Some(kind) = dividers.kind_for_line(line) {
                open.close(contents, cursor, &mut sections);
                open = Pending {
                    kind: Some(kind),
                    marker_line: Some(&contents[cursor..next_cursor]),
                    body_start: next_cursor,
                    line: line_number,
                };
            } else if let Some(marker) = dividers.truncated_marker(line) {
                return Err(CentoError::malformed_section(
                    file,
                    line_number,
                    marker,
                    line.trim_end_matches('\r'),
                ));
            }
        }
        cursor = next_cursor;
    }
    open.close(contents, contents.len(), &mut sections);

    if let Some(fence) = fence {
        log::warn!(
            "{file}:{}: code fence is never closed; markers after it were read as code",
            fence.line
        );
    }

    Ok(SplitDocument { sections })
}

struct Pending<'a> {
    kind: Option<SectionKind>,
    marker_line: Option<&'a str>,
    body_start: usize,
    line: usize,
}

impl<'a> Pending<'a> {
    fn close(&self, contents: &'a str, end: usize, out: &mut Vec<RawSection<'a>>) {
        let body = &contents[self.body_start..end];
        // an empty preamble carries nothing worth keeping
        if self.marker_line.is_none() && body.is_empty() {
            return;
        }
        out.push(RawSection {
            kind: self.kind,
            marker_line: self.marker_line,
            body,
            line: self.line,
        });
    }
}

fn next_line(input: &str, start: usize) -> Option<(&str, usize)> {
    if start >= input.len() {
        return None;
    }

    match input[start..].find('\n') {
        Some(pos) => {
            let line_end = start + pos;
            Some((&input[start..line_end], line_end + 1))
        }
        None => Some((&input[start..], input.len())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    length: usize,
    line: usize,
}

/// Returns the fence state after `line` and whether `line` is code.
fn advance_fence(
    line: &str,
    line_number: usize,
    open: Option<Fence>,
) -> (Option<Fence>, bool) {
    let (indent, offset) = leading_indent(line);
    let after_indent = line[offset..].trim_end_matches('\r');

    match open {
        None => {
            if indent <= 3 {
                if let Some((marker, length)) = fence_run(after_indent) {
                    // a backtick in the info string makes the line inline code
                    let info = &after_indent[length * marker.len_utf8()..];
                    if marker == '`' && info.contains('`') {
                        return (None, false);
                    }
                    let fence = Fence {
                        marker,
                        length,
                        line: line_number,
                    };
                    return (Some(fence), true);
                }
            }
            (None, false)
        }
        Some(fence) => {
            if indent <= 3 {
                if let Some((marker, length)) = fence_run(after_indent) {
                    let closes = marker == fence.marker
                        && length >= fence.length
                        && after_indent[length * marker.len_utf8()..].trim().is_empty();
                    if closes {
                        return (None, true);
                    }
                }
            }
            (Some(fence), true)
        }
    }
}

/// Visual columns and bytes of leading whitespace; tabs stop every 4 columns.
fn leading_indent(line: &str) -> (usize, usize) {
    let mut col = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => col += 1,
            b'\t' => col += 4 - (col % 4),
            _ => break,
        }
        bytes += 1;
    }
    (col, bytes)
}

fn fence_run(text: &str) -> Option<(char, usize)> {
    let first = text.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let length = text.chars().take_while(|c| *c == first).count();
    (length >= 3).then_some((first, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_std<'a>(contents: &'a str, default: Option<SectionKind>) -> SplitDocument<'a> {
        split("test", contents, DividerRegistry::standard(), default)
            .expect("split should succeed")
    }

    #[test]
    fn unmarked_file_belongs_to_default() {
        let input = "Just prose.\nMore prose.\n";
        let doc = split_std(input, Some(SectionKind::Text));
        assert!(!doc.has_markers());
        assert_eq!(doc.raw(SectionKind::Text).as_deref(), Some(input));
        assert_eq!(doc.kinds(), vec![SectionKind::Text]);
    }

    #[test]
    fn unmarked_file_without_default_is_stray() {
        let doc = split_std("orphan\n", None);
        assert_eq!(doc.stray_preamble(), Some("orphan\n"));
        assert!(doc.kinds().is_empty());
    }

    #[test]
    fn splits_at_marker_lines() {
        let input = "%%METADATA%%\ntitle: X\n%%TEXT%%\nHello world.\n";
        let doc = split_std(input, Some(SectionKind::Text));
        assert_eq!(doc.raw(SectionKind::Metadata).as_deref(), Some("title: X\n"));
        assert_eq!(doc.raw(SectionKind::Text).as_deref(), Some("Hello world.\n"));
        assert_eq!(doc.sections()[1].line, 3);
    }

    #[test]
    fn boundary_is_the_next_marker_of_any_kind() {
        let input = "%%SLIDES%%\n- one\n%%TEXT%%\nbody\n%%NOTES%%\nnote\n";
        let doc = split_std(input, None);
        let sections = doc.sections();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].body, "- one\n");
        assert_eq!(sections[1].body, "body\n");
        assert_eq!(sections[2].body, "note\n");
        let second_marker = input.find("%%TEXT%%").unwrap();
        let first_end = "%%SLIDES%%\n".len() + sections[0].body.len();
        assert_eq!(first_end, second_marker);
    }

    #[test]
    fn reassembles_to_original() {
        let inputs = [
            "preamble\n%%TEXT%%\na\n\n%%NOTES%%\r\nb\r\n",
            "%%TEXT%%\n%%SLIDES%%\n",
            "%%METADATA%%\nk: v\n%%TEXT%%\nno trailing newline",
            "",
        ];
        for input in inputs {
            let doc = split_std(input, Some(SectionKind::Text));
            assert_eq!(doc.reassemble(), input, "{input:?}");
        }
    }

    #[test]
    fn preamble_joins_default_kind() {
        let doc = split_std("intro\n%%TEXT%%\nrest\n", Some(SectionKind::Text));
        assert_eq!(doc.raw(SectionKind::Text).as_deref(), Some("intro\nrest\n"));
    }

    #[test]
    fn repeated_markers_join_in_file_order() {
        let input = "%%TEXT%%\none\n%%NOTES%%\nn\n%%TEXT%%\ntwo\n";
        let doc = split_std(input, None);
        assert_eq!(doc.raw(SectionKind::Text).as_deref(), Some("one\ntwo\n"));
    }

    #[test]
    fn whitespace_only_sections_are_empty() {
        let doc = split_std("%%TEXT%%\n  \n%%NOTES%%\nn\n", None);
        assert_eq!(doc.raw(SectionKind::Text), None);
        assert_eq!(doc.kinds(), vec![SectionKind::Notes]);
    }

    #[test]
    fn markers_inside_code_fences_are_content() {
        let input = "%%TEXT%%\n```\n%%NOTES%%\n```\nafter\n";
        let doc = split_std(input, None);
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.raw(SectionKind::Notes), None);
        assert!(doc.raw(SectionKind::Text).unwrap().contains("%%NOTES%%"));
    }

    #[test]
    fn fence_needs_matching_closer() {
        let input = "~~~~\n%%NOTES%%\n~~~\n%%SLIDES%%\n~~~~\n%%NOTES%%\nreal\n";
        let doc = split_std(input, Some(SectionKind::Text));
        assert_eq!(doc.raw(SectionKind::Notes).as_deref(), Some("real\n"));
        assert_eq!(doc.raw(SectionKind::Slides), None);
    }

    #[test]
    fn inline_code_run_does_not_open_a_fence() {
        let input = "%%TEXT%%\n```x``` is inline code\n%%NOTES%%\nnote\n";
        let doc = split_std(input, None);
        assert_eq!(
            doc.raw(SectionKind::Text).as_deref(),
            Some("```x``` is inline code\n")
        );
        assert_eq!(doc.raw(SectionKind::Notes).as_deref(), Some("note\n"));
    }

    #[test]
    fn tilde_fence_may_carry_backticks_in_its_info() {
        let input = "%%TEXT%%\n~~~ `rust`\n%%NOTES%%\n~~~\n";
        let doc = split_std(input, None);
        assert_eq!(doc.raw(SectionKind::Notes), None);
    }

    #[test]
    fn unclosed_fence_swallows_the_rest_of_the_file() {
        let input = "%%TEXT%%\n```rust\nlet x = 1;\n%%NOTES%%\nnote\n";
        let doc = split_std(input, None);
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.raw(SectionKind::Notes), None);
        assert_eq!(advance_fence("```rust", 2, None).0.map(|f| f.line), Some(2));
    }

    #[test]
    fn indented_fence_is_not_a_fence() {
        let input = "    ```\n%%NOTES%%\nn\n";
        let doc = split_std(input, Some(SectionKind::Text));
        assert_eq!(doc.raw(SectionKind::Notes).as_deref(), Some("n\n"));
    }

    #[test]
    fn truncated_marker_is_malformed() {
        let err = split("ch2", "%%TEXT%%\nok\n%%NOTE\n", DividerRegistry::standard(), None)
            .unwrap_err();
        match err {
            CentoError::MalformedSection {
                location, marker, ..
            } => {
                assert_eq!(location.file, "ch2");
                assert_eq!(location.line, 3);
                assert_eq!(marker, "%%NOTES%%");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
