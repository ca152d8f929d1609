//! Span-based rich text model.
//!
//! Text is stored once as a flat string; styling is an ordered list of
//! [`Span`]s that tile `[0, len)` without gaps or overlaps. Every span
//! references a style by [`StyleId`], and style definitions live in a
//! separate table so several spans can share one. After each mutation
//! adjacent spans never share a style id and no span is empty.
//!
//! All offsets are character offsets (not bytes). Out-of-range offsets are
//! clamped to the current length.

use crate::color::SerializableColor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a text style definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StyleId(String);

impl StyleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StyleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StyleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Character-level styling attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    /// Overrides the paragraph font size when set.
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    pub color: SerializableColor,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: None,
            bold: false,
            italic: false,
            underline: false,
            color: SerializableColor::black(),
        }
    }
}

/// A contiguous run `[start, end)` of characters sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub style: StyleId,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Materialized `(text, style)` pair for one span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRun {
    pub text: String,
    pub style: StyleId,
}

/// Rich text editor over a span list.
#[derive(Debug, Clone, Serialize)]
pub struct TextRunEditor {
    text: String,
    char_len: usize,
    spans: Vec<Span>,
    styles: HashMap<StyleId, TextStyle>,
    default_style: StyleId,
}

impl Default for TextRunEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRunEditor {
    /// Id of the style every editor starts with.
    pub const DEFAULT_STYLE: &'static str = "default";

    pub fn new() -> Self {
        Self::with_default_style(StyleId::from(Self::DEFAULT_STYLE), TextStyle::default())
    }

    pub fn with_default_style(id: StyleId, style: TextStyle) -> Self {
        let mut styles = HashMap::new();
        styles.insert(id.clone(), style);
        Self {
            text: String::new(),
            char_len: 0,
            spans: Vec::new(),
            styles,
            default_style: id,
        }
    }

    pub fn get_text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn default_style(&self) -> &StyleId {
        &self.default_style
    }

    /// Define or redefine a style.
    pub fn define_style(&mut self, id: impl Into<StyleId>, style: TextStyle) {
        self.styles.insert(id.into(), style);
    }

    pub fn style(&self, id: &StyleId) -> Option<&TextStyle> {
        self.styles.get(id)
    }

    /// Style definition for `id`, falling back to the default style.
    pub fn resolve_style(&self, id: &StyleId) -> TextStyle {
        self.styles
            .get(id)
            .or_else(|| self.styles.get(&self.default_style))
            .cloned()
            .unwrap_or_default()
    }

    /// Style id of the character at `offset`. At end of content this is the
    /// style of the last character.
    pub fn style_at(&self, offset: usize) -> Option<&StyleId> {
        let offset = offset.min(self.char_len);
        self.spans
            .iter()
            .find(|s| s.start <= offset && offset < s.end)
            .or_else(|| self.spans.last())
            .map(|s| &s.style)
    }

    /// Insert `text` at `offset`. Without an explicit style the inserted
    /// characters inherit the style of the preceding character.
    pub fn insert_text(&mut self, offset: usize, text: &str, style: Option<StyleId>) {
        if text.is_empty() {
            return;
        }
        let offset = offset.min(self.char_len);
        let style = style.unwrap_or_else(|| self.inherited_style(offset));
        let added = text.chars().count();

        let byte = self.byte_offset(offset);
        self.text.insert_str(byte, text);

        let index = if offset == self.char_len {
            self.spans.push(Span {
                start: offset,
                end: offset + added,
                style,
            });
            self.spans.len() - 1
        } else {
            let index = self.split_at(offset);
            for span in &mut self.spans[index..] {
                span.start += added;
                span.end += added;
            }
            self.spans.insert(
                index,
                Span {
                    start: offset,
                    end: offset + added,
                    style,
                },
            );
            index
        };
        self.char_len += added;
        self.merge_around(index);
        debug_assert!(self.check_invariants(), "span invariant broken by insert");
    }

    /// Remove the characters in `[start, end)`.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        let (start, end) = self.clamp_range(start, end);
        if start == end {
            return;
        }
        let removed = end - start;
        let first = self.split_at(start);
        let last = self.split_at(end);
        self.spans.drain(first..last);
        for span in &mut self.spans[first..] {
            span.start -= removed;
            span.end -= removed;
        }

        let byte_start = self.byte_offset(start);
        let byte_end = self.byte_offset(end);
        self.text.replace_range(byte_start..byte_end, "");
        self.char_len -= removed;

        self.merge_around(first);
        debug_assert!(self.check_invariants(), "span invariant broken by delete");
    }

    /// Assign `style` to every character in `[start, end)`.
    pub fn apply_style(&mut self, start: usize, end: usize, style: impl Into<StyleId>) {
        let (start, end) = self.clamp_range(start, end);
        if start == end {
            return;
        }
        let style = style.into();
        let first = self.split_at(start);
        let last = self.split_at(end);
        for span in &mut self.spans[first..last] {
            span.style = style.clone();
        }
        self.coalesce();
        debug_assert!(self.check_invariants(), "span invariant broken by apply_style");
    }

    /// Replace the whole content with `text` in a single style.
    pub fn set_text(&mut self, text: &str, style: Option<StyleId>) {
        let style = style.unwrap_or_else(|| self.default_style.clone());
        self.text = text.to_string();
        self.char_len = text.chars().count();
        self.spans.clear();
        if self.char_len > 0 {
            self.spans.push(Span {
                start: 0,
                end: self.char_len,
                style,
            });
        }
    }

    /// Drop text, spans and every style definition except the default one.
    pub fn clear(&mut self) {
        self.text.clear();
        self.char_len = 0;
        self.spans.clear();
        let default = self.resolve_style(&self.default_style.clone());
        self.styles.clear();
        self.styles.insert(self.default_style.clone(), default);
    }

    /// Walk the spans in order and pair each with its text.
    pub fn style_runs(&self) -> Vec<StyleRun> {
        let mut chars = self.text.chars();
        self.spans
            .iter()
            .map(|span| StyleRun {
                text: chars.by_ref().take(span.len()).collect(),
                style: span.style.clone(),
            })
            .collect()
    }

    /// Whether the span list tiles `[0, len)` with non-empty, coalesced spans.
    pub fn check_invariants(&self) -> bool {
        if self.spans.is_empty() {
            return self.char_len == 0;
        }
        if self.spans[0].start != 0 {
            return false;
        }
        if self.spans.iter().any(Span::is_empty) {
            return false;
        }
        let tiled = self.spans.windows(2).all(|w| w[0].end == w[1].start);
        let coalesced = self.spans.windows(2).all(|w| w[0].style != w[1].style);
        let covers = self.spans.last().map(|s| s.end) == Some(self.char_len);
        tiled && coalesced && covers && self.text.chars().count() == self.char_len
    }

    fn clamp_range(&self, start: usize, end: usize) -> (usize, usize) {
        let a = start.min(self.char_len);
        let b = end.min(self.char_len);
        if a <= b { (a, b) } else { (b, a) }
    }

    fn inherited_style(&self, offset: usize) -> StyleId {
        let before = offset.saturating_sub(1);
        self.style_at(before)
            .cloned()
            .unwrap_or_else(|| self.default_style.clone())
    }

    fn byte_offset(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    /// Ensure a span boundary exists at `offset` and return the index of the
    /// span starting there (`spans.len()` at end of content). Splitting on an
    /// existing boundary is a no-op.
    fn split_at(&mut self, offset: usize) -> usize {
        for (i, span) in self.spans.iter().enumerate() {
            if span.start == offset {
                return i;
            }
            if span.start < offset && offset < span.end {
                let right = Span {
                    start: offset,
                    end: span.end,
                    style: span.style.clone(),
                };
                self.spans[i].end = offset;
                self.spans.insert(i + 1, right);
                return i + 1;
            }
        }
        self.spans.len()
    }

    /// Merge the span at `index` with its neighbours when styles match.
    fn merge_around(&mut self, index: usize) {
        if index + 1 < self.spans.len() && self.spans[index].style == self.spans[index + 1].style {
            self.spans[index].end = self.spans[index + 1].end;
            self.spans.remove(index + 1);
        }
        if index > 0 && index < self.spans.len() && self.spans[index - 1].style == self.spans[index].style {
            self.spans[index - 1].end = self.spans[index].end;
            self.spans.remove(index);
        }
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            match merged.last_mut() {
                Some(prev) if prev.style == span.style => prev.end = span.end,
                _ => merged.push(span),
            }
        }
        self.spans = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_of(editor: &TextRunEditor) -> Vec<(usize, usize, String)> {
        editor
            .spans()
            .iter()
            .map(|s| (s.start, s.end, s.style.to_string()))
            .collect()
    }

    #[test]
    fn test_hello_world_scenario() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "Hello", Some("A".into()));
        assert_eq!(spans_of(&editor), vec![(0, 5, "A".to_string())]);

        editor.insert_text(5, " World", Some("A".into()));
        assert_eq!(spans_of(&editor), vec![(0, 11, "A".to_string())]);
        assert_eq!(editor.get_text(), "Hello World");

        editor.apply_style(0, 5, "B");
        assert_eq!(
            spans_of(&editor),
            vec![(0, 5, "B".to_string()), (5, 11, "A".to_string())]
        );

        editor.delete_range(3, 8);
        assert_eq!(
            spans_of(&editor),
            vec![(0, 3, "B".to_string()), (3, 6, "A".to_string())]
        );
        assert_eq!(editor.get_text(), "Helrld");
        assert_eq!(editor.len(), 6);
        assert!(editor.check_invariants());
    }

    #[test]
    fn test_insert_splits_foreign_span() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "abcdef", Some("A".into()));
        editor.insert_text(3, "XY", Some("B".into()));
        assert_eq!(editor.get_text(), "abcXYdef");
        assert_eq!(
            spans_of(&editor),
            vec![
                (0, 3, "A".to_string()),
                (3, 5, "B".to_string()),
                (5, 8, "A".to_string())
            ]
        );
    }

    #[test]
    fn test_insert_same_style_in_middle_stays_single_span() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "abcdef", Some("A".into()));
        editor.insert_text(2, "zz", Some("A".into()));
        assert_eq!(spans_of(&editor), vec![(0, 8, "A".to_string())]);
    }

    #[test]
    fn test_insert_inherits_preceding_style() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "ab", Some("A".into()));
        editor.insert_text(2, "cd", Some("B".into()));
        editor.insert_text(4, "e", None);
        assert_eq!(editor.style_at(4), Some(&StyleId::from("B")));
        editor.insert_text(0, "_", None);
        assert_eq!(editor.style_at(0), Some(&StyleId::from("A")));
        assert!(editor.check_invariants());
    }

    #[test]
    fn test_delete_merges_matching_neighbours() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "aaa", Some("A".into()));
        editor.insert_text(3, "bbb", Some("B".into()));
        editor.insert_text(6, "aaa", Some("A".into()));
        editor.delete_range(3, 6);
        assert_eq!(editor.get_text(), "aaaaaa");
        assert_eq!(spans_of(&editor), vec![(0, 6, "A".to_string())]);
    }

    #[test]
    fn test_delete_everything_leaves_no_spans() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "hello", Some("A".into()));
        editor.delete_range(0, 5);
        assert!(editor.is_empty());
        assert!(editor.spans().is_empty());
        assert!(editor.check_invariants());
    }

    #[test]
    fn test_offsets_are_clamped() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(42, "abc", Some("A".into()));
        assert_eq!(editor.get_text(), "abc");
        editor.delete_range(2, 99);
        assert_eq!(editor.get_text(), "ab");
        editor.delete_range(5, 1);
        assert_eq!(editor.get_text(), "a");
        editor.apply_style(10, 20, "B");
        assert_eq!(spans_of(&editor), vec![(0, 1, "A".to_string())]);
    }

    #[test]
    fn test_split_on_boundary_creates_no_empty_span() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "abcd", Some("A".into()));
        editor.apply_style(0, 4, "A");
        assert_eq!(spans_of(&editor), vec![(0, 4, "A".to_string())]);
        editor.apply_style(0, 2, "B");
        editor.apply_style(2, 4, "B");
        assert_eq!(spans_of(&editor), vec![(0, 4, "B".to_string())]);
    }

    #[test]
    fn test_apply_style_across_spans() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "aa", Some("A".into()));
        editor.insert_text(2, "bb", Some("B".into()));
        editor.insert_text(4, "cc", Some("C".into()));
        editor.apply_style(1, 5, "D");
        assert_eq!(
            spans_of(&editor),
            vec![
                (0, 1, "A".to_string()),
                (1, 5, "D".to_string()),
                (5, 6, "C".to_string())
            ]
        );
    }

    #[test]
    fn test_multibyte_characters() {
        let mut editor = TextRunEditor::new();
        editor.insert_text(0, "héllo wörld", Some("A".into()));
        editor.apply_style(6, 11, "B");
        editor.delete_range(1, 2);
        assert_eq!(editor.get_text(), "hllo wörld");
        let runs = editor.style_runs();
        assert_eq!(runs[0].text, "hllo ");
        assert_eq!(runs[1].text, "wörld");
    }

    #[test]
    fn test_style_runs_and_definitions() {
        let mut editor = TextRunEditor::new();
        editor.define_style(
            "title",
            TextStyle {
                bold: true,
                ..TextStyle::default()
            },
        );
        editor.insert_text(0, "Title", Some("title".into()));
        editor.insert_text(5, " body", Some(StyleId::from(TextRunEditor::DEFAULT_STYLE)));
        let runs = editor.style_runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Title");
        assert!(editor.resolve_style(&runs[0].style).bold);
        assert!(!editor.resolve_style(&StyleId::from("missing")).bold);
    }

    #[test]
    fn test_clear_drops_custom_styles() {
        let mut editor = TextRunEditor::new();
        editor.define_style("x", TextStyle::default());
        editor.insert_text(0, "abc", Some("x".into()));
        editor.clear();
        assert!(editor.is_empty());
        assert!(editor.style(&StyleId::from("x")).is_none());
        assert!(editor.style(editor.default_style()).is_some());
    }

    #[test]
    fn test_random_edit_sequence_keeps_invariants() {
        let mut editor = TextRunEditor::new();
        let styles = ["A", "B", "C"];
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = |m: usize| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % m as u64) as usize
        };
        for _ in 0..500 {
            let len = editor.len();
            match next(3) {
                0 => {
                    let style = styles[next(3)];
                    editor.insert_text(next(len + 2), "xyz", Some(style.into()));
                }
                1 => {
                    let a = next(len + 2);
                    let b = next(len + 2);
                    editor.delete_range(a, b);
                }
                _ => {
                    let a = next(len + 2);
                    let b = next(len + 2);
                    editor.apply_style(a, b, styles[next(3)]);
                }
            }
            assert!(editor.check_invariants());
            assert_eq!(editor.spans().last().map(|s| s.end).unwrap_or(0), editor.get_text().chars().count());
        }
    }
}
