//! Approximate text layout from per-family glyph width factors.

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use vectra_core::render::Paragraph;
use vectra_core::resources::{TextLayoutProvider, TextMetrics};

/// Measures text as if every glyph of a family had the same advance.
///
/// Advances are `factor * font_size`, where the factor comes from
/// `family_factors` or `default_factor`. Bold glyphs are 5% wider. Lines
/// are `line_height_factor * font_size` tall, using the largest size on
/// the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproximateTextLayout {
    pub default_factor: f64,
    pub line_height_factor: f64,
    pub family_factors: HashMap<String, f64>,
    /// Families whose fonts are not available yet. Paragraphs using them
    /// cannot be measured.
    pub pending_families: HashSet<String>,
}

impl Default for ApproximateTextLayout {
    fn default() -> Self {
        let family_factors = [("monospace", 0.6), ("serif", 0.5), ("sans-serif", 0.55)]
            .into_iter()
            .map(|(family, factor)| (family.to_string(), factor))
            .collect();
        Self {
            default_factor: 0.55,
            line_height_factor: 1.2,
            family_factors,
            pending_families: HashSet::new(),
        }
    }
}

impl ApproximateTextLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: impl Into<String>, factor: f64) -> Self {
        self.family_factors.insert(family.into(), factor);
        self
    }

    /// Mark a family as still loading.
    pub fn set_pending(&mut self, family: impl Into<String>, pending: bool) {
        let family = family.into();
        if pending {
            self.pending_families.insert(family);
        } else {
            self.pending_families.remove(&family);
        }
    }

    fn factor(&self, family: &str) -> f64 {
        self.family_factors.get(family).copied().unwrap_or(self.default_factor)
    }
}

impl TextLayoutProvider for ApproximateTextLayout {
    fn measure(&self, paragraph: &Paragraph) -> Option<TextMetrics> {
        if let Some(run) = paragraph
            .runs
            .iter()
            .find(|r| self.pending_families.contains(&r.style.font_family))
        {
            log::debug!("Font family {:?} not loaded yet", run.style.font_family);
            return None;
        }

        // (advance, size) per character, lines split on '\n'.
        let mut lines: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
        for run in &paragraph.runs {
            let size = run.style.font_size.unwrap_or(paragraph.font_size);
            let mut advance = self.factor(&run.style.font_family) * size;
            if run.style.bold {
                advance *= 1.05;
            }
            for ch in run.text.chars() {
                match lines.last_mut() {
                    Some(line) if ch != '\n' => line.push((advance, size)),
                    Some(line) => {
                        line.push((0.0, size));
                        lines.push(Vec::new());
                    }
                    None => {}
                }
            }
        }

        let line_height = lines
            .iter()
            .flatten()
            .map(|(_, size)| *size)
            .fold(paragraph.font_size, f64::max)
            * self.line_height_factor;

        let mut glyph_rects = Vec::new();
        let mut longest_line: f64 = 0.0;
        for (row, line) in lines.iter().enumerate() {
            let top = row as f64 * line_height;
            let mut x = 0.0;
            for (advance, _) in line {
                glyph_rects.push(Rect::new(x, top, x + advance, top + line_height));
                x += advance;
            }
            longest_line = longest_line.max(x);
        }

        Some(TextMetrics {
            line_height,
            longest_line,
            line_count: lines.len(),
            glyph_rects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use vectra_core::render::ParagraphRun;
    use vectra_core::text_runs::TextStyle;

    fn paragraph(runs: &[(&str, TextStyle)]) -> Paragraph {
        Paragraph {
            origin: Point::ZERO,
            font_size: 10.0,
            runs: runs
                .iter()
                .map(|(text, style)| ParagraphRun {
                    text: text.to_string(),
                    style: style.clone(),
                })
                .collect(),
        }
    }

    fn mono() -> TextStyle {
        TextStyle {
            font_family: "monospace".to_string(),
            ..TextStyle::default()
        }
    }

    #[test]
    fn test_single_line() {
        let layout = ApproximateTextLayout::new();
        let metrics = layout.measure(&paragraph(&[("abcd", mono())])).unwrap();
        assert_eq!(metrics.line_count, 1);
        assert!((metrics.longest_line - 24.0).abs() < 1e-9);
        assert!((metrics.line_height - 12.0).abs() < 1e-9);
        assert_eq!(metrics.glyph_rects.len(), 4);
        assert!((metrics.glyph_rects[1].x0 - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiline_and_sizes() {
        let layout = ApproximateTextLayout::new().with_family("wide", 1.0);
        let big = TextStyle {
            font_family: "wide".to_string(),
            font_size: Some(20.0),
            ..TextStyle::default()
        };
        let metrics = layout.measure(&paragraph(&[("ab\n", mono()), ("c", big)])).unwrap();
        assert_eq!(metrics.line_count, 2);
        // Second line: one 20px glyph at factor 1.0.
        assert!((metrics.longest_line - 20.0).abs() < 1e-9);
        assert!((metrics.line_height - 24.0).abs() < 1e-9);
        assert!((metrics.height() - 48.0).abs() < 1e-9);
        assert_eq!(metrics.glyph_rects.len(), 4);
    }

    #[test]
    fn test_empty_paragraph() {
        let metrics = ApproximateTextLayout::new().measure(&paragraph(&[])).unwrap();
        assert_eq!(metrics.line_count, 1);
        assert!(metrics.longest_line.abs() < f64::EPSILON);
    }

    #[test]
    fn test_pending_family_is_not_measured() {
        let mut layout = ApproximateTextLayout::new();
        layout.set_pending("monospace", true);
        assert!(layout.measure(&paragraph(&[("a", mono())])).is_none());
        layout.set_pending("monospace", false);
        assert!(layout.measure(&paragraph(&[("a", mono())])).is_some());
    }

    #[test]
    fn test_from_json() {
        let layout: ApproximateTextLayout =
            serde_json::from_str(r#"{ "family_factors": { "Inter": 0.5 } }"#).unwrap();
        assert!((layout.factor("Inter") - 0.5).abs() < f64::EPSILON);
        assert!((layout.factor("unknown") - 0.55).abs() < f64::EPSILON);
    }
}
