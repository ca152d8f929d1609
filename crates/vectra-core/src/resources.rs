//! External collaborators that supply text metrics and decoded images.

use crate::render::Paragraph;
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layout metrics for a paragraph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Height of one line.
    pub line_height: f64,
    /// Width of the longest line.
    pub longest_line: f64,
    /// Number of laid-out lines (at least 1).
    pub line_count: usize,
    /// One rect per character, relative to the paragraph origin.
    #[serde(default)]
    pub glyph_rects: Vec<Rect>,
}

impl TextMetrics {
    pub fn width(&self) -> f64 {
        self.longest_line
    }

    pub fn height(&self) -> f64 {
        self.line_height * self.line_count.max(1) as f64
    }
}

/// Font/text shaping provider.
pub trait TextLayoutProvider {
    /// Lay out `paragraph`. Returns `None` while the fonts it needs are not
    /// loaded yet.
    fn measure(&self, paragraph: &Paragraph) -> Option<TextMetrics>;
}

/// Opaque handle to a decoded, renderable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle(pub u64);

/// Result of decoding an encoded image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub handle: ImageHandle,
}

impl DecodedImage {
    /// Width / height, or 1.0 for a degenerate image.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

/// Image decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Corrupt image data: {0}")]
    Corrupt(String),
    #[error("Image has zero width or height")]
    Empty,
}

/// Resource/image decoder.
pub trait ImageDecoder {
    fn decode(&mut self, bytes: &[u8]) -> Result<DecodedImage, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_height_counts_lines() {
        let m = TextMetrics {
            line_height: 10.0,
            longest_line: 40.0,
            line_count: 3,
            glyph_rects: Vec::new(),
        };
        assert!((m.height() - 30.0).abs() < f64::EPSILON);
        assert!((TextMetrics { line_height: 10.0, ..TextMetrics::default() }.height() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aspect_ratio() {
        let img = DecodedImage {
            width: 200,
            height: 100,
            handle: ImageHandle(1),
        };
        assert!((img.aspect_ratio() - 2.0).abs() < f64::EPSILON);
        let empty = DecodedImage { width: 0, ..img };
        assert!((empty.aspect_ratio() - 1.0).abs() < f64::EPSILON);
    }
}
