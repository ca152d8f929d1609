//! Text shape.

use super::{BoundingRect, ShapeDetails, ShapeId, ShapeKind, ShapeStyle, ShapeTrait, ShapeTransform};
use crate::render::{Paragraph, ParagraphRun, RenderContext};
use crate::resources::{TextLayoutProvider, TextMetrics};
use crate::text_runs::{StyleId, StyleRun, TextRunEditor, TextStyle};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How drag distance maps to font size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSizing {
    pub min: f64,
    pub max: f64,
    /// Points of font size per pixel of drag distance.
    pub per_pixel: f64,
}

impl Default for FontSizing {
    fn default() -> Self {
        Self {
            min: 8.0,
            max: 72.0,
            per_pixel: 0.1,
        }
    }
}

impl FontSizing {
    pub fn clamp(&self, size: f64) -> f64 {
        if size.is_finite() { size.clamp(self.min, self.max) } else { self.min }
    }
}

/// A rich text shape.
///
/// Width and height are not free parameters: they come from laying out the
/// content. Until a [`TextLayoutProvider`] has produced metrics for the
/// current content, the bounds are an approximation and nothing is drawn.
#[derive(Debug, Clone, Serialize)]
pub struct Text {
    id: ShapeId,
    /// Top-left corner of the paragraph.
    position: Point,
    editor: TextRunEditor,
    /// Cursor as a character index into the content.
    cursor: usize,
    font_size: f64,
    /// Font size at the start of the current resize gesture.
    base_font_size: f64,
    sizing: FontSizing,
    transform: ShapeTransform,
    style: ShapeStyle,
    #[serde(skip)]
    metrics: Option<TextMetrics>,
    bounds: BoundingRect,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    /// Create a new text shape with the cursor at the end of `content`.
    pub fn new(position: Point, content: &str) -> Self {
        let mut editor = TextRunEditor::new();
        editor.set_text(content, None);
        let cursor = editor.len();
        let mut text = Self {
            id: Uuid::new_v4(),
            position,
            editor,
            cursor,
            font_size: Self::DEFAULT_FONT_SIZE,
            base_font_size: Self::DEFAULT_FONT_SIZE,
            sizing: FontSizing::default(),
            transform: ShapeTransform::default(),
            style: ShapeStyle::default(),
            metrics: None,
            bounds: BoundingRect::enclosing(Rect::ZERO),
        };
        text.calculate_bounding_rect();
        text
    }

    pub fn content(&self) -> &str {
        self.editor.get_text()
    }

    pub fn editor(&self) -> &TextRunEditor {
        &self.editor
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn sizing(&self) -> FontSizing {
        self.sizing
    }

    pub fn set_sizing(&mut self, sizing: FontSizing) {
        self.sizing = sizing;
        self.set_font_size(self.font_size);
    }

    /// Set the font size (clamped) and make it the base for resizing.
    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = self.sizing.clamp(size);
        self.base_font_size = self.font_size;
        self.invalidate_layout();
    }

    /// Make the current font size the base of the next resize gesture.
    pub fn commit_size(&mut self) {
        self.base_font_size = self.font_size;
    }

    pub fn metrics(&self) -> Option<&TextMetrics> {
        self.metrics.as_ref()
    }

    pub fn is_laid_out(&self) -> bool {
        self.metrics.is_some()
    }

    /// Paragraph for the current content, one run per span.
    pub fn paragraph(&self) -> Paragraph {
        let runs = self
            .editor
            .style_runs()
            .into_iter()
            .map(|run| ParagraphRun {
                style: self.editor.resolve_style(&run.style),
                text: run.text,
            })
            .collect();
        Paragraph {
            origin: self.position,
            font_size: self.font_size,
            runs,
        }
    }

    /// Lay the paragraph out. Returns `false` when the provider cannot
    /// measure it yet, in which case the approximate bounds stay in effect.
    pub fn layout(&mut self, provider: &dyn TextLayoutProvider) -> bool {
        self.metrics = provider.measure(&self.paragraph());
        self.calculate_bounding_rect();
        self.metrics.is_some()
    }

    fn invalidate_layout(&mut self) {
        self.metrics = None;
        self.calculate_bounding_rect();
    }

    /// Size estimate used before layout.
    fn approximate_size(&self) -> (f64, f64) {
        let content = self.editor.get_text();
        let lines = content.split('\n').count().max(1);
        let longest = content.split('\n').map(|l| l.chars().count()).max().unwrap_or(0);
        let width = (longest as f64 * self.font_size * 0.55).max(20.0);
        let height = lines as f64 * self.font_size * 1.2;
        (width, height)
    }

    /// Replace the whole content.
    pub fn set_content(&mut self, content: &str) {
        self.editor.set_text(content, None);
        self.cursor = self.editor.len();
        self.invalidate_layout();
    }

    /// Move the cursor, clamped to `[0, len]`.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.editor.len());
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.set_cursor(self.cursor + 1);
    }

    /// Move to the start of the current line.
    pub fn move_cursor_home(&mut self) {
        let before: Vec<char> = self.editor.get_text().chars().take(self.cursor).collect();
        self.cursor = before
            .iter()
            .rposition(|c| *c == '\n')
            .map(|i| i + 1)
            .unwrap_or(0);
    }

    /// Move to the end of the current line.
    pub fn move_cursor_end(&mut self) {
        let rest = self
            .editor
            .get_text()
            .chars()
            .skip(self.cursor)
            .position(|c| c == '\n');
        self.cursor = match rest {
            Some(offset) => self.cursor + offset,
            None => self.editor.len(),
        };
    }

    /// Insert `text` at the cursor and move the cursor past it.
    pub fn insert_at_cursor(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.editor.insert_text(self.cursor, text, None);
        self.cursor += text.chars().count();
        self.invalidate_layout();
    }

    pub fn insert_newline(&mut self) {
        self.insert_at_cursor("\n");
    }

    /// Delete the character before the cursor.
    pub fn delete_backward(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.editor.delete_range(self.cursor - 1, self.cursor);
        self.cursor -= 1;
        self.invalidate_layout();
    }

    /// Delete the character after the cursor.
    pub fn delete_forward(&mut self) {
        if self.cursor >= self.editor.len() {
            return;
        }
        self.editor.delete_range(self.cursor, self.cursor + 1);
        self.invalidate_layout();
    }

    pub fn define_style(&mut self, id: impl Into<StyleId>, style: TextStyle) {
        self.editor.define_style(id, style);
        self.invalidate_layout();
    }

    pub fn apply_style_range(&mut self, start: usize, end: usize, style: impl Into<StyleId>) {
        self.editor.apply_style(start, end, style);
        self.invalidate_layout();
    }

    pub fn style_runs(&self) -> Vec<StyleRun> {
        self.editor.style_runs()
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Text
    }

    fn bounding_rect(&self) -> BoundingRect {
        self.bounds
    }

    fn calculate_bounding_rect(&mut self) {
        let (width, height) = match &self.metrics {
            Some(metrics) => (metrics.width(), metrics.height()),
            None => self.approximate_size(),
        };
        self.bounds = BoundingRect::enclosing(Rect::from_origin_size(self.position, (width, height)));
    }

    fn point_in_shape(&self, point: Point) -> bool {
        self.bounds.as_rect().contains(point)
    }

    fn move_shape(&mut self, dx: f64, dy: f64) {
        self.position.x += dx;
        self.position.y += dy;
        self.calculate_bounding_rect();
    }

    /// Resizing scales typography: the drag distance, negative when the drag
    /// heads up-left, changes the font size from the gesture's base size.
    fn set_size(&mut self, drag_start: Point, current_x: f64, current_y: f64, _constrain_square: bool) {
        let dx = current_x - drag_start.x;
        let dy = current_y - drag_start.y;
        let distance = dx.hypot(dy);
        let signed = if dx + dy < 0.0 { -distance } else { distance };
        self.font_size = self.sizing.clamp(self.base_font_size + signed * self.sizing.per_pixel);
        self.invalidate_layout();
    }

    /// Scale the font by the height ratio and move to the rect's origin.
    fn fit_to_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        let current = self.bounds.height();
        if current > f64::EPSILON {
            self.font_size = self.sizing.clamp(self.font_size * rect.height() / current);
        }
        self.position = rect.origin();
        self.invalidate_layout();
    }

    fn get_coord(&self) -> Point {
        self.position
    }

    fn draw(&self, ctx: &mut RenderContext<'_>) {
        if self.metrics.is_none() || self.editor.is_empty() {
            return;
        }
        ctx.surface.draw_paragraph(&self.paragraph());
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&self) -> &ShapeTransform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut ShapeTransform {
        &mut self.transform
    }

    fn details(&self) -> ShapeDetails {
        ShapeDetails::Text {
            content: self.editor.get_text().to_string(),
            font_size: self.font_size,
            cursor: self.cursor,
            spans: self.editor.spans().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawCommand;

    struct FixedLayout;

    impl TextLayoutProvider for FixedLayout {
        fn measure(&self, paragraph: &Paragraph) -> Option<TextMetrics> {
            let text = paragraph.text();
            Some(TextMetrics {
                line_height: paragraph.font_size,
                longest_line: text.chars().count() as f64 * 10.0,
                line_count: text.split('\n').count(),
                glyph_rects: Vec::new(),
            })
        }
    }

    struct FontsMissing;

    impl TextLayoutProvider for FontsMissing {
        fn measure(&self, _: &Paragraph) -> Option<TextMetrics> {
            None
        }
    }

    #[test]
    fn test_bounds_follow_layout() {
        let mut text = Text::new(Point::new(5.0, 5.0), "abcd");
        assert!(text.layout(&FixedLayout));
        assert_eq!(text.bounding_rect().as_rect(), Rect::new(5.0, 5.0, 45.0, 21.0));

        text.insert_at_cursor("ef");
        assert!(!text.is_laid_out());
        text.layout(&FixedLayout);
        assert!((text.bounding_rect().width() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_draw_is_noop_until_laid_out() {
        let mut text = Text::new(Point::ZERO, "hi");
        let mut commands: Vec<DrawCommand> = Vec::new();
        text.draw(&mut RenderContext::new(&mut commands));
        assert!(commands.is_empty());

        assert!(!text.layout(&FontsMissing));
        text.draw(&mut RenderContext::new(&mut commands));
        assert!(commands.is_empty());

        text.layout(&FixedLayout);
        text.draw(&mut RenderContext::new(&mut commands));
        assert!(matches!(commands.as_slice(), [DrawCommand::Paragraph { .. }]));
    }

    #[test]
    fn test_set_size_scales_font() {
        let mut text = Text::new(Point::ZERO, "x");
        let start = Point::new(0.0, 0.0);
        text.set_size(start, 30.0, 40.0, false);
        assert!((text.font_size() - 21.0).abs() < 1e-9);

        text.set_size(start, -30.0, -40.0, false);
        assert!((text.font_size() - 11.0).abs() < 1e-9);

        text.set_size(start, 3000.0, 0.0, false);
        assert!((text.font_size() - 72.0).abs() < 1e-9);
        text.set_size(start, -3000.0, 0.0, false);
        assert!((text.font_size() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_commit_size_rebases_gesture() {
        let mut text = Text::new(Point::ZERO, "x");
        text.set_size(Point::ZERO, 100.0, 0.0, false);
        text.commit_size();
        text.set_size(Point::ZERO, 100.0, 0.0, false);
        assert!((text.font_size() - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_rect_scales_by_height() {
        let mut text = Text::new(Point::ZERO, "abc");
        let height = text.bounding_rect().height();
        text.fit_to_rect(Rect::new(10.0, 10.0, 50.0, 10.0 + height * 2.0));
        assert!((text.font_size() - 32.0).abs() < 1e-9);
        assert_eq!(text.get_coord(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_cursor_editing() {
        let mut text = Text::new(Point::ZERO, "ab\ncd");
        assert_eq!(text.cursor(), 5);
        text.move_cursor_home();
        assert_eq!(text.cursor(), 3);
        text.move_cursor_left();
        text.move_cursor_home();
        assert_eq!(text.cursor(), 0);
        text.move_cursor_end();
        assert_eq!(text.cursor(), 2);

        text.delete_backward();
        assert_eq!(text.content(), "a\ncd");
        text.delete_forward();
        assert_eq!(text.content(), "acd");
        text.insert_newline();
        assert_eq!(text.content(), "a\ncd");
        assert_eq!(text.cursor(), 2);

        text.set_cursor(99);
        assert_eq!(text.cursor(), 4);
        text.delete_forward();
        assert_eq!(text.content(), "a\ncd");
    }

    #[test]
    fn test_styled_runs_reach_paragraph() {
        let mut text = Text::new(Point::ZERO, "Hello");
        text.define_style(
            "bold",
            TextStyle {
                bold: true,
                ..TextStyle::default()
            },
        );
        text.apply_style_range(0, 2, "bold");
        let paragraph = text.paragraph();
        assert_eq!(paragraph.runs.len(), 2);
        assert!(paragraph.runs[0].style.bold);
        assert_eq!(paragraph.runs[1].text, "llo");
    }
}
