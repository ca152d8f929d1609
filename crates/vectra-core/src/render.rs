//! Abstract drawing interface.
//!
//! The core never touches pixels. Shapes describe themselves through a
//! [`DrawSurface`] reached via an explicit [`RenderContext`] that lives for
//! one render pass.

use crate::color::SerializableColor;
use crate::matrix::Matrix;
use crate::resources::ImageHandle;
use crate::shapes::ShapeStyle;
use crate::text_runs::TextStyle;
use kurbo::{BezPath, Point, Rect};
use serde::Serialize;

/// Stroke half of a paint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: SerializableColor,
    pub width: f64,
}

/// Fill and/or stroke description for a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Paint {
    pub fill: Option<SerializableColor>,
    pub stroke: Option<Stroke>,
}

impl Paint {
    pub fn fill(color: SerializableColor) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    pub fn stroke(color: SerializableColor, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(Stroke { color, width }),
        }
    }

    /// Paint for a shape style, with opacity folded into both colors.
    pub fn from_style(style: &ShapeStyle) -> Self {
        let stroke = (style.stroke_width > 0.0).then(|| Stroke {
            color: style.stroke_color.with_opacity(style.opacity),
            width: style.stroke_width,
        });
        Self {
            fill: style.fill_color.map(|c| c.with_opacity(style.opacity)),
            stroke,
        }
    }

    /// Stroke-only version of this paint.
    pub fn outline(&self) -> Self {
        Self {
            fill: None,
            stroke: self.stroke,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.fill.is_some() || self.stroke.is_some()
    }
}

/// One styled run of a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParagraphRun {
    pub text: String,
    pub style: TextStyle,
}

/// A laid-out block of rich text, positioned at its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    pub origin: Point,
    pub font_size: f64,
    pub runs: Vec<ParagraphRun>,
}

impl Paragraph {
    /// Concatenated plain text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Save,
    Restore,
    Concat { matrix: Matrix },
    ClipRect { rect: Rect },
    ClipPath { path: BezPath },
    Rect { rect: Rect, paint: Paint },
    RoundedRect { rect: Rect, radius: f64, paint: Paint },
    Oval { rect: Rect, paint: Paint },
    Path { path: BezPath, paint: Paint },
    Image { image: ImageHandle, rect: Rect },
    Paragraph { paragraph: Paragraph },
}

/// A 2-D drawing backend.
pub trait DrawSurface {
    fn save(&mut self);
    fn restore(&mut self);
    /// Pre-multiply the current transform by `matrix`.
    fn concat(&mut self, matrix: &Matrix);
    fn clip_rect(&mut self, rect: Rect);
    fn clip_path(&mut self, path: &BezPath);
    fn draw_rect(&mut self, rect: Rect, paint: &Paint);
    fn draw_rounded_rect(&mut self, rect: Rect, radius: f64, paint: &Paint);
    fn draw_oval(&mut self, rect: Rect, paint: &Paint);
    fn draw_path(&mut self, path: &BezPath, paint: &Paint);
    fn draw_image(&mut self, image: ImageHandle, rect: Rect);
    fn draw_paragraph(&mut self, paragraph: &Paragraph);
}

/// Collecting commands into a list is the simplest surface.
impl DrawSurface for Vec<DrawCommand> {
    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn concat(&mut self, matrix: &Matrix) {
        self.push(DrawCommand::Concat { matrix: *matrix });
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.push(DrawCommand::ClipRect { rect });
    }

    fn clip_path(&mut self, path: &BezPath) {
        self.push(DrawCommand::ClipPath { path: path.clone() });
    }

    fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.push(DrawCommand::Rect { rect, paint: *paint });
    }

    fn draw_rounded_rect(&mut self, rect: Rect, radius: f64, paint: &Paint) {
        self.push(DrawCommand::RoundedRect {
            rect,
            radius,
            paint: *paint,
        });
    }

    fn draw_oval(&mut self, rect: Rect, paint: &Paint) {
        self.push(DrawCommand::Oval { rect, paint: *paint });
    }

    fn draw_path(&mut self, path: &BezPath, paint: &Paint) {
        self.push(DrawCommand::Path {
            path: path.clone(),
            paint: *paint,
        });
    }

    fn draw_image(&mut self, image: ImageHandle, rect: Rect) {
        self.push(DrawCommand::Image { image, rect });
    }

    fn draw_paragraph(&mut self, paragraph: &Paragraph) {
        self.push(DrawCommand::Paragraph {
            paragraph: paragraph.clone(),
        });
    }
}

impl DrawCommand {
    /// Issue this command against `surface`.
    pub fn replay(&self, surface: &mut dyn DrawSurface) {
        match self {
            DrawCommand::Save => surface.save(),
            DrawCommand::Restore => surface.restore(),
            DrawCommand::Concat { matrix } => surface.concat(matrix),
            DrawCommand::ClipRect { rect } => surface.clip_rect(*rect),
            DrawCommand::ClipPath { path } => surface.clip_path(path),
            DrawCommand::Rect { rect, paint } => surface.draw_rect(*rect, paint),
            DrawCommand::RoundedRect { rect, radius, paint } => surface.draw_rounded_rect(*rect, *radius, paint),
            DrawCommand::Oval { rect, paint } => surface.draw_oval(*rect, paint),
            DrawCommand::Path { path, paint } => surface.draw_path(path, paint),
            DrawCommand::Image { image, rect } => surface.draw_image(*image, *rect),
            DrawCommand::Paragraph { paragraph } => surface.draw_paragraph(paragraph),
        }
    }
}

/// Explicit per-pass rendering context.
pub struct RenderContext<'a> {
    /// Target surface.
    pub surface: &'a mut dyn DrawSurface,
    /// Paint used for the selection outline.
    pub selection_paint: Paint,
    /// Paint used for modifier handles.
    pub handle_paint: Paint,
}

impl<'a> RenderContext<'a> {
    pub fn new(surface: &'a mut dyn DrawSurface) -> Self {
        Self {
            surface,
            selection_paint: Paint::stroke(SerializableColor::new(59, 130, 246, 255), 1.0),
            handle_paint: Paint {
                fill: Some(SerializableColor::white()),
                stroke: Some(Stroke {
                    color: SerializableColor::new(59, 130, 246, 255),
                    width: 1.0,
                }),
            },
        }
    }

    /// Set the selection outline paint.
    pub fn with_selection_paint(mut self, paint: Paint) -> Self {
        self.selection_paint = paint;
        self
    }

    /// Set the handle paint.
    pub fn with_handle_paint(mut self, paint: Paint) -> Self {
        self.handle_paint = paint;
        self
    }

    /// Run `f` between a save/restore pair.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.surface.save();
        let result = f(self);
        self.surface.restore();
        result
    }
}
